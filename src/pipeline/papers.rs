//! Paper store builder: keyword-pair queries merged into one deduplicated store.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::OpenAlexConfig;
use crate::models::{AuthorPosition, Authorship, KeywordPair, Paper, PaperStore, WorksQuery};
use crate::sources::{Work, WorksSource};
use crate::utils::{CacheError, SnapshotCache, StageOptions};

/// Rebuild plain text from a word → positions index
///
/// Words are laid out by position; a word listed at several positions appears
/// at each of them. Ties on position keep index order.
pub fn decode_abstract(index: Option<&IndexMap<String, Vec<usize>>>) -> Option<String> {
    let index = index?;

    let mut tokens: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&pos| (pos, word.as_str())))
        .collect();
    tokens.sort_by_key(|&(pos, _)| pos);

    Some(
        tokens
            .into_iter()
            .map(|(_, word)| word)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Convert a raw work into a paper with empty topic tags
///
/// Returns `None` for works without an identifier. Authorships without an
/// author id are dropped, and a repeated author keeps only its first position;
/// `authorship_count` still records the full list length.
pub fn paper_from_work(work: Work) -> Option<Paper> {
    let id = work.id.filter(|id| !id.is_empty())?;
    let authorship_count = work.authorships.len();

    let mut seen = HashSet::new();
    let authorships = work
        .authorships
        .into_iter()
        .filter_map(|a| {
            let author_id = a.author.id.filter(|id| !id.is_empty())?;
            if !seen.insert(author_id.clone()) {
                return None;
            }
            Some(Authorship {
                author_id,
                display_name: a.author.display_name,
                orcid: a.author.orcid,
                position: AuthorPosition::parse(a.author_position.as_deref()),
            })
        })
        .collect();

    let mut paper = Paper::new(id);
    paper.abstract_text = decode_abstract(work.abstract_inverted_index.as_ref());
    paper.doi = work.doi;
    paper.title = work.title.or(work.display_name);
    paper.publication_date = work.publication_date;
    paper.publication_year = work.publication_year;
    paper.cited_by_count = work.cited_by_count.unwrap_or_default();
    paper.relevance_score = work.relevance_score;
    paper.ids = work.ids.unwrap_or_default();
    paper.venue = work
        .primary_location
        .and_then(|loc| loc.source)
        .and_then(|source| source.display_name);
    paper.authorships = authorships;
    paper.authorship_count = authorship_count;
    Some(paper)
}

/// Merge one query's works into the store, tagging every returned paper
///
/// Returns the number of papers that were new to the store.
pub fn merge_works(store: &mut PaperStore, works: Vec<Work>, pair: &KeywordPair) -> usize {
    let mut added = 0;
    for work in works {
        let Some(id) = work.id.clone().filter(|id| !id.is_empty()) else {
            tracing::debug!("Skipping work without id for {}", pair);
            continue;
        };

        if !store.contains_key(&id) {
            let Some(paper) = paper_from_work(work) else {
                continue;
            };
            store.insert(id.clone(), paper);
            added += 1;
        }
        if let Some(paper) = store.get_mut(&id) {
            paper.tag(pair);
        }
    }
    added
}

/// Fetches every keyword pair and folds the results into a [`PaperStore`]
#[derive(Debug)]
pub struct PaperStoreBuilder<'a> {
    source: &'a dyn WorksSource,
    language: String,
    per_page: u32,
    max_pages: u32,
    pair_delay: Duration,
}

impl<'a> PaperStoreBuilder<'a> {
    pub fn new(source: &'a dyn WorksSource, config: &OpenAlexConfig) -> Self {
        Self {
            source,
            language: config.language.clone(),
            per_page: config.per_page,
            max_pages: config.max_pages,
            pair_delay: config.page_delay(),
        }
    }

    fn query(&self, pair: &KeywordPair) -> WorksQuery {
        WorksQuery::new(pair.query_string())
            .language(self.language.clone())
            .per_page(self.per_page)
            .max_pages(self.max_pages)
    }

    /// Query every pair in order; a failed pair contributes nothing
    pub async fn fetch(&self, pairs: &[KeywordPair]) -> PaperStore {
        let mut store = PaperStore::new();

        for pair in pairs {
            let query = self.query(pair);
            tracing::info!("Querying {} for {}", self.source.name(), query.search);

            match self.source.search_works(&query).await {
                Ok(works) => {
                    let returned = works.len();
                    let added = merge_works(&mut store, works, pair);
                    tracing::info!(
                        "{}: {} works, {} new, {} total papers",
                        pair.label(),
                        returned,
                        added,
                        store.len()
                    );
                }
                Err(e) => tracing::error!("Query {} failed: {}", query.search, e),
            }

            tokio::time::sleep(self.pair_delay).await;
        }

        store
    }

    /// Load the store snapshot, or fetch and persist a fresh one
    pub async fn load_or_fetch(
        &self,
        pairs: &[KeywordPair],
        cache: &SnapshotCache,
        options: StageOptions,
    ) -> Result<PaperStore, CacheError> {
        if let Some(store) = cache.load_unless::<PaperStore>(options)? {
            tracing::info!("Loaded {} papers from {}", store.len(), cache.path().display());
            return Ok(store);
        }

        let store = self.fetch(pairs).await;
        cache.store(&store)?;
        tracing::info!("Saved {} papers to {}", store.len(), cache.path().display());
        Ok(store)
    }
}
