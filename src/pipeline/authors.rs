//! Author aggregation: a single forward fold of the paper store.

use std::collections::HashSet;

use crate::models::{bump, Author, AuthorIndex, PaperStore};
use crate::utils::{CacheError, SnapshotCache, StageOptions};

/// Fold every paper's authorships into an author-centric index
///
/// Papers with `coauthor_threshold` or more authorships still count toward
/// publications, citations and topics but add no co-author counts.
pub fn aggregate_authors(store: &PaperStore, coauthor_threshold: usize) -> AuthorIndex {
    let mut index = AuthorIndex::new();

    for paper in store.values() {
        let count_coauthors = paper.author_count() < coauthor_threshold;
        let mut seen = HashSet::new();

        for authorship in &paper.authorships {
            if !seen.insert(authorship.author_id.as_str()) {
                continue;
            }

            let author = index
                .entry(authorship.author_id.clone())
                .or_insert_with(|| {
                    Author::new(
                        authorship.author_id.clone(),
                        authorship.display_name.clone(),
                        authorship.orcid.clone(),
                    )
                });

            author.publication_count.record(authorship.position, 1);
            author
                .citation_count
                .record(authorship.position, paper.cited_by_count);
            author.papers.push(paper.id.clone());

            for topic in &paper.tech_topics {
                bump(&mut author.tech_topics, topic);
            }
            for topic in &paper.health_topics {
                bump(&mut author.health_topics, topic);
            }
            for topic in &paper.agetech_topics {
                bump(&mut author.agetech_topics, topic);
            }

            if count_coauthors {
                for other in &paper.authorships {
                    if other.author_id != authorship.author_id {
                        bump(&mut author.all_coauthors, &other.author_id);
                    }
                }
            }
        }
    }

    index
}

/// Load the author snapshot, or aggregate from `store` and persist it
pub fn load_or_aggregate(
    store: &PaperStore,
    coauthor_threshold: usize,
    cache: &SnapshotCache,
    options: StageOptions,
) -> Result<AuthorIndex, CacheError> {
    if let Some(index) = cache.load_unless::<AuthorIndex>(options)? {
        tracing::info!("Loaded {} authors from {}", index.len(), cache.path().display());
        return Ok(index);
    }

    let index = aggregate_authors(store, coauthor_threshold);
    cache.store(&index)?;
    tracing::info!(
        "Aggregated {} authors from {} papers",
        index.len(),
        store.len()
    );
    Ok(index)
}
