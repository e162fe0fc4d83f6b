//! Rankings derived from the author index and paper store.
//!
//! Every function here is pure and uses stable sorts, so ties keep the
//! insertion order of the underlying collections.

use indexmap::IndexMap;
use std::cmp::Reverse;

use crate::config::RankingConfig;
use crate::models::{Author, AuthorIndex, CountMap, Paper, PaperStore, ResearcherProfile};

/// The `n` authors with the most publications, ties in index order
pub fn top_authors(index: &AuthorIndex, n: usize) -> Vec<&Author> {
    let mut authors: Vec<&Author> = index.values().collect();
    authors.sort_by_key(|a| Reverse(a.publication_count.total));
    authors.truncate(n);
    authors
}

/// Count entries sorted descending, optionally truncated
pub fn top_counts(counts: &CountMap, n: Option<usize>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by_key(|(_, count)| Reverse(*count));
    if let Some(n) = n {
        entries.truncate(n);
    }
    entries
}

/// Co-authors that are themselves in `selected`, most frequent first
pub fn top_coauthors<V>(author: &Author, selected: &IndexMap<String, V>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = author
        .all_coauthors
        .iter()
        .filter(|(id, _)| selected.contains_key(id.as_str()))
        .map(|(id, count)| (id.clone(), *count))
        .collect();
    entries.sort_by_key(|(_, count)| Reverse(*count));
    entries
}

/// Papers of `author` that have an abstract and at most `max_coauthors` authorships
pub fn eligible_papers<'a>(
    author: &Author,
    store: &'a PaperStore,
    max_coauthors: Option<usize>,
) -> Vec<&'a Paper> {
    author
        .papers
        .iter()
        .filter_map(|id| store.get(id))
        .filter(|paper| paper.has_abstract())
        .filter(|paper| max_coauthors.map_or(true, |max| paper.author_count() <= max))
        .collect()
}

/// Eligible papers by citation count, highest first
pub fn most_cited_papers<'a>(
    author: &Author,
    store: &'a PaperStore,
    n: usize,
    max_coauthors: Option<usize>,
) -> Vec<&'a Paper> {
    let mut papers = eligible_papers(author, store, max_coauthors);
    papers.sort_by_key(|p| Reverse(p.cited_by_count));
    papers.truncate(n);
    papers
}

/// Eligible papers by publication date, newest first; undated papers last
pub fn most_recent_papers<'a>(
    author: &Author,
    store: &'a PaperStore,
    n: usize,
    max_coauthors: Option<usize>,
) -> Vec<&'a Paper> {
    let mut papers = eligible_papers(author, store, max_coauthors);
    papers.sort_by_key(|p| Reverse(p.published_on()));
    papers.truncate(n);
    papers
}

fn ids(papers: Vec<&Paper>) -> Vec<String> {
    papers.into_iter().map(|p| p.id.clone()).collect()
}

/// Selection sizes for one ranking pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranker {
    pub top_authors: usize,
    pub top_topics: usize,
    pub top_papers: usize,
}

impl Ranker {
    pub fn from_config(config: &RankingConfig) -> Self {
        Self {
            top_authors: config.top_authors,
            top_topics: config.top_topics,
            top_papers: config.top_papers,
        }
    }

    /// Select the top authors and attach every per-author ranking
    pub fn rank(&self, index: &AuthorIndex, store: &PaperStore) -> IndexMap<String, ResearcherProfile> {
        let mut selected: IndexMap<String, ResearcherProfile> = top_authors(index, self.top_authors)
            .into_iter()
            .map(|author| (author.id.clone(), ResearcherProfile::new(author.clone())))
            .collect();

        let coauthors: Vec<Vec<(String, u64)>> = selected
            .values()
            .map(|profile| top_coauthors(&profile.author, &selected))
            .collect();

        let topics = Some(self.top_topics);
        for (profile, coauthors) in selected.values_mut().zip(coauthors) {
            let author = &profile.author;
            profile.top_tech_topics = top_counts(&author.tech_topics, topics);
            profile.top_health_topics = top_counts(&author.health_topics, topics);
            profile.top_agetech_topics = top_counts(&author.agetech_topics, topics);
            profile.most_cited_papers = ids(most_cited_papers(author, store, self.top_papers, None));
            profile.most_recent_papers = ids(most_recent_papers(author, store, self.top_papers, None));
            profile.top_coauthors = coauthors;
        }

        tracing::info!("Ranked {} of {} authors", selected.len(), index.len());
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorPosition, PaperBuilder};

    fn author_with_papers(id: &str, total: u64) -> Author {
        let mut author = Author::new(id, None, None);
        author.publication_count.total = total;
        author
    }

    fn paper(id: &str, cited: u64, date: Option<&str>, with_abstract: bool, authors: usize) -> Paper {
        let mut builder = PaperBuilder::new(id).cited_by(cited);
        if let Some(date) = date {
            builder = builder.publication_date(date);
        }
        if with_abstract {
            builder = builder.abstract_text(format!("About {}", id));
        }
        for i in 0..authors {
            builder = builder.author(format!("A{}", i), "X", AuthorPosition::Middle);
        }
        builder.build()
    }

    fn store_of(papers: Vec<Paper>) -> PaperStore {
        papers.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_top_authors_stable_on_ties() {
        let mut index = AuthorIndex::new();
        for (id, total) in [("A1", 2), ("A2", 5), ("A3", 2), ("A4", 5), ("A5", 1)] {
            index.insert(id.to_string(), author_with_papers(id, total));
        }

        let top: Vec<&str> = top_authors(&index, 3).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(top, vec!["A2", "A4", "A1"]);
        assert_eq!(top_authors(&index, 10).len(), 5);
    }

    #[test]
    fn test_top_counts() {
        let counts = CountMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 3),
            ("c".to_string(), 1),
            ("d".to_string(), 2),
        ]);
        assert_eq!(
            top_counts(&counts, Some(3)),
            vec![("b".to_string(), 3), ("d".to_string(), 2), ("a".to_string(), 1)]
        );
        assert_eq!(top_counts(&counts, None).len(), 4);
    }

    #[test]
    fn test_top_coauthors_filters_to_selected() {
        let mut author = Author::new("A1", None, None);
        author.all_coauthors = CountMap::from([
            ("A9".to_string(), 7),
            ("A2".to_string(), 1),
            ("A3".to_string(), 4),
        ]);
        let selected: IndexMap<String, ()> =
            IndexMap::from([("A2".to_string(), ()), ("A3".to_string(), ())]);

        assert_eq!(
            top_coauthors(&author, &selected),
            vec![("A3".to_string(), 4), ("A2".to_string(), 1)]
        );
    }

    #[test]
    fn test_papers_without_abstract_never_selected() {
        let store = store_of(vec![
            paper("W1", 1000, Some("2024-12-01"), false, 2),
            paper("W2", 5, Some("2019-01-01"), true, 2),
            paper("W3", 50, Some("2021-05-05"), true, 2),
        ]);
        let mut author = Author::new("A0", None, None);
        author.papers = vec!["W1".into(), "W2".into(), "W3".into()];

        let cited: Vec<&str> = most_cited_papers(&author, &store, 5, None)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(cited, vec!["W3", "W2"]);

        let recent: Vec<&str> = most_recent_papers(&author, &store, 5, None)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(recent, vec!["W3", "W2"]);
    }

    #[test]
    fn test_max_coauthors_filter() {
        let store = store_of(vec![
            paper("W1", 10, Some("2020-01-01"), true, 11),
            paper("W2", 5, Some("2020-01-01"), true, 10),
        ]);
        let mut author = Author::new("A0", None, None);
        author.papers = vec!["W1".into(), "W2".into()];

        assert_eq!(eligible_papers(&author, &store, None).len(), 2);
        let bounded: Vec<&str> = eligible_papers(&author, &store, Some(10))
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(bounded, vec!["W2"]);
    }

    #[test]
    fn test_max_coauthors_uses_source_authorship_count() {
        let mut crowded = paper("W1", 10, Some("2020-01-01"), true, 10);
        crowded.authorship_count = 11;
        let store = store_of(vec![crowded]);
        let mut author = Author::new("A0", None, None);
        author.papers = vec!["W1".into()];

        assert!(eligible_papers(&author, &store, Some(10)).is_empty());
        assert_eq!(eligible_papers(&author, &store, None).len(), 1);
    }

    #[test]
    fn test_most_recent_puts_undated_last() {
        let store = store_of(vec![
            paper("W1", 0, None, true, 1),
            paper("W2", 0, Some("2018-03-01"), true, 1),
            paper("W3", 0, Some("2023-07-15"), true, 1),
        ]);
        let mut author = Author::new("A0", None, None);
        author.papers = vec!["W1".into(), "W2".into(), "W3".into()];

        let recent: Vec<&str> = most_recent_papers(&author, &store, 2, None)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(recent, vec!["W3", "W2"]);
    }

    #[test]
    fn test_rank_builds_profiles() {
        let p1 = PaperBuilder::new("W1")
            .cited_by(9)
            .publication_date("2022-01-01")
            .abstract_text("First")
            .author("A1", "Jane", AuthorPosition::First)
            .author("A2", "Raj", AuthorPosition::Last)
            .build();
        let p2 = PaperBuilder::new("W2")
            .cited_by(3)
            .publication_date("2023-01-01")
            .abstract_text("Second")
            .author("A1", "Jane", AuthorPosition::First)
            .author("A3", "Li", AuthorPosition::Last)
            .build();
        let store = store_of(vec![p1, p2]);
        let index = crate::pipeline::aggregate_authors(&store, 10);

        let ranker = Ranker {
            top_authors: 2,
            top_topics: 10,
            top_papers: 5,
        };
        let profiles = ranker.rank(&index, &store);

        assert_eq!(profiles.keys().collect::<Vec<_>>(), vec!["A1", "A2"]);
        let jane = &profiles["A1"];
        assert_eq!(jane.most_cited_papers, vec!["W1", "W2"]);
        assert_eq!(jane.most_recent_papers, vec!["W2", "W1"]);
        // A3 was not selected, so only A2 remains.
        assert_eq!(jane.top_coauthors, vec![("A2".to_string(), 1)]);
    }
}
