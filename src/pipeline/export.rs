//! Final dashboard outputs: `authors.json` and `papers.json`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{Paper, PaperStore, ResearcherProfile};
use crate::utils::{CacheError, SnapshotCache};

pub const AUTHORS_OUTPUT: &str = "authors.json";
pub const PAPERS_OUTPUT: &str = "papers.json";

/// A paper reduced to the fields the dashboard reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimmedPaper {
    pub id: String,
    pub ids: IndexMap<String, serde_json::Value>,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub tech_topics: Vec<String>,
    pub health_topics: Vec<String>,
    pub agetech_topics: Vec<String>,
    pub cited_by_count: u64,
    pub relevance_score: Option<f64>,
    pub author_ids: Vec<String>,
    pub authors: Vec<String>,
    /// Venue display name, empty when unknown
    pub source: String,
}

impl From<&Paper> for TrimmedPaper {
    fn from(paper: &Paper) -> Self {
        Self {
            id: paper.id.clone(),
            ids: paper.ids.clone(),
            doi: paper.doi.clone(),
            title: paper.title.clone(),
            publication_year: paper.publication_year,
            tech_topics: paper.tech_topics.clone(),
            health_topics: paper.health_topics.clone(),
            agetech_topics: paper.agetech_topics.clone(),
            cited_by_count: paper.cited_by_count,
            relevance_score: paper.relevance_score,
            author_ids: paper.author_ids().into_iter().map(str::to_string).collect(),
            authors: paper.author_names().into_iter().map(str::to_string).collect(),
            source: paper.venue.clone().unwrap_or_default(),
        }
    }
}

/// Trim every paper in store order
pub fn trim_papers(store: &PaperStore) -> IndexMap<String, TrimmedPaper> {
    store
        .iter()
        .map(|(id, paper)| (id.clone(), TrimmedPaper::from(paper)))
        .collect()
}

/// Write both output files into `directory`
pub fn write_outputs(
    directory: &Path,
    profiles: &IndexMap<String, ResearcherProfile>,
    store: &PaperStore,
) -> Result<(), CacheError> {
    SnapshotCache::new(directory, AUTHORS_OUTPUT).store(profiles)?;
    SnapshotCache::new(directory, PAPERS_OUTPUT).store(&trim_papers(store))?;
    tracing::info!(
        "Wrote {} researchers and {} papers to {}",
        profiles.len(),
        store.len(),
        directory.display()
    );
    Ok(())
}

/// Read a previously written `authors.json`; `None` when absent
pub fn read_profiles(
    directory: &Path,
) -> Result<Option<IndexMap<String, ResearcherProfile>>, CacheError> {
    SnapshotCache::new(directory, AUTHORS_OUTPUT).load()
}
