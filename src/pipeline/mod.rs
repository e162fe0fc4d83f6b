//! The aggregation and enrichment pipeline.
//!
//! Data flows strictly forward, each stage backed by its own snapshot:
//!
//! ```text
//! keyword pairs ─▶ PaperStoreBuilder ─▶ aggregate_authors ─▶ Ranker
//!                   all_papers.json     all_authors.json       │
//!                                                              ├─▶ AffiliationResolver (affiliations.json)
//!                                                              └─▶ Summarizer          (ai_summaries.json)
//! ```
//!
//! Everything runs sequentially on one task. External failures are contained
//! at the finest granularity (one keyword pair, one field, one author) and
//! degrade data rather than abort; only cache and configuration errors are
//! fatal.

mod affiliation;
mod authors;
mod export;
mod network;
mod papers;
mod ranking;
mod summary;

pub use affiliation::{AffiliationCache, AffiliationResolver};
pub use authors::{aggregate_authors, load_or_aggregate};
pub use export::{
    read_profiles, trim_papers, write_outputs, TrimmedPaper, AUTHORS_OUTPUT, PAPERS_OUTPUT,
};
pub use network::{
    coauthor_graph, CoauthorGraph, GraphEdge, GraphNode, DEFAULT_DEPTH, DEFAULT_MAX_NODES,
};
pub use papers::{decode_abstract, merge_works, paper_from_work, PaperStoreBuilder};
pub use ranking::{
    eligible_papers, most_cited_papers, most_recent_papers, top_authors, top_coauthors,
    top_counts, Ranker,
};
pub use summary::{Summarizer, SummaryCache};

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::Config;
use crate::models::{AuthorIndex, KeywordPair, PaperStore, ResearcherProfile};
use crate::sources::{
    AffiliationLookup, OpenAiBackend, OpenAlexSource, OrcidSource, SourceError, TextGenerator,
    WorksSource,
};
use crate::utils::{
    CacheError, GeoTableError, RorTable, SnapshotCache, StageOptions, StageProgress,
    AFFILIATIONS_CACHE, AUTHORS_CACHE, PAPERS_CACHE, SUMMARIES_CACHE,
};

/// Fatal pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    GeoTable(#[from] GeoTableError),
}

/// Per-stage switches for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub papers: StageOptions,
    pub authors: StageOptions,
    pub affiliations: StageOptions,
    pub summaries: StageOptions,
    pub skip_summaries: bool,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            papers: StageOptions::default(),
            authors: StageOptions::default(),
            affiliations: StageOptions::default(),
            summaries: StageOptions::default(),
            skip_summaries: false,
            show_progress: true,
        }
    }
}

impl RunOptions {
    /// Rebuild every stage from scratch
    pub fn from_scratch(mut self) -> Self {
        self.papers.from_scratch = true;
        self.authors.from_scratch = true;
        self.affiliations.from_scratch = true;
        self.summaries.from_scratch = true;
        self
    }

    /// Enable or disable persisting enrichment results
    pub fn update_cache(mut self, update: bool) -> Self {
        self.affiliations.update_cache = update;
        self.summaries.update_cache = update;
        self
    }
}

/// Outcome of [`Pipeline::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub papers: usize,
    pub authors: usize,
    pub selected: usize,
    pub new_affiliations: usize,
    /// `None` when the summary stage did not run
    pub new_summaries: Option<usize>,
}

/// Owns the sources and runs the stages in order
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    works: Box<dyn WorksSource>,
    resolver: AffiliationResolver,
    generator: Option<Box<dyn TextGenerator>>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        works: Box<dyn WorksSource>,
        resolver: AffiliationResolver,
        generator: Option<Box<dyn TextGenerator>>,
    ) -> Self {
        Self {
            config,
            works,
            resolver,
            generator,
        }
    }

    /// Wire the production sources: OpenAlex search, ORCID then OpenAlex
    /// affiliation lookups, the registry table and (if keyed) the chat backend
    pub fn from_config(config: Config) -> Result<Self, PipelineError> {
        let works = OpenAlexSource::new(&config.openalex)?;
        let lookups: Vec<Box<dyn AffiliationLookup>> = vec![
            Box::new(OrcidSource::new(&config.orcid)?),
            Box::new(works.clone()),
        ];
        let ror_table = RorTable::load(&config.cache.ror_table)?;

        let generator: Option<Box<dyn TextGenerator>> = match OpenAiBackend::new(&config.llm) {
            Ok(backend) => Some(Box::new(backend)),
            Err(e) => {
                tracing::debug!("Summaries unavailable: {}", e);
                None
            }
        };

        Ok(Self::new(
            config,
            Box::new(works),
            AffiliationResolver::new(lookups, ror_table),
            generator,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn cache(&self, file: &str) -> SnapshotCache {
        SnapshotCache::new(&self.config.cache.directory, file)
    }

    fn progress(&self, label: &str, total: usize, options: &RunOptions) -> StageProgress {
        StageProgress::new(label, total, options.show_progress)
    }

    /// Every configured (tech, health) keyword pair
    pub fn keyword_pairs(&self) -> Vec<KeywordPair> {
        KeywordPair::cross_product(&self.config.keywords.tech, &self.config.keywords.health)
    }

    /// Load or fetch the paper store
    pub async fn papers(&self, options: StageOptions) -> Result<PaperStore, PipelineError> {
        let builder = PaperStoreBuilder::new(self.works.as_ref(), &self.config.openalex);
        Ok(builder
            .load_or_fetch(&self.keyword_pairs(), &self.cache(PAPERS_CACHE), options)
            .await?)
    }

    /// Load or aggregate the author index
    pub fn authors(
        &self,
        store: &PaperStore,
        options: StageOptions,
    ) -> Result<AuthorIndex, PipelineError> {
        Ok(load_or_aggregate(
            store,
            self.config.ranking.coauthor_threshold,
            &self.cache(AUTHORS_CACHE),
            options,
        )?)
    }

    /// Select and rank the top authors
    pub fn rank(
        &self,
        index: &AuthorIndex,
        store: &PaperStore,
    ) -> IndexMap<String, ResearcherProfile> {
        Ranker::from_config(&self.config.ranking).rank(index, store)
    }

    /// Run every stage and write the outputs
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport, PipelineError> {
        let store = self.papers(options.papers).await?;
        let index = self.authors(&store, options.authors)?;
        let mut profiles = self.rank(&index, &store);

        let mut report = RunReport {
            papers: store.len(),
            authors: index.len(),
            selected: profiles.len(),
            ..Default::default()
        };

        let progress = self.progress("Affiliations", profiles.len(), options);
        report.new_affiliations = self
            .resolver
            .enrich(
                &mut profiles,
                &self.cache(AFFILIATIONS_CACHE),
                options.affiliations,
                &progress,
            )
            .await?;

        match (&self.generator, options.skip_summaries) {
            (_, true) => tracing::info!("Skipping summaries"),
            (None, false) => tracing::warn!("No API key configured; skipping summaries"),
            (Some(generator), false) => {
                let summarizer =
                    Summarizer::new(generator.as_ref(), &self.config.llm, &self.config.ranking);
                let progress = self.progress("Summaries", profiles.len(), options);
                let added = summarizer
                    .enrich(
                        &mut profiles,
                        &store,
                        &self.cache(SUMMARIES_CACHE),
                        options.summaries,
                        &progress,
                    )
                    .await?;
                report.new_summaries = Some(added);
            }
        }

        write_outputs(&self.config.output.directory, &profiles, &store)?;
        Ok(report)
    }
}
