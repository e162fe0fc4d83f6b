//! # AgeTech Knowledge Base
//!
//! Builds a researcher knowledge base for technology-and-aging research:
//! keyword-pair searches over OpenAlex are folded into an author-centric
//! index, ranked, and enriched with affiliations (ORCID, OpenAlex, ROR) and
//! AI-written biographies.
//!
//! ## Architecture
//!
//! - [`models`]: Papers, authors, affiliation and researcher profiles
//! - [`sources`]: External APIs behind the `WorksSource`, `AffiliationLookup`
//!   and `TextGenerator` traits
//! - [`pipeline`]: Paper store, aggregation, ranking and enrichment stages
//! - [`utils`]: HTTP client, snapshot caches, registry table, progress
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output helpers

pub mod config;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Author, Paper, ResearcherProfile};
pub use pipeline::{Pipeline, PipelineError, RunOptions, RunReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
