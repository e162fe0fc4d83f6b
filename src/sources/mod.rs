//! External data sources behind trait seams.
//!
//! The pipeline never talks to the network directly. It works against three
//! traits, each with a production implementation and a mock in [`mock`]:
//!
//! - [`WorksSource`]: paginated keyword search over bibliographic works
//!   ([`OpenAlexSource`])
//! - [`AffiliationLookup`]: one identity/affiliation source consulted while
//!   resolving an author's organization ([`OrcidSource`], [`OpenAlexSource`])
//! - [`TextGenerator`]: chat-style completion backend ([`OpenAiBackend`])
//!
//! # Adding an affiliation source
//!
//! 1. Implement [`AffiliationLookup`], returning a partial
//!    [`AffiliationProfile`] with only the fields the source knows
//! 2. Decide in `applies` when the source is worth calling
//! 3. Insert it into the resolver's lookup list at its priority position

mod openai;
mod openalex;
mod orcid;

pub mod mock;

pub use openai::{ChatMessage, OpenAiBackend};
pub use openalex::{OpenAlexSource, VenueRef, Work, WorkAuthor, WorkAuthorship, WorkLocation};
pub use orcid::OrcidSource;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{AffiliationProfile, Author, WorksQuery};

/// Paginated search over bibliographic works
#[async_trait]
pub trait WorksSource: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch every page of results for `query`, bounded by `query.max_pages`
    ///
    /// A non-success response on any page fails the whole query.
    async fn search_works(&self, query: &WorksQuery) -> Result<Vec<Work>, SourceError>;
}

#[async_trait]
impl<T: WorksSource + ?Sized> WorksSource for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn search_works(&self, query: &WorksQuery) -> Result<Vec<Work>, SourceError> {
        (**self).search_works(query).await
    }
}

/// One source of affiliation data, consulted in priority order
#[async_trait]
pub trait AffiliationLookup: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Whether the lookup should run, given the profile resolved so far
    fn applies(&self, author: &Author, current: &AffiliationProfile) -> bool;

    /// Partial profile holding only the fields this source could supply
    async fn lookup(&self, author: &Author) -> Result<AffiliationProfile, SourceError>;
}

#[async_trait]
impl<T: AffiliationLookup + ?Sized> AffiliationLookup for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn applies(&self, author: &Author, current: &AffiliationProfile) -> bool {
        (**self).applies(author, current)
    }

    async fn lookup(&self, author: &Author) -> Result<AffiliationProfile, SourceError> {
        (**self).lookup(author).await
    }
}

/// Chat-style text completion backend
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Complete a system + user prompt, returning the trimmed reply
    async fn complete(&self, system: &str, user: &str) -> Result<String, SourceError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn model(&self) -> &str {
        (**self).model()
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, SourceError> {
        (**self).complete(system, user).await
    }
}

/// Non-empty string at a JSON pointer, or `None` for any missing or mistyped step
pub fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status from the API
    #[error("API error: {0}")]
    Api(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Source is not usable with the current configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Map a non-success status to [`SourceError`]
pub(crate) fn status_error(source: &str, status: reqwest::StatusCode) -> SourceError {
    if status == reqwest::StatusCode::NOT_FOUND {
        SourceError::NotFound(format!("{} returned status: {}", source, status))
    } else {
        SourceError::Api(format!("{} returned status: {}", source, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_at() {
        let data = json!({
            "group": [{"name": "  MIT ", "empty": "", "nested": {"id": 7}}]
        });

        assert_eq!(text_at(&data, "/group/0/name"), Some("MIT".to_string()));
        assert_eq!(text_at(&data, "/group/0/empty"), None);
        assert_eq!(text_at(&data, "/group/0/nested/id"), None);
        assert_eq!(text_at(&data, "/group/1/name"), None);
        assert_eq!(text_at(&json!(null), "/group"), None);
    }

    #[test]
    fn test_status_error() {
        assert!(matches!(
            status_error("ORCID", reqwest::StatusCode::NOT_FOUND),
            SourceError::NotFound(_)
        ));
        assert!(matches!(
            status_error("ORCID", reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            SourceError::Api(_)
        ));
    }
}
