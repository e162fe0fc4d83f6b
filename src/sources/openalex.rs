//! OpenAlex research source implementation.
//!
//! Provides cursor-paginated works search and the author endpoint used as the
//! fallback affiliation source.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{status_error, text_at, AffiliationLookup, SourceError, WorksSource};
use crate::config::OpenAlexConfig;
use crate::models::{AffiliationProfile, Author, WorksQuery};
use crate::utils::HttpClient;

/// OpenAlex research source
///
/// Uses the OpenAlex REST API.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
    page_delay: Duration,
}

impl OpenAlexSource {
    /// Create a source from configuration
    pub fn new(config: &OpenAlexConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::with_contact(config.email.as_deref())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            page_delay: config.page_delay(),
        })
    }

    /// Build request URL
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Fetch one page of a works search
    async fn fetch_page(&self, query: &WorksQuery, cursor: &str) -> Result<WorksPage, SourceError> {
        let mut params = vec![
            ("search", query.search.clone()),
            ("filter", query.filter()),
            ("per-page", query.per_page.to_string()),
            ("sort", "relevance_score:desc".to_string()),
            ("cursor", cursor.to_string()),
        ];
        // Email for the polite pool
        if let Some(ref email) = self.email {
            params.push(("mailto", email.clone()));
        }

        let response = self
            .client
            .client()
            .get(self.build_url("/works"))
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search OpenAlex: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error("OpenAlex", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl WorksSource for OpenAlexSource {
    fn name(&self) -> &str {
        "OpenAlex"
    }

    async fn search_works(&self, query: &WorksQuery) -> Result<Vec<Work>, SourceError> {
        let mut results = Vec::new();
        let mut cursor = "*".to_string();

        for page in 1..=query.max_pages.max(1) {
            tracing::debug!("Fetching page {} for {}", page, query.search);
            let data = self.fetch_page(query, &cursor).await?;

            results.extend(data.results);
            tracing::debug!(
                "Got {}/{} for {}",
                results.len(),
                data.meta.count.unwrap_or_default(),
                query.search
            );

            tokio::time::sleep(self.page_delay).await;

            match data.meta.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(results)
    }
}

#[async_trait]
impl AffiliationLookup for OpenAlexSource {
    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn applies(&self, _author: &Author, current: &AffiliationProfile) -> bool {
        current.org.is_none() || current.ror.is_none()
    }

    async fn lookup(&self, author: &Author) -> Result<AffiliationProfile, SourceError> {
        let url = self.build_url(&format!("/authors/{}", author.short_id()));

        let response = self
            .client
            .client()
            .get(&url)
            .query(&[("select", "last_known_institutions")])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch author: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error("OpenAlex", response.status()));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(AffiliationProfile {
            org: text_at(&data, "/last_known_institutions/0/display_name"),
            ror: text_at(&data, "/last_known_institutions/0/ror"),
            ..Default::default()
        })
    }
}

// ===== OpenAlex API Types =====

/// A raw work record as returned by the works endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Work {
    pub id: Option<String>,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub publication_date: Option<String>,
    pub publication_year: Option<i32>,
    pub cited_by_count: Option<u64>,
    pub relevance_score: Option<f64>,
    pub ids: Option<IndexMap<String, Value>>,
    pub primary_location: Option<WorkLocation>,
    #[serde(default)]
    pub authorships: Vec<WorkAuthorship>,
    /// Word → token positions
    pub abstract_inverted_index: Option<IndexMap<String, Vec<usize>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkLocation {
    pub source: Option<VenueRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueRef {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkAuthorship {
    #[serde(default)]
    pub author: WorkAuthor,
    pub author_position: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkAuthor {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub orcid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorksPage {
    #[serde(default)]
    results: Vec<Work>,
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct Meta {
    count: Option<u64>,
    next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn test_source(base_url: &str) -> OpenAlexSource {
        OpenAlexSource::new(&OpenAlexConfig {
            base_url: base_url.to_string(),
            email: None,
            per_page: 2,
            max_pages: 10,
            language: "en".to_string(),
            page_delay_ms: 0,
        })
        .unwrap()
    }

    fn page(ids: &[&str], next_cursor: Option<&str>) -> String {
        let results: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "title": format!("Paper {}", id), "cited_by_count": 1}))
            .collect();
        json!({"meta": {"count": 3, "next_cursor": next_cursor}, "results": results}).to_string()
    }

    #[tokio::test]
    async fn test_search_follows_cursor() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/works")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("cursor".into(), "*".into()),
                Matcher::UrlEncoded("search".into(), "robotics AND frailty".into()),
                Matcher::UrlEncoded("filter".into(), "language:en".into()),
                Matcher::UrlEncoded("sort".into(), "relevance_score:desc".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(&["W1", "W2"], Some("abc")))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/works")
            .match_query(Matcher::UrlEncoded("cursor".into(), "abc".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(&["W3"], None))
            .create_async()
            .await;

        let source = test_source(&server.url());
        let works = source
            .search_works(&WorksQuery::new("robotics AND frailty"))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        let ids: Vec<_> = works.iter().filter_map(|w| w.id.as_deref()).collect();
        assert_eq!(ids, vec!["W1", "W2", "W3"]);
    }

    #[tokio::test]
    async fn test_search_respects_page_ceiling() {
        let mut server = mockito::Server::new_async().await;
        let endless = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(&["W1"], Some("again")))
            .expect(2)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let works = source
            .search_works(&WorksQuery::new("genai").max_pages(2))
            .await
            .unwrap();

        endless.assert_async().await;
        assert_eq!(works.len(), 2);
    }

    #[tokio::test]
    async fn test_search_error_status_fails_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = test_source(&server.url());
        let result = source.search_works(&WorksQuery::new("genai")).await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[tokio::test]
    async fn test_author_lookup_extracts_first_institution() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/authors/A42")
            .match_query(Matcher::UrlEncoded(
                "select".into(),
                "last_known_institutions".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"last_known_institutions": [
                    {"display_name": "University of Massachusetts Amherst", "ror": "https://ror.org/0072zz521"},
                    {"display_name": "Elsewhere", "ror": "https://ror.org/x"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let source = test_source(&server.url());
        let author = Author::new("https://openalex.org/A42", None, None);
        let profile = source.lookup(&author).await.unwrap();

        assert_eq!(profile.org.as_deref(), Some("University of Massachusetts Amherst"));
        assert_eq!(profile.ror.as_deref(), Some("https://ror.org/0072zz521"));
        assert_eq!(profile.title, None);
    }

    #[tokio::test]
    async fn test_author_lookup_tolerates_missing_institutions() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/authors/A7")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"last_known_institutions": []}).to_string())
            .create_async()
            .await;

        let source = test_source(&server.url());
        let profile = source.lookup(&Author::new("A7", None, None)).await.unwrap();
        assert_eq!(profile, AffiliationProfile::default());
    }

    #[test]
    fn test_applies_only_when_org_or_ror_missing() {
        let source = test_source("http://localhost");
        let author = Author::new("A1", None, None);

        assert!(source.applies(&author, &AffiliationProfile::default()));

        let complete = AffiliationProfile {
            org: Some("MIT".to_string()),
            ror: Some("https://ror.org/042nb2s44".to_string()),
            ..Default::default()
        };
        assert!(!source.applies(&author, &complete));
    }

    #[test]
    fn test_work_deserializes_sparse_record() {
        let work: Work = serde_json::from_value(json!({
            "id": "https://openalex.org/W1",
            "authorships": [{"author": {"id": "https://openalex.org/A1"}, "author_position": "first"}],
            "abstract_inverted_index": {"a": [0, 2], "b": [1]},
            "primary_location": {"source": null}
        }))
        .unwrap();

        assert_eq!(work.authorships.len(), 1);
        assert_eq!(work.cited_by_count, None);
        assert_eq!(work.abstract_inverted_index.unwrap()["a"], vec![0, 2]);
    }
}
