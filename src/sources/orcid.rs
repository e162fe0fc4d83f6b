//! ORCID public API source.
//!
//! Supplies the highest-priority affiliation data (latest employment record)
//! and researcher biographies.

use async_trait::async_trait;
use serde_json::Value;

use super::{status_error, text_at, AffiliationLookup, SourceError};
use crate::config::OrcidConfig;
use crate::models::{AffiliationProfile, Author};
use crate::utils::HttpClient;

const EMPLOYMENT: &str = "/affiliation-group/0/summaries/0/employment-summary";

/// ORCID research source
#[derive(Debug, Clone)]
pub struct OrcidSource {
    client: HttpClient,
    base_url: String,
}

impl OrcidSource {
    pub fn new(config: &OrcidConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `{base}/{orcid}/{record}` as JSON
    async fn fetch_record(&self, orcid: &str, record: &str) -> Result<Value, SourceError> {
        let url = format!("{}/{}/{}", self.base_url, orcid, record);
        tracing::debug!("ORCID request: {}", url);

        let response = self
            .client
            .client()
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch ORCID {}: {}", record, e)))?;

        if !response.status().is_success() {
            return Err(status_error("ORCID", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))
    }

    /// Free-text biography from the person record, if the researcher wrote one
    pub async fn biography(&self, orcid: &str) -> Result<Option<String>, SourceError> {
        let data = self.fetch_record(orcid, "person").await?;
        Ok(text_at(&data, "/biography/content").or_else(|| text_at(&data, "/biography")))
    }
}

/// Latest employment entry mapped to a partial profile
fn employment_profile(data: &Value) -> AffiliationProfile {
    let field = |path: &str| text_at(data, &format!("{}{}", EMPLOYMENT, path));

    AffiliationProfile {
        title: field("/role-title"),
        unit: field("/department-name"),
        org: field("/organization/name"),
        url: field("/url/value"),
        ror: field(
            "/organization/disambiguated-organization/disambiguated-organization-identifier",
        ),
        ..Default::default()
    }
}

#[async_trait]
impl AffiliationLookup for OrcidSource {
    fn name(&self) -> &str {
        "ORCID"
    }

    fn applies(&self, author: &Author, _current: &AffiliationProfile) -> bool {
        author.orcid_id().is_some()
    }

    async fn lookup(&self, author: &Author) -> Result<AffiliationProfile, SourceError> {
        let orcid = author
            .orcid_id()
            .ok_or_else(|| SourceError::NotFound(format!("{} has no ORCID", author.id)))?;
        let data = self.fetch_record(orcid, "employments").await?;
        Ok(employment_profile(&data))
    }
}
