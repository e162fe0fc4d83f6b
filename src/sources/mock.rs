//! Mock sources for testing purposes.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::models::{AffiliationProfile, Author, WorksQuery};
use crate::sources::{
    AffiliationLookup, SourceError, TextGenerator, Work, WorkAuthor, WorkAuthorship, WorksSource,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A works source that returns predefined results per search string.
///
/// Unknown searches return no works.
#[derive(Debug, Default)]
pub struct MockWorksSource {
    responses: Mutex<HashMap<String, Vec<Work>>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockWorksSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the works returned for a search string.
    pub fn set_works(&self, search: &str, works: Vec<Work>) {
        lock(&self.responses).insert(search.to_string(), works);
    }

    /// Make a search string fail with an API error.
    pub fn set_failure(&self, search: &str) {
        lock(&self.failures).insert(search.to_string());
    }

    /// Search strings requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl WorksSource for MockWorksSource {
    fn name(&self) -> &str {
        "Mock Works"
    }

    async fn search_works(&self, query: &WorksQuery) -> Result<Vec<Work>, SourceError> {
        lock(&self.calls).push(query.search.clone());

        if lock(&self.failures).contains(&query.search) {
            return Err(SourceError::Api(format!("mock failure for {}", query.search)));
        }
        Ok(lock(&self.responses)
            .get(&query.search)
            .cloned()
            .unwrap_or_default())
    }
}

/// When a [`MockLookup`] considers itself applicable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupRule {
    Always,
    WithOrcid,
    WhenOrgOrRorMissing,
}

/// An affiliation lookup with canned profiles per author id.
#[derive(Debug)]
pub struct MockLookup {
    name: String,
    rule: LookupRule,
    profiles: Mutex<HashMap<String, AffiliationProfile>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockLookup {
    pub fn new(name: &str, rule: LookupRule) -> Self {
        Self {
            name: name.to_string(),
            rule,
            profiles: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the partial profile returned for an author.
    pub fn set_profile(&self, author_id: &str, profile: AffiliationProfile) {
        lock(&self.profiles).insert(author_id.to_string(), profile);
    }

    /// Make lookups for an author fail.
    pub fn set_failure(&self, author_id: &str) {
        lock(&self.failures).insert(author_id.to_string());
    }

    /// Author ids looked up so far, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl AffiliationLookup for MockLookup {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies(&self, author: &Author, current: &AffiliationProfile) -> bool {
        match self.rule {
            LookupRule::Always => true,
            LookupRule::WithOrcid => author.orcid_id().is_some(),
            LookupRule::WhenOrgOrRorMissing => current.org.is_none() || current.ror.is_none(),
        }
    }

    async fn lookup(&self, author: &Author) -> Result<AffiliationProfile, SourceError> {
        lock(&self.calls).push(author.id.clone());

        if lock(&self.failures).contains(&author.id) {
            return Err(SourceError::Network(format!("mock failure for {}", author.id)));
        }
        Ok(lock(&self.profiles)
            .get(&author.id)
            .cloned()
            .unwrap_or_default())
    }
}

/// A text generator that echoes a fixed reply and records every prompt.
#[derive(Debug)]
pub struct MockGenerator {
    reply: String,
    failing_names: Mutex<Vec<String>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failing_names: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail any request whose user prompt mentions `name`.
    pub fn fail_for(&self, name: &str) {
        lock(&self.failing_names).push(name.to_string());
    }

    /// (system, user) prompts received so far.
    pub fn prompts(&self) -> Vec<(String, String)> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, SourceError> {
        lock(&self.prompts).push((system.to_string(), user.to_string()));

        if lock(&self.failing_names).iter().any(|name| user.contains(name.as_str())) {
            return Err(SourceError::Api("mock generator failure".to_string()));
        }
        Ok(self.reply.clone())
    }
}

/// Helper function to create a raw work for testing.
///
/// `authors` holds `(author id, display name, position)` triples.
pub fn make_work(
    id: &str,
    cited_by_count: u64,
    publication_date: &str,
    authors: &[(&str, &str, &str)],
) -> Work {
    Work {
        id: Some(id.to_string()),
        title: Some(format!("Title of {}", id)),
        publication_date: Some(publication_date.to_string()),
        publication_year: publication_date.get(..4).and_then(|y| y.parse().ok()),
        cited_by_count: Some(cited_by_count),
        relevance_score: Some(1.0),
        ids: Some(IndexMap::from([(
            "openalex".to_string(),
            serde_json::Value::String(id.to_string()),
        )])),
        authorships: authors
            .iter()
            .map(|(author_id, name, position)| WorkAuthorship {
                author: WorkAuthor {
                    id: Some(author_id.to_string()),
                    display_name: Some(name.to_string()),
                    orcid: None,
                },
                author_position: Some(position.to_string()),
            })
            .collect(),
        abstract_inverted_index: Some(IndexMap::from([
            ("Abstract".to_string(), vec![0]),
            ("of".to_string(), vec![1]),
            (id.to_string(), vec![2]),
        ])),
        ..Default::default()
    }
}
