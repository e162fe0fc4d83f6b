//! Paper model: one deduplicated bibliographic record in the paper store.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::KeywordPair;

/// Maximum number of author names printed in a citation line
const CITATION_MAX_AUTHORS: usize = 10;

/// An author's role-order on a paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorPosition {
    First,
    Middle,
    Last,
}

impl AuthorPosition {
    /// Parse the API's position string; anything unrecognised is treated as middle
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("first") => AuthorPosition::First,
            Some("last") => AuthorPosition::Last,
            _ => AuthorPosition::Middle,
        }
    }
}

impl std::fmt::Display for AuthorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthorPosition::First => "first",
            AuthorPosition::Middle => "middle",
            AuthorPosition::Last => "last",
        };
        write!(f, "{}", name)
    }
}

/// One entry of a paper's ordered author list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorship {
    /// Bibliographic-system author identifier
    pub author_id: String,

    /// Author display name as printed on this paper
    #[serde(default)]
    pub display_name: Option<String>,

    /// Researcher identifier (ORCID URL), when known
    #[serde(default)]
    pub orcid: Option<String>,

    /// Position held on this paper
    pub position: AuthorPosition,
}

/// A research paper in the deduplicated paper store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Globally unique identifier (OpenAlex work URL)
    pub id: String,

    /// Digital Object Identifier URL
    #[serde(default)]
    pub doi: Option<String>,

    /// Paper title
    #[serde(default)]
    pub title: Option<String>,

    /// Publication date (ISO 8601 date)
    #[serde(default)]
    pub publication_date: Option<String>,

    /// Publication year
    #[serde(default)]
    pub publication_year: Option<i32>,

    /// Number of citing works
    #[serde(default)]
    pub cited_by_count: u64,

    /// Relevance score reported by the search that first returned this paper
    #[serde(default)]
    pub relevance_score: Option<f64>,

    /// External identifiers (openalex, doi, pmid, pmcid, mag, ...)
    #[serde(default)]
    pub ids: IndexMap<String, serde_json::Value>,

    /// Display name of the primary source venue
    #[serde(default)]
    pub venue: Option<String>,

    /// Ordered author list
    #[serde(default)]
    pub authorships: Vec<Authorship>,

    /// Plain-text abstract, `None` when the source had no inverted index
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,

    /// Technology keyword of every query that returned this paper
    #[serde(default)]
    pub tech_topics: Vec<String>,

    /// Health keyword of every query that returned this paper
    #[serde(default)]
    pub health_topics: Vec<String>,

    /// Combined label of every query that returned this paper
    #[serde(default)]
    pub agetech_topics: Vec<String>,

    /// Authorship count as reported by the source, anonymous and repeated
    /// entries included
    #[serde(default)]
    pub authorship_count: usize,
}

/// Deduplicated paper collection keyed by paper id, in encounter order
pub type PaperStore = IndexMap<String, Paper>;

impl Paper {
    /// Create a paper with only its identifier set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doi: None,
            title: None,
            publication_date: None,
            publication_year: None,
            cited_by_count: 0,
            relevance_score: None,
            ids: IndexMap::new(),
            venue: None,
            authorships: Vec::new(),
            abstract_text: None,
            tech_topics: Vec::new(),
            health_topics: Vec::new(),
            agetech_topics: Vec::new(),
            authorship_count: 0,
        }
    }

    /// Append the keywords of a query that returned this paper
    pub fn tag(&mut self, pair: &KeywordPair) {
        self.tech_topics.push(pair.tech.clone());
        self.health_topics.push(pair.health.clone());
        self.agetech_topics.push(pair.label());
    }

    /// Whether a plain-text abstract is available
    pub fn has_abstract(&self) -> bool {
        self.abstract_text.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Number of authorships on this paper
    ///
    /// Uses the source's count when it is larger than the stored author list.
    pub fn author_count(&self) -> usize {
        self.authorship_count.max(self.authorships.len())
    }

    /// Author identifiers in authorship order
    pub fn author_ids(&self) -> Vec<&str> {
        self.authorships.iter().map(|a| a.author_id.as_str()).collect()
    }

    /// Author display names in authorship order (empty string when unknown)
    pub fn author_names(&self) -> Vec<&str> {
        self.authorships
            .iter()
            .map(|a| a.display_name.as_deref().unwrap_or_default())
            .collect()
    }

    /// Parsed publication date, if present and well-formed
    pub fn published_on(&self) -> Option<NaiveDate> {
        self.publication_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// Single-line citation: authors, title, venue, year and citation count
    pub fn citation(&self) -> String {
        let names = self.author_names();
        let authors = if names.len() > CITATION_MAX_AUTHORS {
            format!(
                "{}, and additional authors",
                names[..CITATION_MAX_AUTHORS].join(", ")
            )
        } else {
            names.join(", ")
        };

        let mut cite = format!("{}. {}.", authors, self.title.as_deref().unwrap_or("Untitled"));
        if let Some(venue) = self.venue.as_deref().filter(|v| !v.is_empty()) {
            cite.push_str(&format!(" {}.", venue));
        }
        if let Some(year) = self.publication_year {
            cite.push_str(&format!(" {}.", year));
        }
        cite.push_str(&format!(" (Cited by {})", self.cited_by_count));
        cite
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with the paper identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            paper: Paper::new(id),
        }
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.paper.title = Some(title.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = Some(doi.into());
        self
    }

    /// Set publication date (also derives the year when it parses)
    pub fn publication_date(mut self, date: impl Into<String>) -> Self {
        self.paper.publication_date = Some(date.into());
        if self.paper.publication_year.is_none() {
            self.paper.publication_year = self
                .paper
                .publication_date
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok());
        }
        self
    }

    /// Set publication year
    pub fn publication_year(mut self, year: i32) -> Self {
        self.paper.publication_year = Some(year);
        self
    }

    /// Set citation count
    pub fn cited_by(mut self, count: u64) -> Self {
        self.paper.cited_by_count = count;
        self
    }

    /// Set relevance score
    pub fn relevance_score(mut self, score: f64) -> Self {
        self.paper.relevance_score = Some(score);
        self
    }

    /// Add an external identifier
    pub fn external_id(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.paper
            .ids
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Set venue name
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.paper.venue = Some(venue.into());
        self
    }

    /// Append an authorship
    pub fn author(
        mut self,
        author_id: impl Into<String>,
        display_name: impl Into<String>,
        position: AuthorPosition,
    ) -> Self {
        self.paper.authorships.push(Authorship {
            author_id: author_id.into(),
            display_name: Some(display_name.into()),
            orcid: None,
            position,
        });
        self
    }

    /// Append an authorship carrying a researcher identifier
    pub fn author_with_orcid(
        mut self,
        author_id: impl Into<String>,
        display_name: impl Into<String>,
        orcid: impl Into<String>,
        position: AuthorPosition,
    ) -> Self {
        self.paper.authorships.push(Authorship {
            author_id: author_id.into(),
            display_name: Some(display_name.into()),
            orcid: Some(orcid.into()),
            position,
        });
        self
    }

    /// Set the plain-text abstract
    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.paper.abstract_text = Some(text.into());
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}
