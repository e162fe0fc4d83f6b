//! Keyword-pair search models.

use serde::{Deserialize, Serialize};

/// Wrap a keyword in double quotes when it contains whitespace
///
/// Multi-word keywords must be quoted so the search API treats them as a
/// phrase inside the boolean query.
pub fn quote(keyword: &str) -> String {
    if keyword.chars().any(char::is_whitespace) {
        format!("\"{}\"", keyword)
    } else {
        keyword.to_string()
    }
}

/// One (technology, health) keyword combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeywordPair {
    /// Technology keyword (e.g. "machine learning")
    pub tech: String,

    /// Health keyword (e.g. "dementia")
    pub health: String,
}

impl KeywordPair {
    /// Create a new keyword pair
    pub fn new(tech: impl Into<String>, health: impl Into<String>) -> Self {
        Self {
            tech: tech.into(),
            health: health.into(),
        }
    }

    /// Boolean search string sent to the works endpoint
    pub fn query_string(&self) -> String {
        format!("{} AND {}", quote(&self.tech), quote(&self.health))
    }

    /// Combined topic label recorded in `agetech_topics`
    pub fn label(&self) -> String {
        format!("{} x {}", quote(&self.tech), quote(&self.health))
    }

    /// Cross product of technology and health keywords, technology-major
    pub fn cross_product(tech: &[String], health: &[String]) -> Vec<KeywordPair> {
        tech.iter()
            .flat_map(|t| health.iter().map(move |h| KeywordPair::new(t.clone(), h.clone())))
            .collect()
    }
}

impl std::fmt::Display for KeywordPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parameters for a paginated works search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorksQuery {
    /// Boolean search string
    pub search: String,

    /// Language restriction (ISO 639-1)
    pub language: String,

    /// Results per page
    pub per_page: u32,

    /// Upper bound on the number of pages requested
    pub max_pages: u32,
}

impl WorksQuery {
    /// Create a query with the default page size and page ceiling
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            language: "en".to_string(),
            per_page: 200,
            max_pages: 10,
        }
    }

    /// Set the language restriction
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the page size
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Set the page ceiling
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Value of the `filter` query parameter
    pub fn filter(&self) -> String {
        format!("language:{}", self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("machine learning"), "\"machine learning\"");
        assert_eq!(quote("genai"), "genai");
    }

    #[test]
    fn test_query_string_and_label() {
        let pair = KeywordPair::new("machine learning", "dementia");
        assert_eq!(pair.query_string(), "\"machine learning\" AND dementia");
        assert_eq!(pair.label(), "\"machine learning\" x dementia");
    }

    #[test]
    fn test_cross_product_order() {
        let tech = vec!["robotics".to_string(), "genai".to_string()];
        let health = vec!["frailty".to_string(), "dementia".to_string()];

        let pairs = KeywordPair::cross_product(&tech, &health);
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0], KeywordPair::new("robotics", "frailty"));
        assert_eq!(pairs[1], KeywordPair::new("robotics", "dementia"));
        assert_eq!(pairs[3], KeywordPair::new("genai", "dementia"));
    }

    #[test]
    fn test_works_query_builder() {
        let query = WorksQuery::new("robotics AND frailty")
            .language("de")
            .per_page(50)
            .max_pages(2);

        assert_eq!(query.filter(), "language:de");
        assert_eq!(query.per_page, 50);
        assert_eq!(query.max_pages, 2);
    }
}
