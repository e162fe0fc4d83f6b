//! Author-centric models: aggregated author records, affiliation profiles and
//! the enriched researcher profile written to the dashboard output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::AuthorPosition;

/// Counts split by authorship position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCounts {
    pub first: u64,
    pub middle: u64,
    pub last: u64,
    pub total: u64,
}

impl PositionCounts {
    /// Add `amount` to the bucket for `position` and to the total
    pub fn record(&mut self, position: AuthorPosition, amount: u64) {
        match position {
            AuthorPosition::First => self.first += amount,
            AuthorPosition::Middle => self.middle += amount,
            AuthorPosition::Last => self.last += amount,
        }
        self.total += amount;
    }

    /// Count for a single position
    pub fn get(&self, position: AuthorPosition) -> u64 {
        match position {
            AuthorPosition::First => self.first,
            AuthorPosition::Middle => self.middle,
            AuthorPosition::Last => self.last,
        }
    }
}

/// Topic (or co-author) occurrence counts in first-seen order
pub type CountMap = IndexMap<String, u64>;

/// Increment a counter, inserting it at zero on first use
pub fn bump(counts: &mut CountMap, key: &str) {
    if let Some(count) = counts.get_mut(key) {
        *count += 1;
    } else {
        counts.insert(key.to_string(), 1);
    }
}

/// Aggregated record for one author across the paper store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Bibliographic-system author identifier
    pub id: String,

    /// Display name from the first authorship seen
    #[serde(default)]
    pub display_name: Option<String>,

    /// Researcher identifier (ORCID URL) from the first authorship seen
    #[serde(default)]
    pub orcid: Option<String>,

    /// Papers by authorship position
    pub publication_count: PositionCounts,

    /// Citations received by authorship position
    pub citation_count: PositionCounts,

    /// Paper identifiers in encounter order
    #[serde(default)]
    pub papers: Vec<String>,

    #[serde(default)]
    pub tech_topics: CountMap,

    #[serde(default)]
    pub health_topics: CountMap,

    #[serde(default)]
    pub agetech_topics: CountMap,

    /// Shared-paper counts per co-author (small-team papers only)
    #[serde(default)]
    pub all_coauthors: CountMap,
}

/// All authors keyed by identifier, in encounter order
pub type AuthorIndex = IndexMap<String, Author>;

impl Author {
    /// Create an author with zeroed counters
    pub fn new(id: impl Into<String>, display_name: Option<String>, orcid: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name,
            orcid,
            publication_count: PositionCounts::default(),
            citation_count: PositionCounts::default(),
            papers: Vec::new(),
            tech_topics: CountMap::new(),
            health_topics: CountMap::new(),
            agetech_topics: CountMap::new(),
            all_coauthors: CountMap::new(),
        }
    }

    /// Name to show, falling back to the identifier
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Bare ORCID (`0000-0002-...`) with any URL prefix stripped
    pub fn orcid_id(&self) -> Option<&str> {
        self.orcid
            .as_deref()
            .and_then(|o| o.trim_end_matches('/').rsplit('/').next())
            .filter(|o| !o.is_empty())
    }

    /// Short bibliographic id (`A123...`) with the URL prefix stripped
    pub fn short_id(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// Coordinates and place names for a registry organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Best-effort organizational profile for an author
///
/// Every field is optional; a lookup that cannot supply a field leaves it `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffiliationProfile {
    pub title: Option<String>,
    pub org: Option<String>,
    pub unit: Option<String>,
    pub url: Option<String>,
    pub ror: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl AffiliationProfile {
    /// Copy fields from `other` only where this profile has none
    pub fn fill_missing(&mut self, other: AffiliationProfile) {
        fill(&mut self.title, other.title);
        fill(&mut self.org, other.org);
        fill(&mut self.unit, other.unit);
        fill(&mut self.url, other.url);
        fill(&mut self.ror, other.ror);
        fill(&mut self.city, other.city);
        fill(&mut self.region, other.region);
        fill(&mut self.country, other.country);
        fill(&mut self.lat, other.lat);
        fill(&mut self.lon, other.lon);
    }

    /// Overwrite all five location fields; `None` clears them
    pub fn set_location(&mut self, location: Option<&GeoLocation>) {
        let location = location.cloned().unwrap_or_default();
        self.city = location.city;
        self.region = location.region;
        self.country = location.country;
        self.lat = location.lat;
        self.lon = location.lon;
    }

    /// "title, unit, org" using whichever parts are known
    pub fn affiliation_line(&self) -> String {
        [&self.title, &self.unit, &self.org]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// "city, region, country"; region is dropped when it repeats the city
    pub fn location_line(&self) -> String {
        let region = self
            .region
            .as_deref()
            .filter(|r| Some(*r) != self.city.as_deref());
        [self.city.as_deref(), region, self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether coordinates are known
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

/// An enriched author as written to `authors.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearcherProfile {
    #[serde(flatten)]
    pub author: Author,

    #[serde(default)]
    pub top_tech_topics: Vec<(String, u64)>,

    #[serde(default)]
    pub top_health_topics: Vec<(String, u64)>,

    #[serde(default)]
    pub top_agetech_topics: Vec<(String, u64)>,

    /// Co-authors that are themselves selected researchers
    #[serde(default)]
    pub top_coauthors: Vec<(String, u64)>,

    #[serde(default)]
    pub most_cited_papers: Vec<String>,

    #[serde(default)]
    pub most_recent_papers: Vec<String>,

    #[serde(flatten)]
    pub affiliation: AffiliationProfile,

    #[serde(default)]
    pub ai_summary: Option<String>,
}

impl ResearcherProfile {
    /// Wrap an author with empty rankings and no enrichment
    pub fn new(author: Author) -> Self {
        Self {
            author,
            top_tech_topics: Vec::new(),
            top_health_topics: Vec::new(),
            top_agetech_topics: Vec::new(),
            top_coauthors: Vec::new(),
            most_cited_papers: Vec::new(),
            most_recent_papers: Vec::new(),
            affiliation: AffiliationProfile::default(),
            ai_summary: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.author.id
    }
}
