//! Core data models for papers, authors and researcher profiles.

mod author;
mod paper;
mod search;

pub use author::{
    bump, AffiliationProfile, Author, AuthorIndex, CountMap, GeoLocation, PositionCounts,
    ResearcherProfile,
};
pub use paper::{AuthorPosition, Authorship, Paper, PaperBuilder, PaperStore};
pub use search::{quote, KeywordPair, WorksQuery};
