//! Utility modules supporting the pipeline.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and a polite-pool user agent
//! - [`SnapshotCache`]: one JSON snapshot file per pipeline stage
//! - [`StageOptions`]: per-stage "from scratch" / "update cache" switches
//! - [`RorTable`]: registry id → location reference table
//! - [`StageProgress`]: progress bar for per-author loops
//!
//! # Snapshot caches
//!
//! ```rust,no_run
//! use agetech_kb::utils::{SnapshotCache, StageOptions, AUTHORS_CACHE};
//! use agetech_kb::models::AuthorIndex;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = SnapshotCache::new("cache", AUTHORS_CACHE);
//! let authors: Option<AuthorIndex> = cache.load_unless(StageOptions::default())?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod http;
mod progress;
mod ror;

pub use cache::{
    CacheError, SnapshotCache, StageOptions, AFFILIATIONS_CACHE, AUTHORS_CACHE, PAPERS_CACHE,
    SUMMARIES_CACHE,
};
pub use http::HttpClient;
pub use progress::StageProgress;
pub use ror::{GeoTableError, RorTable};
