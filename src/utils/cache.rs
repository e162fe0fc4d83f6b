//! Snapshot caches for pipeline stages.
//!
//! Each stage persists one pretty-printed JSON object keyed by the stage's
//! natural key (paper id, author id).
//!
//! # Cache Structure
//!
//! ```text
//! cache/
//!   all_papers.json      paper id  -> paper
//!   all_authors.json     author id -> aggregated author
//!   affiliations.json    author id -> affiliation profile
//!   ai_summaries.json    author id -> summary (or null)
//!   ror.csv              registry reference table (read-only)
//! ```
//!
//! An absent file is a miss. A file that exists but cannot be parsed is an
//! error: stale or hand-edited snapshots are never silently discarded.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Paper store snapshot
pub const PAPERS_CACHE: &str = "all_papers.json";

/// Author index snapshot
pub const AUTHORS_CACHE: &str = "all_authors.json";

/// Affiliation profiles keyed by author id
pub const AFFILIATIONS_CACHE: &str = "affiliations.json";

/// AI summaries keyed by author id
pub const SUMMARIES_CACHE: &str = "ai_summaries.json";

/// Errors reading or writing a snapshot
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-stage cache switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    /// Ignore any existing snapshot and rebuild
    pub from_scratch: bool,

    /// Persist new entries (enrichment stages only)
    pub update_cache: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            from_scratch: false,
            update_cache: true,
        }
    }
}

impl StageOptions {
    /// Options that bypass the existing snapshot
    pub fn from_scratch() -> Self {
        Self {
            from_scratch: true,
            ..Default::default()
        }
    }
}

/// One JSON snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    /// Snapshot named `file_name` inside `directory`
    pub fn new(directory: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: directory.as_ref().join(file_name),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the snapshot file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the snapshot; `Ok(None)` when the file is absent
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, CacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Cache MISS: {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let value = serde_json::from_str(&content).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!("Cache HIT: {}", self.path.display());
        Ok(Some(value))
    }

    /// Read the snapshot unless `from_scratch` is set
    pub fn load_unless<T: DeserializeOwned>(
        &self,
        options: StageOptions,
    ) -> Result<Option<T>, CacheError> {
        if options.from_scratch {
            tracing::debug!("Cache bypassed: {}", self.path.display());
            return Ok(None);
        }
        self.load()
    }

    /// Serialize and write the snapshot, creating the directory if needed
    pub fn store<T: Serialize>(&self, value: &T) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(value).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(io_err)?;
        tracing::debug!("Cache written: {}", self.path.display());
        Ok(())
    }
}
