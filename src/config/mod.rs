//! Configuration management.
//!
//! Settings are layered: compiled defaults, then an optional TOML file, then
//! environment variables prefixed with `AGETECH_KB` (nested keys separated by
//! `__`, e.g. `AGETECH_KB_RANKING__TOP_AUTHORS=50`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [keywords]
//! tech = ["machine learning", "robotics"]
//! health = ["dementia", "frailty"]
//!
//! [openalex]
//! base_url = "https://api.openalex.org"
//! email = "you@example.org"
//! per_page = 200
//! max_pages = 10
//! language = "en"
//! page_delay_ms = 100
//!
//! [orcid]
//! base_url = "https://pub.orcid.org/v3.0"
//!
//! [llm]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4.1-mini"
//!
//! [ranking]
//! top_authors = 100
//! coauthor_threshold = 10
//!
//! [cache]
//! directory = "cache"
//! ror_table = "cache/ror.csv"
//!
//! [output]
//! directory = "."
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file name searched for in the working directory
pub const CONFIG_FILE_NAME: &str = "agetech-kb.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub openalex: OpenAlexConfig,

    #[serde(default)]
    pub orcid: OrcidConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Search keyword lists; every tech keyword is paired with every health keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default = "default_tech_keywords")]
    pub tech: Vec<String>,

    #[serde(default = "default_health_keywords")]
    pub health: Vec<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            tech: default_tech_keywords(),
            health: default_health_keywords(),
        }
    }
}

fn default_tech_keywords() -> Vec<String> {
    [
        "artificial intelligence",
        "machine learning",
        "computer vision",
        "robotics",
        "large language models",
        "genai",
        "neural networks",
        "wearables",
        "remote sensing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_health_keywords() -> Vec<String> {
    [
        "healthy aging",
        "dementia",
        "alzheimers disease",
        "cognitive impairment",
        "frailty",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// OpenAlex works/authors API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAlexConfig {
    #[serde(default = "default_openalex_url")]
    pub base_url: String,

    /// Contact email for the polite pool
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Page ceiling per keyword-pair query
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(default = "default_language")]
    pub language: String,

    /// Fixed pause after every page and every keyword pair
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: default_openalex_url(),
            email: std::env::var("OPENALEX_EMAIL").ok(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            language: default_language(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

impl OpenAlexConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

fn default_openalex_url() -> String {
    "https://api.openalex.org".to_string()
}

fn default_per_page() -> u32 {
    200
}

fn default_max_pages() -> u32 {
    10
}

fn default_language() -> String {
    "en".to_string()
}

fn default_page_delay_ms() -> u64 {
    100
}

/// ORCID public API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrcidConfig {
    #[serde(default = "default_orcid_url")]
    pub base_url: String,
}

impl Default for OrcidConfig {
    fn default() -> Self {
        Self {
            base_url: default_orcid_url(),
        }
    }
}

fn default_orcid_url() -> String {
    "https://pub.orcid.org/v3.0".to_string()
}

/// Chat-completion backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key; defaults to `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_llm_model(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful research assistant.".to_string()
}

/// Selection and ranking policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Number of authors selected for enrichment
    #[serde(default = "default_top_authors")]
    pub top_authors: usize,

    #[serde(default = "default_top_topics")]
    pub top_topics: usize,

    /// Length of the most-cited / most-recent lists
    #[serde(default = "default_top_papers")]
    pub top_papers: usize,

    /// Papers with at least this many authorships add no co-author counts
    #[serde(default = "default_coauthor_threshold")]
    pub coauthor_threshold: usize,

    /// Papers per ranking fed to the summarizer
    #[serde(default = "default_summary_papers")]
    pub summary_papers: usize,

    /// Co-author ceiling for papers fed to the summarizer
    #[serde(default = "default_summary_max_coauthors")]
    pub summary_max_coauthors: usize,

    /// Treat cached null summaries as missing and request them again
    #[serde(default)]
    pub retry_failed_summaries: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_authors: default_top_authors(),
            top_topics: default_top_topics(),
            top_papers: default_top_papers(),
            coauthor_threshold: default_coauthor_threshold(),
            summary_papers: default_summary_papers(),
            summary_max_coauthors: default_summary_max_coauthors(),
            retry_failed_summaries: false,
        }
    }
}

fn default_top_authors() -> usize {
    100
}

fn default_top_topics() -> usize {
    10
}

fn default_top_papers() -> usize {
    5
}

fn default_coauthor_threshold() -> usize {
    10
}

fn default_summary_papers() -> usize {
    5
}

fn default_summary_max_coauthors() -> usize {
    10
}

/// Snapshot cache locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,

    /// Registry (ROR) data dump in CSV form
    #[serde(default = "default_ror_table")]
    pub ror_table: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
            ror_table: default_ror_table(),
        }
    }
}

/// Default snapshot cache directory
pub fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_ror_table() -> PathBuf {
    default_cache_dir().join("ror.csv")
}

/// Final output location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Load configuration: defaults, then `path` (if any), then environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder =
        config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("AGETECH_KB")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("keywords.tech")
                .with_list_parse_key("keywords.health")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;
    // The key is never serialized, so the defaults layer cannot carry it.
    if config.llm.api_key.is_none() {
        config.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    Ok(config)
}

/// Find a config file in the working directory or the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("agetech-kb").join("config.toml"))
        .filter(|path| path.is_file())
}

impl Config {
    /// Render as TOML (the API key is never written)
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write the configuration as a TOML file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = self
            .to_toml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.keywords.tech.len(), 9);
        assert_eq!(config.keywords.health.len(), 5);
        assert_eq!(config.openalex.per_page, 200);
        assert_eq!(config.openalex.max_pages, 10);
        assert_eq!(config.ranking.coauthor_threshold, 10);
        assert_eq!(config.ranking.top_topics, 10);
        assert_eq!(config.llm.model, "gpt-4.1-mini");
    }

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[keywords]
tech = ["robotics"]
health = ["frailty", "dementia"]

[openalex]
max_pages = 3
page_delay_ms = 0

[ranking]
top_authors = 25
coauthor_threshold = 6

[cache]
directory = "/tmp/kb-cache"
"#;
        std::fs::write(&path, toml_content).unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.keywords.tech, vec!["robotics"]);
        assert_eq!(config.keywords.health, vec!["frailty", "dementia"]);
        assert_eq!(config.openalex.max_pages, 3);
        assert_eq!(config.openalex.page_delay(), Duration::ZERO);
        assert_eq!(config.openalex.per_page, 200);
        assert_eq!(config.ranking.top_authors, 25);
        assert_eq!(config.ranking.coauthor_threshold, 6);
        assert_eq!(config.cache.directory, PathBuf::from("/tmp/kb-cache"));
        assert_eq!(config.output.directory, PathBuf::from("."));
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.ranking.top_authors = 7;
        config.llm.api_key = Some("secret".to_string());
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.ranking.top_authors, 7);
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
