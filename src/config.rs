//! Configuration loader and validator for the content layer.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub search: SearchSettings,
    pub media: MediaSettings,
}

/// Where and how to reach the content repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositorySettings {
    pub api_url: String,
    #[serde(default)]
    pub cdn_url: Option<String>,
    pub dataset: String,
    pub api_version: String,
    #[serde(default = "default_true")]
    pub use_cdn: bool,
    /// Read token; only sent with draft queries.
    #[serde(default)]
    pub token: Option<String>,
}

/// Shared secret that unlocks draft mode. Empty or absent disables preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewSettings {
    #[serde(default)]
    pub secret: Option<String>,
}

/// Seconds a live query result may be served from cache, per query kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheSettings {
    #[serde(default = "default_listing_secs")]
    pub listing_secs: u64,
    #[serde(default = "default_detail_secs")]
    pub detail_secs: u64,
    #[serde(default = "default_search_secs")]
    pub search_secs: u64,
    #[serde(default = "default_taxonomy_secs")]
    pub taxonomy_secs: u64,
    /// Upper bound on cached live results; least recently used go first.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            listing_secs: default_listing_secs(),
            detail_secs: default_detail_secs(),
            search_secs: default_search_secs(),
            taxonomy_secs: default_taxonomy_secs(),
            max_entries: default_max_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSettings {
    #[serde(default = "default_min_limit")]
    pub min_limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_content_types")]
    pub content_types: Vec<ContentTypeRoute>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_limit: default_min_limit(),
            max_limit: default_max_limit(),
            default_limit: default_limit(),
            content_types: default_content_types(),
        }
    }
}

/// A searchable document type and the site section its pages live under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentTypeRoute {
    pub name: String,
    pub section: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaSettings {
    pub placeholder: String,
    #[serde(default)]
    pub countries: BTreeMap<String, CountryMedia>,
}

/// Default imagery for a country, keyed by country slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountryMedia {
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_listing_secs() -> u64 {
    5
}
fn default_detail_secs() -> u64 {
    60
}
fn default_search_secs() -> u64 {
    30
}
fn default_taxonomy_secs() -> u64 {
    86_400
}
fn default_max_entries() -> usize {
    1024
}
fn default_min_limit() -> u32 {
    6
}
fn default_max_limit() -> u32 {
    24
}
fn default_limit() -> u32 {
    12
}
fn default_content_types() -> Vec<ContentTypeRoute> {
    [("post", "blog"), ("destination", "destinations"), ("gallery", "gallery")]
        .into_iter()
        .map(|(name, section)| ContentTypeRoute {
            name: name.into(),
            section: section.into(),
        })
        .collect()
}

impl Config {
    /// Apply secrets from the environment over the file values.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("CONTENT_API_TOKEN") {
            self.repository.token = Some(token);
        }
        if let Ok(secret) = std::env::var("PREVIEW_SECRET") {
            self.preview.secret = Some(secret);
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let repo = &cfg.repository;
    if repo.api_url.trim().is_empty() {
        return Err(ConfigError::Invalid("repository.api_url must be non-empty"));
    }
    if repo.dataset.trim().is_empty() {
        return Err(ConfigError::Invalid("repository.dataset must be non-empty"));
    }
    if repo.api_version.trim().is_empty() {
        return Err(ConfigError::Invalid("repository.api_version must be non-empty"));
    }

    if cfg.cache.max_entries == 0 {
        return Err(ConfigError::Invalid("cache.max_entries must be > 0"));
    }

    let search = &cfg.search;
    if search.min_limit == 0 {
        return Err(ConfigError::Invalid("search.min_limit must be > 0"));
    }
    if search.min_limit > search.max_limit {
        return Err(ConfigError::Invalid("search.min_limit must be <= search.max_limit"));
    }
    if search.default_limit < search.min_limit || search.default_limit > search.max_limit {
        return Err(ConfigError::Invalid(
            "search.default_limit must be within [min_limit, max_limit]",
        ));
    }
    if search.content_types.is_empty() {
        return Err(ConfigError::Invalid("search.content_types must be non-empty"));
    }
    if search
        .content_types
        .iter()
        .any(|t| t.name.trim().is_empty() || t.section.trim().is_empty())
    {
        return Err(ConfigError::Invalid(
            "search.content_types entries need a name and a section",
        ));
    }

    if cfg.media.placeholder.trim().is_empty() {
        return Err(ConfigError::Invalid("media.placeholder must be non-empty"));
    }

    Ok(())
}

/// Returns the reference YAML configuration.
pub fn example() -> &'static str {
    r#"repository:
  api_url: "https://content.example.com/"
  cdn_url: "https://cdn.content.example.com/"
  dataset: "production"
  api_version: "2024-01-01"
  use_cdn: true

preview:
  secret: "CHANGE_ME"

cache:
  listing_secs: 5
  detail_secs: 60
  search_secs: 30
  taxonomy_secs: 86400
  max_entries: 1024

search:
  min_limit: 6
  max_limit: 24
  default_limit: 12
  content_types:
    - name: "post"
      section: "blog"
    - name: "destination"
      section: "destinations"
    - name: "gallery"
      section: "gallery"

media:
  placeholder: "/images/placeholder.jpg"
  countries:
    italia:
      cover: "/destinations/images/italia/cover.jpg"
      gallery:
        - "/destinations/images/italia/roma.jpg"
        - "/destinations/images/italia/firenze.jpg"
        - "/destinations/images/italia/venezia.jpg"
    giappone:
      cover: "/destinations/images/giappone/cover.jpg"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn example_config() -> Config {
        serde_yaml::from_str(example()).unwrap()
    }

    #[test]
    fn parse_example_ok() {
        let cfg = example_config();
        validate(&cfg).unwrap();
        assert_eq!(cfg.search.content_types.len(), 3);
        assert_eq!(cfg.media.countries["italia"].gallery.len(), 3);
        assert!(cfg.media.countries["giappone"].gallery.is_empty());
    }

    #[test]
    fn optional_sections_default() {
        let yaml = r#"repository:
  api_url: "https://content.example.com"
  dataset: "production"
  api_version: "2024-01-01"
media:
  placeholder: "/images/placeholder.jpg"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert!(cfg.repository.use_cdn);
        assert_eq!(cfg.cache, CacheSettings::default());
        assert_eq!(cfg.search, SearchSettings::default());
        assert_eq!(cfg.preview.secret, None);
    }

    #[test]
    fn invalid_repository() {
        let mut cfg = example_config();
        cfg.repository.dataset = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("repository.dataset")),
            _ => panic!("wrong error"),
        }

        let mut cfg = example_config();
        cfg.repository.api_url = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_search_limits() {
        let mut cfg = example_config();
        cfg.search.min_limit = 30;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("min_limit")),
            _ => panic!("wrong error"),
        }

        let mut cfg = example_config();
        cfg.search.default_limit = 48;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = example_config();
        cfg.search.content_types.clear();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let mut cfg = example_config();
        assert_eq!(cfg.cache.max_entries, 1024);
        cfg.cache.max_entries = 0;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("max_entries")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_placeholder() {
        let mut cfg = example_config();
        cfg.media.placeholder = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.repository.dataset, "production");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("missing.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
