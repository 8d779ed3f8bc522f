//! Configuration management for gnowgraph.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `gnow.toml` file
//! 3. User config `~/.config/gnowgraph/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph snapshot location.
    pub storage: StorageConfig,

    /// Site identity used for locators and short URLs.
    pub site: SiteConfig,

    /// Publication and discussion settings.
    pub publication: PublicationConfig,

    /// Graph write validation.
    pub graph: GraphConfig,

    /// Directory and pingback settings.
    pub ping: PingConfig,

    /// Pluggable backends.
    pub backends: BackendsConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./gnow.toml` (project local)
    /// 2. `~/.config/gnowgraph/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("gnow.toml").exists() {
            return Self::from_file("gnow.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("gnowgraph").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Self::from_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults with `GNOW_*` overrides looked up through `var`.
    pub fn from_overrides(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(var);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Apply `GNOW_*` overrides.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("GNOW_DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Some(file) = var("GNOW_GRAPH_FILE") {
            self.storage.graph_file = file;
        }

        if let Some(domain) = var("GNOW_SITE_DOMAIN") {
            self.site.domain = domain;
        }
        if let Some(protocol) = var("GNOW_PROTOCOL") {
            self.site.protocol = protocol;
        }

        if let Some(days) = var("GNOW_AUTO_CLOSE_COMMENTS_AFTER") {
            if let Ok(n) = days.parse() {
                self.publication.auto_close_comments_after = Some(n);
            }
        }

        if let Some(flag) = var("GNOW_ENFORCE_SUBJECT_TYPES") {
            if let Ok(b) = flag.parse() {
                self.graph.enforce_subject_types = b;
            }
        }

        if let Some(secs) = var("GNOW_PING_TIMEOUT") {
            if let Ok(n) = secs.parse() {
                self.ping.timeout_secs = n;
            }
        }

        if let Some(backend) = var("GNOW_URL_SHORTENER") {
            self.backends.url_shortener = backend;
        }
    }

    /// Reject values that would make the graph unusable.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ping.timeout_secs == 0 {
            return Err(ConfigError::Invalid("ping.timeout_secs must be positive".into()));
        }
        if !matches!(self.site.protocol.as_str(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "site.protocol must be http or https, got '{}'",
                self.site.protocol
            )));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for gnowgraph data (default: ".gnow").
    pub data_dir: String,

    /// Snapshot file name. A `.yaml`/`.yml` extension selects YAML.
    pub graph_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            graph_file: DEFAULT_GRAPH_FILE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Get the full path to the graph snapshot.
    pub fn graph_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.graph_file)
    }
}

/// Site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub domain: String,
    pub protocol: String,
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_SITE_DOMAIN.to_string(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            name: DEFAULT_SITE_NAME.to_string(),
        }
    }
}

/// Publication and discussion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationConfig {
    /// Days after publication when comments close. Unset means never.
    pub auto_close_comments_after: Option<u32>,

    /// Flag every new comment for moderation.
    pub auto_moderate_comments: bool,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            auto_close_comments_after: DEFAULT_AUTO_CLOSE_COMMENTS_AFTER,
            auto_moderate_comments: DEFAULT_AUTO_MODERATE_COMMENTS,
        }
    }
}

/// Graph write validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Check relation subjects and attribute subjects against the declared
    /// subject types of their Relationtype / Attributetype.
    pub enforce_subject_types: bool,

    /// Reject Nodetypes and Gbobjects without authors.
    pub require_authors: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enforce_subject_types: DEFAULT_ENFORCE_SUBJECT_TYPES,
            require_authors: DEFAULT_REQUIRE_AUTHORS,
        }
    }
}

/// Ping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    /// XML-RPC directory endpoints.
    pub directories: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    pub save_ping_directories: bool,

    pub save_ping_external_urls: bool,

    pub user_agent: String,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            directories: DEFAULT_PING_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_PING_TIMEOUT_SECS,
            save_ping_directories: DEFAULT_SAVE_PING_DIRECTORIES,
            save_ping_external_urls: DEFAULT_SAVE_PING_EXTERNAL_URLS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// URL shortener backend name.
    pub url_shortener: String,

    /// Spam checker backend names.
    pub spam_checkers: Vec<String>,

    /// Number of related items to return.
    pub related_limit: usize,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            url_shortener: DEFAULT_URL_SHORTENER.to_string(),
            spam_checkers: DEFAULT_SPAM_CHECKERS.iter().map(|s| s.to_string()).collect(),
            related_limit: DEFAULT_RELATED_LIMIT,
        }
    }
}
