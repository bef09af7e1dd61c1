use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api_client::{API_KEY_ENV, DEFAULT_BASE_URL};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the volumes API.
    pub base_url: String,

    /// API credential. Prefer the GOOGLE_BOOKS_API_KEY environment variable;
    /// this field exists for setups where an env var is impractical.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Mark cards that have a cover thumbnail available.
    pub show_thumbnail_marker: bool,

    /// Show the published date on cards when the provider supplies one.
    pub show_published_date: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Quiet period in milliseconds before an edited search term is submitted.
    pub debounce_ms: u64,

    /// Fetch the next page automatically when scrolling past the last card.
    pub auto_load_on_scroll: bool,

    /// Record submitted terms in the history file.
    pub enable_history: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            key: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_thumbnail_marker: true,
            show_published_date: true,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            auto_load_on_scroll: true,
            enable_history: true,
        }
    }
}

impl Config {
    /// Load config from the default location, creating it on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("book-search").join("config.toml"))
    }

    /// Resolve the API credential: environment first, then the config file.
    /// Returns None when neither is set (the endpoint accepts keyless
    /// low-volume use).
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api.key.clone())
    }

    /// Default config file content with explanatory comments.
    pub fn create_default_with_comments() -> String {
        r#"# book-search configuration file

[api]
# Base URL of the Google Books volumes API.
base_url = "https://www.googleapis.com/books/v1"
# API credential. Prefer setting GOOGLE_BOOKS_API_KEY in the environment;
# uncomment only if an env var is impractical for you. Never commit this file
# with a key in it.
# key = ""

[display]
# Mark cards that have a cover thumbnail available.
show_thumbnail_marker = true
# Show the published date on cards when known.
show_published_date = true

[behavior]
# Quiet period (ms) before an edited search term is submitted.
debounce_ms = 400
# Fetch the next page automatically when scrolling past the last card.
auto_load_on_scroll = true
# Record submitted terms in ~/.book_search_history.json.
enable_history = true
"#
        .to_string()
    }
}
