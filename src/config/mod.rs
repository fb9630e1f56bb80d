//! Configuration system for Collexions.
//!
//! Two layers:
//! 1. [`Config`]: the file as written (YAML, or JSON such as a legacy `config.json`)
//! 2. [`EngineConfig`]: typed values resolved from it, with invalid entries
//!    skipped or defaulted and a warning logged for each

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use self::resolution::{
    EngineConfig, resolve_budgets, resolve_categories, resolve_cooldown_hours, resolve_min_items,
    resolve_retention_hours, resolve_specials,
};

mod resolution;

/// Libraries processed when the config names none.
pub fn default_library_names() -> Vec<String> {
    vec!["Movies".to_string(), "TV Shows".to_string()]
}

/// Default location of the pin history file.
pub fn default_history_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("collexions")
        .join("selected_collections.json")
}

/// Configuration file contents.
///
/// Sections whose entries can be individually malformed are kept as raw
/// values here and validated during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,

    /// Libraries processed each cycle, in order.
    pub library_names: Vec<String>,

    /// Pin budget per library; libraries not listed get zero.
    pub number_of_collections_to_pin: HashMap<String, serde_yaml::Value>,

    /// Titles never pinned (and never unpinned).
    pub exclusion_list: Vec<String>,

    /// Case-insensitive title patterns never pinned.
    pub regex_exclusion_patterns: Vec<String>,

    /// `[{start_date: "MM-DD", end_date: "MM-DD", collection_names: [..]}]`
    pub special_collections: Vec<serde_yaml::Value>,

    /// `{library: {category: [titles], always_call: bool}}`
    pub categories: HashMap<String, serde_yaml::Value>,

    /// Cool-down in hours before a title may be pinned again.
    pub repeat_block_hours: Option<serde_yaml::Value>,

    /// How long pin history is kept on disk.
    pub history_retention_hours: Option<serde_yaml::Value>,

    /// Collections with fewer items are never pinned (default 10).
    pub min_items_for_pinning: Option<serde_yaml::Value>,

    /// Whether active specials ignore the cool-down.
    pub exempt_specials_from_cooldown: bool,

    pub history_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            library_names: default_library_names(),
            number_of_collections_to_pin: HashMap::new(),
            exclusion_list: Vec::new(),
            regex_exclusion_patterns: Vec::new(),
            special_collections: Vec::new(),
            categories: HashMap::new(),
            repeat_block_hours: None,
            history_retention_hours: None,
            min_items_for_pinning: None,
            exempt_specials_from_cooldown: true,
            history_file: default_history_file(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. collexions.yml in current directory
    /// 3. ~/.config/collexions/collexions.yml
    /// 4. config.json in current directory
    /// 5. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = vec![PathBuf::from(format!("{}.yml", project_name))];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        candidates.push(PathBuf::from("config.json"));

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config = Self::parse(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse YAML or JSON config text.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Resolve into typed engine settings.
    pub fn resolve(&self) -> EngineConfig {
        EngineConfig::from_config(self)
    }
}
