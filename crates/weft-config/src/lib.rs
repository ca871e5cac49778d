use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid block tag {tag:?}: tags must be non-empty ASCII alphanumerics")]
    InvalidBlockTag { tag: String },

    #[error("Block tag {tag:?} is classified as {category:?}, but it must be a block")]
    BlockTagNotBlock { tag: String, category: TagCategory },
}

/// Formatting category a tag can be reassigned to through `[classification]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Inline,
    Block,
    Table,
    Preformatted,
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag of the canonical plain block that stripped block content becomes
    pub block_tag: String,
    /// Attributes placed on every canonical block the engine creates
    pub block_attributes: BTreeMap<String, String>,
    /// Attributes placed on every preformatted block the engine creates
    pub pre_attributes: BTreeMap<String, String>,
    /// Per-tag overrides of the built-in classification table
    pub classification: BTreeMap<String, TagCategory>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_tag: "div".to_string(),
            block_attributes: BTreeMap::new(),
            pre_attributes: BTreeMap::new(),
            classification: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config = Self::from_toml_str(&content).map_err(|err| match err {
            ConfigError::ConfigParseError { source, .. } => ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(content).map_err(|source| ConfigError::ConfigParseError {
                config_path: PathBuf::new(),
                source,
            })?;

        config.normalize_tags();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/weft");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tag = &self.block_tag;
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidBlockTag { tag: tag.clone() });
        }
        if let Some(&category) = self.classification.get(tag)
            && category != TagCategory::Block
        {
            return Err(ConfigError::BlockTagNotBlock {
                tag: tag.clone(),
                category,
            });
        }
        Ok(())
    }

    // Tags are matched case-insensitively by the engine
    fn normalize_tags(&mut self) {
        self.block_tag = self.block_tag.to_ascii_lowercase();
        self.classification = std::mem::take(&mut self.classification)
            .into_iter()
            .map(|(tag, category)| (tag.to_ascii_lowercase(), category))
            .collect();
    }
}
