use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::extract::ExtractorLimits;
use crate::tree::CompletionPolicy;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub preview: PreviewConfig,
    pub store: StoreConfig,
    pub logs: LogConfig,
}

impl Config {
    /// Loads a TOML (`.toml`) or YAML (`.yaml`, `.yml`) config file. Missing
    /// keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub limits: ExtractorLimits,
    pub completion_policy: CompletionPolicy,
    /// Apply freshly parsed steps to the tree as part of ingestion.
    pub auto_apply: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limits: ExtractorLimits::default(),
            completion_policy: CompletionPolicy::WholeBatch,
            auto_apply: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewConfig {
    pub install_command: Vec<String>,
    pub dev_command: Vec<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            install_command: vec!["npm".to_string(), "install".to_string()],
            dev_command: vec!["npm".to_string(), "run".to_string(), "dev".to_string()],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory, relative to the output root, holding workspace snapshots.
    pub dir_name: String,
    pub file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir_name: ".scaffold".to_string(),
            file_name: "workspace.json".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}
