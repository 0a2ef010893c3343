use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{JobGraphError, Result};
use crate::workflow::ScriptMerge;

/// Configuration file structure for jobgraph.
///
/// Holds conversion options and output preferences so they can be reused
/// across runs. Command-line flags take precedence over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Conversion options
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertConfig {
    /// Export application, environment and deployment content along with jobs
    #[serde(default)]
    pub full_export: bool,

    /// How two non-empty condition scripts are combined
    #[serde(default)]
    pub script_merge: ScriptMerge,

    /// What to do with join parents that were never converted
    #[serde(default)]
    pub join_resolution: JoinResolution,
}

/// Policy for joins whose parents cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinResolution {
    /// Unresolved parents contribute no dependency, a warning is recorded
    #[default]
    Lenient,
    /// Unresolved parents fail the conversion
    Strict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: DocumentFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

/// Serialized form of documents read and written by the tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Format implied by a file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Guesses the format of `content`: JSON objects and arrays, YAML otherwise.
    pub fn detect(content: &str) -> Self {
        match content.trim_start().chars().next() {
            Some('{' | '[') => Self::Json,
            _ => Self::Yaml,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        })
    }

    pub fn render<T: Serialize>(self, value: &T, pretty: bool) -> Result<String> {
        Ok(match self {
            Self::Json if pretty => serde_json::to_string_pretty(value)?,
            Self::Json => serde_json::to_string(value)?,
            Self::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./jobgraph.toml
    /// 3. ./jobgraph.json
    /// 4. ./jobgraph.yaml
    /// 5. ./jobgraph.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                return Self::load_from_path(path);
            }
            return Ok(Self::default());
        }

        let candidates = ["jobgraph.toml", "jobgraph.json", "jobgraph.yaml", "jobgraph.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => Ok(toml::from_str(&contents)?),
            "json" => Ok(serde_json::from_str(&contents)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(&contents)?),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|_| {
                    JobGraphError::Config(format!(
                        "Failed to parse config file: {}",
                        path.display()
                    ))
                }),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)
                .map_err(|err| JobGraphError::Config(err.to_string()))?,
        };

        std::fs::write(path, contents)?;

        Ok(())
    }
}
