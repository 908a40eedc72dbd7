//! Configuration for the demo shell.
//!
//! Loaded from a TOML file. A missing file yields the defaults: a single
//! `console` source holding every permission.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ShellError;

/// Main configuration structure for cgsh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Prompt printed before each line in interactive mode.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Source used when none is given on the command line.
    #[serde(default = "default_source")]
    pub source: String,

    /// Named sources and what they are allowed to do.
    #[serde(default = "default_sources")]
    pub sources: HashMap<String, SourceConfig>,
}

/// A named command source.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SourceConfig {
    /// Granted permissions. `*` grants everything, `prefix.*` grants
    /// every permission under `prefix.`.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Muted sources cannot use `say`.
    #[serde(default)]
    pub muted: bool,
}

fn default_prompt() -> String {
    "cgsh> ".to_string()
}

fn default_source() -> String {
    "console".to_string()
}

fn default_sources() -> HashMap<String, SourceConfig> {
    HashMap::from([(
        default_source(),
        SourceConfig {
            permissions: vec!["*".to_string()],
            muted: false,
        },
    )])
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            source: default_source(),
            sources: default_sources(),
        }
    }
}

impl ShellConfig {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("command-graph")
            .join("cgsh.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ShellError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ShellError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self, ShellError> {
        toml::from_str(content).map_err(|e| {
            ShellError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named source, or the default source if name is None.
    pub fn get_source(&self, name: Option<&str>) -> Option<(&str, &SourceConfig)> {
        let key = name.unwrap_or(&self.source);
        self.sources
            .get_key_value(key)
            .map(|(name, source)| (name.as_str(), source))
    }
}
