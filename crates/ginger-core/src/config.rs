//! Configuration types and loading for ginger.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::error::Result;
use crate::highlights::DEFAULT_HIGHLIGHT_COUNT;
use crate::lexicon::Lexicon;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory render descriptors and scripts are written to.
    pub output_dir: PathBuf,

    /// Optional TOML file overriding the built-in lexicon tables.
    pub lexicon: Option<PathBuf>,

    /// Default number of highlights to extract per session.
    pub highlight_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ginger");

        Self {
            output_dir: data_dir.join("renders"),
            lexicon: None,
            highlight_count: DEFAULT_HIGHLIGHT_COUNT,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.expand_paths();
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ginger")
            .join("config.toml")
    }

    /// Save configuration to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Ensure config exists at the given path, creating defaults if missing.
    pub fn ensure_at(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            let mut config = Self::default();
            config.expand_paths();
            config.save_to_path(path)?;
            Ok(config)
        }
    }

    /// Expand a path, replacing ~ and environment variables.
    pub fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::full(path)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| path.to_string());
        PathBuf::from(expanded)
    }

    /// Load the lexicon override if configured, else the built-in tables.
    pub fn load_lexicon(&self) -> Result<Lexicon> {
        match &self.lexicon {
            Some(path) => Lexicon::load_from_path(path),
            None => Ok(Lexicon::default()),
        }
    }

    fn expand_paths(&mut self) {
        self.output_dir = Self::expand_path(&self.output_dir.to_string_lossy());
        self.lexicon = self
            .lexicon
            .as_ref()
            .map(|p| Self::expand_path(&p.to_string_lossy()));
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
