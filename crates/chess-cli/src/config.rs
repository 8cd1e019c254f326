//! Configuration file loading.
//!
//! Settings come from an optional `chess.toml`. Every field has a default,
//! so a missing file or a partial file is fine. Command-line flags override
//! whatever is loaded here.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Search settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Search depth in plies. Defaults to 4.
    #[serde(default = "default_search_depth")]
    pub depth: u32,
}

fn default_search_depth() -> u32 {
    4
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: default_search_depth(),
        }
    }
}

/// Perft settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PerftConfig {
    /// Perft depth. Defaults to 5.
    #[serde(default = "default_perft_depth")]
    pub depth: u32,
}

fn default_perft_depth() -> u32 {
    5
}

impl Default for PerftConfig {
    fn default() -> Self {
        PerftConfig {
            depth: default_perft_depth(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ChessConfig {
    /// Position used when no `--fen` is given. Defaults to the start position.
    #[serde(default = "default_fen")]
    pub fen: String,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub perft: PerftConfig,
}

fn default_fen() -> String {
    chess_core::Fen::STARTPOS.to_string()
}

impl Default for ChessConfig {
    fn default() -> Self {
        ChessConfig {
            fen: default_fen(),
            search: SearchConfig::default(),
            perft: PerftConfig::default(),
        }
    }
}

impl ChessConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// Returns the defaults if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns `chess.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chess.toml")
    }
}
