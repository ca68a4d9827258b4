//! Configuration for the simplemsg client.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SIMPLEMSG_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/simplemsg/config.toml
//!   3. ~/.config/simplemsg/config.toml
//!
//! Server address, user and message always come from the command line; the
//! file only carries settings that are stable across runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub output: OutputConfig,
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that received records are written into.
    pub directory: PathBuf,
}

/// Largest accepted `decoder.chunk_size`.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
/// Largest accepted `decoder.max_header_line`.
pub const MAX_HEADER_LINE: usize = 1024 * 1024;
/// Shortest accepted `decoder.max_header_line`: fits `status=-2147483648\n`.
pub const MIN_HEADER_LINE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Upper bound on a single payload read, in bytes.
    pub chunk_size: usize,
    /// Longest accepted header line, terminator included.
    pub max_header_line: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            max_header_line: 4096,
        }
    }
}

impl DecoderConfig {
    /// The values a decoder actually runs with. Zero falls back to the
    /// default and anything above the ceiling is capped, so a config built
    /// in code without [`ClientConfig::validate`] still decodes.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let chunk_size = match self.chunk_size {
            0 => defaults.chunk_size,
            n => n.min(MAX_CHUNK_SIZE),
        };
        let max_header_line = match self.max_header_line {
            0 => defaults.max_header_line,
            n => n.min(MAX_HEADER_LINE),
        };
        Self {
            chunk_size,
            max_header_line,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("simplemsg")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::file_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read `path` if it exists, defaults otherwise. No env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SIMPLEMSG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Apply SIMPLEMSG_* overrides looked up through `var`.
    /// Unparseable numbers are ignored, like unset variables.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SIMPLEMSG_OUTPUT__DIRECTORY") {
            self.output.directory = PathBuf::from(v);
        }
        if let Some(v) = var("SIMPLEMSG_DECODER__CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.decoder.chunk_size = n;
            }
        }
        if let Some(v) = var("SIMPLEMSG_DECODER__MAX_HEADER_LINE") {
            if let Ok(n) = v.parse() {
                self.decoder.max_header_line = n;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let decoder = &self.decoder;
        if decoder.chunk_size == 0 || decoder.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "decoder.chunk_size must be in 1..={MAX_CHUNK_SIZE}, got {}",
                decoder.chunk_size
            )));
        }
        if !(MIN_HEADER_LINE..=MAX_HEADER_LINE).contains(&decoder.max_header_line) {
            return Err(ConfigError::Invalid(format!(
                "decoder.max_header_line must be in {MIN_HEADER_LINE}..={MAX_HEADER_LINE}, got {}",
                decoder.max_header_line
            )));
        }
        Ok(())
    }
}
