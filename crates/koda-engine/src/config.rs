//! Engine configuration.
//!
//! Loaded from JSON; every field has a default, so `{}` is a valid config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::guard::DEFAULT_DENYLIST;
use crate::pipeline::DEFAULT_PROLOGUE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identifiers student code may not mention.
    pub denylist: Vec<String>,
    /// Single line placed before the student's code.
    pub prologue: String,
    /// Deepest allowed chain of nested script calls.
    pub max_call_depth: usize,
    pub surface: SurfaceConfig,
    pub reporter: ReporterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            prologue: DEFAULT_PROLOGUE.to_string(),
            max_call_depth: koda_eval::DEFAULT_MAX_CALL_DEPTH,
            surface: SurfaceConfig::default(),
            reporter: ReporterConfig::default(),
        }
    }
}

/// Drawing area in logical pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Editor geometry used to scroll the failing line into view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    pub line_height: f64,
    pub viewport_height: f64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            line_height: 21.0,
            viewport_height: 400.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prologue.trim().is_empty() {
            return Err(ConfigError::Invalid("prologue must not be empty".into()));
        }
        if self.prologue.contains('\n') || self.prologue.contains('\r') {
            return Err(ConfigError::Invalid(
                "prologue must be a single line".into(),
            ));
        }
        if let Some(bad) = self.denylist.iter().find(|name| !is_identifier(name)) {
            return Err(ConfigError::Invalid(format!(
                "denylist entry {bad:?} is not an identifier"
            )));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be at least 1".into(),
            ));
        }
        let surface = &self.surface;
        for (name, value) in [
            ("surface.width", surface.width),
            ("surface.height", surface.height),
            ("surface.device_pixel_ratio", surface.device_pixel_ratio),
            ("reporter.line_height", self.reporter.line_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !(self.reporter.viewport_height.is_finite() && self.reporter.viewport_height >= 0.0) {
            return Err(ConfigError::Invalid(
                "reporter.viewport_height must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Script identifier: `[A-Za-z_$][A-Za-z0-9_$]*`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
