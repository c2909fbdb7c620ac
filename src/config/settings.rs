//! TOML-based configuration for indexlens.
//!
//! Supports a config file (indexlens.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [metadata]
//! scope_id = "${INDEXLENS_SCOPE}"
//! owner = "APP"
//! timeout_ms = 5000
//! file = "./dictionary.json"
//!
//! [scoring]
//! join = 40.0
//! equality = 30.0
//! max_selectivity = 0.10
//! acceptance_threshold = 30.0
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analysis::ScoringWeights;
use crate::metadata::MetadataScope;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Metadata lookup configuration.
    pub metadata: MetadataSettings,

    /// Candidate scoring weights.
    pub scoring: ScoringWeights,
}

/// Metadata lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Identifier of the monitored database (supports ${ENV_VAR} expansion).
    pub scope_id: String,

    /// Schema owner the statements run against (supports ${ENV_VAR} expansion).
    pub owner: String,

    /// Timeout for each metadata lookup, in milliseconds.
    pub timeout_ms: u64,

    /// Default JSON metadata file for `advise`.
    pub file: Option<String>,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            scope_id: "default".to_string(),
            owner: String::new(),
            timeout_ms: 10_000,
            file: None,
        }
    }
}

impl MetadataSettings {
    /// Lookup scope with environment variables expanded.
    pub fn scope(&self) -> Result<MetadataScope, SettingsError> {
        Ok(MetadataScope::new(expand_env_vars(&self.scope_id)?, expand_env_vars(&self.owner)?)
            .with_timeout(Duration::from_millis(self.timeout_ms)))
    }

    /// Metadata file path with environment variables expanded.
    pub fn resolved_file(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.file
            .as_deref()
            .map(|f| expand_env_vars(f).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text and validate them.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `INDEXLENS_CONFIG`
    /// 2. `./indexlens.toml`
    /// 3. `~/.config/indexlens/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("INDEXLENS_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("indexlens.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("indexlens").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let scoring = &self.scoring;
        if !(0.0..=1.0).contains(&scoring.max_selectivity) {
            return Err(SettingsError::InvalidConfig(format!(
                "scoring.max_selectivity must be within [0, 1], got {}",
                scoring.max_selectivity
            )));
        }
        if scoring.null_penalty_ratio > scoring.null_exclude_ratio {
            return Err(SettingsError::InvalidConfig(
                "scoring.null_penalty_ratio must not exceed scoring.null_exclude_ratio".to_string(),
            ));
        }
        if self.metadata.timeout_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "metadata.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        let mut var_name = String::new();
        if braced {
            chars.next(); // consume '{'
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
