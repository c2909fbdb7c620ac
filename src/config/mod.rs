//! Configuration module for indexlens.
//!
//! Handles the settings file, environment variables and scoring weights.

mod settings;

pub use settings::{expand_env_vars, MetadataSettings, Settings, SettingsError};
