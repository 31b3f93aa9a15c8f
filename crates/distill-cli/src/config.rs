//! Configuration loading and management.

use std::path::{Path, PathBuf};

use distill_core::{DuplicateNamePolicy, FieldSchema, InvalidRecordPolicy};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Which schema validates input records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaConfig {
    /// `UserALE` logs.
    #[default]
    Userale,
    /// Logs described by field names.
    Fields(FieldSchema),
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Schema used to validate records.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// What to do with records that fail validation.
    #[serde(default)]
    pub on_invalid: InvalidRecordPolicy,

    /// What to do when two windows share a name.
    #[serde(default)]
    pub duplicate_segment_names: DuplicateNamePolicy,
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DISTILL_*, `__` separates nested keys)
        figment = figment.merge(Env::prefixed("DISTILL_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for distill.
///
/// On Linux: `~/.config/distill`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("distill"))
}
