//! Configuration for the bridge CLI.
//!
//! TOML file in the platform config directory, overridden by
//! `HASSBRIDGE_*` environment variables, validated and translated into
//! `hassbridge_core::BridgeConfig`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hassbridge_core::{BridgeConfig, EntityId};

const FILE_NAME: &str = "hassbridge.toml";
const ENV_PREFIX: &str = "HASSBRIDGE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// CLI presentation defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Engine settings handed to the core.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Validate and return the engine configuration.
    pub fn bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        let bridge = &self.bridge;
        if bridge.vendor_id == 0 {
            return Err(ConfigError::Validation {
                field: "bridge.vendor_id".into(),
                reason: "must not be zero".into(),
            });
        }
        for (field, list) in [("bridge.white_list", &bridge.white_list), ("bridge.black_list", &bridge.black_list)] {
            if let Some(bad) = list.iter().find(|id| id.parse::<EntityId>().is_err()) {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: format!("'{bad}' is not an entity id (expected domain.object_id)"),
                });
            }
        }
        if let Some(both) = bridge.white_list.iter().find(|id| bridge.black_list.contains(id)) {
            return Err(ConfigError::Validation {
                field: "bridge.black_list".into(),
                reason: format!("'{both}' is also white-listed"),
            });
        }
        Ok(bridge.clone())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "hassbridge", "hassbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push(FILE_NAME);
            p
        },
        |dirs| dirs.config_dir().join(FILE_NAME),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hassbridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load config from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}
