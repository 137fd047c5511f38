//! CLI error types with miette diagnostics and exit codes.

use miette::Diagnostic;
use thiserror::Error;

use hassbridge_config::ConfigError;
use hassbridge_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 5;
    pub const CONFIG: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Lookup ───────────────────────────────────────────────────────

    #[error("No {resource_type} found matching '{identifier}'")]
    #[diagnostic(
        code(hassbridge::not_found),
        help("List available {resource_type}s with: hassbridge {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("'{command}' is not bound on endpoint '{endpoint}'")]
    #[diagnostic(
        code(hassbridge::not_bound),
        help("Bound commands per endpoint are listed by: hassbridge compose <snapshot> -o json")
    )]
    NotBound { endpoint: String, command: String },

    // ── Composition ──────────────────────────────────────────────────

    #[error("Device '{device}' cannot be composed: {reason}")]
    #[diagnostic(code(hassbridge::compose))]
    Compose { device: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hassbridge::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(hassbridge::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(hassbridge::config),
        help("Check the config file and HASSBRIDGE_* environment variables.")
    )]
    Config(#[from] ConfigError),

    // ── Runtime ──────────────────────────────────────────────────────

    #[error("Service call channel closed")]
    #[diagnostic(code(hassbridge::channel))]
    ChannelClosed,

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(hassbridge::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::NotBound { .. } => exit_code::NOT_FOUND,
            Self::Compose { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let reason = err.to_string();
        match err {
            CoreError::DeviceNotFound { device } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: device,
                list_command: "compose <snapshot> -o plain".into(),
            },

            CoreError::EndpointNotFound { device, endpoint } => CliError::NotFound {
                resource_type: "endpoint".into(),
                identifier: format!("{device}/{endpoint}"),
                list_command: format!("compose <snapshot> --device {device}"),
            },

            CoreError::UnknownCluster { name } => CliError::Validation {
                field: "cluster".into(),
                reason: format!("unknown cluster '{name}'"),
            },

            CoreError::CommandNotBound { endpoint, command } => {
                CliError::NotBound { endpoint, command }
            }

            CoreError::ServiceChannelClosed => CliError::ChannelClosed,

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::MainEndpointMissing { device }
            | CoreError::EndpointNotCreated { device, .. }
            | CoreError::AlreadyCreated { device }
            | CoreError::NoSupportedEntities { device } => CliError::Compose { device, reason },
        }
    }
}
