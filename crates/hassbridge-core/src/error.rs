// ── Core error types ──
//
// Only builder precondition violations and runtime routing failures are
// errors. Classification and conversion misses are `Option`s and never
// surface here.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Builder preconditions ────────────────────────────────────────
    #[error("Main endpoint of device '{device}' has not been created")]
    MainEndpointMissing { device: String },

    #[error("Endpoint '{endpoint}' of device '{device}' has not been created")]
    EndpointNotCreated { device: String, endpoint: String },

    #[error("Device '{device}' has already been materialized")]
    AlreadyCreated { device: String },

    #[error("Device '{device}' has no entity that can be bridged")]
    NoSupportedEntities { device: String },

    // ── Runtime routing ──────────────────────────────────────────────
    #[error("Device not found: {device}")]
    DeviceNotFound { device: String },

    #[error("Endpoint '{endpoint}' not found on device '{device}'")]
    EndpointNotFound { device: String, endpoint: String },

    #[error("Unknown cluster: {name}")]
    UnknownCluster { name: String },

    #[error("Command '{command}' is not bound on endpoint '{endpoint}'")]
    CommandNotBound { endpoint: String, command: String },

    #[error("Service call channel closed")]
    ServiceChannelClosed,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}
