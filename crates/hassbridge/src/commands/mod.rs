//! Command handlers.

pub mod classify;
pub mod compose;
pub mod config_cmd;
pub mod invoke;
pub mod replay;

use hassbridge_config::{Config, config_path, load_config_from};
use hassbridge_core::BridgeConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route an engine command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let config = bridge_config(global)?;
    match cmd {
        Command::Compose(args) => compose::handle(&args, config, global),
        Command::Classify(args) => classify::handle(&args, &config, global),
        Command::Invoke(args) => invoke::handle_command(&args, config, global).await,
        Command::Write(args) => invoke::handle_write(&args, config, global).await,
        Command::Replay(args) => replay::handle(&args, config, global),
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Load the config file named by `--config` (or the default path).
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);
    Ok(load_config_from(&path)?)
}

/// Validated engine config with command-line overrides applied.
pub fn bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let mut config = load_config(global)?.bridge_config()?;
    if global.remap {
        config.remap = true;
    }
    if let Some(unit) = global.unit {
        config.temperature_unit = Some(unit);
    }
    Ok(config)
}

/// Parse a JSON argument given on the command line.
pub(crate) fn parse_json_arg(field: &str, raw: &str) -> Result<serde_json::Value, CliError> {
    serde_json::from_str(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("not valid JSON: {e}"),
    })
}
