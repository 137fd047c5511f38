//! `command` and `write`: protocol input to service call.

use serde::Serialize;

use hassbridge_core::{BridgeConfig, ClusterId, ServiceCall};

use crate::cli::{GlobalOpts, InvokeArgs, TargetArgs, WriteArgs};
use crate::commands::parse_json_arg;
use crate::error::CliError;
use crate::output;
use crate::snapshot::{self, Session};

fn open(target: &TargetArgs, config: BridgeConfig) -> Result<Session, CliError> {
    let snapshot = snapshot::load(&target.source.snapshot)?;
    Session::open(&snapshot, config)
}

/// The call that reached the service channel, if any. Serializes as the
/// call itself or `null`.
#[derive(Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Outcome(pub Option<ServiceCall>);

fn detail(outcome: &Outcome) -> String {
    match &outcome.0 {
        Some(call) => {
            let data = call
                .data
                .as_ref()
                .map(|d| format!(" {d}"))
                .unwrap_or_default();
            format!("{}.{} {}{data}", call.domain, call.service, call.entity_id)
        }
        None => "(suppressed)".into(),
    }
}

fn id(outcome: &Outcome) -> String {
    outcome
        .0
        .as_ref()
        .map(|c| format!("{}.{}", c.domain, c.service))
        .unwrap_or_default()
}

fn print(outcome: &Outcome, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, outcome, detail, id)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Run one protocol command through the bridge. Returns the call that
/// reached the service channel.
pub async fn run_command(session: &mut Session, args: &InvokeArgs) -> Result<Outcome, CliError> {
    let request = parse_json_arg("payload", &args.payload)?;
    let target = &args.target;
    session
        .bridge
        .handle_command(&target.device, &request, &target.cluster, &target.endpoint, &args.command)
        .await?;
    Ok(Outcome(session.calls.try_recv().ok()))
}

/// Run one attribute write through the bridge.
pub async fn run_write(session: &mut Session, args: &WriteArgs) -> Result<Outcome, CliError> {
    let target = &args.target;
    let cluster: ClusterId = target.cluster.parse().map_err(|_| CliError::Validation {
        field: "cluster".into(),
        reason: format!("unknown cluster '{}'", target.cluster),
    })?;
    let new_value = parse_json_arg("new", &args.new)?;
    let old_value = parse_json_arg("old", &args.old)?;
    session
        .bridge
        .handle_subscribe(&target.device, &new_value, &old_value, &target.endpoint, cluster, &args.attribute)
        .await?;
    Ok(Outcome(session.calls.try_recv().ok()))
}

pub async fn handle_command(args: &InvokeArgs, config: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = open(&args.target, config)?;
    let outcome = run_command(&mut session, args).await?;
    print(&outcome, global)
}

pub async fn handle_write(args: &WriteArgs, config: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = open(&args.target, config)?;
    let outcome = run_write(&mut session, args).await?;
    print(&outcome, global)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cli::SnapshotArgs;
    use serde_json::json;

    fn session() -> Session {
        let snapshot = serde_json::from_value(json!({
            "devices": [
                { "name": "lamp", "entities": [{ "entity_id": "light.lamp" }] },
                { "name": "hall", "entities": [{ "entity_id": "climate.hall" }] },
            ],
            "states": {
                "light.lamp": { "state": "on", "attributes": { "brightness": 10 } },
                "climate.hall": {
                    "state": "heat",
                    "attributes": { "hvac_modes": ["heat"], "temperature": 20, "current_temperature": 19 }
                },
            }
        }))
        .unwrap();
        Session::open(&snapshot, BridgeConfig::default()).unwrap()
    }

    fn target(device: &str, cluster: &str) -> TargetArgs {
        TargetArgs {
            source: SnapshotArgs {
                snapshot: PathBuf::from("unused.json"),
            },
            device: device.into(),
            endpoint: String::new(),
            cluster: cluster.into(),
        }
    }

    #[tokio::test]
    async fn command_reaches_service_channel() {
        let mut session = session();
        let args = InvokeArgs {
            target: target("lamp", "levelControl"),
            command: "moveToLevel".into(),
            payload: r#"{"level": 254}"#.into(),
        };
        let outcome = run_command(&mut session, &args).await.unwrap();
        let call = outcome.0.as_ref().unwrap();
        assert_eq!(call.service, "turn_on");
        assert_eq!(call.data, Some(json!({ "brightness": 255 })));
        assert_eq!(detail(&outcome), r#"light.turn_on light.lamp {"brightness":255}"#);
        assert_eq!(id(&outcome), "light.turn_on");
    }

    #[tokio::test]
    async fn unconvertible_command_is_suppressed() {
        let mut session = session();
        let args = InvokeArgs {
            target: target("lamp", "levelControl"),
            command: "moveToLevel".into(),
            payload: r#"{"level": 0}"#.into(),
        };
        let outcome = run_command(&mut session, &args).await.unwrap();
        assert_eq!(outcome, Outcome(None));
        assert_eq!(detail(&outcome), "(suppressed)");
        assert_eq!(serde_json::to_string(&outcome).unwrap(), "null");
    }

    #[tokio::test]
    async fn setpoint_write_becomes_set_temperature() {
        let mut session = session();
        let args = WriteArgs {
            target: target("hall", "thermostat"),
            attribute: "occupiedHeatingSetpoint".into(),
            new: "2150".into(),
            old: "2000".into(),
        };
        let call = run_write(&mut session, &args).await.unwrap().0.unwrap();
        assert_eq!(call.service, "set_temperature");
        assert_eq!(call.data, Some(json!({ "temperature": 21.5 })));
    }

    #[tokio::test]
    async fn bad_inputs_are_usage_errors() {
        let mut session = session();
        let args = WriteArgs {
            target: target("hall", "notACluster"),
            attribute: "x".into(),
            new: "1".into(),
            old: "null".into(),
        };
        assert!(matches!(run_write(&mut session, &args).await, Err(CliError::Validation { .. })));

        let args = InvokeArgs {
            target: target("garage", "onOff"),
            command: "on".into(),
            payload: "{".into(),
        };
        assert!(matches!(run_command(&mut session, &args).await, Err(CliError::Validation { .. })));
    }
}
