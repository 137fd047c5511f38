//! `replay`: feed automation events through composed devices.

use serde::Serialize;
use tabled::Tabled;

use hassbridge_core::{AttributeUpdate, BridgeConfig, HassEvent};

use crate::cli::{GlobalOpts, ReplayArgs};
use crate::error::CliError;
use crate::output;
use crate::snapshot::{self, Session, Snapshot};

#[derive(Debug, Serialize)]
pub struct Applied {
    pub entity_id: String,
    #[serde(flatten)]
    pub update: AttributeUpdate,
}

#[derive(Tabled)]
struct AppliedRow {
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Attribute")]
    attribute: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Apply `events` in order and collect every attribute write they caused.
pub fn replay(snapshot: &Snapshot, config: BridgeConfig, events: Vec<HassEvent>) -> Result<Vec<Applied>, CliError> {
    let session = Session::open(snapshot, config)?;
    let mut applied = Vec::new();
    for event in events {
        let entity_id = match &event {
            HassEvent::StateChanged { entity_id, .. } => entity_id.to_string(),
            _ => String::new(),
        };
        applied.extend(
            session
                .bridge
                .handle_event(event)
                .into_iter()
                .map(|update| Applied {
                    entity_id: entity_id.clone(),
                    update,
                }),
        );
    }
    Ok(applied)
}

pub fn handle(args: &ReplayArgs, config: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = snapshot::load(&args.source.snapshot)?;
    let events: Vec<HassEvent> = snapshot::read_json_file(&args.events)?;
    let applied = replay(&snapshot, config, events)?;
    let out = output::render_list(
        global.output,
        &applied,
        |a| AppliedRow {
            entity: a.entity_id.clone(),
            endpoint: if a.update.endpoint.is_empty() {
                "(root)".into()
            } else {
                a.update.endpoint.clone()
            },
            cluster: a.update.cluster.to_string(),
            attribute: a.update.attribute.clone(),
            value: a.update.value.to_string(),
        },
        |a| format!("{}/{}", a.update.cluster, a.update.attribute),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_changes_become_attribute_updates() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "entities": [{ "entity_id": "light.lamp" }],
            "states": { "light.lamp": { "state": "off", "attributes": { "brightness": 10 } } }
        }))
        .unwrap();
        let events: Vec<HassEvent> = serde_json::from_value(json!([
            { "type": "connected" },
            {
                "type": "state_changed",
                "entity_id": "light.lamp",
                "new_state": { "state": "on", "attributes": { "brightness": 10 } }
            },
            {
                "type": "state_changed",
                "entity_id": "light.lamp",
                "new_state": { "state": "on", "attributes": { "brightness": 10 } }
            },
        ]))
        .unwrap();

        let applied = replay(&snapshot, BridgeConfig::default(), events).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].entity_id, "light.lamp");
        assert_eq!(applied[0].update.attribute, "onOff");
        assert_eq!(applied[0].update.value, json!(true));
    }
}
