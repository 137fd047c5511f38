//! Registry snapshot files: the offline stand-in for a live connection.
//!
//! ```json
//! {
//!   "devices": [{ "name": "kitchen", "entities": [{ "entity_id": "light.ceiling" }] }],
//!   "entities": [{ "entity_id": "sensor.porch", "device_id": "porch" }],
//!   "states": { "light.ceiling": { "state": "on", "attributes": {} } }
//! }
//! ```
//!
//! Loose `entities` are grouped by `device_id`; entities without one become
//! single-entity devices named after their entity id.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use hassbridge_core::{Bridge, BridgeConfig, CoreError, EntityDescriptor, EntityId, ServiceCall, StateSnapshot};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
    #[serde(default)]
    pub states: BTreeMap<EntityId, StateSnapshot>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub name: String,
    pub entities: Vec<EntityDescriptor>,
}

impl Snapshot {
    /// Explicit devices first, then loose entities grouped in order of
    /// first appearance.
    pub fn device_groups(&self) -> Vec<(String, Vec<EntityDescriptor>)> {
        let mut groups: Vec<(String, Vec<EntityDescriptor>)> = self
            .devices
            .iter()
            .map(|d| (d.name.clone(), d.entities.clone()))
            .collect();
        for entity in &self.entities {
            let name = entity
                .device_id
                .clone()
                .unwrap_or_else(|| entity.entity_id.to_string());
            match groups.iter_mut().find(|(n, _)| *n == name) {
                Some((_, members)) => members.push(entity.clone()),
                None => groups.push((name, vec![entity.clone()])),
            }
        }
        groups
    }

    /// Every entity named anywhere in the snapshot.
    pub fn all_entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.devices
            .iter()
            .flat_map(|d| d.entities.iter())
            .chain(self.entities.iter())
    }

    /// Cached state, else `unknown` with the registry attributes.
    pub fn state_of(&self, entity: &EntityDescriptor) -> StateSnapshot {
        self.states
            .get(&entity.entity_id)
            .cloned()
            .unwrap_or_else(|| StateSnapshot::new("unknown", entity.attributes.clone()))
    }
}

/// Read and parse a JSON file.
pub fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: "file".into(),
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn load(path: &Path) -> Result<Snapshot, CliError> {
    let snapshot: Snapshot = read_json_file(path)?;
    debug!(
        path = %path.display(),
        devices = snapshot.devices.len(),
        entities = snapshot.entities.len(),
        states = snapshot.states.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

// ── Bridge session ───────────────────────────────────────────────────

/// A bridge with every composable device of a snapshot registered.
pub struct Session {
    pub bridge: Bridge,
    pub calls: mpsc::Receiver<ServiceCall>,
    /// Devices that could not be composed, with the reason.
    pub skipped: Vec<(String, String)>,
}

impl Session {
    pub fn open(snapshot: &Snapshot, config: BridgeConfig) -> Result<Self, CliError> {
        let (bridge, calls) = Bridge::new(config);
        bridge.load_states(snapshot.states.iter().map(|(id, s)| (id.clone(), s.clone())));

        let mut skipped = Vec::new();
        for (name, entities) in snapshot.device_groups() {
            match bridge.register_device(&name, &entities) {
                Ok(_) => {}
                Err(err @ CoreError::NoSupportedEntities { .. }) => {
                    warn!(device = %name, "no bridgeable entity");
                    skipped.push((name, err.to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(Self {
            bridge,
            calls,
            skipped,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        serde_json::from_value(json!({
            "devices": [{ "name": "desk", "entities": [{ "entity_id": "light.desk" }] }],
            "entities": [
                { "entity_id": "switch.porch_a", "device_id": "porch" },
                { "entity_id": "switch.lonely" },
                { "entity_id": "light.porch_b", "device_id": "porch" },
            ],
            "states": { "light.desk": { "state": "on" } }
        }))
        .unwrap()
    }

    #[test]
    fn loose_entities_group_by_device_id() {
        let groups = snapshot().device_groups();
        let shape: Vec<(&str, usize)> = groups.iter().map(|(n, e)| (n.as_str(), e.len())).collect();
        assert_eq!(shape, vec![("desk", 1), ("porch", 2), ("switch.lonely", 1)]);
    }

    #[test]
    fn missing_state_falls_back_to_unknown() {
        let snap = snapshot();
        let lonely = snap.all_entities().find(|e| e.entity_id.object_id() == "lonely").unwrap();
        assert_eq!(snap.state_of(lonely).state, "unknown");
    }

    #[test]
    fn session_skips_empty_devices() {
        let mut snap = snapshot();
        snap.entities.push(EntityDescriptor::new("weather.home".parse().unwrap()));
        let session = Session::open(&snap, BridgeConfig::default()).unwrap();
        assert_eq!(session.skipped.len(), 1);
        assert_eq!(session.skipped[0].0, "weather.home");
        assert!(session.bridge.device("desk").is_some());
        assert_eq!(session.bridge.device("porch").unwrap().children().len(), 2);
    }
}
