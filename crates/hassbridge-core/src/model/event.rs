// ── Automation-platform events and outbound service calls ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{EntityId, StateSnapshot};

/// Events delivered by the automation-platform transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum HassEvent {
    Connected,
    Disconnected,
    Config,
    Services,
    Devices,
    Entities,
    States,
    StateChanged {
        #[serde(default)]
        device_id: Option<String>,
        entity_id: EntityId,
        #[serde(default)]
        old_state: Option<StateSnapshot>,
        new_state: StateSnapshot,
    },
}

/// A service invocation produced by the command and subscribe converters.
///
/// `data` is `None` when the service takes no payload (e.g. `turn_off`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: EntityId,
        data: Option<Value>,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_id,
            data,
        }
    }
}
