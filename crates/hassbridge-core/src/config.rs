// ── Runtime bridge configuration ──
//
// Read-only inputs to classification and materialization. The config crate
// or the CLI builds a `BridgeConfig` and hands it in; core never reads files.

use serde::{Deserialize, Serialize};

use crate::convert::TemperatureUnit;
use crate::model::EntityId;

/// Test vendor id reserved for development devices.
pub const DEFAULT_VENDOR_ID: u16 = 0xFFF1;

/// Configuration shared by every device the bridge composes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Process-wide temperature unit, used when an entity does not report one.
    pub temperature_unit: Option<TemperatureUnit>,
    /// Merge child endpoints into the root when nothing collides.
    pub remap: bool,
    pub vendor_id: u16,
    pub vendor_name: String,
    pub product_name: String,
    pub software_version: u32,
    pub software_version_string: String,
    pub hardware_version: u16,
    pub hardware_version_string: String,
    /// When non-empty, only these entities are bridged.
    pub white_list: Vec<String>,
    /// Entities never bridged.
    pub black_list: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            temperature_unit: None,
            remap: false,
            vendor_id: DEFAULT_VENDOR_ID,
            vendor_name: "hassbridge".into(),
            product_name: "Home Assistant bridge".into(),
            software_version: 1,
            software_version_string: "1.0.0".into(),
            hardware_version: 1,
            hardware_version_string: "1.0.0".into(),
            white_list: Vec::new(),
            black_list: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Unit precedence: entity attribute, then this config, then Celsius.
    pub fn resolve_unit(&self, entity_unit: Option<&str>) -> TemperatureUnit {
        entity_unit
            .and_then(|u| u.parse().ok())
            .or(self.temperature_unit)
            .unwrap_or_default()
    }

    /// Whether an entity passes the white / black lists.
    pub fn is_bridged(&self, entity_id: &EntityId) -> bool {
        let id = entity_id.to_string();
        if self.black_list.iter().any(|b| *b == id) {
            return false;
        }
        self.white_list.is_empty() || self.white_list.iter().any(|w| *w == id)
    }
}
