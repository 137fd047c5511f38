// ── Automation-side identity and snapshot types ──
//
// EntityId splits the `domain.object_id` form used by Home Assistant.
// EntityDescriptor and StateSnapshot are the immutable inputs of one
// classification pass.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Free-form attribute bag. Values are typed only by convention.
pub type Attributes = serde_json::Map<String, Value>;

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for a Home Assistant entity (`light.kitchen`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    pub fn new(domain: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            object_id: object_id.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

/// Error returned when a string is not of the form `domain.object_id`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id '{0}': expected <domain>.<object_id>")]
pub struct ParseEntityIdError(pub String);

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((domain, object_id)) if !domain.is_empty() && !object_id.is_empty() => {
                Ok(Self::new(domain, object_id))
            }
            _ => Err(ParseEntityIdError(s.to_owned())),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── Entity / state snapshots ────────────────────────────────────────

/// One entity as known to the automation platform's registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl EntityDescriptor {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            device_id: None,
            name: None,
            attributes: Attributes::new(),
        }
    }

    pub fn domain(&self) -> &str {
        self.entity_id.domain()
    }
}

/// The current reported value and attribute bag of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl StateSnapshot {
    pub fn new(state: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            state: state.into(),
            attributes,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(Value::as_f64).filter(|v| v.is_finite())
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    /// Strings in an array-valued attribute, e.g. `hvac_modes`.
    pub fn attr_strings(&self, key: &str) -> Option<Vec<&str>> {
        self.attr(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    /// `friendly_name` when present and non-empty.
    pub fn friendly_name(&self) -> Option<&str> {
        self.attr_str("friendly_name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
