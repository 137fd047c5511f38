// ── Declarative classification and conversion tables ──
//
// Every rule family is a `static` slice of plain records. Lookups scan the
// slice in order, so table order is the tie-break wherever several rules
// could match.

pub mod command;
pub mod domain;
pub mod sensor;
pub mod subscribe;
pub mod update;

use serde_json::Value;

use crate::convert::TemperatureUnit;
use crate::matter::{ClusterId, DeviceTypeDescriptor, Feature};
use crate::model::{Attributes, StateSnapshot};

pub use command::{command_rule, command_rules_for};
pub use domain::{attribute_rules, base_rules};
pub use sensor::value_rule;
pub use subscribe::{subscribe_rule, subscribe_rules_for};
pub use update::{attribute_update_rules, state_update_rules};

// ── Classification ──────────────────────────────────────────────────

/// Maps a domain (optionally gated on an attribute key) to a device type
/// and / or a bare cluster id.
#[derive(Debug)]
pub struct DomainRule {
    pub domain: &'static str,
    pub with_attribute: Option<&'static str>,
    pub device_type: Option<&'static DeviceTypeDescriptor>,
    pub cluster: Option<ClusterId>,
}

/// Converts an entity value (state string or attribute) into a protocol
/// attribute value. The second argument is the unit of measurement.
pub type ValueConverter = fn(&Value, Option<&str>) -> Option<Value>;

/// Sensor and binary-sensor rule keyed on device class and state class.
#[derive(Debug)]
pub struct ValueRule {
    pub domain: &'static str,
    pub with_device_class: &'static str,
    pub with_state_class: Option<&'static str>,
    pub device_type: &'static DeviceTypeDescriptor,
    pub cluster: ClusterId,
    pub features: &'static [Feature],
    pub attribute: &'static str,
    pub convert: ValueConverter,
}

// ── Outbound service requests ───────────────────────────────────────

/// Service name plus optional payload produced by a command or subscribe
/// converter. The owning domain and entity are filled in by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub service: &'static str,
    pub data: Option<Value>,
}

impl ServiceRequest {
    pub fn new(service: &'static str) -> Self {
        Self { service, data: None }
    }

    pub fn with_data(service: &'static str, data: Value) -> Self {
        Self {
            service,
            data: Some(data),
        }
    }
}

/// Everything a command converter may consult.
#[derive(Debug, Clone, Copy)]
pub struct CommandInput<'a> {
    pub request: &'a Value,
    /// Snapshot of the target cluster's current attributes.
    pub attributes: &'a Attributes,
    pub state: Option<&'a StateSnapshot>,
    pub unit: TemperatureUnit,
}

impl CommandInput<'_> {
    pub fn request_f64(&self, field: &str) -> Option<f64> {
        self.request.get(field).and_then(Value::as_f64)
    }

    pub fn attribute_f64(&self, attribute: &str) -> Option<f64> {
        self.attributes.get(attribute).and_then(Value::as_f64)
    }
}

/// How a command rule produces its service call.
#[derive(Debug, Clone, Copy)]
pub enum CommandConvert {
    /// Call `service` without payload.
    Plain,
    /// Call `service` with the returned payload; `None` suppresses the call.
    Data(fn(&CommandInput<'_>) -> Option<Value>),
    /// The converter picks the service itself.
    Service(fn(&CommandInput<'_>) -> Option<ServiceRequest>),
}

#[derive(Debug)]
pub struct CommandRule {
    pub domain: &'static str,
    pub cluster: ClusterId,
    pub command: &'static str,
    /// Only bound when the attached cluster carries this feature.
    pub feature: Option<Feature>,
    pub service: &'static str,
    pub convert: CommandConvert,
}

impl CommandRule {
    /// Run the converter. `None` means the command is not supported for
    /// this input and the call must be suppressed.
    pub fn apply(&self, input: &CommandInput<'_>) -> Option<ServiceRequest> {
        match self.convert {
            CommandConvert::Plain => Some(ServiceRequest::new(self.service)),
            CommandConvert::Data(convert) => {
                convert(input).map(|data| ServiceRequest::with_data(self.service, data))
            }
            CommandConvert::Service(convert) => convert(input),
        }
    }
}

/// Everything a subscribe converter may consult besides the new value.
#[derive(Debug, Clone, Copy)]
pub struct SubscribeInput<'a> {
    pub state: Option<&'a StateSnapshot>,
    pub unit: TemperatureUnit,
}

#[derive(Debug, Clone, Copy)]
pub enum SubscribeConvert {
    /// Call `service` with `{ with_attribute: value }`.
    Value(fn(&Value, &SubscribeInput<'_>) -> Option<Value>),
    /// The converter picks the service and payload itself.
    Service(fn(&Value, &SubscribeInput<'_>) -> Option<ServiceRequest>),
}

#[derive(Debug)]
pub struct SubscribeRule {
    pub domain: &'static str,
    pub cluster: ClusterId,
    pub attribute: &'static str,
    /// Only bound when the attached cluster carries this feature.
    pub feature: Option<Feature>,
    pub service: &'static str,
    pub with_attribute: &'static str,
    pub convert: SubscribeConvert,
}

impl SubscribeRule {
    pub fn apply(&self, value: &Value, input: &SubscribeInput<'_>) -> Option<ServiceRequest> {
        match self.convert {
            SubscribeConvert::Value(convert) => convert(value, input).map(|v| {
                let mut data = serde_json::Map::new();
                data.insert(self.with_attribute.to_owned(), v);
                ServiceRequest::with_data(self.service, Value::Object(data))
            }),
            SubscribeConvert::Service(convert) => convert(value, input),
        }
    }
}

// ── Runtime updates ─────────────────────────────────────────────────

/// Maps a state string to a fixed protocol attribute value.
#[derive(Debug)]
pub struct UpdateStateRule {
    pub domain: &'static str,
    pub state: &'static str,
    pub cluster: ClusterId,
    pub attribute: &'static str,
    pub value: fn() -> Value,
}

/// Inputs shared by attribute update converters.
#[derive(Debug, Clone, Copy)]
pub struct UpdateInput<'a> {
    pub state: &'a StateSnapshot,
    pub unit: TemperatureUnit,
}

/// Maps an entity attribute to a protocol attribute through a converter.
#[derive(Debug)]
pub struct UpdateAttributeRule {
    pub domain: &'static str,
    pub with_attribute: &'static str,
    pub cluster: ClusterId,
    pub attribute: &'static str,
    /// Only applied when the attached cluster carries this feature.
    pub feature: Option<Feature>,
    pub convert: fn(&Value, &UpdateInput<'_>) -> Option<Value>,
}
