// ── Protocol attribute writes → automation service ──

use serde_json::{Value, json};

use super::{ServiceRequest, SubscribeConvert, SubscribeInput, SubscribeRule};
use crate::convert::temperature_from_matter;
use crate::matter::cluster::{AirflowDirection, FanMode, SystemMode};
use crate::matter::{ClusterId, Feature};

// ── Converters ──────────────────────────────────────────────────────

fn fan_mode(value: &Value, _: &SubscribeInput<'_>) -> Option<ServiceRequest> {
    Some(match FanMode::from_json(value)? {
        FanMode::Off => ServiceRequest::new("turn_off"),
        FanMode::Low => ServiceRequest::with_data("set_percentage", json!({ "percentage": 33 })),
        FanMode::Medium => ServiceRequest::with_data("set_percentage", json!({ "percentage": 66 })),
        FanMode::High => ServiceRequest::with_data("set_percentage", json!({ "percentage": 100 })),
        FanMode::On => ServiceRequest::new("turn_on"),
        FanMode::Auto | FanMode::Smart => {
            ServiceRequest::with_data("set_preset_mode", json!({ "preset_mode": "auto" }))
        }
    })
}

fn percent(value: &Value, _: &SubscribeInput<'_>) -> Option<Value> {
    value.as_u64().filter(|p| *p <= 100).map(Value::from)
}

fn fan_percent(value: &Value, _: &SubscribeInput<'_>) -> Option<ServiceRequest> {
    match value.as_u64()? {
        0 => Some(ServiceRequest::new("turn_off")),
        p @ 1..=100 => Some(ServiceRequest::with_data("set_percentage", json!({ "percentage": p }))),
        _ => None,
    }
}

fn direction(value: &Value, _: &SubscribeInput<'_>) -> Option<Value> {
    match AirflowDirection::from_json(value)? {
        AirflowDirection::Forward => Some(json!("forward")),
        AirflowDirection::Reverse => Some(json!("reverse")),
    }
}

fn oscillating(value: &Value, _: &SubscribeInput<'_>) -> Option<Value> {
    let bitmap = value.as_object()?;
    let any = ["rockLeftRight", "rockUpDown", "rockRound"]
        .iter()
        .any(|key| bitmap.get(*key).and_then(Value::as_bool).unwrap_or(false));
    Some(Value::Bool(any))
}

fn hvac_mode(value: &Value, _: &SubscribeInput<'_>) -> Option<Value> {
    match SystemMode::from_json(value)? {
        SystemMode::Off => Some(json!("off")),
        SystemMode::Heat => Some(json!("heat")),
        SystemMode::Cool => Some(json!("cool")),
        SystemMode::Auto => Some(json!("heat_cool")),
        SystemMode::FanOnly => Some(json!("fan_only")),
        SystemMode::Dry => Some(json!("dry")),
        _ => None,
    }
}

fn in_dual_setpoint_mode(input: &SubscribeInput<'_>) -> bool {
    input
        .state
        .is_some_and(|s| matches!(s.state.as_str(), "heat_cool" | "auto"))
}

/// Heating setpoint. In dual-setpoint mode the high side is resent unchanged.
fn heating_setpoint(value: &Value, input: &SubscribeInput<'_>) -> Option<ServiceRequest> {
    let low = temperature_from_matter(value.as_i64()?, input.unit);
    if in_dual_setpoint_mode(input) {
        let high = input.state.and_then(|s| s.attr_f64("target_temp_high"))?;
        return Some(ServiceRequest::with_data(
            "set_temperature",
            json!({ "target_temp_low": low, "target_temp_high": high }),
        ));
    }
    Some(ServiceRequest::with_data("set_temperature", json!({ "temperature": low })))
}

fn cooling_setpoint(value: &Value, input: &SubscribeInput<'_>) -> Option<ServiceRequest> {
    let high = temperature_from_matter(value.as_i64()?, input.unit);
    if in_dual_setpoint_mode(input) {
        let low = input.state.and_then(|s| s.attr_f64("target_temp_low"))?;
        return Some(ServiceRequest::with_data(
            "set_temperature",
            json!({ "target_temp_low": low, "target_temp_high": high }),
        ));
    }
    Some(ServiceRequest::with_data("set_temperature", json!({ "temperature": high })))
}

// ── Table ───────────────────────────────────────────────────────────

use ClusterId::{FanControl, Thermostat, ValveConfigurationAndControl};
use SubscribeConvert::{Service, Value as Plain};

#[allow(clippy::too_many_arguments)]
const fn rule(
    domain: &'static str,
    cluster: ClusterId,
    attribute: &'static str,
    feature: Option<Feature>,
    service: &'static str,
    with_attribute: &'static str,
    convert: SubscribeConvert,
) -> SubscribeRule {
    SubscribeRule {
        domain,
        cluster,
        attribute,
        feature,
        service,
        with_attribute,
        convert,
    }
}

#[rustfmt::skip]
pub static SUBSCRIBE_RULES: &[SubscribeRule] = &[
    rule("fan", FanControl, "fanMode", None, "turn_on", "preset_mode", Service(fan_mode)),
    rule("fan", FanControl, "percentSetting", None, "set_percentage", "percentage", Service(fan_percent)),
    rule("fan", FanControl, "airflowDirection", Some(Feature::AirflowDirection), "set_direction", "direction", Plain(direction)),
    rule("fan", FanControl, "rockSetting", Some(Feature::Rocking), "oscillate", "oscillating", Plain(oscillating)),

    rule("climate", Thermostat, "systemMode", None, "set_hvac_mode", "hvac_mode", Plain(hvac_mode)),
    rule("climate", Thermostat, "occupiedHeatingSetpoint", Some(Feature::Heating), "set_temperature", "temperature", Service(heating_setpoint)),
    rule("climate", Thermostat, "occupiedCoolingSetpoint", Some(Feature::Cooling), "set_temperature", "temperature", Service(cooling_setpoint)),

    rule("valve", ValveConfigurationAndControl, "targetLevel", None, "set_valve_position", "position", Plain(percent)),
];

pub fn subscribe_rule(domain: &str, cluster: ClusterId, attribute: &str) -> Option<&'static SubscribeRule> {
    SUBSCRIBE_RULES
        .iter()
        .find(|r| r.domain == domain && r.cluster == cluster && r.attribute == attribute)
}

pub fn subscribe_rules_for(domain: &str) -> impl Iterator<Item = &'static SubscribeRule> + '_ {
    SUBSCRIBE_RULES.iter().filter(move |r| r.domain == domain)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::convert::TemperatureUnit;
    use crate::model::{Attributes, StateSnapshot};
    use pretty_assertions::assert_eq;

    fn input(state: Option<&StateSnapshot>) -> SubscribeInput<'_> {
        SubscribeInput {
            state,
            unit: TemperatureUnit::Celsius,
        }
    }

    fn apply(domain: &str, cluster: ClusterId, attribute: &str, value: Value, state: Option<&StateSnapshot>) -> Option<ServiceRequest> {
        subscribe_rule(domain, cluster, attribute).unwrap().apply(&value, &input(state))
    }

    #[test]
    fn fan_mode_off_turns_fan_off() {
        let req = apply("fan", FanControl, "fanMode", json!(0), None).unwrap();
        assert_eq!(req, ServiceRequest::new("turn_off"));
        let req = apply("fan", FanControl, "fanMode", json!(3), None).unwrap();
        assert_eq!(req.data, Some(json!({ "percentage": 100 })));
        assert!(apply("fan", FanControl, "fanMode", json!(42), None).is_none());
    }

    #[test]
    fn fan_percent_zero_turns_fan_off() {
        let req = apply("fan", FanControl, "percentSetting", json!(0), None).unwrap();
        assert_eq!(req, ServiceRequest::new("turn_off"));
    }

    #[test]
    fn plain_rules_wrap_value_under_key() {
        let req = apply("fan", FanControl, "percentSetting", json!(40), None).unwrap();
        assert_eq!(req, ServiceRequest::with_data("set_percentage", json!({ "percentage": 40 })));
        assert!(apply("fan", FanControl, "percentSetting", json!(140), None).is_none());

        let req = apply("valve", ValveConfigurationAndControl, "targetLevel", json!(0), None).unwrap();
        assert_eq!(req, ServiceRequest::with_data("set_valve_position", json!({ "position": 0 })));

        let req = apply("fan", FanControl, "rockSetting", json!({ "rockLeftRight": false, "rockUpDown": false, "rockRound": true }), None).unwrap();
        assert_eq!(req.data, Some(json!({ "oscillating": true })));
    }

    #[test]
    fn system_mode_suppresses_unmapped_values() {
        let req = apply("climate", Thermostat, "systemMode", json!(4), None).unwrap();
        assert_eq!(req.data, Some(json!({ "hvac_mode": "heat" })));
        assert!(apply("climate", Thermostat, "systemMode", json!(5), None).is_none());
    }

    #[test]
    fn heating_setpoint_in_dual_mode_keeps_high_side() {
        let mut attrs = Attributes::new();
        attrs.insert("target_temp_low".into(), json!(18));
        attrs.insert("target_temp_high".into(), json!(25));
        let state = StateSnapshot::new("heat_cool", attrs);

        let req = apply("climate", Thermostat, "occupiedHeatingSetpoint", json!(1900), Some(&state)).unwrap();
        assert_eq!(req.data, Some(json!({ "target_temp_low": 19.0, "target_temp_high": 25.0 })));

        let heat = StateSnapshot::new("heat", Attributes::new());
        let req = apply("climate", Thermostat, "occupiedHeatingSetpoint", json!(1900), Some(&heat)).unwrap();
        assert_eq!(req.data, Some(json!({ "temperature": 19.0 })));
    }
}
