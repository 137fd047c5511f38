// ── Protocol command → automation service ──

use serde_json::{Value, json};

use super::{CommandConvert, CommandInput, CommandRule, ServiceRequest};
use crate::convert::{
    Rounding, hue_from_matter, level_to_brightness, lift_to_position, mireds_to_kelvin,
    saturation_from_matter, temperature_from_matter, xy_from_matter,
};
use crate::matter::{ClusterId, Feature};
use crate::matter::cluster::RunMode;

// ── Converters ──────────────────────────────────────────────────────

fn u8_field(value: Option<f64>) -> Option<u8> {
    value.filter(|v| v.fract() == 0.0).and_then(|v| {
        #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
        let v = v as i64;
        u8::try_from(v).ok()
    })
}

fn u16_field(value: Option<f64>) -> Option<u16> {
    value.filter(|v| v.fract() == 0.0).and_then(|v| {
        #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
        let v = v as i64;
        u16::try_from(v).ok()
    })
}

fn brightness(input: &CommandInput<'_>) -> Option<Value> {
    let level = u8_field(input.request_f64("level"))?;
    level_to_brightness(level).map(|b| json!({ "brightness": b }))
}

fn color_temperature(input: &CommandInput<'_>) -> Option<Value> {
    let mireds = u16_field(input.request_f64("colorTemperatureMireds"))?;
    mireds_to_kelvin(u32::from(mireds), Rounding::Nearest).map(|k| json!({ "color_temp_kelvin": k }))
}

fn xy_color(input: &CommandInput<'_>) -> Option<Value> {
    let x = u16_field(input.request_f64("colorX"))?;
    let y = u16_field(input.request_f64("colorY"))?;
    let (x, y) = xy_from_matter(x, y);
    Some(json!({ "xy_color": [x, y] }))
}

fn hs_color(hue: u8, saturation: u8) -> Value {
    json!({ "hs_color": [hue_from_matter(hue), saturation_from_matter(saturation)] })
}

/// Hue only: the saturation half comes from the current attributes.
fn hue(input: &CommandInput<'_>) -> Option<Value> {
    let hue = u8_field(input.request_f64("hue"))?;
    let saturation = u8_field(input.attribute_f64("currentSaturation"))?;
    Some(hs_color(hue, saturation))
}

fn saturation(input: &CommandInput<'_>) -> Option<Value> {
    let saturation = u8_field(input.request_f64("saturation"))?;
    let hue = u8_field(input.attribute_f64("currentHue"))?;
    Some(hs_color(hue, saturation))
}

fn hue_and_saturation(input: &CommandInput<'_>) -> Option<Value> {
    let hue = u8_field(input.request_f64("hue"))?;
    let saturation = u8_field(input.request_f64("saturation"))?;
    Some(hs_color(hue, saturation))
}

fn cover_position(input: &CommandInput<'_>) -> Option<Value> {
    let lift = input.request_f64("liftPercent100thsValue")?;
    lift_to_position(lift).map(|p| json!({ "position": p }))
}

fn vacuum_mode(input: &CommandInput<'_>) -> Option<ServiceRequest> {
    let mode = input
        .request
        .get("newMode")
        .and_then(RunMode::from_json)?;
    Some(match mode {
        RunMode::Cleaning => ServiceRequest::new("start"),
        RunMode::Idle => ServiceRequest::new("pause"),
    })
}

/// `setpointRaiseLower { mode, amount }`: amount is in tenths of a degree.
fn setpoint_raise_lower(input: &CommandInput<'_>) -> Option<Value> {
    let mode = u8_field(input.request_f64("mode"))?;
    let amount = input.request_f64("amount")?;
    let attribute = match mode {
        0 | 2 => "occupiedHeatingSetpoint",
        1 => "occupiedCoolingSetpoint",
        _ => return None,
    };
    let current = input.attributes.get(attribute).and_then(Value::as_i64)?;
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
    let delta = (amount * 10.0).round() as i64;
    let target = temperature_from_matter(current.checked_add(delta)?, input.unit);
    Some(json!({ "temperature": target }))
}

// ── Table ───────────────────────────────────────────────────────────

const fn rule(
    domain: &'static str,
    cluster: ClusterId,
    command: &'static str,
    service: &'static str,
    convert: CommandConvert,
) -> CommandRule {
    CommandRule {
        domain,
        cluster,
        command,
        feature: None,
        service,
        convert,
    }
}

const fn gated(
    domain: &'static str,
    cluster: ClusterId,
    command: &'static str,
    feature: Feature,
    service: &'static str,
    convert: CommandConvert,
) -> CommandRule {
    CommandRule {
        domain,
        cluster,
        command,
        feature: Some(feature),
        service,
        convert,
    }
}

use ClusterId::{
    ColorControl, DoorLock, LevelControl, OnOff, RvcOperationalState, RvcRunMode, Thermostat,
    ValveConfigurationAndControl, WindowCovering,
};
use CommandConvert::{Data, Plain, Service};

#[rustfmt::skip]
pub static COMMAND_RULES: &[CommandRule] = &[
    rule("switch", OnOff, "on", "turn_on", Plain),
    rule("switch", OnOff, "off", "turn_off", Plain),
    rule("switch", OnOff, "toggle", "toggle", Plain),
    rule("input_boolean", OnOff, "on", "turn_on", Plain),
    rule("input_boolean", OnOff, "off", "turn_off", Plain),
    rule("input_boolean", OnOff, "toggle", "toggle", Plain),
    rule("light", OnOff, "on", "turn_on", Plain),
    rule("light", OnOff, "off", "turn_off", Plain),
    rule("light", OnOff, "toggle", "toggle", Plain),
    rule("button", OnOff, "on", "press", Plain),
    rule("input_button", OnOff, "on", "press", Plain),
    rule("scene", OnOff, "on", "turn_on", Plain),
    rule("script", OnOff, "on", "turn_on", Plain),
    rule("script", OnOff, "off", "turn_off", Plain),
    rule("automation", OnOff, "on", "trigger", Plain),

    rule("light", LevelControl, "moveToLevel", "turn_on", Data(brightness)),
    rule("light", LevelControl, "moveToLevelWithOnOff", "turn_on", Data(brightness)),
    gated("light", ColorControl, "moveToColorTemperature", Feature::ColorTemperature, "turn_on", Data(color_temperature)),
    gated("light", ColorControl, "moveToColor", Feature::Xy, "turn_on", Data(xy_color)),
    gated("light", ColorControl, "moveToHue", Feature::HueSaturation, "turn_on", Data(hue)),
    gated("light", ColorControl, "moveToSaturation", Feature::HueSaturation, "turn_on", Data(saturation)),
    gated("light", ColorControl, "moveToHueAndSaturation", Feature::HueSaturation, "turn_on", Data(hue_and_saturation)),

    rule("lock", DoorLock, "lockDoor", "lock", Plain),
    rule("lock", DoorLock, "unlockDoor", "unlock", Plain),

    rule("cover", WindowCovering, "upOrOpen", "open_cover", Plain),
    rule("cover", WindowCovering, "downOrClose", "close_cover", Plain),
    rule("cover", WindowCovering, "stopMotion", "stop_cover", Plain),
    rule("cover", WindowCovering, "goToLiftPercentage", "set_cover_position", Data(cover_position)),

    rule("valve", ValveConfigurationAndControl, "open", "open_valve", Plain),
    rule("valve", ValveConfigurationAndControl, "close", "close_valve", Plain),

    rule("vacuum", RvcRunMode, "changeToMode", "start", Service(vacuum_mode)),
    rule("vacuum", RvcOperationalState, "pause", "pause", Plain),
    rule("vacuum", RvcOperationalState, "resume", "start", Plain),
    rule("vacuum", RvcOperationalState, "goHome", "return_to_base", Plain),

    rule("climate", Thermostat, "setpointRaiseLower", "set_temperature", Data(setpoint_raise_lower)),
];

/// Rule for a command received on one cluster of an entity of `domain`.
pub fn command_rule(domain: &str, cluster: ClusterId, command: &str) -> Option<&'static CommandRule> {
    COMMAND_RULES
        .iter()
        .find(|r| r.domain == domain && r.cluster == cluster && r.command == command)
}

pub fn command_rules_for(domain: &str) -> impl Iterator<Item = &'static CommandRule> + '_ {
    COMMAND_RULES.iter().filter(move |r| r.domain == domain)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::convert::TemperatureUnit;
    use crate::model::Attributes;
    use pretty_assertions::assert_eq;

    fn run(domain: &str, cluster: ClusterId, command: &str, request: Value, attributes: &Attributes) -> Option<ServiceRequest> {
        let rule = command_rule(domain, cluster, command).unwrap();
        rule.apply(&CommandInput {
            request: &request,
            attributes,
            state: None,
            unit: TemperatureUnit::Celsius,
        })
    }

    #[test]
    fn move_to_level_scales_brightness() {
        let attrs = Attributes::new();
        let full = run("light", LevelControl, "moveToLevel", json!({ "level": 254 }), &attrs).unwrap();
        assert_eq!(full, ServiceRequest::with_data("turn_on", json!({ "brightness": 255 })));
        let low = run("light", LevelControl, "moveToLevel", json!({ "level": 1 }), &attrs).unwrap();
        assert_eq!(low.data, Some(json!({ "brightness": 1 })));
        assert!(run("light", LevelControl, "moveToLevel", json!({ "level": 0 }), &attrs).is_none());
    }

    #[test]
    fn hue_uses_current_saturation() {
        let mut attrs = Attributes::new();
        attrs.insert("currentSaturation".into(), json!(254));
        let req = run("light", ColorControl, "moveToHue", json!({ "hue": 127 }), &attrs).unwrap();
        assert_eq!(req.data, Some(json!({ "hs_color": [180.0, 100.0] })));

        let missing = run("light", ColorControl, "moveToHue", json!({ "hue": 127 }), &Attributes::new());
        assert!(missing.is_none());
    }

    #[test]
    fn color_temperature_in_kelvin() {
        let req = run(
            "light",
            ColorControl,
            "moveToColorTemperature",
            json!({ "colorTemperatureMireds": 250 }),
            &Attributes::new(),
        )
        .unwrap();
        assert_eq!(req.data, Some(json!({ "color_temp_kelvin": 4000 })));
    }

    #[test]
    fn lift_percentage_to_position() {
        let req = run(
            "cover",
            WindowCovering,
            "goToLiftPercentage",
            json!({ "liftPercent100thsValue": 2500 }),
            &Attributes::new(),
        )
        .unwrap();
        assert_eq!(req, ServiceRequest::with_data("set_cover_position", json!({ "position": 75 })));
    }

    #[test]
    fn vacuum_mode_selects_service() {
        let attrs = Attributes::new();
        assert_eq!(
            run("vacuum", RvcRunMode, "changeToMode", json!({ "newMode": 2 }), &attrs).unwrap().service,
            "start"
        );
        assert_eq!(
            run("vacuum", RvcRunMode, "changeToMode", json!({ "newMode": 1 }), &attrs).unwrap().service,
            "pause"
        );
        assert!(run("vacuum", RvcRunMode, "changeToMode", json!({ "newMode": 9 }), &attrs).is_none());
    }

    #[test]
    fn setpoint_raise_lower_is_relative() {
        let mut attrs = Attributes::new();
        attrs.insert("occupiedHeatingSetpoint".into(), json!(2000));
        let req = run("climate", Thermostat, "setpointRaiseLower", json!({ "mode": 0, "amount": 15 }), &attrs).unwrap();
        assert_eq!(req.data, Some(json!({ "temperature": 21.5 })));
    }

    #[test]
    fn unknown_command_has_no_rule() {
        assert!(command_rule("light", OnOff, "offWithEffect").is_none());
        assert!(command_rule("fan", OnOff, "on").is_none());
    }
}
