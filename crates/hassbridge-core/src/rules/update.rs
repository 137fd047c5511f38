// ── Automation state changes → protocol attributes ──

use serde_json::{Value, json};

use super::{UpdateAttributeRule, UpdateInput, UpdateStateRule};
use crate::convert::{
    Rounding, as_number, brightness_to_level, hue_to_matter, kelvin_to_mireds, position_to_lift,
    saturation_to_matter, temperature_to_matter, xy_to_matter,
};
use crate::matter::cluster::{
    AirflowDirection, ColorMode, FanMode, LockState, MovementStatus, SystemMode, ValveState,
    covering_status, rock_bitmap,
};
use crate::matter::{ClusterId, Feature};

// ── State table ─────────────────────────────────────────────────────

macro_rules! on_state {
    ($domain:expr, $state:expr, $cluster:ident, $attr:expr, $value:expr) => {
        UpdateStateRule {
            domain: $domain,
            state: $state,
            cluster: ClusterId::$cluster,
            attribute: $attr,
            value: || Value::from($value),
        }
    };
}

#[rustfmt::skip]
pub static UPDATE_STATE_RULES: &[UpdateStateRule] = &[
    on_state!("switch", "on", OnOff, "onOff", true),
    on_state!("switch", "off", OnOff, "onOff", false),
    on_state!("light", "on", OnOff, "onOff", true),
    on_state!("light", "off", OnOff, "onOff", false),
    on_state!("input_boolean", "on", OnOff, "onOff", true),
    on_state!("input_boolean", "off", OnOff, "onOff", false),
    on_state!("script", "on", OnOff, "onOff", true),
    on_state!("script", "off", OnOff, "onOff", false),
    on_state!("automation", "on", OnOff, "onOff", true),
    on_state!("automation", "off", OnOff, "onOff", false),

    on_state!("lock", "locked", DoorLock, "lockState", LockState::Locked),
    on_state!("lock", "locking", DoorLock, "lockState", LockState::Locked),
    on_state!("lock", "unlocked", DoorLock, "lockState", LockState::Unlocked),
    on_state!("lock", "unlocking", DoorLock, "lockState", LockState::Unlocked),
    on_state!("lock", "open", DoorLock, "lockState", LockState::Unlatched),
    on_state!("lock", "jammed", DoorLock, "lockState", LockState::NotFullyLocked),

    on_state!("fan", "on", FanControl, "fanMode", FanMode::On),
    on_state!("fan", "off", FanControl, "fanMode", FanMode::Off),

    UpdateStateRule { domain: "cover", state: "open", cluster: ClusterId::WindowCovering, attribute: "operationalStatus", value: || covering_status(MovementStatus::Stopped) },
    UpdateStateRule { domain: "cover", state: "closed", cluster: ClusterId::WindowCovering, attribute: "operationalStatus", value: || covering_status(MovementStatus::Stopped) },
    UpdateStateRule { domain: "cover", state: "opening", cluster: ClusterId::WindowCovering, attribute: "operationalStatus", value: || covering_status(MovementStatus::Opening) },
    UpdateStateRule { domain: "cover", state: "closing", cluster: ClusterId::WindowCovering, attribute: "operationalStatus", value: || covering_status(MovementStatus::Closing) },

    on_state!("climate", "off", Thermostat, "systemMode", SystemMode::Off),
    on_state!("climate", "heat", Thermostat, "systemMode", SystemMode::Heat),
    on_state!("climate", "cool", Thermostat, "systemMode", SystemMode::Cool),
    on_state!("climate", "heat_cool", Thermostat, "systemMode", SystemMode::Auto),
    on_state!("climate", "auto", Thermostat, "systemMode", SystemMode::Auto),
    on_state!("climate", "fan_only", Thermostat, "systemMode", SystemMode::FanOnly),
    on_state!("climate", "dry", Thermostat, "systemMode", SystemMode::Dry),

    on_state!("valve", "open", ValveConfigurationAndControl, "currentState", ValveState::Open),
    on_state!("valve", "closed", ValveConfigurationAndControl, "currentState", ValveState::Closed),
    on_state!("valve", "opening", ValveConfigurationAndControl, "currentState", ValveState::Transitioning),
    on_state!("valve", "closing", ValveConfigurationAndControl, "currentState", ValveState::Transitioning),
];

// ── Attribute converters ────────────────────────────────────────────

fn level(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    brightness_to_level(as_number(value)?).map(Value::from)
}

fn color_mode(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    match value.as_str()? {
        "hs" | "rgb" | "rgbw" | "rgbww" => Some(ColorMode::CurrentHueAndCurrentSaturation.into()),
        "xy" => Some(ColorMode::CurrentXAndCurrentY.into()),
        "color_temp" => Some(ColorMode::ColorTemperatureMireds.into()),
        _ => None,
    }
}

#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
fn whole(value: f64) -> Value {
    Value::from(value.round() as i64)
}

fn mireds(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    as_number(value)
        .filter(|m| (1.0..=65_279.0).contains(m))
        .map(whole)
}

fn mireds_from_kelvin(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    let kelvin = u32::try_from(value.as_u64()?).ok()?;
    kelvin_to_mireds(kelvin, Rounding::Nearest).map(Value::from)
}

fn pair(value: &Value) -> Option<(f64, f64)> {
    let items = value.as_array()?;
    match items.as_slice() {
        [a, b] => Some((a.as_f64()?, b.as_f64()?)),
        _ => None,
    }
}

fn hue(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    hue_to_matter(pair(value)?.0).map(Value::from)
}

fn saturation(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    saturation_to_matter(pair(value)?.1).map(Value::from)
}

fn color_x(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    let (x, y) = pair(value)?;
    Some(xy_to_matter(x, y).0.into())
}

fn color_y(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    let (x, y) = pair(value)?;
    Some(xy_to_matter(x, y).1.into())
}

fn percent(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    as_number(value)
        .filter(|p| (0.0..=100.0).contains(p))
        .map(whole)
}

fn fan_preset(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    match value.as_str()? {
        "low" => Some(FanMode::Low.into()),
        "medium" => Some(FanMode::Medium.into()),
        "high" => Some(FanMode::High.into()),
        "auto" | "smart" => Some(FanMode::Auto.into()),
        _ => None,
    }
}

fn fan_direction(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    match value.as_str()? {
        "forward" => Some(AirflowDirection::Forward.into()),
        "reverse" => Some(AirflowDirection::Reverse.into()),
        _ => None,
    }
}

fn fan_oscillating(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    let on = value.as_bool()?;
    Some(rock_bitmap(false, false, on))
}

fn lift(value: &Value, _: &UpdateInput<'_>) -> Option<Value> {
    position_to_lift(as_number(value)?).map(Value::from)
}

fn temperature(value: &Value, input: &UpdateInput<'_>) -> Option<Value> {
    temperature_to_matter(as_number(value)?, input.unit).map(Value::from)
}

fn setpoint_in(value: &Value, input: &UpdateInput<'_>, states: &[&str]) -> Option<Value> {
    if !states.contains(&input.state.state.as_str()) {
        return None;
    }
    temperature(value, input)
}

fn single_heating_setpoint(value: &Value, input: &UpdateInput<'_>) -> Option<Value> {
    setpoint_in(value, input, &["heat"])
}

fn single_cooling_setpoint(value: &Value, input: &UpdateInput<'_>) -> Option<Value> {
    setpoint_in(value, input, &["cool"])
}

fn dual_setpoint(value: &Value, input: &UpdateInput<'_>) -> Option<Value> {
    setpoint_in(value, input, &["heat_cool", "auto"])
}

// ── Attribute table ─────────────────────────────────────────────────

const fn attr(
    domain: &'static str,
    with_attribute: &'static str,
    cluster: ClusterId,
    attribute: &'static str,
    feature: Option<Feature>,
    convert: fn(&Value, &UpdateInput<'_>) -> Option<Value>,
) -> UpdateAttributeRule {
    UpdateAttributeRule {
        domain,
        with_attribute,
        cluster,
        attribute,
        feature,
        convert,
    }
}

use ClusterId::{ColorControl, FanControl, LevelControl, Thermostat, ValveConfigurationAndControl, WindowCovering};

#[rustfmt::skip]
pub static UPDATE_ATTRIBUTE_RULES: &[UpdateAttributeRule] = &[
    attr("light", "brightness", LevelControl, "currentLevel", None, level),
    attr("light", "color_mode", ColorControl, "colorMode", None, color_mode),
    attr("light", "color_temp", ColorControl, "colorTemperatureMireds", Some(Feature::ColorTemperature), mireds),
    attr("light", "color_temp_kelvin", ColorControl, "colorTemperatureMireds", Some(Feature::ColorTemperature), mireds_from_kelvin),
    attr("light", "hs_color", ColorControl, "currentHue", Some(Feature::HueSaturation), hue),
    attr("light", "hs_color", ColorControl, "currentSaturation", Some(Feature::HueSaturation), saturation),
    attr("light", "xy_color", ColorControl, "currentX", Some(Feature::Xy), color_x),
    attr("light", "xy_color", ColorControl, "currentY", Some(Feature::Xy), color_y),

    attr("fan", "percentage", FanControl, "percentSetting", None, percent),
    attr("fan", "percentage", FanControl, "percentCurrent", None, percent),
    attr("fan", "preset_mode", FanControl, "fanMode", None, fan_preset),
    attr("fan", "direction", FanControl, "airflowDirection", Some(Feature::AirflowDirection), fan_direction),
    attr("fan", "oscillating", FanControl, "rockSetting", Some(Feature::Rocking), fan_oscillating),

    attr("cover", "current_position", WindowCovering, "currentPositionLiftPercent100ths", None, lift),
    attr("cover", "current_position", WindowCovering, "targetPositionLiftPercent100ths", None, lift),

    attr("climate", "current_temperature", Thermostat, "localTemperature", None, temperature),
    attr("climate", "temperature", Thermostat, "occupiedHeatingSetpoint", Some(Feature::Heating), single_heating_setpoint),
    attr("climate", "temperature", Thermostat, "occupiedCoolingSetpoint", Some(Feature::Cooling), single_cooling_setpoint),
    attr("climate", "target_temp_low", Thermostat, "occupiedHeatingSetpoint", Some(Feature::Heating), dual_setpoint),
    attr("climate", "target_temp_high", Thermostat, "occupiedCoolingSetpoint", Some(Feature::Cooling), dual_setpoint),

    attr("valve", "current_position", ValveConfigurationAndControl, "currentLevel", None, percent),
];

pub fn state_update_rules<'a>(
    domain: &'a str,
    state: &'a str,
) -> impl Iterator<Item = &'static UpdateStateRule> + 'a {
    UPDATE_STATE_RULES
        .iter()
        .filter(move |r| r.domain == domain && r.state == state)
}

pub fn attribute_update_rules(domain: &str) -> impl Iterator<Item = &'static UpdateAttributeRule> + '_ {
    UPDATE_ATTRIBUTE_RULES.iter().filter(move |r| r.domain == domain)
}
