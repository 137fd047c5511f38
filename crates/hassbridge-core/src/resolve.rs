// ── Composite feature resolvers ──
//
// Decision procedures for domains whose clusters depend on several
// attributes at once. Each returns fully seeded cluster specs.

use serde_json::{Value, json};
use tracing::debug;

use crate::builder::ClusterSpec;
use crate::config::BridgeConfig;
use crate::convert::{
    MAX_MEASURED_CELSIUS, MIN_MEASURED_CELSIUS, Rounding, TemperatureUnit, kelvin_to_mireds,
    temperature_to_matter, to_celsius, vacuum_activity,
};
use crate::matter::cluster::{
    AirflowDirection, ColorMode, ControlSequenceOfOperation, FanMode, FanModeSequence,
    OperationalState, RunMode, SystemMode, rock_bitmap,
};
use crate::matter::defaults::{operational_state_list, run_mode_list};
use crate::matter::{ClusterId, Feature};
use crate::model::StateSnapshot;

// ── Climate ─────────────────────────────────────────────────────────

pub const DEFAULT_MIN_TEMP: f64 = 0.0;
pub const DEFAULT_MAX_TEMP: f64 = 50.0;
pub const DEFAULT_SETPOINT: f64 = 23.0;
pub const DEFAULT_LOW_SETPOINT: f64 = 20.0;
pub const DEFAULT_HIGH_SETPOINT: f64 = 26.0;

/// Temperature attributes of a climate entity, converted to Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateTemperatures {
    pub current: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub setpoint: f64,
    pub low: f64,
    pub high: f64,
}

impl ClimateTemperatures {
    pub fn from_state(state: &StateSnapshot, unit: TemperatureUnit) -> Self {
        let read = |key: &str| {
            state
                .attr_f64(key)
                .map(|v| to_celsius(v, unit))
                .filter(|c| (MIN_MEASURED_CELSIUS..=MAX_MEASURED_CELSIUS).contains(c))
        };
        Self {
            current: read("current_temperature"),
            min: read("min_temp").unwrap_or(DEFAULT_MIN_TEMP),
            max: read("max_temp").unwrap_or(DEFAULT_MAX_TEMP),
            setpoint: read("temperature").unwrap_or(DEFAULT_SETPOINT),
            low: read("target_temp_low").unwrap_or(DEFAULT_LOW_SETPOINT),
            high: read("target_temp_high").unwrap_or(DEFAULT_HIGH_SETPOINT),
        }
    }
}

/// Hundredths of °C; values are already range-checked Celsius.
fn centi(celsius: f64) -> Value {
    temperature_to_matter(celsius, TemperatureUnit::Celsius).map_or(Value::Null, Value::from)
}

fn centi_opt(celsius: Option<f64>) -> Value {
    celsius.map_or(Value::Null, centi)
}

/// Thermostat cluster for a climate entity, or `None` when its modes
/// support neither heating nor cooling.
pub fn climate(state: &StateSnapshot, config: &BridgeConfig) -> Option<ClusterSpec> {
    let modes = state.attr_strings("hvac_modes").unwrap_or_else(|| vec!["heat"]);
    let unit = config.resolve_unit(state.attr_str("temperature_unit"));
    let t = ClimateTemperatures::from_state(state, unit);

    let has = |mode: &str| modes.contains(&mode);
    let (heat, cool) = (has("heat"), has("cool"));

    let thermostat = ClusterSpec::new(ClusterId::Thermostat)
        .with_attribute("localTemperature", centi_opt(t.current));
    let heating_limits = |spec: ClusterSpec| {
        spec.with_attribute("minHeatSetpointLimit", centi(t.min))
            .with_attribute("maxHeatSetpointLimit", centi(t.max))
            .with_attribute("absMinHeatSetpointLimit", centi(t.min))
            .with_attribute("absMaxHeatSetpointLimit", centi(t.max))
    };
    let cooling_limits = |spec: ClusterSpec| {
        spec.with_attribute("minCoolSetpointLimit", centi(t.min))
            .with_attribute("maxCoolSetpointLimit", centi(t.max))
            .with_attribute("absMinCoolSetpointLimit", centi(t.min))
            .with_attribute("absMaxCoolSetpointLimit", centi(t.max))
    };

    let spec = if has("heat_cool") {
        cooling_limits(heating_limits(thermostat))
            .with_features(&[Feature::Heating, Feature::Cooling, Feature::AutoMode])
            .with_attribute("occupiedHeatingSetpoint", centi(t.low))
            .with_attribute("occupiedCoolingSetpoint", centi(t.high))
            .with_attribute("minSetpointDeadBand", 0)
            .with_attribute("controlSequenceOfOperation", ControlSequenceOfOperation::CoolingAndHeating)
            .with_attribute("systemMode", SystemMode::Auto)
    } else if heat && !cool {
        heating_limits(thermostat)
            .with_features(&[Feature::Heating])
            .with_attribute("occupiedHeatingSetpoint", centi(t.setpoint))
            .with_attribute("controlSequenceOfOperation", ControlSequenceOfOperation::HeatingOnly)
            .with_attribute("systemMode", SystemMode::Heat)
    } else if cool && !heat {
        cooling_limits(thermostat)
            .with_features(&[Feature::Cooling])
            .with_attribute("occupiedCoolingSetpoint", centi(t.setpoint))
            .with_attribute("controlSequenceOfOperation", ControlSequenceOfOperation::CoolingOnly)
            .with_attribute("systemMode", SystemMode::Cool)
    } else if heat && cool {
        cooling_limits(heating_limits(thermostat))
            .with_features(&[Feature::Heating, Feature::Cooling])
            .with_attribute("occupiedHeatingSetpoint", centi(t.setpoint))
            .with_attribute("occupiedCoolingSetpoint", centi(t.setpoint))
            .with_attribute("controlSequenceOfOperation", ControlSequenceOfOperation::CoolingAndHeating)
            .with_attribute("systemMode", SystemMode::Heat)
    } else {
        debug!(?modes, "climate modes support neither heating nor cooling");
        return None;
    };
    Some(spec)
}

// ── Fan ─────────────────────────────────────────────────────────────

/// Basic speed/auto fan, upgraded to the complete variant when the entity
/// reports a direction or oscillation.
pub fn fan(state: &StateSnapshot) -> ClusterSpec {
    let complete = state.attr_str("direction").is_some()
        || state.attr("oscillating").and_then(Value::as_bool).is_some();

    let spec = ClusterSpec::new(ClusterId::FanControl)
        .with_features(&[Feature::MultiSpeed, Feature::Auto])
        .with_attribute("fanMode", FanMode::Off)
        .with_attribute("fanModeSequence", FanModeSequence::OffLowMedHighAuto)
        .with_attribute("percentSetting", 0)
        .with_attribute("percentCurrent", 0)
        .with_attribute("speedMax", 100)
        .with_attribute("speedSetting", 0)
        .with_attribute("speedCurrent", 0);
    if !complete {
        return spec;
    }
    spec.with_features(&[Feature::Rocking, Feature::AirflowDirection])
        .with_attribute("rockSupport", rock_bitmap(true, true, true))
        .with_attribute("rockSetting", rock_bitmap(false, false, false))
        .with_attribute("airflowDirection", AirflowDirection::Forward)
}

// ── Vacuum ──────────────────────────────────────────────────────────

/// Run-mode and operational-state pair, seeded from the current activity.
pub fn vacuum(state: &StateSnapshot) -> [ClusterSpec; 2] {
    let (mode, op_state) =
        vacuum_activity(&state.state).unwrap_or((RunMode::Idle, OperationalState::Docked));
    [
        ClusterSpec::new(ClusterId::RvcRunMode)
            .with_attribute("supportedModes", run_mode_list())
            .with_attribute("currentMode", mode),
        ClusterSpec::new(ClusterId::RvcOperationalState)
            .with_attribute("phaseList", Value::Null)
            .with_attribute("currentPhase", Value::Null)
            .with_attribute("operationalStateList", operational_state_list())
            .with_attribute("operationalState", op_state)
            .with_attribute("operationalError", json!({ "errorStateId": 0 })),
    ]
}

// ── Color light ─────────────────────────────────────────────────────

pub const DEFAULT_MIN_KELVIN: u32 = 2000;
pub const DEFAULT_MAX_KELVIN: u32 = 6500;

const FULL_COLOR_MODES: [&str; 5] = ["xy", "hs", "rgb", "rgbw", "rgbww"];

fn attr_u32(state: &StateSnapshot, key: &str) -> Option<u32> {
    state.attr(key).and_then(Value::as_u64).and_then(|v| u32::try_from(v).ok())
}

/// Physical mireds bounds `(min, max)`.
pub fn mireds_bounds(state: &StateSnapshot) -> (u32, u32) {
    let min = attr_u32(state, "min_mireds")
        .or_else(|| {
            attr_u32(state, "max_color_temp_kelvin").and_then(|k| kelvin_to_mireds(k, Rounding::Floor))
        })
        .or_else(|| kelvin_to_mireds(DEFAULT_MAX_KELVIN, Rounding::Floor))
        .unwrap_or(153);
    let max = attr_u32(state, "max_mireds")
        .or_else(|| {
            attr_u32(state, "min_color_temp_kelvin").and_then(|k| kelvin_to_mireds(k, Rounding::Floor))
        })
        .or_else(|| kelvin_to_mireds(DEFAULT_MIN_KELVIN, Rounding::Floor))
        .unwrap_or(500);
    (min, max)
}

/// Color-control cluster for a color-capable light.
pub fn color_light(state: &StateSnapshot) -> ClusterSpec {
    let modes = state.attr_strings("supported_color_modes").unwrap_or_default();
    let ct_only = modes.contains(&"color_temp") && !modes.iter().any(|m| FULL_COLOR_MODES.contains(m));

    let (min, max) = mireds_bounds(state);
    let current = attr_u32(state, "color_temp")
        .or_else(|| {
            attr_u32(state, "color_temp_kelvin").and_then(|k| kelvin_to_mireds(k, Rounding::Nearest))
        })
        .unwrap_or(min)
        .clamp(min.min(max), max.max(min));

    let spec = ClusterSpec::new(ClusterId::ColorControl)
        .with_attribute("colorTemperatureMireds", current)
        .with_attribute("colorTempPhysicalMinMireds", min)
        .with_attribute("colorTempPhysicalMaxMireds", max);
    if ct_only {
        return spec
            .with_features(&[Feature::ColorTemperature])
            .with_attribute("colorMode", ColorMode::ColorTemperatureMireds);
    }

    let mode = match state.attr_str("color_mode") {
        Some("xy") => ColorMode::CurrentXAndCurrentY,
        Some("color_temp") => ColorMode::ColorTemperatureMireds,
        _ => ColorMode::CurrentHueAndCurrentSaturation,
    };
    spec.with_features(&[Feature::ColorTemperature, Feature::HueSaturation, Feature::Xy])
        .with_attribute("colorMode", mode)
        .with_attribute("currentHue", 0)
        .with_attribute("currentSaturation", 0)
        .with_attribute("currentX", 0)
        .with_attribute("currentY", 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Attributes;
    use pretty_assertions::assert_eq;

    fn state(value: &str, attrs: Value) -> StateSnapshot {
        let attributes: Attributes = match attrs {
            Value::Object(map) => map,
            _ => Attributes::new(),
        };
        StateSnapshot::new(value, attributes)
    }

    fn attr(spec: &ClusterSpec, key: &str) -> Value {
        spec.attributes.get(key).cloned().unwrap_or(Value::Null)
    }

    #[test]
    fn climate_heat_cool_uses_auto_mode() {
        let s = state(
            "heat_cool",
            json!({
                "hvac_modes": ["heat_cool"],
                "current_temperature": 20,
                "target_temp_low": 10,
                "target_temp_high": 30,
            }),
        );
        let spec = climate(&s, &BridgeConfig::default()).unwrap();
        assert!(spec.has_feature(Feature::AutoMode));
        assert_eq!(attr(&spec, "localTemperature"), json!(2000));
        assert_eq!(attr(&spec, "occupiedHeatingSetpoint"), json!(1000));
        assert_eq!(attr(&spec, "occupiedCoolingSetpoint"), json!(3000));
        assert_eq!(attr(&spec, "minHeatSetpointLimit"), json!(0));
        assert_eq!(attr(&spec, "maxCoolSetpointLimit"), json!(5000));
    }

    #[test]
    fn climate_heat_only_defaults_setpoint() {
        let s = state("heat", json!({ "hvac_modes": ["off", "heat"] }));
        let spec = climate(&s, &BridgeConfig::default()).unwrap();
        assert_eq!(spec.features.iter().copied().collect::<Vec<_>>(), vec![Feature::Heating]);
        assert_eq!(attr(&spec, "occupiedHeatingSetpoint"), json!(2300));
        assert_eq!(attr(&spec, "localTemperature"), Value::Null);
        assert!(!spec.attributes.contains_key("occupiedCoolingSetpoint"));
    }

    #[test]
    fn climate_without_modes_defaults_to_heat() {
        let spec = climate(&state("heat", json!({})), &BridgeConfig::default()).unwrap();
        assert!(spec.has_feature(Feature::Heating));
    }

    #[test]
    fn climate_cool_only_and_combined() {
        let cool = climate(&state("cool", json!({ "hvac_modes": ["cool"], "temperature": 24 })), &BridgeConfig::default()).unwrap();
        assert_eq!(attr(&cool, "occupiedCoolingSetpoint"), json!(2400));
        assert!(!cool.has_feature(Feature::Heating));

        let both = climate(
            &state("heat", json!({ "hvac_modes": ["heat", "cool"], "temperature": 21 })),
            &BridgeConfig::default(),
        )
        .unwrap();
        assert_eq!(attr(&both, "occupiedHeatingSetpoint"), json!(2100));
        assert_eq!(attr(&both, "occupiedCoolingSetpoint"), json!(2100));
        assert!(!both.has_feature(Feature::AutoMode));
    }

    #[test]
    fn climate_fan_only_has_no_thermostat() {
        let s = state("fan_only", json!({ "hvac_modes": ["off", "fan_only"] }));
        assert!(climate(&s, &BridgeConfig::default()).is_none());
    }

    #[test]
    fn climate_converts_fahrenheit() {
        let config = BridgeConfig {
            temperature_unit: Some(TemperatureUnit::Fahrenheit),
            ..BridgeConfig::default()
        };
        let s = state("heat", json!({ "hvac_modes": ["heat"], "temperature": 68, "current_temperature": 212 }));
        let spec = climate(&s, &config).unwrap();
        assert_eq!(attr(&spec, "occupiedHeatingSetpoint"), json!(2000));
        assert_eq!(attr(&spec, "localTemperature"), json!(10000));
    }

    #[test]
    fn fan_variants() {
        let basic = fan(&state("off", json!({ "percentage": 0 })));
        assert!(!basic.has_feature(Feature::Rocking));
        assert_eq!(attr(&basic, "fanModeSequence"), json!(2));

        let complete = fan(&state("on", json!({ "oscillating": false })));
        assert!(complete.has_feature(Feature::Rocking));
        assert!(complete.has_feature(Feature::AirflowDirection));
        assert_eq!(
            attr(&complete, "rockSupport"),
            json!({ "rockLeftRight": true, "rockUpDown": true, "rockRound": true })
        );
        assert_eq!(attr(&complete, "airflowDirection"), json!(0));
    }

    #[test]
    fn vacuum_seeds_from_activity() {
        let [run, op] = vacuum(&state("cleaning", json!({})));
        assert_eq!(attr(&run, "currentMode"), json!(2));
        assert_eq!(attr(&op, "operationalState"), json!(1));

        let [run, op] = vacuum(&state("unavailable", json!({})));
        assert_eq!(attr(&run, "currentMode"), json!(1));
        assert_eq!(attr(&op, "operationalState"), json!(0x42));
    }

    #[test]
    fn color_temperature_only_light() {
        let s = state(
            "on",
            json!({
                "supported_color_modes": ["onoff", "brightness", "color_temp"],
                "color_temp": 200,
                "min_mireds": 153,
                "max_mireds": 400,
            }),
        );
        let spec = color_light(&s);
        assert_eq!(spec.features.iter().copied().collect::<Vec<_>>(), vec![Feature::ColorTemperature]);
        assert_eq!(attr(&spec, "colorTemperatureMireds"), json!(200));
        assert_eq!(attr(&spec, "colorTempPhysicalMinMireds"), json!(153));
        assert_eq!(attr(&spec, "colorTempPhysicalMaxMireds"), json!(400));
    }

    #[test]
    fn full_color_light_bounds_from_kelvin() {
        let s = state(
            "on",
            json!({
                "supported_color_modes": ["color_temp", "hs"],
                "min_color_temp_kelvin": 2202,
                "max_color_temp_kelvin": 6535,
            }),
        );
        let spec = color_light(&s);
        assert!(spec.has_feature(Feature::HueSaturation));
        assert!(spec.has_feature(Feature::Xy));
        assert_eq!(mireds_bounds(&s), (153, 454));
        assert_eq!(attr(&spec, "colorTemperatureMireds"), json!(153));
    }

    #[test]
    fn default_mireds_bounds() {
        assert_eq!(mireds_bounds(&state("on", json!({}))), (153, 500));
    }
}
