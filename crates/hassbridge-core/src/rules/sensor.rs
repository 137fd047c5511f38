// ── Sensor and binary-sensor value rules ──

use serde_json::{Value, json};

use super::ValueRule;
use crate::convert::{
    self, TemperatureUnit, as_number, battery_to_matter, concentration_to_matter,
    energy_to_matter, humidity_to_matter, illuminance_to_matter, pressure_to_matter,
    temperature_to_matter, to_milli,
};
use crate::matter::ClusterId;
use crate::matter::Feature;
use crate::matter::cluster::AlarmState;
use crate::matter::device_type::{
    AIR_QUALITY_SENSOR, CONTACT_SENSOR, ELECTRICAL_SENSOR, HUMIDITY_SENSOR, LIGHT_SENSOR,
    OCCUPANCY_SENSOR, POWER_SOURCE, PRESSURE_SENSOR, SMOKE_CO_ALARM, TEMPERATURE_SENSOR,
    WATER_LEAK_DETECTOR,
};

const MEASUREMENT: Option<&str> = Some("measurement");
const TOTAL_INCREASING: Option<&str> = Some("total_increasing");

// ── Converters ──────────────────────────────────────────────────────

fn temperature(value: &Value, unit: Option<&str>) -> Option<Value> {
    let unit: TemperatureUnit = unit.and_then(|u| u.parse().ok()).unwrap_or_default();
    temperature_to_matter(as_number(value)?, unit).map(Value::from)
}

fn humidity(value: &Value, _: Option<&str>) -> Option<Value> {
    humidity_to_matter(as_number(value)?).map(Value::from)
}

fn pressure(value: &Value, unit: Option<&str>) -> Option<Value> {
    pressure_to_matter(as_number(value)?, unit).map(Value::from)
}

fn illuminance(value: &Value, _: Option<&str>) -> Option<Value> {
    illuminance_to_matter(as_number(value)?).map(Value::from)
}

fn battery(value: &Value, _: Option<&str>) -> Option<Value> {
    battery_to_matter(as_number(value)?).map(Value::from)
}

fn air_quality(value: &Value, _: Option<&str>) -> Option<Value> {
    convert::air_quality(value).map(Value::from)
}

fn concentration(value: &Value, _: Option<&str>) -> Option<Value> {
    concentration_to_matter(as_number(value)?).map(Value::from)
}

fn milli(value: &Value, _: Option<&str>) -> Option<Value> {
    to_milli(as_number(value)?).map(Value::from)
}

fn energy(value: &Value, unit: Option<&str>) -> Option<Value> {
    let kwh = match unit.unwrap_or("kWh") {
        "kWh" => as_number(value)?,
        "Wh" => as_number(value)? / 1000.0,
        _ => return None,
    };
    energy_to_matter(kwh).map(|mwh| json!({ "energy": mwh }))
}

/// Binary-sensor state as a boolean, `None` for `unavailable` and friends.
fn on_off(value: &Value) -> Option<bool> {
    match value.as_str()? {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// Contact sensors report `true` while closed.
fn contact(value: &Value, _: Option<&str>) -> Option<Value> {
    on_off(value).map(|open| Value::Bool(!open))
}

fn leak(value: &Value, _: Option<&str>) -> Option<Value> {
    on_off(value).map(Value::Bool)
}

fn occupancy(value: &Value, _: Option<&str>) -> Option<Value> {
    on_off(value).map(|occupied| json!({ "occupied": occupied }))
}

fn alarm(value: &Value, _: Option<&str>) -> Option<Value> {
    on_off(value).map(|on| {
        if on {
            AlarmState::Critical.into()
        } else {
            AlarmState::Normal.into()
        }
    })
}

// ── Table ───────────────────────────────────────────────────────────

macro_rules! value_rule {
    ($domain:expr, $class:expr, $state_class:expr, $dt:expr, $cluster:ident, [$($feature:ident),*], $attr:expr, $convert:expr) => {
        ValueRule {
            domain: $domain,
            with_device_class: $class,
            with_state_class: $state_class,
            device_type: &$dt,
            cluster: ClusterId::$cluster,
            features: &[$(Feature::$feature),*],
            attribute: $attr,
            convert: $convert,
        }
    };
}

#[rustfmt::skip]
pub static VALUE_RULES: &[ValueRule] = &[
    value_rule!("sensor", "temperature", MEASUREMENT, TEMPERATURE_SENSOR, TemperatureMeasurement, [], "measuredValue", temperature),
    value_rule!("sensor", "humidity", MEASUREMENT, HUMIDITY_SENSOR, RelativeHumidityMeasurement, [], "measuredValue", humidity),
    value_rule!("sensor", "pressure", MEASUREMENT, PRESSURE_SENSOR, PressureMeasurement, [], "measuredValue", pressure),
    value_rule!("sensor", "atmospheric_pressure", MEASUREMENT, PRESSURE_SENSOR, PressureMeasurement, [], "measuredValue", pressure),
    value_rule!("sensor", "illuminance", MEASUREMENT, LIGHT_SENSOR, IlluminanceMeasurement, [], "measuredValue", illuminance),
    value_rule!("sensor", "battery", MEASUREMENT, POWER_SOURCE, PowerSource, [Battery], "batPercentRemaining", battery),
    value_rule!("sensor", "aqi", None, AIR_QUALITY_SENSOR, AirQuality, [], "airQuality", air_quality),
    value_rule!("sensor", "carbon_dioxide", MEASUREMENT, AIR_QUALITY_SENSOR, CarbonDioxideConcentrationMeasurement, [], "measuredValue", concentration),
    value_rule!("sensor", "carbon_monoxide", MEASUREMENT, AIR_QUALITY_SENSOR, CarbonMonoxideConcentrationMeasurement, [], "measuredValue", concentration),
    value_rule!("sensor", "pm25", MEASUREMENT, AIR_QUALITY_SENSOR, Pm25ConcentrationMeasurement, [], "measuredValue", concentration),
    value_rule!("sensor", "pm10", MEASUREMENT, AIR_QUALITY_SENSOR, Pm10ConcentrationMeasurement, [], "measuredValue", concentration),
    value_rule!("sensor", "volatile_organic_compounds", MEASUREMENT, AIR_QUALITY_SENSOR, TotalVolatileOrganicCompoundsConcentrationMeasurement, [], "measuredValue", concentration),
    value_rule!("sensor", "power", MEASUREMENT, ELECTRICAL_SENSOR, ElectricalPowerMeasurement, [AlternatingCurrent], "activePower", milli),
    value_rule!("sensor", "voltage", MEASUREMENT, ELECTRICAL_SENSOR, ElectricalPowerMeasurement, [AlternatingCurrent], "voltage", milli),
    value_rule!("sensor", "current", MEASUREMENT, ELECTRICAL_SENSOR, ElectricalPowerMeasurement, [AlternatingCurrent], "activeCurrent", milli),
    value_rule!("sensor", "energy", TOTAL_INCREASING, ELECTRICAL_SENSOR, ElectricalEnergyMeasurement, [ImportedEnergy, CumulativeEnergy], "cumulativeEnergyImported", energy),

    value_rule!("binary_sensor", "door", None, CONTACT_SENSOR, BooleanState, [], "stateValue", contact),
    value_rule!("binary_sensor", "window", None, CONTACT_SENSOR, BooleanState, [], "stateValue", contact),
    value_rule!("binary_sensor", "garage_door", None, CONTACT_SENSOR, BooleanState, [], "stateValue", contact),
    value_rule!("binary_sensor", "opening", None, CONTACT_SENSOR, BooleanState, [], "stateValue", contact),
    value_rule!("binary_sensor", "moisture", None, WATER_LEAK_DETECTOR, BooleanState, [], "stateValue", leak),
    value_rule!("binary_sensor", "motion", None, OCCUPANCY_SENSOR, OccupancySensing, [], "occupancy", occupancy),
    value_rule!("binary_sensor", "occupancy", None, OCCUPANCY_SENSOR, OccupancySensing, [], "occupancy", occupancy),
    value_rule!("binary_sensor", "presence", None, OCCUPANCY_SENSOR, OccupancySensing, [], "occupancy", occupancy),
    value_rule!("binary_sensor", "smoke", None, SMOKE_CO_ALARM, SmokeCoAlarm, [SmokeAlarm], "smokeState", alarm),
    value_rule!("binary_sensor", "carbon_monoxide", None, SMOKE_CO_ALARM, SmokeCoAlarm, [CoAlarm], "coState", alarm),
];

/// First rule matching the entity's domain, device class and state class.
///
/// A rule without a state class matches any; a rule with one requires the
/// entity to report exactly that class.
pub fn value_rule(
    domain: &str,
    device_class: Option<&str>,
    state_class: Option<&str>,
) -> Option<&'static ValueRule> {
    let device_class = device_class?;
    VALUE_RULES.iter().find(|r| {
        r.domain == domain
            && r.with_device_class == device_class
            && r.with_state_class.is_none_or(|wanted| state_class == Some(wanted))
    })
}
