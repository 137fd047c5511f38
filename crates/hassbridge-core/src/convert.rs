// ── Value converters ──
//
// Pure unit / numeric / enum translation between Home Assistant values and
// protocol attribute encodings. Every fallible conversion returns `Option`:
// `None` means "invalid or not applicable" and callers must skip the
// attribute instead of writing a made-up value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matter::cluster::{AirQuality, OperationalState, RunMode};

// ── Helpers ────────────────────────────────────────────────────────

/// Round to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round and narrow to an integer range, `None` if the result falls outside.
#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
fn round_within(value: f64, min: i64, max: i64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < min as f64 || rounded > max as f64 {
        return None;
    }
    Some(rounded as i64)
}

/// Numeric JSON value, also accepting numeric strings (sensor states are strings).
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

// ── Temperature ────────────────────────────────────────────────────

/// Lowest temperature representable by the instrument encoding (−148 °F).
pub const MIN_MEASURED_CELSIUS: f64 = -100.0;
/// Highest temperature representable by the instrument encoding (212 °F).
pub const MAX_MEASURED_CELSIUS: f64 = 100.0;

/// Temperature unit reported by an entity or configured for the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    #[serde(alias = "c", alias = "C", alias = "°C")]
    Celsius,
    #[serde(alias = "f", alias = "F", alias = "°F")]
    Fahrenheit,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => write!(f, "°C"),
            Self::Fahrenheit => write!(f, "°F"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('°').to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit '{other}'")),
        }
    }
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert to Celsius, rounded to 2 decimals.
pub fn to_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => round_to(value, 2),
        TemperatureUnit::Fahrenheit => round_to(fahrenheit_to_celsius(value), 2),
    }
}

/// Convert a Celsius value back to the entity's unit, rounded to 2 decimals.
pub fn from_celsius(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => round_to(celsius, 2),
        TemperatureUnit::Fahrenheit => round_to(celsius_to_fahrenheit(celsius), 2),
    }
}

/// Temperature in hundredths of a degree Celsius.
///
/// Values outside the instrument range (−100 °C..100 °C, i.e. −148 °F..212 °F)
/// yield `None`.
pub fn temperature_to_matter(value: f64, unit: TemperatureUnit) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let celsius = to_celsius(value, unit);
    if !(MIN_MEASURED_CELSIUS..=MAX_MEASURED_CELSIUS).contains(&celsius) {
        return None;
    }
    round_within(celsius * 100.0, -10_000, 10_000)
}

/// Hundredths of °C back to the entity's unit.
#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
pub fn temperature_from_matter(hundredths: i64, unit: TemperatureUnit) -> f64 {
    from_celsius(hundredths as f64 / 100.0, unit)
}

// ── Color temperature ──────────────────────────────────────────────

/// Rounding applied by reciprocal color-temperature conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rounding {
    Floor,
    Ceil,
    #[default]
    Nearest,
}

impl Rounding {
    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Floor => value.floor(),
            Self::Ceil => value.ceil(),
            Self::Nearest => value.round(),
        }
    }
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn reciprocal(value: u32, rounding: Rounding) -> Option<u32> {
    if value == 0 {
        return None;
    }
    let result = rounding.apply(1_000_000.0 / f64::from(value));
    (result >= 1.0 && result <= f64::from(u32::MAX)).then(|| result as u32)
}

/// `kelvin = 1_000_000 / mireds`.
pub fn mireds_to_kelvin(mireds: u32, rounding: Rounding) -> Option<u32> {
    reciprocal(mireds, rounding)
}

/// `mireds = 1_000_000 / kelvin`.
pub fn kelvin_to_mireds(kelvin: u32, rounding: Rounding) -> Option<u32> {
    reciprocal(kelvin, rounding)
}

// ── XY color ───────────────────────────────────────────────────────

/// Highest XY coordinate the protocol accepts. Not 65535.
pub const MAX_XY: u16 = 65279;

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn xy_axis_to_matter(value: f64) -> u16 {
    // NaN clamps to NaN; the saturating cast turns it into 0.
    (value * 65536.0).round().clamp(0.0, f64::from(MAX_XY)) as u16
}

/// Home Assistant `[0,1]` XY pair to the protocol's 16-bit pair.
pub fn xy_to_matter(x: f64, y: f64) -> (u16, u16) {
    (xy_axis_to_matter(x), xy_axis_to_matter(y))
}

/// Protocol 16-bit XY pair to Home Assistant floats, 4 decimals.
pub fn xy_from_matter(x: u16, y: u16) -> (f64, f64) {
    let axis = |v: u16| round_to(f64::from(v.min(MAX_XY)) / 65536.0, 4);
    (axis(x), axis(y))
}

// ── Hue / saturation ───────────────────────────────────────────────

/// Hue degrees `0..=360` to protocol `0..=254`.
pub fn hue_to_matter(degrees: f64) -> Option<u8> {
    if !(0.0..=360.0).contains(&degrees) {
        return None;
    }
    round_within(degrees / 360.0 * 254.0, 0, 254).and_then(|v| u8::try_from(v).ok())
}

/// Saturation percent `0..=100` to protocol `0..=254`.
pub fn saturation_to_matter(percent: f64) -> Option<u8> {
    if !(0.0..=100.0).contains(&percent) {
        return None;
    }
    round_within(percent / 100.0 * 254.0, 0, 254).and_then(|v| u8::try_from(v).ok())
}

/// Protocol hue to whole degrees.
pub fn hue_from_matter(hue: u8) -> f64 {
    (f64::from(hue.min(254)) / 254.0 * 360.0).round()
}

/// Protocol saturation to whole percent.
pub fn saturation_from_matter(saturation: u8) -> f64 {
    (f64::from(saturation.min(254)) / 254.0 * 100.0).round()
}

// ── Brightness ─────────────────────────────────────────────────────

/// Protocol level `1..=254` to Home Assistant brightness `1..=255`.
///
/// Level 0 means "no brightness" and yields `None`.
pub fn level_to_brightness(level: u8) -> Option<u8> {
    if level == 0 {
        return None;
    }
    round_within(f64::from(level) / 254.0 * 255.0, 1, 255).and_then(|v| u8::try_from(v).ok())
}

/// Home Assistant brightness `1..=255` to protocol level `1..=254`.
pub fn brightness_to_level(brightness: f64) -> Option<u8> {
    if !brightness.is_finite() || brightness < 1.0 || brightness > 255.0 {
        return None;
    }
    let level = (brightness / 255.0 * 254.0).round().clamp(1.0, 254.0);
    round_within(level, 1, 254).and_then(|v| u8::try_from(v).ok())
}

// ── Air quality ────────────────────────────────────────────────────

/// Numeric AQI band. Values outside `0..=500` yield `None`.
pub fn air_quality_from_index(index: f64) -> Option<AirQuality> {
    match index {
        v if !(0.0..=500.0).contains(&v) => None,
        v if v <= 50.0 => Some(AirQuality::Good),
        v if v <= 100.0 => Some(AirQuality::Fair),
        // No boundary at 200: an index of 300 must still read Poor.
        v if v <= 150.0 => Some(AirQuality::Moderate),
        v if v <= 300.0 => Some(AirQuality::Poor),
        v if v <= 400.0 => Some(AirQuality::VeryPoor),
        _ => Some(AirQuality::ExtremelyPoor),
    }
}

/// Textual air-quality state, case-insensitive.
pub fn air_quality_from_text(text: &str) -> Option<AirQuality> {
    match text.trim().to_ascii_lowercase().as_str() {
        "good" | "excellent" | "healthy" | "fine" => Some(AirQuality::Good),
        "fair" => Some(AirQuality::Fair),
        "moderate" => Some(AirQuality::Moderate),
        "poor" | "unhealthy_for_sensitive_groups" => Some(AirQuality::Poor),
        "unhealthy" | "very_poor" => Some(AirQuality::VeryPoor),
        "very_unhealthy" | "hazardous" | "extremely_poor" => Some(AirQuality::ExtremelyPoor),
        _ => None,
    }
}

/// Either a numeric index or a text band.
pub fn air_quality(value: &Value) -> Option<AirQuality> {
    match value {
        Value::Number(n) => n.as_f64().and_then(air_quality_from_index),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(index) => air_quality_from_index(index),
            Err(_) => air_quality_from_text(s),
        },
        _ => None,
    }
}

// ── Cover / valve position ─────────────────────────────────────────

/// Percent open (0 closed, 100 open) to lift percent hundredths (0 open).
pub fn position_to_lift(percent_open: f64) -> Option<u16> {
    if !(0.0..=100.0).contains(&percent_open) {
        return None;
    }
    round_within((100.0 - percent_open) * 100.0, 0, 10_000).and_then(|v| u16::try_from(v).ok())
}

/// Lift percent hundredths back to percent open.
pub fn lift_to_position(lift_percent_100ths: f64) -> Option<u8> {
    if !(0.0..=10_000.0).contains(&lift_percent_100ths) {
        return None;
    }
    round_within(100.0 - lift_percent_100ths / 100.0, 0, 100).and_then(|v| u8::try_from(v).ok())
}

// ── Vacuum activity ────────────────────────────────────────────────

/// Run mode and operational state for a vacuum activity string.
///
/// Unknown activities yield `None` and must leave prior state untouched.
pub fn vacuum_activity(activity: &str) -> Option<(RunMode, OperationalState)> {
    match activity {
        "docked" => Some((RunMode::Idle, OperationalState::Docked)),
        "idle" => Some((RunMode::Idle, OperationalState::Stopped)),
        "cleaning" => Some((RunMode::Cleaning, OperationalState::Running)),
        "paused" => Some((RunMode::Idle, OperationalState::Paused)),
        "returning" => Some((RunMode::Idle, OperationalState::SeekingCharger)),
        _ => None,
    }
}

// ── Sensor measurements ────────────────────────────────────────────

/// Relative humidity percent to hundredths.
pub fn humidity_to_matter(percent: f64) -> Option<i64> {
    if !(0.0..=100.0).contains(&percent) {
        return None;
    }
    round_within(percent * 100.0, 0, 10_000)
}

/// Pressure to tenths of a kPa (hPa), honouring the reported unit.
pub fn pressure_to_matter(value: f64, unit: Option<&str>) -> Option<i64> {
    let factor = match unit.unwrap_or("hPa") {
        "hPa" | "mbar" => 1.0,
        "kPa" | "cbar" => 10.0,
        "bar" => 1000.0,
        "inHg" => 33.8639,
        "psi" => 68.9476,
        "mmHg" => 1.333_22,
        _ => return None,
    };
    round_within(value * factor, -32_767, 32_767)
}

/// Lux to the logarithmic illuminance encoding `10000·log10(lux)+1`.
pub fn illuminance_to_matter(lux: f64) -> Option<i64> {
    if !lux.is_finite() || lux < 0.0 {
        return None;
    }
    if lux == 0.0 {
        return Some(0);
    }
    let encoded = (10_000.0 * lux.log10() + 1.0).round().clamp(1.0, 65_534.0);
    round_within(encoded, 1, 65_534)
}

/// Battery percent to half-percent units.
pub fn battery_to_matter(percent: f64) -> Option<i64> {
    if !(0.0..=100.0).contains(&percent) {
        return None;
    }
    round_within(percent * 2.0, 0, 200)
}

/// Scale a base-unit reading to milli-units (W → mW, V → mV, A → mA).
pub fn to_milli(value: f64) -> Option<i64> {
    round_within(value * 1000.0, i64::MIN / 2, i64::MAX / 2)
}

/// kWh to mWh.
pub fn energy_to_matter(kwh: f64) -> Option<i64> {
    if kwh < 0.0 {
        return None;
    }
    round_within(kwh * 1_000_000.0, 0, i64::MAX / 2)
}

/// Concentrations are carried as non-negative floats.
pub fn concentration_to_matter(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}
