// ── Cluster identifiers, feature flags and protocol enums ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Generates a protocol enum with its numeric wire value.
macro_rules! protocol_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $($variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn value(self) -> $repr {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            pub fn from_value(value: $repr) -> Option<Self> {
                match value {
                    $(v if v == $value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Decode from a JSON number.
            pub fn from_json(value: &Value) -> Option<Self> {
                value
                    .as_u64()
                    .and_then(|v| <$repr>::try_from(v).ok())
                    .and_then(Self::from_value)
            }
        }

        impl From<$name> for Value {
            fn from(v: $name) -> Self {
                Value::from(v.value())
            }
        }
    };
}

// ── ClusterId ───────────────────────────────────────────────────────

/// Server clusters the bridge knows how to attach.
///
/// The string form is the camelCase cluster name used by the protocol host
/// when it forwards commands (`levelControl`, `fanControl`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ClusterId {
    Identify,
    Groups,
    OnOff,
    LevelControl,
    Descriptor,
    PowerSource,
    BridgedDeviceBasicInformation,
    BooleanState,
    RvcRunMode,
    AirQuality,
    SmokeCoAlarm,
    RvcOperationalState,
    ValveConfigurationAndControl,
    ElectricalPowerMeasurement,
    ElectricalEnergyMeasurement,
    DoorLock,
    WindowCovering,
    Thermostat,
    FanControl,
    ColorControl,
    IlluminanceMeasurement,
    TemperatureMeasurement,
    PressureMeasurement,
    RelativeHumidityMeasurement,
    OccupancySensing,
    CarbonMonoxideConcentrationMeasurement,
    CarbonDioxideConcentrationMeasurement,
    Pm25ConcentrationMeasurement,
    Pm10ConcentrationMeasurement,
    TotalVolatileOrganicCompoundsConcentrationMeasurement,
}

impl ClusterId {
    /// Numeric cluster id on the wire.
    pub const fn code(self) -> u32 {
        match self {
            Self::Identify => 0x0003,
            Self::Groups => 0x0004,
            Self::OnOff => 0x0006,
            Self::LevelControl => 0x0008,
            Self::Descriptor => 0x001D,
            Self::PowerSource => 0x002F,
            Self::BridgedDeviceBasicInformation => 0x0039,
            Self::BooleanState => 0x0045,
            Self::RvcRunMode => 0x0054,
            Self::AirQuality => 0x005B,
            Self::SmokeCoAlarm => 0x005C,
            Self::RvcOperationalState => 0x0061,
            Self::ValveConfigurationAndControl => 0x0081,
            Self::ElectricalPowerMeasurement => 0x0090,
            Self::ElectricalEnergyMeasurement => 0x0091,
            Self::DoorLock => 0x0101,
            Self::WindowCovering => 0x0102,
            Self::Thermostat => 0x0201,
            Self::FanControl => 0x0202,
            Self::ColorControl => 0x0300,
            Self::IlluminanceMeasurement => 0x0400,
            Self::TemperatureMeasurement => 0x0402,
            Self::PressureMeasurement => 0x0403,
            Self::RelativeHumidityMeasurement => 0x0405,
            Self::OccupancySensing => 0x0406,
            Self::CarbonMonoxideConcentrationMeasurement => 0x040C,
            Self::CarbonDioxideConcentrationMeasurement => 0x040D,
            Self::Pm25ConcentrationMeasurement => 0x042A,
            Self::Pm10ConcentrationMeasurement => 0x042D,
            Self::TotalVolatileOrganicCompoundsConcentrationMeasurement => 0x042E,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|id| id.code() == code)
    }
}

// ── Feature flags ───────────────────────────────────────────────────

/// Optional cluster features selected by a `ClusterSpec`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Feature {
    // Thermostat
    Heating,
    Cooling,
    AutoMode,
    // FanControl
    MultiSpeed,
    Auto,
    Rocking,
    AirflowDirection,
    // ColorControl
    ColorTemperature,
    HueSaturation,
    Xy,
    // WindowCovering
    Lift,
    PositionAwareLift,
    // ValveConfigurationAndControl
    Level,
    // SmokeCoAlarm
    SmokeAlarm,
    CoAlarm,
    // Electrical measurement
    AlternatingCurrent,
    ImportedEnergy,
    CumulativeEnergy,
    // PowerSource
    Battery,
}

// ── Protocol enums ──────────────────────────────────────────────────

protocol_enum! {
    pub enum FanMode: u8 {
        Off = 0,
        Low = 1,
        Medium = 2,
        High = 3,
        On = 4,
        Auto = 5,
        Smart = 6,
    }
}

protocol_enum! {
    pub enum FanModeSequence: u8 {
        OffLowMedHigh = 0,
        OffLowHigh = 1,
        OffLowMedHighAuto = 2,
        OffLowHighAuto = 3,
        OffHighAuto = 4,
        OffHigh = 5,
    }
}

protocol_enum! {
    pub enum AirflowDirection: u8 {
        Forward = 0,
        Reverse = 1,
    }
}

protocol_enum! {
    pub enum SystemMode: u8 {
        Off = 0,
        Auto = 1,
        Cool = 3,
        Heat = 4,
        EmergencyHeat = 5,
        Precooling = 6,
        FanOnly = 7,
        Dry = 8,
        Sleep = 9,
    }
}

protocol_enum! {
    pub enum ControlSequenceOfOperation: u8 {
        CoolingOnly = 0,
        CoolingWithReheat = 1,
        HeatingOnly = 2,
        HeatingWithReheat = 3,
        CoolingAndHeating = 4,
        CoolingAndHeatingWithReheat = 5,
    }
}

protocol_enum! {
    pub enum LockState: u8 {
        NotFullyLocked = 0,
        Locked = 1,
        Unlocked = 2,
        Unlatched = 3,
    }
}

protocol_enum! {
    pub enum MovementStatus: u8 {
        Stopped = 0,
        Opening = 1,
        Closing = 2,
    }
}

protocol_enum! {
    pub enum ColorMode: u8 {
        CurrentHueAndCurrentSaturation = 0,
        CurrentXAndCurrentY = 1,
        ColorTemperatureMireds = 2,
    }
}

protocol_enum! {
    pub enum AirQuality: u8 {
        Unknown = 0,
        Good = 1,
        Fair = 2,
        Moderate = 3,
        Poor = 4,
        VeryPoor = 5,
        ExtremelyPoor = 6,
    }
}

protocol_enum! {
    /// Modes advertised by the vacuum run-mode cluster.
    pub enum RunMode: u8 {
        Idle = 1,
        Cleaning = 2,
    }
}

protocol_enum! {
    pub enum OperationalState: u8 {
        Stopped = 0,
        Running = 1,
        Paused = 2,
        Error = 3,
        SeekingCharger = 0x40,
        Charging = 0x41,
        Docked = 0x42,
    }
}

protocol_enum! {
    pub enum ValveState: u8 {
        Closed = 0,
        Open = 1,
        Transitioning = 2,
    }
}

protocol_enum! {
    pub enum AlarmState: u8 {
        Normal = 0,
        Warning = 1,
        Critical = 2,
    }
}

protocol_enum! {
    pub enum ExpressedState: u8 {
        Normal = 0,
        SmokeAlarm = 1,
        CoAlarm = 2,
    }
}

/// `operationalStatus` bitmap of the window-covering cluster.
pub fn covering_status(status: MovementStatus) -> Value {
    serde_json::json!({
        "global": status.value(),
        "lift": status.value(),
        "tilt": 0,
    })
}

/// `rockSetting` / `rockSupport` bitmap of the fan-control cluster.
pub fn rock_bitmap(left_right: bool, up_down: bool, round: bool) -> Value {
    serde_json::json!({
        "rockLeftRight": left_right,
        "rockUpDown": up_down,
        "rockRound": round,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cluster_names_are_camel_case() {
        assert_eq!(ClusterId::LevelControl.to_string(), "levelControl");
        assert_eq!(
            "fanControl".parse::<ClusterId>().unwrap(),
            ClusterId::FanControl
        );
        assert_eq!(
            serde_json::to_value(ClusterId::RvcOperationalState).unwrap(),
            json!("rvcOperationalState")
        );
    }

    #[test]
    fn cluster_codes_round_trip() {
        assert_eq!(ClusterId::ColorControl.code(), 0x0300);
        assert_eq!(ClusterId::from_code(0x0201), Some(ClusterId::Thermostat));
        assert_eq!(ClusterId::from_code(0xFFFF), None);
    }

    #[test]
    fn protocol_enum_values() {
        assert_eq!(OperationalState::Docked.value(), 0x42);
        assert_eq!(SystemMode::from_value(4), Some(SystemMode::Heat));
        assert_eq!(SystemMode::from_value(2), None);
        assert_eq!(FanMode::from_json(&json!(3)), Some(FanMode::High));
        assert_eq!(FanMode::from_json(&json!("high")), None);
        assert_eq!(Value::from(AirQuality::Poor), json!(4));
    }
}
