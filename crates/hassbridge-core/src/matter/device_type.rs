// ── Device-type catalog ──
//
// Fixed entries of the protocol's device library. The engine only selects
// and composes these; it never constructs new ones.

use serde::{Serialize, Serializer};

use super::cluster::ClusterId;
use super::cluster::ClusterId::{
    AirQuality, BooleanState, BridgedDeviceBasicInformation, ColorControl, DoorLock,
    ElectricalEnergyMeasurement, ElectricalPowerMeasurement, FanControl, Groups, Identify,
    IlluminanceMeasurement, LevelControl, OccupancySensing, OnOff, PowerSource,
    PressureMeasurement, RelativeHumidityMeasurement, RvcOperationalState, RvcRunMode,
    SmokeCoAlarm, TemperatureMeasurement, Thermostat, ValveConfigurationAndControl,
    WindowCovering,
};

/// Family a device type belongs to. Superset pruning only compares
/// device types of the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Utility,
    Light,
    Switch,
    Outlet,
    Closure,
    Hvac,
    Appliance,
    Sensor,
}

/// A device type from the catalog: numeric code, name, mandatory clusters.
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceTypeDescriptor {
    pub code: u16,
    pub name: &'static str,
    pub revision: u8,
    pub category: DeviceCategory,
    pub required_clusters: &'static [ClusterId],
}

impl DeviceTypeDescriptor {
    pub fn requires(&self, cluster: ClusterId) -> bool {
        self.required_clusters.contains(&cluster)
    }
}

impl Serialize for DeviceTypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{} (0x{:04x})", self.name, self.code))
    }
}

macro_rules! device_type {
    ($ident:ident, $code:expr, $name:expr, $rev:expr, $category:ident, [$($cluster:ident),* $(,)?]) => {
        pub static $ident: DeviceTypeDescriptor = DeviceTypeDescriptor {
            code: $code,
            name: $name,
            revision: $rev,
            category: DeviceCategory::$category,
            required_clusters: &[$($cluster),*],
        };
    };
}

// ── Utility ──
device_type!(BRIDGED_NODE, 0x0013, "MA-bridgedNode", 3, Utility, [BridgedDeviceBasicInformation]);
device_type!(POWER_SOURCE, 0x0011, "MA-powerSource", 1, Utility, [PowerSource]);

// ── Lighting ──
device_type!(ON_OFF_LIGHT, 0x0100, "MA-onofflight", 3, Light, [Identify, Groups, OnOff]);
device_type!(DIMMABLE_LIGHT, 0x0101, "MA-dimmablelight", 3, Light, [Identify, Groups, OnOff, LevelControl]);
device_type!(COLOR_TEMPERATURE_LIGHT, 0x010C, "MA-colortemperaturelight", 4, Light, [Identify, Groups, OnOff, LevelControl, ColorControl]);
device_type!(EXTENDED_COLOR_LIGHT, 0x010D, "MA-extendedcolorlight", 4, Light, [Identify, Groups, OnOff, LevelControl, ColorControl]);

// ── Switches and outlets ──
device_type!(ON_OFF_SWITCH, 0x0103, "MA-onoffswitch", 3, Switch, [Identify, OnOff]);
device_type!(DIMMABLE_SWITCH, 0x0104, "MA-dimmableswitch", 3, Switch, [Identify, OnOff, LevelControl]);
device_type!(COLOR_TEMPERATURE_SWITCH, 0x0105, "MA-colordimmerswitch", 3, Switch, [Identify, OnOff, LevelControl, ColorControl]);
device_type!(ON_OFF_OUTLET, 0x010A, "MA-onoffpluginunit", 3, Outlet, [Identify, Groups, OnOff]);
device_type!(DIMMABLE_OUTLET, 0x010B, "MA-dimmablepluginunit", 4, Outlet, [Identify, Groups, OnOff, LevelControl]);

// ── Closures ──
device_type!(DOOR_LOCK, 0x000A, "MA-doorLock", 3, Closure, [Identify, DoorLock]);
device_type!(WINDOW_COVERING, 0x0202, "MA-windowcovering", 3, Closure, [Identify, WindowCovering]);
device_type!(WATER_VALVE, 0x0042, "MA-waterValve", 1, Closure, [Identify, ValveConfigurationAndControl]);

// ── HVAC ──
device_type!(THERMOSTAT, 0x0301, "MA-thermostat", 3, Hvac, [Identify, Thermostat]);
device_type!(FAN, 0x002B, "MA-fan", 2, Hvac, [Identify, Groups, FanControl]);

// ── Appliances ──
device_type!(ROBOTIC_VACUUM_CLEANER, 0x0074, "MA-roboticvacuumcleaner", 3, Appliance, [Identify, RvcRunMode, RvcOperationalState]);

// ── Sensors ──
device_type!(CONTACT_SENSOR, 0x0015, "MA-contactsensor", 1, Sensor, [Identify, BooleanState]);
device_type!(LIGHT_SENSOR, 0x0106, "MA-lightsensor", 3, Sensor, [Identify, IlluminanceMeasurement]);
device_type!(OCCUPANCY_SENSOR, 0x0107, "MA-occupancysensor", 4, Sensor, [Identify, OccupancySensing]);
device_type!(TEMPERATURE_SENSOR, 0x0302, "MA-tempsensor", 2, Sensor, [Identify, TemperatureMeasurement]);
device_type!(PRESSURE_SENSOR, 0x0305, "MA-pressuresensor", 2, Sensor, [Identify, PressureMeasurement]);
device_type!(HUMIDITY_SENSOR, 0x0307, "MA-humiditysensor", 2, Sensor, [Identify, RelativeHumidityMeasurement]);
device_type!(AIR_QUALITY_SENSOR, 0x002C, "MA-airQualitySensor", 1, Sensor, [Identify, AirQuality]);
device_type!(WATER_LEAK_DETECTOR, 0x0043, "MA-waterLeakDetector", 1, Sensor, [Identify, BooleanState]);
device_type!(SMOKE_CO_ALARM, 0x0076, "MA-smokeCoAlarm", 1, Sensor, [Identify, SmokeCoAlarm]);
device_type!(ELECTRICAL_SENSOR, 0x0510, "MA-electricalSensor", 1, Sensor, [ElectricalPowerMeasurement, ElectricalEnergyMeasurement]);

/// Known "less capable ⊂ more capable" pairs within one category.
///
/// Transitive pairs are listed explicitly so a single scan prunes a chain
/// even when its middle member is absent.
pub static SUPERSEDES: &[(&DeviceTypeDescriptor, &DeviceTypeDescriptor)] = &[
    (&ON_OFF_SWITCH, &DIMMABLE_SWITCH),
    (&ON_OFF_SWITCH, &COLOR_TEMPERATURE_SWITCH),
    (&DIMMABLE_SWITCH, &COLOR_TEMPERATURE_SWITCH),
    (&ON_OFF_OUTLET, &DIMMABLE_OUTLET),
    (&ON_OFF_LIGHT, &DIMMABLE_LIGHT),
    (&ON_OFF_LIGHT, &COLOR_TEMPERATURE_LIGHT),
    (&ON_OFF_LIGHT, &EXTENDED_COLOR_LIGHT),
    (&DIMMABLE_LIGHT, &COLOR_TEMPERATURE_LIGHT),
    (&DIMMABLE_LIGHT, &EXTENDED_COLOR_LIGHT),
    (&COLOR_TEMPERATURE_LIGHT, &EXTENDED_COLOR_LIGHT),
];

/// Color-capable lighting types; the color resolver only runs for these.
pub fn is_color_capable(device_type: &DeviceTypeDescriptor) -> bool {
    device_type.code == COLOR_TEMPERATURE_LIGHT.code || device_type.code == EXTENDED_COLOR_LIGHT.code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersede_pairs_share_a_category() {
        for (less, more) in SUPERSEDES {
            assert_eq!(less.category, more.category, "{} vs {}", less.name, more.name);
            assert!(
                less.required_clusters
                    .iter()
                    .all(|c| more.required_clusters.contains(c)),
                "{} must be a subset of {}",
                less.name,
                more.name
            );
        }
    }

    #[test]
    fn color_capability() {
        assert!(is_color_capable(&EXTENDED_COLOR_LIGHT));
        assert!(is_color_capable(&COLOR_TEMPERATURE_LIGHT));
        assert!(!is_color_capable(&DIMMABLE_LIGHT));
    }
}
