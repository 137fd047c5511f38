// ── Domain → device type / cluster ──

use super::DomainRule;
use crate::matter::ClusterId;
use crate::matter::DeviceTypeDescriptor;
use crate::matter::device_type::{
    COLOR_TEMPERATURE_LIGHT, DIMMABLE_LIGHT, DOOR_LOCK, EXTENDED_COLOR_LIGHT, FAN, ON_OFF_LIGHT,
    ON_OFF_OUTLET, ON_OFF_SWITCH, ROBOTIC_VACUUM_CLEANER, THERMOSTAT, WATER_VALVE,
    WINDOW_COVERING,
};

const fn base(
    domain: &'static str,
    device_type: Option<&'static DeviceTypeDescriptor>,
    cluster: Option<ClusterId>,
) -> DomainRule {
    DomainRule {
        domain,
        with_attribute: None,
        device_type,
        cluster,
    }
}

const fn upgrade(
    domain: &'static str,
    attribute: &'static str,
    device_type: Option<&'static DeviceTypeDescriptor>,
    cluster: Option<ClusterId>,
) -> DomainRule {
    DomainRule {
        domain,
        with_attribute: Some(attribute),
        device_type,
        cluster,
    }
}

/// Base mappings. A domain absent here is unsupported.
///
/// `sensor` and `binary_sensor` carry nothing themselves: their device type
/// comes from the value rules keyed on device class.
pub static DOMAIN_RULES: &[DomainRule] = &[
    base("switch", Some(&ON_OFF_OUTLET), Some(ClusterId::OnOff)),
    base("light", Some(&ON_OFF_LIGHT), Some(ClusterId::OnOff)),
    base("lock", Some(&DOOR_LOCK), Some(ClusterId::DoorLock)),
    base("fan", Some(&FAN), Some(ClusterId::FanControl)),
    base("cover", Some(&WINDOW_COVERING), Some(ClusterId::WindowCovering)),
    base("climate", Some(&THERMOSTAT), Some(ClusterId::Thermostat)),
    base("valve", Some(&WATER_VALVE), Some(ClusterId::ValveConfigurationAndControl)),
    base("vacuum", Some(&ROBOTIC_VACUUM_CLEANER), Some(ClusterId::RvcRunMode)),
    base("sensor", None, None),
    base("binary_sensor", None, None),
    base("input_boolean", Some(&ON_OFF_SWITCH), Some(ClusterId::OnOff)),
    base("button", Some(&ON_OFF_OUTLET), Some(ClusterId::OnOff)),
    base("input_button", Some(&ON_OFF_OUTLET), Some(ClusterId::OnOff)),
    base("scene", Some(&ON_OFF_OUTLET), Some(ClusterId::OnOff)),
    base("script", Some(&ON_OFF_OUTLET), Some(ClusterId::OnOff)),
    base("automation", Some(&ON_OFF_OUTLET), Some(ClusterId::OnOff)),
];

/// Upgrades triggered by the presence of an attribute key.
pub static DOMAIN_ATTRIBUTE_RULES: &[DomainRule] = &[
    upgrade("light", "brightness", Some(&DIMMABLE_LIGHT), Some(ClusterId::LevelControl)),
    upgrade("light", "color_temp", Some(&COLOR_TEMPERATURE_LIGHT), Some(ClusterId::ColorControl)),
    upgrade("light", "color_temp_kelvin", Some(&COLOR_TEMPERATURE_LIGHT), Some(ClusterId::ColorControl)),
    upgrade("light", "hs_color", Some(&EXTENDED_COLOR_LIGHT), Some(ClusterId::ColorControl)),
    upgrade("light", "xy_color", Some(&EXTENDED_COLOR_LIGHT), Some(ClusterId::ColorControl)),
    upgrade("light", "rgb_color", Some(&EXTENDED_COLOR_LIGHT), Some(ClusterId::ColorControl)),
    upgrade("fan", "percentage", None, Some(ClusterId::FanControl)),
];

pub fn base_rules(domain: &str) -> impl Iterator<Item = &'static DomainRule> + '_ {
    DOMAIN_RULES.iter().filter(move |r| r.domain == domain)
}

pub fn attribute_rules<'a>(
    domain: &'a str,
    attribute: &'a str,
) -> impl Iterator<Item = &'static DomainRule> + 'a {
    DOMAIN_ATTRIBUTE_RULES
        .iter()
        .filter(move |r| r.domain == domain && r.with_attribute == Some(attribute))
}
