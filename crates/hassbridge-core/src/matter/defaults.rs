// ── Library defaults for bare cluster requirements ──

use std::collections::BTreeSet;

use serde_json::{Value, json};

use super::cluster::{
    AirQuality, ClusterId, ControlSequenceOfOperation, FanMode, FanModeSequence, Feature,
    LockState, MovementStatus, OperationalState, RunMode, SystemMode, ValveState,
    covering_status,
};
use crate::model::Attributes;

fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

fn features(list: &[Feature]) -> BTreeSet<Feature> {
    list.iter().copied().collect()
}

/// `supportedModes` of the vacuum run-mode cluster.
pub fn run_mode_list() -> Value {
    json!([
        { "label": "Idle", "mode": RunMode::Idle.value(), "modeTags": [{ "value": 0x4000 }] },
        { "label": "Cleaning", "mode": RunMode::Cleaning.value(), "modeTags": [{ "value": 0x4001 }] },
    ])
}

/// `operationalStateList` of the vacuum operational-state cluster.
pub fn operational_state_list() -> Value {
    let states = [
        OperationalState::Stopped,
        OperationalState::Running,
        OperationalState::Paused,
        OperationalState::Error,
        OperationalState::SeekingCharger,
        OperationalState::Charging,
        OperationalState::Docked,
    ];
    Value::Array(
        states
            .iter()
            .map(|s| json!({ "operationalStateId": s.value() }))
            .collect(),
    )
}

/// Features and attributes a cluster gets when attached without a spec.
pub fn cluster_defaults(id: ClusterId) -> (BTreeSet<Feature>, Attributes) {
    use ClusterId as C;

    let measurement = || json!({ "measuredValue": null, "minMeasuredValue": null, "maxMeasuredValue": null });
    let concentration = || {
        json!({
            "measuredValue": null,
            "minMeasuredValue": null,
            "maxMeasuredValue": null,
            "measurementUnit": 0,
            "measurementMedium": 0,
        })
    };

    match id {
        C::Identify => (features(&[]), attrs(json!({ "identifyTime": 0, "identifyType": 0 }))),
        C::Groups => (features(&[]), attrs(json!({ "nameSupport": { "groupNames": false } }))),
        C::Descriptor => (features(&[]), Attributes::new()),
        C::OnOff => (features(&[]), attrs(json!({ "onOff": false }))),
        C::LevelControl => (
            features(&[]),
            attrs(json!({ "currentLevel": 254, "minLevel": 1, "maxLevel": 254, "onLevel": null })),
        ),
        C::ColorControl => (
            features(&[Feature::ColorTemperature]),
            attrs(json!({
                "colorMode": 2,
                "colorTemperatureMireds": 250,
                "colorTempPhysicalMinMireds": 147,
                "colorTempPhysicalMaxMireds": 500,
            })),
        ),
        C::DoorLock => (
            features(&[]),
            attrs(json!({
                "lockState": LockState::Locked.value(),
                "lockType": 2,
                "actuatorEnabled": true,
                "operatingMode": 0,
            })),
        ),
        C::WindowCovering => (
            features(&[Feature::Lift, Feature::PositionAwareLift]),
            attrs(json!({
                "type": 0,
                "endProductType": 0,
                "currentPositionLiftPercent100ths": 0,
                "targetPositionLiftPercent100ths": 0,
                "operationalStatus": covering_status(MovementStatus::Stopped),
            })),
        ),
        C::Thermostat => (
            features(&[Feature::Heating]),
            attrs(json!({
                "localTemperature": null,
                "occupiedHeatingSetpoint": 2300,
                "minHeatSetpointLimit": 0,
                "maxHeatSetpointLimit": 5000,
                "controlSequenceOfOperation": ControlSequenceOfOperation::HeatingOnly.value(),
                "systemMode": SystemMode::Heat.value(),
            })),
        ),
        C::FanControl => (
            features(&[Feature::MultiSpeed, Feature::Auto]),
            attrs(json!({
                "fanMode": FanMode::Off.value(),
                "fanModeSequence": FanModeSequence::OffLowMedHighAuto.value(),
                "percentSetting": 0,
                "percentCurrent": 0,
                "speedMax": 100,
                "speedSetting": 0,
                "speedCurrent": 0,
            })),
        ),
        C::ValveConfigurationAndControl => (
            features(&[Feature::Level]),
            attrs(json!({
                "currentState": ValveState::Closed.value(),
                "targetState": ValveState::Closed.value(),
                "currentLevel": 0,
                "targetLevel": 0,
                "openDuration": null,
                "defaultOpenDuration": null,
            })),
        ),
        C::RvcRunMode => (
            features(&[]),
            attrs(json!({ "supportedModes": run_mode_list(), "currentMode": RunMode::Idle.value() })),
        ),
        C::RvcOperationalState => (
            features(&[]),
            attrs(json!({
                "phaseList": null,
                "currentPhase": null,
                "operationalStateList": operational_state_list(),
                "operationalState": OperationalState::Docked.value(),
                "operationalError": { "errorStateId": 0 },
            })),
        ),
        C::BooleanState => (features(&[]), attrs(json!({ "stateValue": false }))),
        C::OccupancySensing => (
            features(&[]),
            attrs(json!({
                "occupancy": { "occupied": false },
                "occupancySensorType": 0,
                "occupancySensorTypeBitmap": { "pir": true, "ultrasonic": false, "physicalContact": false },
            })),
        ),
        C::TemperatureMeasurement => (
            features(&[]),
            attrs(json!({ "measuredValue": null, "minMeasuredValue": -10_000, "maxMeasuredValue": 10_000 })),
        ),
        C::RelativeHumidityMeasurement => (
            features(&[]),
            attrs(json!({ "measuredValue": null, "minMeasuredValue": 0, "maxMeasuredValue": 10_000 })),
        ),
        C::IlluminanceMeasurement => (
            features(&[]),
            attrs(json!({ "measuredValue": null, "minMeasuredValue": 1, "maxMeasuredValue": 65_534 })),
        ),
        C::PressureMeasurement => (features(&[]), attrs(measurement())),
        C::CarbonMonoxideConcentrationMeasurement
        | C::CarbonDioxideConcentrationMeasurement
        | C::Pm25ConcentrationMeasurement
        | C::Pm10ConcentrationMeasurement
        | C::TotalVolatileOrganicCompoundsConcentrationMeasurement => (features(&[]), attrs(concentration())),
        C::AirQuality => (features(&[]), attrs(json!({ "airQuality": AirQuality::Unknown.value() }))),
        C::SmokeCoAlarm => (
            features(&[Feature::SmokeAlarm]),
            attrs(json!({ "smokeState": 0, "coState": 0, "expressedState": 0, "batteryAlert": 0 })),
        ),
        C::PowerSource => (
            features(&[Feature::Battery]),
            attrs(json!({
                "status": 1,
                "order": 0,
                "description": "Battery",
                "batPercentRemaining": null,
                "batChargeLevel": 0,
            })),
        ),
        C::ElectricalPowerMeasurement => (
            features(&[Feature::AlternatingCurrent]),
            attrs(json!({
                "powerMode": 2,
                "numberOfMeasurementTypes": 3,
                "voltage": null,
                "activeCurrent": null,
                "activePower": null,
            })),
        ),
        C::ElectricalEnergyMeasurement => (
            features(&[Feature::ImportedEnergy, Feature::CumulativeEnergy]),
            attrs(json!({ "cumulativeEnergyImported": null })),
        ),
        C::BridgedDeviceBasicInformation => (features(&[]), attrs(json!({ "reachable": true }))),
    }
}
