#![allow(clippy::unwrap_used)]

// End-to-end scenarios over classification, composition and runtime routing.

use hassbridge_core::builder::ClusterRequirement;
use hassbridge_core::convert::air_quality;
use hassbridge_core::matter::cluster::{AirQuality, OperationalState, RunMode};
use hassbridge_core::{
    Attributes, Bridge, BridgeConfig, ClusterId, EntityDescriptor, Feature, HassEvent,
    MutableDevice, ROOT, StateSnapshot, classify, classify_into,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn descriptor(id: &str) -> EntityDescriptor {
    EntityDescriptor::new(id.parse().unwrap())
}

fn snapshot(value: &str, attrs: Value) -> StateSnapshot {
    let attributes: Attributes = match attrs {
        Value::Object(map) => map,
        _ => Attributes::new(),
    };
    StateSnapshot::new(value, attributes)
}

fn spec_attr(requirements: &[ClusterRequirement], id: ClusterId, key: &str) -> Option<Value> {
    requirements.iter().find_map(|c| match c {
        ClusterRequirement::Spec(spec) if spec.id == id => spec.attributes.get(key).cloned(),
        _ => None,
    })
}

// ── Scenario A: auto-mode thermostat ────────────────────────────────

#[test]
fn heat_cool_climate_builds_auto_thermostat() {
    let state = snapshot(
        "heat_cool",
        json!({
            "hvac_modes": ["heat_cool"],
            "current_temperature": 20,
            "target_temp_low": 10,
            "target_temp_high": 30,
        }),
    );
    let classification = classify(&descriptor("climate.x"), &state, &BridgeConfig::default());
    let plan = classification.plan().unwrap();
    assert_eq!(
        spec_attr(&plan.clusters, ClusterId::Thermostat, "occupiedHeatingSetpoint"),
        Some(json!(1000))
    );
    assert_eq!(
        spec_attr(&plan.clusters, ClusterId::Thermostat, "occupiedCoolingSetpoint"),
        Some(json!(3000))
    );

    let mut device = MutableDevice::from_config("x", "x", &BridgeConfig::default());
    classify_into(&mut device, ROOT, &descriptor("climate.x"), &state, &BridgeConfig::default());
    let built = device.create().unwrap();
    let thermostat = built.root().cluster(ClusterId::Thermostat).unwrap();
    assert!(thermostat.has_feature(Feature::AutoMode));
    assert_eq!(thermostat.get("localTemperature"), Some(json!(2000)));
}

// ── Scenario B: color-temperature-only light ────────────────────────

#[test]
fn color_temp_light_has_no_hue_or_xy() {
    let state = snapshot(
        "on",
        json!({
            "supported_color_modes": ["onoff", "brightness", "color_temp"],
            "color_temp": 200,
            "min_mireds": 153,
            "max_mireds": 400,
        }),
    );
    let mut device = MutableDevice::from_config("x", "x", &BridgeConfig::default());
    classify_into(&mut device, ROOT, &descriptor("light.x"), &state, &BridgeConfig::default());
    let built = device.create().unwrap();

    let color = built.root().cluster(ClusterId::ColorControl).unwrap();
    assert_eq!(color.features().iter().copied().collect::<Vec<_>>(), vec![Feature::ColorTemperature]);
    assert_eq!(color.get("colorTemperatureMireds"), Some(json!(200)));
    assert_eq!(color.get("colorTempPhysicalMinMireds"), Some(json!(153)));
    assert_eq!(color.get("colorTempPhysicalMaxMireds"), Some(json!(400)));
    assert_eq!(color.get("currentHue"), None);
    assert_eq!(color.get("currentX"), None);
}

// ── Scenario C: vacuum activity sequence ────────────────────────────

#[test]
fn vacuum_activity_sequence() {
    let (bridge, _rx) = Bridge::new(BridgeConfig::default());
    bridge.load_states([("vacuum.robo".parse().unwrap(), snapshot("docked", json!({})))]);
    let device = bridge.register_device("robo", &[descriptor("vacuum.robo")]).unwrap();

    let observe = || {
        let root = device.root();
        (
            root.attribute(ClusterId::RvcRunMode, "currentMode").unwrap(),
            root.attribute(ClusterId::RvcOperationalState, "operationalState").unwrap(),
        )
    };
    let expect = |mode: RunMode, op: OperationalState| (Value::from(mode), Value::from(op));

    let mut seen = vec![observe()];
    for activity in ["cleaning", "paused", "docked"] {
        bridge.handle_event(HassEvent::StateChanged {
            device_id: None,
            entity_id: "vacuum.robo".parse().unwrap(),
            old_state: None,
            new_state: snapshot(activity, json!({})),
        });
        seen.push(observe());
    }
    assert_eq!(
        seen,
        vec![
            expect(RunMode::Idle, OperationalState::Docked),
            expect(RunMode::Cleaning, OperationalState::Running),
            expect(RunMode::Idle, OperationalState::Paused),
            expect(RunMode::Idle, OperationalState::Docked),
        ]
    );

    // Unknown activities leave the previous values in place.
    let updates = bridge.handle_event(HassEvent::StateChanged {
        device_id: None,
        entity_id: "vacuum.robo".parse().unwrap(),
        old_state: None,
        new_state: snapshot("mopping", json!({})),
    });
    assert!(updates.is_empty());
    assert_eq!(observe(), expect(RunMode::Idle, OperationalState::Docked));
}

// ── Scenario D: brightness commands ─────────────────────────────────

#[test]
fn move_to_level_scales_brightness() {
    let config = BridgeConfig::default();
    let mut device = MutableDevice::from_config("lamp", "lamp", &config);
    classify_into(
        &mut device,
        ROOT,
        &descriptor("light.lamp"),
        &snapshot("on", json!({ "brightness": 10 })),
        &config,
    );
    let built = device.create().unwrap();

    let run = |level: u8| {
        built
            .command(&json!({ "level": level }), "levelControl", ROOT, "moveToLevel", None, &config)
            .unwrap()
    };
    assert_eq!(run(254).unwrap().data, Some(json!({ "brightness": 255 })));
    assert_eq!(run(1).unwrap().data, Some(json!({ "brightness": 1 })));
    assert_eq!(run(0), None);
}

// ── Scenario E: air-quality index ───────────────────────────────────

#[test]
fn air_quality_bands_and_suppression() {
    assert_eq!(air_quality(&json!(300)), Some(AirQuality::Poor));
    assert_eq!(air_quality(&json!("unhealthy")), Some(AirQuality::VeryPoor));
    assert_eq!(air_quality(&json!(501)), None);

    let (bridge, _rx) = Bridge::new(BridgeConfig::default());
    bridge.load_states([(
        "sensor.aqi".parse().unwrap(),
        snapshot("120", json!({ "device_class": "aqi" })),
    )]);
    let device = bridge.register_device("aqi", &[descriptor("sensor.aqi")]).unwrap();
    let read = || device.root().attribute(ClusterId::AirQuality, "airQuality");
    assert_eq!(read(), Some(Value::from(AirQuality::Moderate)));

    let updates = bridge.handle_event(HassEvent::StateChanged {
        device_id: None,
        entity_id: "sensor.aqi".parse().unwrap(),
        old_state: None,
        new_state: snapshot("501", json!({ "device_class": "aqi" })),
    });
    assert!(updates.is_empty());
    assert_eq!(read(), Some(Value::from(AirQuality::Moderate)));
}

// ── Scenario F: remap ───────────────────────────────────────────────

fn composed(extra_child: Option<(&str, StateSnapshot)>) -> MutableDevice {
    let config = BridgeConfig {
        remap: true,
        ..BridgeConfig::default()
    };
    let mut device = MutableDevice::from_config("combo", "combo", &config);
    classify_into(&mut device, ROOT, &descriptor("switch.main"), &snapshot("off", json!({})), &config);
    classify_into(
        &mut device,
        "sensor.t",
        &descriptor("sensor.t"),
        &snapshot("20", json!({ "device_class": "temperature", "state_class": "measurement" })),
        &config,
    );
    classify_into(
        &mut device,
        "sensor.h",
        &descriptor("sensor.h"),
        &snapshot("40", json!({ "device_class": "humidity", "state_class": "measurement" })),
        &config,
    );
    if let Some((id, state)) = extra_child {
        classify_into(&mut device, id, &descriptor(id), &state, &config);
    }
    device
}

#[test]
fn disjoint_children_merge_into_root() {
    let built = composed(None).create().unwrap();
    assert!(built.children().is_empty());
    let root = built.root();
    assert!(root.has_cluster(ClusterId::TemperatureMeasurement));
    assert!(root.has_cluster(ClusterId::RelativeHumidityMeasurement));
    assert!(root.has_cluster(ClusterId::OnOff));
    assert_eq!(built.endpoint_for(&"sensor.h".parse().unwrap()).unwrap().name(), ROOT);
}

#[test]
fn one_shared_cluster_blocks_every_merge() {
    let built = composed(Some(("light.l", snapshot("on", json!({}))))).create().unwrap();
    let names: Vec<&str> = built.children().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["sensor.t", "sensor.h", "light.l"]);
    assert!(!built.root().has_cluster(ClusterId::TemperatureMeasurement));
}
