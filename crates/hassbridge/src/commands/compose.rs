//! `compose`: build bridged devices from a snapshot and show their endpoints.

use serde::Serialize;
use tabled::Tabled;

use hassbridge_core::{BridgeConfig, DeviceIdentity, EndpointSummary, MaterializedDevice};

use crate::cli::{ComposeArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::snapshot::{self, Session};

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DeviceView {
    pub name: String,
    pub unique_id: String,
    pub identity: DeviceIdentity,
    pub endpoints: Vec<EndpointSummary>,
}

impl DeviceView {
    fn from_device(device: &MaterializedDevice) -> Self {
        Self {
            name: device.name().to_owned(),
            unique_id: device.identity().unique_id(),
            identity: device.identity().clone(),
            endpoints: device.describe(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Skipped {
    pub device: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ComposeReport {
    pub devices: Vec<DeviceView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Device Types")]
    device_types: String,
    #[tabled(rename = "Clusters")]
    clusters: String,
    #[tabled(rename = "Commands")]
    commands: usize,
}

fn endpoint_rows(view: &DeviceView) -> impl Iterator<Item = EndpointRow> + '_ {
    view.endpoints.iter().map(|ep| EndpointRow {
        device: view.name.clone(),
        endpoint: if ep.name.is_empty() {
            "(root)".into()
        } else {
            ep.name.clone()
        },
        device_types: ep
            .device_types
            .iter()
            .map(|dt| dt.name)
            .collect::<Vec<_>>()
            .join(", "),
        clusters: ep
            .clusters
            .iter()
            .map(|c| c.id.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        commands: ep.commands.len(),
    })
}

fn detail(report: &ComposeReport) -> String {
    let rows: Vec<EndpointRow> = report.devices.iter().flat_map(endpoint_rows).collect();
    let mut out = output::render_table(&rows);
    for skip in &report.skipped {
        out.push_str(&format!("\nskipped {}: {}", skip.device, skip.reason));
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn build_report(
    snapshot: &snapshot::Snapshot,
    config: BridgeConfig,
    only: Option<&str>,
) -> Result<ComposeReport, CliError> {
    let session = Session::open(snapshot, config)?;
    if let Some(name) = only {
        if session.bridge.device(name).is_none() {
            return Err(CliError::NotFound {
                resource_type: "device".into(),
                identifier: name.to_owned(),
                list_command: "compose <snapshot> -o plain".into(),
            });
        }
    }
    let devices = session
        .bridge
        .device_names()
        .into_iter()
        .filter(|name| only.is_none_or(|o| o == name))
        .filter_map(|name| session.bridge.device(&name))
        .map(|device| DeviceView::from_device(&device))
        .collect();
    let skipped = session
        .skipped
        .into_iter()
        .map(|(device, reason)| Skipped { device, reason })
        .collect();
    Ok(ComposeReport { devices, skipped })
}

pub fn handle(args: &ComposeArgs, config: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = snapshot::load(&args.source.snapshot)?;
    let report = build_report(&snapshot, config, args.device.as_deref())?;
    let out = output::render_single(global.output, &report, detail, |r| {
        r.devices
            .iter()
            .map(|d| d.name.clone())
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> snapshot::Snapshot {
        serde_json::from_value(json!({
            "entities": [
                { "entity_id": "switch.fan", "device_id": "desk" },
                { "entity_id": "light.lamp", "device_id": "desk" },
                { "entity_id": "weather.home" },
            ],
            "states": {
                "switch.fan": { "state": "off" },
                "light.lamp": { "state": "on", "attributes": { "brightness": 128 } },
            }
        }))
        .unwrap()
    }

    #[test]
    fn report_lists_devices_and_skips() {
        let report = build_report(&snapshot(), BridgeConfig::default(), None).unwrap();
        assert_eq!(report.devices.len(), 1);
        let desk = &report.devices[0];
        let names: Vec<&str> = desk.endpoints.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["", "switch.fan", "light.lamp"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].device, "weather.home");
    }

    #[test]
    fn unknown_device_filter_is_not_found() {
        let err = build_report(&snapshot(), BridgeConfig::default(), Some("garage")).unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn table_marks_root_endpoint() {
        let report = build_report(&snapshot(), BridgeConfig::default(), Some("desk")).unwrap();
        let table = detail(&report);
        assert!(table.contains("(root)"));
        assert!(table.contains("MA-dimmablelight"));
        assert!(table.contains("skipped weather.home"));
    }
}
