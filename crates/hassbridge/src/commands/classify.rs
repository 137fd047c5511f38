//! `classify`: per-entity classification verdicts.

use serde::Serialize;
use tabled::Tabled;

use hassbridge_core::{BridgeConfig, Classification, EntityDescriptor, classify};

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::error::CliError;
use crate::output;
use crate::snapshot::{self, Snapshot};

#[derive(Debug, Serialize)]
pub struct Verdict {
    pub entity_id: String,
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    pub device_types: Vec<&'static str>,
    pub clusters: Vec<String>,
    pub commands: Vec<String>,
}

impl Verdict {
    fn skipped(entity: &EntityDescriptor, reason: impl Into<String>) -> Self {
        Self {
            entity_id: entity.entity_id.to_string(),
            supported: false,
            reason: Some(reason.into()),
            friendly_name: None,
            device_types: Vec::new(),
            clusters: Vec::new(),
            commands: Vec::new(),
        }
    }
}

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Device Types")]
    device_types: String,
    #[tabled(rename = "Clusters / Reason")]
    detail: String,
}

pub fn verdicts(snapshot: &Snapshot, config: &BridgeConfig) -> Vec<Verdict> {
    snapshot
        .all_entities()
        .map(|entity| {
            if !config.is_bridged(&entity.entity_id) {
                return Verdict::skipped(entity, "excluded by white/black list");
            }
            match classify(entity, &snapshot.state_of(entity), config) {
                Classification::Unsupported { reason, .. } => Verdict::skipped(entity, reason),
                Classification::Added(plan) => Verdict {
                    entity_id: plan.entity_id.to_string(),
                    supported: true,
                    reason: None,
                    friendly_name: plan.friendly_name.clone(),
                    device_types: plan.device_types.iter().map(|dt| dt.name).collect(),
                    clusters: plan
                        .effective_cluster_ids()
                        .into_iter()
                        .map(|id| id.to_string())
                        .collect(),
                    commands: plan.commands.iter().map(|b| b.command.clone()).collect(),
                },
            }
        })
        .collect()
}

pub fn handle(args: &SnapshotArgs, config: &BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = snapshot::load(&args.snapshot)?;
    let data = verdicts(&snapshot, config);
    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &data,
        |v| VerdictRow {
            entity: v.entity_id.clone(),
            status: output::status_cell(v.supported, color),
            device_types: v.device_types.join(", "),
            detail: v.reason.clone().unwrap_or_else(|| v.clusters.join(", ")),
        },
        |v| v.entity_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
