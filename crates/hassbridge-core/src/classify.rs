// ── Entity classification ──
//
// Turns one entity snapshot into a plan of device types, cluster
// requirements and handler bindings, then applies the plan to a builder.
// Nothing touches the builder until the plan is known to be non-empty.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::builder::{ClusterRequirement, ClusterSpec, CommandBinding, MutableDevice, SubscribeBinding};
use crate::config::BridgeConfig;
use crate::matter::defaults::cluster_defaults;
use crate::matter::device_type::is_color_capable;
use crate::matter::{ClusterId, DeviceTypeDescriptor, Feature};
use crate::model::{EntityDescriptor, EntityId, StateSnapshot};
use crate::resolve;
use crate::rules::{attribute_rules, base_rules, command_rules_for, subscribe_rules_for, value_rule};

/// Outcome of classifying one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Skipped; the builder was left untouched.
    Unsupported { entity_id: EntityId, reason: String },
    Added(EntityPlan),
}

impl Classification {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    pub fn plan(&self) -> Option<&EntityPlan> {
        match self {
            Self::Added(plan) => Some(plan),
            Self::Unsupported { .. } => None,
        }
    }
}

/// What one entity contributes to an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPlan {
    pub entity_id: EntityId,
    pub friendly_name: Option<String>,
    pub device_types: Vec<&'static DeviceTypeDescriptor>,
    pub clusters: Vec<ClusterRequirement>,
    pub commands: Vec<CommandBinding>,
    pub subscriptions: Vec<SubscribeBinding>,
}

impl EntityPlan {
    fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            friendly_name: None,
            device_types: Vec::new(),
            clusters: Vec::new(),
            commands: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    fn push(&mut self, device_type: Option<&'static DeviceTypeDescriptor>, cluster: Option<ClusterId>) {
        self.device_types.extend(device_type);
        self.clusters.extend(cluster.map(ClusterRequirement::Id));
    }

    fn is_empty(&self) -> bool {
        self.device_types.is_empty() && self.clusters.is_empty()
    }

    /// Requested clusters plus those mandated by the planned device types.
    pub fn effective_cluster_ids(&self) -> BTreeSet<ClusterId> {
        let mut ids: BTreeSet<ClusterId> = self.clusters.iter().map(ClusterRequirement::id).collect();
        for dt in &self.device_types {
            ids.extend(dt.required_clusters.iter().copied());
        }
        ids
    }

    /// Features the cluster will carry once attached: the first spec's, or
    /// the library defaults for a bare id.
    pub fn features_of(&self, id: ClusterId) -> BTreeSet<Feature> {
        self.clusters
            .iter()
            .find_map(|c| match c {
                ClusterRequirement::Spec(spec) if spec.id == id => Some(spec.features.clone()),
                _ => None,
            })
            .unwrap_or_else(|| cluster_defaults(id).0)
    }

    fn bind_handlers(&mut self) {
        let domain = self.entity_id.domain().to_owned();
        let clusters = self.effective_cluster_ids();

        for rule in command_rules_for(&domain).filter(|r| clusters.contains(&r.cluster)) {
            if rule
                .feature
                .is_some_and(|f| !self.features_of(rule.cluster).contains(&f))
            {
                continue;
            }
            self.commands.push(CommandBinding {
                command: rule.command.to_owned(),
                cluster: rule.cluster,
                entity_id: self.entity_id.clone(),
            });
        }
        for rule in subscribe_rules_for(&domain).filter(|r| clusters.contains(&r.cluster)) {
            if rule
                .feature
                .is_some_and(|f| !self.features_of(rule.cluster).contains(&f))
            {
                continue;
            }
            self.subscriptions.push(SubscribeBinding {
                cluster: rule.cluster,
                attribute: rule.attribute.to_owned(),
                entity_id: self.entity_id.clone(),
            });
        }
    }

    /// Append everything to `endpoint` of `device`.
    pub fn apply(self, device: &mut MutableDevice, endpoint: &str) {
        if let Some(name) = &self.friendly_name {
            device.set_friendly_name(endpoint, name);
        }
        device.add_tag(endpoint, self.entity_id.domain());
        for dt in self.device_types {
            device.add_device_type(endpoint, dt);
        }
        for cluster in self.clusters {
            device.add_cluster(endpoint, cluster);
        }
        for binding in self.commands {
            device.add_command_binding(endpoint, binding);
        }
        for binding in self.subscriptions {
            device.add_subscribe_binding(endpoint, binding);
        }
        device.add_entity(endpoint, self.entity_id);
    }
}

// ── Classification passes ───────────────────────────────────────────

fn unsupported(entity_id: &EntityId, reason: impl Into<String>) -> Classification {
    let reason = reason.into();
    debug!(entity = %entity_id, reason, "entity not classified");
    Classification::Unsupported {
        entity_id: entity_id.clone(),
        reason,
    }
}

/// Classify one entity against its current state.
pub fn classify(entity: &EntityDescriptor, state: &StateSnapshot, config: &BridgeConfig) -> Classification {
    let entity_id = &entity.entity_id;
    let domain = entity.domain();
    let mut plan = EntityPlan::new(entity_id.clone());

    // Base pass.
    let mut matched = false;
    for rule in base_rules(domain) {
        matched = true;
        plan.push(rule.device_type, rule.cluster);
    }
    if !matched {
        return unsupported(entity_id, format!("no rule for domain '{domain}'"));
    }
    plan.friendly_name = state
        .friendly_name()
        .or_else(|| entity.name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .map(str::to_owned);

    // Attribute-conditioned upgrades, in key order. A key counts even when
    // its value is null: an off light still reports `brightness: null`.
    let mut keys: Vec<&String> = state.attributes.keys().collect();
    keys.sort();
    for key in keys {
        for rule in attribute_rules(domain, key) {
            plan.push(rule.device_type, rule.cluster);
        }
    }

    // Device-class rules and composite resolvers.
    match domain {
        "sensor" | "binary_sensor" => {
            let device_class = state.attr_str("device_class");
            if let Some(rule) = value_rule(domain, device_class, state.attr_str("state_class")) {
                let raw = Value::String(state.state.clone());
                let seed = (rule.convert)(&raw, state.attr_str("unit_of_measurement")).unwrap_or(Value::Null);
                plan.device_types.push(rule.device_type);
                plan.clusters.push(
                    ClusterSpec::new(rule.cluster)
                        .with_features(rule.features)
                        .with_attribute(rule.attribute, seed)
                        .into(),
                );
            } else {
                debug!(entity = %entity_id, ?device_class, "no value rule for device class");
            }
        }
        "climate" => match resolve::climate(state, config) {
            Some(spec) => plan.clusters.push(spec.into()),
            None => debug!(entity = %entity_id, "climate entity keeps default thermostat"),
        },
        "fan" => plan.clusters.push(resolve::fan(state).into()),
        "vacuum" => plan.clusters.extend(resolve::vacuum(state).map(ClusterRequirement::from)),
        _ => {}
    }
    if plan.device_types.iter().any(|dt| is_color_capable(dt)) {
        plan.clusters.push(resolve::color_light(state).into());
    }

    if plan.is_empty() {
        return unsupported(entity_id, "no device type or cluster resolved");
    }
    plan.bind_handlers();
    Classification::Added(plan)
}

/// Classify and, when supported, append the entity to `endpoint`.
pub fn classify_into(
    device: &mut MutableDevice,
    endpoint: &str,
    entity: &EntityDescriptor,
    state: &StateSnapshot,
    config: &BridgeConfig,
) -> Classification {
    let classification = classify(entity, state, config);
    if let Classification::Added(plan) = &classification {
        plan.clone().apply(device, endpoint);
    }
    classification
}
