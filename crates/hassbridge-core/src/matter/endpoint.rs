// ── Materialized endpoints ──
//
// In-memory stand-ins for the protocol host's live endpoint objects.
// Attribute storage is concurrent so runtime updates and host callbacks
// on different endpoints never contend on one lock.

use std::collections::{BTreeMap, BTreeSet};

use dashmap::DashMap;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::cluster::{ClusterId, Feature};
use super::device_type::DeviceTypeDescriptor;
use crate::builder::{CommandBinding, SubscribeBinding};
use crate::model::Attributes;

// ── ClusterServer ───────────────────────────────────────────────────

/// A cluster attached to an endpoint, with its features and live attributes.
#[derive(Debug)]
pub struct ClusterServer {
    id: ClusterId,
    features: BTreeSet<Feature>,
    attributes: DashMap<String, Value>,
}

impl ClusterServer {
    pub(crate) fn new(id: ClusterId, features: BTreeSet<Feature>, attributes: Attributes) -> Self {
        Self {
            id,
            features,
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn features(&self) -> &BTreeSet<Feature> {
        &self.features
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn get(&self, attribute: &str) -> Option<Value> {
        self.attributes.get(attribute).map(|v| v.value().clone())
    }

    /// Write an attribute. Returns `true` when the stored value changed.
    pub fn set(&self, attribute: &str, value: Value) -> bool {
        match self.attributes.insert(attribute.to_owned(), value.clone()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    /// Point-in-time copy of all attributes, ordered by name.
    pub fn snapshot(&self) -> Attributes {
        let sorted: BTreeMap<String, Value> = self
            .attributes
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        sorted.into_iter().collect()
    }
}

// ── Endpoint ────────────────────────────────────────────────────────

/// A node in the materialized endpoint tree.
///
/// The root carries the empty name; children name their parent.
#[derive(Debug)]
pub struct Endpoint {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) friendly_name: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) device_types: Vec<&'static DeviceTypeDescriptor>,
    pub(crate) clusters: IndexMap<ClusterId, ClusterServer>,
    pub(crate) commands: IndexMap<String, CommandBinding>,
    pub(crate) subscriptions: IndexMap<(ClusterId, String), SubscribeBinding>,
}

impl Endpoint {
    pub(crate) fn new(
        name: impl Into<String>,
        parent: Option<String>,
        device_types: Vec<&'static DeviceTypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            friendly_name: None,
            tags: Vec::new(),
            device_types,
            clusters: IndexMap::new(),
            commands: IndexMap::new(),
            subscriptions: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn device_types(&self) -> &[&'static DeviceTypeDescriptor] {
        &self.device_types
    }

    pub fn has_device_type(&self, code: u16) -> bool {
        self.device_types.iter().any(|dt| dt.code == code)
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterServer> {
        self.clusters.get(&id)
    }

    pub fn has_cluster(&self, id: ClusterId) -> bool {
        self.clusters.contains_key(&id)
    }

    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.clusters.keys().copied()
    }

    /// Read one attribute of one cluster.
    pub fn attribute(&self, cluster: ClusterId, attribute: &str) -> Option<Value> {
        self.cluster(cluster).and_then(|c| c.get(attribute))
    }

    pub fn command(&self, command: &str) -> Option<&CommandBinding> {
        self.commands.get(command)
    }

    pub fn subscription(&self, cluster: ClusterId, attribute: &str) -> Option<&SubscribeBinding> {
        self.subscriptions.get(&(cluster, attribute.to_owned()))
    }

    pub(crate) fn attach(&mut self, cluster: ClusterServer) {
        self.clusters.entry(cluster.id()).or_insert(cluster);
    }

    /// Serializable description used by the CLI and snapshot tests.
    pub fn describe(&self) -> EndpointSummary {
        EndpointSummary {
            name: self.name.clone(),
            parent: self.parent.clone(),
            friendly_name: self.friendly_name.clone(),
            tags: self.tags.clone(),
            device_types: self
                .device_types
                .iter()
                .map(|dt| DeviceTypeSummary {
                    code: dt.code,
                    name: dt.name,
                })
                .collect(),
            clusters: self
                .clusters
                .values()
                .map(|c| ClusterSummary {
                    id: c.id(),
                    features: c.features().iter().copied().collect(),
                    attributes: c.snapshot(),
                })
                .collect(),
            commands: self.commands.keys().cloned().collect(),
            subscriptions: self
                .subscriptions
                .keys()
                .map(|(cluster, attribute)| format!("{cluster}.{attribute}"))
                .collect(),
        }
    }
}

// ── Summaries ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceTypeSummary {
    pub code: u16,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub id: ClusterId,
    pub features: Vec<Feature>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub device_types: Vec<DeviceTypeSummary>,
    pub clusters: Vec<ClusterSummary>,
    pub commands: Vec<String>,
    pub subscriptions: Vec<String>,
}
