// ── Mutable endpoint builder ──
//
// Accumulate device types, cluster requirements and handler bindings per
// endpoint name while entities are scanned, then dedup, optionally remap,
// and materialize the endpoint tree exactly once.

mod accumulator;
mod device;
mod materialized;

use std::collections::BTreeSet;

use serde_json::Value;

use crate::matter::{ClusterId, Feature};
use crate::model::{Attributes, EntityId};

pub use accumulator::{EndpointAccumulator, dedup_clusters, dedup_device_types};
pub use device::{BuildState, DeviceIdentity, MutableDevice, ROOT};
pub use materialized::{AttributeUpdate, MaterializedDevice};

// ── Cluster requirements ────────────────────────────────────────────

/// A cluster with explicit feature flags and seed attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    pub id: ClusterId,
    pub features: BTreeSet<Feature>,
    pub attributes: Attributes,
}

impl ClusterSpec {
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            features: BTreeSet::new(),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_features(mut self, features: &[Feature]) -> Self {
        self.features.extend(features.iter().copied());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_owned(), value.into());
        self
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// Either a bare id (library defaults) or a spec. A spec always wins over a
/// bare id for the same cluster once deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterRequirement {
    Id(ClusterId),
    Spec(ClusterSpec),
}

impl ClusterRequirement {
    pub fn id(&self) -> ClusterId {
        match self {
            Self::Id(id) => *id,
            Self::Spec(spec) => spec.id,
        }
    }

    pub fn is_spec(&self) -> bool {
        matches!(self, Self::Spec(_))
    }
}

impl From<ClusterId> for ClusterRequirement {
    fn from(id: ClusterId) -> Self {
        Self::Id(id)
    }
}

impl From<ClusterSpec> for ClusterRequirement {
    fn from(spec: ClusterSpec) -> Self {
        Self::Spec(spec)
    }
}

// ── Handler bindings ────────────────────────────────────────────────

/// Routes a protocol command on an endpoint to one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBinding {
    pub command: String,
    pub cluster: ClusterId,
    pub entity_id: EntityId,
}

/// Routes a protocol attribute write on an endpoint to one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeBinding {
    pub cluster: ClusterId,
    pub attribute: String,
    pub entity_id: EntityId,
}
