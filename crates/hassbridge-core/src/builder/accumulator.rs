// ── Per-endpoint accumulator and deduplication ──

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;

use super::{ClusterRequirement, ClusterSpec, CommandBinding, SubscribeBinding};
use crate::matter::device_type::SUPERSEDES;
use crate::matter::{ClusterId, DeviceTypeDescriptor};
use crate::model::EntityId;

/// Everything collected for one endpoint name before materialization.
///
/// Only appends happen during accumulation; duplicates are allowed and
/// resolved by [`EndpointAccumulator::dedup`].
#[derive(Debug, Clone, Default)]
pub struct EndpointAccumulator {
    pub(crate) friendly_name: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) device_types: Vec<&'static DeviceTypeDescriptor>,
    pub(crate) clusters: Vec<ClusterRequirement>,
    pub(crate) command_bindings: Vec<CommandBinding>,
    pub(crate) subscribe_bindings: Vec<SubscribeBinding>,
    pub(crate) entities: Vec<EntityId>,
}

impl EndpointAccumulator {
    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly_name.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn device_types(&self) -> &[&'static DeviceTypeDescriptor] {
        &self.device_types
    }

    pub fn device_type_codes(&self) -> Vec<u16> {
        self.device_types.iter().map(|dt| dt.code).collect()
    }

    pub fn clusters(&self) -> &[ClusterRequirement] {
        &self.clusters
    }

    pub fn command_bindings(&self) -> &[CommandBinding] {
        &self.command_bindings
    }

    pub fn subscribe_bindings(&self) -> &[SubscribeBinding] {
        &self.subscribe_bindings
    }

    /// Entities classified into this endpoint, in scan order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Every cluster id requested, bare or spec.
    pub fn cluster_ids(&self) -> BTreeSet<ClusterId> {
        self.clusters.iter().map(ClusterRequirement::id).collect()
    }

    /// First spec requested for `id`.
    pub fn spec(&self, id: ClusterId) -> Option<&ClusterSpec> {
        self.clusters.iter().find_map(|c| match c {
            ClusterRequirement::Spec(spec) if spec.id == id => Some(spec),
            _ => None,
        })
    }

    /// Clusters the endpoint will carry once materialized: requested ones
    /// plus those mandated by its device types.
    pub fn effective_cluster_ids(&self) -> BTreeSet<ClusterId> {
        let mut ids = self.cluster_ids();
        for dt in &self.device_types {
            ids.extend(dt.required_clusters.iter().copied());
        }
        ids
    }

    /// Whether any device type or cluster id is shared with `other`.
    pub(crate) fn collides_with(&self, other: &Self) -> bool {
        let types_collide = self
            .device_types
            .iter()
            .any(|dt| other.device_types.iter().any(|o| o.code == dt.code));
        types_collide || !self.cluster_ids().is_disjoint(&other.cluster_ids())
    }

    /// Move everything from `other` into `self`.
    pub(crate) fn absorb(&mut self, other: Self) {
        if self.friendly_name.is_none() {
            self.friendly_name = other.friendly_name;
        }
        self.tags.extend(other.tags);
        self.device_types.extend(other.device_types);
        self.clusters.extend(other.clusters);
        self.command_bindings.extend(other.command_bindings);
        self.subscribe_bindings.extend(other.subscribe_bindings);
        self.entities.extend(other.entities);
    }

    /// Prune superseded device types and shadowed bare cluster ids.
    pub fn dedup(&mut self) {
        dedup_device_types(&mut self.device_types);
        dedup_clusters(&mut self.clusters);
    }
}

// ── Dedup ───────────────────────────────────────────────────────────

/// Key device types by code (last write wins), then drop the less capable
/// member of every known supersede pair present.
pub fn dedup_device_types(types: &mut Vec<&'static DeviceTypeDescriptor>) {
    let mut by_code: IndexMap<u16, &'static DeviceTypeDescriptor> = IndexMap::new();
    for dt in types.drain(..) {
        by_code.insert(dt.code, dt);
    }
    let present: HashSet<u16> = by_code.keys().copied().collect();
    by_code.retain(|code, _| {
        !SUPERSEDES
            .iter()
            .any(|(less, more)| less.code == *code && present.contains(&more.code))
    });
    types.extend(by_code.into_values());
}

/// Drop bare ids that a spec covers, and repeated bare ids. Specs are kept.
pub fn dedup_clusters(clusters: &mut Vec<ClusterRequirement>) {
    let spec_ids: HashSet<ClusterId> = clusters
        .iter()
        .filter(|c| c.is_spec())
        .map(ClusterRequirement::id)
        .collect();
    let mut seen_bare = HashSet::new();
    clusters.retain(|c| match c {
        ClusterRequirement::Id(id) => !spec_ids.contains(id) && seen_bare.insert(*id),
        ClusterRequirement::Spec(_) => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matter::device_type::{
        COLOR_TEMPERATURE_LIGHT, DIMMABLE_LIGHT, DIMMABLE_OUTLET, EXTENDED_COLOR_LIGHT,
        ON_OFF_LIGHT, ON_OFF_OUTLET, ON_OFF_SWITCH, TEMPERATURE_SENSOR,
    };
    use pretty_assertions::assert_eq;

    fn codes(types: &[&'static DeviceTypeDescriptor]) -> Vec<u16> {
        types.iter().map(|dt| dt.code).collect()
    }

    #[test]
    fn light_chain_prunes_to_most_capable() {
        let mut types = vec![&ON_OFF_LIGHT, &DIMMABLE_LIGHT, &COLOR_TEMPERATURE_LIGHT, &ON_OFF_LIGHT];
        dedup_device_types(&mut types);
        assert_eq!(codes(&types), vec![COLOR_TEMPERATURE_LIGHT.code]);
    }

    #[test]
    fn pruning_skips_missing_middle() {
        let mut types = vec![&ON_OFF_LIGHT, &EXTENDED_COLOR_LIGHT, &TEMPERATURE_SENSOR];
        dedup_device_types(&mut types);
        assert_eq!(codes(&types), vec![EXTENDED_COLOR_LIGHT.code, TEMPERATURE_SENSOR.code]);
    }

    #[test]
    fn categories_do_not_prune_each_other() {
        let mut types = vec![&ON_OFF_SWITCH, &DIMMABLE_OUTLET, &ON_OFF_OUTLET];
        dedup_device_types(&mut types);
        assert_eq!(codes(&types), vec![ON_OFF_SWITCH.code, DIMMABLE_OUTLET.code]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let samples: Vec<Vec<&'static DeviceTypeDescriptor>> = vec![
            vec![],
            vec![&ON_OFF_LIGHT],
            vec![&DIMMABLE_LIGHT, &ON_OFF_LIGHT, &ON_OFF_OUTLET, &DIMMABLE_OUTLET],
            vec![&EXTENDED_COLOR_LIGHT, &COLOR_TEMPERATURE_LIGHT, &ON_OFF_SWITCH, &ON_OFF_SWITCH],
        ];
        for sample in samples {
            let mut once = sample.clone();
            dedup_device_types(&mut once);
            let mut twice = once.clone();
            dedup_device_types(&mut twice);
            assert_eq!(codes(&once), codes(&twice));
        }
    }

    #[test]
    fn spec_shadows_bare_id() {
        let mut clusters = vec![
            ClusterRequirement::Id(ClusterId::OnOff),
            ClusterRequirement::Id(ClusterId::Thermostat),
            ClusterRequirement::Spec(ClusterSpec::new(ClusterId::Thermostat)),
            ClusterRequirement::Id(ClusterId::OnOff),
        ];
        dedup_clusters(&mut clusters);
        assert_eq!(
            clusters,
            vec![
                ClusterRequirement::Id(ClusterId::OnOff),
                ClusterRequirement::Spec(ClusterSpec::new(ClusterId::Thermostat)),
            ]
        );
    }

    #[test]
    fn collisions_cover_types_and_clusters() {
        let mut a = EndpointAccumulator::default();
        a.device_types.push(&TEMPERATURE_SENSOR);
        let mut b = EndpointAccumulator::default();
        b.clusters.push(ClusterRequirement::Id(ClusterId::OnOff));
        assert!(!a.collides_with(&b));

        b.clusters.push(ClusterSpec::new(ClusterId::TemperatureMeasurement).into());
        a.clusters.push(ClusterRequirement::Id(ClusterId::TemperatureMeasurement));
        assert!(a.collides_with(&b));
    }
}
