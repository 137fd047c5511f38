// ── MutableDevice: accumulate → dedup → remap → materialize ──

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::materialized::MaterializedDevice;
use super::{ClusterRequirement, ClusterSpec, CommandBinding, EndpointAccumulator, SubscribeBinding};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::matter::defaults::cluster_defaults;
use crate::matter::device_type::BRIDGED_NODE;
use crate::matter::{ClusterId, ClusterServer, DeviceTypeDescriptor, Endpoint};
use crate::model::{Attributes, EntityId};

/// Name of the main (root) endpoint.
pub const ROOT: &str = "";

/// Longest string the basic-information cluster accepts.
const MAX_LABEL_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Accumulating,
    MainCreated,
    Finalized,
}

// ── DeviceIdentity ──────────────────────────────────────────────────

/// Identity fields published on the root endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub name: String,
    pub serial_number: String,
    pub vendor_id: u16,
    pub vendor_name: String,
    pub product_name: String,
    pub software_version: u32,
    pub software_version_string: String,
    pub hardware_version: u16,
    pub hardware_version_string: String,
}

impl DeviceIdentity {
    pub fn from_config(name: &str, serial_number: &str, config: &BridgeConfig) -> Self {
        Self {
            name: name.to_owned(),
            serial_number: serial_number.to_owned(),
            vendor_id: config.vendor_id,
            vendor_name: config.vendor_name.clone(),
            product_name: config.product_name.clone(),
            software_version: config.software_version,
            software_version_string: config.software_version_string.clone(),
            hardware_version: config.hardware_version,
            hardware_version_string: config.hardware_version_string.clone(),
        }
    }

    /// Stable content hash of the identity, 32 hex chars.
    pub fn unique_id(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.name, &self.serial_number, &self.vendor_name, &self.product_name] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let mut id = hex::encode(hasher.finalize());
        id.truncate(32);
        id
    }
}

fn label(value: &str) -> String {
    value.chars().take(MAX_LABEL_LEN).collect()
}

// ── MutableDevice ───────────────────────────────────────────────────

/// Per-device build arena keyed by endpoint name.
///
/// Accumulation takes `&mut self`, so one device is always classified by a
/// single writer. [`MutableDevice::create`] may succeed only once.
#[derive(Debug)]
pub struct MutableDevice {
    identity: DeviceIdentity,
    remap: bool,
    composed_type: Option<String>,
    configuration_url: Option<String>,
    state: BuildState,
    accumulators: IndexMap<String, EndpointAccumulator>,
    main: Option<Endpoint>,
    children: IndexMap<String, Endpoint>,
}

impl MutableDevice {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            remap: false,
            composed_type: None,
            configuration_url: None,
            state: BuildState::Accumulating,
            accumulators: IndexMap::new(),
            main: None,
            children: IndexMap::new(),
        }
    }

    pub fn from_config(name: &str, serial_number: &str, config: &BridgeConfig) -> Self {
        let mut device = Self::new(DeviceIdentity::from_config(name, serial_number, config));
        device.remap = config.remap;
        device
    }

    #[must_use]
    pub fn with_remap(mut self, remap: bool) -> Self {
        self.remap = remap;
        self
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn set_composed_type(&mut self, composed_type: impl Into<String>) {
        self.composed_type = Some(composed_type.into());
    }

    pub fn set_configuration_url(&mut self, url: impl Into<String>) {
        self.configuration_url = Some(url.into());
    }

    // ── Accumulation ────────────────────────────────────────────────

    fn accumulator_mut(&mut self, endpoint: &str) -> &mut EndpointAccumulator {
        self.accumulators.entry(endpoint.to_owned()).or_default()
    }

    pub fn add_device_type(&mut self, endpoint: &str, device_type: &'static DeviceTypeDescriptor) {
        self.accumulator_mut(endpoint).device_types.push(device_type);
    }

    pub fn add_cluster(&mut self, endpoint: &str, cluster: impl Into<ClusterRequirement>) {
        self.accumulator_mut(endpoint).clusters.push(cluster.into());
    }

    pub fn add_command_binding(&mut self, endpoint: &str, binding: CommandBinding) {
        self.accumulator_mut(endpoint).command_bindings.push(binding);
    }

    pub fn add_subscribe_binding(&mut self, endpoint: &str, binding: SubscribeBinding) {
        self.accumulator_mut(endpoint).subscribe_bindings.push(binding);
    }

    /// Sets the friendly name unless one was already recorded.
    pub fn set_friendly_name(&mut self, endpoint: &str, name: &str) {
        let acc = self.accumulator_mut(endpoint);
        if acc.friendly_name.is_none() {
            acc.friendly_name = Some(name.to_owned());
        }
    }

    pub fn add_tag(&mut self, endpoint: &str, tag: impl Into<String>) {
        self.accumulator_mut(endpoint).tags.push(tag.into());
    }

    pub(crate) fn add_entity(&mut self, endpoint: &str, entity_id: EntityId) {
        self.accumulator_mut(endpoint).entities.push(entity_id);
    }

    pub fn get(&self, endpoint: &str) -> Option<&EndpointAccumulator> {
        self.accumulators.get(endpoint)
    }

    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.accumulators.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    // ── Dedup / remap ───────────────────────────────────────────────

    pub fn dedup(&mut self) {
        for acc in self.accumulators.values_mut() {
            acc.dedup();
        }
    }

    /// Merge every child endpoint into the root when no child shares a
    /// device type or cluster id with any other endpoint.
    ///
    /// One collision scan per call: if any child collides, nothing merges.
    /// Returns whether a merge happened.
    pub fn remap(&mut self) -> bool {
        self.dedup();
        let children: Vec<String> = self
            .accumulators
            .keys()
            .filter(|name| name.as_str() != ROOT)
            .cloned()
            .collect();
        if children.is_empty() {
            return false;
        }

        let colliding: Vec<&str> = children
            .iter()
            .filter(|name| {
                let acc = &self.accumulators[name.as_str()];
                self.accumulators
                    .iter()
                    .any(|(other, other_acc)| other != *name && acc.collides_with(other_acc))
            })
            .map(String::as_str)
            .collect();
        if !colliding.is_empty() {
            debug!(device = %self.identity.name, ?colliding, "remap skipped: endpoints collide");
            return false;
        }

        for name in children {
            if let Some(child) = self.accumulators.shift_remove(&name) {
                self.accumulator_mut(ROOT).absorb(child);
            }
        }
        // Keep the root first so materialization order stays stable.
        if let Some(index) = self.accumulators.get_index_of(ROOT) {
            self.accumulators.move_index(index, 0);
        }
        self.dedup();
        debug!(device = %self.identity.name, "remapped child endpoints into root");
        true
    }

    // ── Materialization ─────────────────────────────────────────────

    fn already_created(&self) -> CoreError {
        CoreError::AlreadyCreated {
            device: self.identity.name.clone(),
        }
    }

    fn new_endpoint(name: &str, parent: Option<String>, acc: &EndpointAccumulator) -> Endpoint {
        let mut endpoint = Endpoint::new(name, parent, acc.device_types.clone());
        endpoint.friendly_name.clone_from(&acc.friendly_name);
        endpoint.tags.clone_from(&acc.tags);
        endpoint
    }

    /// Build the root endpoint object. It always carries the bridged-node
    /// device type in addition to whatever was accumulated for it.
    pub fn create_main_endpoint(&mut self) -> Result<&Endpoint, CoreError> {
        if self.state != BuildState::Accumulating {
            return Err(self.already_created());
        }
        let acc = self.accumulator_mut(ROOT);
        acc.dedup();
        let mut endpoint = Self::new_endpoint(ROOT, None, acc);
        if !endpoint.has_device_type(BRIDGED_NODE.code) {
            endpoint.device_types.insert(0, &BRIDGED_NODE);
        }
        if let Some(root) = self.accumulators.get_index_of(ROOT) {
            self.accumulators.move_index(root, 0);
        }
        self.state = BuildState::MainCreated;
        Ok(self.main.insert(endpoint))
    }

    /// Build one child per non-root accumulator, parented to the root.
    pub fn create_child_endpoints(&mut self) -> Result<(), CoreError> {
        if self.main.is_none() {
            return Err(CoreError::MainEndpointMissing {
                device: self.identity.name.clone(),
            });
        }
        for (name, acc) in &mut self.accumulators {
            if name == ROOT || self.children.contains_key(name) {
                continue;
            }
            acc.dedup();
            let endpoint = Self::new_endpoint(name, Some(ROOT.to_owned()), acc);
            self.children.insert(name.clone(), endpoint);
        }
        Ok(())
    }

    /// Attach clusters to an already-built endpoint: specs first, then bare
    /// ids, then (root only) basic information, then whatever the device
    /// types mandate. The first attachment of an id wins.
    pub fn create_clusters(&mut self, endpoint: &str) -> Result<(), CoreError> {
        let basic_information = (endpoint == ROOT).then(|| self.basic_information());
        let target = if endpoint == ROOT {
            self.main.as_mut()
        } else {
            self.children.get_mut(endpoint)
        };
        let Some(target) = target else {
            return Err(CoreError::EndpointNotCreated {
                device: self.identity.name.clone(),
                endpoint: endpoint.to_owned(),
            });
        };

        let empty = EndpointAccumulator::default();
        let acc = self.accumulators.get(endpoint).unwrap_or(&empty);

        for requirement in &acc.clusters {
            if let ClusterRequirement::Spec(spec) = requirement {
                target.attach(ClusterServer::new(spec.id, spec.features.clone(), spec.attributes.clone()));
            }
        }
        for requirement in &acc.clusters {
            if let ClusterRequirement::Id(id) = requirement {
                target.attach(default_server(*id));
            }
        }
        if let Some(spec) = basic_information {
            target.attach(ClusterServer::new(spec.id, spec.features, spec.attributes));
        }
        let mandated: Vec<ClusterId> = target
            .device_types
            .iter()
            .flat_map(|dt| dt.required_clusters.iter().copied())
            .collect();
        for id in mandated {
            if !target.has_cluster(id) {
                target.attach(default_server(id));
            }
        }
        Ok(())
    }

    fn basic_information(&self) -> ClusterSpec {
        let id = &self.identity;
        let mut spec = ClusterSpec::new(ClusterId::BridgedDeviceBasicInformation)
            .with_attribute("vendorId", id.vendor_id)
            .with_attribute("vendorName", label(&id.vendor_name))
            .with_attribute("productName", label(&id.product_name))
            .with_attribute("nodeLabel", label(&id.name))
            .with_attribute("serialNumber", label(&id.serial_number))
            .with_attribute("uniqueId", id.unique_id())
            .with_attribute("softwareVersion", id.software_version)
            .with_attribute("softwareVersionString", label(&id.software_version_string))
            .with_attribute("hardwareVersion", id.hardware_version)
            .with_attribute("hardwareVersionString", label(&id.hardware_version_string))
            .with_attribute("reachable", true);
        if let Some(composed) = &self.composed_type {
            spec = spec.with_attribute("productLabel", label(composed));
        }
        if let Some(url) = &self.configuration_url {
            spec = spec.with_attribute("productUrl", Value::String(url.clone()));
        }
        spec
    }

    /// Wire handler bindings onto their endpoints and hand the tree over.
    pub fn finalize(&mut self) -> Result<MaterializedDevice, CoreError> {
        if self.state == BuildState::Finalized {
            return Err(self.already_created());
        }
        let Some(mut root) = self.main.take() else {
            return Err(CoreError::MainEndpointMissing {
                device: self.identity.name.clone(),
            });
        };
        let mut children = std::mem::take(&mut self.children);
        let mut entities = IndexMap::new();

        for (name, acc) in &self.accumulators {
            let endpoint = if name == ROOT {
                &mut root
            } else if let Some(child) = children.get_mut(name) {
                child
            } else {
                continue;
            };
            for binding in &acc.command_bindings {
                endpoint
                    .commands
                    .entry(binding.command.clone())
                    .or_insert_with(|| binding.clone());
            }
            for binding in &acc.subscribe_bindings {
                endpoint
                    .subscriptions
                    .entry((binding.cluster, binding.attribute.clone()))
                    .or_insert_with(|| binding.clone());
            }
            for entity in &acc.entities {
                entities.entry(entity.clone()).or_insert_with(|| name.clone());
            }
        }

        self.state = BuildState::Finalized;
        Ok(MaterializedDevice::new(self.identity.clone(), root, children, entities))
    }

    /// Dedup, optionally remap, then materialize the whole tree.
    pub fn create(&mut self) -> Result<MaterializedDevice, CoreError> {
        if self.state != BuildState::Accumulating {
            return Err(self.already_created());
        }
        self.dedup();
        if self.remap {
            self.remap();
        }
        self.create_main_endpoint()?;
        self.create_child_endpoints()?;
        let names: Vec<String> = self.accumulators.keys().cloned().collect();
        self.create_clusters(ROOT)?;
        for name in names.iter().filter(|n| n.as_str() != ROOT) {
            self.create_clusters(name)?;
        }
        self.finalize()
    }
}

fn default_server(id: ClusterId) -> ClusterServer {
    let (features, attributes): (_, Attributes) = cluster_defaults(id);
    ClusterServer::new(id, features, attributes)
}
