// ── Materialized device: runtime command, subscribe and update paths ──

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::device::{DeviceIdentity, ROOT};
use crate::config::BridgeConfig;
use crate::convert::vacuum_activity;
use crate::error::CoreError;
use crate::matter::{ClusterId, Endpoint, EndpointSummary};
use crate::model::{EntityId, ServiceCall, StateSnapshot};
use crate::rules::{
    CommandInput, SubscribeInput, UpdateInput, attribute_update_rules, command_rule,
    state_update_rules, subscribe_rule, value_rule,
};

/// One attribute write applied by [`MaterializedDevice::update_state`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeUpdate {
    pub endpoint: String,
    pub cluster: ClusterId,
    pub attribute: String,
    pub value: Value,
}

/// The finalized endpoint tree of one logical device.
#[derive(Debug)]
pub struct MaterializedDevice {
    identity: DeviceIdentity,
    root: Endpoint,
    children: IndexMap<String, Endpoint>,
    entities: IndexMap<EntityId, String>,
}

impl MaterializedDevice {
    pub(crate) fn new(
        identity: DeviceIdentity,
        root: Endpoint,
        children: IndexMap<String, Endpoint>,
        entities: IndexMap<EntityId, String>,
    ) -> Self {
        Self {
            identity,
            root,
            children,
            entities,
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn root(&self) -> &Endpoint {
        &self.root
    }

    pub fn children(&self) -> &IndexMap<String, Endpoint> {
        &self.children
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        if name == ROOT {
            Some(&self.root)
        } else {
            self.children.get(name)
        }
    }

    /// Root first, then children in creation order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        std::iter::once(&self.root).chain(self.children.values())
    }

    /// Entities bridged by this device, mapped to their endpoint name.
    pub fn entities(&self) -> &IndexMap<EntityId, String> {
        &self.entities
    }

    pub fn endpoint_for(&self, entity_id: &EntityId) -> Option<&Endpoint> {
        self.entities
            .get(entity_id)
            .and_then(|name| self.endpoint(name))
    }

    pub fn describe(&self) -> Vec<EndpointSummary> {
        self.endpoints().map(Endpoint::describe).collect()
    }

    fn endpoint_or_err(&self, name: &str) -> Result<&Endpoint, CoreError> {
        self.endpoint(name).ok_or_else(|| CoreError::EndpointNotFound {
            device: self.identity.name.clone(),
            endpoint: name.to_owned(),
        })
    }

    // ── Command entry point ─────────────────────────────────────────

    /// Translate a protocol command into a service call.
    ///
    /// `Ok(None)` means the command is not supported for this entity or its
    /// payload did not convert; the call is suppressed.
    pub fn command(
        &self,
        request: &Value,
        cluster_name: &str,
        endpoint_name: &str,
        command: &str,
        state: Option<&StateSnapshot>,
        config: &BridgeConfig,
    ) -> Result<Option<ServiceCall>, CoreError> {
        let endpoint = self.endpoint_or_err(endpoint_name)?;
        let cluster: ClusterId = cluster_name.parse().map_err(|_| CoreError::UnknownCluster {
            name: cluster_name.to_owned(),
        })?;
        let binding = endpoint
            .command(command)
            .filter(|b| b.cluster == cluster)
            .ok_or_else(|| CoreError::CommandNotBound {
                endpoint: endpoint_name.to_owned(),
                command: command.to_owned(),
            })?;

        let entity = &binding.entity_id;
        let Some(rule) = command_rule(entity.domain(), cluster, command) else {
            warn!(%entity, %cluster, command, "command not supported for domain");
            return Ok(None);
        };

        let attributes = endpoint
            .cluster(cluster)
            .map(|c| c.snapshot())
            .unwrap_or_default();
        let unit = config.resolve_unit(state.and_then(|s| s.attr_str("temperature_unit")));
        let input = CommandInput {
            request,
            attributes: &attributes,
            state,
            unit,
        };
        match rule.apply(&input) {
            Some(req) => {
                debug!(%entity, command, service = req.service, "command converted");
                Ok(Some(ServiceCall::new(entity.domain(), req.service, entity.clone(), req.data)))
            }
            None => {
                warn!(%entity, command, %request, "command payload not convertible");
                Ok(None)
            }
        }
    }

    // ── Subscribe entry point ───────────────────────────────────────

    /// Translate a protocol attribute change into a service call.
    ///
    /// Unchanged values and converter misses yield `Ok(None)`.
    #[allow(clippy::too_many_arguments)]
    pub fn subscribe(
        &self,
        new_value: &Value,
        old_value: &Value,
        endpoint_name: &str,
        cluster: ClusterId,
        attribute: &str,
        state: Option<&StateSnapshot>,
        config: &BridgeConfig,
    ) -> Result<Option<ServiceCall>, CoreError> {
        let endpoint = self.endpoint_or_err(endpoint_name)?;
        let Some(binding) = endpoint.subscription(cluster, attribute) else {
            warn!(endpoint = endpoint_name, %cluster, attribute, "no subscription bound");
            return Ok(None);
        };
        let entity = &binding.entity_id;

        if new_value == old_value {
            debug!(%entity, %cluster, attribute, "attribute not changed");
            return Ok(None);
        }
        info!(%entity, %cluster, attribute, old = %old_value, new = %new_value, "attribute changed");

        let Some(rule) = subscribe_rule(entity.domain(), cluster, attribute) else {
            warn!(%entity, %cluster, attribute, "subscription not supported for domain");
            return Ok(None);
        };
        let unit = config.resolve_unit(state.and_then(|s| s.attr_str("temperature_unit")));
        let input = SubscribeInput { state, unit };
        match rule.apply(new_value, &input) {
            Some(req) => Ok(Some(ServiceCall::new(entity.domain(), req.service, entity.clone(), req.data))),
            None => {
                debug!(%entity, attribute, value = %new_value, "attribute value suppressed");
                Ok(None)
            }
        }
    }

    // ── State updates ───────────────────────────────────────────────

    /// Push an entity's new state onto its endpoint. Only changed
    /// attributes are reported; unconvertible values leave prior ones intact.
    pub fn update_state(
        &self,
        entity_id: &EntityId,
        state: &StateSnapshot,
        config: &BridgeConfig,
    ) -> Vec<AttributeUpdate> {
        let Some(endpoint) = self.endpoint_for(entity_id) else {
            return Vec::new();
        };
        let domain = entity_id.domain();
        let mut updates = Vec::new();
        let mut set = |cluster: ClusterId, attribute: &str, value: Value| {
            let Some(server) = endpoint.cluster(cluster) else {
                return;
            };
            if server.set(attribute, value.clone()) {
                updates.push(AttributeUpdate {
                    endpoint: endpoint.name().to_owned(),
                    cluster,
                    attribute: attribute.to_owned(),
                    value,
                });
            }
        };

        match domain {
            "vacuum" => match vacuum_activity(&state.state) {
                Some((mode, op_state)) => {
                    set(ClusterId::RvcRunMode, "currentMode", mode.into());
                    set(ClusterId::RvcOperationalState, "operationalState", op_state.into());
                }
                None => warn!(entity = %entity_id, activity = %state.state, "unknown vacuum activity"),
            },
            "sensor" | "binary_sensor" => {
                let rule = value_rule(
                    domain,
                    state.attr_str("device_class"),
                    state.attr_str("state_class"),
                );
                if let Some(rule) = rule {
                    let raw = Value::String(state.state.clone());
                    if let Some(value) = (rule.convert)(&raw, state.attr_str("unit_of_measurement")) {
                        set(rule.cluster, rule.attribute, value);
                    }
                }
            }
            _ => {}
        }

        for rule in state_update_rules(domain, &state.state) {
            set(rule.cluster, rule.attribute, (rule.value)());
        }

        let input = UpdateInput {
            state,
            unit: config.resolve_unit(state.attr_str("temperature_unit")),
        };
        for rule in attribute_update_rules(domain) {
            let Some(raw) = state.attr(rule.with_attribute) else {
                continue;
            };
            let supported = endpoint
                .cluster(rule.cluster)
                .is_some_and(|c| rule.feature.is_none_or(|f| c.has_feature(f)));
            if !supported {
                continue;
            }
            if let Some(value) = (rule.convert)(raw, &input) {
                set(rule.cluster, rule.attribute, value);
            }
        }

        if !updates.is_empty() {
            debug!(entity = %entity_id, count = updates.len(), "attributes updated");
        }
        updates
    }
}
