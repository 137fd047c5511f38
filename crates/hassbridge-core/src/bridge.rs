// ── Bridge runtime facade ──
//
// Owns registered devices and the latest entity states. Routes protocol
// commands and attribute writes to service calls, and pushes automation
// state changes onto materialized endpoints.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use indexmap::IndexSet;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::{AttributeUpdate, MaterializedDevice, MutableDevice, ROOT};
use crate::classify::{Classification, classify_into};
use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::matter::ClusterId;
use crate::model::{EntityDescriptor, EntityId, HassEvent, ServiceCall, StateSnapshot};

const SERVICE_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ─────────────────────────────────────────────────

/// Transport connection state as last reported by events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// ── Bridge ──────────────────────────────────────────────────────────

/// Cheaply cloneable via `Arc<BridgeInner>`.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    devices: DashMap<String, Arc<MaterializedDevice>>,
    entity_index: DashMap<EntityId, String>,
    states: DashMap<EntityId, StateSnapshot>,
    service_tx: mpsc::Sender<ServiceCall>,
    connection_state: watch::Sender<ConnectionState>,
}

impl Bridge {
    /// Create a bridge and the receiving end of its service-call channel.
    /// The transport drains the receiver and invokes the services.
    pub fn new(config: BridgeConfig) -> (Self, mpsc::Receiver<ServiceCall>) {
        let (service_tx, service_rx) = mpsc::channel(SERVICE_CHANNEL_SIZE);
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let bridge = Self {
            inner: Arc::new(BridgeInner {
                config,
                devices: DashMap::new(),
                entity_index: DashMap::new(),
                states: DashMap::new(),
                service_tx,
                connection_state,
            }),
        };
        (bridge, service_rx)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Replace known states with a full snapshot from the transport.
    pub fn load_states(&self, states: impl IntoIterator<Item = (EntityId, StateSnapshot)>) {
        self.inner.states.clear();
        for (id, state) in states {
            self.inner.states.insert(id, state);
        }
        debug!(states = self.inner.states.len(), "state snapshot loaded");
    }

    pub fn state(&self, entity_id: &EntityId) -> Option<StateSnapshot> {
        self.inner.states.get(entity_id).map(|s| s.value().clone())
    }

    fn state_or_registry(&self, entity: &EntityDescriptor) -> StateSnapshot {
        self.state(&entity.entity_id)
            .unwrap_or_else(|| StateSnapshot::new("unknown", entity.attributes.clone()))
    }

    // ── Registration ────────────────────────────────────────────────

    /// Classify a logical device's entities and materialize its endpoints.
    ///
    /// A single bridged entity lands on the root endpoint; otherwise each
    /// entity gets a child endpoint named after its id. Entities filtered
    /// by the white / black lists or not classified are skipped.
    pub fn register_device(
        &self,
        name: &str,
        entities: &[EntityDescriptor],
    ) -> Result<Arc<MaterializedDevice>, CoreError> {
        if self.inner.devices.contains_key(name) {
            return Err(CoreError::AlreadyCreated {
                device: name.to_owned(),
            });
        }
        let config = &self.inner.config;
        let bridged: Vec<&EntityDescriptor> = entities
            .iter()
            .filter(|e| config.is_bridged(&e.entity_id))
            .collect();
        let serial = bridged
            .iter()
            .find_map(|e| e.device_id.as_deref())
            .unwrap_or(name);

        let mut device = MutableDevice::from_config(name, serial, config);
        let mut domains = IndexSet::new();
        for entity in &bridged {
            let endpoint = if bridged.len() == 1 {
                ROOT.to_owned()
            } else {
                entity.entity_id.to_string()
            };
            let state = self.state_or_registry(entity);
            if let Classification::Added(_) = classify_into(&mut device, &endpoint, entity, &state, config) {
                domains.insert(entity.domain().to_owned());
                if let Some(url) = entity.attributes.get("configuration_url").and_then(Value::as_str) {
                    device.set_configuration_url(url);
                }
            }
        }
        if device.is_empty() {
            return Err(CoreError::NoSupportedEntities {
                device: name.to_owned(),
            });
        }
        if domains.len() > 1 {
            device.set_composed_type(domains.iter().map(String::as_str).collect::<Vec<_>>().join(", "));
        }

        let materialized = Arc::new(device.create()?);
        // Claim the name before indexing entities; a concurrent registration
        // of the same name loses here and leaves no trace.
        match self.inner.devices.entry(name.to_owned()) {
            Entry::Occupied(_) => {
                return Err(CoreError::AlreadyCreated {
                    device: name.to_owned(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&materialized));
            }
        }
        for (entity_id, _) in materialized.entities() {
            self.inner.entity_index.insert(entity_id.clone(), name.to_owned());
            if let Some(state) = self.state(entity_id) {
                materialized.update_state(entity_id, &state, config);
            }
        }
        info!(
            device = name,
            endpoints = materialized.endpoints().count(),
            entities = materialized.entities().len(),
            "device registered"
        );
        Ok(materialized)
    }

    pub fn device(&self, name: &str) -> Option<Arc<MaterializedDevice>> {
        self.inner.devices.get(name).map(|d| Arc::clone(d.value()))
    }

    pub fn device_for(&self, entity_id: &EntityId) -> Option<Arc<MaterializedDevice>> {
        let name = self.inner.entity_index.get(entity_id)?.value().clone();
        self.device(&name)
    }

    /// Registered device names, sorted.
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.devices.iter().map(|d| d.key().clone()).collect();
        names.sort();
        names
    }

    fn device_or_err(&self, name: &str) -> Result<Arc<MaterializedDevice>, CoreError> {
        self.device(name).ok_or_else(|| CoreError::DeviceNotFound {
            device: name.to_owned(),
        })
    }

    async fn dispatch(&self, call: Option<ServiceCall>) -> Result<Option<ServiceCall>, CoreError> {
        let Some(call) = call else {
            return Ok(None);
        };
        self.inner
            .service_tx
            .send(call.clone())
            .await
            .map_err(|_| CoreError::ServiceChannelClosed)?;
        debug!(domain = %call.domain, service = %call.service, entity = %call.entity_id, "service call dispatched");
        Ok(Some(call))
    }

    // ── Protocol entry points ───────────────────────────────────────

    /// Convert a protocol command and dispatch the resulting service call.
    pub async fn handle_command(
        &self,
        device: &str,
        request: &Value,
        cluster_name: &str,
        endpoint_name: &str,
        command: &str,
    ) -> Result<Option<ServiceCall>, CoreError> {
        let device = self.device_or_err(device)?;
        let state = device
            .endpoint(endpoint_name)
            .and_then(|e| e.command(command))
            .and_then(|b| self.state(&b.entity_id));
        let call = device.command(request, cluster_name, endpoint_name, command, state.as_ref(), &self.inner.config)?;
        self.dispatch(call).await
    }

    /// Convert a protocol attribute write and dispatch the resulting call.
    pub async fn handle_subscribe(
        &self,
        device: &str,
        new_value: &Value,
        old_value: &Value,
        endpoint_name: &str,
        cluster: ClusterId,
        attribute: &str,
    ) -> Result<Option<ServiceCall>, CoreError> {
        let device = self.device_or_err(device)?;
        let state = device
            .endpoint(endpoint_name)
            .and_then(|e| e.subscription(cluster, attribute))
            .and_then(|b| self.state(&b.entity_id));
        let call = device.subscribe(
            new_value,
            old_value,
            endpoint_name,
            cluster,
            attribute,
            state.as_ref(),
            &self.inner.config,
        )?;
        self.dispatch(call).await
    }

    // ── Automation events ───────────────────────────────────────────

    /// Apply one transport event. Returns the attribute writes it caused.
    pub fn handle_event(&self, event: HassEvent) -> Vec<AttributeUpdate> {
        match event {
            HassEvent::StateChanged {
                entity_id, new_state, ..
            } => {
                let updates = self
                    .device_for(&entity_id)
                    .map(|device| device.update_state(&entity_id, &new_state, &self.inner.config))
                    .unwrap_or_default();
                self.inner.states.insert(entity_id, new_state);
                updates
            }
            HassEvent::Connected => {
                self.inner.connection_state.send_replace(ConnectionState::Connected);
                info!("automation platform connected");
                Vec::new()
            }
            HassEvent::Disconnected => {
                self.inner.connection_state.send_replace(ConnectionState::Disconnected);
                warn!("automation platform disconnected");
                Vec::new()
            }
            other => {
                debug!(?other, "lifecycle event ignored");
                Vec::new()
            }
        }
    }

    /// Drain `events` until the channel closes or `cancel` fires.
    pub async fn run(&self, mut events: mpsc::Receiver<HassEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event);
                }
            }
        }
        debug!("bridge event loop stopped");
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Attributes;
    use pretty_assertions::assert_eq;
    use serde_json::json;

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

    fn bridge_with_light() -> (Bridge, mpsc::Receiver<ServiceCall>) {
        let (bridge, rx) = Bridge::new(BridgeConfig::default());
        bridge.load_states([(
            "light.desk".parse().unwrap(),
            snapshot("on", json!({ "brightness": 128, "friendly_name": "Desk" })),
        )]);
        bridge.register_device("desk", &[descriptor("light.desk")]).unwrap();
        (bridge, rx)
    }

    #[tokio::test]
    async fn command_dispatches_service_call() {
        let (bridge, mut rx) = bridge_with_light();
        let call = bridge
            .handle_command("desk", &json!({ "level": 254 }), "levelControl", ROOT, "moveToLevel")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.service, "turn_on");
        assert_eq!(call.data, Some(json!({ "brightness": 255 })));
        assert_eq!(rx.recv().await.unwrap(), call);
    }

    #[tokio::test]
    async fn unknown_device_is_an_error() {
        let (bridge, _rx) = bridge_with_light();
        let err = bridge
            .handle_command("nope", &json!({}), "onOff", ROOT, "on")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DeviceNotFound { .. }));
    }

    #[tokio::test]
    async fn closed_channel_surfaces() {
        let (bridge, rx) = bridge_with_light();
        drop(rx);
        let err = bridge
            .handle_command("desk", &json!({}), "onOff", ROOT, "off")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ServiceChannelClosed));
    }

    #[test]
    fn registration_seeds_current_state() {
        let (bridge, _rx) = bridge_with_light();
        let device = bridge.device("desk").unwrap();
        assert_eq!(device.root().attribute(ClusterId::OnOff, "onOff"), Some(json!(true)));
        assert_eq!(device.root().attribute(ClusterId::LevelControl, "currentLevel"), Some(json!(127)));
        assert_eq!(device.root().friendly_name(), Some("Desk"));
    }

    #[test]
    fn duplicate_and_empty_registrations_fail() {
        let (bridge, _rx) = bridge_with_light();
        assert!(matches!(
            bridge.register_device("desk", &[descriptor("light.desk")]),
            Err(CoreError::AlreadyCreated { .. })
        ));
        assert!(matches!(
            bridge.register_device("weather", &[descriptor("weather.home")]),
            Err(CoreError::NoSupportedEntities { .. })
        ));
    }

    #[test]
    fn concurrent_registrations_of_one_name_admit_one() {
        let (bridge, _rx) = Bridge::new(BridgeConfig::default());
        let bridge = &bridge;
        let wins = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(move || bridge.register_device("porch", &[descriptor("switch.porch")]).is_ok()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count()
        });
        assert_eq!(wins, 1);
        assert_eq!(bridge.device_names(), vec!["porch".to_owned()]);
    }

    #[test]
    fn black_listed_entities_are_skipped() {
        let config = BridgeConfig {
            black_list: vec!["switch.b".into()],
            ..BridgeConfig::default()
        };
        let (bridge, _rx) = Bridge::new(config);
        let device = bridge
            .register_device("pair", &[descriptor("switch.a"), descriptor("switch.b")])
            .unwrap();
        assert!(device.children().is_empty());
        assert_eq!(device.entities().len(), 1);
    }

    #[tokio::test]
    async fn run_applies_events_until_cancelled() {
        let (bridge, _rx) = bridge_with_light();
        let (tx, events) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let bridge = bridge.clone();
            let cancel = cancel.clone();
            async move { bridge.run(events, cancel).await }
        });

        tx.send(HassEvent::Connected).await.unwrap();
        tx.send(HassEvent::StateChanged {
            device_id: None,
            entity_id: "light.desk".parse().unwrap(),
            old_state: None,
            new_state: snapshot("off", json!({})),
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();
        cancel.cancel();

        let device = bridge.device("desk").unwrap();
        assert_eq!(device.root().attribute(ClusterId::OnOff, "onOff"), Some(json!(false)));
        assert_eq!(*bridge.connection_state().borrow(), ConnectionState::Connected);
        assert_eq!(bridge.state(&"light.desk".parse().unwrap()).unwrap().state, "off");
    }
}
