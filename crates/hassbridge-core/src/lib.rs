//! Entity classification, value conversion and endpoint composition for a
//! Home Assistant to Matter bridge.
//!
//! - **[`rules`]**: static tables mapping domains, attribute keys and device
//!   classes to device types and clusters, plus the command / subscribe /
//!   update tables used at runtime.
//!
//! - **[`resolve`]**: decision procedures for climate, fan, vacuum and color
//!   light entities whose clusters depend on several attributes.
//!
//! - **[`MutableDevice`]**: per-device build arena. Entities accumulate into
//!   named endpoints; [`create()`](MutableDevice::create) dedups, optionally
//!   remaps children into the root, and materializes a [`MaterializedDevice`].
//!
//! - **[`Bridge`]**: runtime facade. Routes protocol commands and attribute
//!   writes to [`ServiceCall`]s over an `mpsc` channel and applies
//!   automation state changes to materialized endpoints.
//!
//! Conversions never fail loudly: an unconvertible value is `None` and the
//! corresponding attribute write or service call is skipped.

pub mod bridge;
pub mod builder;
pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod matter;
pub mod model;
pub mod resolve;
pub mod rules;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, ConnectionState};
pub use builder::{
    AttributeUpdate, BuildState, ClusterRequirement, ClusterSpec, DeviceIdentity,
    MaterializedDevice, MutableDevice, ROOT,
};
pub use classify::{Classification, EntityPlan, classify, classify_into};
pub use config::BridgeConfig;
pub use convert::TemperatureUnit;
pub use error::CoreError;
pub use matter::{ClusterId, Endpoint, EndpointSummary, Feature};
pub use model::{
    Attributes, EntityDescriptor, EntityId, HassEvent, ServiceCall, StateSnapshot,
};
