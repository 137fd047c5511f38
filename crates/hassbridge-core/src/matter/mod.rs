// ── Protocol-side model ──
//
// Cluster identifiers, the device-type catalog and the endpoint objects
// produced by materialization.

pub mod cluster;
pub mod defaults;
pub mod device_type;
pub mod endpoint;

pub use cluster::{ClusterId, Feature};
pub use device_type::{DeviceCategory, DeviceTypeDescriptor};
pub use endpoint::{ClusterServer, ClusterSummary, Endpoint, EndpointSummary};
