// ── Automation-side domain model ──
//
// Snapshot types handed over by the Home Assistant transport and the
// service calls the engine sends back.

pub mod entity;
pub mod event;

pub use entity::{Attributes, EntityDescriptor, EntityId, ParseEntityIdError, StateSnapshot};
pub use event::{HassEvent, ServiceCall};
