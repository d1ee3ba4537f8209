//! Delivery dispatch core.
//!
//! - [`roles`]: who is calling and what they may do
//! - [`codes`]: one-time pickup/drop-off codes
//! - [`machine`]: the transactional state machine shared by both lineages
//! - [`service`]: the action handler composing the above

pub mod codes;
pub mod errmsg;
pub mod error;
pub mod events;
pub mod lineage;
pub mod machine;
pub mod model;
pub mod roles;
pub mod service;

pub use codes::{CodeGenerator, RandomCodeGenerator};
pub use error::{Checkpoint, Denial, DispatchError, Rejection};
pub use events::{BroadcastEventSink, DispatchEvent, FanoutEventSink, LoggingEventSink};
pub use lineage::LineageDescriptor;
pub use machine::{Action, DeliveryStateMachine, TransitionRequest};
pub use model::{
    DeliveryRecord, DeliveryStatus, Lineage, Origin, PickupSnapshot, TransporterKind,
};
pub use roles::{Role, RoleResolver, StaffPolicy, Transporter};
pub use service::{ActionOutcome, DispatchService};
