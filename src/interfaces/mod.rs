//! Abstract interfaces for dispatch collaborators.
//!
//! These traits define the contracts for:
//! - Document storage (transactional record persistence)
//! - Role and driver credential lookups
//! - Business profile lookups (pickup enrichment)
//! - Transition notifications (downstream payout, tracking)

pub mod directory;
pub mod document_store;
pub mod event_sink;

pub use directory::{BusinessDirectory, BusinessProfile, DriverCredential, RoleDirectory, RoleRecord};
pub use document_store::{
    Document, DocumentKey, DocumentStore, FieldUpdates, Result, StorageError, TransactionBody,
    TransactionError,
};
pub use event_sink::DispatchEventSink;
