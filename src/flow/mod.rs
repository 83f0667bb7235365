//! Cross-department patient-flow tracking.
//!
//! A `FlowStore` holds one `FlowRecord` per patient visit and tells every
//! subscribed dashboard when any record changes. Each mutation appends to
//! the record's audit history, so `current_stage` always matches the last
//! history entry.

pub mod linking;
pub mod persist;
pub mod policy;
pub mod store;
pub mod types;

pub use linking::{LinkMatch, LinkedRecord, PatientIdentity};
pub use policy::TransitionPolicy;
pub use store::{FlowStore, Subscription};
pub use types::{FlowAction, FlowRecord, HistoryEntry, Stage};

/// Errors from flow store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Flow record not found: {0}")]
    NotFound(String),
    #[error("Flow record already exists: {0}")]
    DuplicateId(String),
    #[error("Transition from {from} to {to} is not allowed")]
    TransitionNotAllowed { from: Stage, to: Stage },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal lock error")]
    LockPoisoned,
}
