//! Saving and restoring the flow store through the local store.
//!
//! The flow store itself lives in memory only; a dashboard shell calls
//! `save` after changes (or from a subscriber) and `restore` on start-up.

use super::store::FlowStore;
use super::types::FlowRecord;
use super::FlowError;
use crate::db::{LocalStore, StorageError};

/// Local-store key holding the serialized flow records.
pub const FLOW_RECORDS_KEY: &str = "flow.records";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

pub fn save(store: &FlowStore, local: &LocalStore) -> Result<(), PersistError> {
    let records = store.list();
    local.set_json(FLOW_RECORDS_KEY, &records)?;
    tracing::debug!(count = records.len(), "Flow records saved");
    Ok(())
}

/// Load saved records into `store`. Returns how many were restored.
///
/// A missing or unreadable snapshot restores nothing and leaves the
/// store untouched.
pub fn restore(store: &FlowStore, local: &LocalStore) -> Result<usize, PersistError> {
    let records: Vec<FlowRecord> = local.load_or_default(FLOW_RECORDS_KEY);
    if records.is_empty() {
        return Ok(0);
    }
    let count = records.len();
    store.replace_all(records)?;
    tracing::info!(count, "Flow records restored");
    Ok(count)
}

/// Keep the local snapshot current by saving after every emission.
pub fn autosave(store: &FlowStore, local: std::sync::Arc<LocalStore>) -> super::Subscription {
    let reader = store.clone();
    store.subscribe(move || {
        if let Err(e) = save(&reader, &local) {
            tracing::warn!(error = %e, "Flow autosave failed");
        }
    })
}
