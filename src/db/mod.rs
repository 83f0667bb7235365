//! Local persistence: the browser local-storage equivalent.
//!
//! A single SQLite file holds JSON documents under string keys: the
//! session token and user, per-dashboard settings, pharmacy records and
//! flow snapshots.

pub mod local_store;
pub mod session;
pub mod sqlite;

pub use local_store::LocalStore;
pub use session::{Redirect, Session, SessionUser};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed value under key {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Serialization failed for key {key}: {reason}")]
    Serialize { key: String, reason: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Cannot create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal lock error")]
    LockPoisoned,
}
