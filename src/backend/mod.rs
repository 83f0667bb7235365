//! REST backend access.
//!
//! `Backend` is the seam between dashboards and wherever records live:
//! `HttpBackend` talks to the real REST API, `MockBackend` keeps sample
//! state in memory (offline development, tests, and the mock server).
//! The trait speaks `serde_json::Value` so it stays object-safe; the
//! typed helpers below convert at the edge.

pub mod http;
pub mod mock;
pub mod sample;

pub use http::HttpBackend;
pub use mock::MockBackend;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::DashboardStats;

/// Errors from backend calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Cannot reach backend at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unexpected response: {0}")]
    ResponseParsing(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Backend offline")]
    Offline,
}

// ═══════════════════════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════════════════════

/// A collection endpoint on the REST backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Doctors,
    Patients,
    Departments,
    Users,
    Appointments,
    Diseases,
    Prescriptions,
    Inventory,
    Billing,
    Alerts,
    LabOrders,
    Scans,
    Surgeries,
    Ambulances,
    EmergencyCases,
    TriageAssessments,
}

impl Resource {
    pub const ALL: &'static [Resource] = &[
        Self::Doctors,
        Self::Patients,
        Self::Departments,
        Self::Users,
        Self::Appointments,
        Self::Diseases,
        Self::Prescriptions,
        Self::Inventory,
        Self::Billing,
        Self::Alerts,
        Self::LabOrders,
        Self::Scans,
        Self::Surgeries,
        Self::Ambulances,
        Self::EmergencyCases,
        Self::TriageAssessments,
    ];

    /// Path relative to the backend base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Doctors => "/doctors",
            Self::Patients => "/patient",
            Self::Departments => "/departments",
            Self::Users => "/users",
            Self::Appointments => "/patient/appointments",
            Self::Diseases => "/diseases",
            Self::Prescriptions => "/prescriptions",
            Self::Inventory => "/inventory",
            Self::Billing => "/billing",
            Self::Alerts => "/alerts",
            Self::LabOrders => "/lab-orders",
            Self::Scans => "/scans",
            Self::Surgeries => "/surgeries",
            Self::Ambulances => "/ambulances",
            Self::EmergencyCases => "/emergency-cases",
            Self::TriageAssessments => "/triage",
        }
    }

    pub fn from_path(path: &str) -> Option<Resource> {
        let path = path.trim_end_matches('/');
        Self::ALL.iter().copied().find(|r| r.path() == path)
    }
}

pub const STATS_PATH: &str = "/dashboard/stats";

// ═══════════════════════════════════════════════════════════
// Backend trait
// ═══════════════════════════════════════════════════════════

pub trait Backend: Send + Sync {
    fn list(&self, resource: Resource) -> Result<Vec<Value>, BackendError>;

    /// Create a record; returns the stored form (the backend may assign the id).
    fn create(&self, resource: Resource, body: &Value) -> Result<Value, BackendError>;

    /// Replace a record (PUT).
    fn update(&self, resource: Resource, id: &str, body: &Value) -> Result<Value, BackendError>;

    /// Merge fields into a record (PATCH).
    fn patch(&self, resource: Resource, id: &str, changes: &Value) -> Result<Value, BackendError>;

    fn delete(&self, resource: Resource, id: &str) -> Result<(), BackendError>;

    fn stats(&self) -> Result<DashboardStats, BackendError>;

    /// Bearer token for later calls. Backends without auth ignore it.
    fn set_token(&self, _token: Option<String>) {}
}

// ═══════════════════════════════════════════════════════════
// Envelopes and typed helpers
// ═══════════════════════════════════════════════════════════

/// Accept either a bare JSON array or a `{ "data": [...] }` envelope.
pub fn unwrap_list(body: Value) -> Result<Vec<Value>, BackendError> {
    match unwrap_data(body) {
        Value::Array(items) => Ok(items),
        other => Err(BackendError::ResponseParsing(format!(
            "expected a JSON array, got {}",
            kind(&other)
        ))),
    }
}

/// Strip a `{ "data": ... }` envelope if present.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::ResponseParsing(e.to_string()))
}

pub fn encode<T: Serialize>(record: &T) -> Result<Value, BackendError> {
    serde_json::to_value(record).map_err(|e| BackendError::ResponseParsing(e.to_string()))
}

/// Fetch and decode a whole collection. Entries that do not match `T`
/// are skipped with a warning instead of failing the page.
pub fn fetch_all<T: DeserializeOwned>(
    backend: &dyn Backend,
    resource: Resource,
) -> Result<Vec<T>, BackendError> {
    let items = backend.list(resource)?;
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = resource.path(), error = %e, "Skipping malformed record");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        tracing::warn!(
            path = resource.path(),
            skipped = total - decoded.len(),
            "Some backend records were not understood"
        );
    }
    Ok(decoded)
}

pub fn create_record<T: Serialize + DeserializeOwned>(
    backend: &dyn Backend,
    resource: Resource,
    record: &T,
) -> Result<T, BackendError> {
    decode(backend.create(resource, &encode(record)?)?)
}

pub fn update_record<T: Serialize + DeserializeOwned>(
    backend: &dyn Backend,
    resource: Resource,
    id: &str,
    record: &T,
) -> Result<T, BackendError> {
    decode(backend.update(resource, id, &encode(record)?)?)
}
