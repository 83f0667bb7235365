use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use super::{sample, Backend, BackendError, Resource};
use crate::models::{new_id, sum_cents, BillItem, DashboardStats, PaymentStatus};

/// In-memory backend seeded with sample data.
///
/// Backs offline mode and the mock REST server, and lets tests simulate
/// an unreachable backend with `set_offline`.
pub struct MockBackend {
    data: Mutex<HashMap<Resource, Vec<Value>>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Seeded with the sample hospital.
    pub fn new() -> Self {
        Self::with_data(sample::seed())
    }

    /// Every collection empty.
    pub fn empty() -> Self {
        Self::with_data(HashMap::new())
    }

    pub fn with_data(data: HashMap<Resource, Vec<Value>>) -> Self {
        Self {
            data: Mutex::new(data),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// While offline every call fails with `BackendError::Offline`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Number of calls received, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn with_collection<R>(
        &self,
        resource: Resource,
        f: impl FnOnce(&mut Vec<Value>) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_offline() {
            return Err(BackendError::Offline);
        }
        let mut data = self
            .data
            .lock()
            .map_err(|_| BackendError::HttpClient("mock backend lock poisoned".into()))?;
        f(data.entry(resource).or_default())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn record_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
}

fn not_found(resource: Resource, id: &str) -> BackendError {
    BackendError::NotFound(format!("{}/{}", resource.path(), id))
}

fn require_object(body: &Value) -> Result<serde_json::Map<String, Value>, BackendError> {
    match body {
        Value::Object(map) => Ok(map.clone()),
        _ => Err(BackendError::Status {
            status: 400,
            body: "expected a JSON object".into(),
        }),
    }
}

impl Backend for MockBackend {
    fn list(&self, resource: Resource) -> Result<Vec<Value>, BackendError> {
        self.with_collection(resource, |items| Ok(items.clone()))
    }

    fn create(&self, resource: Resource, body: &Value) -> Result<Value, BackendError> {
        let mut record = require_object(body)?;
        self.with_collection(resource, |items| {
            let id = match record.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => new_id(),
            };
            if items.iter().any(|item| record_id(item) == Some(id.as_str())) {
                return Err(BackendError::Status {
                    status: 409,
                    body: format!("duplicate id {id}"),
                });
            }
            record.insert("id".into(), Value::String(id));
            let record = Value::Object(record);
            items.push(record.clone());
            Ok(record)
        })
    }

    fn update(&self, resource: Resource, id: &str, body: &Value) -> Result<Value, BackendError> {
        let mut record = require_object(body)?;
        record.insert("id".into(), Value::String(id.to_string()));
        self.with_collection(resource, |items| {
            let slot = items
                .iter_mut()
                .find(|item| record_id(item) == Some(id))
                .ok_or_else(|| not_found(resource, id))?;
            *slot = Value::Object(record);
            Ok(slot.clone())
        })
    }

    fn patch(&self, resource: Resource, id: &str, changes: &Value) -> Result<Value, BackendError> {
        let changes = require_object(changes)?;
        self.with_collection(resource, |items| {
            let slot = items
                .iter_mut()
                .find(|item| record_id(item) == Some(id))
                .ok_or_else(|| not_found(resource, id))?;
            if let Value::Object(existing) = slot {
                for (key, value) in changes {
                    if key != "id" {
                        existing.insert(key, value);
                    }
                }
            }
            Ok(slot.clone())
        })
    }

    fn delete(&self, resource: Resource, id: &str) -> Result<(), BackendError> {
        self.with_collection(resource, |items| {
            let before = items.len();
            items.retain(|item| record_id(item) != Some(id));
            if items.len() == before {
                return Err(not_found(resource, id));
            }
            Ok(())
        })
    }

    fn stats(&self) -> Result<DashboardStats, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_offline() {
            return Err(BackendError::Offline);
        }
        let data = self
            .data
            .lock()
            .map_err(|_| BackendError::HttpClient("mock backend lock poisoned".into()))?;
        let count = |resource: Resource| data.get(&resource).map_or(0, |items| items.len() as u64);
        let revenue_cents = sum_cents(
            data.get(&Resource::Billing)
                .into_iter()
                .flatten()
                .filter_map(|value| serde_json::from_value::<BillItem>(value.clone()).ok())
                .filter(|item| item.status == PaymentStatus::Paid)
                .map(|item| item.line_total_cents()),
        );

        Ok(DashboardStats {
            total_patients: count(Resource::Patients),
            total_doctors: count(Resource::Doctors),
            total_appointments: count(Resource::Appointments),
            total_departments: count(Resource::Departments),
            revenue_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_assigns_id_when_missing() {
        let backend = MockBackend::empty();
        let created = backend
            .create(Resource::Departments, &json!({"name": "Neurology", "beds": 8}))
            .unwrap();
        let id = created["id"].as_str().unwrap();
        assert!(!id.is_empty());
        assert_eq!(backend.list(Resource::Departments).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_id_rejected() {
        let backend = MockBackend::empty();
        backend.create(Resource::Users, &json!({"id": "U1"})).unwrap();
        let err = backend.create(Resource::Users, &json!({"id": "U1"})).unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 409, .. }));
    }

    #[test]
    fn patch_merges_and_keeps_id() {
        let backend = MockBackend::empty();
        backend
            .create(Resource::Ambulances, &json!({"id": "AMB1", "status": "available"}))
            .unwrap();
        let patched = backend
            .patch(Resource::Ambulances, "AMB1", &json!({"status": "dispatched", "id": "X"}))
            .unwrap();
        assert_eq!(patched["status"], "dispatched");
        assert_eq!(patched["id"], "AMB1");
    }

    #[test]
    fn update_and_delete_missing_are_not_found() {
        let backend = MockBackend::empty();
        assert!(matches!(
            backend.update(Resource::Doctors, "nope", &json!({})),
            Err(BackendError::NotFound(_))
        ));
        assert!(matches!(
            backend.delete(Resource::Doctors, "nope"),
            Err(BackendError::NotFound(_))
        ));
    }

    #[test]
    fn offline_fails_every_call() {
        let backend = MockBackend::new();
        backend.set_offline(true);
        assert_eq!(backend.list(Resource::Doctors), Err(BackendError::Offline));
        assert_eq!(backend.stats(), Err(BackendError::Offline));
        assert_eq!(backend.call_count(), 2);
        backend.set_offline(false);
        assert!(backend.list(Resource::Doctors).is_ok());
    }

    #[test]
    fn stats_count_seeded_data() {
        let backend = MockBackend::new();
        let stats = backend.stats().unwrap();
        assert_eq!(stats.total_doctors, sample::doctors().len() as u64);
        assert_eq!(stats.total_patients, sample::patients().len() as u64);
        assert_eq!(stats.revenue_cents, 0);
    }
}
