//! Typed record collections shared by the dashboards.
//!
//! A `Collection` holds one entity type in display order. Remote
//! collections write to the backend first and only then change local
//! state; a failed write leaves local state untouched and marks the
//! collection out of sync. Local-only collections mutate directly.
//! Either kind may mirror itself into the local store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{self, Backend, BackendError, Resource};
use crate::db::LocalStore;
use crate::notify::Toasts;

/// An entity that can live in a `Collection`.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// Fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match; an empty query matches everything.
    fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} already exists: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("Invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncStatus {
    #[default]
    Synced,
    /// The last backend call failed; local state is what was last confirmed.
    OutOfSync { operation: String, reason: String },
}

/// Everything a collection write may touch.
#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    pub backend: &'a dyn Backend,
    pub local: &'a LocalStore,
    pub toasts: &'a Toasts,
}

#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    kind: &'static str,
    resource: Option<Resource>,
    persist_key: Option<String>,
    items: Vec<T>,
    status: SyncStatus,
}

impl<T: Record> Collection<T> {
    /// Backed by a REST resource; `seed` is shown until the first load.
    pub fn remote(kind: &'static str, resource: Resource, seed: Vec<T>) -> Self {
        Self {
            kind,
            resource: Some(resource),
            persist_key: None,
            items: seed,
            status: SyncStatus::Synced,
        }
    }

    /// Never talks to the backend.
    pub fn local(kind: &'static str, seed: Vec<T>) -> Self {
        Self {
            kind,
            resource: None,
            persist_key: None,
            items: seed,
            status: SyncStatus::Synced,
        }
    }

    /// Mirror contents into the local store under `key`.
    pub fn persisted(mut self, key: &str) -> Self {
        self.persist_key = Some(key.to_string());
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn resource(&self) -> Option<Resource> {
        self.resource
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn search(&self, query: &str) -> Vec<&T> {
        self.items.iter().filter(|item| item.matches(query)).collect()
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn is_synced(&self) -> bool {
        self.status == SyncStatus::Synced
    }

    // ── Loading ─────────────────────────────────────────────

    /// Replace contents with what the local store holds, if anything.
    ///
    /// Missing or malformed data keeps the current items. Returns whether
    /// anything was restored.
    pub fn restore(&mut self, local: &LocalStore) -> bool {
        let Some(key) = &self.persist_key else {
            return false;
        };
        match local.load_or::<Option<Vec<T>>>(key, || None) {
            Some(items) => {
                tracing::debug!(kind = self.kind, key = %key, count = items.len(), "Restored collection");
                self.items = items;
                true
            }
            None => false,
        }
    }

    /// Replace contents from the backend.
    ///
    /// On failure the current items stay, a toast is raised, and the
    /// collection is marked out of sync. Local-only collections are a no-op.
    pub fn load(&mut self, ctx: &WriteContext<'_>) -> Result<usize, RecordError> {
        let Some(resource) = self.resource else {
            return Ok(self.items.len());
        };
        match backend::fetch_all::<T>(ctx.backend, resource) {
            Ok(items) => {
                tracing::info!(kind = self.kind, count = items.len(), "Loaded collection");
                self.items = items;
                self.status = SyncStatus::Synced;
                self.persist(ctx.local);
                Ok(self.items.len())
            }
            Err(e) => Err(self.fail(ctx, "load", e)),
        }
    }

    // ── Writes ──────────────────────────────────────────────

    pub fn create(&mut self, ctx: &WriteContext<'_>, record: T) -> Result<T, RecordError> {
        if !record.id().is_empty() && self.get(record.id()).is_some() {
            return Err(RecordError::DuplicateId {
                kind: self.kind,
                id: record.id().to_string(),
            });
        }
        let stored = match self.resource {
            Some(resource) => backend::create_record(ctx.backend, resource, &record)
                .map_err(|e| self.fail(ctx, "create", e))?,
            None => record,
        };
        self.items.push(stored.clone());
        self.committed(ctx, "added");
        Ok(stored)
    }

    /// Replace the record with the same id.
    pub fn update(&mut self, ctx: &WriteContext<'_>, record: T) -> Result<T, RecordError> {
        let index = self.index_of(record.id())?;
        let stored = match self.resource {
            Some(resource) => backend::update_record(ctx.backend, resource, record.id(), &record)
                .map_err(|e| self.fail(ctx, "update", e))?,
            None => record,
        };
        self.items[index] = stored.clone();
        self.committed(ctx, "updated");
        Ok(stored)
    }

    /// Clone the record, apply `change`, and save it with `update`.
    pub fn modify(
        &mut self,
        ctx: &WriteContext<'_>,
        id: &str,
        change: impl FnOnce(&mut T),
    ) -> Result<T, RecordError> {
        let index = self.index_of(id)?;
        let mut record = self.items[index].clone();
        change(&mut record);
        self.update(ctx, record)
    }

    /// Merge a partial JSON object into the record (PATCH).
    pub fn patch(&mut self, ctx: &WriteContext<'_>, id: &str, changes: Value) -> Result<T, RecordError> {
        let index = self.index_of(id)?;
        let stored = match self.resource {
            Some(resource) => ctx
                .backend
                .patch(resource, id, &changes)
                .and_then(backend::decode::<T>)
                .map_err(|e| self.fail(ctx, "update", e))?,
            None => merge(&self.items[index], changes).map_err(|reason| RecordError::Invalid {
                kind: self.kind,
                reason,
            })?,
        };
        self.items[index] = stored.clone();
        self.committed(ctx, "updated");
        Ok(stored)
    }

    /// Remove a record; returns what was removed.
    pub fn delete(&mut self, ctx: &WriteContext<'_>, id: &str) -> Result<T, RecordError> {
        let index = self.index_of(id)?;
        if let Some(resource) = self.resource {
            ctx.backend
                .delete(resource, id)
                .map_err(|e| self.fail(ctx, "delete", e))?;
        }
        let removed = self.items.remove(index);
        self.committed(ctx, "deleted");
        Ok(removed)
    }

    // ── Internals ───────────────────────────────────────────

    fn index_of(&self, id: &str) -> Result<usize, RecordError> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| RecordError::NotFound {
                kind: self.kind,
                id: id.to_string(),
            })
    }

    fn fail(&mut self, ctx: &WriteContext<'_>, operation: &str, error: BackendError) -> RecordError {
        tracing::warn!(kind = self.kind, operation, error = %error, "Backend write failed");
        ctx.toasts
            .error(format!("Could not {operation} {}: {error}", self.kind));
        self.status = SyncStatus::OutOfSync {
            operation: operation.to_string(),
            reason: error.to_string(),
        };
        RecordError::Backend(error)
    }

    fn committed(&mut self, ctx: &WriteContext<'_>, verb: &str) {
        self.status = SyncStatus::Synced;
        self.persist(ctx.local);
        ctx.toasts.success(format!("{} {verb}", capitalize(self.kind)));
    }

    fn persist(&self, local: &LocalStore) {
        if let Some(key) = &self.persist_key {
            if let Err(e) = local.set_json(key, &self.items) {
                tracing::warn!(kind = self.kind, key = %key, error = %e, "Failed to persist collection");
            }
        }
    }
}

fn merge<T: Record>(record: &T, changes: Value) -> Result<T, String> {
    let mut value = serde_json::to_value(record).map_err(|e| e.to_string())?;
    if let (Value::Object(target), Value::Object(changes)) = (&mut value, changes) {
        for (key, field) in changes {
            if key != "id" {
                target.insert(key, field);
            }
        }
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::models::{Department, InventoryItem};
    use crate::notify::ToastLevel;
    use serde_json::json;

    fn department(id: &str, name: &str) -> Department {
        Department {
            id: id.into(),
            name: name.into(),
            head: None,
            beds: 10,
        }
    }

    struct Fixture {
        backend: MockBackend,
        local: LocalStore,
        toasts: Toasts,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: MockBackend::empty(),
                local: LocalStore::open_in_memory().unwrap(),
                toasts: Toasts::new(),
            }
        }

        fn ctx(&self) -> WriteContext<'_> {
            WriteContext {
                backend: &self.backend,
                local: &self.local,
                toasts: &self.toasts,
            }
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let departments = Collection::local(
            "department",
            vec![department("1", "Cardiology"), department("2", "Pediatrics")],
        );
        let hits = departments.search("CARDIO");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(departments.search("  ").len(), 2);
        assert!(departments.search("neuro").is_empty());
    }

    #[test]
    fn create_goes_through_backend() {
        let fx = Fixture::new();
        let mut departments = Collection::remote("department", Resource::Departments, vec![]);
        departments.create(&fx.ctx(), department("D1", "Cardiology")).unwrap();
        assert_eq!(departments.len(), 1);
        assert_eq!(fx.backend.list(Resource::Departments).unwrap().len(), 1);
        assert!(departments.is_synced());
        assert_eq!(fx.toasts.latest().unwrap().message, "Department added");
    }

    #[test]
    fn failed_write_leaves_local_state_and_marks_out_of_sync() {
        let fx = Fixture::new();
        let mut departments =
            Collection::remote("department", Resource::Departments, vec![department("D1", "Cardiology")]);
        fx.backend.set_offline(true);

        let err = departments.create(&fx.ctx(), department("D2", "Neurology")).unwrap_err();
        assert_eq!(err, RecordError::Backend(BackendError::Offline));
        assert_eq!(departments.len(), 1);
        assert_eq!(
            departments.status(),
            &SyncStatus::OutOfSync {
                operation: "create".into(),
                reason: "Backend offline".into(),
            }
        );
        assert_eq!(fx.toasts.latest().unwrap().level, ToastLevel::Error);

        let err = departments.delete(&fx.ctx(), "D1").unwrap_err();
        assert!(matches!(err, RecordError::Backend(_)));
        assert_eq!(departments.len(), 1);
    }

    #[test]
    fn failed_load_keeps_seed() {
        let fx = Fixture::new();
        fx.backend.set_offline(true);
        let mut departments =
            Collection::remote("department", Resource::Departments, vec![department("D1", "Cardiology")]);
        assert!(departments.load(&fx.ctx()).is_err());
        assert_eq!(departments.items()[0].name, "Cardiology");
        assert!(!departments.is_synced());

        fx.backend.set_offline(false);
        assert_eq!(departments.load(&fx.ctx()).unwrap(), 0);
        assert!(departments.is_synced());
    }

    #[test]
    fn local_only_collection_persists_and_restores() {
        let fx = Fixture::new();
        let mut stock: Collection<InventoryItem> =
            Collection::local("item", crate::backend::sample::inventory()).persisted("pharmacy.inventory");
        stock.modify(&fx.ctx(), "INV1", |item| item.quantity = 7).unwrap();
        assert_eq!(fx.backend.call_count(), 0);

        let mut reopened: Collection<InventoryItem> = Collection::local("item", vec![]).persisted("pharmacy.inventory");
        assert!(reopened.restore(&fx.local));
        assert_eq!(reopened.get("INV1").unwrap().quantity, 7);
    }

    #[test]
    fn malformed_persisted_data_keeps_seed() {
        let fx = Fixture::new();
        fx.local.set_raw("pharmacy.inventory", "[{oops").unwrap();
        let mut stock: Collection<InventoryItem> =
            Collection::local("item", crate::backend::sample::inventory()).persisted("pharmacy.inventory");
        assert!(!stock.restore(&fx.local));
        assert_eq!(stock.len(), crate::backend::sample::inventory().len());
    }

    #[test]
    fn patch_merges_remote_and_local() {
        let fx = Fixture::new();
        let mut remote = Collection::remote("department", Resource::Departments, vec![]);
        remote.create(&fx.ctx(), department("D1", "Cardiology")).unwrap();
        let patched = remote.patch(&fx.ctx(), "D1", json!({"beds": 40})).unwrap();
        assert_eq!(patched.beds, 40);

        let mut local = Collection::local("department", vec![department("D9", "Wards")]);
        let patched = local.patch(&fx.ctx(), "D9", json!({"name": "Wards A"})).unwrap();
        assert_eq!(patched.name, "Wards A");
        assert_eq!(patched.id, "D9");
    }

    #[test]
    fn unknown_id_and_duplicates_rejected_locally() {
        let fx = Fixture::new();
        let mut local = Collection::local("department", vec![department("D1", "Cardiology")]);
        assert!(matches!(
            local.update(&fx.ctx(), department("D2", "x")),
            Err(RecordError::NotFound { .. })
        ));
        assert!(matches!(
            local.create(&fx.ctx(), department("D1", "again")),
            Err(RecordError::DuplicateId { .. })
        ));
    }
}
