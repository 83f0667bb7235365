//! In-memory flow store with synchronous subscriber notification.
//!
//! Emission semantics:
//! - Outside `batch`, every successful mutation notifies all subscribers
//!   once, in registration order, after the store lock is released.
//! - Inside `batch`, notifications are coalesced into a single emission
//!   when the outermost batch ends. A batch only covers mutations made on
//!   the thread that opened it; other threads keep emitting immediately.
//! - Failed mutations (unknown id, rejected transition) change nothing
//!   and notify nobody.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

use chrono::Utc;

use super::linking::{self, LinkedRecord, PatientIdentity};
use super::policy::TransitionPolicy;
use super::types::{FlowRecord, Stage};
use super::FlowError;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: bool,
}

struct Inner {
    records: RwLock<Vec<FlowRecord>>,
    subscribers: Mutex<Subscribers>,
    /// Open batches, keyed by the thread that opened them.
    batches: Mutex<HashMap<ThreadId, BatchState>>,
    policy: TransitionPolicy,
}

/// Shared handle to the flow store. Clones point at the same records.
#[derive(Clone)]
pub struct FlowStore {
    inner: Arc<Inner>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self::with_policy(TransitionPolicy::default())
    }

    pub fn with_policy(policy: TransitionPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(Vec::new()),
                subscribers: Mutex::new(Subscribers::default()),
                batches: Mutex::new(HashMap::new()),
                policy,
            }),
        }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.inner.policy
    }

    // ── Reads ───────────────────────────────────────────────

    /// Snapshot of every record, in creation order.
    pub fn list(&self) -> Vec<FlowRecord> {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<FlowRecord> {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Records currently waiting at `stage`, oldest first.
    pub fn by_stage(&self, stage: Stage) -> Vec<FlowRecord> {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.current_stage == stage)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the flow record belonging to a logged-in patient.
    pub fn find_linked(&self, identity: &PatientIdentity<'_>) -> Option<LinkedRecord> {
        let records = self
            .inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        linking::find_linked(&records, identity)
    }

    // ── Creation ────────────────────────────────────────────

    /// Open a new visit at reception with a generated id.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        patient_id: Option<&str>,
    ) -> Result<FlowRecord, FlowError> {
        if name.trim().is_empty() {
            return Err(FlowError::InvalidInput("patient name is required".into()));
        }
        let mut record = FlowRecord::new(uuid::Uuid::new_v4().to_string(), name.trim(), email.trim());
        record.patient_id = patient_id.map(str::to_string);
        self.insert(record)
    }

    /// Insert a prebuilt record. Ids are never reused.
    pub fn insert(&self, record: FlowRecord) -> Result<FlowRecord, FlowError> {
        {
            let mut records = self
                .inner
                .records
                .write()
                .map_err(|_| FlowError::LockPoisoned)?;
            if records.iter().any(|existing| existing.id == record.id) {
                return Err(FlowError::DuplicateId(record.id));
            }
            records.push(record.clone());
        }
        tracing::info!(id = %record.id, stage = record.current_stage.as_str(), "Flow record created");
        self.emit();
        Ok(record)
    }

    // ── Mutations ───────────────────────────────────────────

    /// Move a record to `stage`, subject to the store's transition policy.
    pub fn move_stage(
        &self,
        id: &str,
        stage: Stage,
        notes: Option<&str>,
    ) -> Result<FlowRecord, FlowError> {
        let policy = self.inner.policy;
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let record = self.mutate(id, |record| {
            let from = record.current_stage;
            if !policy.allows(from, stage) {
                return Err(FlowError::TransitionNotAllowed { from, to: stage });
            }
            record.apply_move(stage, notes, Utc::now());
            Ok(())
        })?;
        tracing::info!(id, stage = stage.as_str(), "Flow record moved");
        Ok(record)
    }

    pub fn add_test(&self, id: &str, test_name: &str) -> Result<FlowRecord, FlowError> {
        let test_name = non_blank(test_name, "test name")?;
        let record = self.mutate(id, |record| {
            record.apply_test(test_name, Utc::now());
            Ok(())
        })?;
        tracing::debug!(id, "Flow test ordered");
        Ok(record)
    }

    pub fn add_prescription(&self, id: &str, medication: &str) -> Result<FlowRecord, FlowError> {
        let medication = non_blank(medication, "medication")?;
        let record = self.mutate(id, |record| {
            record.apply_prescription(medication, Utc::now());
            Ok(())
        })?;
        tracing::debug!(id, "Flow prescription added");
        Ok(record)
    }

    /// Replace every record (restore from persisted snapshot).
    pub fn replace_all(&self, records: Vec<FlowRecord>) -> Result<(), FlowError> {
        {
            let mut current = self
                .inner
                .records
                .write()
                .map_err(|_| FlowError::LockPoisoned)?;
            *current = records;
        }
        self.emit();
        Ok(())
    }

    fn mutate<F>(&self, id: &str, apply: F) -> Result<FlowRecord, FlowError>
    where
        F: FnOnce(&mut FlowRecord) -> Result<(), FlowError>,
    {
        let updated = {
            let mut records = self
                .inner
                .records
                .write()
                .map_err(|_| FlowError::LockPoisoned)?;
            let Some(record) = records.iter_mut().find(|record| record.id == id) else {
                tracing::debug!(id, "Flow mutation ignored: unknown id");
                return Err(FlowError::NotFound(id.to_string()));
            };
            apply(record)?;
            record.clone()
        };
        self.emit();
        Ok(updated)
    }

    // ── Subscribers ─────────────────────────────────────────

    /// Register a callback run after every mutation.
    ///
    /// Callbacks take no arguments; re-read with `list()` or `get()`.
    /// The callback stays registered until the returned handle is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.next_id += 1;
        let id = subscribers.next_id;
        subscribers.entries.push((id, Arc::new(callback)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Run `f` with notifications coalesced into one emission at the end.
    ///
    /// Nested batches emit once, when the outermost one finishes. Nothing
    /// is emitted if `f` made no successful mutation.
    pub fn batch<R>(&self, f: impl FnOnce(&FlowStore) -> R) -> R {
        self.inner
            .batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(thread::current().id())
            .or_default()
            .depth += 1;
        let _guard = BatchGuard { store: self };
        f(self)
    }

    fn emit(&self) {
        {
            let mut batches = self
                .inner
                .batches
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(batch) = batches.get_mut(&thread::current().id()) {
                batch.pending = true;
                return;
            }
        }
        self.notify();
    }

    fn notify(&self) {
        // Clone out of the lock so callbacks can read the store or subscribe.
        let callbacks: Vec<Callback> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStore")
            .field("records", &self.len())
            .field("subscribers", &self.subscriber_count())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

fn non_blank(value: &str, field: &str) -> Result<String, FlowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FlowError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

struct BatchGuard<'a> {
    store: &'a FlowStore,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let flush = {
            let mut batches = self
                .store
                .inner
                .batches
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let id = thread::current().id();
            match batches.get_mut(&id) {
                Some(batch) if batch.depth > 1 => {
                    batch.depth -= 1;
                    false
                }
                Some(_) => batches.remove(&id).is_some_and(|batch| batch.pending),
                None => false,
            }
        };
        if flush && !std::thread::panicking() {
            self.store.notify();
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Subscription handle
// ═══════════════════════════════════════════════════════════

/// Keeps a subscriber registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn detach(&self) {
        if let Some(inner) = self.store.upgrade() {
            let mut subscribers = inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscribers.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
