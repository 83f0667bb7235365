//! Application state shared by every dashboard.
//!
//! `CoreState` is the single owner of the flow store, the backend handle,
//! the local store, the toast queue, and the record collections that more
//! than one dashboard reads or writes. Dashboards borrow it; they never
//! keep their own copies of shared records.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::{sample, Backend, BackendError, HttpBackend, MockBackend, Resource};
use crate::config::{self, ClientConfig};
use crate::db::{LocalStore, Redirect, Session, SessionUser, StorageError};
use crate::flow::persist::{self, PersistError};
use crate::flow::{FlowError, FlowStore, Subscription, TransitionPolicy};
use crate::models::*;
use crate::notify::Toasts;
use crate::records::{Collection, WriteContext};

// ═══════════════════════════════════════════════════════════
// Shared record collections
// ═══════════════════════════════════════════════════════════

/// Every collection shared across dashboards, behind one lock.
pub struct SharedRecords {
    pub patients: Collection<Patient>,
    pub doctors: Collection<Doctor>,
    pub departments: Collection<Department>,
    pub users: Collection<User>,
    pub appointments: Collection<Appointment>,
    pub diseases: Collection<Disease>,
    pub prescriptions: Collection<Prescription>,
    /// Pharmacy stock lives only in the local store.
    pub inventory: Collection<InventoryItem>,
    pub bills: Collection<BillItem>,
    pub alerts: Collection<Alert>,
    pub lab_orders: Collection<LabOrder>,
    pub scans: Collection<Scan>,
    pub surgeries: Collection<Surgery>,
    pub ambulances: Collection<Ambulance>,
    pub emergency_cases: Collection<EmergencyCase>,
    pub triage: Collection<TriageAssessment>,
}

impl SharedRecords {
    /// Seeded with sample data, shown until the first backend load.
    pub fn seeded() -> Self {
        Self {
            patients: Collection::remote("patient", Resource::Patients, sample::patients()),
            doctors: Collection::remote("doctor", Resource::Doctors, sample::doctors()),
            departments: Collection::remote("department", Resource::Departments, sample::departments()),
            users: Collection::remote("user", Resource::Users, sample::users()),
            appointments: Collection::remote(
                "appointment",
                Resource::Appointments,
                sample::appointments(),
            ),
            diseases: Collection::remote("disease", Resource::Diseases, sample::diseases()),
            prescriptions: Collection::remote(
                "prescription",
                Resource::Prescriptions,
                sample::prescriptions(),
            )
            .persisted("pharmacy.prescriptions"),
            inventory: Collection::local("inventory item", sample::inventory())
                .persisted("pharmacy.inventory"),
            bills: Collection::remote("bill item", Resource::Billing, sample::bill_items()),
            alerts: Collection::remote("alert", Resource::Alerts, sample::alerts()).persisted("alerts"),
            lab_orders: Collection::remote("lab order", Resource::LabOrders, Vec::new()),
            scans: Collection::remote("scan", Resource::Scans, Vec::new()),
            surgeries: Collection::remote("surgery", Resource::Surgeries, sample::surgeries()),
            ambulances: Collection::remote("ambulance", Resource::Ambulances, sample::ambulances()),
            emergency_cases: Collection::remote("emergency case", Resource::EmergencyCases, Vec::new()),
            triage: Collection::remote("triage assessment", Resource::TriageAssessments, Vec::new()),
        }
    }

    fn restore(&mut self, local: &LocalStore) {
        self.prescriptions.restore(local);
        self.inventory.restore(local);
        self.alerts.restore(local);
    }

    /// Reload every remote collection; returns the kinds that failed.
    pub fn load_all(&mut self, ctx: &WriteContext<'_>) -> Vec<&'static str> {
        let mut failed = Vec::new();
        macro_rules! load {
            ($($field:ident),+) => {
                $(if self.$field.load(ctx).is_err() {
                    failed.push(self.$field.kind());
                })+
            };
        }
        load!(
            patients,
            doctors,
            departments,
            users,
            appointments,
            diseases,
            prescriptions,
            bills,
            alerts,
            lab_orders,
            scans,
            surgeries,
            ambulances,
            emergency_cases,
            triage
        );
        failed
    }
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    flow: FlowStore,
    backend: Arc<dyn Backend>,
    local: Arc<LocalStore>,
    toasts: Toasts,
    records: RwLock<SharedRecords>,
    /// Keeps the flow snapshot in the local store current.
    _autosave: Subscription,
}

impl CoreState {
    /// Wire up state over an existing backend and local store.
    ///
    /// Restores the flow snapshot and persisted collections, then starts
    /// autosaving the flow store.
    pub fn new(
        backend: Arc<dyn Backend>,
        local: Arc<LocalStore>,
        policy: TransitionPolicy,
    ) -> Result<Self, CoreError> {
        let flow = FlowStore::with_policy(policy);
        let restored = persist::restore(&flow, &local)?;
        let autosave = persist::autosave(&flow, local.clone());

        let mut records = SharedRecords::seeded();
        records.restore(&local);

        tracing::info!(restored, policy = ?policy, "Core state ready");
        Ok(Self {
            flow,
            backend,
            local,
            toasts: Toasts::new(),
            records: RwLock::new(records),
            _autosave: autosave,
        })
    }

    /// Offline state: mock backend, in-memory local store.
    pub fn in_memory() -> Result<Self, CoreError> {
        Self::new(
            Arc::new(MockBackend::new()),
            Arc::new(LocalStore::open_in_memory()?),
            TransitionPolicy::default(),
        )
    }

    /// Real backend from `config`, local store under the app data directory.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CoreError> {
        let backend = HttpBackend::new(config)?;
        let local = LocalStore::open(&config::local_store_path())?;
        Self::new(Arc::new(backend), Arc::new(local), TransitionPolicy::default())
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn flow(&self) -> &FlowStore {
        &self.flow
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn ctx(&self) -> WriteContext<'_> {
        WriteContext {
            backend: self.backend.as_ref(),
            local: &self.local,
            toasts: &self.toasts,
        }
    }

    pub fn read_records(&self) -> Result<RwLockReadGuard<'_, SharedRecords>, CoreError> {
        self.records.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write_records(&self) -> Result<RwLockWriteGuard<'_, SharedRecords>, CoreError> {
        self.records.write().map_err(|_| CoreError::LockPoisoned)
    }

    /// Reload every remote collection. Failures keep current data and
    /// raise one toast each; the returned list names them.
    pub fn refresh(&self) -> Result<Vec<&'static str>, CoreError> {
        let ctx = self.ctx();
        let failed = self.write_records()?.load_all(&ctx);
        if !failed.is_empty() {
            tracing::warn!(failed = ?failed, "Some collections could not be loaded");
        }
        Ok(failed)
    }

    // ── Session ─────────────────────────────────────────────

    /// Current session; forwards its token to the backend.
    pub fn session(&self) -> Result<Session, Redirect> {
        let session = Session::load(&self.local)?;
        self.backend.set_token(Some(session.token.clone()));
        Ok(session)
    }

    pub fn login(&self, token: &str, user: &SessionUser) -> Result<Session, CoreError> {
        Session::save(&self.local, token, user)?;
        self.backend.set_token(Some(token.to_string()));
        Ok(Session {
            token: token.to_string(),
            user: Some(user.clone()),
        })
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        Session::clear(&self.local)?;
        self.backend.set_token(None);
        tracing::info!("Session cleared");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

impl From<PersistError> for CoreError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Storage(e) => CoreError::Storage(e),
            PersistError::Flow(e) => CoreError::Flow(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Stage;

    fn jane() -> SessionUser {
        SessionUser {
            id: "U4".into(),
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            role: Role::Patient,
            patient_id: Some("P1".into()),
        }
    }

    #[test]
    fn in_memory_state_starts_seeded() {
        let state = CoreState::in_memory().unwrap();
        assert!(state.flow().is_empty());
        let records = state.read_records().unwrap();
        assert_eq!(records.doctors.len(), sample::doctors().len());
        assert!(records.lab_orders.is_empty());
    }

    #[test]
    fn flow_changes_are_autosaved_and_restored() {
        let local = Arc::new(LocalStore::open_in_memory().unwrap());
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new());
        {
            let state =
                CoreState::new(backend.clone(), local.clone(), TransitionPolicy::default()).unwrap();
            let record = state.flow().register("Jane Doe", "jane@x.com", Some("P1")).unwrap();
            state.flow().move_stage(&record.id, Stage::Triage, None).unwrap();
        }
        let state = CoreState::new(backend, local, TransitionPolicy::default()).unwrap();
        let records = state.flow().list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].current_stage, Stage::Triage);
    }

    #[test]
    fn refresh_reports_failures_and_keeps_seed() {
        let backend = Arc::new(MockBackend::new());
        let state = CoreState::new(
            backend.clone(),
            Arc::new(LocalStore::open_in_memory().unwrap()),
            TransitionPolicy::default(),
        )
        .unwrap();

        assert!(state.refresh().unwrap().is_empty());

        backend.set_offline(true);
        let failed = state.refresh().unwrap();
        assert!(failed.contains(&"doctor"));
        assert_eq!(state.read_records().unwrap().doctors.len(), sample::doctors().len());
        assert!(!state.toasts().is_empty());
    }

    #[test]
    fn login_then_logout() {
        let state = CoreState::in_memory().unwrap();
        assert_eq!(state.session(), Err(Redirect::Login));
        state.login("tok", &jane()).unwrap();
        assert_eq!(state.session().unwrap().user, Some(jane()));
        state.logout().unwrap();
        assert!(state.session().is_err());
    }
}
