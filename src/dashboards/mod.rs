//! Role dashboards as view-models.
//!
//! A dashboard mounts against `CoreState`: it requires a session, loads
//! its display settings, and subscribes to the flow store for as long as
//! it lives. Dropping a dashboard unsubscribes it. All record state stays
//! in `CoreState`; dashboards only read and write through it.

pub mod admin;
pub mod billing;
pub mod doctor;
pub mod emergency;
pub mod lab;
pub mod patient;
pub mod pharmacy;
pub mod radiology;
pub mod reception;
pub mod surgery;
pub mod triage;

pub use admin::AdminDashboard;
pub use billing::BillingDashboard;
pub use doctor::DoctorDashboard;
pub use emergency::EmergencyDashboard;
pub use lab::LabDashboard;
pub use patient::PatientDashboard;
pub use pharmacy::PharmacyDashboard;
pub use radiology::RadiologyDashboard;
pub use reception::ReceptionDashboard;
pub use surgery::SurgeryDashboard;
pub use triage::TriageDashboard;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::core_state::{CoreError, CoreState, SharedRecords};
use crate::db::{Redirect, Session, StorageError};
use crate::flow::{FlowError, Subscription};
use crate::models::enums::str_enum;
use crate::models::Role;
use crate::records::{RecordError, WriteContext};

str_enum!(DashboardKind {
    Admin => "admin",
    Reception => "reception",
    Triage => "triage",
    Doctor => "doctor",
    Lab => "lab",
    Radiology => "radiology",
    Billing => "billing",
    Pharmacy => "pharmacy",
    Surgery => "surgery",
    Emergency => "emergency",
    Patient => "patient",
});

impl DashboardKind {
    /// Local-store key for this dashboard's display settings.
    pub fn settings_key(&self) -> String {
        format!("settings.{}", self.as_str())
    }

    /// Role whose landing page this dashboard is.
    pub fn role(&self) -> Role {
        match self {
            Self::Admin => Role::Admin,
            Self::Reception => Role::Reception,
            Self::Triage => Role::Triage,
            Self::Doctor => Role::Doctor,
            Self::Lab => Role::Lab,
            Self::Radiology => Role::Radiology,
            Self::Billing => Role::Billing,
            Self::Pharmacy => Role::Pharmacy,
            Self::Surgery => Role::Surgery,
            Self::Emergency => Role::Emergency,
            Self::Patient => Role::Patient,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Redirect to {}", .0.route())]
    Redirect(#[from] Redirect),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Invalid input: {0}")]
    Invalid(String),
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), DashboardError> {
    if value.trim().is_empty() {
        return Err(DashboardError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn ensure_id(id: &mut String) {
    if id.trim().is_empty() {
        *id = crate::models::new_id();
    }
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Per-dashboard display preferences, stored under `settings.<dashboard>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub page_size: usize,
    pub compact: bool,
    /// Pre-filled search box.
    pub default_query: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            compact: false,
            default_query: String::new(),
        }
    }
}

impl DashboardSettings {
    /// Malformed or missing settings fall back to defaults.
    pub fn load(local: &crate::db::LocalStore, kind: DashboardKind) -> Self {
        let mut settings: Self = local.load_or_default(&kind.settings_key());
        if settings.page_size == 0 {
            settings.page_size = DEFAULT_PAGE_SIZE;
        }
        settings
    }

    pub fn save(&self, local: &crate::db::LocalStore, kind: DashboardKind) -> Result<(), StorageError> {
        local.set_json(&kind.settings_key(), self)
    }
}

/// One page of a filtered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

// ═══════════════════════════════════════════════════════════
// View: what every mounted dashboard holds
// ═══════════════════════════════════════════════════════════

pub struct View<'a> {
    state: &'a CoreState,
    kind: DashboardKind,
    session: Session,
    settings: DashboardSettings,
    revision: Arc<AtomicU64>,
    _subscription: Subscription,
}

impl<'a> View<'a> {
    /// Check the session, load settings, subscribe to the flow store.
    pub fn mount(state: &'a CoreState, kind: DashboardKind) -> Result<Self, DashboardError> {
        let session = state.session().inspect_err(|_| {
            tracing::info!(dashboard = kind.as_str(), "No session, redirecting to login");
        })?;
        let settings = DashboardSettings::load(state.local(), kind);

        let revision = Arc::new(AtomicU64::new(0));
        let counter = revision.clone();
        let subscription = state.flow().subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tracing::debug!(dashboard = kind.as_str(), "Dashboard mounted");
        Ok(Self {
            state,
            kind,
            session,
            settings,
            revision,
            _subscription: subscription,
        })
    }

    pub fn state(&self) -> &'a CoreState {
        self.state
    }

    pub fn kind(&self) -> DashboardKind {
        self.kind
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Flow notifications received since mount; a UI re-renders when it moves.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn update_settings(
        &mut self,
        change: impl FnOnce(&mut DashboardSettings),
    ) -> Result<(), DashboardError> {
        let mut settings = self.settings.clone();
        change(&mut settings);
        if settings.page_size == 0 {
            return Err(DashboardError::Invalid("page size must be positive".into()));
        }
        settings.save(self.state.local(), self.kind)?;
        self.settings = settings;
        Ok(())
    }

    /// Empty input means the stored default query.
    pub fn query<'q>(&'q self, input: &'q str) -> &'q str {
        if input.trim().is_empty() {
            &self.settings.default_query
        } else {
            input
        }
    }

    /// A page past the end comes back empty.
    pub fn paginate<T>(&self, items: Vec<T>, page: usize) -> Page<T> {
        let size = self.settings.page_size.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(size);
        let items = items
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();
        Page {
            items,
            page,
            total_pages,
            total_items,
        }
    }

    pub fn records(&self) -> Result<RwLockReadGuard<'a, SharedRecords>, DashboardError> {
        Ok(self.state.read_records()?)
    }

    pub fn records_mut(&self) -> Result<RwLockWriteGuard<'a, SharedRecords>, DashboardError> {
        Ok(self.state.write_records()?)
    }

    pub fn ctx(&self) -> WriteContext<'a> {
        self.state.ctx()
    }
}

impl Drop for View<'_> {
    fn drop(&mut self) {
        tracing::debug!(dashboard = self.kind.as_str(), "Dashboard unmounted");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend::MockBackend;
    use crate::db::{LocalStore, SessionUser};
    use crate::flow::TransitionPolicy;

    /// In-memory state with a logged-in user of `role`.
    pub fn logged_in(role: Role, name: &str, email: &str) -> CoreState {
        let state = CoreState::in_memory().unwrap();
        state
            .login(
                "test-token",
                &SessionUser {
                    id: "U-test".into(),
                    name: name.into(),
                    email: email.into(),
                    role,
                    patient_id: None,
                },
            )
            .unwrap();
        state
    }

    pub fn staff(role: Role) -> CoreState {
        logged_in(role, "Staff Member", "staff@wardflow.example")
    }

    /// Logged-in staff state plus a handle to toggle the mock backend.
    pub fn with_mock(role: Role) -> (CoreState, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let state = CoreState::new(
            backend.clone(),
            Arc::new(LocalStore::open_in_memory().unwrap()),
            TransitionPolicy::default(),
        )
        .unwrap();
        state
            .login(
                "test-token",
                &SessionUser {
                    id: "U-test".into(),
                    name: "Staff Member".into(),
                    email: "staff@wardflow.example".into(),
                    role,
                    patient_id: None,
                },
            )
            .unwrap();
        (state, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn mount_without_session_redirects() {
        let state = CoreState::in_memory().unwrap();
        let err = View::mount(&state, DashboardKind::Admin).err().unwrap();
        assert!(matches!(err, DashboardError::Redirect(Redirect::Login)));
        assert_eq!(state.flow().subscriber_count(), 1);
    }

    #[test]
    fn view_subscribes_on_mount_and_unsubscribes_on_drop() {
        let state = testing::staff(Role::Reception);
        let before = state.flow().subscriber_count();
        let view = View::mount(&state, DashboardKind::Reception).unwrap();
        assert_eq!(state.flow().subscriber_count(), before + 1);

        state.flow().register("Jane Doe", "jane@x.com", None).unwrap();
        assert_eq!(view.revision(), 1);

        drop(view);
        assert_eq!(state.flow().subscriber_count(), before);
    }

    #[test]
    fn settings_round_trip_and_malformed_fallback() {
        let state = testing::staff(Role::Admin);
        let mut view = View::mount(&state, DashboardKind::Admin).unwrap();
        assert_eq!(view.settings(), &DashboardSettings::default());
        view.update_settings(|s| {
            s.page_size = 25;
            s.default_query = "cardio".into();
        })
        .unwrap();
        drop(view);

        let view = View::mount(&state, DashboardKind::Admin).unwrap();
        assert_eq!(view.settings().page_size, 25);
        assert_eq!(view.query(""), "cardio");
        assert_eq!(view.query("ortho"), "ortho");
        drop(view);

        state.local().set_raw("settings.admin", "{\"pageSize\":").unwrap();
        let view = View::mount(&state, DashboardKind::Admin).unwrap();
        assert_eq!(view.settings(), &DashboardSettings::default());
    }

    #[test]
    fn zero_page_size_rejected() {
        let state = testing::staff(Role::Lab);
        let mut view = View::mount(&state, DashboardKind::Lab).unwrap();
        assert!(view.update_settings(|s| s.page_size = 0).is_err());
        assert_eq!(view.settings().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn paginate_splits_pages() {
        let state = testing::staff(Role::Admin);
        let view = View::mount(&state, DashboardKind::Admin).unwrap();
        let page = view.paginate((0..23).collect::<Vec<_>>(), 2);
        assert_eq!(page.items, vec![20, 21, 22]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 23);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let state = testing::staff(Role::Admin);
        let view = View::mount(&state, DashboardKind::Admin).unwrap();
        let page = view.paginate(vec![1, 2, 3], 5);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);

        let page = view.paginate(vec![1, 2, 3], usize::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.page, usize::MAX);
    }

    #[test]
    fn every_kind_has_a_settings_key_and_role() {
        assert_eq!(DashboardKind::ALL.len(), 11);
        for kind in DashboardKind::ALL {
            assert_eq!(kind.settings_key(), format!("settings.{}", kind.as_str()));
            assert_eq!(kind.role().as_str(), kind.as_str());
        }
    }
}
