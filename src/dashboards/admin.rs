//! Admin dashboard: staff, patients, departments, user accounts.

use serde::Serialize;

use super::{ensure_id, require, DashboardError, DashboardKind, View};
use crate::core_state::{CoreState, SharedRecords};
use crate::models::{
    sum_cents, DashboardStats, Department, Disease, Doctor, Patient, PaymentStatus, User,
};

/// Where the headline numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    Backend,
    /// `/dashboard/stats` failed; counted from the local collections.
    Local,
}

pub struct AdminDashboard<'a> {
    view: View<'a>,
}

impl<'a> AdminDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Admin)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View<'a> {
        &mut self.view
    }

    /// Summary cards. Falls back to local counts when the backend fails.
    pub fn stats(&self) -> Result<(DashboardStats, StatsSource), DashboardError> {
        match self.view.state().backend().stats() {
            Ok(stats) => Ok((stats, StatsSource::Backend)),
            Err(e) => {
                tracing::warn!(error = %e, "Stats unavailable, counting locally");
                let records = self.view.records()?;
                Ok((local_stats(&records), StatsSource::Local))
            }
        }
    }

    // ── Tables ──────────────────────────────────────────────

    pub fn doctors(&self, query: &str) -> Result<Vec<Doctor>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.doctors.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn patients(&self, query: &str) -> Result<Vec<Patient>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.patients.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn departments(&self, query: &str) -> Result<Vec<Department>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .departments
            .search(self.view.query(query))
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn users(&self, query: &str) -> Result<Vec<User>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.users.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn diseases(&self, query: &str) -> Result<Vec<Disease>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.diseases.search(self.view.query(query)).into_iter().cloned().collect())
    }

    /// Reload every table from the backend.
    pub fn refresh(&self) -> Result<Vec<&'static str>, DashboardError> {
        Ok(self.view.state().refresh()?)
    }

    // ── Doctors ─────────────────────────────────────────────

    pub fn add_doctor(&self, mut doctor: Doctor) -> Result<Doctor, DashboardError> {
        require("doctor name", &doctor.name)?;
        require("doctor email", &doctor.email)?;
        ensure_id(&mut doctor.id);
        let mut records = self.view.records_mut()?;
        Ok(records.doctors.create(&self.view.ctx(), doctor)?)
    }

    pub fn update_doctor(&self, doctor: Doctor) -> Result<Doctor, DashboardError> {
        require("doctor name", &doctor.name)?;
        let mut records = self.view.records_mut()?;
        Ok(records.doctors.update(&self.view.ctx(), doctor)?)
    }

    pub fn set_doctor_available(&self, id: &str, available: bool) -> Result<Doctor, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records
            .doctors
            .modify(&self.view.ctx(), id, |doctor| doctor.available = available)?)
    }

    pub fn delete_doctor(&self, id: &str) -> Result<Doctor, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.doctors.delete(&self.view.ctx(), id)?)
    }

    // ── Patients ────────────────────────────────────────────

    pub fn add_patient(&self, mut patient: Patient) -> Result<Patient, DashboardError> {
        require("patient name", &patient.name)?;
        ensure_id(&mut patient.id);
        let mut records = self.view.records_mut()?;
        Ok(records.patients.create(&self.view.ctx(), patient)?)
    }

    pub fn update_patient(&self, patient: Patient) -> Result<Patient, DashboardError> {
        require("patient name", &patient.name)?;
        let mut records = self.view.records_mut()?;
        Ok(records.patients.update(&self.view.ctx(), patient)?)
    }

    pub fn assign_doctor(&self, patient_id: &str, doctor_id: &str) -> Result<Patient, DashboardError> {
        let mut records = self.view.records_mut()?;
        if records.doctors.get(doctor_id).is_none() {
            return Err(DashboardError::NotFound {
                kind: "doctor",
                id: doctor_id.to_string(),
            });
        }
        Ok(records.patients.modify(&self.view.ctx(), patient_id, |patient| {
            patient.assigned_doctor_id = Some(doctor_id.to_string())
        })?)
    }

    pub fn delete_patient(&self, id: &str) -> Result<Patient, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.patients.delete(&self.view.ctx(), id)?)
    }

    // ── Departments ─────────────────────────────────────────

    pub fn add_department(&self, mut department: Department) -> Result<Department, DashboardError> {
        require("department name", &department.name)?;
        ensure_id(&mut department.id);
        let mut records = self.view.records_mut()?;
        let duplicate = records
            .departments
            .items()
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(department.name.trim()));
        if duplicate {
            return Err(DashboardError::Invalid(format!(
                "department {} already exists",
                department.name
            )));
        }
        Ok(records.departments.create(&self.view.ctx(), department)?)
    }

    pub fn update_department(&self, department: Department) -> Result<Department, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.departments.update(&self.view.ctx(), department)?)
    }

    pub fn delete_department(&self, id: &str) -> Result<Department, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.departments.delete(&self.view.ctx(), id)?)
    }

    // ── Users ───────────────────────────────────────────────

    pub fn add_user(&self, mut user: User) -> Result<User, DashboardError> {
        require("user name", &user.name)?;
        require("user email", &user.email)?;
        ensure_id(&mut user.id);
        let mut records = self.view.records_mut()?;
        let taken = records
            .users
            .items()
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(user.email.trim()));
        if taken {
            return Err(DashboardError::Invalid(format!("email {} is already in use", user.email)));
        }
        Ok(records.users.create(&self.view.ctx(), user)?)
    }

    pub fn set_user_active(&self, id: &str, active: bool) -> Result<User, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.users.modify(&self.view.ctx(), id, |user| user.active = active)?)
    }

    pub fn delete_user(&self, id: &str) -> Result<User, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.users.delete(&self.view.ctx(), id)?)
    }
}

fn local_stats(records: &SharedRecords) -> DashboardStats {
    DashboardStats {
        total_patients: records.patients.len() as u64,
        total_doctors: records.doctors.len() as u64,
        total_appointments: records.appointments.len() as u64,
        total_departments: records.departments.len() as u64,
        revenue_cents: sum_cents(
            records
                .bills
                .items()
                .iter()
                .filter(|item| item.status == PaymentStatus::Paid)
                .map(|item| item.line_total_cents()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sample;
    use crate::dashboards::testing;
    use crate::models::Role;
    use crate::records::{RecordError, SyncStatus};

    fn doctor(name: &str) -> Doctor {
        Doctor {
            id: String::new(),
            name: name.into(),
            email: format!("{}@wardflow.example", name.to_lowercase().replace(' ', ".")),
            specialty: "neurology".into(),
            department: "Neurology".into(),
            phone: String::new(),
            available: true,
        }
    }

    #[test]
    fn stats_come_from_backend() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        let (stats, source) = admin.stats().unwrap();
        assert_eq!(source, StatsSource::Backend);
        assert_eq!(stats.total_doctors, sample::doctors().len() as u64);
    }

    #[test]
    fn add_search_and_delete_doctor() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        let created = admin.add_doctor(doctor("Nadia Farouk")).unwrap();
        assert!(!created.id.is_empty());

        let hits = admin.doctors("NADIA").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, created.id);

        admin.delete_doctor(&created.id).unwrap();
        assert!(admin.doctors("nadia").unwrap().is_empty());
    }

    #[test]
    fn blank_doctor_name_rejected() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        assert!(matches!(
            admin.add_doctor(doctor("  ")),
            Err(DashboardError::Invalid(_))
        ));
    }

    #[test]
    fn duplicate_department_and_email_rejected() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        let cardiology = Department {
            id: String::new(),
            name: "cardiology".into(),
            head: None,
            beds: 4,
        };
        assert!(matches!(admin.add_department(cardiology), Err(DashboardError::Invalid(_))));

        let user = User {
            id: String::new(),
            name: "Someone".into(),
            email: "JANE@x.com".into(),
            role: Role::Patient,
            active: true,
        };
        assert!(matches!(admin.add_user(user), Err(DashboardError::Invalid(_))));
    }

    #[test]
    fn assign_doctor_requires_known_doctor() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        assert!(matches!(
            admin.assign_doctor("P1", "D404"),
            Err(DashboardError::NotFound { kind: "doctor", .. })
        ));
        let patient = admin.assign_doctor("P1", "D2").unwrap();
        assert_eq!(patient.assigned_doctor_id.as_deref(), Some("D2"));
    }

    #[test]
    fn deactivate_user() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        let user = admin.set_user_active("U5", false).unwrap();
        assert!(!user.active);
        assert!(!admin.users("pharm").unwrap()[0].active);
    }

    #[test]
    fn missing_record_is_record_not_found() {
        let state = testing::staff(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        assert!(matches!(
            admin.delete_user("nope"),
            Err(DashboardError::Record(RecordError::NotFound { .. }))
        ));
        assert_eq!(state.read_records().unwrap().users.status(), &SyncStatus::Synced);
    }

    #[test]
    fn stats_fall_back_to_local_counts() {
        let (state, backend) = testing::with_mock(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        backend.set_offline(true);
        let (stats, source) = admin.stats().unwrap();
        assert_eq!(source, StatsSource::Local);
        assert_eq!(stats.total_departments, sample::departments().len() as u64);
    }

    #[test]
    fn failed_create_marks_out_of_sync_and_changes_nothing() {
        let (state, backend) = testing::with_mock(Role::Admin);
        let admin = AdminDashboard::mount(&state).unwrap();
        backend.set_offline(true);
        let before = admin.doctors("").unwrap().len();
        assert!(admin.add_doctor(doctor("Nadia Farouk")).is_err());
        assert_eq!(admin.doctors("").unwrap().len(), before);
        assert!(matches!(
            state.read_records().unwrap().doctors.status(),
            SyncStatus::OutOfSync { operation, .. } if operation == "create"
        ));
    }

    #[test]
    fn settings_default_query_filters_tables() {
        let state = testing::staff(Role::Admin);
        let mut admin = AdminDashboard::mount(&state).unwrap();
        admin
            .view_mut()
            .update_settings(|s| s.default_query = "hypertension".into())
            .unwrap();
        let diseases = admin.diseases("").unwrap();
        assert_eq!(diseases.len(), 1);
        assert_eq!(diseases[0].code, "I10");
    }
}
