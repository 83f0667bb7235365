//! Reception: registration, appointments, and the front-desk queue.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::{FlowRecord, Stage};
use crate::models::{new_id, Appointment, AppointmentStatus, Patient};

/// Registration form.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub gender: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionSummary {
    pub waiting: usize,
    pub registered_today: usize,
    pub appointments_today: usize,
}

pub struct ReceptionDashboard<'a> {
    view: View<'a>,
}

impl<'a> ReceptionDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Reception)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    /// Create the patient record, then open a visit at reception linked
    /// to it by patient id. Nothing is opened if the patient save fails.
    pub fn register_patient(&self, form: NewPatient) -> Result<(Patient, FlowRecord), DashboardError> {
        require("patient name", &form.name)?;
        require("patient email", &form.email)?;

        let patient = Patient {
            id: new_id(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone,
            age: form.age,
            gender: form.gender,
            condition: form.condition.filter(|c| !c.trim().is_empty()),
            assigned_doctor_id: None,
            registered_at: Utc::now(),
        };
        let patient = {
            let mut records = self.view.records_mut()?;
            records.patients.create(&self.view.ctx(), patient)?
        };

        let visit = self
            .view
            .state()
            .flow()
            .register(&patient.name, &patient.email, Some(&patient.id))?;
        tracing::info!(patient_id = %patient.id, flow_id = %visit.id, "Patient registered");
        Ok((patient, visit))
    }

    /// Open a new visit for an already registered patient.
    pub fn check_in(&self, patient_id: &str) -> Result<FlowRecord, DashboardError> {
        let patient = {
            let records = self.view.records()?;
            records.patients.get(patient_id).cloned().ok_or_else(|| DashboardError::NotFound {
                kind: "patient",
                id: patient_id.to_string(),
            })?
        };
        Ok(self
            .view
            .state()
            .flow()
            .register(&patient.name, &patient.email, Some(&patient.id))?)
    }

    pub fn book_appointment(
        &self,
        patient_id: &str,
        doctor_id: &str,
        scheduled_for: DateTime<Utc>,
        reason: &str,
    ) -> Result<Appointment, DashboardError> {
        let mut records = self.view.records_mut()?;
        let patient = records.patients.get(patient_id).ok_or_else(|| DashboardError::NotFound {
            kind: "patient",
            id: patient_id.to_string(),
        })?;
        let doctor = records.doctors.get(doctor_id).ok_or_else(|| DashboardError::NotFound {
            kind: "doctor",
            id: doctor_id.to_string(),
        })?;
        if !doctor.available {
            return Err(DashboardError::Invalid(format!("{} is not taking appointments", doctor.name)));
        }

        let appointment = Appointment {
            id: new_id(),
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            doctor_id: doctor.id.clone(),
            doctor_name: doctor.name.clone(),
            scheduled_for,
            reason: reason.trim().to_string(),
            status: AppointmentStatus::Scheduled,
        };
        Ok(records.appointments.create(&self.view.ctx(), appointment)?)
    }

    pub fn cancel_appointment(&self, id: &str) -> Result<Appointment, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records
            .appointments
            .modify(&self.view.ctx(), id, |a| a.status = AppointmentStatus::Cancelled)?)
    }

    pub fn send_to_triage(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Triage, notes)?)
    }

    /// Visits waiting at reception, oldest first.
    pub fn queue(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Reception)
    }

    pub fn patients(&self, query: &str) -> Result<Vec<Patient>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.patients.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn summary(&self) -> Result<ReceptionSummary, DashboardError> {
        let today = Utc::now().date_naive();
        let records = self.view.records()?;
        Ok(ReceptionSummary {
            waiting: self.queue().len(),
            registered_today: records
                .patients
                .items()
                .iter()
                .filter(|p| p.registered_at.date_naive() == today)
                .count(),
            appointments_today: records
                .appointments
                .items()
                .iter()
                .filter(|a| a.scheduled_for.date_naive() == today)
                .count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::testing;
    use crate::models::Role;
    use chrono::Duration;

    fn form(name: &str, email: &str) -> NewPatient {
        NewPatient {
            name: name.into(),
            email: email.into(),
            age: 40,
            ..Default::default()
        }
    }

    #[test]
    fn registration_creates_patient_and_linked_visit() {
        let state = testing::staff(Role::Reception);
        let reception = ReceptionDashboard::mount(&state).unwrap();
        let (patient, visit) = reception.register_patient(form(" Ali Khan ", "ali@x.com")).unwrap();

        assert_eq!(patient.name, "Ali Khan");
        assert_eq!(visit.patient_id.as_deref(), Some(patient.id.as_str()));
        assert_eq!(visit.current_stage, Stage::Reception);
        assert_eq!(reception.queue().len(), 1);
        assert_eq!(reception.summary().unwrap().registered_today, 1);
    }

    #[test]
    fn failed_patient_save_opens_no_visit() {
        let (state, backend) = testing::with_mock(Role::Reception);
        let reception = ReceptionDashboard::mount(&state).unwrap();
        backend.set_offline(true);
        assert!(reception.register_patient(form("Ali Khan", "ali@x.com")).is_err());
        assert!(state.flow().is_empty());
    }

    #[test]
    fn send_to_triage_moves_and_notifies() {
        let state = testing::staff(Role::Reception);
        let reception = ReceptionDashboard::mount(&state).unwrap();
        let (_, visit) = reception.register_patient(form("Ali Khan", "ali@x.com")).unwrap();
        let before = reception.view().revision();

        let moved = reception.send_to_triage(&visit.id, Some("walk-in")).unwrap();
        assert_eq!(moved.current_stage, Stage::Triage);
        assert!(reception.queue().is_empty());
        assert_eq!(reception.view().revision(), before + 1);
    }

    #[test]
    fn book_appointment_checks_patient_and_doctor() {
        let state = testing::staff(Role::Reception);
        let reception = ReceptionDashboard::mount(&state).unwrap();
        let when = Utc::now() + Duration::hours(1);

        let booked = reception.book_appointment("P3", "D3", when, "check-up").unwrap();
        assert_eq!(booked.doctor_name, "Dr. Mei Tanaka");
        assert_eq!(booked.status, AppointmentStatus::Scheduled);

        assert!(matches!(
            reception.book_appointment("P404", "D3", when, ""),
            Err(DashboardError::NotFound { kind: "patient", .. })
        ));
        // D4 is marked unavailable in the sample data.
        assert!(matches!(
            reception.book_appointment("P3", "D4", when, ""),
            Err(DashboardError::Invalid(_))
        ));
    }

    #[test]
    fn check_in_existing_patient() {
        let state = testing::staff(Role::Reception);
        let reception = ReceptionDashboard::mount(&state).unwrap();
        let visit = reception.check_in("P1").unwrap();
        assert_eq!(visit.email, "jane@x.com");
        assert!(reception.check_in("P404").is_err());
    }
}
