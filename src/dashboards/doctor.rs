//! Doctor: appointments, consultations, prescriptions and orders.

use chrono::Utc;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::linking::same_key;
use crate::flow::{FlowRecord, Stage};
use crate::models::{
    new_id, Appointment, AppointmentStatus, Doctor, LabOrder, LabOrderStatus, Prescription,
    PrescriptionStatus, Scan, ScanModality, ScanStatus,
};

/// Where a doctor can send a patient after a consultation.
pub const ROUTE_TARGETS: &[Stage] = &[
    Stage::Lab,
    Stage::Radiology,
    Stage::Billing,
    Stage::Pharmacy,
    Stage::Completed,
];

/// Prescription form.
#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u32,
    pub quantity: u32,
}

pub struct DoctorDashboard<'a> {
    view: View<'a>,
    doctor: Option<Doctor>,
}

impl<'a> DoctorDashboard<'a> {
    /// The logged-in account is matched to a doctor by email.
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        let view = View::mount(state, DashboardKind::Doctor)?;
        let doctor = match &view.session().user {
            Some(user) => view
                .records()?
                .doctors
                .items()
                .iter()
                .find(|d| same_key(&d.email, &user.email))
                .cloned(),
            None => None,
        };
        if doctor.is_none() {
            tracing::warn!("Logged-in account does not match any doctor");
        }
        Ok(Self { view, doctor })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    pub fn doctor(&self) -> Option<&Doctor> {
        self.doctor.as_ref()
    }

    fn doctor_id(&self) -> &str {
        self.doctor.as_ref().map_or("", |d| d.id.as_str())
    }

    /// Own appointments, soonest first. Empty when the account is unmatched.
    pub fn appointments(&self) -> Result<Vec<Appointment>, DashboardError> {
        let Some(doctor) = &self.doctor else {
            return Ok(Vec::new());
        };
        let records = self.view.records()?;
        let mut mine: Vec<Appointment> = records
            .appointments
            .items()
            .iter()
            .filter(|a| a.doctor_id == doctor.id)
            .cloned()
            .collect();
        mine.sort_by_key(|a| a.scheduled_for);
        Ok(mine)
    }

    pub fn set_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records
            .appointments
            .modify(&self.view.ctx(), id, |a| a.status = status)?)
    }

    /// Visits waiting for a doctor.
    pub fn waiting(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Doctor)
    }

    fn visit(&self, flow_id: &str) -> Result<FlowRecord, DashboardError> {
        self.view
            .state()
            .flow()
            .get(flow_id)
            .ok_or_else(|| DashboardError::NotFound {
                kind: "visit",
                id: flow_id.to_string(),
            })
    }

    /// Save the prescription record, then add it to the visit.
    pub fn prescribe(&self, flow_id: &str, form: NewPrescription) -> Result<Prescription, DashboardError> {
        require("medication", &form.medication)?;
        let visit = self.visit(flow_id)?;

        let prescription = Prescription {
            id: new_id(),
            patient_id: visit.patient_id.clone().unwrap_or_default(),
            patient_name: visit.name.clone(),
            flow_id: Some(visit.id.clone()),
            doctor_id: self.doctor_id().to_string(),
            medication: form.medication.trim().to_string(),
            dosage: form.dosage.trim().to_string(),
            frequency: form.frequency.trim().to_string(),
            duration_days: form.duration_days,
            quantity: form.quantity.max(1),
            status: PrescriptionStatus::Pending,
            prescribed_at: Utc::now(),
        };
        let prescription = {
            let mut records = self.view.records_mut()?;
            records.prescriptions.create(&self.view.ctx(), prescription)?
        };
        self.view
            .state()
            .flow()
            .add_prescription(flow_id, &prescription.label())?;
        Ok(prescription)
    }

    pub fn order_lab_test(&self, flow_id: &str, test_name: &str) -> Result<LabOrder, DashboardError> {
        require("test name", test_name)?;
        let visit = self.visit(flow_id)?;
        let order = LabOrder {
            id: new_id(),
            flow_id: visit.id.clone(),
            patient_name: visit.name,
            test_name: test_name.trim().to_string(),
            status: LabOrderStatus::Ordered,
            result: None,
            ordered_at: Utc::now(),
            completed_at: None,
        };
        let order = {
            let mut records = self.view.records_mut()?;
            records.lab_orders.create(&self.view.ctx(), order)?
        };
        self.view.state().flow().add_test(flow_id, &order.test_name)?;
        Ok(order)
    }

    pub fn order_scan(
        &self,
        flow_id: &str,
        modality: ScanModality,
        body_part: &str,
    ) -> Result<Scan, DashboardError> {
        require("body part", body_part)?;
        let visit = self.visit(flow_id)?;
        let scan = Scan {
            id: new_id(),
            flow_id: visit.id.clone(),
            patient_name: visit.name,
            modality,
            body_part: body_part.trim().to_string(),
            status: ScanStatus::Requested,
            scheduled_for: None,
            findings: None,
            requested_at: Utc::now(),
        };
        let scan = {
            let mut records = self.view.records_mut()?;
            records.scans.create(&self.view.ctx(), scan)?
        };
        self.view.state().flow().add_test(flow_id, &scan.test_label())?;
        Ok(scan)
    }

    /// Send the patient on after the consultation.
    pub fn route(&self, flow_id: &str, to: Stage, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        if !ROUTE_TARGETS.contains(&to) {
            return Err(DashboardError::Invalid(format!(
                "doctors cannot send patients to {}",
                to.as_str()
            )));
        }
        Ok(self.view.state().flow().move_stage(flow_id, to, notes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::testing;
    use crate::models::Role;

    fn amoxicillin() -> NewPrescription {
        NewPrescription {
            medication: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: "three times daily".into(),
            duration_days: 7,
            quantity: 21,
        }
    }

    fn with_visit(state: &CoreState) -> String {
        let record = state.flow().register("Jane Doe", "jane@x.com", Some("P1")).unwrap();
        state.flow().move_stage(&record.id, Stage::Doctor, None).unwrap();
        record.id
    }

    fn dr_okafor() -> CoreState {
        testing::logged_in(Role::Doctor, "Dr. Amara Okafor", "D1@wardflow.example")
    }

    #[test]
    fn account_resolves_to_doctor_and_appointments() {
        let state = dr_okafor();
        let doctor = DoctorDashboard::mount(&state).unwrap();
        assert_eq!(doctor.doctor().unwrap().id, "D1");
        let appointments = doctor.appointments().unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].patient_name, "Jane Doe");
    }

    #[test]
    fn unmatched_account_sees_no_appointments() {
        let state = testing::staff(Role::Doctor);
        let doctor = DoctorDashboard::mount(&state).unwrap();
        assert!(doctor.doctor().is_none());
        assert!(doctor.appointments().unwrap().is_empty());
    }

    #[test]
    fn prescribe_saves_record_and_updates_visit() {
        let state = dr_okafor();
        let doctor = DoctorDashboard::mount(&state).unwrap();
        let flow_id = with_visit(&state);

        let rx = doctor.prescribe(&flow_id, amoxicillin()).unwrap();
        assert_eq!(rx.patient_id, "P1");
        assert_eq!(rx.doctor_id, "D1");

        let visit = state.flow().get(&flow_id).unwrap();
        assert_eq!(visit.prescriptions, vec!["Amoxicillin 500mg".to_string()]);
        assert!(state.read_records().unwrap().prescriptions.get(&rx.id).is_some());
    }

    #[test]
    fn failed_prescription_save_leaves_visit_alone() {
        let (state, backend) = testing::with_mock(Role::Doctor);
        let doctor = DoctorDashboard::mount(&state).unwrap();
        let flow_id = with_visit(&state);
        let history = state.flow().get(&flow_id).unwrap().history.len();

        backend.set_offline(true);
        assert!(doctor.prescribe(&flow_id, amoxicillin()).is_err());
        let visit = state.flow().get(&flow_id).unwrap();
        assert!(visit.prescriptions.is_empty());
        assert_eq!(visit.history.len(), history);
    }

    #[test]
    fn orders_append_tests_to_visit() {
        let state = dr_okafor();
        let doctor = DoctorDashboard::mount(&state).unwrap();
        let flow_id = with_visit(&state);

        doctor.order_lab_test(&flow_id, "CBC").unwrap();
        doctor.order_scan(&flow_id, ScanModality::Mri, "knee").unwrap();

        let visit = state.flow().get(&flow_id).unwrap();
        assert_eq!(visit.tests, vec!["CBC".to_string(), "MRI knee".to_string()]);
    }

    #[test]
    fn route_limits_targets() {
        let state = dr_okafor();
        let doctor = DoctorDashboard::mount(&state).unwrap();
        let flow_id = with_visit(&state);

        assert!(matches!(
            doctor.route(&flow_id, Stage::Reception, None),
            Err(DashboardError::Invalid(_))
        ));
        let moved = doctor.route(&flow_id, Stage::Lab, Some("bloods")).unwrap();
        assert_eq!(moved.current_stage, Stage::Lab);
        assert!(doctor.waiting().is_empty());
    }

    #[test]
    fn missing_visit_is_not_found() {
        let state = dr_okafor();
        let doctor = DoctorDashboard::mount(&state).unwrap();
        assert!(matches!(
            doctor.order_lab_test("nope", "CBC"),
            Err(DashboardError::NotFound { .. })
        ));
        assert!(matches!(
            doctor.route("nope", Stage::Lab, None),
            Err(DashboardError::Flow(crate::flow::FlowError::NotFound(_)))
        ));
    }
}
