//! Patient portal: the logged-in patient's own visit and records.
//!
//! Nothing here fails just because no visit or patient record matches the
//! session; the views come back empty instead.

use serde::Serialize;

use super::{DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::db::SessionUser;
use crate::flow::linking::same_key;
use crate::flow::{LinkMatch, LinkedRecord, Stage};
use crate::models::{Appointment, BillItem, Invoice, Patient, Prescription};

/// Shown in place of the visit card when nothing is linked.
pub const NO_LINKED_RECORD: &str = "No active visit is linked to your account yet.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStatus {
    pub flow_id: String,
    pub stage: Stage,
    pub department: &'static str,
    pub message: String,
    /// False when the visit was matched by email or name only.
    pub exact_match: bool,
}

pub struct PatientDashboard<'a> {
    view: View<'a>,
}

impl<'a> PatientDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Patient)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    fn user(&self) -> Option<&SessionUser> {
        self.view.session().user.as_ref()
    }

    /// The visit belonging to the session user, if any.
    pub fn linked(&self) -> Option<LinkedRecord> {
        let user = self.user()?;
        self.view.state().flow().find_linked(&user.identity())
    }

    pub fn status(&self) -> Option<VisitStatus> {
        let linked = self.linked()?;
        let stage = linked.record.current_stage;
        let message = match stage {
            Stage::Completed => "Your visit is complete.".to_string(),
            _ => format!("You are currently with {}.", stage.department()),
        };
        Some(VisitStatus {
            flow_id: linked.record.id,
            stage,
            department: stage.department(),
            message,
            exact_match: linked.matched_by == LinkMatch::PatientId,
        })
    }

    pub fn status_text(&self) -> String {
        self.status()
            .map(|status| status.message)
            .unwrap_or_else(|| NO_LINKED_RECORD.to_string())
    }

    /// The patient record: session id, then the visit's id, then
    /// case-insensitive email or name.
    pub fn patient(&self) -> Result<Option<Patient>, DashboardError> {
        let Some(user) = self.user() else {
            return Ok(None);
        };
        let visit_patient_id = self.linked().and_then(|l| l.record.patient_id);
        let records = self.view.records()?;
        let patients = records.patients.items();

        let by_id = user
            .patient_id
            .as_deref()
            .or(visit_patient_id.as_deref())
            .and_then(|id| patients.iter().find(|p| p.id == id));
        let found = by_id
            .or_else(|| {
                patients
                    .iter()
                    .find(|p| !user.email.trim().is_empty() && same_key(&p.email, &user.email))
            })
            .or_else(|| {
                patients
                    .iter()
                    .find(|p| same_key(&p.name, &user.name))
            });
        Ok(found.cloned())
    }

    pub fn appointments(&self) -> Result<Vec<Appointment>, DashboardError> {
        let Some(patient) = self.patient()? else {
            return Ok(Vec::new());
        };
        let records = self.view.records()?;
        let mut own: Vec<Appointment> = records
            .appointments
            .items()
            .iter()
            .filter(|a| owns(&patient, &a.patient_id, &a.patient_name))
            .cloned()
            .collect();
        own.sort_by_key(|a| a.scheduled_for);
        Ok(own)
    }

    pub fn prescriptions(&self) -> Result<Vec<Prescription>, DashboardError> {
        let Some(patient) = self.patient()? else {
            return Ok(Vec::new());
        };
        let records = self.view.records()?;
        Ok(records
            .prescriptions
            .items()
            .iter()
            .filter(|rx| owns(&patient, &rx.patient_id, &rx.patient_name))
            .cloned()
            .collect())
    }

    pub fn bills(&self) -> Result<Vec<BillItem>, DashboardError> {
        let Some(patient) = self.patient()? else {
            return Ok(Vec::new());
        };
        let records = self.view.records()?;
        Ok(records
            .bills
            .items()
            .iter()
            .filter(|item| owns(&patient, &item.patient_id, &item.patient_name))
            .cloned()
            .collect())
    }

    pub fn invoice(&self) -> Result<Option<Invoice>, DashboardError> {
        let Some(patient) = self.patient()? else {
            return Ok(None);
        };
        let bills = self.bills()?;
        Ok(Some(Invoice::compute(&patient.id, &bills, 0)))
    }
}

fn owns(patient: &Patient, patient_id: &str, patient_name: &str) -> bool {
    patient_id == patient.id || same_key(patient_name, &patient.name)
}
