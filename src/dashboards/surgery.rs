//! Surgery: theatre schedule and procedure status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::models::{new_id, Surgery, SurgeryStatus};

/// Form for booking a procedure.
#[derive(Debug, Clone)]
pub struct NewSurgery {
    pub patient_id: String,
    pub surgeon_id: String,
    pub procedure: String,
    pub theatre: String,
    pub scheduled_for: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurgerySummary {
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub today: usize,
}

/// Allowed status changes. Completed and cancelled are final.
fn can_move(from: SurgeryStatus, to: SurgeryStatus) -> bool {
    use SurgeryStatus::*;
    matches!(
        (from, to),
        (Scheduled, InProgress)
            | (Scheduled, Postponed)
            | (Scheduled, Cancelled)
            | (InProgress, Completed)
            | (Postponed, Scheduled)
            | (Postponed, Cancelled)
    )
}

pub struct SurgeryDashboard<'a> {
    view: View<'a>,
}

impl<'a> SurgeryDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Surgery)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    /// Schedule sorted by start time.
    pub fn surgeries(&self, query: &str) -> Result<Vec<Surgery>, DashboardError> {
        let records = self.view.records()?;
        let mut list: Vec<Surgery> = records
            .surgeries
            .search(self.view.query(query))
            .into_iter()
            .cloned()
            .collect();
        list.sort_by_key(|s| s.scheduled_for);
        Ok(list)
    }

    pub fn on(&self, day: NaiveDate) -> Result<Vec<Surgery>, DashboardError> {
        Ok(self
            .surgeries("")?
            .into_iter()
            .filter(|s| s.scheduled_for.date_naive() == day && s.status != SurgeryStatus::Cancelled)
            .collect())
    }

    pub fn todays(&self) -> Result<Vec<Surgery>, DashboardError> {
        self.on(Utc::now().date_naive())
    }

    pub fn schedule(&self, form: NewSurgery) -> Result<Surgery, DashboardError> {
        require("procedure", &form.procedure)?;
        require("theatre", &form.theatre)?;
        let mut records = self.view.records_mut()?;

        let patient_name = records
            .patients
            .get(&form.patient_id)
            .map(|p| p.name.clone())
            .ok_or_else(|| DashboardError::NotFound {
                kind: "patient",
                id: form.patient_id.clone(),
            })?;
        let surgeon_name = records
            .doctors
            .get(&form.surgeon_id)
            .map(|d| d.name.clone())
            .ok_or_else(|| DashboardError::NotFound {
                kind: "doctor",
                id: form.surgeon_id.clone(),
            })?;

        let theatre = form.theatre.trim().to_string();
        let clash = records.surgeries.items().iter().any(|s| {
            s.theatre.eq_ignore_ascii_case(&theatre)
                && s.scheduled_for == form.scheduled_for
                && matches!(s.status, SurgeryStatus::Scheduled | SurgeryStatus::InProgress)
        });
        if clash {
            return Err(DashboardError::Invalid(format!(
                "{theatre} is already booked at {}",
                form.scheduled_for.format("%Y-%m-%d %H:%M")
            )));
        }

        let surgery = Surgery {
            id: new_id(),
            patient_id: form.patient_id,
            patient_name,
            procedure: form.procedure.trim().to_string(),
            surgeon_id: form.surgeon_id,
            surgeon_name,
            theatre,
            scheduled_for: form.scheduled_for,
            status: SurgeryStatus::Scheduled,
            notes: form.notes,
        };
        Ok(records.surgeries.create(&self.view.ctx(), surgery)?)
    }

    /// Move to a new time; a postponed surgery becomes scheduled again.
    pub fn reschedule(&self, id: &str, when: DateTime<Utc>) -> Result<Surgery, DashboardError> {
        let current = self.find(id)?;
        if !matches!(current.status, SurgeryStatus::Scheduled | SurgeryStatus::Postponed) {
            return Err(DashboardError::Invalid(format!(
                "cannot reschedule a {} surgery",
                current.status
            )));
        }
        let mut records = self.view.records_mut()?;
        Ok(records.surgeries.modify(&self.view.ctx(), id, |s| {
            s.scheduled_for = when;
            s.status = SurgeryStatus::Scheduled;
        })?)
    }

    pub fn set_status(&self, id: &str, status: SurgeryStatus) -> Result<Surgery, DashboardError> {
        let current = self.find(id)?;
        if !can_move(current.status, status) {
            return Err(DashboardError::Invalid(format!(
                "surgery cannot go from {} to {status}",
                current.status
            )));
        }
        let mut records = self.view.records_mut()?;
        let surgery = records
            .surgeries
            .modify(&self.view.ctx(), id, |s| s.status = status)?;
        tracing::info!(surgery = id, status = status.as_str(), "Surgery status changed");
        Ok(surgery)
    }

    pub fn cancel(&self, id: &str) -> Result<Surgery, DashboardError> {
        self.set_status(id, SurgeryStatus::Cancelled)
    }

    pub fn delete(&self, id: &str) -> Result<Surgery, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.surgeries.delete(&self.view.ctx(), id)?)
    }

    pub fn summary(&self) -> Result<SurgerySummary, DashboardError> {
        let all = self.surgeries("")?;
        let count = |status: SurgeryStatus| all.iter().filter(|s| s.status == status).count();
        Ok(SurgerySummary {
            scheduled: count(SurgeryStatus::Scheduled),
            in_progress: count(SurgeryStatus::InProgress),
            completed: count(SurgeryStatus::Completed),
            today: self.todays()?.len(),
        })
    }

    fn find(&self, id: &str) -> Result<Surgery, DashboardError> {
        let records = self.view.records()?;
        records
            .surgeries
            .get(id)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound {
                kind: "surgery",
                id: id.to_string(),
            })
    }
}
