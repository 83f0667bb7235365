//! Triage: vitals, placeholder priority scoring, hand-off to doctors.

use chrono::Utc;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::{FlowRecord, Stage};
use crate::models::{new_id, Alert, AlertLevel, TriageAssessment, TriagePriority, Vitals};

pub struct TriageDashboard<'a> {
    view: View<'a>,
}

impl<'a> TriageDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Triage)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    /// Visits waiting at triage.
    pub fn queue(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Triage)
    }

    /// Score the vitals and save the assessment. An immediate priority
    /// also raises a critical alert.
    pub fn record_vitals(
        &self,
        flow_id: &str,
        complaint: &str,
        vitals: Vitals,
    ) -> Result<TriageAssessment, DashboardError> {
        require("complaint", complaint)?;
        let visit = self
            .view
            .state()
            .flow()
            .get(flow_id)
            .ok_or_else(|| DashboardError::NotFound {
                kind: "visit",
                id: flow_id.to_string(),
            })?;

        let priority = vitals.priority();
        let assessment = TriageAssessment {
            id: new_id(),
            flow_id: visit.id.clone(),
            patient_name: visit.name.clone(),
            complaint: complaint.trim().to_string(),
            vitals,
            priority,
            assessed_at: Utc::now(),
        };

        let mut records = self.view.records_mut()?;
        let ctx = self.view.ctx();
        let assessment = records.triage.create(&ctx, assessment)?;
        tracing::info!(flow_id, priority = priority.as_str(), "Triage recorded");

        if priority == TriagePriority::Immediate {
            let alert = Alert::new(
                AlertLevel::Critical,
                "triage",
                format!("{} needs immediate attention: {}", visit.name, assessment.complaint),
            );
            // The assessment is saved either way; a failed alert only toasts.
            if let Err(e) = records.alerts.create(&ctx, alert) {
                tracing::warn!(error = %e, "Critical alert not saved");
            }
        }
        Ok(assessment)
    }

    /// Assessments still at triage, most urgent first, then oldest.
    pub fn worklist(&self) -> Result<Vec<TriageAssessment>, DashboardError> {
        let waiting: Vec<String> = self.queue().into_iter().map(|r| r.id).collect();
        let records = self.view.records()?;
        let mut list: Vec<TriageAssessment> = records
            .triage
            .items()
            .iter()
            .filter(|a| waiting.contains(&a.flow_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then(a.assessed_at.cmp(&b.assessed_at))
        });
        Ok(list)
    }

    pub fn assessments(&self, query: &str) -> Result<Vec<TriageAssessment>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.triage.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn send_to_doctor(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Doctor, notes)?)
    }
}
