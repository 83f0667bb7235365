//! Emergency: ambulance fleet and walk-in/arrival cases.

use chrono::Utc;
use serde::Serialize;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::{FlowRecord, Stage};
use crate::models::{
    new_id, Alert, AlertLevel, Ambulance, AmbulanceStatus, EmergencyCase, TriagePriority,
};

const ALERT_SOURCE: &str = "emergency";
const BASE_LOCATION: &str = "Base";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencySummary {
    pub available_ambulances: usize,
    pub dispatched_ambulances: usize,
    pub open_cases: usize,
    pub critical_alerts: usize,
}

pub struct EmergencyDashboard<'a> {
    view: View<'a>,
}

impl<'a> EmergencyDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Emergency)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    // ── Fleet ───────────────────────────────────────────────

    pub fn ambulances(&self, query: &str) -> Result<Vec<Ambulance>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .ambulances
            .search(self.view.query(query))
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn available(&self) -> Result<Vec<Ambulance>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .ambulances
            .items()
            .iter()
            .filter(|a| a.status == AmbulanceStatus::Available)
            .cloned()
            .collect())
    }

    pub fn dispatch(&self, ambulance_id: &str, destination: &str) -> Result<Ambulance, DashboardError> {
        require("destination", destination)?;
        self.change_status(ambulance_id, &[AmbulanceStatus::Available], |a| {
            a.status = AmbulanceStatus::Dispatched;
            a.location = Some(destination.trim().to_string());
        })
    }

    pub fn mark_returning(&self, ambulance_id: &str) -> Result<Ambulance, DashboardError> {
        self.change_status(ambulance_id, &[AmbulanceStatus::Dispatched], |a| {
            a.status = AmbulanceStatus::Returning;
        })
    }

    pub fn return_to_base(&self, ambulance_id: &str) -> Result<Ambulance, DashboardError> {
        self.change_status(
            ambulance_id,
            &[AmbulanceStatus::Dispatched, AmbulanceStatus::Returning],
            |a| {
                a.status = AmbulanceStatus::Available;
                a.location = Some(BASE_LOCATION.to_string());
            },
        )
    }

    fn change_status(
        &self,
        ambulance_id: &str,
        from: &[AmbulanceStatus],
        change: impl FnOnce(&mut Ambulance),
    ) -> Result<Ambulance, DashboardError> {
        let mut records = self.view.records_mut()?;
        let current = records
            .ambulances
            .get(ambulance_id)
            .map(|a| a.status)
            .ok_or_else(|| DashboardError::NotFound {
                kind: "ambulance",
                id: ambulance_id.to_string(),
            })?;
        if !from.contains(&current) {
            return Err(DashboardError::Invalid(format!(
                "ambulance {ambulance_id} is {current}"
            )));
        }
        let ambulance = records
            .ambulances
            .modify(&self.view.ctx(), ambulance_id, change)?;
        tracing::info!(ambulance = ambulance_id, status = ambulance.status.as_str(), "Ambulance updated");
        Ok(ambulance)
    }

    // ── Cases ───────────────────────────────────────────────

    /// Record an arrival and open its visit straight at triage.
    ///
    /// The case is saved first; the flow record only appears once the
    /// backend accepted it, with a single notification for the visit.
    pub fn admit(
        &self,
        patient_name: &str,
        complaint: &str,
        priority: TriagePriority,
        ambulance_id: Option<&str>,
    ) -> Result<(EmergencyCase, FlowRecord), DashboardError> {
        require("patient name", patient_name)?;
        require("complaint", complaint)?;
        let ctx = self.view.ctx();
        let mut records = self.view.records_mut()?;
        if let Some(id) = ambulance_id {
            if records.ambulances.get(id).is_none() {
                return Err(DashboardError::NotFound {
                    kind: "ambulance",
                    id: id.to_string(),
                });
            }
        }

        let flow_id = new_id();
        let case = records.emergency_cases.create(
            &ctx,
            EmergencyCase {
                id: new_id(),
                patient_name: patient_name.trim().to_string(),
                complaint: complaint.trim().to_string(),
                priority,
                ambulance_id: ambulance_id.map(str::to_string),
                flow_id: Some(flow_id.clone()),
                arrived_at: Utc::now(),
                resolved: false,
            },
        )?;

        let visit = self.view.state().flow().batch(|flow| {
            flow.insert(FlowRecord::new(flow_id.as_str(), case.patient_name.as_str(), ""))?;
            flow.move_stage(&flow_id, Stage::Triage, Some("emergency arrival"))
        })?;

        if priority == TriagePriority::Immediate {
            let alert = Alert::new(
                AlertLevel::Critical,
                ALERT_SOURCE,
                format!("Immediate: {} ({})", case.patient_name, case.complaint),
            );
            if let Err(e) = records.alerts.create(&ctx, alert) {
                tracing::warn!(case = %case.id, error = %e, "Critical alert not saved");
            }
        }
        tracing::info!(case = %case.id, priority = priority.as_str(), "Emergency case admitted");
        Ok((case, visit))
    }

    pub fn resolve(&self, case_id: &str) -> Result<EmergencyCase, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records
            .emergency_cases
            .modify(&self.view.ctx(), case_id, |c| c.resolved = true)?)
    }

    /// Unresolved cases, most urgent first, then by arrival.
    pub fn open_cases(&self) -> Result<Vec<EmergencyCase>, DashboardError> {
        let records = self.view.records()?;
        let mut cases: Vec<EmergencyCase> = records
            .emergency_cases
            .items()
            .iter()
            .filter(|c| !c.resolved)
            .cloned()
            .collect();
        cases.sort_by_key(|c| (c.priority.rank(), c.arrived_at));
        Ok(cases)
    }

    pub fn critical_alerts(&self) -> Result<Vec<Alert>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .alerts
            .items()
            .iter()
            .filter(|a| a.level == AlertLevel::Critical && !a.acknowledged)
            .cloned()
            .collect())
    }

    pub fn summary(&self) -> Result<EmergencySummary, DashboardError> {
        let open_cases = self.open_cases()?.len();
        let critical_alerts = self.critical_alerts()?.len();
        let records = self.view.records()?;
        let fleet = records.ambulances.items();
        let count = |status: AmbulanceStatus| fleet.iter().filter(|a| a.status == status).count();
        Ok(EmergencySummary {
            available_ambulances: count(AmbulanceStatus::Available),
            dispatched_ambulances: count(AmbulanceStatus::Dispatched),
            open_cases,
            critical_alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::testing;
    use crate::models::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispatch_and_return() {
        let state = testing::staff(Role::Emergency);
        let er = EmergencyDashboard::mount(&state).unwrap();
        let out = er.dispatch("AMB1", "Main St & 5th").unwrap();
        assert_eq!(out.status, AmbulanceStatus::Dispatched);
        assert_eq!(out.location.as_deref(), Some("Main St & 5th"));
        assert_eq!(er.available().unwrap().len(), 1);

        er.mark_returning("AMB1").unwrap();
        let back = er.return_to_base("AMB1").unwrap();
        assert_eq!(back.status, AmbulanceStatus::Available);
        assert_eq!(back.location.as_deref(), Some("Base"));
    }

    #[test]
    fn cannot_dispatch_unavailable_ambulance() {
        let state = testing::staff(Role::Emergency);
        let er = EmergencyDashboard::mount(&state).unwrap();
        assert!(matches!(er.dispatch("AMB3", "Harbor"), Err(DashboardError::Invalid(_))));
        assert!(matches!(er.mark_returning("AMB2"), Err(DashboardError::Invalid(_))));
        assert!(matches!(er.dispatch("AMB9", "Harbor"), Err(DashboardError::NotFound { .. })));
    }

    #[test]
    fn admit_opens_visit_at_triage_with_one_notification() {
        let state = testing::staff(Role::Emergency);
        let er = EmergencyDashboard::mount(&state).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let _sub = state.flow().subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (case, visit) = er
            .admit("John Roe", "chest pain", TriagePriority::Urgent, Some("AMB1"))
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(visit.current_stage, Stage::Triage);
        assert_eq!(case.flow_id.as_deref(), Some(visit.id.as_str()));
        assert_eq!(state.flow().by_stage(Stage::Triage).len(), 1);
        assert!(er.critical_alerts().unwrap().is_empty());
    }

    #[test]
    fn immediate_case_raises_critical_alert() {
        let state = testing::staff(Role::Emergency);
        let er = EmergencyDashboard::mount(&state).unwrap();
        er.admit("Ann Lee", "cardiac arrest", TriagePriority::Immediate, None)
            .unwrap();
        let alerts = er.critical_alerts().unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("Ann Lee"));
    }

    #[test]
    fn failed_admit_opens_no_visit() {
        let (state, backend) = testing::with_mock(Role::Emergency);
        let er = EmergencyDashboard::mount(&state).unwrap();
        backend.set_offline(true);
        assert!(er.admit("John Roe", "fall", TriagePriority::Standard, None).is_err());
        assert!(state.flow().is_empty());
    }

    #[test]
    fn open_cases_sorted_by_priority() {
        let state = testing::staff(Role::Emergency);
        let er = EmergencyDashboard::mount(&state).unwrap();
        er.admit("A", "sprain", TriagePriority::NonUrgent, None).unwrap();
        let (urgent, _) = er.admit("B", "fracture", TriagePriority::Urgent, None).unwrap();
        er.admit("C", "cut", TriagePriority::Standard, None).unwrap();

        let names: Vec<String> = er.open_cases().unwrap().into_iter().map(|c| c.patient_name).collect();
        assert_eq!(names, vec!["B", "C", "A"]);

        er.resolve(&urgent.id).unwrap();
        assert_eq!(er.open_cases().unwrap().len(), 2);
        assert_eq!(er.summary().unwrap().open_cases, 2);
    }
}
