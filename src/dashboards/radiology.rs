//! Radiology: scan requests, scheduling, findings.

use chrono::{DateTime, Utc};

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::{FlowRecord, Stage};
use crate::models::{Scan, ScanStatus};

/// Where radiology can send a patient next.
pub const ROUTE_TARGETS: &[Stage] = &[Stage::Doctor, Stage::Lab, Stage::Billing];

pub struct RadiologyDashboard<'a> {
    view: View<'a>,
}

impl<'a> RadiologyDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Radiology)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    pub fn patients(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Radiology)
    }

    pub fn scans(&self, query: &str) -> Result<Vec<Scan>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.scans.search(self.view.query(query)).into_iter().cloned().collect())
    }

    /// Requested or scheduled scans, earliest slot first; unscheduled last.
    pub fn worklist(&self) -> Result<Vec<Scan>, DashboardError> {
        let records = self.view.records()?;
        let mut open: Vec<Scan> = records
            .scans
            .items()
            .iter()
            .filter(|s| s.status != ScanStatus::Completed)
            .cloned()
            .collect();
        open.sort_by_key(|s| (s.scheduled_for.is_none(), s.scheduled_for, s.requested_at));
        Ok(open)
    }

    pub fn schedule(&self, scan_id: &str, at: DateTime<Utc>) -> Result<Scan, DashboardError> {
        let mut records = self.view.records_mut()?;
        if records.scans.get(scan_id).map(|s| s.status) == Some(ScanStatus::Completed) {
            return Err(DashboardError::Invalid("scan already completed".into()));
        }
        Ok(records.scans.modify(&self.view.ctx(), scan_id, |s| {
            s.status = ScanStatus::Scheduled;
            s.scheduled_for = Some(at);
        })?)
    }

    pub fn complete(&self, scan_id: &str, findings: &str) -> Result<Scan, DashboardError> {
        require("findings", findings)?;
        let mut records = self.view.records_mut()?;
        let scan = records.scans.modify(&self.view.ctx(), scan_id, |s| {
            s.status = ScanStatus::Completed;
            s.findings = Some(findings.trim().to_string());
        })?;
        tracing::info!(scan_id, label = %scan.test_label(), "Scan reported");
        Ok(scan)
    }

    pub fn route(&self, flow_id: &str, to: Stage, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        if !ROUTE_TARGETS.contains(&to) {
            return Err(DashboardError::Invalid(format!(
                "radiology cannot send patients to {}",
                to.as_str()
            )));
        }
        Ok(self.view.state().flow().move_stage(flow_id, to, notes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::{testing, DoctorDashboard};
    use crate::models::{Role, ScanModality};
    use chrono::Duration;

    fn requested_scan(state: &CoreState, part: &str) -> (String, Scan) {
        let record = state.flow().register("Omar Haddad", "omar@x.com", Some("P2")).unwrap();
        state.flow().move_stage(&record.id, Stage::Doctor, None).unwrap();
        let doctor = DoctorDashboard::mount(state).unwrap();
        let scan = doctor.order_scan(&record.id, ScanModality::XRay, part).unwrap();
        doctor.route(&record.id, Stage::Radiology, None).unwrap();
        (record.id, scan)
    }

    #[test]
    fn worklist_puts_scheduled_first() {
        let state = testing::staff(Role::Radiology);
        let radiology = RadiologyDashboard::mount(&state).unwrap();
        let (_, knee) = requested_scan(&state, "knee");
        let (_, chest) = requested_scan(&state, "chest");

        radiology.schedule(&chest.id, Utc::now() + Duration::hours(1)).unwrap();
        let list = radiology.worklist().unwrap();
        assert_eq!(list[0].id, chest.id);
        assert_eq!(list[1].id, knee.id);
        assert_eq!(radiology.patients().len(), 2);
    }

    #[test]
    fn complete_records_findings_and_leaves_worklist() {
        let state = testing::staff(Role::Radiology);
        let radiology = RadiologyDashboard::mount(&state).unwrap();
        let (flow_id, scan) = requested_scan(&state, "knee");

        let done = radiology.complete(&scan.id, "No fracture").unwrap();
        assert_eq!(done.findings.as_deref(), Some("No fracture"));
        assert!(radiology.worklist().unwrap().is_empty());
        assert!(radiology.schedule(&scan.id, Utc::now()).is_err());

        radiology.route(&flow_id, Stage::Doctor, Some("report sent")).unwrap();
        assert!(radiology.patients().is_empty());
    }

    #[test]
    fn route_rejects_pharmacy() {
        let state = testing::staff(Role::Radiology);
        let radiology = RadiologyDashboard::mount(&state).unwrap();
        let (flow_id, _) = requested_scan(&state, "knee");
        assert!(radiology.route(&flow_id, Stage::Pharmacy, None).is_err());
        assert_eq!(state.flow().get(&flow_id).unwrap().current_stage, Stage::Radiology);
    }
}
