//! Laboratory: work through ordered tests and return patients.

use chrono::Utc;
use serde::Serialize;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::{FlowRecord, Stage};
use crate::models::{LabOrder, LabOrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSummary {
    pub patients_waiting: usize,
    pub ordered: usize,
    pub in_progress: usize,
    pub completed_today: usize,
}

pub struct LabDashboard<'a> {
    view: View<'a>,
}

impl<'a> LabDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Lab)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    /// Visits currently in the lab.
    pub fn patients(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Lab)
    }

    /// Unfinished orders for patients who are in the lab, oldest first.
    pub fn pending_orders(&self) -> Result<Vec<LabOrder>, DashboardError> {
        let here: Vec<String> = self.patients().into_iter().map(|r| r.id).collect();
        let records = self.view.records()?;
        let mut pending: Vec<LabOrder> = records
            .lab_orders
            .items()
            .iter()
            .filter(|o| o.status != LabOrderStatus::Completed && here.contains(&o.flow_id))
            .cloned()
            .collect();
        pending.sort_by_key(|o| o.ordered_at);
        Ok(pending)
    }

    pub fn orders(&self, query: &str) -> Result<Vec<LabOrder>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.lab_orders.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn start(&self, order_id: &str) -> Result<LabOrder, DashboardError> {
        let mut records = self.view.records_mut()?;
        let current = records.lab_orders.get(order_id).map(|o| o.status);
        if current == Some(LabOrderStatus::Completed) {
            return Err(DashboardError::Invalid("test already completed".into()));
        }
        Ok(records
            .lab_orders
            .modify(&self.view.ctx(), order_id, |o| o.status = LabOrderStatus::InProgress)?)
    }

    pub fn record_result(&self, order_id: &str, result: &str) -> Result<LabOrder, DashboardError> {
        require("result", result)?;
        let mut records = self.view.records_mut()?;
        let order = records.lab_orders.modify(&self.view.ctx(), order_id, |o| {
            o.status = LabOrderStatus::Completed;
            o.result = Some(result.trim().to_string());
            o.completed_at = Some(Utc::now());
        })?;
        tracing::info!(order_id, test = %order.test_name, "Lab result recorded");
        Ok(order)
    }

    pub fn return_to_doctor(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Doctor, notes)?)
    }

    pub fn send_to_billing(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Billing, notes)?)
    }

    pub fn summary(&self) -> Result<LabSummary, DashboardError> {
        let today = Utc::now().date_naive();
        let records = self.view.records()?;
        let count = |status: LabOrderStatus| {
            records
                .lab_orders
                .items()
                .iter()
                .filter(|o| o.status == status)
                .count()
        };
        Ok(LabSummary {
            patients_waiting: self.patients().len(),
            ordered: count(LabOrderStatus::Ordered),
            in_progress: count(LabOrderStatus::InProgress),
            completed_today: records
                .lab_orders
                .items()
                .iter()
                .filter(|o| o.completed_at.is_some_and(|at| at.date_naive() == today))
                .count(),
        })
    }
}
