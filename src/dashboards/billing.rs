//! Billing: charges, invoices, payments.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use super::{require, DashboardError, DashboardKind, View};
use crate::core_state::CoreState;
use crate::flow::{FlowRecord, Stage};
use crate::models::{new_id, sum_cents, BillCategory, BillItem, Invoice, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub patients_waiting: usize,
    pub outstanding_cents: u64,
    pub collected_cents: u64,
}

pub struct BillingDashboard<'a> {
    view: View<'a>,
}

impl<'a> BillingDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Billing)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    /// Visits waiting at the billing desk.
    pub fn patients(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Billing)
    }

    pub fn items(&self, query: &str) -> Result<Vec<BillItem>, DashboardError> {
        let records = self.view.records()?;
        Ok(records.bills.search(self.view.query(query)).into_iter().cloned().collect())
    }

    pub fn items_for(&self, patient_id: &str) -> Result<Vec<BillItem>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .bills
            .items()
            .iter()
            .filter(|item| item.patient_id == patient_id)
            .cloned()
            .collect())
    }

    pub fn add_charge(
        &self,
        patient_id: &str,
        description: &str,
        category: BillCategory,
        amount_cents: u64,
        quantity: u32,
    ) -> Result<BillItem, DashboardError> {
        require("description", description)?;
        if amount_cents == 0 || quantity == 0 {
            return Err(DashboardError::Invalid("amount and quantity must be positive".into()));
        }
        let mut records = self.view.records_mut()?;
        let patient_name = records
            .patients
            .get(patient_id)
            .map(|p| p.name.clone())
            .ok_or_else(|| DashboardError::NotFound {
                kind: "patient",
                id: patient_id.to_string(),
            })?;

        let item = BillItem {
            id: new_id(),
            patient_id: patient_id.to_string(),
            patient_name,
            description: description.trim().to_string(),
            category,
            amount_cents,
            quantity,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        Ok(records.bills.create(&self.view.ctx(), item)?)
    }

    /// Invoice with the flat tax and `coverage_percent` insurance.
    pub fn invoice(&self, patient_id: &str, coverage_percent: u8) -> Result<Invoice, DashboardError> {
        let records = self.view.records()?;
        Ok(Invoice::compute(patient_id, records.bills.items(), coverage_percent))
    }

    pub fn mark_paid(&self, item_id: &str) -> Result<BillItem, DashboardError> {
        let mut records = self.view.records_mut()?;
        let item = records
            .bills
            .patch(&self.view.ctx(), item_id, json!({ "status": PaymentStatus::Paid }))?;
        tracing::info!(item_id, cents = item.line_total_cents(), "Bill item paid");
        Ok(item)
    }

    /// Mark every pending line for the patient paid. Stops at the first
    /// failure; lines already marked stay paid.
    pub fn settle(&self, patient_id: &str) -> Result<usize, DashboardError> {
        let pending: Vec<String> = self
            .items_for(patient_id)?
            .into_iter()
            .filter(|item| item.status == PaymentStatus::Pending)
            .map(|item| item.id)
            .collect();
        for id in &pending {
            self.mark_paid(id)?;
        }
        Ok(pending.len())
    }

    pub fn waive(&self, item_id: &str) -> Result<BillItem, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records
            .bills
            .modify(&self.view.ctx(), item_id, |item| item.status = PaymentStatus::Waived)?)
    }

    pub fn send_to_pharmacy(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Pharmacy, notes)?)
    }

    /// Close the visit when nothing needs dispensing.
    pub fn discharge(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Completed, notes)?)
    }

    pub fn summary(&self) -> Result<BillingSummary, DashboardError> {
        let records = self.view.records()?;
        let total = |status: PaymentStatus| -> u64 {
            sum_cents(
                records
                    .bills
                    .items()
                    .iter()
                    .filter(|item| item.status == status)
                    .map(BillItem::line_total_cents),
            )
        };
        Ok(BillingSummary {
            patients_waiting: self.patients().len(),
            outstanding_cents: total(PaymentStatus::Pending),
            collected_cents: total(PaymentStatus::Paid),
        })
    }
}
