//! Pharmacy: prescriptions, stock, dispensing.
//!
//! Stock is kept in the local store only; prescriptions and alerts also
//! sync with the backend. Dispensing marks the prescription first, so a
//! failed backend write never costs stock.

use chrono::NaiveDate;
use serde::Serialize;

use super::{ensure_id, require, DashboardError, DashboardKind, View};
use crate::core_state::{CoreState, SharedRecords};
use crate::flow::{FlowRecord, Stage};
use crate::models::{sum_cents, Alert, AlertLevel, InventoryItem, Prescription, PrescriptionStatus};
use crate::records::WriteContext;

const ALERT_SOURCE: &str = "pharmacy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacySummary {
    pub pending_prescriptions: usize,
    pub low_stock: usize,
    pub stock_value_cents: u64,
    pub open_alerts: usize,
}

/// Outcome of one dispense.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispensed {
    pub prescription: Prescription,
    pub item: InventoryItem,
    /// Raised when the item dropped to its reorder level.
    pub alert: Option<Alert>,
}

pub struct PharmacyDashboard<'a> {
    view: View<'a>,
}

impl<'a> PharmacyDashboard<'a> {
    pub fn mount(state: &'a CoreState) -> Result<Self, DashboardError> {
        Ok(Self {
            view: View::mount(state, DashboardKind::Pharmacy)?,
        })
    }

    pub fn view(&self) -> &View<'a> {
        &self.view
    }

    pub fn patients(&self) -> Vec<FlowRecord> {
        self.view.state().flow().by_stage(Stage::Pharmacy)
    }

    /// Prescriptions still waiting to be dispensed.
    pub fn prescriptions(&self, query: &str) -> Result<Vec<Prescription>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .prescriptions
            .search(self.view.query(query))
            .into_iter()
            .filter(|rx| rx.status == PrescriptionStatus::Pending)
            .cloned()
            .collect())
    }

    pub fn inventory(&self, query: &str) -> Result<Vec<InventoryItem>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .inventory
            .search(self.view.query(query))
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn low_stock(&self) -> Result<Vec<InventoryItem>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .inventory
            .items()
            .iter()
            .filter(|item| item.is_low_stock())
            .cloned()
            .collect())
    }

    pub fn expired(&self, today: NaiveDate) -> Result<Vec<InventoryItem>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .inventory
            .items()
            .iter()
            .filter(|item| item.is_expired(today))
            .cloned()
            .collect())
    }

    pub fn dispense(&self, prescription_id: &str) -> Result<Dispensed, DashboardError> {
        let ctx = self.view.ctx();
        let mut records = self.view.records_mut()?;

        let prescription = records
            .prescriptions
            .get(prescription_id)
            .cloned()
            .ok_or_else(|| DashboardError::NotFound {
                kind: "prescription",
                id: prescription_id.to_string(),
            })?;
        if prescription.status != PrescriptionStatus::Pending {
            return Err(DashboardError::Invalid(format!(
                "prescription {prescription_id} is already {}",
                prescription.status
            )));
        }

        let wanted = prescription.medication.trim().to_lowercase();
        if wanted.is_empty() {
            return Err(DashboardError::Invalid(format!(
                "prescription {prescription_id} names no medication"
            )));
        }
        let item = records
            .inventory
            .items()
            .iter()
            .find(|item| item.name.to_lowercase().contains(&wanted))
            .cloned()
            .ok_or_else(|| DashboardError::NotFound {
                kind: "inventory item",
                id: prescription.medication.clone(),
            })?;
        if item.quantity < prescription.quantity {
            return Err(DashboardError::Invalid(format!(
                "only {} of {} in stock",
                item.quantity, item.name
            )));
        }

        let prescription = records
            .prescriptions
            .modify(&ctx, prescription_id, |rx| rx.status = PrescriptionStatus::Dispensed)?;
        let taken = prescription.quantity;
        let item = records
            .inventory
            .modify(&ctx, &item.id, |item| item.quantity -= taken)?;

        tracing::info!(
            prescription = prescription_id,
            item = %item.id,
            remaining = item.quantity,
            "Prescription dispensed"
        );

        let alert = if item.is_low_stock() {
            raise_low_stock(&mut records, &ctx, &item)
        } else {
            None
        };

        Ok(Dispensed {
            prescription,
            item,
            alert,
        })
    }

    pub fn restock(&self, item_id: &str, amount: u32) -> Result<InventoryItem, DashboardError> {
        if amount == 0 {
            return Err(DashboardError::Invalid("restock amount must be positive".into()));
        }
        let mut records = self.view.records_mut()?;
        Ok(records.inventory.modify(&self.view.ctx(), item_id, |item| {
            item.quantity = item.quantity.saturating_add(amount);
        })?)
    }

    pub fn add_item(&self, mut item: InventoryItem) -> Result<InventoryItem, DashboardError> {
        require("name", &item.name)?;
        ensure_id(&mut item.id);
        let mut records = self.view.records_mut()?;
        Ok(records.inventory.create(&self.view.ctx(), item)?)
    }

    pub fn remove_item(&self, item_id: &str) -> Result<InventoryItem, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records.inventory.delete(&self.view.ctx(), item_id)?)
    }

    /// Last stop of the pathway.
    pub fn complete_visit(&self, flow_id: &str, notes: Option<&str>) -> Result<FlowRecord, DashboardError> {
        Ok(self.view.state().flow().move_stage(flow_id, Stage::Completed, notes)?)
    }

    /// Unacknowledged alerts raised by the pharmacy.
    pub fn alerts(&self) -> Result<Vec<Alert>, DashboardError> {
        let records = self.view.records()?;
        Ok(records
            .alerts
            .items()
            .iter()
            .filter(|alert| alert.source == ALERT_SOURCE && !alert.acknowledged)
            .cloned()
            .collect())
    }

    pub fn acknowledge(&self, alert_id: &str) -> Result<Alert, DashboardError> {
        let mut records = self.view.records_mut()?;
        Ok(records
            .alerts
            .modify(&self.view.ctx(), alert_id, |alert| alert.acknowledged = true)?)
    }

    pub fn summary(&self) -> Result<PharmacySummary, DashboardError> {
        let pending_prescriptions = self.prescriptions("")?.len();
        let open_alerts = self.alerts()?.len();
        let records = self.view.records()?;
        let stock = records.inventory.items();
        Ok(PharmacySummary {
            pending_prescriptions,
            low_stock: stock.iter().filter(|item| item.is_low_stock()).count(),
            stock_value_cents: sum_cents(stock.iter().map(InventoryItem::stock_value_cents)),
            open_alerts,
        })
    }
}

/// A failed alert write is logged and toasted by the collection; the
/// dispense itself already succeeded.
fn raise_low_stock(
    records: &mut SharedRecords,
    ctx: &WriteContext<'_>,
    item: &InventoryItem,
) -> Option<Alert> {
    let alert = Alert::new(
        AlertLevel::Warning,
        ALERT_SOURCE,
        format!("Low stock: {} ({} left)", item.name, item.quantity),
    );
    match records.alerts.create(ctx, alert) {
        Ok(alert) => Some(alert),
        Err(e) => {
            tracing::warn!(item = %item.id, error = %e, "Low-stock alert not saved");
            None
        }
    }
}
