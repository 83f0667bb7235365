use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{BillCategory, PaymentStatus};
use crate::records::Record;

/// Flat tax applied to every invoice, in basis points (5%).
pub const TAX_RATE_BPS: u64 = 500;

/// One billable line for a patient. Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub description: String,
    pub category: BillCategory,
    pub amount_cents: u64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

impl BillItem {
    pub fn line_total_cents(&self) -> u64 {
        self.amount_cents.saturating_mul(u64::from(self.quantity))
    }
}

impl Record for BillItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ]
    }
}

/// Invoice summary computed from a patient's bill items.
///
/// Placeholder arithmetic: flat tax, then a flat insurance coverage
/// percentage of the taxed amount. Waived lines are excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub patient_id: String,
    pub line_count: usize,
    pub subtotal_cents: u64,
    pub tax_cents: u64,
    pub insurance_cents: u64,
    pub total_cents: u64,
    pub paid_cents: u64,
    pub balance_cents: u64,
}

impl Invoice {
    pub fn compute(patient_id: &str, items: &[BillItem], coverage_percent: u8) -> Self {
        let coverage = u64::from(coverage_percent.min(100));
        let billable: Vec<&BillItem> = items
            .iter()
            .filter(|item| item.patient_id == patient_id && item.status != PaymentStatus::Waived)
            .collect();

        let subtotal_cents = sum_cents(billable.iter().map(|item| item.line_total_cents()));
        let tax_cents = share(subtotal_cents, TAX_RATE_BPS, 10_000);
        let gross_cents = subtotal_cents.saturating_add(tax_cents);
        let insurance_cents = share(gross_cents, coverage, 100);
        let total_cents = gross_cents - insurance_cents;

        // Paid lines are settled at their share of the total after coverage.
        let paid_subtotal = sum_cents(
            billable
                .iter()
                .filter(|item| item.status == PaymentStatus::Paid)
                .map(|item| item.line_total_cents()),
        );
        let paid_cents = share(total_cents, paid_subtotal, subtotal_cents);

        Self {
            patient_id: patient_id.to_string(),
            line_count: billable.len(),
            subtotal_cents,
            tax_cents,
            insurance_cents,
            total_cents,
            paid_cents,
            balance_cents: total_cents - paid_cents,
        }
    }
}

/// Sum of cent amounts, pinned at `u64::MAX` instead of wrapping.
pub fn sum_cents(amounts: impl IntoIterator<Item = u64>) -> u64 {
    amounts.into_iter().fold(0, u64::saturating_add)
}

/// `value * numerator / denominator` without overflowing the product.
/// Callers keep `numerator <= denominator`, so the result fits.
fn share(value: u64, numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let scaled = u128::from(value) * u128::from(numerator) / u128::from(denominator);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
