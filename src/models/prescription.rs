use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::PrescriptionStatus;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub flow_id: Option<String>,
    pub doctor_id: String,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub duration_days: u32,
    /// Units the pharmacy hands out when dispensing.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub status: PrescriptionStatus,
    pub prescribed_at: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

impl Prescription {
    /// Display form used in the flow tracker, e.g. "Amoxicillin 500mg".
    pub fn label(&self) -> String {
        format!("{} {}", self.medication, self.dosage).trim().to_string()
    }
}

impl Record for Prescription {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.medication.as_str(),
            self.status.as_str(),
        ]
    }
}
