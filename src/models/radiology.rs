use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ScanModality, ScanStatus};
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: String,
    pub flow_id: String,
    pub patient_name: String,
    pub modality: ScanModality,
    pub body_part: String,
    pub status: ScanStatus,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub findings: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl Scan {
    /// Name recorded in the flow tracker's test list, e.g. "MRI knee".
    pub fn test_label(&self) -> String {
        let modality = match self.modality {
            ScanModality::XRay => "X-ray",
            ScanModality::Ct => "CT",
            ScanModality::Mri => "MRI",
            ScanModality::Ultrasound => "Ultrasound",
        };
        format!("{modality} {}", self.body_part)
    }
}

impl Record for Scan {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.body_part.as_str(),
            self.modality.as_str(),
            self.status.as_str(),
        ]
    }
}
