use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::LabOrderStatus;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabOrder {
    pub id: String,
    pub flow_id: String,
    pub patient_name: String,
    pub test_name: String,
    pub status: LabOrderStatus,
    #[serde(default)]
    pub result: Option<String>,
    pub ordered_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Record for LabOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.test_name.as_str(),
            self.status.as_str(),
        ]
    }
}
