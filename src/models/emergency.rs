use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AmbulanceStatus, TriagePriority};
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambulance {
    pub id: String,
    pub vehicle_number: String,
    pub driver: String,
    pub status: AmbulanceStatus,
    #[serde(default)]
    pub location: Option<String>,
}

impl Record for Ambulance {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.vehicle_number.as_str(),
            self.driver.as_str(),
            self.status.as_str(),
        ];
        if let Some(location) = &self.location {
            fields.push(location);
        }
        fields
    }
}

/// A patient brought in through the emergency department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyCase {
    pub id: String,
    pub patient_name: String,
    pub complaint: String,
    pub priority: TriagePriority,
    #[serde(default)]
    pub ambulance_id: Option<String>,
    #[serde(default)]
    pub flow_id: Option<String>,
    pub arrived_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

impl Record for EmergencyCase {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.complaint.as_str(),
            self.priority.as_str(),
        ]
    }
}
