use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    pub status: AppointmentStatus,
}

impl Record for Appointment {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.doctor_name.as_str(),
            self.reason.as_str(),
            self.status.as_str(),
        ]
    }
}
