use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::SurgeryStatus;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surgery {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub procedure: String,
    pub surgeon_id: String,
    pub surgeon_name: String,
    pub theatre: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: SurgeryStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Surgery {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.procedure.as_str(),
            self.surgeon_name.as_str(),
            self.theatre.as_str(),
        ]
    }
}
