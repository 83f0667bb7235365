use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub assigned_doctor_id: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Record for Patient {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str(), self.phone.as_str()];
        if let Some(condition) = &self.condition {
            fields.push(condition);
        }
        fields
    }
}
