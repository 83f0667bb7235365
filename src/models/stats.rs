use serde::{Deserialize, Serialize};

use crate::records::Record;

/// Headline counts for the admin summary cards (`/dashboard/stats`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_patients: u64,
    pub total_doctors: u64,
    pub total_appointments: u64,
    pub total_departments: u64,
    pub revenue_cents: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl Record for Disease {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.code.as_str(),
            self.description.as_str(),
        ]
    }
}
