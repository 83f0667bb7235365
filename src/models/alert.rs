use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AlertLevel;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub level: AlertLevel,
    /// Department that raised it ("pharmacy", "emergency", ...).
    pub source: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(level: AlertLevel, source: &str, message: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            level,
            source: source.to_string(),
            message: message.into(),
            created_at: Utc::now(),
            acknowledged: false,
        }
    }
}

impl Record for Alert {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.source.as_str(),
            self.message.as_str(),
            self.level.as_str(),
        ]
    }
}
