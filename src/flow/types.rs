use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::enums::str_enum;

str_enum!(Stage {
    Reception => "reception",
    Triage => "triage",
    Doctor => "doctor",
    Lab => "lab",
    Radiology => "radiology",
    Billing => "billing",
    Pharmacy => "pharmacy",
    Completed => "completed",
});

impl Stage {
    /// Department that owns patients at this stage, for display.
    pub fn department(&self) -> &'static str {
        match self {
            Self::Reception => "Reception",
            Self::Triage => "Triage",
            Self::Doctor => "Consultation",
            Self::Lab => "Laboratory",
            Self::Radiology => "Radiology",
            Self::Billing => "Billing",
            Self::Pharmacy => "Pharmacy",
            Self::Completed => "Discharged",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

str_enum!(FlowAction {
    Moved => "moved",
    TestOrdered => "test_ordered",
    PrescriptionAdded => "prescription_added",
});

/// One audit-trail entry. Exactly one is appended per mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub stage: Stage,
    pub action: FlowAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A patient's visit as it moves between departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub id: String,
    /// Stable link to the patient record. Preferred over name/email.
    #[serde(default)]
    pub patient_id: Option<String>,
    pub name: String,
    pub email: String,
    pub current_stage: Stage,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub prescriptions: Vec<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl FlowRecord {
    /// A fresh record at reception with empty history.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patient_id: None,
            name: name.into(),
            email: email.into(),
            current_stage: Stage::Reception,
            tests: Vec::new(),
            prescriptions: Vec::new(),
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Time of the most recent change, or creation if never changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.last_entry()
            .map(|entry| entry.timestamp)
            .unwrap_or(self.created_at)
    }

    pub(crate) fn apply_move(&mut self, stage: Stage, notes: Option<String>, now: DateTime<Utc>) {
        self.current_stage = stage;
        self.history.push(HistoryEntry {
            stage,
            action: FlowAction::Moved,
            notes,
            timestamp: now,
        });
    }

    pub(crate) fn apply_test(&mut self, test_name: String, now: DateTime<Utc>) {
        let notes = format!("Test ordered: {test_name}");
        self.tests.push(test_name);
        self.history.push(HistoryEntry {
            stage: self.current_stage,
            action: FlowAction::TestOrdered,
            notes: Some(notes),
            timestamp: now,
        });
    }

    pub(crate) fn apply_prescription(&mut self, medication: String, now: DateTime<Utc>) {
        let notes = format!("Prescribed: {medication}");
        self.prescriptions.push(medication);
        self.history.push(HistoryEntry {
            stage: self.current_stage,
            action: FlowAction::PrescriptionAdded,
            notes: Some(notes),
            timestamp: now,
        });
    }
}
