use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::TriagePriority;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub temperature_c: f32,
    pub pulse_bpm: u32,
    pub systolic: u32,
    pub diastolic: u32,
    pub respiratory_rate: u32,
    pub spo2: u32,
}

impl Vitals {
    /// Warning score: one to three points per out-of-range reading.
    ///
    /// Placeholder thresholds; not a clinical protocol.
    pub fn warning_score(&self) -> u32 {
        let mut score = 0;

        score += match self.respiratory_rate {
            0..=8 => 3,
            9..=11 => 1,
            12..=20 => 0,
            21..=24 => 2,
            _ => 3,
        };
        score += match self.spo2 {
            0..=91 => 3,
            92..=93 => 2,
            94..=95 => 1,
            _ => 0,
        };
        score += match self.systolic {
            0..=90 => 3,
            91..=100 => 2,
            101..=110 => 1,
            111..=219 => 0,
            _ => 3,
        };
        score += match self.pulse_bpm {
            0..=40 => 3,
            41..=50 => 1,
            51..=90 => 0,
            91..=110 => 1,
            111..=130 => 2,
            _ => 3,
        };
        score += if self.temperature_c <= 35.0 {
            3
        } else if self.temperature_c > 39.0 {
            2
        } else if self.temperature_c <= 36.0 || self.temperature_c > 38.0 {
            1
        } else {
            0
        };

        score
    }

    pub fn priority(&self) -> TriagePriority {
        match self.warning_score() {
            7.. => TriagePriority::Immediate,
            5..=6 => TriagePriority::Urgent,
            2..=4 => TriagePriority::Standard,
            _ => TriagePriority::NonUrgent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageAssessment {
    pub id: String,
    pub flow_id: String,
    pub patient_name: String,
    pub complaint: String,
    pub vitals: Vitals,
    pub priority: TriagePriority,
    pub assessed_at: DateTime<Utc>,
}

impl Record for TriageAssessment {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn normal() -> Vitals {
        Vitals {
            temperature_c: 36.8,
            pulse_bpm: 72,
            systolic: 120,
            diastolic: 80,
            respiratory_rate: 16,
            spo2: 98,
        }
    }

    #[test]
    fn normal_vitals_are_non_urgent() {
        assert_eq!(normal().warning_score(), 0);
        assert_eq!(normal().priority(), TriagePriority::NonUrgent);
    }

    #[test]
    fn low_saturation_and_fast_breathing_is_urgent() {
        let vitals = Vitals {
            spo2: 91,
            respiratory_rate: 22,
            ..normal()
        };
        assert_eq!(vitals.warning_score(), 5);
        assert_eq!(vitals.priority(), TriagePriority::Urgent);
    }

    #[test]
    fn shock_picture_is_immediate() {
        let vitals = Vitals {
            systolic: 85,
            pulse_bpm: 135,
            spo2: 90,
            ..normal()
        };
        assert_eq!(vitals.priority(), TriagePriority::Immediate);
    }

    #[test]
    fn mild_fever_is_standard_with_tachycardia() {
        let vitals = Vitals {
            temperature_c: 38.5,
            pulse_bpm: 100,
            ..normal()
        };
        assert_eq!(vitals.warning_score(), 2);
        assert_eq!(vitals.priority(), TriagePriority::Standard);
    }
}
