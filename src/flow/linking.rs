//! Resolving which flow record belongs to a logged-in patient.
//!
//! The stable `patient_id` link is tried first. Records created before
//! that link existed are still found by case-insensitive email, then by
//! case-insensitive name. Within one level the most recently created
//! record wins, so a returning patient sees their current visit.

use super::types::FlowRecord;

/// What the session knows about the logged-in patient.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatientIdentity<'a> {
    pub patient_id: Option<&'a str>,
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
}

/// Which key produced the match. Anything but `PatientId` is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMatch {
    PatientId,
    Email,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedRecord {
    pub record: FlowRecord,
    pub matched_by: LinkMatch,
}

pub fn find_linked(records: &[FlowRecord], identity: &PatientIdentity<'_>) -> Option<LinkedRecord> {
    if let Some(patient_id) = non_empty(identity.patient_id) {
        if let Some(record) = records
            .iter()
            .rev()
            .find(|r| r.patient_id.as_deref() == Some(patient_id))
        {
            return Some(linked(record, LinkMatch::PatientId));
        }
    }

    if let Some(email) = non_empty(identity.email) {
        if let Some(record) = records
            .iter()
            .rev()
            .find(|r| same_key(&r.email, email))
        {
            tracing::debug!(id = %record.id, "Flow record linked by email");
            return Some(linked(record, LinkMatch::Email));
        }
    }

    if let Some(name) = non_empty(identity.name) {
        if let Some(record) = records
            .iter()
            .rev()
            .find(|r| same_key(&r.name, name))
        {
            tracing::warn!(id = %record.id, "Flow record linked by name only");
            return Some(linked(record, LinkMatch::Name));
        }
    }

    None
}

/// Email and name comparison: trimmed, Unicode case-insensitive.
pub fn same_key(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn linked(record: &FlowRecord, matched_by: LinkMatch) -> LinkedRecord {
    LinkedRecord {
        record: record.clone(),
        matched_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<FlowRecord> {
        vec![
            FlowRecord::new("F1", "Jane Doe", "Jane@X.com"),
            FlowRecord::new("F2", "John Roe", "john@x.com").with_patient_id("P2"),
            FlowRecord::new("F3", "Jane Doe", "jane@x.com"),
        ]
    }

    #[test]
    fn patient_id_takes_precedence() {
        let identity = PatientIdentity {
            patient_id: Some("P2"),
            email: Some("jane@x.com"),
            name: None,
        };
        let linked = find_linked(&records(), &identity).unwrap();
        assert_eq!(linked.record.id, "F2");
        assert_eq!(linked.matched_by, LinkMatch::PatientId);
    }

    #[test]
    fn email_match_is_case_insensitive_and_prefers_latest() {
        let identity = PatientIdentity {
            email: Some(" JANE@x.COM "),
            ..Default::default()
        };
        let linked = find_linked(&records(), &identity).unwrap();
        assert_eq!(linked.record.id, "F3");
        assert_eq!(linked.matched_by, LinkMatch::Email);
    }

    #[test]
    fn unknown_patient_id_falls_back_to_name() {
        let identity = PatientIdentity {
            patient_id: Some("P9"),
            email: Some("nobody@x.com"),
            name: Some("john roe"),
        };
        let linked = find_linked(&records(), &identity).unwrap();
        assert_eq!(linked.record.id, "F2");
        assert_eq!(linked.matched_by, LinkMatch::Name);
    }

    #[test]
    fn email_and_name_fold_case_the_same_way() {
        let records = vec![FlowRecord::new("F1", "Zoë Ærø", "élise@x.com")];
        let by_email = find_linked(
            &records,
            &PatientIdentity {
                email: Some("ÉLISE@X.COM"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_email.matched_by, LinkMatch::Email);

        let by_name = find_linked(
            &records,
            &PatientIdentity {
                name: Some("ZOË ÆRØ"),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_name.matched_by, LinkMatch::Name);
    }

    #[test]
    fn no_match_is_none() {
        let identity = PatientIdentity {
            email: Some(""),
            name: Some("   "),
            ..Default::default()
        };
        assert!(find_linked(&records(), &identity).is_none());
        assert!(find_linked(&[], &PatientIdentity::default()).is_none());
    }
}
