//! Shared hospital domain model.
//!
//! One typed definition per entity. Dashboards consume these types and
//! never redeclare their own record shapes. Wire format is camelCase JSON
//! to match the REST backend.

pub mod alert;
pub mod appointment;
pub mod billing;
pub mod doctor;
pub mod emergency;
pub mod enums;
pub mod inventory;
pub mod lab;
pub mod patient;
pub mod prescription;
pub mod radiology;
pub mod stats;
pub mod surgery;
pub mod triage;
pub mod user;

pub use alert::Alert;
pub use appointment::Appointment;
pub use billing::{sum_cents, BillItem, Invoice};
pub use doctor::{Department, Doctor};
pub use emergency::{Ambulance, EmergencyCase};
pub use enums::*;
pub use inventory::InventoryItem;
pub use lab::LabOrder;
pub use patient::Patient;
pub use prescription::Prescription;
pub use radiology::Scan;
pub use stats::{DashboardStats, Disease};
pub use surgery::Surgery;
pub use triage::{TriageAssessment, Vitals};
pub use user::User;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Fresh record id for locally created records.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
