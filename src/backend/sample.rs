//! Seed records for offline mode and the mock server.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use super::Resource;
use crate::models::*;

pub fn doctors() -> Vec<Doctor> {
    [
        ("D1", "Dr. Amara Okafor", "cardiology", "Cardiology"),
        ("D2", "Dr. Lucas Brandt", "orthopedics", "Orthopedics"),
        ("D3", "Dr. Mei Tanaka", "pediatrics", "Pediatrics"),
        ("D4", "Dr. Samuel Reyes", "general surgery", "Surgery"),
    ]
    .into_iter()
    .map(|(id, name, specialty, department)| Doctor {
        id: id.into(),
        name: name.into(),
        email: format!("{}@wardflow.example", id.to_lowercase()),
        specialty: specialty.into(),
        department: department.into(),
        phone: String::new(),
        available: id != "D4",
    })
    .collect()
}

pub fn departments() -> Vec<Department> {
    [
        ("DEP1", "Cardiology", Some("D1"), 24),
        ("DEP2", "Orthopedics", Some("D2"), 18),
        ("DEP3", "Pediatrics", Some("D3"), 30),
        ("DEP4", "Surgery", Some("D4"), 12),
        ("DEP5", "Emergency", None, 20),
    ]
    .into_iter()
    .map(|(id, name, head, beds)| Department {
        id: id.into(),
        name: name.into(),
        head: head.map(String::from),
        beds,
    })
    .collect()
}

pub fn patients() -> Vec<Patient> {
    let now = Utc::now();
    [
        ("P1", "Jane Doe", "jane@x.com", 34, "female", Some("Hypertension"), Some("D1")),
        ("P2", "Omar Haddad", "omar@x.com", 58, "male", Some("Knee pain"), Some("D2")),
        ("P3", "Lily Chen", "lily@x.com", 7, "female", None, Some("D3")),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (id, name, email, age, gender, condition, doctor))| Patient {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        phone: format!("555-010{i}"),
        age,
        gender: gender.into(),
        condition: condition.map(String::from),
        assigned_doctor_id: doctor.map(String::from),
        registered_at: now - Duration::days(30 - i as i64),
    })
    .collect()
}

pub fn users() -> Vec<User> {
    [
        ("U1", "Admin", "admin@wardflow.example", Role::Admin),
        ("U2", "Dr. Amara Okafor", "d1@wardflow.example", Role::Doctor),
        ("U3", "Rita Front", "reception@wardflow.example", Role::Reception),
        ("U4", "Jane Doe", "jane@x.com", Role::Patient),
        ("U5", "Paul Pharm", "pharmacy@wardflow.example", Role::Pharmacy),
    ]
    .into_iter()
    .map(|(id, name, email, role)| User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        active: true,
    })
    .collect()
}

pub fn appointments() -> Vec<Appointment> {
    let now = Utc::now();
    vec![
        Appointment {
            id: "A1".into(),
            patient_id: "P1".into(),
            patient_name: "Jane Doe".into(),
            doctor_id: "D1".into(),
            doctor_name: "Dr. Amara Okafor".into(),
            scheduled_for: now + Duration::hours(2),
            reason: "Blood pressure review".into(),
            status: AppointmentStatus::Scheduled,
        },
        Appointment {
            id: "A2".into(),
            patient_id: "P2".into(),
            patient_name: "Omar Haddad".into(),
            doctor_id: "D2".into(),
            doctor_name: "Dr. Lucas Brandt".into(),
            scheduled_for: now + Duration::days(1),
            reason: "Knee follow-up".into(),
            status: AppointmentStatus::Scheduled,
        },
    ]
}

pub fn diseases() -> Vec<Disease> {
    [
        ("DIS1", "Hypertension", "I10"),
        ("DIS2", "Type 2 diabetes", "E11"),
        ("DIS3", "Asthma", "J45"),
    ]
    .into_iter()
    .map(|(id, name, code)| Disease {
        id: id.into(),
        name: name.into(),
        code: code.into(),
        description: String::new(),
    })
    .collect()
}

pub fn prescriptions() -> Vec<Prescription> {
    vec![Prescription {
        id: "RX1".into(),
        patient_id: "P1".into(),
        patient_name: "Jane Doe".into(),
        flow_id: None,
        doctor_id: "D1".into(),
        medication: "Amlodipine".into(),
        dosage: "5mg".into(),
        frequency: "once daily".into(),
        duration_days: 30,
        quantity: 30,
        status: PrescriptionStatus::Pending,
        prescribed_at: Utc::now() - Duration::hours(3),
    }]
}

pub fn inventory() -> Vec<InventoryItem> {
    [
        ("INV1", "Amlodipine 5mg", "cardiovascular", 240, 50, 12),
        ("INV2", "Amoxicillin 500mg", "antibiotic", 35, 40, 25),
        ("INV3", "Paracetamol 500mg", "analgesic", 900, 100, 3),
        ("INV4", "Salbutamol inhaler", "respiratory", 8, 10, 650),
    ]
    .into_iter()
    .map(|(id, name, category, quantity, reorder_level, unit_price_cents)| InventoryItem {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        quantity,
        reorder_level,
        unit_price_cents,
        expires_on: NaiveDate::from_ymd_opt(2028, 12, 31),
    })
    .collect()
}

pub fn bill_items() -> Vec<BillItem> {
    let now = Utc::now();
    [
        ("B1", "Consultation", BillCategory::Consultation, 5_000),
        ("B2", "Lipid panel", BillCategory::Lab, 3_500),
    ]
    .into_iter()
    .map(|(id, description, category, amount_cents)| BillItem {
        id: id.into(),
        patient_id: "P1".into(),
        patient_name: "Jane Doe".into(),
        description: description.into(),
        category,
        amount_cents,
        quantity: 1,
        status: PaymentStatus::Pending,
        created_at: now,
    })
    .collect()
}

pub fn alerts() -> Vec<Alert> {
    vec![Alert {
        id: "AL1".into(),
        level: AlertLevel::Warning,
        source: "pharmacy".into(),
        message: "Salbutamol inhaler below reorder level".into(),
        created_at: Utc::now(),
        acknowledged: false,
    }]
}

pub fn surgeries() -> Vec<Surgery> {
    vec![Surgery {
        id: "S1".into(),
        patient_id: "P2".into(),
        patient_name: "Omar Haddad".into(),
        procedure: "Arthroscopy".into(),
        surgeon_id: "D4".into(),
        surgeon_name: "Dr. Samuel Reyes".into(),
        theatre: "OT-1".into(),
        scheduled_for: Utc::now() + Duration::hours(4),
        status: SurgeryStatus::Scheduled,
        notes: None,
    }]
}

pub fn ambulances() -> Vec<Ambulance> {
    [
        ("AMB1", "KA-01-1001", "Ravi", AmbulanceStatus::Available),
        ("AMB2", "KA-01-1002", "Sofia", AmbulanceStatus::Available),
        ("AMB3", "KA-01-1003", "Tom", AmbulanceStatus::Maintenance),
    ]
    .into_iter()
    .map(|(id, vehicle, driver, status)| Ambulance {
        id: id.into(),
        vehicle_number: vehicle.into(),
        driver: driver.into(),
        status,
        location: Some("Base".into()),
    })
    .collect()
}

/// Every seeded collection as JSON, keyed by resource.
pub fn seed() -> HashMap<Resource, Vec<Value>> {
    let mut data = HashMap::new();
    for resource in Resource::ALL {
        data.insert(*resource, Vec::new());
    }
    data.insert(Resource::Doctors, to_values(&doctors()));
    data.insert(Resource::Departments, to_values(&departments()));
    data.insert(Resource::Patients, to_values(&patients()));
    data.insert(Resource::Users, to_values(&users()));
    data.insert(Resource::Appointments, to_values(&appointments()));
    data.insert(Resource::Diseases, to_values(&diseases()));
    data.insert(Resource::Prescriptions, to_values(&prescriptions()));
    data.insert(Resource::Inventory, to_values(&inventory()));
    data.insert(Resource::Billing, to_values(&bill_items()));
    data.insert(Resource::Alerts, to_values(&alerts()));
    data.insert(Resource::Surgeries, to_values(&surgeries()));
    data.insert(Resource::Ambulances, to_values(&ambulances()));
    data
}

fn to_values<T: Serialize>(records: &[T]) -> Vec<Value> {
    records
        .iter()
        .filter_map(|record| serde_json::to_value(record).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_covers_every_resource() {
        let data = seed();
        for resource in Resource::ALL {
            assert!(data.contains_key(resource), "missing {}", resource.path());
        }
        assert_eq!(data[&Resource::Doctors].len(), doctors().len());
    }

    #[test]
    fn sample_inventory_has_low_stock() {
        assert!(inventory().iter().any(|item| item.is_low_stock()));
    }

    #[test]
    fn sample_patient_matches_sample_user() {
        let jane_user = users().into_iter().find(|u| u.role == Role::Patient).unwrap();
        assert!(patients().iter().any(|p| p.email == jane_user.email));
    }
}
