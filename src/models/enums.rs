/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire form (serde) is the same string as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err($crate::models::ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

pub(crate) use str_enum;

str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Patient => "patient",
    Lab => "lab",
    Pharmacy => "pharmacy",
    Billing => "billing",
    Reception => "reception",
    Triage => "triage",
    Radiology => "radiology",
    Surgery => "surgery",
    Emergency => "emergency",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    CheckedIn => "checked_in",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(PrescriptionStatus {
    Pending => "pending",
    Dispensed => "dispensed",
    Cancelled => "cancelled",
});

str_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Waived => "waived",
});

str_enum!(BillCategory {
    Consultation => "consultation",
    Lab => "lab",
    Radiology => "radiology",
    Pharmacy => "pharmacy",
    Surgery => "surgery",
    Room => "room",
    Other => "other",
});

str_enum!(AlertLevel {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(LabOrderStatus {
    Ordered => "ordered",
    InProgress => "in_progress",
    Completed => "completed",
});

str_enum!(ScanModality {
    XRay => "x_ray",
    Ct => "ct",
    Mri => "mri",
    Ultrasound => "ultrasound",
});

str_enum!(ScanStatus {
    Requested => "requested",
    Scheduled => "scheduled",
    Completed => "completed",
});

str_enum!(SurgeryStatus {
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Completed => "completed",
    Postponed => "postponed",
    Cancelled => "cancelled",
});

str_enum!(AmbulanceStatus {
    Available => "available",
    Dispatched => "dispatched",
    Returning => "returning",
    Maintenance => "maintenance",
});

str_enum!(TriagePriority {
    Immediate => "immediate",
    Urgent => "urgent",
    Standard => "standard",
    NonUrgent => "non_urgent",
});

impl TriagePriority {
    /// Lower rank is seen first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Immediate => 0,
            Self::Urgent => 1,
            Self::Standard => 2,
            Self::NonUrgent => 3,
        }
    }
}
