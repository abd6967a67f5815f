//! Patient and discharge record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum patient name length in bytes.
pub const NAME_MIN_LEN: usize = 1;
/// Maximum patient name length in bytes (also the on-disk field width).
pub const NAME_MAX_LEN: usize = 100;
/// Minimum diagnosis length in bytes.
pub const DIAGNOSIS_MIN_LEN: usize = 1;
/// Maximum diagnosis length in bytes (also the on-disk field width).
pub const DIAGNOSIS_MAX_LEN: usize = 200;
/// Maximum admissible age in years.
pub const AGE_MAX_YEARS: u32 = 130;
/// Lowest valid room number.
pub const ROOM_MIN: u32 = 1;
/// Highest valid room number.
pub const ROOM_MAX: u32 = 50;

/// An active patient record.
///
/// Fields are assumed to already satisfy the bounds constants above;
/// construction never validates. Input validation is the front end's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Registry-wide unique ID, assigned monotonically at admission
    pub id: u32,
    /// Patient name (1..=100 bytes)
    pub name: String,
    /// Age in years (0..=130)
    pub age_years: u32,
    /// Diagnosis text (1..=200 bytes)
    pub diagnosis: String,
    /// Room number (1..=50), unique among active patients
    pub room_number: u32,
    /// Admission timestamp, set at creation
    pub admitted_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Create a new record with the given ID, stamped with the current time.
    pub fn new(id: u32, name: String, age_years: u32, diagnosis: String, room_number: u32) -> Self {
        Self {
            id,
            name,
            age_years,
            diagnosis,
            room_number,
            admitted_at: Utc::now(),
        }
    }
}

/// A discharged patient: the record as of discharge plus the discharge time.
///
/// Created only by the discharge operation and never modified afterwards;
/// the archive it lands in is append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DischargeRecord {
    /// Snapshot of the patient at the moment of discharge
    pub patient: PatientRecord,
    /// Discharge timestamp
    pub discharged_at: DateTime<Utc>,
}

impl DischargeRecord {
    /// Snapshot a patient record at the current time.
    pub fn new(patient: PatientRecord) -> Self {
        Self {
            patient,
            discharged_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = PatientRecord::new(1, "Alice".into(), 30, "Flu".into(), 12);
        assert_eq!(patient.id, 1);
        assert_eq!(patient.name, "Alice");
        assert_eq!(patient.age_years, 30);
        assert_eq!(patient.diagnosis, "Flu");
        assert_eq!(patient.room_number, 12);
    }

    #[test]
    fn test_discharge_snapshot() {
        let patient = PatientRecord::new(7, "Bob".into(), 40, "Cold".into(), 3);
        let discharge = DischargeRecord::new(patient.clone());
        assert_eq!(discharge.patient, patient);
        assert!(discharge.discharged_at >= patient.admitted_at);
    }
}
