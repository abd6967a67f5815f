//! File-backed persistence for patient and discharge records.
//!
//! Records are stored as fixed-size little-endian structs, read back
//! sequentially until end of file. A short trailing read marks the end of
//! valid data rather than failing the whole load. Full rewrites go through
//! a temporary file promoted by delete-then-rename, so the canonical file
//! is never observed half-written.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

use chrono::DateTime;
use log::{info, warn};
use thiserror::Error;

use crate::models::{DischargeRecord, PatientRecord, DIAGNOSIS_MAX_LEN, NAME_MAX_LEN};

/// Persistence errors.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// On-disk size of one patient record:
/// id (4) + age (4) + room (4) + admitted_at unix seconds (8)
/// + NUL-padded name + NUL-padded diagnosis.
pub const PATIENT_RECORD_SIZE: usize = 4 + 4 + 4 + 8 + NAME_MAX_LEN + DIAGNOSIS_MAX_LEN;

/// On-disk size of one discharge record: a patient record plus the
/// discharge timestamp.
pub const DISCHARGE_RECORD_SIZE: usize = PATIENT_RECORD_SIZE + 8;

/// Encode a patient record into its fixed-size on-disk form.
pub fn encode_patient(record: &PatientRecord) -> [u8; PATIENT_RECORD_SIZE] {
    let mut buf = [0u8; PATIENT_RECORD_SIZE];
    buf[0..4].copy_from_slice(&record.id.to_le_bytes());
    buf[4..8].copy_from_slice(&record.age_years.to_le_bytes());
    buf[8..12].copy_from_slice(&record.room_number.to_le_bytes());
    buf[12..20].copy_from_slice(&record.admitted_at.timestamp().to_le_bytes());
    write_text(&mut buf[20..20 + NAME_MAX_LEN], &record.name);
    write_text(&mut buf[20 + NAME_MAX_LEN..], &record.diagnosis);
    buf
}

/// Decode a patient record from its fixed-size on-disk form.
pub fn decode_patient(buf: &[u8; PATIENT_RECORD_SIZE]) -> PatientRecord {
    let id = u32::from_le_bytes(buf[0..4].try_into().unwrap_or_default());
    let age_years = u32::from_le_bytes(buf[4..8].try_into().unwrap_or_default());
    let room_number = u32::from_le_bytes(buf[8..12].try_into().unwrap_or_default());
    let secs = i64::from_le_bytes(buf[12..20].try_into().unwrap_or_default());
    PatientRecord {
        id,
        name: read_text(&buf[20..20 + NAME_MAX_LEN]),
        age_years,
        diagnosis: read_text(&buf[20 + NAME_MAX_LEN..]),
        room_number,
        admitted_at: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
    }
}

/// Encode a discharge record: the embedded patient followed by the
/// discharge timestamp.
pub fn encode_discharge(record: &DischargeRecord) -> [u8; DISCHARGE_RECORD_SIZE] {
    let mut buf = [0u8; DISCHARGE_RECORD_SIZE];
    buf[..PATIENT_RECORD_SIZE].copy_from_slice(&encode_patient(&record.patient));
    buf[PATIENT_RECORD_SIZE..].copy_from_slice(&record.discharged_at.timestamp().to_le_bytes());
    buf
}

/// Decode a discharge record from its fixed-size on-disk form.
pub fn decode_discharge(buf: &[u8; DISCHARGE_RECORD_SIZE]) -> DischargeRecord {
    let mut patient_buf = [0u8; PATIENT_RECORD_SIZE];
    patient_buf.copy_from_slice(&buf[..PATIENT_RECORD_SIZE]);
    let secs = i64::from_le_bytes(buf[PATIENT_RECORD_SIZE..].try_into().unwrap_or_default());
    DischargeRecord {
        patient: decode_patient(&patient_buf),
        discharged_at: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
    }
}

fn write_text(field: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}

fn read_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Fill `buf` from the reader, returning how many bytes were read.
///
/// Returns less than `buf.len()` only at end of file.
pub(crate) fn read_record(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Result of scanning a patient data file.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Whole records decoded, in file order
    pub records: Vec<PatientRecord>,
    /// True when the file held bytes but not one whole record. This is the
    /// only condition under which callers may truncate the file; an I/O
    /// error mid-read never sets it.
    pub garbage_only: bool,
}

/// Load every whole patient record from `path`.
///
/// A missing file is a normal "no data" start. A short trailing read is
/// treated as the end of valid data: the partial record is discarded with a
/// warning, not surfaced as an error. `garbage_only` distinguishes a file
/// that decoded to nothing from one that was empty or unreadable.
pub fn load_patients(path: &Path) -> PersistResult<LoadOutcome> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("{} not found, starting with an empty registry", path.display());
            return Ok(LoadOutcome {
                records: Vec::new(),
                garbage_only: false,
            });
        }
        Err(err) => return Err(err.into()),
    };

    let mut reader = io::BufReader::new(file);
    let mut records = Vec::new();
    let mut saw_data = false;
    let mut buf = [0u8; PATIENT_RECORD_SIZE];
    loop {
        let filled = read_record(&mut reader, &mut buf)?;
        if filled == 0 {
            break;
        }
        saw_data = true;
        if filled < PATIENT_RECORD_SIZE {
            warn!(
                "{}: discarding {} trailing bytes (truncated record)",
                path.display(),
                filled
            );
            break;
        }
        records.push(decode_patient(&buf));
    }

    let garbage_only = saw_data && records.is_empty();
    Ok(LoadOutcome {
        records,
        garbage_only,
    })
}

/// Rewrite `path` with exactly the given records.
///
/// Writes to a sibling temporary file first, then promotes it with
/// delete-then-rename. On any failure the temporary file is discarded and
/// the canonical file is left untouched.
pub fn rewrite_patients(path: &Path, records: &[PatientRecord]) -> PersistResult<()> {
    let tmp = path.with_extension("tmp");

    if let Err(err) = write_all_records(&tmp, records) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

fn write_all_records(path: &Path, records: &[PatientRecord]) -> PersistResult<()> {
    let mut file = File::create(path)?;
    for record in records {
        file.write_all(&encode_patient(record))?;
    }
    file.sync_all()?;
    Ok(())
}

/// Append a single patient record to `path`, creating the file if needed.
pub fn append_patient(path: &Path, record: &PatientRecord) -> PersistResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&encode_patient(record))?;
    Ok(())
}

/// Truncate `path` to zero length, discarding its contents.
pub fn truncate_file(path: &Path) -> PersistResult<()> {
    File::create(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample(id: u32, room: u32) -> PatientRecord {
        PatientRecord::new(id, format!("Patient {}", id), 30 + id, "Observation".into(), room)
    }

    #[test]
    fn test_rewrite_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");

        let records = vec![sample(1, 12), sample(2, 7), sample(3, 40)];
        rewrite_patients(&path, &records).unwrap();

        let loaded = load_patients(&path).unwrap().records;
        assert_eq!(loaded.len(), 3);
        for (written, read) in records.iter().zip(&loaded) {
            assert_eq!(read.id, written.id);
            assert_eq!(read.name, written.name);
            assert_eq!(read.age_years, written.age_years);
            assert_eq!(read.diagnosis, written.diagnosis);
            assert_eq!(read.room_number, written.room_number);
            // Sub-second precision is dropped on disk
            assert_eq!(read.admitted_at.timestamp(), written.admitted_at.timestamp());
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load_patients(&dir.path().join("patients.dat")).unwrap();
        assert!(outcome.records.is_empty());
        assert!(!outcome.garbage_only);
    }

    #[test]
    fn test_load_empty_file_is_not_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");
        fs::write(&path, []).unwrap();

        let outcome = load_patients(&path).unwrap();
        assert!(outcome.records.is_empty());
        assert!(!outcome.garbage_only);
    }

    #[test]
    fn test_truncated_trailing_record_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");

        let mut bytes = encode_patient(&sample(1, 12)).to_vec();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe]);
        fs::write(&path, &bytes).unwrap();

        let outcome = load_patients(&path).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].id, 1);
        // A valid prefix means the file is not garbage-only
        assert!(!outcome.garbage_only);
    }

    #[test]
    fn test_garbage_only_file_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");
        fs::write(&path, [0x01, 0x02, 0x03]).unwrap();

        let outcome = load_patients(&path).unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.garbage_only);
    }

    #[test]
    fn test_rewrite_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");

        rewrite_patients(&path, &[sample(1, 12), sample(2, 7)]).unwrap();
        rewrite_patients(&path, &[sample(2, 7)]).unwrap();

        let loaded = load_patients(&path).unwrap().records;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 2);
        // Temp file never lingers
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_rewrite_leaves_canonical_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");

        rewrite_patients(&path, &[sample(1, 12)]).unwrap();
        let before = fs::read(&path).unwrap();

        // A directory squatting on the temp path makes its creation fail
        fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(rewrite_patients(&path, &[sample(2, 7)]).is_err());

        assert_eq!(fs::read(&path).unwrap(), before);
        let loaded = load_patients(&path).unwrap().records;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 1);
    }

    #[test]
    fn test_append_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.dat");

        append_patient(&path, &sample(1, 12)).unwrap();
        append_patient(&path, &sample(2, 7)).unwrap();

        let loaded = load_patients(&path).unwrap().records;
        assert_eq!(loaded.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_discharge_codec_round_trip() {
        let discharge = DischargeRecord::new(sample(5, 33));
        let decoded = decode_discharge(&encode_discharge(&discharge));
        assert_eq!(decoded.patient.id, 5);
        assert_eq!(decoded.patient.room_number, 33);
        assert_eq!(
            decoded.discharged_at.timestamp(),
            discharge.discharged_at.timestamp()
        );
    }

    #[test]
    fn test_overlong_name_is_clipped_to_field() {
        let mut record = sample(1, 12);
        record.name = "x".repeat(NAME_MAX_LEN + 40);
        let decoded = decode_patient(&encode_patient(&record));
        assert_eq!(decoded.name.len(), NAME_MAX_LEN);
    }
}
