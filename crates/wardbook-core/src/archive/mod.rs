//! Append-only archive of discharged patients.
//!
//! Records are only ever appended; nothing here rewrites or deletes. The
//! window queries scan the whole file on every call, which is fine at the
//! archive sizes a single facility produces.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::warn;

use crate::models::DischargeRecord;
use crate::persist::{self, PersistResult, DISCHARGE_RECORD_SIZE};
use crate::report::TimeWindow;

/// The discharge archive file.
pub struct DischargeArchive {
    path: PathBuf,
}

impl DischargeArchive {
    /// Use the archive file at `path`; nothing is opened until needed.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Append one discharge record.
    ///
    /// A discharge is not complete until this has succeeded; callers must
    /// sequence the registry removal after a successful append.
    pub fn append(&self, record: &DischargeRecord) -> PersistResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&persist::encode_discharge(record))?;
        Ok(())
    }

    /// Every archived discharge, oldest first. A missing file is an empty
    /// archive; a truncated trailing record ends the scan.
    pub fn load_all(&self) -> PersistResult<Vec<DischargeRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut reader = BufReader::new(file);
        let mut records = Vec::new();
        let mut buf = [0u8; DISCHARGE_RECORD_SIZE];
        loop {
            let filled = persist::read_record(&mut reader, &mut buf)?;
            if filled == 0 {
                break;
            }
            if filled < DISCHARGE_RECORD_SIZE {
                warn!(
                    "{}: discarding {} trailing bytes (truncated discharge record)",
                    self.path.display(),
                    filled
                );
                break;
            }
            records.push(persist::decode_discharge(&buf));
        }
        Ok(records)
    }

    /// Count archived discharges whose timestamp falls in `window`.
    pub fn count_in_window(
        &self,
        window: TimeWindow,
        now: DateTime<Local>,
    ) -> PersistResult<usize> {
        Ok(self.list_in_window(window, now)?.len())
    }

    /// Archived discharges whose timestamp falls in `window`, oldest first.
    pub fn list_in_window(
        &self,
        window: TimeWindow,
        now: DateTime<Local>,
    ) -> PersistResult<Vec<DischargeRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|r| window.contains(r.discharged_at, now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientRecord;
    use chrono::{Duration, Utc};
    use std::fs;

    fn discharged(id: u32, ago: Duration) -> DischargeRecord {
        let patient = PatientRecord::new(id, format!("P{}", id), 30, "Flu".into(), id);
        DischargeRecord {
            patient,
            discharged_at: Utc::now() - ago,
        }
    }

    #[test]
    fn test_append_and_load_all() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DischargeArchive::new(dir.path().join("discharged_patients.dat"));

        archive.append(&discharged(1, Duration::hours(2))).unwrap();
        archive.append(&discharged(2, Duration::hours(3))).unwrap();

        let records = archive.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].patient.id, 1);
        assert_eq!(records[1].patient.id, 2);
    }

    #[test]
    fn test_missing_archive_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DischargeArchive::new(dir.path().join("discharged_patients.dat"));
        assert!(archive.load_all().unwrap().is_empty());
        assert_eq!(
            archive
                .count_in_window(TimeWindow::Monthly, Local::now())
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_daily_window_filters_old_discharges() {
        let dir = tempfile::tempdir().unwrap();
        let archive = DischargeArchive::new(dir.path().join("discharged_patients.dat"));

        archive.append(&discharged(1, Duration::hours(2))).unwrap();
        archive.append(&discharged(2, Duration::days(60))).unwrap();

        let now = Local::now();
        let daily = archive.list_in_window(TimeWindow::Daily, now).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].patient.id, 1);
        assert_eq!(archive.count_in_window(TimeWindow::Daily, now).unwrap(), 1);
    }

    #[test]
    fn test_truncated_tail_ends_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discharged_patients.dat");
        let archive = DischargeArchive::new(&path);

        archive.append(&discharged(1, Duration::hours(1))).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0xff; 10]);
        fs::write(&path, &bytes).unwrap();

        assert_eq!(archive.load_all().unwrap().len(), 1);
    }
}
