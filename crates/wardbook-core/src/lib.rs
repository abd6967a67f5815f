//! Wardbook Core Library
//!
//! Single-facility patient records management: admissions, an in-memory
//! registry with file-backed persistence, discharge archival, and periodic
//! reporting.
//!
//! # Architecture
//!
//! ```text
//!                 admit ──────────► PatientStore ◄────── search / view
//!                                        │
//!                           append / atomic rewrite
//!                                        │
//!                                  patients.dat
//!
//!             discharge ──► DischargeArchive (append-only .dat)
//!                       └──► RoomUsageLog    (append-only .txt)
//!
//!             reports ────► ReportEngine ──► ReportSink (console + file)
//! ```
//!
//! # Core Principle
//!
//! **Disk is authoritative.** Every mutation persists before it is
//! committed to memory: admissions append to the data file first, removals
//! rewrite it atomically first. A failed write leaves both the file and the
//! in-memory registry exactly as they were.
//!
//! # Modules
//!
//! - [`models`]: domain types (PatientRecord, DischargeRecord) and bounds
//! - [`store`]: the active patient registry
//! - [`persist`]: fixed-size binary codec and the rewrite/append protocol
//! - [`archive`]: append-only discharge archive with window queries
//! - [`report`]: time-windowed admission/discharge/room-usage reports
//! - [`roomlog`]: append-only text log of freed rooms
//! - [`config`]: on-disk layout

pub mod archive;
pub mod config;
pub mod models;
pub mod persist;
pub mod report;
pub mod roomlog;
pub mod store;

// Re-export commonly used types
pub use archive::DischargeArchive;
pub use config::DataPaths;
pub use models::{DischargeRecord, PatientRecord};
pub use report::{FileTeeSink, ReportEngine, ReportSink, TimeWindow};
pub use roomlog::RoomUsageLog;
pub use store::{PatientStore, StoreError};

use chrono::Local;
use log::warn;
use thiserror::Error;

/// Top-level errors for ward operations.
#[derive(Error, Debug)]
pub enum WardError {
    #[error(transparent)]
    Store(#[from] store::StoreError),

    #[error("archive error: {0}")]
    Archive(#[from] persist::PersistError),

    #[error(transparent)]
    Report(#[from] report::ReportError),
}

pub type WardResult<T> = Result<T, WardError>;

/// The facility's patient records, as one owned handle.
///
/// Owns the registry, the discharge archive, and the room-usage log, so
/// there is exactly one writer for each backing file for the life of the
/// process.
pub struct Ward {
    paths: DataPaths,
    store: PatientStore,
    archive: DischargeArchive,
    room_log: RoomUsageLog,
}

impl Ward {
    /// Open the ward over the given file layout, loading any existing
    /// active patients.
    pub fn open(paths: DataPaths) -> Self {
        let store = PatientStore::open(&paths.patients);
        let archive = DischargeArchive::new(&paths.discharged);
        let room_log = RoomUsageLog::new(&paths.room_usage);
        Self {
            paths,
            store,
            archive,
            room_log,
        }
    }

    /// Admit a patient. Inputs must already satisfy the bounds in
    /// [`models`]; the room must be free (see [`Ward::room_occupied`]).
    pub fn admit(
        &mut self,
        name: String,
        age_years: u32,
        diagnosis: String,
        room_number: u32,
    ) -> WardResult<PatientRecord> {
        Ok(self
            .store
            .admit(name, age_years, diagnosis, room_number)?
            .clone())
    }

    /// Discharge the patient with the given ID.
    ///
    /// The archive append comes first: if it fails the discharge has not
    /// happened and the patient stays active. Then the registry removal
    /// (atomic file rewrite), then a best-effort room-usage log append that
    /// never blocks completion.
    pub fn discharge(&mut self, id: u32) -> WardResult<DischargeRecord> {
        let patient = self
            .store
            .find_by_id(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;

        let record = DischargeRecord::new(patient);
        self.archive.append(&record)?;
        self.store.remove(id)?;

        if let Err(err) = self.room_log.append(record.patient.room_number) {
            warn!(
                "failed to log room {} usage: {}",
                record.patient.room_number, err
            );
        }
        Ok(record)
    }

    /// Look up an active patient by ID.
    pub fn find(&self, id: u32) -> Option<&PatientRecord> {
        self.store.find_by_id(id)
    }

    /// Whether an active patient occupies the given room.
    pub fn room_occupied(&self, room_number: u32) -> bool {
        self.store.is_room_occupied(room_number)
    }

    /// Active patients in admission order.
    pub fn patients(&self) -> impl Iterator<Item = &PatientRecord> {
        self.store.iter()
    }

    /// Number of active patients.
    pub fn active_count(&self) -> usize {
        self.store.len()
    }

    /// The file layout this ward was opened over.
    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Render the admission report for `window` through `sink`.
    pub fn admission_report(
        &self,
        window: TimeWindow,
        sink: &mut dyn ReportSink,
    ) -> WardResult<()> {
        self.engine().admission_report(window, Local::now(), sink)?;
        Ok(())
    }

    /// Render the discharge report for `window` through `sink`.
    pub fn discharge_report(
        &self,
        window: TimeWindow,
        sink: &mut dyn ReportSink,
    ) -> WardResult<()> {
        self.engine().discharge_report(window, Local::now(), sink)?;
        Ok(())
    }

    /// Render the room-usage report through `sink`.
    pub fn room_usage_report(&self, sink: &mut dyn ReportSink) -> WardResult<()> {
        self.engine().room_usage_report(sink)?;
        Ok(())
    }

    fn engine(&self) -> ReportEngine<'_> {
        ReportEngine::new(&self.store, &self.archive, &self.room_log)
    }
}
