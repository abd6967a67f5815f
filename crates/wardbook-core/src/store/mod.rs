//! In-memory registry of active patients, backed by the patients data file.
//!
//! The registry is insertion-ordered and every mutation persists before the
//! in-memory state is committed, so a failed write never leaves memory and
//! disk disagreeing.

use std::path::PathBuf;

use log::{info, warn};
use thiserror::Error;

use crate::models::PatientRecord;
use crate::persist::{self, PersistError};

/// Registry errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("room {0} is already occupied")]
    RoomOccupied(u32),

    #[error("no active patient with id {0}")]
    NotFound(u32),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub type StoreResult<T> = Result<T, StoreError>;

const FIRST_ID: u32 = 1;

/// The active patient registry.
pub struct PatientStore {
    path: PathBuf,
    records: Vec<PatientRecord>,
    next_id: u32,
}

impl PatientStore {
    /// Open the registry backed by the data file at `path`.
    ///
    /// A missing or empty file is a normal empty start. A file that holds
    /// bytes but not a single whole record is truncated so the garbage is
    /// not reparsed on every start. Any other read failure also falls back
    /// to an empty registry. The ID counter is recomputed as
    /// `max(loaded ids) + 1`, never stored separately.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let records = match persist::load_patients(&path) {
            Ok(outcome) => {
                if outcome.garbage_only {
                    warn!(
                        "{} contained no whole patient record, truncating",
                        path.display()
                    );
                    if let Err(err) = persist::truncate_file(&path) {
                        warn!("failed to truncate {}: {}", path.display(), err);
                    }
                }
                outcome.records
            }
            // A read error is not corrupt data; the file may still hold
            // recoverable records and must be left intact.
            Err(err) => {
                warn!(
                    "failed to load {}, starting with an empty registry: {}",
                    path.display(),
                    err
                );
                Vec::new()
            }
        };

        let next_id = records
            .iter()
            .map(|r| r.id)
            .max()
            .map_or(FIRST_ID, |max| max + 1);

        if !records.is_empty() {
            info!(
                "loaded {} active patients from {}",
                records.len(),
                path.display()
            );
        }

        Self {
            path,
            records,
            next_id,
        }
    }

    /// Admit a new patient, assigning the next ID and the current time.
    ///
    /// The record is appended to the data file first and committed to
    /// memory only once the append succeeds. Inputs are assumed to already
    /// satisfy the field bounds; the room must be free.
    pub fn admit(
        &mut self,
        name: String,
        age_years: u32,
        diagnosis: String,
        room_number: u32,
    ) -> StoreResult<&PatientRecord> {
        if self.is_room_occupied(room_number) {
            return Err(StoreError::RoomOccupied(room_number));
        }

        let record = PatientRecord::new(self.next_id, name, age_years, diagnosis, room_number);
        persist::append_patient(&self.path, &record)?;

        self.next_id += 1;
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Look up an active patient by ID.
    pub fn find_by_id(&self, id: u32) -> Option<&PatientRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Whether any active patient occupies the given room.
    pub fn is_room_occupied(&self, room_number: u32) -> bool {
        self.records.iter().any(|r| r.room_number == room_number)
    }

    /// Remove the patient with the given ID and return the removed record.
    ///
    /// The data file is rewritten atomically before the in-memory registry
    /// is touched; if the rewrite fails, memory keeps the patient and the
    /// prior file content stays canonical.
    pub fn remove(&mut self, id: u32) -> StoreResult<PatientRecord> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let staged: Vec<PatientRecord> = self
            .records
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, r)| r.clone())
            .collect();
        persist::rewrite_patients(&self.path, &staged)?;

        Ok(self.records.remove(pos))
    }

    /// Active patients in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PatientRecord> {
        self.records.iter()
    }

    /// Number of active patients.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no active patients.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The ID the next admission will receive.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }
}
