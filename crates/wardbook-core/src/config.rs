//! On-disk layout configuration.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths to the five persisted files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPaths {
    /// Active patients, fixed-size binary records
    pub patients: PathBuf,
    /// Discharge archive, fixed-size binary records, append-only
    pub discharged: PathBuf,
    /// Freed room numbers, one per line
    pub room_usage: PathBuf,
    /// Admission report transcripts, append-only text
    pub admission_reports: PathBuf,
    /// Discharge report transcripts, append-only text
    pub discharge_reports: PathBuf,
}

impl DataPaths {
    /// The standard file names, rooted in `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            patients: dir.join("patients.dat"),
            discharged: dir.join("discharged_patients.dat"),
            room_usage: dir.join("room_usage.txt"),
            admission_reports: dir.join("patient_reports.txt"),
            discharge_reports: dir.join("discharged_reports.txt"),
        }
    }

    /// Load a layout from a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
