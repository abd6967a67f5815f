//! Append-only text log of rooms freed by discharge.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::path::PathBuf;

use log::{info, warn};

use crate::models::{ROOM_MAX, ROOM_MIN};

/// Per-room usage tallies parsed from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomUsageTally {
    /// Usage count per room, indexed by room number (index 0 unused)
    pub counts: Vec<u32>,
    /// Lines read from the log, valid or not
    pub total_entries: u32,
    /// Lines that parsed to an in-range room number
    pub valid_entries: u32,
}

impl RoomUsageTally {
    fn empty() -> Self {
        Self {
            counts: vec![0; ROOM_MAX as usize + 1],
            total_entries: 0,
            valid_entries: 0,
        }
    }

    /// Rooms with nonzero usage, ascending, with their counts.
    pub fn used_rooms(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .skip(ROOM_MIN as usize)
            .filter(|(_, &count)| count > 0)
            .map(|(room, &count)| (room as u32, count))
    }
}

/// The room-usage log file: one room number per line, appended per discharge.
pub struct RoomUsageLog {
    path: PathBuf,
}

impl RoomUsageLog {
    /// Use the log file at `path`; nothing is opened until needed.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Append a freed room number. Failures are the caller's to report and
    /// must never block a discharge from completing.
    pub fn append(&self, room_number: u32) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", room_number)
    }

    /// Parse the whole log into per-room tallies.
    ///
    /// Out-of-range and unparsable lines are counted, warned about, and
    /// skipped; they never abort the scan. A missing log is an empty tally.
    pub fn load_tally(&self) -> io::Result<RoomUsageTally> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("{} not found, no room usage recorded yet", self.path.display());
                return Ok(RoomUsageTally::empty());
            }
            Err(err) => return Err(err),
        };

        let mut tally = RoomUsageTally::empty();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            tally.total_entries += 1;
            match line.parse::<u32>() {
                Ok(room) if (ROOM_MIN..=ROOM_MAX).contains(&room) => {
                    tally.counts[room as usize] += 1;
                    tally.valid_entries += 1;
                }
                _ => {
                    warn!(
                        "found invalid room number '{}' in {}",
                        line,
                        self.path.display()
                    );
                }
            }
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_append_writes_one_line_per_room() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room_usage.txt");
        let log = RoomUsageLog::new(&path);

        log.append(12).unwrap();
        log.append(3).unwrap();
        log.append(12).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "12\n3\n12\n");
    }

    #[test]
    fn test_tally_counts_and_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room_usage.txt");
        fs::write(&path, "12\n99\nnot-a-room\n3\n12\n0\n").unwrap();

        let tally = RoomUsageLog::new(&path).load_tally().unwrap();
        assert_eq!(tally.total_entries, 6);
        assert_eq!(tally.valid_entries, 3);
        assert_eq!(tally.counts[12], 2);
        assert_eq!(tally.counts[3], 1);

        let used: Vec<(u32, u32)> = tally.used_rooms().collect();
        assert_eq!(used, vec![(3, 1), (12, 2)]);
    }

    #[test]
    fn test_missing_log_is_empty_tally() {
        let dir = tempfile::tempdir().unwrap();
        let tally = RoomUsageLog::new(dir.path().join("room_usage.txt"))
            .load_tally()
            .unwrap();
        assert_eq!(tally.total_entries, 0);
        assert_eq!(tally.used_rooms().count(), 0);
    }
}
