//! Persistence of the "last successful run" marker used by incremental runs.

use crate::error::{Error, Result};
use crate::timestamp::unix_floor;
use log::{debug, trace};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Reads and writes the run marker file, a single base-10 UNIX timestamp.
#[derive(Debug, Clone)]
pub struct RunTracker {
    marker_path: PathBuf,
}

/// Start of a run, captured before the first template is read.
#[derive(Debug, Clone, Copy)]
pub struct RunStart(SystemTime);

impl RunStart {
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    pub fn time(&self) -> SystemTime {
        self.0
    }
}

impl From<SystemTime> for RunStart {
    fn from(time: SystemTime) -> Self {
        Self(time)
    }
}

impl RunTracker {
    pub fn new<P: Into<PathBuf>>(marker_path: P) -> Self {
        Self { marker_path: marker_path.into() }
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Returns the persisted timestamp, or `None` if there was no previous run.
    ///
    /// # Errors
    /// * `Error::RunMarkerError` if the marker does not hold an integer
    /// * `Error::IoError` if the marker exists but cannot be read
    pub fn last_run(&self) -> Result<Option<i64>> {
        let content = match fs::read_to_string(&self.marker_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No previous run recorded in '{}'", self.marker_path.display());
                return Ok(None);
            }
            Err(e) => return Err(Error::IoError(e)),
        };

        let trimmed = content.trim();
        trimmed.parse::<i64>().map(Some).map_err(|_| Error::RunMarkerError {
            path: self.marker_path.display().to_string(),
            content: trimmed.to_string(),
        })
    }

    /// Modification cutoff for the next walk. A full run, or an incremental
    /// run without a previous marker, has no cutoff.
    pub fn cutoff(&self, only_modified: bool) -> Result<Option<i64>> {
        if !only_modified {
            return Ok(None);
        }
        let cutoff = self.last_run()?;
        if cutoff.is_none() {
            debug!("Falling back to a full run");
        }
        Ok(cutoff)
    }

    /// Persists the start of a run, rounded down, if the run processed any
    /// template. Returns whether the marker was written.
    pub fn commit(&self, start: RunStart, processed_templates: usize) -> Result<bool> {
        if processed_templates == 0 {
            trace!("Nothing processed, keeping '{}'", self.marker_path.display());
            return Ok(false);
        }

        let timestamp = unix_floor(start.time());
        fs::write(&self.marker_path, timestamp.to_string())?;
        debug!("Saved time of run ({timestamp}) to '{}'", self.marker_path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn test_missing_marker_means_full_run() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = RunTracker::new(temp_dir.path().join(".last_run"));

        assert_eq!(tracker.last_run().unwrap(), None);
        assert_eq!(tracker.cutoff(true).unwrap(), None);
    }

    #[test]
    fn test_full_run_ignores_marker() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join(".last_run");
        fs::write(&marker, "1700000000").unwrap();

        let tracker = RunTracker::new(&marker);
        assert_eq!(tracker.cutoff(false).unwrap(), None);
        assert_eq!(tracker.cutoff(true).unwrap(), Some(1_700_000_000));
    }

    #[test]
    fn test_commit_rounds_start_down() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join(".last_run");
        let tracker = RunTracker::new(&marker);

        let start = RunStart::from(UNIX_EPOCH + Duration::from_millis(1_700_000_000_999));
        assert!(tracker.commit(start, 1).unwrap());
        assert_eq!(fs::read_to_string(&marker).unwrap(), "1700000000");
    }

    #[test]
    fn test_commit_without_templates_keeps_marker() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join(".last_run");
        fs::write(&marker, "42\n").unwrap();
        let tracker = RunTracker::new(&marker);

        assert!(!tracker.commit(RunStart::now(), 0).unwrap());
        assert_eq!(tracker.last_run().unwrap(), Some(42));
    }

    #[test]
    fn test_broken_marker() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join(".last_run");
        fs::write(&marker, "yesterday").unwrap();

        match RunTracker::new(&marker).last_run() {
            Err(Error::RunMarkerError { content, .. }) => assert_eq!(content, "yesterday"),
            other => panic!("Expected RunMarkerError, got {other:?}"),
        }
    }
}
