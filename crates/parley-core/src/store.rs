//! Append-only session log: one JSON record per line.
//!
//! Records are self-contained, so a corrupt line costs exactly one session:
//! loading skips it and keeps going. Appends never rewrite earlier content.

use crate::error::{CoachError, CoachResult};
use crate::model::SessionRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one completed session as a new line, fsyncing before return.
    pub fn append(&self, record: &SessionRecord) -> CoachResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| CoachError::Persistence(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoachError::Persistence(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| CoachError::Persistence(e.to_string()))?;
        file.sync_all()
            .map_err(|e| CoachError::Persistence(e.to_string()))?;
        info!(path = %self.path.display(), "session appended to log");
        Ok(())
    }

    /// Read every session in file order (oldest first). A missing log file
    /// is an empty history, not an error; an unparseable line is skipped
    /// with a warning.
    pub fn load_all(&self) -> CoachResult<Vec<SessionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| CoachError::Persistence(e.to_string()))?;
        let mut sessions = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(line) {
                Ok(record) => sessions.push(record),
                Err(e) => warn!(
                    line = idx + 1,
                    "skipping corrupt session record: {e}"
                ),
            }
        }
        Ok(sessions)
    }
}
