//! The bus: an append-only, line-oriented log every role reads and writes.
//!
//! The log is a plain text file, one entry per line (see [`BusEntry`]).
//! It is the only state roles share. Nothing on it is ever rewritten;
//! a step counts as done once the next step's entry exists.
//!
//! Each append holds an exclusive lock for exactly one entry, and each
//! read holds a shared lock for one snapshot, so no reader ever sees a
//! torn line.

mod history;

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tracing::debug;

use crate::model::{BusEntry, Role, Status};

pub use history::History;

/// Errors that can occur reading or writing the bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("invalid task id {0:?}: expected a single token without whitespace or brackets")]
    InvalidTaskId(String),

    #[error("bus I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, BusError>;

/// Handle to the log file backing the bus.
#[derive(Debug, Clone)]
pub struct Bus {
    path: PathBuf,
}

impl Bus {
    /// Points a bus at a log file. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as one line under an exclusive lock.
    pub fn append(&self, entry: &BusEntry) -> Result<()> {
        if !BusEntry::is_valid_task_id(&entry.task_id) {
            return Err(BusError::InvalidTaskId(entry.task_id.clone()));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = entry.to_string();
        line.push('\n');

        FileExt::lock_exclusive(&file)?;
        let written = file
            .write_all(line.as_bytes())
            .and_then(|()| file.flush());
        let unlocked = FileExt::unlock(&file);
        written?;
        unlocked?;

        debug!(
            to = %entry.to,
            from = %entry.from,
            task_id = %entry.task_id,
            status = entry.status.as_str(),
            "appended bus entry"
        );
        Ok(())
    }

    /// Convenience for building and appending an entry in one call.
    pub fn post(
        &self,
        to: Role,
        from: Role,
        task_id: &str,
        status: Status,
        message: impl AsRef<str>,
    ) -> Result<()> {
        self.append(&BusEntry::new(to, from, task_id, status, message))
    }

    /// Reads the whole log under a shared lock.
    ///
    /// A log that doesn't exist yet reads as empty.
    pub fn read_all(&self) -> Result<String> {
        let mut file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(String::new()),
            Err(e) => return Err(e.into()),
        };
        let mut raw = Vec::new();

        FileExt::lock_shared(&file)?;
        let read = file.read_to_end(&mut raw);
        let unlocked = FileExt::unlock(&file);
        read?;
        unlocked?;

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Parses every well-formed entry, in append order.
    pub fn entries(&self) -> Result<Vec<BusEntry>> {
        Ok(self
            .read_all()?
            .lines()
            .filter_map(BusEntry::parse)
            .collect())
    }

    /// Takes a snapshot of the log for dedup scans.
    pub fn history(&self) -> Result<History> {
        Ok(History::new(self.entries()?))
    }

    /// `TODO` entries addressed to `role`, in append order.
    pub fn todo_for(&self, role: Role) -> Result<Vec<BusEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.to == role && e.status == Status::Todo)
            .collect())
    }

    /// The last `n` non-empty raw lines, for operators watching progress.
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let raw = self.read_all()?;
        let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
    }

    /// Truncates the log, discarding all history.
    ///
    /// Only for operators starting over. Never called by a role.
    pub fn reset(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let file = fs::OpenOptions::new().write(true).open(&self.path)?;
        FileExt::lock_exclusive(&file)?;
        let truncated = file.set_len(0);
        let unlocked = FileExt::unlock(&file);
        truncated?;
        unlocked?;
        debug!(path = %self.path.display(), "bus reset");
        Ok(())
    }
}
