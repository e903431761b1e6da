//! Task documents: the user request, requirement, and delivery summary.
//!
//! Each task gets its own directory keyed by a sanitized task ID:
//!
//! ```text
//! <root>/<task_id>/
//!   user_task.txt     # written once by the orchestrator
//!   requirement.md    # written by the Leader
//!   delivery.md       # written by the Leader on announcement
//! ```
//!
//! Every document kind has exactly one writer, so no locking is needed.
//! A document that was never written loads as an empty string.

use std::{fs, io, path::PathBuf};

/// The three documents a task can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    UserTask,
    Requirement,
    Delivery,
}

impl DocumentKind {
    fn file_name(self) -> &'static str {
        match self {
            Self::UserTask => "user_task.txt",
            Self::Requirement => "requirement.md",
            Self::Delivery => "delivery.md",
        }
    }
}

/// Errors that can occur reading or writing task documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, DocumentError>;

/// File-based store for per-task documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Creates a store rooted at the given directory.
    ///
    /// Nothing is created on disk until the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes a document, creating the task directory if needed.
    ///
    /// Surrounding whitespace is trimmed. Returns the written path.
    pub fn save(&self, task_id: &str, kind: DocumentKind, content: &str) -> Result<PathBuf> {
        let dir = self.task_dir(task_id);
        fs::create_dir_all(&dir)?;
        let path = dir.join(kind.file_name());
        fs::write(&path, content.trim())?;
        Ok(path)
    }

    /// Reads a document, trimmed. Missing documents read as `""`.
    pub fn load(&self, task_id: &str, kind: DocumentKind) -> Result<String> {
        match fs::read_to_string(self.path(task_id, kind)) {
            Ok(s) => Ok(s.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Where a document lives (or would live).
    pub fn path(&self, task_id: &str, kind: DocumentKind) -> PathBuf {
        self.task_dir(task_id).join(kind.file_name())
    }

    fn task_dir(&self, task_id: &str) -> PathBuf {
        self.root.join(sanitize_task_id(task_id))
    }
}

/// Turns a task ID into a single safe path component.
///
/// Path separators and whitespace become `_`. Results that would be
/// empty or refer to `.`/`..` are prefixed so they stay inside the root.
pub fn sanitize_task_id(task_id: &str) -> String {
    let key: String = task_id
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if key.chars().all(|c| c == '.') {
        format!("_{key}")
    } else {
        key
    }
}
