//! Bus entries and their one-line grammar.
//!
//! Every entry is written as a single line:
//!
//! ```text
//! <timestamp> | [To: <role>] [From: <role>] [TaskID: <token>] [Status: TODO|DONE] <message>
//! ```
//!
//! Lines that don't match are ignored by the parser, so stray text in the
//! log never breaks a reader.

use std::{fmt, str::FromStr, sync::LazyLock};

use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use regex::Regex;

use super::Role;

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2}T\S+)\s+\|\s+\[To:\s*(\w+)\]\s+\[From:\s*(\w+)\]\s+\[TaskID:\s*([^\s\[\]]+)\]\s+\[Status:\s*(TODO|DONE)\](.*)$",
    )
    .expect("entry grammar is a valid regex")
});

/// Whether an entry still asks for work or reports finished work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Todo,
    Done,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::Done => "DONE",
        }
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(Self::Todo),
            "DONE" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

/// One immutable record on the bus.
///
/// Append order is authoritative. The timestamp is informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEntry {
    pub timestamp: Timestamp,
    pub to: Role,
    pub from: Role,
    pub task_id: String,
    pub status: Status,
    pub message: String,
}

impl BusEntry {
    /// Creates an entry stamped with the current time.
    ///
    /// Line breaks in the message are folded into spaces so the entry
    /// stays on one line.
    pub fn new(
        to: Role,
        from: Role,
        task_id: impl Into<String>,
        status: Status,
        message: impl AsRef<str>,
    ) -> Self {
        Self {
            timestamp: Timestamp::now(),
            to,
            from,
            task_id: task_id.into(),
            status,
            message: fold_lines(message.as_ref()),
        }
    }

    /// Parses one log line. Returns `None` for anything off-grammar.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = LINE.captures(line.trim_end())?;
        Some(Self {
            timestamp: parse_timestamp(&caps[1])?,
            to: caps[2].parse().ok()?,
            from: caps[3].parse().ok()?,
            task_id: caps[4].to_string(),
            status: caps[5].parse().ok()?,
            message: caps[6].trim().to_string(),
        })
    }

    /// A task ID must be a single token: non-empty, no whitespace, no brackets.
    pub fn is_valid_task_id(task_id: &str) -> bool {
        !task_id.is_empty()
            && !task_id
                .chars()
                .any(|c| c.is_whitespace() || c == '[' || c == ']')
    }
}

impl fmt::Display for BusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | [To: {}] [From: {}] [TaskID: {}] [Status: {}] {}",
            self.timestamp.strftime("%Y-%m-%dT%H:%M:%SZ"),
            self.to,
            self.from,
            self.task_id,
            self.status.as_str(),
            self.message,
        )
    }
}

/// RFC 3339 instants, or offsetless local times read in the system zone.
fn parse_timestamp(text: &str) -> Option<Timestamp> {
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Some(ts);
    }
    let local: DateTime = text.parse().ok()?;
    local
        .to_zoned(TimeZone::system())
        .ok()
        .map(|zoned| zoned.timestamp())
}

fn fold_lines(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
