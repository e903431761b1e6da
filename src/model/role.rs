//! Roles: who sends and who receives bus entries.

use std::{fmt, str::FromStr};

/// A participant named in the `To:` or `From:` field of a bus entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Drafts requirements, dispatches work, announces deliveries.
    Leader,

    /// Builds a skill bundle from a requirement.
    Coder,

    /// Runs the acceptance check against a built bundle.
    Tester,

    /// Broadcast pseudo-recipient.
    /// Never polled; an entry addressed here ends a task's workflow.
    All,

    /// Whoever submitted the task.
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "Leader",
            Self::Coder => "Coder",
            Self::Tester => "Tester",
            Self::All => "All",
            Self::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Leader" => Ok(Self::Leader),
            "Coder" => Ok(Self::Coder),
            "Tester" => Ok(Self::Tester),
            "All" => Ok(Self::All),
            "User" => Ok(Self::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
