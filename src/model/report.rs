//! Test reports: how the Tester's verdict reads on the bus.
//!
//! The Leader decides whether to announce from the report's leading
//! marker, so the wording lives in one place.

const PASSED: &str = "Test passed";
const FAILED: &str = "Test failed";

/// The outcome a Tester's `DONE` entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Passed,
    Failed,
}

impl Report {
    /// Renders the bus message for this report.
    pub fn message(self, detail: &str) -> String {
        match self {
            Self::Passed => {
                format!("{PASSED}: {detail}. Skill is ready for the Leader to announce.")
            }
            Self::Failed => format!("{FAILED}: {detail}. Coder should fix and resubmit."),
        }
    }

    /// Reads the report back from a bus message, if it is one.
    pub fn of(message: &str) -> Option<Self> {
        if message.starts_with(PASSED) {
            Some(Self::Passed)
        } else if message.starts_with(FAILED) {
            Some(Self::Failed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_back() {
        assert_eq!(
            Report::of(&Report::Passed.message("entry point exited cleanly")),
            Some(Report::Passed)
        );
        assert_eq!(
            Report::of(&Report::Failed.message("missing required artifacts")),
            Some(Report::Failed)
        );
    }

    #[test]
    fn other_messages_are_not_reports() {
        assert_eq!(Report::of("Requirement ready."), None);
        // Mentioning success mid-sentence doesn't count.
        assert_eq!(Report::of("Not sure the Test passed yet"), None);
    }
}
