//! Lifecycle stages a task moves through, as derived from the bus.

use std::fmt;

/// Where a task stands, inferred from which entries exist for its ID.
///
/// Never stored. Recomputed from a fresh scan every time it is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    RequirementDrafted,
    AssignedToCoder,
    BuiltAndHandedToTester,
    TestReported { passed: bool },
    Announced,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => f.write_str("received"),
            Self::RequirementDrafted => f.write_str("requirement_drafted"),
            Self::AssignedToCoder => f.write_str("assigned_to_coder"),
            Self::BuiltAndHandedToTester => f.write_str("built_and_handed_to_tester"),
            Self::TestReported { passed: true } => f.write_str("test_reported(success)"),
            Self::TestReported { passed: false } => f.write_str("test_reported(failure)"),
            Self::Announced => f.write_str("announced"),
        }
    }
}
