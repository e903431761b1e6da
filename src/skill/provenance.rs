//! Provenance: the reference document every bundle carries about itself.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Who built a bundle, for which task, and what its entry point was.
///
/// Written once at build time and never updated. The acceptance check
/// compares the entry point on disk against `entry_sha256`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Provenance {
    pub task_id: String,

    /// The bundle's slugged skill name.
    pub skill: String,

    /// Entry point path relative to the bundle directory.
    /// `None` for bundles that ship no executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_sha256: Option<String>,

    pub created_at: Timestamp,

    /// Tool and version that wrote the bundle.
    pub generator: String,
}
