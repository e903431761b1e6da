//! Build hints: optional structure the drafting oracle suggests for a bundle.

use serde::{Deserialize, Serialize};

/// What the oracle suggests the Coder build.
///
/// Every field is optional and has a default downstream. A reply that
/// doesn't deserialize as a whole is discarded; fields are never salvaged
/// from a malformed object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// One-line overview for the manifest.
    #[serde(
        default,
        alias = "skill_md_overview",
        skip_serializing_if = "Option::is_none"
    )]
    pub overview: Option<String>,

    /// File name of the entry point script.
    #[serde(default, alias = "script_name", skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,

    /// What the entry point does, in prose.
    #[serde(
        default,
        alias = "script_behavior",
        skip_serializing_if = "Option::is_none"
    )]
    pub behavior: Option<String>,
}

impl BuildHint {
    /// Parses an oracle reply into a hint.
    ///
    /// Accepts a bare JSON object, optionally wrapped in a Markdown code
    /// fence. Anything else yields `None`.
    pub fn parse(reply: &str) -> Option<Self> {
        let body = strip_fence(reply.trim());
        if body.is_empty() {
            return None;
        }
        // Only an object counts; serde would also take the sequence form.
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        if !value.is_object() {
            return None;
        }
        let mut hint: Self = serde_json::from_value(value).ok()?;
        for field in [
            &mut hint.name,
            &mut hint.description,
            &mut hint.overview,
            &mut hint.entry_point,
            &mut hint.behavior,
        ] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        Some(hint)
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
