//! Skill factory: turns a requirement into a self-describing skill bundle.
//!
//! Each bundle lives in its own directory under the skills root:
//!
//! ```text
//! <root>/<task_id>_<slug>/
//!   SKILL.md                     # manifest: name, description, overview
//!   scripts/<entry point>        # executable entry point
//!   references/provenance.toml   # who built it, for which task, entry digest
//! ```
//!
//! Building is deterministic and total. Unknown domains get the generic
//! stub rather than an error. Only I/O can fail.

mod provenance;
mod templates;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{documents::sanitize_task_id, model::BuildHint};

pub use provenance::Provenance;

const MANIFEST: &str = "SKILL.md";
const PROVENANCE: &str = "references/provenance.toml";
const DEFAULT_ENTRY: &str = "main.sh";
const SLUG_MAX: usize = 40;

/// Errors that can occur writing or reading bundles.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("skill I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode provenance: {0}")]
    Provenance(#[from] toml::ser::Error),
}

pub type Result<T> = core::result::Result<T, SkillError>;

/// The kind of skill a requirement asks for, judged by marker words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Dish in, ingredients and steps out.
    Recipe,
    /// Anything without a built-in template.
    Generic,
}

impl Domain {
    const RECIPE_MARKERS: [&str; 3] = ["菜谱", "食谱", "recipe"];

    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if Self::RECIPE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::Recipe
        } else {
            Self::Generic
        }
    }
}

/// A built bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    dir: PathBuf,
}

impl Bundle {
    /// Wraps an existing bundle directory.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST)
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path().is_file()
    }

    /// Reads the provenance record. Missing or unreadable records are `None`.
    pub fn provenance(&self) -> Option<Provenance> {
        let raw = fs::read_to_string(self.dir.join(PROVENANCE)).ok()?;
        toml::from_str(&raw).ok()
    }
}

/// Builds bundles under a skills root and finds them again by task ID.
#[derive(Debug, Clone)]
pub struct SkillFactory {
    root: PathBuf,
}

impl SkillFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Builds the bundle for a task.
    ///
    /// Name and description are inferred from the requirement; a hint
    /// overrides them field by field. The entry point uses the specialized
    /// template when the domain is recognized, the generic stub otherwise.
    pub fn create_bundle(
        &self,
        task_id: &str,
        requirement: &str,
        hint: Option<&BuildHint>,
    ) -> Result<Bundle> {
        let requirement_domain = Domain::detect(requirement);
        let (mut name, mut description) = match requirement_domain {
            Domain::Recipe => (
                "recipe".to_string(),
                "Given a dish name or main ingredient, list the ingredients and cooking steps."
                    .to_string(),
            ),
            Domain::Generic => (
                "custom-skill".to_string(),
                "Skill implemented from the task requirement.".to_string(),
            ),
        };
        let hint = hint.cloned().unwrap_or_default();
        if let Some(n) = &hint.name {
            name.clone_from(n);
        }
        if let Some(d) = &hint.description {
            description.clone_from(d);
        }

        let domain = if requirement_domain == Domain::Recipe
            || Domain::detect(&format!("{name} {description}")) == Domain::Recipe
        {
            Domain::Recipe
        } else {
            Domain::Generic
        };

        let slug = slugify(&name);
        let entry_name = entry_file_name(hint.entry_point.as_deref());
        let dir = self
            .root
            .join(format!("{}_{slug}", sanitize_task_id(task_id)));
        fs::create_dir_all(dir.join("scripts"))?;
        fs::create_dir_all(dir.join("references"))?;

        let manifest = templates::manifest(&templates::ManifestFields {
            slug: &slug,
            name: &name,
            description: &description,
            overview: hint.overview.as_deref(),
            entry_point: &entry_name,
            behavior: hint.behavior.as_deref(),
        });
        fs::write(dir.join(MANIFEST), manifest)?;

        let script = match domain {
            Domain::Recipe => templates::recipe_script(),
            Domain::Generic => templates::generic_script(&slug),
        };
        let entry_rel = format!("scripts/{entry_name}");
        let entry_path = dir.join(&entry_rel);
        fs::write(&entry_path, &script)?;
        make_executable(&entry_path)?;

        let provenance = Provenance {
            task_id: task_id.to_string(),
            skill: slug.clone(),
            entry_point: Some(entry_rel),
            entry_sha256: Some(sha256_hex(script.as_bytes())),
            created_at: Timestamp::now(),
            generator: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).into(),
        };
        fs::write(dir.join(PROVENANCE), toml::to_string(&provenance)?)?;

        info!(task_id, skill = %slug, ?domain, dir = %dir.display(), "skill bundle created");
        Ok(Bundle { dir })
    }

    /// Finds the bundle previously built for a task.
    ///
    /// Candidates are directories named `<task_id>_*`; a candidate only
    /// counts if its provenance names exactly this task ID.
    pub fn find_existing_bundle(&self, task_id: &str) -> Result<Option<Bundle>> {
        let prefix = format!("{}_", sanitize_task_id(task_id));
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut candidates: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() && entry.file_name().to_string_lossy().starts_with(&prefix) {
                candidates.push(path);
            }
        }
        // Deterministic pick when several match.
        candidates.sort();

        for dir in candidates {
            let bundle = Bundle::open(dir);
            match bundle.provenance() {
                Some(p) if p.task_id == task_id => return Ok(Some(bundle)),
                _ => debug!(dir = %bundle.dir().display(), task_id, "bundle prefix match rejected"),
            }
        }
        Ok(None)
    }
}

/// Lower-cased, word characters and hyphens only, capped in length.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .replace(' ', "-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .take(SLUG_MAX)
        .collect();
    if slug.is_empty() {
        "skill".to_string()
    } else {
        slug
    }
}

/// Hex SHA-256 of some bytes, as recorded in provenance.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Entry points are shell scripts; whatever name is hinted keeps its stem.
fn entry_file_name(hinted: Option<&str>) -> String {
    let Some(hinted) = hinted else {
        return DEFAULT_ENTRY.to_string();
    };
    let file = Path::new(hinted.trim())
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem: String = file
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if stem.is_empty() {
        DEFAULT_ENTRY.to_string()
    } else {
        format!("{stem}.sh")
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
