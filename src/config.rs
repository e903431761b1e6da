//! Crew configuration.
//!
//! Loaded from `~/.crew/config.toml` (or `--config`). A missing file means
//! defaults: the workflow runs offline with no setup at all.
//!
//! Credentials and endpoints may also come from the environment. The
//! environment is read once at startup and folded into the config, which
//! is then handed to each component explicitly.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Crew configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Workspace root holding the bus and artifacts.
    /// Overridden by `--root` and `CREW_ROOT`.
    pub root: Option<PathBuf>,

    pub oracle: OracleConfig,

    pub acceptance: AcceptanceConfig,
}

/// How to reach the drafting oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OracleConfig {
    /// Bearer token. Without one the local fallback drafts everything.
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    pub model: String,

    pub timeout_secs: u64,

    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            temperature: 0.3,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How the Tester runs a bundle's entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AcceptanceConfig {
    /// Program that runs entry point scripts.
    pub interpreter: String,

    /// Canonical input passed to every entry point.
    pub sample_input: String,

    pub timeout_secs: u64,

    /// Minimum output length (in characters) for list-style skills.
    pub min_output_len: usize,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            interpreter: "sh".to_string(),
            sample_input: "番茄炒蛋".to_string(),
            timeout_secs: 10,
            min_output_len: 30,
        }
    }
}

impl AcceptanceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// Fold environment overrides into the config.
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    /// Crew-specific variables win over the generic OpenAI ones.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| lookup(n).filter(|v| !v.trim().is_empty()))
        };

        if let Some(key) = first(&["CREW_LLM_API_KEY", "OPENAI_API_KEY"]) {
            self.oracle.api_key = Some(key);
        }
        if let Some(url) = first(&["CREW_LLM_BASE_URL", "OPENAI_BASE_URL"]) {
            self.oracle.base_url = url;
        }
        if let Some(model) = first(&["CREW_LLM_MODEL"]) {
            self.oracle.model = model;
        }
        if let Some(root) = first(&["CREW_ROOT"]) {
            self.root = Some(PathBuf::from(root));
        }
        self
    }

    /// Resolve the workspace root: explicit flag, then config (which
    /// already carries `CREW_ROOT`), then `~/.crew`.
    pub fn resolve_root(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.root.clone())
            .or_else(Self::default_root)
    }

    /// The default workspace root: `~/.crew`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".crew"))
    }

    /// The default config path: `~/.crew/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        Self::default_root().map(|r| r.join("config.toml"))
    }
}
