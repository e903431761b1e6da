//! Acceptance check: the Tester's one-shot verdict on a bundle.
//!
//! 1. Resolve the entry point. A declared entry point that is missing or
//!    no longer matches its recorded digest fails as missing artifacts.
//! 2. No entry point at all: pass if the manifest exists, else fail.
//! 3. Run the entry point with the canonical sample input under a time
//!    limit. Non-zero exit or timeout fails.
//! 4. Requirements that ask for list-style output (ingredients and steps)
//!    also need those sections in the output, above a minimum length.
//!
//! Every failure is a [`Verdict`], never an error.

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::mpsc::{self, Receiver},
    thread,
    time::Instant,
};

use tracing::{debug, info};
use wait_timeout::ChildExt;

use crate::{
    config::AcceptanceConfig,
    skill::{Bundle, sha256_hex},
};

const DEFAULT_ENTRY: &str = "scripts/main.sh";
const LIST_REQUIREMENT_MARKERS: [&str; 5] = ["菜谱", "食谱", "材料", "ingredients", "recipe"];
const INGREDIENT_MARKERS: [&str; 2] = ["ingredients", "材料"];
const STEP_MARKERS: [&str; 2] = ["steps", "步骤"];

/// Pass or fail, with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass { detail: String },
    Fail { reason: String },
}

impl Verdict {
    fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }

    fn pass(detail: impl Into<String>) -> Self {
        Self::Pass {
            detail: detail.into(),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

/// What a finished entry point run produced.
struct RunOutput {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Evaluate a bundle against the task's requirement.
pub fn check(bundle: &Bundle, requirement: &str, settings: &AcceptanceConfig) -> Verdict {
    let entry = match resolve_entry_point(bundle) {
        Ok(entry) => entry,
        Err(verdict) => return verdict,
    };

    let Some(entry) = entry else {
        return if bundle.has_manifest() {
            Verdict::pass("no entry point; manifest present")
        } else {
            Verdict::fail("missing required artifacts: SKILL.md and entry point")
        };
    };

    let output = match run_entry_point(&entry, settings) {
        Ok(output) => output,
        Err(verdict) => return verdict,
    };

    if output.code != Some(0) {
        let code = output
            .code
            .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
        let stderr = output.stderr.trim();
        return if stderr.is_empty() {
            Verdict::fail(format!("entry point exited with {code}"))
        } else {
            Verdict::fail(format!("entry point exited with {code}: {}", excerpt(stderr, 200)))
        };
    }

    if expects_list_output(requirement) {
        let out = output.stdout.trim();
        let lower = out.to_lowercase();
        let has_ingredients = INGREDIENT_MARKERS.iter().any(|m| lower.contains(m));
        let has_steps = STEP_MARKERS.iter().any(|m| lower.contains(m));
        if has_ingredients && has_steps && out.chars().count() > settings.min_output_len {
            return Verdict::pass("output lists ingredients and steps");
        }
        debug!(output = out, "list-style output check failed");
        return Verdict::fail("output is missing ingredient or step sections");
    }

    Verdict::pass("entry point exited cleanly")
}

/// Whether the requirement asks for ingredient/step style output.
pub fn expects_list_output(requirement: &str) -> bool {
    let lower = requirement.to_lowercase();
    LIST_REQUIREMENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Find the entry point, checking it against the provenance record.
///
/// `Ok(None)` means the bundle has no entry point at all.
fn resolve_entry_point(bundle: &Bundle) -> Result<Option<PathBuf>, Verdict> {
    let Some(provenance) = bundle.provenance() else {
        let fallback = bundle.dir().join(DEFAULT_ENTRY);
        return Ok(fallback.is_file().then_some(fallback));
    };
    let Some(rel) = provenance.entry_point else {
        return Ok(None);
    };

    let path = bundle.dir().join(&rel);
    let Ok(bytes) = fs::read(&path) else {
        return Err(Verdict::fail(format!("missing required artifacts: {rel}")));
    };
    if let Some(expected) = provenance.entry_sha256
        && sha256_hex(&bytes) != expected
    {
        return Err(Verdict::fail(format!(
            "missing required artifacts: {rel} no longer matches the built entry point"
        )));
    }
    Ok(Some(path))
}

/// Run the entry point with the sample input, bounded by the timeout.
fn run_entry_point(entry: &Path, settings: &AcceptanceConfig) -> Result<RunOutput, Verdict> {
    // Run from the script's own directory, so pass it by file name.
    let workdir = entry.parent().unwrap_or(Path::new("."));
    let script = entry.file_name().unwrap_or(entry.as_os_str());
    let mut child = Command::new(&settings.interpreter)
        .arg(script)
        .arg(&settings.sample_input)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            Verdict::fail(format!(
                "failed to run {} with {}: {e}",
                entry.display(),
                settings.interpreter
            ))
        })?;

    // One deadline covers the run and the output drain.
    let deadline = Instant::now() + settings.timeout();

    // Drain pipes off-thread so a chatty script can't block on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match child.wait_timeout(settings.timeout()) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Verdict::fail(format!(
                "entry point timed out after {}s",
                settings.timeout_secs
            )));
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Verdict::fail(format!("failed waiting for entry point: {e}")));
        }
    };

    // A background process can keep the pipes open after the script exits.
    let collect = |rx: Option<Receiver<String>>| -> Result<String, Verdict> {
        let Some(rx) = rx else {
            return Ok(String::new());
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(text) => Ok(text),
            Err(mpsc::RecvTimeoutError::Disconnected) => Ok(String::new()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Verdict::fail(format!(
                "entry point timed out after {}s (output still open)",
                settings.timeout_secs
            ))),
        }
    };
    let output = RunOutput {
        code: status.code(),
        stdout: collect(stdout)?,
        stderr: collect(stderr)?,
    };
    info!(entry = %entry.display(), code = ?output.code, "entry point finished");
    Ok(output)
}

fn drain(mut pipe: impl Read + Send + 'static) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::skill::SkillFactory;

    const RECIPE_REQUIREMENT: &str = "Write a recipe skill returning ingredients and steps.";

    fn settings() -> AcceptanceConfig {
        AcceptanceConfig::default()
    }

    fn write_script(dir: &Path, body: &str) -> Bundle {
        fs::create_dir_all(dir.join("scripts")).unwrap();
        fs::write(dir.join("SKILL.md"), "---\nname: x\n---\n").unwrap();
        fs::write(dir.join(DEFAULT_ENTRY), body).unwrap();
        Bundle::open(dir)
    }

    #[test]
    fn recipe_bundle_passes_recipe_requirement() {
        let dir = TempDir::new().unwrap();
        let factory = SkillFactory::new(dir.path());
        let bundle = factory
            .create_bundle("t1", RECIPE_REQUIREMENT, None)
            .unwrap();

        let verdict = check(&bundle, RECIPE_REQUIREMENT, &settings());
        assert!(verdict.passed(), "{verdict:?}");
    }

    #[test]
    fn generic_stub_passes_generic_requirement() {
        let dir = TempDir::new().unwrap();
        let factory = SkillFactory::new(dir.path());
        let bundle = factory.create_bundle("t1", "Make a timer.", None).unwrap();

        assert_eq!(
            check(&bundle, "Make a timer.", &settings()),
            Verdict::pass("entry point exited cleanly")
        );
    }

    #[test]
    fn generic_stub_fails_list_requirement() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "echo OK\n");

        let verdict = check(&bundle, RECIPE_REQUIREMENT, &settings());
        assert_eq!(
            verdict,
            Verdict::fail("output is missing ingredient or step sections")
        );
    }

    #[test]
    fn deleted_entry_point_is_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let factory = SkillFactory::new(dir.path());
        let bundle = factory.create_bundle("t1", "Make a timer.", None).unwrap();
        fs::remove_file(bundle.dir().join("scripts/main.sh")).unwrap();

        let Verdict::Fail { reason } = check(&bundle, "Make a timer.", &settings()) else {
            panic!("expected failure");
        };
        assert!(reason.starts_with("missing required artifacts"), "{reason}");
    }

    #[test]
    fn tampered_entry_point_is_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let factory = SkillFactory::new(dir.path());
        let bundle = factory.create_bundle("t1", "Make a timer.", None).unwrap();
        fs::write(bundle.dir().join("scripts/main.sh"), "exit 0\n").unwrap();

        let Verdict::Fail { reason } = check(&bundle, "Make a timer.", &settings()) else {
            panic!("expected failure");
        };
        assert!(reason.starts_with("missing required artifacts"), "{reason}");
    }

    #[test]
    fn manifest_only_bundle_passes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SKILL.md"), "---\nname: docs\n---\n").unwrap();

        assert_eq!(
            check(&Bundle::open(dir.path()), "", &settings()),
            Verdict::pass("no entry point; manifest present")
        );
    }

    #[test]
    fn empty_bundle_fails() {
        let dir = TempDir::new().unwrap();

        let verdict = check(&Bundle::open(dir.path()), "", &settings());
        assert!(!verdict.passed());
    }

    #[test]
    fn non_zero_exit_fails() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "echo boom >&2\nexit 3\n");

        assert_eq!(
            check(&bundle, "", &settings()),
            Verdict::fail("entry point exited with status 3: boom")
        );
    }

    #[test]
    fn timeout_fails() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "sleep 5\n");
        let settings = AcceptanceConfig {
            timeout_secs: 1,
            ..settings()
        };

        assert_eq!(
            check(&bundle, "", &settings),
            Verdict::fail("entry point timed out after 1s")
        );
    }

    #[test]
    fn background_process_holding_output_times_out() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "sleep 8 &\necho OK\n");
        let settings = AcceptanceConfig {
            timeout_secs: 1,
            ..settings()
        };

        let started = Instant::now();
        let Verdict::Fail { reason } = check(&bundle, "", &settings) else {
            panic!("expected failure");
        };
        assert!(reason.starts_with("entry point timed out after 1s"), "{reason}");
        assert!(started.elapsed().as_secs() < 5);
    }

    #[test]
    fn missing_interpreter_fails_without_panicking() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "echo OK\n");
        let settings = AcceptanceConfig {
            interpreter: "/definitely/not/an/interpreter".into(),
            ..settings()
        };

        let Verdict::Fail { reason } = check(&bundle, "", &settings) else {
            panic!("expected failure");
        };
        assert!(reason.starts_with("failed to run"), "{reason}");
    }

    #[test]
    fn short_list_output_fails() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "echo 'ingredients steps'\n");

        assert!(!check(&bundle, RECIPE_REQUIREMENT, &settings()).passed());
    }

    #[test]
    fn sample_input_reaches_entry_point() {
        let dir = TempDir::new().unwrap();
        let bundle = write_script(dir.path(), "[ \"$1\" = \"番茄炒蛋\" ] || exit 9\n");

        assert!(check(&bundle, "", &settings()).passed());
    }

    #[test]
    fn list_markers() {
        assert!(expects_list_output("编写一个返回菜谱材料和步骤的技能"));
        assert!(expects_list_output("List the Ingredients"));
        assert!(!expects_list_output("Make a timer."));
    }
}
