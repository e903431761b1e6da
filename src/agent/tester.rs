//! Tester step: run the acceptance check and report to the Leader.

use std::{path::PathBuf, sync::LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use super::{Outcome, Result, Team};
use crate::{
    acceptance::{self, Verdict},
    documents::DocumentKind,
    model::{Report, Role, Status},
    skill::Bundle,
};

static LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"location:\s*(\S+)").expect("location pattern compiles"));

impl Team {
    pub(super) fn run_tester(&self) -> Result<Outcome> {
        let todo = self.bus.todo_for(Role::Tester)?;
        if todo.is_empty() {
            return Ok(Outcome::NoTask);
        }
        let history = self.bus.history()?;

        for entry in &todo {
            let task_id = entry.task_id.as_str();
            if history.has_test_report(task_id) {
                debug!(task_id, "tester: already reported");
                continue;
            }

            let Some(bundle) = self.locate_bundle(task_id, &entry.message)? else {
                warn!(task_id, "tester: no bundle found");
                self.report(
                    task_id,
                    Report::Failed,
                    "missing required artifacts: no skill bundle found for this task",
                )?;
                return Ok(Outcome::ReportedFailure);
            };

            let requirement = self.documents.load(task_id, DocumentKind::Requirement)?;
            let verdict = acceptance::check(&bundle, &requirement, &self.acceptance);
            info!(task_id, passed = verdict.passed(), "tester: acceptance checked");
            return Ok(match verdict {
                Verdict::Pass { detail } => {
                    self.report(task_id, Report::Passed, &detail)?;
                    Outcome::ReportedSuccess
                }
                Verdict::Fail { reason } => {
                    self.report(task_id, Report::Failed, &reason)?;
                    Outcome::ReportedFailure
                }
            });
        }

        Ok(Outcome::Waiting)
    }

    /// The directory named in the hand-off message, else a lookup by task ID.
    fn locate_bundle(&self, task_id: &str, message: &str) -> Result<Option<Bundle>> {
        if let Some(caps) = LOCATION.captures(message) {
            let dir = PathBuf::from(&caps[1]);
            if dir.is_dir() {
                return Ok(Some(Bundle::open(dir)));
            }
            debug!(task_id, dir = %dir.display(), "tester: named location is gone");
        }
        Ok(self.factory.find_existing_bundle(task_id)?)
    }

    fn report(&self, task_id: &str, report: Report, detail: &str) -> Result<()> {
        self.bus.post(
            Role::Leader,
            Role::Tester,
            task_id,
            Status::Done,
            report.message(detail),
        )?;
        Ok(())
    }
}
