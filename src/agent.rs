//! Role agents: Leader, Coder, and Tester.
//!
//! Each agent is one synchronous poll-act-emit step over the bus and the
//! task documents:
//!
//! 1. Poll the bus for `TODO` entries addressed to the role.
//! 2. Skip any task whose next step already exists on the bus. The bus is
//!    never edited, so the next step's entry is the only "done" marker.
//! 3. Act on the first eligible task, append the next entry, and return.
//!
//! A step handles at most one task, so pending tasks take turns. Finding
//! nothing to do is a normal outcome, returned immediately.

mod coder;
mod leader;
mod tester;

use std::{fmt, path::Path};

use crate::{
    bus::{Bus, BusError},
    config::AcceptanceConfig,
    documents::{DocumentError, DocumentKind, DocumentStore},
    model::{Report, Role, Stage},
    oracle::Drafter,
    skill::{SkillError, SkillFactory},
};

const LOG_FILE: &str = "task_log.txt";
const TASKS_DIR: &str = "artifacts/tasks";
const SKILLS_DIR: &str = "artifacts/skills";

/// Storage faults: the only errors allowed to abort a step.
///
/// Oracle and acceptance faults are recorded on the bus instead.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Documents(#[from] DocumentError),

    #[error(transparent)]
    Skill(#[from] SkillError),
}

pub type Result<T> = core::result::Result<T, AgentError>;

/// What one agent step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No `TODO` entries addressed to the role.
    NoTask,
    /// `TODO` entries exist, but every one is already handled or not ready.
    Waiting,
    /// Leader drafted a requirement and dispatched it to the Coder.
    TaskAssigned,
    /// Leader broadcast a delivery to everyone.
    Announced,
    /// Coder built a bundle and handed it to the Tester.
    HandedToTester,
    /// Tester reported a passing acceptance check.
    ReportedSuccess,
    /// Tester reported a failing acceptance check.
    ReportedFailure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoTask => "no_task",
            Self::Waiting => "waiting",
            Self::TaskAssigned => "task_assigned",
            Self::Announced => "announced",
            Self::HandedToTester => "handed_to_tester",
            Self::ReportedSuccess => "reported_success",
            Self::ReportedFailure => "reported_failure",
        })
    }
}

/// Everything a role needs to run a step.
pub struct Team {
    bus: Bus,
    documents: DocumentStore,
    factory: SkillFactory,
    drafter: Box<dyn Drafter>,
    acceptance: AcceptanceConfig,
}

impl Team {
    /// Lays the team out under a workspace root:
    ///
    /// ```text
    /// <root>/task_log.txt
    /// <root>/artifacts/tasks/
    /// <root>/artifacts/skills/
    /// ```
    pub fn open(root: &Path, drafter: Box<dyn Drafter>, acceptance: AcceptanceConfig) -> Self {
        Self {
            bus: Bus::new(root.join(LOG_FILE)),
            documents: DocumentStore::new(root.join(TASKS_DIR)),
            factory: SkillFactory::new(root.join(SKILLS_DIR)),
            drafter,
            acceptance,
        }
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn factory(&self) -> &SkillFactory {
        &self.factory
    }

    /// Runs one step for a role.
    ///
    /// `All` and `User` are never polled and always report `NoTask`.
    pub fn step(&self, role: Role) -> Result<Outcome> {
        match role {
            Role::Leader => self.run_leader(),
            Role::Coder => self.run_coder(),
            Role::Tester => self.run_tester(),
            Role::All | Role::User => Ok(Outcome::NoTask),
        }
    }

    /// Derives a task's lifecycle stage from a fresh scan.
    ///
    /// `None` when the bus has never mentioned the task.
    pub fn stage(&self, task_id: &str) -> Result<Option<Stage>> {
        let history = self.bus.history()?;
        if history.for_task(task_id).next().is_none() {
            return Ok(None);
        }
        let stage = if history.is_announced(task_id) {
            Stage::Announced
        } else if let Some(report) = history.test_report(task_id) {
            Stage::TestReported {
                passed: Report::of(&report.message) == Some(Report::Passed),
            }
        } else if history.has_addressed(task_id, Role::Tester) {
            Stage::BuiltAndHandedToTester
        } else if history.has_addressed(task_id, Role::Coder) {
            Stage::AssignedToCoder
        } else if !self
            .documents
            .load(task_id, DocumentKind::Requirement)?
            .is_empty()
        {
            Stage::RequirementDrafted
        } else {
            Stage::Received
        };
        Ok(Some(stage))
    }
}

/// First `max` characters, with an ellipsis when something was cut.
fn excerpt(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push_str("...");
    }
    out
}
