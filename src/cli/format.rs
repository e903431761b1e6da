//! Output formatting for CLI display.

use crate::{
    model::Stage,
    orchestrator::{RunReport, Step},
};

/// One progress line per role invocation, e.g. `[round 1] Leader: task_assigned`.
pub(super) fn format_step(step: &Step) -> String {
    format!("[round {}] {}: {}", step.round, step.role, step.outcome)
}

pub(super) fn format_report(report: &RunReport) -> String {
    let rounds = plural(report.rounds, "round");
    if report.completed {
        format!("Workflow complete: delivery announced after {rounds}.")
    } else {
        format!(
            "Workflow did not complete within {rounds}; run `crew run` again to resume."
        )
    }
}

pub(super) fn format_stage(task_id: &str, stage: Option<Stage>) -> String {
    match stage {
        Some(stage) => format!("{task_id}: {stage}"),
        None => format!("{task_id}: unknown (no bus entries)"),
    }
}

fn plural(n: u32, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
