//! Drives the team: submits requests and runs rounds until delivery.

use jiff::Zoned;
use tracing::info;
use uuid::Uuid;

use crate::{
    agent::{Outcome, Result, Team},
    documents::DocumentKind,
    model::{Role, Status},
};

/// One round: each role gets one step, and the Leader closes.
pub const ROUND: [Role; 4] = [Role::Leader, Role::Coder, Role::Tester, Role::Leader];

pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// One role invocation within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub round: u32,
    pub role: Role,
    pub outcome: Outcome,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Rounds actually driven.
    pub rounds: u32,
    /// Whether a broadcast ended the run before the budget ran out.
    pub completed: bool,
}

/// `task_<local YYYYmmddHHMMSS>_<8 hex>`.
pub fn mint_task_id() -> String {
    let stamp = Zoned::now().strftime("%Y%m%d%H%M%S");
    let random = Uuid::new_v4().simple().to_string();
    format!("task_{stamp}_{}", &random[..8])
}

/// Records a user request and addresses it to the Leader.
///
/// Returns the new task ID.
pub fn submit(team: &Team, request: &str) -> Result<String> {
    let task_id = mint_task_id();
    team.documents()
        .save(&task_id, DocumentKind::UserTask, request)?;
    team.bus()
        .post(Role::Leader, Role::User, &task_id, Status::Todo, request)?;
    info!(task_id, "task submitted");
    Ok(task_id)
}

/// Runs up to `max_rounds` rounds of [`ROUND`].
///
/// With a task ID, the run ends once that task is broadcast; without one,
/// any broadcast ends it. Running out of rounds is reported, not an error.
pub fn run(
    team: &Team,
    task_id: Option<&str>,
    max_rounds: u32,
    mut on_step: impl FnMut(&Step),
) -> Result<RunReport> {
    for round in 1..=max_rounds {
        for role in ROUND {
            let outcome = team.step(role)?;
            on_step(&Step {
                round,
                role,
                outcome,
            });
        }

        let history = team.bus().history()?;
        let done = match task_id {
            Some(id) => history.is_announced(id),
            None => history.any_announced(),
        };
        if done {
            info!(round, "delivery announced; stopping");
            return Ok(RunReport {
                rounds: round,
                completed: true,
            });
        }
    }

    info!(max_rounds, "round budget exhausted without a delivery");
    Ok(RunReport {
        rounds: max_rounds,
        completed: false,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        agent::testing::{count, offline_team},
        model::{BusEntry, Report},
    };

    const RECIPE_REQUEST: &str = "编写一个返回菜谱材料和步骤的技能";

    fn collect(team: &Team, task_id: Option<&str>, max_rounds: u32) -> (RunReport, Vec<Step>) {
        let mut steps = Vec::new();
        let report = run(team, task_id, max_rounds, |s| steps.push(*s)).unwrap();
        (report, steps)
    }

    /// `(from, to)` of every entry for a task, in bus order.
    fn routes(team: &Team, task_id: &str) -> Vec<(Role, Role)> {
        team.bus()
            .entries()
            .unwrap()
            .into_iter()
            .filter(|e| e.task_id == task_id)
            .map(|e| (e.from, e.to))
            .collect()
    }

    #[test]
    fn minted_ids_are_well_formed_and_distinct() {
        let a = mint_task_id();
        let b = mint_task_id();
        assert_ne!(a, b);
        assert!(a.starts_with("task_"));
        assert_eq!(a.len(), "task_".len() + 14 + 1 + 8);
        assert!(BusEntry::is_valid_task_id(&a));
    }

    #[test]
    fn submit_persists_request_and_addresses_leader() {
        let (_dir, team) = offline_team();
        let id = submit(&team, "  Build a unit converter \n").unwrap();

        assert_eq!(
            team.documents().load(&id, DocumentKind::UserTask).unwrap(),
            "Build a unit converter"
        );
        let todo = team.bus().todo_for(Role::Leader).unwrap();
        assert_eq!(todo.len(), 1);
        assert_eq!(todo[0].from, Role::User);
        assert_eq!(todo[0].task_id, id);
    }

    #[test]
    fn closing_leader_announces_in_the_same_round() {
        let (_dir, team) = offline_team();
        let id = submit(&team, RECIPE_REQUEST).unwrap();

        let (report, steps) = collect(&team, Some(&id), DEFAULT_MAX_ROUNDS);

        assert!(report.completed);
        assert_eq!(report.rounds, 1);
        let outcomes: Vec<_> = steps.iter().map(|s| s.outcome).collect();
        assert_eq!(
            outcomes,
            [
                Outcome::TaskAssigned,
                Outcome::HandedToTester,
                Outcome::ReportedSuccess,
                Outcome::Announced,
            ]
        );
        assert_eq!(
            routes(&team, &id),
            [
                (Role::User, Role::Leader),
                (Role::Leader, Role::Coder),
                (Role::Coder, Role::Tester),
                (Role::Tester, Role::Leader),
                (Role::Leader, Role::All),
            ]
        );
        assert!(
            !team
                .documents()
                .load(&id, DocumentKind::Delivery)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn generic_task_is_delivered() {
        let (_dir, team) = offline_team();
        let id = submit(&team, "Write a skill that greets the user").unwrap();

        let (report, _) = collect(&team, Some(&id), DEFAULT_MAX_ROUNDS);

        assert!(report.completed);
        assert!(report.rounds <= 2);
        let bundle = team.factory().find_existing_bundle(&id).unwrap().unwrap();
        assert!(bundle.has_manifest());
    }

    #[test]
    fn rerunning_a_finished_task_adds_nothing() {
        let (_dir, team) = offline_team();
        let id = submit(&team, RECIPE_REQUEST).unwrap();
        collect(&team, Some(&id), DEFAULT_MAX_ROUNDS);
        let before = team.bus().read_all().unwrap();

        let (report, steps) = collect(&team, Some(&id), 3);

        assert!(report.completed);
        assert_eq!(report.rounds, 1);
        assert!(steps.iter().all(|s| s.outcome == Outcome::Waiting));
        assert_eq!(team.bus().read_all().unwrap(), before);
    }

    #[test]
    fn broken_bundle_stalls_without_announcement() {
        let (_dir, team) = offline_team();
        let id = submit(&team, RECIPE_REQUEST).unwrap();
        team.step(Role::Leader).unwrap();
        team.step(Role::Coder).unwrap();
        let bundle = team.factory().find_existing_bundle(&id).unwrap().unwrap();
        fs::remove_file(bundle.dir().join("scripts/main.sh")).unwrap();

        let (report, steps) = collect(&team, Some(&id), 2);

        assert!(!report.completed);
        assert_eq!(report.rounds, 2);
        assert!(steps.iter().any(|s| s.outcome == Outcome::ReportedFailure));
        assert_eq!(count(&team, &id, Role::Leader, Role::All), 0);
        let history = team.bus().history().unwrap();
        let failure = history.test_report(&id).unwrap();
        assert_eq!(Report::of(&failure.message), Some(Report::Failed));
        assert!(failure.message.contains("missing required artifacts"));
    }

    #[test]
    fn roles_run_in_fixed_order() {
        let (_dir, team) = offline_team();
        let (report, steps) = collect(&team, None, 2);

        assert!(!report.completed);
        let roles: Vec<_> = steps.iter().map(|s| (s.round, s.role)).collect();
        assert_eq!(
            roles,
            [
                (1, Role::Leader),
                (1, Role::Coder),
                (1, Role::Tester),
                (1, Role::Leader),
                (2, Role::Leader),
                (2, Role::Coder),
                (2, Role::Tester),
                (2, Role::Leader),
            ]
        );
        assert!(steps.iter().all(|s| s.outcome == Outcome::NoTask));
    }

    #[test]
    fn stale_broadcast_does_not_end_a_new_task() {
        let (_dir, team) = offline_team();
        let first = submit(&team, RECIPE_REQUEST).unwrap();
        collect(&team, Some(&first), DEFAULT_MAX_ROUNDS);

        let second = submit(&team, "Write a skill that greets the user").unwrap();
        let (report, _) = collect(&team, Some(&second), DEFAULT_MAX_ROUNDS);

        assert!(report.completed);
        assert_eq!(count(&team, &second, Role::Leader, Role::All), 1);
    }

    #[test]
    fn resume_stops_on_any_broadcast() {
        let (_dir, team) = offline_team();
        submit(&team, RECIPE_REQUEST).unwrap();

        let (report, _) = collect(&team, None, DEFAULT_MAX_ROUNDS);
        assert!(report.completed);
        assert_eq!(report.rounds, 1);
    }

    #[test]
    fn two_tasks_take_turns() {
        let (_dir, team) = offline_team();
        let a = submit(&team, RECIPE_REQUEST).unwrap();
        let b = submit(&team, "Write a skill that greets the user").unwrap();

        let (report, _) = collect(&team, Some(&b), DEFAULT_MAX_ROUNDS);

        assert!(report.completed);
        assert_eq!(count(&team, &a, Role::Leader, Role::All), 1);
        assert_eq!(count(&team, &b, Role::Leader, Role::All), 1);
        assert_eq!(count(&team, &a, Role::Leader, Role::Coder), 1);
        assert_eq!(count(&team, &b, Role::Leader, Role::Coder), 1);
    }
}
