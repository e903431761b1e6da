//! Leader step: draft requirements, dispatch them, announce deliveries.

use tracing::{debug, info};

use super::{Outcome, Result, Team, excerpt};
use crate::{
    bus::History,
    documents::DocumentKind,
    model::{Role, Status},
};

const SYSTEM: &str = "You are the team Leader. Turn the user's task into a requirement document \
in Markdown. It must contain: an overview of the task; the skill requirements (what the skill \
takes as input and produces as output); role assignments (the Coder builds the skill, the Tester \
runs the acceptance check, the Leader announces the delivery); and acceptance criteria. \
Output only the document.";

const MAX_TOKENS: u32 = 2048;
const DELIVERY_EXCERPT: usize = 800;

impl Team {
    pub(super) fn run_leader(&self) -> Result<Outcome> {
        let history = self.bus.history()?;

        // Finished work is announced before new work starts.
        if let Some(task_id) = history.passed_unannounced().first().copied() {
            self.announce(&history, task_id)?;
            return Ok(Outcome::Announced);
        }

        let mut pending = false;
        for entry in history.todo_for(Role::Leader) {
            pending = true;
            let task_id = entry.task_id.as_str();
            if history.is_announced(task_id) || history.has_sent(task_id, Role::Leader, Role::Coder)
            {
                debug!(task_id, "leader: already dispatched");
                continue;
            }
            if !self
                .documents
                .load(task_id, DocumentKind::Requirement)?
                .is_empty()
            {
                debug!(task_id, "leader: requirement already drafted");
                continue;
            }

            let stored = self.documents.load(task_id, DocumentKind::UserTask)?;
            let request = if stored.is_empty() {
                entry.message.trim()
            } else {
                stored.as_str()
            };
            if request.is_empty() {
                debug!(task_id, "leader: empty request");
                continue;
            }

            let prompt = format!(
                "The user's task:\n\n{request}\n\nWrite the requirement document for this task."
            );
            let requirement = self.drafter.draft(SYSTEM, &prompt, MAX_TOKENS);
            let path = self
                .documents
                .save(task_id, DocumentKind::Requirement, &requirement)?;
            self.bus.post(
                Role::Coder,
                Role::Leader,
                task_id,
                Status::Todo,
                format!(
                    "Requirement ready at {}; build the skill and hand it to Tester.",
                    path.display()
                ),
            )?;
            info!(task_id, "leader: requirement drafted and assigned to coder");
            return Ok(Outcome::TaskAssigned);
        }

        Ok(if pending {
            Outcome::Waiting
        } else {
            Outcome::NoTask
        })
    }

    fn announce(&self, history: &History, task_id: &str) -> Result<()> {
        let requirement = self.documents.load(task_id, DocumentKind::Requirement)?;
        let report = history
            .test_report(task_id)
            .map_or("", |entry| entry.message.as_str());
        let summary = format!(
            "# Delivery summary\n\n\
             **Task ID**: {task_id}\n\n\
             **Requirement excerpt**:\n\n{}\n\n\
             **Tester report**: {report}\n\n\
             **Conclusion**: acceptance passed; the skill is ready for use.",
            excerpt(&requirement, DELIVERY_EXCERPT),
        );
        let path = self
            .documents
            .save(task_id, DocumentKind::Delivery, &summary)?;
        self.bus.post(
            Role::All,
            Role::Leader,
            task_id,
            Status::Done,
            format!(
                "Task complete and accepted; delivery summary at {}.",
                path.display()
            ),
        )?;
        info!(task_id, "leader: delivery announced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::model::Report;

    #[test]
    fn drafts_requirement_and_assigns_coder() {
        let (_dir, team) = offline_team();
        submit(&team, "t1", "编写一个返回菜谱材料和步骤的技能");

        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::TaskAssigned);

        let requirement = team.documents().load("t1", DocumentKind::Requirement).unwrap();
        assert!(requirement.contains("ingredients"));
        let todo = team.bus().todo_for(Role::Coder).unwrap();
        assert_eq!(todo.len(), 1);
        assert_eq!(todo[0].from, Role::Leader);
        assert_eq!(todo[0].task_id, "t1");
    }

    #[test]
    fn second_step_does_not_redispatch() {
        let (_dir, team) = offline_team();
        submit(&team, "t1", "Build a unit converter");

        team.step(Role::Leader).unwrap();
        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::Waiting);
        assert_eq!(count(&team, "t1", Role::Leader, Role::Coder), 1);
    }

    #[test]
    fn empty_bus_is_no_task() {
        let (_dir, team) = offline_team();
        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::NoTask);
    }

    #[test]
    fn existing_requirement_blocks_drafting() {
        let (_dir, team) = offline_team();
        submit(&team, "t1", "anything");
        team.documents()
            .save("t1", DocumentKind::Requirement, "# Requirement\n\nby hand")
            .unwrap();

        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::Waiting);
        assert_eq!(
            team.documents().load("t1", DocumentKind::Requirement).unwrap(),
            "# Requirement\n\nby hand"
        );
    }

    #[test]
    fn uses_oracle_reply_verbatim() {
        let (_dir, team) = scripted_team(&["  # Custom requirement  "]);
        submit(&team, "t1", "anything");

        team.step(Role::Leader).unwrap();
        assert_eq!(
            team.documents().load("t1", DocumentKind::Requirement).unwrap(),
            "# Custom requirement"
        );
    }

    #[test]
    fn passing_report_is_announced_once() {
        let (_dir, team) = offline_team();
        submit(&team, "t1", "anything");
        team.step(Role::Leader).unwrap();
        team.bus()
            .post(
                Role::Leader,
                Role::Tester,
                "t1",
                Status::Done,
                Report::Passed.message("entry point exited cleanly"),
            )
            .unwrap();

        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::Announced);
        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::Waiting);
        assert_eq!(count(&team, "t1", Role::Leader, Role::All), 1);

        let delivery = team.documents().load("t1", DocumentKind::Delivery).unwrap();
        assert!(delivery.contains("**Task ID**: t1"));
        assert!(delivery.contains("Test passed"));
    }

    #[test]
    fn failing_report_is_not_announced() {
        let (_dir, team) = offline_team();
        submit(&team, "t1", "anything");
        team.step(Role::Leader).unwrap();
        team.bus()
            .post(
                Role::Leader,
                Role::Tester,
                "t1",
                Status::Done,
                Report::Failed.message("entry point exited with status 1"),
            )
            .unwrap();

        team.step(Role::Leader).unwrap();
        assert_eq!(count(&team, "t1", Role::Leader, Role::All), 0);
    }

    #[test]
    fn announcement_takes_priority_over_new_tasks() {
        let (_dir, team) = offline_team();
        submit(&team, "t1", "first");
        team.step(Role::Leader).unwrap();
        team.bus()
            .post(
                Role::Leader,
                Role::Tester,
                "t1",
                Status::Done,
                Report::Passed.message("ok"),
            )
            .unwrap();
        submit(&team, "t2", "second");

        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::Announced);
        assert_eq!(team.step(Role::Leader).unwrap(), Outcome::TaskAssigned);
        assert_eq!(count(&team, "t2", Role::Leader, Role::Coder), 1);
    }
}
