//! Coder step: turn a requirement into a skill bundle and hand it on.

use tracing::{debug, info};

use super::{Outcome, Result, Team, excerpt};
use crate::{
    documents::DocumentKind,
    model::{BuildHint, Role, Status},
};

const SYSTEM: &str = "You are the Coder and you build skills. Read the requirement and reply \
with a JSON build hint: one object with the fields `name` (short, lowercase, hyphenated), \
`description` (what the skill does and when to use it), `overview` (one sentence for the \
manifest), `entry_point` (script file name, such as main.sh), and `behavior` (what the script \
prints). Reply with the JSON object only.";

const MAX_TOKENS: u32 = 1024;
const REQUIREMENT_EXCERPT: usize = 3000;

impl Team {
    pub(super) fn run_coder(&self) -> Result<Outcome> {
        let todo = self.bus.todo_for(Role::Coder)?;
        if todo.is_empty() {
            return Ok(Outcome::NoTask);
        }
        let history = self.bus.history()?;

        for entry in &todo {
            let task_id = entry.task_id.as_str();
            if history.has_addressed(task_id, Role::Tester) {
                debug!(task_id, "coder: already handed to tester");
                continue;
            }
            let requirement = self.documents.load(task_id, DocumentKind::Requirement)?;
            if requirement.is_empty() {
                debug!(task_id, "coder: no requirement yet");
                continue;
            }

            let prompt = format!(
                "Requirement document:\n\n{}\n\nReply with the JSON build hint.",
                excerpt(&requirement, REQUIREMENT_EXCERPT)
            );
            let hint = BuildHint::parse(&self.drafter.draft(SYSTEM, &prompt, MAX_TOKENS));
            if hint.is_none() {
                debug!(task_id, "coder: no usable build hint; inferring from requirement");
            }

            let bundle = self
                .factory
                .create_bundle(task_id, &requirement, hint.as_ref())?;
            self.bus.post(
                Role::Tester,
                Role::Coder,
                task_id,
                Status::Todo,
                format!(
                    "Skill bundle built; location: {} ; run the acceptance check against the requirement.",
                    bundle.dir().display()
                ),
            )?;
            info!(task_id, dir = %bundle.dir().display(), "coder: handed bundle to tester");
            return Ok(Outcome::HandedToTester);
        }

        Ok(Outcome::Waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn assigned(team: &Team, task_id: &str, requirement: &str) {
        team.documents()
            .save(task_id, DocumentKind::Requirement, requirement)
            .unwrap();
        team.bus()
            .post(Role::Coder, Role::Leader, task_id, Status::Todo, "Requirement ready")
            .unwrap();
    }

    #[test]
    fn builds_bundle_and_hands_to_tester() {
        let (_dir, team) = offline_team();
        assigned(&team, "t1", "# Requirement\n\nA recipe skill with ingredients and steps.");

        assert_eq!(team.step(Role::Coder).unwrap(), Outcome::HandedToTester);

        let bundle = team.factory().find_existing_bundle("t1").unwrap().unwrap();
        assert!(bundle.has_manifest());
        let todo = team.bus().todo_for(Role::Tester).unwrap();
        assert_eq!(todo.len(), 1);
        assert!(todo[0].message.contains(&bundle.dir().display().to_string()));
    }

    #[test]
    fn second_step_does_not_rebuild() {
        let (_dir, team) = offline_team();
        assigned(&team, "t1", "# Requirement\n\nA timer.");

        team.step(Role::Coder).unwrap();
        assert_eq!(team.step(Role::Coder).unwrap(), Outcome::Waiting);
        assert_eq!(count(&team, "t1", Role::Coder, Role::Tester), 1);
    }

    #[test]
    fn missing_requirement_is_skipped() {
        let (_dir, team) = offline_team();
        team.bus()
            .post(Role::Coder, Role::Leader, "t1", Status::Todo, "Requirement ready")
            .unwrap();

        assert_eq!(team.step(Role::Coder).unwrap(), Outcome::Waiting);
        assert!(team.factory().find_existing_bundle("t1").unwrap().is_none());
    }

    #[test]
    fn hint_names_the_bundle() {
        let (_dir, team) = scripted_team(&[
            r#"```json
{"name": "unit-converter", "description": "Converts units."}
```"#,
        ]);
        assigned(&team, "t1", "# Requirement\n\nConvert units.");

        team.step(Role::Coder).unwrap();
        let bundle = team.factory().find_existing_bundle("t1").unwrap().unwrap();
        assert!(bundle.dir().ends_with("t1_unit-converter"));
    }

    #[test]
    fn malformed_hint_falls_back_to_defaults() {
        let (_dir, team) = scripted_team(&["{not json"]);
        assigned(&team, "t1", "# Requirement\n\nConvert units.");

        assert_eq!(team.step(Role::Coder).unwrap(), Outcome::HandedToTester);
        let bundle = team.factory().find_existing_bundle("t1").unwrap().unwrap();
        assert!(bundle.dir().ends_with("t1_custom-skill"));
    }
}
