//! Offline drafting: keyword-matched templates that keep the workflow moving.

use crate::{model::BuildHint, skill::Domain};

const USER_TASK_EXCERPT: usize = 500;

/// Draft a reply without the network.
///
/// The system instruction says what kind of text is wanted (a build hint
/// or a requirement document); the user content picks the template.
pub(super) fn reply(system: &str, user: &str) -> String {
    let system = system.to_lowercase();
    if system.contains("build hint") {
        return build_hint(Domain::detect(user));
    }
    if system.contains("requirement") {
        return match Domain::detect(user) {
            Domain::Recipe => recipe_requirement(),
            Domain::Generic => generic_requirement(user),
        };
    }
    "[offline reply] Acknowledged.".to_string()
}

fn recipe_requirement() -> String {
    "# Requirement

## Overview
Build a recipe skill: given a dish name or main ingredient, tell the user which ingredients they need and how to cook it.

## Skill requirements
- Input: a dish name or main ingredient
- Output: an ingredients list (with quantities) and numbered cooking steps
- Deliver a SKILL.md manifest and an executable entry point under scripts/

## Roles
- **Coder**: builds the skill (SKILL.md, scripts/, references/)
- **Tester**: runs the skill on a sample dish and checks it returns ingredients and steps
- **Leader**: announces the delivery once the Tester reports success

## Acceptance criteria
- Running the entry point with a sample dish (e.g. 番茄炒蛋) prints output containing both ingredients and steps."
        .to_string()
}

fn generic_requirement(user_task: &str) -> String {
    let overview: String = user_task.trim().chars().take(USER_TASK_EXCERPT).collect();
    format!(
        "# Requirement

## Overview
{overview}

## Skill requirements
- Implement the behavior described in the overview
- Deliver a SKILL.md manifest (name, description, usage) with scripts/ and references/ as needed

## Roles
- **Coder**: builds the skill and hands it to the Tester
- **Tester**: runs the acceptance check and reports to the Leader
- **Leader**: announces the delivery once the Tester reports success

## Acceptance criteria
- The entry point runs on the sample input and exits successfully."
    )
}

fn build_hint(domain: Domain) -> String {
    let hint = match domain {
        Domain::Recipe => BuildHint {
            name: Some("recipe".into()),
            description: Some(
                "Given a dish name or main ingredient, list the ingredients and cooking steps."
                    .into(),
            ),
            overview: Some("Recipe skill: dish in, ingredients and steps out.".into()),
            entry_point: Some("main.sh".into()),
            behavior: Some(
                "Takes a dish name and prints JSON with `ingredients` and `steps` lists.".into(),
            ),
        },
        Domain::Generic => BuildHint {
            name: Some("custom-skill".into()),
            description: Some("Skill implemented from the task requirement.".into()),
            overview: None,
            entry_point: Some("main.sh".into()),
            behavior: Some("Runs the skill and reports success.".into()),
        },
    };
    serde_json::to_string_pretty(&hint).unwrap_or_default()
}
