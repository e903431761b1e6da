//! CLI driver for the crew.
//!
//! Every subcommand is non-interactive: arguments in, plain text out.
//! Progress goes to stdout; diagnostics go to stderr through `tracing`.

mod format;

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    agent::Team,
    config::Config,
    model::Role,
    oracle::Oracle,
    orchestrator::{self, DEFAULT_MAX_ROUNDS},
};

use format::{format_report, format_stage, format_step};

const TAIL_AFTER_RUN: usize = 8;

/// Crew: a Leader, a Coder, and a Tester coordinating over one log file.
#[derive(Debug, Parser)]
#[command(name = "crew", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Workspace root holding the bus and artifacts (default `~/.crew`).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default `~/.crew/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: from request to delivery
  1. crew run --task "编写一个返回菜谱材料和步骤的技能"
     → prints the task ID and each role's outcome per round
  2. crew status task_20260101120000_1a2b3c4d
  3. crew log --tail 20

Driving roles yourself:
  crew step leader
  crew step coder
  crew step tester

Without an API key (CREW_LLM_API_KEY or OPENAI_API_KEY) drafting is offline."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a task (optional) and drive rounds until it is delivered.
    ///
    /// Without `--task` or `--task-file`, resumes whatever is on the bus.
    Run {
        /// Task description.
        #[arg(long, conflicts_with = "task_file")]
        task: Option<String>,

        /// Read the task description from a file.
        #[arg(long)]
        task_file: Option<PathBuf>,

        /// Clear the bus before starting.
        #[arg(long)]
        fresh: bool,

        /// Give up after this many rounds.
        #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
        max_rounds: u32,
    },

    /// Run one step for one role and print its outcome.
    Step {
        #[arg(value_enum)]
        role: RoleArg,
    },

    /// Print the most recent bus entries.
    Log {
        #[arg(long, default_value_t = TAIL_AFTER_RUN)]
        tail: usize,
    },

    /// Print lifecycle stages, derived from the bus.
    ///
    /// With a task ID, also prints where its skill bundle lives.
    Status {
        /// Exact task ID. Omit to list every task on the bus.
        task_id: Option<String>,
    },
}

/// CLI-facing role, mapped to the domain `Role`.
#[derive(Debug, Clone, ValueEnum)]
pub enum RoleArg {
    Leader,
    Coder,
    Tester,
}

impl RoleArg {
    fn to_domain(&self) -> Role {
        match self {
            Self::Leader => Role::Leader,
            Self::Coder => Role::Coder,
            Self::Tester => Role::Tester,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path().ok_or("could not determine home directory")?,
    };
    let config = Config::load(&config_path)?.with_env(|name| std::env::var(name).ok());
    let root = config
        .resolve_root(cli.root.as_deref())
        .ok_or("could not determine home directory; pass --root")?;

    let oracle = Oracle::new(&config.oracle);
    if oracle.is_offline() {
        tracing::info!("no oracle API key configured; drafting offline");
    }
    let team = Team::open(&root, Box::new(oracle), config.acceptance.clone());

    match cli.command {
        Command::Run {
            task,
            task_file,
            fresh,
            max_rounds,
        } => {
            let request = read_request(task, task_file.as_deref())?;
            cmd_run(&team, request.as_deref(), fresh, max_rounds)
        }
        Command::Step { role } => cmd_step(&team, role.to_domain()),
        Command::Log { tail } => cmd_log(&team, tail),
        Command::Status { task_id } => match task_id {
            Some(id) => cmd_status(&team, &id),
            None => cmd_status_all(&team),
        },
    }
}

fn read_request(task: Option<String>, task_file: Option<&Path>) -> Result<Option<String>, String> {
    let text = match (task, task_file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|e| format!("failed to read task file {}: {e}", path.display()))?,
        (None, None) => return Ok(None),
    };
    let text = text.trim();
    if text.is_empty() {
        return Err("task description is empty".to_string());
    }
    Ok(Some(text.to_string()))
}

fn cmd_run(
    team: &Team,
    request: Option<&str>,
    fresh: bool,
    max_rounds: u32,
) -> Result<(), String> {
    if fresh {
        team.bus()
            .reset()
            .map_err(|e| format!("failed to clear the bus: {e}"))?;
        println!("Bus cleared");
    }

    let task_id = match request {
        Some(request) => {
            let id = orchestrator::submit(team, request)
                .map_err(|e| format!("failed to submit task: {e}"))?;
            println!("Task submitted: {id}");
            Some(id)
        }
        None => None,
    };

    let report = orchestrator::run(team, task_id.as_deref(), max_rounds, |step| {
        println!("{}", format_step(step));
    })
    .map_err(|e| format!("run aborted: {e}"))?;
    println!("{}", format_report(&report));

    print_tail(team, TAIL_AFTER_RUN)
}

fn cmd_step(team: &Team, role: Role) -> Result<(), String> {
    let outcome = team
        .step(role)
        .map_err(|e| format!("{role} step failed: {e}"))?;
    println!("{outcome}");
    Ok(())
}

fn cmd_log(team: &Team, tail: usize) -> Result<(), String> {
    print_tail(team, tail)
}

fn cmd_status(team: &Team, task_id: &str) -> Result<(), String> {
    let stage = team
        .stage(task_id)
        .map_err(|e| format!("failed to read task status: {e}"))?;
    println!("{}", format_stage(task_id, stage));

    let bundle = team
        .factory()
        .find_existing_bundle(task_id)
        .map_err(|e| format!("failed to look up skill bundle: {e}"))?;
    if let Some(bundle) = bundle {
        println!("  bundle: {}", bundle.dir().display());
    }
    Ok(())
}

fn cmd_status_all(team: &Team) -> Result<(), String> {
    let history = team
        .bus()
        .history()
        .map_err(|e| format!("failed to read the bus: {e}"))?;
    let task_ids = history.task_ids();
    if task_ids.is_empty() {
        println!("No tasks");
        return Ok(());
    }
    for task_id in task_ids {
        let stage = team
            .stage(task_id)
            .map_err(|e| format!("failed to read task status: {e}"))?;
        println!("{}", format_stage(task_id, stage));
    }
    Ok(())
}

fn print_tail(team: &Team, n: usize) -> Result<(), String> {
    let lines = team
        .bus()
        .tail(n)
        .map_err(|e| format!("failed to read the bus: {e}"))?;
    if lines.is_empty() {
        println!("Bus is empty");
        return Ok(());
    }
    println!("--- last {} bus entries ({}) ---", lines.len(), team.bus().path().display());
    for line in &lines {
        println!("{line}");
    }
    Ok(())
}
