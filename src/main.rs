mod acceptance;
mod agent;
mod bus;
mod cli;
mod config;
mod documents;
mod model;
mod oracle;
mod orchestrator;
mod skill;

use std::{io, process};

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "crew=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
