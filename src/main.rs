#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;
mod serve;
mod error;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    let cli    = Cli::parse();
    let config = cli.pipeline_config()?;

    // Held until exit so buffered file logs are flushed.
    let _log_guard = infra::logging::init(&config.logs_dir)?;

    cli.run(config)
}
