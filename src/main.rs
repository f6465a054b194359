mod agent;
mod analysis;
mod config;
mod engine;
mod grid;
mod manager;
mod model;
mod planner;
mod policy;
mod scenario;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a random grid file.
    Generate {
        #[arg(long)]
        rows: usize,

        #[arg(long)]
        cols: usize,

        #[arg(long)]
        obstacles: usize,

        #[arg(long)]
        agents: usize,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Simulate the grid file in a new run directory.
    Run,

    Analyze,

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Generate {
            rows,
            cols,
            obstacles,
            agents,
            seed,
        } => mgr.generate_grid(rows, cols, obstacles, agents, seed)?,
        Command::Run => mgr.run_simulation()?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
