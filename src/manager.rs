use crate::analysis::Analyzer;
use crate::config::{self, Config};
use crate::engine;
use crate::scenario;
use anyhow::{Context, Result};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::encode;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Owns the layout of a simulation directory.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    /// Open `sim_dir`, creating it and a default configuration file if
    /// either is missing.
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();
        fs::create_dir_all(&sim_dir).with_context(|| format!("failed to create {sim_dir:?}"))?;

        let config_file = sim_dir.join("config.toml");
        if !config_file.exists() {
            let contents =
                toml::to_string_pretty(&Config::default()).context("failed to serialize default cfg")?;
            fs::write(&config_file, contents)
                .with_context(|| format!("failed to write {config_file:?}"))?;
            log::info!("wrote default {config_file:?}");
        }

        let cfg = Config::from_file(&config_file).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Write a random scenario to the grid file.
    pub fn generate_grid(
        &self,
        rows: usize,
        cols: usize,
        n_obstacles: usize,
        n_agents: usize,
        seed: Option<u64>,
    ) -> Result<()> {
        let seed = match seed.or(self.cfg.seed) {
            Some(seed) => seed,
            None => config::draw_seed()?,
        };
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let scenario = scenario::generate(rows, cols, n_obstacles, n_agents, &mut rng)
            .context("failed to generate scenario")?;

        let grid_file = self.grid_file();
        fs::write(&grid_file, scenario.render())
            .with_context(|| format!("failed to write {grid_file:?}"))?;
        log::info!("wrote {rows}x{cols} grid with {n_agents} agents to {grid_file:?} (seed {seed})");

        Ok(())
    }

    /// Simulate the grid file in a new run directory.
    pub fn run_simulation(&self) -> Result<()> {
        let grid_file = self.grid_file();
        let text = fs::read_to_string(&grid_file)
            .with_context(|| format!("failed to read {grid_file:?}"))?;
        let scenario = scenario::parse_grid(&text)
            .with_context(|| format!("failed to parse {grid_file:?}"))?;

        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let result = engine::run_simulation(scenario, &self.cfg).context("failed to run simulation")?;

        if self.cfg.output.save_trajectory {
            let mut writer = BufWriter::new(create_file(run_dir.join("trajectory.msgpack"))?);
            for record in &result.ticks {
                encode::write(&mut writer, record).context("failed to serialize tick record")?;
            }
            writer.flush().context("failed to flush trajectory stream")?;
        }

        let mut events = BufWriter::new(create_file(run_dir.join("events.log"))?);
        for record in &result.ticks {
            for event in &record.events {
                writeln!(events, "{:06} {event}", record.tick).context("failed to write event")?;
            }
        }
        events.flush().context("failed to flush event stream")?;

        let summary_file = run_dir.join("summary.toml");
        let contents = toml::to_string_pretty(&result.summary).context("failed to serialize summary")?;
        fs::write(&summary_file, contents)
            .with_context(|| format!("failed to write {summary_file:?}"))?;
        log::info!("wrote {summary_file:?}");

        Ok(())
    }

    /// Aggregate every run summary into the analysis file.
    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        let mut analyzer = Analyzer::new();
        for run_idx in 0..n_runs {
            let summary_file = self.run_dir(run_idx).join("summary.toml");
            analyzer
                .add_file(&summary_file)
                .with_context(|| format!("failed to add {summary_file:?}"))?;
        }

        let analysis_file = self.analysis_file();
        analyzer
            .save_report(&analysis_file)
            .context("failed to save report")?;
        log::info!("wrote {analysis_file:?} from {n_runs} runs");

        Ok(())
    }

    /// Remove run directories and the analysis file, keeping the inputs.
    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs()? {
            fs::remove_dir_all(&run_dir).with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let analysis_file = self.analysis_file();
        if analysis_file.exists() {
            fs::remove_file(&analysis_file)
                .with_context(|| format!("failed to remove {analysis_file:?}"))?;
            log::info!("removed {analysis_file:?}");
        }

        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn grid_file(&self) -> PathBuf {
        self.sim_dir.join("grid.txt")
    }

    fn analysis_file(&self) -> PathBuf {
        self.sim_dir.join("analysis.toml")
    }
}

fn create_file(file: PathBuf) -> Result<File> {
    File::create(&file).with_context(|| format!("failed to create {file:?}"))
}
