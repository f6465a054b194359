use crate::model::{FinalStatus, Outcome, Summary};
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Cross-run statistics of a simulation directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub n_runs: usize,
    pub n_completed: usize,
    /// Fraction of all agents, over all runs, that reached their destination.
    pub reach_rate: f64,
    /// Fraction of all agents found impossible.
    pub impossible_rate: f64,
    pub ticks: AccumulatorReport,
    pub average_steps: AccumulatorReport,
    pub max_steps: AccumulatorReport,
}

/// Aggregates run summaries one file at a time.
pub struct Analyzer {
    n_runs: usize,
    n_completed: usize,
    n_agents: usize,
    n_reached: usize,
    n_impossible: usize,
    ticks: Accumulator,
    average_steps: Accumulator,
    max_steps: Accumulator,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            n_runs: 0,
            n_completed: 0,
            n_agents: 0,
            n_reached: 0,
            n_impossible: 0,
            ticks: Accumulator::new(),
            average_steps: Accumulator::new(),
            max_steps: Accumulator::new(),
        }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        let summary: Summary = toml::from_str(&contents).context("failed to deserialize summary")?;
        self.add_summary(&summary);
        Ok(())
    }

    pub fn add_summary(&mut self, summary: &Summary) {
        self.n_runs += 1;
        if summary.outcome == Outcome::Completed {
            self.n_completed += 1;
        }
        for agt in &summary.agents {
            self.n_agents += 1;
            match agt.final_status {
                FinalStatus::Reached => self.n_reached += 1,
                FinalStatus::Impossible => self.n_impossible += 1,
                FinalStatus::Incomplete => {}
            }
        }
        self.ticks.add(summary.ticks as f64);
        self.average_steps.add(summary.average_steps);
        self.max_steps.add(summary.max_steps as f64);
    }

    pub fn report(&self) -> AnalysisReport {
        let rate = |count: usize| {
            if self.n_agents == 0 {
                0.0
            } else {
                count as f64 / self.n_agents as f64
            }
        };
        AnalysisReport {
            n_runs: self.n_runs,
            n_completed: self.n_completed,
            reach_rate: rate(self.n_reached),
            impossible_rate: rate(self.n_impossible),
            ticks: self.ticks.report(),
            average_steps: self.average_steps.report(),
            max_steps: self.max_steps.report(),
        }
    }

    pub fn save_report<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents = toml::to_string_pretty(&self.report()).context("failed to serialize report")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
