use crate::model::{AgentSummary, FinalStatus};
use serde::{Deserialize, Serialize};

/// Append-only counters and command log of a single agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMetrics {
    steps: usize,
    ticks: usize,
    commands: Vec<String>,
}

impl AgentMetrics {
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn last_command(&self) -> Option<&str> {
        self.commands.last().map(String::as_str)
    }

    /// Count one tick spent in a non-terminal state.
    pub fn add_tick(&mut self) {
        self.ticks += 1;
    }

    /// Log a committed move.
    pub fn add_step(&mut self, command: String) {
        self.steps += 1;
        self.commands.push(command);
    }

    /// Log anything that is not a move.
    pub fn add_note(&mut self, command: String) {
        self.commands.push(command);
    }
}

/// Aggregate figures over every agent of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub average_steps: f64,
    pub max_steps: usize,
    pub impossible_agent_ids: Vec<String>,
}

impl SimulationMetrics {
    pub fn collect(agents: &[AgentSummary]) -> Self {
        let mut acc = Accumulator::new();
        for agt in agents {
            acc.add(agt.total_steps as f64);
        }
        Self {
            average_steps: if agents.is_empty() { 0.0 } else { acc.report().mean },
            max_steps: agents.iter().map(|agt| agt.total_steps).max().unwrap_or(0),
            impossible_agent_ids: agents
                .iter()
                .filter(|agt| agt.final_status == FinalStatus::Impossible)
                .map(|agt| agt.id.clone())
                .collect(),
        }
    }
}

/// Running mean and variance (Welford).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    /// Mean and sample standard deviation; the latter is zero for fewer than
    /// two values so the report stays serializable.
    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: self.mean,
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    fn summary(id: &str, total_steps: usize, final_status: FinalStatus) -> AgentSummary {
        AgentSummary {
            id: id.into(),
            start: Cell::new(0, 0),
            destination: Cell::new(0, 1),
            total_steps,
            total_ticks: total_steps,
            final_status,
        }
    }

    #[test]
    fn accumulator_matches_sample_statistics() {
        let mut acc = Accumulator::new();
        for val in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.add(val);
        }
        let report = acc.report();
        assert!((report.mean - 5.0).abs() < 1e-12);
        assert!((report.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn metrics_aggregate_steps_and_impossible_ids() {
        let metrics = SimulationMetrics::collect(&[
            summary("1", 4, FinalStatus::Reached),
            summary("2", 0, FinalStatus::Impossible),
            summary("3", 8, FinalStatus::Incomplete),
        ]);
        assert_eq!(metrics.average_steps, 4.0);
        assert_eq!(metrics.max_steps, 8);
        assert_eq!(metrics.impossible_agent_ids, vec!["2".to_string()]);
    }

    #[test]
    fn agent_metrics_log_in_order() {
        let mut metrics = AgentMetrics::default();
        metrics.add_tick();
        metrics.add_step("A1: Right -> (0,1)".into());
        metrics.add_tick();
        metrics.add_note("A1: Wait".into());
        assert_eq!(metrics.steps(), 1);
        assert_eq!(metrics.ticks(), 2);
        assert_eq!(metrics.last_command(), Some("A1: Wait"));
        assert_eq!(metrics.commands().len(), 2);
    }
}
