//! Simulation records handed to renderers and written to disk.

use crate::config::Mode;
use crate::grid::Cell;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an agent.
///
/// `Reached` and `Impossible` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Active,
    Waiting,
    Reached,
    Impossible,
}

impl AgentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Reached | AgentStatus::Impossible)
    }
}

/// Classification of an agent once the run is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    Reached,
    Impossible,
    /// Still active or waiting when the tick budget ran out.
    Incomplete,
}

impl From<AgentStatus> for FinalStatus {
    fn from(status: AgentStatus) -> Self {
        match status {
            AgentStatus::Reached => FinalStatus::Reached,
            AgentStatus::Impossible => FinalStatus::Impossible,
            AgentStatus::Active | AgentStatus::Waiting => FinalStatus::Incomplete,
        }
    }
}

/// State of one agent at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: String,
    pub position: Cell,
    pub status: AgentStatus,
    pub steps: usize,
    pub last_command: Option<String>,
}

/// Record of the simulation at a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Tick number, starting at 1.
    pub tick: usize,

    /// Every agent, in priority order.
    pub agents: Vec<AgentView>,

    /// Cells contested during this tick, sorted.
    pub collision_cells: Vec<Cell>,

    /// Human-readable log entries produced during this tick.
    pub events: Vec<String>,
}

/// Terminal report of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub start: Cell,
    pub destination: Cell,
    pub total_steps: usize,
    pub total_ticks: usize,
    pub final_status: FinalStatus,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every agent reached its destination or was found impossible.
    Completed,
    /// The tick budget was exhausted first.
    Incomplete,
}

/// Terminal summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub seed: u64,
    pub mode: Mode,
    pub ticks: usize,
    pub outcome: Outcome,
    pub average_steps: f64,
    pub max_steps: usize,
    pub impossible_agent_ids: Vec<String>,
    pub agents: Vec<AgentSummary>,
}

/// Everything a run produced, for callers that keep it in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub ticks: Vec<TickRecord>,
    pub summary: Summary,
}
