//! Scenario input: the grid text format, agent specifications and their
//! validation, and seeded random scenario generation.
//!
//! The text format is one grid row per line with whitespace-separated tokens:
//! `.` is a free cell, `X` an obstacle, `A<id>` the start of agent `<id>` and
//! `B<id>` its destination.

use crate::grid::{Cell, GridError, GridModel};
use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors rejecting malformed input before a run starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("grid has no rows")]
    Empty,
    #[error("row {row} has {actual} cells, but the first row has {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown token {token:?} at ({row},{col})")]
    UnknownToken {
        row: usize,
        col: usize,
        token: String,
    },
    #[error("token {token:?} appears more than once")]
    DuplicateToken { token: String },
    #[error("agent {id:?} has a start but no destination")]
    MissingDestination { id: String },
    #[error("agent {id:?} has a destination but no start")]
    MissingStart { id: String },
    #[error("scenario has no agents")]
    NoAgents,
    #[error("agent id {id:?} is used more than once")]
    DuplicateAgent { id: String },
    #[error("agents share the start cell {cell}")]
    DuplicateStart { cell: Cell },
    #[error("agent {id:?} has an endpoint {cell} that is blocked or outside the grid")]
    BlockedEndpoint { id: String, cell: Cell },
    #[error("{needed} free cells are needed, but the grid only has {available}")]
    TooFewCells { needed: usize, available: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// One agent's identity and endpoints, built once during input validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub start: Cell,
    pub destination: Cell,
}

/// A validated grid together with its agents, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub grid: GridModel,
    pub agents: Vec<AgentSpec>,
}

impl Scenario {
    /// Validate agent specifications against `grid`.
    ///
    /// # Errors
    /// Returns an error if there are no agents, ids or start cells repeat, or
    /// an endpoint is blocked or outside the grid.
    pub fn new(grid: GridModel, agents: Vec<AgentSpec>) -> Result<Self, ScenarioError> {
        if agents.is_empty() {
            return Err(ScenarioError::NoAgents);
        }
        let mut ids = BTreeSet::new();
        let mut starts = BTreeSet::new();
        for spec in &agents {
            if !ids.insert(spec.id.as_str()) {
                return Err(ScenarioError::DuplicateAgent {
                    id: spec.id.clone(),
                });
            }
            for cell in [spec.start, spec.destination] {
                if !grid.contains(cell) || !grid.is_passable(cell) {
                    return Err(ScenarioError::BlockedEndpoint {
                        id: spec.id.clone(),
                        cell,
                    });
                }
            }
            if !starts.insert(spec.start) {
                return Err(ScenarioError::DuplicateStart { cell: spec.start });
            }
        }
        Ok(Self { grid, agents })
    }

    /// Render the scenario back into the grid text format.
    ///
    /// Endpoints sharing a cell cannot be represented; the start wins.
    pub fn render(&self) -> String {
        let mut tokens = BTreeMap::new();
        for spec in &self.agents {
            tokens.insert(spec.destination, format!("B{}", spec.id));
        }
        for spec in &self.agents {
            tokens.insert(spec.start, format!("A{}", spec.id));
        }

        let width = tokens
            .values()
            .map(String::len)
            .max()
            .unwrap_or(1)
            .max(1);
        let mut out = String::new();
        for row in 0..self.grid.height() {
            let line: Vec<_> = (0..self.grid.width())
                .map(|col| {
                    let cell = Cell::new(row, col);
                    let token = match tokens.get(&cell) {
                        Some(token) => token.as_str(),
                        None if self.grid.blocked().contains(&cell) => "X",
                        None => ".",
                    };
                    format!("{token:<width$}")
                })
                .collect();
            out.push_str(line.join(" ").trim_end());
            out.push('\n');
        }
        out
    }
}

/// Parse the grid text format into a validated [`Scenario`].
///
/// Agents are ordered by id, numeric ids first in numeric order.
///
/// # Errors
/// Returns an error describing the first malformed row, token or agent.
pub fn parse_grid(text: &str) -> Result<Scenario, ScenarioError> {
    let rows: Vec<Vec<&str>> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    let width = rows.first().map(Vec::len).ok_or(ScenarioError::Empty)?;

    let mut blocked = Vec::new();
    let mut starts = BTreeMap::new();
    let mut destinations = BTreeMap::new();
    for (row, tokens) in rows.iter().enumerate() {
        if tokens.len() != width {
            return Err(ScenarioError::Ragged {
                row,
                expected: width,
                actual: tokens.len(),
            });
        }
        for (col, &token) in tokens.iter().enumerate() {
            let cell = Cell::new(row, col);
            let endpoints = match token.split_at_checked(1) {
                _ if token == "." => continue,
                _ if token == "X" => {
                    blocked.push(cell);
                    continue;
                }
                Some(("A", id)) if !id.is_empty() => (&mut starts, id),
                Some(("B", id)) if !id.is_empty() => (&mut destinations, id),
                _ => {
                    return Err(ScenarioError::UnknownToken {
                        row,
                        col,
                        token: token.to_string(),
                    });
                }
            };
            let (map, id) = endpoints;
            if map.insert(id.to_string(), cell).is_some() {
                return Err(ScenarioError::DuplicateToken {
                    token: token.to_string(),
                });
            }
        }
    }

    if let Some(id) = destinations.keys().find(|id| !starts.contains_key(*id)) {
        return Err(ScenarioError::MissingStart { id: id.clone() });
    }
    let mut agents = starts
        .into_iter()
        .map(|(id, start)| match destinations.get(&id) {
            Some(&destination) => Ok(AgentSpec {
                id,
                start,
                destination,
            }),
            None => Err(ScenarioError::MissingDestination { id }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    agents.sort_by(|a, b| priority_key(&a.id).cmp(&priority_key(&b.id)));

    let grid = GridModel::new(width, rows.len(), blocked)?;
    Scenario::new(grid, agents)
}

fn priority_key(id: &str) -> (u64, &str) {
    (id.parse().unwrap_or(u64::MAX), id)
}

/// Generate a `rows` x `cols` scenario with `n_obstacles` obstacles and
/// `n_agents` agents on distinct free cells, all drawn from `rng`.
///
/// Nothing guarantees that every destination is reachable; unreachable
/// agents are reported as impossible by the simulation.
///
/// # Errors
/// Returns an error if the grid is empty or too small to place everything.
pub fn generate<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    n_obstacles: usize,
    n_agents: usize,
    rng: &mut R,
) -> Result<Scenario, ScenarioError> {
    let available = rows.checked_mul(cols).filter(|&n_cells| n_cells > 0).ok_or(
        GridError::InvalidDimensions {
            width: cols,
            height: rows,
        },
    )?;
    let needed = n_agents
        .checked_mul(2)
        .and_then(|n_endpoints| n_endpoints.checked_add(n_obstacles))
        .unwrap_or(usize::MAX);
    if needed > available {
        return Err(ScenarioError::TooFewCells { needed, available });
    }

    let cells: Vec<_> = index::sample(rng, available, needed)
        .into_iter()
        .map(|i_cell| Cell::new(i_cell / cols, i_cell % cols))
        .collect();
    let (obstacles, endpoints) = cells.split_at(n_obstacles);

    let grid = GridModel::new(cols, rows, obstacles.iter().copied())?;
    let agents = endpoints
        .chunks_exact(2)
        .enumerate()
        .map(|(i_agt, pair)| AgentSpec {
            id: (i_agt + 1).to_string(),
            start: pair[0],
            destination: pair[1],
        })
        .collect();
    Scenario::new(grid, agents)
}
