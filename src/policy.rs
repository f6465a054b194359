//! Tabular action-value learning for agents that discover their route online.

use crate::config::{LearningConfig, RewardConfig};
use crate::grid::{Action, Cell, N_ACTIONS};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Uniform};
use std::collections::BTreeMap;

/// Scores of every [`Action`] for a single cell, indexed by [`Action::index`].
pub type ActionValues = [f64; N_ACTIONS];

/// Per-agent map from visited cell to action scores.
///
/// Entries are created lazily the first time a cell's own score is updated;
/// reading an unseen cell yields zeros without creating an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionValueTable {
    values: BTreeMap<Cell, ActionValues>,
}

impl ActionValueTable {
    pub fn get(&self, cell: Cell) -> Option<&ActionValues> {
        self.values.get(&cell)
    }

    pub fn value(&self, cell: Cell, action: Action) -> f64 {
        self.get(cell).map_or(0.0, |values| values[action.index()])
    }

    pub fn best_value(&self, cell: Cell) -> f64 {
        self.get(cell).map_or(0.0, |values| {
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        })
    }

    /// Highest-scoring action, lowest index on ties.
    pub fn best_action(&self, cell: Cell) -> Action {
        let mut best = Action::ALL[0];
        for action in Action::ALL {
            if self.value(cell, action) > self.value(cell, best) {
                best = action;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    fn entry_mut(&mut self, cell: Cell) -> &mut ActionValues {
        self.values.entry(cell).or_insert([0.0; N_ACTIONS])
    }
}

/// Epsilon-greedy learner with one-step temporal-difference updates.
#[derive(Debug, Clone)]
pub struct PolicyLearner {
    table: ActionValueTable,
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_min: f64,
    explore: Bernoulli,
    action_dist: Uniform<usize>,
    rng: ChaCha12Rng,
}

impl PolicyLearner {
    /// Create a learner with an empty table drawing from `rng`.
    ///
    /// # Errors
    /// Returns an error if the exploration rate is not a probability.
    pub fn new(cfg: &LearningConfig, rng: ChaCha12Rng) -> Result<Self> {
        Ok(Self {
            table: ActionValueTable::default(),
            alpha: cfg.alpha,
            gamma: cfg.gamma,
            epsilon: cfg.epsilon,
            epsilon_decay: cfg.epsilon_decay,
            epsilon_min: cfg.epsilon_min,
            explore: Bernoulli::new(cfg.epsilon).context("invalid exploration rate")?,
            action_dist: Uniform::new(0, N_ACTIONS)
                .context("invalid action distribution")?,
            rng,
        })
    }

    pub fn table(&self) -> &ActionValueTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// With probability epsilon a uniformly random action, otherwise the
    /// best known action for `state`.
    pub fn choose_action(&mut self, state: Cell) -> Action {
        if self.explore.sample(&mut self.rng) {
            Action::ALL[self.action_dist.sample(&mut self.rng)]
        } else {
            self.table.best_action(state)
        }
    }

    /// `Q[s][a] += alpha * (reward + gamma * max(Q[s']) - Q[s][a])`.
    ///
    /// A `None` next state ends the episode and contributes no future value.
    pub fn update(&mut self, state: Cell, action: Action, reward: f64, next_state: Option<Cell>) {
        let future = next_state.map_or(0.0, |next| self.table.best_value(next));
        let target = reward + self.gamma * future;
        let value = &mut self.table.entry_mut(state)[action.index()];
        *value += self.alpha * (target - *value);
    }

    /// Shrink epsilon multiplicatively towards its floor.
    pub fn decay_epsilon(&mut self) {
        let epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
        if let Ok(explore) = Bernoulli::new(epsilon) {
            self.epsilon = epsilon;
            self.explore = explore;
        }
    }
}

/// Reward for a committed move from `from` onto `to`.
///
/// Reaching the destination pays the goal reward outright. Any other move
/// pays the step cost, the revisit penalty when `to` was seen before, and a
/// bonus proportional to the Manhattan distance gained.
pub fn move_reward(
    rewards: &RewardConfig,
    from: Cell,
    to: Cell,
    destination: Cell,
    revisit: bool,
) -> f64 {
    if to == destination {
        return rewards.goal;
    }
    let gained = from.manhattan(destination) as f64 - to.manhattan(destination) as f64;
    let mut reward = rewards.step + rewards.distance_bonus * gained;
    if revisit {
        reward += rewards.revisit;
    }
    reward
}
