use crate::agent::{Agent, Denial, Intent, ProposedMove, Rules};
use crate::config::{self, Config, Mode};
use crate::grid::{Cell, GridModel};
use crate::model::{Outcome, SimulationResult, Summary, TickRecord};
use crate::scenario::Scenario;
use crate::stats::SimulationMetrics;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Simulation engine.
///
/// Owns the grid, the agents in priority order and the tick counter, and
/// advances them one propose/resolve/commit cycle at a time.
pub struct Engine {
    grid: GridModel,
    agents: Vec<Agent>,
    rules: Rules,
    mode: Mode,
    max_ticks: usize,
    seed: u64,
    tick: usize,
}

/// Which proposals commit and which are refused in a tick.
#[derive(Debug, Default, PartialEq)]
struct Resolution {
    committed: BTreeMap<usize, Cell>,
    denied: BTreeMap<usize, Denial>,
    collisions: BTreeSet<Cell>,
}

impl Engine {
    /// Create a new `Engine` for `scenario`.
    ///
    /// Every agent gets its own random stream derived from the configured
    /// seed, or from a seed drawn from the OS when none is configured.
    pub fn new(scenario: Scenario, cfg: &Config) -> Result<Self> {
        let seed = match cfg.seed {
            Some(seed) => seed,
            None => config::draw_seed()?,
        };

        let mut agents = Vec::with_capacity(scenario.agents.len());
        for (i_agt, spec) in scenario.agents.iter().enumerate() {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            rng.set_stream(i_agt as u64);
            agents.push(Agent::new(i_agt, spec, cfg.mode, &cfg.learning, rng)?);
        }

        Ok(Self {
            grid: scenario.grid,
            agents,
            rules: Rules {
                priority: cfg.priority,
                wait_threshold: cfg.wait_threshold,
                rewards: cfg.rewards.clone(),
            },
            mode: cfg.mode,
            max_ticks: cfg.max_ticks,
            seed,
            tick: 0,
        })
    }

    /// Every agent is terminal or the tick budget is spent.
    pub fn is_finished(&self) -> bool {
        self.tick >= self.max_ticks || self.agents.iter().all(|agt| agt.status().is_terminal())
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> TickRecord {
        self.tick += 1;

        let marks: Vec<_> = self
            .agents
            .iter()
            .map(|agt| agt.metrics().commands().len())
            .collect();

        // Propose against the tick-start snapshot.
        let peers: Vec<_> = self.agents.iter().map(Agent::peer_view).collect();
        let proposals: Vec<ProposedMove> = self
            .agents
            .par_iter_mut()
            .map(|agt| agt.propose_move(&self.grid, &peers, &self.rules))
            .collect();

        let ids: Vec<_> = self.agents.iter().map(Agent::id).collect();
        let resolution = resolve(&proposals, &ids);

        // Commit in priority order.
        let rewards = &self.rules.rewards;
        for (i_agt, (agt, proposal)) in self.agents.iter_mut().zip(&proposals).enumerate() {
            if let Some(&to) = resolution.committed.get(&i_agt) {
                agt.commit_move(to, rewards);
            } else if let Some(denial) = resolution.denied.get(&i_agt) {
                agt.deny(denial, rewards);
            } else if let Intent::Hold(reason) = proposal.intent {
                agt.hold(reason, rewards);
            }
        }

        let events: Vec<_> = self
            .agents
            .iter()
            .zip(marks)
            .flat_map(|(agt, mark)| agt.metrics().commands()[mark..].iter().cloned())
            .collect();
        log::debug!(
            "tick {}: {} moved, {} denied, {} contested cells",
            self.tick,
            resolution.committed.len(),
            resolution.denied.len(),
            resolution.collisions.len()
        );

        TickRecord {
            tick: self.tick,
            agents: self.agents.iter().map(Agent::view).collect(),
            collision_cells: resolution.collisions.into_iter().collect(),
            events,
        }
    }

    /// Run until finished, handing every tick record to `on_tick`.
    pub fn run<F>(&mut self, mut on_tick: F) -> Result<Summary>
    where
        F: FnMut(&TickRecord) -> Result<()>,
    {
        log::info!(
            "starting {:?} run of {} agents with seed {}",
            self.mode,
            self.agents.len(),
            self.seed
        );

        while !self.is_finished() {
            let record = self.step();
            on_tick(&record).with_context(|| format!("failed to process tick {}", record.tick))?;
        }

        for agt in &self.agents {
            if let Some(policy) = agt.policy() {
                log::debug!(
                    "A{} learned values for {} cells (epsilon {:.4})",
                    agt.id(),
                    policy.table().len(),
                    policy.epsilon()
                );
            }
        }

        let summary = self.summary();
        match summary.outcome {
            Outcome::Completed => log::info!("completed after {} ticks", summary.ticks),
            Outcome::Incomplete => log::warn!("tick budget of {} exhausted", self.max_ticks),
        }
        Ok(summary)
    }

    pub fn summary(&self) -> Summary {
        let agents: Vec<_> = self.agents.iter().map(Agent::summary).collect();
        let metrics = SimulationMetrics::collect(&agents);
        let outcome = if self.agents.iter().all(|agt| agt.status().is_terminal()) {
            Outcome::Completed
        } else {
            Outcome::Incomplete
        };
        Summary {
            seed: self.seed,
            mode: self.mode,
            ticks: self.tick,
            outcome,
            average_steps: metrics.average_steps,
            max_steps: metrics.max_steps,
            impossible_agent_ids: metrics.impossible_agent_ids,
            agents,
        }
    }
}

/// Run `scenario` to the end and keep every tick record in memory.
pub fn run_simulation(scenario: Scenario, cfg: &Config) -> Result<SimulationResult> {
    let mut engine = Engine::new(scenario, cfg).context("failed to construct engine")?;
    let mut ticks = Vec::new();
    let summary = engine.run(|record| {
        ticks.push(record.clone());
        Ok(())
    })?;
    Ok(SimulationResult { ticks, summary })
}

/// Decide which proposed moves commit.
///
/// A cell can be claimed by several movers or be held by an agent that is
/// not moving. Held cells refuse every claimant; among movers the smallest
/// priority key wins. Two movers swapping cells are contested as well. Every
/// refused mover holds its own cell, which can refuse further movers, so
/// claims are re-examined until nothing changes. Movers following each other
/// along a chain or around a cycle all commit.
fn resolve(proposals: &[ProposedMove], ids: &[&str]) -> Resolution {
    let mut movers = BTreeMap::new();
    let mut held = BTreeMap::new();
    for (i_agt, proposal) in proposals.iter().enumerate() {
        match proposal.intent {
            Intent::Move(to) => {
                movers.insert(i_agt, to);
            }
            Intent::Idle | Intent::Hold(_) => {
                held.insert(proposal.from, i_agt);
            }
        }
    }

    let mut res = Resolution::default();
    loop {
        let mut refused = Vec::new();

        let mut claims: BTreeMap<Cell, Vec<usize>> = BTreeMap::new();
        for (&i_agt, &to) in &movers {
            claims.entry(to).or_default().push(i_agt);
        }
        for (cell, mut claimants) in claims {
            if let Some(&holder) = held.get(&cell) {
                res.collisions.insert(cell);
                for i_agt in claimants {
                    let holder = ids[holder].to_string();
                    refused.push((i_agt, Denial::Occupied { cell, holder }));
                }
            } else if claimants.len() > 1 {
                res.collisions.insert(cell);
                claimants.sort_by_key(|&i_agt| proposals[i_agt].priority);
                let winner = ids[claimants[0]];
                for &i_agt in &claimants[1..] {
                    let winner = winner.to_string();
                    refused.push((i_agt, Denial::Outranked { cell, winner }));
                }
            }
        }

        if refused.is_empty() {
            let origins: BTreeMap<_, _> = movers.keys().map(|&i_agt| (proposals[i_agt].from, i_agt)).collect();
            for (&i_a, &to) in &movers {
                let Some(&i_b) = origins.get(&to) else {
                    continue;
                };
                if i_a < i_b && movers.get(&i_b) == Some(&proposals[i_a].from) {
                    res.collisions.insert(to);
                    res.collisions.insert(proposals[i_a].from);
                    let (winner, loser) = if proposals[i_a].priority < proposals[i_b].priority {
                        (i_a, i_b)
                    } else {
                        (i_b, i_a)
                    };
                    let cell = movers[&loser];
                    let winner = ids[winner].to_string();
                    refused.push((loser, Denial::Outranked { cell, winner }));
                }
            }
        }

        if refused.is_empty() {
            break;
        }
        for (i_agt, denial) in refused {
            if movers.remove(&i_agt).is_some() {
                held.insert(proposals[i_agt].from, i_agt);
                res.denied.insert(i_agt, denial);
            }
        }
    }

    res.committed = movers;
    res
}
