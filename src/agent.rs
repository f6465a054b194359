//! Per-agent decision making and status machine.
//!
//! An agent only ever *proposes* a move against the tick-start snapshot; the
//! engine decides which proposals commit and reports back through
//! [`Agent::commit_move`], [`Agent::deny`] or [`Agent::hold`].

use crate::config::{LearningConfig, Mode, PriorityStrategy, RewardConfig};
use crate::grid::{Action, Cell, GridModel};
use crate::model::{AgentStatus, AgentSummary, AgentView};
use crate::planner::{self, Plan};
use crate::policy::{self, PolicyLearner};
use crate::scenario::AgentSpec;
use crate::stats::AgentMetrics;
use anyhow::{Context, Result};
use rand_chacha::ChaCha12Rng;
use std::collections::BTreeSet;

/// Orders contenders for a cell; the smaller key wins.
pub type PriorityKey = (usize, usize);

/// Priority of the agent at sequence position `index` standing on (or
/// heading for) `cell`.
pub fn priority_key(
    strategy: PriorityStrategy,
    index: usize,
    cell: Cell,
    destination: Cell,
) -> PriorityKey {
    match strategy {
        PriorityStrategy::Sequence => (0, index),
        PriorityStrategy::Distance => (cell.manhattan(destination), index),
    }
}

/// Rules shared read-only by every agent during a tick.
#[derive(Debug, Clone)]
pub struct Rules {
    pub priority: PriorityStrategy,
    pub wait_threshold: usize,
    pub rewards: RewardConfig,
}

/// Another agent as seen in the tick-start snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerView {
    pub position: Cell,
    pub destination: Cell,
    pub status: AgentStatus,
    /// Consecutive ticks this agent has been denied.
    pub denials: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Terminal agents take no part in the tick.
    Idle,
    /// Stay on the current cell.
    Hold(HoldReason),
    /// Step onto an adjacent cell.
    Move(Cell),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// The learned policy chose to wait.
    Chosen,
    /// The candidate cell is an obstacle or lies off the grid.
    Obstacle,
}

/// A proposal for the current tick, not yet a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedMove {
    pub from: Cell,
    pub intent: Intent,
    pub priority: PriorityKey,
}

/// Why the engine refused a proposed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// A higher-priority agent was awarded the cell.
    Outranked { cell: Cell, winner: String },
    /// The cell stays occupied by an agent that is not leaving it.
    Occupied { cell: Cell, holder: String },
}

#[derive(Debug, Clone)]
pub struct Agent {
    index: usize,
    id: String,
    name: String,
    start: Cell,
    position: Cell,
    destination: Cell,
    status: AgentStatus,
    plan: Option<Plan>,
    /// The plan came from a forced replan and survives one more denial.
    forced: bool,
    denials: usize,
    route_checked: bool,
    policy: Option<PolicyLearner>,
    pending: Option<(Cell, Action)>,
    visited: BTreeSet<Cell>,
    metrics: AgentMetrics,
}

impl Agent {
    /// Create the agent at sequence position `index`.
    ///
    /// Learning-mode agents draw exploration from `rng`; search-mode agents
    /// never touch it.
    pub fn new(
        index: usize,
        spec: &AgentSpec,
        mode: Mode,
        learning: &LearningConfig,
        rng: ChaCha12Rng,
    ) -> Result<Self> {
        let policy = match mode {
            Mode::Search => None,
            Mode::Learning => Some(
                PolicyLearner::new(learning, rng)
                    .with_context(|| format!("failed to construct policy of agent {}", spec.id))?,
            ),
        };
        let visited = match policy {
            Some(_) => BTreeSet::from([spec.start]),
            None => BTreeSet::new(),
        };
        let status = if spec.start == spec.destination {
            AgentStatus::Reached
        } else {
            AgentStatus::Active
        };

        Ok(Self {
            index,
            id: spec.id.clone(),
            name: format!("A{}", spec.id),
            start: spec.start,
            position: spec.start,
            destination: spec.destination,
            status,
            plan: None,
            forced: false,
            denials: 0,
            route_checked: false,
            policy,
            pending: None,
            visited,
            metrics: AgentMetrics::default(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn metrics(&self) -> &AgentMetrics {
        &self.metrics
    }

    pub fn policy(&self) -> Option<&PolicyLearner> {
        self.policy.as_ref()
    }

    pub fn peer_view(&self) -> PeerView {
        PeerView {
            position: self.position,
            destination: self.destination,
            status: self.status,
            denials: self.denials,
        }
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id.clone(),
            position: self.position,
            status: self.status,
            steps: self.metrics.steps(),
            last_command: self.metrics.last_command().map(str::to_string),
        }
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            start: self.start,
            destination: self.destination,
            total_steps: self.metrics.steps(),
            total_ticks: self.metrics.ticks(),
            final_status: self.status.into(),
        }
    }

    /// Propose this tick's move against the snapshot `peers`, which holds
    /// every agent (this one included) in sequence order.
    pub fn propose_move(&mut self, grid: &GridModel, peers: &[PeerView], rules: &Rules) -> ProposedMove {
        let from = self.position;
        let intent = self.decide(grid, peers, rules);
        let target = match intent {
            Intent::Move(cell) => cell,
            Intent::Idle | Intent::Hold(_) => from,
        };
        ProposedMove {
            from,
            intent,
            priority: priority_key(rules.priority, self.index, target, self.destination),
        }
    }

    fn decide(&mut self, grid: &GridModel, peers: &[PeerView], rules: &Rules) -> Intent {
        if self.status.is_terminal() {
            return Intent::Idle;
        }
        self.metrics.add_tick();

        if self.policy.is_some() && !self.route_checked {
            self.route_checked = true;
            if planner::find_path(grid, self.position, self.destination).is_none() {
                self.give_up("no route to destination");
                return Intent::Idle;
            }
        }

        if self.is_stalled(grid, peers, rules) && !self.force_replan(grid, peers, rules) {
            return Intent::Idle;
        }

        if self.policy.is_some() {
            self.decide_learning(grid, &rules.rewards)
        } else {
            self.decide_search(grid)
        }
    }

    fn decide_search(&mut self, grid: &GridModel) -> Intent {
        let Some(next) = self.next_step(grid) else {
            self.give_up("no route to destination");
            return Intent::Idle;
        };
        if self.position.manhattan(next) != 1 || !grid.contains(next) || !grid.is_passable(next) {
            self.drop_plan();
            return Intent::Hold(HoldReason::Obstacle);
        }
        Intent::Move(next)
    }

    fn decide_learning(&mut self, grid: &GridModel, rewards: &RewardConfig) -> Intent {
        let position = self.position;
        let guided = self
            .plan
            .as_ref()
            .and_then(Plan::peek)
            .and_then(|next| Action::between(position, next));
        let Some(policy) = self.policy.as_mut() else {
            return Intent::Hold(HoldReason::Chosen);
        };

        let action = guided.unwrap_or_else(|| policy.choose_action(position));
        policy.decay_epsilon();
        if action == Action::Wait {
            self.pending = Some((position, action));
            return Intent::Hold(HoldReason::Chosen);
        }

        match grid.step(position, action).filter(|&next| grid.is_passable(next)) {
            Some(next) => {
                self.pending = Some((position, action));
                Intent::Move(next)
            }
            None => {
                policy.update(position, action, rewards.obstacle, None);
                self.drop_plan();
                Intent::Hold(HoldReason::Obstacle)
            }
        }
    }

    /// Next step of the standing plan, planning afresh when there is none.
    fn next_step(&mut self, grid: &GridModel) -> Option<Cell> {
        if let Some(next) = self.plan.as_ref().and_then(Plan::peek) {
            return Some(next);
        }
        let plan = planner::find_path(grid, self.position, self.destination)?;
        self.note(format!(
            "{}: planned {}-step route from {}",
            self.name,
            plan.len(),
            self.position
        ));
        let next = plan.peek();
        self.plan = Some(plan);
        self.forced = false;
        next
    }

    /// An agent is stalled once denied `wait_threshold` ticks in a row, or
    /// when denied at all while the agent on its next step is stalled.
    fn is_stalled(&self, grid: &GridModel, peers: &[PeerView], rules: &Rules) -> bool {
        if self.denials >= rules.wait_threshold {
            return true;
        }
        if self.denials == 0 {
            return false;
        }
        let next = match self.plan.as_ref().and_then(Plan::peek) {
            Some(next) => Some(next),
            None => planner::find_path(grid, self.position, self.destination).and_then(|plan| plan.peek()),
        };
        next.is_some_and(|next| {
            others(self.index, peers).any(|(_, peer)| {
                peer.position == next
                    && !peer.status.is_terminal()
                    && peer.denials >= rules.wait_threshold
            })
        })
    }

    /// Liveness policy for a stalled agent.
    ///
    /// Checks that the destination is still reachable around parked agents.
    /// When a lower-priority agent that is itself waiting blocks the route
    /// and can clear it, the route is kept and that agent gives way.
    /// Otherwise the agent tries a detour around every other agent, then
    /// negotiates with the blocker which of the two steps aside. Returns
    /// `false` when the destination is unreachable.
    fn force_replan(&mut self, grid: &GridModel, peers: &[PeerView], rules: &Rules) -> bool {
        let position = self.position;
        self.note(format!(
            "{}: forced replan from {} after {} denied ticks",
            self.name, position, self.denials
        ));

        let parked = parked_cells(peers);
        let Some(route) = planner::find_path_avoiding(grid, position, self.destination, &parked) else {
            self.give_up("no route around parked agents");
            return false;
        };

        let blocker = route.peek().and_then(|next| {
            others(self.index, peers)
                .find(|(_, peer)| peer.position == next && !peer.status.is_terminal())
                .map(|(i_blk, _)| i_blk)
        });
        if let Some(i_blk) = blocker {
            let peer = &peers[i_blk];
            if peer.status == AgentStatus::Waiting
                && self.outranks(rules, i_blk, peer)
                && can_clear(grid, peers, i_blk, &route, position)
            {
                self.note(format!(
                    "{}: keeping its route, waiting for {} to clear",
                    self.name, peer.position
                ));
                self.adopt(route);
                return true;
            }
        }

        let occupied: BTreeSet<_> = others(self.index, peers).map(|(_, peer)| peer.position).collect();
        if let Some(plan) = planner::find_path_avoiding(grid, position, self.destination, &occupied) {
            self.note(format!("{}: {}-step detour", self.name, plan.len()));
            self.adopt(plan);
            return true;
        }

        if let Some(i_blk) = blocker {
            if let Some(refuge) = self.negotiate_yield(grid, peers, rules, &route, i_blk) {
                self.note(format!(
                    "{}: yielding, stepping aside to {}",
                    self.name,
                    refuge.last().unwrap_or(position)
                ));
                self.adopt(refuge);
                return true;
            }
        }

        self.adopt(route);
        true
    }

    fn outranks(&self, rules: &Rules, i_peer: usize, peer: &PeerView) -> bool {
        let mine = priority_key(rules.priority, self.index, self.position, self.destination);
        mine < priority_key(rules.priority, i_peer, peer.position, peer.destination)
    }

    fn adopt(&mut self, plan: Plan) {
        self.plan = Some(plan);
        self.forced = true;
    }

    fn drop_plan(&mut self) {
        self.plan = None;
        self.forced = false;
    }

    /// Decide deterministically, from the snapshot alone, whether this agent
    /// or the agent `i_blk` standing on its route steps aside. Both agents
    /// evaluate the same inputs and reach the same verdict.
    ///
    /// The lower-priority agent yields when it has a refuge off the other's
    /// lane; otherwise the higher-priority one does. Returns this agent's
    /// refuge plan when it is the one to yield.
    fn negotiate_yield(
        &self,
        grid: &GridModel,
        peers: &[PeerView],
        rules: &Rules,
        route: &Plan,
        i_blk: usize,
    ) -> Option<Plan> {
        let blocker = peers[i_blk];
        let parked = parked_cells(peers);

        let mut their_lane: BTreeSet<_> =
            planner::find_path_avoiding(grid, blocker.position, blocker.destination, &parked)
                .map(|plan| plan.steps().collect())
                .unwrap_or_default();
        their_lane.insert(blocker.position);
        let my_lane: BTreeSet<_> = route.steps().chain([self.position]).collect();

        let around_me: BTreeSet<_> = others(self.index, peers).map(|(_, peer)| peer.position).collect();
        let around_them: BTreeSet<_> = others(i_blk, peers).map(|(_, peer)| peer.position).collect();
        let my_refuge = planner::find_refuge(grid, self.position, &around_me, &their_lane);
        let their_refuge = planner::find_refuge(grid, blocker.position, &around_them, &my_lane);

        if !self.outranks(rules, i_blk, &blocker) || their_refuge.is_none() {
            my_refuge
        } else {
            None
        }
    }

    /// Apply a committed move onto the adjacent cell `to`.
    pub fn commit_move(&mut self, to: Cell, rewards: &RewardConfig) {
        let from = self.position;
        let action = Action::between(from, to).unwrap_or(Action::Wait);
        self.position = to;
        self.denials = 0;
        self.status = AgentStatus::Active;

        match self.plan.as_mut() {
            Some(plan) if plan.peek() == Some(to) => {
                plan.advance();
                if plan.is_empty() {
                    self.drop_plan();
                }
            }
            _ => self.drop_plan(),
        }

        if let (Some(policy), Some((state, chosen))) = (self.policy.as_mut(), self.pending.take()) {
            let revisit = self.visited.contains(&to);
            let reward = policy::move_reward(rewards, from, to, self.destination, revisit);
            let next_state = (to != self.destination).then_some(to);
            policy.update(state, chosen, reward, next_state);
            self.visited.insert(to);
        }

        self.metrics
            .add_step(format!("{}: {} -> {}", self.name, action.label(), to));
        log::trace!("{} moved {} to {to}", self.name, action.label());

        if to == self.destination {
            self.status = AgentStatus::Reached;
            self.drop_plan();
            self.note(format!(
                "{}: reached its destination in {} steps",
                self.name,
                self.metrics.steps()
            ));
            log::debug!("{} reached {to} in {} steps", self.name, self.metrics.steps());
        }
    }

    /// Refuse this tick's move; the agent waits and replans next tick,
    /// unless it is following a forced plan for the first refusal.
    pub fn deny(&mut self, denial: &Denial, rewards: &RewardConfig) {
        self.denials += 1;
        self.status = AgentStatus::Waiting;
        if !std::mem::take(&mut self.forced) {
            self.plan = None;
        }

        if let (Some(policy), Some((state, chosen))) = (self.policy.as_mut(), self.pending.take()) {
            policy.update(state, chosen, rewards.blocked, Some(state));
        }

        let reason = match denial {
            Denial::Outranked { cell, winner } => format!("lost {cell} to A{winner}"),
            Denial::Occupied { cell, holder } => format!("{cell} held by A{holder}"),
        };
        log::trace!("{} denied: {reason}", self.name);
        self.note(format!("{}: Wait ({reason})", self.name));
    }

    /// Record a tick in which the agent chose not to move.
    pub fn hold(&mut self, reason: HoldReason, rewards: &RewardConfig) {
        if let (Some(policy), Some((state, chosen))) = (self.policy.as_mut(), self.pending.take()) {
            policy.update(state, chosen, rewards.step, Some(state));
        }
        self.status = AgentStatus::Active;

        let command = match reason {
            HoldReason::Chosen => format!("{}: Wait", self.name),
            HoldReason::Obstacle => format!("{}: Wait (obstacle ahead, replanning)", self.name),
        };
        self.note(command);
    }

    fn give_up(&mut self, reason: &str) {
        self.status = AgentStatus::Impossible;
        self.drop_plan();
        self.pending = None;
        log::warn!("{} cannot reach {}: {reason}", self.name, self.destination);
        self.note(format!(
            "{}: impossible scenario at {} ({reason})",
            self.name, self.position
        ));
    }

    fn note(&mut self, command: String) {
        self.metrics.add_note(command);
    }
}

fn others(index: usize, peers: &[PeerView]) -> impl Iterator<Item = (usize, &PeerView)> {
    peers
        .iter()
        .enumerate()
        .filter(move |&(i_peer, _)| i_peer != index)
}

/// Whether the agent `i_blk` can clear `route` on its own, by a detour
/// around every other agent or a refuge off the lane of the agent at `from`.
fn can_clear(grid: &GridModel, peers: &[PeerView], i_blk: usize, route: &Plan, from: Cell) -> bool {
    let blocker = peers[i_blk];
    let around_them: BTreeSet<_> = others(i_blk, peers).map(|(_, peer)| peer.position).collect();
    if planner::find_path_avoiding(grid, blocker.position, blocker.destination, &around_them).is_some() {
        return true;
    }
    let lane: BTreeSet<_> = route.steps().chain([from]).collect();
    planner::find_refuge(grid, blocker.position, &around_them, &lane).is_some()
}

fn parked_cells(peers: &[PeerView]) -> BTreeSet<Cell> {
    peers
        .iter()
        .filter(|peer| peer.status.is_terminal())
        .map(|peer| peer.position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rules() -> Rules {
        Rules {
            priority: PriorityStrategy::Sequence,
            wait_threshold: 2,
            rewards: RewardConfig::default(),
        }
    }

    fn agent(mode: Mode, start: Cell, destination: Cell) -> Agent {
        let spec = AgentSpec {
            id: "1".into(),
            start,
            destination,
        };
        Agent::new(
            0,
            &spec,
            mode,
            &LearningConfig {
                epsilon: 0.0,
                epsilon_min: 0.0,
                ..LearningConfig::default()
            },
            ChaCha12Rng::seed_from_u64(0),
        )
        .expect("valid agent")
    }

    fn propose(agent: &mut Agent, grid: &GridModel) -> Intent {
        let peers = [agent.peer_view()];
        agent.propose_move(grid, &peers, &rules()).intent
    }

    #[test]
    fn agent_on_its_destination_stays_reached() {
        let grid = GridModel::new(2, 2, []).expect("valid grid");
        let mut agent = agent(Mode::Search, Cell::new(1, 1), Cell::new(1, 1));
        for _ in 0..5 {
            assert_eq!(propose(&mut agent, &grid), Intent::Idle);
            assert_eq!(agent.status(), AgentStatus::Reached);
        }
        assert_eq!(agent.metrics().ticks(), 0);
    }

    #[test]
    fn search_agent_follows_its_plan_to_the_destination() {
        let grid = GridModel::new(3, 1, []).expect("valid grid");
        let mut agent = agent(Mode::Search, Cell::new(0, 0), Cell::new(0, 2));
        let rewards = RewardConfig::default();

        assert_eq!(propose(&mut agent, &grid), Intent::Move(Cell::new(0, 1)));
        agent.commit_move(Cell::new(0, 1), &rewards);
        assert_eq!(propose(&mut agent, &grid), Intent::Move(Cell::new(0, 2)));
        agent.commit_move(Cell::new(0, 2), &rewards);

        assert_eq!(agent.status(), AgentStatus::Reached);
        assert_eq!(agent.metrics().steps(), 2);
        assert_eq!(propose(&mut agent, &grid), Intent::Idle);
        assert_eq!(
            agent.metrics().last_command(),
            Some("A1: reached its destination in 2 steps")
        );
    }

    #[test]
    fn denial_makes_the_agent_wait_then_resume() {
        let grid = GridModel::new(3, 1, []).expect("valid grid");
        let mut agent = agent(Mode::Search, Cell::new(0, 0), Cell::new(0, 2));
        let rewards = RewardConfig::default();

        propose(&mut agent, &grid);
        let denial = Denial::Outranked {
            cell: Cell::new(0, 1),
            winner: "0".into(),
        };
        agent.deny(&denial, &rewards);
        assert_eq!(agent.status(), AgentStatus::Waiting);
        assert_eq!(agent.metrics().last_command(), Some("A1: Wait (lost (0,1) to A0)"));
        assert_eq!(agent.metrics().steps(), 0);

        assert_eq!(propose(&mut agent, &grid), Intent::Move(Cell::new(0, 1)));
        agent.commit_move(Cell::new(0, 1), &rewards);
        assert_eq!(agent.status(), AgentStatus::Active);
        assert_eq!(agent.metrics().ticks(), 2);
    }

    #[test]
    fn unreachable_destination_is_impossible() {
        let grid = GridModel::new(3, 1, [Cell::new(0, 1)]).expect("valid grid");
        for mode in [Mode::Search, Mode::Learning] {
            let mut agent = agent(mode, Cell::new(0, 0), Cell::new(0, 2));
            assert_eq!(propose(&mut agent, &grid), Intent::Idle);
            assert_eq!(agent.status(), AgentStatus::Impossible);
            assert_eq!(propose(&mut agent, &grid), Intent::Idle);
            assert_eq!(agent.summary().final_status, crate::model::FinalStatus::Impossible);
        }
    }

    #[test]
    fn learning_agent_bumping_an_obstacle_holds_and_learns() {
        // greedy with an empty table picks Left, which leaves the grid
        let grid = GridModel::new(3, 1, []).expect("valid grid");
        let mut agent = agent(Mode::Learning, Cell::new(0, 0), Cell::new(0, 2));
        let rewards = RewardConfig::default();

        assert_eq!(propose(&mut agent, &grid), Intent::Hold(HoldReason::Obstacle));
        agent.hold(HoldReason::Obstacle, &rewards);
        let table = agent.policy().expect("learning agent").table();
        assert!(table.value(Cell::new(0, 0), Action::Left) < 0.0);
        assert_eq!(table.len(), 1);

        assert_eq!(propose(&mut agent, &grid), Intent::Move(Cell::new(0, 1)));
        agent.commit_move(Cell::new(0, 1), &rewards);
        assert_eq!(agent.metrics().last_command(), Some("A1: Right -> (0,1)"));
    }

    #[test]
    fn forced_replan_takes_a_detour_around_peers() {
        let grid = GridModel::new(3, 2, []).expect("valid grid");
        let mut agent = agent(Mode::Search, Cell::new(0, 0), Cell::new(0, 2));
        let rewards = RewardConfig::default();
        let blocker = PeerView {
            position: Cell::new(0, 1),
            destination: Cell::new(0, 1),
            status: AgentStatus::Active,
            denials: 0,
        };
        let denial = Denial::Occupied {
            cell: Cell::new(0, 1),
            holder: "2".into(),
        };
        agent.deny(&denial, &rewards);
        agent.deny(&denial, &rewards);

        let peers = [agent.peer_view(), blocker];
        let proposal = agent.propose_move(&grid, &peers, &rules());
        assert_eq!(proposal.intent, Intent::Move(Cell::new(1, 0)));
    }

    #[test]
    fn stalled_agent_keeps_its_route_while_a_lower_agent_can_step_aside() {
        let grid = GridModel::new(3, 2, []).expect("valid grid");
        let mut agent = agent(Mode::Search, Cell::new(0, 0), Cell::new(0, 2));
        let rewards = RewardConfig::default();
        let blocker = PeerView {
            position: Cell::new(0, 1),
            destination: Cell::new(0, 0),
            status: AgentStatus::Waiting,
            denials: 2,
        };
        let denial = Denial::Occupied {
            cell: Cell::new(0, 1),
            holder: "2".into(),
        };
        agent.deny(&denial, &rewards);

        let peers = [agent.peer_view(), blocker];
        let proposal = agent.propose_move(&grid, &peers, &rules());
        assert_eq!(proposal.intent, Intent::Move(Cell::new(0, 1)));
        assert_eq!(
            agent.metrics().last_command(),
            Some("A1: keeping its route, waiting for (0,1) to clear")
        );
    }

    #[test]
    fn distance_priority_prefers_the_closer_agent() {
        let dest = Cell::new(0, 5);
        let near = priority_key(PriorityStrategy::Distance, 3, Cell::new(0, 4), dest);
        let far = priority_key(PriorityStrategy::Distance, 0, Cell::new(0, 1), dest);
        assert!(near < far);
        let first = priority_key(PriorityStrategy::Sequence, 0, Cell::new(0, 1), dest);
        assert!(first < priority_key(PriorityStrategy::Sequence, 3, Cell::new(0, 4), dest));
    }
}
