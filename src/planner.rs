//! Single-agent path planning on the static grid.

use crate::grid::{Cell, GridModel};
use std::{
    cmp::Reverse,
    collections::{BTreeSet, BinaryHeap, VecDeque},
};

/// Ordered cells from (but excluding) the origin to (and including) the goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: VecDeque<Cell>,
}

impl Plan {
    pub fn new(steps: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Next unconsumed step.
    pub fn peek(&self) -> Option<Cell> {
        self.steps.front().copied()
    }

    /// Consume the next step once the move onto it has been committed.
    pub fn advance(&mut self) -> Option<Cell> {
        self.steps.pop_front()
    }

    pub fn last(&self) -> Option<Cell> {
        self.steps.back().copied()
    }

    pub fn steps(&self) -> impl Iterator<Item = Cell> + '_ {
        self.steps.iter().copied()
    }
}

/// Shortest path from `start` to `goal` on the static grid, or `None` when
/// the goal is unreachable.
pub fn find_path(grid: &GridModel, start: Cell, goal: Cell) -> Option<Plan> {
    find_path_avoiding(grid, start, goal, &BTreeSet::new())
}

/// A* with unit edge costs and the Manhattan heuristic, additionally treating
/// every cell in `avoid` as blocked.
///
/// The heuristic is consistent on a 4-connected grid, so a closed cell is
/// never improved later: closed neighbours are not pushed again and stale
/// heap entries are dropped when popped. Equal f-scores pop in discovery
/// order, which keeps the chosen path identical across runs.
pub fn find_path_avoiding(
    grid: &GridModel,
    start: Cell,
    goal: Cell,
    avoid: &BTreeSet<Cell>,
) -> Option<Plan> {
    if start == goal {
        return Some(Plan::default());
    }
    if !grid.is_passable(goal) || avoid.contains(&goal) {
        return None;
    }

    let n_cells = grid.cell_count();
    let mut g_score = vec![usize::MAX; n_cells];
    let mut came_from: Vec<Option<Cell>> = vec![None; n_cells];
    let mut closed = vec![false; n_cells];
    let mut open = BinaryHeap::new();
    let mut n_pushed: u64 = 0;

    g_score[grid.index(start)] = 0;
    open.push(Reverse((start.manhattan(goal), n_pushed, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        let i_cur = grid.index(current);
        if closed[i_cur] {
            continue;
        }
        closed[i_cur] = true;

        if current == goal {
            return Some(reconstruct(grid, &came_from, start, goal));
        }

        let g_next = g_score[i_cur] + 1;
        for next in grid.neighbors(current) {
            let i_next = grid.index(next);
            if closed[i_next] || avoid.contains(&next) {
                continue;
            }
            if g_next < g_score[i_next] {
                g_score[i_next] = g_next;
                came_from[i_next] = Some(current);
                n_pushed += 1;
                open.push(Reverse((g_next + next.manhattan(goal), n_pushed, next)));
            }
        }
    }

    None
}

/// Breadth-first search for the nearest cell outside `keep_clear`.
///
/// Cells in `occupied` can neither be entered nor crossed. Used by an agent
/// stepping aside to let another one pass along its remaining plan.
pub fn find_refuge(
    grid: &GridModel,
    start: Cell,
    occupied: &BTreeSet<Cell>,
    keep_clear: &BTreeSet<Cell>,
) -> Option<Plan> {
    let n_cells = grid.cell_count();
    let mut came_from: Vec<Option<Cell>> = vec![None; n_cells];
    let mut seen = vec![false; n_cells];
    let mut queue = VecDeque::from([start]);
    seen[grid.index(start)] = true;

    while let Some(current) = queue.pop_front() {
        if current != start && !keep_clear.contains(&current) {
            return Some(reconstruct(grid, &came_from, start, current));
        }
        for next in grid.neighbors(current) {
            let i_next = grid.index(next);
            if seen[i_next] || occupied.contains(&next) {
                continue;
            }
            seen[i_next] = true;
            came_from[i_next] = Some(current);
            queue.push_back(next);
        }
    }

    None
}

fn reconstruct(grid: &GridModel, came_from: &[Option<Cell>], start: Cell, goal: Cell) -> Plan {
    let mut steps = Vec::new();
    let mut current = goal;
    while current != start {
        steps.push(current);
        match came_from[grid.index(current)] {
            Some(prev) => current = prev,
            None => break,
        }
    }
    Plan::new(steps.into_iter().rev())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::parse_grid;

    fn bfs_distance(grid: &GridModel, start: Cell, goal: Cell) -> Option<usize> {
        let mut dist = vec![usize::MAX; grid.cell_count()];
        let mut queue = VecDeque::from([start]);
        dist[grid.index(start)] = 0;
        while let Some(current) = queue.pop_front() {
            if current == goal {
                return Some(dist[grid.index(current)]);
            }
            for next in grid.neighbors(current) {
                if dist[grid.index(next)] == usize::MAX {
                    dist[grid.index(next)] = dist[grid.index(current)] + 1;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn assert_valid(grid: &GridModel, start: Cell, goal: Cell, plan: &Plan) {
        let mut prev = start;
        for step in plan.steps() {
            assert!(grid.is_passable(step), "{step} is blocked");
            assert_eq!(prev.manhattan(step), 1, "{prev} -> {step} is not a unit move");
            prev = step;
        }
        assert_eq!(prev, goal);
    }

    const MAZE: &str = "\
A1 .  .  X  .  .
X  X  .  X  .  X
.  .  .  .  .  .
.  X  X  X  X  .
.  .  .  X  B1 .
";

    #[test]
    fn plan_length_matches_bfs_distance() {
        let scenario = parse_grid(MAZE).expect("valid maze");
        let grid = &scenario.grid;
        let free: Vec<_> = (0..grid.height())
            .flat_map(|row| (0..grid.width()).map(move |col| Cell::new(row, col)))
            .filter(|&cell| grid.is_passable(cell))
            .collect();

        for &start in &free {
            for &goal in &free {
                let expected = bfs_distance(grid, start, goal);
                let plan = find_path(grid, start, goal);
                assert_eq!(plan.as_ref().map(Plan::len), expected, "{start} -> {goal}");
                if let Some(plan) = plan {
                    assert_valid(grid, start, goal, &plan);
                }
            }
        }
    }

    #[test]
    fn walled_off_goal_is_not_found() {
        let scenario = parse_grid("A1 . X .\n. . X B1\n").expect("valid grid");
        let agent = &scenario.agents[0];
        assert_eq!(
            find_path(&scenario.grid, agent.start, agent.destination),
            None
        );
    }

    #[test]
    fn start_equal_to_goal_is_an_empty_plan() {
        let grid = GridModel::new(2, 2, []).expect("valid grid");
        let plan = find_path(&grid, Cell::new(1, 1), Cell::new(1, 1)).expect("trivial path");
        assert!(plan.is_empty());
    }

    #[test]
    fn equal_scores_pop_in_discovery_order() {
        let grid = GridModel::new(2, 2, []).expect("valid grid");
        let plan = find_path(&grid, Cell::new(0, 0), Cell::new(1, 1)).expect("path");
        assert_eq!(
            plan.steps().collect::<Vec<_>>(),
            vec![Cell::new(1, 0), Cell::new(1, 1)]
        );
        assert_eq!(find_path(&grid, Cell::new(0, 0), Cell::new(1, 1)), Some(plan));
    }

    #[test]
    fn avoided_cells_force_a_detour() {
        let grid = GridModel::new(3, 3, []).expect("valid grid");
        let avoid = BTreeSet::from([Cell::new(1, 1)]);
        let plan = find_path_avoiding(&grid, Cell::new(1, 0), Cell::new(1, 2), &avoid)
            .expect("detour exists");
        assert_eq!(plan.len(), 4);
        assert!(plan.steps().all(|cell| cell != Cell::new(1, 1)));

        let avoid_goal = BTreeSet::from([Cell::new(1, 2)]);
        assert_eq!(
            find_path_avoiding(&grid, Cell::new(1, 0), Cell::new(1, 2), &avoid_goal),
            None
        );
    }

    #[test]
    fn refuge_is_nearest_cell_off_the_kept_lane() {
        // corridor along row 0 with a single alcove below column 2
        let grid = GridModel::new(
            5,
            2,
            [Cell::new(1, 0), Cell::new(1, 1), Cell::new(1, 3), Cell::new(1, 4)],
        )
        .expect("valid grid");
        let lane = BTreeSet::from([Cell::new(0, 1), Cell::new(0, 2), Cell::new(0, 3)]);
        let occupied = BTreeSet::from([Cell::new(0, 3)]);

        let plan = find_refuge(&grid, Cell::new(0, 2), &occupied, &lane).expect("alcove");
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![Cell::new(1, 2)]);

        let blocked = BTreeSet::from([Cell::new(0, 2)]);
        assert_eq!(find_refuge(&grid, Cell::new(0, 3), &blocked, &lane), Some(Plan::new([Cell::new(0, 4)])));
        let whole_row: BTreeSet<_> = (0..5).map(|col| Cell::new(0, col)).collect();
        assert_eq!(find_refuge(&grid, Cell::new(0, 3), &blocked, &whole_row), None);
    }
}
