//! Occupancy grid, cell coordinates and unit moves.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};
use thiserror::Error;

/// Errors raised while building or querying a [`GridModel`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be positive, but are {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("cell {cell} lies outside the {width}x{height} grid")]
    OutOfBounds {
        cell: Cell,
        width: usize,
        height: usize,
    },
}

/// Grid coordinate, used by value everywhere.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance, the exact move count on an empty 4-connected grid.
    pub fn manhattan(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Cell reached by applying `action`, or `None` when it would leave the
    /// non-negative quadrant.
    pub fn offset(self, action: Action) -> Option<Cell> {
        let (d_row, d_col) = action.delta();
        Some(Cell {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Number of candidate actions, moves plus waiting.
pub const N_ACTIONS: usize = 5;

/// Candidate actions of an agent, in action-value table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Wait,
}

impl Action {
    pub const ALL: [Action; N_ACTIONS] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Wait,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    fn delta(self) -> (isize, isize) {
        match self {
            Action::Left => (0, -1),
            Action::Right => (0, 1),
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Wait => (0, 0),
        }
    }

    /// Action that moves `from` onto `to`, if the two cells are adjacent or equal.
    pub fn between(from: Cell, to: Cell) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|&action| from.offset(action) == Some(to))
    }

    /// Command name written to the event log.
    pub fn label(self) -> &'static str {
        match self {
            Action::Left => "Left",
            Action::Right => "Right",
            Action::Up => "Up",
            Action::Down => "Down",
            Action::Wait => "Wait",
        }
    }
}

/// Passable and blocked cells of the shared floor.
///
/// Built once from the scenario and never mutated afterwards: agents move,
/// the grid does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    width: usize,
    height: usize,
    blocked: BTreeSet<Cell>,
}

impl GridModel {
    /// Create a grid of `width` columns and `height` rows.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero or an obstacle lies
    /// outside the grid.
    pub fn new<I>(width: usize, height: usize, blocked: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = Cell>,
    {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let grid = Self {
            width,
            height,
            blocked: BTreeSet::new(),
        };
        let blocked = blocked
            .into_iter()
            .map(|cell| grid.check(cell).map(|_| cell))
            .collect::<Result<_, _>>()?;
        Ok(Self { blocked, ..grid })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn blocked(&self) -> &BTreeSet<Cell> {
        &self.blocked
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    pub fn check(&self, cell: Cell) -> Result<(), GridError> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                cell,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Dense index of an in-bounds cell, row-major.
    pub fn index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    /// Whether `cell` is free of obstacles.
    ///
    /// # Panics
    /// Panics if `cell` is out of bounds; callers only ever hold in-bounds cells.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.assert_in_bounds(cell);
        !self.blocked.contains(&cell)
    }

    /// In-bounds cell reached from `cell` by `action`, passable or not.
    pub fn step(&self, cell: Cell, action: Action) -> Option<Cell> {
        cell.offset(action).filter(|&next| self.contains(next))
    }

    /// Passable 4-neighbours of `cell` in the fixed order up, down, left, right.
    ///
    /// # Panics
    /// Panics if `cell` is out of bounds.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.assert_in_bounds(cell);
        [Action::Up, Action::Down, Action::Left, Action::Right]
            .into_iter()
            .filter_map(move |action| self.step(cell, action))
            .filter(|next| !self.blocked.contains(next))
    }

    fn assert_in_bounds(&self, cell: Cell) {
        if let Err(error) = self.check(cell) {
            panic!("{error}");
        }
    }
}
