//! The arena grid: a bounded lattice of trail cells.
//!
//! Cells are stored in row-major order. A cell transitions Empty to Occupied
//! at most once and is never reset: trails are permanent walls. The grid has
//! a single writer, the simulation's commit phase.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::{GameError, Result};

/// Position of one cell on the arena lattice.
///
/// `x` grows eastward and `y` grows southward, matching the row-major cell
/// storage and line-by-line rendering. Coordinates are signed so that
/// candidate moves off the edge stay representable for bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellPos {
    /// Column, growing eastward.
    pub x: i32,
    /// Row, growing southward.
    pub y: i32,
}

impl CellPos {
    /// Create a cell position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Occupancy state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing has driven through this cell.
    #[default]
    Empty,
    /// Part of an agent's trail.
    Occupied {
        /// Agent whose trail holds the cell.
        owner: AgentId,
        /// Tick at which the cell was entered.
        tick: u64,
    },
}

impl Cell {
    /// True if nothing occupies this cell.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The agent holding this cell, if any.
    #[must_use]
    pub const fn owner(self) -> Option<AgentId> {
        match self {
            Self::Empty => None,
            Self::Occupied { owner, .. } => Some(owner),
        }
    }
}

/// Bounded rectangular arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Width in cells.
    width: u32,
    /// Height in cells.
    height: u32,
    /// Cell data in row-major order.
    cells: Vec<Cell>,
    /// Running count of occupied cells.
    occupied: u32,
}

impl Grid {
    /// Create a new arena with all cells empty.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::Empty; cell_count],
            occupied: 0,
        }
    }

    /// Arena width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Arena height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check whether a position lies on the lattice.
    #[must_use]
    pub const fn in_bounds(&self, pos: CellPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Convert a position to a row-major index.
    #[inline]
    fn index(&self, pos: CellPos) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    /// Current occupancy of a cell.
    ///
    /// Returns `None` only for positions outside the lattice; in-bounds
    /// queries always answer.
    #[must_use]
    pub fn query(&self, pos: CellPos) -> Option<Cell> {
        if self.in_bounds(pos) {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// True when entering `pos` is fatal: off the lattice or already a trail.
    #[must_use]
    pub fn is_lethal(&self, pos: CellPos) -> bool {
        match self.query(pos) {
            Some(cell) => !cell.is_empty(),
            None => true,
        }
    }

    /// Mark a cell as part of `owner`'s trail, recording the entry tick.
    ///
    /// Mutates exactly one cell on success.
    ///
    /// # Errors
    ///
    /// [`GameError::OutOfBounds`] if the cell lies outside the lattice,
    /// [`GameError::AlreadyOccupied`] if the cell is not empty.
    pub fn occupy(&mut self, pos: CellPos, owner: AgentId, tick: u64) -> Result<()> {
        if !self.in_bounds(pos) {
            return Err(GameError::OutOfBounds { x: pos.x, y: pos.y });
        }
        let index = self.index(pos);
        if let Cell::Occupied { owner, .. } = self.cells[index] {
            return Err(GameError::AlreadyOccupied {
                x: pos.x,
                y: pos.y,
                owner,
            });
        }
        self.cells[index] = Cell::Occupied { owner, tick };
        self.occupied += 1;
        Ok(())
    }

    /// Number of occupied cells. Grows monotonically over a round.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.occupied as usize
    }

    /// All cells in row-major order, for hashing and snapshots.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(5, 3);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.occupied_cells(), 0);
        assert_eq!(grid.query(CellPos::new(4, 2)), Some(Cell::Empty));
    }

    #[test]
    #[should_panic(expected = "width must be positive")]
    fn test_zero_width_panics() {
        let _ = Grid::new(0, 3);
    }

    #[test]
    fn test_in_bounds() {
        let grid = Grid::new(3, 3);
        assert!(grid.in_bounds(CellPos::new(0, 0)));
        assert!(grid.in_bounds(CellPos::new(2, 2)));
        assert!(!grid.in_bounds(CellPos::new(3, 0)));
        assert!(!grid.in_bounds(CellPos::new(0, -1)));
    }

    #[test]
    fn test_occupy_marks_one_cell() {
        let mut grid = Grid::new(4, 4);
        grid.occupy(CellPos::new(1, 2), 7, 3).unwrap();

        assert_eq!(
            grid.query(CellPos::new(1, 2)),
            Some(Cell::Occupied { owner: 7, tick: 3 })
        );
        assert_eq!(grid.occupied_cells(), 1);
        // Neighbours untouched
        assert_eq!(grid.query(CellPos::new(2, 2)), Some(Cell::Empty));
        assert_eq!(grid.query(CellPos::new(1, 1)), Some(Cell::Empty));
    }

    #[test]
    fn test_occupy_out_of_bounds() {
        let mut grid = Grid::new(3, 3);
        let err = grid.occupy(CellPos::new(-1, 0), 1, 0).unwrap_err();
        assert!(matches!(err, GameError::OutOfBounds { x: -1, y: 0 }));
        assert_eq!(grid.occupied_cells(), 0);
    }

    #[test]
    fn test_occupy_twice_fails() {
        let mut grid = Grid::new(3, 3);
        grid.occupy(CellPos::new(1, 1), 1, 0).unwrap();
        let err = grid.occupy(CellPos::new(1, 1), 2, 1).unwrap_err();
        assert!(matches!(err, GameError::AlreadyOccupied { owner: 1, .. }));
        // First occupant still holds the cell
        assert_eq!(grid.query(CellPos::new(1, 1)).unwrap().owner(), Some(1));
    }

    #[test]
    fn test_is_lethal() {
        let mut grid = Grid::new(3, 3);
        grid.occupy(CellPos::new(0, 0), 1, 0).unwrap();
        assert!(grid.is_lethal(CellPos::new(0, 0)));
        assert!(grid.is_lethal(CellPos::new(3, 1)));
        assert!(!grid.is_lethal(CellPos::new(1, 1)));
    }
}
