//! # Grid Position Pool
//!
//! The shrinking set of interior cells still free for placement in the
//! current level.

use crate::game::Position;
use crate::{GridcrawlError, GridcrawlResult};
use rand::rngs::StdRng;
use rand::Rng;

/// Free interior cells for one level.
///
/// A cell is in the pool at most once, and once drawn or reserved it never
/// comes back. Border cells (`x == 0`, `y == 0`, `x == columns - 1`,
/// `y == rows - 1`) are never in the pool.
///
/// # Examples
///
/// ```
/// use gridcrawl::GridPositionPool;
/// use gridcrawl::generation::utils::create_rng;
///
/// let mut pool = GridPositionPool::initialize(8, 8);
/// assert_eq!(pool.remaining(), 36);
///
/// let mut rng = create_rng(42);
/// let cell = pool.draw(&mut rng).unwrap();
/// assert!(!pool.contains(cell));
/// assert_eq!(pool.remaining(), 35);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GridPositionPool {
    cells: Vec<Position>,
}

impl GridPositionPool {
    /// Fills the pool with every cell in `[1, columns-2] x [1, rows-2]`.
    pub fn initialize(columns: i32, rows: i32) -> Self {
        let mut cells = Vec::new();
        for x in 1..columns - 1 {
            for y in 1..rows - 1 {
                cells.push(Position::new(x, y));
            }
        }
        Self { cells }
    }

    /// Removes and returns a uniformly random remaining cell.
    pub fn draw(&mut self, rng: &mut StdRng) -> GridcrawlResult<Position> {
        if self.cells.is_empty() {
            return Err(GridcrawlError::ExhaustedPool);
        }
        let index = rng.gen_range(0..self.cells.len());
        Ok(self.cells.swap_remove(index))
    }

    /// Removes a specific cell. Returns false if it was not in the pool.
    pub fn reserve(&mut self, cell: Position) -> bool {
        match self.cells.iter().position(|&candidate| candidate == cell) {
            Some(index) => {
                self.cells.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of cells still available.
    pub fn remaining(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Position) -> bool {
        self.cells.contains(&cell)
    }

    /// Remaining cells, in no particular order.
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }
}
