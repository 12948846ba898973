//! # Game Module
//!
//! Core game state management, board representation, and turn handling.
//!
//! This module contains the runtime half of Gridcrawl:
//! - The board: which entity sits on which cell
//! - Player and enemy actors
//! - Single-step movement and collision resolution
//! - The turn scheduler that alternates player and enemy phases
//! - The session state that ties all of the above together

pub mod board;
pub mod entities;
pub mod movement;
pub mod state;
pub mod turn;

pub use board::*;
pub use entities::*;
pub use movement::*;
pub use state::*;
pub use turn::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a 2D cell coordinate on the board.
///
/// The y axis grows upward: a position with a larger `y` is "above" one with
/// a smaller `y`.
///
/// # Examples
///
/// ```
/// use gridcrawl::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos.step(gridcrawl::Direction::Up), Position::new(10, 6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Returns the position one step away in the given direction.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Directions a single step can take. Movement is never diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridcrawl::{Direction, Position};
    ///
    /// assert_eq!(Direction::Up.to_delta(), Position::new(0, 1));
    /// assert_eq!(Direction::Left.to_delta(), Position::new(-1, 0));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::Up => Position::new(0, 1),
            Direction::Down => Position::new(0, -1),
            Direction::Left => Position::new(-1, 0),
            Direction::Right => Position::new(1, 0),
        }
    }
}

/// Unique identifier for entities placed on the board.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.x, 5);
        assert_eq!(pos.y, 10);
    }

    #[test]
    fn test_step_follows_upward_y() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.step(Direction::Up), Position::new(5, 6));
        assert_eq!(pos.step(Direction::Down), Position::new(5, 4));
        assert_eq!(pos.step(Direction::Left), Position::new(4, 5));
        assert_eq!(pos.step(Direction::Right), Position::new(6, 5));
    }

    #[test]
    fn test_entity_id_uniqueness() {
        let id1 = new_entity_id();
        let id2 = new_entity_id();
        assert_ne!(id1, id2);
    }
}
