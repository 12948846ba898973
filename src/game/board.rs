//! # Board
//!
//! In-memory stand-in for the scene: which entity sits on which cell.
//!
//! The playable area is `[0, columns) x [0, rows)`, all floor. The outer wall
//! ring just outside it is implicit: any out-of-bounds cell blocks movement.

use crate::game::movement::Occupancy;
use crate::game::{new_entity_id, EntityId, EntityKind, Position};
use crate::{GridcrawlError, GridcrawlResult};
use std::collections::HashMap;

/// Cell occupancy for one level.
///
/// # Examples
///
/// ```
/// use gridcrawl::{Board, EntityKind, Position};
///
/// let mut board = Board::new(8, 8);
/// let wall = board.spawn(EntityKind::Wall, Position::new(3, 3)).unwrap();
/// assert_eq!(board.kind_at(Position::new(3, 3)), Some(EntityKind::Wall));
/// assert_eq!(board.position_of(wall), Some(Position::new(3, 3)));
/// assert!(board.spawn(EntityKind::Food, Position::new(3, 3)).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Board {
    columns: i32,
    rows: i32,
    occupants: HashMap<Position, (EntityKind, EntityId)>,
    positions: HashMap<EntityId, Position>,
    food_points: HashMap<EntityId, i32>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(columns: i32, rows: i32) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Whether a cell is inside the outer wall ring.
    pub fn contains(&self, cell: Position) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns && cell.y < self.rows
    }

    /// Places a new entity of `kind` and returns its id.
    pub fn spawn(&mut self, kind: EntityKind, cell: Position) -> GridcrawlResult<EntityId> {
        let id = new_entity_id();
        self.spawn_with_id(kind, id, cell)?;
        Ok(id)
    }

    /// Places an entity that already has an id (the player, enemies).
    pub fn spawn_with_id(
        &mut self,
        kind: EntityKind,
        id: EntityId,
        cell: Position,
    ) -> GridcrawlResult<()> {
        if !self.contains(cell) {
            return Err(GridcrawlError::InvalidState(format!(
                "cannot place {:?} at {} outside the board",
                kind, cell
            )));
        }
        if let Some((existing, _)) = self.occupants.get(&cell) {
            return Err(GridcrawlError::InvalidState(format!(
                "cannot place {:?} at {}: occupied by {:?}",
                kind, cell, existing
            )));
        }

        self.occupants.insert(cell, (kind, id));
        self.positions.insert(id, cell);
        Ok(())
    }

    /// Places a food pickup worth `points`.
    pub fn spawn_food(&mut self, cell: Position, points: i32) -> GridcrawlResult<EntityId> {
        let id = self.spawn(EntityKind::Food, cell)?;
        self.food_points.insert(id, points);
        Ok(id)
    }

    /// Removes an entity, returning what it was and where.
    pub fn remove(&mut self, id: EntityId) -> Option<(EntityKind, Position)> {
        let cell = self.positions.remove(&id)?;
        let (kind, _) = self.occupants.remove(&cell)?;
        self.food_points.remove(&id);
        Some((kind, cell))
    }

    /// Moves an entity to an empty in-bounds cell.
    pub fn move_entity(&mut self, id: EntityId, to: Position) -> GridcrawlResult<()> {
        let from = self
            .positions
            .get(&id)
            .copied()
            .ok_or_else(|| GridcrawlError::InvalidState(format!("entity {} not on board", id)))?;

        if !self.contains(to) || self.occupants.contains_key(&to) {
            return Err(GridcrawlError::InvalidAction(format!(
                "cannot move entity {} from {} to {}",
                id, from, to
            )));
        }

        if let Some(occupant) = self.occupants.remove(&from) {
            self.occupants.insert(to, occupant);
        }
        self.positions.insert(id, to);
        Ok(())
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    pub fn kind_at(&self, cell: Position) -> Option<EntityKind> {
        self.occupants.get(&cell).map(|(kind, _)| *kind)
    }

    /// Points a food pickup is worth, if `id` is food.
    pub fn food_points(&self, id: EntityId) -> Option<i32> {
        self.food_points.get(&id).copied()
    }

    /// Number of entities of one kind on the board.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.occupants
            .values()
            .filter(|(occupant, _)| *occupant == kind)
            .count()
    }

    /// Total number of entities on the board.
    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}

impl Occupancy for Board {
    fn in_bounds(&self, cell: Position) -> bool {
        self.contains(cell)
    }

    fn occupant(&self, cell: Position) -> Option<(EntityKind, EntityId)> {
        self.occupants.get(&cell).copied()
    }
}
