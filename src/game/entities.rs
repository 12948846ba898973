//! # Entities
//!
//! The actors that move on the board, and the kinds of thing that can occupy
//! a cell.

use crate::game::movement::{chase_direction, resolve_move, MoveOutcome, Occupancy};
use crate::game::{new_entity_id, Direction, EntityId, Position};
use crate::generation::EnemyTemplate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Wall,
    Food,
    Exit,
    /// Marker placed next to some exits that shows a hint when bumped
    ExitHelp,
}

impl EntityKind {
    /// Walls stop movement and never react to it.
    pub fn is_wall(self) -> bool {
        matches!(self, EntityKind::Wall)
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub position: Position,
    /// Food points; the game is over once they run out
    pub food_points: i32,
}

impl Player {
    /// Creates a new player at the given position.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridcrawl::{Player, Position};
    ///
    /// let mut player = Player::new(Position::new(0, 0), 30);
    /// assert_eq!(player.lose_food(10), 20);
    /// assert_eq!(player.gain_food(5), 25);
    /// assert!(!player.is_starving());
    /// ```
    pub fn new(position: Position, food_points: i32) -> Self {
        Self {
            id: new_entity_id(),
            position,
            food_points,
        }
    }

    /// Subtracts food points and returns what is left.
    pub fn lose_food(&mut self, amount: i32) -> i32 {
        self.food_points = self.food_points.saturating_sub(amount);
        self.food_points
    }

    /// Adds food points and returns the new total.
    pub fn gain_food(&mut self, amount: i32) -> i32 {
        self.food_points = self.food_points.saturating_add(amount);
        self.food_points
    }

    pub fn is_starving(&self) -> bool {
        self.food_points <= 0
    }
}

/// Result of asking an enemy to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyMove {
    /// Resting this turn
    Skipped,
    /// A step was attempted and resolved
    Attempted(MoveOutcome),
}

/// An enemy that chases the player, moving every other turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    /// Template name, for logs
    pub template: String,
    pub position: Position,
    /// Food points the player loses when this enemy bumps into them
    pub player_damage: i32,
    /// Pause after this enemy acts before the next one may act
    pub move_time: Duration,
    skip_move: bool,
}

impl Enemy {
    /// Creates a fresh enemy. Its first move is never skipped.
    pub fn new(template: &str, position: Position, player_damage: i32, move_time: Duration) -> Self {
        Self {
            id: new_entity_id(),
            template: template.to_string(),
            position,
            player_damage,
            move_time,
            skip_move: false,
        }
    }

    /// Creates an enemy from a level template.
    pub fn from_template(template: &EnemyTemplate, position: Position) -> Self {
        Self::new(
            &template.name,
            position,
            template.player_damage,
            template.move_time(),
        )
    }

    /// Whether the next move attempt will be skipped.
    pub fn skips_next_move(&self) -> bool {
        self.skip_move
    }

    /// Chases `target` for one step.
    ///
    /// The enemy's own position is not changed here; whoever owns the board
    /// applies a `Free` outcome.
    pub fn move_enemy(&mut self, target: Position, occupancy: &impl Occupancy) -> EnemyMove {
        let direction = chase_direction(self.position, target);
        self.attempt_move(direction, occupancy)
    }

    /// Attempts one step unless this is a rest turn.
    pub fn attempt_move(&mut self, direction: Direction, occupancy: &impl Occupancy) -> EnemyMove {
        if self.skip_move {
            self.skip_move = false;
            return EnemyMove::Skipped;
        }

        let outcome = resolve_move(self.position, direction, occupancy);
        self.skip_move = true;
        EnemyMove::Attempted(outcome)
    }
}
