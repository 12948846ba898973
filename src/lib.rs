//! # Gridcrawl
//!
//! A turn-based tile roguelike core: a player walks a grid, enemies chase on
//! alternating turns, and food points rise and fall as the player interacts
//! with what lies on the board.
//!
//! ## Architecture Overview
//!
//! The crate is split along the two pieces of real logic in the game:
//!
//! - **Generation**: a shrinking pool of free interior cells and a populator
//!   that scatters walls, food, enemies and the exit across it without overlap.
//!   Hand-authored wall mazes are plain JSON tables, not code.
//! - **Game**: the in-memory board, single-step movement resolution, and the
//!   turn scheduler that alternates a player turn with a paced enemy phase.
//!
//! Rendering and input are thin host-side layers; the library never sleeps or
//! reads devices. Hosts drive time by calling [`GameState::tick`].

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From board
    Board,
    // From entities
    Enemy,
    EnemyMove,
    EntityKind,
    // From movement
    MoveOutcome,
    Occupancy,
    Player,
    // From state
    GameCompletionState,
    GameEvent,
    GameState,
    // From turn
    TurnPhase,
    TurnScheduler,
};

pub use generation::{
    CountRange, ExitPolicy, GridPositionPool, LevelConfig, LevelDefinitions, LevelPopulator,
    Placement, PlacementCategory, PlacementWarning, Population, WallLayout, WallPolicy,
};

/// Core error type for the Gridcrawl engine.
#[derive(thiserror::Error, Debug)]
pub enum GridcrawlError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Level configuration cannot be used for population
    #[error("Invalid level config: {0}")]
    InvalidConfig(String),

    /// Generation produced an inconsistent level
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A level referenced a wall layout that was never registered
    #[error("Unknown wall layout: {0}")]
    UnknownLayout(String),

    /// A draw was requested from an empty grid position pool
    #[error("Grid position pool exhausted")]
    ExhaustedPool,

    /// The player tried to act while enemies were still moving
    #[error("Not the player's turn")]
    NotPlayersTurn,

    /// Turn processing has been disabled
    #[error("Game over")]
    GameOver,
}

/// Result type used throughout the Gridcrawl codebase.
pub type GridcrawlResult<T> = Result<T, GridcrawlError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    use std::time::Duration;

    /// Default board width in tiles
    pub const DEFAULT_COLUMNS: i32 = 20;

    /// Default board height in tiles
    pub const DEFAULT_ROWS: i32 = 20;

    /// Pause before the first enemy acts, and again when there are no enemies
    pub const DEFAULT_TURN_DELAY: Duration = Duration::from_millis(100);

    /// Time an enemy's step takes before the next enemy may act
    pub const DEFAULT_MOVE_TIME: Duration = Duration::from_millis(100);

    /// Food points the player starts a session with
    pub const DEFAULT_PLAYER_FOOD: i32 = 100;

    /// Level index a new session starts at
    pub const DEFAULT_START_LEVEL: u32 = 3;

    /// Lower and upper bound for randomly scattered walls
    pub const DEFAULT_WALL_COUNT: (u32, u32) = (5, 9);

    /// Lower and upper bound for randomly scattered food
    pub const DEFAULT_FOOD_COUNT: (u32, u32) = (4, 8);
}
