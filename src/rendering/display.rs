//! # Display Management
//!
//! ASCII board view and message log for the terminal host.

use crate::game::{EntityKind, GameCompletionState, GameEvent, GameState, Position};

/// Glyph used for the implicit outer wall ring.
pub const OUTER_WALL_GLYPH: char = '#';
/// Glyph used for empty floor.
pub const FLOOR_GLYPH: char = '.';

/// ASCII display for the game.
///
/// Produces frames as strings; writing them out is up to the host.
#[derive(Debug, Clone)]
pub struct AsciiDisplay {
    /// Message history
    pub messages: Vec<String>,
    /// Maximum number of messages to keep
    pub max_messages: usize,
    /// Number of recent messages shown under the board
    pub visible_messages: usize,
}

impl Default for AsciiDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiDisplay {
    /// Creates a display with an empty message log.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridcrawl::AsciiDisplay;
    ///
    /// let mut display = AsciiDisplay::new();
    /// display.add_message("Welcome".to_string());
    /// assert_eq!(display.recent_messages(), ["Welcome".to_string()]);
    /// ```
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max_messages: 100,
            visible_messages: 3,
        }
    }

    /// Renders the board, the status line and recent messages.
    pub fn render_game(&self, game_state: &GameState) -> String {
        let mut frame = self.render_board(game_state);
        frame.push_str(&self.status_line(game_state));
        frame.push('\n');
        for message in self.recent_messages() {
            frame.push_str(message);
            frame.push('\n');
        }
        frame
    }

    /// Renders the board including its outer wall ring, top row first.
    pub fn render_board(&self, game_state: &GameState) -> String {
        let board = game_state.board();
        let mut frame = String::new();

        for y in (-1..=board.rows()).rev() {
            for x in -1..=board.columns() {
                let cell = Position::new(x, y);
                let glyph = if board.contains(cell) {
                    board.kind_at(cell).map_or(FLOOR_GLYPH, glyph_for)
                } else {
                    OUTER_WALL_GLYPH
                };
                frame.push(glyph);
            }
            frame.push('\n');
        }

        frame
    }

    /// One-line summary of the session.
    pub fn status_line(&self, game_state: &GameState) -> String {
        let mut line = format!(
            "Level {} | Food: {} | Turn {}",
            game_state.level(),
            game_state.player().food_points,
            game_state.turn_number()
        );
        match game_state.completion_state() {
            GameCompletionState::Playing => {}
            GameCompletionState::LevelComplete => line.push_str(" | Level complete"),
            GameCompletionState::GameOver => line.push_str(" | GAME OVER"),
        }
        line
    }

    /// The last few messages, oldest first.
    pub fn recent_messages(&self) -> &[String] {
        let start = self.messages.len().saturating_sub(self.visible_messages);
        &self.messages[start..]
    }

    /// Adds a message to the message history.
    pub fn add_message(&mut self, message: String) {
        self.messages.push(message);

        // Keep only the most recent messages
        if self.messages.len() > self.max_messages {
            self.messages.remove(0);
        }
    }

    /// Logs the player-facing events out of a batch.
    pub fn add_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let Some(message) = describe_event(event) {
                self.add_message(message);
            }
        }
    }
}

/// Glyph for an occupied cell.
pub fn glyph_for(kind: EntityKind) -> char {
    match kind {
        EntityKind::Player => '@',
        EntityKind::Enemy => 'e',
        EntityKind::Wall => '+',
        EntityKind::Food => 'f',
        EntityKind::Exit => 'X',
        EntityKind::ExitHelp => '?',
    }
}

/// Message text for events the player should see. Movement is silent.
pub fn describe_event(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::LevelStarted { level, name, .. } => Some(format!("Day {}: {}", level, name)),
        GameEvent::FoodConsumed { points, total } => {
            Some(format!("+{} food ({} left)", points, total))
        }
        GameEvent::PlayerDamaged {
            damage, remaining, ..
        } => Some(format!("-{} food ({} left)", damage, remaining)),
        GameEvent::LevelCompleted { level } => Some(format!("Level {} cleared", level)),
        GameEvent::Message { text } => Some(text.clone()),
        GameEvent::GameOver { level } => Some(format!("You starved on day {}.", level)),
        GameEvent::EntityMoved { .. }
        | GameEvent::MoveBlocked { .. }
        | GameEvent::EnemySkipped { .. } => None,
    }
}
