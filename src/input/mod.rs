//! # Input Module
//!
//! Line-based command parsing for the terminal host.

use crate::game::Direction;
use crate::{GridcrawlError, GridcrawlResult};

/// Input handler for turning typed commands into player input.
///
/// Accepts WASD, Vi-style keys (hjkl) when enabled, and spelled-out
/// directions. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridcrawl::{Direction, InputHandler, PlayerInput};
    ///
    /// let input_handler = InputHandler::new();
    /// assert_eq!(
    ///     input_handler.parse_line("w"),
    ///     Some(PlayerInput::Move(Direction::Up))
    /// );
    /// assert_eq!(input_handler.parse_line("  "), None);
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Parses a single command line.
    ///
    /// Returns `None` for blank or unrecognised lines.
    pub fn parse_line(&self, line: &str) -> Option<PlayerInput> {
        let command = line.trim().to_lowercase();

        match command.as_str() {
            "w" | "up" | "north" => Some(PlayerInput::Move(Direction::Up)),
            "s" | "down" | "south" => Some(PlayerInput::Move(Direction::Down)),
            "a" | "left" | "west" => Some(PlayerInput::Move(Direction::Left)),
            "d" | "right" | "east" => Some(PlayerInput::Move(Direction::Right)),
            "q" | "quit" | "exit" => Some(PlayerInput::Quit),
            "?" | "help" => Some(PlayerInput::Help),
            _ if self.vi_keys_enabled => match command.as_str() {
                "k" => Some(PlayerInput::Move(Direction::Up)),
                "j" => Some(PlayerInput::Move(Direction::Down)),
                "h" => Some(PlayerInput::Move(Direction::Left)),
                "l" => Some(PlayerInput::Move(Direction::Right)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Parses a whole script of commands.
    ///
    /// Commands are separated by whitespace or newlines; `#` starts a comment
    /// that runs to the end of the line. Unknown commands are an error.
    pub fn parse_script(&self, script: &str) -> GridcrawlResult<Vec<PlayerInput>> {
        let mut inputs = Vec::new();

        for (line_number, line) in script.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default();
            for token in line.split_whitespace() {
                let input = self.parse_line(token).ok_or_else(|| {
                    GridcrawlError::InvalidAction(format!(
                        "unknown command '{}' on line {}",
                        token,
                        line_number + 1
                    ))
                })?;
                inputs.push(input);
            }
        }

        Ok(inputs)
    }

    /// Help text for the terminal host.
    pub fn help_text(&self) -> String {
        let mut text = String::from("Move: w/a/s/d or up/down/left/right");
        if self.vi_keys_enabled {
            text.push_str(", h/j/k/l");
        }
        text.push_str(". Help: ?. Quit: q.");
        text
    }
}

/// Player input types that can be processed by the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Move one cell in a direction
    Move(Direction),
    /// Quit the game
    Quit,
    /// Show help information
    Help,
}
