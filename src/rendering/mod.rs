//! # Rendering Module
//!
//! Terminal rendering: the board as ASCII plus a status line and message log.

pub mod display;

pub use display::*;
