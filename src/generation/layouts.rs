//! # Wall Layouts
//!
//! Hand-authored wall mazes stored as coordinate tables. The three bundled
//! layouts live in `layouts/*.json` at the crate root and are compiled in;
//! more can be loaded from disk or supplied through level definitions.

use crate::game::Position;
use crate::{GridcrawlError, GridcrawlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUNDLED_LAYOUTS: [&str; 3] = [
    include_str!("../../layouts/labyrinth.json"),
    include_str!("../../layouts/crossroads.json"),
    include_str!("../../layouts/ramparts.json"),
];

/// A named table of wall cells.
///
/// The coordinates are opaque fixture data; nothing in the crate tries to
/// derive them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallLayout {
    pub name: String,
    /// Board width the layout was authored for
    pub columns: i32,
    /// Board height the layout was authored for
    pub rows: i32,
    walls: Vec<(i32, i32)>,
}

impl WallLayout {
    /// Creates a layout from a list of wall cells.
    pub fn new(name: &str, columns: i32, rows: i32, cells: &[Position]) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows,
            walls: cells.iter().map(|cell| (cell.x, cell.y)).collect(),
        }
    }

    /// Parses a single layout from JSON.
    pub fn from_json(json: &str) -> GridcrawlResult<Self> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Loads a single layout from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> GridcrawlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Wall cells in authored order.
    pub fn cells(&self) -> Vec<Position> {
        self.walls.iter().copied().map(Position::from).collect()
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// Every wall must sit on the board it was authored for, and no cell may
    /// repeat.
    pub fn validate(&self) -> GridcrawlResult<()> {
        let mut seen = std::collections::HashSet::new();
        for &(x, y) in &self.walls {
            if x < 0 || y < 0 || x >= self.columns || y >= self.rows {
                return Err(GridcrawlError::InvalidConfig(format!(
                    "layout '{}' has wall ({}, {}) outside its {}x{} board",
                    self.name, x, y, self.columns, self.rows
                )));
            }
            if !seen.insert((x, y)) {
                return Err(GridcrawlError::InvalidConfig(format!(
                    "layout '{}' lists wall ({}, {}) twice",
                    self.name, x, y
                )));
            }
        }
        Ok(())
    }
}

/// Layouts by name.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, WallLayout>,
}

impl LayoutRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The layouts compiled into the crate.
    pub fn bundled() -> GridcrawlResult<Self> {
        let mut registry = Self::new();
        for json in BUNDLED_LAYOUTS {
            registry.insert(WallLayout::from_json(json)?);
        }
        Ok(registry)
    }

    /// Adds a layout, replacing any existing one with the same name.
    pub fn insert(&mut self, layout: WallLayout) {
        self.layouts.insert(layout.name.clone(), layout);
    }

    pub fn get(&self, name: &str) -> GridcrawlResult<&WallLayout> {
        self.layouts
            .get(name)
            .ok_or_else(|| GridcrawlError::UnknownLayout(name.to_string()))
    }

    /// Registered layout names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.layouts.keys().map(String::as_str).collect()
    }
}
