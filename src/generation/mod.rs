//! # Generation Module
//!
//! Level population: the free-cell pool, hand-authored wall layouts, and the
//! populator that scatters food, enemies, and exits across what remains.
//!
//! Every level is described by a [`LevelConfig`]. Configs are plain data and
//! normally come from a level-definitions JSON file; the crate ships a
//! bundled set built around its three wall layouts.

pub mod layouts;
pub mod pool;
pub mod populator;

pub use layouts::*;
pub use pool::*;
pub use populator::*;

use crate::game::Position;
use crate::{config, GridcrawlError, GridcrawlResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Inclusive lower and upper bound for how many objects of a category to place.
///
/// # Examples
///
/// ```
/// use gridcrawl::CountRange;
///
/// let range = CountRange::new(4, 8);
/// assert!(range.validate().is_ok());
/// assert!(CountRange::new(3, 1).validate().is_err());
/// assert_eq!(CountRange::exactly(2), CountRange::new(2, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub minimum: u32,
    pub maximum: u32,
}

impl CountRange {
    /// Creates a new count range.
    pub fn new(minimum: u32, maximum: u32) -> Self {
        Self { minimum, maximum }
    }

    /// A range that always yields `count`.
    pub fn exactly(count: u32) -> Self {
        Self::new(count, count)
    }

    /// Samples a count uniformly from `[minimum, maximum]`.
    pub fn sample(&self, rng: &mut StdRng) -> u32 {
        if self.minimum >= self.maximum {
            return self.minimum;
        }
        rng.gen_range(self.minimum..=self.maximum)
    }

    /// Rejects ranges whose minimum exceeds their maximum.
    pub fn validate(&self) -> GridcrawlResult<()> {
        if self.minimum > self.maximum {
            return Err(GridcrawlError::InvalidConfig(format!(
                "count range minimum {} exceeds maximum {}",
                self.minimum, self.maximum
            )));
        }
        Ok(())
    }
}

/// How interior walls are laid out for a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WallPolicy {
    /// Scatter a random number of walls from the pool
    Scatter { count: CountRange },
    /// Use a named hand-authored layout
    Layout { name: String },
}

/// Where the exit goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Hard-coded exit cell, optionally with a help marker beside it
    Fixed {
        exit: Position,
        #[serde(default)]
        help: Option<Position>,
    },
    /// Draw the exit cell from the pool after everything else
    Drawn,
    /// The level has no exit
    Absent,
}

/// A food pickup variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodTemplate {
    pub name: String,
    /// Food points granted when the player reaches it
    pub points: i32,
}

/// An enemy variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    /// Food points the player loses when this enemy bumps into them
    pub player_damage: i32,
    /// Pause after this enemy acts before the next one may act
    #[serde(default = "default_move_time_ms")]
    pub move_time_ms: u64,
}

fn default_move_time_ms() -> u64 {
    config::DEFAULT_MOVE_TIME.as_millis() as u64
}

impl EnemyTemplate {
    /// Move time as a duration.
    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }
}

/// Everything needed to populate one level.
///
/// Immutable for the lifetime of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Name used in logs and the status line
    pub name: String,
    pub columns: i32,
    pub rows: i32,
    pub walls: WallPolicy,
    pub food_count: CountRange,
    pub exit: ExitPolicy,
    #[serde(default = "Position::origin")]
    pub player_start: Position,
    pub wall_templates: Vec<String>,
    pub food_templates: Vec<FoodTemplate>,
    pub enemy_templates: Vec<EnemyTemplate>,
}

impl LevelConfig {
    /// Creates a config that scatters walls randomly, with the default
    /// template sets and counts.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridcrawl::LevelConfig;
    ///
    /// let config = LevelConfig::scattered("open field", 8, 8);
    /// assert_eq!(config.columns, 8);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn scattered(name: &str, columns: i32, rows: i32) -> Self {
        let (wall_min, wall_max) = config::DEFAULT_WALL_COUNT;
        Self {
            name: name.to_string(),
            columns,
            rows,
            walls: WallPolicy::Scatter {
                count: CountRange::new(wall_min, wall_max),
            },
            food_count: default_food_count(),
            exit: ExitPolicy::Fixed {
                exit: Position::new(columns - 1, rows - 1),
                help: None,
            },
            player_start: Position::origin(),
            wall_templates: default_wall_templates(),
            food_templates: default_food_templates(),
            enemy_templates: default_enemy_templates(),
        }
    }

    /// Creates a config around a named wall layout, with the default
    /// template sets and food count.
    pub fn with_layout(name: &str, layout: &str, exit: ExitPolicy) -> Self {
        Self {
            name: name.to_string(),
            columns: config::DEFAULT_COLUMNS,
            rows: config::DEFAULT_ROWS,
            walls: WallPolicy::Layout {
                name: layout.to_string(),
            },
            food_count: default_food_count(),
            exit,
            player_start: Position::origin(),
            wall_templates: default_wall_templates(),
            food_templates: default_food_templates(),
            enemy_templates: default_enemy_templates(),
        }
    }

    /// Checks the config for problems that would make population impossible.
    ///
    /// Enemy templates are checked by the populator, since whether any
    /// enemies are needed depends on the level index.
    pub fn validate(&self) -> GridcrawlResult<()> {
        if self.columns <= 0 || self.rows <= 0 {
            return Err(GridcrawlError::InvalidConfig(format!(
                "level '{}' has non-positive dimensions {}x{}",
                self.name, self.columns, self.rows
            )));
        }

        if let WallPolicy::Scatter { count } = &self.walls {
            count.validate()?;
            if count.maximum > 0 && self.wall_templates.is_empty() {
                return Err(GridcrawlError::InvalidConfig(format!(
                    "level '{}' scatters walls but has no wall templates",
                    self.name
                )));
            }
        }
        if matches!(self.walls, WallPolicy::Layout { .. }) && self.wall_templates.is_empty() {
            return Err(GridcrawlError::InvalidConfig(format!(
                "level '{}' uses a wall layout but has no wall templates",
                self.name
            )));
        }

        self.food_count.validate()?;
        if self.food_count.maximum > 0 && self.food_templates.is_empty() {
            return Err(GridcrawlError::InvalidConfig(format!(
                "level '{}' places food but has no food templates",
                self.name
            )));
        }

        Ok(())
    }

    /// Whether a cell lies on the board (outer wall ring excluded).
    pub fn contains(&self, cell: Position) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns && cell.y < self.rows
    }
}

fn default_food_count() -> CountRange {
    let (food_min, food_max) = config::DEFAULT_FOOD_COUNT;
    CountRange::new(food_min, food_max)
}

fn default_wall_templates() -> Vec<String> {
    ["rubble", "crate", "cracked_stone", "bramble"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_food_templates() -> Vec<FoodTemplate> {
    vec![
        FoodTemplate {
            name: "food".to_string(),
            points: 10,
        },
        FoodTemplate {
            name: "soda".to_string(),
            points: 20,
        },
    ]
}

fn default_enemy_templates() -> Vec<EnemyTemplate> {
    vec![
        EnemyTemplate {
            name: "zombie".to_string(),
            player_damage: 10,
            move_time_ms: default_move_time_ms(),
        },
        EnemyTemplate {
            name: "vampire".to_string(),
            player_damage: 20,
            move_time_ms: default_move_time_ms(),
        },
    ]
}

/// Number of enemies for a level index: `floor(log2(level))`, zero for
/// level 0 and 1.
///
/// # Examples
///
/// ```
/// use gridcrawl::enemy_count_for_level;
///
/// assert_eq!(enemy_count_for_level(1), 0);
/// assert_eq!(enemy_count_for_level(3), 1);
/// assert_eq!(enemy_count_for_level(8), 3);
/// ```
pub fn enemy_count_for_level(level: u32) -> u32 {
    if level < 2 {
        0
    } else {
        level.ilog2()
    }
}

/// An ordered list of level configs plus any extra wall layouts they need.
///
/// Levels are used in order and cycle once the list runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinitions {
    pub levels: Vec<LevelConfig>,
    /// Layouts added on top of the bundled ones
    #[serde(default)]
    pub layouts: Vec<WallLayout>,
}

impl LevelDefinitions {
    /// The bundled level rotation: labyrinth, crossroads, ramparts.
    pub fn bundled() -> Self {
        Self {
            levels: vec![
                LevelConfig::with_layout(
                    "labyrinth",
                    "labyrinth",
                    ExitPolicy::Fixed {
                        exit: Position::new(18, 17),
                        help: Some(Position::new(19, 17)),
                    },
                ),
                LevelConfig::with_layout(
                    "crossroads",
                    "crossroads",
                    ExitPolicy::Fixed {
                        exit: Position::new(10, 18),
                        help: None,
                    },
                ),
                LevelConfig::with_layout("ramparts", "ramparts", ExitPolicy::Drawn),
            ],
            layouts: Vec::new(),
        }
    }

    /// Parses level definitions from JSON.
    pub fn from_json(json: &str) -> GridcrawlResult<Self> {
        let definitions: Self = serde_json::from_str(json)?;
        definitions.validate()?;
        Ok(definitions)
    }

    /// Loads level definitions from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> GridcrawlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the definitions to pretty JSON.
    pub fn to_json(&self) -> GridcrawlResult<String> {
        serde_json::to_string_pretty(self).map_err(GridcrawlError::from)
    }

    /// Validates every level and checks that each referenced layout exists.
    pub fn validate(&self) -> GridcrawlResult<()> {
        if self.levels.is_empty() {
            return Err(GridcrawlError::InvalidConfig(
                "level definitions contain no levels".to_string(),
            ));
        }

        let registry = self.registry()?;
        for level in &self.levels {
            level.validate()?;
            if let WallPolicy::Layout { name } = &level.walls {
                registry.get(name)?;
            }
        }
        Ok(())
    }

    /// Builds the layout registry: bundled layouts plus the extra ones.
    pub fn registry(&self) -> GridcrawlResult<LayoutRegistry> {
        let mut registry = LayoutRegistry::bundled()?;
        for layout in &self.layouts {
            registry.insert(layout.clone());
        }
        Ok(registry)
    }

    /// The config for the `stage`-th level played in a session.
    pub fn for_stage(&self, stage: usize) -> GridcrawlResult<&LevelConfig> {
        if self.levels.is_empty() {
            return Err(GridcrawlError::InvalidConfig(
                "level definitions contain no levels".to_string(),
            ));
        }
        Ok(&self.levels[stage % self.levels.len()])
    }
}

impl Default for LevelDefinitions {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Trait for procedural generators.
///
/// Generators take a level config and a seeded RNG and produce content that
/// can be checked against the same config afterwards.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &LevelConfig, rng: &mut StdRng) -> GridcrawlResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &LevelConfig) -> GridcrawlResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation.
pub mod utils {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Creates a seeded random number generator.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}
