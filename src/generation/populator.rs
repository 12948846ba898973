//! # Level Populator
//!
//! Turns a [`LevelConfig`] into a list of [`Placement`]s.
//!
//! Fixed cells (layout walls, a fixed exit and its help marker, the player
//! start) are reserved from the pool first, so nothing scattered afterwards
//! can land on them. Categories are then emitted in a fixed order: walls,
//! food, enemies, exit.

use crate::game::{EntityKind, Position};
use crate::generation::{
    enemy_count_for_level, CountRange, ExitPolicy, Generator, GridPositionPool, LayoutRegistry,
    LevelConfig, WallPolicy,
};
use crate::{GridcrawlError, GridcrawlResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kinds of object the populator places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementCategory {
    Wall,
    Food,
    Enemy,
    Exit,
    ExitHelp,
}

impl PlacementCategory {
    /// The board entity kind a placement of this category becomes.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            PlacementCategory::Wall => EntityKind::Wall,
            PlacementCategory::Food => EntityKind::Food,
            PlacementCategory::Enemy => EntityKind::Enemy,
            PlacementCategory::Exit => EntityKind::Exit,
            PlacementCategory::ExitHelp => EntityKind::ExitHelp,
        }
    }
}

/// One template assigned to one cell.
///
/// `template` indexes the config's template set for the category. Exits and
/// help markers have a single implicit template, index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub category: PlacementCategory,
    pub template: usize,
    pub cell: Position,
}

/// Something the populator had to compromise on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementWarning {
    /// The pool ran short, so fewer objects were placed than sampled.
    Partial {
        category: PlacementCategory,
        requested: u32,
        placed: u32,
    },
}

/// Result of populating one level.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Placements in emission order
    pub placements: Vec<Placement>,
    pub warnings: Vec<PlacementWarning>,
    /// Pool cells left over after population
    pub remaining_cells: usize,
}

impl Population {
    /// Placements of one category, in emission order.
    pub fn of_category(&self, category: PlacementCategory) -> impl Iterator<Item = &Placement> {
        self.placements
            .iter()
            .filter(move |placement| placement.category == category)
    }

    pub fn count(&self, category: PlacementCategory) -> usize {
        self.of_category(category).count()
    }
}

/// Populates levels using the given layouts and level index.
///
/// # Examples
///
/// ```
/// use gridcrawl::{Generator, LayoutRegistry, LevelConfig, LevelPopulator, PlacementCategory};
/// use gridcrawl::generation::utils::create_rng;
///
/// let layouts = LayoutRegistry::new();
/// let config = LevelConfig::scattered("field", 8, 8);
/// let populator = LevelPopulator::new(&layouts, 4);
///
/// let mut rng = create_rng(1);
/// let population = populator.generate(&config, &mut rng).unwrap();
/// assert_eq!(population.count(PlacementCategory::Enemy), 2);
/// assert_eq!(population.count(PlacementCategory::Exit), 1);
/// ```
#[derive(Debug, Clone)]
pub struct LevelPopulator<'a> {
    layouts: &'a LayoutRegistry,
    level: u32,
}

impl<'a> LevelPopulator<'a> {
    /// Creates a populator for the given level index.
    pub fn new(layouts: &'a LayoutRegistry, level: u32) -> Self {
        Self { layouts, level }
    }

    /// Collects the cells that are pinned by the config and checks they are
    /// on the board and distinct.
    fn fixed_cells(&self, config: &LevelConfig) -> GridcrawlResult<FixedCells> {
        let walls = match &config.walls {
            WallPolicy::Layout { name } => {
                let layout = self.layouts.get(name)?;
                if layout.columns > config.columns || layout.rows > config.rows {
                    return Err(GridcrawlError::InvalidConfig(format!(
                        "layout '{}' is {}x{} but level '{}' is only {}x{}",
                        layout.name,
                        layout.columns,
                        layout.rows,
                        config.name,
                        config.columns,
                        config.rows
                    )));
                }
                layout.cells()
            }
            WallPolicy::Scatter { .. } => Vec::new(),
        };

        let (exit, help) = match &config.exit {
            ExitPolicy::Fixed { exit, help } => (Some(*exit), *help),
            ExitPolicy::Drawn | ExitPolicy::Absent => (None, None),
        };

        let mut seen = HashSet::new();
        let pinned = std::iter::once(config.player_start)
            .chain(walls.iter().copied())
            .chain(exit)
            .chain(help);
        for cell in pinned {
            if !config.contains(cell) {
                return Err(GridcrawlError::InvalidConfig(format!(
                    "level '{}' pins cell {} outside the board",
                    config.name, cell
                )));
            }
            if !seen.insert(cell) {
                return Err(GridcrawlError::InvalidConfig(format!(
                    "level '{}' pins cell {} more than once",
                    config.name, cell
                )));
            }
        }

        Ok(FixedCells { walls, exit, help })
    }

    /// Draws up to `range.sample()` cells and assigns each a random template.
    fn scatter(
        &self,
        category: PlacementCategory,
        range: CountRange,
        template_count: usize,
        pool: &mut GridPositionPool,
        rng: &mut StdRng,
        population: &mut Population,
    ) -> GridcrawlResult<()> {
        let requested = range.sample(rng);
        let available = pool.remaining() as u32;

        let count = if requested > available {
            warn!(
                "Only {} free cells for {} {:?} placements on level {}",
                available, requested, category, self.level
            );
            population.warnings.push(PlacementWarning::Partial {
                category,
                requested,
                placed: available,
            });
            available
        } else {
            requested
        };

        if count > 0 && template_count == 0 {
            return Err(GridcrawlError::InvalidConfig(format!(
                "no templates for {} {:?} placements",
                count, category
            )));
        }

        for _ in 0..count {
            let cell = pool.draw(rng)?;
            let template = rng.gen_range(0..template_count);
            debug!("Placing {:?} template {} at {}", category, template, cell);
            population.placements.push(Placement {
                category,
                template,
                cell,
            });
        }

        Ok(())
    }
}

struct FixedCells {
    walls: Vec<Position>,
    exit: Option<Position>,
    help: Option<Position>,
}

impl Generator<Population> for LevelPopulator<'_> {
    fn generate(&self, config: &LevelConfig, rng: &mut StdRng) -> GridcrawlResult<Population> {
        config.validate()?;
        let fixed = self.fixed_cells(config)?;

        let mut pool = GridPositionPool::initialize(config.columns, config.rows);
        pool.reserve(config.player_start);
        for &cell in fixed.walls.iter().chain(fixed.exit.iter()).chain(fixed.help.iter()) {
            pool.reserve(cell);
        }

        let mut population = Population::default();

        match &config.walls {
            WallPolicy::Layout { name } => {
                // one wall template for the whole layout
                let template = rng.gen_range(0..config.wall_templates.len());
                debug!(
                    "Laying out {} walls from '{}' with template {}",
                    fixed.walls.len(),
                    name,
                    template
                );
                population
                    .placements
                    .extend(fixed.walls.iter().map(|&cell| Placement {
                        category: PlacementCategory::Wall,
                        template,
                        cell,
                    }));
            }
            WallPolicy::Scatter { count } => {
                self.scatter(
                    PlacementCategory::Wall,
                    *count,
                    config.wall_templates.len(),
                    &mut pool,
                    rng,
                    &mut population,
                )?;
            }
        }

        self.scatter(
            PlacementCategory::Food,
            config.food_count,
            config.food_templates.len(),
            &mut pool,
            rng,
            &mut population,
        )?;

        let enemies = enemy_count_for_level(self.level);
        self.scatter(
            PlacementCategory::Enemy,
            CountRange::exactly(enemies),
            config.enemy_templates.len(),
            &mut pool,
            rng,
            &mut population,
        )?;

        match &config.exit {
            ExitPolicy::Fixed { exit, help } => {
                population.placements.push(Placement {
                    category: PlacementCategory::Exit,
                    template: 0,
                    cell: *exit,
                });
                if let Some(help) = help {
                    population.placements.push(Placement {
                        category: PlacementCategory::ExitHelp,
                        template: 0,
                        cell: *help,
                    });
                }
            }
            ExitPolicy::Drawn => {
                self.scatter(
                    PlacementCategory::Exit,
                    CountRange::exactly(1),
                    1,
                    &mut pool,
                    rng,
                    &mut population,
                )?;
            }
            ExitPolicy::Absent => {}
        }

        population.remaining_cells = pool.remaining();
        info!(
            "{} populated level {} ('{}'): {} placements, {} cells left",
            self.generator_type(),
            self.level,
            config.name,
            population.placements.len(),
            population.remaining_cells
        );

        Ok(population)
    }

    fn validate(&self, content: &Population, config: &LevelConfig) -> GridcrawlResult<()> {
        let mut occupied = HashSet::new();
        occupied.insert(config.player_start);

        for placement in &content.placements {
            if !config.contains(placement.cell) {
                return Err(GridcrawlError::GenerationFailed(format!(
                    "{:?} placed off the board at {}",
                    placement.category, placement.cell
                )));
            }
            if !occupied.insert(placement.cell) {
                return Err(GridcrawlError::GenerationFailed(format!(
                    "{:?} placed on occupied cell {}",
                    placement.category, placement.cell
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "LevelPopulator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;
    use crate::generation::{LevelDefinitions, WallLayout};

    fn scattered(columns: i32, rows: i32) -> LevelConfig {
        LevelConfig::scattered("test", columns, rows)
    }

    #[test]
    fn test_counts_stay_within_ranges() {
        let layouts = LayoutRegistry::new();
        let config = scattered(10, 10);
        let populator = LevelPopulator::new(&layouts, 8);

        for seed in 0..20 {
            let mut rng = create_rng(seed);
            let population = populator.generate(&config, &mut rng).unwrap();

            let walls = population.count(PlacementCategory::Wall);
            let food = population.count(PlacementCategory::Food);
            assert!((5..=9).contains(&walls), "walls: {}", walls);
            assert!((4..=8).contains(&food), "food: {}", food);
            assert_eq!(population.count(PlacementCategory::Enemy), 3);
            assert!(population.warnings.is_empty());
            assert!(populator.validate(&population, &config).is_ok());
        }
    }

    #[test]
    fn test_zero_ranges_place_nothing() {
        let layouts = LayoutRegistry::new();
        let mut config = scattered(6, 6);
        config.walls = WallPolicy::Scatter {
            count: CountRange::exactly(0),
        };
        config.food_count = CountRange::exactly(0);
        config.exit = ExitPolicy::Absent;

        let populator = LevelPopulator::new(&layouts, 1);
        let mut rng = create_rng(3);
        let population = populator.generate(&config, &mut rng).unwrap();

        assert!(population.placements.is_empty());
        assert_eq!(population.remaining_cells, 16);
    }

    #[test]
    fn test_low_levels_have_no_enemies_even_without_templates() {
        let layouts = LayoutRegistry::new();
        let mut config = scattered(8, 8);
        config.enemy_templates.clear();

        for level in [0, 1] {
            let populator = LevelPopulator::new(&layouts, level);
            let mut rng = create_rng(5);
            let population = populator.generate(&config, &mut rng).unwrap();
            assert_eq!(population.count(PlacementCategory::Enemy), 0);
        }

        let populator = LevelPopulator::new(&layouts, 2);
        let mut rng = create_rng(5);
        assert!(matches!(
            populator.generate(&config, &mut rng),
            Err(GridcrawlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_small_pool_clamps_and_warns() {
        let layouts = LayoutRegistry::new();
        let mut config = scattered(4, 4);
        config.walls = WallPolicy::Scatter {
            count: CountRange::exactly(3),
        };
        config.food_count = CountRange::exactly(3);
        config.exit = ExitPolicy::Drawn;

        let populator = LevelPopulator::new(&layouts, 1);
        let mut rng = create_rng(11);
        let population = populator.generate(&config, &mut rng).unwrap();

        // 4x4 has 4 interior cells: 3 walls, 1 food, nothing left for the exit
        assert_eq!(population.count(PlacementCategory::Wall), 3);
        assert_eq!(population.count(PlacementCategory::Food), 1);
        assert_eq!(population.count(PlacementCategory::Exit), 0);
        assert_eq!(
            population.warnings,
            vec![
                PlacementWarning::Partial {
                    category: PlacementCategory::Food,
                    requested: 3,
                    placed: 1,
                },
                PlacementWarning::Partial {
                    category: PlacementCategory::Exit,
                    requested: 1,
                    placed: 0,
                },
            ]
        );
        assert_eq!(population.remaining_cells, 0);
    }

    #[test]
    fn test_layout_walls_share_one_template_and_block_scatter() {
        let definitions = LevelDefinitions::bundled();
        let layouts = definitions.registry().unwrap();
        let config = definitions.for_stage(0).unwrap();
        let populator = LevelPopulator::new(&layouts, 16);

        for seed in 0..10 {
            let mut rng = create_rng(seed);
            let population = populator.generate(config, &mut rng).unwrap();

            let walls: Vec<_> = population.of_category(PlacementCategory::Wall).collect();
            assert_eq!(walls.len(), 204);
            assert!(walls.iter().all(|wall| wall.template == walls[0].template));

            assert!(populator.validate(&population, config).is_ok());
        }
    }

    #[test]
    fn test_fixed_exit_and_help_marker() {
        let definitions = LevelDefinitions::bundled();
        let layouts = definitions.registry().unwrap();
        let config = definitions.for_stage(0).unwrap();
        let populator = LevelPopulator::new(&layouts, 3);
        let mut rng = create_rng(8);
        let population = populator.generate(config, &mut rng).unwrap();

        let exit: Vec<_> = population.of_category(PlacementCategory::Exit).collect();
        let help: Vec<_> = population.of_category(PlacementCategory::ExitHelp).collect();
        assert_eq!(exit.len(), 1);
        assert_eq!(exit[0].cell, Position::new(18, 17));
        assert_eq!(help.len(), 1);
        assert_eq!(help[0].cell, Position::new(19, 17));

        // exit is emitted last
        let last_two: Vec<_> = population.placements.iter().rev().take(2).collect();
        assert_eq!(last_two[0].category, PlacementCategory::ExitHelp);
        assert_eq!(last_two[1].category, PlacementCategory::Exit);
    }

    #[test]
    fn test_drawn_exit_comes_from_pool() {
        let definitions = LevelDefinitions::bundled();
        let layouts = definitions.registry().unwrap();
        let config = definitions.for_stage(2).unwrap();
        let populator = LevelPopulator::new(&layouts, 3);
        let mut rng = create_rng(21);
        let population = populator.generate(config, &mut rng).unwrap();

        let exit: Vec<_> = population.of_category(PlacementCategory::Exit).collect();
        assert_eq!(exit.len(), 1);
        assert!((1..=18).contains(&exit[0].cell.x));
        assert!((1..=18).contains(&exit[0].cell.y));
        assert!(populator.validate(&population, config).is_ok());
    }

    #[test]
    fn test_pinned_cells_must_be_distinct() {
        let mut layouts = LayoutRegistry::new();
        layouts.insert(WallLayout::new("corner", 6, 6, &[Position::new(0, 0)]));

        let mut config = scattered(6, 6);
        config.walls = WallPolicy::Layout {
            name: "corner".to_string(),
        };

        let populator = LevelPopulator::new(&layouts, 1);
        let mut rng = create_rng(2);
        assert!(matches!(
            populator.generate(&config, &mut rng),
            Err(GridcrawlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_same_seed_same_population() {
        let layouts = LayoutRegistry::new();
        let config = scattered(12, 12);
        let populator = LevelPopulator::new(&layouts, 5);

        let first = populator.generate(&config, &mut create_rng(77)).unwrap();
        let second = populator.generate(&config, &mut create_rng(77)).unwrap();
        assert_eq!(first.placements, second.placements);
    }
}
