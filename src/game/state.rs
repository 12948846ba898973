//! # Game State Module
//!
//! Central session state: the current level's board, the player, the enemy
//! roster, and the turn scheduler.
//!
//! A [`GameState`] is created by the host and owned by it. The host forwards
//! player input to [`GameState::player_action`] and elapsed time to
//! [`GameState::tick`]; everything that happens comes back as [`GameEvent`]s.

use crate::game::turn::EnemyRoster;
use crate::game::{
    resolve_move, Board, Direction, Enemy, EnemyMove, EntityId, EntityKind, MoveOutcome, Player,
    Position, TurnScheduler,
};
use crate::generation::utils::create_rng;
use crate::generation::{
    Generator, LayoutRegistry, LevelConfig, LevelDefinitions, LevelPopulator, PlacementCategory,
    PlacementWarning,
};
use crate::{config, GridcrawlError, GridcrawlResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shown when the player bumps the marker next to an exit.
pub const EXIT_HINT: &str = "The way down is right beside you. Walk into the exit.";

/// Settings for a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Seed for every random choice made during the session
    pub seed: u64,
    /// Level index of the first scene
    pub start_level: u32,
    /// Food points the player starts with
    pub starting_food: i32,
    /// Opening pause of every enemy phase
    pub turn_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            start_level: config::DEFAULT_START_LEVEL,
            starting_food: config::DEFAULT_PLAYER_FOOD,
            turn_delay: config::DEFAULT_TURN_DELAY,
        }
    }
}

/// Game completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    /// Level in progress
    Playing,
    /// Player reached the exit; waiting for [`GameState::next_level`]
    LevelComplete,
    /// Player ran out of food
    GameOver,
}

/// Things that happened as a result of a player action or a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted {
        level: u32,
        name: String,
        enemies: usize,
    },
    EntityMoved {
        entity_id: EntityId,
        from: Position,
        to: Position,
    },
    MoveBlocked {
        entity_id: EntityId,
        at: Position,
    },
    FoodConsumed {
        points: i32,
        total: i32,
    },
    PlayerDamaged {
        enemy_id: EntityId,
        damage: i32,
        remaining: i32,
    },
    EnemySkipped {
        entity_id: EntityId,
    },
    LevelCompleted {
        level: u32,
    },
    Message {
        text: String,
    },
    GameOver {
        level: u32,
    },
}

/// One play session.
///
/// # Examples
///
/// ```
/// use gridcrawl::{Direction, GameState, LevelDefinitions, SessionOptions};
///
/// let options = SessionOptions {
///     seed: 7,
///     ..SessionOptions::default()
/// };
/// let mut game = GameState::new(LevelDefinitions::bundled(), options).unwrap();
/// assert_eq!(game.level(), 3);
/// assert_eq!(game.enemies().len(), 1);
///
/// // the player starts in the bottom-left corner; down is the outer wall
/// game.player_action(Direction::Down).unwrap();
/// assert!(game.enemies_pending());
///
/// game.finish_enemy_phase();
/// assert!(game.is_players_turn());
/// ```
#[derive(Debug, Clone)]
pub struct GameState {
    definitions: LevelDefinitions,
    layouts: LayoutRegistry,
    /// Number of levels completed this session; picks the level config
    stage: usize,
    /// Level index, which drives the enemy count
    level: u32,
    board: Board,
    player: Player,
    /// Enemy roster in spawn order
    enemies: Vec<Enemy>,
    scheduler: TurnScheduler,
    completion_state: GameCompletionState,
    turn_number: u64,
    placement_warnings: Vec<PlacementWarning>,
    rng: StdRng,
}

impl GameState {
    /// Starts a session and sets up its first scene.
    pub fn new(definitions: LevelDefinitions, options: SessionOptions) -> GridcrawlResult<Self> {
        definitions.validate()?;
        let layouts = definitions.registry()?;

        let mut state = Self {
            definitions,
            layouts,
            stage: 0,
            level: options.start_level,
            board: Board::default(),
            player: Player::new(Position::origin(), options.starting_food),
            enemies: Vec::new(),
            scheduler: TurnScheduler::new(options.turn_delay),
            completion_state: GameCompletionState::Playing,
            turn_number: 0,
            placement_warnings: Vec::new(),
            rng: create_rng(options.seed),
        };

        info!(
            "Starting session with seed {} at level {}",
            options.seed, options.start_level
        );
        state.setup_scene(options.start_level)?;
        Ok(state)
    }

    /// Builds a fresh level: populates it, places everything on a new board,
    /// registers enemies in spawn order and resets the turn scheduler.
    ///
    /// The player's food points carry over. Nothing from the previous level
    /// survives; on error the previous level is left untouched.
    pub fn setup_scene(&mut self, level: u32) -> GridcrawlResult<Vec<GameEvent>> {
        let config = self.definitions.for_stage(self.stage)?.clone();

        let populator = LevelPopulator::new(&self.layouts, level);
        let population = populator.generate(&config, &mut self.rng)?;
        populator.validate(&population, &config)?;

        let mut board = Board::new(config.columns, config.rows);
        board.spawn_with_id(EntityKind::Player, self.player.id, config.player_start)?;

        let mut enemies = Vec::new();
        for placement in &population.placements {
            match placement.category {
                PlacementCategory::Food => {
                    let template = config.food_templates.get(placement.template).ok_or_else(|| {
                        missing_template(&config, placement.category, placement.template)
                    })?;
                    board.spawn_food(placement.cell, template.points)?;
                }
                PlacementCategory::Enemy => {
                    let template =
                        config.enemy_templates.get(placement.template).ok_or_else(|| {
                            missing_template(&config, placement.category, placement.template)
                        })?;
                    let enemy = Enemy::from_template(template, placement.cell);
                    board.spawn_with_id(EntityKind::Enemy, enemy.id, placement.cell)?;
                    enemies.push(enemy);
                }
                category => {
                    board.spawn(category.entity_kind(), placement.cell)?;
                }
            }
        }

        self.level = level;
        self.board = board;
        self.player.position = config.player_start;
        self.enemies.clear();
        for enemy in enemies {
            self.add_enemy_to_list(enemy)?;
        }
        self.scheduler.reset();
        self.placement_warnings = population.warnings;
        if self.completion_state != GameCompletionState::GameOver {
            self.completion_state = GameCompletionState::Playing;
        }

        info!(
            "Level {} ('{}') ready: {} entities, {} enemies, {} free cells left",
            level,
            config.name,
            self.board.len(),
            self.enemies.len(),
            population.remaining_cells
        );

        Ok(vec![GameEvent::LevelStarted {
            level,
            name: config.name,
            enemies: self.enemies.len(),
        }])
    }

    /// Registers an enemy in the roster. Enemies act in registration order.
    ///
    /// An enemy that is not yet on the board is placed at its position.
    pub fn add_enemy_to_list(&mut self, enemy: Enemy) -> GridcrawlResult<()> {
        if self.board.position_of(enemy.id).is_none() {
            self.board
                .spawn_with_id(EntityKind::Enemy, enemy.id, enemy.position)?;
        }
        debug!(
            "Registered enemy {} ({}) at {}",
            self.enemies.len(),
            enemy.template,
            enemy.position
        );
        self.enemies.push(enemy);
        Ok(())
    }

    /// Resolves one player step and, unless the level just ended, hands the
    /// turn to the enemies.
    pub fn player_action(&mut self, direction: Direction) -> GridcrawlResult<Vec<GameEvent>> {
        match self.completion_state {
            GameCompletionState::GameOver => return Err(GridcrawlError::GameOver),
            GameCompletionState::LevelComplete => {
                return Err(GridcrawlError::InvalidAction(
                    "level is complete; load the next level first".to_string(),
                ))
            }
            GameCompletionState::Playing => {}
        }
        self.scheduler.ensure_players_turn()?;

        let mut events = Vec::new();
        let player_id = self.player.id;

        match resolve_move(self.player.position, direction, &self.board) {
            MoveOutcome::Free { from, to } => {
                self.board.move_entity(player_id, to)?;
                self.player.position = to;
                events.push(GameEvent::EntityMoved {
                    entity_id: player_id,
                    from,
                    to,
                });
            }
            MoveOutcome::BlockedByWall { at } => {
                events.push(GameEvent::MoveBlocked {
                    entity_id: player_id,
                    at,
                });
            }
            MoveOutcome::BlockedByInteractable { at, kind, entity } => match kind {
                EntityKind::Food => {
                    let points = self.board.food_points(entity).unwrap_or_default();
                    self.board.remove(entity);
                    let total = self.player.gain_food(points);
                    debug!("Player ate food at {} for {} points", at, points);
                    events.push(GameEvent::FoodConsumed { points, total });
                }
                EntityKind::Exit => {
                    info!("Level {} complete", self.level);
                    self.completion_state = GameCompletionState::LevelComplete;
                    self.turn_number += 1;
                    events.push(GameEvent::LevelCompleted { level: self.level });
                    return Ok(events);
                }
                EntityKind::ExitHelp => {
                    events.push(GameEvent::Message {
                        text: EXIT_HINT.to_string(),
                    });
                }
                _ => {
                    events.push(GameEvent::MoveBlocked {
                        entity_id: player_id,
                        at,
                    });
                }
            },
        }

        self.turn_number += 1;
        self.scheduler.end_player_turn();
        Ok(events)
    }

    /// Advances the enemy phase by `dt`.
    pub fn tick(&mut self, dt: Duration) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut roster = EnemyTurnContext {
            enemies: &mut self.enemies,
            board: &mut self.board,
            player: &mut self.player,
            events: &mut events,
            player_starved: false,
        };

        let report = self.scheduler.tick(dt, &mut roster);
        let starved = roster.player_starved;

        if report.phase_completed {
            debug!("Enemy phase complete, {} moves this tick", report.enemies_moved);
        }
        if starved && self.game_over() {
            events.push(GameEvent::GameOver { level: self.level });
        }
        events
    }

    /// Runs the pending enemy phase to completion without real waiting.
    ///
    /// Returns the simulated time the phase took and its events.
    pub fn finish_enemy_phase(&mut self) -> (Duration, Vec<GameEvent>) {
        let mut elapsed = Duration::ZERO;
        let mut events = Vec::new();
        while self.scheduler.is_active() {
            let wait = self.scheduler.pending_wait();
            elapsed += wait;
            events.extend(self.tick(wait));
            if self.scheduler.is_players_turn() {
                break;
            }
        }
        (elapsed, events)
    }

    /// Moves on to the next level. Food points carry over.
    pub fn next_level(&mut self) -> GridcrawlResult<Vec<GameEvent>> {
        if self.completion_state == GameCompletionState::GameOver {
            return Err(GridcrawlError::GameOver);
        }

        self.stage += 1;
        match self.setup_scene(self.level + 1) {
            Ok(events) => Ok(events),
            Err(err) => {
                self.stage -= 1;
                Err(err)
            }
        }
    }

    /// Ends the session: no further turns are processed.
    ///
    /// Returns whether this call ended it.
    pub fn game_over(&mut self) -> bool {
        if self.completion_state == GameCompletionState::GameOver {
            return false;
        }
        info!(
            "Game over on level {} after {} turns",
            self.level, self.turn_number
        );
        self.completion_state = GameCompletionState::GameOver;
        self.scheduler.disable();
        true
    }

    /// Whether the host still needs to tick an enemy phase.
    pub fn enemies_pending(&self) -> bool {
        self.scheduler.is_active()
    }

    /// How long the host should wait before the next tick makes progress.
    pub fn pending_wait(&self) -> Duration {
        self.scheduler.pending_wait()
    }

    pub fn is_players_turn(&self) -> bool {
        self.scheduler.is_players_turn()
    }

    pub fn is_game_over(&self) -> bool {
        self.completion_state == GameCompletionState::GameOver
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Config of the level currently loaded.
    pub fn current_config(&self) -> GridcrawlResult<&LevelConfig> {
        self.definitions.for_stage(self.stage)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access for hosts that stage scenes by hand.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    pub fn completion_state(&self) -> GameCompletionState {
        self.completion_state
    }

    pub fn turn_number(&self) -> u64 {
        self.turn_number
    }

    /// Warnings recorded while populating the current level.
    pub fn placement_warnings(&self) -> &[PlacementWarning] {
        &self.placement_warnings
    }
}

fn missing_template(config: &LevelConfig, category: PlacementCategory, index: usize) -> GridcrawlError {
    GridcrawlError::GenerationFailed(format!(
        "level '{}' has no {:?} template {}",
        config.name, category, index
    ))
}

/// Borrowed view of the level that an enemy phase moves enemies through.
struct EnemyTurnContext<'a> {
    enemies: &'a mut Vec<Enemy>,
    board: &'a mut Board,
    player: &'a mut Player,
    events: &'a mut Vec<GameEvent>,
    player_starved: bool,
}

impl EnemyRoster for EnemyTurnContext<'_> {
    fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    fn move_enemy(&mut self, index: usize) -> Duration {
        let Some(enemy) = self.enemies.get_mut(index) else {
            return Duration::ZERO;
        };

        match enemy.move_enemy(self.player.position, &*self.board) {
            EnemyMove::Skipped => {
                self.events.push(GameEvent::EnemySkipped { entity_id: enemy.id });
            }
            EnemyMove::Attempted(MoveOutcome::Free { from, to }) => {
                match self.board.move_entity(enemy.id, to) {
                    Ok(()) => {
                        enemy.position = to;
                        self.events.push(GameEvent::EntityMoved {
                            entity_id: enemy.id,
                            from,
                            to,
                        });
                    }
                    Err(err) => warn!("Enemy {} could not move: {}", enemy.id, err),
                }
            }
            EnemyMove::Attempted(MoveOutcome::BlockedByInteractable {
                kind: EntityKind::Player,
                ..
            }) => {
                let remaining = self.player.lose_food(enemy.player_damage);
                debug!(
                    "{} hits the player for {}, {} food left",
                    enemy.template, enemy.player_damage, remaining
                );
                self.events.push(GameEvent::PlayerDamaged {
                    enemy_id: enemy.id,
                    damage: enemy.player_damage,
                    remaining,
                });
                if self.player.is_starving() {
                    self.player_starved = true;
                }
            }
            EnemyMove::Attempted(outcome) => {
                self.events.push(GameEvent::MoveBlocked {
                    entity_id: enemy.id,
                    at: outcome.target(),
                });
            }
        }

        enemy.move_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{CountRange, ExitPolicy, WallPolicy};

    /// A bare 8x8 level: no walls, no food, no exit.
    fn empty_definitions() -> LevelDefinitions {
        let mut level = LevelConfig::scattered("empty", 8, 8);
        level.walls = WallPolicy::Scatter {
            count: CountRange::exactly(0),
        };
        level.food_count = CountRange::exactly(0);
        level.exit = ExitPolicy::Absent;
        LevelDefinitions {
            levels: vec![level],
            layouts: Vec::new(),
        }
    }

    fn empty_game(food: i32) -> GameState {
        let options = SessionOptions {
            seed: 1,
            start_level: 1,
            starting_food: food,
            turn_delay: Duration::from_millis(100),
        };
        GameState::new(empty_definitions(), options).unwrap()
    }

    fn zombie_at(x: i32, y: i32) -> Enemy {
        Enemy::new("zombie", Position::new(x, y), 10, Duration::from_millis(100))
    }

    #[test]
    fn test_new_session_uses_defaults() {
        let game = GameState::new(LevelDefinitions::bundled(), SessionOptions::default()).unwrap();
        assert_eq!(game.level(), config::DEFAULT_START_LEVEL);
        assert_eq!(game.player().food_points, config::DEFAULT_PLAYER_FOOD);
        assert_eq!(game.player().position, Position::origin());
        assert_eq!(game.completion_state(), GameCompletionState::Playing);
        assert!(game.is_players_turn());
        assert_eq!(game.board().count(EntityKind::Exit), 1);
        assert_eq!(game.board().count(EntityKind::ExitHelp), 1);
    }

    #[test]
    fn test_enemy_damages_player_once_and_stays() {
        let mut game = empty_game(100);
        game.add_enemy_to_list(zombie_at(1, 0)).unwrap();

        // walking into the enemy is a blocked move
        let events = game.player_action(Direction::Right).unwrap();
        assert!(matches!(events[0], GameEvent::MoveBlocked { .. }));

        let (_, events) = game.finish_enemy_phase();
        let hits = events
            .iter()
            .filter(|event| matches!(event, GameEvent::PlayerDamaged { .. }))
            .count();
        assert_eq!(hits, 1);
        assert_eq!(game.player().food_points, 90);
        assert_eq!(game.enemies()[0].position, Position::new(1, 0));
        assert_eq!(
            game.board().kind_at(Position::new(1, 0)),
            Some(EntityKind::Enemy)
        );
    }

    #[test]
    fn test_enemy_rests_every_other_turn() {
        let mut game = empty_game(100);
        game.add_enemy_to_list(zombie_at(5, 0)).unwrap();

        game.player_action(Direction::Up).unwrap();
        let (_, events) = game.finish_enemy_phase();
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::EntityMoved { to, .. } if *to == Position::new(4, 0)
        )));

        game.player_action(Direction::Down).unwrap();
        let (_, events) = game.finish_enemy_phase();
        assert!(matches!(events[0], GameEvent::EnemySkipped { .. }));
        assert_eq!(game.enemies()[0].position, Position::new(4, 0));
    }

    #[test]
    fn test_eating_food_keeps_player_in_place() {
        let mut game = empty_game(50);
        let food = game.board_mut().spawn_food(Position::new(0, 1), 20).unwrap();

        let events = game.player_action(Direction::Up).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::FoodConsumed {
                points: 20,
                total: 70
            }]
        );
        assert_eq!(game.player().position, Position::origin());
        assert_eq!(game.board().position_of(food), None);
        assert!(!game.is_players_turn());
    }

    #[test]
    fn test_exit_completes_level_without_enemy_phase() {
        let mut game = empty_game(50);
        game.board_mut()
            .spawn(EntityKind::Exit, Position::new(1, 0))
            .unwrap();

        let events = game.player_action(Direction::Right).unwrap();
        assert_eq!(events, vec![GameEvent::LevelCompleted { level: 1 }]);
        assert_eq!(game.completion_state(), GameCompletionState::LevelComplete);
        assert!(!game.enemies_pending());
        assert!(game.player_action(Direction::Up).is_err());

        let events = game.next_level().unwrap();
        assert!(matches!(events[0], GameEvent::LevelStarted { level: 2, .. }));
        assert_eq!(game.player().food_points, 50);
        assert_eq!(game.enemies().len(), 1);
    }

    #[test]
    fn test_help_marker_shows_hint() {
        let mut game = empty_game(50);
        game.board_mut()
            .spawn(EntityKind::ExitHelp, Position::new(0, 1))
            .unwrap();

        let events = game.player_action(Direction::Up).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::Message {
                text: EXIT_HINT.to_string()
            }]
        );
    }

    #[test]
    fn test_starving_player_ends_game() {
        let mut game = empty_game(10);
        game.add_enemy_to_list(zombie_at(2, 0)).unwrap();

        game.player_action(Direction::Right).unwrap();
        let (_, events) = game.finish_enemy_phase();
        assert!(events.contains(&GameEvent::GameOver { level: 1 }));
        assert!(game.is_game_over());
        assert!(!game.enemies_pending());
        assert!(matches!(
            game.player_action(Direction::Left),
            Err(GridcrawlError::GameOver)
        ));
        assert!(game.next_level().is_err());
    }

    #[test]
    fn test_action_during_enemy_phase_is_rejected() {
        let mut game = empty_game(50);
        game.add_enemy_to_list(zombie_at(6, 6)).unwrap();

        game.player_action(Direction::Up).unwrap();
        game.tick(Duration::from_millis(10));
        assert!(matches!(
            game.player_action(Direction::Up),
            Err(GridcrawlError::NotPlayersTurn)
        ));
        assert_eq!(game.player().position, Position::new(0, 1));
        assert_eq!(game.turn_number(), 1);
    }

    #[test]
    fn test_setup_scene_is_repeatable() {
        let mut game = empty_game(50);
        game.add_enemy_to_list(zombie_at(3, 3)).unwrap();
        game.player_action(Direction::Up).unwrap();

        game.setup_scene(1).unwrap();
        assert!(game.enemies().is_empty());
        assert_eq!(game.board().len(), 1);
        assert_eq!(game.player().position, Position::origin());
        assert!(game.is_players_turn());
        assert!(!game.enemies_pending());

        game.setup_scene(1).unwrap();
        assert_eq!(game.board().len(), 1);
    }

    #[test]
    fn test_walls_block_the_player() {
        let mut game = empty_game(50);
        game.board_mut()
            .spawn(EntityKind::Wall, Position::new(1, 0))
            .unwrap();

        let events = game.player_action(Direction::Right).unwrap();
        assert!(matches!(events[0], GameEvent::MoveBlocked { .. }));
        assert_eq!(game.player().position, Position::origin());

        // a bump still ends the player's turn
        assert!(game.enemies_pending());
    }
}
