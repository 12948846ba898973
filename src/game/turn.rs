//! # Turn Scheduler
//!
//! Alternates a player turn with a paced enemy phase.
//!
//! The scheduler owns no clock. Hosts feed it elapsed time through
//! [`TurnScheduler::tick`] and it advances through the phase's waits: one
//! `turn_delay` up front, a second one when there are no enemies, then each
//! enemy's move followed by that enemy's `move_time`. The only points where
//! the phase suspends are those waits.

use crate::{config, GridcrawlError, GridcrawlResult};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    PlayerTurn,
    EnemyPhase,
}

/// The ordered set of enemies an enemy phase walks through.
pub trait EnemyRoster {
    /// Number of registered enemies.
    fn enemy_count(&self) -> usize;

    /// Makes the enemy at `index` take its move and returns how long to
    /// wait before the next enemy may act.
    fn move_enemy(&mut self, index: usize) -> Duration;
}

/// What happened during one [`TurnScheduler::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Enemies whose move was invoked during this tick
    pub enemies_moved: usize,
    /// Whether control returned to the player during this tick
    pub phase_completed: bool,
}

/// Position inside a running enemy phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseStep {
    /// Waiting out the opening turn delay
    Lead,
    /// Waiting out the extra delay of an empty roster
    Idle,
    /// Next enemy to move once the current wait is over
    Enemy(usize),
}

/// Turn state machine.
///
/// # Examples
///
/// ```
/// use gridcrawl::{EnemyRoster, TurnPhase, TurnScheduler};
/// use std::time::Duration;
///
/// struct NoEnemies;
///
/// impl EnemyRoster for NoEnemies {
///     fn enemy_count(&self) -> usize {
///         0
///     }
///     fn move_enemy(&mut self, _index: usize) -> Duration {
///         Duration::ZERO
///     }
/// }
///
/// let mut scheduler = TurnScheduler::new(Duration::from_millis(100));
/// scheduler.begin_player_action().unwrap();
/// assert_eq!(scheduler.phase(), TurnPhase::EnemyPhase);
///
/// let spent = scheduler.run_to_player_turn(&mut NoEnemies);
/// assert_eq!(spent, Duration::from_millis(200));
/// assert_eq!(scheduler.phase(), TurnPhase::PlayerTurn);
/// ```
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    turn_delay: Duration,
    players_turn: bool,
    enemies_moving: bool,
    enabled: bool,
    step: PhaseStep,
    wait_remaining: Duration,
    phases_completed: u64,
}

impl TurnScheduler {
    /// Creates a scheduler that starts on the player's turn.
    pub fn new(turn_delay: Duration) -> Self {
        Self {
            turn_delay,
            players_turn: true,
            enemies_moving: false,
            enabled: true,
            step: PhaseStep::Lead,
            wait_remaining: Duration::ZERO,
            phases_completed: 0,
        }
    }

    pub fn turn_delay(&self) -> Duration {
        self.turn_delay
    }

    pub fn phase(&self) -> TurnPhase {
        if self.players_turn {
            TurnPhase::PlayerTurn
        } else {
            TurnPhase::EnemyPhase
        }
    }

    pub fn is_players_turn(&self) -> bool {
        self.players_turn
    }

    /// Whether an enemy phase is currently running.
    pub fn enemies_moving(&self) -> bool {
        self.enemies_moving
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of enemy phases that ran to completion.
    pub fn phases_completed(&self) -> u64 {
        self.phases_completed
    }

    /// Whether further ticks will make progress.
    pub fn is_active(&self) -> bool {
        !self.players_turn && (self.enemies_moving || self.enabled)
    }

    /// Time until the next step of the enemy phase can run.
    ///
    /// Zero while it is the player's turn or once turns are disabled.
    pub fn pending_wait(&self) -> Duration {
        if self.enemies_moving {
            self.wait_remaining
        } else if self.is_active() {
            self.turn_delay
        } else {
            Duration::ZERO
        }
    }

    /// Checks that the player may act right now.
    pub fn ensure_players_turn(&self) -> GridcrawlResult<()> {
        if !self.enabled {
            return Err(GridcrawlError::GameOver);
        }
        if !self.players_turn {
            return Err(GridcrawlError::NotPlayersTurn);
        }
        Ok(())
    }

    /// Hands the turn to the enemies. The phase itself starts on the next tick.
    pub fn end_player_turn(&mut self) {
        self.players_turn = false;
    }

    /// Validates and consumes the player's turn.
    ///
    /// Rejected actions leave the scheduler untouched; nothing is queued.
    pub fn begin_player_action(&mut self) -> GridcrawlResult<()> {
        self.ensure_players_turn()?;
        self.end_player_turn();
        Ok(())
    }

    /// Advances the enemy phase by `dt`.
    ///
    /// A large `dt` may run several steps, or a whole phase, in one call. A
    /// phase that is already running always completes, even after
    /// [`disable`](Self::disable).
    pub fn tick(&mut self, dt: Duration, roster: &mut impl EnemyRoster) -> TickReport {
        let mut report = TickReport::default();

        if self.players_turn {
            return report;
        }
        if !self.enemies_moving {
            if !self.enabled {
                return report;
            }
            self.start_phase();
        }

        let mut budget = dt;
        loop {
            if budget < self.wait_remaining {
                self.wait_remaining -= budget;
                break;
            }
            budget -= self.wait_remaining;
            self.wait_remaining = Duration::ZERO;

            match self.step {
                PhaseStep::Lead => {
                    if roster.enemy_count() == 0 {
                        self.step = PhaseStep::Idle;
                        self.wait_remaining = self.turn_delay;
                    } else {
                        self.step = PhaseStep::Enemy(0);
                    }
                }
                PhaseStep::Enemy(index) if index < roster.enemy_count() => {
                    trace!("Enemy {} takes its move", index);
                    self.wait_remaining = roster.move_enemy(index);
                    report.enemies_moved += 1;
                    self.step = PhaseStep::Enemy(index + 1);
                }
                PhaseStep::Enemy(_) | PhaseStep::Idle => {
                    self.finish_phase();
                    report.phase_completed = true;
                    break;
                }
            }
        }

        report
    }

    /// Runs the current enemy phase to completion without real waiting.
    ///
    /// Returns the total simulated time the phase's waits add up to.
    pub fn run_to_player_turn(&mut self, roster: &mut impl EnemyRoster) -> Duration {
        let mut elapsed = Duration::ZERO;
        while self.is_active() {
            let wait = self.pending_wait();
            elapsed += wait;
            if self.tick(wait, roster).phase_completed {
                break;
            }
        }
        elapsed
    }

    /// Returns to the player's turn, dropping any phase in progress.
    ///
    /// Used when a new level is loaded. Does not re-enable a disabled
    /// scheduler.
    pub fn reset(&mut self) {
        self.players_turn = true;
        self.enemies_moving = false;
        self.step = PhaseStep::Lead;
        self.wait_remaining = Duration::ZERO;
    }

    /// Stops all further turn processing.
    pub fn disable(&mut self) {
        debug!("Turn processing disabled");
        self.enabled = false;
    }

    fn start_phase(&mut self) {
        debug_assert!(!self.enemies_moving, "enemy phase entered twice");
        self.enemies_moving = true;
        self.step = PhaseStep::Lead;
        self.wait_remaining = self.turn_delay;
    }

    fn finish_phase(&mut self) {
        self.players_turn = true;
        self.enemies_moving = false;
        self.step = PhaseStep::Lead;
        self.phases_completed += 1;
    }
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new(config::DEFAULT_TURN_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the order enemies were asked to move in.
    struct Recorder {
        move_times: Vec<Duration>,
        calls: Vec<usize>,
    }

    impl Recorder {
        fn new(move_times: &[u64]) -> Self {
            Self {
                move_times: move_times.iter().map(|ms| Duration::from_millis(*ms)).collect(),
                calls: Vec::new(),
            }
        }
    }

    impl EnemyRoster for Recorder {
        fn enemy_count(&self) -> usize {
            self.move_times.len()
        }

        fn move_enemy(&mut self, index: usize) -> Duration {
            self.calls.push(index);
            self.move_times[index]
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_starts_on_players_turn() {
        let scheduler = TurnScheduler::default();
        assert_eq!(scheduler.phase(), TurnPhase::PlayerTurn);
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.pending_wait(), Duration::ZERO);
    }

    #[test]
    fn test_tick_on_players_turn_does_nothing() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100]);

        let report = scheduler.tick(ms(5_000), &mut roster);
        assert_eq!(report, TickReport::default());
        assert!(roster.calls.is_empty());
    }

    #[test]
    fn test_empty_roster_waits_two_turn_delays() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[]);
        scheduler.begin_player_action().unwrap();

        assert!(!scheduler.tick(ms(150), &mut roster).phase_completed);
        assert!(scheduler.enemies_moving());
        assert_eq!(scheduler.pending_wait(), ms(50));

        assert!(!scheduler.tick(ms(49), &mut roster).phase_completed);
        assert!(scheduler.tick(ms(1), &mut roster).phase_completed);
        assert!(scheduler.is_players_turn());
        assert_eq!(scheduler.phases_completed(), 1);
    }

    #[test]
    fn test_enemies_move_once_each_in_roster_order() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100, 50, 200]);
        scheduler.begin_player_action().unwrap();

        let elapsed = scheduler.run_to_player_turn(&mut roster);
        assert_eq!(roster.calls, vec![0, 1, 2]);
        assert_eq!(elapsed, ms(100 + 100 + 50 + 200));
        assert_eq!(scheduler.phase(), TurnPhase::PlayerTurn);
    }

    #[test]
    fn test_waits_between_enemies_are_honoured() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[300, 300]);
        scheduler.begin_player_action().unwrap();

        // lead delay only
        let report = scheduler.tick(ms(99), &mut roster);
        assert_eq!(report.enemies_moved, 0);

        // first enemy moves as soon as the lead delay is over
        let report = scheduler.tick(ms(1), &mut roster);
        assert_eq!(report.enemies_moved, 1);
        assert_eq!(scheduler.pending_wait(), ms(300));

        let report = scheduler.tick(ms(300), &mut roster);
        assert_eq!(report.enemies_moved, 1);
        assert!(!report.phase_completed);

        let report = scheduler.tick(ms(300), &mut roster);
        assert_eq!(report.enemies_moved, 0);
        assert!(report.phase_completed);
        assert_eq!(roster.calls, vec![0, 1]);
    }

    #[test]
    fn test_large_tick_completes_phase_at_once() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100, 100]);
        scheduler.begin_player_action().unwrap();

        let report = scheduler.tick(ms(10_000), &mut roster);
        assert_eq!(report.enemies_moved, 2);
        assert!(report.phase_completed);
    }

    #[test]
    fn test_player_action_rejected_during_enemy_phase() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100]);
        scheduler.begin_player_action().unwrap();
        scheduler.tick(ms(10), &mut roster);

        assert!(matches!(
            scheduler.begin_player_action(),
            Err(GridcrawlError::NotPlayersTurn)
        ));
        assert!(scheduler.enemies_moving());

        scheduler.run_to_player_turn(&mut roster);
        assert!(scheduler.begin_player_action().is_ok());
    }

    #[test]
    fn test_disabled_scheduler_ignores_ticks() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100]);
        scheduler.disable();

        assert!(matches!(
            scheduler.begin_player_action(),
            Err(GridcrawlError::GameOver)
        ));

        scheduler.end_player_turn();
        let report = scheduler.tick(ms(1_000), &mut roster);
        assert_eq!(report, TickReport::default());
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.run_to_player_turn(&mut roster), Duration::ZERO);
        assert!(roster.calls.is_empty());
    }

    #[test]
    fn test_running_phase_finishes_after_disable() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100, 100]);
        scheduler.begin_player_action().unwrap();
        scheduler.tick(ms(100), &mut roster);
        scheduler.disable();

        let report = scheduler.tick(ms(1_000), &mut roster);
        assert!(report.phase_completed);
        assert_eq!(roster.calls, vec![0, 1]);
    }

    #[test]
    fn test_reset_returns_to_player_turn() {
        let mut scheduler = TurnScheduler::new(ms(100));
        let mut roster = Recorder::new(&[100]);
        scheduler.begin_player_action().unwrap();
        scheduler.tick(ms(20), &mut roster);

        scheduler.reset();
        assert_eq!(scheduler.phase(), TurnPhase::PlayerTurn);
        assert!(!scheduler.enemies_moving());
        assert!(scheduler.is_enabled());
    }
}
