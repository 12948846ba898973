//! # Gridcrawl Main Entry Point
//!
//! Sets up logging, starts a session, and runs the terminal game loop.

use clap::Parser;
use gridcrawl::{
    AsciiDisplay, GameState, GridcrawlError, GridcrawlResult, InputHandler, LevelDefinitions,
    PlayerInput, SessionOptions,
};
use log::{error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments for Gridcrawl.
#[derive(Parser, Debug)]
#[command(name = "gridcrawl")]
#[command(about = "A turn-based tile roguelike played in the terminal")]
#[command(version)]
struct Args {
    /// Random seed for level population
    #[arg(short, long)]
    seed: Option<u64>,

    /// Level index of the first scene
    #[arg(short, long, default_value_t = gridcrawl::config::DEFAULT_START_LEVEL)]
    level: u32,

    /// Level definitions JSON file (defaults to the bundled levels)
    #[arg(long)]
    definitions: Option<PathBuf>,

    /// Opening pause of every enemy phase, in milliseconds
    #[arg(long, default_value_t = 100)]
    turn_delay_ms: u64,

    /// Play a file of commands instead of reading stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> GridcrawlResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    info!("Starting Gridcrawl v{}", gridcrawl::VERSION);

    let definitions = match &args.definitions {
        Some(path) => {
            info!("Loading level definitions from {}", path.display());
            LevelDefinitions::load_from_path(path)?
        }
        None => LevelDefinitions::bundled(),
    };

    let options = SessionOptions {
        seed: args.seed.unwrap_or_else(rand::random),
        start_level: args.level,
        turn_delay: Duration::from_millis(args.turn_delay_ms),
        ..SessionOptions::default()
    };

    let input_handler = InputHandler::new();
    let mut game_state = GameState::new(definitions, options)?;

    match &args.script {
        Some(path) => {
            let script = std::fs::read_to_string(path)?;
            let inputs = input_handler.parse_script(&script)?;
            run_game_loop(&mut game_state, &input_handler, inputs.into_iter(), false)
        }
        None => {
            let stdin = io::stdin();
            let inputs = stdin.lock().lines().map_while(Result::ok).filter_map(|line| {
                let input = input_handler.parse_line(&line);
                if input.is_none() && !line.trim().is_empty() {
                    warn!("Unknown command '{}'", line.trim());
                }
                input
            });
            run_game_loop(&mut game_state, &input_handler, inputs, true)
        }
    }
}

/// Initializes env_logger; `RUST_LOG` still overrides the flag.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

/// Main game loop implementation.
///
/// Interactive sessions sleep through the enemy phase waits; scripted ones
/// skip them.
fn run_game_loop(
    game_state: &mut GameState,
    input_handler: &InputHandler,
    inputs: impl Iterator<Item = PlayerInput>,
    paced: bool,
) -> GridcrawlResult<()> {
    let mut display = AsciiDisplay::new();
    display.add_message(format!("Day {}", game_state.level()));
    display.add_message(input_handler.help_text());
    draw(&display, game_state)?;

    for input in inputs {
        let direction = match input {
            PlayerInput::Quit => {
                info!("Player quit the game");
                break;
            }
            PlayerInput::Help => {
                display.add_message(input_handler.help_text());
                draw(&display, game_state)?;
                continue;
            }
            PlayerInput::Move(direction) => direction,
        };

        match game_state.player_action(direction) {
            Ok(events) => display.add_events(&events),
            Err(GridcrawlError::NotPlayersTurn) => continue,
            Err(err) => return Err(err),
        }

        while game_state.enemies_pending() {
            let wait = game_state.pending_wait();
            if paced {
                std::thread::sleep(wait);
            }
            display.add_events(&game_state.tick(wait));
        }

        if game_state.is_game_over() {
            draw(&display, game_state)?;
            break;
        }

        if game_state.completion_state() == gridcrawl::GameCompletionState::LevelComplete {
            match game_state.next_level() {
                Ok(events) => display.add_events(&events),
                Err(err) => {
                    error!("Could not set up the next level: {}", err);
                    return Err(err);
                }
            }
        }

        draw(&display, game_state)?;
    }

    info!(
        "Game loop ended on level {} after {} turns",
        game_state.level(),
        game_state.turn_number()
    );
    Ok(())
}

fn draw(display: &AsciiDisplay, game_state: &GameState) -> GridcrawlResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", display.render_game(game_state))?;
    stdout.flush()?;
    Ok(())
}
