mod board;
mod config;
mod display;
mod error;
mod font;
mod game;
mod input;
mod random;
mod snake;
mod term;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;
use crate::game::SnakeGame;
use crate::input::{Controls, Exit};
use crate::random::Dice;
use crate::term::LedTerminal;

/// Cell on the board as (x, y). Signed so a head can step one past the edge.
pub type Coords = (i8, i8);
pub const BOARD_SIZE: i8 = 5;

#[derive(Parser)]
#[command(name = "microsnake")]
#[command(version, about = "Snake on an emulated 5x5 LED matrix with two buttons")]
struct Cli {
    /// Seed for food placement, for replayable games
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filtered by RUST_LOG, default info)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Milliseconds per step when scrolling the score
    #[arg(long, default_value = "150")]
    scroll_ms: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = GameConfig::with_scroll_ms(cli.scroll_ms);
    let controls = Arc::new(Controls::new());

    let result = run(config, cli.seed, &controls);

    // Release the listener thread whatever happened
    controls.request_quit();
    result
}

fn run(config: GameConfig, seed: Option<u64>, controls: &Arc<Controls>) -> Result<()> {
    let mut term = LedTerminal::new(config.scroll_ms);
    term.setup()?;

    let listener = term::spawn_button_listener(Arc::clone(controls));
    let mut game = SnakeGame::new(term, Dice::new(seed), config, Arc::clone(controls))?;

    loop {
        // The game loop only hands back control on reset or quit
        match game.play()? {
            Exit::Reset => game.reset()?,
            Exit::Quit => break,
        }
    }

    info!(phase = ?game.phase(), length = game.body().len(), food = ?game.food(), "Quitting");
    drop(game);

    if listener.join().is_err() {
        warn!("Button listener panicked");
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
