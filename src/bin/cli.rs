//! Headless runner: computer-vs-computer games and position analysis.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use gomoku::{AIEngine, BoardState, GameConfig};

#[derive(Parser)]
#[command(name = "gomoku-cli", about = "Play or analyse Gomoku without the GUI")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "gomoku.toml")]
    config: PathBuf,

    /// Search depth in plies, overrides the config file
    #[arg(short, long)]
    depth: Option<u8>,

    /// Opening moves as `row,col` pairs, e.g. `7,7 7,8`
    #[arg(long, num_args = 0.., value_delimiter = ' ')]
    moves: Vec<String>,

    /// Only report the best reply to the opening instead of playing on
    #[arg(long)]
    analyse: bool,

    /// Stop after this many plies
    #[arg(long, default_value_t = 225)]
    max_plies: usize,
}

fn parse_cell(text: &str) -> Result<(i32, i32)> {
    let (row, col) = text
        .split_once(',')
        .with_context(|| format!("expected row,col but got '{text}'"))?;
    let row = row.trim().parse().with_context(|| format!("bad row in '{text}'"))?;
    let col = col.trim().parse().with_context(|| format!("bad column in '{text}'"))?;
    Ok((row, col))
}

fn replay(moves: &[String]) -> Result<Arc<BoardState>> {
    let mut state = BoardState::new();
    for text in moves.iter().filter(|m| !m.is_empty()) {
        let (row, col) = parse_cell(text)?;
        state = state
            .mark(row, col)
            .with_context(|| format!("cannot play {text}"))?;
    }
    Ok(state)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = GameConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    if let Some(depth) = cli.depth {
        config.engine.depth = depth;
    }
    config.validate().context("invalid command line overrides")?;

    let mut state = replay(&cli.moves)?;
    let mut engine = AIEngine::new(config.engine);

    if cli.analyse {
        let result = engine.choose_move(&state);
        println!("{state}");
        match result.best_move() {
            Some(mv) => println!(
                "{} to play {} ({:?}, score {}, depth {}, {} nodes, {} ms)",
                mv.player.name(),
                mv.pos,
                result.search_type,
                result.score,
                result.depth,
                result.nodes,
                result.time_ms
            ),
            None => println!("game is over"),
        }
        return Ok(());
    }

    for _ in 0..cli.max_plies {
        if state.finished() {
            break;
        }
        let Some(next) = engine.get_move(&state) else {
            bail!("engine found no move in an unfinished position");
        };
        state = next;
    }

    println!("{state}");
    match state.winner() {
        Some(winner) => println!("{} won after {} moves", winner.name(), state.move_count()),
        None if state.finished() => println!("draw after {} moves", state.move_count()),
        None => println!("stopped after {} moves", state.move_count()),
    }
    Ok(())
}
