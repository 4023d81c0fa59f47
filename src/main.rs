//! Gomoku GUI
//!
//! Play on a 15x15 board against the computer or another player.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gomoku::ui::GomokuApp;
use gomoku::{GameConfig, GameMode};

#[derive(Parser)]
#[command(name = "gomoku", about = "Gomoku with a minimax computer player")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "gomoku.toml")]
    config: PathBuf,

    /// Who plays which side, overrides the config file
    #[arg(short, long, value_enum)]
    mode: Option<GameMode>,

    /// Search depth in plies, overrides the config file
    #[arg(short, long)]
    depth: Option<u8>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = GameConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    if let Some(mode) = cli.mode {
        config.ui.mode = mode;
    }
    if let Some(depth) = cli.depth {
        config.engine.depth = depth;
    }
    config.validate().context("invalid command line overrides")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 750.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Gomoku 15x15"),
        ..Default::default()
    };

    eframe::run_native(
        "Gomoku",
        options,
        Box::new(move |cc| Ok(Box::new(GomokuApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
