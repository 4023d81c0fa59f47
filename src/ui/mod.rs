//! GUI module for the Gomoku game
//!
//! This module provides a native Rust GUI using egui/eframe.

mod app;
mod board_view;
mod game_state;
pub mod handlers;
mod theme;

pub use app::GomokuApp;
pub use game_state::{AiState, GameState, MoveTimer};
pub use handlers::{Flow, MarkHandlers};
