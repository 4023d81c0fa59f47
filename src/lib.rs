//! Gomoku on a 15x15 board with a minimax computer player
//!
//! Five or more in a row wins; a full board without one is a draw.
//!
//! # Architecture
//!
//! - [`board`]: Immutable [`BoardState`] positions, the grid and move generation
//! - [`sequence`]: Runs of stones and the incrementally maintained [`SequenceIndex`]
//! - [`eval`]: Sequence-based position evaluation
//! - [`search`]: Alpha-beta search, sequential or on the rayon pool
//! - [`engine`]: Computer player integrating evaluation and search
//! - [`config`]: TOML configuration
//! - [`ui`]: egui front end
//!
//! # Quick Start
//!
//! ```
//! use gomoku::{AIEngine, BoardState, EngineConfig};
//!
//! let state = BoardState::new().mark(7, 7).unwrap();
//! let mut engine = AIEngine::new(EngineConfig { depth: 2, ..EngineConfig::default() });
//!
//! if let Some(next) = engine.get_move(&state) {
//!     println!("AI plays at {}", next.last_move().unwrap().pos);
//! }
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod search;
pub mod sequence;
pub mod ui;

// Re-export commonly used types for convenience
pub use board::{BoardState, Pos, Stone, BOARD_SIZE};
pub use config::{EngineConfig, GameConfig, GameMode, UiConfig};
pub use engine::{AIEngine, MoveResult, SearchType};
pub use error::{ConfigError, GameError};
pub use sequence::{Move, Sequence, SequenceIndex};
