//! Computer player built on the alpha-beta searcher
//!
//! Moves are chosen in priority order:
//!
//! 1. **Immediate win**: a cell that completes five for the side to move
//! 2. **Defense**: a cell the opponent would complete five on
//! 3. **Alpha-Beta**: full-window search at the configured depth, or
//!    iterative deepening when a time limit is set
//!
//! # Example
//!
//! ```
//! use gomoku::{AIEngine, BoardState, EngineConfig};
//!
//! let mut engine = AIEngine::new(EngineConfig { depth: 2, ..EngineConfig::default() });
//! let state = BoardState::new().mark(7, 7).unwrap();
//!
//! let result = engine.choose_move(&state);
//! println!("Best move: {:?}", result.best_move());
//! println!("Search type: {:?}", result.search_type);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::{BoardState, Grid, Pos, Stone, WINNING_CONDITION};
use crate::config::EngineConfig;
use crate::eval::evaluate;
use crate::search::{Score, SearchResult, Searcher};
use crate::sequence::{Axis, Move};

/// Which rule produced the move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// Completes five for the side to move
    ImmediateWin,
    /// Occupies the cell the opponent would win on
    Defense,
    /// Regular alpha-beta search result
    AlphaBeta,
}

/// Result of a move search with statistics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Position after the chosen move; `None` when the game is over
    pub best: Option<Arc<BoardState>>,
    pub score: Score,
    pub search_type: SearchType,
    /// Deepest completed search depth
    pub depth: u8,
    pub nodes: u64,
    pub time_ms: u64,
}

impl MoveResult {
    /// Move found without searching, scored statically for `player`
    fn shortcut(player: Stone, best: Arc<BoardState>, search_type: SearchType, start: Instant) -> Self {
        Self {
            score: evaluate(player, &best),
            best: Some(best),
            search_type,
            depth: 0,
            nodes: 1,
            time_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn from_search(result: SearchResult, start: Instant) -> Self {
        Self {
            best: result.best,
            score: result.score,
            search_type: SearchType::AlphaBeta,
            depth: result.depth,
            nodes: result.nodes,
            time_ms: start.elapsed().as_millis() as u64,
        }
    }

    pub fn best_move(&self) -> Option<Move> {
        self.best.as_ref().and_then(|s| s.last_move())
    }
}

/// Computer player.
pub struct AIEngine {
    searcher: Searcher,
    config: EngineConfig,
}

impl Default for AIEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AIEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            searcher: Searcher::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn max_depth(&self) -> u8 {
        self.config.depth
    }

    /// Successor to play, or `None` when the game is over
    pub fn get_move(&mut self, state: &Arc<BoardState>) -> Option<Arc<BoardState>> {
        self.choose_move(state).best
    }

    /// Pick a move for the side to move in `state`
    pub fn choose_move(&mut self, state: &Arc<BoardState>) -> MoveResult {
        let start = Instant::now();
        let player = state.active_player();

        if !state.finished() {
            if let Some(best) = winning_cell(state, player)
                .and_then(|pos| state.mark_pos(pos).ok())
            {
                log::info!("{} wins at {}", player.name(), fmt_last(&best));
                return MoveResult::shortcut(player, best, SearchType::ImmediateWin, start);
            }
            if let Some(best) = winning_cell(state, player.opponent())
                .and_then(|pos| state.mark_pos(pos).ok())
            {
                log::info!("{} blocks at {}", player.name(), fmt_last(&best));
                return MoveResult::shortcut(player, best, SearchType::Defense, start);
            }
        }

        let result = match self.config.time_limit_ms {
            Some(ms) => {
                self.searcher
                    .search_timed(state, self.config.depth, Duration::from_millis(ms))
            }
            None => self.searcher.best_move(state, self.config.depth),
        };
        let result = MoveResult::from_search(result, start);
        log::info!(
            "{} plays {} (score {}, depth {}, {} nodes, {} ms)",
            player.name(),
            result.best.as_ref().map_or_else(|| "nothing".to_string(), |s| fmt_last(s)),
            result.score,
            result.depth,
            result.nodes,
            result.time_ms
        );
        result
    }
}

fn fmt_last(state: &BoardState) -> String {
    state
        .last_move()
        .map_or_else(|| "-".to_string(), |mv| mv.pos.to_string())
}

/// A cell where `player` would complete five.
///
/// Such a cell has at least four of `player`'s stones beside it on one axis,
/// so at least one side holds a run of two or more; only the open ends of
/// those runs need checking.
fn winning_cell(state: &BoardState, player: Stone) -> Option<Pos> {
    let grid = state.grid();
    state
        .sequences()
        .iter()
        .filter(|seq| seq.player() == player && seq.len() >= 2)
        .flat_map(|seq| seq.ends())
        .find(|&pos| grid.is_empty(pos) && completes_five(grid, pos, player))
}

/// Whether a `player` stone at `pos` would sit in a run of five or more
fn completes_five(grid: &Grid, pos: Pos, player: Stone) -> bool {
    Axis::ALL.iter().any(|axis| {
        let run = |(dr, dc): (i32, i32)| {
            (1..WINNING_CONDITION as i32)
                .map_while(|k| pos.offset(dr, dc, k))
                .take_while(|&p| grid.get(p) == player)
                .count()
        };
        1 + run(axis.forward()) + run(axis.backward()) >= WINNING_CONDITION
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::SequenceWeight;

    fn play(cells: &[(i32, i32)]) -> Arc<BoardState> {
        cells.iter().fold(BoardState::new(), |state, &(r, c)| {
            state.mark(r, c).expect("legal move")
        })
    }

    fn fast_engine() -> AIEngine {
        AIEngine::new(EngineConfig {
            depth: 2,
            parallel: false,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_engine_with_config() {
        let engine = fast_engine();
        assert_eq!(engine.max_depth(), 2);
    }

    #[test]
    fn test_engine_empty_board() {
        let mut engine = fast_engine();
        let result = engine.choose_move(&BoardState::new());
        assert_eq!(result.best_move().unwrap().pos, Pos::CENTER);
        assert_eq!(result.search_type, SearchType::AlphaBeta);
    }

    #[test]
    fn test_engine_finds_immediate_win() {
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6)]);
        let mut engine = fast_engine();
        let result = engine.choose_move(&state);
        assert_eq!(result.search_type, SearchType::ImmediateWin);
        // Five on the board after nine moves
        assert!(result.score >= SequenceWeight::WIN / 10);
        assert_eq!(result.best.unwrap().winner(), Some(Stone::Black));
    }

    #[test]
    fn test_engine_finds_split_four_win() {
        // Black X X _ X X on row 7; the gap wins
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 6), (0, 4), (7, 7), (0, 6)]);
        let mut engine = fast_engine();
        let result = engine.choose_move(&state);
        assert_eq!(result.search_type, SearchType::ImmediateWin);
        assert_eq!(result.best_move().unwrap().pos, Pos::new(7, 5));
    }

    #[test]
    fn test_engine_blocks_opponent_win() {
        // White to move; Black four on row 7, closed at (7,2)
        let state = play(&[(7, 3), (7, 2), (7, 4), (0, 0), (7, 5), (0, 14), (7, 6)]);
        let mut engine = fast_engine();
        let result = engine.choose_move(&state);
        assert_eq!(result.search_type, SearchType::Defense);
        assert_eq!(result.best_move().unwrap().pos, Pos::new(7, 7));
        let best = result.best.as_ref().unwrap();
        assert_eq!(result.score, evaluate(Stone::White, best));
        assert_ne!(result.score, 0);
    }

    #[test]
    fn test_engine_finished_game() {
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6), (7, 7)]);
        let mut engine = fast_engine();
        let result = engine.choose_move(&state);
        assert!(result.best.is_none());
    }

    #[test]
    fn test_engine_time_limit() {
        let mut engine = AIEngine::new(EngineConfig {
            depth: 3,
            time_limit_ms: Some(10_000),
            ..EngineConfig::default()
        });
        let state = play(&[(7, 7), (7, 8), (8, 8)]);
        let result = engine.choose_move(&state);
        assert!(result.best.is_some());
        assert!(result.depth >= 1);
    }

    #[test]
    fn test_completes_five() {
        let state = play(&[(3, 3), (0, 0), (4, 4), (0, 2), (6, 6), (0, 4), (7, 7)]);
        assert!(completes_five(state.grid(), Pos::new(5, 5), Stone::Black));
        assert!(!completes_five(state.grid(), Pos::new(8, 8), Stone::Black));
        assert!(!completes_five(state.grid(), Pos::new(5, 5), Stone::White));
    }
}
