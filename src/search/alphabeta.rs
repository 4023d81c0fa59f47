//! Minimax search with alpha-beta pruning
//!
//! Nodes are [`BoardState`]s and edges come from the move generator. The
//! search is fail-hard: a max node returns its raised `alpha`, a min node
//! its lowered `beta`, together with the child that produced the value.
//!
//! # Parallel search
//!
//! Above a depth threshold the first child of a node is searched alone to
//! establish a bound, then its siblings run on the rayon pool and share
//! that bound through an atomic. Siblings are searched with the bound
//! widened by one so a tie with the current best still yields an exact
//! score; the lowest-index child reaching the best score is chosen, which
//! is the child the sequential search picks.
//!
//! # Example
//!
//! ```
//! use gomoku::board::BoardState;
//! use gomoku::search::{search, INF};
//!
//! let state = BoardState::new().mark(7, 7).unwrap();
//! let player = state.active_player();
//! let (_score, best) = search(player, &state, 2, -INF, INF, true);
//! assert!(best.is_some());
//! ```

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::board::{BoardState, Stone, MAX_CANDIDATES, TOTAL_CELLS};
use crate::config::EngineConfig;
use crate::eval::{evaluate, SequenceWeight};
use crate::sequence::Move;

/// Search score; positive favors the searching player
pub type Score = i64;

/// Bound for a full alpha-beta window. Far beyond any evaluation and far
/// from overflow when widened by one.
pub const INF: Score = i64::MAX / 4;

/// A node's backed-up score and the child that achieved it
pub type Line = (Score, Option<Arc<BoardState>>);

/// Alpha-beta search from `state` for `player`, sequential, with the
/// default candidate cap.
pub fn search(
    player: Stone,
    state: &Arc<BoardState>,
    depth: u8,
    alpha: Score,
    beta: Score,
    maximizing: bool,
) -> Line {
    Searcher::new().search(player, state, depth, alpha, beta, maximizing)
}

/// Exhaustive minimax over the same tree [`search`] explores.
///
/// Ties keep the earliest child, matching the pruning search.
pub fn minimax(player: Stone, state: &Arc<BoardState>, depth: u8, maximizing: bool) -> Line {
    if depth == 0 {
        return (evaluate(player, state), None);
    }
    let mut children = state.get_next_states().peekable();
    if children.peek().is_none() {
        return (evaluate(player, state), None);
    }

    let mut best_score = if maximizing { -INF } else { INF };
    let mut best = None;
    for child in children {
        let (score, _) = minimax(player, &child, depth - 1, !maximizing);
        let better = if maximizing { score > best_score } else { score < best_score };
        if better {
            best_score = score;
            best = Some(child);
        }
    }
    (best_score, best)
}

/// Outcome of a root search
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Successor to play, if the position has any
    pub best: Option<Arc<BoardState>>,
    pub score: Score,
    /// Deepest fully completed iteration
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn best_move(&self) -> Option<Move> {
        self.best.as_ref().and_then(|s| s.last_move())
    }
}

/// Configurable alpha-beta searcher.
///
/// Holds the node counter and the stop flag for one search at a time; share
/// it between threads only through its own parallel search.
pub struct Searcher {
    candidate_limit: usize,
    parallel: bool,
    parallel_depth_threshold: u8,
    nodes: AtomicU64,
    stopped: AtomicBool,
    deadline: Option<Instant>,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Searcher {
    /// Sequential searcher with the default candidate cap
    #[must_use]
    pub fn new() -> Self {
        Self {
            candidate_limit: MAX_CANDIDATES,
            parallel: false,
            parallel_depth_threshold: 2,
            nodes: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            deadline: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new()
            .with_candidate_limit(config.candidate_limit)
            .with_parallel(config.parallel, config.parallel_depth_threshold)
    }

    #[must_use]
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit.max(1);
        self
    }

    /// Enable sibling parallelism for nodes with at least `threshold` plies left
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool, threshold: u8) -> Self {
        self.parallel = enabled;
        self.parallel_depth_threshold = threshold.max(1);
        self
    }

    /// Nodes visited since the last root search started
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Recursive alpha-beta search; see the module docs
    pub fn search(
        &self,
        player: Stone,
        state: &Arc<BoardState>,
        depth: u8,
        alpha: Score,
        beta: Score,
        maximizing: bool,
    ) -> Line {
        self.node(player, state, depth, alpha, beta, maximizing)
    }

    /// Full-window search for the side to move at a fixed depth
    pub fn best_move(&self, state: &Arc<BoardState>, depth: u8) -> SearchResult {
        let start = Instant::now();
        self.nodes.store(0, Ordering::Relaxed);
        self.stopped.store(false, Ordering::Relaxed);

        let player = state.active_player();
        let (score, best) = self.node(player, state, depth, -INF, INF, true);
        let result = SearchResult {
            best,
            score,
            depth,
            nodes: self.nodes(),
            elapsed: start.elapsed(),
        };
        log::debug!(
            "depth {} score {} nodes {} in {:?}",
            result.depth,
            result.score,
            result.nodes,
            result.elapsed
        );
        result
    }

    /// Iterative deepening under a wall-clock budget.
    ///
    /// Returns the deepest iteration that finished in time. If not even the
    /// first one did, the first candidate move is returned with its static
    /// score.
    pub fn search_timed(
        &mut self,
        state: &Arc<BoardState>,
        max_depth: u8,
        limit: Duration,
    ) -> SearchResult {
        let start = Instant::now();
        self.deadline = Some(start + limit);
        self.nodes.store(0, Ordering::Relaxed);
        self.stopped.store(false, Ordering::Relaxed);

        let player = state.active_player();
        let first = state.next_states_with_limit(self.candidate_limit).next();
        let mut result = SearchResult {
            score: first.as_ref().map_or(0, |s| evaluate(player, s)),
            best: first,
            depth: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
        };

        for depth in 1..=max_depth.max(1) {
            let (score, best) = self.node(player, state, depth, -INF, INF, true);
            if self.stopped.load(Ordering::Relaxed) {
                log::debug!("depth {} abandoned at deadline", depth);
                break;
            }
            result.score = score;
            result.best = best;
            result.depth = depth;
            log::debug!("depth {} score {} nodes {}", depth, score, self.nodes());
            if score.abs() >= SequenceWeight::WIN / TOTAL_CELLS as i64 {
                // Forced result found; deeper iterations cannot change it
                break;
            }
        }

        self.deadline = None;
        self.stopped.store(false, Ordering::Relaxed);
        result.nodes = self.nodes();
        result.elapsed = start.elapsed();
        result
    }

    /// Check the deadline and latch the stop flag once it passes
    #[inline]
    fn out_of_time(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.stopped.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    fn node(
        &self,
        player: Stone,
        state: &Arc<BoardState>,
        depth: u8,
        alpha: Score,
        beta: Score,
        maximizing: bool,
    ) -> Line {
        self.nodes.fetch_add(1, Ordering::Relaxed);
        if depth == 0 {
            return (evaluate(player, state), None);
        }
        if self.out_of_time() {
            // Discarded by the caller
            return (0, None);
        }

        let mut children = state.next_states_with_limit(self.candidate_limit).peekable();
        if children.peek().is_none() {
            return (evaluate(player, state), None);
        }

        if self.parallel && depth >= self.parallel_depth_threshold {
            let children: Vec<_> = children.collect();
            return self.split(player, &children, depth, alpha, beta, maximizing);
        }

        let (mut alpha, mut beta) = (alpha, beta);
        let mut best = None;
        for child in children {
            let (score, _) = self.node(player, &child, depth - 1, alpha, beta, !maximizing);
            if maximizing {
                if score > alpha {
                    alpha = score;
                    best = Some(child);
                }
            } else if score < beta {
                beta = score;
                best = Some(child);
            }
            if alpha >= beta {
                break;
            }
        }
        (if maximizing { alpha } else { beta }, best)
    }

    /// Search the eldest child alone, then its siblings in parallel
    fn split(
        &self,
        player: Stone,
        children: &[Arc<BoardState>],
        depth: u8,
        alpha: Score,
        beta: Score,
        maximizing: bool,
    ) -> Line {
        let Some((eldest, rest)) = children.split_first() else {
            return (if maximizing { alpha } else { beta }, None);
        };

        let (mut alpha, mut beta) = (alpha, beta);
        let mut best_idx = None;
        let (score, _) = self.node(player, eldest, depth - 1, alpha, beta, !maximizing);
        if maximizing && score > alpha {
            alpha = score;
            best_idx = Some(0);
        } else if !maximizing && score < beta {
            beta = score;
            best_idx = Some(0);
        }

        if alpha < beta && !rest.is_empty() {
            let shared = AtomicI64::new(if maximizing { alpha } else { beta });
            let scores: Vec<Option<Score>> = rest
                .par_iter()
                .map(|child| {
                    let bound = shared.load(Ordering::Relaxed);
                    if maximizing {
                        if bound >= beta {
                            return None;
                        }
                        let (s, _) = self.node(player, child, depth - 1, bound - 1, beta, false);
                        shared.fetch_max(s, Ordering::Relaxed);
                        Some(s)
                    } else {
                        if alpha >= bound {
                            return None;
                        }
                        let (s, _) = self.node(player, child, depth - 1, alpha, bound + 1, true);
                        shared.fetch_min(s, Ordering::Relaxed);
                        Some(s)
                    }
                })
                .collect();

            for (i, score) in scores.into_iter().enumerate() {
                let Some(score) = score else { continue };
                if maximizing && score > alpha {
                    alpha = score;
                    best_idx = Some(i + 1);
                } else if !maximizing && score < beta {
                    beta = score;
                    best_idx = Some(i + 1);
                }
            }
        }

        let best = best_idx.and_then(|i| children.get(i).cloned());
        (if maximizing { alpha } else { beta }, best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Pos;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn play(cells: &[(i32, i32)]) -> Arc<BoardState> {
        cells.iter().fold(BoardState::new(), |state, &(r, c)| {
            state.mark(r, c).expect("legal move")
        })
    }

    /// Random unfinished position reached through generated moves
    fn random_position(rng: &mut StdRng, plies: usize) -> Arc<BoardState> {
        let mut state = BoardState::new();
        for _ in 0..plies {
            let next: Vec<_> = state.get_next_states().collect();
            match next.choose(rng) {
                Some(child) if !child.finished() => state = child.clone(),
                _ => break,
            }
        }
        state
    }

    fn cell(line: &Line) -> Option<Pos> {
        line.1.as_ref().and_then(|s| s.last_move()).map(|m| m.pos)
    }

    #[test]
    fn test_search_empty_board() {
        let state = BoardState::new();
        let (_, best) = search(Stone::Black, &state, 2, -INF, INF, true);
        assert_eq!(best.unwrap().last_move().unwrap().pos, Pos::CENTER);
    }

    #[test]
    fn test_depth_zero_is_leaf() {
        let state = play(&[(7, 7)]);
        let (score, best) = search(Stone::White, &state, 0, -INF, INF, true);
        assert!(best.is_none());
        assert_eq!(score, evaluate(Stone::White, &state));
    }

    #[test]
    fn test_search_finds_winning_move() {
        // Black: row 7 cols 3..=6, White scattered; Black to move
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6)]);
        let result = Searcher::new().best_move(&state, 2);
        let pos = result.best_move().unwrap().pos;
        assert!(pos == Pos::new(7, 2) || pos == Pos::new(7, 7), "got {pos}");
        assert!(result.best.unwrap().winner() == Some(Stone::Black));
    }

    #[test]
    fn test_search_blocks_opponent_four() {
        // White to move, Black threatens five at (7,7) only
        let state = play(&[(7, 3), (7, 2), (7, 4), (0, 0), (7, 5), (0, 14), (7, 6)]);
        let result = Searcher::new().best_move(&state, 2);
        assert_eq!(result.best_move().unwrap().pos, Pos::new(7, 7));
    }

    #[test]
    fn test_finished_position_is_leaf() {
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6), (7, 7)]);
        let (score, best) = search(Stone::White, &state, 3, -INF, INF, true);
        assert!(best.is_none());
        assert!(score < 0);
    }

    #[test]
    fn test_alpha_beta_matches_minimax() {
        let mut rng = StdRng::seed_from_u64(0xAB);
        for plies in [1, 3, 4, 6, 8] {
            let state = random_position(&mut rng, plies);
            let player = state.active_player();
            for depth in 1..=3 {
                let exhaustive = minimax(player, &state, depth, true);
                let pruned = search(player, &state, depth, -INF, INF, true);
                assert_eq!(pruned.0, exhaustive.0, "score at depth {depth}, ply {plies}");
                assert_eq!(cell(&pruned), cell(&exhaustive), "move at depth {depth}, ply {plies}");
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let sequential = Searcher::new();
        let parallel = Searcher::new().with_parallel(true, 1);
        for plies in [2, 5, 7] {
            let state = random_position(&mut rng, plies);
            let player = state.active_player();
            let a = sequential.search(player, &state, 3, -INF, INF, true);
            let b = parallel.search(player, &state, 3, -INF, INF, true);
            assert_eq!(a.0, b.0);
            assert_eq!(cell(&a), cell(&b));
        }
    }

    #[test]
    fn test_pruning_visits_fewer_nodes() {
        let state = play(&[(7, 7), (7, 8), (8, 8), (6, 6)]);
        let searcher = Searcher::new();
        searcher.best_move(&state, 3);
        let pruned = searcher.nodes();

        let limit = MAX_CANDIDATES as u64;
        let full_tree = 1 + limit + limit * limit + limit * limit * limit;
        assert!(pruned < full_tree, "pruned {pruned} of {full_tree}");
    }

    #[test]
    fn test_timed_search_returns_a_move() {
        let state = play(&[(7, 7), (7, 8)]);
        let mut searcher = Searcher::new();
        let result = searcher.search_timed(&state, 3, Duration::from_secs(30));
        assert_eq!(result.depth, 3);
        assert!(result.best.is_some());

        // A deadline already behind us still yields a legal move
        let result = searcher.search_timed(&state, 6, Duration::ZERO);
        let mv = result.best_move().unwrap();
        assert!(state.grid().is_empty(mv.pos));
    }

    #[test]
    fn test_search_after_expired_deadline() {
        let state = play(&[(7, 7), (7, 8), (8, 8)]);
        let player = state.active_player();
        let mut searcher = Searcher::new();
        searcher.search_timed(&state, 4, Duration::ZERO);

        let after = searcher.search(player, &state, 2, -INF, INF, true);
        let fresh = Searcher::new().search(player, &state, 2, -INF, INF, true);
        assert_eq!(after.0, fresh.0);
        assert_eq!(cell(&after), cell(&fresh));
        assert!(after.1.is_some());
    }
}
