//! Successor generation
//!
//! Candidates come from the open ends of the most urgent sequences, then
//! from the neighborhood of the cells already picked. Both sides' lines
//! are considered so blocking moves are not pruned away.

use std::cmp::Reverse;
use std::sync::Arc;

use super::{Bitboard, BoardState, Grid, Pos, TOTAL_CELLS};

/// Default cap on successors generated per position
pub const MAX_CANDIDATES: usize = 15;

/// Lazy iterator over the legal successors of a position.
///
/// Cells are chosen up front; each successor state is built on demand, so a
/// search that cuts off early never pays for the remaining children.
pub struct NextStates {
    parent: Arc<BoardState>,
    cells: std::vec::IntoIter<Pos>,
}

impl Iterator for NextStates {
    type Item = Arc<BoardState>;

    fn next(&mut self) -> Option<Self::Item> {
        for pos in self.cells.by_ref() {
            match self.parent.mark_pos(pos) {
                Ok(state) => return Some(state),
                Err(e) => debug_assert!(false, "candidate {pos} rejected: {e}"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cells.len()))
    }
}

/// Ordered, duplicate-free set of empty cells with a size cap
struct Candidates<'a> {
    grid: &'a Grid,
    limit: usize,
    seen: Bitboard,
    cells: Vec<Pos>,
}

impl<'a> Candidates<'a> {
    fn new(grid: &'a Grid, limit: usize) -> Self {
        Self {
            grid,
            limit,
            seen: Bitboard::new(),
            cells: Vec::with_capacity(limit),
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.cells.len() >= self.limit
    }

    fn push(&mut self, pos: Pos) {
        if !self.is_full() && self.grid.is_empty(pos) && !self.seen.get(pos) {
            self.seen.set(pos);
            self.cells.push(pos);
        }
    }

    /// Widen the set with the 8-neighborhood of every cell picked so far
    fn grow(&mut self) {
        let mut i = 0;
        while i < self.cells.len() && !self.is_full() {
            let pos = self.cells[i];
            for n in pos.neighbors() {
                self.push(n);
            }
            i += 1;
        }
    }
}

impl BoardState {
    /// Successors of this position, at most [`MAX_CANDIDATES`] of them.
    ///
    /// Empty once the game is finished.
    pub fn get_next_states(self: &Arc<Self>) -> NextStates {
        self.next_states_with_limit(MAX_CANDIDATES)
    }

    pub fn next_states_with_limit(self: &Arc<Self>, limit: usize) -> NextStates {
        NextStates {
            parent: Arc::clone(self),
            cells: self.candidate_cells(limit).into_iter(),
        }
    }

    /// Cells worth playing, most urgent first.
    ///
    /// Sequences are ranked by length, then the opponent's before the active
    /// player's, then fewer blocked ends, then more ends close to merging.
    /// Runs blocked on both sides contribute nothing.
    pub fn candidate_cells(&self, limit: usize) -> Vec<Pos> {
        if limit == 0 || self.finished() {
            return Vec::new();
        }
        let grid = self.grid();
        if grid.is_board_empty() {
            return vec![Pos::CENTER];
        }

        let active = self.active_player();
        let open = self.sequences().get_by_not_blocked(grid, None);
        let mut ranked: Vec<_> = open
            .iter()
            .map(|seq| {
                let key = (
                    Reverse(seq.len()),
                    seq.player() == active,
                    seq.count_blocked(grid, None),
                    Reverse(seq.count_near_merge(grid, None)),
                );
                (key, seq)
            })
            .collect();
        ranked.sort_by_key(|(key, _)| *key);

        let mut picked = Candidates::new(grid, limit);
        for (_, seq) in &ranked {
            if picked.is_full() {
                break;
            }
            for end in seq.ends() {
                picked.push(end);
            }
        }
        picked.grow();

        // Every line is dead; fall back to cells next to any stone
        if picked.cells.is_empty() {
            for (pos, _) in grid.occupied() {
                for n in pos.neighbors() {
                    picked.push(n);
                }
            }
        }
        if picked.cells.is_empty() {
            for idx in 0..TOTAL_CELLS {
                picked.push(Pos::from_index(idx));
            }
        }
        picked.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(cells: &[(i32, i32)]) -> Arc<BoardState> {
        cells.iter().fold(BoardState::new(), |state, &(r, c)| {
            state.mark(r, c).expect("legal move")
        })
    }

    #[test]
    fn test_empty_board_opens_center() {
        let root = BoardState::new();
        let next: Vec<_> = root.get_next_states().collect();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].last_move().unwrap().pos, Pos::CENTER);
    }

    /// Every successor is a fresh, distinct, legal move by the side to move
    fn assert_legal_successors(state: &Arc<BoardState>, next: &[Arc<BoardState>]) {
        assert!(next.len() <= MAX_CANDIDATES);
        let mut seen = Bitboard::new();
        for child in next {
            let mv = child.last_move().unwrap();
            assert_eq!(mv.player, state.active_player());
            assert!(state.grid().is_empty(mv.pos), "occupied successor {}", mv.pos);
            assert!(!seen.get(mv.pos), "duplicate successor {}", mv.pos);
            seen.set(mv.pos);
            assert_eq!(child.move_count(), state.move_count() + 1);
            assert!(Arc::ptr_eq(child.parent().unwrap(), state));
        }
    }

    #[test]
    fn test_successors_are_legal_and_distinct() {
        let state = play(&[(7, 7), (7, 8), (8, 8), (6, 6)]);
        let next: Vec<_> = state.get_next_states().collect();
        assert!(!next.is_empty());
        assert_legal_successors(&state, &next);
    }

    #[test]
    fn test_limit_is_respected() {
        let state = play(&[(7, 7), (7, 8), (8, 8), (6, 6), (9, 9)]);
        assert_eq!(state.next_states_with_limit(3).count(), 3);
        assert_eq!(state.next_states_with_limit(0).count(), 0);
    }

    #[test]
    fn test_finished_position_has_no_successors() {
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6), (7, 7)]);
        assert!(state.finished());
        assert_eq!(state.get_next_states().count(), 0);
    }

    #[test]
    fn test_open_four_ends_come_first() {
        // Black has an open four on row 7 cols 3..=6, White to move
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 4), (7, 5), (0, 8), (7, 6)]);
        let cells = state.candidate_cells(MAX_CANDIDATES);
        let first_two: Vec<_> = cells.iter().take(2).copied().collect();
        assert!(first_two.contains(&Pos::new(7, 2)));
        assert!(first_two.contains(&Pos::new(7, 7)));
    }

    #[test]
    fn test_neighborhood_fills_budget() {
        let state = play(&[(7, 7)]);
        let cells = state.candidate_cells(MAX_CANDIDATES);
        // Eight seeds around the lone stone, then their neighbors
        assert_eq!(cells.len(), MAX_CANDIDATES);
        for pos in cells.iter().take(8) {
            assert_eq!(
                (i32::from(pos.row) - 7).abs().max((i32::from(pos.col) - 7).abs()),
                1
            );
        }
    }

    #[test]
    fn test_random_games_stay_legal_until_finished() {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(7);
        let mut state = BoardState::new();
        while !state.finished() {
            let next: Vec<_> = state.get_next_states().collect();
            assert!(!next.is_empty(), "no successors at move {}", state.move_count());
            assert_legal_successors(&state, &next);
            state = next.choose(&mut rng).unwrap().clone();
        }
        assert!(state.winner().is_some() || state.move_count() == TOTAL_CELLS);
    }
}
