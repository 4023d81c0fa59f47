//! Heuristic evaluation of board positions
//!
//! Every indexed sequence is scored as
//! `length_weight × blocking_factor × merge_factor`. The player's total
//! counts for them, the opponent's total counts double against them, and
//! the difference is divided by the number of moves played.

use crate::board::{BoardState, Grid, Stone, WINNING_CONDITION};
use crate::sequence::{Sequence, SequenceIndex};

use super::weights::{blocking_factor, length_weight, merge_factor, SequenceWeight};

/// Evaluate `state` from the perspective of `player`.
///
/// Positive values favor `player`. A finished five for either side
/// outweighs every other term.
#[must_use]
pub fn evaluate(player: Stone, state: &BoardState) -> i64 {
    let grid = state.grid();
    let index = state.sequences();

    let own = side_total(index, grid, player);
    let opp = side_total(index, grid, player.opponent());

    let raw = own - SequenceWeight::OPPONENT_FACTOR * opp;
    raw / state.move_count().max(1) as i64
}

/// Score of a single sequence on `grid`
#[must_use]
pub fn sequence_score(seq: &Sequence, grid: &Grid) -> i64 {
    if seq.len() >= WINNING_CONDITION {
        return SequenceWeight::WIN;
    }
    length_weight(seq.len())
        * blocking_factor(seq.count_blocked(grid, None))
        * merge_factor(seq.count_near_merge(grid, None))
}

/// Sum of [`sequence_score`] over `player`'s sequences
pub fn side_total(index: &SequenceIndex, grid: &Grid, player: Stone) -> i64 {
    index
        .iter()
        .filter(|seq| seq.player() == player)
        .map(|seq| sequence_score(seq, grid))
        .sum()
}
