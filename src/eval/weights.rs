//! Scoring weights for sequence evaluation
//!
//! Only the ordering these produce matters: longer beats shorter, open
//! beats blocked, mergeable beats isolated, and a finished five beats
//! everything else combined.

use crate::board::WINNING_CONDITION;

/// Weight table for a single sequence
pub struct SequenceWeight;

impl SequenceWeight {
    /// Score of a run that already reaches [`WINNING_CONDITION`].
    /// Larger than any board's worth of non-winning runs at maximum bonus.
    pub const WIN: i64 = 1_000_000_000_000_000;

    /// Multiplier on `10^len` for runs shorter than five
    pub const LENGTH_BASE: i64 = 8;

    /// The opponent's total counts this many times against the player
    pub const OPPONENT_FACTOR: i64 = 2;

    /// Indexed by number of blocked ends
    pub const BLOCKING: [i64; 3] = [32, 4, 1];

    /// Indexed by number of ends close to a same-player run
    pub const MERGING: [i64; 3] = [1, 2, 4];
}

/// Steeply increasing weight by run length
#[inline]
pub fn length_weight(len: usize) -> i64 {
    if len >= WINNING_CONDITION {
        SequenceWeight::WIN
    } else {
        SequenceWeight::LENGTH_BASE * 10_i64.pow(len as u32)
    }
}

#[inline]
pub fn blocking_factor(sides_blocked: usize) -> i64 {
    SequenceWeight::BLOCKING[sides_blocked.min(2)]
}

#[inline]
pub fn merge_factor(sides_near_merge: usize) -> i64 {
    SequenceWeight::MERGING[sides_near_merge.min(2)]
}
