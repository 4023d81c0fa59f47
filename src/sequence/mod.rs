//! Runs of same-colored stones along one axis
//!
//! A [`Sequence`] is a maximal line of one player's stones in one of the
//! four axes. Every stone belongs to exactly one sequence per axis, so a
//! lone stone is four length-1 sequences. The [`SequenceIndex`] keeps the
//! complete set up to date one move at a time instead of rescanning the
//! board.
//!
//! The cells just beyond either end of a sequence are its *open ends*.
//! Placing a stone on an open end extends the run, and a stone that joins
//! two runs merges them.

pub mod index;

pub use index::SequenceIndex;

use crate::board::{Grid, Pos, Stone, WINNING_CONDITION};

/// An immutable placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub pos: Pos,
    pub player: Stone,
}

impl Move {
    #[inline]
    pub fn new(row: u8, col: u8, player: Stone) -> Self {
        Self {
            pos: Pos::new(row, col),
            player,
        }
    }

    #[inline]
    pub fn at(pos: Pos, player: Stone) -> Self {
        Self { pos, player }
    }

    #[inline]
    pub fn row(&self) -> u8 {
        self.pos.row
    }

    #[inline]
    pub fn col(&self) -> u8 {
        self.pos.col
    }
}

/// One of the four undirected lines through a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// Top-left to bottom-right
    Diagonal,
    /// Top-right to bottom-left
    AntiDiagonal,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::Horizontal,
        Axis::Vertical,
        Axis::Diagonal,
        Axis::AntiDiagonal,
    ];

    /// Step toward the top end of a sequence
    #[inline]
    pub fn forward(self) -> (i32, i32) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::Diagonal => (1, 1),
            Axis::AntiDiagonal => (1, -1),
        }
    }

    /// Step toward the bottom end of a sequence
    #[inline]
    pub fn backward(self) -> (i32, i32) {
        let (dr, dc) = self.forward();
        (-dr, -dc)
    }
}

/// A maximal run of one player's stones along one axis.
///
/// Moves are always stored in forward order along the axis, so comparing
/// the move lists compares the move sets. Sequences are values: extending
/// or merging returns a new sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    moves: Vec<Move>,
    axis: Axis,
}

impl Sequence {
    /// The four length-1 sequences seeded at `mv`, one per axis
    pub fn for_move(mv: Move) -> impl Iterator<Item = Sequence> {
        Axis::ALL.into_iter().map(move |axis| Sequence {
            moves: vec![mv],
            axis,
        })
    }

    #[inline]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline]
    pub fn player(&self) -> Stone {
        self.moves.first().map_or(Stone::Empty, |m| m.player)
    }

    #[inline]
    fn first(&self) -> Move {
        self.moves[0]
    }

    #[inline]
    fn last(&self) -> Move {
        self.moves[self.moves.len() - 1]
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.moves.iter().any(|m| m.pos == pos)
    }

    /// Cell just before the first move, `None` when off the board
    #[inline]
    pub fn bottom_end(&self) -> Option<Pos> {
        let (dr, dc) = self.axis.backward();
        self.first().pos.offset(dr, dc, 1)
    }

    /// Cell just after the last move, `None` when off the board
    #[inline]
    pub fn top_end(&self) -> Option<Pos> {
        let (dr, dc) = self.axis.forward();
        self.last().pos.offset(dr, dc, 1)
    }

    /// Open ends that lie on the board
    pub fn ends(&self) -> impl Iterator<Item = Pos> {
        self.bottom_end().into_iter().chain(self.top_end())
    }

    /// Extend the run with `mv` placed on one of its open ends.
    ///
    /// Returns `None` when `mv` belongs to the other player, is already part
    /// of the run, or is not on an open end.
    #[must_use]
    pub fn append(&self, mv: Move) -> Option<Sequence> {
        if mv.player != self.player() || self.moves.contains(&mv) {
            return None;
        }
        let mut moves = Vec::with_capacity(self.moves.len() + 1);
        if self.bottom_end() == Some(mv.pos) {
            moves.push(mv);
            moves.extend_from_slice(&self.moves);
        } else if self.top_end() == Some(mv.pos) {
            moves.extend_from_slice(&self.moves);
            moves.push(mv);
        } else {
            return None;
        }
        Some(Sequence {
            moves,
            axis: self.axis,
        })
    }

    /// Orders two sequences bottom-to-top if they join into a single run.
    ///
    /// Runs join when one starts on the other's open end, or when they share
    /// exactly their touching end stone (both runs extended by the same move).
    fn join_order<'a>(&'a self, other: &'a Sequence) -> Option<(&'a Sequence, &'a Sequence)> {
        if self.axis != other.axis || self.player() != other.player() || self == other {
            return None;
        }
        let joins = |lower: &Sequence, upper: &Sequence| {
            lower.top_end() == Some(upper.first().pos) || lower.last() == upper.first()
        };
        if joins(self, other) {
            Some((self, other))
        } else if joins(other, self) {
            Some((other, self))
        } else {
            None
        }
    }

    pub fn can_merge(&self, other: &Sequence) -> bool {
        self.join_order(other).is_some()
    }

    /// Concatenate two joining runs into one ordered run; `None` if they don't join
    #[must_use]
    pub fn merge(&self, other: &Sequence) -> Option<Sequence> {
        let (lower, upper) = self.join_order(other)?;
        let skip = usize::from(lower.last() == upper.first());
        let mut moves = Vec::with_capacity(lower.len() + upper.len() - skip);
        moves.extend_from_slice(&lower.moves);
        moves.extend_from_slice(&upper.moves[skip..]);
        Some(Sequence {
            moves,
            axis: self.axis,
        })
    }

    /// Default lookahead for block and merge checks: cells still needed to win
    #[inline]
    fn reach(&self, n: Option<usize>) -> usize {
        n.unwrap_or_else(|| WINNING_CONDITION.saturating_sub(self.len()))
    }

    /// Walk up to `n` cells beyond `from` in `dir`; `None` items are off-board
    fn beyond(from: Pos, dir: (i32, i32), n: usize) -> impl Iterator<Item = Option<Pos>> {
        (1..=n as i32).map(move |k| from.offset(dir.0, dir.1, k))
    }

    fn is_blocked_from(&self, grid: &Grid, from: Pos, dir: (i32, i32), n: usize) -> bool {
        let opponent = self.player().opponent();
        Self::beyond(from, dir, n).any(|cell| match cell {
            None => true,
            Some(pos) => grid.get(pos) == opponent,
        })
    }

    // Every stone is covered by a sequence on each axis, so a same-player
    // stone on the line means a same-axis sequence is waiting there.
    fn is_near_merge_from(&self, grid: &Grid, from: Pos, dir: (i32, i32), n: usize) -> bool {
        let player = self.player();
        Self::beyond(from, dir, n).any(|cell| cell.is_some_and(|pos| grid.get(pos) == player))
    }

    /// Whether the board edge or an opposing stone lies within `n` cells past the top end
    pub fn is_top_blocked(&self, grid: &Grid, n: Option<usize>) -> bool {
        self.is_blocked_from(grid, self.last().pos, self.axis.forward(), self.reach(n))
    }

    /// Whether the board edge or an opposing stone lies within `n` cells past the bottom end
    pub fn is_bottom_blocked(&self, grid: &Grid, n: Option<usize>) -> bool {
        self.is_blocked_from(grid, self.first().pos, self.axis.backward(), self.reach(n))
    }

    /// Number of blocked ends (0..=2)
    pub fn count_blocked(&self, grid: &Grid, n: Option<usize>) -> usize {
        usize::from(self.is_top_blocked(grid, n)) + usize::from(self.is_bottom_blocked(grid, n))
    }

    pub fn is_top_near_merge(&self, grid: &Grid, n: Option<usize>) -> bool {
        !self.is_top_blocked(grid, n)
            && self.is_near_merge_from(grid, self.last().pos, self.axis.forward(), self.reach(n))
    }

    pub fn is_bottom_near_merge(&self, grid: &Grid, n: Option<usize>) -> bool {
        !self.is_bottom_blocked(grid, n)
            && self.is_near_merge_from(grid, self.first().pos, self.axis.backward(), self.reach(n))
    }

    /// Number of ends with a same-player run within reach (0..=2)
    pub fn count_near_merge(&self, grid: &Grid, n: Option<usize>) -> usize {
        usize::from(self.is_top_near_merge(grid, n)) + usize::from(self.is_bottom_near_merge(grid, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(player: Stone, axis: Axis, cells: &[(u8, u8)]) -> Sequence {
        let mut iter = cells.iter();
        let &(r, c) = iter.next().expect("at least one cell");
        let mut seq = Sequence::for_move(Move::new(r, c, player))
            .find(|s| s.axis() == axis)
            .expect("one seed per axis");
        for &(r, c) in iter {
            seq = seq.append(Move::new(r, c, player)).expect("cell on an open end");
        }
        seq
    }

    #[test]
    fn test_for_move_yields_one_per_axis() {
        let seeds: Vec<_> = Sequence::for_move(Move::new(7, 7, Stone::Black)).collect();
        assert_eq!(seeds.len(), 4);
        for axis in Axis::ALL {
            assert_eq!(seeds.iter().filter(|s| s.axis() == axis).count(), 1);
        }
        assert!(seeds.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn test_ends_follow_axis() {
        let seq = run(Stone::Black, Axis::Horizontal, &[(7, 4), (7, 5)]);
        assert_eq!(seq.bottom_end(), Some(Pos::new(7, 3)));
        assert_eq!(seq.top_end(), Some(Pos::new(7, 6)));

        let diag = run(Stone::White, Axis::AntiDiagonal, &[(2, 5)]);
        assert_eq!(diag.bottom_end(), Some(Pos::new(1, 6)));
        assert_eq!(diag.top_end(), Some(Pos::new(3, 4)));
    }

    #[test]
    fn test_ends_off_board_are_none() {
        let seq = run(Stone::Black, Axis::Vertical, &[(0, 0)]);
        assert_eq!(seq.bottom_end(), None);
        assert_eq!(seq.ends().count(), 1);

        let corner = run(Stone::Black, Axis::Diagonal, &[(14, 14)]);
        assert_eq!(corner.top_end(), None);
    }

    #[test]
    fn test_append_prepends_and_appends() {
        let seq = run(Stone::Black, Axis::Horizontal, &[(7, 5)]);
        let down = seq.append(Move::new(7, 4, Stone::Black)).unwrap();
        assert_eq!(down.moves()[0].pos, Pos::new(7, 4));
        let up = down.append(Move::new(7, 6, Stone::Black)).unwrap();
        assert_eq!(up.len(), 3);
        assert_eq!(up.moves().last().unwrap().pos, Pos::new(7, 6));
    }

    #[test]
    fn test_append_rejects() {
        let seq = run(Stone::Black, Axis::Horizontal, &[(7, 5), (7, 6)]);
        // Wrong player
        assert!(seq.append(Move::new(7, 7, Stone::White)).is_none());
        // Already a member
        assert!(seq.append(Move::new(7, 5, Stone::Black)).is_none());
        // Not on an open end
        assert!(seq.append(Move::new(8, 7, Stone::Black)).is_none());
        assert!(seq.append(Move::new(7, 9, Stone::Black)).is_none());
    }

    #[test]
    fn test_equality_by_axis_and_moves() {
        let a = run(Stone::Black, Axis::Horizontal, &[(7, 5), (7, 6)]);
        let b = run(Stone::Black, Axis::Horizontal, &[(7, 6), (7, 5)]);
        assert_eq!(a, b, "insertion order must not matter");

        let c = run(Stone::Black, Axis::Vertical, &[(7, 5)]);
        let d = run(Stone::Black, Axis::Horizontal, &[(7, 5)]);
        assert_ne!(c, d);
    }

    #[test]
    fn test_merge_adjacent_runs() {
        let left = run(Stone::Black, Axis::Horizontal, &[(7, 2), (7, 3)]);
        let right = run(Stone::Black, Axis::Horizontal, &[(7, 4), (7, 5), (7, 6)]);
        assert!(left.can_merge(&right));
        assert!(right.can_merge(&left));

        let merged = right.merge(&left).unwrap();
        assert_eq!(merged.len(), left.len() + right.len());
        let cols: Vec<u8> = merged.moves().iter().map(|m| m.col()).collect();
        assert_eq!(cols, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_merge_runs_sharing_end_stone() {
        let left = run(Stone::White, Axis::Diagonal, &[(3, 3), (4, 4)]);
        let right = run(Stone::White, Axis::Diagonal, &[(4, 4), (5, 5), (6, 6)]);
        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.len(), 4, "shared stone counted once");
        assert_eq!(merged, run(Stone::White, Axis::Diagonal, &[(3, 3), (4, 4), (5, 5), (6, 6)]));
    }

    #[test]
    fn test_merge_rejects_unrelated() {
        let a = run(Stone::Black, Axis::Horizontal, &[(7, 2), (7, 3)]);
        let gap = run(Stone::Black, Axis::Horizontal, &[(7, 5), (7, 6)]);
        let other_axis = run(Stone::Black, Axis::Vertical, &[(7, 4), (8, 4)]);
        let other_player = run(Stone::White, Axis::Horizontal, &[(7, 4), (7, 5)]);

        assert!(a.merge(&gap).is_none(), "one-cell gap is not a join");
        assert!(a.merge(&other_axis).is_none());
        assert!(a.merge(&other_player).is_none());
        assert!(a.merge(&a).is_none());
    }

    #[test]
    fn test_blocked_by_edge_and_opponent() {
        let mut grid = Grid::new();
        for c in 0..3 {
            grid.place_stone(Pos::new(7, c), Stone::Black);
        }
        let seq = run(Stone::Black, Axis::Horizontal, &[(7, 0), (7, 1), (7, 2)]);
        assert!(seq.is_bottom_blocked(&grid, None), "left edge");
        assert!(!seq.is_top_blocked(&grid, None));
        assert_eq!(seq.count_blocked(&grid, None), 1);

        // Opponent two cells past the top end is still within reach (5 - 3 = 2)
        grid.place_stone(Pos::new(7, 4), Stone::White);
        assert!(seq.is_top_blocked(&grid, None));
        assert_eq!(seq.count_blocked(&grid, None), 2);
        assert!(!seq.is_top_blocked(&grid, Some(1)));
    }

    #[test]
    fn test_own_stones_do_not_block() {
        let mut grid = Grid::new();
        grid.place_stone(Pos::new(7, 7), Stone::Black);
        grid.place_stone(Pos::new(7, 9), Stone::Black);
        let seq = run(Stone::Black, Axis::Horizontal, &[(7, 7)]);
        assert_eq!(seq.count_blocked(&grid, None), 0);
    }

    #[test]
    fn test_near_merge() {
        let mut grid = Grid::new();
        // O O _ O : the pair can join the single stone to the right
        for c in [4, 5, 7] {
            grid.place_stone(Pos::new(7, c), Stone::Black);
        }
        let pair = run(Stone::Black, Axis::Horizontal, &[(7, 4), (7, 5)]);
        assert!(pair.is_top_near_merge(&grid, None));
        assert!(!pair.is_bottom_near_merge(&grid, None));
        assert_eq!(pair.count_near_merge(&grid, None), 1);

        // A blocked end never counts as a near merge
        let mut blocked = grid;
        blocked.place_stone(Pos::new(7, 6), Stone::White);
        assert_eq!(pair.count_near_merge(&blocked, None), 0);
    }

    #[test]
    fn test_win_length_has_no_reach() {
        let grid = Grid::new();
        let five = run(
            Stone::Black,
            Axis::Vertical,
            &[(0, 3), (1, 3), (2, 3), (3, 3), (4, 3)],
        );
        assert_eq!(five.count_blocked(&grid, None), 0);
        assert_eq!(five.count_near_merge(&grid, None), 0);
    }
}
