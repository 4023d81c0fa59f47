//! Stone placement grid

use super::bitboard::Bitboard;
use super::{Pos, Stone};

/// Cell contents of a position, one bitboard per side.
///
/// `Grid` is `Copy`: marking a cell produces a new grid and leaves the
/// original untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Grid {
    /// Black stones bitboard
    pub black: Bitboard,
    /// White stones bitboard
    pub white: Bitboard,
}

impl Grid {
    pub const fn new() -> Self {
        Self {
            black: Bitboard::new(),
            white: Bitboard::new(),
        }
    }

    /// Get stone at position
    #[inline]
    pub fn get(&self, pos: Pos) -> Stone {
        if self.black.get(pos) {
            Stone::Black
        } else if self.white.get(pos) {
            Stone::White
        } else {
            Stone::Empty
        }
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        !self.black.get(pos) && !self.white.get(pos)
    }

    /// True if `(row, col)` is on the board and holds a stone
    #[inline]
    pub fn is_marked(&self, row: i32, col: i32) -> bool {
        Pos::try_new(row, col).is_some_and(|pos| !self.is_empty(pos))
    }

    /// True if `(row, col)` is on the board and holds a stone of `player`
    #[inline]
    pub fn is_marked_by(&self, row: i32, col: i32, player: Stone) -> bool {
        player != Stone::Empty && Pos::try_new(row, col).is_some_and(|pos| self.get(pos) == player)
    }

    /// Copy of this grid with `stone` placed at `pos`
    #[inline]
    #[must_use]
    pub fn with_stone(mut self, pos: Pos, stone: Stone) -> Self {
        self.place_stone(pos, stone);
        self
    }

    /// Place a stone in place. Used while building grids for tests and rescans.
    #[inline]
    pub fn place_stone(&mut self, pos: Pos, stone: Stone) {
        match stone {
            Stone::Black => self.black.set(pos),
            Stone::White => self.white.set(pos),
            Stone::Empty => {
                self.black.clear(pos);
                self.white.clear(pos);
            }
        }
    }

    /// Total stones on board
    #[inline]
    pub fn stone_count(&self) -> u32 {
        self.black.count() + self.white.count()
    }

    #[inline]
    pub fn is_board_empty(&self) -> bool {
        self.black.is_empty() && self.white.is_empty()
    }

    /// Every occupied cell with its owner, black stones first
    pub fn occupied(&self) -> impl Iterator<Item = (Pos, Stone)> + '_ {
        self.black
            .iter_ones()
            .map(|p| (p, Stone::Black))
            .chain(self.white.iter_ones().map(|p| (p, Stone::White)))
    }
}
