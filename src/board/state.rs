//! Immutable game positions linked into a history chain

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Grid, Pos, Stone, BOARD_SIZE, TOTAL_CELLS, WINNING_CONDITION};
use crate::error::GameError;
use crate::sequence::{Move, Sequence, SequenceIndex};

/// A snapshot of the game.
///
/// States are never mutated. [`BoardState::mark`] and
/// [`BoardState::display`] return a new state whose parent is the state
/// they were called on, so every position keeps its full history for undo.
/// States are handed around as `Arc<BoardState>` and shared freely between
/// search threads.
pub struct BoardState {
    grid: Grid,
    /// Side to move
    active: Stone,
    move_count: usize,
    last_move: Option<Move>,
    parent: Option<Arc<BoardState>>,
    sequences: SequenceIndex,
    started_at: Instant,
    annotation: Option<String>,
}

impl BoardState {
    /// Empty board with Black to move
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            grid: Grid::new(),
            active: Stone::Black,
            move_count: 0,
            last_move: None,
            parent: None,
            sequences: SequenceIndex::new(),
            started_at: Instant::now(),
            annotation: None,
        })
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Player whose turn it is
    #[inline]
    pub fn active_player(&self) -> Stone {
        self.active
    }

    /// Player who moves after the active one
    #[inline]
    pub fn next_player(&self) -> Stone {
        self.active.opponent()
    }

    #[inline]
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<BoardState>> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn sequences(&self) -> &SequenceIndex {
        &self.sequences
    }

    #[inline]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the game started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Status text attached with [`BoardState::display`]
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    #[inline]
    pub fn is_marked(&self, row: i32, col: i32) -> bool {
        self.grid.is_marked(row, col)
    }

    #[inline]
    pub fn is_marked_by(&self, row: i32, col: i32, player: Stone) -> bool {
        self.grid.is_marked_by(row, col, player)
    }

    /// Place the active player's stone at `(row, col)`.
    ///
    /// On error the receiver is untouched and remains the current position.
    pub fn mark(self: &Arc<Self>, row: i32, col: i32) -> Result<Arc<Self>, GameError> {
        let pos = Pos::try_new(row, col).ok_or(GameError::InvalidLocation { row, col })?;
        self.mark_pos(pos)
    }

    /// [`BoardState::mark`] for an on-board position
    pub fn mark_pos(self: &Arc<Self>, pos: Pos) -> Result<Arc<Self>, GameError> {
        if !self.grid.is_empty(pos) {
            return Err(GameError::AlreadyMarked {
                row: i32::from(pos.row),
                col: i32::from(pos.col),
            });
        }
        let mv = Move::at(pos, self.active);
        Ok(Arc::new(Self {
            grid: self.grid.with_stone(pos, self.active),
            active: self.active.opponent(),
            move_count: self.move_count + 1,
            last_move: Some(mv),
            parent: Some(Arc::clone(self)),
            sequences: self.sequences.append(mv),
            started_at: self.started_at,
            annotation: self.annotation.clone(),
        }))
    }

    /// Same position with `message` attached; does not count as a move
    pub fn display(self: &Arc<Self>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            grid: self.grid,
            active: self.active,
            move_count: self.move_count,
            last_move: self.last_move,
            parent: Some(Arc::clone(self)),
            sequences: self.sequences.clone(),
            started_at: self.started_at,
            annotation: Some(message.into()),
        })
    }

    /// Won by either side, or a full board
    pub fn finished(&self) -> bool {
        self.check_won(None).is_some() || self.move_count == TOTAL_CELLS
    }

    /// Longest sequence on the board, optionally for one player only
    pub fn check_max_sequence(&self, player: Option<Stone>) -> Option<Arc<Sequence>> {
        match player {
            Some(p) => self.sequences.get_by_player(p).longest().cloned(),
            None => self.sequences.longest().cloned(),
        }
    }

    /// Winning sequence, if any; its player is the winner
    pub fn check_won(&self, player: Option<Stone>) -> Option<Arc<Sequence>> {
        self.check_max_sequence(player)
            .filter(|s| s.len() >= WINNING_CONDITION)
    }

    /// Winner of the game, if any
    pub fn winner(&self) -> Option<Stone> {
        self.check_won(None).map(|s| s.player())
    }

    /// Longest sequence through `pos`
    pub fn max_sequence_at(&self, pos: Pos, player: Option<Stone>) -> Option<Arc<Sequence>> {
        let at = self.sequences.get_by_position(pos);
        match player {
            Some(p) => at.get_by_player(p).longest().cloned(),
            None => at.longest().cloned(),
        }
    }

    /// Whether a winning run passes through `pos`
    pub fn won_at(&self, pos: Pos, player: Option<Stone>) -> bool {
        self.max_sequence_at(pos, player)
            .is_some_and(|s| s.len() >= WINNING_CONDITION)
    }

    /// Number of sequences of exactly `length`, optionally for one player
    pub fn count_sequences(&self, length: usize, player: Option<Stone>) -> usize {
        let by_length = self.sequences.get_by_length(length);
        match player {
            Some(p) => by_length.get_by_player(p).len(),
            None => by_length.len(),
        }
    }

    /// The position before the most recent move, skipping annotation-only states
    pub fn previous_position(&self) -> Option<Arc<BoardState>> {
        let mut cursor = self.parent.clone();
        while let Some(state) = cursor {
            if state.move_count < self.move_count {
                return Some(state);
            }
            cursor = state.parent.clone();
        }
        None
    }

    /// Rewind to the position before the active player's most recent turn.
    ///
    /// Returns `None` when the active player has not moved yet.
    pub fn undo(&self) -> Option<Arc<BoardState>> {
        let mut state = self.previous_position()?;
        while state.active != self.active {
            state = state.previous_position()?;
        }
        Some(state)
    }
}

impl fmt::Debug for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardState")
            .field("active", &self.active)
            .field("move_count", &self.move_count)
            .field("last_move", &self.last_move)
            .field("sequences", &self.sequences.len())
            .field("annotation", &self.annotation)
            .finish()
    }
}

/// Text diagram: `+` empty, `X` Black, `O` White
impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..BOARD_SIZE {
            write!(f, "{:>2}", col)?;
        }
        writeln!(f)?;
        for row in 0..BOARD_SIZE {
            write!(f, "{:>2} ", row)?;
            for col in 0..BOARD_SIZE {
                let c = match self.grid.get(Pos::new(row as u8, col as u8)) {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    Stone::Empty => '+',
                };
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
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
    fn test_initial_state() {
        let state = BoardState::new();
        assert_eq!(state.move_count(), 0);
        assert_eq!(state.active_player(), Stone::Black);
        assert!(state.parent().is_none());
        assert!(state.last_move().is_none());
        assert!(!state.finished());
        assert!(state.check_won(None).is_none());
    }

    #[test]
    fn test_mark_advances_state() {
        let root = BoardState::new();
        let next = root.mark(7, 7).unwrap();
        assert_eq!(next.move_count(), 1);
        assert_eq!(next.active_player(), Stone::White);
        assert_eq!(next.last_move(), Some(Move::new(7, 7, Stone::Black)));
        assert!(next.is_marked_by(7, 7, Stone::Black));
        assert!(Arc::ptr_eq(next.parent().unwrap(), &root));
        assert_eq!(next.started_at(), root.started_at());
        // The parent is untouched
        assert!(!root.is_marked(7, 7));
        assert_eq!(root.sequences().len(), 0);
    }

    #[test]
    fn test_mark_occupied_fails() {
        let state = play(&[(7, 7)]);
        let err = state.mark(7, 7).unwrap_err();
        assert_eq!(err, GameError::AlreadyMarked { row: 7, col: 7 });
        assert_eq!(state.move_count(), 1);
        assert_eq!(state.active_player(), Stone::White);
    }

    #[test]
    fn test_mark_out_of_bounds_fails() {
        let state = BoardState::new();
        for (r, c) in [(-1, 0), (0, -1), (15, 0), (0, 15), (20, 20)] {
            assert_eq!(
                state.mark(r, c).unwrap_err(),
                GameError::InvalidLocation { row: r, col: c }
            );
        }
        assert_eq!(state.move_count(), 0);
    }

    #[test]
    fn test_win_detection() {
        // Black on row 7 cols 3..=7, White answers on row 0
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6), (7, 7)]);
        assert!(state.finished());
        let won = state.check_won(None).expect("five in a row");
        assert_eq!(won.player(), Stone::Black);
        assert!(won.len() >= WINNING_CONDITION);
        assert_eq!(state.winner(), Some(Stone::Black));
        assert!(state.check_won(Some(Stone::White)).is_none());
        assert!(state.won_at(Pos::new(7, 5), None));
        assert!(!state.won_at(Pos::new(0, 0), None));
    }

    #[test]
    fn test_four_is_not_a_win() {
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6)]);
        assert!(!state.finished());
        assert_eq!(state.check_max_sequence(Some(Stone::Black)).unwrap().len(), 4);
        assert_eq!(state.count_sequences(4, Some(Stone::Black)), 1);
        assert_eq!(state.count_sequences(4, Some(Stone::White)), 0);
    }

    /// Full-board pattern without five in a row: pairs of columns alternate
    /// color and odd rows are shifted by two. Black gets 113 cells.
    fn drawn_stone(row: usize, col: usize) -> Stone {
        let shift = if row % 2 == 0 { 0 } else { 2 };
        if ((col + shift) / 2) % 2 == 0 {
            Stone::Black
        } else {
            Stone::White
        }
    }

    #[test]
    fn test_full_board_draw() {
        let cells = |player: Stone| -> Vec<Pos> {
            (0..TOTAL_CELLS)
                .map(Pos::from_index)
                .filter(|p| drawn_stone(p.row as usize, p.col as usize) == player)
                .collect()
        };
        let blacks = cells(Stone::Black);
        let whites = cells(Stone::White);
        assert_eq!(blacks.len(), 113);
        assert_eq!(whites.len(), 112);

        let mut state = BoardState::new();
        for (i, pos) in blacks.iter().enumerate() {
            state = state.mark_pos(*pos).unwrap();
            if let Some(w) = whites.get(i) {
                state = state.mark_pos(*w).unwrap();
            }
        }

        assert_eq!(state.move_count(), TOTAL_CELLS);
        assert!(state.check_won(None).is_none());
        assert!(state.finished());
        assert!(state.get_next_states().next().is_none());
    }

    #[test]
    fn test_display_annotates_only() {
        let state = play(&[(7, 7)]);
        let shown = state.display("hello");
        assert_eq!(shown.annotation(), Some("hello"));
        assert_eq!(shown.move_count(), state.move_count());
        assert_eq!(shown.active_player(), state.active_player());
        assert_eq!(shown.last_move(), state.last_move());
        assert_eq!(shown.grid(), state.grid());
        assert!(Arc::ptr_eq(shown.parent().unwrap(), &state));
        assert!(state.annotation().is_none());
    }

    #[test]
    fn test_undo_rewinds_to_own_turn() {
        let state = play(&[(7, 7), (7, 8), (8, 8), (6, 6)]);
        // Black to move; undo returns to before Black's (8,8)
        let shown = state.display("computer moved");
        let back = shown.undo().unwrap();
        assert_eq!(back.move_count(), 2);
        assert_eq!(back.active_player(), Stone::Black);
        assert!(!back.is_marked(8, 8));
        assert!(back.is_marked(7, 8));
    }

    #[test]
    fn test_undo_without_history() {
        assert!(BoardState::new().undo().is_none());
        // White has not moved yet
        assert!(play(&[(7, 7)]).undo().is_none());
    }

    #[test]
    fn test_previous_position_skips_annotations() {
        let state = play(&[(7, 7), (7, 8)]).display("a").display("b");
        let prev = state.previous_position().unwrap();
        assert_eq!(prev.move_count(), 1);
    }

    #[test]
    fn test_text_diagram() {
        let state = play(&[(0, 0), (0, 1)]);
        let text = state.to_string();
        let first_row = text.lines().nth(1).unwrap();
        assert!(first_row.starts_with(" 0  X O +"));
    }
}
