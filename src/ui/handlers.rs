//! Reactions to a stone being placed
//!
//! Handlers run in registration order. Each one receives the position the
//! previous one produced and returns a [`Flow`]; a handler that sets
//! `proceed: false` ends the chain with its state.

use std::sync::Arc;

use crate::board::{BoardState, Pos};

/// Output of a handler
pub struct Flow {
    pub state: Arc<BoardState>,
    pub proceed: bool,
}

impl Flow {
    pub fn proceed(state: Arc<BoardState>) -> Self {
        Self { state, proceed: true }
    }

    pub fn stop(state: Arc<BoardState>) -> Self {
        Self { state, proceed: false }
    }
}

type Handler = Box<dyn Fn(Arc<BoardState>, Pos) -> Flow + Send>;

/// Ordered handlers for the mark event
pub struct MarkHandlers {
    handlers: Vec<Handler>,
}

impl Default for MarkHandlers {
    fn default() -> Self {
        let mut handlers = Self::new();
        handlers.on(check_won);
        handlers.on(check_draw);
        handlers.on(announce_turn);
        handlers
    }
}

impl MarkHandlers {
    /// Empty chain
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn on<F>(&mut self, handler: F)
    where
        F: Fn(Arc<BoardState>, Pos) -> Flow + Send + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the chain for a stone just placed at `pos`
    pub fn dispatch(&self, state: Arc<BoardState>, pos: Pos) -> Arc<BoardState> {
        let mut state = state;
        for handler in &self.handlers {
            let flow = handler(state, pos);
            state = flow.state;
            if !flow.proceed {
                break;
            }
        }
        state
    }
}

/// Announce the winner when the stone at `pos` completes five
pub fn check_won(state: Arc<BoardState>, pos: Pos) -> Flow {
    match state.max_sequence_at(pos, None) {
        Some(seq) if state.won_at(pos, None) => {
            let message = format!("The player {} won", seq.player().name());
            log::info!("{} after {} moves", message, state.move_count());
            Flow::stop(state.display(message))
        }
        _ => Flow::proceed(state),
    }
}

/// Announce a full board without a winner
pub fn check_draw(state: Arc<BoardState>, _pos: Pos) -> Flow {
    if state.finished() && state.winner().is_none() {
        log::info!("draw after {} moves", state.move_count());
        return Flow::stop(state.display("Draw: the board is full"));
    }
    Flow::proceed(state)
}

/// Note whose turn it is next
pub fn announce_turn(state: Arc<BoardState>, pos: Pos) -> Flow {
    let message = format!(
        "{} played {}; {} to move",
        state.next_player().name(),
        pos,
        state.active_player().name()
    );
    Flow::proceed(state.display(message))
}
