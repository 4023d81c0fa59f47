//! Game state management for the Gomoku GUI

use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::handlers::MarkHandlers;
use crate::sequence::Sequence;
use crate::{AIEngine, BoardState, EngineConfig, GameMode, MoveResult, Pos};

/// AI computation state
pub enum AiState {
    Idle,
    Thinking {
        receiver: Receiver<MoveResult>,
        start_time: Instant,
    },
}

/// Move timer for tracking thinking time
pub struct MoveTimer {
    pub start_time: Option<Instant>,
    pub last_move_duration: Option<Duration>,
    pub ai_thinking_time: Option<Duration>,
}

impl Default for MoveTimer {
    fn default() -> Self {
        Self {
            start_time: Some(Instant::now()),
            last_move_duration: None,
            ai_thinking_time: None,
        }
    }
}

impl MoveTimer {
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn stop(&mut self) -> Duration {
        let duration = self.elapsed();
        self.last_move_duration = Some(duration);
        self.start_time = None;
        duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn set_ai_time(&mut self, duration: Duration) {
        self.ai_thinking_time = Some(duration);
    }
}

/// Main game state
pub struct GameState {
    /// Current position, including its annotation
    pub state: Arc<BoardState>,
    pub mode: GameMode,
    pub last_ai_result: Option<MoveResult>,
    pub ai_state: AiState,
    pub move_timer: MoveTimer,
    /// Transient warning, cleared by the next move
    pub message: Option<String>,

    engine_config: EngineConfig,
    handlers: MarkHandlers,
}

impl GameState {
    pub fn new(mode: GameMode, engine_config: EngineConfig) -> Self {
        Self {
            state: BoardState::new(),
            mode,
            last_ai_result: None,
            ai_state: AiState::Idle,
            move_timer: MoveTimer::default(),
            message: None,
            engine_config,
            handlers: MarkHandlers::default(),
        }
    }

    pub fn reset(&mut self) {
        self.state = BoardState::new();
        self.last_ai_result = None;
        self.ai_state = AiState::Idle;
        self.move_timer = MoveTimer::default();
        self.message = None;
    }

    /// Start over in another mode
    pub fn restart(&mut self, mode: GameMode) {
        self.mode = mode;
        self.reset();
    }

    pub fn is_game_over(&self) -> bool {
        self.state.finished()
    }

    /// The five that ended the game, if any
    pub fn winning_sequence(&self) -> Option<Arc<Sequence>> {
        self.state.check_won(None)
    }

    /// Check if it's the human's turn
    pub fn is_human_turn(&self) -> bool {
        !self.mode.is_computer(self.state.active_player())
    }

    /// Check if it's the AI's turn
    pub fn is_ai_turn(&self) -> bool {
        self.mode.is_computer(self.state.active_player())
    }

    /// Check if AI is currently thinking
    pub fn is_ai_thinking(&self) -> bool {
        matches!(self.ai_state, AiState::Thinking { .. })
    }

    /// Attempt to place the human's stone at the given position
    pub fn try_place_stone(&mut self, pos: Pos) -> Result<(), String> {
        if self.is_game_over() {
            return Err("Game is over".to_string());
        }
        if self.is_ai_thinking() {
            return Err("AI is thinking".to_string());
        }
        if !self.is_human_turn() {
            return Err("Not your turn".to_string());
        }

        let next = self
            .state
            .mark_pos(pos)
            .map_err(|e| e.to_string())?;
        self.apply(next, pos);
        Ok(())
    }

    /// Adopt a successor position and run the mark handlers on it
    fn apply(&mut self, next: Arc<BoardState>, pos: Pos) {
        self.move_timer.stop();
        self.state = self.handlers.dispatch(next, pos);
        self.message = None;
        if !self.is_game_over() {
            self.move_timer.start();
        }
    }

    /// Start AI thinking
    pub fn start_ai_thinking(&mut self) {
        if !self.is_ai_turn() || self.is_ai_thinking() || self.is_game_over() {
            return;
        }

        let state = Arc::clone(&self.state);
        let config = self.engine_config.clone();
        let (tx, rx) = channel();

        thread::spawn(move || {
            let mut engine = AIEngine::new(config);
            let result = engine.choose_move(&state);
            let _ = tx.send(result);
        });

        self.ai_state = AiState::Thinking {
            receiver: rx,
            start_time: Instant::now(),
        };
    }

    /// Check if AI has finished thinking
    pub fn check_ai_result(&mut self) {
        let result = match &self.ai_state {
            AiState::Thinking { receiver, start_time } => match receiver.try_recv() {
                Ok(result) => Some((result, start_time.elapsed())),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    log::error!("AI worker exited without a move");
                    self.ai_state = AiState::Idle;
                    self.message = Some("AI error".to_string());
                    return;
                }
            },
            AiState::Idle => None,
        };

        if let Some((move_result, elapsed)) = result {
            self.ai_state = AiState::Idle;
            self.move_timer.set_ai_time(elapsed);

            match (move_result.best.clone(), move_result.best_move()) {
                (Some(next), Some(mv)) => self.apply(next, mv.pos),
                _ => self.message = Some("AI could not find a move".to_string()),
            }
            self.last_ai_result = Some(move_result);
        }
    }

    /// Get AI thinking elapsed time
    pub fn ai_thinking_elapsed(&self) -> Option<Duration> {
        match &self.ai_state {
            AiState::Thinking { start_time, .. } => Some(start_time.elapsed()),
            AiState::Idle => None,
        }
    }

    /// Take back the human's last turn.
    ///
    /// Against the computer this also removes the computer's reply; between
    /// two humans it removes one move.
    pub fn undo(&mut self) {
        if self.is_ai_thinking() {
            return;
        }
        if self.mode == GameMode::HumanVsHuman {
            if let Some(prev) = self.state.previous_position() {
                self.state = prev;
            }
            return;
        }
        if !self.is_human_turn() {
            self.message = Some("Undo is only available on your turn".to_string());
            return;
        }
        match self.state.undo() {
            Some(prev) => {
                self.state = prev.display("Move undone");
                self.message = None;
                self.move_timer.start();
            }
            None => self.message = Some("Nothing to undo".to_string()),
        }
    }
}
