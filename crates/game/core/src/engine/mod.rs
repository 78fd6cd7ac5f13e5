//! Public orchestration surface.
//!
//! Everything a driver needs to run a game: build the opening state,
//! enumerate legal moves, resolve template decisions, apply moves and detect
//! the end of the game. All entry points are pure functions of
//! `(def, state, input, config)`; the input state is never mutated.

mod apply;
mod enumerate;
mod errors;
mod setup;
mod terminal;

pub use apply::{ApplyMoveResult, advance_phase, apply_move};
pub use enumerate::legal_moves;
pub use errors::{MoveError, SetupError};
pub use setup::initial_state;
pub use terminal::{RankEntry, TerminalResult, terminal_result};

pub use crate::choice::legal_choices_evaluate;
