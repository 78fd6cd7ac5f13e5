//! Deterministic declarative rule-execution kernel.
//!
//! `game-kernel` runs games described entirely by data. Given a static
//! [`GameDef`] and a [`GameState`], it enumerates legal moves, resolves
//! multi-step decisions, applies moves and fires cascading triggers. Every
//! operation is a pure function: the same seed and move sequence reproduce
//! the same [`StateHash`] on every host.
//!
//! The public entry points live in [`engine`]; the supporting layers
//! (evaluator, queries, effect interpreter, choice resolution, triggers and
//! turn flow) are exposed for tools and tests.
pub mod choice;
pub mod codec;
pub mod config;
pub mod def;
pub mod effect;
pub mod engine;
pub mod error;
pub mod eval;
pub mod moves;
pub mod query;
pub mod rng;
pub mod state;
pub mod trigger;
pub mod turn;
pub mod value;
pub mod warning;

pub use choice::{
    ChoiceError, ChoiceRequest, IllegalReason, LegalityOutcome, LegalityView, OptionLegality,
    PendingChoice, Resolution, apply_legality_precedence, complete_template_move,
    resolve_move_decisions,
};
pub use codec::{CodecError, deserialize_game_state, serialize_game_state};
pub use config::KernelConfig;
pub use def::GameDef;
pub use effect::{DecisionKind, Effect, EffectError, PendingDecision};
pub use engine::{
    ApplyMoveResult, MoveError, RankEntry, SetupError, TerminalResult, advance_phase, apply_move,
    initial_state, legal_choices_evaluate, legal_moves, terminal_result,
};
pub use error::{ErrorContext, ErrorSeverity, GameError, KernelError};
pub use eval::EvalError;
pub use moves::{Move, MoveParam};
pub use rng::{Rng, RngError};
pub use state::{GameState, PlayerId, StateHash};
pub use trigger::{KernelEvent, TriggerFiring};
pub use value::Value;
pub use warning::Warning;
