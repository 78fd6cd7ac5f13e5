//! Error types for setup and move application.

use crate::choice::{ChoiceError, LegalityOutcome};
use crate::codec::CodecError;
use crate::effect::EffectError;
use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::eval::EvalError;
use crate::state::{ActionId, DecisionId, PlayerId};

/// Errors surfaced while enumerating or applying moves.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("unknown action `{action}`")]
    UnknownAction {
        action: ActionId,
        context: ErrorContext,
    },

    /// The move fails one of the legality checks.
    #[error("illegal move: {} ({context})", .outcome.view().choice_reason)]
    Illegal {
        outcome: LegalityOutcome,
        context: ErrorContext,
    },

    #[error("move leaves decision `{decision}` unanswered")]
    IncompleteMove {
        decision: DecisionId,
        context: ErrorContext,
    },

    #[error("no free-operation grant lets {player} take `{action}`")]
    NoFreeOperationGrant {
        player: PlayerId,
        action: ActionId,
        context: ErrorContext,
    },

    #[error("move enumeration exceeded {limit} templates")]
    TemplateBudgetExceeded { limit: u32, context: ErrorContext },

    #[error("move enumeration exceeded {limit} parameter expansions")]
    ParamExpansionBudgetExceeded { limit: u32, context: ErrorContext },

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Choice(#[from] ChoiceError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl MoveError {
    pub(crate) fn unknown_action(action: &ActionId) -> Self {
        Self::UnknownAction {
            action: action.clone(),
            context: ErrorContext::new().with_value(action),
        }
    }

    pub(crate) fn illegal(outcome: LegalityOutcome, action: &ActionId) -> Self {
        Self::Illegal {
            outcome,
            context: ErrorContext::new().with_field(action.as_str()),
        }
    }

    pub(crate) fn incomplete(decision: DecisionId, action: &ActionId) -> Self {
        Self::IncompleteMove {
            context: ErrorContext::new()
                .with_field(decision.as_str())
                .with_value(action),
            decision,
        }
    }
}

impl GameError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownAction { .. }
            | Self::Illegal { .. }
            | Self::IncompleteMove { .. }
            | Self::NoFreeOperationGrant { .. } => ErrorSeverity::Validation,
            Self::TemplateBudgetExceeded { .. } | Self::ParamExpansionBudgetExceeded { .. } => {
                ErrorSeverity::Fatal
            }
            Self::Effect(e) => e.severity(),
            Self::Choice(e) => e.severity(),
            Self::Eval(e) => e.severity(),
            Self::Codec(e) => e.severity(),
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::UnknownAction { context, .. }
            | Self::Illegal { context, .. }
            | Self::IncompleteMove { context, .. }
            | Self::NoFreeOperationGrant { context, .. }
            | Self::TemplateBudgetExceeded { context, .. }
            | Self::ParamExpansionBudgetExceeded { context, .. } => Some(context),
            Self::Effect(e) => e.context(),
            Self::Choice(e) => e.context(),
            Self::Eval(e) => e.context(),
            Self::Codec(e) => e.context(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "MOVE_UNKNOWN_ACTION",
            Self::Illegal { outcome, .. } => outcome.view().error_code,
            Self::IncompleteMove { .. } => "MOVE_INCOMPLETE",
            Self::NoFreeOperationGrant { .. } => "MOVE_NO_FREE_OPERATION_GRANT",
            Self::TemplateBudgetExceeded { .. } => "MOVE_TEMPLATE_BUDGET_EXCEEDED",
            Self::ParamExpansionBudgetExceeded { .. } => "MOVE_PARAM_EXPANSION_BUDGET_EXCEEDED",
            Self::Effect(e) => e.error_code(),
            Self::Choice(e) => e.error_code(),
            Self::Eval(e) => e.error_code(),
            Self::Codec(e) => e.error_code(),
        }
    }
}

/// Errors raised while building the initial state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("player count {count} outside {min}..={max}")]
    PlayerCount { count: u32, min: u32, max: u32 },

    #[error("turn structure declares no phases")]
    NoPhases,

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl GameError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PlayerCount { .. } | Self::NoPhases => ErrorSeverity::Validation,
            Self::Effect(e) => e.severity(),
            Self::Codec(e) => e.severity(),
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::PlayerCount { .. } | Self::NoPhases => None,
            Self::Effect(e) => e.context(),
            Self::Codec(e) => e.context(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PlayerCount { .. } => "SETUP_PLAYER_COUNT",
            Self::NoPhases => "SETUP_NO_PHASES",
            Self::Effect(e) => e.error_code(),
            Self::Codec(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_moves_report_the_outcome_code() {
        let err = MoveError::illegal(LegalityOutcome::ActionLimitExceeded, &ActionId::new("rally"));
        assert_eq!(err.error_code(), "MOVE_ACTION_LIMIT_EXCEEDED");
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.to_string(), "illegal move: actionLimitExceeded (field=rally)");
    }

    #[test]
    fn budgets_are_fatal() {
        let err = MoveError::TemplateBudgetExceeded {
            limit: 4,
            context: ErrorContext::new(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
    }
}
