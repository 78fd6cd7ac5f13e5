use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::eval::EvalError;
use crate::rng::RngError;
use crate::state::{DecisionId, TokenId, ZoneId};

/// Faults raised by the effect interpreter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Rng(#[from] RngError),

    /// chooseN declared both or neither of `n` and `max`, a negative or
    /// unsafe bound, or `min > max`.
    #[error("invalid chooseN cardinality ({context})")]
    InvalidCardinality { context: ErrorContext },

    #[error("decision `{decision}` is unanswered")]
    MissingDecision {
        decision: DecisionId,
        context: ErrorContext,
    },

    #[error("invalid selection for `{decision}` ({context})")]
    InvalidSelection {
        decision: DecisionId,
        context: ErrorContext,
    },

    /// Choice options must have a scalar encoding.
    #[error("choice options are not encodable ({context})")]
    OptionNotEncodable { context: ErrorContext },

    #[error("token {token} not found")]
    TokenNotFound { token: TokenId, context: ErrorContext },

    #[error("zone `{to}` is not adjacent to `{from}`")]
    NotAdjacent {
        from: ZoneId,
        to: ZoneId,
        context: ErrorContext,
    },

    #[error("marker `{marker}` has no state `{state}`")]
    InvalidMarkerState {
        marker: String,
        state: String,
        context: ErrorContext,
    },

    #[error("interrupt stack is empty")]
    EmptyInterruptStack { context: ErrorContext },
}

impl EffectError {
    pub(crate) fn cardinality(effect: &str, message: impl Into<String>) -> Self {
        Self::InvalidCardinality {
            context: ErrorContext::new()
                .with_effect(effect)
                .with_message(message),
        }
    }

    pub(crate) fn invalid_selection(decision: &DecisionId, message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            decision: decision.clone(),
            context: ErrorContext::new()
                .with_field(decision.as_str())
                .with_message(message),
        }
    }

    pub(crate) fn token_not_found(token: TokenId, effect: &str) -> Self {
        Self::TokenNotFound {
            token,
            context: ErrorContext::new().with_effect(effect).with_value(token),
        }
    }
}

impl GameError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Eval(e) => e.severity(),
            Self::Rng(e) => e.severity(),
            Self::InvalidCardinality { .. }
            | Self::MissingDecision { .. }
            | Self::InvalidSelection { .. }
            | Self::OptionNotEncodable { .. }
            | Self::InvalidMarkerState { .. } => ErrorSeverity::Validation,
            Self::TokenNotFound { .. } | Self::NotAdjacent { .. } => ErrorSeverity::Recoverable,
            Self::EmptyInterruptStack { .. } => ErrorSeverity::Internal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Eval(e) => e.context(),
            Self::Rng(e) => e.context(),
            Self::InvalidCardinality { context }
            | Self::MissingDecision { context, .. }
            | Self::InvalidSelection { context, .. }
            | Self::OptionNotEncodable { context }
            | Self::TokenNotFound { context, .. }
            | Self::NotAdjacent { context, .. }
            | Self::InvalidMarkerState { context, .. }
            | Self::EmptyInterruptStack { context } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Eval(e) => e.error_code(),
            Self::Rng(e) => e.error_code(),
            Self::InvalidCardinality { .. } => "EFFECT_INVALID_CARDINALITY",
            Self::MissingDecision { .. } => "EFFECT_MISSING_DECISION",
            Self::InvalidSelection { .. } => "EFFECT_INVALID_SELECTION",
            Self::OptionNotEncodable { .. } => "EFFECT_OPTION_NOT_ENCODABLE",
            Self::TokenNotFound { .. } => "EFFECT_TOKEN_NOT_FOUND",
            Self::NotAdjacent { .. } => "EFFECT_NOT_ADJACENT",
            Self::InvalidMarkerState { .. } => "EFFECT_INVALID_MARKER_STATE",
            Self::EmptyInterruptStack { .. } => "EFFECT_EMPTY_INTERRUPT_STACK",
        }
    }
}
