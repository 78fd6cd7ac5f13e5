use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::state::TokenId;

/// Faults raised while evaluating expressions, conditions and queries.
///
/// Most variants are recoverable: the choice layer prunes the decision path
/// that raised them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// Operand of the wrong type, unsafe integer, or non-homogeneous predicate set.
    #[error("type mismatch ({context})")]
    TypeMismatch { context: ErrorContext },

    #[error("division by zero ({context})")]
    DivisionByZero { context: ErrorContext },

    #[error("missing binding `{name}`")]
    MissingBinding { name: String, context: ErrorContext },

    #[error("missing variable `{name}`")]
    MissingVariable { name: String, context: ErrorContext },

    #[error("unknown zone `{zone}`")]
    UnknownZone { zone: String, context: ErrorContext },

    #[error("unknown table `{table}`")]
    UnknownTable { table: String, context: ErrorContext },

    #[error("unknown marker `{marker}`")]
    UnknownMarker { marker: String, context: ErrorContext },

    #[error("token {token} not found")]
    TokenNotFound { token: TokenId, context: ErrorContext },

    /// `min`/`max` aggregate over zero items.
    #[error("{op} over an empty sequence")]
    EmptyAggregate {
        op: &'static str,
        context: ErrorContext,
    },

    /// A single-player selector resolved to zero or several players.
    #[error("player selector resolved to {count} players")]
    AmbiguousPlayer { count: usize, context: ErrorContext },

    #[error("player {player} out of range")]
    InvalidPlayer { player: i64, context: ErrorContext },

    /// A range query would produce more than `limit` items.
    #[error("query exceeds {limit} items ({context})")]
    QueryBudgetExceeded { limit: u32, context: ErrorContext },
}

impl EvalError {
    pub fn type_mismatch(field: impl Into<String>, value: impl ToString) -> Self {
        Self::TypeMismatch {
            context: ErrorContext::new().with_field(field).with_value(value),
        }
    }

    pub fn missing_binding(name: &str) -> Self {
        Self::MissingBinding {
            name: name.to_owned(),
            context: ErrorContext::new().with_field(name),
        }
    }

    pub fn missing_variable(name: &str) -> Self {
        Self::MissingVariable {
            name: name.to_owned(),
            context: ErrorContext::new().with_field(name),
        }
    }

    pub fn unknown_zone(zone: &str) -> Self {
        Self::UnknownZone {
            zone: zone.to_owned(),
            context: ErrorContext::new().with_value(zone),
        }
    }
}

impl GameError for EvalError {
    fn severity(&self) -> ErrorSeverity {
        use EvalError::*;
        match self {
            TypeMismatch { .. } | DivisionByZero { .. } | EmptyAggregate { .. } => {
                ErrorSeverity::Recoverable
            }
            MissingBinding { .. } | MissingVariable { .. } | TokenNotFound { .. } => {
                ErrorSeverity::Recoverable
            }
            UnknownZone { .. } | InvalidPlayer { .. } => ErrorSeverity::Recoverable,
            UnknownTable { .. } | UnknownMarker { .. } => ErrorSeverity::Validation,
            AmbiguousPlayer { .. } => ErrorSeverity::Validation,
            QueryBudgetExceeded { .. } => ErrorSeverity::Fatal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        use EvalError::*;
        match self {
            TypeMismatch { context }
            | DivisionByZero { context }
            | MissingBinding { context, .. }
            | MissingVariable { context, .. }
            | UnknownZone { context, .. }
            | UnknownTable { context, .. }
            | UnknownMarker { context, .. }
            | TokenNotFound { context, .. }
            | EmptyAggregate { context, .. }
            | AmbiguousPlayer { context, .. }
            | InvalidPlayer { context, .. }
            | QueryBudgetExceeded { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        use EvalError::*;
        match self {
            TypeMismatch { .. } => "EVAL_TYPE_MISMATCH",
            DivisionByZero { .. } => "EVAL_DIVISION_BY_ZERO",
            MissingBinding { .. } => "EVAL_MISSING_BINDING",
            MissingVariable { .. } => "EVAL_MISSING_VARIABLE",
            UnknownZone { .. } => "EVAL_UNKNOWN_ZONE",
            UnknownTable { .. } => "EVAL_UNKNOWN_TABLE",
            UnknownMarker { .. } => "EVAL_UNKNOWN_MARKER",
            TokenNotFound { .. } => "EVAL_TOKEN_NOT_FOUND",
            EmptyAggregate { .. } => "EVAL_EMPTY_AGGREGATE",
            AmbiguousPlayer { .. } => "EVAL_AMBIGUOUS_PLAYER",
            InvalidPlayer { .. } => "EVAL_INVALID_PLAYER",
            QueryBudgetExceeded { .. } => "EVAL_QUERY_BUDGET_EXCEEDED",
        }
    }
}
