use crate::effect::EffectError;
use crate::error::{ErrorContext, ErrorSeverity, GameError};
use crate::eval::EvalError;
use crate::rng::RngError;
use crate::state::ActionId;

/// Faults raised while resolving a move's decisions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChoiceError {
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Rng(#[from] RngError),

    #[error("unknown action `{action}`")]
    UnknownAction {
        action: ActionId,
        context: ErrorContext,
    },

    /// The decision loop did not converge within `max_choice_steps`.
    #[error("choice loop exceeded {steps} steps ({context})")]
    StepBudgetExceeded { steps: u32, context: ErrorContext },
}

impl ChoiceError {
    pub(crate) fn unknown_action(action: &ActionId) -> Self {
        Self::UnknownAction {
            action: action.clone(),
            context: ErrorContext::new().with_value(action),
        }
    }
}

impl GameError for ChoiceError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Effect(e) => e.severity(),
            Self::Eval(e) => e.severity(),
            Self::Rng(e) => e.severity(),
            Self::UnknownAction { .. } => ErrorSeverity::Validation,
            Self::StepBudgetExceeded { .. } => ErrorSeverity::Fatal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Effect(e) => e.context(),
            Self::Eval(e) => e.context(),
            Self::Rng(e) => e.context(),
            Self::UnknownAction { context, .. } | Self::StepBudgetExceeded { context, .. } => {
                Some(context)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Effect(e) => e.error_code(),
            Self::Eval(e) => e.error_code(),
            Self::Rng(e) => e.error_code(),
            Self::UnknownAction { .. } => "CHOICE_UNKNOWN_ACTION",
            Self::StepBudgetExceeded { .. } => "CHOICE_STEP_BUDGET_EXCEEDED",
        }
    }
}
