//! Common error infrastructure for the kernel.
//!
//! Domain errors (`EvalError`, `EffectError`, `ChoiceError`, ...) live next to
//! the modules that raise them. This module holds the shared severity
//! classification, the structured [`ErrorContext`] and the [`KernelError`]
//! umbrella returned by the public entry points.
//!
//! # Severity mapping
//!
//! - **Recoverable**: evaluation faults (type mismatch, division by zero,
//!   missing binding). The choice layer prunes the decision path that raised
//!   them; they are only fatal when they escape to a caller.
//! - **Validation**: malformed selectors, malformed cardinality, illegal or
//!   incomplete moves.
//! - **Internal**: runtime contract violations such as popping an empty
//!   interrupt stack.
//! - **Fatal**: exhausted iteration/recursion budgets.

use serde::{Deserialize, Serialize};

use crate::choice::ChoiceError;
use crate::codec::CodecError;
use crate::effect::EffectError;
use crate::engine::{MoveError, SetupError};
use crate::eval::EvalError;
use crate::rng::RngError;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// The failing decision path can be pruned and enumeration continues.
    Recoverable,

    /// Invalid input or definition data; reject without retry.
    ///
    /// Examples: chooseN declaring both `n` and `max`, unknown action id.
    Validation,

    /// Caller-side misuse or broken invariant.
    ///
    /// Examples: popping an empty interrupt stack.
    Internal,

    /// A hard budget was exhausted; the computation cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates a bug or a runaway computation.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Structured context attached to faults.
///
/// Carries enough information (effect kind, field, offending value) to
/// reproduce the failure from a unit test.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Effect variant being executed, if any (e.g. `"chooseN"`).
    pub effect: Option<String>,

    /// Field, variable or decision the fault concerns.
    pub field: Option<String>,

    /// Rendered offending value.
    pub value: Option<String>,

    pub message: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            effect: None,
            field: None,
            value: None,
            message: None,
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl core::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let parts = [
            ("effect", &self.effect),
            ("field", &self.field),
            ("value", &self.value),
            ("message", &self.message),
        ];
        let mut first = true;
        for (key, value) in parts {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}

/// Common trait for all kernel errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static machine-checkable identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// ============================================================================
// Kernel Error
// ============================================================================

/// Umbrella error returned by the public kernel entry points.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error(transparent)]
    Rng(#[from] RngError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Choice(#[from] ChoiceError),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

impl KernelError {
    fn inner(&self) -> &dyn GameError {
        match self {
            Self::Rng(e) => e,
            Self::Eval(e) => e,
            Self::Effect(e) => e,
            Self::Choice(e) => e,
            Self::Move(e) => e,
            Self::Codec(e) => e,
            Self::Setup(e) => e,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }
}

impl GameError for KernelError {
    fn severity(&self) -> ErrorSeverity {
        self.inner().severity()
    }

    fn context(&self) -> Option<&ErrorContext> {
        self.inner().context()
    }

    fn error_code(&self) -> &'static str {
        self.inner().error_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_renders_present_fields_only() {
        let ctx = ErrorContext::new()
            .with_effect("chooseN")
            .with_value(3);
        assert_eq!(ctx.to_string(), "effect=chooseN, value=3");
        assert_eq!(ErrorContext::new().to_string(), "");
    }

    #[test]
    fn kernel_error_delegates_classification() {
        let err = KernelError::from(EvalError::DivisionByZero {
            context: ErrorContext::new().with_value(5),
        });
        assert!(err.is_recoverable());
        assert_eq!(err.error_code(), "EVAL_DIVISION_BY_ZERO");
        assert_eq!(
            err.context().and_then(|c| c.value.as_deref()),
            Some("5")
        );
    }
}
