//! Non-fatal diagnostics collected while resolving effects.
//!
//! Warnings never abort a computation. They are accumulated in effect
//! outcomes and surfaced through `ApplyMoveResult`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{DecisionId, PhaseId, ZoneId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Warning {
    /// A `forEach` query produced no items.
    ZeroIterationForEach { bind: String },
    /// A choice was offered over an empty option set.
    EmptyQuery { decision: DecisionId },
    /// `draw` asked for more tokens than the source zone held.
    DrawShortfall {
        zone: ZoneId,
        requested: i64,
        drawn: usize,
    },
    /// Trigger cascade reached the depth limit; `trigger` did not fire.
    TriggerDepthExceeded { trigger: String, depth: u32 },
    /// Automatic phase advancing stopped at the configured limit.
    PhaseAdvanceBudgetExhausted { phase: PhaseId },
    /// A partial pipeline stage raised a recoverable fault and was rolled back.
    StageSkipped {
        pipeline: String,
        stage: usize,
        reason: String,
    },
}

impl Warning {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroIterationForEach { bind } => write!(f, "forEach `{bind}` had no items"),
            Self::EmptyQuery { decision } => write!(f, "decision `{decision}` has no options"),
            Self::DrawShortfall {
                zone,
                requested,
                drawn,
            } => write!(f, "drew {drawn} of {requested} from `{zone}`"),
            Self::TriggerDepthExceeded { trigger, depth } => {
                write!(f, "trigger `{trigger}` truncated at depth {depth}")
            }
            Self::PhaseAdvanceBudgetExhausted { phase } => {
                write!(f, "stopped advancing phases at `{phase}`")
            }
            Self::StageSkipped {
                pipeline,
                stage,
                reason,
            } => write!(f, "pipeline `{pipeline}` skipped stage {stage}: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_screaming_snake() {
        let warning = Warning::DrawShortfall {
            zone: ZoneId::new("deck"),
            requested: 3,
            drawn: 1,
        };
        assert_eq!(warning.code(), "DRAW_SHORTFALL");
        assert_eq!(warning.to_string(), "drew 1 of 3 from `deck`");
    }
}
