//! Legality outcomes and option precedence.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Why an action cannot be taken in the current state.
///
/// Every surface that reports illegality reads from [`LegalityOutcome::view`]
/// so the choice layer, move application and enumeration never disagree.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum::EnumIter,
)]
pub enum LegalityOutcome {
    PhaseMismatch,
    ActorNotApplicable,
    ExecutorNotApplicable,
    ActionLimitExceeded,
    PreconditionFailed,
    PipelineNotApplicable,
    PipelineLegalityFailed,
    PipelineCostValidationFailed,
}

/// Projection of an outcome onto the three reporting surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegalityView {
    /// Reason attached to an illegal choice request.
    pub choice_reason: &'static str,
    /// Machine code of the matching move-application error.
    pub error_code: &'static str,
    /// Whether `legal_moves` drops candidates with this outcome.
    pub excluded_from_enumeration: bool,
}

impl LegalityOutcome {
    pub const fn view(self) -> LegalityView {
        let (choice_reason, error_code, excluded_from_enumeration) = match self {
            Self::PhaseMismatch => ("phaseMismatch", "MOVE_PHASE_MISMATCH", true),
            Self::ActorNotApplicable => ("actorNotApplicable", "MOVE_ACTOR_NOT_APPLICABLE", true),
            Self::ExecutorNotApplicable => {
                ("executorNotApplicable", "MOVE_EXECUTOR_NOT_APPLICABLE", true)
            }
            Self::ActionLimitExceeded => ("actionLimitExceeded", "MOVE_ACTION_LIMIT_EXCEEDED", true),
            Self::PreconditionFailed => ("preconditionFailed", "MOVE_PRECONDITION_FAILED", true),
            Self::PipelineNotApplicable => {
                ("pipelineNotApplicable", "MOVE_PIPELINE_NOT_APPLICABLE", true)
            }
            Self::PipelineLegalityFailed => {
                ("pipelineLegalityFailed", "MOVE_PIPELINE_LEGALITY_FAILED", true)
            }
            Self::PipelineCostValidationFailed => (
                "pipelineCostValidationFailed",
                "MOVE_PIPELINE_COST_VALIDATION_FAILED",
                true,
            ),
        };
        LegalityView {
            choice_reason,
            error_code,
            excluded_from_enumeration,
        }
    }
}

/// Probe verdict for one option of a pending decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLegality {
    Legal,
    /// Not probed, or the probe reached another unanswered decision.
    Unknown,
    Illegal,
}

/// Options from the first non-empty partition among legal, unknown and,
/// when `allow_illegal` is set, illegal. Input order is preserved.
pub fn apply_legality_precedence(
    options: &[(Value, OptionLegality)],
    allow_illegal: bool,
) -> Vec<Value> {
    let mut tiers = vec![OptionLegality::Legal, OptionLegality::Unknown];
    if allow_illegal {
        tiers.push(OptionLegality::Illegal);
    }
    tiers
        .into_iter()
        .map(|tier| {
            options
                .iter()
                .filter(|(_, legality)| *legality == tier)
                .map(|(value, _)| value.clone())
                .collect::<Vec<_>>()
        })
        .find(|partition| !partition.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn partitioned(legal: i64, unknown: i64, illegal: i64) -> Vec<(Value, OptionLegality)> {
        let mut options = Vec::new();
        let mut next = 0;
        for (count, legality) in [
            (legal, OptionLegality::Legal),
            (unknown, OptionLegality::Unknown),
            (illegal, OptionLegality::Illegal),
        ] {
            for _ in 0..count {
                options.push((Value::Int(next), legality));
                next += 1;
            }
        }
        options
    }

    #[test]
    fn legal_options_win() {
        let chosen = apply_legality_precedence(&partitioned(2, 3, 1), false);
        assert_eq!(chosen, vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn unknown_options_are_the_fallback() {
        let chosen = apply_legality_precedence(&partitioned(0, 2, 1), false);
        assert_eq!(chosen, vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn illegal_options_need_opt_in() {
        assert!(apply_legality_precedence(&partitioned(0, 0, 1), false).is_empty());
        assert_eq!(
            apply_legality_precedence(&partitioned(0, 0, 1), true),
            vec![Value::Int(0)]
        );
    }

    #[test]
    fn every_outcome_has_distinct_codes() {
        let views: Vec<_> = LegalityOutcome::iter().map(LegalityOutcome::view).collect();
        for (i, a) in views.iter().enumerate() {
            assert!(a.error_code.starts_with("MOVE_"));
            for b in &views[i + 1..] {
                assert_ne!(a.choice_reason, b.choice_reason);
                assert_ne!(a.error_code, b.error_code);
            }
        }
    }
}
