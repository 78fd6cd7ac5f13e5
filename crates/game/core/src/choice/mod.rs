//! Progressive decision resolution.
//!
//! A template move is completed one decision at a time. Each step runs the
//! action in discovery mode up to its first unanswered decision, probes every
//! option, and offers the options of the best legality tier.
mod action;
mod error;
mod legality;

pub use error::ChoiceError;
pub use legality::{LegalityOutcome, LegalityView, OptionLegality, apply_legality_precedence};

pub(crate) use action::{ActionRun, ResolvedAction, run_action};

use crate::config::KernelConfig;
use crate::def::GameDef;
use crate::effect::{DecisionKind, InterpreterMode, PendingDecision};
use crate::error::GameError;
use crate::moves::{Move, MoveParam};
use crate::rng::{Rng, RngError};
use crate::state::{DecisionId, GameState};
use crate::value::Value;

// ============================================================================
// Choice Requests
// ============================================================================

/// Why a (partial) move cannot be completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IllegalReason {
    Outcome(LegalityOutcome),
    /// Legality precedence left fewer options than the decision needs.
    NoSelectableOptions { decision: DecisionId },
}

impl IllegalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outcome(outcome) => outcome.view().choice_reason,
            Self::NoSelectableOptions { .. } => "noSelectableOptions",
        }
    }
}

/// The next decision of a template, narrowed by legality precedence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingChoice {
    /// Offered options only; `max` is clamped to their count.
    pub decision: PendingDecision,
    /// Probe verdict for every option the interpreter produced.
    pub legality: Vec<(Value, OptionLegality)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChoiceRequest {
    Pending(PendingChoice),
    Illegal { reason: IllegalReason },
    Complete(Move),
}

/// Outcome of driving a template to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Complete(Move),
    /// Pruned: no completion exists along the chosen path.
    Unplayable(IllegalReason),
}

// ============================================================================
// Evaluation
// ============================================================================

fn probe(
    def: &GameDef,
    state: &GameState,
    mv: &Move,
    pending: &PendingDecision,
    config: &KernelConfig,
) -> Result<Vec<(Value, OptionLegality)>, ChoiceError> {
    let mut budget = config.max_decision_probes;
    let mut verdicts = Vec::with_capacity(pending.options.len());
    for value in &pending.options {
        let param = match pending.kind {
            DecisionKind::ChooseOne => Some(MoveParam::One(value.clone())),
            DecisionKind::ChooseN if pending.min <= 1 && pending.max >= 1 => {
                Some(MoveParam::Many(vec![value.clone()]))
            }
            DecisionKind::ChooseN => None,
        };
        let (Some(param), true) = (param, budget > 0) else {
            verdicts.push((value.clone(), OptionLegality::Unknown));
            continue;
        };
        budget -= 1;

        let mut candidate = mv.clone();
        candidate.params.insert(pending.decision.clone(), param);
        let verdict = match run_action(def, state, &candidate, InterpreterMode::Discovery, config) {
            Ok(ActionRun::Resolved(_)) => OptionLegality::Legal,
            Ok(ActionRun::Pending(_)) => OptionLegality::Unknown,
            Ok(ActionRun::Illegal(_)) => OptionLegality::Illegal,
            Err(err) if err.severity().is_recoverable() => OptionLegality::Illegal,
            Err(err) => return Err(err),
        };
        tracing::trace!(decision = %pending.decision, option = %value, ?verdict, "probed option");
        verdicts.push((value.clone(), verdict));
    }
    Ok(verdicts)
}

/// Next step for `mv`: a narrowed pending decision, an illegal verdict, or
/// the move itself once every decision is answered.
pub fn legal_choices_evaluate(
    def: &GameDef,
    state: &GameState,
    mv: &Move,
    config: &KernelConfig,
) -> Result<ChoiceRequest, ChoiceError> {
    let pending = match run_action(def, state, mv, InterpreterMode::Discovery, config)? {
        ActionRun::Illegal(outcome) => {
            return Ok(ChoiceRequest::Illegal {
                reason: IllegalReason::Outcome(outcome),
            });
        }
        ActionRun::Resolved(_) => return Ok(ChoiceRequest::Complete(mv.clone())),
        ActionRun::Pending(pending) => pending,
    };

    let legality = probe(def, state, mv, &pending, config)?;
    let options = apply_legality_precedence(&legality, config.allow_illegal_fallback);
    if options.len() < pending.min {
        return Ok(ChoiceRequest::Illegal {
            reason: IllegalReason::NoSelectableOptions {
                decision: pending.decision,
            },
        });
    }
    let decision = PendingDecision {
        max: pending.max.min(options.len()),
        options,
        ..pending
    };
    Ok(ChoiceRequest::Pending(PendingChoice { decision, legality }))
}

/// Drives `mv` to completion, asking `chooser` to answer each decision.
///
/// At most `max_choice_steps` decisions are answered. A move that still has
/// a pending decision after that fails with [`ChoiceError::StepBudgetExceeded`].
pub fn resolve_move_decisions<F>(
    def: &GameDef,
    state: &GameState,
    mv: &Move,
    config: &KernelConfig,
    mut chooser: F,
) -> Result<Resolution, ChoiceError>
where
    F: FnMut(&PendingChoice) -> Result<MoveParam, ChoiceError>,
{
    let mut current = mv.clone();
    let mut answered = 0;
    loop {
        match legal_choices_evaluate(def, state, &current, config)? {
            ChoiceRequest::Complete(done) => return Ok(Resolution::Complete(done)),
            ChoiceRequest::Illegal { reason } => return Ok(Resolution::Unplayable(reason)),
            ChoiceRequest::Pending(_) if answered >= config.max_choice_steps => break,
            ChoiceRequest::Pending(choice) => {
                let answer = chooser(&choice)?;
                current.params.insert(choice.decision.decision, answer);
                answered += 1;
            }
        }
    }
    tracing::warn!(action = %mv.action_id, steps = config.max_choice_steps, "choice loop budget exhausted");
    Err(ChoiceError::StepBudgetExceeded {
        steps: config.max_choice_steps,
        context: crate::error::ErrorContext::new().with_value(&mv.action_id),
    })
}

/// Picks `count` options without replacement (partial Fisher-Yates).
fn sample(rng: &mut Rng, options: &[Value], count: usize) -> Result<Vec<Value>, RngError> {
    let mut pool = options.to_vec();
    let last = pool.len().saturating_sub(1);
    let count = count.min(pool.len());
    for i in 0..count {
        let (j, next) = rng.next_int(i as i64, last as i64)?;
        *rng = next;
        pool.swap(i, j as usize);
    }
    pool.truncate(count);
    Ok(pool)
}

/// Completes `mv` with random answers drawn from `rng`.
///
/// Returns the resolution and the advanced generator.
pub fn complete_template_move(
    def: &GameDef,
    state: &GameState,
    mv: &Move,
    rng: Rng,
    config: &KernelConfig,
) -> Result<(Resolution, Rng), ChoiceError> {
    let mut rng = rng;
    let resolution = resolve_move_decisions(def, state, mv, config, |choice| {
        let pending = &choice.decision;
        match pending.kind {
            DecisionKind::ChooseOne => {
                let picked = sample(&mut rng, &pending.options, 1)?;
                let value = picked.into_iter().next().ok_or_else(|| RngError::InvalidRange {
                    min: 0,
                    max: -1,
                    context: crate::error::ErrorContext::new().with_field(pending.decision.as_str()),
                })?;
                Ok(MoveParam::One(value))
            }
            DecisionKind::ChooseN => {
                let (count, next) = rng.next_int(pending.min as i64, pending.max as i64)?;
                rng = next;
                Ok(MoveParam::Many(sample(&mut rng, &pending.options, count as usize)?))
            }
        }
    })?;
    Ok((resolution, rng))
}
