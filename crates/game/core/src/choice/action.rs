//! Runs one action against a move, in either interpreter mode.
//!
//! Discovery and execution share this path so that what the choice layer
//! offers is exactly what `apply_move` accepts.

use super::{ChoiceError, LegalityOutcome};
use crate::config::KernelConfig;
use crate::def::{ActionDef, ActionPipeline, Atomicity, GameDef, LimitScope};
use crate::effect::{
    Effect, EffectEnv, EffectOutcome, EffectTraceEntry, InterpreterMode, PendingDecision,
    apply_effects,
};
use crate::error::GameError;
use crate::eval::{Bindings, Condition, EvalContext, eval_condition, resolve_players};
use crate::moves::Move;
use crate::state::{DecisionId, GameState, PlayerId};
use crate::trigger::KernelEvent;
use crate::warning::Warning;

/// Effects of an action that ran to the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedAction {
    pub state: GameState,
    pub executor: PlayerId,
    pub events: Vec<KernelEvent>,
    pub trace: Vec<EffectTraceEntry>,
    pub warnings: Vec<Warning>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ActionRun {
    Illegal(LegalityOutcome),
    /// Discovery stopped at an unanswered decision.
    Pending(PendingDecision),
    Resolved(ResolvedAction),
}

/// Checks that hold before any decision is answered.
///
/// Returns the executor and the selected pipeline.
fn applicability<'d>(
    def: &'d GameDef,
    state: &GameState,
    action: &'d ActionDef,
    config: &KernelConfig,
) -> Result<Result<(PlayerId, Option<&'d ActionPipeline>), LegalityOutcome>, ChoiceError> {
    if !action.available_in(&state.current_phase) {
        return Ok(Err(LegalityOutcome::PhaseMismatch));
    }
    let mover = state.active_player;
    let empty = Bindings::new();
    let ctx = EvalContext::new(def, state, &empty, mover).with_query_limit(config.max_query_items);
    if !resolve_players(&action.actor, &ctx)?.contains(&mover) {
        return Ok(Err(LegalityOutcome::ActorNotApplicable));
    }
    let executor = match resolve_players(&action.executor, &ctx)?.as_slice() {
        [single] => *single,
        _ => return Ok(Err(LegalityOutcome::ExecutorNotApplicable)),
    };

    let usage = state.usage(&action.id);
    let exceeded = action.limits.iter().any(|limit| {
        let used = match limit.scope {
            LimitScope::Turn => usage.turn,
            LimitScope::Phase => usage.phase,
            LimitScope::Game => usage.game,
        };
        used >= limit.max
    });
    if exceeded {
        return Ok(Err(LegalityOutcome::ActionLimitExceeded));
    }

    if action.pipelines.is_empty() {
        return Ok(Ok((executor, None)));
    }
    let ctx =
        EvalContext::new(def, state, &empty, executor).with_query_limit(config.max_query_items);
    for pipeline in &action.pipelines {
        let applies = match &pipeline.applicability {
            Some(condition) => eval_condition(condition, &ctx)?,
            None => true,
        };
        if applies {
            return Ok(Ok((executor, Some(pipeline))));
        }
    }
    Ok(Err(LegalityOutcome::PipelineNotApplicable))
}

/// Parameter templates as `chooseOne` decisions keyed by parameter name.
fn parameter_effects(action: &ActionDef) -> Vec<Effect> {
    action
        .params
        .iter()
        .map(|param| Effect::ChooseOne {
            decision: DecisionId::new(param.name.as_str()),
            bind: param.name.clone(),
            options: param.domain.clone(),
        })
        .collect()
}

struct Accumulator {
    state: GameState,
    bindings: Bindings,
    events: Vec<KernelEvent>,
    trace: Vec<EffectTraceEntry>,
    warnings: Vec<Warning>,
}

impl Accumulator {
    fn absorb(&mut self, outcome: EffectOutcome) {
        self.state = outcome.state;
        self.bindings = outcome.bindings;
        self.events.extend(outcome.events);
        self.trace.extend(outcome.trace);
        self.warnings.extend(outcome.warnings);
    }
}

pub(crate) fn run_action(
    def: &GameDef,
    state: &GameState,
    mv: &Move,
    mode: InterpreterMode,
    config: &KernelConfig,
) -> Result<ActionRun, ChoiceError> {
    let action = def
        .action(&mv.action_id)
        .ok_or_else(|| ChoiceError::unknown_action(&mv.action_id))?;
    let (executor, pipeline) = match applicability(def, state, action, config)? {
        Ok(found) => found,
        Err(outcome) => return Ok(ActionRun::Illegal(outcome)),
    };

    let env = EffectEnv {
        def,
        actor: executor,
        mode,
        decisions: &mv.params,
        collect_trace: mode == InterpreterMode::Execution && config.collect_trace,
        query_limit: config.max_query_items,
    };
    let params = apply_effects(&parameter_effects(action), state, &Bindings::new(), &env)?;
    if let Some(pending) = params.pending {
        return Ok(ActionRun::Pending(pending));
    }

    {
        let ctx = EvalContext::new(def, state, &params.bindings, executor)
            .with_query_limit(config.max_query_items);
        let holds = |condition: Option<&Condition>| match condition {
            Some(condition) => eval_condition(condition, &ctx),
            None => Ok(true),
        };
        if !holds(action.pre.as_ref())? {
            return Ok(ActionRun::Illegal(LegalityOutcome::PreconditionFailed));
        }
        if let Some(pipeline) = pipeline {
            if !holds(pipeline.legality.as_ref())? {
                return Ok(ActionRun::Illegal(LegalityOutcome::PipelineLegalityFailed));
            }
            if !mv.free_operation && !holds(pipeline.cost_validation.as_ref())? {
                return Ok(ActionRun::Illegal(LegalityOutcome::PipelineCostValidationFailed));
            }
        }
    }

    let mut acc = Accumulator {
        state: state.clone(),
        bindings: params.bindings,
        events: params.events,
        trace: params.trace,
        warnings: params.warnings,
    };

    if !mv.free_operation {
        let cost = pipeline.map_or(action.cost.as_slice(), |p| p.cost.as_slice());
        let mut outcome = apply_effects(cost, &acc.state, &acc.bindings, &env)?;
        if let Some(pending) = outcome.pending.take() {
            return Ok(ActionRun::Pending(pending));
        }
        acc.absorb(outcome);
    }

    let (stages, atomicity, pipeline_id) = match pipeline {
        Some(p) => (
            p.stages.iter().map(Vec::as_slice).collect::<Vec<_>>(),
            p.atomicity,
            p.id.as_str(),
        ),
        None => (vec![action.effects.as_slice()], Atomicity::Atomic, ""),
    };
    for (index, stage) in stages.into_iter().enumerate() {
        match apply_effects(stage, &acc.state, &acc.bindings, &env) {
            Ok(mut outcome) => {
                if let Some(pending) = outcome.pending.take() {
                    return Ok(ActionRun::Pending(pending));
                }
                acc.absorb(outcome);
            }
            Err(err) if atomicity == Atomicity::Partial && err.severity().is_recoverable() => {
                tracing::debug!(pipeline = pipeline_id, stage = index, %err, "stage rolled back");
                acc.warnings.push(Warning::StageSkipped {
                    pipeline: pipeline_id.to_owned(),
                    stage: index,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(ActionRun::Resolved(ResolvedAction {
        state: acc.state,
        executor,
        events: acc.events,
        trace: acc.trace,
        warnings: acc.warnings,
    }))
}
