//! Move application and phase progression with trigger dispatch.

use crate::choice::{ActionRun, ChoiceError, ResolvedAction, run_action};
use crate::config::KernelConfig;
use crate::def::GameDef;
use crate::effect::{EffectError, EffectTraceEntry, InterpreterMode};
use crate::error::ErrorContext;
use crate::moves::Move;
use crate::state::GameState;
use crate::trigger::{KernelEvent, TriggerFiring, dispatch_events};
use crate::turn::{self, end_turn, record_card_driven_move};
use crate::warning::Warning;

use super::{MoveError, legal_moves, terminal_result};

/// Everything a move (or a driver-requested phase advance) produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyMoveResult {
    pub state: GameState,
    pub trigger_firings: Vec<TriggerFiring>,
    pub warnings: Vec<Warning>,
    /// Present when `KernelConfig::collect_trace` is set.
    pub effect_trace: Option<Vec<EffectTraceEntry>>,
}

/// Accumulates outcomes while the state moves through several steps.
struct Progress {
    state: GameState,
    firings: Vec<TriggerFiring>,
    warnings: Vec<Warning>,
    trace: Vec<EffectTraceEntry>,
}

impl Progress {
    fn dispatch(
        mut self,
        def: &GameDef,
        events: &[KernelEvent],
        config: &KernelConfig,
    ) -> Result<Self, EffectError> {
        if events.is_empty() {
            return Ok(self);
        }
        let outcome = dispatch_events(def, self.state, events, config)?;
        self.state = outcome.state;
        self.firings.extend(outcome.firings);
        self.warnings.extend(outcome.warnings);
        self.trace.extend(outcome.trace);
        Ok(self)
    }

    fn advance(self, def: &GameDef, config: &KernelConfig) -> Result<Self, EffectError> {
        let step = turn::advance_phase(def, &self.state);
        let progress = Self {
            state: step.state,
            ..self
        };
        progress.dispatch(def, &step.events, config)
    }

    fn finish(mut self, config: &KernelConfig) -> Result<ApplyMoveResult, MoveError> {
        self.state.rehash()?;
        Ok(ApplyMoveResult {
            state: self.state,
            trigger_firings: self.firings,
            warnings: self.warnings,
            effect_trace: config.collect_trace.then_some(self.trace),
        })
    }
}

/// Whether play can continue from `state` without advancing the phase.
fn settled(def: &GameDef, state: &GameState, config: &KernelConfig) -> Result<bool, MoveError> {
    Ok(terminal_result(def, state)?.is_some() || !legal_moves(def, state, config)?.is_empty())
}

/// Advances phases while the active player has nothing to do.
fn settle(
    def: &GameDef,
    mut progress: Progress,
    config: &KernelConfig,
) -> Result<Progress, MoveError> {
    for _ in 0..config.max_phase_advances {
        if settled(def, &progress.state, config)? {
            return Ok(progress);
        }
        progress = progress.advance(def, config)?;
    }
    if !settled(def, &progress.state, config)? {
        tracing::warn!(
            phase = %progress.state.current_phase,
            limit = config.max_phase_advances,
            "phase auto-advance budget exhausted"
        );
        progress.warnings.push(Warning::PhaseAdvanceBudgetExhausted {
            phase: progress.state.current_phase.clone(),
        });
    }
    Ok(progress)
}

/// Applies a complete move and returns the resulting state.
///
/// The move is re-checked against the same legality path the choice layer
/// uses. A free-operation move consumes the first matching grant and skips
/// cost. After effects and triggers resolve, card-driven eligibility is
/// updated and phases advance until the active player can act.
pub fn apply_move(
    def: &GameDef,
    state: &GameState,
    mv: &Move,
    config: &KernelConfig,
) -> Result<ApplyMoveResult, MoveError> {
    let action = def
        .action(&mv.action_id)
        .ok_or_else(|| MoveError::unknown_action(&mv.action_id))?;
    let mover = state.active_player;

    let grant = if mv.free_operation {
        let class = mv.action_class.as_deref().or(action.action_class.as_deref());
        let found = state
            .free_operation_grants
            .iter()
            .find(|grant| grant.matches(mover, &action.id, class))
            .cloned()
            .ok_or_else(|| MoveError::NoFreeOperationGrant {
                player: mover,
                action: action.id.clone(),
                context: ErrorContext::new().with_field(action.id.as_str()),
            })?;
        Some(found)
    } else {
        None
    };

    let resolved = match run_action(def, state, mv, InterpreterMode::Execution, config) {
        Ok(ActionRun::Resolved(resolved)) => resolved,
        Ok(ActionRun::Illegal(outcome)) => return Err(MoveError::illegal(outcome, &action.id)),
        Ok(ActionRun::Pending(pending)) => {
            return Err(MoveError::incomplete(pending.decision, &action.id));
        }
        Err(ChoiceError::Effect(EffectError::MissingDecision { decision, .. })) => {
            return Err(MoveError::incomplete(decision, &action.id));
        }
        Err(err) => return Err(err.into()),
    };
    let ResolvedAction {
        mut state,
        executor,
        mut events,
        trace,
        warnings,
    } = resolved;

    if let Some(grant) = grant {
        if let Some(index) = state.free_operation_grants.iter().position(|g| *g == grant) {
            state.free_operation_grants.remove(index);
        }
    }
    state
        .action_usage
        .entry(action.id.clone())
        .or_default()
        .record();
    events.push(KernelEvent::ActionResolved {
        action: action.id.clone(),
        player: executor,
    });
    tracing::debug!(
        action = %action.id,
        player = %mover,
        free = mv.free_operation,
        events = events.len(),
        "move applied"
    );

    let progress = Progress {
        state,
        firings: Vec::new(),
        warnings,
        trace,
    };
    let mut progress = progress.dispatch(def, &events, config)?;

    let mut flow = Vec::new();
    let exhausted =
        record_card_driven_move(def, &mut progress.state, mover, &action.id, &mut flow);
    progress = progress.dispatch(def, &flow, config)?;
    if exhausted {
        tracing::debug!(turn = progress.state.turn_count, "card exhausted, ending turn");
        let step = end_turn(def, &progress.state);
        progress.state = step.state;
        progress = progress.dispatch(def, &step.events, config)?;
    }

    settle(def, progress, config)?.finish(config)
}

/// Leaves the current phase and resolves the triggers it raises.
///
/// Unlike [`apply_move`], no further phases are entered automatically.
pub fn advance_phase(
    def: &GameDef,
    state: &GameState,
    config: &KernelConfig,
) -> Result<ApplyMoveResult, MoveError> {
    let progress = Progress {
        state: state.clone(),
        firings: Vec::new(),
        warnings: Vec::new(),
        trace: Vec::new(),
    };
    let progress = progress.advance(def, config)?;
    tracing::debug!(
        phase = %progress.state.current_phase,
        turn = progress.state.turn_count,
        "phase advanced"
    );
    progress.finish(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::LegalityOutcome;
    use crate::def::fixtures::play_def;
    use crate::def::{EventPattern, LimitScope, TriggerDef, UsageLimit};
    use crate::effect::{Effect, VarTarget};
    use crate::eval::ValueExpr;
    use crate::state::fixtures::small_state;
    use crate::state::{ActionId, FreeOperationGrant, PhaseId, PlayerId, ZoneId};
    use crate::trigger::EventKind;
    use crate::value::Value;

    fn play(card: i64) -> Move {
        Move::new("play").with_one("card", card)
    }

    #[test]
    fn play_scores_and_discards() {
        let (def, state) = (play_def(), small_state());
        let result = apply_move(&def, &state, &play(1), &KernelConfig::default()).unwrap();

        assert_eq!(result.state.player_var(PlayerId(0), "score"), Some(&Value::Int(9)));
        assert_eq!(result.state.zones[&ZoneId::new("discard")][0].id.0, 1);
        assert_eq!(result.state.usage(&ActionId::new("play")).game, 1);
        assert_eq!(result.state.compute_hash().unwrap(), result.state.state_hash);
        assert!(result.effect_trace.is_none());
        // input untouched
        assert_eq!(state.zones[&ZoneId::new("deck")].len(), 3);
    }

    #[test]
    fn illegal_and_incomplete_moves_are_rejected() {
        let (def, state) = (play_def(), small_state());
        let config = KernelConfig::default();

        let err = apply_move(&def, &state, &play(2), &config).unwrap_err();
        assert_eq!(err, MoveError::illegal(LegalityOutcome::PreconditionFailed, &ActionId::new("play")));

        let err = apply_move(&def, &state, &Move::new("play"), &config).unwrap_err();
        assert!(matches!(err, MoveError::IncompleteMove { ref decision, .. } if decision.as_str() == "card"));

        let err = apply_move(&def, &state, &Move::new("fly"), &config).unwrap_err();
        assert!(matches!(err, MoveError::UnknownAction { .. }));
    }

    #[test]
    fn free_operations_need_a_grant_and_consume_it() {
        let (def, mut state) = (play_def(), small_state());
        let config = KernelConfig::default();
        let free = Move::new("pass").as_free_operation();

        let err = apply_move(&def, &state, &free, &config).unwrap_err();
        assert!(matches!(err, MoveError::NoFreeOperationGrant { .. }));

        state.free_operation_grants.push(FreeOperationGrant {
            player: PlayerId(0),
            action: None,
            action_class: None,
        });
        let result = apply_move(&def, &state, &free, &config).unwrap();
        assert!(result.state.free_operation_grants.is_empty());
    }

    #[test]
    fn exhausted_phases_advance_automatically() {
        let mut def = play_def();
        for action in &mut def.actions {
            action.phases = vec![PhaseId::new("main")];
            action.limits = vec![UsageLimit {
                scope: LimitScope::Phase,
                max: 1,
            }];
        }
        def.actions.retain(|a| a.id.as_str() == "pass");
        let state = small_state();

        // pass once: main is exhausted, cleanup has no actions, the turn rolls
        let result = apply_move(&def, &state, &Move::new("pass"), &KernelConfig::default()).unwrap();
        assert_eq!(result.state.current_phase.as_str(), "main");
        assert_eq!(result.state.active_player, PlayerId(1));
        assert_eq!(result.state.turn_count, 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn auto_advance_is_bounded() {
        let mut def = play_def();
        def.actions = vec![crate::def::ActionDef {
            phases: vec![PhaseId::new("main")],
            limits: vec![UsageLimit {
                scope: LimitScope::Game,
                max: 1,
            }],
            ..crate::def::ActionDef::new("pass")
        }];
        let mut config = KernelConfig::default();
        config.max_phase_advances = 3;

        let result = apply_move(&def, &small_state(), &Move::new("pass"), &config).unwrap();
        assert_eq!(
            result.warnings,
            vec![Warning::PhaseAdvanceBudgetExhausted {
                phase: result.state.current_phase.clone()
            }]
        );
    }

    #[test]
    fn action_resolved_fires_triggers_and_traces() {
        let mut def = play_def();
        def.triggers.push(TriggerDef {
            id: "bonus".into(),
            on: EventPattern {
                kind: EventKind::ActionResolved,
                phase: None,
                action: Some(ActionId::new("play")),
                zone: None,
                var: None,
                marker: None,
            },
            condition: None,
            effects: vec![Effect::AddVar {
                target: VarTarget::Global("round".into()),
                delta: ValueExpr::int(1),
            }],
        });
        let config = KernelConfig::default().tracing(true);
        let result = apply_move(&def, &small_state(), &play(0), &config).unwrap();

        assert_eq!(result.state.global_vars["round"], Value::Int(2));
        assert_eq!(result.trigger_firings.len(), 1);
        assert_eq!(result.trigger_firings[0].trigger, "bonus");
        let trace = result.effect_trace.unwrap();
        assert!(trace.iter().any(|entry| entry.effect == "addVar"));
    }

    #[test]
    fn driver_phase_advance_does_not_settle() {
        let def = play_def();
        let result = advance_phase(&def, &small_state(), &KernelConfig::default()).unwrap();
        assert_eq!(result.state.current_phase.as_str(), "cleanup");
        assert_eq!(result.state.active_player, PlayerId(0));
    }
}
