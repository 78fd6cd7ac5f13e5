//! Trigger dispatch.
//!
//! Events emitted by effects and by turn flow are matched against the
//! definition's triggers in declaration order. A firing trigger's effects run
//! through the interpreter and the events they emit cascade one level deeper.
//! Firings at or beyond `max_trigger_depth` are dropped with a warning.
mod event;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use event::{EventKind, KernelEvent};

use crate::config::KernelConfig;
use crate::def::{GameDef, TriggerDef};
use crate::effect::{EffectEnv, EffectError, EffectTraceEntry, apply_effects};
use crate::eval::{EvalContext, eval_condition};
use crate::state::GameState;
use crate::warning::Warning;

/// Record of one trigger firing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFiring {
    pub trigger: String,
    pub event: EventKind,
    /// 0 for events raised directly by a move or turn flow.
    pub depth: u32,
}

/// State after a cascade together with everything it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub state: GameState,
    pub firings: Vec<TriggerFiring>,
    pub warnings: Vec<Warning>,
    pub trace: Vec<EffectTraceEntry>,
}

struct Dispatcher<'a> {
    def: &'a GameDef,
    config: &'a KernelConfig,
    firings: Vec<TriggerFiring>,
    warnings: Vec<Warning>,
    trace: Vec<EffectTraceEntry>,
}

impl Dispatcher<'_> {
    fn dispatch(
        &mut self,
        mut state: GameState,
        events: &[KernelEvent],
        depth: u32,
    ) -> Result<GameState, EffectError> {
        let def = self.def;
        for event in events {
            for trigger in def.triggers.iter().filter(|t| event.matches(&t.on)) {
                state = self.fire(state, trigger, event, depth)?;
            }
        }
        Ok(state)
    }

    fn fire(
        &mut self,
        state: GameState,
        trigger: &TriggerDef,
        event: &KernelEvent,
        depth: u32,
    ) -> Result<GameState, EffectError> {
        if depth >= self.config.max_trigger_depth {
            tracing::warn!(trigger = %trigger.id, depth, "trigger cascade truncated");
            self.warnings.push(Warning::TriggerDepthExceeded {
                trigger: trigger.id.clone(),
                depth,
            });
            return Ok(state);
        }

        let actor = event.player().unwrap_or(state.active_player);
        let bindings = event.bindings();
        if let Some(condition) = &trigger.condition {
            let ctx = EvalContext::new(self.def, &state, &bindings, actor)
                .with_query_limit(self.config.max_query_items);
            if !eval_condition(condition, &ctx)? {
                return Ok(state);
            }
        }

        tracing::debug!(trigger = %trigger.id, event = ?event.kind(), depth, "trigger fired");
        self.firings.push(TriggerFiring {
            trigger: trigger.id.clone(),
            event: event.kind(),
            depth,
        });

        let decisions = BTreeMap::new();
        let env = EffectEnv::execution(self.def, actor, &decisions)
            .with_trace(self.config.collect_trace)
            .with_query_limit(self.config.max_query_items);
        let outcome = apply_effects(&trigger.effects, &state, &bindings, &env)?;
        self.warnings.extend(outcome.warnings);
        self.trace.extend(outcome.trace);
        self.dispatch(outcome.state, &outcome.events, depth + 1)
    }
}

/// Fires every trigger matching `events`, cascading depth-first.
pub fn dispatch_events(
    def: &GameDef,
    state: GameState,
    events: &[KernelEvent],
    config: &KernelConfig,
) -> Result<DispatchOutcome, EffectError> {
    let mut dispatcher = Dispatcher {
        def,
        config,
        firings: Vec::new(),
        warnings: Vec::new(),
        trace: Vec::new(),
    };
    let state = dispatcher.dispatch(state, events, 0)?;
    Ok(DispatchOutcome {
        state,
        firings: dispatcher.firings,
        warnings: dispatcher.warnings,
        trace: dispatcher.trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::fixtures::small_def;
    use crate::def::EventPattern;
    use crate::effect::{Effect, VarTarget};
    use crate::eval::{CmpOp, Condition, PlayerSel, ValueExpr};
    use crate::state::fixtures::small_state;
    use crate::state::{PhaseId, PlayerId};
    use crate::value::Value;

    fn on(kind: EventKind) -> EventPattern {
        EventPattern {
            kind,
            phase: None,
            action: None,
            zone: None,
            var: None,
            marker: None,
        }
    }

    fn bump_round() -> Effect {
        Effect::AddVar {
            target: VarTarget::Global("round".into()),
            delta: ValueExpr::int(1),
        }
    }

    #[test]
    fn self_feeding_triggers_stop_at_the_depth_limit() {
        let mut def = small_def();
        def.triggers.push(TriggerDef {
            id: "echo".into(),
            on: EventPattern {
                var: Some("round".into()),
                ..on(EventKind::VarChanged)
            },
            condition: None,
            effects: vec![bump_round()],
        });
        def.triggers.push(TriggerDef {
            id: "start".into(),
            on: on(EventKind::PhaseEnter),
            condition: None,
            effects: vec![bump_round()],
        });
        let config = KernelConfig::with_trigger_depth(3);
        let events = [KernelEvent::PhaseEnter {
            phase: PhaseId::new("main"),
        }];

        let outcome = dispatch_events(&def, small_state(), &events, &config).unwrap();
        // start at depth 0, echo at 1 and 2, echo at 3 truncated
        assert_eq!(outcome.state.global_vars.get("round"), Some(&Value::Int(4)));
        let depths: Vec<_> = outcome.firings.iter().map(|f| f.depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
        assert_eq!(
            outcome.warnings,
            vec![Warning::TriggerDepthExceeded {
                trigger: "echo".into(),
                depth: 3,
            }]
        );
    }

    #[test]
    fn conditions_see_event_bindings() {
        let mut def = small_def();
        def.triggers.push(TriggerDef {
            id: "reward".into(),
            on: on(EventKind::TurnStart),
            condition: Some(Condition::compare(
                CmpOp::Eq,
                ValueExpr::binding("$event.turn"),
                ValueExpr::int(2),
            )),
            effects: vec![Effect::AddVar {
                target: VarTarget::Player {
                    player: PlayerSel::Actor,
                    var: "score".into(),
                },
                delta: ValueExpr::int(10),
            }],
        });
        let config = KernelConfig::default();
        let first = [KernelEvent::TurnStart {
            player: PlayerId(1),
            turn: 1,
        }];
        let second = [KernelEvent::TurnStart {
            player: PlayerId(1),
            turn: 2,
        }];

        let skipped = dispatch_events(&def, small_state(), &first, &config).unwrap();
        assert!(skipped.firings.is_empty());

        let fired = dispatch_events(&def, small_state(), &second, &config).unwrap();
        assert_eq!(fired.firings.len(), 1);
        assert_eq!(fired.state.player_var(PlayerId(1), "score"), Some(&Value::Int(19)));
    }
}
