//! Effect execution context and dispatcher.

use super::{
    Effect, EffectEnv, EffectError, EffectOutcome, EffectTraceEntry, PendingDecision, control,
    decisions, markers, tokens, turn_flow, vars, visibility,
};
use crate::def::GameDef;
use crate::eval::{Bindings, EvalContext};
use crate::rng::RngError;
use crate::state::{DecisionId, GameState, PlayerId};
use crate::trigger::KernelEvent;
use crate::value::Item;
use crate::warning::Warning;

// ============================================================================
// Effect Context
// ============================================================================

/// Whether execution continues after an effect.
#[derive(Debug)]
pub(crate) enum Flow {
    Continue,
    /// Discovery reached an unanswered decision.
    Suspend(PendingDecision),
}

/// Mutable execution state for one interpreter run.
///
/// Owns a working copy of the game state; the caller's snapshot is never
/// touched.
pub(crate) struct EffectContext<'a> {
    pub env: &'a EffectEnv<'a>,
    pub state: GameState,
    pub bindings: Bindings,
    pub events: Vec<KernelEvent>,
    pub trace: Vec<EffectTraceEntry>,
    pub warnings: Vec<Warning>,
    /// Iteration indices of the enclosing `forEach` loops.
    pub loop_path: Vec<usize>,
}

impl<'a> EffectContext<'a> {
    pub fn new(env: &'a EffectEnv<'a>, state: GameState, bindings: Bindings) -> Self {
        Self {
            env,
            state,
            bindings,
            events: Vec::new(),
            trace: Vec::new(),
            warnings: Vec::new(),
            loop_path: Vec::new(),
        }
    }

    pub fn def(&self) -> &'a GameDef {
        self.env.def
    }

    pub fn actor(&self) -> PlayerId {
        self.env.actor
    }

    /// Evaluation view of the current working state and bindings.
    pub fn eval(&self) -> EvalContext<'_> {
        EvalContext::new(self.env.def, &self.state, &self.bindings, self.env.actor)
            .with_query_limit(self.env.query_limit)
    }

    /// Decision id qualified by the current loop path.
    pub fn scoped(&self, decision: &DecisionId) -> DecisionId {
        decision.scoped(&self.loop_path)
    }

    pub fn bind(&mut self, name: &str, item: Item) {
        self.bindings.insert(name.to_owned(), item);
    }

    pub fn emit(&mut self, event: KernelEvent) {
        self.events.push(event);
    }

    /// Draws from the state's generator and advances it.
    pub fn next_int(&mut self, min: i64, max: i64) -> Result<i64, RngError> {
        let (value, next) = self.state.rng.next_int(min, max)?;
        self.state.rng = next;
        Ok(value)
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::debug!(code = warning.code(), %warning, "effect warning");
        self.warnings.push(warning);
    }

    /// Runs `effects` in order, stopping at the first suspension.
    pub fn run(&mut self, effects: &[Effect]) -> Result<Flow, EffectError> {
        for effect in effects {
            if let Flow::Suspend(pending) = self.apply(effect)? {
                return Ok(Flow::Suspend(pending));
            }
        }
        Ok(Flow::Continue)
    }

    /// Runs `effects` with bindings restored afterwards.
    pub fn run_scoped(&mut self, effects: &[Effect]) -> Result<Flow, EffectError> {
        let saved = self.bindings.clone();
        let flow = self.run(effects);
        self.bindings = saved;
        flow
    }

    pub fn finish(self, pending: Option<PendingDecision>) -> EffectOutcome {
        EffectOutcome {
            state: self.state,
            bindings: self.bindings,
            events: self.events,
            trace: self.trace,
            warnings: self.warnings,
            pending,
        }
    }

    // ========================================================================
    // Effect Dispatcher
    // ========================================================================

    fn apply(&mut self, effect: &Effect) -> Result<Flow, EffectError> {
        let name = effect.name();
        tracing::trace!(effect = name, path = ?self.loop_path, "applying effect");
        if self.env.collect_trace {
            self.trace.push(EffectTraceEntry {
                effect: name.to_owned(),
                path: self.loop_path.clone(),
            });
        }

        match effect {
            Effect::SetVar { target, value } => vars::set_var(self, target, value)?,
            Effect::AddVar { target, delta } => vars::add_var(self, target, delta)?,
            Effect::TransferVar { from, to, amount } => vars::transfer_var(self, from, to, amount)?,

            Effect::MoveToken {
                token,
                to,
                position,
            } => tokens::move_token(self, token, to, *position)?,
            Effect::MoveAll { from, to, filter } => tokens::move_all(self, from, to, filter)?,
            Effect::MoveTokenAdjacent { token, to } => tokens::move_token_adjacent(self, token, to)?,
            Effect::Draw { from, to, count } => tokens::draw(self, from, to, count)?,
            Effect::Shuffle { zone } => tokens::shuffle(self, zone)?,
            Effect::CreateToken {
                kind,
                zone,
                props,
                bind,
            } => tokens::create_token(self, kind, zone, props, bind.as_deref())?,
            Effect::DestroyToken { token } => tokens::destroy_token(self, token)?,

            Effect::If {
                when,
                then,
                otherwise,
            } => return control::if_then(self, when, then, otherwise),
            Effect::ForEach {
                bind,
                over,
                limit,
                effects,
            } => return control::for_each(self, bind, over, limit.as_ref(), effects),
            Effect::Let {
                bind,
                value,
                effects,
            } => return control::let_in(self, bind, value, effects),
            Effect::BindValue { bind, value } => control::bind_value(self, bind, value)?,
            Effect::RollRandom {
                bind,
                min,
                max,
                effects,
            } => return control::roll_random(self, bind, min, max, effects),

            Effect::ChooseOne {
                decision,
                bind,
                options,
            } => return decisions::choose_one(self, decision, bind, options),
            Effect::ChooseN {
                decision,
                bind,
                options,
                n,
                min,
                max,
            } => {
                let bounds = decisions::Cardinality {
                    n: n.as_ref(),
                    min: min.as_ref(),
                    max: max.as_ref(),
                };
                return decisions::choose_n(self, decision, bind, options, bounds);
            }
            Effect::RemoveByPriority {
                budget,
                groups,
                removed_bind,
            } => decisions::remove_by_priority(self, budget, groups, removed_bind.as_deref())?,

            Effect::Reveal { zone, to, filter } => visibility::reveal(self, zone, to, filter)?,
            Effect::Conceal { zone, from } => visibility::conceal(self, zone, from.as_ref())?,

            Effect::SetMarker {
                zone,
                marker,
                state,
            } => markers::set_marker(self, zone, marker, state)?,
            Effect::ShiftMarker {
                zone,
                marker,
                delta,
            } => markers::shift_marker(self, zone, marker, delta)?,
            Effect::SetGlobalMarker { marker, state } => {
                markers::set_global_marker(self, marker, state)?
            }
            Effect::ShiftGlobalMarker { marker, delta } => {
                markers::shift_global_marker(self, marker, delta)?
            }

            Effect::GrantFreeOperation {
                player,
                action,
                action_class,
            } => turn_flow::grant_free_operation(
                self,
                player,
                action.as_ref(),
                action_class.as_deref(),
            )?,
            Effect::PushInterruptPhase { phase, resume } => {
                turn_flow::push_interrupt(self, phase, resume.as_ref())
            }
            Effect::PopInterruptPhase => turn_flow::pop_interrupt(self)?,
        }
        Ok(Flow::Continue)
    }
}
