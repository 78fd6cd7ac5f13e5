//! Effect AST and interpreter.
//!
//! Effects are a closed sum type executed against an owned copy of the
//! state. The interpreter runs in one of two modes:
//!
//! - [`InterpreterMode::Execution`]: every decision must already be answered
//!   by the move; a missing answer is a fault.
//! - [`InterpreterMode::Discovery`]: the first unanswered decision suspends
//!   execution and is reported as a [`PendingDecision`]. Nothing is committed.
//!
//! Randomness is drawn from `GameState::rng`, so it is threaded through the
//! state like every other field.
mod context;
mod control;
mod decisions;
mod error;
mod markers;
mod tokens;
mod turn_flow;
mod vars;
mod visibility;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use error::EffectError;

use crate::config::KernelConfig;
use crate::def::GameDef;
use crate::eval::{Bindings, Condition, PlayerSel, ValueExpr, ZoneSel};
use crate::moves::MoveParam;
use crate::query::{FieldPredicate, Query};
use crate::state::{ActionId, DecisionId, GameState, PhaseId, PlayerId};
use crate::trigger::KernelEvent;
use crate::value::Value;
use crate::warning::Warning;

use context::{EffectContext, Flow};

// ============================================================================
// Effect AST
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum Effect {
    SetVar {
        target: VarTarget,
        value: ValueExpr,
    },
    AddVar {
        target: VarTarget,
        delta: ValueExpr,
    },
    /// Moves up to `amount` from one int variable to another, limited by
    /// what the source can give without dropping below its lower bound.
    TransferVar {
        from: VarTarget,
        to: VarTarget,
        amount: ValueExpr,
    },
    /// Moves the token bound under `token`.
    MoveToken {
        token: String,
        to: ZoneSel,
        #[serde(default)]
        position: Option<Placement>,
    },
    MoveAll {
        from: ZoneSel,
        to: ZoneSel,
        #[serde(default)]
        filter: Vec<FieldPredicate>,
    },
    /// Like `MoveToken`, but the destination must be adjacent to the
    /// token's current zone.
    MoveTokenAdjacent {
        token: String,
        to: ZoneSel,
    },
    /// Moves `count` tokens from the top of `from`.
    Draw {
        from: ZoneSel,
        to: ZoneSel,
        count: ValueExpr,
    },
    Shuffle {
        zone: ZoneSel,
    },
    CreateToken {
        kind: String,
        zone: ZoneSel,
        #[serde(default)]
        props: BTreeMap<String, ValueExpr>,
        #[serde(default)]
        bind: Option<String>,
    },
    DestroyToken {
        token: String,
    },
    If {
        when: Condition,
        then: Vec<Effect>,
        #[serde(default)]
        otherwise: Vec<Effect>,
    },
    ForEach {
        bind: String,
        over: Query,
        #[serde(default)]
        limit: Option<ValueExpr>,
        effects: Vec<Effect>,
    },
    /// Binds `value` under `bind` for the nested effects only.
    Let {
        bind: String,
        value: ValueExpr,
        effects: Vec<Effect>,
    },
    /// Binds `value` under `bind` for the rest of the enclosing scope.
    BindValue {
        bind: String,
        value: ValueExpr,
    },
    ChooseOne {
        decision: DecisionId,
        bind: String,
        options: Query,
    },
    /// Exactly one of `n` or `max` must be given; `min` defaults to 0.
    ChooseN {
        decision: DecisionId,
        bind: String,
        options: Query,
        #[serde(default)]
        n: Option<ValueExpr>,
        #[serde(default)]
        min: Option<ValueExpr>,
        #[serde(default)]
        max: Option<ValueExpr>,
    },
    /// Removes up to `budget` tokens, exhausting each group before the next.
    RemoveByPriority {
        budget: ValueExpr,
        groups: Vec<PriorityGroup>,
        /// Receives the number of tokens removed.
        #[serde(default)]
        removed_bind: Option<String>,
    },
    RollRandom {
        bind: String,
        min: ValueExpr,
        max: ValueExpr,
        effects: Vec<Effect>,
    },
    Reveal {
        zone: ZoneSel,
        to: PlayerSel,
        #[serde(default)]
        filter: Vec<FieldPredicate>,
    },
    /// Drops reveal grants on `zone`; only those of `from` when given.
    Conceal {
        zone: ZoneSel,
        #[serde(default)]
        from: Option<PlayerSel>,
    },
    SetMarker {
        zone: ZoneSel,
        marker: String,
        state: String,
    },
    ShiftMarker {
        zone: ZoneSel,
        marker: String,
        delta: ValueExpr,
    },
    SetGlobalMarker {
        marker: String,
        state: String,
    },
    ShiftGlobalMarker {
        marker: String,
        delta: ValueExpr,
    },
    GrantFreeOperation {
        player: PlayerSel,
        #[serde(default)]
        action: Option<ActionId>,
        #[serde(default)]
        action_class: Option<String>,
    },
    /// Enters `phase`, returning to `resume` (default: the current phase)
    /// when popped.
    PushInterruptPhase {
        phase: PhaseId,
        #[serde(default)]
        resume: Option<PhaseId>,
    },
    PopInterruptPhase,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarTarget {
    Global(String),
    /// Applies to every seat the selector resolves to.
    Player { player: PlayerSel, var: String },
}

/// Where a moved token lands. Defaults to the zone's ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Top,
    Bottom,
    Random,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityGroup {
    /// Binding for the token while `to` is resolved.
    pub bind: String,
    pub over: Query,
    pub to: ZoneSel,
}

// ============================================================================
// Interpreter surface
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpreterMode {
    Execution,
    Discovery,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    ChooseOne,
    ChooseN,
}

/// First unanswered decision reached in discovery mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecision {
    pub decision: DecisionId,
    pub kind: DecisionKind,
    pub min: usize,
    pub max: usize,
    pub options: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTraceEntry {
    pub effect: String,
    /// Enclosing loop iterations.
    pub path: Vec<usize>,
}

/// Read-only inputs shared by every effect of one run.
#[derive(Clone, Copy, Debug)]
pub struct EffectEnv<'a> {
    pub def: &'a GameDef,
    pub actor: PlayerId,
    pub mode: InterpreterMode,
    pub decisions: &'a BTreeMap<DecisionId, MoveParam>,
    pub collect_trace: bool,
    pub query_limit: u32,
}

impl<'a> EffectEnv<'a> {
    pub fn execution(
        def: &'a GameDef,
        actor: PlayerId,
        decisions: &'a BTreeMap<DecisionId, MoveParam>,
    ) -> Self {
        Self {
            def,
            actor,
            mode: InterpreterMode::Execution,
            decisions,
            collect_trace: false,
            query_limit: KernelConfig::DEFAULT_MAX_QUERY_ITEMS,
        }
    }

    pub fn discovery(
        def: &'a GameDef,
        actor: PlayerId,
        decisions: &'a BTreeMap<DecisionId, MoveParam>,
    ) -> Self {
        Self {
            mode: InterpreterMode::Discovery,
            ..Self::execution(def, actor, decisions)
        }
    }

    #[must_use]
    pub fn with_trace(mut self, collect: bool) -> Self {
        self.collect_trace = collect;
        self
    }

    #[must_use]
    pub fn with_query_limit(mut self, limit: u32) -> Self {
        self.query_limit = limit;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectOutcome {
    /// Input state when `pending` is set.
    pub state: GameState,
    pub bindings: Bindings,
    pub events: Vec<KernelEvent>,
    pub trace: Vec<EffectTraceEntry>,
    pub warnings: Vec<Warning>,
    pub pending: Option<PendingDecision>,
}

impl EffectOutcome {
    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }
}

/// Runs `effects` in order against `state`.
pub fn apply_effects(
    effects: &[Effect],
    state: &GameState,
    bindings: &Bindings,
    env: &EffectEnv<'_>,
) -> Result<EffectOutcome, EffectError> {
    let mut ctx = EffectContext::new(env, state.clone(), bindings.clone());
    match ctx.run(effects)? {
        Flow::Continue => Ok(ctx.finish(None)),
        Flow::Suspend(pending) => {
            let mut outcome = ctx.finish(Some(pending));
            outcome.state = state.clone();
            Ok(outcome)
        }
    }
}
