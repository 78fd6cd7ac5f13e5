//! Expression and condition evaluation.
//!
//! Evaluation is a pure function of an [`EvalContext`]: the definition, a
//! state snapshot, the current bindings and the acting seat. References are
//! resolved through an explicit tagged dispatch ([`refs`]), never by dynamic
//! property access.
mod arith;
mod error;
mod evaluate;
mod expr;
pub mod refs;
mod select;
mod types;

use std::collections::BTreeMap;

pub use arith::{ArithOp, apply_arith};
pub use error::EvalError;
pub use evaluate::{eval_condition, eval_int, eval_value};
pub use expr::{AggregateOp, CmpOp, Condition, PlayerSel, Reference, ValueExpr, ZoneSel};
pub use select::{resolve_player, resolve_players, resolve_zone};
pub use types::{SemanticType, are_types_compatible, infer_reference_type};

use crate::config::KernelConfig;
use crate::def::GameDef;
use crate::state::{GameState, PlayerId};
use crate::value::Item;

/// Named values visible to expressions (`forEach` items, choices, lets).
pub type Bindings = BTreeMap<String, Item>;

#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    pub def: &'a GameDef,
    pub state: &'a GameState,
    pub bindings: &'a Bindings,
    /// Seat on whose behalf the expression is evaluated.
    pub actor: PlayerId,
    /// Largest range a query may materialize.
    pub query_limit: u32,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        def: &'a GameDef,
        state: &'a GameState,
        bindings: &'a Bindings,
        actor: PlayerId,
    ) -> Self {
        Self {
            def,
            state,
            bindings,
            actor,
            query_limit: KernelConfig::DEFAULT_MAX_QUERY_ITEMS,
        }
    }

    #[must_use]
    pub fn with_query_limit(mut self, limit: u32) -> Self {
        self.query_limit = limit;
        self
    }

    /// Same context over a different binding set.
    pub fn with_bindings<'b>(&self, bindings: &'b Bindings) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            def: self.def,
            state: self.state,
            bindings,
            actor: self.actor,
            query_limit: self.query_limit,
        }
    }

    pub fn binding(&self, name: &str) -> Result<&'a Item, EvalError> {
        self.bindings
            .get(name)
            .ok_or_else(|| EvalError::missing_binding(name))
    }
}
