//! Moves and their decision parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::{ActionId, DecisionId};
use crate::value::Value;

/// Answer to one decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveParam {
    One(Value),
    Many(Vec<Value>),
}

/// A player's request to take an action.
///
/// A move is a *template* while some decision its action reaches is still
/// unanswered; the choice layer fills the gaps one decision at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub action_id: ActionId,
    #[serde(default)]
    pub params: BTreeMap<DecisionId, MoveParam>,
    #[serde(default)]
    pub action_class: Option<String>,
    /// Taken under a free-operation grant: cost is skipped.
    #[serde(default)]
    pub free_operation: bool,
}

impl Move {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: ActionId::new(action_id),
            params: BTreeMap::new(),
            action_class: None,
            free_operation: false,
        }
    }

    #[must_use]
    pub fn with_param(mut self, decision: impl Into<String>, param: MoveParam) -> Self {
        self.params.insert(DecisionId::new(decision), param);
        self
    }

    #[must_use]
    pub fn with_one(self, decision: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_param(decision, MoveParam::One(value.into()))
    }

    #[must_use]
    pub fn as_free_operation(mut self) -> Self {
        self.free_operation = true;
        self
    }

    pub fn param(&self, decision: &DecisionId) -> Option<&MoveParam> {
        self.params.get(decision)
    }
}
