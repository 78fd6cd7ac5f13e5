use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::eval::{Condition, PlayerSel};
use crate::query::Query;
use crate::state::{ActionId, PhaseId};

/// Declarative description of a player action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: ActionId,
    /// Seats allowed to take the action; the active player must be among them.
    pub actor: PlayerSel,
    /// Seat on whose behalf effects run. Must resolve to exactly one player.
    #[serde(default = "default_executor")]
    pub executor: PlayerSel,
    /// Phases in which the action is available. Empty means every phase.
    #[serde(default)]
    pub phases: Vec<PhaseId>,
    /// Decision templates resolved before the precondition is checked.
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default)]
    pub pre: Option<Condition>,
    #[serde(default)]
    pub cost: Vec<Effect>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub limits: Vec<UsageLimit>,
    #[serde(default)]
    pub action_class: Option<String>,
    /// When non-empty, the first applicable pipeline replaces `cost`/`effects`.
    #[serde(default)]
    pub pipelines: Vec<ActionPipeline>,
}

fn default_executor() -> PlayerSel {
    PlayerSel::Actor
}

impl ActionDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(id),
            actor: PlayerSel::Active,
            executor: PlayerSel::Actor,
            phases: Vec::new(),
            params: Vec::new(),
            pre: None,
            cost: Vec::new(),
            effects: Vec::new(),
            limits: Vec::new(),
            action_class: None,
            pipelines: Vec::new(),
        }
    }

    pub fn available_in(&self, phase: &PhaseId) -> bool {
        self.phases.is_empty() || self.phases.contains(phase)
    }
}

/// An action parameter: a single-choice decision over `domain`, bound under `name`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub domain: Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitScope {
    Turn,
    Phase,
    Game,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimit {
    pub scope: LimitScope,
    pub max: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Atomicity {
    /// Any stage fault fails the whole move.
    #[default]
    Atomic,
    /// A stage that raises a recoverable fault is rolled back and skipped.
    Partial,
}

/// Alternative resolution path of an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionPipeline {
    pub id: String,
    #[serde(default)]
    pub applicability: Option<Condition>,
    #[serde(default)]
    pub legality: Option<Condition>,
    /// Checked before cost effects run.
    #[serde(default)]
    pub cost_validation: Option<Condition>,
    #[serde(default)]
    pub atomicity: Atomicity,
    #[serde(default)]
    pub cost: Vec<Effect>,
    #[serde(default)]
    pub stages: Vec<Vec<Effect>>,
}
