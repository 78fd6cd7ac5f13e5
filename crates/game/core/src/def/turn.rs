use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::eval::{Condition, PlayerSel, ValueExpr};
use crate::state::{ActionId, PhaseId, ZoneId};
use crate::trigger::EventKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Regular phases in turn order.
    pub phases: Vec<PhaseId>,
    /// Phases entered only through `pushInterruptPhase`.
    #[serde(default)]
    pub interrupt_phases: Vec<PhaseId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOrderDef {
    #[default]
    RoundRobin,
    CardDriven(CardDrivenDef),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDrivenDef {
    /// Zone the next card is drawn from at turn start.
    pub lookahead_zone: ZoneId,
    /// Zone the current card is played to.
    pub leader_zone: ZoneId,
    /// Card property listing eligible seats in order, e.g. `"1,0"`.
    pub seat_order_prop: String,
    /// Non-pass moves after which the card is exhausted.
    pub max_non_pass: u32,
    #[serde(default)]
    pub pass_action: Option<ActionId>,
    #[serde(default)]
    pub pass_reward: Option<PassReward>,
}

/// Per-player variable increment granted to a seat that passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReward {
    pub var: String,
    pub amount: i64,
}

/// Structural filter an event must satisfy for a trigger to fire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPattern {
    pub kind: EventKind,
    #[serde(default)]
    pub phase: Option<PhaseId>,
    #[serde(default)]
    pub action: Option<ActionId>,
    #[serde(default)]
    pub zone: Option<ZoneId>,
    #[serde(default)]
    pub var: Option<String>,
    #[serde(default)]
    pub marker: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub id: String,
    pub on: EventPattern,
    #[serde(default)]
    pub condition: Option<Condition>,
    pub effects: Vec<Effect>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TerminalOutcome {
    Win(PlayerSel),
    Draw,
    /// Rank every seat by `score`, evaluated with that seat as actor.
    Ranking { score: ValueExpr },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminalCondition {
    pub when: Condition,
    pub result: TerminalOutcome,
}
