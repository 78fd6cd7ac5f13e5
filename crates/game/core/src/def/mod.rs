//! Static game definition.
//!
//! A [`GameDef`] is produced by an external compiler and is assumed to be
//! internally consistent. The kernel never mutates it; every entry point
//! borrows it read-only.
mod actions;
mod tables;
mod turn;
mod vars;
mod zones;

use serde::{Deserialize, Serialize};

pub use actions::{ActionDef, ActionPipeline, Atomicity, LimitScope, ParamDef, UsageLimit};
pub use tables::{AssetTable, RawAssetTable, Row};
pub use turn::{
    CardDrivenDef, EventPattern, PassReward, TerminalCondition, TerminalOutcome, TriggerDef,
    TurnOrderDef, TurnStructure,
};
pub use vars::{MarkerLattice, PropDef, TokenTypeDef, VarDef};
pub use zones::{ZoneDef, ZoneOrdering, ZoneOwner, ZoneVisibility};

use crate::effect::Effect;
use crate::state::{ActionId, PhaseId, ZoneId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    pub min_players: u32,
    pub max_players: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameDef {
    pub metadata: Metadata,
    #[serde(default)]
    pub global_vars: Vec<VarDef>,
    #[serde(default)]
    pub per_player_vars: Vec<VarDef>,
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default)]
    pub token_types: Vec<TokenTypeDef>,
    #[serde(default)]
    pub tables: Vec<AssetTable>,
    /// Space markers, instantiated on every map-space zone.
    #[serde(default)]
    pub markers: Vec<MarkerLattice>,
    #[serde(default)]
    pub global_markers: Vec<MarkerLattice>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
    pub turn_structure: TurnStructure,
    #[serde(default)]
    pub turn_order: TurnOrderDef,
    /// Effects run once by `initial_state`, before the first turn starts.
    #[serde(default)]
    pub setup: Vec<Effect>,
    #[serde(default)]
    pub terminal: Vec<TerminalCondition>,
}

impl GameDef {
    pub fn global_var(&self, name: &str) -> Option<&VarDef> {
        self.global_vars.iter().find(|v| v.name == name)
    }

    pub fn player_var(&self, name: &str) -> Option<&VarDef> {
        self.per_player_vars.iter().find(|v| v.name == name)
    }

    /// Declaration for a concrete zone id, resolving `base:seat` ids of
    /// player-owned zones to their base declaration.
    pub fn zone_def(&self, id: &ZoneId) -> Option<&ZoneDef> {
        if let Some(zone) = self.zones.iter().find(|z| &z.id == id) {
            return Some(zone);
        }
        let (base, _) = id.split_owner()?;
        self.zones
            .iter()
            .find(|z| z.id == base && z.owner == ZoneOwner::Player)
    }

    pub fn are_adjacent(&self, a: &ZoneId, b: &ZoneId) -> bool {
        let declares = |from: &ZoneId, to: &ZoneId| {
            self.zone_def(from)
                .is_some_and(|zone| zone.adjacent.contains(to))
        };
        declares(a, b) || declares(b, a)
    }

    pub fn token_type(&self, kind: &str) -> Option<&TokenTypeDef> {
        self.token_types.iter().find(|t| t.id == kind)
    }

    pub fn table(&self, id: &str) -> Option<&AssetTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn marker(&self, id: &str) -> Option<&MarkerLattice> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn global_marker(&self, id: &str) -> Option<&MarkerLattice> {
        self.global_markers.iter().find(|m| m.id == id)
    }

    pub fn action(&self, id: &ActionId) -> Option<&ActionDef> {
        self.actions.iter().find(|a| &a.id == id)
    }

    pub fn first_phase(&self) -> Option<&PhaseId> {
        self.turn_structure.phases.first()
    }

    /// Regular phase following `phase`, or `None` at the end of the turn.
    pub fn next_phase(&self, phase: &PhaseId) -> Option<&PhaseId> {
        let phases = &self.turn_structure.phases;
        let index = phases.iter().position(|p| p == phase)?;
        phases.get(index + 1)
    }

    pub fn is_interrupt_phase(&self, phase: &PhaseId) -> bool {
        self.turn_structure.interrupt_phases.contains(phase)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::value::ValueType;

    /// Minimal two-phase definition with a deck, a discard pile, a per-player
    /// hand and a small map.
    pub fn small_def() -> GameDef {
        let mut hand = ZoneDef::new("hand");
        hand.owner = ZoneOwner::Player;
        hand.visibility = ZoneVisibility::Owner;

        let mut deck = ZoneDef::new("deck");
        deck.visibility = ZoneVisibility::Hidden;

        let mut north = ZoneDef::new("north");
        north.map_space = true;
        north.adjacent = vec![ZoneId::new("south")];
        north
            .attributes
            .insert("terrain".into(), crate::value::Value::from("hills"));
        let mut south = ZoneDef::new("south");
        south.map_space = true;
        south
            .attributes
            .insert("terrain".into(), crate::value::Value::from("plains"));

        GameDef {
            metadata: Metadata {
                id: "small".into(),
                min_players: 2,
                max_players: 4,
            },
            global_vars: vec![VarDef::int("round", 1).bounded(1, 10)],
            per_player_vars: vec![
                VarDef::int("score", 0).bounded(0, 100),
                VarDef {
                    name: "name".into(),
                    ty: ValueType::Str,
                    initial: "anon".into(),
                    min: None,
                    max: None,
                },
            ],
            zones: vec![deck, ZoneDef::new("discard"), hand, north, south],
            token_types: vec![TokenTypeDef {
                id: "card".into(),
                props: vec![PropDef {
                    name: "value".into(),
                    ty: ValueType::Int,
                    default: Some(crate::value::Value::Int(0)),
                }],
            }],
            tables: vec![tables::fixtures::units_table()],
            markers: vec![MarkerLattice {
                id: "control".into(),
                states: vec!["red".into(), "none".into(), "blue".into()],
                default: "none".into(),
            }],
            global_markers: vec![MarkerLattice {
                id: "season".into(),
                states: vec!["spring".into(), "summer".into(), "autumn".into()],
                default: "spring".into(),
            }],
            actions: Vec::new(),
            triggers: Vec::new(),
            turn_structure: TurnStructure {
                phases: vec![PhaseId::new("main"), PhaseId::new("cleanup")],
                interrupt_phases: vec![PhaseId::new("react"), PhaseId::new("counter")],
            },
            turn_order: TurnOrderDef::RoundRobin,
            setup: Vec::new(),
            terminal: Vec::new(),
        }
    }

    /// [`small_def`] plus three actions:
    ///
    /// - `play`: discard a deck card worth at least 3, scoring its value.
    /// - `pick`: choose three distinct numbers from 1 to 5.
    /// - `pass`: no effect.
    pub fn play_def() -> GameDef {
        use crate::effect::{Effect, VarTarget};
        use crate::eval::{CmpOp, Condition, PlayerSel, Reference, ValueExpr, ZoneSel};
        use crate::query::Query;

        let card_value = || {
            ValueExpr::Ref(Reference::TokenProp {
                token: "card".into(),
                prop: "value".into(),
            })
        };
        let mut play = ActionDef::new("play");
        play.params = vec![ParamDef {
            name: "card".into(),
            domain: Query::TokensInZone {
                zone: ZoneSel::id("deck"),
                filter: Vec::new(),
            },
        }];
        play.pre = Some(Condition::compare(CmpOp::Gte, card_value(), ValueExpr::int(3)));
        play.effects = vec![
            Effect::AddVar {
                target: VarTarget::Player {
                    player: PlayerSel::Actor,
                    var: "score".into(),
                },
                delta: card_value(),
            },
            Effect::MoveToken {
                token: "card".into(),
                to: ZoneSel::id("discard"),
                position: None,
            },
        ];
        play.phases = vec![PhaseId::new("main")];

        let mut pick = ActionDef::new("pick");
        pick.effects = vec![Effect::ChooseN {
            decision: crate::state::DecisionId::new("picked"),
            bind: "picked".into(),
            options: Query::IntsInRange {
                min: ValueExpr::int(1),
                max: ValueExpr::int(5),
            },
            n: Some(ValueExpr::int(3)),
            min: None,
            max: None,
        }];

        GameDef {
            actions: vec![play, pick, ActionDef::new("pass")],
            ..small_def()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::small_def;
    use super::*;
    use crate::state::PlayerId;

    #[test]
    fn owned_zone_ids_resolve_to_base_declaration() {
        let def = small_def();
        let hand = ZoneId::owned(&ZoneId::new("hand"), PlayerId(1));
        assert_eq!(def.zone_def(&hand).map(|z| z.id.as_str()), Some("hand"));
        assert!(def.zone_def(&ZoneId::new("deck:1")).is_none());
    }

    #[test]
    fn adjacency_is_symmetric() {
        let def = small_def();
        assert!(def.are_adjacent(&ZoneId::new("south"), &ZoneId::new("north")));
        assert!(!def.are_adjacent(&ZoneId::new("deck"), &ZoneId::new("north")));
    }

    #[test]
    fn phases_advance_in_declared_order() {
        let def = small_def();
        assert_eq!(
            def.next_phase(&PhaseId::new("main")),
            Some(&PhaseId::new("cleanup"))
        );
        assert_eq!(def.next_phase(&PhaseId::new("cleanup")), None);
        assert!(def.is_interrupt_phase(&PhaseId::new("react")));
    }
}
