use serde::{Deserialize, Serialize};

use crate::def::EventPattern;
use crate::eval::Bindings;
use crate::state::{ActionId, PhaseId, PlayerId, TokenId, ZoneId};
use crate::value::{Item, Value};

/// Event categories triggers can listen for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum EventKind {
    TurnStart,
    TurnEnd,
    PhaseEnter,
    PhaseExit,
    ActionResolved,
    TokenEntered,
    VarChanged,
    MarkerChanged,
}

/// Something that happened while a move, a phase change or a trigger was
/// being resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelEvent {
    TurnStart {
        player: PlayerId,
        turn: u32,
    },
    TurnEnd {
        player: PlayerId,
        turn: u32,
    },
    PhaseEnter {
        phase: PhaseId,
    },
    PhaseExit {
        phase: PhaseId,
    },
    ActionResolved {
        action: ActionId,
        player: PlayerId,
    },
    TokenEntered {
        token: TokenId,
        zone: ZoneId,
        from: Option<ZoneId>,
    },
    VarChanged {
        var: String,
        player: Option<PlayerId>,
        old: Value,
        new: Value,
    },
    /// `zone` is `None` for global markers.
    MarkerChanged {
        marker: String,
        zone: Option<ZoneId>,
        old: String,
        new: String,
    },
}

impl KernelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TurnStart { .. } => EventKind::TurnStart,
            Self::TurnEnd { .. } => EventKind::TurnEnd,
            Self::PhaseEnter { .. } => EventKind::PhaseEnter,
            Self::PhaseExit { .. } => EventKind::PhaseExit,
            Self::ActionResolved { .. } => EventKind::ActionResolved,
            Self::TokenEntered { .. } => EventKind::TokenEntered,
            Self::VarChanged { .. } => EventKind::VarChanged,
            Self::MarkerChanged { .. } => EventKind::MarkerChanged,
        }
    }

    /// Seat the event concerns, used as the actor of trigger effects.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Self::TurnStart { player, .. }
            | Self::TurnEnd { player, .. }
            | Self::ActionResolved { player, .. } => Some(*player),
            Self::VarChanged { player, .. } => *player,
            _ => None,
        }
    }

    /// Structural match against a trigger pattern. Absent pattern fields
    /// match anything; present ones must equal the event's field.
    pub fn matches(&self, pattern: &EventPattern) -> bool {
        if pattern.kind != self.kind() {
            return false;
        }
        let phase = match self {
            Self::PhaseEnter { phase } | Self::PhaseExit { phase } => Some(phase),
            _ => None,
        };
        let action = match self {
            Self::ActionResolved { action, .. } => Some(action),
            _ => None,
        };
        let zone = match self {
            Self::TokenEntered { zone, .. } => Some(zone),
            Self::MarkerChanged { zone, .. } => zone.as_ref(),
            _ => None,
        };
        let var = match self {
            Self::VarChanged { var, .. } => Some(var),
            _ => None,
        };
        let marker = match self {
            Self::MarkerChanged { marker, .. } => Some(marker),
            _ => None,
        };
        fits(&pattern.phase, phase)
            && fits(&pattern.action, action)
            && fits(&pattern.zone, zone)
            && fits(&pattern.var, var)
            && fits(&pattern.marker, marker)
    }

    /// Event payload as `$event.<field>` bindings.
    pub fn bindings(&self) -> Bindings {
        let mut out = Bindings::new();
        let mut put = |field: &str, item: Item| {
            out.insert(format!("$event.{field}"), item);
        };
        put("kind", Item::Str(<&'static str>::from(self.kind()).to_owned()));
        match self {
            Self::TurnStart { player, turn } | Self::TurnEnd { player, turn } => {
                put("player", Item::Player(*player));
                put("turn", Item::Int(i64::from(*turn)));
            }
            Self::PhaseEnter { phase } | Self::PhaseExit { phase } => {
                put("phase", Item::Str(phase.as_str().to_owned()));
            }
            Self::ActionResolved { action, player } => {
                put("action", Item::Str(action.as_str().to_owned()));
                put("player", Item::Player(*player));
            }
            Self::TokenEntered { token, zone, from } => {
                put("token", Item::Token(*token));
                put("zone", Item::Zone(zone.clone()));
                if let Some(from) = from {
                    put("from", Item::Zone(from.clone()));
                }
            }
            Self::VarChanged {
                var,
                player,
                old,
                new,
            } => {
                put("var", Item::Str(var.clone()));
                if let Some(player) = player {
                    put("player", Item::Player(*player));
                }
                put("old", Item::from(old.clone()));
                put("new", Item::from(new.clone()));
            }
            Self::MarkerChanged {
                marker,
                zone,
                old,
                new,
            } => {
                put("marker", Item::Str(marker.clone()));
                if let Some(zone) = zone {
                    put("zone", Item::Zone(zone.clone()));
                }
                put("old", Item::Str(old.clone()));
                put("new", Item::Str(new.clone()));
            }
        }
        out
    }
}

fn fits<T: PartialEq>(wanted: &Option<T>, actual: Option<&T>) -> bool {
    wanted.as_ref().is_none_or(|wanted| actual == Some(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(kind: EventKind) -> EventPattern {
        EventPattern {
            kind,
            phase: None,
            action: None,
            zone: None,
            var: None,
            marker: None,
        }
    }

    #[test]
    fn patterns_match_kind_and_present_fields() {
        let entered = KernelEvent::TokenEntered {
            token: TokenId(3),
            zone: ZoneId::new("south"),
            from: Some(ZoneId::new("north")),
        };
        assert!(entered.matches(&pattern(EventKind::TokenEntered)));
        assert!(!entered.matches(&pattern(EventKind::VarChanged)));

        let mut into_north = pattern(EventKind::TokenEntered);
        into_north.zone = Some(ZoneId::new("north"));
        assert!(!entered.matches(&into_north));

        let mut with_var = pattern(EventKind::TokenEntered);
        with_var.var = Some("score".into());
        assert!(!entered.matches(&with_var));
    }

    #[test]
    fn payload_is_bound_under_event_prefix() {
        let changed = KernelEvent::VarChanged {
            var: "score".into(),
            player: Some(PlayerId(1)),
            old: Value::Int(2),
            new: Value::Int(5),
        };
        let bindings = changed.bindings();
        assert_eq!(bindings.get("$event.kind"), Some(&Item::Str("varChanged".into())));
        assert_eq!(bindings.get("$event.new"), Some(&Item::Int(5)));
        assert_eq!(bindings.get("$event.player"), Some(&Item::Player(PlayerId(1))));
    }
}
