use serde::{Deserialize, Serialize};

use super::{ActionId, PhaseId, PlayerId, TokenId, ZoneId};

/// Turn-order bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOrderState {
    /// Seats take turns in index order. Nothing to track.
    RoundRobin,
    CardDriven(CardDrivenState),
}

impl TurnOrderState {
    pub fn card_driven(&self) -> Option<&CardDrivenState> {
        match self {
            Self::CardDriven(state) => Some(state),
            Self::RoundRobin => None,
        }
    }

    pub fn card_driven_mut(&mut self) -> Option<&mut CardDrivenState> {
        match self {
            Self::CardDriven(state) => Some(state),
            Self::RoundRobin => None,
        }
    }
}

/// Card-driven turn order: the current card decides which seats may act
/// and in which order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDrivenState {
    /// Card at the top of the leader zone, if any was drawn this turn.
    pub current_card: Option<TokenId>,
    /// Eligible seats for the current card, in acting order.
    pub seat_order: Vec<PlayerId>,
    /// Seats that already took a non-pass action this turn.
    pub acted: Vec<PlayerId>,
    /// Seats that passed this turn.
    pub passed: Vec<PlayerId>,
    pub non_pass_count: u32,
    pub lookahead_zone: ZoneId,
    pub leader_zone: ZoneId,
}

impl CardDrivenState {
    /// Seats from `seat_order` that have neither acted nor passed.
    pub fn eligible(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.seat_order
            .iter()
            .copied()
            .filter(|seat| !self.acted.contains(seat) && !self.passed.contains(seat))
    }
}

/// One entry on the interrupt-phase stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptFrame {
    pub phase: PhaseId,
    /// Phase restored when this frame is popped.
    pub resume_phase: PhaseId,
}

/// Per-action usage counters. Turn and phase counters reset at their boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionUsage {
    pub turn: u32,
    pub phase: u32,
    pub game: u32,
}

impl ActionUsage {
    pub fn record(&mut self) {
        self.turn = self.turn.saturating_add(1);
        self.phase = self.phase.saturating_add(1);
        self.game = self.game.saturating_add(1);
    }
}

/// Permission for one player to take one action without paying its cost.
///
/// A grant matches an action by id, by action class, or, when both are
/// absent, any action.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreeOperationGrant {
    pub player: PlayerId,
    pub action: Option<ActionId>,
    pub action_class: Option<String>,
}

impl FreeOperationGrant {
    pub fn matches(&self, player: PlayerId, action: &ActionId, class: Option<&str>) -> bool {
        if self.player != player {
            return false;
        }
        let action_ok = self.action.as_ref().is_none_or(|id| id == action);
        let class_ok = self
            .action_class
            .as_deref()
            .is_none_or(|wanted| class == Some(wanted));
        action_ok && class_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligible_skips_acted_and_passed_seats() {
        let state = CardDrivenState {
            seat_order: vec![PlayerId(2), PlayerId(0), PlayerId(1)],
            acted: vec![PlayerId(0)],
            passed: vec![PlayerId(2)],
            ..CardDrivenState::default()
        };
        assert_eq!(state.eligible().collect::<Vec<_>>(), vec![PlayerId(1)]);
    }

    #[test]
    fn grants_match_by_action_or_class() {
        let by_class = FreeOperationGrant {
            player: PlayerId(1),
            action: None,
            action_class: Some("operation".into()),
        };
        let rally = ActionId::new("rally");
        assert!(by_class.matches(PlayerId(1), &rally, Some("operation")));
        assert!(!by_class.matches(PlayerId(1), &rally, None));
        assert!(!by_class.matches(PlayerId(0), &rally, Some("operation")));

        let by_id = FreeOperationGrant {
            player: PlayerId(0),
            action: Some(rally.clone()),
            action_class: None,
        };
        assert!(by_id.matches(PlayerId(0), &rally, None));
        assert!(!by_id.matches(PlayerId(0), &ActionId::new("march"), None));
    }
}
