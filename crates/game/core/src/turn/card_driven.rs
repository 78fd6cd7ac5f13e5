//! Card-driven turn order.
//!
//! Each turn the top card of the lookahead zone becomes the current card and
//! names the seats that may act, in order. A seat that acts or passes loses
//! eligibility for the rest of the card.

use crate::def::{GameDef, TurnOrderDef};
use crate::state::{ActionId, GameState, PlayerId};
use crate::trigger::KernelEvent;
use crate::value::Value;

/// Parses a seat-order property such as `"1,0"`. Unknown or repeated seats
/// are skipped; an absent or empty order means every seat in index order.
fn seat_order(value: Option<Value>, player_count: u32) -> Vec<PlayerId> {
    let mut seats: Vec<PlayerId> = Vec::new();
    let mut push = |seat: u32| {
        let seat = PlayerId(seat);
        if seat.0 < player_count && !seats.contains(&seat) {
            seats.push(seat);
        }
    };
    match value {
        Some(Value::Str(order)) => order
            .split(',')
            .filter_map(|part| part.trim().parse::<u32>().ok())
            .for_each(&mut push),
        Some(Value::Int(seat)) => {
            if let Ok(seat) = u32::try_from(seat) {
                push(seat);
            }
        }
        _ => {}
    }
    if seats.is_empty() {
        seats = (0..player_count).map(PlayerId).collect();
    }
    seats
}

/// Reveals the next card and resets eligibility for it.
pub(crate) fn start_card(def: &GameDef, state: &mut GameState, events: &mut Vec<KernelEvent>) {
    let TurnOrderDef::CardDriven(rules) = &def.turn_order else {
        return;
    };
    let card = state
        .zones
        .get_mut(&rules.lookahead_zone)
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| tokens.remove(0));

    let order = seat_order(
        card.as_ref().and_then(|c| c.field(&rules.seat_order_prop)),
        state.player_count,
    );
    let card_id = card.as_ref().map(|c| c.id);
    if let Some(card) = card {
        let id = card.id;
        state
            .zones
            .entry(rules.leader_zone.clone())
            .or_default()
            .insert(0, card);
        events.push(KernelEvent::TokenEntered {
            token: id,
            zone: rules.leader_zone.clone(),
            from: Some(rules.lookahead_zone.clone()),
        });
    }

    if let Some(first) = order.first() {
        state.active_player = *first;
    }
    if let Some(cards) = state.turn_order.card_driven_mut() {
        cards.current_card = card_id;
        cards.seat_order = order;
        cards.acted.clear();
        cards.passed.clear();
        cards.non_pass_count = 0;
    }
}

/// Records that `player` took `action` under the current card.
///
/// Returns `true` when the card is exhausted and the turn should end.
/// Otherwise the next eligible seat becomes active.
pub(crate) fn record_card_driven_move(
    def: &GameDef,
    state: &mut GameState,
    player: PlayerId,
    action: &ActionId,
    events: &mut Vec<KernelEvent>,
) -> bool {
    let TurnOrderDef::CardDriven(rules) = &def.turn_order else {
        return false;
    };
    let passed = rules.pass_action.as_ref() == Some(action);
    let Some(cards) = state.turn_order.card_driven_mut() else {
        return false;
    };
    if passed {
        cards.passed.push(player);
    } else {
        cards.acted.push(player);
        cards.non_pass_count = cards.non_pass_count.saturating_add(1);
    }
    let exhausted = cards.non_pass_count >= rules.max_non_pass;
    let next_seat = cards.eligible().next();

    if passed {
        if let Some(reward) = &rules.pass_reward {
            grant_pass_reward(def, state, player, &reward.var, reward.amount, events);
        }
    }
    match next_seat {
        Some(seat) if !exhausted => {
            state.active_player = seat;
            false
        }
        _ => true,
    }
}

fn grant_pass_reward(
    def: &GameDef,
    state: &mut GameState,
    player: PlayerId,
    var: &str,
    amount: i64,
    events: &mut Vec<KernelEvent>,
) {
    let Some(decl) = def.player_var(var) else {
        return;
    };
    let old = state
        .player_var(player, var)
        .cloned()
        .unwrap_or_else(|| decl.initial.clone());
    let Value::Int(current) = old else {
        return;
    };
    let new = Value::Int(decl.clamp(current.saturating_add(amount)));
    if new == old {
        return;
    }
    state
        .per_player_vars
        .entry(player)
        .or_default()
        .insert(var.to_owned(), new.clone());
    events.push(KernelEvent::VarChanged {
        var: var.to_owned(),
        player: Some(player),
        old,
        new,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::fixtures::small_def;
    use crate::def::{CardDrivenDef, PassReward};
    use crate::state::fixtures::small_state;
    use crate::state::{CardDrivenState, Token, TokenId, TurnOrderState, ZoneId};

    fn card_def() -> GameDef {
        let mut def = small_def();
        def.turn_order = TurnOrderDef::CardDriven(CardDrivenDef {
            lookahead_zone: ZoneId::new("deck"),
            leader_zone: ZoneId::new("discard"),
            seat_order_prop: "order".into(),
            max_non_pass: 2,
            pass_action: Some(ActionId::new("pass")),
            pass_reward: Some(PassReward {
                var: "score".into(),
                amount: 3,
            }),
        });
        def
    }

    fn card_state() -> GameState {
        let mut state = small_state();
        state.turn_order = TurnOrderState::CardDriven(CardDrivenState {
            lookahead_zone: ZoneId::new("deck"),
            leader_zone: ZoneId::new("discard"),
            ..CardDrivenState::default()
        });
        if let Some(deck) = state.zones.get_mut(&ZoneId::new("deck")) {
            deck[0] = Token::new(TokenId(0), "card").with_prop("order", "1,0,7,1");
        }
        state
    }

    #[test]
    fn seat_orders_parse_leniently() {
        assert_eq!(
            seat_order(Some(Value::from("2, 0,9")), 3),
            vec![PlayerId(2), PlayerId(0)]
        );
        assert_eq!(seat_order(None, 2), vec![PlayerId(0), PlayerId(1)]);
    }

    #[test]
    fn card_sets_eligibility_and_pass_rewards() {
        let def = card_def();
        let mut state = card_state();
        let mut events = Vec::new();
        start_card(&def, &mut state, &mut events);

        let cards = state.turn_order.card_driven().unwrap();
        assert_eq!(cards.current_card, Some(TokenId(0)));
        assert_eq!(cards.seat_order, vec![PlayerId(1), PlayerId(0)]);
        assert_eq!(state.active_player, PlayerId(1));
        assert_eq!(state.zones[&ZoneId::new("discard")][0].id, TokenId(0));

        let pass = ActionId::new("pass");
        assert!(!record_card_driven_move(&def, &mut state, PlayerId(1), &pass, &mut events));
        assert_eq!(state.active_player, PlayerId(0));
        assert_eq!(state.player_var(PlayerId(1), "score"), Some(&Value::Int(12)));

        // last eligible seat acts: the card is exhausted
        let rally = ActionId::new("rally");
        assert!(record_card_driven_move(&def, &mut state, PlayerId(0), &rally, &mut events));
    }
}
