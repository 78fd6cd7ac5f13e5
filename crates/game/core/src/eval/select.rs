use super::{EvalContext, EvalError, PlayerSel, ZoneSel};
use crate::error::ErrorContext;
use crate::state::{PlayerId, ZoneId};
use crate::value::Item;

fn checked_player(ctx: &EvalContext<'_>, seat: i64) -> Result<PlayerId, EvalError> {
    match u32::try_from(seat) {
        Ok(seat) if ctx.state.has_player(PlayerId(seat)) => Ok(PlayerId(seat)),
        _ => Err(EvalError::InvalidPlayer {
            player: seat,
            context: ErrorContext::new().with_value(seat),
        }),
    }
}

fn item_player(ctx: &EvalContext<'_>, name: &str, item: &Item) -> Result<PlayerId, EvalError> {
    match item {
        Item::Player(player) => checked_player(ctx, i64::from(player.0)),
        Item::Int(seat) => checked_player(ctx, *seat),
        other => Err(EvalError::type_mismatch(name, format!("{other:?}"))),
    }
}

/// Resolves a selector to the seats it denotes, in seat order.
pub fn resolve_players(sel: &PlayerSel, ctx: &EvalContext<'_>) -> Result<Vec<PlayerId>, EvalError> {
    let state = ctx.state;
    match sel {
        PlayerSel::Active => Ok(vec![state.active_player]),
        PlayerSel::Actor => Ok(vec![ctx.actor]),
        PlayerSel::Id(seat) => Ok(vec![checked_player(ctx, i64::from(*seat))?]),
        PlayerSel::Binding(name) => match ctx.binding(name)? {
            Item::List(items) => items.iter().map(|i| item_player(ctx, name, i)).collect(),
            item => Ok(vec![item_player(ctx, name, item)?]),
        },
        PlayerSel::Relative(offset) => {
            if state.player_count == 0 {
                return Ok(Vec::new());
            }
            let count = i64::from(state.player_count);
            let seat = (i64::from(state.active_player.0) + i64::from(*offset)).rem_euclid(count);
            Ok(vec![checked_player(ctx, seat)?])
        }
        PlayerSel::All => Ok(state.players().collect()),
        PlayerSel::AllOther => Ok(state.players().filter(|p| *p != ctx.actor).collect()),
    }
}

/// Resolves a selector that must denote exactly one seat.
pub fn resolve_player(sel: &PlayerSel, ctx: &EvalContext<'_>) -> Result<PlayerId, EvalError> {
    let players = resolve_players(sel, ctx)?;
    match players.as_slice() {
        [single] => Ok(*single),
        _ => Err(EvalError::AmbiguousPlayer {
            count: players.len(),
            context: ErrorContext::new().with_value(format!("{sel:?}")),
        }),
    }
}

/// Resolves a zone selector to a zone present in the state.
pub fn resolve_zone(sel: &ZoneSel, ctx: &EvalContext<'_>) -> Result<ZoneId, EvalError> {
    let zone = match sel {
        ZoneSel::Id(id) => id.clone(),
        ZoneSel::Owned { base, player } => ZoneId::owned(base, resolve_player(player, ctx)?),
        ZoneSel::Binding(name) => ctx
            .binding(name)?
            .as_zone()
            .ok_or_else(|| EvalError::type_mismatch(name.as_str(), "expected a zone"))?,
    };
    if !ctx.state.zones.contains_key(&zone) {
        return Err(EvalError::unknown_zone(zone.as_str()));
    }
    Ok(zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::fixtures::small_def;
    use crate::eval::Bindings;
    use crate::state::fixtures::small_state;

    #[test]
    fn relative_seats_wrap() {
        let (def, mut state) = (small_def(), small_state());
        state.active_player = PlayerId(1);
        let bindings = Bindings::new();
        let ctx = EvalContext::new(&def, &state, &bindings, PlayerId(1));
        assert_eq!(resolve_players(&PlayerSel::Relative(1), &ctx), Ok(vec![PlayerId(0)]));
        assert_eq!(resolve_players(&PlayerSel::Relative(-3), &ctx), Ok(vec![PlayerId(0)]));
        assert_eq!(resolve_players(&PlayerSel::AllOther, &ctx), Ok(vec![PlayerId(0)]));
    }

    #[test]
    fn single_player_selector_rejects_sets() {
        let (def, state) = (small_def(), small_state());
        let bindings = Bindings::new();
        let ctx = EvalContext::new(&def, &state, &bindings, PlayerId(0));
        assert!(matches!(
            resolve_player(&PlayerSel::All, &ctx),
            Err(EvalError::AmbiguousPlayer { count: 2, .. })
        ));
        assert!(matches!(
            resolve_player(&PlayerSel::Id(5), &ctx),
            Err(EvalError::InvalidPlayer { player: 5, .. })
        ));
    }

    #[test]
    fn owned_zones_resolve_per_seat() {
        let (def, state) = (small_def(), small_state());
        let bindings = Bindings::from([("who".to_owned(), Item::Player(PlayerId(1)))]);
        let ctx = EvalContext::new(&def, &state, &bindings, PlayerId(0));
        let sel = ZoneSel::Owned {
            base: ZoneId::new("hand"),
            player: PlayerSel::Binding("who".into()),
        };
        assert_eq!(resolve_zone(&sel, &ctx).unwrap().as_str(), "hand:1");
        assert!(matches!(
            resolve_zone(&ZoneSel::id("nowhere"), &ctx),
            Err(EvalError::UnknownZone { .. })
        ));
    }
}
