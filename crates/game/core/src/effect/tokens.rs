//! Token effects: movement, drawing, shuffling, creation and destruction.

use std::collections::BTreeMap;

use super::context::EffectContext;
use super::{EffectError, Placement};
use crate::def::ZoneOrdering;
use crate::error::ErrorContext;
use crate::eval::{EvalError, ValueExpr, ZoneSel, eval_int, eval_value, resolve_zone};
use crate::query::{ContextResolver, FieldPredicate, token_matches};
use crate::state::{Token, TokenId, ZoneId};
use crate::trigger::KernelEvent;
use crate::value::Item;
use crate::warning::Warning;

fn bound_token(ctx: &EffectContext<'_>, name: &str) -> Result<TokenId, EvalError> {
    ctx.eval()
        .binding(name)?
        .as_token()
        .ok_or_else(|| EvalError::type_mismatch(name, "expected a token"))
}

/// Inserts `token` into `zone` at the requested or zone-default position.
fn place(
    ctx: &mut EffectContext<'_>,
    token: Token,
    zone: &ZoneId,
    placement: Option<Placement>,
) -> Result<(), EffectError> {
    let ordering = ctx
        .def()
        .zone_def(zone)
        .map(|z| z.ordering)
        .unwrap_or_default();
    let len = ctx.state.zones.get(zone).map_or(0, Vec::len);
    let index = match (placement, ordering) {
        (Some(Placement::Top), _) | (None, ZoneOrdering::Stack) => 0,
        (Some(Placement::Bottom), _) | (None, ZoneOrdering::Queue) => len,
        (Some(Placement::Random), _) => ctx.next_int(0, len as i64)? as usize,
        (None, ZoneOrdering::Set) => ctx
            .state
            .zones
            .get(zone)
            .map_or(0, |tokens| tokens.partition_point(|t| t.id < token.id)),
    };
    ctx.state
        .zones
        .entry(zone.clone())
        .or_default()
        .insert(index, token);
    Ok(())
}

/// Detaches `id` and places it in `to`, reporting the entry.
pub(super) fn relocate(
    ctx: &mut EffectContext<'_>,
    id: TokenId,
    to: &ZoneId,
    placement: Option<Placement>,
    effect: &str,
) -> Result<(), EffectError> {
    let (from, token) = ctx
        .state
        .take_token(id)
        .ok_or_else(|| EffectError::token_not_found(id, effect))?;
    place(ctx, token, to, placement)?;
    ctx.emit(KernelEvent::TokenEntered {
        token: id,
        zone: to.clone(),
        from: Some(from),
    });
    Ok(())
}

pub(super) fn move_token(
    ctx: &mut EffectContext<'_>,
    token: &str,
    to: &ZoneSel,
    placement: Option<Placement>,
) -> Result<(), EffectError> {
    let id = bound_token(ctx, token)?;
    let to = resolve_zone(to, &ctx.eval())?;
    relocate(ctx, id, &to, placement, "moveToken")
}

pub(super) fn move_token_adjacent(
    ctx: &mut EffectContext<'_>,
    token: &str,
    to: &ZoneSel,
) -> Result<(), EffectError> {
    let id = bound_token(ctx, token)?;
    let to = resolve_zone(to, &ctx.eval())?;
    let from = ctx
        .state
        .locate_token(id)
        .map(|(zone, _)| zone.clone())
        .ok_or_else(|| EffectError::token_not_found(id, "moveTokenAdjacent"))?;
    if !ctx.def().are_adjacent(&from, &to) {
        return Err(EffectError::NotAdjacent {
            context: ErrorContext::new()
                .with_effect("moveTokenAdjacent")
                .with_value(id),
            from,
            to,
        });
    }
    relocate(ctx, id, &to, None, "moveTokenAdjacent")
}

pub(super) fn move_all(
    ctx: &mut EffectContext<'_>,
    from: &ZoneSel,
    to: &ZoneSel,
    filter: &[FieldPredicate],
) -> Result<(), EffectError> {
    let (from, to) = {
        let eval = ctx.eval();
        (resolve_zone(from, &eval)?, resolve_zone(to, &eval)?)
    };
    if from == to {
        return Ok(());
    }
    let moving = {
        let eval = ctx.eval();
        let resolver = ContextResolver::new(eval);
        let mut ids = Vec::new();
        for token in ctx.state.zones.get(&from).into_iter().flatten() {
            if token_matches(token, filter, &resolver)? {
                ids.push(token.id);
            }
        }
        ids
    };
    for id in moving {
        relocate(ctx, id, &to, None, "moveAll")?;
    }
    Ok(())
}

pub(super) fn draw(
    ctx: &mut EffectContext<'_>,
    from: &ZoneSel,
    to: &ZoneSel,
    count: &ValueExpr,
) -> Result<(), EffectError> {
    let (from, to, count) = {
        let eval = ctx.eval();
        (
            resolve_zone(from, &eval)?,
            resolve_zone(to, &eval)?,
            eval_int(count, &eval)?,
        )
    };
    if count < 0 {
        return Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_effect("draw")
                .with_field("count")
                .with_value(count),
        }
        .into());
    }
    let available = ctx.state.zones.get(&from).map_or(0, Vec::len);
    let drawn = available.min(usize::try_from(count).unwrap_or(usize::MAX));
    for _ in 0..drawn {
        let Some(top) = ctx.state.zones.get(&from).and_then(|tokens| tokens.first()) else {
            break;
        };
        let id = top.id;
        relocate(ctx, id, &to, None, "draw")?;
    }
    if (drawn as i64) < count {
        ctx.warn(Warning::DrawShortfall {
            zone: from,
            requested: count,
            drawn,
        });
    }
    Ok(())
}

/// Fisher-Yates shuffle driven by the state's generator.
pub(super) fn shuffle(ctx: &mut EffectContext<'_>, zone: &ZoneSel) -> Result<(), EffectError> {
    let zone = resolve_zone(zone, &ctx.eval())?;
    let mut tokens = ctx.state.zones.remove(&zone).unwrap_or_default();
    for i in (1..tokens.len()).rev() {
        let j = ctx.next_int(0, i as i64)? as usize;
        tokens.swap(i, j);
    }
    ctx.state.zones.insert(zone, tokens);
    Ok(())
}

pub(super) fn create_token(
    ctx: &mut EffectContext<'_>,
    kind: &str,
    zone: &ZoneSel,
    props: &BTreeMap<String, ValueExpr>,
    bind: Option<&str>,
) -> Result<(), EffectError> {
    let kind_def = ctx.def().token_type(kind);
    let mut values: BTreeMap<String, _> = kind_def
        .into_iter()
        .flat_map(|t| t.props.iter())
        .filter_map(|p| p.default.clone().map(|v| (p.name.clone(), v)))
        .collect();
    let zone = {
        let eval = ctx.eval();
        for (name, expr) in props {
            let value = eval_value(expr, &eval)?;
            if let Some(declared) = kind_def.and_then(|t| t.prop(name)) {
                if declared.ty != value.value_type() {
                    return Err(EvalError::TypeMismatch {
                        context: ErrorContext::new()
                            .with_effect("createToken")
                            .with_field(name.as_str())
                            .with_value(&value),
                    }
                    .into());
                }
            }
            values.insert(name.clone(), value);
        }
        resolve_zone(zone, &eval)?
    };

    let id = ctx.state.allocate_token_id();
    let token = Token {
        id,
        kind: kind.to_owned(),
        props: values,
    };
    place(ctx, token, &zone, None)?;
    ctx.emit(KernelEvent::TokenEntered {
        token: id,
        zone,
        from: None,
    });
    if let Some(bind) = bind {
        ctx.bind(bind, Item::Token(id));
    }
    Ok(())
}

pub(super) fn destroy_token(ctx: &mut EffectContext<'_>, token: &str) -> Result<(), EffectError> {
    let id = bound_token(ctx, token)?;
    ctx.state
        .take_token(id)
        .ok_or_else(|| EffectError::token_not_found(id, "destroyToken"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::def::fixtures::small_def;
    use crate::def::{GameDef, ZoneOrdering};
    use crate::effect::{Effect, EffectEnv, EffectError, EffectOutcome, Placement, apply_effects};
    use crate::eval::{Bindings, ValueExpr, ZoneSel};
    use crate::state::fixtures::small_state;
    use crate::state::{GameState, PlayerId, TokenId, ZoneId};
    use crate::trigger::KernelEvent;
    use crate::value::{Item, Value};
    use crate::warning::Warning;

    fn run_with(
        def: &GameDef,
        state: &GameState,
        bindings: Bindings,
        effects: &[Effect],
    ) -> Result<EffectOutcome, EffectError> {
        let decisions = BTreeMap::new();
        let env = EffectEnv::execution(def, PlayerId(0), &decisions);
        apply_effects(effects, state, &bindings, &env)
    }

    fn run(bindings: Bindings, effects: &[Effect]) -> Result<EffectOutcome, EffectError> {
        run_with(&small_def(), &small_state(), bindings, effects)
    }

    fn ids(state: &GameState, zone: &str) -> Vec<u32> {
        state.zones[&ZoneId::new(zone)].iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn draw_moves_from_top_and_warns_on_shortfall() {
        let outcome = run(
            Bindings::new(),
            &[Effect::Draw {
                from: ZoneSel::id("deck"),
                to: ZoneSel::id("discard"),
                count: ValueExpr::int(5),
            }],
        )
        .unwrap();
        assert!(ids(&outcome.state, "deck").is_empty());
        // stack ordering: each drawn card lands on top
        assert_eq!(ids(&outcome.state, "discard"), vec![2, 1, 0]);
        assert_eq!(
            outcome.warnings,
            vec![Warning::DrawShortfall {
                zone: ZoneId::new("deck"),
                requested: 5,
                drawn: 3,
            }]
        );
        assert_eq!(outcome.events.len(), 3);
    }

    #[test]
    fn set_ordering_keeps_ids_sorted() {
        let mut def = small_def();
        for zone in def.zones.iter_mut().filter(|z| z.id.as_str() == "discard") {
            zone.ordering = ZoneOrdering::Set;
        }
        let mut state = small_state();
        state
            .zones
            .insert(ZoneId::new("discard"), vec![crate::state::Token::new(TokenId(0), "card")]);
        state.zones.get_mut(&ZoneId::new("deck")).unwrap().remove(0);
        let bindings = Bindings::from([("t".to_owned(), Item::Token(TokenId(2)))]);
        let outcome = run_with(
            &def,
            &state,
            bindings,
            &[Effect::MoveToken {
                token: "t".into(),
                to: ZoneSel::id("discard"),
                position: None,
            }],
        )
        .unwrap();
        assert_eq!(ids(&outcome.state, "discard"), vec![0, 2]);
    }

    #[test]
    fn adjacent_moves_are_checked() {
        let bindings = Bindings::from([("t".to_owned(), Item::Token(TokenId(3)))]);
        let ok = run(
            bindings.clone(),
            &[Effect::MoveTokenAdjacent {
                token: "t".into(),
                to: ZoneSel::id("south"),
            }],
        )
        .unwrap();
        assert_eq!(ids(&ok.state, "south"), vec![3]);
        assert_eq!(
            ok.events,
            vec![KernelEvent::TokenEntered {
                token: TokenId(3),
                zone: ZoneId::new("south"),
                from: Some(ZoneId::new("north")),
            }]
        );

        let err = run(
            bindings,
            &[Effect::MoveTokenAdjacent {
                token: "t".into(),
                to: ZoneSel::id("discard"),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, EffectError::NotAdjacent { .. }));
    }

    #[test]
    fn shuffle_is_a_seeded_permutation() {
        let effects = [Effect::Shuffle {
            zone: ZoneSel::id("deck"),
        }];
        let first = run(Bindings::new(), &effects).unwrap();
        let second = run(Bindings::new(), &effects).unwrap();
        assert_eq!(first.state, second.state);
        let mut shuffled = ids(&first.state, "deck");
        shuffled.sort_unstable();
        assert_eq!(shuffled, vec![0, 1, 2]);
        assert_ne!(first.state.rng, small_state().rng);
    }

    #[test]
    fn created_tokens_get_fresh_ids_and_defaults() {
        let outcome = run(
            Bindings::new(),
            &[
                Effect::CreateToken {
                    kind: "card".into(),
                    zone: ZoneSel::id("discard"),
                    props: BTreeMap::new(),
                    bind: Some("made".into()),
                },
                Effect::MoveToken {
                    token: "made".into(),
                    to: ZoneSel::id("south"),
                    position: Some(Placement::Bottom),
                },
                Effect::DestroyToken { token: "made".into() },
            ],
        )
        .unwrap();
        assert_eq!(outcome.state.next_token_id, 5);
        assert_eq!(outcome.bindings.get("made"), Some(&Item::Token(TokenId(4))));
        assert!(outcome.state.find_token(TokenId(4)).is_none());

        let made = run(
            Bindings::new(),
            &[Effect::CreateToken {
                kind: "card".into(),
                zone: ZoneSel::id("discard"),
                props: BTreeMap::new(),
                bind: None,
            }],
        )
        .unwrap();
        assert_eq!(
            made.state.find_token(TokenId(4)).and_then(|t| t.field("value")),
            Some(Value::Int(0))
        );
    }
}
