//! Decision effects: `chooseOne`, `chooseN` and `removeByPriority`.
//!
//! A decision id is qualified by the enclosing loop path, so a choice inside
//! a `forEach` asks a distinct question on every iteration.

use super::context::{EffectContext, Flow};
use super::tokens::relocate;
use super::{DecisionKind, EffectError, InterpreterMode, PendingDecision, PriorityGroup};
use crate::error::ErrorContext;
use crate::eval::{EvalError, ValueExpr, eval_int, eval_value, resolve_zone};
use crate::moves::MoveParam;
use crate::query::{Query, eval_query};
use crate::state::DecisionId;
use crate::value::{Item, Value, is_safe_integer};
use crate::warning::Warning;

/// Raw chooseN bounds as written.
#[derive(Clone, Copy, Debug)]
pub(super) struct Cardinality<'e> {
    pub n: Option<&'e ValueExpr>,
    pub min: Option<&'e ValueExpr>,
    pub max: Option<&'e ValueExpr>,
}

fn cardinality_bound(ctx: &EffectContext<'_>, expr: &ValueExpr, which: &str) -> Result<usize, EffectError> {
    match eval_value(expr, &ctx.eval())? {
        Value::Int(v) if v >= 0 && is_safe_integer(v) => {
            usize::try_from(v).map_err(|_| EffectError::cardinality("chooseN", format!("{which} is too large")))
        }
        other => Err(EffectError::InvalidCardinality {
            context: ErrorContext::new()
                .with_effect("chooseN")
                .with_field(which)
                .with_value(other)
                .with_message("bound must be a non-negative safe integer"),
        }),
    }
}

/// Resolves `(min, max)`. Exactly one of `n` or `max` must be present.
fn resolve_cardinality(
    ctx: &EffectContext<'_>,
    bounds: Cardinality<'_>,
) -> Result<(usize, usize), EffectError> {
    match (bounds.n, bounds.min, bounds.max) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(EffectError::cardinality(
            "chooseN",
            "n cannot be combined with min or max",
        )),
        (None, _, None) => Err(EffectError::cardinality("chooseN", "either n or max is required")),
        (Some(n), None, None) => {
            let n = cardinality_bound(ctx, n, "n")?;
            Ok((n, n))
        }
        (None, min, Some(max)) => {
            let min = match min {
                Some(min) => cardinality_bound(ctx, min, "min")?,
                None => 0,
            };
            let max = cardinality_bound(ctx, max, "max")?;
            if min > max {
                return Err(EffectError::cardinality("chooseN", format!("min {min} exceeds max {max}")));
            }
            Ok((min, max))
        }
    }
}

/// Evaluates choice options, deduplicated by encoding in first-seen order.
fn options(
    ctx: &EffectContext<'_>,
    query: &Query,
    effect: &str,
) -> Result<(Vec<Item>, Vec<Value>), EffectError> {
    let not_encodable = |detail: String| EffectError::OptionNotEncodable {
        context: ErrorContext::new().with_effect(effect).with_value(detail),
    };
    let (_, shape) = query.contract();
    if !shape.is_encodable() {
        return Err(not_encodable(format!("{shape:?}")));
    }
    let mut items = Vec::new();
    let mut values = Vec::new();
    for item in eval_query(query, &ctx.eval())? {
        let value = item.encode().ok_or_else(|| not_encodable(format!("{item:?}")))?;
        if !values.contains(&value) {
            values.push(value);
            items.push(item);
        }
    }
    Ok((items, values))
}

fn suspend_or_fail(
    ctx: &mut EffectContext<'_>,
    pending: PendingDecision,
) -> Result<Flow, EffectError> {
    match ctx.env.mode {
        InterpreterMode::Discovery => {
            if pending.options.is_empty() {
                ctx.warn(Warning::EmptyQuery {
                    decision: pending.decision.clone(),
                });
            }
            Ok(Flow::Suspend(pending))
        }
        InterpreterMode::Execution => Err(EffectError::MissingDecision {
            context: ErrorContext::new().with_field(pending.decision.as_str()),
            decision: pending.decision,
        }),
    }
}

pub(super) fn choose_one(
    ctx: &mut EffectContext<'_>,
    decision: &DecisionId,
    bind: &str,
    query: &Query,
) -> Result<Flow, EffectError> {
    let id = ctx.scoped(decision);
    let (items, values) = options(ctx, query, "chooseOne")?;
    match ctx.env.decisions.get(&id) {
        None => suspend_or_fail(
            ctx,
            PendingDecision {
                decision: id,
                kind: DecisionKind::ChooseOne,
                min: 1,
                max: 1,
                options: values,
            },
        ),
        Some(MoveParam::One(chosen)) => {
            let index = values
                .iter()
                .position(|v| v == chosen)
                .ok_or_else(|| EffectError::invalid_selection(&id, format!("{chosen} is not an option")))?;
            ctx.bind(bind, items[index].clone());
            Ok(Flow::Continue)
        }
        Some(MoveParam::Many(_)) => Err(EffectError::invalid_selection(&id, "expected a single value")),
    }
}

pub(super) fn choose_n(
    ctx: &mut EffectContext<'_>,
    decision: &DecisionId,
    bind: &str,
    query: &Query,
    bounds: Cardinality<'_>,
) -> Result<Flow, EffectError> {
    let (min, max) = resolve_cardinality(ctx, bounds)?;
    let id = ctx.scoped(decision);
    let (items, values) = options(ctx, query, "chooseN")?;
    match ctx.env.decisions.get(&id) {
        None => suspend_or_fail(
            ctx,
            PendingDecision {
                decision: id,
                kind: DecisionKind::ChooseN,
                min,
                max: max.min(values.len()),
                options: values,
            },
        ),
        Some(MoveParam::Many(chosen)) => {
            if chosen.len() < min || chosen.len() > max {
                return Err(EffectError::invalid_selection(
                    &id,
                    format!("selected {} but expected {min}..={max}", chosen.len()),
                ));
            }
            let mut picked = Vec::with_capacity(chosen.len());
            let mut seen: Vec<&Value> = Vec::with_capacity(chosen.len());
            for value in chosen {
                if seen.contains(&value) {
                    return Err(EffectError::invalid_selection(&id, format!("{value} selected twice")));
                }
                seen.push(value);
                let index = values
                    .iter()
                    .position(|v| v == value)
                    .ok_or_else(|| EffectError::invalid_selection(&id, format!("{value} is not an option")))?;
                picked.push(items[index].clone());
            }
            ctx.bind(bind, Item::List(picked));
            Ok(Flow::Continue)
        }
        Some(MoveParam::One(_)) => Err(EffectError::invalid_selection(&id, "expected a list of values")),
    }
}

/// Removes up to `budget` tokens group by group, in query order.
pub(super) fn remove_by_priority(
    ctx: &mut EffectContext<'_>,
    budget: &ValueExpr,
    groups: &[PriorityGroup],
    removed_bind: Option<&str>,
) -> Result<(), EffectError> {
    let budget = eval_int(budget, &ctx.eval())?;
    if budget < 0 {
        return Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_effect("removeByPriority")
                .with_field("budget")
                .with_value(budget),
        }
        .into());
    }

    let mut removed: i64 = 0;
    for group in groups {
        if removed >= budget {
            break;
        }
        let candidates = eval_query(&group.over, &ctx.eval())?;
        for item in candidates {
            if removed >= budget {
                break;
            }
            let token = item
                .as_token()
                .ok_or_else(|| EvalError::type_mismatch(group.bind.as_str(), format!("{item:?}")))?;
            let saved = ctx.bindings.clone();
            ctx.bind(&group.bind, item);
            let destination = resolve_zone(&group.to, &ctx.eval());
            ctx.bindings = saved;
            relocate(ctx, token, &destination?, None, "removeByPriority")?;
            removed += 1;
        }
    }
    if let Some(name) = removed_bind {
        ctx.bind(name, Item::Int(removed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::def::fixtures::small_def;
    use crate::effect::{
        DecisionKind, Effect, EffectEnv, EffectError, EffectOutcome, PriorityGroup, apply_effects,
    };
    use crate::eval::{Bindings, ValueExpr, ZoneSel};
    use crate::moves::MoveParam;
    use crate::query::Query;
    use crate::state::fixtures::small_state;
    use crate::state::{DecisionId, PlayerId, TokenId, ZoneId};
    use crate::value::{Item, Value};

    fn pick(n: Option<i64>, min: Option<i64>, max: Option<i64>) -> Effect {
        Effect::ChooseN {
            decision: DecisionId::new("pick"),
            bind: "picked".into(),
            options: Query::IntsInRange {
                min: ValueExpr::int(1),
                max: ValueExpr::int(5),
            },
            n: n.map(ValueExpr::int),
            min: min.map(ValueExpr::int),
            max: max.map(ValueExpr::int),
        }
    }

    fn discover(effects: &[Effect]) -> Result<EffectOutcome, EffectError> {
        let (def, state) = (small_def(), small_state());
        let decisions = BTreeMap::new();
        let env = EffectEnv::discovery(&def, PlayerId(0), &decisions);
        apply_effects(effects, &state, &Bindings::new(), &env)
    }

    fn execute(
        effects: &[Effect],
        decisions: BTreeMap<DecisionId, MoveParam>,
    ) -> Result<EffectOutcome, EffectError> {
        let (def, state) = (small_def(), small_state());
        let env = EffectEnv::execution(&def, PlayerId(0), &decisions);
        apply_effects(effects, &state, &Bindings::new(), &env)
    }

    #[test]
    fn choose_n_cardinality_is_validated_first() {
        for bad in [
            pick(Some(2), None, Some(3)),
            pick(Some(2), Some(1), None),
            pick(None, Some(1), None),
            pick(None, Some(4), Some(2)),
            pick(Some(-1), None, None),
        ] {
            assert!(
                matches!(discover(&[bad.clone()]), Err(EffectError::InvalidCardinality { .. })),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn discovery_suspends_without_committing() {
        let effects = [
            Effect::Draw {
                from: ZoneSel::id("deck"),
                to: ZoneSel::id("discard"),
                count: ValueExpr::int(1),
            },
            pick(Some(3), None, None),
        ];
        let outcome = discover(&effects).unwrap();
        let pending = outcome.pending.as_ref().unwrap();
        assert_eq!(pending.kind, DecisionKind::ChooseN);
        assert_eq!((pending.min, pending.max), (3, 3));
        assert_eq!(pending.options.len(), 5);
        assert_eq!(outcome.state, small_state());
    }

    #[test]
    fn selections_are_checked() {
        let answer = |values: Vec<i64>| {
            BTreeMap::from([(
                DecisionId::new("pick"),
                MoveParam::Many(values.into_iter().map(Value::Int).collect()),
            )])
        };
        let ok = execute(&[pick(Some(3), None, None)], answer(vec![5, 1, 3])).unwrap();
        assert_eq!(
            ok.bindings.get("picked"),
            Some(&Item::List(vec![Item::Int(5), Item::Int(1), Item::Int(3)]))
        );
        for bad in [vec![1, 2], vec![1, 1, 2], vec![1, 2, 9]] {
            assert!(matches!(
                execute(&[pick(Some(3), None, None)], answer(bad)),
                Err(EffectError::InvalidSelection { .. })
            ));
        }
        assert!(matches!(
            execute(&[pick(Some(3), None, None)], BTreeMap::new()),
            Err(EffectError::MissingDecision { .. })
        ));
    }

    #[test]
    fn row_options_are_rejected() {
        let rows = Effect::ChooseOne {
            decision: DecisionId::new("row"),
            bind: "r".into(),
            options: Query::AssetRows {
                table: "units".into(),
                filter: Vec::new(),
            },
        };
        assert!(matches!(discover(&[rows]), Err(EffectError::OptionNotEncodable { .. })));
    }

    #[test]
    fn decisions_inside_loops_are_scoped() {
        let nested = Effect::ForEach {
            bind: "c".into(),
            over: Query::tokens_in("deck"),
            limit: None,
            effects: vec![Effect::ChooseOne {
                decision: DecisionId::new("where"),
                bind: "z".into(),
                options: Query::MapSpaces { filter: None },
            }],
        };
        let first = discover(std::slice::from_ref(&nested)).unwrap();
        assert_eq!(first.pending.unwrap().decision.as_str(), "where#0");

        let (def, state) = (small_def(), small_state());
        let decisions = BTreeMap::from([(DecisionId::new("where#0"), MoveParam::One(Value::from("north")))]);
        let env = EffectEnv::discovery(&def, PlayerId(0), &decisions);
        let second = apply_effects(&[nested], &state, &Bindings::new(), &env).unwrap();
        assert_eq!(second.pending.unwrap().decision.as_str(), "where#1");
    }

    #[test]
    fn remove_by_priority_exhausts_groups_in_order() {
        let effect = Effect::RemoveByPriority {
            budget: ValueExpr::int(3),
            groups: vec![
                PriorityGroup {
                    bind: "t".into(),
                    over: Query::tokens_in("north"),
                    to: ZoneSel::id("discard"),
                },
                PriorityGroup {
                    bind: "t".into(),
                    over: Query::tokens_in("deck"),
                    to: ZoneSel::id("discard"),
                },
            ],
            removed_bind: Some("removed".into()),
        };
        let outcome = execute(&[effect], BTreeMap::new()).unwrap();
        assert!(outcome.state.zones[&ZoneId::new("north")].is_empty());
        assert_eq!(outcome.state.zones[&ZoneId::new("deck")].len(), 1);
        assert_eq!(
            outcome.state.locate_token(TokenId(3)).map(|(z, _)| z.as_str()),
            Some("discard")
        );
        assert_eq!(outcome.bindings.get("removed"), Some(&Item::Int(3)));
    }
}
