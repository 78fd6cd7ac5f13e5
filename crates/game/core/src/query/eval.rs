use std::collections::{BTreeSet, VecDeque};

use super::lookup::{candidate_rows, plan_lookup};
use super::predicate::{ContextResolver, FieldPredicate, matches_all, token_matches};
use super::{Query, ZoneFilter};
use crate::error::ErrorContext;
use crate::eval::{
    Bindings, Condition, EvalContext, EvalError, PlayerSel, ValueExpr, eval_condition, eval_int,
    eval_value, resolve_player, resolve_zone,
};
use crate::state::ZoneId;
use crate::value::{Item, Value, ValueType};

/// Enumerates the items of `query` in deterministic order.
pub fn eval_query(query: &Query, ctx: &EvalContext<'_>) -> Result<Vec<Item>, EvalError> {
    match query {
        Query::TokensInZone { zone, filter } => {
            let zone = resolve_zone(zone, ctx)?;
            tokens_of(&[zone], filter, ctx)
        }
        Query::TokensInMapSpaces { filter, spaces } => {
            let spaces = filter_zones(map_spaces(ctx), spaces.as_ref(), ctx)?;
            tokens_of(&spaces, filter, ctx)
        }
        Query::TokensInAdjacentZones { zone, filter } => {
            let zone = resolve_zone(zone, ctx)?;
            tokens_of(&adjacent_zones(&zone, ctx), filter, ctx)
        }
        Query::Zones { filter } => {
            let all = ctx.state.zones.keys().cloned().collect();
            zone_items(filter_zones(all, filter.as_ref(), ctx)?)
        }
        Query::MapSpaces { filter } => zone_items(filter_zones(map_spaces(ctx), filter.as_ref(), ctx)?),
        Query::AdjacentZones { zone } => {
            let zone = resolve_zone(zone, ctx)?;
            zone_items(adjacent_zones(&zone, ctx))
        }
        Query::ConnectedZones {
            zone,
            via,
            max_depth,
        } => {
            let zone = resolve_zone(zone, ctx)?;
            zone_items(connected_zones(&zone, via.as_ref(), *max_depth, ctx)?)
        }
        Query::AssetRows { table, filter } => asset_rows(table, filter, ctx),
        Query::IntsInRange { min, max } => {
            int_range(eval_int(min, ctx)?, eval_int(max, ctx)?, ctx.query_limit)
        }
        Query::IntsInVarRange {
            var,
            player,
            min,
            max,
        } => ints_in_var_range(var, player.as_ref(), min.as_ref(), max.as_ref(), ctx),
        Query::Enums(labels) => Ok(labels.iter().cloned().map(Item::Str).collect()),
        Query::GlobalMarkers { states } => Ok(ctx
            .def
            .global_markers
            .iter()
            .filter(|lattice| {
                states.as_ref().is_none_or(|wanted| {
                    let current = ctx
                        .state
                        .global_markers
                        .get(&lattice.id)
                        .unwrap_or(&lattice.default);
                    wanted.contains(current)
                })
            })
            .map(|lattice| Item::Str(lattice.id.clone()))
            .collect()),
        Query::Players => Ok(ctx.state.players().map(Item::Player).collect()),
        Query::Binding(name) => Ok(ctx.binding(name)?.clone().into_items()),
        Query::Concat(parts) => {
            let mut items = Vec::new();
            for part in parts {
                items.extend(eval_query(part, ctx)?);
            }
            Ok(items)
        }
        Query::NextInOrderByCondition {
            source,
            from,
            bind,
            condition,
            include_from,
        } => {
            let items = eval_query(source, ctx)?;
            let anchor = eval_value(from, ctx)?;
            let Some(start) = items
                .iter()
                .position(|item| item.encode().as_ref() == Some(&anchor))
            else {
                return Ok(Vec::new());
            };
            let skip = if *include_from { start } else { start + 1 };
            for item in items.into_iter().skip(skip) {
                if bound_condition(bind, item.clone(), condition, ctx)? {
                    return Ok(vec![item]);
                }
            }
            Ok(Vec::new())
        }
    }
}

fn bound_condition(
    bind: &str,
    item: Item,
    condition: &Condition,
    ctx: &EvalContext<'_>,
) -> Result<bool, EvalError> {
    let mut scoped: Bindings = ctx.bindings.clone();
    scoped.insert(bind.to_owned(), item);
    eval_condition(condition, &ctx.with_bindings(&scoped))
}

fn zone_items(zones: Vec<ZoneId>) -> Result<Vec<Item>, EvalError> {
    Ok(zones.into_iter().map(Item::Zone).collect())
}

fn tokens_of(
    zones: &[ZoneId],
    filter: &[FieldPredicate],
    ctx: &EvalContext<'_>,
) -> Result<Vec<Item>, EvalError> {
    let resolver = ContextResolver::new(*ctx);
    let mut items = Vec::new();
    for zone in zones {
        let Some(tokens) = ctx.state.zones.get(zone) else {
            continue;
        };
        for token in tokens {
            if token_matches(token, filter, &resolver)? {
                items.push(Item::Token(token.id));
            }
        }
    }
    Ok(items)
}

fn map_spaces(ctx: &EvalContext<'_>) -> Vec<ZoneId> {
    ctx.state
        .zones
        .keys()
        .filter(|zone| ctx.def.zone_def(zone).is_some_and(|def| def.map_space))
        .cloned()
        .collect()
}

/// Zones adjacent to `zone` in either direction, by id.
fn adjacent_zones(zone: &ZoneId, ctx: &EvalContext<'_>) -> Vec<ZoneId> {
    ctx.state
        .zones
        .keys()
        .filter(|other| *other != zone && ctx.def.are_adjacent(zone, other))
        .cloned()
        .collect()
}

fn filter_zones(
    zones: Vec<ZoneId>,
    filter: Option<&ZoneFilter>,
    ctx: &EvalContext<'_>,
) -> Result<Vec<ZoneId>, EvalError> {
    let Some(filter) = filter else {
        return Ok(zones);
    };
    let mut kept = Vec::with_capacity(zones.len());
    for zone in zones {
        if bound_condition(&filter.bind, Item::Zone(zone.clone()), &filter.condition, ctx)? {
            kept.push(zone);
        }
    }
    Ok(kept)
}

fn connected_zones(
    start: &ZoneId,
    via: Option<&ZoneFilter>,
    max_depth: Option<u32>,
    ctx: &EvalContext<'_>,
) -> Result<Vec<ZoneId>, EvalError> {
    let mut seen = BTreeSet::from([start.clone()]);
    let mut queue = VecDeque::from([(start.clone(), 0u32)]);
    while let Some((zone, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|limit| depth >= limit) {
            continue;
        }
        let neighbours = adjacent_zones(&zone, ctx)
            .into_iter()
            .filter(|n| !seen.contains(n))
            .collect();
        for next in filter_zones(neighbours, via, ctx)? {
            seen.insert(next.clone());
            queue.push_back((next, depth + 1));
        }
    }
    seen.remove(start);
    Ok(seen.into_iter().collect())
}

fn asset_rows(
    table_id: &str,
    filter: &[FieldPredicate],
    ctx: &EvalContext<'_>,
) -> Result<Vec<Item>, EvalError> {
    let table = ctx.def.table(table_id).ok_or_else(|| EvalError::UnknownTable {
        table: table_id.to_owned(),
        context: ErrorContext::new(),
    })?;
    let resolver = ContextResolver::new(*ctx);
    let plan = plan_lookup(table, filter, &resolver)?;
    let mut items = Vec::new();
    for index in candidate_rows(table, &plan) {
        let Some(row) = table.row(index) else {
            continue;
        };
        if matches_all(filter, |field| row.get(field).cloned(), &resolver)? {
            items.push(Item::Row {
                table: table_id.to_owned(),
                row: index,
            });
        }
    }
    Ok(items)
}

/// `min..=max`, refused before allocation when wider than `limit`.
fn int_range(min: i64, max: i64, limit: u32) -> Result<Vec<Item>, EvalError> {
    if min > max {
        return Ok(Vec::new());
    }
    let span = i128::from(max) - i128::from(min) + 1;
    if span > i128::from(limit) {
        return Err(EvalError::QueryBudgetExceeded {
            limit,
            context: ErrorContext::new()
                .with_field("intsInRange")
                .with_value(format!("{min}..={max}")),
        });
    }
    Ok((min..=max).map(Item::Int).collect())
}

fn ints_in_var_range(
    var: &str,
    player: Option<&PlayerSel>,
    min: Option<&ValueExpr>,
    max: Option<&ValueExpr>,
    ctx: &EvalContext<'_>,
) -> Result<Vec<Item>, EvalError> {
    let decl = match player {
        Some(player) => {
            resolve_player(player, ctx)?;
            ctx.def.player_var(var)
        }
        None => ctx.def.global_var(var),
    }
    .ok_or_else(|| EvalError::missing_variable(var))?;
    if decl.ty != ValueType::Int {
        return Err(EvalError::type_mismatch(var, decl.ty));
    }

    let bound = |expr: Option<&ValueExpr>, declared: Option<i64>, which: &str| {
        match (expr, declared) {
            (Some(expr), _) => eval_int(expr, ctx),
            (None, Some(declared)) => Ok(declared),
            (None, None) => Err(EvalError::TypeMismatch {
                context: ErrorContext::new()
                    .with_field(var)
                    .with_message(format!("variable has no declared {which} bound")),
            }),
        }
    };
    let low = bound(min, decl.min, "min")?;
    let high = bound(max, decl.max, "max")?;
    int_range(
        low.max(decl.min.unwrap_or(low)),
        high.min(decl.max.unwrap_or(high)),
        ctx.query_limit,
    )
}
