//! Reference resolution dispatch table.
//!
//! Every [`Reference`] variant maps to exactly one resolver below.

use super::{EvalContext, EvalError, PlayerSel, Reference, ZoneSel, resolve_player, resolve_zone};
use crate::error::ErrorContext;
use crate::value::{Item, Value};

pub fn resolve_reference(reference: &Reference, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    match reference {
        Reference::GlobalVar(name) => resolve_global_var(name, ctx),
        Reference::PlayerVar { player, var } => resolve_player_var(player, var, ctx),
        Reference::TokenProp { token, prop } => resolve_token_prop(token, prop, ctx),
        Reference::ZoneProp { zone, prop } => resolve_zone_prop(zone, prop, ctx),
        Reference::TableField { table, row, field } => resolve_table_field(table, row, field, ctx),
        Reference::Marker { zone, marker } => resolve_marker(zone, marker, ctx),
        Reference::GlobalMarker(marker) => resolve_global_marker(marker, ctx),
        Reference::Binding(name) => resolve_binding(name, ctx),
        Reference::ActivePlayer => Ok(Value::Int(i64::from(ctx.state.active_player.0))),
        Reference::Actor => Ok(Value::Int(i64::from(ctx.actor.0))),
        Reference::TurnCount => Ok(Value::Int(i64::from(ctx.state.turn_count))),
        Reference::CurrentPhase => Ok(Value::Str(ctx.state.current_phase.as_str().to_owned())),
    }
}

pub fn resolve_global_var(name: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    ctx.state
        .global_vars
        .get(name)
        .cloned()
        .ok_or_else(|| EvalError::missing_variable(name))
}

pub fn resolve_player_var(
    player: &PlayerSel,
    var: &str,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvalError> {
    let player = resolve_player(player, ctx)?;
    ctx.state
        .player_var(player, var)
        .cloned()
        .ok_or_else(|| EvalError::missing_variable(var))
}

pub fn resolve_token_prop(token: &str, prop: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    let id = ctx
        .binding(token)?
        .as_token()
        .ok_or_else(|| EvalError::type_mismatch(token, "expected a token"))?;
    let found = ctx.state.find_token(id).ok_or(EvalError::TokenNotFound {
        token: id,
        context: ErrorContext::new().with_field(token),
    })?;
    found.field(prop).ok_or_else(|| EvalError::MissingVariable {
        name: prop.to_owned(),
        context: ErrorContext::new()
            .with_field(prop)
            .with_value(id)
            .with_message("token has no such property"),
    })
}

/// Static zone attribute. `id` resolves to the concrete zone id.
pub fn resolve_zone_prop(zone: &ZoneSel, prop: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    let zone = resolve_zone(zone, ctx)?;
    if prop == "id" {
        return Ok(Value::Str(zone.as_str().to_owned()));
    }
    ctx.def
        .zone_def(&zone)
        .and_then(|def| def.attributes.get(prop))
        .cloned()
        .ok_or_else(|| EvalError::missing_variable(prop))
}

pub fn resolve_table_field(
    table: &str,
    row: &str,
    field: &str,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvalError> {
    let index = match ctx.binding(row)? {
        Item::Row { table: bound, row } if bound == table => *row,
        other => return Err(EvalError::type_mismatch(row, format!("{other:?}"))),
    };
    let asset = ctx.def.table(table).ok_or_else(|| EvalError::UnknownTable {
        table: table.to_owned(),
        context: ErrorContext::new().with_field(field),
    })?;
    asset
        .row(index)
        .and_then(|r| r.get(field))
        .cloned()
        .ok_or_else(|| EvalError::missing_variable(field))
}

pub fn resolve_marker(zone: &ZoneSel, marker: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    let zone = resolve_zone(zone, ctx)?;
    if let Some(state) = ctx.state.marker_state(&zone, marker) {
        return Ok(Value::from(state));
    }
    ctx.def
        .marker(marker)
        .map(|lattice| Value::from(lattice.default.as_str()))
        .ok_or_else(|| EvalError::UnknownMarker {
            marker: marker.to_owned(),
            context: ErrorContext::new().with_value(zone),
        })
}

pub fn resolve_global_marker(marker: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    if let Some(state) = ctx.state.global_markers.get(marker) {
        return Ok(Value::from(state.as_str()));
    }
    ctx.def
        .global_marker(marker)
        .map(|lattice| Value::from(lattice.default.as_str()))
        .ok_or_else(|| EvalError::UnknownMarker {
            marker: marker.to_owned(),
            context: ErrorContext::new(),
        })
}

/// Scalar encoding of a binding. Rows and lists are not scalars.
pub fn resolve_binding(name: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    let item = ctx.binding(name)?;
    item.encode()
        .ok_or_else(|| EvalError::type_mismatch(name, format!("{item:?}")))
}
