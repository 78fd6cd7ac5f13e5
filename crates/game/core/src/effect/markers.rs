//! Space and global marker effects.

use super::EffectError;
use super::context::EffectContext;
use crate::def::MarkerLattice;
use crate::error::ErrorContext;
use crate::eval::refs::{resolve_global_marker, resolve_marker};
use crate::eval::{EvalError, ValueExpr, ZoneSel, eval_int, resolve_zone};
use crate::state::ZoneId;
use crate::trigger::KernelEvent;
use crate::value::Value;

fn unknown(marker: &str) -> EvalError {
    EvalError::UnknownMarker {
        marker: marker.to_owned(),
        context: ErrorContext::new().with_field(marker),
    }
}

fn checked<'l>(lattice: &'l MarkerLattice, state: &str) -> Result<&'l str, EffectError> {
    lattice
        .index_of(state)
        .map(|index| lattice.states[index].as_str())
        .ok_or_else(|| EffectError::InvalidMarkerState {
            marker: lattice.id.clone(),
            state: state.to_owned(),
            context: ErrorContext::new().with_value(state),
        })
}

fn current(value: Value) -> String {
    match value {
        Value::Str(state) => state,
        other => other.to_string(),
    }
}

fn write_space(ctx: &mut EffectContext<'_>, zone: ZoneId, marker: &str, old: String, new: &str) {
    if old == new {
        return;
    }
    ctx.state
        .markers
        .entry(zone.clone())
        .or_default()
        .insert(marker.to_owned(), new.to_owned());
    ctx.emit(KernelEvent::MarkerChanged {
        marker: marker.to_owned(),
        zone: Some(zone),
        old,
        new: new.to_owned(),
    });
}

fn write_global(ctx: &mut EffectContext<'_>, marker: &str, old: String, new: &str) {
    if old == new {
        return;
    }
    ctx.state
        .global_markers
        .insert(marker.to_owned(), new.to_owned());
    ctx.emit(KernelEvent::MarkerChanged {
        marker: marker.to_owned(),
        zone: None,
        old,
        new: new.to_owned(),
    });
}

pub(super) fn set_marker(
    ctx: &mut EffectContext<'_>,
    zone: &ZoneSel,
    marker: &str,
    state: &str,
) -> Result<(), EffectError> {
    let lattice = ctx.def().marker(marker).ok_or_else(|| unknown(marker))?;
    let new = checked(lattice, state)?;
    let (zone, old) = {
        let eval = ctx.eval();
        let old = resolve_marker(zone, marker, &eval)?;
        (resolve_zone(zone, &eval)?, current(old))
    };
    write_space(ctx, zone, marker, old, new);
    Ok(())
}

/// Steps the marker along its lattice, stopping at either end.
pub(super) fn shift_marker(
    ctx: &mut EffectContext<'_>,
    zone: &ZoneSel,
    marker: &str,
    delta: &ValueExpr,
) -> Result<(), EffectError> {
    let lattice = ctx.def().marker(marker).ok_or_else(|| unknown(marker))?;
    let (zone, old, delta) = {
        let eval = ctx.eval();
        let old = current(resolve_marker(zone, marker, &eval)?);
        (resolve_zone(zone, &eval)?, old, eval_int(delta, &eval)?)
    };
    let new = lattice.shift(&old, delta).ok_or_else(|| EffectError::InvalidMarkerState {
        marker: marker.to_owned(),
        state: old.clone(),
        context: ErrorContext::new().with_effect("shiftMarker"),
    })?;
    write_space(ctx, zone, marker, old, new);
    Ok(())
}

pub(super) fn set_global_marker(
    ctx: &mut EffectContext<'_>,
    marker: &str,
    state: &str,
) -> Result<(), EffectError> {
    let lattice = ctx.def().global_marker(marker).ok_or_else(|| unknown(marker))?;
    let new = checked(lattice, state)?;
    let old = current(resolve_global_marker(marker, &ctx.eval())?);
    write_global(ctx, marker, old, new);
    Ok(())
}

pub(super) fn shift_global_marker(
    ctx: &mut EffectContext<'_>,
    marker: &str,
    delta: &ValueExpr,
) -> Result<(), EffectError> {
    let lattice = ctx.def().global_marker(marker).ok_or_else(|| unknown(marker))?;
    let (old, delta) = {
        let eval = ctx.eval();
        (
            current(resolve_global_marker(marker, &eval)?),
            eval_int(delta, &eval)?,
        )
    };
    let new = lattice.shift(&old, delta).ok_or_else(|| EffectError::InvalidMarkerState {
        marker: marker.to_owned(),
        state: old.clone(),
        context: ErrorContext::new().with_effect("shiftGlobalMarker"),
    })?;
    write_global(ctx, marker, old, new);
    Ok(())
}
