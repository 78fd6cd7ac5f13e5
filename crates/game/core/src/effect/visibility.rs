//! `reveal` and `conceal`.
//!
//! Filters are resolved to literal values when the grant is made, so a grant
//! keeps its meaning after the bindings that produced it are gone.

use super::EffectError;
use super::context::EffectContext;
use crate::eval::{EvalError, PlayerSel, ZoneSel, resolve_players, resolve_zone};
use crate::query::{
    ContextResolver, FieldPredicate, PredicateOp, PredicateOperand, PredicateResolver,
};
use crate::state::{GrantPredicate, RevealGrant};

fn grant_filter(
    ctx: &EffectContext<'_>,
    filter: &[FieldPredicate],
) -> Result<Vec<GrantPredicate>, EvalError> {
    let resolver = ContextResolver::new(ctx.eval());
    let mut resolved = Vec::with_capacity(filter.len());
    for predicate in filter {
        let field = predicate.field.as_str();
        let operand = resolver
            .resolve(field, &predicate.value)?
            .ok_or_else(|| EvalError::type_mismatch(field, "unresolved predicate value"))?;
        let values = match (predicate.op, operand) {
            (PredicateOp::Eq | PredicateOp::Neq, PredicateOperand::Scalar(value)) => vec![value],
            (PredicateOp::In | PredicateOp::NotIn, PredicateOperand::Set(values)) => values,
            (_, operand) => return Err(EvalError::type_mismatch(field, format!("{operand:?}"))),
        };
        resolved.push(GrantPredicate::new(field, predicate.op, values));
    }
    Ok(resolved)
}

pub(super) fn reveal(
    ctx: &mut EffectContext<'_>,
    zone: &ZoneSel,
    to: &PlayerSel,
    filter: &[FieldPredicate],
) -> Result<(), EffectError> {
    let (zone, observers) = {
        let eval = ctx.eval();
        (resolve_zone(zone, &eval)?, resolve_players(to, &eval)?)
    };
    let grant = RevealGrant::new(observers, grant_filter(ctx, filter)?);
    if !ctx.state.add_reveal(zone.clone(), grant) {
        tracing::trace!(zone = %zone, "reveal grant already present");
    }
    Ok(())
}

pub(super) fn conceal(
    ctx: &mut EffectContext<'_>,
    zone: &ZoneSel,
    from: Option<&PlayerSel>,
) -> Result<(), EffectError> {
    let (zone, observers) = {
        let eval = ctx.eval();
        let observers = from.map(|sel| resolve_players(sel, &eval)).transpose()?;
        (resolve_zone(zone, &eval)?, observers)
    };
    ctx.state.conceal(&zone, observers.as_deref());
    Ok(())
}
