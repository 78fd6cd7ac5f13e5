//! Control-flow effects. Nested effects run in a binding scope that is
//! restored on exit.

use super::context::{EffectContext, Flow};
use super::{Effect, EffectError};
use crate::error::ErrorContext;
use crate::eval::{Condition, EvalError, ValueExpr, eval_condition, eval_int, eval_value};
use crate::query::{Query, eval_query};
use crate::value::Item;
use crate::warning::Warning;

pub(super) fn if_then(
    ctx: &mut EffectContext<'_>,
    when: &Condition,
    then: &[Effect],
    otherwise: &[Effect],
) -> Result<Flow, EffectError> {
    if eval_condition(when, &ctx.eval())? {
        ctx.run_scoped(then)
    } else {
        ctx.run_scoped(otherwise)
    }
}

pub(super) fn for_each(
    ctx: &mut EffectContext<'_>,
    bind: &str,
    over: &Query,
    limit: Option<&ValueExpr>,
    effects: &[Effect],
) -> Result<Flow, EffectError> {
    let (mut items, limit) = {
        let eval = ctx.eval();
        let limit = limit.map(|expr| eval_int(expr, &eval)).transpose()?;
        (eval_query(over, &eval)?, limit)
    };
    if let Some(limit) = limit {
        let limit = usize::try_from(limit).map_err(|_| EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_effect("forEach")
                .with_field("limit")
                .with_value(limit),
        })?;
        items.truncate(limit);
    }
    if items.is_empty() {
        ctx.warn(Warning::ZeroIterationForEach {
            bind: bind.to_owned(),
        });
        return Ok(Flow::Continue);
    }

    for (index, item) in items.into_iter().enumerate() {
        let saved = ctx.bindings.clone();
        ctx.bind(bind, item);
        ctx.loop_path.push(index);
        let flow = ctx.run(effects);
        ctx.loop_path.pop();
        ctx.bindings = saved;
        if let Flow::Suspend(pending) = flow? {
            return Ok(Flow::Suspend(pending));
        }
    }
    Ok(Flow::Continue)
}

pub(super) fn let_in(
    ctx: &mut EffectContext<'_>,
    bind: &str,
    value: &ValueExpr,
    effects: &[Effect],
) -> Result<Flow, EffectError> {
    let value = eval_value(value, &ctx.eval())?;
    let saved = ctx.bindings.clone();
    ctx.bind(bind, Item::from(value));
    let flow = ctx.run(effects);
    ctx.bindings = saved;
    flow
}

pub(super) fn bind_value(
    ctx: &mut EffectContext<'_>,
    bind: &str,
    value: &ValueExpr,
) -> Result<(), EffectError> {
    let value = eval_value(value, &ctx.eval())?;
    ctx.bind(bind, Item::from(value));
    Ok(())
}

pub(super) fn roll_random(
    ctx: &mut EffectContext<'_>,
    bind: &str,
    min: &ValueExpr,
    max: &ValueExpr,
    effects: &[Effect],
) -> Result<Flow, EffectError> {
    let (min, max) = {
        let eval = ctx.eval();
        (eval_int(min, &eval)?, eval_int(max, &eval)?)
    };
    let rolled = ctx.next_int(min, max)?;
    let saved = ctx.bindings.clone();
    ctx.bind(bind, Item::Int(rolled));
    let flow = ctx.run(effects);
    ctx.bindings = saved;
    flow
}
