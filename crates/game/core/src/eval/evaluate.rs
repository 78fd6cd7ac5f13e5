use super::refs::resolve_reference;
use super::{
    AggregateOp, ArithOp, CmpOp, Condition, EvalContext, EvalError, ValueExpr, apply_arith,
    resolve_zone,
};
use crate::error::ErrorContext;
use crate::query::{Query, eval_query};
use crate::value::{Item, Value, is_safe_integer};

pub fn eval_value(expr: &ValueExpr, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    match expr {
        ValueExpr::Lit(value) => Ok(value.clone()),
        ValueExpr::Ref(reference) => resolve_reference(reference, ctx),
        ValueExpr::Arith { op, left, right } => {
            let l = eval_int(left, ctx)?;
            let r = eval_int(right, ctx)?;
            apply_arith(*op, l, r).map(Value::Int)
        }
        ValueExpr::Aggregate {
            op,
            query,
            bind,
            value,
        } => eval_aggregate(*op, query, bind, value.as_deref(), ctx),
        ValueExpr::If {
            when,
            then,
            otherwise,
        } => {
            if eval_condition(when, ctx)? {
                eval_value(then, ctx)
            } else {
                eval_value(otherwise, ctx)
            }
        }
    }
}

/// Evaluates an expression that must produce a safe integer.
pub fn eval_int(expr: &ValueExpr, ctx: &EvalContext<'_>) -> Result<i64, EvalError> {
    match eval_value(expr, ctx)? {
        Value::Int(v) if is_safe_integer(v) => Ok(v),
        other => Err(EvalError::type_mismatch("int", other)),
    }
}

fn item_int(item: &Item, bind: &str) -> Result<i64, EvalError> {
    match item.encode() {
        Some(Value::Int(v)) if is_safe_integer(v) => Ok(v),
        _ => Err(EvalError::type_mismatch(bind, format!("{item:?}"))),
    }
}

fn eval_aggregate(
    op: AggregateOp,
    query: &Query,
    bind: &str,
    value: Option<&ValueExpr>,
    ctx: &EvalContext<'_>,
) -> Result<Value, EvalError> {
    let items = eval_query(query, ctx)?;
    let fold = match op {
        AggregateOp::Count => return Ok(Value::Int(items.len() as i64)),
        AggregateOp::Sum => ArithOp::Add,
        AggregateOp::Min => ArithOp::Min,
        AggregateOp::Max => ArithOp::Max,
    };
    let mut acc: Option<i64> = None;
    for item in items {
        let v = match value {
            Some(expr) => {
                let mut scoped = ctx.bindings.clone();
                scoped.insert(bind.to_owned(), item);
                eval_int(expr, &ctx.with_bindings(&scoped))?
            }
            None => item_int(&item, bind)?,
        };
        acc = Some(match acc {
            None => v,
            Some(a) => apply_arith(fold, a, v)?,
        });
    }

    match (op, acc) {
        (_, Some(v)) => Ok(Value::Int(v)),
        (AggregateOp::Sum, None) => Ok(Value::Int(0)),
        (_, None) => Err(EvalError::EmptyAggregate {
            op: op.as_str(),
            context: ErrorContext::new().with_field(bind),
        }),
    }
}

pub fn eval_condition(cond: &Condition, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
    match cond {
        Condition::Const(value) => Ok(*value),
        Condition::Not(inner) => Ok(!eval_condition(inner, ctx)?),
        Condition::And(parts) => {
            for part in parts {
                if !eval_condition(part, ctx)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(parts) => {
            for part in parts {
                if eval_condition(part, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Compare { op, left, right } => {
            compare(*op, &eval_value(left, ctx)?, &eval_value(right, ctx)?)
        }
        Condition::InQuery { item, query } => {
            let needle = eval_value(item, ctx)?;
            let items = eval_query(query, ctx)?;
            Ok(items.iter().any(|i| i.encode().as_ref() == Some(&needle)))
        }
        Condition::Exists(query) => Ok(!eval_query(query, ctx)?.is_empty()),
        Condition::Adjacent { from, to } => {
            let a = resolve_zone(from, ctx)?;
            let b = resolve_zone(to, ctx)?;
            Ok(ctx.def.are_adjacent(&a, &b))
        }
        Condition::Value(expr) => match eval_value(expr, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::type_mismatch("condition", other)),
        },
    }
}

/// Strict comparison: both sides must share a type; ordering needs ints.
fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    if left.value_type() != right.value_type() {
        return Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_field(format!("{op:?}"))
                .with_value(format!("{left} vs {right}")),
        });
    }
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::Neq => Ok(left != right),
        _ => {
            let (Value::Int(l), Value::Int(r)) = (left, right) else {
                return Err(EvalError::type_mismatch(format!("{op:?}"), left));
            };
            Ok(match op {
                CmpOp::Lt => l < r,
                CmpOp::Lte => l <= r,
                CmpOp::Gt => l > r,
                _ => l >= r,
            })
        }
    }
}
