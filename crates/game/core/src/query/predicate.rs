//! Strictly typed field predicates.
//!
//! Matching never coerces: a scalar operand must have the field's type, and
//! a set operand must be homogeneous with elements of the field's type.
//! Violations are type-mismatch faults, not `false`.

use serde::{Deserialize, Serialize};

use crate::error::ErrorContext;
use crate::eval::{EvalContext, EvalError, ValueExpr, eval_value};
use crate::state::Token;
use crate::value::{Item, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PredicateOp {
    Eq,
    Neq,
    In,
    NotIn,
}

/// Right-hand side of a predicate as written in the definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PredicateValue {
    Literal(Value),
    Set(Vec<Value>),
    /// Evaluated against the current context.
    Expr(ValueExpr),
    /// A binding; lists resolve to sets.
    Binding(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldPredicate {
    pub field: String,
    pub op: PredicateOp,
    pub value: PredicateValue,
}

impl FieldPredicate {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: PredicateOp::Eq,
            value: PredicateValue::Literal(value),
        }
    }

    pub fn one_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            op: PredicateOp::In,
            value: PredicateValue::Set(values),
        }
    }
}

/// Resolved right-hand side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PredicateOperand {
    Scalar(Value),
    Set(Vec<Value>),
}

impl PredicateOperand {
    /// Builds a set operand, rejecting mixed element types.
    pub fn set(field: &str, values: Vec<Value>) -> Result<Self, EvalError> {
        if let Some(first) = values.first() {
            let ty = first.value_type();
            if let Some(odd) = values.iter().find(|v| v.value_type() != ty) {
                return Err(EvalError::TypeMismatch {
                    context: ErrorContext::new()
                        .with_field(field)
                        .with_value(odd)
                        .with_message("predicate set is not homogeneous"),
                });
            }
        }
        Ok(Self::Set(values))
    }
}

/// Turns written predicate values into operands.
///
/// `Ok(None)` means the value could not be resolved; the predicate then
/// fails closed.
pub trait PredicateResolver {
    fn resolve(&self, field: &str, value: &PredicateValue)
    -> Result<Option<PredicateOperand>, EvalError>;
}

/// Resolves literals only. Dynamic values are left unresolved.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultResolver;

impl PredicateResolver for DefaultResolver {
    fn resolve(
        &self,
        field: &str,
        value: &PredicateValue,
    ) -> Result<Option<PredicateOperand>, EvalError> {
        match value {
            PredicateValue::Literal(v) => Ok(Some(PredicateOperand::Scalar(v.clone()))),
            PredicateValue::Set(values) => PredicateOperand::set(field, values.clone()).map(Some),
            PredicateValue::Expr(_) | PredicateValue::Binding(_) => Ok(None),
        }
    }
}

/// Resolves dynamic values against an evaluation context.
#[derive(Clone, Copy, Debug)]
pub struct ContextResolver<'a> {
    ctx: EvalContext<'a>,
}

impl<'a> ContextResolver<'a> {
    pub fn new(ctx: EvalContext<'a>) -> Self {
        Self { ctx }
    }
}

impl PredicateResolver for ContextResolver<'_> {
    fn resolve(
        &self,
        field: &str,
        value: &PredicateValue,
    ) -> Result<Option<PredicateOperand>, EvalError> {
        match value {
            PredicateValue::Expr(expr) => {
                eval_value(expr, &self.ctx).map(|v| Some(PredicateOperand::Scalar(v)))
            }
            PredicateValue::Binding(name) => {
                let encode = |item: &Item| {
                    item.encode()
                        .ok_or_else(|| EvalError::type_mismatch(name.as_str(), format!("{item:?}")))
                };
                match self.ctx.binding(name)? {
                    Item::List(items) => {
                        let values = items.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
                        PredicateOperand::set(field, values).map(Some)
                    }
                    item => Ok(Some(PredicateOperand::Scalar(encode(item)?))),
                }
            }
            literal => DefaultResolver.resolve(field, literal),
        }
    }
}

pub(super) fn mismatch(field: &str, value: &Value, message: &str) -> EvalError {
    EvalError::TypeMismatch {
        context: ErrorContext::new()
            .with_field(field)
            .with_value(value)
            .with_message(message),
    }
}

/// Matches one field value against a resolved operand.
///
/// A missing field never matches.
pub fn match_predicate(
    field: &str,
    value: Option<&Value>,
    op: PredicateOp,
    operand: &PredicateOperand,
) -> Result<bool, EvalError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match (op, operand) {
        (PredicateOp::Eq | PredicateOp::Neq, PredicateOperand::Scalar(expected)) => {
            if expected.value_type() != value.value_type() {
                return Err(mismatch(field, expected, "operand type differs from field type"));
            }
            Ok((value == expected) == (op == PredicateOp::Eq))
        }
        (PredicateOp::In | PredicateOp::NotIn, PredicateOperand::Set(set)) => {
            if let Some(first) = set.first() {
                if first.value_type() != value.value_type() {
                    return Err(mismatch(field, first, "set element type differs from field type"));
                }
            }
            Ok(set.contains(value) == (op == PredicateOp::In))
        }
        (PredicateOp::Eq | PredicateOp::Neq, PredicateOperand::Set(_)) => {
            Err(mismatch(field, value, "equality needs a scalar operand"))
        }
        (PredicateOp::In | PredicateOp::NotIn, PredicateOperand::Scalar(scalar)) => {
            Err(mismatch(field, scalar, "membership needs a set operand"))
        }
    }
}

/// Evaluates a conjunction of predicates over a field lookup.
pub fn matches_all<R: PredicateResolver + ?Sized>(
    predicates: &[FieldPredicate],
    lookup: impl Fn(&str) -> Option<Value>,
    resolver: &R,
) -> Result<bool, EvalError> {
    for predicate in predicates {
        let Some(operand) = resolver.resolve(&predicate.field, &predicate.value)? else {
            return Ok(false);
        };
        let value = lookup(&predicate.field);
        if !match_predicate(&predicate.field, value.as_ref(), predicate.op, &operand)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Token filter with `id` and `kind` pseudo-fields.
pub fn token_matches<R: PredicateResolver + ?Sized>(
    token: &Token,
    predicates: &[FieldPredicate],
    resolver: &R,
) -> Result<bool, EvalError> {
    matches_all(predicates, |field| token.field(field), resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::fixtures::small_def;
    use crate::eval::Bindings;
    use crate::state::fixtures::small_state;
    use crate::state::{PlayerId, TokenId};

    fn token() -> Token {
        Token::new(TokenId(4), "troop")
            .with_prop("strength", 3i64)
            .with_prop("faction", "red")
    }

    #[test]
    fn strict_scalar_matching() {
        let red = PredicateOperand::Scalar("red".into());
        let value = Value::from("red");
        assert_eq!(match_predicate("faction", Some(&value), PredicateOp::Eq, &red), Ok(true));
        assert_eq!(match_predicate("faction", Some(&value), PredicateOp::Neq, &red), Ok(false));
        assert_eq!(match_predicate("faction", None, PredicateOp::Eq, &red), Ok(false));

        let number = PredicateOperand::Scalar(Value::Int(3));
        assert!(matches!(
            match_predicate("faction", Some(&value), PredicateOp::Eq, &number),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn set_membership_requires_matching_homogeneous_sets() {
        assert!(matches!(
            PredicateOperand::set("strength", vec![Value::Int(1), Value::from("1")]),
            Err(EvalError::TypeMismatch { .. })
        ));

        let set = PredicateOperand::set("strength", vec![Value::Int(1), Value::Int(3)]).unwrap();
        let three = Value::Int(3);
        assert_eq!(match_predicate("strength", Some(&three), PredicateOp::In, &set), Ok(true));
        assert_eq!(match_predicate("strength", Some(&three), PredicateOp::NotIn, &set), Ok(false));

        let words = Value::from("3");
        assert!(matches!(
            match_predicate("strength", Some(&words), PredicateOp::In, &set),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert_eq!(
            match_predicate("strength", Some(&three), PredicateOp::NotIn, &PredicateOperand::Set(Vec::new())),
            Ok(true)
        );
    }

    #[test]
    fn id_pseudo_field_and_fail_closed_defaults() {
        let token = token();
        let by_id = [FieldPredicate::eq("id", Value::Int(4))];
        assert_eq!(token_matches(&token, &by_id, &DefaultResolver), Ok(true));

        let dynamic = [FieldPredicate {
            field: "strength".into(),
            op: PredicateOp::Eq,
            value: PredicateValue::Expr(ValueExpr::int(3)),
        }];
        assert_eq!(token_matches(&token, &dynamic, &DefaultResolver), Ok(false));

        let (def, state) = (small_def(), small_state());
        let bindings = Bindings::new();
        let resolver = ContextResolver::new(EvalContext::new(&def, &state, &bindings, PlayerId(0)));
        assert_eq!(token_matches(&token, &dynamic, &resolver), Ok(true));
    }

    #[test]
    fn list_bindings_resolve_to_sets() {
        let (def, state) = (small_def(), small_state());
        let bindings = Bindings::from([(
            "picked".to_owned(),
            Item::List(vec![Item::Token(TokenId(4)), Item::Token(TokenId(9))]),
        )]);
        let resolver = ContextResolver::new(EvalContext::new(&def, &state, &bindings, PlayerId(0)));
        let picked = [FieldPredicate {
            field: "id".into(),
            op: PredicateOp::In,
            value: PredicateValue::Binding("picked".into()),
        }];
        assert_eq!(token_matches(&token(), &picked, &resolver), Ok(true));
    }
}
