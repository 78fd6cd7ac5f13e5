//! Safe-integer arithmetic.
//!
//! Operands and results must lie in the safe integer range; anything else is
//! a type mismatch. Intermediate products are computed in `i128` so no
//! operation can wrap before the range check.

use serde::{Deserialize, Serialize};

use super::EvalError;
use crate::error::ErrorContext;
use crate::value::is_safe_integer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    /// Truncating division.
    Div,
    FloorDiv,
    CeilDiv,
    /// Remainder with the sign of the dividend.
    Mod,
    Min,
    Max,
}

impl ArithOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "floorDiv",
            Self::CeilDiv => "ceilDiv",
            Self::Mod => "%",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

fn operand_check(op: ArithOp, value: i64) -> Result<i128, EvalError> {
    if !is_safe_integer(value) {
        return Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_field(op.as_str())
                .with_value(value)
                .with_message("operand is not a safe integer"),
        });
    }
    Ok(i128::from(value))
}

pub fn apply_arith(op: ArithOp, left: i64, right: i64) -> Result<i64, EvalError> {
    let l = operand_check(op, left)?;
    let r = operand_check(op, right)?;

    let divides = matches!(
        op,
        ArithOp::Div | ArithOp::FloorDiv | ArithOp::CeilDiv | ArithOp::Mod
    );
    if divides && r == 0 {
        return Err(EvalError::DivisionByZero {
            context: ErrorContext::new().with_field(op.as_str()).with_value(left),
        });
    }

    let result = match op {
        ArithOp::Add => l + r,
        ArithOp::Sub => l - r,
        ArithOp::Mul => l * r,
        ArithOp::Div => l / r,
        ArithOp::FloorDiv => {
            let q = l / r;
            if l % r != 0 && ((l < 0) != (r < 0)) { q - 1 } else { q }
        }
        ArithOp::CeilDiv => {
            let q = l / r;
            if l % r != 0 && ((l < 0) == (r < 0)) { q + 1 } else { q }
        }
        ArithOp::Mod => l % r,
        ArithOp::Min => l.min(r),
        ArithOp::Max => l.max(r),
    };

    match i64::try_from(result) {
        Ok(value) if is_safe_integer(value) => Ok(value),
        _ => Err(EvalError::TypeMismatch {
            context: ErrorContext::new()
                .with_field(op.as_str())
                .with_value(result)
                .with_message("result is not a safe integer"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MAX_SAFE_INTEGER;

    #[test]
    fn division_rounding_modes() {
        assert_eq!(apply_arith(ArithOp::FloorDiv, 7, 2), Ok(3));
        assert_eq!(apply_arith(ArithOp::CeilDiv, 7, 2), Ok(4));
        assert_eq!(apply_arith(ArithOp::Div, -7, 2), Ok(-3));
        assert_eq!(apply_arith(ArithOp::FloorDiv, -7, 2), Ok(-4));
        assert_eq!(apply_arith(ArithOp::CeilDiv, -7, 2), Ok(-3));
        assert_eq!(apply_arith(ArithOp::CeilDiv, 6, 2), Ok(3));
        assert_eq!(apply_arith(ArithOp::Mod, -7, 2), Ok(-1));
    }

    #[test]
    fn zero_divisor_is_division_by_zero() {
        for op in [ArithOp::Div, ArithOp::FloorDiv, ArithOp::CeilDiv, ArithOp::Mod] {
            assert!(matches!(
                apply_arith(op, 5, 0),
                Err(EvalError::DivisionByZero { .. })
            ));
        }
    }

    #[test]
    fn overflow_past_safe_range_is_type_mismatch() {
        assert!(matches!(
            apply_arith(ArithOp::Add, MAX_SAFE_INTEGER, 1),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert!(matches!(
            apply_arith(ArithOp::Mul, i64::MAX, 1),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert_eq!(
            apply_arith(ArithOp::Sub, MAX_SAFE_INTEGER, 1),
            Ok(MAX_SAFE_INTEGER - 1)
        );
    }
}
