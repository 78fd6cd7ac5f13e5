//! Row lookup planning for asset-table queries.

use std::collections::BTreeMap;

use super::predicate::{
    FieldPredicate, PredicateOp, PredicateOperand, PredicateResolver, mismatch,
};
use crate::def::AssetTable;
use crate::eval::EvalError;
use crate::value::Value;

/// How an asset-row query will be answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupPlan {
    /// Equalities pin unique key number `key` to `tuple`.
    Indexed { key: usize, tuple: Vec<Value> },
    /// Two equalities on one field disagree; nothing can match.
    Empty,
    Scan,
}

/// Chooses a plan from the equality constraints in `filter`.
///
/// The plan only narrows candidates; the full filter is still applied to
/// each candidate row. Pinned values must have the declared field type, so
/// an indexed lookup faults exactly where a scan would.
pub fn plan_lookup<R: PredicateResolver + ?Sized>(
    table: &AssetTable,
    filter: &[FieldPredicate],
    resolver: &R,
) -> Result<LookupPlan, EvalError> {
    let mut pinned: BTreeMap<&str, Value> = BTreeMap::new();
    for predicate in filter.iter().filter(|p| p.op == PredicateOp::Eq) {
        let Some(PredicateOperand::Scalar(value)) =
            resolver.resolve(&predicate.field, &predicate.value)?
        else {
            continue;
        };
        let field = predicate.field.as_str();
        if let Some(declared) = table.fields.get(field) {
            if value.value_type() != *declared {
                return Err(mismatch(field, &value, "operand type differs from field type"));
            }
        }
        match pinned.get(predicate.field.as_str()) {
            Some(existing) if *existing != value => return Ok(LookupPlan::Empty),
            Some(_) => {}
            None => {
                pinned.insert(predicate.field.as_str(), value);
            }
        }
    }

    for (key, fields) in table.unique_keys.iter().enumerate() {
        let tuple: Option<Vec<Value>> = fields
            .iter()
            .map(|field| pinned.get(field.as_str()).cloned())
            .collect();
        if let Some(tuple) = tuple {
            return Ok(LookupPlan::Indexed { key, tuple });
        }
    }
    Ok(LookupPlan::Scan)
}

/// Candidate row indices for a plan, in table order.
pub fn candidate_rows(table: &AssetTable, plan: &LookupPlan) -> Vec<usize> {
    match plan {
        LookupPlan::Indexed { key, tuple } => table.lookup(*key, tuple).into_iter().collect(),
        LookupPlan::Empty => Vec::new(),
        LookupPlan::Scan => (0..table.rows.len()).collect(),
    }
}
