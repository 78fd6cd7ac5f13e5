//! Expression, condition and reference ASTs.

use serde::{Deserialize, Serialize};

use super::arith::ArithOp;
use crate::query::Query;
use crate::state::ZoneId;
use crate::value::Value;

/// Scalar-valued expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueExpr {
    Lit(Value),
    Ref(Reference),
    Arith {
        op: ArithOp,
        left: Box<ValueExpr>,
        right: Box<ValueExpr>,
    },
    /// Folds `value` over the items of `query`, each bound under `bind`.
    ///
    /// Without `value` the encoded item itself is aggregated.
    Aggregate {
        op: AggregateOp,
        query: Box<Query>,
        bind: String,
        #[serde(default)]
        value: Option<Box<ValueExpr>>,
    },
    If {
        when: Box<Condition>,
        then: Box<ValueExpr>,
        otherwise: Box<ValueExpr>,
    },
}

impl ValueExpr {
    pub fn int(value: i64) -> Self {
        Self::Lit(Value::Int(value))
    }

    pub fn arith(op: ArithOp, left: ValueExpr, right: ValueExpr) -> Self {
        Self::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn binding(name: impl Into<String>) -> Self {
        Self::Ref(Reference::Binding(name.into()))
    }
}

impl From<Value> for ValueExpr {
    fn from(value: Value) -> Self {
        Self::Lit(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateOp {
    Sum,
    Min,
    Max,
    /// Never evaluates the per-item expression.
    Count,
}

impl AggregateOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Boolean-valued expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Const(bool),
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Compare {
        op: CmpOp,
        left: ValueExpr,
        right: ValueExpr,
    },
    /// True if the encoded value of `item` is produced by `query`.
    InQuery { item: ValueExpr, query: Box<Query> },
    Exists(Box<Query>),
    Adjacent { from: ZoneSel, to: ZoneSel },
    /// A boolean-valued expression.
    Value(ValueExpr),
}

impl Condition {
    pub fn compare(op: CmpOp, left: ValueExpr, right: ValueExpr) -> Self {
        Self::Compare { op, left, right }
    }
}

/// Tagged reference to a piece of state or definition data.
///
/// Each variant has exactly one resolver in [`super::refs`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Reference {
    GlobalVar(String),
    PlayerVar { player: PlayerSel, var: String },
    /// Property of the token bound under `token`.
    TokenProp { token: String, prop: String },
    /// Static attribute of a zone declaration.
    ZoneProp { zone: ZoneSel, prop: String },
    /// Field of the table row bound under `row`.
    TableField {
        table: String,
        row: String,
        field: String,
    },
    Marker { zone: ZoneSel, marker: String },
    GlobalMarker(String),
    Binding(String),
    ActivePlayer,
    Actor,
    TurnCount,
    CurrentPhase,
}

/// Selects one or more seats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSel {
    Active,
    Actor,
    Id(u32),
    Binding(String),
    /// Seat `offset` positions after the active player, wrapping around.
    Relative(i32),
    All,
    /// Every seat except the actor.
    AllOther,
}

/// Selects a concrete zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneSel {
    Id(ZoneId),
    /// The copy of a player-owned zone belonging to `player`.
    Owned { base: ZoneId, player: PlayerSel },
    Binding(String),
}

impl ZoneSel {
    pub fn id(id: &str) -> Self {
        Self::Id(ZoneId::new(id))
    }
}
