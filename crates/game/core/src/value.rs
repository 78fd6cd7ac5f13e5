//! Scalar values and runtime query items.
//!
//! [`Value`] is what variables, token properties and move parameters hold.
//! [`Item`] is what queries produce: it can additionally reference tokens,
//! zones, players and table rows, and carries the encoding rules that decide
//! which items can be offered as choice options.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{PlayerId, TokenId, ZoneId};

/// Largest integer every consumer of the kernel can represent exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Smallest safe integer (-(2^53 - 1)).
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// Returns true if `value` lies inside the safe integer range.
#[inline]
pub const fn is_safe_integer(value: i64) -> bool {
    value >= MIN_SAFE_INTEGER && value <= MAX_SAFE_INTEGER
}

/// A typed scalar cell.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Str(_) => ValueType::Str,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

/// Declared type of a variable, property or table field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Bool,
    Str,
}

impl ValueType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Str => "string",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which family of objects a query enumerates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryDomain {
    Token,
    Zone,
    Other,
}

/// Runtime shape of the items a query produces.
///
/// `Object` items (table rows) have no scalar encoding and can never be
/// offered as choice options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeShape {
    Token,
    Object,
    Number,
    String,
    Unknown,
}

impl RuntimeShape {
    pub const fn is_encodable(&self) -> bool {
        !matches!(self, RuntimeShape::Object)
    }
}

/// An element of a query result or a binding.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Item {
    Int(i64),
    Bool(bool),
    Str(String),
    Token(TokenId),
    Zone(ZoneId),
    Player(PlayerId),
    Row { table: String, row: usize },
    List(Vec<Item>),
}

impl Item {
    pub fn shape(&self) -> RuntimeShape {
        match self {
            Item::Int(_) | Item::Player(_) => RuntimeShape::Number,
            Item::Str(_) | Item::Zone(_) => RuntimeShape::String,
            Item::Token(_) => RuntimeShape::Token,
            Item::Row { .. } => RuntimeShape::Object,
            Item::Bool(_) | Item::List(_) => RuntimeShape::Unknown,
        }
    }

    /// Encodes the item as a move parameter value.
    ///
    /// Tokens encode as their numeric id, players as their seat index and
    /// zones as their id string. Rows and lists have no encoding.
    pub fn encode(&self) -> Option<Value> {
        match self {
            Item::Int(v) => Some(Value::Int(*v)),
            Item::Bool(v) => Some(Value::Bool(*v)),
            Item::Str(v) => Some(Value::Str(v.clone())),
            Item::Token(id) => Some(Value::Int(i64::from(id.0))),
            Item::Zone(id) => Some(Value::Str(id.as_str().to_owned())),
            Item::Player(id) => Some(Value::Int(i64::from(id.0))),
            Item::Row { .. } | Item::List(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<TokenId> {
        match self {
            Item::Token(id) => Some(*id),
            Item::Int(v) => u32::try_from(*v).ok().map(TokenId),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Item::Player(id) => Some(*id),
            Item::Int(v) => u32::try_from(*v).ok().map(PlayerId),
            _ => None,
        }
    }

    pub fn as_zone(&self) -> Option<ZoneId> {
        match self {
            Item::Zone(id) => Some(id.clone()),
            Item::Str(v) => Some(ZoneId::new(v.as_str())),
            _ => None,
        }
    }

    /// Flattens a binding into the items it enumerates.
    pub fn into_items(self) -> Vec<Item> {
        match self {
            Item::List(items) => items,
            other => vec![other],
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        match value {
            Value::Int(v) => Item::Int(v),
            Value::Bool(v) => Item::Bool(v),
            Value::Str(v) => Item::Str(v),
        }
    }
}
