use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueType};

/// Declaration of a global or per-player variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    pub ty: ValueType,
    pub initial: Value,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

impl VarDef {
    pub fn int(name: impl Into<String>, initial: i64) -> Self {
        Self {
            name: name.into(),
            ty: ValueType::Int,
            initial: Value::Int(initial),
            min: None,
            max: None,
        }
    }

    #[must_use]
    pub fn bounded(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Clamps an int into the declared bounds.
    pub fn clamp(&self, value: i64) -> i64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Typed property of a token type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropDef {
    pub name: String,
    pub ty: ValueType,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTypeDef {
    pub id: String,
    #[serde(default)]
    pub props: Vec<PropDef>,
}

impl TokenTypeDef {
    pub fn prop(&self, name: &str) -> Option<&PropDef> {
        self.props.iter().find(|p| p.name == name)
    }
}

/// Finite ordered set of marker states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerLattice {
    pub id: String,
    pub states: Vec<String>,
    pub default: String,
}

impl MarkerLattice {
    pub fn index_of(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }

    /// Moves `delta` steps along the lattice, saturating at both ends.
    pub fn shift(&self, from: &str, delta: i64) -> Option<&str> {
        let index = self.index_of(from)? as i64;
        let last = self.states.len().checked_sub(1)? as i64;
        let target = (index.saturating_add(delta)).clamp(0, last) as usize;
        self.states.get(target).map(String::as_str)
    }
}
