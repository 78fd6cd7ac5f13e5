use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Seat index of a player. Seats are numbered from 0.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl PlayerId {
    pub const FIRST: Self = Self(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Unique identifier of a token. Never reused within a game.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenId(pub u32);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id!(
    /// Concrete zone identifier. Player-owned zones are named `base:seat`.
    ZoneId
);
string_id!(
    /// Identifier of an action definition.
    ActionId
);
string_id!(
    /// Identifier of a turn phase (regular or interrupt).
    PhaseId
);
string_id!(
    /// Identifier of a decision point inside a move.
    DecisionId
);

impl ZoneId {
    /// Concrete id of the copy of `base` owned by `player`.
    pub fn owned(base: &ZoneId, player: PlayerId) -> Self {
        Self(format!("{}:{}", base.0, player.0))
    }

    /// Splits an owned zone id into its base id and owning seat.
    pub fn split_owner(&self) -> Option<(ZoneId, PlayerId)> {
        let (base, seat) = self.0.rsplit_once(':')?;
        let seat = seat.parse::<u32>().ok()?;
        Some((ZoneId::new(base), PlayerId(seat)))
    }
}

impl DecisionId {
    /// Decision id qualified by the loop iterations enclosing it.
    pub fn scoped(&self, path: &[usize]) -> Self {
        if path.is_empty() {
            return self.clone();
        }
        let mut id = self.0.clone();
        for index in path {
            id.push('#');
            id.push_str(&index.to_string());
        }
        Self(id)
    }
}

/// A game piece living in exactly one zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub kind: String,
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
}

impl Token {
    pub fn new(id: TokenId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            props: BTreeMap::new(),
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Reads a property, exposing `id` and `kind` as pseudo-properties.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Int(i64::from(self.id.0))),
            "kind" => Some(Value::Str(self.kind.clone())),
            _ => self.props.get(name).cloned(),
        }
    }
}

/// Replay digest of a state (see [`super::GameState::compute_hash`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct StateHash(#[serde(with = "crate::codec::hex_u64")] pub u64);

impl StateHash {
    pub const ZERO: Self = Self(0);
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_zone_ids_round_trip() {
        let id = ZoneId::owned(&ZoneId::new("hand"), PlayerId(1));
        assert_eq!(id.as_str(), "hand:1");
        assert_eq!(id.split_owner(), Some((ZoneId::new("hand"), PlayerId(1))));
        assert_eq!(ZoneId::new("deck").split_owner(), None);
    }

    #[test]
    fn scoped_decisions_append_loop_path() {
        let id = DecisionId::new("target");
        assert_eq!(id.scoped(&[]).as_str(), "target");
        assert_eq!(id.scoped(&[2, 0]).as_str(), "target#2#0");
    }

    #[test]
    fn token_id_is_a_pseudo_field() {
        let token = Token::new(TokenId(9), "troop").with_prop("strength", 3i64);
        assert_eq!(token.field("id"), Some(Value::Int(9)));
        assert_eq!(token.field("kind"), Some(Value::Str("troop".into())));
        assert_eq!(token.field("strength"), Some(Value::Int(3)));
        assert_eq!(token.field("missing"), None);
    }
}
