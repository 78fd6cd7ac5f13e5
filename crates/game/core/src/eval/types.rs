//! Static type inference for references.
//!
//! Mirrors [`super::refs`] exactly so compile-time checks agree with runtime
//! resolution.

use serde::{Deserialize, Serialize};

use super::Reference;
use crate::def::GameDef;
use crate::value::ValueType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Number,
    String,
    Boolean,
    Unknown,
}

impl From<ValueType> for SemanticType {
    fn from(ty: ValueType) -> Self {
        match ty {
            ValueType::Int => Self::Number,
            ValueType::Str => Self::String,
            ValueType::Bool => Self::Boolean,
        }
    }
}

fn declared(ty: Option<ValueType>) -> SemanticType {
    ty.map_or(SemanticType::Unknown, SemanticType::from)
}

/// Single type shared by every declaration in `types`, if they agree.
fn unanimous(types: impl Iterator<Item = ValueType>) -> Option<ValueType> {
    let mut found = None;
    for ty in types {
        match found {
            None => found = Some(ty),
            Some(prev) if prev != ty => return None,
            Some(_) => {}
        }
    }
    found
}

pub fn infer_reference_type(reference: &Reference, def: &GameDef) -> SemanticType {
    match reference {
        Reference::GlobalVar(name) => declared(def.global_var(name).map(|v| v.ty)),
        Reference::PlayerVar { var, .. } => declared(def.player_var(var).map(|v| v.ty)),
        Reference::TokenProp { prop, .. } => match prop.as_str() {
            "id" => SemanticType::Number,
            "kind" => SemanticType::String,
            _ => declared(unanimous(
                def.token_types
                    .iter()
                    .filter_map(|t| t.prop(prop))
                    .map(|p| p.ty),
            )),
        },
        Reference::ZoneProp { prop, .. } => {
            if prop == "id" {
                return SemanticType::String;
            }
            declared(unanimous(
                def.zones
                    .iter()
                    .filter_map(|z| z.attributes.get(prop))
                    .map(|v| v.value_type()),
            ))
        }
        Reference::TableField { table, field, .. } => declared(
            def.table(table)
                .and_then(|t| t.fields.get(field))
                .copied(),
        ),
        Reference::Marker { .. } | Reference::GlobalMarker(_) => SemanticType::String,
        Reference::Binding(_) => SemanticType::Unknown,
        Reference::ActivePlayer | Reference::Actor | Reference::TurnCount => SemanticType::Number,
        Reference::CurrentPhase => SemanticType::String,
    }
}

/// Compatible if either side is unknown or both match exactly.
pub fn are_types_compatible(a: SemanticType, b: SemanticType) -> bool {
    a == SemanticType::Unknown || b == SemanticType::Unknown || a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::fixtures::small_def;
    use crate::eval::{PlayerSel, ZoneSel};

    #[test]
    fn inference_follows_declarations() {
        let def = small_def();
        let cases = [
            (Reference::GlobalVar("round".into()), SemanticType::Number),
            (Reference::GlobalVar("missing".into()), SemanticType::Unknown),
            (
                Reference::PlayerVar {
                    player: PlayerSel::Active,
                    var: "name".into(),
                },
                SemanticType::String,
            ),
            (
                Reference::TokenProp {
                    token: "t".into(),
                    prop: "value".into(),
                },
                SemanticType::Number,
            ),
            (
                Reference::ZoneProp {
                    zone: ZoneSel::id("north"),
                    prop: "terrain".into(),
                },
                SemanticType::String,
            ),
            (
                Reference::TableField {
                    table: "units".into(),
                    row: "r".into(),
                    field: "strength".into(),
                },
                SemanticType::Number,
            ),
            (Reference::GlobalMarker("season".into()), SemanticType::String),
            (Reference::Binding("x".into()), SemanticType::Unknown),
            (Reference::TurnCount, SemanticType::Number),
        ];
        for (reference, expected) in cases {
            assert_eq!(infer_reference_type(&reference, &def), expected, "{reference:?}");
        }
    }

    #[test]
    fn compatibility_is_exact_or_unknown() {
        use SemanticType::*;
        assert!(are_types_compatible(Number, Number));
        assert!(are_types_compatible(Unknown, String));
        assert!(are_types_compatible(Boolean, Unknown));
        assert!(!are_types_compatible(Number, String));
    }
}
