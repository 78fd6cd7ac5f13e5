//! Declarative query algebra.
//!
//! A [`Query`] enumerates tokens, zones, table rows, integers, enum labels or
//! players. Results are always produced in a deterministic order: zone
//! contents in stored order, zones and markers by id, rows by table order.
mod eval;
mod lookup;
mod predicate;

use serde::{Deserialize, Serialize};

pub use eval::eval_query;
pub use lookup::{LookupPlan, candidate_rows, plan_lookup};
pub use predicate::{
    ContextResolver, DefaultResolver, FieldPredicate, PredicateOp, PredicateOperand,
    PredicateResolver, PredicateValue, match_predicate, matches_all, token_matches,
};

use crate::eval::{Condition, PlayerSel, ValueExpr, ZoneSel};
use crate::value::{QueryDomain, RuntimeShape};

/// Zone filter: `condition` is evaluated with the candidate zone bound
/// under `bind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneFilter {
    pub bind: String,
    pub condition: Condition,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Query {
    TokensInZone {
        zone: ZoneSel,
        #[serde(default)]
        filter: Vec<FieldPredicate>,
    },
    /// Tokens of every map space passing `spaces`, spaces in id order.
    TokensInMapSpaces {
        #[serde(default)]
        filter: Vec<FieldPredicate>,
        #[serde(default)]
        spaces: Option<ZoneFilter>,
    },
    TokensInAdjacentZones {
        zone: ZoneSel,
        #[serde(default)]
        filter: Vec<FieldPredicate>,
    },
    Zones {
        #[serde(default)]
        filter: Option<ZoneFilter>,
    },
    MapSpaces {
        #[serde(default)]
        filter: Option<ZoneFilter>,
    },
    AdjacentZones { zone: ZoneSel },
    /// Zones reachable from `zone` through adjacency, excluding `zone`.
    ///
    /// Only zones passing `via` are entered; `max_depth` bounds the hops.
    ConnectedZones {
        zone: ZoneSel,
        #[serde(default)]
        via: Option<ZoneFilter>,
        #[serde(default)]
        max_depth: Option<u32>,
    },
    AssetRows {
        table: String,
        #[serde(default)]
        filter: Vec<FieldPredicate>,
    },
    /// Inclusive; empty when `min > max`.
    IntsInRange { min: ValueExpr, max: ValueExpr },
    /// Integers within an int variable's declared bounds, optionally
    /// narrowed by `min`/`max`.
    IntsInVarRange {
        var: String,
        /// Per-player variable of this seat; global variable when absent.
        #[serde(default)]
        player: Option<PlayerSel>,
        #[serde(default)]
        min: Option<ValueExpr>,
        #[serde(default)]
        max: Option<ValueExpr>,
    },
    Enums(Vec<String>),
    /// Ids of global markers, optionally only those in one of `states`.
    GlobalMarkers {
        #[serde(default)]
        states: Option<Vec<String>>,
    },
    Players,
    Binding(String),
    Concat(Vec<Query>),
    /// First item of `source` after the one encoding as `from` that
    /// satisfies `condition` with the item bound under `bind`.
    NextInOrderByCondition {
        source: Box<Query>,
        from: ValueExpr,
        bind: String,
        condition: Condition,
        #[serde(default)]
        include_from: bool,
    },
}

impl Query {
    /// Static domain and runtime shape of the items this query yields.
    pub fn contract(&self) -> (QueryDomain, RuntimeShape) {
        match self {
            Query::TokensInZone { .. }
            | Query::TokensInMapSpaces { .. }
            | Query::TokensInAdjacentZones { .. } => (QueryDomain::Token, RuntimeShape::Token),
            Query::Zones { .. }
            | Query::MapSpaces { .. }
            | Query::AdjacentZones { .. }
            | Query::ConnectedZones { .. } => (QueryDomain::Zone, RuntimeShape::String),
            Query::AssetRows { .. } => (QueryDomain::Other, RuntimeShape::Object),
            Query::IntsInRange { .. } | Query::IntsInVarRange { .. } | Query::Players => {
                (QueryDomain::Other, RuntimeShape::Number)
            }
            Query::Enums(_) | Query::GlobalMarkers { .. } => {
                (QueryDomain::Other, RuntimeShape::String)
            }
            Query::Binding(_) => (QueryDomain::Other, RuntimeShape::Unknown),
            Query::Concat(parts) => {
                let mut contracts = parts.iter().map(Query::contract);
                let Some(first) = contracts.next() else {
                    return (QueryDomain::Other, RuntimeShape::Unknown);
                };
                if contracts.all(|c| c == first) {
                    first
                } else {
                    (QueryDomain::Other, RuntimeShape::Unknown)
                }
            }
            Query::NextInOrderByCondition { source, .. } => source.contract(),
        }
    }

    pub fn tokens_in(zone: &str) -> Self {
        Query::TokensInZone {
            zone: ZoneSel::id(zone),
            filter: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contracts_follow_query_kind() {
        assert_eq!(
            Query::tokens_in("deck").contract(),
            (QueryDomain::Token, RuntimeShape::Token)
        );
        assert_eq!(
            Query::AssetRows {
                table: "units".into(),
                filter: Vec::new()
            }
            .contract(),
            (QueryDomain::Other, RuntimeShape::Object)
        );
        assert_eq!(
            Query::Concat(vec![Query::Players, Query::Enums(vec!["a".into()])]).contract(),
            (QueryDomain::Other, RuntimeShape::Unknown)
        );
        assert_eq!(
            Query::Concat(vec![Query::tokens_in("deck"), Query::tokens_in("discard")]).contract(),
            (QueryDomain::Token, RuntimeShape::Token)
        );
    }
}
