//! Hidden-information grants.
//!
//! A grant lets a set of observers see the tokens of one zone that match a
//! filter, beyond the zone's default visibility. Grants are stored in
//! canonical form so structurally equal grants compare equal and are never
//! stored twice.

use serde::{Deserialize, Serialize};

use super::{GameState, PlayerId, Token, ZoneId};
use crate::def::{GameDef, ZoneOwner, ZoneVisibility};
use crate::query::{PredicateOp, PredicateOperand, match_predicate};
use crate::value::Value;

/// A resolved, literal token filter clause.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrantPredicate {
    pub field: String,
    pub op: PredicateOp,
    pub values: Vec<Value>,
}

impl GrantPredicate {
    pub fn new(field: impl Into<String>, op: PredicateOp, values: Vec<Value>) -> Self {
        let mut predicate = Self {
            field: field.into(),
            op,
            values,
        };
        if matches!(op, PredicateOp::In | PredicateOp::NotIn) {
            predicate.values.sort();
            predicate.values.dedup();
        }
        predicate
    }

    fn operand(&self) -> PredicateOperand {
        match (self.op, self.values.as_slice()) {
            (PredicateOp::Eq | PredicateOp::Neq, [single]) => PredicateOperand::Scalar(single.clone()),
            _ => PredicateOperand::Set(self.values.clone()),
        }
    }

    /// Matching errors (type mismatches) hide the token.
    fn admits(&self, token: &Token) -> bool {
        let field = token.field(&self.field);
        match_predicate(&self.field, field.as_ref(), self.op, &self.operand()).unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevealGrant {
    /// Sorted, deduplicated.
    pub observers: Vec<PlayerId>,
    /// Sorted by canonical key. Empty means every token.
    pub filter: Vec<GrantPredicate>,
}

impl RevealGrant {
    pub fn new(mut observers: Vec<PlayerId>, mut filter: Vec<GrantPredicate>) -> Self {
        observers.sort();
        observers.dedup();
        filter.sort();
        filter.dedup();
        Self { observers, filter }
    }

    pub fn admits(&self, player: PlayerId, token: &Token) -> bool {
        self.observers.binary_search(&player).is_ok() && self.filter.iter().all(|p| p.admits(token))
    }
}

impl GameState {
    /// Adds a grant unless a structurally equal one is already present.
    pub fn add_reveal(&mut self, zone: ZoneId, grant: RevealGrant) -> bool {
        let grants = self.reveals.entry(zone).or_default();
        if grants.contains(&grant) {
            return false;
        }
        grants.push(grant);
        grants.sort();
        true
    }

    /// Removes grants on `zone`. With `observers`, only those players lose
    /// visibility; grants left without observers are dropped.
    pub fn conceal(&mut self, zone: &ZoneId, observers: Option<&[PlayerId]>) {
        let Some(grants) = self.reveals.get_mut(zone) else {
            return;
        };
        match observers {
            None => grants.clear(),
            Some(players) => {
                for grant in grants.iter_mut() {
                    grant.observers.retain(|p| !players.contains(p));
                }
                grants.retain(|g| !g.observers.is_empty());
                grants.sort();
                grants.dedup();
            }
        }
        if grants.is_empty() {
            self.reveals.remove(zone);
        }
    }

    /// Tokens of `zone` that `player` may see.
    pub fn visible_tokens<'s>(
        &'s self,
        def: &GameDef,
        zone: &ZoneId,
        player: PlayerId,
    ) -> Vec<&'s Token> {
        let Some(tokens) = self.zones.get(zone) else {
            return Vec::new();
        };
        let default_visible = match def.zone_def(zone) {
            Some(zone_def) => match zone_def.visibility {
                ZoneVisibility::Public => true,
                ZoneVisibility::Hidden => false,
                ZoneVisibility::Owner => {
                    zone_def.owner == ZoneOwner::Player
                        && zone.split_owner().is_some_and(|(_, owner)| owner == player)
                }
            },
            None => false,
        };
        if default_visible {
            return tokens.iter().collect();
        }
        let grants = self.reveals.get(zone).map(Vec::as_slice).unwrap_or(&[]);
        tokens
            .iter()
            .filter(|token| grants.iter().any(|g| g.admits(player, token)))
            .collect()
    }
}
