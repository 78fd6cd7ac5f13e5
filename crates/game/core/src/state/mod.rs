//! Authoritative game state representation.
//!
//! [`GameState`] is a plain value. Every kernel transition takes a state by
//! reference and returns a new one, so earlier snapshots stay valid for
//! replay and branching. All maps are ordered, which makes the canonical
//! bincode encoding (and therefore [`GameState::compute_hash`]) deterministic.
mod ids;
mod reveal;
mod turn;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use ids::{ActionId, DecisionId, PhaseId, PlayerId, StateHash, Token, TokenId, ZoneId};
pub use reveal::{GrantPredicate, RevealGrant};
pub use turn::{
    ActionUsage, CardDrivenState, FreeOperationGrant, InterruptFrame, TurnOrderState,
};

use crate::codec::CodecError;
use crate::rng::Rng;
use crate::value::Value;

/// Canonical snapshot of the deterministic game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub player_count: u32,
    pub global_vars: BTreeMap<String, Value>,
    pub per_player_vars: BTreeMap<PlayerId, BTreeMap<String, Value>>,
    /// Zone contents. Index 0 is the top of the zone.
    pub zones: BTreeMap<ZoneId, Vec<Token>>,
    /// Space markers: zone -> marker -> current state.
    pub markers: BTreeMap<ZoneId, BTreeMap<String, String>>,
    pub global_markers: BTreeMap<String, String>,
    pub action_usage: BTreeMap<ActionId, ActionUsage>,
    pub turn_order: TurnOrderState,
    pub interrupt_stack: Vec<InterruptFrame>,
    pub reveals: BTreeMap<ZoneId, Vec<RevealGrant>>,
    pub free_operation_grants: Vec<FreeOperationGrant>,
    pub rng: Rng,
    pub current_phase: PhaseId,
    pub active_player: PlayerId,
    pub turn_count: u32,
    /// Sequential token id allocator. Ids are never reused.
    pub next_token_id: u32,
    pub state_hash: StateHash,
}

impl GameState {
    /// Seats in index order.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + use<> {
        (0..self.player_count).map(PlayerId)
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        player.0 < self.player_count
    }

    pub fn player_var(&self, player: PlayerId, name: &str) -> Option<&Value> {
        self.per_player_vars.get(&player)?.get(name)
    }

    /// Zone and index of a token.
    pub fn locate_token(&self, id: TokenId) -> Option<(&ZoneId, usize)> {
        self.zones.iter().find_map(|(zone, tokens)| {
            tokens
                .iter()
                .position(|t| t.id == id)
                .map(|index| (zone, index))
        })
    }

    pub fn find_token(&self, id: TokenId) -> Option<&Token> {
        self.zones
            .values()
            .flat_map(|tokens| tokens.iter())
            .find(|t| t.id == id)
    }

    /// Detaches a token from whichever zone holds it.
    pub fn take_token(&mut self, id: TokenId) -> Option<(ZoneId, Token)> {
        let (zone, index) = self
            .locate_token(id)
            .map(|(zone, index)| (zone.clone(), index))?;
        let token = self.zones.get_mut(&zone)?.remove(index);
        Some((zone, token))
    }

    pub fn allocate_token_id(&mut self) -> TokenId {
        let id = TokenId(self.next_token_id);
        self.next_token_id += 1;
        id
    }

    pub fn marker_state(&self, zone: &ZoneId, marker: &str) -> Option<&str> {
        self.markers.get(zone)?.get(marker).map(String::as_str)
    }

    pub fn usage(&self, action: &ActionId) -> ActionUsage {
        self.action_usage.get(action).copied().unwrap_or_default()
    }

    /// Digest of the canonical encoding with `state_hash` zeroed.
    ///
    /// SHA-256 over the bincode bytes, truncated to the first 8 bytes
    /// (big-endian).
    pub fn compute_hash(&self) -> Result<StateHash, CodecError> {
        let mut canonical = self.clone();
        canonical.state_hash = StateHash::ZERO;
        let bytes =
            bincode::serialize(&canonical).map_err(|e| CodecError::Encoding(e.to_string()))?;
        let digest = Sha256::digest(&bytes);
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        Ok(StateHash(u64::from_be_bytes(word)))
    }

    /// Recomputes and stores `state_hash`.
    pub fn rehash(&mut self) -> Result<(), CodecError> {
        self.state_hash = self.compute_hash()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Two-seat state matching `def::fixtures::small_def`: a deck of three
    /// cards, an empty discard pile, empty hands and one troop in `north`.
    pub fn small_state() -> GameState {
        let mut zones = BTreeMap::new();
        zones.insert(
            ZoneId::new("deck"),
            vec![
                Token::new(TokenId(0), "card").with_prop("value", 3i64),
                Token::new(TokenId(1), "card").with_prop("value", 5i64),
                Token::new(TokenId(2), "card").with_prop("value", 1i64),
            ],
        );
        zones.insert(ZoneId::new("discard"), Vec::new());
        zones.insert(ZoneId::new("hand:0"), Vec::new());
        zones.insert(ZoneId::new("hand:1"), Vec::new());
        zones.insert(
            ZoneId::new("north"),
            vec![Token::new(TokenId(3), "troop").with_prop("strength", 2i64)],
        );
        zones.insert(ZoneId::new("south"), Vec::new());

        let player_vars = |score: i64| {
            BTreeMap::from([
                ("score".to_owned(), Value::Int(score)),
                ("name".to_owned(), Value::from("anon")),
            ])
        };
        let control = |state: &str| BTreeMap::from([("control".to_owned(), state.to_owned())]);
        GameState {
            player_count: 2,
            global_vars: BTreeMap::from([("round".to_owned(), Value::Int(1))]),
            per_player_vars: BTreeMap::from([
                (PlayerId(0), player_vars(4)),
                (PlayerId(1), player_vars(9)),
            ]),
            zones,
            markers: BTreeMap::from([
                (ZoneId::new("north"), control("none")),
                (ZoneId::new("south"), control("blue")),
            ]),
            global_markers: BTreeMap::from([("season".to_owned(), "spring".to_owned())]),
            action_usage: BTreeMap::new(),
            turn_order: TurnOrderState::RoundRobin,
            interrupt_stack: Vec::new(),
            reveals: BTreeMap::new(),
            free_operation_grants: Vec::new(),
            rng: Rng::new(7),
            current_phase: PhaseId::new("main"),
            active_player: PlayerId(0),
            turn_count: 1,
            next_token_id: 4,
            state_hash: StateHash::ZERO,
        }
    }
}
