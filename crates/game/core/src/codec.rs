//! Transport codec for game state.
//!
//! Big-integer fields (RNG words, the state hash) travel as 16-digit
//! lowercase hex strings so that consumers without native 64-bit integers
//! can round-trip them exactly.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{GameState, StateHash};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("json codec failed: {0}")]
    Json(String),

    /// Canonical encoding failed while hashing.
    #[error("state encoding failed: {0}")]
    Encoding(String),

    #[error("state hash mismatch: recorded {recorded}, computed {computed}")]
    HashMismatch {
        recorded: StateHash,
        computed: StateHash,
    },
}

impl GameError for CodecError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidHex(_) | Self::Json(_) | Self::HashMismatch { .. } => {
                ErrorSeverity::Validation
            }
            Self::Encoding(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidHex(_) => "CODEC_INVALID_HEX",
            Self::Json(_) => "CODEC_JSON",
            Self::Encoding(_) => "CODEC_ENCODING",
            Self::HashMismatch { .. } => "CODEC_HASH_MISMATCH",
        }
    }
}

pub fn encode_u64_hex(value: u64) -> String {
    hex::encode(value.to_be_bytes())
}

pub fn decode_u64_hex(input: &str) -> Result<u64, CodecError> {
    let invalid = || CodecError::InvalidHex(input.to_owned());
    if input.len() != 16 {
        return Err(invalid());
    }
    let bytes = hex::decode(input).map_err(|_| invalid())?;
    let bytes: [u8; 8] = bytes.try_into().map_err(|_| invalid())?;
    Ok(u64::from_be_bytes(bytes))
}

/// Serde adapter for `u64` fields stored as hex strings.
pub mod hex_u64 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode_u64_hex(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::decode_u64_hex(&raw).map_err(D::Error::custom)
    }
}

pub fn serialize_game_state(state: &GameState) -> Result<String, CodecError> {
    serde_json::to_string(state).map_err(|e| CodecError::Json(e.to_string()))
}

/// Parses a state and checks its recorded hash against the canonical encoding.
pub fn deserialize_game_state(input: &str) -> Result<GameState, CodecError> {
    let state: GameState =
        serde_json::from_str(input).map_err(|e| CodecError::Json(e.to_string()))?;
    let computed = state.compute_hash()?;
    if computed != state.state_hash {
        return Err(CodecError::HashMismatch {
            recorded: state.state_hash,
            computed,
        });
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_words_round_trip() {
        assert_eq!(encode_u64_hex(0xdead_beef), "00000000deadbeef");
        assert_eq!(decode_u64_hex("00000000deadbeef"), Ok(0xdead_beef));
        assert_eq!(decode_u64_hex(&encode_u64_hex(u64::MAX)), Ok(u64::MAX));
    }

    #[test]
    fn invalid_hex_is_a_literal_error() {
        let err = decode_u64_hex("zz").unwrap_err();
        assert_eq!(err, CodecError::InvalidHex("zz".into()));
        assert_eq!(err.to_string(), "invalid hex string: zz");

        let err = decode_u64_hex("0000000000000g00").unwrap_err();
        assert_eq!(err.to_string(), "invalid hex string: 0000000000000g00");
    }
}
