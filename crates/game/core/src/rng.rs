//! Deterministic, splittable, counter-based PRNG.
//!
//! The generator state is a `(key, counter)` pair. Each draw increments the
//! counter and returns the SplitMix64 finaliser of `key + counter * GAMMA`, so
//! draws are a pure function of the state. [`Rng`] is `Copy` and every
//! operation returns the successor state instead of mutating in place.
//!
//! # Determinism
//!
//! Identical seeds and identical operation sequences produce bit-identical
//! outputs on every platform. Changing any constant in this module changes
//! every replay, so [`RNG_VERSION`] must be bumped alongside.

use serde::{Deserialize, Serialize};

use crate::codec::{decode_u64_hex, encode_u64_hex};
use crate::error::{ErrorContext, ErrorSeverity, GameError};

/// Algorithm tag recorded in serialized generator state.
pub const RNG_ALGORITHM: &str = "splitmix64-ctr";

/// Version of the stream layout for [`RNG_ALGORITHM`].
pub const RNG_VERSION: u32 = 1;

/// Weyl increment (golden ratio).
const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Domain salts separating the two children of a fork.
const FORK_LEFT: u64 = 0x243F_6A88_85A3_08D3;
const FORK_RIGHT: u64 = 0x1319_8A2E_0370_7344;

/// SplitMix64 output finaliser.
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RngError {
    /// Serialized state carries an unknown algorithm or version tag.
    #[error("unsupported rng algorithm {algorithm} v{version}")]
    UnsupportedAlgorithm { algorithm: String, version: u32 },

    #[error("invalid range [{min}, {max}]")]
    InvalidRange {
        min: i64,
        max: i64,
        context: ErrorContext,
    },

    /// Serialized state has the wrong number of words.
    #[error("malformed rng state: expected 2 words, found {found}")]
    MalformedState { found: usize },

    #[error("invalid rng word: {0}")]
    InvalidWord(String),
}

impl GameError for RngError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnsupportedAlgorithm { .. } => ErrorSeverity::Validation,
            Self::InvalidRange { .. } => ErrorSeverity::Validation,
            Self::MalformedState { .. } | Self::InvalidWord(_) => ErrorSeverity::Validation,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::InvalidRange { context, .. } => Some(context),
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedAlgorithm { .. } => "RNG_UNSUPPORTED_ALGORITHM",
            Self::InvalidRange { .. } => "RNG_INVALID_RANGE",
            Self::MalformedState { .. } => "RNG_MALFORMED_STATE",
            Self::InvalidWord(_) => "RNG_INVALID_WORD",
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Generator state. Pure value: every operation returns the next state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SerializedRng", into = "SerializedRng")]
pub struct Rng {
    key: u64,
    counter: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            key: mix64(seed.wrapping_add(GAMMA)),
            counter: 0,
        }
    }

    /// Number of draws taken from this stream so far.
    pub const fn counter(&self) -> u64 {
        self.counter
    }

    /// Draws one 64-bit word.
    #[must_use]
    pub fn step(&self) -> (u64, Rng) {
        let counter = self.counter.wrapping_add(1);
        let value = mix64(self.key.wrapping_add(counter.wrapping_mul(GAMMA)));
        (
            value,
            Rng {
                key: self.key,
                counter,
            },
        )
    }

    /// Draws a uniform integer in `[min, max]` (inclusive).
    ///
    /// Uses Lemire's widening multiply; the rejection branch only triggers for
    /// the `2^64 mod span` lowest products, so it is bias-free.
    pub fn next_int(&self, min: i64, max: i64) -> Result<(i64, Rng), RngError> {
        if min > max {
            return Err(RngError::InvalidRange {
                min,
                max,
                context: ErrorContext::new().with_message("min must not exceed max"),
            });
        }
        let span = (i128::from(max) - i128::from(min) + 1) as u128;
        if span > u128::from(u64::MAX) {
            let (word, next) = self.step();
            return Ok((min.wrapping_add(word as i64), next));
        }

        let range = span as u64;
        let threshold = range.wrapping_neg() % range;
        let mut rng = *self;
        loop {
            let (word, next) = rng.step();
            rng = next;
            let product = u128::from(word) * u128::from(range);
            if (product as u64) >= threshold {
                let offset = (product >> 64) as u64;
                let value = i128::from(min) + i128::from(offset);
                return Ok((value as i64, rng));
            }
        }
    }

    /// Splits into two independent child streams. `self` is unchanged.
    #[must_use]
    pub fn fork(&self) -> (Rng, Rng) {
        let child = |salt: u64| Rng {
            key: mix64(self.key ^ mix64(self.counter ^ salt)),
            counter: 0,
        };
        (child(FORK_LEFT), child(FORK_RIGHT))
    }

    pub fn serialize(&self) -> SerializedRng {
        SerializedRng::from(*self)
    }

    pub fn deserialize(raw: &SerializedRng) -> Result<Rng, RngError> {
        Rng::try_from(raw.clone())
    }
}

/// Transport form of [`Rng`]: tagged, with words as 16-digit hex strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedRng {
    pub algorithm: String,
    pub version: u32,
    pub words: Vec<String>,
}

impl From<Rng> for SerializedRng {
    fn from(rng: Rng) -> Self {
        Self {
            algorithm: RNG_ALGORITHM.to_owned(),
            version: RNG_VERSION,
            words: vec![encode_u64_hex(rng.key), encode_u64_hex(rng.counter)],
        }
    }
}

impl TryFrom<SerializedRng> for Rng {
    type Error = RngError;

    fn try_from(raw: SerializedRng) -> Result<Self, Self::Error> {
        if raw.algorithm != RNG_ALGORITHM || raw.version != RNG_VERSION {
            return Err(RngError::UnsupportedAlgorithm {
                algorithm: raw.algorithm,
                version: raw.version,
            });
        }
        let [key, counter] = raw.words.as_slice() else {
            return Err(RngError::MalformedState {
                found: raw.words.len(),
            });
        };
        let word = |s: &str| decode_u64_hex(s).map_err(|e| RngError::InvalidWord(e.to_string()));
        Ok(Rng {
            key: word(key.as_str())?,
            counter: word(counter.as_str())?,
        })
    }
}
