//! Data files for the rule kernel.
//!
//! This crate reads the inputs `game-kernel` consumes but never produces:
//! - Game definitions (RON)
//! - Kernel configuration (TOML)
//! - Move scripts for replays (RON)
//!
//! A small bundled game under `data/` backs the end-to-end tests.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub mod replay;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, GameDefLoader, MoveScript, ScriptLoader, ScriptStep};

#[cfg(feature = "loaders")]
pub use replay::{Replay, replay};
