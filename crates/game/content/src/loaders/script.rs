//! Move script loader.
//!
//! A script names a game, a seed, a seat count and the moves to play from
//! the initial state.
//!
//! ```ron
//! (
//!     game: "skirmish",
//!     seed: 42,
//!     players: 2,
//!     steps: [
//!         Apply((action_id: "draw")),
//!         Complete((action_id: "play")),
//!     ],
//! )
//! ```

use std::path::Path;

use game_kernel::Move;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Apply the move as written.
    Apply(Move),
    /// Fill the move's open decisions at random, then apply it.
    Complete(Move),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveScript {
    pub game: String,
    pub seed: u64,
    pub players: u32,
    pub steps: Vec<ScriptStep>,
}

pub struct ScriptLoader;

impl ScriptLoader {
    pub fn load(path: &Path) -> LoadResult<MoveScript> {
        let content = read_file(path)?;
        ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse move script RON at {:?}: {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_both_step_kinds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(game: "duel", seed: 7, players: 2, steps: [
                Apply((action_id: "play", params: {{"card": One(Int(3))}})),
                Complete((action_id: "pick")),
            ])"#
        )
        .unwrap();

        let script = ScriptLoader::load(file.path()).unwrap();
        assert_eq!(script.seed, 7);
        assert_eq!(
            script.steps[0],
            ScriptStep::Apply(Move::new("play").with_one("card", 3i64))
        );
        assert_eq!(script.steps[1], ScriptStep::Complete(Move::new("pick")));
    }
}
