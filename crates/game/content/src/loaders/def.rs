//! Game definition loader.

use std::path::Path;

use game_kernel::GameDef;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`GameDef`] RON files.
///
/// Definitions are taken as produced by the rules compiler; only their
/// shape is checked here.
pub struct GameDefLoader;

impl GameDefLoader {
    pub fn load(path: &Path) -> LoadResult<GameDef> {
        let content = read_file(path)?;
        let def = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))?;
        tracing::debug!(game = %def.metadata.id, actions = def.actions.len(), "game definition loaded");
        Ok(def)
    }

    pub fn parse(content: &str) -> LoadResult<GameDef> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse game definition RON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"(
        metadata: (id: "duel", min_players: 2, max_players: 2),
        per_player_vars: [(name: "score", ty: Int, initial: Int(0))],
        zones: [(id: "hand", owner: Player)],
        actions: [(id: "pass", actor: Active)],
        turn_structure: (phases: ["main"]),
    )"#;

    #[test]
    fn loads_minimal_definition() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let def = GameDefLoader::load(file.path()).unwrap();
        assert_eq!(def.metadata.id, "duel");
        assert_eq!(def.actions.len(), 1);
        assert!(def.setup.is_empty());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        let err = GameDefLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.ron"));
    }

    #[test]
    fn rejects_unknown_effects() {
        let broken = MINIMAL.replace("turn_structure", "setup: [Explode()], turn_structure");
        assert!(GameDefLoader::parse(&broken).is_err());
    }
}
