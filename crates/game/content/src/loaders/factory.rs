//! Content factory for reading a data directory.

use std::path::{Path, PathBuf};

use game_kernel::{GameDef, KernelConfig};

use crate::loaders::{ConfigLoader, GameDefLoader, LoadResult, MoveScript, ScriptLoader};

/// Content factory that loads kernel inputs from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── games/
/// │   └── skirmish.ron
/// └── scripts/
///     └── opening.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load kernel configuration from `config.toml`, or the defaults when
    /// the file is absent.
    pub fn load_config(&self) -> LoadResult<KernelConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(KernelConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load a game definition from `games/{name}.ron`.
    pub fn load_game(&self, name: &str) -> LoadResult<GameDef> {
        let path = self.data_dir.join("games").join(format!("{}.ron", name));
        GameDefLoader::load(&path)
    }

    /// Load a move script from `scripts/{name}.ron`.
    pub fn load_script(&self, name: &str) -> LoadResult<MoveScript> {
        let path = self.data_dir.join("scripts").join(format!("{}.ron", name));
        ScriptLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), KernelConfig::default());
        assert!(factory.load_game("nothing").is_err());
    }
}
