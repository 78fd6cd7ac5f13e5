//! Loaders that turn RON/TOML files into kernel inputs.

pub mod config;
pub mod def;
pub mod factory;
pub mod script;

pub use config::ConfigLoader;
pub use def::GameDefLoader;
pub use factory::ContentFactory;
pub use script::{MoveScript, ScriptLoader, ScriptStep};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
