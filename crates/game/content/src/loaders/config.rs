//! Kernel configuration loader.

use std::path::Path;

use game_kernel::KernelConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for kernel budgets from TOML files.
///
/// Missing keys keep their defaults, so an empty file is a valid config.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<KernelConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<KernelConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
