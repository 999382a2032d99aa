//! CLI configuration loading.

use std::path::Path;

use anyhow::Context;
use omniverse_core::OmniverseConfig;

/// Load configuration.
///
/// Precedence, highest first:
/// 1. CLI arguments (applied by each command)
/// 2. Environment variables (`OMNIVERSE_*`)
/// 3. `--config FILE` when given, otherwise ./.omniverserc then ~/.omniverse/config.toml
/// 4. Defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<OmniverseConfig> {
    match path {
        Some(path) => OmniverseConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => OmniverseConfig::discover_and_load().context("Failed to load configuration"),
    }
}
