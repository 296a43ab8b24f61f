//! CLI commands.

pub mod batch;
pub mod config;
pub mod process;
pub mod templates;

use std::path::{Path, PathBuf};

use tracing::debug;

use facture_core::FactureConfig;

/// Config file location: `--config` if given, else the user config dir.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicitly given file must exist.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<FactureConfig> {
    let path = config_path(explicit);

    if explicit.is_some() || path.exists() {
        debug!("Loading configuration from {}", path.display());
        return FactureConfig::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Failed to load configuration {}: {}", path.display(), e)
        });
    }

    Ok(FactureConfig::default())
}

/// File name for display.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
