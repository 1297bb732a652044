pub mod chat;
pub mod docs;
pub mod doctor;
pub mod init;

mod input;
mod render;

use docpair_config::AppConfig;
use std::path::{Path, PathBuf};

/// Resolve the config file path from `--config` or the default location.
pub(crate) fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_with(path).map_err(|e| format!("Failed to load config: {e}").into())
}
