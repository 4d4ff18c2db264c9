//! Standard locations for stopmo configuration files

use std::path::PathBuf;

/// File name of the main config inside [`default_config_dir`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Per-user config directory
///
/// Returns: `$XDG_CONFIG_HOME/stopmo` (or the platform equivalent), falling
/// back to `~/.stopmo` when the platform has no config directory.
pub fn default_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("stopmo"),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".stopmo"),
    }
}

/// Default path of the main config file
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE_NAME)
}
