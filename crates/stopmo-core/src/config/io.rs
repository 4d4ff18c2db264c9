//! YAML config loading and saving for any serde type

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read `path` as YAML, or the type's defaults when that is not possible
///
/// A missing file is normal on first start and only logged at `info`.
/// Unreadable or malformed files are reported at `warn`.
///
/// ```ignore
/// let config: StopmoConfig = load_config(&default_config_path());
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("Config: no file at {:?}, starting from defaults", path);
        return T::default();
    }
    match read_yaml(path) {
        Ok(config) => {
            log::info!("Config: loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("Config: {:#}, starting from defaults", e);
            T::default()
        }
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {:?}", path))?;
    serde_yaml::from_str(&text).with_context(|| format!("cannot parse {:?}", path))
}

/// Write `config` to `path` as YAML; missing parent directories are created
pub fn save_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("cannot serialize config")?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {:?}", dir))?;
    }
    std::fs::write(path, yaml).with_context(|| format!("cannot write {:?}", path))?;
    log::info!("Config: saved {:?}", path);
    Ok(())
}
