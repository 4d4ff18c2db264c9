//! Configuration utilities shared by the stopmo front ends
//!
//! - Generic YAML config loading/saving
//! - Standard config file location
//! - Audio output section
//!
//! # Usage
//!
//! ```ignore
//! use stopmo_core::config::{default_config_path, load_config, save_config};
//!
//! let config: MyAppConfig = load_config(&default_config_path());
//! save_config(&config, &default_config_path())?;
//! ```

mod io;
mod paths;

use serde::{Deserialize, Serialize};

pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path, CONFIG_FILE_NAME};

/// Audio output section of the app config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioOutputConfig {
    /// Output device name as listed by `--list-devices` (None = default device)
    pub device: Option<String>,
    /// Run without a sound card; the callback is still driven on a timer
    pub null_output: bool,
}
