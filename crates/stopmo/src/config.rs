//! Application configuration for stopmo
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/stopmo/config.yaml

use serde::{Deserialize, Serialize};
use stopmo_core::config::AudioOutputConfig;
use stopmo_core::project::{ImportSettings, ProjectSettings};
use stopmo_midi::MidiConfig;

use crate::cli::CliArgs;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopmoConfig {
    /// Frame rate, thumbnail and scrub settings
    pub project: ProjectSettings,
    /// Frame directories, filename format and soundtrack
    pub import: ImportSettings,
    /// Control surface ports and routing
    pub midi: MidiConfig,
    /// Output device selection
    pub audio: AudioOutputConfig,
}

impl StopmoConfig {
    /// Let command line flags win over file values
    pub fn apply_cli(&mut self, cli: &CliArgs) {
        if let Some(dir) = &cli.input_dir {
            self.import.input_dir = Some(dir.clone());
        }
        if let Some(dir) = &cli.output_dir {
            self.import.output_dir = Some(dir.clone());
        }
        if let Some(audio) = &cli.audio {
            self.import.audio_path = Some(audio.clone());
        }
        if let Some(format) = &cli.file_format {
            self.import.file_format = format.clone();
        }
        if let Some((first, last)) = cli.range {
            self.import.file_first = first;
            self.import.file_last = last;
        }
        if let Some(fps) = cli.frame_rate {
            self.project.frame_rate = fps;
        }
        if let Some(thumb) = cli.thumb_size {
            self.project.thumb_size = thumb;
        }
        if let Some(port) = &cli.midi_port {
            self.midi.input_port = Some(port.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stopmo_core::config::{load_config, save_config};
    use stopmo_core::ClipSide;

    #[test]
    fn test_cli_overrides_file() {
        let mut config: StopmoConfig = serde_yaml::from_str(
            "project:\n  frame_rate: 12\nimport:\n  output_dir: /srv/out\n  file_first: 3\nmidi:\n  target: output\n",
        )
        .unwrap();
        assert_eq!(config.midi.target, ClipSide::Output);

        let cli = CliArgs {
            input_dir: Some("/captures".into()),
            range: Some((10, Some(40))),
            frame_rate: Some(25),
            midi_port: Some("nanoKEY".to_string()),
            ..Default::default()
        };
        config.apply_cli(&cli);

        assert_eq!(config.project.frame_rate, 25);
        assert_eq!(config.import.input_dir, Some(PathBuf::from("/captures")));
        assert_eq!(config.import.output_dir, Some(PathBuf::from("/srv/out")));
        assert_eq!(config.import.file_first, 10);
        assert_eq!(config.import.file_last, Some(40));
        assert_eq!(config.midi.input_port.as_deref(), Some("nanoKEY"));
        assert_eq!(config.project.thumb_size, 128);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = StopmoConfig::default();
        config.midi.channel = Some(4);
        config.audio.null_output = true;
        save_config(&config, &path).unwrap();
        let loaded: StopmoConfig = load_config(&path);
        assert_eq!(loaded, config);
    }
}
