//! Control-surface configuration
//!
//! Stored as the `midi:` section of the stopmo config file.

use serde::{Deserialize, Serialize};
use stopmo_core::ClipSide;

/// MIDI port selection and routing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Input port name substring to match (case-insensitive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,

    /// Output port for note feedback; defaults to the input pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_port: Option<String>,

    /// Only accept events on this channel (0-15); any channel when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,

    /// Clip the surfaces drive
    pub target: ClipSide,
}

impl MidiConfig {
    /// Pattern used to open the feedback output, if any
    pub fn feedback_port(&self) -> Option<&str> {
        self.output_port.as_deref().or(self.input_port.as_deref())
    }

    /// Whether an event on `channel` passes the filter
    pub fn accepts_channel(&self, channel: u8) -> bool {
        self.channel.map_or(true, |c| c == channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_accept_any_channel() {
        let config = MidiConfig::default();
        assert_eq!(config.target, ClipSide::Input);
        assert!(config.accepts_channel(0));
        assert!(config.accepts_channel(15));
        assert_eq!(config.feedback_port(), None);
    }

    #[test]
    fn test_yaml_section() {
        let config: MidiConfig =
            serde_yaml::from_str("input_port: lpd8\nchannel: 4\ntarget: output\n").unwrap();
        assert_eq!(config.input_port.as_deref(), Some("lpd8"));
        assert_eq!(config.feedback_port(), Some("lpd8"));
        assert!(config.accepts_channel(4));
        assert!(!config.accepts_channel(0));
        assert_eq!(config.target, ClipSide::Output);
    }
}
