//! Common types for Stopmo
//!
//! Constants and small enums shared by the clip, scheduler and control
//! surface layers.

use serde::{Deserialize, Serialize};

/// Nominal frame rate used when nothing else is configured
pub const DEFAULT_FRAME_RATE: u8 = 30;

/// Accepted frame rate range (frames per second)
pub const MIN_FRAME_RATE: u8 = 1;
pub const MAX_FRAME_RATE: u8 = 60;

/// Thumbnail edge length in pixels
pub const DEFAULT_THUMB_SIZE: u16 = 128;

/// Waveform strip height in pixels
pub const DEFAULT_WAVE_SIZE: u16 = 64;

/// Scrub sensitivity divisor applied to pitch bend
pub const DEFAULT_BEND_SPEED: f64 = 2.0;

/// Upper bound for the scrub sensitivity divisor
pub const DEFAULT_BEND_SPEED_MAX: f64 = 40.0;

/// Which of the two project clips an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipSide {
    /// Captured source frames
    #[default]
    Input,
    /// Rendered output frames (owns the soundtrack)
    Output,
}

impl ClipSide {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl std::str::FromStr for ClipSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" | "input" => Ok(Self::Input),
            "out" | "output" => Ok(Self::Output),
            other => Err(format!("unknown clip '{}', expected in|out", other)),
        }
    }
}

/// Processing-thread operation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcOp {
    /// Scheduler not running (before start, after shutdown)
    #[default]
    Init,
    /// Ticking at the nominal frame rate
    Idle,
    /// Importing the input clip's frames
    LoadingVideo,
    /// Decoding the soundtrack into the output clip
    LoadingAudio,
    /// Shutdown requested; the scheduler acknowledges by returning to `Init`
    Terminating,
}

/// Physical control surface a key binding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSurface {
    Midi,
    Kbd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_side_parse() {
        assert_eq!("in".parse::<ClipSide>(), Ok(ClipSide::Input));
        assert_eq!("OUTPUT".parse::<ClipSide>(), Ok(ClipSide::Output));
        assert!("sideways".parse::<ClipSide>().is_err());
    }

    #[test]
    fn test_clip_side_yaml() {
        let side: ClipSide = serde_yaml::from_str("output").unwrap();
        assert_eq!(side, ClipSide::Output);
        assert_eq!(serde_yaml::to_string(&ClipSide::Input).unwrap().trim(), "input");
    }
}
