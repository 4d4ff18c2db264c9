//! Project scalars and their fixed binary record
//!
//! Layout (big-endian, 25 bytes):
//!
//! | Offset | Type | Field           |
//! |--------|------|-----------------|
//! | 0      | u32  | flags           |
//! | 4      | u16  | thumb_size      |
//! | 6      | u16  | wave_size       |
//! | 8      | u8   | frame_rate      |
//! | 9      | f64  | bend_speed      |
//! | 17     | f64  | bend_speed_max  |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::{
    DEFAULT_BEND_SPEED, DEFAULT_BEND_SPEED_MAX, DEFAULT_FRAME_RATE, DEFAULT_THUMB_SIZE,
    DEFAULT_WAVE_SIZE, MAX_FRAME_RATE, MIN_FRAME_RATE,
};

/// Size of an encoded [`ProjectRecord`]
pub const RECORD_LEN: usize = 25;

/// Flag bits that are persisted (none currently)
pub const SAVED_FLAGS: u32 = 0;

/// Scrub and display parameters of a project
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Nominal frames per second of playback and recording
    pub frame_rate: u8,
    /// Thumbnail edge in pixels
    pub thumb_size: u16,
    /// Waveform strip height in pixels
    pub wave_size: u16,
    /// Pitch-bend divisor; larger is slower scrubbing
    pub bend_speed: f64,
    /// Upper bound reachable through the sensitivity controller
    pub bend_speed_max: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            thumb_size: DEFAULT_THUMB_SIZE,
            wave_size: DEFAULT_WAVE_SIZE,
            bend_speed: DEFAULT_BEND_SPEED,
            bend_speed_max: DEFAULT_BEND_SPEED_MAX,
        }
    }
}

impl ProjectSettings {
    /// Scheduler period in milliseconds
    pub fn tick_ms(&self) -> u64 {
        1000 / u64::from(self.frame_rate.max(1))
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> EngineResult<()> {
        if !(MIN_FRAME_RATE..=MAX_FRAME_RATE).contains(&self.frame_rate) {
            return Err(EngineError::Config(format!(
                "frame rate {} outside {}..={}",
                self.frame_rate, MIN_FRAME_RATE, MAX_FRAME_RATE
            )));
        }
        if self.thumb_size == 0 {
            return Err(EngineError::Config("thumbnail size must be non-zero".to_string()));
        }
        if !self.bend_speed.is_finite() || self.bend_speed < 1.0 {
            return Err(EngineError::Config(format!(
                "bend speed {} must be at least 1",
                self.bend_speed
            )));
        }
        if !self.bend_speed_max.is_finite() || self.bend_speed_max < 1.0 {
            return Err(EngineError::Config(format!(
                "bend speed max {} must be at least 1",
                self.bend_speed_max
            )));
        }
        Ok(())
    }
}

/// The persisted scalar state of a project
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectRecord {
    pub flags: u32,
    pub settings: ProjectSettings,
}

impl ProjectRecord {
    pub fn new(settings: ProjectSettings) -> Self {
        Self { flags: 0, settings }
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let s = &self.settings;
        let mut buf = [0u8; RECORD_LEN];
        buf[0..4].copy_from_slice(&(self.flags & SAVED_FLAGS).to_be_bytes());
        buf[4..6].copy_from_slice(&s.thumb_size.to_be_bytes());
        buf[6..8].copy_from_slice(&s.wave_size.to_be_bytes());
        buf[8] = s.frame_rate;
        buf[9..17].copy_from_slice(&s.bend_speed.to_be_bytes());
        buf[17..25].copy_from_slice(&s.bend_speed_max.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> EngineResult<Self> {
        let buf: &[u8; RECORD_LEN] = buf
            .get(..RECORD_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                EngineError::Decode(format!(
                    "project record truncated ({} of {} bytes)",
                    buf.len(),
                    RECORD_LEN
                ))
            })?;

        let be_u16 = |at: usize| u16::from_be_bytes([buf[at], buf[at + 1]]);
        let be_f64 = |at: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&buf[at..at + 8]);
            f64::from_be_bytes(bytes)
        };

        let flags = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) & SAVED_FLAGS;
        let settings = ProjectSettings {
            thumb_size: be_u16(4),
            wave_size: be_u16(6),
            frame_rate: buf[8],
            bend_speed: be_f64(9),
            bend_speed_max: be_f64(17),
        };
        if settings.frame_rate == 0 {
            return Err(EngineError::Decode("project record has zero frame rate".to_string()));
        }
        settings
            .validate()
            .map_err(|e| EngineError::Decode(format!("project record rejected: {}", e)))?;
        Ok(Self { flags, settings })
    }
}

/// Write the project record to `path`
pub fn save_record(settings: &ProjectSettings, path: &Path) -> EngineResult<()> {
    std::fs::write(path, ProjectRecord::new(*settings).encode()).map_err(|e| EngineError::io(path, e))?;
    log::info!("Saved project settings to {:?}", path);
    Ok(())
}

/// Read a project record from `path`
pub fn load_record(path: &Path) -> EngineResult<ProjectSettings> {
    let bytes = std::fs::read(path).map_err(|e| EngineError::io(path, e))?;
    let record = ProjectRecord::decode(&bytes)?;
    log::info!("Loaded project settings from {:?}", path);
    Ok(record.settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let record = ProjectRecord::new(ProjectSettings::default());
        let buf = record.encode();
        assert_eq!(&buf[0..4], &[0, 0, 0, 0]);
        assert_eq!(&buf[4..6], &[0, 128]);
        assert_eq!(&buf[6..8], &[0, 64]);
        assert_eq!(buf[8], 30);
        assert_eq!(&buf[9..17], &2.0f64.to_be_bytes());
        assert_eq!(&buf[17..25], &40.0f64.to_be_bytes());
    }

    #[test]
    fn test_unsaved_flags_are_masked() {
        let mut buf = ProjectRecord::default().encode();
        buf[3] = 0xff;
        assert_eq!(ProjectRecord::decode(&buf).unwrap().flags, 0);
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let mut buf = ProjectRecord::default().encode();
        buf[8] = 0;
        assert!(matches!(ProjectRecord::decode(&buf), Err(EngineError::Decode(_))));
        assert!(matches!(ProjectRecord::decode(&buf[..10]), Err(EngineError::Decode(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.stopmo");
        let settings = ProjectSettings {
            frame_rate: 12,
            thumb_size: 96,
            wave_size: 32,
            bend_speed: 7.5,
            bend_speed_max: 20.0,
        };
        save_record(&settings, &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), RECORD_LEN as u64);
        assert_eq!(load_record(&path).unwrap(), settings);
    }

    #[test]
    fn test_validate() {
        assert!(ProjectSettings::default().validate().is_ok());
        let bad = ProjectSettings {
            frame_rate: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert_eq!(ProjectSettings::default().tick_ms(), 33);
    }

    #[test]
    fn test_validate_rejects_unusable_bend_speed() {
        for bend_speed in [0.0, 0.5, -2.0, f64::NAN, f64::INFINITY] {
            let settings = ProjectSettings {
                bend_speed,
                ..Default::default()
            };
            assert!(
                matches!(settings.validate(), Err(EngineError::Config(_))),
                "bend speed {} accepted",
                bend_speed
            );
        }
        let slowest = ProjectSettings {
            bend_speed: 1.0,
            ..Default::default()
        };
        assert!(slowest.validate().is_ok());
    }

    #[test]
    fn test_zero_bend_speed_record_rejected() {
        let mut buf = ProjectRecord::default().encode();
        buf[9..17].copy_from_slice(&0.0f64.to_be_bytes());
        assert!(matches!(ProjectRecord::decode(&buf), Err(EngineError::Decode(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.stopmo");
        std::fs::write(&path, buf).unwrap();
        assert!(matches!(load_record(&path), Err(EngineError::Decode(_))));
    }
}
