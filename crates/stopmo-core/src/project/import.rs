//! Video and audio import
//!
//! Both run on the scheduler thread with the project lock released. Frames
//! are decoded one at a time and pushed under a short lock, so control
//! surfaces stay responsive and readers only ever see whole frames.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Project, ProjectState};
use crate::audio::AudioInfo;
use crate::clip::{FilenameFormat, FrameNaming, DEFAULT_FILE_FORMAT};
use crate::error::{EngineError, EngineResult};
use crate::types::ClipSide;

/// Where frames and audio come from and where recordings go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// printf-style frame filename template
    pub file_format: String,
    /// First file number to import; backs input display index 0
    pub file_first: u64,
    /// Stop before this file number (None = until the first gap)
    pub file_last: Option<u64>,
    pub audio_path: Option<PathBuf>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: None,
            file_format: DEFAULT_FILE_FORMAT.to_string(),
            file_first: 1,
            file_last: None,
            audio_path: None,
        }
    }
}

impl ImportSettings {
    /// Point both clips at their directories
    fn apply_naming(&self, state: &mut ProjectState) -> EngineResult<()> {
        let format = FilenameFormat::parse(&self.file_format)?;
        state.input.store.set_naming(FrameNaming {
            dir: self.input_dir.clone(),
            format: format.clone(),
            file_base: self.file_first,
        });
        state.output.store.set_naming(FrameNaming {
            dir: self.output_dir.clone(),
            format,
            file_base: 0,
        });
        Ok(())
    }
}

impl Project {
    /// Install new import settings and re-point both clips' backing files
    pub fn configure_import(&self, import: ImportSettings) -> EngineResult<()> {
        let mut state = self.lock();
        import.apply_naming(&mut state)?;
        state.import = import;
        Ok(())
    }

    /// Scan the input directory into the input clip
    ///
    /// Files are taken in number order from `file_first` and the scan stops
    /// at the first missing or undecodable file, or at `file_last`.
    pub fn import_video(&self) -> EngineResult<usize> {
        let (import, thumb_size) = {
            let state = self.lock();
            (state.import.clone(), state.settings.thumb_size)
        };
        let dir = import
            .input_dir
            .clone()
            .ok_or_else(|| EngineError::Config("no input directory set".to_string()))?;
        let format = FilenameFormat::parse(&import.file_format)?;
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| EngineError::io(&dir, e))?
            .count() as u64;

        {
            let mut state = self.lock();
            import.apply_naming(&mut state)?;
            if state.playing == Some(ClipSide::Input) {
                state.playing = None;
            }
            state.recording = false;
            state.input.store.clear();
        }
        self.progress
            .set_range(import.file_first, import.file_last.unwrap_or(entries));

        let mut loaded = 0;
        let mut number = import.file_first;
        loop {
            if import.file_last.is_some_and(|last| number >= last) {
                break;
            }
            let path = format.path(&dir, number);
            if !path.is_file() {
                break;
            }
            self.status().set(format!("Importing: {}", path.display()));
            self.progress.set(number);

            let thumbnail = match self.codec().decode_thumbnail(&path, thumb_size) {
                Ok(thumbnail) => thumbnail,
                Err(e) => {
                    log::warn!("Video import stopped at {:?}: {}", path, e);
                    break;
                }
            };
            if let Err(e) = self.lock().input.store.push_frame(number, thumbnail) {
                log::warn!("Video import stopped at {:?}: {}", path, e);
                break;
            }
            loaded += 1;
            number += 1;
        }

        {
            let mut state = self.lock();
            let start = if state.input.store.len() > 1 { 1 } else { 0 };
            state.input.store.set_cursor(start);
        }
        self.status().set(format!("Loaded {} video frames", loaded));
        Ok(loaded)
    }

    /// Decode the configured audio file into the output clip's track
    pub fn import_audio(&self) -> EngineResult<AudioInfo> {
        let (path, frame_rate, thumb_size, track) = {
            let state = self.lock();
            (
                state.import.audio_path.clone(),
                state.settings.frame_rate,
                state.settings.thumb_size,
                state.output.track.clone(),
            )
        };
        let path = path.ok_or_else(|| EngineError::Config("no audio file set".to_string()))?;

        self.progress.set_range(0, 1);
        let info = track.import_from(&path, frame_rate, thumb_size)?;
        self.progress.set(1);

        self.status().set(format!(
            "Audio import successful ({}-Ch, {}Hz, {} frames)",
            info.channels, info.sample_rate, info.frames
        ));
        Ok(info)
    }
}
