//! Project - the two clips and everything the scheduler reads per tick
//!
//! All clip and scalar state sits behind one project lock
//! ([`Project::lock`]). Lock order is always project lock, then a track's
//! sample lock; imports take only the sample lock, and the real-time callback
//! takes neither.

mod import;
mod settings;
mod status;
mod transport;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::{AudioSink, NullSink};
use crate::clip::{Clip, FrameCodec, PassthroughCodec};
use crate::types::{ClipSide, ProcOp};

pub use import::ImportSettings;
pub use settings::{load_record, save_record, ProjectRecord, ProjectSettings, RECORD_LEN, SAVED_FLAGS};
pub use status::{Progress, StatusBoard};

/// State guarded by the project lock
pub struct ProjectState {
    pub input: Clip,
    pub output: Clip,
    pub proc_op: ProcOp,
    pub settings: ProjectSettings,
    pub import: ImportSettings,
    /// Clip advanced one frame per tick, if any
    pub playing: Option<ClipSide>,
    /// Punch-in recording from input into output
    pub recording: bool,
    /// Next control-surface key binds to the focused frame
    pub learning: bool,
}

impl ProjectState {
    fn new(settings: ProjectSettings) -> Self {
        Self {
            input: Clip::new(),
            output: Clip::new(),
            proc_op: ProcOp::Init,
            settings,
            import: ImportSettings::default(),
            playing: None,
            recording: false,
            learning: false,
        }
    }

    pub fn clip(&self, side: ClipSide) -> &Clip {
        match side {
            ClipSide::Input => &self.input,
            ClipSide::Output => &self.output,
        }
    }

    pub fn clip_mut(&mut self, side: ClipSide) -> &mut Clip {
        match side {
            ClipSide::Input => &mut self.input,
            ClipSide::Output => &mut self.output,
        }
    }
}

/// One open project
///
/// Shared as `Arc<Project>` between the scheduler thread, control-surface
/// routers and the front end.
pub struct Project {
    state: Mutex<ProjectState>,
    status: StatusBoard,
    progress: Progress,
    sink: Arc<dyn AudioSink>,
    codec: Arc<dyn FrameCodec>,
}

impl Project {
    pub fn new(settings: ProjectSettings, sink: Arc<dyn AudioSink>, codec: Arc<dyn FrameCodec>) -> Self {
        Self {
            state: Mutex::new(ProjectState::new(settings)),
            status: StatusBoard::new(),
            progress: Progress::default(),
            sink,
            codec,
        }
    }

    /// Project without an audio device or image decoder
    pub fn headless(settings: ProjectSettings) -> Self {
        Self::new(settings, Arc::new(NullSink), Arc::new(PassthroughCodec))
    }

    /// Take the project lock
    pub fn lock(&self) -> MutexGuard<'_, ProjectState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn codec(&self) -> &dyn FrameCodec {
        self.codec.as_ref()
    }

    pub fn proc_op(&self) -> ProcOp {
        self.lock().proc_op
    }

    /// Ask the scheduler to scan the input directory (and then the audio)
    pub fn queue_video_import(&self) {
        self.lock().proc_op = ProcOp::LoadingVideo;
    }

    /// Ask the scheduler to decode the configured audio file
    pub fn queue_audio_import(&self) {
        self.lock().proc_op = ProcOp::LoadingAudio;
    }

    /// Replace the scrub and display parameters
    pub fn set_settings(&self, settings: ProjectSettings) -> crate::EngineResult<()> {
        settings.validate()?;
        let mut state = self.lock();
        state.settings = settings;
        state.output.track.set_frame_rate(settings.frame_rate);
        Ok(())
    }
}
