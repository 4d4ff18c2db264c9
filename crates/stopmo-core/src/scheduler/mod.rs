//! SyncScheduler - the per-project processing thread
//!
//! ```text
//! Init ──start──► Idle ◄──────────────┐
//!                  │ queue import     │ done / failed
//!                  ▼                  │
//!            LoadingVideo ──► LoadingAudio
//!                  │
//!   terminate ─► Terminating ──► Init (thread exits)
//! ```
//!
//! While idle the thread ticks once per `1000 / frame_rate` ms. A tick that
//! starts late shortens only the following interval; missed ticks are never
//! run back to back. Imports run with the project lock released.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{EngineError, EngineResult};
use crate::project::{Project, ProjectState};
use crate::types::ProcOp;

/// Longest single sleep, bounding how late state changes are noticed
const MAX_IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Handle to a running scheduler thread
pub struct Scheduler {
    project: Arc<Project>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Move the project to `Idle` and spawn its processing thread
    pub fn start(project: Arc<Project>) -> std::io::Result<Self> {
        {
            let mut state = project.lock();
            if state.proc_op == ProcOp::Init {
                state.proc_op = ProcOp::Idle;
            }
        }

        let thread_project = project.clone();
        let handle = thread::Builder::new()
            .name("stopmo-scheduler".to_string())
            .spawn(move || run(&thread_project))?;

        log::info!("Scheduler: started at {} fps", project.lock().settings.frame_rate);
        Ok(Self {
            project,
            handle: Some(handle),
        })
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Request `Terminating` and block until the thread is back in `Init`
    ///
    /// An import in progress runs to completion first.
    pub fn terminate(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.project.lock().proc_op = ProcOp::Terminating;
        if handle.join().is_err() {
            log::error!("Scheduler: thread panicked");
            self.project.lock().proc_op = ProcOp::Init;
        }
        log::info!("Scheduler: stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn run(project: &Project) {
    let mut last_tick = Instant::now();

    loop {
        let mut state = project.lock();
        match state.proc_op {
            ProcOp::Idle | ProcOp::Init => {
                let period = Duration::from_millis(state.settings.tick_ms());
                let now = Instant::now();
                let due = last_tick + period;
                if now >= due {
                    last_tick = now;
                    tick(project, &mut state);
                } else {
                    drop(state);
                    thread::sleep((due - now).min(MAX_IDLE_SLEEP));
                }
            }
            ProcOp::LoadingVideo => {
                drop(state);
                if let Err(e) = project.import_video() {
                    project.status().set(format!("Video import failed: {}", e));
                }
                let mut state = project.lock();
                if state.proc_op == ProcOp::LoadingVideo {
                    state.proc_op = if state.import.audio_path.is_some() {
                        ProcOp::LoadingAudio
                    } else {
                        ProcOp::Idle
                    };
                }
            }
            ProcOp::LoadingAudio => {
                drop(state);
                if let Err(e) = project.import_audio() {
                    project.status().set(format!("Audio import failed: {}", e));
                }
                let mut state = project.lock();
                if state.proc_op == ProcOp::LoadingAudio {
                    state.proc_op = ProcOp::Idle;
                }
            }
            ProcOp::Terminating => {
                project.status().set("Terminating");
                state.proc_op = ProcOp::Init;
                return;
            }
        }
    }
}

/// One idle tick; the caller holds the project lock
pub fn tick(project: &Project, state: &mut ProjectState) {
    if state.recording {
        process_recording(project, state);
    }

    state.output.track.set_frame_rate(state.settings.frame_rate);

    state.input.store.apply_scrub();
    // Output velocity stays zero unless a control surface targets the output clip
    state.output.store.apply_scrub();

    if let Some(side) = state.playing {
        if !state.clip_mut(side).store.step_forward() {
            project.stop_locked(state);
        }
    }

    if state.recording && state.output.store.len() > 1 {
        state.output.store.move_cursor_by(1);
    }
}

/// Copy the input frame under the cursor onto the end of the output clip
///
/// The backing image is hard-linked, replacing whatever stale file sits at
/// the destination name. Any other failure stops recording.
pub fn process_recording(project: &Project, state: &mut ProjectState) {
    let ProjectState {
        input,
        output,
        recording,
        ..
    } = state;
    let src_index = input.store.cursor();

    if let Err(e) = input.store.copy_frame_into(&mut output.store, src_index) {
        project.status().set(format!("Recording interrupted: {}", e));
        *recording = false;
        return;
    }

    let src = input.store.frame_path(src_index);
    let dst = output.store.frame_path(output.store.len() - 1);
    match (src, dst) {
        (Some(src), Some(dst)) => {
            if let Err(e) = link_replacing(&src, &dst) {
                project.status().set(format!(
                    "Recording interrupted: link({}->{}): {}",
                    src.display(),
                    dst.display(),
                    e
                ));
                *recording = false;
            }
        }
        _ => log::debug!("Scheduler: recorded frame {} without backing files", src_index),
    }
}

fn link_replacing(src: &Path, dst: &Path) -> EngineResult<()> {
    match std::fs::hard_link(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            std::fs::remove_file(dst).map_err(|e| EngineError::io(dst, e))?;
            std::fs::hard_link(src, dst).map_err(|e| EngineError::io(dst, e))
        }
        Err(e) => Err(EngineError::io(dst, e)),
    }
}
