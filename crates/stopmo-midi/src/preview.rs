//! Held-key preview oscillator
//!
//! While a bound key is held the cursor swings back and forth around the
//! bound frame so the neighbourhood can be seen and heard without moving
//! playback for good.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use stopmo_core::{ClipSide, Project};

/// Oscillator step interval
pub const PREVIEW_INTERVAL: Duration = Duration::from_millis(5);
/// Peak swing in frames
pub const PREVIEW_AMPLITUDE: f64 = 20.0;
/// Phase advance per step (radians)
pub const PREVIEW_PHASE_STEP: f64 = 0.05;

/// Cursor position for a given phase, clamped to the clip
pub fn preview_position(center: usize, phase: f64, count: usize) -> usize {
    let offset = (phase.sin() * PREVIEW_AMPLITUDE) as i64;
    let pos = center as i64 + offset;
    pos.clamp(0, count.saturating_sub(1) as i64) as usize
}

/// A running preview; stops on drop
pub struct KeyPreview {
    center: usize,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyPreview {
    pub fn start(project: Arc<Project>, side: ClipSide, center: usize) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("stopmo-preview".to_string())
            .spawn(move || {
                let mut phase = 0.0f64;
                while flag.load(Ordering::Relaxed) {
                    {
                        let mut state = project.lock();
                        let store = &mut state.clip_mut(side).store;
                        let count = store.len();
                        if count > 0 {
                            store.set_cursor(preview_position(center, phase, count));
                            phase += PREVIEW_PHASE_STEP;
                        }
                    }
                    thread::sleep(PREVIEW_INTERVAL);
                }
            })?;

        log::debug!("Preview: started around frame {}", center);
        Ok(Self {
            center,
            running,
            handle: Some(handle),
        })
    }

    /// Frame the preview swings around
    pub fn center(&self) -> usize {
        self.center
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Preview: thread panicked");
            }
            log::debug!("Preview: stopped");
        }
    }
}

impl Drop for KeyPreview {
    fn drop(&mut self) {
        self.stop();
    }
}
