//! Output stream abstraction
//!
//! An [`AudioSink`] opens streams that pull from an [`AudioCallback`].
//! [`CpalSink`](super::CpalSink) talks to a real device; [`NullSink`] runs the
//! callback on a timer thread and discards the samples.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::callback::AudioCallback;
use super::error::{AudioError, AudioResult};

/// Buffer size used when a request leaves it at zero
const FALLBACK_BUFFER_FRAMES: u32 = 512;

/// Parameters for opening an output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub channels: u16,
    pub sample_rate: u32,
    /// Requested device buffer size in sample frames
    pub frames_per_buffer: u32,
}

impl StreamRequest {
    /// Wall-clock length of one buffer
    pub fn buffer_period(&self) -> Duration {
        let frames = match self.frames_per_buffer {
            0 => FALLBACK_BUFFER_FRAMES,
            n => n,
        };
        Duration::from_secs_f64(frames as f64 / self.sample_rate.max(1) as f64)
    }
}

/// A stream that has been opened but may not be running yet
pub trait OutputStream: Send {
    fn start(&mut self) -> AudioResult<()>;
    fn stop(&mut self) -> AudioResult<()>;
}

/// Something that can open output streams
pub trait AudioSink: Send + Sync {
    fn open(&self, request: StreamRequest, callback: AudioCallback) -> AudioResult<Box<dyn OutputStream>>;
}

// ────────────────────────────────────────────────────────────────────────────────
// Null sink
// ────────────────────────────────────────────────────────────────────────────────

/// Device-less sink; drives the callback at the nominal buffer rate
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn open(&self, request: StreamRequest, callback: AudioCallback) -> AudioResult<Box<dyn OutputStream>> {
        log::debug!(
            "NullSink: opened {}-Ch {}Hz stream, {} frames/buffer",
            request.channels,
            request.sample_rate,
            request.frames_per_buffer
        );
        Ok(Box::new(NullStream {
            request,
            callback: Some(callback),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }))
    }
}

struct NullStream {
    request: StreamRequest,
    /// Parked here while stopped; owned by the worker while running
    callback: Option<AudioCallback>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<AudioCallback>>,
}

impl OutputStream for NullStream {
    fn start(&mut self) -> AudioResult<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let mut callback = self
            .callback
            .take()
            .ok_or_else(|| AudioError::StreamPlayError("callback lost".to_string()))?;

        let period = self.request.buffer_period();
        let frames = match self.request.frames_per_buffer {
            0 => FALLBACK_BUFFER_FRAMES,
            n => n,
        };
        let len = frames as usize * self.request.channels as usize;
        let running = self.running.clone();
        running.store(true, Ordering::Release);

        let handle = std::thread::Builder::new()
            .name("null-audio".to_string())
            .spawn(move || {
                let mut buffer = vec![0.0f32; len];
                while running.load(Ordering::Acquire) {
                    callback.fill(&mut buffer);
                    std::thread::sleep(period);
                }
                callback
            })
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

        self.worker = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> AudioResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.running.store(false, Ordering::Release);
        let callback = worker
            .join()
            .map_err(|_| AudioError::StreamError("null audio thread panicked".to_string()))?;
        self.callback = Some(callback);
        Ok(())
    }
}

impl Drop for NullStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
