//! CPAL output backend
//!
//! A cpal `Stream` must stay on the thread that built it, so every stream
//! gets an owner thread. The handle returned to callers only holds a command
//! channel to that thread.
//!
//! ```text
//! ┌──────────────────┐  Start/Stop   ┌──────────────────────┐
//! │   CpalStream     │──────────────►│  owner thread        │
//! │  (Send handle)   │◄──────────────│  owns cpal::Stream   │
//! └──────────────────┘    replies    └──────────┬───────────┘
//!                                               │ data callback
//!                                    ┌──────────▼───────────┐
//!                                    │  AudioCallback::fill │
//!                                    └──────────────────────┘
//! ```

use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig, SupportedBufferSize};
use crossbeam::channel::{bounded, Receiver, Sender};

use super::callback::AudioCallback;
use super::device::{default_output_device, find_output_device};
use super::error::{AudioError, AudioResult};
use super::output::{AudioSink, OutputStream, StreamRequest};

/// Sink that opens streams on a cpal output device
#[derive(Debug, Clone, Default)]
pub struct CpalSink {
    /// Device name; the default device when unset
    device: Option<String>,
}

impl CpalSink {
    pub fn new(device: Option<String>) -> Self {
        Self { device }
    }
}

impl AudioSink for CpalSink {
    fn open(&self, request: StreamRequest, callback: AudioCallback) -> AudioResult<Box<dyn OutputStream>> {
        let (command_tx, command_rx) = bounded::<StreamCommand>(4);
        let (ready_tx, ready_rx) = bounded::<AudioResult<()>>(1);
        let device = self.device.clone();

        let worker = std::thread::Builder::new()
            .name("cpal-output".to_string())
            .spawn(move || owner_thread(device, request, callback, command_rx, ready_tx))
            .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalStream {
                commands: Some(command_tx),
                worker: Some(worker),
            })),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(AudioError::StreamBuildError("output thread exited".to_string()))
            }
        }
    }
}

enum StreamCommand {
    Start(Sender<AudioResult<()>>),
    Stop(Sender<AudioResult<()>>),
}

/// Send-able handle to a stream living on its owner thread
struct CpalStream {
    commands: Option<Sender<StreamCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl CpalStream {
    fn request(&self, make: fn(Sender<AudioResult<()>>) -> StreamCommand) -> AudioResult<()> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| AudioError::StreamError("stream closed".to_string()))?;
        let (reply_tx, reply_rx) = bounded(1);
        commands
            .send(make(reply_tx))
            .map_err(|_| AudioError::StreamError("output thread exited".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| AudioError::StreamError("output thread exited".to_string()))?
    }
}

impl OutputStream for CpalStream {
    fn start(&mut self) -> AudioResult<()> {
        self.request(StreamCommand::Start)
    }

    fn stop(&mut self) -> AudioResult<()> {
        self.request(StreamCommand::Stop)
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        // Closing the channel ends the owner loop, which drops the stream
        self.commands.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn owner_thread(
    device: Option<String>,
    request: StreamRequest,
    callback: AudioCallback,
    commands: Receiver<StreamCommand>,
    ready: Sender<AudioResult<()>>,
) {
    let stream = match build_output_stream(device.as_deref(), request, callback) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Start(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| AudioError::StreamPlayError(e.to_string()));
                let _ = reply.send(result);
            }
            StreamCommand::Stop(reply) => {
                let result = stream
                    .pause()
                    .map_err(|e| AudioError::StreamError(e.to_string()));
                let _ = reply.send(result);
            }
        }
    }
    log::debug!("Audio: output stream closed");
}

/// Build an `f32` output stream, preferring a buffer of exactly one video frame
fn build_output_stream(
    device_name: Option<&str>,
    request: StreamRequest,
    mut callback: AudioCallback,
) -> AudioResult<Stream> {
    let device = match device_name {
        Some(name) => find_output_device(name)?,
        None => default_output_device()?,
    };
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;
    let buffer_size = match (request.frames_per_buffer, supported.buffer_size()) {
        (0, _) => BufferSize::Default,
        (n, SupportedBufferSize::Range { min, max }) if !(*min..=*max).contains(&n) => {
            log::warn!(
                "Audio: {} supports {}..={} frame buffers, not {}; using device default",
                name,
                min,
                max,
                n
            );
            BufferSize::Default
        }
        (n, _) => BufferSize::Fixed(n),
    };

    let config = StreamConfig {
        channels: request.channels,
        sample_rate: SampleRate(request.sample_rate),
        buffer_size,
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                callback.fill(data);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None, // No timeout (blocking)
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    log::info!(
        "Audio config: {}, {} channels, {}Hz, {:?}",
        name,
        config.channels,
        request.sample_rate,
        config.buffer_size
    );
    Ok(stream)
}
