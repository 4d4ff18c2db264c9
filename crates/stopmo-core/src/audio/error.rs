//! Audio device and stream error types

use thiserror::Error;

/// Errors raised while opening or driving an output stream
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio devices available
    #[error("No audio output devices found")]
    NoDevices,

    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Device not found
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Device rejected the requested configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to open playback device: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Stream error during playback
    #[error("Audio stream error: {0}")]
    StreamError(String),

    /// Clip has no decoded audio
    #[error("Clip has no audio")]
    NoAudio,

    /// Stop requested while no stream is open
    #[error("Audio is not playing")]
    NotPlaying,
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
