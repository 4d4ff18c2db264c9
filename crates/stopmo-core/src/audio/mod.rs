//! Audio side of a clip
//!
//! - **Import**: [`open_audio_source`] picks hound or symphonia, [`AudioTrack`]
//!   decodes the whole file into an immutable [`PcmBuffer`]
//! - **Playback**: an [`AudioSink`] opens a stream driving an
//!   [`AudioCallback`], which follows the video cursor through `ClipAtomics`
//! - **Devices**: [`CpalSink`] for real output, [`NullSink`] when there is none
//!
//! # Example Usage
//!
//! ```ignore
//! use stopmo_core::audio::{AudioTrack, CpalSink};
//!
//! let track = AudioTrack::new(atomics.clone());
//! let info = track.import_from(Path::new("take1.wav"), 30, 128)?;
//! track.start_playback(&CpalSink::default())?;
//! ```

mod callback;
mod cpal_backend;
mod device;
mod error;
mod output;
mod source;
mod track;
pub mod visualization;

pub use callback::AudioCallback;
pub use cpal_backend::CpalSink;
pub use device::{default_output_device, find_output_device, list_output_devices, OutputDevice};
pub use error::{AudioError, AudioResult};
pub use output::{AudioSink, NullSink, OutputStream, StreamRequest};
pub use source::{open_audio_source, AudioInfo, AudioSource, SymphoniaSource, WavSource};
pub use track::{decode_all, samples_per_frame, AudioTrack, PcmBuffer, READ_CHUNK_FRAMES};
