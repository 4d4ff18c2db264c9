//! Audio file decoding
//!
//! Streams interleaved `f32` sample frames out of an audio file. WAV files go
//! through hound; everything else (FLAC and whatever else symphonia was built
//! with) goes through symphonia.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{EngineError, EngineResult};

/// Stream parameters reported when a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    /// Interleaved channel count
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Sample frames in the file (0 when the container does not say)
    pub frames: u64,
}

/// Streaming reader over a decoded audio file
pub trait AudioSource: Send {
    fn info(&self) -> AudioInfo;

    /// Fill `out` with whole interleaved frames; returns frames read, 0 at EOF
    fn read_frames(&mut self, out: &mut [f32]) -> EngineResult<usize>;

    /// Peak absolute sample value in `[0, 1]`, when the decoder can report it
    fn peak_signal(&mut self) -> Option<f64> {
        None
    }
}

/// Open `path` with the decoder matching its extension
pub fn open_audio_source(path: &Path) -> EngineResult<Box<dyn AudioSource>> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" | "wave" => Ok(Box::new(WavSource::open(path)?)),
        _ => Ok(Box::new(SymphoniaSource::open(path)?)),
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// WAV (hound)
// ────────────────────────────────────────────────────────────────────────────────

/// PCM/float WAV reader
pub struct WavSource {
    reader: hound::WavReader<BufReader<File>>,
    info: AudioInfo,
    format: hound::SampleFormat,
    scale: f32,
}

impl WavSource {
    pub fn open(path: &Path) -> EngineResult<Self> {
        let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let reader = hound::WavReader::new(BufReader::new(file))
            .map_err(|e| EngineError::Decode(format!("{}: {}", path.display(), e)))?;

        let spec = reader.spec();
        let info = AudioInfo {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            frames: reader.duration() as u64,
        };
        let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;

        log::debug!(
            "WavSource: {:?} {}-Ch {}Hz {}-bit {:?}",
            path,
            spec.channels,
            spec.sample_rate,
            spec.bits_per_sample,
            spec.sample_format
        );

        Ok(Self {
            reader,
            info,
            format: spec.sample_format,
            scale,
        })
    }
}

impl AudioSource for WavSource {
    fn info(&self) -> AudioInfo {
        self.info
    }

    fn read_frames(&mut self, out: &mut [f32]) -> EngineResult<usize> {
        let channels = self.info.channels.max(1) as usize;
        let want = out.len() / channels * channels;
        let decode_err = |e: hound::Error| EngineError::Decode(e.to_string());

        let mut written = 0;
        match self.format {
            hound::SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(want) {
                    out[written] = sample.map_err(decode_err)?;
                    written += 1;
                }
            }
            hound::SampleFormat::Int => {
                let scale = self.scale;
                for sample in self.reader.samples::<i32>().take(want) {
                    out[written] = sample.map_err(decode_err)? as f32 * scale;
                    written += 1;
                }
            }
        }
        Ok(written / channels)
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Everything else (symphonia)
// ────────────────────────────────────────────────────────────────────────────────

/// Packet-based decoder wrapped into a frame stream
pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: AudioInfo,
    pending: Vec<f32>,
    pending_pos: usize,
}

impl SymphoniaSource {
    pub fn open(path: &Path) -> EngineResult<Self> {
        let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let decode_err = |e: SymphoniaError| EngineError::Decode(format!("{}: {}", path.display(), e));

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(decode_err)?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| EngineError::Decode(format!("{}: no audio track", path.display())))?;

        let params = &track.codec_params;
        let info = AudioInfo {
            channels: params.channels.map(|c| c.count() as u16).unwrap_or(0),
            sample_rate: params.sample_rate.unwrap_or(0),
            frames: params.n_frames.unwrap_or(0),
        };
        if info.channels == 0 || info.sample_rate == 0 {
            return Err(EngineError::Decode(format!(
                "{}: missing channel layout or sample rate",
                path.display()
            )));
        }

        let track_id = track.id;
        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(decode_err)?;

        log::debug!(
            "SymphoniaSource: {:?} {}-Ch {}Hz {} frames",
            path,
            info.channels,
            info.sample_rate,
            info.frames
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            info,
            pending: Vec::new(),
            pending_pos: 0,
        })
    }

    /// Decode the next packet of our track into `pending`; false at EOF
    fn refill(&mut self) -> EngineResult<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => return Err(EngineError::Decode(e.to_string())),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    buf.copy_interleaved_ref(decoded);
                    self.pending.clear();
                    self.pending.extend_from_slice(buf.samples());
                    self.pending_pos = 0;
                    if !self.pending.is_empty() {
                        return Ok(true);
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("SymphoniaSource: skipping corrupt packet: {}", e);
                }
                Err(e) => return Err(EngineError::Decode(e.to_string())),
            }
        }
    }
}

impl AudioSource for SymphoniaSource {
    fn info(&self) -> AudioInfo {
        self.info
    }

    fn read_frames(&mut self, out: &mut [f32]) -> EngineResult<usize> {
        let channels = self.info.channels as usize;
        let want = out.len() / channels * channels;
        let mut written = 0;

        while written < want {
            if self.pending_pos >= self.pending.len() && !self.refill()? {
                break;
            }
            let n = (want - written).min(self.pending.len() - self.pending_pos);
            out[written..written + n]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
            written += n;
            self.pending_pos += n;
        }
        Ok(written / channels)
    }
}
