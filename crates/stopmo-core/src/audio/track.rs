//! AudioTrack - decoded audio of one clip
//!
//! The PCM buffer is decoded once per import and never mutated afterwards,
//! so it is shared with the real-time callback through an `Arc`. The track's
//! own lock (the "sample lock") only guards swapping that buffer and opening
//! or closing the output stream; the callback never takes it.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::callback::AudioCallback;
use super::error::AudioError;
use super::output::{AudioSink, OutputStream, StreamRequest};
use super::source::{open_audio_source, AudioInfo, AudioSource};
use super::visualization;
use crate::clip::ClipAtomics;
use crate::error::{EngineError, EngineResult};

/// Sample frames requested from the decoder per read
pub const READ_CHUNK_FRAMES: usize = 4096;

/// Immutable interleaved sample buffer
#[derive(Debug)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Sample frames (one value per channel each)
    pub fn frames(&self) -> u64 {
        (self.samples.len() / self.channels.max(1) as usize) as u64
    }

    pub fn info(&self) -> AudioInfo {
        AudioInfo {
            channels: self.channels,
            sample_rate: self.sample_rate,
            frames: self.frames(),
        }
    }
}

/// Read `source` to the end into one buffer
///
/// Memory is reserved up front from the reported length and grown with
/// `try_reserve` as needed, so an oversized file fails with
/// [`EngineError::Alloc`] instead of aborting.
pub fn decode_all(source: &mut dyn AudioSource) -> EngineResult<PcmBuffer> {
    let info = source.info();
    let channels = info.channels as usize;
    if channels == 0 {
        return Err(EngineError::Decode("audio has no channels".to_string()));
    }

    let expected = usize::try_from(info.frames)
        .ok()
        .and_then(|f| f.checked_mul(channels))
        .ok_or_else(|| EngineError::Alloc(format!("{} frames do not fit in memory", info.frames)))?;

    let mut samples: Vec<f32> = Vec::new();
    samples.try_reserve_exact(expected)?;

    let mut chunk: Vec<f32> = Vec::new();
    chunk.try_reserve_exact(READ_CHUNK_FRAMES * channels)?;
    chunk.resize(READ_CHUNK_FRAMES * channels, 0.0);

    loop {
        let read = source.read_frames(&mut chunk)?;
        if read == 0 {
            break;
        }
        let len = read * channels;
        samples.try_reserve(len)?;
        samples.extend_from_slice(&chunk[..len]);
    }

    Ok(PcmBuffer::new(samples, info.channels, info.sample_rate))
}

/// State behind the sample lock
#[derive(Default)]
struct TrackInner {
    pcm: Option<Arc<PcmBuffer>>,
    visualization: Vec<f32>,
    stream: Option<Box<dyn OutputStream>>,
}

/// Audio side of a clip
pub struct AudioTrack {
    inner: Mutex<TrackInner>,
    atomics: Arc<ClipAtomics>,
    /// Cached so the frame-rate recompute needs no lock; 0 without audio
    sample_rate: AtomicU32,
}

impl AudioTrack {
    pub fn new(atomics: Arc<ClipAtomics>) -> Self {
        Self {
            inner: Mutex::new(TrackInner::default()),
            atomics,
            sample_rate: AtomicU32::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackInner> {
        // A panic while holding the sample lock leaves plain data behind
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decode `path` and make it this track's audio
    ///
    /// Decoding runs without any lock held. The previous buffer stays
    /// playable until the new one is swapped in; on failure it is kept.
    pub fn import_from(&self, path: &Path, frame_rate: u8, thumb_px: u16) -> EngineResult<AudioInfo> {
        let mut source = open_audio_source(path)?;
        let pcm = decode_all(source.as_mut())?;
        let peak = source.peak_signal().filter(|p| *p > 0.0).unwrap_or(visualization::DEFAULT_PEAK);
        let info = pcm.info();
        self.load(pcm, peak, frame_rate, thumb_px);
        log::info!(
            "Audio: imported {:?} ({}-Ch, {}Hz, {} frames, peak {:.3})",
            path,
            info.channels,
            info.sample_rate,
            info.frames,
            peak
        );
        Ok(info)
    }

    /// Install an already decoded buffer
    pub fn load(&self, pcm: PcmBuffer, peak: f64, frame_rate: u8, thumb_px: u16) {
        let spf = samples_per_frame(pcm.sample_rate(), frame_rate);
        let bucket = visualization::bucket_frames(spf, thumb_px);
        let vis = visualization::compute(pcm.samples(), pcm.channels(), bucket, peak);
        let sample_rate = pcm.sample_rate();

        let mut inner = self.lock();
        if let Some(mut stream) = inner.stream.take() {
            if let Err(e) = stream.stop() {
                log::warn!("Audio: stopping stream before re-import failed: {}", e);
            }
        }
        inner.pcm = Some(Arc::new(pcm));
        inner.visualization = vis;
        self.sample_rate.store(sample_rate, Ordering::Relaxed);
        self.atomics.set_samples_per_frame(spf);
        self.atomics.set_play_cursor(0);
        self.atomics.drift.store(0, Ordering::Relaxed);
    }

    pub fn has_audio(&self) -> bool {
        self.lock().pcm.is_some()
    }

    pub fn info(&self) -> Option<AudioInfo> {
        self.lock().pcm.as_ref().map(|pcm| pcm.info())
    }

    pub fn visualization(&self) -> Vec<f32> {
        self.lock().visualization.clone()
    }

    pub fn samples_per_frame(&self) -> u64 {
        self.atomics.samples_per_frame()
    }

    /// Recompute `samples_per_frame` for a (possibly new) frame rate
    pub fn set_frame_rate(&self, frame_rate: u8) {
        let rate = self.sample_rate.load(Ordering::Relaxed);
        if rate > 0 {
            self.atomics
                .set_samples_per_frame(samples_per_frame(rate, frame_rate));
        }
    }

    pub fn play_cursor(&self) -> u64 {
        self.atomics.play_cursor()
    }

    pub fn drift(&self) -> i64 {
        self.atomics.drift()
    }

    /// Snap the play cursor onto `frame`
    pub fn resync(&self, frame: u64) {
        self.atomics.resync(frame);
    }

    pub fn is_playing(&self) -> bool {
        self.lock().stream.is_some()
    }

    /// Open and start an output stream positioned at the video cursor
    ///
    /// Already playing is not an error. Channel counts other than 1 and 2
    /// fail with [`EngineError::UnsupportedFormat`].
    pub fn start_playback(&self, sink: &dyn AudioSink) -> EngineResult<()> {
        let mut inner = self.lock();
        if inner.stream.is_some() {
            return Ok(());
        }
        let pcm = inner.pcm.clone().ok_or(AudioError::NoAudio)?;
        let request = StreamRequest {
            channels: pcm.channels(),
            sample_rate: pcm.sample_rate(),
            frames_per_buffer: self.atomics.samples_per_frame().min(u32::MAX as u64) as u32,
        };
        let callback = AudioCallback::new(pcm, self.atomics.clone())?;

        self.atomics.resync(self.atomics.frame_cursor());
        self.atomics.measure_drift();

        let mut stream = sink.open(request, callback)?;
        stream.start()?;
        inner.stream = Some(stream);
        log::debug!(
            "Audio: playback started ({}-Ch, {}Hz, {} frames/buffer)",
            request.channels,
            request.sample_rate,
            request.frames_per_buffer
        );
        Ok(())
    }

    /// Stop and close the output stream
    pub fn stop_playback(&self) -> EngineResult<()> {
        let mut stream = self.lock().stream.take().ok_or(AudioError::NotPlaying)?;
        stream.stop()?;
        log::debug!("Audio: playback stopped at sample frame {}", self.atomics.play_cursor());
        Ok(())
    }
}

/// Audio sample frames per video frame
pub fn samples_per_frame(sample_rate: u32, frame_rate: u8) -> u64 {
    u64::from(sample_rate) / u64::from(frame_rate.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullSink;

    /// In-memory source returning at most `max_read` frames per call
    struct ChunkySource {
        samples: Vec<f32>,
        channels: u16,
        pos: usize,
        max_read: usize,
        reported_frames: u64,
    }

    impl AudioSource for ChunkySource {
        fn info(&self) -> AudioInfo {
            AudioInfo {
                channels: self.channels,
                sample_rate: 8000,
                frames: self.reported_frames,
            }
        }

        fn read_frames(&mut self, out: &mut [f32]) -> EngineResult<usize> {
            let ch = self.channels as usize;
            let frames = (out.len() / ch)
                .min(self.max_read)
                .min((self.samples.len() - self.pos) / ch);
            let n = frames * ch;
            out[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
            self.pos += n;
            Ok(frames)
        }
    }

    fn track() -> (AudioTrack, Arc<ClipAtomics>) {
        let atomics = Arc::new(ClipAtomics::new());
        (AudioTrack::new(atomics.clone()), atomics)
    }

    #[test]
    fn test_decode_retries_partial_reads() {
        let samples: Vec<f32> = (0..10_000).map(|i| (i % 7) as f32 / 10.0).collect();
        let mut source = ChunkySource {
            samples: samples.clone(),
            channels: 2,
            pos: 0,
            max_read: 333,
            reported_frames: 0,
        };
        let pcm = decode_all(&mut source).unwrap();
        assert_eq!(pcm.samples(), samples.as_slice());
        assert_eq!(pcm.frames(), 5000);
    }

    #[test]
    fn test_absurd_length_is_alloc_error() {
        let mut source = ChunkySource {
            samples: Vec::new(),
            channels: 2,
            pos: 0,
            max_read: 1,
            reported_frames: u64::MAX / 4,
        };
        assert!(matches!(decode_all(&mut source), Err(EngineError::Alloc(_))));
    }

    #[test]
    fn test_import_wav_sets_samples_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..44100 {
            writer.write_sample(((i % 100) as i16 - 50) * 200).unwrap();
        }
        writer.finalize().unwrap();

        let (track, _atomics) = track();
        let info = track.import_from(&path, 30, 128).unwrap();
        assert_eq!(info.frames, 44100);
        assert_eq!(track.samples_per_frame(), 1470);
        // 1470 / 128 = 11 frames per bucket
        assert_eq!(track.visualization().len(), 44100usize.div_ceil(11));

        track.set_frame_rate(25);
        assert_eq!(track.samples_per_frame(), 1764);
    }

    #[test]
    fn test_failed_import_keeps_previous_audio() {
        let (track, _atomics) = track();
        track.load(PcmBuffer::new(vec![0.0; 800], 1, 8000), 0.5, 10, 64);
        assert!(track.import_from(Path::new("/nonexistent/a.wav"), 10, 64).is_err());
        assert_eq!(track.info().map(|i| i.frames), Some(800));
    }

    #[test]
    fn test_playback_requires_audio_and_supported_channels() {
        let (track, _atomics) = track();
        assert!(matches!(
            track.start_playback(&NullSink),
            Err(EngineError::Device(AudioError::NoAudio))
        ));
        assert!(matches!(
            track.stop_playback(),
            Err(EngineError::Device(AudioError::NotPlaying))
        ));

        track.load(PcmBuffer::new(vec![0.0; 48], 6, 48000), 0.5, 30, 128);
        assert!(matches!(
            track.start_playback(&NullSink),
            Err(EngineError::UnsupportedFormat(6))
        ));
        assert!(!track.is_playing());
    }

    #[test]
    fn test_start_positions_play_cursor_at_video_frame() {
        let (track, atomics) = track();
        track.load(PcmBuffer::new(vec![0.0; 8000], 1, 8000), 0.5, 10, 64);
        atomics.frame_cursor.store(4, Ordering::Relaxed);

        track.start_playback(&NullSink).unwrap();
        assert!(track.is_playing());
        track.stop_playback().unwrap();
        assert!(!track.is_playing());
        assert!(atomics.play_cursor() >= 3200);
    }
}
