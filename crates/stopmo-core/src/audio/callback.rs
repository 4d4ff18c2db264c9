//! Real-time sample pump
//!
//! [`AudioCallback`] is handed to an output stream and called on the audio
//! thread once per device buffer. It copies samples out of an immutable PCM
//! buffer, advances the play cursor, and snaps the cursor back onto the video
//! position whenever the two drift more than two frames apart.
//!
//! Nothing here locks or allocates: the PCM buffer is shared through an
//! `Arc` and all cursor state lives in [`ClipAtomics`].

use std::sync::Arc;

use super::track::PcmBuffer;
use crate::clip::ClipAtomics;
use crate::error::{EngineError, EngineResult};

/// Sample copier driven by an output stream
pub struct AudioCallback {
    pcm: Arc<PcmBuffer>,
    atomics: Arc<ClipAtomics>,
}

impl AudioCallback {
    /// Build a callback over `pcm`; only mono and stereo are playable
    pub fn new(pcm: Arc<PcmBuffer>, atomics: Arc<ClipAtomics>) -> EngineResult<Self> {
        match pcm.channels() {
            1 | 2 => Ok(Self { pcm, atomics }),
            n => Err(EngineError::UnsupportedFormat(n)),
        }
    }

    pub fn channels(&self) -> u16 {
        self.pcm.channels()
    }

    /// Fill one interleaved device buffer and correct drift afterwards
    pub fn fill(&mut self, out: &mut [f32]) {
        let samples = self.pcm.samples();
        let mut cursor = self.atomics.play_cursor();

        match self.pcm.channels() {
            1 => fill_mono(samples, &mut cursor, out),
            _ => fill_stereo(samples, &mut cursor, out),
        }
        self.atomics.set_play_cursor(cursor);

        let drift = self.atomics.measure_drift();
        if self.atomics.exceeds_tolerance(drift) {
            self.atomics.resync(self.atomics.frame_cursor());
            self.atomics.measure_drift();
        }
    }
}

#[inline]
fn fill_mono(samples: &[f32], cursor: &mut u64, out: &mut [f32]) {
    let total = samples.len() as u64;
    for slot in out.iter_mut() {
        if *cursor < total {
            *slot = samples[*cursor as usize];
            *cursor += 1;
        } else {
            *slot = 0.0;
        }
    }
}

#[inline]
fn fill_stereo(samples: &[f32], cursor: &mut u64, out: &mut [f32]) {
    let total = (samples.len() / 2) as u64;
    for frame in out.chunks_mut(2) {
        if *cursor < total {
            let i = *cursor as usize * 2;
            for (ch, slot) in frame.iter_mut().enumerate() {
                *slot = samples[i + ch];
            }
            *cursor += 1;
        } else {
            frame.fill(0.0);
        }
    }
}
