//! Clips: a frame sequence paired with its audio
//!
//! A [`Clip`] lives inside the project lock. Its [`AudioTrack`] is behind an
//! `Arc` so imports and stream control can run on it with the project lock
//! released, and both halves share one [`ClipAtomics`] for the cursors.

mod atomics;
mod codec;
mod keymap;
mod naming;
mod store;

use std::sync::Arc;

use crate::audio::AudioTrack;

pub use atomics::ClipAtomics;
pub use codec::{Bitmap, FrameCodec, PassthroughCodec};
pub use keymap::Keymap;
pub use naming::{FilenameFormat, DEFAULT_FILE_FORMAT};
pub use store::{Frame, FrameNaming, FrameStore, KEYMAP_FIRST_KEY, KEYMAP_LAST_KEY};

/// One timeline: frames plus audio
pub struct Clip {
    pub store: FrameStore,
    pub track: Arc<AudioTrack>,
    atomics: Arc<ClipAtomics>,
}

impl Clip {
    pub fn new() -> Self {
        let atomics = Arc::new(ClipAtomics::new());
        Self {
            store: FrameStore::new(atomics.clone()),
            track: Arc::new(AudioTrack::new(atomics.clone())),
            atomics,
        }
    }

    pub fn atomics(&self) -> &Arc<ClipAtomics> {
        &self.atomics
    }

    /// Video cursor as the audio callback currently sees it
    pub fn published_cursor(&self) -> u64 {
        self.atomics.frame_cursor()
    }
}

impl Default for Clip {
    fn default() -> Self {
        Self::new()
    }
}
