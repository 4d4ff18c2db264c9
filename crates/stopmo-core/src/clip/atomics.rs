//! Lock-free clip state shared with the audio callback

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Cursor state the real-time callback reads and writes without locking
///
/// The frame cursor has a single writer (whoever holds the project lock
/// and moves the [`FrameStore`](super::FrameStore) cursor). The play cursor
/// and drift have a single writer too: the audio callback while a stream
/// is running, or control code under the track's sample lock while it is not.
///
/// All operations use `Ordering::Relaxed` since we only need visibility,
/// not synchronization with other memory operations.
pub struct ClipAtomics {
    /// Current display index of the video cursor
    pub frame_cursor: AtomicU64,
    /// Audio position in sample frames (one per channel group)
    pub play_cursor: AtomicU64,
    /// Last observed `play_cursor - frame_cursor * samples_per_frame`
    pub drift: AtomicI64,
    /// Audio sample frames per video frame
    pub samples_per_frame: AtomicU64,
}

impl ClipAtomics {
    pub fn new() -> Self {
        Self {
            frame_cursor: AtomicU64::new(0),
            play_cursor: AtomicU64::new(0),
            drift: AtomicI64::new(0),
            samples_per_frame: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn frame_cursor(&self) -> u64 {
        self.frame_cursor.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn play_cursor(&self) -> u64 {
        self.play_cursor.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_play_cursor(&self, position: u64) {
        self.play_cursor.store(position, Ordering::Relaxed);
    }

    #[inline]
    pub fn drift(&self) -> i64 {
        self.drift.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn samples_per_frame(&self) -> u64 {
        self.samples_per_frame.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_samples_per_frame(&self, spf: u64) {
        self.samples_per_frame.store(spf, Ordering::Relaxed);
    }

    /// Audio position the video cursor corresponds to
    #[inline]
    pub fn expected_play_cursor(&self) -> u64 {
        self.frame_cursor().saturating_mul(self.samples_per_frame())
    }

    /// Measure and store the current drift
    #[inline]
    pub fn measure_drift(&self) -> i64 {
        let drift = self.play_cursor() as i64 - self.expected_play_cursor() as i64;
        self.drift.store(drift, Ordering::Relaxed);
        drift
    }

    /// Move the play cursor to `frame * samples_per_frame`
    #[inline]
    pub fn resync(&self, frame: u64) {
        let spf = self.samples_per_frame();
        self.set_play_cursor(frame.saturating_mul(spf));
    }

    /// Whether `drift` is outside the tolerated two-frame window
    #[inline]
    pub fn exceeds_tolerance(&self, drift: i64) -> bool {
        drift.unsigned_abs() > 2 * self.samples_per_frame()
    }
}

impl Default for ClipAtomics {
    fn default() -> Self {
        Self::new()
    }
}
