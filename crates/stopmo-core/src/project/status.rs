//! Status line and import progress shared with front ends

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Latest human-readable status message
///
/// Every update is logged at info level and fanned out to subscribers.
#[derive(Default)]
pub struct StatusBoard {
    current: Mutex<String>,
    subscribers: Mutex<Vec<flume::Sender<String>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);

        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|tx| tx.send(message.clone()).is_ok());
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = message;
    }

    pub fn current(&self) -> String {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Receive every later status update; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> flume::Receiver<String> {
        let (tx, rx) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }
}

/// `(value, min, max)` progress of the running import
#[derive(Debug, Default)]
pub struct Progress {
    value: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl Progress {
    pub fn set_range(&self, min: u64, max: u64) {
        self.min.store(min, Ordering::Relaxed);
        self.max.store(max, Ordering::Relaxed);
        self.value.store(min, Ordering::Relaxed);
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.value.load(Ordering::Relaxed),
            self.min.load(Ordering::Relaxed),
            self.max.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_fans_out() {
        let board = StatusBoard::new();
        let rx = board.subscribe();
        board.set("Loaded 3 video frames");
        board.set("Playback stopped");

        assert_eq!(board.current(), "Playback stopped");
        assert_eq!(rx.try_recv().unwrap(), "Loaded 3 video frames");
        assert_eq!(rx.try_recv().unwrap(), "Playback stopped");

        drop(rx);
        board.set("Terminating");
        assert!(board.subscribers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_progress_range_resets_value() {
        let progress = Progress::default();
        progress.set(9);
        progress.set_range(1, 100);
        assert_eq!(progress.get(), (1, 1, 100));
    }
}
