//! FrameStore - ordered frames of one clip
//!
//! Owns the frame list, selection, key bindings, the display cursor and the
//! scrub velocity state. Display indices are always `0..len()` contiguous;
//! every deletion renumbers the survivors and renames their backing files.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::atomics::ClipAtomics;
use super::codec::{Bitmap, FrameCodec};
use super::keymap::Keymap;
use super::naming::FilenameFormat;
use crate::error::{EngineError, EngineResult};
use crate::types::ControlSurface;

/// Lowest key used by generated MIDI keymaps (C2)
pub const KEYMAP_FIRST_KEY: u8 = 36;

/// Highest key used by generated MIDI keymaps (C7)
pub const KEYMAP_LAST_KEY: u8 = 96;

/// Fixed-point resolution of the scrub accumulator (micro-frames)
const SCRUB_UNIT: i64 = 1_000_000;

/// One still image of a clip
#[derive(Debug, Clone)]
pub struct Frame {
    original_index: u64,
    display_index: usize,
    thumbnail: Bitmap,
    selected: bool,
    midi_key: Option<u8>,
    kbd_key: Option<char>,
}

impl Frame {
    fn new(original_index: u64, display_index: usize, thumbnail: Bitmap) -> Self {
        Self {
            original_index,
            display_index,
            thumbnail,
            selected: false,
            midi_key: None,
            kbd_key: None,
        }
    }

    /// Position in the source sequence
    pub fn original_index(&self) -> u64 {
        self.original_index
    }

    /// Current position inside the owning store
    pub fn display_index(&self) -> usize {
        self.display_index
    }

    pub fn thumbnail(&self) -> &Bitmap {
        &self.thumbnail
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn midi_key(&self) -> Option<u8> {
        self.midi_key
    }

    pub fn kbd_key(&self) -> Option<char> {
        self.kbd_key
    }

    fn midi_slot(&mut self) -> &mut Option<u8> {
        &mut self.midi_key
    }

    fn kbd_slot(&mut self) -> &mut Option<char> {
        &mut self.kbd_key
    }
}

/// Where a store's backing image files live
#[derive(Debug, Clone, Default)]
pub struct FrameNaming {
    /// Clip directory (no backing files are touched while unset)
    pub dir: Option<PathBuf>,
    /// Filename template
    pub format: FilenameFormat,
    /// File number backing display index 0
    pub file_base: u64,
}

impl FrameNaming {
    pub fn new(dir: impl Into<PathBuf>, format: FilenameFormat, file_base: u64) -> Self {
        Self {
            dir: Some(dir.into()),
            format,
            file_base,
        }
    }

    /// Backing file for a display index
    pub fn path_for(&self, index: usize) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| self.format.path(dir, self.file_base + index as u64))
    }
}

/// Ordered frame collection for one clip
pub struct FrameStore {
    frames: Vec<Frame>,
    naming: FrameNaming,
    atomics: Arc<ClipAtomics>,
    cursor: usize,
    focus: Option<usize>,
    scrub_velocity: f64,
    scrub_accumulator: i64,
    midi_keymap: Keymap<u8>,
    kbd_keymap: Keymap<char>,
}

impl FrameStore {
    /// Create an empty store publishing its cursor through `atomics`
    pub fn new(atomics: Arc<ClipAtomics>) -> Self {
        Self {
            frames: Vec::new(),
            naming: FrameNaming::default(),
            atomics,
            cursor: 0,
            focus: None,
            scrub_velocity: 0.0,
            scrub_accumulator: 0,
            midi_keymap: Keymap::new(),
            kbd_keymap: Keymap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }

    pub fn set_naming(&mut self, naming: FrameNaming) {
        self.naming = naming;
    }

    /// Backing file for a display index, if the store has a directory
    pub fn frame_path(&self, index: usize) -> Option<PathBuf> {
        self.naming.path_for(index)
    }

    fn check_index(&self, index: usize) -> EngineResult<()> {
        if index < self.frames.len() {
            Ok(())
        } else {
            Err(EngineError::OutOfRange {
                index,
                count: self.frames.len(),
            })
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame list
    // ─────────────────────────────────────────────────────────────────────

    /// Decode `path` into a thumbnail and append it as a new frame
    ///
    /// The store is untouched unless both the decode and the allocation
    /// succeed.
    pub fn append(
        &mut self,
        path: &Path,
        original_index: u64,
        codec: &dyn FrameCodec,
        thumb_size: u16,
    ) -> EngineResult<usize> {
        let thumbnail = codec.decode_thumbnail(path, thumb_size)?;
        self.push_frame(original_index, thumbnail)
    }

    /// Append an already-decoded frame
    pub fn push_frame(&mut self, original_index: u64, thumbnail: Bitmap) -> EngineResult<usize> {
        self.frames.try_reserve(1)?;
        let index = self.frames.len();
        self.frames.push(Frame::new(original_index, index, thumbnail));
        Ok(index)
    }

    /// Append a deep copy of frame `src_index` to `dest`
    ///
    /// Backing files are not touched; linking them is the caller's job.
    pub fn copy_frame_into(&self, dest: &mut FrameStore, src_index: usize) -> EngineResult<usize> {
        let src = self.frames.get(src_index).ok_or(EngineError::OutOfRange {
            index: src_index,
            count: self.frames.len(),
        })?;
        dest.push_frame(src_index as u64, src.thumbnail.clone())
    }

    /// Delete frames `first..last`, unlinking and renaming backing files
    ///
    /// Unlink and rename failures are logged and skipped; the in-memory
    /// store is always renumbered.
    pub fn delete_range(&mut self, first: usize, last: usize) -> EngineResult<usize> {
        let count = self.frames.len();
        if first > last || last > count {
            return Err(EngineError::OutOfRange { index: last, count });
        }
        let width = last - first;
        if width == 0 {
            return Ok(0);
        }

        self.midi_keymap.remove_range(first, last);
        self.kbd_keymap.remove_range(first, last);

        for index in first..last {
            if let Some(path) = self.frame_path(index) {
                if let Err(e) = std::fs::remove_file(&path) {
                    log::warn!("FrameStore: unlink {:?} failed: {}", path, e);
                }
            }
        }

        // Renames run upwards so every target slot has already been vacated
        for index in last..count {
            if let (Some(from), Some(to)) = (self.frame_path(index), self.frame_path(index - width)) {
                if let Err(e) = std::fs::rename(&from, &to) {
                    log::warn!("FrameStore: rename {:?} -> {:?} failed: {}", from, to, e);
                }
            }
        }

        self.frames.drain(first..last);
        for (i, frame) in self.frames.iter_mut().enumerate() {
            frame.display_index = i;
        }

        self.focus = match self.focus {
            Some(f) if f >= last => Some(f - width),
            Some(f) if f >= first => None,
            other => other,
        };
        let cursor = if self.cursor >= last {
            self.cursor - width
        } else {
            self.cursor.min(first)
        };
        self.set_cursor(cursor);

        log::debug!("FrameStore: deleted frames {}..{}, {} remain", first, last, self.frames.len());
        Ok(width)
    }

    /// Delete every contiguous run of selected frames
    pub fn delete_selected(&mut self) -> EngineResult<usize> {
        let mut deleted = 0;
        while let Some((first, last)) = self.first_selected_run() {
            deleted += self.delete_range(first, last)?;
        }
        Ok(deleted)
    }

    /// Drop every frame and binding without touching backing files
    pub fn clear(&mut self) {
        self.frames.clear();
        self.midi_keymap.clear();
        self.kbd_keymap.clear();
        self.focus = None;
        self.scrub_velocity = 0.0;
        self.scrub_accumulator = 0;
        self.set_cursor(0);
    }

    fn first_selected_run(&self) -> Option<(usize, usize)> {
        let first = self.frames.iter().position(|f| f.selected)?;
        let len = self.frames[first..].iter().take_while(|f| f.selected).count();
        Some((first, first + len))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor and scrubbing
    // ─────────────────────────────────────────────────────────────────────

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped to `[0, len)`
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.frames.len().saturating_sub(1));
        self.atomics
            .frame_cursor
            .store(self.cursor as u64, Ordering::Relaxed);
    }

    /// Shift the cursor by `delta` frames, clamped; returns the applied shift
    pub fn move_cursor_by(&mut self, delta: i64) -> i64 {
        if self.frames.is_empty() {
            return 0;
        }
        let last = (self.frames.len() - 1) as i64;
        let before = self.cursor as i64;
        let after = before.saturating_add(delta).clamp(0, last);
        self.set_cursor(after as usize);
        after - before
    }

    /// Advance one frame for playback; false once the last frame is reached
    pub fn step_forward(&mut self) -> bool {
        if self.cursor + 1 >= self.frames.len() {
            return false;
        }
        self.set_cursor(self.cursor + 1);
        true
    }

    pub fn scrub_velocity(&self) -> f64 {
        self.scrub_velocity
    }

    pub fn set_scrub_velocity(&mut self, velocity: f64) {
        self.scrub_velocity = velocity;
    }

    /// Accumulated sub-frame motion, in frames
    pub fn scrub_accumulator(&self) -> f64 {
        self.scrub_accumulator as f64 / SCRUB_UNIT as f64
    }

    /// Resolve one tick of scrub motion; returns the applied shift
    ///
    /// Whole-frame velocities move directly by their truncated value.
    /// Fractional velocities accumulate and step one frame whenever the
    /// accumulator crosses ±1, carrying the remainder to the next tick.
    pub fn apply_scrub(&mut self) -> i64 {
        let velocity = self.scrub_velocity;
        if velocity.abs() >= 1.0 {
            self.scrub_accumulator = 0;
            return self.move_cursor_by(velocity.trunc() as i64);
        }
        if velocity == 0.0 {
            return 0;
        }

        self.scrub_accumulator += (velocity * SCRUB_UNIT as f64).round() as i64;
        let step = if self.scrub_accumulator >= SCRUB_UNIT {
            1
        } else if self.scrub_accumulator <= -SCRUB_UNIT {
            -1
        } else {
            return 0;
        };
        self.scrub_accumulator -= step * SCRUB_UNIT;
        self.move_cursor_by(step)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────

    /// The "currently selected" frame used by learn mode and previews
    pub fn focus(&self) -> Option<usize> {
        self.focus.filter(|&f| f < self.frames.len())
    }

    pub fn set_focus(&mut self, index: Option<usize>) {
        self.focus = index.filter(|&f| f < self.frames.len());
    }

    /// Plain click: select only `index`
    pub fn select_only(&mut self, index: usize) -> EngineResult<()> {
        self.check_index(index)?;
        self.unselect_all();
        self.frames[index].selected = true;
        self.focus = Some(index);
        Ok(())
    }

    /// Ctrl-click: flip `index`
    pub fn toggle_selected(&mut self, index: usize) -> EngineResult<()> {
        self.check_index(index)?;
        let frame = &mut self.frames[index];
        frame.selected = !frame.selected;
        self.focus = Some(index);
        Ok(())
    }

    /// Shift-click: extend from the first selected frame (or 0) to `index`
    pub fn extend_selection(&mut self, index: usize) -> EngineResult<()> {
        self.check_index(index)?;
        let anchor = self.frames.iter().position(|f| f.selected).unwrap_or(0);
        let range = if index < anchor {
            index..anchor
        } else {
            (anchor + 1).min(index)..index + 1
        };
        for frame in &mut self.frames[range] {
            frame.selected = true;
        }
        self.focus = Some(index);
        Ok(())
    }

    pub fn select_all(&mut self) {
        for frame in &mut self.frames {
            frame.selected = true;
        }
    }

    pub fn unselect_all(&mut self) {
        for frame in &mut self.frames {
            frame.selected = false;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.frames.iter().filter(|f| f.selected).count()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Key bindings
    // ─────────────────────────────────────────────────────────────────────

    pub fn midi_keymap(&self) -> &Keymap<u8> {
        &self.midi_keymap
    }

    pub fn kbd_keymap(&self) -> &Keymap<char> {
        &self.kbd_keymap
    }

    pub fn resolve_midi_key(&self, key: u8) -> Option<usize> {
        self.midi_keymap.resolve(key)
    }

    pub fn resolve_kbd_key(&self, key: char) -> Option<usize> {
        self.kbd_keymap.resolve(key)
    }

    /// Bind a MIDI note to frame `index`
    pub fn bind_midi_key(&mut self, index: usize, key: u8) -> EngineResult<()> {
        self.check_index(index)?;
        bind(&mut self.frames, &mut self.midi_keymap, Frame::midi_slot, index, key);
        Ok(())
    }

    /// Bind a keyboard key to frame `index`
    pub fn bind_kbd_key(&mut self, index: usize, key: char) -> EngineResult<()> {
        self.check_index(index)?;
        bind(&mut self.frames, &mut self.kbd_keymap, Frame::kbd_slot, index, key);
        Ok(())
    }

    /// Remove every binding of one surface; returns how many were cleared
    pub fn clear_key_bindings(&mut self, surface: ControlSurface) -> usize {
        match surface {
            ControlSurface::Midi => {
                for frame in &mut self.frames {
                    frame.midi_key = None;
                }
                self.midi_keymap.clear()
            }
            ControlSurface::Kbd => {
                for frame in &mut self.frames {
                    frame.kbd_key = None;
                }
                self.kbd_keymap.clear()
            }
        }
    }

    /// Spread the clip across keys 36..=96 as playable pads
    ///
    /// Each key covers a run of consecutive frames and resolves to the first
    /// frame of its run. Runs differ in length by at most one frame, the
    /// longer runs sitting on the low keys. Returns the number of keys mapped.
    pub fn partition_midi_keymap(&mut self) -> usize {
        self.clear_key_bindings(ControlSurface::Midi);
        let n = self.frames.len();
        let available = (KEYMAP_LAST_KEY - KEYMAP_FIRST_KEY) as usize + 1;
        let keys = available.min(n);
        if keys == 0 {
            return 0;
        }

        let base = n / keys;
        let remainder = n % keys;
        let mut start = 0;
        for k in 0..keys {
            let key = KEYMAP_FIRST_KEY + k as u8;
            bind(&mut self.frames, &mut self.midi_keymap, Frame::midi_slot, start, key);
            start += base + usize::from(k < remainder);
        }
        keys
    }

    /// Map frame `i` to key `36 + i` while keys last; returns frames mapped
    pub fn init_midi_keymap_1to1(&mut self) -> usize {
        let mut mapped = 0;
        for (index, key) in (KEYMAP_FIRST_KEY..=KEYMAP_LAST_KEY).enumerate() {
            if index >= self.frames.len() {
                break;
            }
            bind(&mut self.frames, &mut self.midi_keymap, Frame::midi_slot, index, key);
            mapped += 1;
        }
        mapped
    }
}

/// Bind `key` to `frames[index]`, unbinding whatever either side held before
fn bind<K: Ord + Copy>(
    frames: &mut [Frame],
    keymap: &mut Keymap<K>,
    slot: fn(&mut Frame) -> &mut Option<K>,
    index: usize,
    key: K,
) {
    if let Some(old_key) = slot(&mut frames[index]).take() {
        keymap.remove(old_key);
    }
    if let Some(previous) = keymap.insert(key, index) {
        if previous != index {
            if let Some(frame) = frames.get_mut(previous) {
                *slot(frame) = None;
            }
        }
    }
    *slot(&mut frames[index]) = Some(key);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCodec;

    impl FrameCodec for FakeCodec {
        fn decode_thumbnail(&self, path: &Path, size: u16) -> EngineResult<Bitmap> {
            if path.to_string_lossy().contains("corrupt") {
                return Err(EngineError::Decode("bad image".to_string()));
            }
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            Ok(Bitmap::new(size as u32, size as u32, name.into_bytes()))
        }

        fn decode_full(&self, path: &Path) -> EngineResult<Bitmap> {
            self.decode_thumbnail(path, 0)
        }
    }

    fn store_with(n: usize) -> FrameStore {
        let mut store = FrameStore::new(Arc::new(ClipAtomics::new()));
        for i in 0..n {
            store
                .push_frame(i as u64, Bitmap::new(1, 1, vec![i as u8]))
                .unwrap();
        }
        store
    }

    fn assert_contiguous(store: &FrameStore) {
        for (i, frame) in store.frames().iter().enumerate() {
            assert_eq!(frame.display_index(), i);
        }
    }

    fn assert_keymaps_consistent(store: &FrameStore) {
        for (key, idx) in store.midi_keymap().iter() {
            assert!(idx < store.len());
            assert_eq!(store.frames()[idx].midi_key(), Some(key));
        }
        for (key, idx) in store.kbd_keymap().iter() {
            assert!(idx < store.len());
            assert_eq!(store.frames()[idx].kbd_key(), Some(key));
        }
        for (i, frame) in store.frames().iter().enumerate() {
            if let Some(k) = frame.midi_key() {
                assert_eq!(store.resolve_midi_key(k), Some(i));
            }
            if let Some(k) = frame.kbd_key() {
                assert_eq!(store.resolve_kbd_key(k), Some(i));
            }
        }
    }

    #[test]
    fn test_append_counts_only_successes() {
        let mut store = FrameStore::new(Arc::new(ClipAtomics::new()));
        store.append(Path::new("/in/1.jpg"), 1, &FakeCodec, 128).unwrap();
        assert!(store.append(Path::new("/in/corrupt.jpg"), 2, &FakeCodec, 128).is_err());
        store.append(Path::new("/in/3.jpg"), 3, &FakeCodec, 128).unwrap();

        assert_eq!(store.len(), 2);
        assert_contiguous(&store);
        assert_eq!(store.frames()[1].original_index(), 3);
        assert_eq!(store.frames()[1].thumbnail().width, 128);
    }

    #[test]
    fn test_copy_frame_is_deep() {
        let src = store_with(3);
        let mut dest = store_with(0);

        let idx = src.copy_frame_into(&mut dest, 2).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(dest.frames()[0].thumbnail(), src.frames()[2].thumbnail());

        // Later changes to the source frame must not reach the copy
        let mut src = src;
        src.frames[2].thumbnail.pixels[0] = 99;
        assert_eq!(dest.frames()[0].thumbnail().pixels, vec![2]);
    }

    #[test]
    fn test_copy_frame_out_of_range() {
        let src = store_with(2);
        let mut dest = store_with(0);
        let err = src.copy_frame_into(&mut dest, 5).unwrap_err();
        assert!(matches!(err, EngineError::OutOfRange { index: 5, count: 2 }));
        assert!(dest.is_empty());
    }

    #[test]
    fn test_delete_selected_renumbers_and_shifts_keys() {
        let mut store = store_with(10);
        store.bind_midi_key(6, 60).unwrap();
        store.bind_kbd_key(4, 'q').unwrap();
        store.bind_kbd_key(9, 'z').unwrap();
        for i in 3..=5 {
            store.toggle_selected(i).unwrap();
        }

        assert_eq!(store.delete_selected().unwrap(), 3);

        assert_eq!(store.len(), 7);
        assert_contiguous(&store);
        assert_eq!(store.resolve_midi_key(60), Some(3));
        assert_eq!(store.frames()[3].midi_key(), Some(60));
        assert_eq!(store.resolve_kbd_key('q'), None);
        assert_eq!(store.resolve_kbd_key('z'), Some(6));
        assert_keymaps_consistent(&store);
    }

    #[test]
    fn test_delete_multiple_runs() {
        let mut store = store_with(8);
        for i in [1, 2, 5, 7] {
            store.toggle_selected(i).unwrap();
        }
        assert_eq!(store.delete_selected().unwrap(), 4);
        let survivors: Vec<u64> = store.frames().iter().map(|f| f.original_index()).collect();
        assert_eq!(survivors, vec![0, 3, 4, 6]);
        assert_eq!(store.selected_count(), 0);
    }

    #[test]
    fn test_delete_range_renames_backing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(5);
        store.set_naming(FrameNaming::new(dir.path(), FilenameFormat::default(), 1));
        for i in 0..5 {
            std::fs::write(store.frame_path(i).unwrap(), format!("frame{}", i)).unwrap();
        }

        store.delete_range(1, 3).unwrap();

        let read = |i: usize| std::fs::read_to_string(store.frame_path(i).unwrap()).unwrap();
        assert_eq!(read(0), "frame0");
        assert_eq!(read(1), "frame3");
        assert_eq!(read(2), "frame4");
        assert!(!store.naming().format.path(dir.path(), 4).exists());
        assert!(!store.naming().format.path(dir.path(), 5).exists());
    }

    #[test]
    fn test_delete_range_survives_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(4);
        store.set_naming(FrameNaming::new(dir.path(), FilenameFormat::default(), 0));
        // No files on disk at all: every unlink and rename fails
        assert_eq!(store.delete_range(0, 2).unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert_contiguous(&store);
    }

    #[test]
    fn test_delete_range_rejects_bad_bounds() {
        let mut store = store_with(3);
        assert!(store.delete_range(2, 5).is_err());
        assert!(store.delete_range(2, 1).is_err());
        assert_eq!(store.delete_range(1, 1).unwrap(), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_delete_adjusts_cursor_and_focus() {
        let mut store = store_with(10);
        store.set_cursor(8);
        store.set_focus(Some(9));
        store.delete_range(2, 5).unwrap();
        assert_eq!(store.cursor(), 5);
        assert_eq!(store.focus(), Some(6));

        store.set_focus(Some(1));
        store.delete_range(0, 3).unwrap();
        assert_eq!(store.focus(), None);
        assert!(store.cursor() < store.len());
    }

    #[test]
    fn test_cursor_clamped_and_published() {
        let atomics = Arc::new(ClipAtomics::new());
        let mut store = FrameStore::new(atomics.clone());
        for i in 0..5 {
            store.push_frame(i, Bitmap::default()).unwrap();
        }
        store.set_cursor(42);
        assert_eq!(store.cursor(), 4);
        assert_eq!(atomics.frame_cursor(), 4);
        assert_eq!(store.move_cursor_by(-10), -4);
        assert_eq!(atomics.frame_cursor(), 0);
    }

    #[test]
    fn test_fractional_scrub_is_exact_over_time() {
        let mut store = store_with(100);
        store.set_scrub_velocity(0.3);
        for _ in 0..10 {
            store.apply_scrub();
        }
        assert_eq!(store.cursor(), 3);
    }

    #[test]
    fn test_negative_fractional_scrub() {
        let mut store = store_with(100);
        store.set_cursor(50);
        store.set_scrub_velocity(-0.25);
        for _ in 0..8 {
            store.apply_scrub();
        }
        assert_eq!(store.cursor(), 48);
    }

    #[test]
    fn test_whole_frame_scrub_truncates_and_clamps() {
        let mut store = store_with(10);
        store.set_scrub_velocity(2.7);
        assert_eq!(store.apply_scrub(), 2);
        assert_eq!(store.cursor(), 2);

        store.set_scrub_velocity(-5.9);
        assert_eq!(store.apply_scrub(), -2);
        assert_eq!(store.cursor(), 0);

        store.set_scrub_velocity(20.0);
        store.apply_scrub();
        assert_eq!(store.cursor(), 9);
    }

    #[test]
    fn test_unbounded_scrub_velocity_clamps() {
        let mut store = store_with(10);
        store.set_cursor(4);
        store.set_scrub_velocity(20.0 / 0.0);
        assert_eq!(store.apply_scrub(), 5);
        assert_eq!(store.cursor(), 9);

        store.set_scrub_velocity(f64::NEG_INFINITY);
        assert_eq!(store.apply_scrub(), -9);
        assert_eq!(store.cursor(), 0);

        assert_eq!(store.move_cursor_by(i64::MAX), 9);
        assert_eq!(store.move_cursor_by(i64::MIN), -9);
    }

    #[test]
    fn test_step_forward_stops_at_end() {
        let mut store = store_with(2);
        assert!(store.step_forward());
        assert!(!store.step_forward());
        assert_eq!(store.cursor(), 1);
    }

    #[test]
    fn test_rebinding_moves_key() {
        let mut store = store_with(5);
        store.bind_midi_key(1, 40).unwrap();
        store.bind_midi_key(3, 40).unwrap();
        assert_eq!(store.frames()[1].midi_key(), None);
        assert_eq!(store.resolve_midi_key(40), Some(3));

        store.bind_midi_key(3, 41).unwrap();
        assert_eq!(store.resolve_midi_key(40), None);
        assert_keymaps_consistent(&store);

        assert!(store.bind_kbd_key(9, 'x').is_err());
    }

    #[test]
    fn test_clear_key_bindings_per_surface() {
        let mut store = store_with(4);
        store.bind_midi_key(0, 36).unwrap();
        store.bind_midi_key(1, 37).unwrap();
        store.bind_kbd_key(2, 'a').unwrap();

        assert_eq!(store.clear_key_bindings(ControlSurface::Midi), 2);
        assert!(store.frames().iter().all(|f| f.midi_key().is_none()));
        assert_eq!(store.resolve_kbd_key('a'), Some(2));
        assert_eq!(store.clear_key_bindings(ControlSurface::Kbd), 1);
    }

    #[test]
    fn test_partition_keymap_small_clip() {
        let mut store = store_with(10);
        assert_eq!(store.partition_midi_keymap(), 10);
        assert_eq!(store.resolve_midi_key(36), Some(0));
        assert_eq!(store.resolve_midi_key(45), Some(9));
        assert_eq!(store.resolve_midi_key(46), None);
        assert_keymaps_consistent(&store);
    }

    #[test]
    fn test_partition_keymap_spreads_remainder_low() {
        // 130 frames over 61 keys: 8 keys cover 3 frames, 53 cover 2
        let mut store = store_with(130);
        assert_eq!(store.partition_midi_keymap(), 61);
        assert_eq!(store.resolve_midi_key(36), Some(0));
        assert_eq!(store.resolve_midi_key(37), Some(3));
        assert_eq!(store.resolve_midi_key(44), Some(24));
        assert_eq!(store.resolve_midi_key(45), Some(26));
        assert_eq!(store.resolve_midi_key(96), Some(128));
        assert_keymaps_consistent(&store);
    }

    #[test]
    fn test_one_to_one_keymap() {
        let mut store = store_with(100);
        assert_eq!(store.init_midi_keymap_1to1(), 61);
        assert_eq!(store.resolve_midi_key(36), Some(0));
        assert_eq!(store.resolve_midi_key(96), Some(60));
        assert_eq!(store.frames()[61].midi_key(), None);

        let mut short = store_with(5);
        assert_eq!(short.init_midi_keymap_1to1(), 5);
    }

    #[test]
    fn test_selection_helpers() {
        let mut store = store_with(10);
        store.select_only(4).unwrap();
        store.extend_selection(7).unwrap();
        let selected: Vec<usize> = (0..10).filter(|&i| store.frames()[i].is_selected()).collect();
        assert_eq!(selected, vec![4, 5, 6, 7]);
        assert_eq!(store.focus(), Some(7));

        store.extend_selection(1).unwrap();
        assert_eq!(store.selected_count(), 7);

        store.select_all();
        assert_eq!(store.selected_count(), 10);
        store.unselect_all();
        assert_eq!(store.selected_count(), 0);
        assert!(store.select_only(10).is_err());
    }
}
