//! Play / stop / record / rewind / forward
//!
//! The soundtrack always lives on the output clip, so every transport action
//! starts or stops the output track regardless of which clip is moving.

use super::{Project, ProjectState};
use crate::types::ClipSide;

impl Project {
    /// Start playing `side`; playing the clip that already plays stops it
    pub fn play(&self, side: ClipSide) {
        let mut state = self.lock();
        if state.playing == Some(side) {
            self.stop_locked(&mut state);
            return;
        }
        if state.playing.is_some() {
            self.stop_locked(&mut state);
        }

        self.start_audio_locked(&state);
        state.playing = Some(side);
        state.recording = false;

        let clip = state.clip(side);
        let frames = clip.store.len();
        match clip.track.info() {
            Some(info) => self.status().set(format!(
                "Playing ({} frames, {}-Ch, {}Hz)",
                frames, info.channels, info.sample_rate
            )),
            None => self
                .status()
                .set(format!("Playing ({} frames, no sound)", frames)),
        }
    }

    /// Stop playback and recording
    pub fn stop(&self) {
        let mut state = self.lock();
        self.stop_locked(&mut state);
    }

    /// Start recording, or stop if already recording
    pub fn toggle_record(&self) {
        let mut state = self.lock();
        if state.recording {
            self.stop_locked(&mut state);
            return;
        }
        self.start_audio_locked(&state);
        state.playing = None;
        state.recording = true;
        log::info!(
            "Recording from input frame {} into output frame {}",
            state.input.store.cursor(),
            state.output.store.len()
        );
    }

    /// Move `side`'s cursor to the first frame
    pub fn rewind(&self, side: ClipSide) {
        self.lock().clip_mut(side).store.set_cursor(0);
    }

    /// Move `side`'s cursor to the last frame
    pub fn forward(&self, side: ClipSide) {
        let mut state = self.lock();
        let store = &mut state.clip_mut(side).store;
        let last = store.len().saturating_sub(1);
        store.set_cursor(last);
    }

    pub fn set_learning(&self, learning: bool) {
        self.lock().learning = learning;
        log::debug!("Learn mode {}", if learning { "on" } else { "off" });
    }

    /// Failure is reported and otherwise ignored; video keeps running
    fn start_audio_locked(&self, state: &ProjectState) {
        let track = &state.output.track;
        if !track.has_audio() {
            return;
        }
        if let Err(e) = track.start_playback(self.sink.as_ref()) {
            self.status().set(format!("Failed to start audio: {}", e));
        }
    }

    pub(crate) fn stop_locked(&self, state: &mut ProjectState) {
        let track = &state.output.track;
        match track.is_playing().then(|| track.stop_playback()) {
            Some(Err(e)) => self.status().set(format!("Failed to stop audio: {}", e)),
            _ => self.status().set("Playback stopped"),
        }
        state.playing = None;
        state.recording = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmBuffer;
    use crate::clip::Bitmap;
    use crate::project::ProjectSettings;

    fn project(input: usize, output: usize) -> Project {
        let project = Project::headless(ProjectSettings::default());
        {
            let mut state = project.lock();
            for i in 0..input {
                state.input.store.push_frame(i as u64, Bitmap::default()).unwrap();
            }
            for i in 0..output {
                state.output.store.push_frame(i as u64, Bitmap::default()).unwrap();
            }
        }
        project
    }

    #[test]
    fn test_play_toggles_and_switches_clips() {
        let project = project(4, 2);
        project.play(ClipSide::Input);
        assert_eq!(project.lock().playing, Some(ClipSide::Input));
        assert_eq!(project.status().current(), "Playing (4 frames, no sound)");

        project.play(ClipSide::Output);
        assert_eq!(project.lock().playing, Some(ClipSide::Output));

        project.play(ClipSide::Output);
        assert_eq!(project.lock().playing, None);
        assert_eq!(project.status().current(), "Playback stopped");
    }

    #[test]
    fn test_play_with_sound_reports_format() {
        let project = project(1, 3);
        project
            .lock()
            .output
            .track
            .load(PcmBuffer::new(vec![0.0; 16000], 2, 8000), 0.5, 30, 128);

        project.play(ClipSide::Output);
        assert_eq!(project.status().current(), "Playing (3 frames, 2-Ch, 8000Hz)");
        assert!(project.lock().output.track.is_playing());

        project.stop();
        assert!(!project.lock().output.track.is_playing());
    }

    #[test]
    fn test_unsupported_audio_still_plays_video() {
        let project = project(2, 2);
        project
            .lock()
            .output
            .track
            .load(PcmBuffer::new(vec![0.0; 600], 6, 48000), 0.5, 30, 128);
        let rx = project.status().subscribe();

        project.play(ClipSide::Input);
        assert_eq!(rx.try_recv().unwrap(), "Failed to start audio: 6-Ch playback unimplemented");
        assert_eq!(project.lock().playing, Some(ClipSide::Input));
    }

    #[test]
    fn test_record_clears_playing_and_toggles() {
        let project = project(3, 0);
        project.play(ClipSide::Input);
        project.toggle_record();
        {
            let state = project.lock();
            assert!(state.recording);
            assert!(state.playing.is_none());
        }
        project.toggle_record();
        assert!(!project.lock().recording);

        project.toggle_record();
        project.play(ClipSide::Output);
        assert!(!project.lock().recording);
    }

    #[test]
    fn test_rewind_and_forward() {
        let project = project(5, 0);
        project.forward(ClipSide::Input);
        assert_eq!(project.lock().input.store.cursor(), 4);
        project.rewind(ClipSide::Input);
        assert_eq!(project.lock().input.store.cursor(), 0);
        project.forward(ClipSide::Output);
        assert_eq!(project.lock().output.store.cursor(), 0);
    }
}
