//! ControlSurfaceRouter - MIDI and keyboard onto one clip
//!
//! Both surfaces share the same two capabilities: bind a key to the focused
//! frame while learn mode is on, and jump or scrub using bound keys and
//! continuous controllers otherwise. The router runs on its own thread and
//! takes the project lock once per event.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::Receiver;
use stopmo_core::{ClipSide, ControlSurface, Project, ProjectState};

use crate::config::MidiConfig;
use crate::events::{ControlEvent, Key, Modifiers, RouterCommand};
use crate::input::MidiInputEvent;
use crate::output::FeedbackOutput;
use crate::preview::KeyPreview;

/// Controller number that sets scrub sensitivity
pub const CC_BEND_SPEED: u8 = 1;

/// Routes control-surface events to one clip of a project
pub struct ControlSurfaceRouter {
    project: Arc<Project>,
    target: ClipSide,
    channel: Option<u8>,
    /// Last pitch-bend amount, reapplied when sensitivity changes
    last_bend: f64,
    feedback: Option<Box<dyn FeedbackOutput>>,
    preview: Option<KeyPreview>,
}

impl ControlSurfaceRouter {
    pub fn new(project: Arc<Project>, config: &MidiConfig) -> Self {
        Self {
            project,
            target: config.target,
            channel: config.channel,
            last_bend: 0.0,
            feedback: None,
            preview: None,
        }
    }

    /// Echo jumped-to notes on `feedback`
    pub fn with_feedback(mut self, feedback: Box<dyn FeedbackOutput>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn target(&self) -> ClipSide {
        self.target
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    /// Consume events on a named thread until every sender is gone
    pub fn spawn(self, events: Receiver<ControlEvent>) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("stopmo-router".to_string())
            .spawn(move || self.run(events))
    }

    pub fn run(mut self, events: Receiver<ControlEvent>) {
        log::info!("Router: driving {} clip", self.target.name());
        for event in events.iter() {
            self.handle(event);
        }
        self.stop_preview();
        log::info!("Router: event channel closed");
    }

    pub fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Midi(event) => self.handle_midi(event),
            ControlEvent::KeyDown { key, modifiers } => self.key_down(key, modifiers),
            ControlEvent::KeyUp { key } => self.key_up(key),
            ControlEvent::Command(command) => self.command(command),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // MIDI
    // ─────────────────────────────────────────────────────────────────────

    fn handle_midi(&mut self, event: MidiInputEvent) {
        if self.channel.is_some_and(|c| c != event.channel()) {
            log::trace!("Router: ignoring {:?} (channel filter)", event);
            return;
        }

        match event {
            MidiInputEvent::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity),
            MidiInputEvent::ControlChange { cc, value, .. } => {
                let mut state = self.project.lock();
                if cc == CC_BEND_SPEED {
                    let max = state.settings.bend_speed_max;
                    let bend_speed = 1.0 + (f64::from(127 - value.min(127)) / 127.0) * max;
                    state.settings.bend_speed = bend_speed;
                    let velocity = self.last_bend / bend_speed;
                    state.clip_mut(self.target).store.set_scrub_velocity(velocity);
                } else {
                    let store = &mut state.clip_mut(self.target).store;
                    if !store.is_empty() {
                        let last = store.len() - 1;
                        store.set_cursor(usize::from(value) * last / 127);
                    }
                }
            }
            MidiInputEvent::PitchBend { bend, .. } => {
                self.last_bend = f64::from(bend);
                let mut state = self.project.lock();
                let velocity = self.last_bend / state.settings.bend_speed;
                state.clip_mut(self.target).store.set_scrub_velocity(velocity);
            }
            MidiInputEvent::NoteOff { .. } => {}
        }
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let mut state = self.project.lock();
        let learning = state.learning;
        let store = &mut state.clip_mut(self.target).store;

        if learning {
            if let Some(focus) = store.focus() {
                if let Err(e) = store.bind_midi_key(focus, note) {
                    log::warn!("Router: bind note {} failed: {}", note, e);
                    return;
                }
                drop(state);
                self.project.status().set(format!("Mapped {} -> f{}", note, focus));
                return;
            }
        }

        let Some(index) = store.resolve_midi_key(note) else {
            return;
        };
        store.set_cursor(index);
        store.set_focus(Some(index));
        drop(state);

        if let Some(feedback) = self.feedback.as_mut() {
            if let Err(e) = feedback.note_on(channel, note, velocity) {
                log::warn!("MIDI: feedback failed: {}", e);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Keyboard
    // ─────────────────────────────────────────────────────────────────────

    fn key_down(&mut self, key: Key, modifiers: Modifiers) {
        let bindable = key.bindable().filter(|_| !modifiers.ctrl);

        if let Some(c) = bindable {
            let mut state = self.project.lock();
            let learning = state.learning;
            let store = &mut state.clip_mut(self.target).store;
            if let Some(focus) = store.focus().filter(|_| learning) {
                match store.bind_kbd_key(focus, c) {
                    Ok(()) => {
                        drop(state);
                        self.project.status().set(format!("Mapped {} -> f{}", c, focus));
                    }
                    Err(e) => log::warn!("Router: bind key '{}' failed: {}", c, e),
                }
                return;
            }
        }

        match (key, modifiers.ctrl) {
            (Key::Char('a' | 'A'), true) => {
                self.edit(|state, side| state.clip_mut(side).store.select_all());
                self.project.status().set("Selected all frames");
                return;
            }
            (Key::Char('u' | 'U'), true) => {
                self.edit(|state, side| state.clip_mut(side).store.unselect_all());
                self.project.status().set("Unselected all frames");
                return;
            }
            (Key::Delete, _) => {
                let deleted = self.edit(|state, side| state.clip_mut(side).store.delete_selected());
                match deleted {
                    Ok(n) => self.project.status().set(format!("Deleted {} frames", n)),
                    Err(e) => {
                        log::error!("Router: delete failed: {}", e);
                        self.project.status().set(format!("Delete failed: {}", e));
                    }
                }
                return;
            }
            _ => {}
        }

        let Some(c) = bindable else {
            return;
        };
        let Some(center) = self.project.lock().clip(self.target).store.resolve_kbd_key(c) else {
            return;
        };

        // The preview thread takes the project lock, so stop it unlocked
        self.stop_preview();
        self.project
            .lock()
            .clip_mut(self.target)
            .store
            .set_focus(Some(center));
        match KeyPreview::start(self.project.clone(), self.target, center) {
            Ok(preview) => self.preview = Some(preview),
            Err(e) => log::error!("Router: failed to start preview: {}", e),
        }
    }

    fn key_up(&mut self, key: Key) {
        let Some(center) = self.preview.as_ref().map(KeyPreview::center) else {
            return;
        };
        let Some(c) = key.bindable() else {
            return;
        };
        let bound = self.project.lock().clip(self.target).store.resolve_kbd_key(c);
        if bound == Some(center) {
            self.stop_preview();
        }
    }

    fn stop_preview(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.stop();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Keymap commands
    // ─────────────────────────────────────────────────────────────────────

    fn command(&mut self, command: RouterCommand) {
        let message = match command {
            RouterCommand::ClearKeymap(surface) => {
                let n = self.edit(|state, side| state.clip_mut(side).store.clear_key_bindings(surface));
                match surface {
                    ControlSurface::Kbd => format!("Cleared {} key mappings", n),
                    ControlSurface::Midi => format!("Cleared {} MIDI key mappings", n),
                }
            }
            RouterCommand::PartitionMidiKeymap => {
                let n = self.edit(|state, side| state.clip_mut(side).store.partition_midi_keymap());
                format!("Mapped {} MIDI keys", n)
            }
            RouterCommand::InitMidiKeymap1to1 => {
                let n = self.edit(|state, side| state.clip_mut(side).store.init_midi_keymap_1to1());
                format!("Mapped {} MIDI keys", n)
            }
        };
        self.project.status().set(message);
    }

    /// Run `f` on the target clip with the project lock held
    fn edit<T>(&self, f: impl FnOnce(&mut ProjectState, ClipSide) -> T) -> T {
        let mut state = self.project.lock();
        f(&mut state, self.target)
    }
}
