//! Events delivered to the control-surface router
//!
//! MIDI events arrive from the midir callback; key and command events come
//! from whatever front end owns the keyboard.

use stopmo_core::ControlSurface;

use crate::input::MidiInputEvent;

/// A keyboard key the router understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character key
    Char(char),
    Delete,
}

impl Key {
    /// Letters and digits can carry a frame binding
    pub fn bindable(&self) -> Option<char> {
        match *self {
            Key::Char(c) if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        }
    }
}

/// Modifier state at the time of a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
    };
}

/// Keymap maintenance requested from a menu or console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterCommand {
    ClearKeymap(ControlSurface),
    PartitionMidiKeymap,
    InitMidiKeymap1to1,
}

/// Anything the router thread consumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Midi(MidiInputEvent),
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key },
    Command(RouterCommand),
}
