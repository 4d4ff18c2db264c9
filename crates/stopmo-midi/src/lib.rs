//! Control surfaces for Stopmo
//!
//! This crate provides:
//! - MIDI port discovery and connection via midir
//! - Raw MIDI parsing (notes, controllers, pitch bend)
//! - Note echo for pad controller feedback
//! - The [`ControlSurfaceRouter`], which turns MIDI and keyboard events into
//!   cursor jumps, scrub velocity and key bindings on one project clip
//! - The held-key preview oscillator
//!
//! # Architecture
//!
//! ```text
//! MIDI Device → midir callback ─┐
//!                               ├─► flume channel → router thread → Project lock
//! Keyboard / console ───────────┘
//! ```

mod config;
mod connection;
mod events;
mod input;
mod output;
mod preview;
mod router;

pub use config::MidiConfig;
pub use connection::{
    connect_output, find_input_port, list_devices, list_input_ports, list_output_ports,
    ControlDevice, MidiConnectionError,
};
pub use events::{ControlEvent, Key, Modifiers, RouterCommand};
pub use input::{MidiInputEvent, MidiInputHandler};
pub use output::{FeedbackOutput, MidiFeedback};
pub use preview::{preview_position, KeyPreview, PREVIEW_AMPLITUDE, PREVIEW_INTERVAL, PREVIEW_PHASE_STEP};
pub use router::{ControlSurfaceRouter, CC_BEND_SPEED};
