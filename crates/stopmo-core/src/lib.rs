//! Stopmo Core - timeline synchronization and recording engine
//!
//! Couples a sequence of still frames to an audio track and keeps the two
//! locked together while an operator scrubs, plays and punch-in records a
//! derived output clip.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   lock    ┌──────────────────────────────┐
//! │ Control surfaces   │──────────►│ Project (Mutex<ProjectState>)│
//! │ (MIDI / keyboard)  │           │  input Clip    output Clip   │
//! └────────────────────┘           └──────────────┬───────────────┘
//!                                                 │ once per tick
//!                                  ┌──────────────▼───────────────┐
//!                                  │ Scheduler thread             │
//!                                  │ scrub / playback / recording │
//!                                  └──────────────┬───────────────┘
//!                                                 │ Relaxed atomics
//!                                  ┌──────────────▼───────────────┐
//!                                  │ ClipAtomics                  │
//!                                  │ frame cursor, play cursor    │
//!                                  └──────────────▲───────────────┘
//!                                                 │ lock-free
//!                                  ┌──────────────┴───────────────┐
//!                                  │ AudioCallback (RT thread)    │
//!                                  └──────────────────────────────┘
//! ```
//!
//! The real-time callback never touches the project lock. It reads the
//! video cursor and writes its own sample cursor through [`ClipAtomics`].

pub mod audio;
pub mod clip;
pub mod config;
pub mod error;
pub mod project;
pub mod scheduler;
pub mod types;

pub use clip::{Clip, ClipAtomics};
pub use error::{EngineError, EngineResult};
pub use project::{Project, ProjectState};
pub use scheduler::Scheduler;
pub use types::*;
