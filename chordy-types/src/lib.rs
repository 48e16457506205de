//! # chordy-types
//!
//! Shared vocabulary for the chordy workspace: note names, chord symbols,
//! pad roles and the events that flow in and out of a session.
//! No logic lives here beyond parsing and naming.

mod chord;
mod event;
mod music;
mod pad;

pub use chord::{ChordAttribute, ChordType};
pub use event::{InputEvent, NoteEvent, TransportEvent};
pub use music::NoteName;
pub use pad::{PadAction, PadRole};

/// MIDI pitch numbers run 0..=127.
pub const MIDI_PITCH_MAX: i32 = 127;
