use serde::{Deserialize, Serialize};

/// Transport messages from an external clock source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportEvent {
    /// Playback from position zero.
    Start,
    /// Freeze the current position.
    Stop,
    /// Resume from the frozen position.
    Continue,
    /// One clock pulse (24 per quarter note).
    Clock,
}

/// One entry in the ordered input stream a session consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Transport(TransportEvent),
    Pad { code: u8, pressed: bool },
}

/// Note messages a session emits towards the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteEvent {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
}

impl NoteEvent {
    pub fn pitch(&self) -> u8 {
        match self {
            NoteEvent::NoteOn { pitch, .. } | NoteEvent::NoteOff { pitch, .. } => *pitch,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            NoteEvent::NoteOn { channel, .. } | NoteEvent::NoteOff { channel, .. } => *channel,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, NoteEvent::NoteOn { .. })
    }
}
