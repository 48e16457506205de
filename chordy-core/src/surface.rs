//! Controller surface: pad codes to roles, and raw MIDI to session input.

use std::collections::HashMap;

use chordy_types::{InputEvent, PadRole, TransportEvent};

use crate::midi::MidiEventKind;

/// Static pad-code lookup. Codes without an entry resolve to
/// [`PadRole::Unmapped`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadMap {
    roles: HashMap<u8, PadRole>,
}

impl PadMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: u8, role: PadRole) {
        if role == PadRole::Unmapped {
            self.roles.remove(&code);
        } else {
            self.roles.insert(code, role);
        }
    }

    pub fn role(&self, code: u8) -> PadRole {
        self.roles.get(&code).copied().unwrap_or(PadRole::Unmapped)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl FromIterator<(u8, PadRole)> for PadMap {
    fn from_iter<I: IntoIterator<Item = (u8, PadRole)>>(iter: I) -> Self {
        let mut map = PadMap::new();
        for (code, role) in iter {
            map.insert(code, role);
        }
        map
    }
}

/// Parse a pad code written as decimal (`"19"`) or hex (`"0x13"`).
pub fn parse_pad_code(s: &str) -> Option<u8> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Translate a parsed MIDI message into session input. Note-on with a
/// non-zero velocity is a pad press; note-off is a release.
pub fn input_from_midi(kind: &MidiEventKind) -> InputEvent {
    match *kind {
        MidiEventKind::NoteOn { note, velocity, .. } => InputEvent::Pad {
            code: note,
            pressed: velocity > 0,
        },
        MidiEventKind::NoteOff { note, .. } => InputEvent::Pad {
            code: note,
            pressed: false,
        },
        MidiEventKind::Clock => InputEvent::Transport(TransportEvent::Clock),
        MidiEventKind::Start => InputEvent::Transport(TransportEvent::Start),
        MidiEventKind::Stop => InputEvent::Transport(TransportEvent::Stop),
        MidiEventKind::Continue => InputEvent::Transport(TransportEvent::Continue),
    }
}
