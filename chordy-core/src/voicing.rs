//! Projection of a tone vector onto concrete MIDI pitches.

use std::fmt;

use chordy_types::MIDI_PITCH_MAX;
use serde::Serialize;

use crate::chord::ToneMask;

pub const VOICING_ANCHOR_MAX: u8 = 115;

/// Root, fifth, flat fifth and octave root: the subset the bass voice plays.
pub const BASS_FILTER: ToneMask = ToneMask::ROOT
    .union(ToneMask::slot(6))
    .union(ToneMask::slot(7))
    .union(ToneMask::slot(12));

/// Low edge of the output register, always within 0..=[`VOICING_ANCHOR_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VoicingAnchor(u8);

impl VoicingAnchor {
    pub fn new(value: u8) -> Self {
        Self(value.min(VOICING_ANCHOR_MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Move by `delta` semitones, clamped to the valid range.
    pub fn step(self, delta: i32) -> Self {
        let v = (self.0 as i32 + delta).clamp(0, VOICING_ANCHOR_MAX as i32);
        Self(v as u8)
    }

    /// Pitch-class window `[low, low + 11]` chord tones are folded into.
    pub fn window(self) -> (i32, i32) {
        let low = (self.0 % 12) as i32;
        (low, low + 11)
    }
}

impl fmt::Display for VoicingAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chord tone left outside the voicing window after one octave correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionAnomaly {
    pub slot: u8,
    /// Offset from pitch class C after the correction.
    pub value: i32,
    pub window: (i32, i32),
}

impl fmt::Display for ProjectionAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot {} lands at {} outside voicing window {}..={}",
            self.slot, self.value, self.window.0, self.window.1
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Output pitches in ascending slot order (not sorted by pitch).
    pub pitches: Vec<u8>,
    pub anomalies: Vec<ProjectionAnomaly>,
}

/// Render `tones & filter` above `root` into the register chosen by `anchor`.
///
/// Each set slot is folded into the anchor's pitch-class window with at most
/// one octave shift, offset by the anchor, then shifted at most one octave
/// back into MIDI range. Tones that stay outside the window are still emitted
/// and reported as anomalies.
pub fn project(tones: ToneMask, root: u8, anchor: VoicingAnchor, filter: ToneMask) -> Projection {
    let (low, high) = anchor.window();
    let mut projection = Projection::default();

    for slot in (tones & filter).slots() {
        let mut value = root as i32 + slot as i32;
        if value < low {
            value += 12;
        } else if value > high {
            value -= 12;
        }
        if value < low || value > high {
            projection.anomalies.push(ProjectionAnomaly {
                slot,
                value,
                window: (low, high),
            });
        }

        let mut pitch = value + anchor.get() as i32;
        if pitch > MIDI_PITCH_MAX {
            pitch -= 12;
        } else if pitch < 0 {
            pitch += 12;
        }
        debug_assert!((0..=MIDI_PITCH_MAX).contains(&pitch), "pitch {} after correction", pitch);
        projection.pitches.push(pitch as u8);
    }

    projection
}
