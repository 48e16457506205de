//! Musical time from an external MIDI clock.
//!
//! The tracker counts transport pulses into bar/beat/sub-beat positions. It
//! keeps a single saved snapshot so a Stop/Continue pair can freeze and resume
//! the position independently of Start, which always resets to zero.

use serde::Serialize;

/// Clock pulses per quarter note.
pub const PPQN: u32 = 24;
pub const BEATS_PER_BAR: u32 = 4;
const TICKS_PER_EIGHTH: u32 = PPQN / 2;
const TICKS_PER_SIXTEENTH: u32 = PPQN / 4;

/// Position in bars and beats plus the flags raised by the latest increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockPosition {
    pub bar: u32,
    /// 0..BEATS_PER_BAR
    pub beat: u32,
    /// Eighth within the current beat (0..2)
    pub eighth: u32,
    /// Sixteenth within the current beat (0..4)
    pub sixteenth: u32,
    /// 0..PPQN
    pub tick_from_beat: u32,
    pub tick_from_bar: u32,
    /// Absolute pulse count; -1 until the first pulse arrives.
    pub tick: i64,
    pub bar_changed: bool,
    pub beat_changed: bool,
    pub eighth_changed: bool,
    pub sixteenth_changed: bool,
}

impl ClockPosition {
    pub const CLEARED: ClockPosition = ClockPosition {
        bar: 0,
        beat: 0,
        eighth: 0,
        sixteenth: 0,
        tick_from_beat: 0,
        tick_from_bar: 0,
        tick: -1,
        bar_changed: false,
        beat_changed: false,
        eighth_changed: false,
        sixteenth_changed: false,
    };

    /// True once at least one pulse has been counted since the last clear.
    pub fn has_started(&self) -> bool {
        self.tick >= 0
    }
}

impl Default for ClockPosition {
    fn default() -> Self {
        Self::CLEARED
    }
}

/// `bar:beat:tick`, with the tick counted from the start of the beat.
impl std::fmt::Display for ClockPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.bar, self.beat, self.tick_from_beat)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClockTracker {
    position: ClockPosition,
    saved: Option<ClockPosition>,
}

impl ClockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> &ClockPosition {
        &self.position
    }

    pub fn clear(&mut self) {
        self.position = ClockPosition::CLEARED;
    }

    /// Advance by exactly one pulse.
    pub fn increment(&mut self) {
        let p = &mut self.position;
        p.bar_changed = false;
        p.beat_changed = false;
        p.eighth_changed = false;
        p.sixteenth_changed = false;

        p.tick += 1;
        p.tick_from_bar += 1;
        p.tick_from_beat += 1;

        if p.tick_from_beat >= PPQN {
            p.tick_from_beat = 0;
            p.eighth = 0;
            p.sixteenth = 0;
            p.eighth_changed = true;
            p.sixteenth_changed = true;
            p.beat += 1;
            p.beat_changed = true;
            if p.beat >= BEATS_PER_BAR {
                p.beat = 0;
                p.tick_from_bar = 0;
                p.bar += 1;
                p.bar_changed = true;
            }
            return;
        }

        let sixteenth = p.tick_from_beat / TICKS_PER_SIXTEENTH;
        if sixteenth != p.sixteenth {
            p.sixteenth = sixteenth;
            p.sixteenth_changed = true;
        }
        let eighth = p.tick_from_beat / TICKS_PER_EIGHTH;
        if eighth != p.eighth {
            p.eighth = eighth;
            p.eighth_changed = true;
        }
    }

    /// Capture the full position, change flags included. Replaces any
    /// earlier snapshot.
    pub fn save(&mut self) {
        self.saved = Some(self.position);
    }

    pub fn restore(&mut self) {
        match self.saved {
            Some(saved) => self.position = saved,
            None => log::warn!(target: "clock", "restore requested before any save; position kept"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced(n: u32) -> ClockTracker {
        let mut clock = ClockTracker::new();
        for _ in 0..n {
            clock.increment();
        }
        clock
    }

    #[test]
    fn test_cleared_state() {
        let clock = ClockTracker::new();
        assert_eq!(*clock.position(), ClockPosition::CLEARED);
        assert!(!clock.position().has_started());
    }

    #[test]
    fn test_display_is_bar_beat_tick() {
        assert_eq!(ClockTracker::new().position().to_string(), "0:0:0");
        assert_eq!(advanced(96).position().to_string(), "1:0:0");
        assert_eq!(advanced(96 + 24 + 5).position().to_string(), "1:1:5");
    }

    #[test]
    fn test_bar_and_beat_follow_tick_count() {
        for n in [0u32, 1, 23, 24, 25, 95, 96, 97, 191, 192, 500, 1000] {
            let clock = advanced(n);
            let p = clock.position();
            assert_eq!(p.bar, n / 96, "bar after {n} ticks");
            assert_eq!(p.beat, (n / 24) % 4, "beat after {n} ticks");
            assert_eq!(p.tick, n as i64 - 1);
        }
    }

    #[test]
    fn test_beat_change_flag_lasts_one_increment() {
        let mut clock = advanced(23);
        assert!(!clock.position().beat_changed);
        clock.increment();
        assert!(clock.position().beat_changed);
        assert_eq!(clock.position().tick_from_beat, 0);
        clock.increment();
        assert!(!clock.position().beat_changed);
    }

    #[test]
    fn test_bar_change_resets_beat() {
        let mut clock = advanced(95);
        assert_eq!(clock.position().beat, 3);
        clock.increment();
        let p = clock.position();
        assert!(p.bar_changed);
        assert!(p.beat_changed);
        assert_eq!(p.bar, 1);
        assert_eq!(p.beat, 0);
        assert_eq!(p.tick_from_bar, 0);
    }

    #[test]
    fn test_sub_beats_rise_within_beat() {
        let mut clock = ClockTracker::new();
        let mut last_sixteenth = 0;
        let mut changes = 0;
        for _ in 0..(PPQN - 1) {
            clock.increment();
            let p = clock.position();
            assert!(p.sixteenth >= last_sixteenth);
            last_sixteenth = p.sixteenth;
            if p.sixteenth_changed {
                changes += 1;
            }
        }
        assert_eq!(clock.position().sixteenth, 3);
        assert_eq!(clock.position().eighth, 1);
        assert_eq!(changes, 3);
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut clock = advanced(96);
        let before = *clock.position();
        clock.save();
        clock.restore();
        assert_eq!(*clock.position(), before);
    }

    #[test]
    fn test_stop_then_continue_resumes_frozen_position() {
        let mut clock = advanced(50);
        clock.save();
        let frozen = *clock.position();
        for _ in 0..30 {
            clock.increment();
        }
        clock.restore();
        assert_eq!(*clock.position(), frozen);
    }

    #[test]
    fn test_restore_without_save_keeps_position() {
        let mut clock = advanced(10);
        let before = *clock.position();
        clock.restore();
        assert_eq!(*clock.position(), before);
    }
}
