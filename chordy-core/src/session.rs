//! The session owns all mutable state of a running engine and consumes the
//! ordered input stream one event at a time.

use chordy_types::{InputEvent, NoteEvent, PadRole, TransportEvent};

use crate::chord::ChordModel;
use crate::clock::ClockTracker;
use crate::config::Config;
use crate::dispatch::{InputDispatcher, Voice};
use crate::surface::PadMap;

pub struct Session {
    clock: ClockTracker,
    dispatcher: InputDispatcher,
    pads: PadMap,
}

impl Session {
    pub fn new(pads: PadMap, dispatcher: InputDispatcher) -> Self {
        Self {
            clock: ClockTracker::new(),
            dispatcher,
            pads,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let voicing = config.voicing();
        let lead = Voice::lead(voicing.lead_anchor, voicing.lead_channel);
        let bass = voicing
            .bass_enabled
            .then(|| Voice::bass(voicing.bass_anchor, voicing.bass_channel));
        let dispatcher = InputDispatcher::new(
            ChordModel::new(config.chord_table()),
            lead,
            bass,
            voicing.velocity,
        );
        let pads = config.pad_map();
        if pads.is_empty() {
            log::warn!(target: "config", "no pads mapped; only transport input has an effect");
        }
        Self::new(pads, dispatcher)
    }

    pub fn clock(&self) -> &ClockTracker {
        &self.clock
    }

    pub fn dispatcher(&self) -> &InputDispatcher {
        &self.dispatcher
    }

    /// Process one input event, appending any note events to `out`.
    pub fn handle(&mut self, event: InputEvent, out: &mut Vec<NoteEvent>) {
        match event {
            InputEvent::Transport(transport) => self.handle_transport(transport),
            InputEvent::Pad { code, pressed } => self.handle_pad(code, pressed, out),
        }
    }

    fn handle_transport(&mut self, transport: TransportEvent) {
        match transport {
            TransportEvent::Start => {
                log::info!(target: "clock", "transport start");
                self.clock.clear();
                self.clock.save();
            }
            TransportEvent::Stop => {
                log::info!(target: "clock", "transport stop at {}", self.clock.position());
                self.clock.save();
            }
            TransportEvent::Continue => {
                self.clock.restore();
                log::info!(target: "clock", "transport continue from {}", self.clock.position());
            }
            TransportEvent::Clock => {
                self.clock.increment();
                if self.clock.position().bar_changed {
                    log::info!(target: "clock", "{}", self.clock.position());
                }
            }
        }
    }

    fn handle_pad(&mut self, code: u8, pressed: bool, out: &mut Vec<NoteEvent>) {
        let role = self.pads.role(code);
        if role == PadRole::Unmapped {
            log::debug!(target: "dispatch", "ignoring unmapped pad {:#04x}", code);
            return;
        }
        log::debug!(
            target: "dispatch",
            "pad {:#04x} {} -> {:?}",
            code,
            if pressed { "pressed" } else { "released" },
            role
        );
        self.dispatcher.handle(role, pressed, out);
    }

    /// Note-offs for everything still sounding, for use before exit.
    pub fn shutdown(&mut self, out: &mut Vec<NoteEvent>) {
        self.dispatcher.release_all(out);
    }
}
