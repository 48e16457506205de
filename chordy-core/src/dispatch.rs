//! Pad-event state machine.
//!
//! Every musical change goes through [`InputDispatcher::replace_sounding`]:
//! note-off for everything currently sounding on every voice, then note-on
//! for the fresh projections. Nothing is left hanging and nothing is started
//! twice without a release in between.

use chordy_types::{NoteEvent, NoteName, PadAction, PadRole};

use crate::chord::{ChordModel, ToneMask, TONE_LEGEND};
use crate::voicing::{project, VoicingAnchor, BASS_FILTER};

/// One output register rendered from the shared chord.
#[derive(Debug, Clone)]
pub struct Voice {
    name: &'static str,
    anchor: VoicingAnchor,
    channel: u8,
    filter: ToneMask,
    sounding: Vec<u8>,
}

impl Voice {
    pub fn lead(anchor: VoicingAnchor, channel: u8) -> Self {
        Self::new("lead", anchor, channel, ToneMask::ALL)
    }

    pub fn bass(anchor: VoicingAnchor, channel: u8) -> Self {
        Self::new("bass", anchor, channel, BASS_FILTER)
    }

    fn new(name: &'static str, anchor: VoicingAnchor, channel: u8, filter: ToneMask) -> Self {
        Self {
            name,
            anchor,
            channel: channel & 0x0F,
            filter,
            sounding: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn anchor(&self) -> VoicingAnchor {
        self.anchor
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Pitches with an outstanding note-on, in emission order.
    pub fn sounding(&self) -> &[u8] {
        &self.sounding
    }

    fn release(&mut self, out: &mut Vec<NoteEvent>) {
        let channel = self.channel;
        out.extend(
            self.sounding
                .drain(..)
                .map(|pitch| NoteEvent::NoteOff { channel, pitch }),
        );
    }
}

pub struct InputDispatcher {
    chord: ChordModel,
    lead: Voice,
    bass: Option<Voice>,
    velocity: u8,
}

impl InputDispatcher {
    pub fn new(chord: ChordModel, lead: Voice, bass: Option<Voice>, velocity: u8) -> Self {
        Self {
            chord,
            lead,
            bass,
            velocity: velocity.clamp(1, 127),
        }
    }

    pub fn chord(&self) -> &ChordModel {
        &self.chord
    }

    pub fn lead(&self) -> &Voice {
        &self.lead
    }

    pub fn bass(&self) -> Option<&Voice> {
        self.bass.as_ref()
    }

    /// Apply one pad transition, appending the resulting note events to `out`.
    pub fn handle(&mut self, role: PadRole, pressed: bool, out: &mut Vec<NoteEvent>) {
        match role {
            PadRole::Root(note) if pressed => {
                self.chord.set_root(note);
                self.replace_sounding(out);
            }
            PadRole::Root(note) => {
                if self.chord.root_note() == Some(note) {
                    self.chord.clear_root();
                    self.replace_sounding(out);
                }
            }
            PadRole::Type(chord_type) if pressed => {
                let activate = self.chord.chord_type() != Some(chord_type);
                if self.chord.set_type(chord_type, activate) {
                    log::debug!(target: "dispatch", "{} cleared, chord is typeless", chord_type);
                }
                self.replace_sounding(out);
            }
            PadRole::Attribute(attribute) if pressed => {
                let activate = !self.chord.has_attribute(attribute);
                self.chord.set_attribute(attribute, activate);
                self.replace_sounding(out);
            }
            PadRole::Action(action) if pressed => self.perform(action, out),
            // Type, attribute and action pads are momentary: release does nothing.
            PadRole::Type(_) | PadRole::Attribute(_) | PadRole::Action(_) | PadRole::Unmapped => {}
        }
    }

    fn perform(&mut self, action: PadAction, out: &mut Vec<NoteEvent>) {
        match action {
            PadAction::Display => self.log_snapshot(),
            PadAction::Retrigger => self.replace_sounding(out),
            PadAction::VoicingUp | PadAction::VoicingDown => {
                let delta = if action == PadAction::VoicingUp { 1 } else { -1 };
                self.lead.anchor = self.lead.anchor.step(delta);
                log::debug!(target: "dispatch", "lead anchor -> {}", self.lead.anchor);
                self.replace_sounding(out);
            }
            PadAction::BassVoicingUp | PadAction::BassVoicingDown => {
                let Some(bass) = self.bass.as_mut() else {
                    return;
                };
                let delta = if action == PadAction::BassVoicingUp { 1 } else { -1 };
                bass.anchor = bass.anchor.step(delta);
                log::debug!(target: "dispatch", "bass anchor -> {}", bass.anchor);
                self.replace_sounding(out);
            }
        }
    }

    fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        std::iter::once(&mut self.lead).chain(self.bass.as_mut())
    }

    /// Release every sounding pitch, then start the current projection on
    /// each voice. All note-offs precede the first note-on.
    pub fn replace_sounding(&mut self, out: &mut Vec<NoteEvent>) {
        for voice in self.voices_mut() {
            voice.release(out);
        }

        let tones = self.chord.tone_vector();
        let Some(root) = self.chord.root_note() else {
            return;
        };
        let velocity = self.velocity;
        for voice in self.voices_mut() {
            let projection = project(tones, root.index(), voice.anchor, voice.filter);
            for anomaly in &projection.anomalies {
                log::warn!(target: "voicing", "{} voice: {}", voice.name, anomaly);
            }
            let channel = voice.channel;
            out.extend(projection.pitches.iter().map(|&pitch| NoteEvent::NoteOn {
                channel,
                pitch,
                velocity,
            }));
            voice.sounding = projection.pitches;
        }
    }

    /// Note-offs for everything still sounding. Used on shutdown.
    pub fn release_all(&mut self, out: &mut Vec<NoteEvent>) {
        for voice in self.voices_mut() {
            voice.release(out);
        }
    }

    fn log_snapshot(&self) {
        let snapshot = self.chord.snapshot();
        match serde_json::to_string(&snapshot) {
            Ok(json) => log::info!(target: "chord", "{}", json),
            Err(e) => log::warn!(target: "chord", "could not serialize chord snapshot: {}", e),
        }
        log::info!(target: "chord", "root {}", root_label(self.chord.root_note()));
        log::info!(target: "chord", "{}", snapshot.tones);
        for line in TONE_LEGEND.lines() {
            log::info!(target: "chord", "{}", line);
        }
        log::info!(
            target: "chord",
            "lead anchor {} sounding {:?}",
            self.lead.anchor,
            self.lead.sounding
        );
        if let Some(bass) = &self.bass {
            log::info!(target: "chord", "bass anchor {} sounding {:?}", bass.anchor, bass.sounding);
        }
    }
}

fn root_label(root: Option<NoteName>) -> String {
    match root {
        Some(note) => format!("{} ({:02})", note.name(), note.index()),
        None => "-".to_string(),
    }
}
