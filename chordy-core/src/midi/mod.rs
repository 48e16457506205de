//! MIDI byte parsing and midir-backed port handling.
//!
//! All input ports feed one channel so events from the pad controller and the
//! clock source reach the run loop in a single arrival order.

use std::fmt;

use chordy_types::NoteEvent;
use crossbeam_channel::{Receiver, Sender};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// A parsed MIDI message with its driver timestamp.
#[derive(Debug, Clone, Copy)]
pub struct MidiEvent {
    /// Event timestamp in microseconds (driver-specific epoch)
    pub timestamp_us: u64,
    pub kind: MidiEventKind,
}

/// Messages the engine cares about. Everything else is dropped at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
    },
    Clock,
    Start,
    Continue,
    Stop,
}

impl MidiEvent {
    pub fn new(timestamp_us: u64, kind: MidiEventKind) -> Self {
        Self { timestamp_us, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiError {
    Init(String),
    PortNotFound(String),
    Connect(String),
    Send(String),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "MIDI init failed: {}", e),
            Self::PortNotFound(p) => write!(f, "no MIDI port matching {}", p),
            Self::Connect(e) => write!(f, "MIDI connect failed: {}", e),
            Self::Send(e) => write!(f, "MIDI send failed: {}", e),
        }
    }
}

impl std::error::Error for MidiError {}

/// Information about an available MIDI port
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

fn matches_any(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| !p.is_empty() && name.contains(p.as_str()))
}

/// Input side: any number of open ports feeding one event channel.
pub struct MidiInputManager {
    client_name: String,
    connections: Vec<(String, MidiInputConnection<()>)>,
    event_sender: Sender<MidiEvent>,
    event_receiver: Receiver<MidiEvent>,
}

impl MidiInputManager {
    pub fn new(client_name: &str) -> Self {
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();
        Self {
            client_name: client_name.to_string(),
            connections: Vec::new(),
            event_sender,
            event_receiver,
        }
    }

    fn open(&self) -> Result<MidiInput, MidiError> {
        let mut midi_in = MidiInput::new(&self.client_name).map_err(|e| MidiError::Init(e.to_string()))?;
        // clock and transport are realtime messages, filtered by default on some backends
        midi_in.ignore(Ignore::None);
        Ok(midi_in)
    }

    pub fn list_ports(&self) -> Result<Vec<MidiPortInfo>, MidiError> {
        let midi_in = self.open()?;
        Ok(midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_in.port_name(port).ok().map(|name| MidiPortInfo { index, name })
            })
            .collect())
    }

    /// Open every port whose name contains one of `patterns`. Returns the
    /// number of ports connected.
    pub fn connect_matching(&mut self, patterns: &[String]) -> Result<usize, MidiError> {
        let targets: Vec<MidiPortInfo> = self
            .list_ports()?
            .into_iter()
            .filter(|p| matches_any(&p.name, patterns))
            .collect();
        for port in &targets {
            self.connect(port.index)?;
        }
        Ok(targets.len())
    }

    /// Connect to a MIDI input port by index
    pub fn connect(&mut self, port_index: usize) -> Result<(), MidiError> {
        // midir consumes the MidiInput on connect, so each port gets its own
        let midi_in = self.open()?;
        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| MidiError::PortNotFound(format!("index {}", port_index)))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let tx = self.event_sender.clone();
        let connection = midi_in
            .connect(
                port,
                &format!("{}-input", self.client_name),
                move |timestamp, message, _| {
                    if let Some(kind) = parse_midi_message(message) {
                        let _ = tx.send(MidiEvent::new(timestamp, kind));
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        log::info!(target: "midi", "input connected: {}", port_name);
        self.connections.push((port_name, connection));
        Ok(())
    }

    pub fn connected_port_names(&self) -> Vec<&str> {
        self.connections.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Receiving end of the merged event stream.
    pub fn receiver(&self) -> &Receiver<MidiEvent> {
        &self.event_receiver
    }

    pub fn disconnect_all(&mut self) {
        for (name, conn) in self.connections.drain(..) {
            conn.close();
            log::info!(target: "midi", "input closed: {}", name);
        }
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

/// Output side: every note event goes to all connected ports.
pub struct MidiOutputManager {
    client_name: String,
    connections: Vec<(String, MidiOutputConnection)>,
}

impl MidiOutputManager {
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            connections: Vec::new(),
        }
    }

    fn open(&self) -> Result<MidiOutput, MidiError> {
        MidiOutput::new(&self.client_name).map_err(|e| MidiError::Init(e.to_string()))
    }

    pub fn list_ports(&self) -> Result<Vec<MidiPortInfo>, MidiError> {
        let midi_out = self.open()?;
        Ok(midi_out
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_out.port_name(port).ok().map(|name| MidiPortInfo { index, name })
            })
            .collect())
    }

    pub fn connect_matching(&mut self, patterns: &[String]) -> Result<usize, MidiError> {
        let targets: Vec<MidiPortInfo> = self
            .list_ports()?
            .into_iter()
            .filter(|p| matches_any(&p.name, patterns))
            .collect();
        for port in &targets {
            self.connect(port.index)?;
        }
        Ok(targets.len())
    }

    pub fn connect(&mut self, port_index: usize) -> Result<(), MidiError> {
        let midi_out = self.open()?;
        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| MidiError::PortNotFound(format!("index {}", port_index)))?;
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());
        let connection = midi_out
            .connect(port, &format!("{}-output", self.client_name))
            .map_err(|e| MidiError::Connect(e.to_string()))?;
        log::info!(target: "midi", "output connected: {}", port_name);
        self.connections.push((port_name, connection));
        Ok(())
    }

    /// Send to every connected port. Keeps going past a failing port and
    /// reports the last failure.
    pub fn send(&mut self, event: &NoteEvent) -> Result<(), MidiError> {
        let bytes = encode_note_event(event);
        let mut result = Ok(());
        for (name, conn) in &mut self.connections {
            if let Err(e) = conn.send(&bytes) {
                result = Err(MidiError::Send(format!("{}: {}", name, e)));
            }
        }
        result
    }

    pub fn close(&mut self) {
        for (name, conn) in self.connections.drain(..) {
            conn.close();
            log::info!(target: "midi", "output closed: {}", name);
        }
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// Three-byte channel message for a note event.
pub fn encode_note_event(event: &NoteEvent) -> [u8; 3] {
    match *event {
        NoteEvent::NoteOn { channel, pitch, velocity } => {
            [0x90 | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F]
        }
        NoteEvent::NoteOff { channel, pitch } => [0x80 | (channel & 0x0F), pitch & 0x7F, 0],
    }
}

/// Parse a raw MIDI message into a MidiEventKind
pub fn parse_midi_message(data: &[u8]) -> Option<MidiEventKind> {
    let &status = data.first()?;

    // System realtime: single status byte, no channel
    match status {
        0xF8 => return Some(MidiEventKind::Clock),
        0xFA => return Some(MidiEventKind::Start),
        0xFB => return Some(MidiEventKind::Continue),
        0xFC => return Some(MidiEventKind::Stop),
        _ => {}
    }

    let channel = status & 0x0F;
    match status & 0xF0 {
        0x80 if data.len() >= 3 => Some(MidiEventKind::NoteOff {
            channel,
            note: data[1],
        }),
        // velocity 0 = note off
        0x90 if data.len() >= 3 => {
            if data[2] == 0 {
                Some(MidiEventKind::NoteOff {
                    channel,
                    note: data[1],
                })
            } else {
                Some(MidiEventKind::NoteOn {
                    channel,
                    note: data[1],
                    velocity: data[2],
                })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let data = [0x90, 60, 100]; // Note On, channel 0, note 60, velocity 100
        match parse_midi_message(&data).unwrap() {
            MidiEventKind::NoteOn {
                channel,
                note,
                velocity,
            } => {
                assert_eq!(channel, 0);
                assert_eq!(note, 60);
                assert_eq!(velocity, 100);
            }
            other => panic!("Expected NoteOn, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_note_off() {
        let event = parse_midi_message(&[0x83, 60, 0]).unwrap();
        assert_eq!(event, MidiEventKind::NoteOff { channel: 3, note: 60 });
    }

    #[test]
    fn test_parse_note_on_velocity_zero() {
        let event = parse_midi_message(&[0x90, 60, 0]).unwrap();
        assert!(matches!(event, MidiEventKind::NoteOff { .. }));
    }

    #[test]
    fn test_parse_realtime() {
        assert_eq!(parse_midi_message(&[0xF8]), Some(MidiEventKind::Clock));
        assert_eq!(parse_midi_message(&[0xFA]), Some(MidiEventKind::Start));
        assert_eq!(parse_midi_message(&[0xFB]), Some(MidiEventKind::Continue));
        assert_eq!(parse_midi_message(&[0xFC]), Some(MidiEventKind::Stop));
        // active sensing is not used
        assert_eq!(parse_midi_message(&[0xFE]), None);
    }

    #[test]
    fn test_parse_drops_control_change() {
        assert_eq!(parse_midi_message(&[0xB0, 1, 64]), None);
    }

    #[test]
    fn test_parse_empty_and_short_messages_return_none() {
        assert!(parse_midi_message(&[]).is_none());
        assert!(parse_midi_message(&[0x90, 60]).is_none());
        assert!(parse_midi_message(&[0xB0, 1]).is_none());
        assert!(parse_midi_message(&[0xE0, 0x00, 0x40]).is_none());
    }

    #[test]
    fn test_encode_note_events() {
        let on = NoteEvent::NoteOn { channel: 1, pitch: 64, velocity: 100 };
        assert_eq!(encode_note_event(&on), [0x91, 64, 100]);
        let off = NoteEvent::NoteOff { channel: 0, pitch: 60 };
        assert_eq!(encode_note_event(&off), [0x80, 60, 0]);
        assert_eq!(parse_midi_message(&encode_note_event(&off)), Some(MidiEventKind::NoteOff { channel: 0, note: 60 }));
    }

    #[test]
    fn test_port_name_matching() {
        let patterns = vec!["Launchpad Mini".to_string(), "chordyCLKIN".to_string()];
        assert!(matches_any("Launchpad Mini MK3 LPMiniMK3 MIDI", &patterns));
        assert!(matches_any("loopMIDI chordyCLKIN 1", &patterns));
        assert!(!matches_any("Midi Through Port-0", &patterns));
        assert!(!matches_any("anything", &["".to_string()]));
    }
}
