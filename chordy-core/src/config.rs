use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chordy_types::{ChordAttribute, ChordType, PadRole};
use serde::Deserialize;

use crate::chord::{ChordTable, ToneMask};
use crate::surface::{parse_pad_code, PadMap};
use crate::voicing::VoicingAnchor;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    midi: MidiConfig,
    #[serde(default)]
    voicing: VoicingConfig,
    #[serde(default)]
    pads: BTreeMap<String, String>,
    #[serde(default)]
    chord_table: BTreeMap<String, Vec<u8>>,
}

#[derive(Deserialize, Default)]
struct MidiConfig {
    client_name: Option<String>,
    input_ports: Option<Vec<String>>,
    output_ports: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct VoicingConfig {
    lead_anchor: Option<u8>,
    lead_channel: Option<u8>,
    bass_enabled: Option<bool>,
    bass_anchor: Option<u8>,
    bass_channel: Option<u8>,
    velocity: Option<u8>,
}

/// Resolved voice settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicingSettings {
    pub lead_anchor: VoicingAnchor,
    pub lead_channel: u8,
    pub bass_enabled: bool,
    pub bass_anchor: VoicingAnchor,
    pub bass_channel: u8,
    pub velocity: u8,
}

pub struct Config {
    midi: MidiConfig,
    voicing: VoicingConfig,
    pads: BTreeMap<String, String>,
    chord_table: BTreeMap<String, Vec<u8>>,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if any.
    pub fn load() -> Self {
        Self::load_with(user_config_path().as_deref())
    }

    /// Embedded defaults merged with the file at `path`.
    pub fn load_from(path: &Path) -> Self {
        Self::load_with(Some(path))
    }

    fn load_with(path: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            } else {
                log::debug!(target: "config", "no config at {}", path.display());
            }
        }

        Config {
            midi: base.midi,
            voicing: base.voicing,
            pads: base.pads,
            chord_table: base.chord_table,
        }
    }

    pub fn client_name(&self) -> String {
        self.midi.client_name.clone().unwrap_or_else(|| "chordy".to_string())
    }

    pub fn input_ports(&self) -> Vec<String> {
        self.midi.input_ports.clone().unwrap_or_default()
    }

    pub fn output_ports(&self) -> Vec<String> {
        self.midi.output_ports.clone().unwrap_or_default()
    }

    pub fn voicing(&self) -> VoicingSettings {
        let v = &self.voicing;
        VoicingSettings {
            lead_anchor: VoicingAnchor::new(v.lead_anchor.unwrap_or(60)),
            lead_channel: v.lead_channel.unwrap_or(0).min(15),
            bass_enabled: v.bass_enabled.unwrap_or(false),
            bass_anchor: VoicingAnchor::new(v.bass_anchor.unwrap_or(36)),
            bass_channel: v.bass_channel.unwrap_or(1).min(15),
            velocity: v.velocity.unwrap_or(100).clamp(1, 127),
        }
    }

    /// Pad table; malformed entries are logged and skipped.
    pub fn pad_map(&self) -> PadMap {
        let mut map = PadMap::new();
        for (key, value) in &self.pads {
            let Some(code) = parse_pad_code(key) else {
                log::warn!(target: "config", "ignoring pad with bad code {:?}", key);
                continue;
            };
            if value.trim() == "none" {
                map.insert(code, PadRole::Unmapped);
                continue;
            }
            match PadRole::parse(value) {
                Some(role) => map.insert(code, role),
                None => log::warn!(target: "config", "ignoring pad {} with bad role {:?}", key, value),
            }
        }
        map
    }

    /// Standard table with any `[chord_table]` overrides applied. Entries that
    /// differ from the standard intervals are reported, not corrected.
    pub fn chord_table(&self) -> ChordTable {
        let mut table = ChordTable::standard();
        for (symbol, slots) in &self.chord_table {
            let mask = match ToneMask::from_slots(slots) {
                Ok(mask) => mask,
                Err(slot) => {
                    log::warn!(target: "config", "ignoring chord_table.{}: slot {} out of range", symbol, slot);
                    continue;
                }
            };
            if let Some(t) = ChordType::parse(symbol) {
                table.set_type_mask(t, mask);
            } else if let Some(a) = ChordAttribute::parse(symbol) {
                table.set_attribute_mask(a, mask);
            } else {
                log::warn!(target: "config", "ignoring unknown chord_table symbol {:?}", symbol);
            }
        }
        for mismatch in table.audit() {
            log::warn!(target: "config", "chord table: {}", mismatch);
        }
        table
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chordy").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_midi(&mut base.midi, user.midi);
    merge_voicing(&mut base.voicing, user.voicing);
    base.pads.extend(user.pads.into_iter().map(|(k, v)| (normalize_pad_key(&k), v)));
    base.chord_table.extend(user.chord_table);
}

// "19" and "0x13" name the same pad; keep one spelling so overrides replace.
fn normalize_pad_key(key: &str) -> String {
    match parse_pad_code(key) {
        Some(code) => format!("0x{:02x}", code),
        None => key.to_string(),
    }
}

fn merge_midi(base: &mut MidiConfig, user: MidiConfig) {
    if user.client_name.is_some() {
        base.client_name = user.client_name;
    }
    if user.input_ports.is_some() {
        base.input_ports = user.input_ports;
    }
    if user.output_ports.is_some() {
        base.output_ports = user.output_ports;
    }
}

fn merge_voicing(base: &mut VoicingConfig, user: VoicingConfig) {
    if user.lead_anchor.is_some() {
        base.lead_anchor = user.lead_anchor;
    }
    if user.lead_channel.is_some() {
        base.lead_channel = user.lead_channel;
    }
    if user.bass_enabled.is_some() {
        base.bass_enabled = user.bass_enabled;
    }
    if user.bass_anchor.is_some() {
        base.bass_anchor = user.bass_anchor;
    }
    if user.bass_channel.is_some() {
        base.bass_channel = user.bass_channel;
    }
    if user.velocity.is_some() {
        base.velocity = user.velocity;
    }
}
