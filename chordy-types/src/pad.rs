use serde::{Deserialize, Serialize};

use crate::{ChordAttribute, ChordType, NoteName};

/// Non-musical pad functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAction {
    /// Log a snapshot of the chord state.
    Display,
    /// Re-send the current chord.
    Retrigger,
    VoicingUp,
    VoicingDown,
    BassVoicingUp,
    BassVoicingDown,
}

impl PadAction {
    pub const ALL: [PadAction; 6] = [
        PadAction::Display,
        PadAction::Retrigger,
        PadAction::VoicingUp,
        PadAction::VoicingDown,
        PadAction::BassVoicingUp,
        PadAction::BassVoicingDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PadAction::Display => "display",
            PadAction::Retrigger => "retrigger",
            PadAction::VoicingUp => "voicing_up",
            PadAction::VoicingDown => "voicing_down",
            PadAction::BassVoicingUp => "bass_voicing_up",
            PadAction::BassVoicingDown => "bass_voicing_down",
        }
    }

    pub fn parse(name: &str) -> Option<PadAction> {
        PadAction::ALL.into_iter().find(|a| a.name() == name)
    }
}

/// What a pad does when pressed, resolved from its pad code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PadRole {
    Root(NoteName),
    Type(ChordType),
    Attribute(ChordAttribute),
    Action(PadAction),
    Unmapped,
}

impl PadRole {
    /// Parse a `kind:value` role string such as `"root:C#"`, `"type:maj"`,
    /// `"attr:min7"` or `"action:display"`.
    pub fn parse(s: &str) -> Option<PadRole> {
        let (kind, value) = s.split_once(':')?;
        match kind.trim() {
            "root" => NoteName::parse(value.trim()).map(PadRole::Root),
            "type" => ChordType::parse(value.trim()).map(PadRole::Type),
            "attr" => ChordAttribute::parse(value.trim()).map(PadRole::Attribute),
            "action" => PadAction::parse(value.trim()).map(PadRole::Action),
            _ => None,
        }
    }
}
