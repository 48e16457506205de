use serde::{Deserialize, Serialize};

/// Chord quality. At most one is active on a chord at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordType {
    Dim,
    Min,
    Maj,
    Sus,
}

impl ChordType {
    pub const ALL: [ChordType; 4] = [ChordType::Dim, ChordType::Min, ChordType::Maj, ChordType::Sus];

    pub fn symbol(&self) -> &'static str {
        match self {
            ChordType::Dim => "dim",
            ChordType::Min => "min",
            ChordType::Maj => "maj",
            ChordType::Sus => "sus",
        }
    }

    pub fn parse(symbol: &str) -> Option<ChordType> {
        ChordType::ALL.into_iter().find(|t| t.symbol() == symbol)
    }

    /// Position in [`ChordType::ALL`], used to index per-type tables.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Independent chord extensions. Each one is a toggle; none of them sounds
/// unless a [`ChordType`] is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordAttribute {
    Add6,
    Min7,
    Maj7,
    Add9,
    Add11,
    Add13,
}

impl ChordAttribute {
    pub const ALL: [ChordAttribute; 6] = [
        ChordAttribute::Add6,
        ChordAttribute::Min7,
        ChordAttribute::Maj7,
        ChordAttribute::Add9,
        ChordAttribute::Add11,
        ChordAttribute::Add13,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            ChordAttribute::Add6 => "add6",
            ChordAttribute::Min7 => "min7",
            ChordAttribute::Maj7 => "maj7",
            ChordAttribute::Add9 => "add9",
            ChordAttribute::Add11 => "add11",
            ChordAttribute::Add13 => "add13",
        }
    }

    pub fn parse(symbol: &str) -> Option<ChordAttribute> {
        ChordAttribute::ALL.into_iter().find(|a| a.symbol() == symbol)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for ChordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::fmt::Display for ChordAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
