//! Chord model: root, quality and extensions folded into a 24-slot tone vector.
//!
//! Slot `i` of a [`ToneMask`] stands for the pitch `root + i` semitones. Each
//! chord type and attribute owns a mask in a [`ChordTable`]; the chord's tone
//! vector is the union of the active masks plus the root slot, recomputed from
//! scratch on every change.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr};

use chordy_types::{ChordAttribute, ChordType, NoteName};
use serde::Serialize;

pub const TONE_SLOTS: u8 = 24;

/// Column legend for [`ToneMask`]'s bit-string rendering.
pub const TONE_LEGEND: &str = "R 2334 5 677R 9  1   1 \n   mM     mM     1   3 ";

// Semitone intervals above the root.
const MAJOR_SECOND: u8 = 2;
const MINOR_THIRD: u8 = 3;
const MAJOR_THIRD: u8 = 4;
const PERFECT_FOURTH: u8 = 5;
const DIMINISHED_FIFTH: u8 = 6;
const PERFECT_FIFTH: u8 = 7;
const MAJOR_SIXTH: u8 = 9;
const MINOR_SEVENTH: u8 = 10;
const MAJOR_SEVENTH: u8 = 11;
const OCTAVE: u8 = 12;
const NINTH: u8 = OCTAVE + MAJOR_SECOND;
const ELEVENTH: u8 = OCTAVE + PERFECT_FOURTH;
const THIRTEENTH: u8 = OCTAVE + MAJOR_SIXTH;

/// 24-slot set of semitone offsets from a chord root. Slot 0 is the most
/// significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ToneMask(u32);

impl ToneMask {
    pub const EMPTY: ToneMask = ToneMask(0);
    pub const ALL: ToneMask = ToneMask((1 << TONE_SLOTS) - 1);
    pub const ROOT: ToneMask = ToneMask::slot(0);

    /// Mask with the single slot set. Slots at or above [`TONE_SLOTS`] are
    /// outside the vector and yield an empty mask.
    pub const fn slot(slot: u8) -> ToneMask {
        if slot >= TONE_SLOTS {
            return ToneMask(0);
        }
        ToneMask(1 << (TONE_SLOTS - 1 - slot))
    }

    pub const fn union(self, other: ToneMask) -> ToneMask {
        ToneMask(self.0 | other.0)
    }

    /// Build a mask from slot indices, failing on the first out-of-range slot.
    pub fn from_slots(slots: &[u8]) -> Result<ToneMask, u8> {
        slots.iter().try_fold(ToneMask::EMPTY, |acc, &s| {
            if s >= TONE_SLOTS {
                Err(s)
            } else {
                Ok(acc | ToneMask::slot(s))
            }
        })
    }

    pub fn contains(&self, slot: u8) -> bool {
        slot < TONE_SLOTS && self.0 & ToneMask::slot(slot).0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Set slot indices in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = u8> + '_ {
        (0..TONE_SLOTS).filter(move |&s| self.contains(s))
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for ToneMask {
    type Output = ToneMask;
    fn bitor(self, rhs: ToneMask) -> ToneMask {
        ToneMask(self.0 | rhs.0)
    }
}

impl BitAnd for ToneMask {
    type Output = ToneMask;
    fn bitand(self, rhs: ToneMask) -> ToneMask {
        ToneMask(self.0 & rhs.0)
    }
}

impl fmt::Display for ToneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:024b}", self.0)
    }
}

impl Serialize for ToneMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Per-symbol slot masks. Loaded from configuration so legacy offset tables
/// can be swapped in; [`ChordTable::audit`] reports where a table departs from
/// the standard intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTable {
    types: [ToneMask; ChordType::ALL.len()],
    attributes: [ToneMask; ChordAttribute::ALL.len()],
}

/// One entry of a [`ChordTable`] that differs from the standard intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMismatch {
    pub symbol: &'static str,
    pub expected: ToneMask,
    pub actual: ToneMask,
}

impl fmt::Display for TableMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected: Vec<u8> = self.expected.slots().collect();
        let actual: Vec<u8> = self.actual.slots().collect();
        write!(
            f,
            "{} uses slots {:?}, standard intervals are {:?}",
            self.symbol, actual, expected
        )
    }
}

fn mask(slots: &[u8]) -> ToneMask {
    slots.iter().fold(ToneMask::EMPTY, |acc, &s| acc | ToneMask::slot(s))
}

impl ChordTable {
    pub fn standard() -> Self {
        let mut types = [ToneMask::EMPTY; ChordType::ALL.len()];
        for t in ChordType::ALL {
            types[t.index()] = match t {
                ChordType::Dim => mask(&[MINOR_THIRD, DIMINISHED_FIFTH]),
                ChordType::Min => mask(&[MINOR_THIRD, PERFECT_FIFTH]),
                ChordType::Maj => mask(&[MAJOR_THIRD, PERFECT_FIFTH]),
                ChordType::Sus => mask(&[PERFECT_FOURTH, PERFECT_FIFTH]),
            };
        }
        let mut attributes = [ToneMask::EMPTY; ChordAttribute::ALL.len()];
        for a in ChordAttribute::ALL {
            attributes[a.index()] = match a {
                ChordAttribute::Add6 => mask(&[MAJOR_SIXTH]),
                ChordAttribute::Min7 => mask(&[MINOR_SEVENTH]),
                ChordAttribute::Maj7 => mask(&[MAJOR_SEVENTH]),
                ChordAttribute::Add9 => mask(&[NINTH]),
                ChordAttribute::Add11 => mask(&[ELEVENTH]),
                ChordAttribute::Add13 => mask(&[THIRTEENTH]),
            };
        }
        Self { types, attributes }
    }

    pub fn type_mask(&self, chord_type: ChordType) -> ToneMask {
        self.types[chord_type.index()]
    }

    pub fn attribute_mask(&self, attribute: ChordAttribute) -> ToneMask {
        self.attributes[attribute.index()]
    }

    pub fn set_type_mask(&mut self, chord_type: ChordType, mask: ToneMask) {
        self.types[chord_type.index()] = mask;
    }

    pub fn set_attribute_mask(&mut self, attribute: ChordAttribute, mask: ToneMask) {
        self.attributes[attribute.index()] = mask;
    }

    /// Compare every entry against [`ChordTable::standard`].
    pub fn audit(&self) -> Vec<TableMismatch> {
        let standard = ChordTable::standard();
        let types = ChordType::ALL.into_iter().filter_map(|t| {
            let (expected, actual) = (standard.type_mask(t), self.type_mask(t));
            (expected != actual).then_some(TableMismatch { symbol: t.symbol(), expected, actual })
        });
        let attributes = ChordAttribute::ALL.into_iter().filter_map(|a| {
            let (expected, actual) = (standard.attribute_mask(a), self.attribute_mask(a));
            (expected != actual).then_some(TableMismatch { symbol: a.symbol(), expected, actual })
        });
        types.chain(attributes).collect()
    }
}

impl Default for ChordTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordError {
    InvalidNoteSymbol(String),
}

impl fmt::Display for ChordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNoteSymbol(s) => write!(f, "invalid note symbol: {:?}", s),
        }
    }
}

impl std::error::Error for ChordError {}

/// Serializable view of a [`ChordModel`] for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ChordSnapshot {
    pub root: Option<NoteName>,
    pub chord_type: Option<ChordType>,
    pub attributes: Vec<ChordAttribute>,
    pub tones: ToneMask,
}

#[derive(Debug, Clone, Default)]
pub struct ChordModel {
    table: ChordTable,
    root: Option<NoteName>,
    chord_type: Option<ChordType>,
    attributes: BTreeSet<ChordAttribute>,
    tones: ToneMask,
}

impl ChordModel {
    pub fn new(table: ChordTable) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    pub fn set_root_note(&mut self, symbol: &str) -> Result<(), ChordError> {
        let note = NoteName::parse(symbol).ok_or_else(|| ChordError::InvalidNoteSymbol(symbol.to_string()))?;
        self.set_root(note);
        Ok(())
    }

    pub fn set_root(&mut self, note: NoteName) {
        self.root = Some(note);
        self.rebuild();
    }

    pub fn clear_root(&mut self) {
        self.root = None;
        self.rebuild();
    }

    /// Activate `chord_type`, or clear it when `active` is false and it is the
    /// current type. Returns true when the chord is left without a type.
    pub fn set_type(&mut self, chord_type: ChordType, active: bool) -> bool {
        if active {
            self.chord_type = Some(chord_type);
        } else if self.chord_type == Some(chord_type) {
            self.chord_type = None;
        }
        self.rebuild();
        self.chord_type.is_none()
    }

    pub fn set_attribute(&mut self, attribute: ChordAttribute, active: bool) {
        if active {
            self.attributes.insert(attribute);
        } else {
            self.attributes.remove(&attribute);
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.tones = match (self.root, self.chord_type) {
            (Some(_), Some(chord_type)) => self
                .attributes
                .iter()
                .fold(ToneMask::ROOT | self.table.type_mask(chord_type), |acc, &a| {
                    acc | self.table.attribute_mask(a)
                }),
            _ => ToneMask::EMPTY,
        };
    }

    pub fn tone_vector(&self) -> ToneMask {
        self.tones
    }

    pub fn root_note(&self) -> Option<NoteName> {
        self.root
    }

    pub fn chord_type(&self) -> Option<ChordType> {
        self.chord_type
    }

    pub fn has_attribute(&self, attribute: ChordAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = ChordAttribute> + '_ {
        self.attributes.iter().copied()
    }

    pub fn snapshot(&self) -> ChordSnapshot {
        ChordSnapshot {
            root: self.root,
            chord_type: self.chord_type,
            attributes: self.attributes().collect(),
            tones: self.tones,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_chord(chord_type: ChordType) -> ChordModel {
        let mut chord = ChordModel::default();
        chord.set_root(NoteName::C);
        chord.set_type(chord_type, true);
        chord
    }

    fn slots(mask: ToneMask) -> Vec<u8> {
        mask.slots().collect()
    }

    #[test]
    fn test_slot_zero_is_most_significant() {
        assert_eq!(ToneMask::ROOT.bits(), 1 << 23);
        assert_eq!(ToneMask::slot(23).bits(), 1);
        assert!(ToneMask::slot(24).is_empty());
        assert_eq!(ToneMask::ALL.count(), 24);
    }

    #[test]
    fn test_from_slots_rejects_out_of_range() {
        assert_eq!(slots(ToneMask::from_slots(&[0, 4, 7]).unwrap()), vec![0, 4, 7]);
        assert_eq!(ToneMask::from_slots(&[3, 24]), Err(24));
    }

    #[test]
    fn test_display_renders_24_bits() {
        let mask = ToneMask::from_slots(&[0, 4, 7]).unwrap();
        assert_eq!(mask.to_string(), "100010010000000000000000");
    }

    #[test]
    fn test_standard_table_matches_intervals() {
        let table = ChordTable::standard();
        assert!(table.audit().is_empty());
        assert_eq!(slots(table.type_mask(ChordType::Maj)), vec![4, 7]);
        assert_eq!(slots(table.type_mask(ChordType::Min)), vec![3, 7]);
        assert_eq!(slots(table.type_mask(ChordType::Dim)), vec![3, 6]);
        assert_eq!(slots(table.type_mask(ChordType::Sus)), vec![5, 7]);
        assert_eq!(slots(table.attribute_mask(ChordAttribute::Add6)), vec![9]);
        assert_eq!(slots(table.attribute_mask(ChordAttribute::Min7)), vec![10]);
        assert_eq!(slots(table.attribute_mask(ChordAttribute::Maj7)), vec![11]);
        assert_eq!(slots(table.attribute_mask(ChordAttribute::Add9)), vec![14]);
        assert_eq!(slots(table.attribute_mask(ChordAttribute::Add11)), vec![17]);
        assert_eq!(slots(table.attribute_mask(ChordAttribute::Add13)), vec![21]);
    }

    #[test]
    fn test_audit_flags_injected_mismatch() {
        let mut table = ChordTable::standard();
        table.set_attribute_mask(ChordAttribute::Min7, ToneMask::slot(9));
        let mismatches = table.audit();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].symbol, "min7");
        assert_eq!(mismatches[0].expected, ToneMask::slot(10));
        assert_eq!(mismatches[0].actual, ToneMask::slot(9));
    }

    #[test]
    fn test_injected_table_drives_rebuild() {
        let mut table = ChordTable::standard();
        table.set_attribute_mask(ChordAttribute::Min7, ToneMask::slot(9));
        let mut chord = ChordModel::new(table);
        chord.set_root(NoteName::C);
        chord.set_type(ChordType::Min, true);
        chord.set_attribute(ChordAttribute::Min7, true);
        assert_eq!(slots(chord.tone_vector()), vec![0, 3, 7, 9]);
    }

    #[test]
    fn test_set_root_note_rejects_unknown_symbol() {
        let mut chord = c_chord(ChordType::Maj);
        let before = chord.tone_vector();
        let err = chord.set_root_note("H").unwrap_err();
        assert_eq!(err, ChordError::InvalidNoteSymbol("H".to_string()));
        assert_eq!(chord.root_note(), Some(NoteName::C));
        assert_eq!(chord.tone_vector(), before);
    }

    #[test]
    fn test_set_root_note_accepts_symbol() {
        let mut chord = ChordModel::default();
        chord.set_root_note("F#").unwrap();
        assert_eq!(chord.root_note(), Some(NoteName::Fs));
    }

    #[test]
    fn test_major_triad_vector() {
        let chord = c_chord(ChordType::Maj);
        assert_eq!(slots(chord.tone_vector()), vec![0, 4, 7]);
    }

    #[test]
    fn test_type_replaces_previous_type() {
        let mut chord = c_chord(ChordType::Maj);
        assert!(!chord.set_type(ChordType::Min, true));
        assert_eq!(chord.chord_type(), Some(ChordType::Min));
        assert_eq!(slots(chord.tone_vector()), vec![0, 3, 7]);
    }

    #[test]
    fn test_deactivating_other_type_is_noop() {
        let mut chord = c_chord(ChordType::Maj);
        assert!(!chord.set_type(ChordType::Min, false));
        assert_eq!(chord.chord_type(), Some(ChordType::Maj));
        assert_eq!(slots(chord.tone_vector()), vec![0, 4, 7]);
    }

    #[test]
    fn test_deactivating_current_type_silences_with_attributes() {
        let mut chord = c_chord(ChordType::Maj);
        chord.set_attribute(ChordAttribute::Maj7, true);
        chord.set_attribute(ChordAttribute::Add9, true);
        assert!(chord.set_type(ChordType::Maj, false));
        assert_eq!(chord.chord_type(), None);
        assert!(chord.tone_vector().is_empty());
    }

    #[test]
    fn test_attributes_inert_without_type() {
        let mut chord = ChordModel::default();
        chord.set_root(NoteName::D);
        for a in ChordAttribute::ALL {
            chord.set_attribute(a, true);
            assert!(chord.tone_vector().is_empty());
        }
    }

    #[test]
    fn test_attribute_toggle_is_idempotent() {
        let mut chord = c_chord(ChordType::Min);
        chord.set_attribute(ChordAttribute::Min7, true);
        chord.set_attribute(ChordAttribute::Min7, true);
        assert_eq!(slots(chord.tone_vector()), vec![0, 3, 7, 10]);
        chord.set_attribute(ChordAttribute::Min7, false);
        chord.set_attribute(ChordAttribute::Min7, false);
        assert_eq!(slots(chord.tone_vector()), vec![0, 3, 7]);
        chord.set_attribute(ChordAttribute::Add13, false);
        assert!(!chord.has_attribute(ChordAttribute::Add13));
    }

    #[test]
    fn test_no_root_means_silence() {
        let mut chord = ChordModel::default();
        chord.set_type(ChordType::Maj, true);
        assert!(chord.tone_vector().is_empty());
        chord.set_root(NoteName::A);
        assert_eq!(slots(chord.tone_vector()), vec![0, 4, 7]);
        chord.clear_root();
        assert!(chord.tone_vector().is_empty());
        assert_eq!(chord.chord_type(), Some(ChordType::Maj));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut chord = c_chord(ChordType::Maj);
        chord.set_attribute(ChordAttribute::Add9, true);
        let json = serde_json::to_string(&chord.snapshot()).unwrap();
        assert!(json.contains("\"chord_type\":\"maj\""));
        assert!(json.contains("\"attributes\":[\"add9\"]"));
        assert!(json.contains("100010010000001000000000"));
    }
}
