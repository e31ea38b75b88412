//! Pitch-class arithmetic and note-name parsing.

use crate::error::{ChordTheoryError, ChordTheoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pitch class: one of the 12 chromatic steps, C = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchClass(u8);

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Natural-letter base pitch classes (before accidentals), C=0.
const NATURAL_BASE: [(char, u8); 7] = [
    ('C', 0),
    ('D', 2),
    ('E', 4),
    ('F', 5),
    ('G', 7),
    ('A', 9),
    ('B', 11),
];

impl PitchClass {
    /// Construct a pitch class from a raw semitone value, reducing mod 12.
    #[must_use]
    pub fn new(semitone: i32) -> Self {
        let reduced = semitone.rem_euclid(12);
        #[allow(clippy::cast_sign_loss)]
        PitchClass(reduced as u8)
    }

    /// The raw semitone value in `0..12`.
    #[must_use]
    pub fn semitone(self) -> u8 {
        self.0
    }

    /// Transpose this pitch class by `interval` semitones (may be negative).
    #[must_use]
    pub fn transpose(self, interval: i32) -> Self {
        PitchClass::new(i32::from(self.0) + interval)
    }

    /// Signed interval in `[-6, 6]` from `self` to `other`, measuring the
    /// shortest chromatic distance (used for root-motion tokens, §C3).
    #[must_use]
    pub fn shortest_interval_to(self, other: PitchClass) -> i8 {
        let raw = i32::from(other.0) - i32::from(self.0);
        let wrapped = ((raw + 6).rem_euclid(12)) - 6;
        #[allow(clippy::cast_possible_truncation)]
        {
            wrapped as i8
        }
    }

    /// Parse a note-name token (`C`, `C#`, `Db`, `C♯`, `D♭`, case-insensitive
    /// letter) into a pitch class.
    pub fn parse(token: &str) -> ChordTheoryResult<Self> {
        let normalized = normalize_accidentals(token);
        let mut chars = normalized.chars();
        let letter = chars.next().ok_or_else(|| ChordTheoryError::InvalidNoteName {
            token: token.to_string(),
            position: 0,
        })?;
        let upper = letter.to_ascii_uppercase();
        let base = NATURAL_BASE
            .iter()
            .find(|(c, _)| *c == upper)
            .map(|(_, semitone)| i32::from(*semitone))
            .ok_or_else(|| ChordTheoryError::InvalidNoteName {
                token: token.to_string(),
                position: 0,
            })?;

        let mut offset = 0i32;
        for c in chars {
            match c {
                '#' => offset += 1,
                'b' => offset -= 1,
                _ => {
                    return Err(ChordTheoryError::InvalidNoteName {
                        token: token.to_string(),
                        position: 1,
                    })
                }
            }
        }
        Ok(PitchClass::new(base + offset))
    }

    /// Render using the sharp spelling table.
    #[must_use]
    pub fn name_sharp(self) -> &'static str {
        NOTE_NAMES_SHARP[self.0 as usize]
    }

    /// Render using the flat spelling table.
    #[must_use]
    pub fn name_flat(self) -> &'static str {
        NOTE_NAMES_FLAT[self.0 as usize]
    }
}

/// Replace Unicode sharp/flat glyphs with their ASCII equivalents so the rest
/// of the parser only has to handle `#`/`b`.
fn normalize_accidentals(token: &str) -> String {
    token.chars().map(|c| match c {
        '♯' => '#',
        '♭' => 'b',
        other => other,
    }).collect()
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_sharp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naturals() {
        assert_eq!(PitchClass::parse("C").unwrap().semitone(), 0);
        assert_eq!(PitchClass::parse("g").unwrap().semitone(), 7);
    }

    #[test]
    fn test_parse_accidentals_ascii_and_unicode() {
        assert_eq!(PitchClass::parse("C#").unwrap().semitone(), 1);
        assert_eq!(PitchClass::parse("Db").unwrap().semitone(), 1);
        assert_eq!(PitchClass::parse("C♯").unwrap().semitone(), 1);
        assert_eq!(PitchClass::parse("D♭").unwrap().semitone(), 1);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PitchClass::parse("H").is_err());
        assert!(PitchClass::parse("").is_err());
    }

    #[test]
    fn test_transpose_wraps() {
        let b = PitchClass::new(11);
        assert_eq!(b.transpose(2).semitone(), 1);
        assert_eq!(PitchClass::new(0).transpose(-1).semitone(), 11);
    }

    #[test]
    fn test_shortest_interval() {
        let c = PitchClass::new(0);
        let g = PitchClass::new(7);
        assert_eq!(c.shortest_interval_to(g), -5);
        assert_eq!(g.shortest_interval_to(c), 5);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PitchClass::new(1)), "C#");
    }
}
