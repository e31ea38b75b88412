//! Roman-numeral parsing, rendering, and bidirectional conversion to/from
//! `Chord` within a `Key` (§3 data model, §9 resolved round-trip subset).

use crate::chord::{Chord, ChordQuality};
use crate::constants::{FIGURED_BASS_SEVENTH, FIGURED_BASS_TRIAD, MODAL_BORROWINGS};
use crate::error::{ChordTheoryError, ChordTheoryResult};
use crate::key::{Key, Mode};
use crate::pitch::PitchClass;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Upper vs. lower-case numeral casing, the traditional major/minor-quality
/// signal in Roman-numeral notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RomanCase {
    Upper,
    Lower,
}

/// Chromatic accidental applied to the scale degree itself (not the chord
/// quality), e.g. the `b` in `bVI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    Natural,
    Flat,
    Sharp,
}

impl Accidental {
    fn offset(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }
}

/// Triad/seventh quality as expressed by the Roman-numeral symbol (case plus
/// any diminished/augmented/half-diminished/dominant-seventh marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RomanQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    HalfDiminished7,
    Dominant7,
    Major7,
    Minor7,
    Diminished7,
}

impl RomanQuality {
    /// The corresponding `ChordQuality`.
    #[must_use]
    pub fn to_chord_quality(self) -> ChordQuality {
        match self {
            RomanQuality::Major => ChordQuality::Major,
            RomanQuality::Minor => ChordQuality::Minor,
            RomanQuality::Diminished => ChordQuality::Diminished,
            RomanQuality::Augmented => ChordQuality::Augmented,
            RomanQuality::HalfDiminished7 => ChordQuality::MinorSeventhFlatFive,
            RomanQuality::Dominant7 => ChordQuality::Dominant7,
            RomanQuality::Major7 => ChordQuality::Major7,
            RomanQuality::Minor7 => ChordQuality::Minor7,
            RomanQuality::Diminished7 => ChordQuality::Diminished7,
        }
    }

    fn from_chord_quality(quality: ChordQuality) -> Self {
        match quality {
            ChordQuality::Major | ChordQuality::Sus2 | ChordQuality::Sus4 => RomanQuality::Major,
            ChordQuality::Minor => RomanQuality::Minor,
            ChordQuality::Diminished => RomanQuality::Diminished,
            ChordQuality::Augmented => RomanQuality::Augmented,
            ChordQuality::MinorSeventhFlatFive => RomanQuality::HalfDiminished7,
            ChordQuality::Dominant7 => RomanQuality::Dominant7,
            ChordQuality::Major7 => RomanQuality::Major7,
            ChordQuality::Minor7 => RomanQuality::Minor7,
            ChordQuality::Diminished7 => RomanQuality::Diminished7,
            ChordQuality::Augmented7 => RomanQuality::Dominant7,
        }
    }

    fn case(self) -> RomanCase {
        match self {
            RomanQuality::Major
            | RomanQuality::Augmented
            | RomanQuality::Dominant7
            | RomanQuality::Major7 => RomanCase::Upper,
            RomanQuality::Minor
            | RomanQuality::Diminished
            | RomanQuality::HalfDiminished7
            | RomanQuality::Minor7
            | RomanQuality::Diminished7 => RomanCase::Lower,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            RomanQuality::Major | RomanQuality::Minor => "",
            RomanQuality::Diminished | RomanQuality::Diminished7 => "\u{00b0}",
            RomanQuality::Augmented => "+",
            RomanQuality::HalfDiminished7 => "\u{00f8}",
            RomanQuality::Dominant7 | RomanQuality::Major7 | RomanQuality::Minor7 => "7",
        }
    }
}

/// Figured-bass inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inversion {
    Root,
    First,
    Second,
    Third,
}

impl Inversion {
    /// Figured-bass rendering for a triad or seventh chord, per `has_seventh`.
    #[must_use]
    pub fn figures(self, has_seventh: bool) -> &'static str {
        let idx = match self {
            Inversion::Root => 0,
            Inversion::First => 1,
            Inversion::Second => 2,
            Inversion::Third => 3,
        };
        if has_seventh {
            FIGURED_BASS_SEVENTH.get(idx).copied().unwrap_or("7")
        } else {
            FIGURED_BASS_TRIAD.get(idx.min(2)).copied().unwrap_or("")
        }
    }
}

/// The target key of a secondary-dominant/secondary-leading-tone numeral,
/// e.g. the `V` in `V/V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondaryTarget {
    /// Scale degree (1-7) the secondary function tonicizes.
    pub degree: u8,
}

/// A fully-parsed Roman numeral: scale degree, accidental, quality,
/// inversion, and an optional secondary-function target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomanNumeral {
    pub degree: u8,
    pub accidental: Accidental,
    pub case: RomanCase,
    pub quality: RomanQuality,
    pub inversion: Inversion,
    pub secondary: Option<SecondaryTarget>,
}

const DEGREE_NAMES: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Case each scale degree's diatonic triad takes in a major-key context
/// (I, IV, V major; ii, iii, vi minor; vii diminished), used to render a
/// secondary-function target in its conventional case, e.g. the lowercase
/// `ii` in `V/ii`.
const SECONDARY_TARGET_CASE: [RomanCase; 7] = [
    RomanCase::Upper,
    RomanCase::Lower,
    RomanCase::Lower,
    RomanCase::Upper,
    RomanCase::Upper,
    RomanCase::Lower,
    RomanCase::Lower,
];

fn roman_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?xi)
            ^(?P<acc>[#b])?
             (?P<degree>vii|vi|iv|v|iii|ii|i)
             (?P<qual>\u{00f8}|\u{00b0}7|\u{00b0}|\+7|\+|7)?
             (?:/(?P<secacc>[#b])?(?P<secdeg>vii|vi|iv|v|iii|ii|i))?
             (?P<inv>6/5|6/4|4/3|4/2|6)?$
            ",
        )
        .expect("roman numeral regex is a fixed valid pattern")
    })
}

fn degree_from_token(token: &str) -> ChordTheoryResult<(u8, RomanCase)> {
    let upper = token.to_ascii_uppercase();
    let idx = DEGREE_NAMES
        .iter()
        .position(|d| *d == upper)
        .ok_or_else(|| ChordTheoryError::InvalidRoman {
            symbol: token.to_string(),
            reason: "not a recognized scale-degree numeral".to_string(),
        })?;
    let case = if token.chars().next().is_some_and(char::is_uppercase) {
        RomanCase::Upper
    } else {
        RomanCase::Lower
    };
    #[allow(clippy::cast_possible_truncation)]
    Ok(((idx + 1) as u8, case))
}

impl RomanNumeral {
    /// Parse a Roman-numeral symbol, e.g. `"V7"`, `"ii\u{00f8}6/5"`, `"bVI"`,
    /// `"V/V"`.
    pub fn parse(symbol: &str) -> ChordTheoryResult<Self> {
        let trimmed = symbol.trim();
        let caps = roman_regex()
            .captures(trimmed)
            .ok_or_else(|| ChordTheoryError::InvalidRoman {
                symbol: trimmed.to_string(),
                reason: "does not match roman-numeral grammar".to_string(),
            })?;

        let accidental = match caps.name("acc").map(|m| m.as_str()) {
            Some("b") => Accidental::Flat,
            Some("#") => Accidental::Sharp,
            _ => Accidental::Natural,
        };

        let degree_tok = caps.name("degree").map(|m| m.as_str()).unwrap_or("");
        let (degree, case) = degree_from_token(degree_tok)?;

        let qual_tok = caps.name("qual").map(|m| m.as_str()).unwrap_or("");
        let quality = match (qual_tok, case) {
            ("\u{00f8}", _) => RomanQuality::HalfDiminished7,
            ("\u{00b0}7", _) => RomanQuality::Diminished7,
            ("\u{00b0}", _) => RomanQuality::Diminished,
            ("+7", _) => RomanQuality::Dominant7,
            ("+", _) => RomanQuality::Augmented,
            ("7", RomanCase::Upper) => RomanQuality::Dominant7,
            ("7", RomanCase::Lower) => RomanQuality::Minor7,
            ("", RomanCase::Upper) => RomanQuality::Major,
            ("", RomanCase::Lower) => RomanQuality::Minor,
            (other, _) => {
                return Err(ChordTheoryError::InvalidRoman {
                    symbol: trimmed.to_string(),
                    reason: format!("unrecognized quality marker '{other}'"),
                })
            }
        };

        let inv_tok = caps.name("inv").map(|m| m.as_str()).unwrap_or("");
        let inversion = match inv_tok {
            "" => Inversion::Root,
            "6" => Inversion::First,
            "6/4" => Inversion::Second,
            "6/5" => Inversion::First,
            "4/3" => Inversion::Second,
            "4/2" => Inversion::Third,
            other => {
                return Err(ChordTheoryError::InvalidRoman {
                    symbol: trimmed.to_string(),
                    reason: format!("unrecognized inversion figure '{other}'"),
                })
            }
        };

        let secondary = if let Some(secdeg) = caps.name("secdeg") {
            let (deg, _) = degree_from_token(secdeg.as_str())?;
            Some(SecondaryTarget { degree: deg })
        } else {
            None
        };

        Ok(RomanNumeral {
            degree,
            accidental,
            case,
            quality,
            inversion,
            secondary,
        })
    }

    /// Render the canonical symbol.
    #[must_use]
    pub fn symbol(&self) -> String {
        let mut s = String::new();
        match self.accidental {
            Accidental::Flat => s.push('b'),
            Accidental::Sharp => s.push('#'),
            Accidental::Natural => {}
        }
        let numeral = DEGREE_NAMES[(self.degree - 1) as usize];
        let cased = match self.case {
            RomanCase::Upper => numeral.to_string(),
            RomanCase::Lower => numeral.to_ascii_lowercase(),
        };
        s.push_str(&cased);
        s.push_str(self.quality.suffix());
        if let Some(sec) = &self.secondary {
            s.push('/');
            let target_name = DEGREE_NAMES[(sec.degree - 1) as usize];
            match SECONDARY_TARGET_CASE[(sec.degree - 1) as usize] {
                RomanCase::Upper => s.push_str(target_name),
                RomanCase::Lower => s.push_str(&target_name.to_ascii_lowercase()),
            }
        }
        let figures = self.inversion.figures(self.quality.to_chord_quality().has_seventh());
        s.push_str(figures);
        s
    }

    /// Resolve this Roman numeral to a concrete `Chord` within `key`,
    /// applying secondary-function tonicization, the closed modal-borrowing
    /// table, and the raised leading tone for minor-key `V`/`V7`/`vii°`.
    pub fn to_chord(&self, key: Key) -> ChordTheoryResult<Chord> {
        let target_key = if let Some(sec) = &self.secondary {
            let target_root = key.pitch_of_degree(sec.degree).ok_or(
                ChordTheoryError::ScaleDegreeOutOfRange { degree: sec.degree },
            )?;
            Key::new(target_root, Mode::Major)
        } else {
            key
        };

        let mut root = target_key
            .pitch_of_degree(self.degree)
            .ok_or(ChordTheoryError::ScaleDegreeOutOfRange { degree: self.degree })?;
        root = root.transpose(self.accidental.offset());

        let is_minor_key = target_key.mode == Mode::Minor || target_key.mode == Mode::Aeolian;
        let mut quality = self.quality;
        if is_minor_key
            && self.accidental == Accidental::Natural
            && self.degree == 5
            && matches!(quality, RomanQuality::Minor | RomanQuality::Minor7)
        {
            quality = if quality == RomanQuality::Minor7 {
                RomanQuality::Dominant7
            } else {
                RomanQuality::Major
            };
        }

        let chord_quality = quality.to_chord_quality();
        let mut chord = Chord::new(root, chord_quality);

        if self.inversion != Inversion::Root {
            let tones = chord.tones();
            let idx = match self.inversion {
                Inversion::Root => 0,
                Inversion::First => 1,
                Inversion::Second => 2,
                Inversion::Third => 3,
            };
            if let Some(bass) = tones.get(idx) {
                chord = chord.with_bass(*bass);
            }
        }

        Ok(chord)
    }

    /// Derive the Roman numeral that produces `chord` in `key`, if the chord
    /// falls within the supported bidirectional subset (diatonic triads and
    /// sevenths, the closed modal-borrowing table, minor-key raised
    /// leading-tone dominants, and secondary dominants of a diatonic degree).
    /// Augmented-sixth chords and other exotic chromaticism are out of scope
    /// and return `RoundTripFailure`. The inversion figure is derived from
    /// `chord.bass_note()`'s position among the chord's own tones, so a
    /// slash chord round-trips to the matching figured-bass numeral.
    pub fn from_chord(chord: &Chord, key: Key) -> ChordTheoryResult<Self> {
        let mut accidental = Accidental::Natural;
        let mut degree = key.degree_of(chord.root);

        if degree.is_none() {
            for ((deg, offset), _) in MODAL_BORROWINGS.iter() {
                let candidate = key.pitch_of_degree(*deg).map(|p| p.transpose(i32::from(*offset)));
                if candidate == Some(chord.root) {
                    degree = Some(*deg);
                    accidental = if *offset < 0 { Accidental::Flat } else { Accidental::Sharp };
                    break;
                }
            }
        }

        let is_minor_key = key.mode == Mode::Minor || key.mode == Mode::Aeolian;
        if degree.is_none() && is_minor_key {
            let raised_leading_tone = key.tonic.transpose(11);
            if chord.root == raised_leading_tone {
                degree = Some(7);
                accidental = Accidental::Natural;
            }
            let raised_dominant = key.tonic.transpose(7);
            if chord.root == raised_dominant && matches!(chord.quality, ChordQuality::Major | ChordQuality::Dominant7) {
                degree = Some(5);
                accidental = Accidental::Natural;
            }
        }

        if let Some(degree) = degree {
            let quality = RomanQuality::from_chord_quality(chord.quality);
            let case = quality.case();
            let inversion = inversion_from_chord(chord, key)?;
            return Ok(RomanNumeral {
                degree,
                accidental,
                case,
                quality,
                inversion,
                secondary: None,
            });
        }

        if let Some(target_degree) = secondary_dominant_target(chord, key) {
            let quality = RomanQuality::from_chord_quality(chord.quality);
            let case = quality.case();
            let inversion = inversion_from_chord(chord, key)?;
            return Ok(RomanNumeral {
                degree: 5,
                accidental: Accidental::Natural,
                case,
                quality,
                inversion,
                secondary: Some(SecondaryTarget { degree: target_degree }),
            });
        }

        Err(ChordTheoryError::RoundTripFailure {
            roman: chord.symbol(),
            key: key.to_string(),
            reason: "chord root is not diatonic, a recognized modal borrowing, a raised leading tone, or a secondary dominant".to_string(),
        })
    }
}

/// Whether `chord` is a major or dominant-seventh chord built on the
/// dominant of some non-tonic diatonic degree of `key`, i.e. a secondary
/// dominant. Returns the tonicized degree.
fn secondary_dominant_target(chord: &Chord, key: Key) -> Option<u8> {
    if !matches!(chord.quality, ChordQuality::Major | ChordQuality::Dominant7) {
        return None;
    }
    let target_root = chord.root.transpose(-7);
    let target_degree = key.degree_of(target_root)?;
    (target_degree != 1).then_some(target_degree)
}

/// The figured-bass inversion implied by `chord.bass_note()`'s position
/// among the chord's own root/third/fifth/[seventh] tones.
fn inversion_from_chord(chord: &Chord, key: Key) -> ChordTheoryResult<Inversion> {
    let bass = chord.bass_note();
    if bass == chord.root {
        return Ok(Inversion::Root);
    }
    let tones = chord.tones();
    let limit = if chord.quality.has_seventh() { 4 } else { 3 };
    match tones.iter().take(limit).position(|t| *t == bass) {
        Some(0) => Ok(Inversion::Root),
        Some(1) => Ok(Inversion::First),
        Some(2) => Ok(Inversion::Second),
        Some(3) => Ok(Inversion::Third),
        _ => Err(ChordTheoryError::RoundTripFailure {
            roman: chord.symbol(),
            key: key.to_string(),
            reason: format!("bass note {bass} is not one of this chord's first {limit} tones"),
        }),
    }
}

impl fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dominant_seventh() {
        let rn = RomanNumeral::parse("V7").unwrap();
        assert_eq!(rn.degree, 5);
        assert_eq!(rn.quality, RomanQuality::Dominant7);
    }

    #[test]
    fn test_parse_half_diminished() {
        let rn = RomanNumeral::parse("ii\u{00f8}6/5").unwrap();
        assert_eq!(rn.degree, 2);
        assert_eq!(rn.quality, RomanQuality::HalfDiminished7);
        assert_eq!(rn.inversion, Inversion::First);
    }

    #[test]
    fn test_parse_borrowed_flat_six() {
        let rn = RomanNumeral::parse("bVI").unwrap();
        assert_eq!(rn.degree, 6);
        assert_eq!(rn.accidental, Accidental::Flat);
    }

    #[test]
    fn test_parse_secondary_dominant() {
        let rn = RomanNumeral::parse("V/V").unwrap();
        assert_eq!(rn.degree, 5);
        assert_eq!(rn.secondary, Some(SecondaryTarget { degree: 5 }));
    }

    #[test]
    fn test_to_chord_major_key_tonic() {
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let rn = RomanNumeral::parse("I").unwrap();
        let chord = rn.to_chord(key).unwrap();
        assert_eq!(chord.root.semitone(), 0);
        assert_eq!(chord.quality, ChordQuality::Major);
    }

    #[test]
    fn test_to_chord_minor_key_raised_dominant() {
        let key = Key::new(PitchClass::new(9), Mode::Minor);
        let rn = RomanNumeral::parse("V").unwrap();
        let chord = rn.to_chord(key).unwrap();
        assert_eq!(chord.quality, ChordQuality::Major);
        assert_eq!(chord.root.semitone(), 4);
    }

    #[test]
    fn test_roundtrip_diatonic_triads() {
        let key = Key::new(PitchClass::new(0), Mode::Major);
        for symbol in ["I", "ii", "iii", "IV", "V", "vi", "vii\u{00b0}"] {
            let rn = RomanNumeral::parse(symbol).unwrap();
            let chord = rn.to_chord(key).unwrap();
            let back = RomanNumeral::from_chord(&chord, key).unwrap();
            assert_eq!(back.degree, rn.degree);
            assert_eq!(back.quality, rn.quality);
        }
    }

    #[test]
    fn test_roundtrip_borrowed_flat_six() {
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let rn = RomanNumeral::parse("bVI").unwrap();
        let chord = rn.to_chord(key).unwrap();
        let back = RomanNumeral::from_chord(&chord, key).unwrap();
        assert_eq!(back.degree, 6);
        assert_eq!(back.accidental, Accidental::Flat);
    }

    #[test]
    fn test_symbol_rendering() {
        let rn = RomanNumeral::parse("V7").unwrap();
        assert_eq!(rn.symbol(), "V7");
    }

    #[test]
    fn test_from_chord_detects_secondary_dominant() {
        let key = Key::new(PitchClass::new(5), Mode::Major); // F major
        let chord = Chord::parse("D").unwrap();
        let rn = RomanNumeral::from_chord(&chord, key).unwrap();
        assert_eq!(rn.degree, 5);
        assert_eq!(rn.secondary, Some(SecondaryTarget { degree: 2 }));
        assert_eq!(rn.inversion, Inversion::Root);
        assert_eq!(rn.symbol(), "V/ii");
    }

    #[test]
    fn test_from_chord_detects_slash_bass_inversion() {
        let key = Key::new(PitchClass::new(5), Mode::Major); // F major
        let chord = Chord::parse("Gm/Bb").unwrap();
        let rn = RomanNumeral::from_chord(&chord, key).unwrap();
        assert_eq!(rn.degree, 2);
        assert_eq!(rn.inversion, Inversion::First);
        assert_eq!(rn.symbol(), "ii6");
    }

    #[test]
    fn test_from_chord_secondary_dominant_second_inversion() {
        let key = Key::new(PitchClass::new(5), Mode::Major); // F major
        let chord = Chord::parse("D/A").unwrap();
        let rn = RomanNumeral::from_chord(&chord, key).unwrap();
        assert_eq!(rn.degree, 5);
        assert_eq!(rn.secondary, Some(SecondaryTarget { degree: 2 }));
        assert_eq!(rn.inversion, Inversion::Second);
        assert_eq!(rn.symbol(), "V/ii6/4");
    }

    #[test]
    fn test_from_chord_full_e6_roundtrip_matches_parsed_romans() {
        let key = Key::new(PitchClass::new(5), Mode::Major); // F major
        let chords = [
            Chord::parse("D").unwrap(),
            Chord::parse("Gm/Bb").unwrap(),
            Chord::parse("D/A").unwrap(),
            Chord::parse("Gm").unwrap(),
            Chord::parse("F/C").unwrap(),
            Chord::parse("C").unwrap(),
            Chord::parse("F").unwrap(),
        ];
        let expected_symbols = ["V/ii", "ii6", "V/ii6/4", "ii", "I6/4", "V", "I"];
        for (chord, expected) in chords.iter().zip(expected_symbols.iter()) {
            let rn = RomanNumeral::from_chord(chord, key)
                .unwrap_or_else(|e| panic!("{chord} failed to convert: {e}"));
            assert_eq!(rn.symbol(), *expected, "chord {chord} produced wrong roman");
        }
    }
}
