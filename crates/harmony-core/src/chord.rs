//! Chord symbols: quality, extensions, alterations, adds/omits, and
//! figured-bass inversions over a pitch-class root (§3 data model).

use crate::constants::{ALTERATION_OFFSETS, QUALITY_SYMBOLS};
use crate::error::{ChordTheoryError, ChordTheoryResult};
use crate::pitch::PitchClass;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::OnceLock;

/// A single chromatic alteration applied to an upper chord tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alteration {
    Sharp5,
    Flat5,
    Sharp9,
    Flat9,
    Sharp11,
    Flat13,
}

impl Alteration {
    /// Parse an alteration token such as `"#5"` or `"b9"`.
    pub fn parse(token: &str) -> ChordTheoryResult<Self> {
        match token {
            "#5" => Ok(Alteration::Sharp5),
            "b5" => Ok(Alteration::Flat5),
            "#9" => Ok(Alteration::Sharp9),
            "b9" => Ok(Alteration::Flat9),
            "#11" => Ok(Alteration::Sharp11),
            "b13" => Ok(Alteration::Flat13),
            other => Err(ChordTheoryError::InvalidAlteration {
                alteration: other.to_string(),
            }),
        }
    }

    /// The scale degree this alteration modifies (5, 9, 11, or 13).
    #[must_use]
    pub fn degree(self) -> u8 {
        match self {
            Alteration::Sharp5 | Alteration::Flat5 => 5,
            Alteration::Sharp9 | Alteration::Flat9 => 9,
            Alteration::Sharp11 => 11,
            Alteration::Flat13 => 13,
        }
    }

    /// Canonical rendering, e.g. `"#5"`.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Alteration::Sharp5 => "#5",
            Alteration::Flat5 => "b5",
            Alteration::Sharp9 => "#9",
            Alteration::Flat9 => "b9",
            Alteration::Sharp11 => "#11",
            Alteration::Flat13 => "b13",
        }
    }
}

/// Closed set of triad/seventh-chord qualities. Extended tensions (9/11/13)
/// are layered on top via `Chord::extension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major7,
    Minor7,
    Dominant7,
    MinorSeventhFlatFive,
    Diminished7,
    Augmented7,
}

impl ChordQuality {
    /// Semitone offsets from the root for this quality's chord tones,
    /// excluding any extension tensions (those are added separately).
    #[must_use]
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::MinorSeventhFlatFive => &[0, 3, 6, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::Augmented7 => &[0, 4, 8, 10],
        }
    }

    /// Whether this quality already includes a seventh.
    #[must_use]
    pub fn has_seventh(self) -> bool {
        self.intervals().len() == 4
    }

    /// Canonical lead-sheet quality suffix, e.g. `"m7b5"`.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::MinorSeventhFlatFive => "m7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Augmented7 => "aug7",
        }
    }

    fn from_symbol(token: &str) -> ChordTheoryResult<Self> {
        let canonical = QUALITY_SYMBOLS
            .get(token.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(token);
        match canonical {
            "" => Ok(ChordQuality::Major),
            "m" => Ok(ChordQuality::Minor),
            "dim" => Ok(ChordQuality::Diminished),
            "aug" => Ok(ChordQuality::Augmented),
            "sus2" => Ok(ChordQuality::Sus2),
            "sus4" => Ok(ChordQuality::Sus4),
            "maj7" | "maj9" => Ok(ChordQuality::Major7),
            "m7" => Ok(ChordQuality::Minor7),
            "7" => Ok(ChordQuality::Dominant7),
            "m7b5" => Ok(ChordQuality::MinorSeventhFlatFive),
            "dim7" => Ok(ChordQuality::Diminished7),
            "aug7" => Ok(ChordQuality::Augmented7),
            other => Err(ChordTheoryError::InvalidChordSymbol {
                symbol: token.to_string(),
                reason: format!("unrecognized quality token '{other}'"),
            }),
        }
    }
}

fn chord_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^(?P<root>[A-Ga-g][#b♯♭]?)
             (?P<quality>maj7|maj9|maj|major|min7|min|minor|m7b5|dim7|aug7|dim|o7|o|aug|\+7|\+|sus2|sus4|sus|m7|min7|m|7)?
             (?P<ext>9|11|13)?
             (?P<alts>(?:\((?:\#|b)(?:5|9|11|13)\))*)
             (?:/(?P<bass>[A-Ga-g][#b♯♭]?))?$
            ",
        )
        .expect("chord symbol regex is a fixed valid pattern")
    })
}

/// A chord symbol: root, quality, optional extension, alterations,
/// added/omitted tones, and an optional slash bass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub extension: Option<u8>,
    pub alterations: SmallVec<[Alteration; 4]>,
    pub adds: SmallVec<[u8; 4]>,
    pub omits: SmallVec<[u8; 4]>,
    pub bass: Option<PitchClass>,
}

impl Chord {
    /// Construct a plain triad/seventh chord with no extensions or alterations.
    #[must_use]
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self {
            root,
            quality,
            extension: None,
            alterations: SmallVec::new(),
            adds: SmallVec::new(),
            omits: SmallVec::new(),
            bass: None,
        }
    }

    /// Attach an upper-structure extension (9, 11, or 13).
    pub fn with_extension(mut self, extension: u8) -> ChordTheoryResult<Self> {
        if ![9, 11, 13].contains(&extension) {
            return Err(ChordTheoryError::InvalidChordSymbol {
                symbol: self.symbol(),
                reason: format!("extension must be 9, 11, or 13, got {extension}"),
            });
        }
        self.extension = Some(extension);
        Ok(self)
    }

    /// Add a chromatic alteration, rejecting direct sharp/flat conflicts on
    /// the same degree.
    pub fn with_alteration(mut self, alteration: Alteration) -> ChordTheoryResult<Self> {
        let conflict = self.alterations.iter().find(|a| {
            a.degree() == alteration.degree() && **a != alteration
        });
        if let Some(existing) = conflict {
            return Err(ChordTheoryError::IncompatibleAlterations {
                alterations: vec![existing.symbol().to_string(), alteration.symbol().to_string()],
            });
        }
        if !self.alterations.contains(&alteration) {
            self.alterations.push(alteration);
        }
        Ok(self)
    }

    /// Add a non-diatonic added tone (e.g. add9, add11).
    #[must_use]
    pub fn with_add(mut self, degree: u8) -> Self {
        if !self.adds.contains(&degree) {
            self.adds.push(degree);
        }
        self
    }

    /// Omit a chord tone (commonly the 3rd or 5th).
    #[must_use]
    pub fn with_omit(mut self, degree: u8) -> Self {
        if !self.omits.contains(&degree) {
            self.omits.push(degree);
        }
        self
    }

    /// Set an explicit slash bass, distinct from the root.
    #[must_use]
    pub fn with_bass(mut self, bass: PitchClass) -> Self {
        self.bass = Some(bass);
        self
    }

    /// Parse a lead-sheet chord symbol, e.g. `"Cmaj7"`, `"Dm7b5/F"`,
    /// `"G7(#9)"`.
    pub fn parse(symbol: &str) -> ChordTheoryResult<Self> {
        let trimmed = symbol.trim();
        let caps = chord_regex()
            .captures(trimmed)
            .ok_or_else(|| ChordTheoryError::InvalidChordSymbol {
                symbol: trimmed.to_string(),
                reason: "does not match chord-symbol grammar".to_string(),
            })?;

        let root_tok = caps.name("root").map(|m| m.as_str()).unwrap_or_default();
        let root = PitchClass::parse(root_tok)?;

        let quality_tok = caps.name("quality").map(|m| m.as_str()).unwrap_or("");
        let quality = ChordQuality::from_symbol(quality_tok)?;

        let mut chord = Chord::new(root, quality);

        if let Some(ext) = caps.name("ext") {
            let value: u8 = ext.as_str().parse().map_err(|_| ChordTheoryError::InvalidChordSymbol {
                symbol: trimmed.to_string(),
                reason: "extension is not numeric".to_string(),
            })?;
            chord = chord.with_extension(value)?;
        }

        if let Some(alts) = caps.name("alts") {
            let alt_re = Regex::new(r"\((#|b)(5|9|11|13)\)").expect("fixed pattern");
            for alt_cap in alt_re.captures_iter(alts.as_str()) {
                let token = format!("{}{}", &alt_cap[1], &alt_cap[2]);
                chord = chord.with_alteration(Alteration::parse(&token)?)?;
            }
        }

        if let Some(bass_tok) = caps.name("bass") {
            chord = chord.with_bass(PitchClass::parse(bass_tok.as_str())?);
        }

        Ok(chord)
    }

    /// Resolved chord tones as pitch classes, applying quality intervals,
    /// extension, alterations, adds, and omits (in that order).
    #[must_use]
    pub fn tones(&self) -> Vec<PitchClass> {
        let mut semitones: Vec<i32> = self.quality.intervals().iter().map(|&i| i32::from(i)).collect();

        if let Some(ext) = self.extension {
            let base = match ext {
                9 => 14,
                11 => 17,
                13 => 21,
                _ => 0,
            };
            if !self.quality.has_seventh() {
                semitones.push(10);
            }
            semitones.push(base);
        }

        for alt in &self.alterations {
            let offset = ALTERATION_OFFSETS.get(alt.symbol()).copied().unwrap_or(0);
            let base = match alt.degree() {
                5 => 7,
                9 => 14,
                11 => 17,
                13 => 21,
                _ => 0,
            };
            semitones.retain(|&s| s.rem_euclid(12) != base.rem_euclid(12));
            semitones.push(base + i32::from(offset));
        }

        for &add in &self.adds {
            let base = match add {
                2 | 9 => 14,
                4 | 11 => 17,
                6 | 13 => 21,
                _ => continue,
            };
            semitones.push(base);
        }

        for &omit in &self.omits {
            let base = match omit {
                3 => 3,
                5 => 7,
                _ => continue,
            };
            semitones.retain(|&s| {
                let pc = s.rem_euclid(12);
                !(pc == base || pc == base + 1)
            });
        }

        semitones.sort_unstable();
        semitones.dedup();
        semitones
            .into_iter()
            .map(|s| self.root.transpose(s))
            .collect()
    }

    /// The effective bass note: the slash bass if present, else the root.
    #[must_use]
    pub fn bass_note(&self) -> PitchClass {
        self.bass.unwrap_or(self.root)
    }

    /// Render the full lead-sheet symbol.
    #[must_use]
    pub fn symbol(&self) -> String {
        let mut s = format!("{}{}", self.root.name_sharp(), self.quality.symbol());
        if let Some(ext) = self.extension {
            s.push_str(&ext.to_string());
        }
        for alt in &self.alterations {
            s.push('(');
            s.push_str(alt.symbol());
            s.push(')');
        }
        for &add in &self.adds {
            s.push_str(&format!("add{add}"));
        }
        for &omit in &self.omits {
            s.push_str(&format!("no{omit}"));
        }
        if let Some(bass) = self.bass {
            s.push('/');
            s.push_str(bass.name_sharp());
        }
        s
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_triad() {
        let c = Chord::parse("C").unwrap();
        assert_eq!(c.root.semitone(), 0);
        assert_eq!(c.quality, ChordQuality::Major);
    }

    #[test]
    fn test_parse_minor_seventh() {
        let c = Chord::parse("Dm7").unwrap();
        assert_eq!(c.root.semitone(), 2);
        assert_eq!(c.quality, ChordQuality::Minor7);
    }

    #[test]
    fn test_parse_half_diminished_with_bass() {
        let c = Chord::parse("Bm7b5/D").unwrap();
        assert_eq!(c.quality, ChordQuality::MinorSeventhFlatFive);
        assert_eq!(c.bass.unwrap().semitone(), 2);
    }

    #[test]
    fn test_parse_dominant_with_alteration() {
        let c = Chord::parse("G7(#9)").unwrap();
        assert_eq!(c.quality, ChordQuality::Dominant7);
        assert!(c.alterations.contains(&Alteration::Sharp9));
    }

    #[test]
    fn test_incompatible_alterations_rejected() {
        let c = Chord::new(PitchClass::new(7), ChordQuality::Dominant7)
            .with_alteration(Alteration::Sharp5)
            .unwrap();
        assert!(c.with_alteration(Alteration::Flat5).is_err());
    }

    #[test]
    fn test_tones_major_triad() {
        let c = Chord::new(PitchClass::new(0), ChordQuality::Major);
        let semis: Vec<u8> = c.tones().iter().map(|p| p.semitone()).collect();
        assert_eq!(semis, vec![0, 4, 7]);
    }

    #[test]
    fn test_tones_dominant_sharp9() {
        let c = Chord::new(PitchClass::new(7), ChordQuality::Dominant7)
            .with_alteration(Alteration::Sharp9)
            .unwrap();
        let semis: Vec<u8> = c.tones().iter().map(|p| p.semitone()).collect();
        assert!(semis.contains(&(7 + 3).rem_euclid(12)));
    }

    #[test]
    fn test_symbol_roundtrip() {
        let c = Chord::parse("Cmaj7").unwrap();
        assert_eq!(c.symbol(), "Cmaj7");
    }

    #[test]
    fn test_bass_note_defaults_to_root() {
        let c = Chord::new(PitchClass::new(0), ChordQuality::Major);
        assert_eq!(c.bass_note(), c.root);
    }
}
