//! Token normalization for the four accepted input shapes (chord symbols,
//! Roman numerals, scale degrees, melody notes).

use crate::error::{ContextError, ContextResult};
use harmony_config::MUSICAL;
use harmony_core::{Chord, PitchClass, RomanNumeral};
use serde::{Deserialize, Serialize};

/// The raw shape of an analysis request's input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputKind {
    /// Lead-sheet chord symbols, e.g. `["Cmaj7", "Dm7", "G7"]`.
    ChordSymbols(Vec<String>),
    /// Roman numerals relative to the analysis key, e.g. `["I", "ii", "V7"]`.
    RomanNumerals(Vec<String>),
    /// Bare scale degrees (1-7), with an optional leading `#`/`b`.
    ScaleDegrees(Vec<String>),
    /// Melodic note names, e.g. `["C4", "D4", "E4"]`.
    Melody(Vec<String>),
}

impl InputKind {
    /// Number of elements in the underlying sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            InputKind::ChordSymbols(v)
            | InputKind::RomanNumerals(v)
            | InputKind::ScaleDegrees(v)
            | InputKind::Melody(v) => v.len(),
        }
    }

    /// Whether the underlying sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One normalized element of the input sequence, carrying whichever
/// theory-layer representation applies to its `InputKind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Zero-based position in the original sequence.
    pub position: usize,
    /// The original, unparsed text.
    pub raw: String,
    /// Parsed chord, present for `ChordSymbols` input.
    pub chord: Option<Chord>,
    /// Parsed Roman numeral, present for `RomanNumerals` input.
    pub roman: Option<RomanNumeral>,
    /// Parsed scale degree (1-7) with accidental folded in as a pitch-class
    /// offset, present for `ScaleDegrees` input.
    pub scale_degree: Option<u8>,
    /// Parsed melody pitch class, present for `Melody` input.
    pub pitch: Option<PitchClass>,
    /// Octave number the melody pitch sounds in, present for `Melody` input.
    /// Defaults to `MusicalConstants::default_octave` when the note name
    /// omits one (e.g. a bare `"C"` rather than `"C4"`).
    pub octave: Option<u8>,
}

impl Token {
    fn empty(position: usize, raw: &str) -> Self {
        Token {
            position,
            raw: raw.to_string(),
            chord: None,
            roman: None,
            scale_degree: None,
            pitch: None,
            octave: None,
        }
    }

    /// Absolute semitone height (`octave * 12 + pitch class`), for melody
    /// tokens only. Used to compute contour and interval direction, which
    /// pitch-class arithmetic alone cannot distinguish (e.g. an octave leap
    /// vs. a unison).
    #[must_use]
    pub fn absolute_semitone(&self) -> Option<i32> {
        let pitch = self.pitch?;
        let octave = self.octave?;
        Some(i32::from(octave) * 12 + i32::from(pitch.semitone()))
    }
}

/// Tokenize a raw input sequence into normalized `Token`s, parsing each
/// element with the theory-layer parser appropriate to its `InputKind`.
pub fn tokenize(input: &InputKind) -> ContextResult<Vec<Token>> {
    if input.is_empty() {
        return Err(ContextError::EmptyInput);
    }

    let tokens = match input {
        InputKind::ChordSymbols(items) => items
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let chord = Chord::parse(raw).map_err(|e| ContextError::TokenizationFailure {
                    position: i,
                    reason: e.to_string(),
                })?;
                let mut tok = Token::empty(i, raw);
                tok.chord = Some(chord);
                Ok(tok)
            })
            .collect::<ContextResult<Vec<_>>>()?,
        InputKind::RomanNumerals(items) => items
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let roman = RomanNumeral::parse(raw).map_err(|e| ContextError::TokenizationFailure {
                    position: i,
                    reason: e.to_string(),
                })?;
                let mut tok = Token::empty(i, raw);
                tok.roman = Some(roman);
                Ok(tok)
            })
            .collect::<ContextResult<Vec<_>>>()?,
        InputKind::ScaleDegrees(items) => items
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let trimmed = raw.trim();
                let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
                let degree: u8 = digits.parse().map_err(|_| ContextError::TokenizationFailure {
                    position: i,
                    reason: format!("'{raw}' is not a recognizable scale degree"),
                })?;
                if degree == 0 || degree > 7 {
                    return Err(ContextError::TokenizationFailure {
                        position: i,
                        reason: format!("scale degree {degree} is out of the 1-7 range"),
                    });
                }
                let mut tok = Token::empty(i, raw);
                tok.scale_degree = Some(degree);
                Ok(tok)
            })
            .collect::<ContextResult<Vec<_>>>()?,
        InputKind::Melody(items) => items
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let letters: String = raw.chars().take_while(|c| !c.is_ascii_digit()).collect();
                let pitch = PitchClass::parse(&letters).map_err(|e| ContextError::TokenizationFailure {
                    position: i,
                    reason: e.to_string(),
                })?;
                let digits: String = raw.chars().skip_while(|c| !c.is_ascii_digit()).collect();
                let octave = if digits.is_empty() {
                    MUSICAL.default_octave
                } else {
                    digits.parse::<u8>().map_err(|_| ContextError::TokenizationFailure {
                        position: i,
                        reason: format!("'{raw}' has an unparseable octave suffix"),
                    })?
                };
                let mut tok = Token::empty(i, raw);
                tok.pitch = Some(pitch);
                tok.octave = Some(octave);
                Ok(tok)
            })
            .collect::<ContextResult<Vec<_>>>()?,
    };

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_chords() {
        let input = InputKind::ChordSymbols(vec!["C".to_string(), "G7".to_string()]);
        let tokens = tokenize(&input).unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].chord.is_some());
    }

    #[test]
    fn test_tokenize_empty_rejected() {
        let input = InputKind::ChordSymbols(vec![]);
        assert!(matches!(tokenize(&input), Err(ContextError::EmptyInput)));
    }

    #[test]
    fn test_tokenize_scale_degrees() {
        let input = InputKind::ScaleDegrees(vec!["1".to_string(), "5".to_string()]);
        let tokens = tokenize(&input).unwrap();
        assert_eq!(tokens[0].scale_degree, Some(1));
        assert_eq!(tokens[1].scale_degree, Some(5));
    }

    #[test]
    fn test_tokenize_melody() {
        let input = InputKind::Melody(vec!["C4".to_string(), "E4".to_string()]);
        let tokens = tokenize(&input).unwrap();
        assert_eq!(tokens[0].pitch.unwrap().semitone(), 0);
        assert_eq!(tokens[1].pitch.unwrap().semitone(), 4);
        assert_eq!(tokens[0].octave, Some(4));
    }

    #[test]
    fn test_tokenize_melody_octave_jump_absolute_semitone() {
        let input = InputKind::Melody(vec!["C4".to_string(), "C5".to_string()]);
        let tokens = tokenize(&input).unwrap();
        assert_eq!(
            tokens[1].absolute_semitone().unwrap() - tokens[0].absolute_semitone().unwrap(),
            12
        );
    }

    #[test]
    fn test_tokenize_melody_missing_octave_defaults() {
        let input = InputKind::Melody(vec!["C".to_string()]);
        let tokens = tokenize(&input).unwrap();
        assert_eq!(tokens[0].octave, Some(harmony_config::MUSICAL.default_octave));
    }

    #[test]
    fn test_tokenize_invalid_chord_reports_position() {
        let input = InputKind::ChordSymbols(vec!["C".to_string(), "Zz9".to_string()]);
        match tokenize(&input) {
            Err(ContextError::TokenizationFailure { position, .. }) => assert_eq!(position, 1),
            other => panic!("expected TokenizationFailure, got {other:?}"),
        }
    }
}
