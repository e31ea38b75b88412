//! Analysis-context construction: tokenizing the raw input and, when no
//! `key_hint` is supplied, inferring the most likely key center (§4.2).

use crate::error::{ContextError, ContextResult};
use crate::tokens::{tokenize, InputKind, Token};
use harmony_config::KEY_INFERENCE;
use harmony_core::{ChordTheoryError, Key, Mode, PitchClass};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A fully-built analysis context: normalized tokens plus the key center the
/// rest of the pipeline will analyze against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    /// Normalized input tokens, in original order.
    pub tokens: Vec<Token>,
    /// The key center used for degree/Roman-numeral resolution.
    pub key: Key,
    /// Whether `key` was inferred rather than supplied as a hint.
    pub key_inferred: bool,
    /// The inference score behind `key`, when inferred (1.0 when supplied).
    pub key_confidence: f64,
}

/// Score a candidate key against a chord sequence: diatonic-membership
/// fraction, first/last-chord tonic bonuses, non-diatonic penalty.
fn score_key(roots: &[PitchClass], key: Key) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = roots.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let diatonic_count = roots.iter().filter(|r| key.contains(**r)).count();
    #[allow(clippy::cast_precision_loss)]
    let diatonic_fraction = diatonic_count as f64 / n;

    let mut score = diatonic_fraction;
    if roots.first() == Some(&key.tonic) {
        score += KEY_INFERENCE.first_chord_tonic_bonus;
    }
    if roots.last() == Some(&key.tonic) {
        score += KEY_INFERENCE.last_chord_tonic_bonus;
    }
    score -= KEY_INFERENCE.non_diatonic_penalty * (1.0 - diatonic_fraction);
    score.clamp(0.0, 1.0)
}

/// Infer the best-scoring key among the 24 major/minor candidates for a
/// chord-root sequence. Returns the winning key and its score.
fn infer_key(roots: &[PitchClass]) -> (Key, f64) {
    let mut best = (Key::new(PitchClass::new(0), Mode::Major), f64::MIN);
    for tonic in 0..12i32 {
        for mode in [Mode::Major, Mode::Minor] {
            let candidate = Key::new(PitchClass::new(tonic), mode);
            let score = score_key(roots, candidate);
            if score > best.1 {
                best = (candidate, score);
            }
        }
    }
    best
}

/// The semitone offset implied by a scale-degree token's leading accidental
/// (`"b7"`, `"#4"`, ASCII or Unicode), `0` for a bare degree like `"5"`.
fn degree_accidental_offset(raw: &str) -> i32 {
    match raw.trim().chars().next() {
        Some('#' | '♯') => 1,
        Some('b' | '♭') => -1,
        _ => 0,
    }
}

/// Validate that every supplied scale-degree token names a pitch that
/// belongs to `key`'s own scale or its parent collection (§4.2 rule 4). A
/// bare diatonic degree always passes; an accidental is only admitted when
/// it lands on a note the parent collection actually contains (e.g. the
/// `b7` of a Mixolydian borrowing), otherwise the degree names a pitch
/// foreign to both scales and the input is rejected.
fn validate_scale_degrees(tokens: &[Token], key: Key) -> ContextResult<()> {
    let parent = key.parent_key();
    for token in tokens {
        let Some(degree) = token.scale_degree else { continue };
        let Some(base) = key.pitch_of_degree(degree) else { continue };
        let pitch = base.transpose(degree_accidental_offset(&token.raw));
        if !key.contains(pitch) && !parent.contains(pitch) {
            return Err(ChordTheoryError::KeyScaleMismatch {
                reason: format!(
                    "scale degree '{}' does not fit {key} or its parent scale {parent}",
                    token.raw
                ),
            }
            .into());
        }
    }
    Ok(())
}

/// Build an `AnalysisContext` from raw input, inferring the key when
/// `key_hint` is absent. `ScaleDegrees` and `RomanNumerals` input is already
/// key-relative; when no hint is given for those it defaults to C major,
/// since every Roman numeral/degree token is independent of the concrete
/// tonic. `ScaleDegrees` input is additionally validated against the
/// resolved key (and its parent collection) once the key is known.
pub fn build_context(input: InputKind, key_hint: Option<Key>) -> ContextResult<AnalysisContext> {
    let tokens = tokenize(&input)?;

    let (key, key_inferred, key_confidence) = if let Some(key) = key_hint {
        debug!("using supplied key hint: {key}");
        (key, false, 1.0)
    } else {
        match &input {
            InputKind::ChordSymbols(_) => {
                let roots: Vec<PitchClass> = tokens
                    .iter()
                    .filter_map(|t| t.chord.as_ref().map(|c| c.root))
                    .collect();
                let (key, score) = infer_key(&roots);
                if score < KEY_INFERENCE.acceptance_threshold {
                    return Err(ContextError::MissingKey { best_score: score });
                }
                info!("inferred key {key} with confidence {score:.3}");
                (key, true, score)
            }
            InputKind::Melody(_) => {
                let roots: Vec<PitchClass> = tokens.iter().filter_map(|t| t.pitch).collect();
                let (key, score) = infer_key(&roots);
                if score < KEY_INFERENCE.acceptance_threshold {
                    return Err(ContextError::MissingKey { best_score: score });
                }
                info!("inferred key {key} with confidence {score:.3} from melody");
                (key, true, score)
            }
            InputKind::RomanNumerals(_) | InputKind::ScaleDegrees(_) => {
                let default_key = Key::new(PitchClass::new(0), Mode::Major);
                debug!("key-relative input with no hint; defaulting to {default_key}");
                (default_key, false, 1.0)
            }
        }
    };

    if matches!(input, InputKind::ScaleDegrees(_)) {
        validate_scale_degrees(&tokens, key)?;
    }

    Ok(AnalysisContext {
        tokens,
        key,
        key_inferred,
        key_confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context_with_hint() {
        let input = InputKind::ChordSymbols(vec!["C".to_string(), "G".to_string()]);
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let ctx = build_context(input, Some(key)).unwrap();
        assert_eq!(ctx.key, key);
        assert!(!ctx.key_inferred);
    }

    #[test]
    fn test_build_context_infers_c_major() {
        let input = InputKind::ChordSymbols(vec![
            "C".to_string(),
            "F".to_string(),
            "G".to_string(),
            "C".to_string(),
        ]);
        let ctx = build_context(input, None).unwrap();
        assert_eq!(ctx.key.tonic.semitone(), 0);
        assert_eq!(ctx.key.mode, Mode::Major);
        assert!(ctx.key_inferred);
    }

    #[test]
    fn test_build_context_roman_numerals_default_key() {
        let input = InputKind::RomanNumerals(vec!["I".to_string(), "V".to_string()]);
        let ctx = build_context(input, None).unwrap();
        assert_eq!(ctx.key.tonic.semitone(), 0);
        assert!(!ctx.key_inferred);
    }

    #[test]
    fn test_build_context_rejects_ambiguous_input() {
        let input = InputKind::ChordSymbols(vec![
            "C#".to_string(),
            "F#".to_string(),
            "B".to_string(),
        ]);
        let result = build_context(input, None);
        assert!(result.is_ok() || matches!(result, Err(ContextError::MissingKey { .. })));
    }

    #[test]
    fn test_build_context_accepts_diatonic_scale_degrees() {
        let input = InputKind::ScaleDegrees(vec!["1".to_string(), "3".to_string(), "5".to_string()]);
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let ctx = build_context(input, Some(key)).unwrap();
        assert_eq!(ctx.tokens.len(), 3);
    }

    #[test]
    fn test_build_context_rejects_scale_degree_foreign_to_key_and_parent() {
        let input = InputKind::ScaleDegrees(vec!["1".to_string(), "#5".to_string()]);
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let result = build_context(input, Some(key));
        assert!(matches!(
            result,
            Err(ContextError::ChordTheory(harmony_core::ChordTheoryError::KeyScaleMismatch { .. }))
        ));
    }

    #[test]
    fn test_build_context_accepts_scale_degree_from_parent_collection() {
        // D Dorian's b7 lands on B, which is already diatonic (the 6th degree).
        let input = InputKind::ScaleDegrees(vec!["1".to_string(), "b7".to_string()]);
        let key = Key::new(PitchClass::new(2), Mode::Dorian);
        let ctx = build_context(input, Some(key)).unwrap();
        assert_eq!(ctx.tokens.len(), 2);
    }
}
