//! Transposition-invariant Roman-numeral pattern matching over a windowed
//! analysis context (§4.6).

use harmony_context::AnalysisContext;
use harmony_core::{ChordQuality, Key, RomanNumeral};
use harmony_patterns::{MatchFeatures, Pattern, PatternCatalogue, PatternError, PluginRegistry, Track};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One located, scored occurrence of a pattern within the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// The matched pattern's id.
    pub pattern_id: String,
    /// The pattern's family, carried through for glossary lookups.
    pub family: String,
    /// The track this match's evidence belongs to.
    pub track: Track,
    /// Start index (inclusive) in the token sequence.
    pub start: usize,
    /// End index (exclusive) in the token sequence.
    pub end: usize,
    /// Calibration-ready score in `[0, 1]` after evaluator shaping.
    pub score: f64,
}

impl PatternMatch {
    /// Window length this match spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this match's window is empty (never true for a real match).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this match's window overlaps `other`'s.
    #[must_use]
    pub fn overlaps(&self, other: &PatternMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The diatonic triad quality built on a scale degree of `key`, derived from
/// the actual semitone intervals between the degree, its third, and its
/// fifth (so it is correct for any mode, not just major/minor).
fn diatonic_quality(key: Key, degree: u8) -> Option<ChordQuality> {
    let root = key.pitch_of_degree(degree)?;
    let third_degree = ((degree - 1 + 2) % 7) + 1;
    let fifth_degree = ((degree - 1 + 4) % 7) + 1;
    let third = key.pitch_of_degree(third_degree)?;
    let fifth = key.pitch_of_degree(fifth_degree)?;

    let root_third = i32::from(root.shortest_interval_to(third)).rem_euclid(12);
    let root_fifth = i32::from(root.shortest_interval_to(fifth)).rem_euclid(12);

    Some(match (root_third, root_fifth) {
        (4, 7) => ChordQuality::Major,
        (3, 7) => ChordQuality::Minor,
        (3, 6) => ChordQuality::Diminished,
        (4, 8) => ChordQuality::Augmented,
        _ => ChordQuality::Major,
    })
}

/// Build the observed Roman-numeral sequence for an analysis context: chord
/// and Roman-numeral input resolve directly, scale-degree input resolves to
/// the key's diatonic triad on that degree, and melody input resolves to the
/// diatonic triad built on the note's scale degree (or `None` when the note
/// is chromatic to the key).
pub fn observed_sequence(ctx: &AnalysisContext) -> Vec<Option<RomanNumeral>> {
    ctx.tokens
        .iter()
        .map(|token| {
            if let Some(roman) = &token.roman {
                return Some(roman.clone());
            }
            if let Some(chord) = &token.chord {
                return RomanNumeral::from_chord(chord, ctx.key).ok();
            }
            if let Some(degree) = token.scale_degree {
                let quality = diatonic_quality(ctx.key, degree)?;
                let root = ctx.key.pitch_of_degree(degree)?;
                let chord = harmony_core::Chord::new(root, quality);
                return RomanNumeral::from_chord(&chord, ctx.key).ok();
            }
            if let Some(pitch) = token.pitch {
                let degree = ctx.key.degree_of(pitch)?;
                let quality = diatonic_quality(ctx.key, degree)?;
                let root = ctx.key.pitch_of_degree(degree)?;
                let chord = harmony_core::Chord::new(root, quality);
                return RomanNumeral::from_chord(&chord, ctx.key).ok();
            }
            None
        })
        .collect()
}

/// Whether `observed` satisfies `template_token` ("*" is a wildcard that
/// matches anything non-`None`; otherwise the parsed template numeral must
/// match the observed numeral's degree, accidental, quality, and inversion
/// class, per the transposition-invariant matching rule).
fn token_matches(template_token: &str, observed: Option<&RomanNumeral>) -> bool {
    let Some(observed) = observed else { return false };
    if template_token == "*" {
        return true;
    }
    match RomanNumeral::parse(template_token) {
        Ok(template) => {
            template.degree == observed.degree
                && template.accidental == observed.accidental
                && template.quality == observed.quality
                && template.inversion == observed.inversion
        }
        Err(_) => false,
    }
}

/// Slide `pattern`'s template across `observed`, yielding one `PatternMatch`
/// per window whose non-wildcard slots all matched, scored via the
/// pattern's registered evaluator.
fn match_one_pattern(
    pattern: &Pattern,
    observed: &[Option<RomanNumeral>],
    key: Key,
    profile: &str,
    registry: &PluginRegistry,
) -> Result<Vec<PatternMatch>, PatternError> {
    let window = pattern.window_length();
    if window == 0 || window > observed.len() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for start in 0..=(observed.len() - window) {
        let slice = &observed[start..start + window];
        let mut hits = 0usize;
        let mut total_non_wildcard = 0usize;
        let mut fully_matched = true;

        for (template_token, observed_slot) in pattern.sequence.iter().zip(slice.iter()) {
            let is_wildcard = template_token == "*";
            if !is_wildcard {
                total_non_wildcard += 1;
            }
            if token_matches(template_token, observed_slot.as_ref()) {
                if !is_wildcard {
                    hits += 1;
                }
            } else if !is_wildcard {
                fully_matched = false;
            } else if observed_slot.is_none() {
                fully_matched = false;
            }
        }

        if !fully_matched {
            continue;
        }

        #[allow(clippy::cast_precision_loss)]
        let raw_strength = if total_non_wildcard == 0 {
            1.0
        } else {
            hits as f64 / total_non_wildcard as f64
        };

        let features = MatchFeatures {
            raw_strength,
            mode: Some(key.mode),
        };
        let evaluated = registry.evaluate(&pattern.evaluator, &pattern.id, &features)?;
        let score = (evaluated * pattern.base_score * pattern.profile_weight(profile)).clamp(0.0, 1.0);

        matches.push(PatternMatch {
            pattern_id: pattern.id.clone(),
            family: pattern.family.clone(),
            track: pattern.track,
            start,
            end: start + window,
            score,
        });
    }

    Ok(matches)
}

/// Match every pattern in `catalogue` against `ctx`, in parallel, returning
/// the full set of raw (pre-aggregation) matches.
pub fn match_all(
    ctx: &AnalysisContext,
    catalogue: &PatternCatalogue,
    registry: &PluginRegistry,
    profile: &str,
    max_window_length: usize,
) -> Result<Vec<PatternMatch>, PatternError> {
    let observed = observed_sequence(ctx);
    let patterns: Vec<&Pattern> = catalogue.within_window(max_window_length).collect();

    let results: Result<Vec<Vec<PatternMatch>>, PatternError> = patterns
        .par_iter()
        .map(|pattern| match_one_pattern(pattern, &observed, ctx.key, profile, registry))
        .collect();

    Ok(results?.into_iter().flatten().collect())
}

/// Greedily keep the highest-scoring, mutually non-overlapping matches
/// within a single track, discarding lower-scoring matches that overlap an
/// already-kept one. This runs per-track, before cross-family aggregation.
#[must_use]
pub fn greedy_non_overlap(mut matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let mut kept: Vec<PatternMatch> = Vec::new();
    for candidate in matches {
        if !kept.iter().any(|k| k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }
    kept.sort_by_key(|m| m.start);
    kept
}
