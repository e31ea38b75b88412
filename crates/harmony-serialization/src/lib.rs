//! Projects an `AnalysisEnvelope` into the language-agnostic JSON result
//! shape: Roman-numeral rendering, chromatic-element extraction, cadence
//! lists, glossary-enriched terms, and scale/melody summaries (§4.11).

use harmony_context::{AnalysisContext, Token};
use harmony_core::{Accidental, Chord, ChordQuality, Key, Mode, RomanNumeral};
use harmony_engine::{observed_sequence, AnalysisEnvelope, Interpretation, PatternCitation};
use harmony_patterns::{PatternCatalogue, Track};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One matched pattern as surfaced in a summary's `patterns`/`cadences` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    /// The matched pattern's id.
    pub pattern_id: String,
    /// The pattern's human-readable display name.
    pub name: String,
    /// The pattern's family.
    pub family: String,
    /// The match's score in `[0, 1]`.
    pub score: f64,
    /// Start index (inclusive) in the token sequence.
    pub start: usize,
    /// End index (exclusive) in the token sequence.
    pub end: usize,
    /// For `cadence`-family patterns, `"final"` or `"internal"`.
    pub cadence_role: Option<String>,
    /// Whether this match's span reaches the end of the input.
    pub is_section_closure: Option<bool>,
}

/// A chromatic event detected in the observed Roman-numeral sequence: a
/// secondary dominant tonicizing a non-tonic degree, or a chord borrowed
/// from the parallel mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaticElement {
    /// `"secondary_dominant"` or `"borrowed_chord"`.
    #[serde(rename = "type")]
    pub element_type: String,
    /// The chord symbol at the position where this element occurs.
    pub chord_symbol: String,
    /// The chord symbol this element resolves or relates to.
    pub resolution_to: String,
}

/// Scale-input-only summary: the detected mode, its parent major key, and
/// the scale degrees that distinguish it from that parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSummary {
    /// The detected mode's display name, e.g. `"Dorian"`.
    pub detected_mode: String,
    /// The parent major key this mode is drawn from, e.g. `"C major"`.
    pub parent_key: String,
    /// Scale degrees that differ from the parent major scale, e.g. `["b3", "n6"]`.
    pub characteristic_notes: Vec<String>,
    /// The resolved note names of the input, in order.
    pub notes: Vec<String>,
    /// The input's scale degrees (1-7), in order.
    pub degrees: Vec<u8>,
}

/// Melody-input-only summary: contour classification, interval sequence,
/// range, and qualitative tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodySummary {
    /// One of `ascending`, `descending`, `arch`, `wave`, `mixed`.
    pub contour: String,
    /// Span between the lowest and highest absolute semitone height.
    pub range_semitones: u32,
    /// Signed semitone interval between each consecutive pair of notes.
    pub intervals: Vec<i32>,
    /// Count of leading-tone-to-tonic resolutions.
    pub leading_tone_resolutions: usize,
    /// Qualitative tags such as `"stepwise motion"` or `"leap emphasis"`.
    pub melodic_characteristics: Vec<String>,
}

/// A glossary-enriched feature explanation, attached under `terms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Short display label.
    pub label: String,
    /// Longer explanatory text.
    pub tooltip: String,
}

/// The full projection of one track's `Interpretation`: everything a caller
/// needs to render a primary or alternative reading without touching the
/// engine's internal types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// One of `functional`, `modal`, `chromatic`.
    #[serde(rename = "type")]
    pub type_: String,
    /// The calibrated confidence score in `[0, 1]`.
    pub confidence: f64,
    /// Display string for the key center, e.g. `"C major"`.
    pub key_signature: String,
    /// The mode's display name, present only when the key is modal.
    pub mode: Option<String>,
    /// The observed Roman-numeral rendering, one per input token.
    pub roman_numerals: Vec<String>,
    /// Every pattern that contributed evidence to this track.
    pub patterns: Vec<PatternSummary>,
    /// Secondary dominants and borrowed chords detected in the sequence.
    pub chromatic_elements: Vec<ChromaticElement>,
    /// The subset of `patterns` belonging to the `cadence` family.
    pub cadences: Vec<PatternSummary>,
    /// Human-readable explanation assembled from the matched patterns.
    pub reasoning: String,
    /// Glossary-enriched explanations, keyed by feature/family name.
    pub terms: HashMap<String, Term>,
    /// Present when the input was a bare scale-degree sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_summary: Option<ScaleSummary>,
    /// Present when the input was a melody.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub melody_summary: Option<MelodySummary>,
}

/// The complete, JSON-ready result of an analysis: a primary summary,
/// bounded alternatives, and request bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// The chosen primary interpretation.
    pub primary: AnalysisSummary,
    /// Other interpretations within the confidence threshold of the primary.
    pub alternatives: Vec<AnalysisSummary>,
    /// Wall-clock milliseconds spent on this analysis.
    pub analysis_time_ms: u64,
    /// The original request input, echoed back verbatim for traceability.
    pub input_echo: serde_json::Value,
}

fn track_type(track: Track) -> &'static str {
    match track {
        Track::Functional => "functional",
        Track::Modal => "modal",
        Track::Chromatic => "chromatic",
    }
}

/// The diatonic triad built on a scale degree of `key`, mirroring the
/// matcher's own degree-to-chord resolution so chromatic-element rendering
/// stays consistent with the roman_numerals/patterns derived from the same
/// observed sequence.
fn diatonic_triad(key: Key, degree: u8) -> Option<Chord> {
    let root = key.pitch_of_degree(degree)?;
    let third_degree = ((degree - 1 + 2) % 7) + 1;
    let fifth_degree = ((degree - 1 + 4) % 7) + 1;
    let third = key.pitch_of_degree(third_degree)?;
    let fifth = key.pitch_of_degree(fifth_degree)?;

    let root_third = i32::from(root.shortest_interval_to(third)).rem_euclid(12);
    let root_fifth = i32::from(root.shortest_interval_to(fifth)).rem_euclid(12);

    let quality = match (root_third, root_fifth) {
        (4, 7) => ChordQuality::Major,
        (3, 7) => ChordQuality::Minor,
        (3, 6) => ChordQuality::Diminished,
        (4, 8) => ChordQuality::Augmented,
        _ => ChordQuality::Major,
    };
    Some(Chord::new(root, quality))
}

fn pattern_summaries(citations: &[PatternCitation], catalogue: &PatternCatalogue) -> Vec<PatternSummary> {
    citations
        .iter()
        .map(|c| PatternSummary {
            pattern_id: c.pattern_id.clone(),
            name: catalogue
                .get(&c.pattern_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| c.pattern_id.clone()),
            family: c.family.clone(),
            score: c.score,
            start: c.start,
            end: c.end,
            cadence_role: c.cadence_role.clone(),
            is_section_closure: c.is_section_closure,
        })
        .collect()
}

/// Scan the observed Roman-numeral sequence for secondary dominants and
/// parallel-mode borrowings, rendering each as a `ChromaticElement`.
fn chromatic_elements(ctx: &AnalysisContext) -> Vec<ChromaticElement> {
    observed_sequence(ctx)
        .into_iter()
        .filter_map(|maybe_roman| {
            let roman = maybe_roman?;
            if let Some(sec) = &roman.secondary {
                let chord_symbol = roman.to_chord(ctx.key).ok()?.symbol();
                let target_root = ctx.key.pitch_of_degree(sec.degree)?;
                let resolution_to = Chord::new(target_root, ChordQuality::Major).symbol();
                return Some(ChromaticElement {
                    element_type: "secondary_dominant".to_string(),
                    chord_symbol,
                    resolution_to,
                });
            }
            if roman.accidental != Accidental::Natural {
                let chord_symbol = roman.to_chord(ctx.key).ok()?.symbol();
                let resolution_to = diatonic_triad(ctx.key, 1).map(|c| c.symbol()).unwrap_or_default();
                return Some(ChromaticElement {
                    element_type: "borrowed_chord".to_string(),
                    chord_symbol,
                    resolution_to,
                });
            }
            None
        })
        .collect()
}

fn reasoning_for(interpretation: &Interpretation, ctx: &AnalysisContext) -> String {
    let pattern_names: Vec<&str> = interpretation
        .citations
        .iter()
        .map(|c| c.explanation.as_str())
        .collect();
    let key_statement = format!("Key center: {}", ctx.key);
    if pattern_names.is_empty() {
        format!("No recognized patterns; {key_statement}; confidence {:.2}.", interpretation.score)
    } else {
        format!(
            "Detected patterns: {}; {key_statement}; confidence {:.2}.",
            pattern_names.join(", "),
            interpretation.score
        )
    }
}

fn terms_for(citations: &[PatternCitation]) -> HashMap<String, Term> {
    citations
        .iter()
        .map(|c| {
            let entry = harmony_engine::glossary_entry(&c.family)
                .unwrap_or("no glossary entry available for this feature.");
            (
                c.family.clone(),
                Term {
                    label: titlecase(&c.family),
                    tooltip: entry.to_string(),
                },
            )
        })
        .collect()
}

fn titlecase(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const CHARACTERISTIC_NOTES: &[(Mode, &[&str])] = &[
    (Mode::Dorian, &["\u{266d}3", "\u{266e}6"]),
    (Mode::Phrygian, &["\u{266d}2"]),
    (Mode::Lydian, &["\u{266f}4"]),
    (Mode::Mixolydian, &["\u{266d}7"]),
    (Mode::Locrian, &["\u{266d}2", "\u{266d}5"]),
];

fn characteristic_notes(mode: Mode) -> Vec<String> {
    CHARACTERISTIC_NOTES
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, notes)| notes.iter().map(|s| (*s).to_string()).collect())
        .unwrap_or_default()
}

fn is_scale_input(tokens: &[Token]) -> bool {
    !tokens.is_empty() && tokens.iter().all(|t| t.scale_degree.is_some())
}

fn is_melody_input(tokens: &[Token]) -> bool {
    !tokens.is_empty() && tokens.iter().all(|t| t.pitch.is_some() && t.octave.is_some())
}

fn scale_summary(ctx: &AnalysisContext) -> Option<ScaleSummary> {
    if !is_scale_input(&ctx.tokens) {
        return None;
    }
    let degrees: Vec<u8> = ctx.tokens.iter().filter_map(|t| t.scale_degree).collect();
    let notes: Vec<String> = degrees
        .iter()
        .filter_map(|&d| ctx.key.pitch_of_degree(d))
        .map(|p| p.name_sharp().to_string())
        .collect();
    Some(ScaleSummary {
        detected_mode: ctx.key.mode.name().to_string(),
        parent_key: ctx.key.parent_key().to_string(),
        characteristic_notes: characteristic_notes(ctx.key.mode),
        notes,
        degrees,
    })
}

/// Classify the shape of a signed interval sequence into one of the five
/// contour categories: monotonic runs are `ascending`/`descending`, a
/// single direction change that returns is an `arch` (up then down) or
/// `wave` (down then up), and anything with more than one direction change
/// is `mixed`.
fn classify_contour(intervals: &[i32]) -> String {
    let directions: Vec<i32> = intervals.iter().map(|i| i.signum()).filter(|&s| s != 0).collect();
    let Some(&first) = directions.first() else {
        return "mixed".to_string();
    };
    if directions.iter().all(|&d| d > 0) {
        return "ascending".to_string();
    }
    if directions.iter().all(|&d| d < 0) {
        return "descending".to_string();
    }
    let changes = directions
        .windows(2)
        .filter(|w| matches!(w, [a, b] if a != b))
        .count();
    if changes == 1 {
        if first > 0 {
            "arch".to_string()
        } else {
            "wave".to_string()
        }
    } else {
        "mixed".to_string()
    }
}

fn melody_summary(ctx: &AnalysisContext) -> Option<MelodySummary> {
    if !is_melody_input(&ctx.tokens) {
        return None;
    }
    let heights: Vec<i32> = ctx.tokens.iter().filter_map(Token::absolute_semitone).collect();
    if heights.len() < 2 {
        return None;
    }
    let intervals: Vec<i32> = heights
        .windows(2)
        .filter_map(|w| match w {
            [a, b] => Some(b - a),
            _ => None,
        })
        .collect();
    let min = heights.iter().copied().min().unwrap_or(0);
    let max = heights.iter().copied().max().unwrap_or(0);
    #[allow(clippy::cast_sign_loss)]
    let range_semitones = (max - min) as u32;

    let leading_tone = ctx.key.tonic.transpose(-1);
    let leading_tone_resolutions = ctx
        .tokens
        .windows(2)
        .filter(|w| match w {
            [t0, t1] => match (t0.pitch, t1.pitch) {
                (Some(p0), Some(p1)) => p0 == leading_tone && p1 == ctx.key.tonic,
                _ => false,
            },
            _ => false,
        })
        .count();

    #[allow(clippy::cast_precision_loss)]
    let mean_abs_step = intervals.iter().map(|i| i.unsigned_abs()).sum::<u32>() as f64 / intervals.len() as f64;
    let mut characteristics = Vec::new();
    if mean_abs_step <= 2.0 {
        characteristics.push("stepwise motion".to_string());
    }
    if intervals.iter().any(|&i| i.abs() >= 5) {
        characteristics.push("leap emphasis".to_string());
    }
    let has_chromatic_note = ctx.tokens.iter().any(|t| t.pitch.is_some_and(|p| !ctx.key.contains(p)));
    if has_chromatic_note {
        characteristics.push("chromatic motion".to_string());
    }

    Some(MelodySummary {
        contour: classify_contour(&intervals),
        range_semitones,
        intervals,
        leading_tone_resolutions,
        melodic_characteristics: characteristics,
    })
}

fn to_summary(interpretation: &Interpretation, ctx: &AnalysisContext, catalogue: &PatternCatalogue) -> AnalysisSummary {
    let roman_numerals: Vec<String> = observed_sequence(ctx)
        .iter()
        .map(|r| r.as_ref().map(RomanNumeral::symbol).unwrap_or_else(|| "?".to_string()))
        .collect();
    let patterns = pattern_summaries(&interpretation.citations, catalogue);
    let cadences = patterns.iter().filter(|p| p.family == "cadence").cloned().collect();

    AnalysisSummary {
        type_: track_type(interpretation.track).to_string(),
        confidence: interpretation.score,
        key_signature: ctx.key.to_string(),
        mode: ctx.key.is_modal().then(|| ctx.key.mode.name().to_string()),
        roman_numerals,
        patterns,
        chromatic_elements: chromatic_elements(ctx),
        cadences,
        reasoning: reasoning_for(interpretation, ctx),
        terms: terms_for(&interpretation.citations),
        scale_summary: scale_summary(ctx),
        melody_summary: melody_summary(ctx),
    }
}

/// Project an engine's `AnalysisEnvelope` into the JSON-ready `ResultEnvelope`
/// shape, attaching request bookkeeping (`analysis_time_ms`, `input_echo`)
/// that the engine itself has no reason to know about.
#[must_use]
pub fn project(
    envelope: &AnalysisEnvelope,
    catalogue: &PatternCatalogue,
    analysis_time_ms: u64,
    input_echo: serde_json::Value,
) -> ResultEnvelope {
    let primary = to_summary(&envelope.primary, &envelope.context, catalogue);
    let alternatives = envelope
        .alternatives
        .iter()
        .map(|alt| to_summary(alt, &envelope.context, catalogue))
        .collect();

    ResultEnvelope {
        primary,
        alternatives,
        analysis_time_ms,
        input_echo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_context::{build_context, InputKind};
    use harmony_core::PitchClass;
    use harmony_engine::{AnalysisEngine, ConflictResolution};
    use harmony_patterns::Pattern;
    use std::collections::HashMap as StdHashMap;
    use std::path::PathBuf;

    fn cadence_pattern() -> Pattern {
        Pattern {
            id: "auth_cadence".to_string(),
            name: "Authentic cadence".to_string(),
            family: "cadence".to_string(),
            track: Track::Functional,
            sequence: vec!["V".to_string(), "I".to_string()],
            base_score: 0.9,
            evaluator: "identity".to_string(),
            profile_weights: StdHashMap::new(),
            description: "Dominant resolving to tonic".to_string(),
        }
    }

    #[test]
    fn test_project_pac_includes_roman_numerals_and_reasoning() {
        let mut catalogue = PatternCatalogue::empty();
        catalogue.insert(cadence_pattern(), PathBuf::from("cadence/auth_cadence.json")).unwrap();
        let engine = AnalysisEngine::new(catalogue.clone());

        let input = InputKind::ChordSymbols(vec!["Dm".to_string(), "G7".to_string(), "C".to_string()]);
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let envelope = engine.analyze(input, Some(key), "classical", ConflictResolution::SoftNms).unwrap();

        let result = project(&envelope, &catalogue, 12, serde_json::json!({"chords": ["Dm", "G7", "C"]}));
        assert_eq!(result.primary.roman_numerals, vec!["ii", "V7", "I"]);
        assert!(result.primary.reasoning.contains("Key center"));
        assert_eq!(result.analysis_time_ms, 12);
    }

    #[test]
    fn test_scale_summary_dorian() {
        let input = InputKind::ScaleDegrees(
            (1..=7).map(|d| d.to_string()).collect(),
        );
        let key = Key::new(PitchClass::new(2), Mode::Dorian);
        let ctx = build_context(input, Some(key)).unwrap();
        let summary = scale_summary(&ctx).unwrap();
        assert_eq!(summary.detected_mode, "Dorian");
        assert_eq!(summary.parent_key, "C major");
        assert_eq!(summary.characteristic_notes, vec!["\u{266d}3", "\u{266e}6"]);
    }

    #[test]
    fn test_melody_summary_ascending_octave() {
        let input = InputKind::Melody(
            vec!["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let ctx = build_context(input, Some(key)).unwrap();
        let summary = melody_summary(&ctx).unwrap();
        assert_eq!(summary.contour, "ascending");
        assert_eq!(summary.range_semitones, 12);
        assert_eq!(summary.intervals, vec![2, 2, 1, 2, 2, 2, 1]);
        assert!(summary.melodic_characteristics.contains(&"stepwise motion".to_string()));
    }

    #[test]
    fn test_chromatic_elements_detects_secondary_dominant() {
        let input = InputKind::RomanNumerals(vec!["V/V".to_string(), "V".to_string(), "I".to_string()]);
        let key = Key::new(PitchClass::new(0), Mode::Major);
        let ctx = build_context(input, Some(key)).unwrap();
        let elements = chromatic_elements(&ctx);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].element_type, "secondary_dominant");
        assert_eq!(elements[0].chord_symbol, "D");
    }

    #[test]
    fn test_contour_classification() {
        assert_eq!(classify_contour(&[2, 2, 1]), "ascending");
        assert_eq!(classify_contour(&[-2, -1]), "descending");
        assert_eq!(classify_contour(&[2, 2, -1, -2]), "arch");
        assert_eq!(classify_contour(&[-2, -2, 1, 2]), "wave");
        assert_eq!(classify_contour(&[2, -2, 1, -1]), "mixed");
    }
}
