//! End-to-end scenario tests exercising the full tokenize → match →
//! aggregate → calibrate → arbitrate pipeline, plus the bidirectional
//! Roman-numeral conversion that does not need the pattern catalogue at all.

use harmony_context::InputKind;
use harmony_core::{Chord, Key, Mode, PitchClass, RomanNumeral};
use harmony_engine::{AnalysisEngine, ConflictResolution};
use harmony_patterns::{PatternCatalogue, Track};
use std::path::Path;

fn load_fixture_catalogue() -> PatternCatalogue {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/patterns");
    PatternCatalogue::load(&root, 1_000).expect("fixture catalogue should load cleanly")
}

/// E1: a plain ii-V-I progression with an explicit key hint resolves to a
/// confident functional (authentic-cadence) reading.
#[test]
fn scenario_e1_perfect_authentic_cadence() {
    let engine = AnalysisEngine::new(load_fixture_catalogue());
    let input = InputKind::ChordSymbols(vec!["Dm".to_string(), "G7".to_string(), "C".to_string()]);
    let key = Key::new(PitchClass::parse("C").unwrap(), Mode::Major);

    let envelope = engine
        .analyze(input, Some(key), "classical", ConflictResolution::SoftNms)
        .expect("ii-V-I should analyze cleanly");

    assert_eq!(envelope.primary.track, Track::Functional);
    assert!(
        envelope.primary.score >= 0.85,
        "expected confidence >= 0.85, got {}",
        envelope.primary.score
    );
    assert!(envelope
        .primary
        .citations
        .iter()
        .any(|c| c.pattern_id == "authentic_cadence"));
    assert!(envelope
        .primary
        .citations
        .iter()
        .any(|c| c.pattern_id == "ii_v_i"));
}

/// E2: a Dorian i-IV vamp, analyzed with an explicit Dorian key hint, is
/// read as modal evidence rather than functional.
#[test]
fn scenario_e2_dorian_vamp() {
    let engine = AnalysisEngine::new(load_fixture_catalogue());
    let input = InputKind::ChordSymbols(vec![
        "Dm".to_string(),
        "G".to_string(),
        "Dm".to_string(),
        "G".to_string(),
    ]);
    let key = Key::new(PitchClass::parse("D").unwrap(), Mode::Dorian);

    let envelope = engine
        .analyze(input, Some(key), "classical", ConflictResolution::SoftNms)
        .expect("dorian vamp should analyze cleanly");

    assert_eq!(envelope.primary.track, Track::Modal);
    assert_eq!(envelope.key.mode, Mode::Dorian);
    assert!(
        envelope.primary.score >= 0.7,
        "expected confidence >= 0.7, got {}",
        envelope.primary.score
    );
}

/// E3: a ii-bII7-I progression (tritone-substituted dominant) reads as
/// confident chromatic/substitution evidence under a jazz profile, but the
/// substitution pattern is switched off under a classical profile, leaving
/// only a weaker predominant-motion reading.
#[test]
fn scenario_e3_tritone_substitution_is_profile_gated() {
    let engine = AnalysisEngine::new(load_fixture_catalogue());
    let key = Key::new(PitchClass::parse("C").unwrap(), Mode::Major);
    let chords = || InputKind::ChordSymbols(vec!["Dm7".to_string(), "Db7".to_string(), "Cmaj7".to_string()]);

    let jazz_envelope = engine
        .analyze(chords(), Some(key), "jazz", ConflictResolution::SoftNms)
        .expect("tritone substitution should analyze cleanly under jazz");
    assert_eq!(jazz_envelope.primary.track, Track::Chromatic);
    assert!(
        jazz_envelope.primary.score >= 0.8,
        "expected jazz confidence >= 0.8, got {}",
        jazz_envelope.primary.score
    );

    let classical_envelope = engine
        .analyze(chords(), Some(key), "classical", ConflictResolution::SoftNms)
        .expect("the same input should still analyze under classical, just differently");
    assert_eq!(classical_envelope.primary.track, Track::Functional);
    assert!(
        classical_envelope.primary.score < jazz_envelope.primary.score,
        "classical reading should be less confident than the jazz substitution reading"
    );
}

/// E6: a secondary-dominant/inversion-heavy progression round-trips through
/// Roman-numeral conversion and back to the original chords.
#[test]
fn scenario_e6_inversion_and_secondary_dominant_roundtrip() {
    let key = Key::new(PitchClass::parse("F").unwrap(), Mode::Major);
    let expected_chords = [
        Chord::parse("D").unwrap(),
        Chord::parse("Gm/Bb").unwrap(),
        Chord::parse("D/A").unwrap(),
        Chord::parse("Gm").unwrap(),
        Chord::parse("F/C").unwrap(),
        Chord::parse("C").unwrap(),
        Chord::parse("F").unwrap(),
    ];
    let romans = ["V/ii", "ii6", "V/ii6/4", "ii", "I6/4", "V", "I"];

    for (roman_symbol, expected) in romans.iter().zip(expected_chords.iter()) {
        let parsed = RomanNumeral::parse(roman_symbol).unwrap_or_else(|e| panic!("{roman_symbol} failed to parse: {e}"));
        let resolved = parsed
            .to_chord(key)
            .unwrap_or_else(|e| panic!("{roman_symbol} failed to resolve: {e}"));
        assert_eq!(
            resolved.root, expected.root,
            "{roman_symbol}: expected root {:?}, got {:?}",
            expected.root, resolved.root
        );
        assert_eq!(
            resolved.bass_note(),
            expected.bass_note(),
            "{roman_symbol}: expected bass {:?}, got {:?}",
            expected.bass_note(),
            resolved.bass_note()
        );

        let back = RomanNumeral::from_chord(expected, key)
            .unwrap_or_else(|e| panic!("{expected} failed to convert back to a roman numeral: {e}"));
        assert_eq!(
            back.symbol(),
            *roman_symbol,
            "{expected}: expected chord->roman conversion to produce {roman_symbol}, got {}",
            back.symbol()
        );
    }
}
