//! End-to-end scenario tests exercising the full tokenize → match → aggregate
//! → arbitrate → project pipeline for the scale- and melody-input summaries
//! that chord/Roman-numeral input never populates.

use harmony_context::InputKind;
use harmony_core::{Key, Mode, PitchClass};
use harmony_engine::{AnalysisEngine, ConflictResolution};
use harmony_patterns::{PatternCatalogue, Track};
use harmony_serialization::project;
use std::path::Path;

fn load_fixture_catalogue() -> PatternCatalogue {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/patterns");
    PatternCatalogue::load(&root, 1_000).expect("fixture catalogue should load cleanly")
}

/// E4: a bare D-Dorian scale run reports its parent major key and the scale
/// degrees that distinguish Dorian from it.
#[test]
fn scenario_e4_scale_analysis_reports_dorian_characteristics() {
    let engine = AnalysisEngine::new(load_fixture_catalogue());
    let input = InputKind::ScaleDegrees((1..=7).map(|d| d.to_string()).collect());
    let key = Key::new(PitchClass::parse("D").unwrap(), Mode::Dorian);

    let envelope = engine
        .analyze(input, Some(key), "classical", ConflictResolution::SoftNms)
        .expect("a full diatonic scale run should analyze cleanly");
    assert_eq!(envelope.primary.track, Track::Modal);

    let result = project(&envelope, &load_fixture_catalogue(), 0, serde_json::json!({}));
    let scale_summary = result.primary.scale_summary.expect("scale input should populate scale_summary");
    assert_eq!(scale_summary.detected_mode, "Dorian");
    assert_eq!(scale_summary.parent_key, "C major");
    assert_eq!(scale_summary.characteristic_notes, vec!["\u{266d}3", "\u{266e}6"]);
    assert_eq!(scale_summary.degrees, vec![1, 2, 3, 4, 5, 6, 7]);
}

/// E5: an ascending C-major octave scale reports a purely ascending
/// contour, a one-octave range, and the stepwise-motion tag.
#[test]
fn scenario_e5_melody_analysis_reports_ascending_contour() {
    let engine = AnalysisEngine::new(load_fixture_catalogue());
    let input = InputKind::Melody(
        ["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    let key = Key::new(PitchClass::parse("C").unwrap(), Mode::Major);

    let envelope = engine
        .analyze(input, Some(key), "classical", ConflictResolution::SoftNms)
        .expect("an ascending octave scale should analyze cleanly");

    let result = project(&envelope, &load_fixture_catalogue(), 0, serde_json::json!({}));
    let melody_summary = result.primary.melody_summary.expect("melody input should populate melody_summary");
    assert_eq!(melody_summary.contour, "ascending");
    assert_eq!(melody_summary.range_semitones, 12);
    assert_eq!(melody_summary.intervals, vec![2, 2, 1, 2, 2, 2, 1]);
    assert!(melody_summary.melodic_characteristics.contains(&"stepwise motion".to_string()));
}
