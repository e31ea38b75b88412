//! The static feature glossary: human-readable explanations for tracks and
//! pattern families, surfaced in the result envelope (§4.11).

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Glossary entries keyed by track name and pattern family, used to explain
/// an envelope's evidence to a reader unfamiliar with the terminology.
pub static FEATURE_GLOSSARY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "functional",
        "Common-practice tonal harmony: chords are read as scale-degree functions (tonic, \
         predominant, dominant) resolving within a single key.",
    );
    m.insert(
        "modal",
        "Evidence drawn from a church mode's characteristic scale degrees and borrowed chords, \
         rather than major/minor functional motion.",
    );
    m.insert(
        "chromatic",
        "Color harmony outside the diatonic set: chromatic mediants, tritone substitutions, and \
         other non-functional chromaticism.",
    );
    m.insert(
        "cadence",
        "A harmonic formula that closes a phrase, most commonly dominant resolving to tonic.",
    );
    m.insert(
        "secondary_dominant",
        "A dominant-function chord borrowed from the key of a scale degree other than the tonic, \
         used to tonicize that degree.",
    );
    m.insert(
        "tritone_substitution",
        "A dominant chord replaced by the dominant built a tritone away, sharing the same \
         tritone between guide tones.",
    );
    m.insert(
        "modal_borrowing",
        "A chord borrowed from the parallel mode of the home key, most commonly the flattened \
         sixth or seventh scale degree.",
    );
    m
});

/// Look up a glossary entry by track or family name.
#[must_use]
pub fn glossary_entry(key: &str) -> Option<&'static str> {
    FEATURE_GLOSSARY.get(key).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_entries_present() {
        assert!(glossary_entry("functional").is_some());
        assert!(glossary_entry("secondary_dominant").is_some());
    }

    #[test]
    fn test_unknown_entry_returns_none() {
        assert!(glossary_entry("nonexistent_family").is_none());
    }
}
