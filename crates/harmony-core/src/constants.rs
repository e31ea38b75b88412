//! Static lookup tables shared by the chord and Roman-numeral parsers.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Maps a lead-sheet quality token (`"maj7"`, `"m7b5"`, `"dim"`, ...) to its
/// canonical symbol as rendered by `Chord::symbol()`.
pub static QUALITY_SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("maj", "");
    m.insert("major", "");
    m.insert("m", "m");
    m.insert("min", "m");
    m.insert("minor", "m");
    m.insert("dim", "dim");
    m.insert("o", "dim");
    m.insert("aug", "aug");
    m.insert("+", "aug");
    m.insert("sus2", "sus2");
    m.insert("sus4", "sus4");
    m.insert("sus", "sus4");
    m.insert("maj7", "maj7");
    m.insert("maj9", "maj9");
    m.insert("m7", "m7");
    m.insert("min7", "m7");
    m.insert("7", "7");
    m.insert("dom7", "7");
    m.insert("m7b5", "m7b5");
    m.insert("min7b5", "m7b5");
    m.insert("dim7", "dim7");
    m.insert("o7", "dim7");
    m.insert("aug7", "aug7");
    m.insert("+7", "aug7");
    m
});

/// Maps an alteration token (without its leading accidental-sign
/// disambiguation) to the semitone offset it applies on top of the base
/// scale degree it modifies.
pub static ALTERATION_OFFSETS: Lazy<HashMap<&'static str, i8>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("#5", 1i8);
    m.insert("b5", -1);
    m.insert("#9", 1);
    m.insert("b9", -1);
    m.insert("#11", 1);
    m.insert("b13", -1);
    m
});

/// Figured-bass symbol per inversion index (0=root position), used by
/// `RomanNumeral` rendering for triads.
pub const FIGURED_BASS_TRIAD: [&str; 3] = ["", "6", "6/4"];

/// Figured-bass symbol per inversion index for seventh chords.
pub const FIGURED_BASS_SEVENTH: [&str; 4] = ["7", "6/5", "4/3", "4/2"];

/// Scale degrees (1-7) that the common-practice bidirectional Roman-numeral
/// subset accepts as chromatically borrowed/altered roots, paired with the
/// semitone offset from the parent-key diatonic degree. This is the closed
/// set resolved for round-trip support: borrowed `bVI`/`bVII`/`bIII`,
/// Neapolitan `bII`, and the raised leading tone of harmonic/melodic minor
/// (`V`/`V7`/`vii°` in a minor key). Augmented-sixth chords are explicitly
/// excluded.
pub static MODAL_BORROWINGS: Lazy<HashMap<(u8, i8), &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert((6, -1), "bVI");
    m.insert((7, -1), "bVII");
    m.insert((3, -1), "bIII");
    m.insert((2, -1), "bII");
    m
});
