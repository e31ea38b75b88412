//! Key centers: tonic pitch class plus mode, with parent-key/local-tonic
//! support for modal analysis (§3 data model, §4.2).

use crate::pitch::PitchClass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of modes/scales a key may be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Major (equivalent to Ionian).
    Major,
    /// Natural minor (equivalent to Aeolian).
    Minor,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

/// Semitone offsets from the tonic for each mode's seven diatonic degrees.
const IONIAN_STEPS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

impl Mode {
    /// How many semitones the mode's tonic sits above the parent major
    /// scale's tonic (Ionian degree index of the mode's 1st degree).
    #[must_use]
    pub fn ionian_degree_index(self) -> usize {
        match self {
            Mode::Major | Mode::Ionian => 0,
            Mode::Dorian => 1,
            Mode::Phrygian => 2,
            Mode::Lydian => 3,
            Mode::Mixolydian => 4,
            Mode::Minor | Mode::Aeolian => 5,
            Mode::Locrian => 6,
        }
    }

    /// Semitone offsets of the seven scale degrees, relative to this mode's
    /// own tonic.
    #[must_use]
    pub fn scale_steps(self) -> [u8; 7] {
        let shift = self.ionian_degree_index();
        let mut steps = [0u8; 7];
        for (i, step) in steps.iter_mut().enumerate() {
            let ionian_index = (shift + i) % 7;
            let raw = i32::from(IONIAN_STEPS[ionian_index]) - i32::from(IONIAN_STEPS[shift]);
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            {
                *step = raw.rem_euclid(12) as u8;
            }
        }
        steps
    }

    /// Whether this mode is one of the two "common-practice" modes (major or
    /// natural minor) that the functional track primarily targets.
    #[must_use]
    pub fn is_common_practice(self) -> bool {
        matches!(self, Mode::Major | Mode::Minor | Mode::Ionian | Mode::Aeolian)
    }

    /// Canonical display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Mode::Major | Mode::Ionian => "Ionian",
            Mode::Minor | Mode::Aeolian => "Aeolian",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Locrian => "Locrian",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A key center: a local tonic plus mode/scale tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// The local tonic pitch class.
    pub tonic: PitchClass,
    /// The mode/scale this key is expressed in.
    pub mode: Mode,
}

impl Key {
    /// Construct a new key.
    #[must_use]
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    /// The local tonic (same as `self.tonic`, provided for symmetry with
    /// `parent_key`).
    #[must_use]
    pub fn local_tonic(self) -> PitchClass {
        self.tonic
    }

    /// The parent diatonic major key this mode is drawn from. For D Dorian,
    /// returns C major.
    #[must_use]
    pub fn parent_key(self) -> Key {
        let shift = self.mode.ionian_degree_index();
        let offset = i32::from(IONIAN_STEPS[shift]);
        let parent_tonic = self.tonic.transpose(-offset);
        Key {
            tonic: parent_tonic,
            mode: Mode::Major,
        }
    }

    /// Whether this key is modal in the sense of carrying a distinct
    /// parent/local-tonic pair that is worth reporting separately.
    #[must_use]
    pub fn is_modal(self) -> bool {
        !self.mode.is_common_practice()
    }

    /// Pitch class of the given scale degree (1-7) in this key.
    #[must_use]
    pub fn pitch_of_degree(self, degree: u8) -> Option<PitchClass> {
        if degree == 0 || degree > 7 {
            return None;
        }
        let steps = self.mode.scale_steps();
        Some(self.tonic.transpose(i32::from(steps[(degree - 1) as usize])))
    }

    /// Whether `pitch` is diatonic to this key.
    #[must_use]
    pub fn contains(self, pitch: PitchClass) -> bool {
        (1..=7).any(|d| self.pitch_of_degree(d) == Some(pitch))
    }

    /// Scale degree (1-7) of `pitch` in this key, if it is diatonic.
    #[must_use]
    pub fn degree_of(self, pitch: PitchClass) -> Option<u8> {
        (1..=7).find(|&d| self.pitch_of_degree(d) == Some(pitch))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Major | Mode::Ionian => write!(f, "{} major", self.tonic.name_sharp()),
            Mode::Minor | Mode::Aeolian => write!(f, "{} minor", self.tonic.name_sharp()),
            other => write!(f, "{} {}", self.tonic.name_sharp(), other.name()),
        }
    }
}
