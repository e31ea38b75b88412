//! Music-theory primitives shared by the rest of the harmonic analysis
//! engine: pitch classes, chord symbols, key centers, and Roman numerals.

pub mod chord;
pub mod constants;
pub mod error;
pub mod key;
pub mod pitch;
pub mod roman;

pub use chord::{Alteration, Chord, ChordQuality};
pub use error::{ChordTheoryError, ChordTheoryResult};
pub use key::{Key, Mode};
pub use pitch::PitchClass;
pub use roman::{Accidental, Inversion, RomanCase, RomanNumeral, RomanQuality, SecondaryTarget};
