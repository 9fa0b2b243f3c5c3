//! # Chord Voicing
//!
//! Realizes a [`ChordSpec`] as concrete MIDI note numbers.
//!
//! ## Closed Position
//! The root is placed at the lowest pitch `>= floor_octave * 12` with the
//! root's pitch class. Every other chord tone takes the lowest pitch of its
//! class that is not below the root, so a root-position chord spans less than
//! an octave.
//!
//! ## Inversions
//! Inversion `k` raises the bottom `k` tones of the closed-position chord by an
//! octave, then re-sorts:
//!
//! ```text
//! C major, floor 4
//!   inversion 0: C3 E3 G3  = 48 52 55
//!   inversion 1: E3 G3 C4  = 52 55 60
//!   inversion 2: G3 C4 E4  = 55 60 64
//! ```
//!
//! ## Range
//! Pitches above 127 are an error under [`PitchPolicy::Strict`]. Under
//! [`PitchPolicy::Clamp`] they are moved down by whole octaves until they fit.

use log::warn;
use serde::Serialize;

use crate::error::ChordError;
use crate::roman::ChordSpec;

/// Floor octave used when the caller does not choose one.
pub const DEFAULT_FLOOR_OCTAVE: u8 = 4;

const MAX_PITCH: i32 = 127;

/// What to do with realized pitches above 127
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchPolicy {
    /// Fail with [`ChordError::PitchOutOfRange`]
    #[default]
    Strict,
    /// Transpose offending tones down by octaves into range
    Clamp,
}

/// Placement settings shared by every chord of a progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voicing {
    pub floor_octave: u8,
    pub pitch_policy: PitchPolicy,
}

impl Default for Voicing {
    fn default() -> Self {
        Self {
            floor_octave: DEFAULT_FLOOR_OCTAVE,
            pitch_policy: PitchPolicy::Strict,
        }
    }
}

impl Voicing {
    pub fn new(floor_octave: u8) -> Self {
        Self {
            floor_octave,
            pitch_policy: PitchPolicy::Strict,
        }
    }

    pub fn with_policy(self, pitch_policy: PitchPolicy) -> Self {
        Self {
            pitch_policy,
            ..self
        }
    }

    /// Realize `spec` at the given inversion.
    ///
    /// Returns a new [`Chord`]; `spec` is never modified.
    pub fn realize(&self, spec: &ChordSpec, inversion: usize) -> Result<Chord, ChordError> {
        let tones = spec.tone_count();
        if inversion >= tones {
            return Err(ChordError::InvalidInversion { inversion, tones });
        }

        let floor = i32::from(self.floor_octave) * 12;
        let root_pc = i32::from(spec.root % 12);
        let root = floor + (root_pc - floor).rem_euclid(12);

        let mut pitches: Vec<i32> = spec
            .intervals
            .iter()
            .map(|interval| {
                let mut pitch = (root_pc + i32::from(*interval)) % 12;
                while pitch < root {
                    pitch += 12;
                }
                pitch
            })
            .collect();
        pitches.sort_unstable();

        for pitch in pitches.iter_mut().take(inversion) {
            *pitch += 12;
        }
        pitches.sort_unstable();

        Ok(Chord {
            spec: spec.with_inversion(inversion),
            pitches: self.fit_range(pitches)?,
            voicing: *self,
        })
    }

    fn fit_range(&self, mut pitches: Vec<i32>) -> Result<Vec<u8>, ChordError> {
        if let Some(&highest) = pitches.iter().max() {
            if highest > MAX_PITCH {
                match self.pitch_policy {
                    PitchPolicy::Strict => return Err(ChordError::PitchOutOfRange(highest)),
                    PitchPolicy::Clamp => {
                        warn!("Clamping pitch {} into MIDI range", highest);
                        for pitch in pitches.iter_mut() {
                            while *pitch > MAX_PITCH {
                                *pitch -= 12;
                            }
                        }
                        pitches.sort_unstable();
                    }
                }
            }
        }
        // Pitches are built upward from a non-negative floor, so only the
        // upper bound can be violated.
        Ok(pitches.into_iter().map(|p| p as u8).collect())
    }
}

/// A realized chord: ascending MIDI pitches plus the spec they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub spec: ChordSpec,
    pub pitches: Vec<u8>,
    pub voicing: Voicing,
}

impl Chord {
    pub fn figure(&self) -> &str {
        &self.spec.figure
    }

    pub fn symbol(&self) -> String {
        self.spec.symbol()
    }

    pub fn inversion(&self) -> usize {
        self.spec.inversion
    }

    pub fn tone_count(&self) -> usize {
        self.pitches.len()
    }

    /// Lowest sounding pitch
    pub fn bass(&self) -> Option<u8> {
        self.pitches.first().copied()
    }

    /// Re-realize this chord at another inversion with the same voicing.
    pub fn at_inversion(&self, inversion: usize) -> Result<Chord, ChordError> {
        self.voicing.realize(&self.spec, inversion)
    }
}

/// Realize `spec` in closed position above `floor_octave` with strict range checks.
///
/// # Example
/// ```
/// use chordgen::roman::resolve;
/// use chordgen::voicing::voice;
/// use chordgen::KeyContext;
///
/// let key = KeyContext::parse("C", "major").unwrap();
/// let tonic = resolve("I", &key).unwrap();
///
/// assert_eq!(voice(&tonic, 4, 0).unwrap().pitches, vec![48, 52, 55]);
/// assert_eq!(voice(&tonic, 4, 1).unwrap().pitches, vec![52, 55, 60]);
/// ```
pub fn voice(spec: &ChordSpec, floor_octave: u8, inversion: usize) -> Result<Chord, ChordError> {
    Voicing::new(floor_octave).realize(spec, inversion)
}
