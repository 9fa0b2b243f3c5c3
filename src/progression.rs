//! # Progression Building
//!
//! Expands a style template to the requested length and realizes every figure.
//!
//! ## Pipeline
//! 1. Look up the style's template for the mode in the [`StyleMap`]
//! 2. Repeat the template cyclically to exactly `total` figures
//! 3. Resolve each figure in the key and voice it in root position
//! 4. Optionally pick smoother inversions with [`voice_leading::optimize`]
//!
//! ## Example
//! ```rust
//! use chordgen::{ProgressionBuilder, StyleMap};
//!
//! let styles = StyleMap::fallback();
//! let progression = ProgressionBuilder::new(&styles)
//!     .smart_voicing(false)
//!     .build("C", "major", "pop", 4)
//!     .unwrap();
//!
//! assert_eq!(progression.figures(), vec!["I", "V", "vi", "IV"]);
//! ```

use log::debug;
use serde::Serialize;

use crate::error::ChordError;
use crate::key::KeyContext;
use crate::roman::resolve;
use crate::style::StyleMap;
use crate::voice_leading;
use crate::voicing::{Chord, PitchPolicy, Voicing};

/// Ordered chords of a generated progression, in musical time order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub key: String,
    pub chords: Vec<Chord>,
}

impl Progression {
    pub fn new(key: &KeyContext, chords: Vec<Chord>) -> Self {
        Self {
            key: key.name(),
            chords,
        }
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn figures(&self) -> Vec<&str> {
        self.chords.iter().map(Chord::figure).collect()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.chords.iter().map(Chord::symbol).collect()
    }

    /// `(figure, symbol)` pairs for labelling chords in a display.
    pub fn labels(&self) -> Vec<(String, String)> {
        self.chords
            .iter()
            .map(|c| (c.figure().to_string(), c.symbol()))
            .collect()
    }
}

/// Repeat `seq` cyclically to exactly `n` items.
///
/// Full repetitions come first, then a prefix of the template for the remainder.
///
/// ```
/// use chordgen::progression::repeat_to_len;
///
/// let template = ["a", "b", "c"];
/// assert_eq!(repeat_to_len(&template, 7), vec!["a", "b", "c", "a", "b", "c", "a"]);
/// ```
pub fn repeat_to_len<T: Clone>(seq: &[T], n: usize) -> Vec<T> {
    if seq.is_empty() {
        return Vec::new();
    }
    seq.iter().cycle().take(n).cloned().collect()
}

/// Turns `(tonic, mode, style, total)` requests into progressions.
///
/// Borrows the style map; every call returns a fresh [`Progression`].
#[derive(Debug, Clone)]
pub struct ProgressionBuilder<'a> {
    styles: &'a StyleMap,
    voicing: Voicing,
    smart_voicing: bool,
}

impl<'a> ProgressionBuilder<'a> {
    pub fn new(styles: &'a StyleMap) -> Self {
        Self {
            styles,
            voicing: Voicing::default(),
            smart_voicing: true,
        }
    }

    pub fn floor_octave(mut self, floor_octave: u8) -> Self {
        self.voicing.floor_octave = floor_octave;
        self
    }

    pub fn pitch_policy(mut self, policy: PitchPolicy) -> Self {
        self.voicing.pitch_policy = policy;
        self
    }

    /// Choose inversions for smooth voice leading (on by default).
    pub fn smart_voicing(mut self, enabled: bool) -> Self {
        self.smart_voicing = enabled;
        self
    }

    /// Generate a progression.
    ///
    /// # Errors
    /// - [`ChordError::InvalidCount`] if `total` is zero
    /// - [`ChordError::InvalidKey`] if the tonic or mode cannot be parsed
    /// - [`ChordError::UnknownStyle`] if the style has no template for the mode
    /// - [`ChordError::InvalidFigure`] if a template figure is malformed
    /// - [`ChordError::PitchOutOfRange`] if a chord does not fit above the floor
    pub fn build(
        &self,
        tonic: &str,
        mode: &str,
        style: &str,
        total: usize,
    ) -> Result<Progression, ChordError> {
        if total < 1 {
            return Err(ChordError::InvalidCount(total));
        }
        let key = KeyContext::parse(tonic, mode)?;
        let template = self.styles.template(style, key.mode())?;
        let figures = repeat_to_len(template, total);

        debug!(
            "Building {} chords of '{}' in {}: {:?}",
            total,
            style,
            key.name(),
            figures
        );

        let chords = figures
            .iter()
            .map(|figure| {
                let spec = resolve(figure, &key)?;
                self.voicing.realize(&spec, 0)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let progression = Progression::new(&key, chords);
        if self.smart_voicing {
            Ok(voice_leading::optimize(&progression))
        } else {
            Ok(progression)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repeat_to_len() {
        let template = ["I", "IV", "V"];
        assert_eq!(
            repeat_to_len(&template, 7),
            vec!["I", "IV", "V", "I", "IV", "V", "I"]
        );
        assert_eq!(repeat_to_len(&template, 2), vec!["I", "IV"]);
        assert_eq!(repeat_to_len(&template, 3), vec!["I", "IV", "V"]);
        assert!(repeat_to_len::<&str>(&[], 4).is_empty());
    }

    #[test]
    fn test_pop_major_figures() {
        let styles = StyleMap::fallback();
        let progression = ProgressionBuilder::new(&styles)
            .build("C", "major", "pop", 4)
            .unwrap();
        assert_eq!(progression.figures(), vec!["I", "V", "vi", "IV"]);
        assert_eq!(progression.symbols(), vec!["C", "G", "Am", "F"]);
        assert_eq!(progression.key, "C major");
    }

    #[test]
    fn test_labels_pair_figures_with_symbols() {
        let styles = StyleMap::fallback();
        let progression = ProgressionBuilder::new(&styles)
            .build("Bb", "major", "jazz", 3)
            .unwrap();
        assert_eq!(
            progression.labels(),
            vec![
                ("ii".to_string(), "Cm".to_string()),
                ("V7".to_string(), "F7".to_string()),
                ("I".to_string(), "Bb".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_dump() {
        let styles = StyleMap::fallback();
        let progression = ProgressionBuilder::new(&styles)
            .smart_voicing(false)
            .pitch_policy(PitchPolicy::Clamp)
            .build("C", "major", "jazz", 2)
            .unwrap();
        let json = serde_json::to_value(&progression).unwrap();

        assert_eq!(json["key"], "C major");
        let first = &json["chords"][0];
        assert_eq!(first["pitches"], serde_json::json!([50, 53, 57]));
        assert_eq!(first["voicing"]["floorOctave"], 4);
        assert_eq!(first["voicing"]["pitchPolicy"], "clamp");
        assert_eq!(first["spec"]["figure"], "ii");
        assert_eq!(first["spec"]["quality"], "minor");
        assert_eq!(first["spec"]["flatSpelling"], false);
        assert_eq!(json["chords"][1]["spec"]["quality"], "dominant-seventh");
        assert_eq!(json["chords"][1]["spec"]["intervals"], serde_json::json!([0, 4, 7, 10]));
    }

    #[test]
    fn test_cyclic_expansion_of_three_chord_template() {
        let styles = StyleMap::fallback();
        let progression = ProgressionBuilder::new(&styles)
            .build("F", "major", "jazz", 7)
            .unwrap();
        assert_eq!(
            progression.figures(),
            vec!["ii", "V7", "I", "ii", "V7", "I", "ii"]
        );
    }

    #[test]
    fn test_plain_voicing_is_root_position() {
        let styles = StyleMap::fallback();
        let progression = ProgressionBuilder::new(&styles)
            .smart_voicing(false)
            .build("C", "major", "pop", 4)
            .unwrap();
        let pitches: Vec<Vec<u8>> = progression.chords.iter().map(|c| c.pitches.clone()).collect();
        assert_eq!(
            pitches,
            vec![
                vec![48, 52, 55],
                vec![55, 59, 62],
                vec![57, 60, 64],
                vec![53, 57, 60],
            ]
        );
        assert!(progression.chords.iter().all(|c| c.inversion() == 0));
    }

    #[test]
    fn test_minor_mode_uses_min_template() {
        let styles = StyleMap::fallback();
        let progression = ProgressionBuilder::new(&styles)
            .build("A", "minor", "classic", 4)
            .unwrap();
        assert_eq!(progression.figures(), vec!["i", "iv", "V", "i"]);
        assert_eq!(progression.symbols(), vec!["Am", "Dm", "E", "Am"]);
    }

    #[test]
    fn test_errors() {
        let styles = StyleMap::fallback();
        let builder = ProgressionBuilder::new(&styles);
        assert!(matches!(
            builder.build("C", "major", "polka", 4),
            Err(ChordError::UnknownStyle { .. })
        ));
        assert!(matches!(
            builder.build("C", "major", "pop", 0),
            Err(ChordError::InvalidCount(0))
        ));
        assert!(matches!(
            builder.build("Q", "major", "pop", 4),
            Err(ChordError::InvalidKey(_))
        ));
        assert!(matches!(
            builder.build("C", "lydian", "pop", 4),
            Err(ChordError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_malformed_template_figure_surfaces() {
        let styles = StyleMap::from_entries([(
            "broken".to_string(),
            StyleEntry::new(&["I", "Ω7"], &["i"]),
        )])
        .unwrap();
        let builder = ProgressionBuilder::new(&styles);
        assert!(matches!(
            builder.build("C", "major", "broken", 2),
            Err(ChordError::InvalidFigure { .. })
        ));
        // The minor template is fine
        assert_eq!(
            builder.build("C", "minor", "broken", 2).unwrap().figures(),
            vec!["i", "i"]
        );
    }

    #[test]
    fn test_floor_octave_and_policy() {
        let styles = StyleMap::fallback();
        let high = ProgressionBuilder::new(&styles)
            .smart_voicing(false)
            .floor_octave(6)
            .build("C", "major", "pop", 1)
            .unwrap();
        assert_eq!(high.chords[0].pitches, vec![72, 76, 79]);

        let too_high = ProgressionBuilder::new(&styles)
            .smart_voicing(false)
            .floor_octave(10)
            .build("D", "major", "pop", 1);
        assert!(matches!(too_high, Err(ChordError::PitchOutOfRange(_))));

        let clamped = ProgressionBuilder::new(&styles)
            .smart_voicing(false)
            .floor_octave(10)
            .pitch_policy(PitchPolicy::Clamp)
            .build("D", "major", "pop", 1)
            .unwrap();
        assert!(clamped.chords[0].pitches.iter().all(|&p| p <= 127));
        assert_eq!(clamped.chords[0].voicing.pitch_policy, PitchPolicy::Clamp);
    }
}
