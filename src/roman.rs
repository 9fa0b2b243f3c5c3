//! Roman numeral resolution
//!
//! Parses figures such as `V7`, `iiø` or `bIII` against a [`KeyContext`] into a
//! [`ChordSpec`]: root pitch class, quality and the pitch-class offsets above
//! the root.
//!
//! # Figure Grammar
//! ```text
//! figure     := accidental* numeral suffix
//! accidental := 'b' | '♭' | '#' | '♯'
//! numeral    := I | II | III | IV | V | VI | VII   (uppercase = major baseline)
//!             | i | ii | iii | iv | v | vi | vii   (lowercase = minor baseline)
//! suffix     := '' | '7' | '°' | 'o' | '°7' | 'o7' | 'ø' | 'ø7' | '/o' | '/o7'
//!             | '+' | '+7' | 'maj7' | 'M7'
//! ```
//!
//! # Supported Qualities
//! - **Major / minor triad**: no suffix, quality from numeral case
//! - **Dominant 7th / minor 7th**: `7` on an uppercase / lowercase numeral
//! - **Major 7th / minor-major 7th**: `maj7` or `M7`
//! - **Diminished**: `°` or `o`, with `7` for the fully diminished seventh
//! - **Half-diminished 7th**: `ø` or `/o` (the seventh is implied)
//! - **Augmented**: `+`, with `7` for the augmented seventh

use serde::Serialize;

use crate::error::ChordError;
use crate::key::{pitch_class_name, KeyContext};

/// Longest numerals first so `vii` is not read as `vi` or `v`.
const NUMERALS: [(&str, u8); 7] = [
    ("vii", 7),
    ("iii", 3),
    ("vi", 6),
    ("iv", 4),
    ("ii", 2),
    ("v", 5),
    ("i", 1),
];

/// Chord quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
    DominantSeventh,
    MajorSeventh,
    MinorSeventh,
    MinorMajorSeventh,
    HalfDiminished,
    DiminishedSeventh,
    AugmentedSeventh,
}

impl Quality {
    /// Pitch-class offsets above the root, ascending.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Quality::Major => &[0, 4, 7],
            Quality::Minor => &[0, 3, 7],
            Quality::Diminished => &[0, 3, 6],
            Quality::Augmented => &[0, 4, 8],
            Quality::DominantSeventh => &[0, 4, 7, 10],
            Quality::MajorSeventh => &[0, 4, 7, 11],
            Quality::MinorSeventh => &[0, 3, 7, 10],
            Quality::MinorMajorSeventh => &[0, 3, 7, 11],
            Quality::HalfDiminished => &[0, 3, 6, 10],
            Quality::DiminishedSeventh => &[0, 3, 6, 9],
            Quality::AugmentedSeventh => &[0, 4, 8, 10],
        }
    }

    /// Suffix used in chord symbols (`m`, `dim`, `maj7`, ...).
    pub fn symbol_suffix(self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Diminished => "dim",
            Quality::Augmented => "aug",
            Quality::DominantSeventh => "7",
            Quality::MajorSeventh => "maj7",
            Quality::MinorSeventh => "m7",
            Quality::MinorMajorSeventh => "mMaj7",
            Quality::HalfDiminished => "ø7",
            Quality::DiminishedSeventh => "dim7",
            Quality::AugmentedSeventh => "+7",
        }
    }
}

/// A resolved chord, not yet placed in any octave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSpec {
    pub root: u8,
    pub quality: Quality,
    pub intervals: Vec<u8>,
    pub figure: String,
    pub inversion: usize,
    /// Spell the root with a flat rather than a sharp
    pub flat_spelling: bool,
}

impl ChordSpec {
    pub fn tone_count(&self) -> usize {
        self.intervals.len()
    }

    /// Pitch classes of the chord tones, root first.
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.intervals.iter().map(|i| (self.root + i) % 12).collect()
    }

    pub fn root_name(&self) -> &'static str {
        pitch_class_name(self.root, self.flat_spelling)
    }

    /// Chord symbol such as `Am`, `G7` or `Bdim`.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.root_name(), self.quality.symbol_suffix())
    }

    /// The same chord with a different inversion index.
    pub fn with_inversion(&self, inversion: usize) -> Self {
        Self {
            inversion,
            ..self.clone()
        }
    }
}

/// Resolve a roman-numeral figure in a key.
///
/// # Examples
/// ```
/// use chordgen::roman::{resolve, Quality};
/// use chordgen::KeyContext;
///
/// let key = KeyContext::parse("C", "major").unwrap();
///
/// let dominant = resolve("V7", &key).unwrap();
/// assert_eq!(dominant.root, 7);
/// assert_eq!(dominant.quality, Quality::DominantSeventh);
/// assert_eq!(dominant.intervals, vec![0, 4, 7, 10]);
///
/// let flat_three = resolve("bIII", &key).unwrap();
/// assert_eq!(flat_three.symbol(), "Eb");
/// ```
pub fn resolve(figure: &str, key: &KeyContext) -> Result<ChordSpec, ChordError> {
    let invalid = |message: &str| ChordError::InvalidFigure {
        figure: figure.to_string(),
        message: message.to_string(),
    };

    let trimmed = figure.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty figure"));
    }

    // Leading accidentals
    let mut rest = trimmed;
    let mut accidental: i8 = 0;
    loop {
        if let Some(r) = rest.strip_prefix('b').or_else(|| rest.strip_prefix('♭')) {
            accidental -= 1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('#').or_else(|| rest.strip_prefix('♯')) {
            accidental += 1;
            rest = r;
        } else {
            break;
        }
    }
    if accidental.abs() > 2 {
        return Err(invalid("too many accidentals"));
    }

    // Scale degree numeral
    let (numeral, degree) = NUMERALS
        .iter()
        .find_map(|&(numeral, degree)| {
            rest.get(..numeral.len())
                .filter(|head| head.eq_ignore_ascii_case(numeral))
                .map(|head| (head, degree))
        })
        .ok_or_else(|| invalid("unrecognized scale degree"))?;

    let upper = if numeral.chars().all(|c| c.is_ascii_uppercase()) {
        true
    } else if numeral.chars().all(|c| c.is_ascii_lowercase()) {
        false
    } else {
        return Err(invalid("numeral mixes upper and lower case"));
    };

    let suffix = &rest[numeral.len()..];
    let quality = match (suffix, upper) {
        ("", true) => Quality::Major,
        ("", false) => Quality::Minor,
        ("7", true) => Quality::DominantSeventh,
        ("7", false) => Quality::MinorSeventh,
        ("maj7" | "M7", true) => Quality::MajorSeventh,
        ("maj7" | "M7", false) => Quality::MinorMajorSeventh,
        ("°" | "o", _) => Quality::Diminished,
        ("°7" | "o7", _) => Quality::DiminishedSeventh,
        ("ø" | "ø7" | "/o" | "/o7", _) => Quality::HalfDiminished,
        ("+", _) => Quality::Augmented,
        ("+7", _) => Quality::AugmentedSeventh,
        _ => return Err(invalid(&format!("unrecognized quality suffix '{}'", suffix))),
    };

    let root = if accidental == 0 {
        key.scale_degree(degree)
    } else {
        (key.major_degree(degree) as i8 + accidental).rem_euclid(12) as u8
    };

    let flat_spelling = match accidental {
        a if a < 0 => true,
        a if a > 0 => false,
        _ => key.prefers_flats(),
    };

    Ok(ChordSpec {
        root,
        quality,
        intervals: quality.intervals().to_vec(),
        figure: trimmed.to_string(),
        inversion: 0,
        flat_spelling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Mode;

    fn c_major() -> KeyContext {
        KeyContext::new(0, Mode::Major)
    }

    fn c_minor() -> KeyContext {
        KeyContext::new(0, Mode::Minor)
    }

    #[test]
    fn test_diatonic_triads_in_major() {
        let key = c_major();
        let roots: Vec<u8> = ["I", "ii", "iii", "IV", "V", "vi", "vii°"]
            .iter()
            .map(|f| resolve(f, &key).unwrap().root)
            .collect();
        assert_eq!(roots, vec![0, 2, 4, 5, 7, 9, 11]);

        assert_eq!(resolve("I", &key).unwrap().quality, Quality::Major);
        assert_eq!(resolve("ii", &key).unwrap().quality, Quality::Minor);
        assert_eq!(resolve("vii°", &key).unwrap().quality, Quality::Diminished);
        assert_eq!(resolve("viio", &key).unwrap().intervals, vec![0, 3, 6]);
    }

    #[test]
    fn test_minor_key_uses_natural_minor() {
        let key = c_minor();
        assert_eq!(resolve("III", &key).unwrap().root, 3);
        assert_eq!(resolve("VI", &key).unwrap().root, 8);
        assert_eq!(resolve("VII", &key).unwrap().root, 10);
        // Case still decides the third: V in minor is a major triad on G
        let v = resolve("V", &key).unwrap();
        assert_eq!(v.root, 7);
        assert_eq!(v.pitch_classes(), vec![7, 11, 2]);
    }

    #[test]
    fn test_accidentals_measure_from_major_scale() {
        let bii = resolve("bIII", &c_major()).unwrap();
        assert_eq!(bii.root, 3);
        let biii_minor = resolve("bIII", &c_minor()).unwrap();
        assert_eq!(biii_minor.root, 3);
        assert_eq!(biii_minor.symbol(), "Eb");

        let sharp_iv = resolve("#iv°", &c_major()).unwrap();
        assert_eq!(sharp_iv.root, 6);
        assert_eq!(sharp_iv.symbol(), "F#dim");
    }

    #[test]
    fn test_sevenths() {
        let key = c_major();
        assert_eq!(resolve("V7", &key).unwrap().intervals, vec![0, 4, 7, 10]);
        assert_eq!(resolve("ii7", &key).unwrap().quality, Quality::MinorSeventh);
        assert!(resolve("IMaj7", &key).is_err());
        assert_eq!(resolve("IM7", &key).unwrap().quality, Quality::MajorSeventh);
        assert_eq!(resolve("imaj7", &key).unwrap().quality, Quality::MinorMajorSeventh);
        assert_eq!(resolve("vii°7", &key).unwrap().intervals, vec![0, 3, 6, 9]);
        assert_eq!(resolve("III+7", &key).unwrap().intervals, vec![0, 4, 8, 10]);
    }

    #[test]
    fn test_half_diminished() {
        let key = c_minor();
        let ii = resolve("iiø", &key).unwrap();
        assert_eq!(ii.root, 2);
        assert_eq!(ii.quality, Quality::HalfDiminished);
        assert_eq!(ii.tone_count(), 4);
        assert_eq!(ii.pitch_classes(), vec![2, 5, 8, 0]);
        assert_eq!(resolve("ii/o7", &key).unwrap().quality, Quality::HalfDiminished);
    }

    #[test]
    fn test_invalid_figures() {
        let key = c_major();
        for figure in ["Ω7", "", "  ", "X", "Iv", "V9", "bbbII", "I7x"] {
            assert!(
                matches!(resolve(figure, &key), Err(ChordError::InvalidFigure { .. })),
                "figure {:?} should be rejected",
                figure
            );
        }
    }

    #[test]
    fn test_symbols_follow_key_spelling() {
        let f_major = KeyContext::parse("F", "major").unwrap();
        assert_eq!(resolve("IV", &f_major).unwrap().symbol(), "Bb");
        let e_major = KeyContext::parse("E", "major").unwrap();
        assert_eq!(resolve("iii", &e_major).unwrap().symbol(), "G#m");
        assert_eq!(resolve("V7", &e_major).unwrap().symbol(), "B7");
    }
}
