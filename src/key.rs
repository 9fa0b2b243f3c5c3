//! # Key Context
//!
//! A tonic pitch class plus a mode, and the scale-degree mapping that roman
//! numerals are resolved against.
//!
//! ## Pitch Classes
//! Pitch classes are semitone offsets from C in `0..12`:
//! `0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B`.
//!
//! ## Scales
//! - Major: `0 2 4 5 7 9 11`
//! - Minor (natural): `0 2 3 5 7 8 10`
//!
//! ## Spelling
//! Every key knows whether its signature is written with flats. Chord root names
//! are spelled accordingly (`Bb` in F major, `A#` in B major).

use std::fmt;

use crate::error::ChordError;

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Mode of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    /// Parse a mode name. Accepts `major`/`minor` and the short `maj`/`min`
    /// tags, case-insensitive, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Result<Self, ChordError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "maj" => Ok(Mode::Major),
            "minor" | "min" => Ok(Mode::Minor),
            _ => Err(ChordError::InvalidKey(format!("unknown mode '{}'", s.trim()))),
        }
    }

    /// Style map key for this mode (`"maj"` or `"min"`).
    pub fn tag(self) -> &'static str {
        match self {
            Mode::Major => "maj",
            Mode::Minor => "min",
        }
    }

    fn scale(self) -> &'static [u8; 7] {
        match self {
            Mode::Major => &MAJOR_SCALE,
            Mode::Minor => &MINOR_SCALE,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("major"),
            Mode::Minor => f.write_str("minor"),
        }
    }
}

/// Tonic pitch class and mode. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    tonic: u8,
    mode: Mode,
    prefer_flat: bool,
}

impl KeyContext {
    /// Build a key from a tonic pitch class (taken modulo 12).
    ///
    /// Spelling follows the conventional key signature for the tonic.
    pub fn new(tonic: u8, mode: Mode) -> Self {
        let tonic = tonic % 12;
        Self {
            tonic,
            mode,
            prefer_flat: conventionally_flat(tonic, mode),
        }
    }

    /// Parse a tonic name (`C`, `F#`, `Eb`, `bb`) and a mode name.
    ///
    /// # Example
    /// ```
    /// use chordgen::{KeyContext, Mode};
    ///
    /// let key = KeyContext::parse("Eb", "minor").unwrap();
    /// assert_eq!(key.tonic(), 3);
    /// assert_eq!(key.mode(), Mode::Minor);
    /// assert!(key.prefers_flats());
    /// ```
    pub fn parse(tonic: &str, mode: &str) -> Result<Self, ChordError> {
        let mode = Mode::parse(mode)?;
        let (pc, accidental) = parse_tonic(tonic)?;
        let prefer_flat = match accidental {
            a if a < 0 => true,
            a if a > 0 => false,
            _ => conventionally_flat(pc, mode),
        };
        Ok(Self {
            tonic: pc,
            mode,
            prefer_flat,
        })
    }

    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn prefers_flats(&self) -> bool {
        self.prefer_flat
    }

    /// Pitch class of a diatonic scale degree (1-7) in this key's own scale.
    pub fn scale_degree(&self, degree: u8) -> u8 {
        let step = self.mode.scale()[usize::from((degree.max(1) - 1) % 7)];
        (self.tonic + step) % 12
    }

    /// Pitch class of a scale degree (1-7) in the parallel major scale.
    ///
    /// Accidental-prefixed numerals (`bIII`, `#iv`) are measured from here.
    pub fn major_degree(&self, degree: u8) -> u8 {
        let step = MAJOR_SCALE[usize::from((degree.max(1) - 1) % 7)];
        (self.tonic + step) % 12
    }

    /// Display name of the tonic (`"Eb minor"`).
    pub fn name(&self) -> String {
        format!("{} {}", pitch_class_name(self.tonic, self.prefer_flat), self.mode)
    }
}

/// Name of a pitch class, spelled with flats or sharps.
pub fn pitch_class_name(pc: u8, prefer_flat: bool) -> &'static str {
    let idx = usize::from(pc % 12);
    if prefer_flat {
        FLAT_NAMES[idx]
    } else {
        SHARP_NAMES[idx]
    }
}

/// Returns the pitch class and the net accidental written on the tonic.
fn parse_tonic(s: &str) -> Result<(u8, i8), ChordError> {
    let trimmed = s.trim();
    let mut chars = trimmed.chars();
    let letter = chars
        .next()
        .ok_or_else(|| ChordError::InvalidKey("empty tonic".to_string()))?;

    let base: i8 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(ChordError::InvalidKey(format!("unknown tonic '{}'", trimmed))),
    };

    let mut accidental: i8 = 0;
    for c in chars {
        accidental += match c {
            '#' | '♯' => 1,
            'b' | '♭' | '-' => -1,
            _ => return Err(ChordError::InvalidKey(format!("unknown tonic '{}'", trimmed))),
        };
        if accidental.abs() > 2 {
            return Err(ChordError::InvalidKey(format!("unknown tonic '{}'", trimmed)));
        }
    }

    Ok(((base + accidental).rem_euclid(12) as u8, accidental))
}

/// Keys whose signatures are written with flats.
fn conventionally_flat(pc: u8, mode: Mode) -> bool {
    match mode {
        // F Bb Eb Ab Db Gb
        Mode::Major => matches!(pc, 5 | 10 | 3 | 8 | 1 | 6),
        // D G C F Bb Eb
        Mode::Minor => matches!(pc, 2 | 7 | 0 | 5 | 10 | 3),
    }
}
