//! # Error Types
//!
//! Every fallible operation in the crate returns [`ChordError`].
//!
//! Theory and voicing errors are raised at the point where a figure is resolved
//! or a chord is realized, and propagate unchanged to the caller. Nothing is
//! silently replaced by a default progression; the only tolerated repair is the
//! opt-in [`PitchPolicy::Clamp`](crate::voicing::PitchPolicy) for out-of-range
//! pitches.
//!
//! ## Usage
//! ```rust
//! use chordgen::{build, ChordError, StyleMap};
//!
//! let styles = StyleMap::fallback();
//! match build(&styles, "C", "major", "polka", 4, true) {
//!     Err(ChordError::UnknownStyle { style, .. }) => assert_eq!(style, "polka"),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::key::Mode;

#[derive(Error, Debug)]
pub enum ChordError {
    /// Tonic name or mode string could not be parsed.
    ///
    /// # Example
    /// ```
    /// # use chordgen::ChordError;
    /// let err = ChordError::InvalidKey("H#".to_string());
    /// assert_eq!(err.to_string(), "Invalid key: H#");
    /// ```
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Style is missing from the style map, or has no template for the mode.
    #[error("Unknown style '{style}' for {mode} mode")]
    UnknownStyle { style: String, mode: Mode },

    /// Malformed roman-numeral figure.
    ///
    /// # Example
    /// ```
    /// # use chordgen::ChordError;
    /// let err = ChordError::InvalidFigure {
    ///     figure: "Ω7".to_string(),
    ///     message: "unrecognized scale degree".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid figure 'Ω7': unrecognized scale degree");
    /// ```
    #[error("Invalid figure '{figure}': {message}")]
    InvalidFigure { figure: String, message: String },

    #[error("Invalid chord count {0}: at least one chord is required")]
    InvalidCount(usize),

    #[error("Inversion {inversion} does not exist for a chord of {tones} tones")]
    InvalidInversion { inversion: usize, tones: usize },

    /// A realized or encoded pitch fell outside the MIDI range 0-127.
    #[error("Pitch {0} is outside the MIDI range 0-127")]
    PitchOutOfRange(i32),

    #[error("Velocity {0} is outside 1-127")]
    VelocityOutOfRange(u8),

    #[error("Pan {0} is outside 0-127")]
    PanOutOfRange(u8),

    #[error("Channel {0} is outside 0-15")]
    ChannelOutOfRange(u8),

    #[error("Program {0} is outside 0-127")]
    ProgramOutOfRange(u8),

    #[error("Note starting at tick {start_tick} has zero duration")]
    InvalidDuration { start_tick: u32 },

    /// Ticks-per-beat, tempo or time signature cannot be written to a MIDI file.
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    #[error("Cannot encode an empty event list")]
    EmptyInput,

    /// Style map document failed to parse or broke the style map invariant.
    ///
    /// # Example
    /// ```
    /// # use chordgen::ChordError;
    /// let err = ChordError::StyleMap("style 'pop' has an empty 'min' template".to_string());
    /// assert_eq!(err.to_string(), "Invalid style map: style 'pop' has an empty 'min' template");
    /// ```
    #[error("Invalid style map: {0}")]
    StyleMap(String),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
