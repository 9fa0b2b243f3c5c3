//! # Public API
//!
//! Entry points for generating progressions and turning them into MIDI bytes.
//!
//! - [`build()`] - Generate a progression from a style template
//! - [`encode_events()`] - Encode an arbitrary note-event list (e.g. from an editor)
//! - [`export_progression()`] - Flatten a progression and encode it
//! - [`save_progression()`] - Export and write to a `.mid` file
//!
//! ## Typical Usage
//!
//! ```rust
//! use chordgen::{build, export_progression, ExportOptions, StyleMap};
//!
//! let styles = StyleMap::fallback();
//! let progression = build(&styles, "C", "major", "classic", 4, true)?;
//! let midi = export_progression(&progression, &ExportOptions::default(), 120.0)?;
//! assert_eq!(&midi[0..4], b"MThd");
//! # Ok::<(), chordgen::ChordError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::error::ChordError;
use crate::events::{ExportOptions, NoteEvent};
use crate::midi::{encode, write_midi_file, MidiParams};
use crate::progression::{Progression, ProgressionBuilder};
use crate::style::StyleMap;

/// Generate a progression with the default floor octave and strict pitch range.
///
/// `smart_voicing = false` keeps every chord in root position.
///
/// # Errors
/// See [`ProgressionBuilder::build`].
pub fn build(
    styles: &StyleMap,
    tonic: &str,
    mode: &str,
    style: &str,
    total_chords: usize,
    smart_voicing: bool,
) -> Result<Progression, ChordError> {
    ProgressionBuilder::new(styles)
        .smart_voicing(smart_voicing)
        .build(tonic, mode, style, total_chords)
}

/// Encode caller-built note events in 4/4 with program 0.
pub fn encode_events(
    events: &[NoteEvent],
    ticks_per_beat: u16,
    tempo_bpm: f64,
) -> Result<Vec<u8>, ChordError> {
    let params = MidiParams {
        ticks_per_beat,
        tempo_bpm,
        ..MidiParams::default()
    };
    encode(events, &params)
}

/// Flatten a progression (one chord per `beats_per_chord` beats) and encode it.
pub fn export_progression(
    progression: &Progression,
    options: &ExportOptions,
    tempo_bpm: f64,
) -> Result<Vec<u8>, ChordError> {
    let params = MidiParams {
        ticks_per_beat: options.ticks_per_beat,
        tempo_bpm,
        channel: options.channel,
        ..MidiParams::default()
    };
    encode(&progression.to_note_events(options)?, &params)
}

/// Export a progression and write it to `path`, returning the resolved path.
pub fn save_progression(
    progression: &Progression,
    path: impl AsRef<Path>,
    options: &ExportOptions,
    tempo_bpm: f64,
) -> Result<PathBuf, ChordError> {
    let bytes = export_progression(progression, options, tempo_bpm)?;
    write_midi_file(path, &bytes)
}
