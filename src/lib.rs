pub mod api;
pub mod error;
pub mod events;
pub mod key;
pub mod midi;
pub mod progression;
pub mod roman;
pub mod style;
pub mod voice_leading;
pub mod voicing;

pub use api::{build, encode_events, export_progression, save_progression};
pub use error::ChordError;
pub use events::{ExportOptions, NoteEvent};
pub use key::{KeyContext, Mode};
pub use midi::{encode, MidiParams};
pub use progression::{Progression, ProgressionBuilder};
pub use roman::{resolve, ChordSpec, Quality};
pub use style::{StyleEntry, StyleMap};
pub use voicing::{voice, Chord, PitchPolicy, Voicing};
