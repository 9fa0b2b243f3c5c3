//! Timed note events
//!
//! The boundary type between note producers and the MIDI encoder. A
//! [`Progression`] flattens into one group of events per chord; an editor can
//! also build its own list, one independently positioned event per note.

use crate::error::ChordError;
use crate::progression::Progression;

pub const DEFAULT_VELOCITY: u8 = 100;
/// Center
pub const DEFAULT_PAN: u8 = 64;

/// A single note to be written to a MIDI track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub pan: u8,
    pub channel: u8,
    pub start_tick: u32,
    pub duration_ticks: u32,
}

impl NoteEvent {
    /// A note with default velocity, centered pan, on channel 0.
    pub fn new(pitch: u8, start_tick: u32, duration_ticks: u32) -> Self {
        Self {
            pitch,
            velocity: DEFAULT_VELOCITY,
            pan: DEFAULT_PAN,
            channel: 0,
            start_tick,
            duration_ticks,
        }
    }

    pub fn end_tick(&self) -> u32 {
        self.start_tick.saturating_add(self.duration_ticks)
    }

    /// Check every field against its MIDI range.
    pub fn validate(&self) -> Result<(), ChordError> {
        if self.pitch > 127 {
            return Err(ChordError::PitchOutOfRange(i32::from(self.pitch)));
        }
        if !(1..=127).contains(&self.velocity) {
            return Err(ChordError::VelocityOutOfRange(self.velocity));
        }
        if self.pan > 127 {
            return Err(ChordError::PanOutOfRange(self.pan));
        }
        if self.channel > 15 {
            return Err(ChordError::ChannelOutOfRange(self.channel));
        }
        if self.duration_ticks == 0 {
            return Err(ChordError::InvalidDuration {
                start_tick: self.start_tick,
            });
        }
        Ok(())
    }
}

/// How a progression is laid out in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub ticks_per_beat: u16,
    pub beats_per_chord: u32,
    pub velocity: u8,
    pub pan: u8,
    pub channel: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            ticks_per_beat: 480,
            beats_per_chord: 4,
            velocity: DEFAULT_VELOCITY,
            pan: DEFAULT_PAN,
            channel: 0,
        }
    }
}

impl ExportOptions {
    /// Length of one chord in ticks.
    ///
    /// # Errors
    /// [`ChordError::InvalidTiming`] if the product does not fit in a `u32`.
    pub fn ticks_per_chord(&self) -> Result<u32, ChordError> {
        u32::from(self.ticks_per_beat)
            .checked_mul(self.beats_per_chord)
            .ok_or_else(|| {
                ChordError::InvalidTiming(format!(
                    "{} beats of {} ticks overflow the tick counter",
                    self.beats_per_chord, self.ticks_per_beat
                ))
            })
    }
}

impl Progression {
    /// Flatten into note events: chord `i` starts at `i * ticks_per_chord` and
    /// all of its tones share that start and duration.
    ///
    /// # Errors
    /// [`ChordError::InvalidTiming`] if a chord would start past the last
    /// representable tick.
    pub fn to_note_events(&self, options: &ExportOptions) -> Result<Vec<NoteEvent>, ChordError> {
        let ticks_per_chord = options.ticks_per_chord()?;
        let mut events = Vec::new();

        for (index, chord) in self.chords.iter().enumerate() {
            let start_tick = u32::try_from(index)
                .ok()
                .and_then(|i| i.checked_mul(ticks_per_chord))
                .ok_or_else(|| {
                    ChordError::InvalidTiming(format!(
                        "chord {} starts past the last representable tick",
                        index + 1
                    ))
                })?;
            for &pitch in &chord.pitches {
                events.push(NoteEvent {
                    pitch,
                    velocity: options.velocity,
                    pan: options.pan,
                    channel: options.channel,
                    start_tick,
                    duration_ticks: ticks_per_chord,
                });
            }
        }

        Ok(events)
    }
}
