//! # MIDI Encoding
//!
//! Serializes [`NoteEvent`]s into a Standard MIDI File, format 1, one track.
//!
//! ## File Layout
//! ```text
//! MThd  len=6  format=1  tracks=1  division=ticks_per_beat
//! MTrk  len=N
//!   0      FF 51 03 tt tt tt      tempo (microseconds per beat)
//!   0      FF 58 04 nn dd 18 08   time signature
//!   0      Cc pp                  program change
//!   ...    Bc 0A pan              pan, before each note-on
//!   ...    9c kk vv               note on
//!   ...    8c kk 00               note off
//!   0      FF 2F 00               end of track
//! ```
//!
//! Each message is preceded by its delta time (ticks since the previous
//! message). Chunks and delta times are written by `midly`; a gap longer than
//! a 28-bit delta is rejected with [`ChordError::InvalidTiming`].
//!
//! ## Ordering
//! Messages are stable-sorted by `(tick, kind)`. At equal ticks the order is
//! tempo, time signature, program change, note off, control change, note on,
//! so a repeated pitch is released before it is struck again.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::error::ChordError;
use crate::events::NoteEvent;

/// Controller number for pan
const CC_PAN: u8 = 10;
/// MIDI clocks per metronome click in the time-signature meta event
const CLOCKS_PER_CLICK: u8 = 24;
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;
const MAX_MICROS_PER_BEAT: f64 = 0xFF_FFFF as f64;

/// Parameters for MIDI encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiParams {
    /// Ticks per quarter note (typically 480)
    pub ticks_per_beat: u16,
    pub tempo_bpm: f64,
    pub time_sig_numerator: u8,
    /// Must be a power of two
    pub time_sig_denominator: u8,
    /// General MIDI program (0-127)
    pub program: u8,
    /// Channel the program change is sent on (0-15)
    pub channel: u8,
}

impl Default for MidiParams {
    fn default() -> Self {
        MidiParams {
            ticks_per_beat: 480,
            tempo_bpm: 120.0,
            time_sig_numerator: 4,
            time_sig_denominator: 4,
            program: 0,
            channel: 0,
        }
    }
}

impl MidiParams {
    /// Tempo as microseconds per quarter note.
    pub fn micros_per_beat(&self) -> Result<u32, ChordError> {
        if !self.tempo_bpm.is_finite() || self.tempo_bpm <= 0.0 {
            return Err(ChordError::InvalidTiming(format!(
                "tempo {} BPM must be positive",
                self.tempo_bpm
            )));
        }
        let micros = (60_000_000.0 / self.tempo_bpm).round();
        if !(1.0..=MAX_MICROS_PER_BEAT).contains(&micros) {
            return Err(ChordError::InvalidTiming(format!(
                "tempo {} BPM does not fit a 24-bit tempo event",
                self.tempo_bpm
            )));
        }
        Ok(micros as u32)
    }

    fn validate(&self) -> Result<(), ChordError> {
        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7FFF {
            return Err(ChordError::InvalidTiming(format!(
                "ticks per beat {} must be in 1-32767",
                self.ticks_per_beat
            )));
        }
        if self.time_sig_numerator == 0 {
            return Err(ChordError::InvalidTiming(
                "time signature numerator must be at least 1".to_string(),
            ));
        }
        if !self.time_sig_denominator.is_power_of_two() {
            return Err(ChordError::InvalidTiming(format!(
                "time signature denominator {} is not a power of two",
                self.time_sig_denominator
            )));
        }
        if self.program > 127 {
            return Err(ChordError::ProgramOutOfRange(self.program));
        }
        if self.channel > 15 {
            return Err(ChordError::ChannelOutOfRange(self.channel));
        }
        Ok(())
    }
}

/// One track message at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    Tempo {
        tick: u32,
        micros_per_beat: u32,
    },
    TimeSignature {
        tick: u32,
        numerator: u8,
        denominator: u8,
    },
    ProgramChange {
        tick: u32,
        channel: u8,
        program: u8,
    },
    NoteOff {
        tick: u32,
        channel: u8,
        pitch: u8,
    },
    ControlChange {
        tick: u32,
        channel: u8,
        controller: u8,
        value: u8,
    },
    NoteOn {
        tick: u32,
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
}

impl MidiMessage {
    pub fn tick(&self) -> u32 {
        match *self {
            MidiMessage::Tempo { tick, .. }
            | MidiMessage::TimeSignature { tick, .. }
            | MidiMessage::ProgramChange { tick, .. }
            | MidiMessage::NoteOff { tick, .. }
            | MidiMessage::ControlChange { tick, .. }
            | MidiMessage::NoteOn { tick, .. } => tick,
        }
    }

    /// Order among messages sharing a tick
    fn kind_rank(&self) -> u8 {
        match self {
            MidiMessage::Tempo { .. } => 0,
            MidiMessage::TimeSignature { .. } => 1,
            MidiMessage::ProgramChange { .. } => 2,
            MidiMessage::NoteOff { .. } => 3,
            MidiMessage::ControlChange { .. } => 4,
            MidiMessage::NoteOn { .. } => 5,
        }
    }

    fn to_track_event_kind(self) -> TrackEventKind<'static> {
        match self {
            MidiMessage::Tempo {
                micros_per_beat, ..
            } => TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_beat))),
            MidiMessage::TimeSignature {
                numerator,
                denominator,
                ..
            } => TrackEventKind::Meta(MetaMessage::TimeSignature(
                numerator,
                denominator.trailing_zeros() as u8,
                CLOCKS_PER_CLICK,
                THIRTY_SECONDS_PER_QUARTER,
            )),
            MidiMessage::ProgramChange {
                channel, program, ..
            } => TrackEventKind::Midi {
                channel: u4::new(channel),
                message: midly::MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
            MidiMessage::NoteOff { channel, pitch, .. } => TrackEventKind::Midi {
                channel: u4::new(channel),
                message: midly::MidiMessage::NoteOff {
                    key: u7::new(pitch),
                    vel: u7::new(0),
                },
            },
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
                ..
            } => TrackEventKind::Midi {
                channel: u4::new(channel),
                message: midly::MidiMessage::Controller {
                    controller: u7::new(controller),
                    value: u7::new(value),
                },
            },
            MidiMessage::NoteOn {
                channel,
                pitch,
                velocity,
                ..
            } => TrackEventKind::Midi {
                channel: u4::new(channel),
                message: midly::MidiMessage::NoteOn {
                    key: u7::new(pitch),
                    vel: u7::new(velocity),
                },
            },
        }
    }
}

/// Build the sorted message list for a track.
///
/// Validates `params` and every event; see [`encode`] for the errors.
pub fn messages(events: &[NoteEvent], params: &MidiParams) -> Result<Vec<MidiMessage>, ChordError> {
    if events.is_empty() {
        return Err(ChordError::EmptyInput);
    }
    params.validate()?;

    let mut messages = Vec::with_capacity(3 + events.len() * 3);
    messages.push(MidiMessage::Tempo {
        tick: 0,
        micros_per_beat: params.micros_per_beat()?,
    });
    messages.push(MidiMessage::TimeSignature {
        tick: 0,
        numerator: params.time_sig_numerator,
        denominator: params.time_sig_denominator,
    });
    messages.push(MidiMessage::ProgramChange {
        tick: 0,
        channel: params.channel,
        program: params.program,
    });

    for event in events {
        event.validate()?;
        let end = event
            .start_tick
            .checked_add(event.duration_ticks)
            .ok_or_else(|| {
                ChordError::InvalidTiming(format!(
                    "note at tick {} ends past the last representable tick",
                    event.start_tick
                ))
            })?;

        messages.push(MidiMessage::ControlChange {
            tick: event.start_tick,
            channel: event.channel,
            controller: CC_PAN,
            value: event.pan,
        });
        messages.push(MidiMessage::NoteOn {
            tick: event.start_tick,
            channel: event.channel,
            pitch: event.pitch,
            velocity: event.velocity,
        });
        messages.push(MidiMessage::NoteOff {
            tick: end,
            channel: event.channel,
            pitch: event.pitch,
        });
    }

    // Stable, so equal (tick, kind) pairs keep input order
    messages.sort_by_key(|m| (m.tick(), m.kind_rank()));
    Ok(messages)
}

/// Encode note events as a format-1 Standard MIDI File.
///
/// # Errors
/// - [`ChordError::EmptyInput`] if `events` is empty
/// - [`ChordError::PitchOutOfRange`], [`ChordError::VelocityOutOfRange`],
///   [`ChordError::PanOutOfRange`], [`ChordError::ChannelOutOfRange`] or
///   [`ChordError::InvalidDuration`] for an out-of-range event field
/// - [`ChordError::InvalidTiming`] or [`ChordError::ProgramOutOfRange`] for
///   unusable `params`
///
/// # Example
/// ```
/// use chordgen::midi::{encode, MidiParams};
/// use chordgen::NoteEvent;
///
/// let bytes = encode(&[NoteEvent::new(60, 0, 480)], &MidiParams::default()).unwrap();
/// assert_eq!(&bytes[0..4], b"MThd");
/// assert_eq!(&bytes[14..18], b"MTrk");
/// ```
pub fn encode(events: &[NoteEvent], params: &MidiParams) -> Result<Vec<u8>, ChordError> {
    let messages = messages(events, params)?;

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(params.ticks_per_beat)),
    ));
    smf.tracks.push(build_track(&messages)?);

    let mut out = Vec::new();
    smf.write(&mut out).map_err(|e| {
        ChordError::InvalidTiming(format!("MIDI writer rejected the track: {:?}", e))
    })?;
    Ok(out)
}

/// Lower sorted messages into delta-timed track events, ending the track.
///
/// Messages must already be sorted by tick.
fn build_track(messages: &[MidiMessage]) -> Result<Track<'static>, ChordError> {
    let mut track: Track<'static> = Vec::with_capacity(messages.len() + 1);
    let mut last_tick = 0u32;

    for message in messages {
        let gap = message.tick() - last_tick;
        let delta = u28::try_from(gap).ok_or_else(|| {
            ChordError::InvalidTiming(format!(
                "gap of {} ticks before tick {} exceeds the largest MIDI delta time",
                gap,
                message.tick()
            ))
        })?;
        track.push(TrackEvent {
            delta,
            kind: message.to_track_event_kind(),
        });
        last_tick = message.tick();
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(track)
}

/// Write encoded bytes to `path` in a single write and return the resolved path.
pub fn write_midi_file(path: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf, ChordError> {
    let path = path.as_ref();
    fs::write(path, bytes).map_err(|source| ChordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    info!("Saved {} bytes of MIDI to {}", bytes.len(), resolved.display());
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Parse with midly and flatten the single track into
    /// (absolute tick, status-complete message bytes) pairs.
    fn decode_track(bytes: &[u8]) -> Vec<(u32, Vec<u8>)> {
        let smf = Smf::parse(bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 1);
        let mut tick = 0u32;
        smf.tracks[0]
            .iter()
            .map(|event| {
                tick += event.delta.as_int();
                (tick, message_bytes(&event.kind))
            })
            .collect()
    }

    fn message_bytes(kind: &TrackEventKind) -> Vec<u8> {
        match *kind {
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                match message {
                    midly::MidiMessage::NoteOff { key, vel } => {
                        vec![0x80 | ch, key.as_int(), vel.as_int()]
                    }
                    midly::MidiMessage::NoteOn { key, vel } => {
                        vec![0x90 | ch, key.as_int(), vel.as_int()]
                    }
                    midly::MidiMessage::Controller { controller, value } => {
                        vec![0xB0 | ch, controller.as_int(), value.as_int()]
                    }
                    midly::MidiMessage::ProgramChange { program } => {
                        vec![0xC0 | ch, program.as_int()]
                    }
                    other => panic!("unexpected channel message {:?}", other),
                }
            }
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                let mut out = vec![0xFF, 0x51, 0x03];
                out.extend_from_slice(&micros.as_int().to_be_bytes()[1..]);
                out
            }
            TrackEventKind::Meta(MetaMessage::TimeSignature(n, d, c, b)) => {
                vec![0xFF, 0x58, 0x04, n, d, c, b]
            }
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => vec![0xFF, 0x2F, 0x00],
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_longest_delta_time() {
        let params = MidiParams::default();
        let at_limit = [
            NoteEvent::new(60, 0, 10),
            NoteEvent::new(62, 10 + 0x0FFF_FFFF, 10),
        ];
        let bytes = encode(&at_limit, &params).unwrap();
        let second_on = decode_track(&bytes)
            .into_iter()
            .find(|(_, m)| m[0] == 0x90 && m[1] == 62)
            .map(|(tick, _)| tick);
        assert_eq!(second_on, Some(10 + 0x0FFF_FFFF));

        // One tick more than a 28-bit delta can carry
        let past_limit = [
            NoteEvent::new(60, 0, 10),
            NoteEvent::new(62, 10 + (1 << 28), 10),
        ];
        assert!(matches!(
            encode(&past_limit, &params),
            Err(ChordError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_single_note_is_byte_exact() {
        let bytes = encode(&[NoteEvent::new(60, 0, 480)], &MidiParams::default()).unwrap();
        let expected: Vec<u8> = vec![
            // MThd, length 6, format 1, 1 track, 480 ticks per beat
            0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x01, 0x01, 0xE0,
            // MTrk, length 35
            0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x23,
            // tempo 500000 us per beat
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
            // 4/4
            0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08,
            // program 0
            0x00, 0xC0, 0x00,
            // pan 64
            0x00, 0xB0, 0x0A, 0x40,
            // note on C4 velocity 100
            0x00, 0x90, 0x3C, 0x64,
            // note off after 480 ticks
            0x83, 0x60, 0x80, 0x3C, 0x00,
            // end of track
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_note_off_precedes_note_on_at_same_tick() {
        let events = [NoteEvent::new(60, 0, 480), NoteEvent::new(60, 480, 480)];
        let bytes = encode(&events, &MidiParams::default()).unwrap();
        let decoded = decode_track(&bytes);
        let at_480: Vec<u8> = decoded
            .iter()
            .filter(|(tick, _)| *tick == 480)
            .map(|(_, msg)| msg[0])
            .collect();
        assert_eq!(at_480, vec![0x80, 0xB0, 0x90]);
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_tick() {
        let events = [NoteEvent::new(64, 960, 480), NoteEvent::new(60, 0, 480)];
        let msgs = messages(&events, &MidiParams::default()).unwrap();
        assert!(msgs.windows(2).all(|w| w[0].tick() <= w[1].tick()));
        assert_eq!(
            msgs[4],
            MidiMessage::NoteOn {
                tick: 0,
                channel: 0,
                pitch: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn test_event_channel_and_pan() {
        let event = NoteEvent {
            channel: 3,
            pan: 0,
            velocity: 127,
            ..NoteEvent::new(72, 0, 240)
        };
        let bytes = encode(&[event], &MidiParams::default()).unwrap();
        let decoded = decode_track(&bytes);
        let notes: Vec<Vec<u8>> = decoded.iter().skip(3).map(|(_, m)| m.clone()).collect();
        assert_eq!(
            notes,
            vec![
                vec![0xB3, 0x0A, 0x00],
                vec![0x93, 0x48, 0x7F],
                vec![0x83, 0x48, 0x00],
                vec![0xFF, 0x2F, 0x00],
            ]
        );
    }

    #[test]
    fn test_tempo_and_meter() {
        let params = MidiParams {
            tempo_bpm: 90.0,
            time_sig_numerator: 6,
            time_sig_denominator: 8,
            program: 24,
            ..MidiParams::default()
        };
        let bytes = encode(&[NoteEvent::new(60, 0, 480)], &params).unwrap();
        let decoded = decode_track(&bytes);
        // 60_000_000 / 90 = 666_667 = 0x0A2C2B
        assert_eq!(decoded[0].1, vec![0xFF, 0x51, 0x03, 0x0A, 0x2C, 0x2B]);
        assert_eq!(decoded[1].1, vec![0xFF, 0x58, 0x04, 0x06, 0x03, 0x18, 0x08]);
        assert_eq!(decoded[2].1, vec![0xC0, 24]);
    }

    #[test]
    fn test_deterministic() {
        let events: Vec<NoteEvent> = (0..16)
            .map(|i| NoteEvent::new(48 + i as u8, i * 120, 360))
            .collect();
        let a = encode(&events, &MidiParams::default()).unwrap();
        let b = encode(&events, &MidiParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_errors() {
        let params = MidiParams::default();
        assert!(matches!(encode(&[], &params), Err(ChordError::EmptyInput)));
        assert!(matches!(
            encode(&[NoteEvent::new(200, 0, 10)], &params),
            Err(ChordError::PitchOutOfRange(200))
        ));
        let bad_tempo = MidiParams {
            tempo_bpm: 0.0,
            ..params
        };
        assert!(matches!(
            encode(&[NoteEvent::new(60, 0, 10)], &bad_tempo),
            Err(ChordError::InvalidTiming(_))
        ));
        let bad_meter = MidiParams {
            time_sig_denominator: 3,
            ..params
        };
        assert!(matches!(
            encode(&[NoteEvent::new(60, 0, 10)], &bad_meter),
            Err(ChordError::InvalidTiming(_))
        ));
        let bad_division = MidiParams {
            ticks_per_beat: 0,
            ..params
        };
        assert!(matches!(
            encode(&[NoteEvent::new(60, 0, 10)], &bad_division),
            Err(ChordError::InvalidTiming(_))
        ));
        assert!(matches!(
            encode(&[NoteEvent::new(60, u32::MAX, 10)], &params),
            Err(ChordError::InvalidTiming(_))
        ));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let result = write_midi_file("/nonexistent/dir/out.mid", &[0u8; 4]);
        assert!(matches!(result, Err(ChordError::Io { .. })));
    }
}
