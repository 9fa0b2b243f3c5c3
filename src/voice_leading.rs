//! Voice-leading optimization
//!
//! Greedy, left to right: the first chord is kept as is, and each following
//! chord is replaced by whichever of its inversions moves the least from the
//! already-chosen previous chord. Earlier choices are never revisited, so the
//! result is locally optimal per pair, not globally optimal.
//!
//! Distance is the sum of absolute semitone differences between voices paired
//! by ascending position, over the shorter of the two chords. Inversions are
//! scanned in increasing order and only a strictly smaller distance replaces
//! the current best, so ties keep the lowest inversion.

use log::debug;

use crate::progression::Progression;
use crate::voicing::Chord;

/// Voice-leading distance between two ascending pitch lists.
///
/// ```
/// use chordgen::voice_leading::distance;
///
/// assert_eq!(distance(&[48, 52, 55], &[47, 53, 55, 59]), 2);
/// ```
pub fn distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| u32::from(x.abs_diff(y)))
        .sum()
}

/// The inversion of `curr` that moves least from `prev`.
///
/// Inversions that cannot be realized (pitches above 127 under a strict
/// policy) are skipped; `curr` itself is returned if none can be.
pub fn best_inversion(prev: &Chord, curr: &Chord) -> Chord {
    let mut best: Option<(u32, Chord)> = None;

    for inversion in 0..curr.spec.tone_count() {
        let candidate = match curr.at_inversion(inversion) {
            Ok(chord) => chord,
            Err(e) => {
                debug!("Skipping inversion {} of {}: {}", inversion, curr.figure(), e);
                continue;
            }
        };
        let d = distance(&prev.pitches, &candidate.pitches);
        if best.as_ref().map_or(true, |(best_d, _)| d < *best_d) {
            best = Some((d, candidate));
        }
    }

    match best {
        Some((d, chord)) => {
            debug!(
                "{} -> {} inversion {} (distance {})",
                prev.figure(),
                chord.figure(),
                chord.inversion(),
                d
            );
            chord
        }
        None => curr.clone(),
    }
}

/// Re-voice every chord after the first for minimal movement.
///
/// Pure: the input progression is left untouched.
pub fn optimize(progression: &Progression) -> Progression {
    let mut chords: Vec<Chord> = Vec::with_capacity(progression.chords.len());

    for chord in &progression.chords {
        let next = match chords.last() {
            Some(prev) => best_inversion(prev, chord),
            None => chord.clone(),
        };
        chords.push(next);
    }

    Progression {
        key: progression.key.clone(),
        chords,
    }
}
