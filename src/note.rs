//! Note accessors
//!
//! A voice only needs two facts about the note it plays: the current pitch
//! and how many frames of it have already been rendered. Hosts provide these
//! through [`NotePitch`].

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Read-only view of a playing note
pub trait NotePitch {
    /// Current frequency in Hz (may change between blocks, e.g. pitch bends)
    fn frequency(&self) -> f32;

    /// Number of frames already rendered for this note
    fn total_frames_played(&self) -> u64;
}

impl<T: NotePitch + ?Sized> NotePitch for &T {
    fn frequency(&self) -> f32 {
        (**self).frequency()
    }

    fn total_frames_played(&self) -> u64 {
        (**self).total_frames_played()
    }
}

impl<T: NotePitch + ?Sized> NotePitch for Arc<T> {
    fn frequency(&self) -> f32 {
        (**self).frequency()
    }

    fn total_frames_played(&self) -> u64 {
        (**self).total_frames_played()
    }
}

/// Note with a constant pitch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedPitch {
    frequency: f32,
}

impl FixedPitch {
    /// Create a note at `frequency` Hz
    pub fn new(frequency: f32) -> Self {
        Self { frequency }
    }
}

impl NotePitch for FixedPitch {
    fn frequency(&self) -> f32 {
        self.frequency
    }

    fn total_frames_played(&self) -> u64 {
        0
    }
}

/// Note whose pitch and progress are updated by the host while it plays
///
/// Frequency is stored as f32 bits in an atomic so a sequencer thread can bend
/// the pitch while the audio thread renders.
#[derive(Debug)]
pub struct SharedNote {
    frequency: AtomicU32,
    frames_played: AtomicU64,
}

impl SharedNote {
    /// Create a note at `frequency` Hz with no frames played
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: AtomicU32::new(frequency.to_bits()),
            frames_played: AtomicU64::new(0),
        }
    }

    /// Change the pitch
    pub fn set_frequency(&self, frequency: f32) {
        self.frequency.store(frequency.to_bits(), Ordering::Relaxed);
    }

    /// Record that `frames` more frames were rendered
    pub fn advance(&self, frames: u64) {
        self.frames_played.fetch_add(frames, Ordering::Relaxed);
    }
}

impl NotePitch for SharedNote {
    fn frequency(&self) -> f32 {
        f32::from_bits(self.frequency.load(Ordering::Relaxed))
    }

    fn total_frames_played(&self) -> u64 {
        self.frames_played.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_pitch() {
        let note = FixedPitch::new(440.0);
        assert_eq!(note.frequency(), 440.0);
        assert_eq!(note.total_frames_played(), 0);
    }

    #[test]
    fn test_shared_note_updates() {
        let note = Arc::new(SharedNote::new(220.0));
        let view = Arc::clone(&note);
        note.set_frequency(330.0);
        note.advance(128);
        note.advance(128);
        assert_eq!(view.frequency(), 330.0);
        assert_eq!(view.total_frames_played(), 256);
    }

    #[test]
    fn test_reference_forwards() {
        let note = SharedNote::new(110.0);
        let by_ref: &SharedNote = &note;
        assert_eq!(NotePitch::frequency(&by_ref), 110.0);
    }
}
