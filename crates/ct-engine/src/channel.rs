//! Channel state for tracker playback.

use alloc::sync::Arc;
use ct_ir::Instrument;

use crate::note::Note;
use crate::waveform::{Oscillator, Sampleable, WaveKind, Waveform};

/// One voice: a fixed oscillator and at most one sounding note.
#[derive(Clone, Debug)]
pub struct Channel {
    oscillator: Oscillator,
    note: Option<Note>,
    /// Post-envelope gain, 0.0 to 1.0.
    volume: f32,
}

impl Channel {
    /// Create a silent channel around an oscillator of the given kind.
    pub fn new(kind: WaveKind) -> Self {
        Self {
            oscillator: Oscillator::new(kind),
            note: None,
            volume: 1.0,
        }
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// Mutable access for tuning outside of pattern playback (duty changes,
    /// previews).
    pub fn oscillator_mut(&mut self) -> &mut Oscillator {
        &mut self.oscillator
    }

    pub fn note(&self) -> Option<&Note> {
        self.note.as_ref()
    }

    /// Is a note currently sounding?
    pub fn is_active(&self) -> bool {
        self.note.is_some()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Retune and start a fresh note. Any previous note is dropped outright,
    /// not released.
    pub fn note_play(&mut self, note: u8, instrument: Arc<Instrument>) {
        self.oscillator.note_set(note);
        self.note = Some(Note::new(instrument));
    }

    /// Release the sounding note, if any.
    pub fn note_end(&mut self) {
        if let Some(note) = &mut self.note {
            note.cut();
        }
    }

    pub fn volume_set(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Silence the channel. The oscillator keeps its phase.
    pub fn reset(&mut self) {
        self.note = None;
    }
}

impl Sampleable for Channel {
    fn sample(&mut self) -> f32 {
        let Some(note) = &mut self.note else {
            return 0.0;
        };
        let Some(envelope) = note.sample() else {
            self.note = None;
            return 0.0;
        };
        self.oscillator.sample() * self.volume * envelope
    }
}
