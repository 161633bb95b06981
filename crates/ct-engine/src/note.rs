//! Runtime envelope evaluator for a sounding note.

use alloc::sync::Arc;
use ct_ir::Instrument;

/// One sounding note: walks its instrument's volume envelope one sample at
/// a time.
#[derive(Clone, Debug)]
pub struct Note {
    instrument: Arc<Instrument>,
    /// Breakpoint currently being approached.
    breakpoint: usize,
    /// Samples left until the next breakpoint.
    remaining: u32,
    /// Current output level.
    volume: f32,
    /// Level of the breakpoint being approached.
    target: f32,
    /// Set by [`Note::cut`]; disables sustain and looping.
    released: bool,
}

impl Note {
    /// Start a note at the envelope's first level.
    pub fn new(instrument: Arc<Instrument>) -> Self {
        let target = instrument.level(0);
        Self {
            instrument,
            breakpoint: 0,
            remaining: 0,
            volume: target,
            target,
            released: false,
        }
    }

    pub fn instrument(&self) -> &Arc<Instrument> {
        &self.instrument
    }

    /// Index of the breakpoint being approached.
    pub fn breakpoint(&self) -> usize {
        self.breakpoint
    }

    /// Samples left until the next breakpoint.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Level the last call to [`Note::sample`] produced.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the note: sustain holds and loops stop applying, and the
    /// envelope runs on to its end.
    pub fn cut(&mut self) {
        self.released = true;
    }

    /// Advance one sample and return the envelope level, or `None` once the
    /// envelope has run past its last breakpoint.
    pub fn sample(&mut self) -> Option<f32> {
        let held = !self.released;

        if held && self.instrument.sustain.map(usize::from) == Some(self.breakpoint) {
            self.volume = self.instrument.level(self.breakpoint);
            return Some(self.volume);
        }

        if self.remaining == 0 {
            self.advance(held)?;
        } else {
            self.remaining -= 1;
        }

        if self.remaining > 0 {
            self.volume += (self.target - self.volume) / self.remaining as f32;
        } else {
            self.volume = self.target;
        }
        Some(self.volume)
    }

    /// Move to the next breakpoint, wrapping through the loop region while
    /// the note is held. Returns `None` past the end of the envelope; the end
    /// is checked before the wrap, so a loop ending at the envelope length
    /// never repeats.
    fn advance(&mut self, held: bool) -> Option<()> {
        self.breakpoint += 1;
        if self.breakpoint >= self.instrument.len() {
            return None;
        }
        if held {
            if let Some(range) = self.instrument.loop_range() {
                if self.breakpoint == range.end as usize {
                    self.breakpoint = range.start as usize;
                }
            }
        }
        self.volume = self.target;
        self.target = self.instrument.level(self.breakpoint);
        self.remaining = self.instrument.duration(self.breakpoint);
        Some(())
    }
}
