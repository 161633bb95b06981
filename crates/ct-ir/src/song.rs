//! Song payload: instruments, tempo and the ordered pattern list.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::Instrument;
use crate::pattern::Pattern;
use crate::{BPS_DEFAULT, CHANNEL_COUNT, INSTRUMENTS_MAX, PATTERNS_MAX, SAMPLE_RATE, TPB_DEFAULT};

/// Why a song payload cannot be played.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SongError {
    #[error("rows per second must be finite and positive, got {0}")]
    InvalidTempo(f64),
    #[error("rows per second {0} leaves no samples per row at {rate} Hz", rate = SAMPLE_RATE)]
    TempoTooFast(f64),
    #[error("song has {0} patterns, at most {max} allowed", max = PATTERNS_MAX)]
    TooManyPatterns(usize),
    #[error("song has {0} instruments, at most {max} allowed", max = INSTRUMENTS_MAX)]
    TooManyInstruments(usize),
    #[error("pattern {pattern} has {cells} cells, expected a positive multiple of {width}", width = CHANNEL_COUNT)]
    PatternShape { pattern: usize, cells: usize },
    #[error("instrument {instrument} has an empty envelope")]
    EmptyEnvelope { instrument: usize },
    #[error("instrument {instrument} has {volumes} envelope levels but {durations} durations")]
    EnvelopeLengthMismatch { instrument: usize, volumes: usize, durations: usize },
    #[error("instrument {instrument} breakpoint {breakpoint} level {level} is outside 0.0..=1.0")]
    EnvelopeLevel { instrument: usize, breakpoint: usize, level: f32 },
    #[error("instrument {instrument} sustain index {sustain} is past its {len} breakpoints")]
    SustainOutOfRange { instrument: usize, sustain: u16, len: usize },
    #[error("instrument {instrument} loop {start}..{end} does not fit its {len} breakpoints")]
    LoopOutOfRange { instrument: usize, start: u16, end: u16, len: usize },
    #[error("instrument {instrument} sets only one end of its loop")]
    LoopIncomplete { instrument: usize },
}

/// Everything the engine needs to play a song.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongData {
    pub instruments: Vec<Instrument>,
    /// Rows per second.
    #[serde(default = "default_bps")]
    pub bps: f64,
    /// Ticks per beat. Carried for effect timing; plain playback ignores it.
    #[serde(default = "default_tpb")]
    pub tpb: u32,
    /// Patterns, played back to back.
    pub patterns: Vec<Pattern>,
}

fn default_bps() -> f64 {
    BPS_DEFAULT
}

fn default_tpb() -> u32 {
    TPB_DEFAULT
}

impl Default for SongData {
    fn default() -> Self {
        Self {
            instruments: alloc::vec![Instrument::default()],
            bps: BPS_DEFAULT,
            tpb: TPB_DEFAULT,
            patterns: alloc::vec![Pattern::default()],
        }
    }
}

impl SongData {
    /// Samples between row dispatches, `floor(SAMPLE_RATE / bps)`.
    ///
    /// Only meaningful for a validated song.
    pub fn samples_per_row(&self) -> u32 {
        (SAMPLE_RATE as f64 / self.bps) as u32
    }

    /// Fail fast on anything that would turn into silent corruption at
    /// playback time.
    pub fn validate(&self) -> Result<(), SongError> {
        if !self.bps.is_finite() || self.bps <= 0.0 {
            return Err(SongError::InvalidTempo(self.bps));
        }
        if self.samples_per_row() == 0 {
            return Err(SongError::TempoTooFast(self.bps));
        }
        if self.patterns.len() > PATTERNS_MAX {
            return Err(SongError::TooManyPatterns(self.patterns.len()));
        }
        if self.instruments.len() > INSTRUMENTS_MAX {
            return Err(SongError::TooManyInstruments(self.instruments.len()));
        }
        for (index, pattern) in self.patterns.iter().enumerate() {
            let cells = pattern.cells().len();
            if cells == 0 || cells % CHANNEL_COUNT != 0 {
                return Err(SongError::PatternShape { pattern: index, cells });
            }
        }
        for (index, instrument) in self.instruments.iter().enumerate() {
            instrument.validate(index)?;
        }
        Ok(())
    }

    /// Append a pattern (a fresh default one if `None`).
    ///
    /// Returns the new pattern's index, or `None` when the song is full.
    pub fn add_pattern(&mut self, pattern: Option<Pattern>) -> Option<usize> {
        if self.patterns.len() >= PATTERNS_MAX {
            return None;
        }
        self.patterns.push(pattern.unwrap_or_default());
        Some(self.patterns.len() - 1)
    }

    /// Remove a pattern, keeping at least one in the list.
    ///
    /// Returns the index of the pattern that should be selected next.
    pub fn remove_pattern(&mut self, index: usize) -> usize {
        if index < self.patterns.len() {
            self.patterns.remove(index);
        }
        if self.patterns.is_empty() {
            self.patterns.push(Pattern::default());
            return 0;
        }
        index.min(self.patterns.len() - 1)
    }
}
