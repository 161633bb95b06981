//! Core data model for chiptrack.
//!
//! Defines the packed pattern cell, patterns, instrument envelopes and the
//! song payload the engine plays. The pattern editor writes these types and
//! the playback engine only reads them.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod cell;
mod instrument;
mod pattern;
mod song;

pub use cell::{Cell, CellFields, NOTE_STOP, VOLUME_MAX};
pub use instrument::{Instrument, LoopRange};
pub use pattern::Pattern;
pub use song::{SongData, SongError};

/// Output sample rate of the engine, in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of voices, and so of cells per pattern row.
pub const CHANNEL_COUNT: usize = 5;

/// The channel driven by the noise generator.
pub const CHANNEL_NOISE: usize = 4;

/// Most patterns a song can hold.
pub const PATTERNS_MAX: usize = 16;

/// Most instruments a song can hold (the cell instrument field is 4 bits).
pub const INSTRUMENTS_MAX: usize = cell::INSTRUMENT_MAX as usize + 1;

/// Highest note the noise channel accepts.
pub const NOTE_NOISE_MAX: u8 = 0b1111;

/// Rows in a freshly created pattern.
pub const DEFAULT_ROWS: usize = 32;

/// Default rows per second.
pub const BPS_DEFAULT: f64 = 8.0;

/// Default ticks per beat.
pub const TPB_DEFAULT: u32 = 4;
