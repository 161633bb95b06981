//! Playback engine for chiptrack.
//!
//! Turns a song into a mono sample stream: oscillators shaped by note
//! envelopes, sequenced row by row across five fixed channels.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod engine;
pub mod frequency;
mod message;
mod note;
mod song;
pub mod waveform;

pub use channel::Channel;
pub use engine::{default_channels, Engine, CHANNEL_LAYOUT};
pub use frequency::{note_to_frequency, BASE_FREQUENCY};
pub use message::{Command, EventSink, Notification};
pub use note::Note;
pub use song::{PlayState, PlaybackPosition, Song};
pub use waveform::{Oscillator, Sampleable, WaveKind, Waveform};
