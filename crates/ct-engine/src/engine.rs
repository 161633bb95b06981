//! Audio-context engine state.

use alloc::boxed::Box;
use ct_ir::CHANNEL_COUNT;

use crate::channel::Channel;
use crate::message::{Command, EventSink};
use crate::song::Song;
use crate::waveform::WaveKind;

/// Oscillator assigned to each channel, in channel order.
pub const CHANNEL_LAYOUT: [WaveKind; CHANNEL_COUNT] = [
    WaveKind::Square,
    WaveKind::Square,
    WaveKind::Saw,
    WaveKind::Triangle,
    WaveKind::Noise,
];

/// A fresh, silent set of channels in the standard layout.
pub fn default_channels() -> [Channel; CHANNEL_COUNT] {
    CHANNEL_LAYOUT.map(Channel::new)
}

/// Everything the audio callback owns: the channels and the loaded song.
///
/// Nothing here allocates or frees once constructed; songs arrive boxed
/// through [`Command::LoadSong`] and leave through the return value of
/// [`Engine::handle_command`].
#[derive(Debug)]
pub struct Engine {
    channels: [Channel; CHANNEL_COUNT],
    song: Option<Box<Song>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            channels: default_channels(),
            song: None,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_deref()
    }

    /// Apply a command. Returns the song a `LoadSong` displaced so the
    /// caller can free it somewhere allocation is allowed.
    pub fn handle_command(&mut self, command: Command) -> Option<Box<Song>> {
        match command {
            Command::LoadSong(song) => {
                for channel in &mut self.channels {
                    channel.reset();
                }
                self.song.replace(song)
            }
            Command::Play => {
                if let Some(song) = &mut self.song {
                    song.play();
                }
                None
            }
            Command::Stop => {
                if let Some(song) = &mut self.song {
                    song.pause(&mut self.channels);
                }
                None
            }
        }
    }

    /// Render one sample. Silent with no song loaded.
    pub fn render_sample<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> f32 {
        match &mut self.song {
            Some(song) => song.sample(&mut self.channels, sink),
            None => 0.0,
        }
    }

    /// Fill `out` with consecutive samples.
    pub fn render<S: EventSink + ?Sized>(&mut self, out: &mut [f32], sink: &mut S) {
        for sample in out.iter_mut() {
            *sample = self.render_sample(sink);
        }
    }
}
