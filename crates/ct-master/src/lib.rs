//! Headless controller for chiptrack.
//!
//! Owns the control side of the engine: validates and ships songs to the
//! audio context, relays transport commands, collects notifications, and
//! renders songs offline.

mod processor;
mod wav;

use std::path::Path;

use ct_audio::{AudioError, AudioOutput, CpalOutput};
use ct_engine::{Command, Engine, EventSink};
use ringbuf::traits::{Consumer, Producer};
use thiserror::Error;

// Re-export common types so callers don't need ct-engine directly.
pub use ct_engine::{Notification, PlayState, PlaybackPosition, Song};
pub use ct_ir::{SongData, SongError, SAMPLE_RATE};

pub use processor::{link, NotificationQueue, Processor, ProcessorLink};
pub use wav::{samples_to_wav, write_wav};

/// Error type for controller operations.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("command queue is full")]
    CommandQueueFull,
    #[error("song is not playable: {0}")]
    InvalidSong(#[from] SongError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("audio output is already running")]
    OutputRunning,
    #[error("WAV output failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Queue sizes for the control/audio link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    pub command_capacity: usize,
    /// Room for notifications between polls. At fast tempos rows arrive
    /// every few milliseconds.
    pub notification_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            notification_capacity: 1024,
        }
    }
}

/// Headless tracker controller.
pub struct Controller {
    link: ProcessorLink,
    /// Held until [`Controller::start_output`] moves it into the stream.
    processor: Option<Processor>,
    output: Option<CpalOutput>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let (link, processor) = processor::link(&config);
        Self {
            link,
            processor: Some(processor),
            output: None,
        }
    }

    // --- Commands ---

    /// Validate `song` here, on the control thread, then queue it.
    pub fn load_song(&mut self, song: &SongData) -> Result<(), ControlError> {
        let song = Song::from_data(song)?;
        tracing::info!(
            patterns = song.patterns().len(),
            samples_per_row = song.samples_per_row(),
            "queueing song"
        );
        self.send(Command::LoadSong(Box::new(song)))
    }

    pub fn play(&mut self) -> Result<(), ControlError> {
        self.send(Command::Play)
    }

    pub fn stop(&mut self) -> Result<(), ControlError> {
        self.send(Command::Stop)
    }

    fn send(&mut self, command: Command) -> Result<(), ControlError> {
        match &command {
            // A song's Debug output is its entire pattern and envelope data.
            Command::LoadSong(song) => tracing::debug!(
                patterns = song.patterns().len(),
                instruments = song.instruments().len(),
                samples_per_row = song.samples_per_row(),
                "sending load-song"
            ),
            other => tracing::debug!(command = ?other, "sending command"),
        }
        self.link.commands.try_push(command).map_err(|_| {
            tracing::warn!("command queue full");
            ControlError::CommandQueueFull
        })
    }

    /// Collect notifications raised since the last poll, and free any songs
    /// the audio context has let go of.
    pub fn poll_notifications(&mut self) -> Vec<Notification> {
        let retired = self.link.retired.pop_iter().count();
        if retired > 0 {
            tracing::debug!(retired, "freed displaced songs");
        }
        let notifications: Vec<Notification> = self.link.notifications.pop_iter().collect();
        for notification in &notifications {
            tracing::trace!(?notification, "notification");
        }
        notifications
    }

    // --- Real-time output ---

    /// Open the default device and hand the processor to its callback.
    pub fn start_output(&mut self) -> Result<(), ControlError> {
        if self.processor.is_none() {
            return Err(ControlError::OutputRunning);
        }
        let mut output = CpalOutput::new(SAMPLE_RATE)?;
        let Some(mut processor) = self.processor.take() else {
            return Err(ControlError::OutputRunning);
        };
        output.build_stream(move |buffer| processor.process(buffer))?;
        self.output = Some(output);
        Ok(())
    }

    pub fn is_output_running(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.is_running())
    }

    /// Run one buffer fill on the calling thread. Only possible before
    /// [`Controller::start_output`]; useful for driving the engine without
    /// an audio device.
    pub fn process_block(&mut self, out: &mut [f32]) -> Result<(), ControlError> {
        let processor = self.processor.as_mut().ok_or(ControlError::OutputRunning)?;
        processor.process(out);
        Ok(())
    }

    // --- Offline rendering ---

    /// Render `song` from the start until it ends or `max_samples` have
    /// been produced. Runs on a private engine, independent of the link.
    pub fn render_frames(song: &SongData, max_samples: usize) -> Result<Vec<f32>, ControlError> {
        let mut engine = Engine::new();
        engine.handle_command(Command::LoadSong(Box::new(Song::from_data(song)?)));
        engine.handle_command(Command::Play);

        let mut watch = EndWatch::default();
        let mut samples = Vec::with_capacity(max_samples.min(SAMPLE_RATE as usize * 60));
        while samples.len() < max_samples {
            let sample = engine.render_sample(&mut watch);
            if watch.ended {
                break;
            }
            samples.push(sample);
        }
        tracing::debug!(samples = samples.len(), ended = watch.ended, "offline render finished");
        Ok(samples)
    }

    /// Render offline and write a 16-bit mono WAV file. Returns the number
    /// of samples written.
    pub fn render_to_wav(
        song: &SongData,
        max_samples: usize,
        path: impl AsRef<Path>,
    ) -> Result<usize, ControlError> {
        let samples = Self::render_frames(song, max_samples)?;
        let path = path.as_ref();
        let file = std::io::BufWriter::new(std::fs::File::create(path).map_err(hound::Error::IoError)?);
        wav::write_wav(file, &samples)?;
        tracing::info!(path = %path.display(), samples = samples.len(), "wrote WAV");
        Ok(samples.len())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

/// Notices the end of the song during offline rendering.
#[derive(Default)]
struct EndWatch {
    ended: bool,
}

impl EventSink for EndWatch {
    fn notify(&mut self, notification: Notification) {
        if notification == Notification::SongEnded {
            self.ended = true;
        }
    }
}
