//! Messages crossing the boundary between the control and audio contexts.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::song::Song;

/// Sent from the control context to the engine.
#[derive(Debug)]
pub enum Command {
    /// Replace the current song. The engine hands the previous one back.
    LoadSong(Box<Song>),
    /// Start or resume playback of the loaded song.
    Play,
    /// Pause playback, releasing every sounding note.
    Stop,
}

/// Sent from the engine back to the control context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// The processor is up and accepting commands.
    Ready,
    /// A row is about to sound.
    RowAdvanced { pattern_id: usize, row: usize },
    /// Playback ran past the last pattern.
    SongEnded,
}

/// Receiver for notifications raised while rendering.
///
/// Implementations called from the audio context must not block or
/// allocate.
pub trait EventSink {
    fn notify(&mut self, notification: Notification);
}

/// Collects notifications; handy for offline rendering and tests.
impl EventSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Discards notifications.
impl EventSink for () {
    fn notify(&mut self, _notification: Notification) {}
}
