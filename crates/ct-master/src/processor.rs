//! The audio-side half of the control/audio split.
//!
//! [`link`] builds a [`Processor`], owned by the audio callback, and a
//! [`ProcessorLink`], owned by the control thread. They share nothing but
//! three single-producer single-consumer rings: commands in, notifications
//! out, and displaced songs out so the audio thread never frees one.

use ct_engine::{Command, Engine, EventSink, Notification, Song};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::ControllerConfig;

/// Displaced songs in flight back to the control thread. Loads are rare, so
/// a handful of slots is plenty.
const RETIRED_CAPACITY: usize = 8;

/// Notification producer that drops on overflow instead of blocking.
pub struct NotificationQueue(HeapProd<Notification>);

impl EventSink for NotificationQueue {
    fn notify(&mut self, notification: Notification) {
        let _ = self.0.try_push(notification);
    }
}

/// Audio-context state: the engine plus its ends of the rings.
pub struct Processor {
    engine: Engine,
    commands: HeapCons<Command>,
    notifications: NotificationQueue,
    retired: HeapProd<Box<Song>>,
}

/// Control-context ends of the rings.
pub struct ProcessorLink {
    pub commands: HeapProd<Command>,
    pub notifications: HeapCons<Notification>,
    pub retired: HeapCons<Box<Song>>,
}

/// Create a linked processor pair. The processor announces itself with
/// [`Notification::Ready`].
pub fn link(config: &ControllerConfig) -> (ProcessorLink, Processor) {
    let (command_tx, command_rx) = HeapRb::<Command>::new(config.command_capacity.max(1)).split();
    let (notify_tx, notify_rx) =
        HeapRb::<Notification>::new(config.notification_capacity.max(1)).split();
    let (retired_tx, retired_rx) = HeapRb::<Box<Song>>::new(RETIRED_CAPACITY).split();

    let mut processor = Processor {
        engine: Engine::new(),
        commands: command_rx,
        notifications: NotificationQueue(notify_tx),
        retired: retired_tx,
    };
    processor.notifications.notify(Notification::Ready);

    let link = ProcessorLink {
        commands: command_tx,
        notifications: notify_rx,
        retired: retired_rx,
    };
    (link, processor)
}

impl Processor {
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// One buffer fill: apply pending commands, then render `out`.
    pub fn process(&mut self, out: &mut [f32]) {
        while let Some(command) = self.commands.try_pop() {
            if let Some(previous) = self.engine.handle_command(command) {
                // Ring full: the song is freed here instead.
                drop(self.retired.try_push(previous));
            }
        }
        self.render(out);
    }

    #[cfg(feature = "alloc_check")]
    fn render(&mut self, out: &mut [f32]) {
        let Self { engine, notifications, .. } = self;
        assert_no_alloc::assert_no_alloc(|| engine.render(out, notifications));
    }

    #[cfg(not(feature = "alloc_check"))]
    fn render(&mut self, out: &mut [f32]) {
        self.engine.render(out, &mut self.notifications);
    }
}
