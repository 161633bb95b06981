//! Runtime song: sequences pattern rows onto the channels.
//!
//! A [`Song`] is built from validated [`SongData`] on the control side and
//! then owned by the engine. Each call to [`Song::sample`] produces one
//! output sample. Rows are dispatched every `samples_per_row` samples.

use alloc::sync::Arc;
use alloc::vec::Vec;
use ct_ir::{Instrument, Pattern, SongData, SongError, VOLUME_MAX};

use crate::channel::Channel;
use crate::message::{EventSink, Notification};
use crate::waveform::Sampleable;

/// Transport state of a loaded song.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    Paused,
    Playing,
    /// Ran past the last pattern. Cursors are back at the start.
    Ended,
}

/// Pattern and row the sequencer will dispatch next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    pub pattern: usize,
    pub row: usize,
}

/// A playable song.
#[derive(Clone, Debug)]
pub struct Song {
    instruments: Vec<Arc<Instrument>>,
    patterns: Vec<Pattern>,
    samples_per_row: u32,
    ticks_per_beat: u32,
    pattern_index: usize,
    row_index: usize,
    /// Samples into the current row; always below `samples_per_row`.
    sample_index: u32,
    state: PlayState,
}

impl Song {
    /// Validate `data` and build a paused song positioned at its start.
    pub fn from_data(data: &SongData) -> Result<Self, SongError> {
        data.validate()?;
        let song = Self {
            instruments: data.instruments.iter().cloned().map(Arc::new).collect(),
            patterns: data.patterns.clone(),
            samples_per_row: data.samples_per_row(),
            ticks_per_beat: data.tpb,
            pattern_index: 0,
            row_index: 0,
            sample_index: 0,
            state: PlayState::Paused,
        };
        tracing::debug!(
            patterns = song.patterns.len(),
            instruments = song.instruments.len(),
            samples_per_row = song.samples_per_row,
            "song loaded"
        );
        Ok(song)
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            pattern: self.pattern_index,
            row: self.row_index,
        }
    }

    pub fn samples_per_row(&self) -> u32 {
        self.samples_per_row
    }

    pub fn ticks_per_beat(&self) -> u32 {
        self.ticks_per_beat
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn instruments(&self) -> &[Arc<Instrument>] {
        &self.instruments
    }

    /// Start or resume playback from the current position.
    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    /// Stop advancing and release every sounding note. Does nothing unless
    /// playing.
    pub fn pause(&mut self, channels: &mut [Channel]) {
        if self.state != PlayState::Playing {
            return;
        }
        self.state = PlayState::Paused;
        for channel in channels {
            channel.note_end();
        }
    }

    /// Rewind to the start, silence all channels and report the end of the
    /// song. Does nothing unless playing.
    pub fn end<S: EventSink + ?Sized>(&mut self, channels: &mut [Channel], sink: &mut S) {
        if self.state != PlayState::Playing {
            return;
        }
        self.state = PlayState::Ended;
        self.pattern_index = 0;
        self.row_index = 0;
        self.sample_index = 0;
        sink.notify(Notification::SongEnded);
        for channel in channels {
            channel.reset();
        }
    }

    /// Render one sample: dispatch a row if one is due, then mix the
    /// channels. Silent unless playing.
    pub fn sample<S: EventSink + ?Sized>(&mut self, channels: &mut [Channel], sink: &mut S) -> f32 {
        if self.state != PlayState::Playing {
            return 0.0;
        }
        if self.sample_index == 0 {
            self.play_row(channels, sink);
        }
        if self.state == PlayState::Playing {
            self.sample_index = (self.sample_index + 1) % self.samples_per_row;
        }
        channels.iter_mut().map(|channel| channel.sample()).sum()
    }

    fn play_row<S: EventSink + ?Sized>(&mut self, channels: &mut [Channel], sink: &mut S) {
        let rows = self.patterns.get(self.pattern_index).map_or(0, Pattern::rows);
        if self.row_index >= rows {
            self.pattern_index += 1;
            self.row_index = 0;
        }
        let Some(pattern) = self.patterns.get(self.pattern_index) else {
            self.end(channels, sink);
            return;
        };

        sink.notify(Notification::RowAdvanced {
            pattern_id: self.pattern_index,
            row: self.row_index,
        });

        for (channel, &cell) in channels.iter_mut().zip(pattern.row(self.row_index)) {
            if cell.is_empty() {
                continue;
            }
            if let Some(volume) = cell.volume() {
                channel.volume_set(volume as f32 / VOLUME_MAX as f32);
            }
            if cell.is_note_stop() {
                channel.note_end();
                continue;
            }
            let instrument = cell
                .instrument()
                .and_then(|index| self.instruments.get(index as usize));
            if let (Some(note), Some(instrument)) = (cell.note(), instrument) {
                channel.note_play(note, Arc::clone(instrument));
            }
        }
        self.row_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::default_channels;
    use alloc::vec;
    use ct_ir::{Cell, NOTE_STOP};

    fn song(bps: f64, patterns: Vec<Pattern>) -> Song {
        let data = SongData {
            bps,
            patterns,
            ..SongData::default()
        };
        Song::from_data(&data).unwrap()
    }

    fn note_cell(note: u8, instrument: u8) -> Cell {
        Cell::encode(Some(note), Some(instrument), None, None)
    }

    #[test]
    fn tempo_sets_samples_per_row() {
        let s = song(4.0, vec![Pattern::new(1)]);
        assert_eq!(s.samples_per_row(), 4000);
        assert_eq!(s.ticks_per_beat(), ct_ir::TPB_DEFAULT);
        assert_eq!(s.state(), PlayState::Paused);
    }

    #[test]
    fn invalid_data_is_rejected() {
        let data = SongData {
            bps: 0.0,
            ..SongData::default()
        };
        assert_eq!(Song::from_data(&data).unwrap_err(), SongError::InvalidTempo(0.0));
    }

    #[test]
    fn paused_song_is_silent_and_still() {
        let mut s = song(8.0, vec![Pattern::new(4)]);
        let mut channels = default_channels();
        let mut sink = Vec::new();
        for _ in 0..5000 {
            assert_eq!(s.sample(&mut channels, &mut sink), 0.0);
        }
        assert!(sink.is_empty());
        assert_eq!(s.position(), PlaybackPosition::default());
    }

    #[test]
    fn rows_dispatch_on_row_boundaries() {
        let mut s = song(4.0, vec![Pattern::new(3)]);
        let mut channels = default_channels();
        s.play();

        let mut seen = Vec::new();
        for index in 0..13_000u32 {
            let mut sink = Vec::new();
            s.sample(&mut channels, &mut sink);
            seen.extend(sink.into_iter().map(|n| (index, n)));
        }
        assert_eq!(
            seen,
            [
                (0, Notification::RowAdvanced { pattern_id: 0, row: 0 }),
                (4000, Notification::RowAdvanced { pattern_id: 0, row: 1 }),
                (8000, Notification::RowAdvanced { pattern_id: 0, row: 2 }),
                (12_000, Notification::SongEnded),
            ]
        );
        assert_eq!(s.state(), PlayState::Ended);
    }

    #[test]
    fn row_counter_stays_within_the_row() {
        let mut s = song(3.0, vec![Pattern::new(4)]);
        let spr = s.samples_per_row();
        assert_eq!(spr, 5333);
        let mut channels = default_channels();
        s.play();

        let mut rows = Vec::new();
        for index in 0..3 * spr {
            let mut sink = Vec::new();
            s.sample(&mut channels, &mut sink);
            assert!(s.sample_index < spr);
            rows.extend(sink.into_iter().map(|_| index));
        }
        assert_eq!(rows, [0, spr, 2 * spr]);
        assert_eq!(s.sample_index, 0);
        assert_eq!(s.position(), PlaybackPosition { pattern: 0, row: 3 });
    }

    #[test]
    fn one_row_song_ends_after_one_row_of_samples() {
        let mut pattern = Pattern::new(1);
        pattern.set_cell(0, 0, Cell::encode(Some(NOTE_STOP), None, None, None));
        let mut s = song(8.0, vec![pattern]);
        let mut channels = default_channels();
        let mut sink = Vec::new();
        s.play();

        for _ in 0..s.samples_per_row() {
            s.sample(&mut channels, &mut sink);
        }
        assert_eq!(sink, [Notification::RowAdvanced { pattern_id: 0, row: 0 }]);

        s.sample(&mut channels, &mut sink);
        assert_eq!(sink.last(), Some(&Notification::SongEnded));
        assert_eq!(s.state(), PlayState::Ended);
    }

    #[test]
    fn patterns_play_back_to_back() {
        let mut s = song(16_000.0, vec![Pattern::new(1), Pattern::new(2)]);
        let mut channels = default_channels();
        let mut sink = Vec::new();
        s.play();
        for _ in 0..4 {
            s.sample(&mut channels, &mut sink);
        }
        assert_eq!(
            sink,
            [
                Notification::RowAdvanced { pattern_id: 0, row: 0 },
                Notification::RowAdvanced { pattern_id: 1, row: 0 },
                Notification::RowAdvanced { pattern_id: 1, row: 1 },
                Notification::SongEnded,
            ]
        );
    }

    #[test]
    fn note_cell_starts_a_note() {
        let mut pattern = Pattern::new(2);
        pattern.set_cell(0, 2, note_cell(24, 0));
        let mut s = song(8.0, vec![pattern]);
        let mut channels = default_channels();
        s.play();
        s.sample(&mut channels, &mut ());
        assert!(channels[2].is_active());
        assert!(!channels[0].is_active());
    }

    #[test]
    fn missing_instrument_is_ignored() {
        let mut pattern = Pattern::new(1);
        pattern.set_cell(0, 0, note_cell(12, 5));
        pattern.set_cell(0, 1, Cell::encode(Some(12), None, None, None));
        let mut s = song(8.0, vec![pattern]);
        let mut channels = default_channels();
        s.play();
        s.sample(&mut channels, &mut ());
        assert!(!channels[0].is_active());
        assert!(!channels[1].is_active());
    }

    #[test]
    fn volume_scales_to_unit_range() {
        let mut pattern = Pattern::new(1);
        pattern.set_cell(0, 3, Cell::encode(None, None, Some(21), None));
        pattern.set_cell(0, 4, Cell::encode(None, None, Some(0), None));
        let mut s = song(8.0, vec![pattern]);
        let mut channels = default_channels();
        s.play();
        s.sample(&mut channels, &mut ());
        assert!((channels[3].volume() - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(channels[4].volume(), 0.0);
        assert_eq!(channels[0].volume(), 1.0);
    }

    #[test]
    fn note_stop_releases_the_channel() {
        let mut data = SongData::default();
        data.instruments[0] = Instrument::from_breakpoints(&[(1.0, 0), (1.0, 10), (0.0, 10)])
            .with_sustain(1);
        let mut pattern = Pattern::new(2);
        pattern.set_cell(0, 0, note_cell(12, 0));
        pattern.set_cell(1, 0, Cell::encode(Some(NOTE_STOP), Some(0), Some(10), None));
        data.patterns = vec![pattern];
        data.bps = 16_000.0;

        let mut s = Song::from_data(&data).unwrap();
        let mut channels = default_channels();
        s.play();
        s.sample(&mut channels, &mut ());
        assert!(channels[0].note().is_some_and(|n| !n.is_released()));
        s.sample(&mut channels, &mut ());
        assert!(channels[0].note().is_some_and(|n| n.is_released()));
        // Volume still applies on a stop cell.
        assert!((channels[0].volume() - 10.0 / 63.0).abs() < 1e-6);
    }

    #[test]
    fn pause_releases_notes_and_holds_position() {
        let mut data = SongData::default();
        data.instruments[0] = Instrument::from_breakpoints(&[(1.0, 0), (1.0, 10), (0.0, 10)])
            .with_sustain(1);
        let mut pattern = Pattern::new(4);
        pattern.set_cell(0, 1, note_cell(7, 0));
        data.patterns = vec![pattern];
        let mut s = Song::from_data(&data).unwrap();
        let mut channels = default_channels();
        let mut sink = Vec::new();

        s.pause(&mut channels); // not playing: no-op
        assert_eq!(s.state(), PlayState::Paused);

        s.play();
        for _ in 0..10 {
            s.sample(&mut channels, &mut sink);
        }
        s.pause(&mut channels);
        assert_eq!(s.state(), PlayState::Paused);
        assert!(channels[1].note().is_some_and(|n| n.is_released()));
        assert_eq!(s.position(), PlaybackPosition { pattern: 0, row: 1 });

        // Resuming mid-row does not re-dispatch the row.
        s.play();
        s.sample(&mut channels, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn end_rewinds_and_silences() {
        let mut pattern = Pattern::new(1);
        pattern.set_cell(0, 0, note_cell(12, 0));
        let mut s = song(8.0, vec![pattern]);
        let mut channels = default_channels();
        let mut sink = Vec::new();

        s.end(&mut channels, &mut sink); // not playing: no-op
        assert!(sink.is_empty());

        s.play();
        s.sample(&mut channels, &mut sink);
        assert!(channels[0].is_active());
        s.end(&mut channels, &mut sink);
        assert_eq!(sink.last(), Some(&Notification::SongEnded));
        assert!(channels.iter().all(|c| !c.is_active()));
        assert_eq!(s.position(), PlaybackPosition::default());

        // Replay dispatches row 0 on the very next sample.
        sink.clear();
        s.play();
        s.sample(&mut channels, &mut sink);
        assert_eq!(sink, [Notification::RowAdvanced { pattern_id: 0, row: 0 }]);
    }

    #[test]
    fn output_is_the_channel_sum() {
        let mut pattern = Pattern::new(1);
        pattern.set_cell(0, 0, note_cell(0, 0));
        pattern.set_cell(0, 1, note_cell(0, 0));
        let mut s = song(8.0, vec![pattern]);
        let mut channels = default_channels();
        s.play();
        // The default instrument decays from 1.0 over 1000 samples and both
        // squares begin in their low half.
        let out = s.sample(&mut channels, &mut ());
        assert!((out + 2.0 * 0.999).abs() < 1e-5, "{out}");
    }
}
