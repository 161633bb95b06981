//! Pattern grid: rows of cells across the fixed channel set.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, NOTE_STOP, NOTE_WIDTH, VOLUME_MAX};
use crate::{CHANNEL_COUNT, CHANNEL_NOISE, DEFAULT_ROWS, NOTE_NOISE_MAX};

/// A pattern of `rows × CHANNEL_COUNT` cells.
///
/// Stored row-major: `cells[row * CHANNEL_COUNT + channel]`. Serialized as the
/// bare cell array, which is the shape the song payload carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    cells: Vec<Cell>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS)
    }
}

impl Pattern {
    /// Create a pattern of empty cells. A zero row count is raised to one.
    pub fn new(rows: usize) -> Self {
        Self {
            cells: alloc::vec![Cell::EMPTY; rows.max(1) * CHANNEL_COUNT],
        }
    }

    /// Build a pattern from a raw row-major cell array.
    ///
    /// The array is taken as-is; `SongData::validate` rejects arrays whose
    /// length is not a positive multiple of the channel count.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.cells.len() / CHANNEL_COUNT
    }

    /// Raw row-major cell array.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Read a cell. Out-of-range positions read as empty.
    pub fn cell(&self, row: usize, channel: usize) -> Cell {
        if channel >= CHANNEL_COUNT {
            return Cell::EMPTY;
        }
        self.cells
            .get(row * CHANNEL_COUNT + channel)
            .copied()
            .unwrap_or(Cell::EMPTY)
    }

    /// Overwrite a cell. Out-of-range positions are ignored.
    pub fn set_cell(&mut self, row: usize, channel: usize, cell: Cell) {
        if channel >= CHANNEL_COUNT {
            return;
        }
        if let Some(slot) = self.cells.get_mut(row * CHANNEL_COUNT + channel) {
            *slot = cell;
        }
    }

    /// All cells of one row (empty slice past the end).
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * CHANNEL_COUNT;
        self.cells.get(start..start + CHANNEL_COUNT).unwrap_or(&[])
    }

    /// Resize to `rows` (at least one). Existing cells are kept, new rows
    /// are empty. Returns the new row count.
    pub fn set_len(&mut self, rows: usize) -> usize {
        self.cells.resize(rows.max(1) * CHANNEL_COUNT, Cell::EMPTY);
        self.rows()
    }

    /// Grow or shrink by `delta` rows. Returns the new row count.
    pub fn adjust_len(&mut self, delta: isize) -> usize {
        let rows = self.rows().saturating_add_signed(delta);
        self.set_len(rows)
    }

    /// Write a note into a cell, the way the editor does.
    ///
    /// Notes on the noise channel are clamped to the noise range, a cell
    /// without an instrument picks up `default_instrument`, and the note-stop
    /// sentinel is written bare of those adjustments.
    pub fn edit_note(&mut self, row: usize, channel: usize, note: u8, default_instrument: u8) {
        let mut cell = self.cell(row, channel);
        let mut note = note & ((1 << NOTE_WIDTH) - 1);
        if note != NOTE_STOP {
            if channel == CHANNEL_NOISE {
                note = note.min(NOTE_NOISE_MAX);
            }
            if cell.instrument().is_none() {
                cell = cell.with_instrument(Some(default_instrument));
            }
        }
        self.set_cell(row, channel, cell.with_note(Some(note)));
    }

    /// Set or clear the instrument field of a cell.
    pub fn edit_instrument(&mut self, row: usize, channel: usize, instrument: Option<u8>) {
        let cell = self.cell(row, channel).with_instrument(instrument);
        self.set_cell(row, channel, cell);
    }

    /// Set the volume field of a cell, clamped to the field range.
    pub fn edit_volume(&mut self, row: usize, channel: usize, volume: i32) {
        let volume = volume.clamp(0, VOLUME_MAX as i32) as u8;
        let cell = self.cell(row, channel).with_volume(Some(volume));
        self.set_cell(row, channel, cell);
    }

    /// Set or clear the effect field of a cell.
    pub fn edit_effect(&mut self, row: usize, channel: usize, effect: Option<u16>) {
        let cell = self.cell(row, channel).with_effect(effect);
        self.set_cell(row, channel, cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_cell_access() {
        let mut pattern = Pattern::new(16);
        pattern.set_cell(10, 2, Cell::encode(Some(24), Some(0), None, None));

        assert_eq!(pattern.cell(10, 2).note(), Some(24));
        assert!(pattern.cell(10, 1).is_empty());
        assert!(pattern.cell(99, 0).is_empty());
        assert_eq!(pattern.row(10)[2].note(), Some(24));
    }

    #[test]
    fn resize_preserves_and_zero_fills() {
        let mut pattern = Pattern::new(2);
        pattern.set_cell(1, 4, Cell::encode(Some(3), None, None, None));

        assert_eq!(pattern.set_len(4), 4);
        assert_eq!(pattern.cell(1, 4).note(), Some(3));
        assert!(pattern.row(3).iter().all(|c| c.is_empty()));

        assert_eq!(pattern.adjust_len(-3), 1);
        assert_eq!(pattern.adjust_len(-5), 1);
    }

    #[test]
    fn edit_note_fills_instrument_and_clamps_noise() {
        let mut pattern = Pattern::new(4);
        pattern.edit_note(0, 0, 30, 2);
        assert_eq!(pattern.cell(0, 0).instrument(), Some(2));

        pattern.edit_note(0, CHANNEL_NOISE, 40, 1);
        assert_eq!(pattern.cell(0, CHANNEL_NOISE).note(), Some(NOTE_NOISE_MAX));

        pattern.edit_note(1, 1, NOTE_STOP, 5);
        assert!(pattern.cell(1, 1).is_note_stop());
        assert_eq!(pattern.cell(1, 1).instrument(), None);
    }

    #[test]
    fn edit_volume_clamps() {
        let mut pattern = Pattern::new(1);
        pattern.edit_volume(0, 3, 200);
        assert_eq!(pattern.cell(0, 3).volume(), Some(VOLUME_MAX));
        pattern.edit_volume(0, 3, -4);
        assert_eq!(pattern.cell(0, 3).volume(), Some(0));
    }
}
