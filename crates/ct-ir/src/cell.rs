//! Packed 32-bit pattern cell.
//!
//! Layout, most significant bit first:
//!
//! ```text
//! N I V E  NNNNNN  IIII  VVVVVV  EEEEEEEEEEEE
//! flags    note    inst  volume  effect
//! ```
//!
//! Each field has its own presence flag, so an absent field is never
//! confused with a field holding zero.

use serde::{Deserialize, Serialize};

pub const FLAG_NOTE: u32 = 1 << 31;
pub const FLAG_INSTRUMENT: u32 = 1 << 30;
pub const FLAG_VOLUME: u32 = 1 << 29;
pub const FLAG_EFFECT: u32 = 1 << 28;

pub const NOTE_WIDTH: u32 = 6;
pub const NOTE_OFFSET: u32 = 22;
pub const INSTRUMENT_WIDTH: u32 = 4;
pub const INSTRUMENT_OFFSET: u32 = 18;
pub const VOLUME_WIDTH: u32 = 6;
pub const VOLUME_OFFSET: u32 = 12;
pub const EFFECT_WIDTH: u32 = 12;
pub const EFFECT_OFFSET: u32 = 0;

/// Largest value a note field can hold; reserved as the note-stop sentinel.
pub const NOTE_STOP: u8 = field_max(NOTE_WIDTH) as u8;
/// Largest value a volume field can hold (full volume).
pub const VOLUME_MAX: u8 = field_max(VOLUME_WIDTH) as u8;
/// Largest instrument index a cell can address.
pub const INSTRUMENT_MAX: u8 = field_max(INSTRUMENT_WIDTH) as u8;
/// Largest effect value a cell can hold.
pub const EFFECT_MAX: u16 = field_max(EFFECT_WIDTH) as u16;

const fn field_max(width: u32) -> u32 {
    (1 << width) - 1
}

/// Unpacked view of a cell. `None` means the field is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellFields {
    pub note: Option<u8>,
    pub instrument: Option<u8>,
    pub volume: Option<u8>,
    pub effect: Option<u16>,
}

/// One event at a row/channel intersection, packed into 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(u32);

impl Cell {
    /// The empty cell (no fields present).
    pub const EMPTY: Cell = Cell(0);

    /// Wrap raw packed bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw packed bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Pack the given fields. Values wider than their field are masked to
    /// the field width; callers clamp beforehand.
    pub const fn encode(
        note: Option<u8>,
        instrument: Option<u8>,
        volume: Option<u8>,
        effect: Option<u16>,
    ) -> Self {
        let mut bits = 0;
        if let Some(n) = note {
            bits |= FLAG_NOTE | pack(n as u32, NOTE_WIDTH, NOTE_OFFSET);
        }
        if let Some(i) = instrument {
            bits |= FLAG_INSTRUMENT | pack(i as u32, INSTRUMENT_WIDTH, INSTRUMENT_OFFSET);
        }
        if let Some(v) = volume {
            bits |= FLAG_VOLUME | pack(v as u32, VOLUME_WIDTH, VOLUME_OFFSET);
        }
        if let Some(e) = effect {
            bits |= FLAG_EFFECT | pack(e as u32, EFFECT_WIDTH, EFFECT_OFFSET);
        }
        Self(bits)
    }

    /// Pack a [`CellFields`].
    pub const fn from_fields(fields: CellFields) -> Self {
        Self::encode(fields.note, fields.instrument, fields.volume, fields.effect)
    }

    /// Unpack every field.
    pub const fn decode(self) -> CellFields {
        CellFields {
            note: self.note(),
            instrument: self.instrument(),
            volume: self.volume(),
            effect: self.effect(),
        }
    }

    pub const fn note(self) -> Option<u8> {
        if self.0 & FLAG_NOTE == 0 {
            return None;
        }
        Some(unpack(self.0, NOTE_WIDTH, NOTE_OFFSET) as u8)
    }

    pub const fn instrument(self) -> Option<u8> {
        if self.0 & FLAG_INSTRUMENT == 0 {
            return None;
        }
        Some(unpack(self.0, INSTRUMENT_WIDTH, INSTRUMENT_OFFSET) as u8)
    }

    pub const fn volume(self) -> Option<u8> {
        if self.0 & FLAG_VOLUME == 0 {
            return None;
        }
        Some(unpack(self.0, VOLUME_WIDTH, VOLUME_OFFSET) as u8)
    }

    pub const fn effect(self) -> Option<u16> {
        if self.0 & FLAG_EFFECT == 0 {
            return None;
        }
        Some(unpack(self.0, EFFECT_WIDTH, EFFECT_OFFSET) as u16)
    }

    /// Returns true if the cell carries no event at all.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the note field holds the note-stop sentinel.
    pub const fn is_note_stop(self) -> bool {
        matches!(self.note(), Some(NOTE_STOP))
    }

    /// Replace the note field, keeping the others.
    pub const fn with_note(self, note: Option<u8>) -> Self {
        let f = self.decode();
        Self::encode(note, f.instrument, f.volume, f.effect)
    }

    /// Replace the instrument field, keeping the others.
    pub const fn with_instrument(self, instrument: Option<u8>) -> Self {
        let f = self.decode();
        Self::encode(f.note, instrument, f.volume, f.effect)
    }

    /// Replace the volume field, keeping the others.
    pub const fn with_volume(self, volume: Option<u8>) -> Self {
        let f = self.decode();
        Self::encode(f.note, f.instrument, volume, f.effect)
    }

    /// Replace the effect field, keeping the others.
    pub const fn with_effect(self, effect: Option<u16>) -> Self {
        let f = self.decode();
        Self::encode(f.note, f.instrument, f.volume, effect)
    }
}

impl From<CellFields> for Cell {
    fn from(fields: CellFields) -> Self {
        Self::from_fields(fields)
    }
}

const fn pack(value: u32, width: u32, offset: u32) -> u32 {
    (value & field_max(width)) << offset
}

const fn unpack(bits: u32, width: u32, offset: u32) -> u32 {
    (bits >> offset) & field_max(width)
}
