//! Note-to-frequency conversion for the tone generators.
//!
//! Notes count semitones up from A-1 (55 Hz) in twelve-tone equal
//! temperament. The noise generator does not use this mapping; see
//! [`noise_period`].

use ct_ir::SAMPLE_RATE;

/// Frequency of note 0 (A-1), in Hz.
pub const BASE_FREQUENCY: f32 = 55.0;

/// Semitones per octave.
const SEMITONES: f32 = 12.0;

/// Convert a note number to a frequency in Hz.
pub fn note_to_frequency(note: u8) -> f32 {
    BASE_FREQUENCY * libm::powf(2.0, note as f32 / SEMITONES)
}

/// Samples per waveform cycle at `frequency`.
///
/// Returns 0.0 for non-positive or non-finite frequencies.
pub fn phase_length(frequency: f32) -> f32 {
    if !frequency.is_finite() || frequency <= 0.0 {
        return 0.0;
    }
    SAMPLE_RATE as f32 / frequency
}

/// Shift-register clock period, in samples, for a noise note.
///
/// Higher notes clock the register less often: note 0 clocks every sample.
pub fn noise_period(note: u8) -> u32 {
    note as u32 + 1
}
