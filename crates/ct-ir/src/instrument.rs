//! Instrument envelope definitions.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::song::SongError;

/// Default breakpoint length used when an envelope is grown from nothing.
const DEFAULT_BREAKPOINT_SAMPLES: u32 = 1000;

/// A volume envelope: parallel breakpoint levels and durations.
///
/// `envelope_volume[i]` is the level reached at breakpoint `i` and
/// `envelope_duration[i]` the number of samples spent travelling to it.
/// The first breakpoint's duration is unused: a note starts at its level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Breakpoint held while the note is unreleased.
    #[serde(default)]
    pub sustain: Option<u16>,
    /// First breakpoint of the loop region.
    #[serde(default)]
    pub loop_start: Option<u16>,
    /// Breakpoint index that wraps back to `loop_start` (exclusive end).
    #[serde(default)]
    pub loop_end: Option<u16>,
    /// Breakpoint levels, 0.0 to 1.0.
    pub envelope_volume: Vec<f32>,
    /// Samples per breakpoint.
    pub envelope_duration: Vec<u32>,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            sustain: None,
            loop_start: None,
            loop_end: None,
            envelope_volume: alloc::vec![1.0, 0.0],
            envelope_duration: alloc::vec![0, DEFAULT_BREAKPOINT_SAMPLES],
        }
    }
}

/// Loop region `[start, end)` in breakpoint indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopRange {
    pub start: u16,
    pub end: u16,
}

impl Instrument {
    /// Build an instrument from (level, duration) breakpoints.
    pub fn from_breakpoints(points: &[(f32, u32)]) -> Self {
        Self {
            sustain: None,
            loop_start: None,
            loop_end: None,
            envelope_volume: points.iter().map(|p| p.0).collect(),
            envelope_duration: points.iter().map(|p| p.1).collect(),
        }
    }

    /// Builder: hold at `index` until release.
    pub fn with_sustain(mut self, index: u16) -> Self {
        self.sustain = Some(index);
        self
    }

    /// Builder: loop `[start, end)` until release.
    pub fn with_loop(mut self, start: u16, end: u16) -> Self {
        self.loop_start = Some(start);
        self.loop_end = Some(end);
        self
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.envelope_volume.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelope_volume.is_empty()
    }

    /// Level of breakpoint `index`, 0.0 past the end.
    pub fn level(&self, index: usize) -> f32 {
        self.envelope_volume.get(index).copied().unwrap_or(0.0)
    }

    /// Duration of breakpoint `index`, 0 past the end.
    pub fn duration(&self, index: usize) -> u32 {
        self.envelope_duration.get(index).copied().unwrap_or(0)
    }

    /// The loop region, present only when both ends are set.
    pub fn loop_range(&self) -> Option<LoopRange> {
        match (self.loop_start, self.loop_end) {
            (Some(start), Some(end)) => Some(LoopRange { start, end }),
            _ => None,
        }
    }

    /// Resize the envelope to `len` breakpoints (at least one).
    ///
    /// New breakpoints are silent and inherit the previous last duration.
    /// Sustain and loop indices that fall off the end are cleared. Returns
    /// the new breakpoint count.
    pub fn set_envelope_len(&mut self, len: usize) -> usize {
        let len = len.max(1);
        let duration = self
            .envelope_duration
            .last()
            .copied()
            .unwrap_or(DEFAULT_BREAKPOINT_SAMPLES);
        self.envelope_volume.resize(len, 0.0);
        self.envelope_duration.resize(len, duration);

        if self.sustain.is_some_and(|s| s as usize >= len) {
            self.sustain = None;
        }
        if self.loop_range().is_some_and(|r| r.end as usize > len) {
            self.loop_start = None;
            self.loop_end = None;
        }
        len
    }

    /// Check the envelope is playable.
    pub fn validate(&self, index: usize) -> Result<(), SongError> {
        if self.envelope_volume.is_empty() {
            return Err(SongError::EmptyEnvelope { instrument: index });
        }
        if self.envelope_volume.len() != self.envelope_duration.len() {
            return Err(SongError::EnvelopeLengthMismatch {
                instrument: index,
                volumes: self.envelope_volume.len(),
                durations: self.envelope_duration.len(),
            });
        }
        if let Some((breakpoint, &level)) = self
            .envelope_volume
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(SongError::EnvelopeLevel { instrument: index, breakpoint, level });
        }
        let len = self.len();
        if let Some(sustain) = self.sustain {
            if sustain as usize >= len {
                return Err(SongError::SustainOutOfRange { instrument: index, sustain, len });
            }
        }
        match (self.loop_start, self.loop_end) {
            (None, None) => {}
            (Some(start), Some(end)) => {
                if start >= end || end as usize > len {
                    return Err(SongError::LoopOutOfRange { instrument: index, start, end, len });
                }
            }
            _ => return Err(SongError::LoopIncomplete { instrument: index }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instrument_is_valid() {
        assert!(Instrument::default().validate(0).is_ok());
    }

    #[test]
    fn mismatched_envelope_is_rejected() {
        let mut inst = Instrument::from_breakpoints(&[(1.0, 0), (0.0, 10)]);
        inst.envelope_duration.pop();
        assert!(matches!(
            inst.validate(3),
            Err(SongError::EnvelopeLengthMismatch { instrument: 3, volumes: 2, durations: 1 })
        ));
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let inst = Instrument::from_breakpoints(&[(1.0, 0), (f32::NAN, 10)]);
        assert!(matches!(inst.validate(0), Err(SongError::EnvelopeLevel { breakpoint: 1, .. })));

        let inst = Instrument::from_breakpoints(&[(1.5, 0)]);
        assert!(matches!(inst.validate(0), Err(SongError::EnvelopeLevel { breakpoint: 0, .. })));
    }

    #[test]
    fn loop_checks() {
        let points = [(0.0, 0), (1.0, 10), (0.5, 10), (0.0, 10)];
        assert!(Instrument::from_breakpoints(&points).with_loop(1, 3).validate(0).is_ok());
        assert!(Instrument::from_breakpoints(&points).with_loop(1, 4).validate(0).is_ok());
        assert!(Instrument::from_breakpoints(&points).with_loop(2, 2).validate(0).is_err());
        assert!(Instrument::from_breakpoints(&points).with_loop(1, 5).validate(0).is_err());

        let mut half = Instrument::from_breakpoints(&points);
        half.loop_end = Some(2);
        assert!(matches!(half.validate(0), Err(SongError::LoopIncomplete { .. })));
    }

    #[test]
    fn set_envelope_len_keeps_points_and_drops_stale_indices() {
        let mut inst = Instrument::from_breakpoints(&[(0.2, 0), (1.0, 40), (0.5, 60)])
            .with_sustain(2)
            .with_loop(1, 3);

        assert_eq!(inst.set_envelope_len(5), 5);
        assert_eq!(inst.level(1), 1.0);
        assert_eq!(inst.level(4), 0.0);
        assert_eq!(inst.duration(4), 60);
        assert_eq!(inst.sustain, Some(2));

        assert_eq!(inst.set_envelope_len(2), 2);
        assert_eq!(inst.sustain, None);
        assert_eq!(inst.loop_range(), None);

        assert_eq!(inst.set_envelope_len(0), 1);
    }
}
