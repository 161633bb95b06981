//! Chip waveform generators.
//!
//! Every tone generator is a phase accumulator ([`Phase`]) plus a shaping
//! function. Each call to [`Sampleable::sample`] advances one output sample
//! and returns a value in `[-1.0, 1.0]`.

use core::f32::consts::TAU;

use ct_ir::SAMPLE_RATE;

use crate::frequency::{noise_period, note_to_frequency, phase_length};

/// Anything that produces one output value per call.
pub trait Sampleable {
    /// Advance one sample and return its value.
    fn sample(&mut self) -> f32;
}

/// A pitched signal source.
pub trait Waveform: Sampleable {
    /// Tune to a note number.
    fn note_set(&mut self, note: u8);

    /// Tune to a frequency in Hz.
    fn frequency_set(&mut self, frequency: f32);
}

/// The shape of a generator, used to lay out the channels at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveKind {
    Square,
    Saw,
    Triangle,
    Sine,
    Noise,
}

/// Phase accumulator shared by the tone generators.
///
/// `offset` counts samples into the current cycle; `phase` is the same
/// position normalized to `[0, 1)`.
#[derive(Clone, Debug)]
pub struct Phase {
    offset: f32,
    phase: f32,
    length: f32,
    frequency: f32,
}

impl Default for Phase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase {
    /// A 1 Hz accumulator at phase 0.
    pub fn new() -> Self {
        let mut phase = Self { offset: 0.0, phase: 0.0, length: 0.0, frequency: 0.0 };
        phase.frequency_set(1.0);
        phase
    }

    /// Retune, keeping the current position within the cycle.
    pub fn frequency_set(&mut self, frequency: f32) {
        self.length = phase_length(frequency);
        self.frequency = frequency;
        self.offset = self.phase * self.length;
    }

    pub fn note_set(&mut self, note: u8) {
        self.frequency_set(note_to_frequency(note));
    }

    /// Step one sample and return the new normalized phase.
    pub fn advance(&mut self) -> f32 {
        if self.length > 0.0 {
            self.offset = (self.offset + 1.0) % self.length;
            self.phase = self.offset / self.length;
        }
        self.phase
    }

    /// Current normalized phase.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Jump to a normalized phase.
    fn jump(&mut self, phase: f32) {
        self.phase = phase;
        self.offset = phase * self.length;
    }
}

/// Pulse wave with adjustable duty cycle.
#[derive(Clone, Debug)]
pub struct Square {
    phase: Phase,
    duty: f32,
}

impl Default for Square {
    fn default() -> Self {
        Self { phase: Phase::new(), duty: 0.5 }
    }
}

impl Square {
    pub fn duty(&self) -> f32 {
        self.duty
    }

    /// Change the duty cycle mid-note.
    ///
    /// If the change would flip the output level at the current phase, the
    /// phase jumps to the edge of the band it was in: to the new duty when
    /// leaving the high band, to the start of the cycle when leaving the low
    /// band. This is an approximation, not a bit-exact hardware model.
    pub fn duty_set(&mut self, duty: f32) {
        let phase = self.phase.phase();
        if phase >= self.duty {
            if phase < duty {
                self.phase.jump(duty);
            }
        } else if phase >= duty {
            self.phase.jump(0.0);
        }
        self.duty = duty;
    }
}

impl Sampleable for Square {
    fn sample(&mut self) -> f32 {
        if self.phase.advance() >= self.duty {
            1.0
        } else {
            -1.0
        }
    }
}

/// Rising ramp from -1 to 1 over each cycle.
#[derive(Clone, Debug, Default)]
pub struct Saw {
    phase: Phase,
}

impl Sampleable for Saw {
    fn sample(&mut self) -> f32 {
        self.phase.advance() * 2.0 - 1.0
    }
}

/// Symmetric triangle: 1 at the cycle start, -1 at its midpoint.
#[derive(Clone, Debug, Default)]
pub struct Triangle {
    phase: Phase,
}

impl Sampleable for Triangle {
    fn sample(&mut self) -> f32 {
        libm::fabsf(self.phase.advance() * 4.0 - 2.0) - 1.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct Sine {
    phase: Phase,
}

impl Sampleable for Sine {
    fn sample(&mut self) -> f32 {
        libm::sinf(self.phase.advance() * TAU)
    }
}

/// 15-bit linear-feedback shift register noise.
///
/// Only the short feedback tap (bit 0 xor bit 1) is modelled; the
/// alternate bit 6 tap of the classic hardware is not available.
#[derive(Clone, Debug)]
pub struct Noise {
    /// Samples between register clocks.
    period: u32,
    counter: u32,
    register: u16,
}

impl Default for Noise {
    fn default() -> Self {
        Self { period: 1, counter: 0, register: 1 }
    }
}

impl Noise {
    pub fn period(&self) -> u32 {
        self.period
    }

    fn clock(&mut self) {
        let feedback = (self.register ^ (self.register >> 1)) & 1;
        self.register = (feedback << 14) | (self.register >> 1);
    }
}

impl Sampleable for Noise {
    fn sample(&mut self) -> f32 {
        self.counter = (self.counter + 1) % self.period;
        if self.counter == 0 {
            self.clock();
        }
        if self.register & 1 == 1 {
            1.0
        } else {
            -1.0
        }
    }
}

impl Waveform for Noise {
    fn note_set(&mut self, note: u8) {
        self.period = noise_period(note);
    }

    fn frequency_set(&mut self, frequency: f32) {
        let period = if frequency.is_finite() && frequency > 0.0 {
            libm::floorf(SAMPLE_RATE as f32 / frequency) as u32
        } else {
            0
        };
        self.period = period.max(1);
    }
}

macro_rules! phase_waveform {
    ($($ty:ty),*) => {$(
        impl Waveform for $ty {
            fn note_set(&mut self, note: u8) {
                self.phase.note_set(note);
            }

            fn frequency_set(&mut self, frequency: f32) {
                self.phase.frequency_set(frequency);
            }
        }
    )*};
}

phase_waveform!(Square, Saw, Triangle, Sine);

/// One generator of any kind, as owned by a channel.
#[derive(Clone, Debug)]
pub enum Oscillator {
    Square(Square),
    Saw(Saw),
    Triangle(Triangle),
    Sine(Sine),
    Noise(Noise),
}

impl Oscillator {
    pub fn new(kind: WaveKind) -> Self {
        match kind {
            WaveKind::Square => Oscillator::Square(Square::default()),
            WaveKind::Saw => Oscillator::Saw(Saw::default()),
            WaveKind::Triangle => Oscillator::Triangle(Triangle::default()),
            WaveKind::Sine => Oscillator::Sine(Sine::default()),
            WaveKind::Noise => Oscillator::Noise(Noise::default()),
        }
    }

    pub fn kind(&self) -> WaveKind {
        match self {
            Oscillator::Square(_) => WaveKind::Square,
            Oscillator::Saw(_) => WaveKind::Saw,
            Oscillator::Triangle(_) => WaveKind::Triangle,
            Oscillator::Sine(_) => WaveKind::Sine,
            Oscillator::Noise(_) => WaveKind::Noise,
        }
    }

    fn as_waveform(&mut self) -> &mut dyn Waveform {
        match self {
            Oscillator::Square(w) => w,
            Oscillator::Saw(w) => w,
            Oscillator::Triangle(w) => w,
            Oscillator::Sine(w) => w,
            Oscillator::Noise(w) => w,
        }
    }
}

impl Sampleable for Oscillator {
    fn sample(&mut self) -> f32 {
        self.as_waveform().sample()
    }
}

impl Waveform for Oscillator {
    fn note_set(&mut self, note: u8) {
        self.as_waveform().note_set(note);
    }

    fn frequency_set(&mut self, frequency: f32) {
        self.as_waveform().frequency_set(frequency);
    }
}
