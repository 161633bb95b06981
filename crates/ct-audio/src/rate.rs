//! Sample-and-hold rate adaptation between the engine and the device.

/// Stretches or squeezes a mono source to the device rate by repeating or
/// skipping source samples, then copies each value to every device channel.
///
/// The scratch buffer is allocated once up front, so [`RateAdapter::fill`]
/// is safe to call from the audio callback.
pub struct RateAdapter {
    /// Source samples consumed per device frame.
    step: f64,
    position: f64,
    buffer: Vec<f32>,
    index: usize,
    filled: usize,
}

impl RateAdapter {
    pub fn new(source_rate: u32, device_rate: u32, block: usize) -> Self {
        Self {
            step: source_rate as f64 / device_rate.max(1) as f64,
            position: 0.0,
            buffer: vec![0.0; block.max(1)],
            index: 0,
            filled: 0,
        }
    }

    /// Fill an interleaved device buffer, pulling mono source blocks from
    /// `render` as needed.
    pub fn fill<F>(&mut self, out: &mut [f32], channels: usize, render: &mut F)
    where
        F: FnMut(&mut [f32]),
    {
        for frame in out.chunks_mut(channels.max(1)) {
            while self.index >= self.filled {
                self.index -= self.filled;
                render(self.buffer.as_mut_slice());
                self.filled = self.buffer.len();
            }
            frame.fill(self.buffer[self.index]);

            self.position += self.step;
            let whole = self.position.floor();
            self.position -= whole;
            self.index += whole as usize;
        }
    }
}
