//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::rate::RateAdapter;
use crate::traits::{AudioError, AudioOutput};

/// Mono samples rendered per source block. About 16 ms at 16 kHz.
const SOURCE_BLOCK: usize = 256;

/// CPAL-based audio output fed by a mono render callback.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    /// Rate the render callback produces samples at.
    source_rate: u32,
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Open the default output device, preferring a configuration that runs
    /// at `source_rate` natively.
    pub fn new(source_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = Self::pick_config(&device, source_rate)?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio output opened"
        );
        if config.sample_rate.0 != source_rate {
            tracing::info!(
                source_rate,
                device_rate = config.sample_rate.0,
                "device lacks the engine rate, resampling"
            );
        }

        Ok(Self {
            device,
            config,
            source_rate,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    fn pick_config(device: &Device, source_rate: u32) -> Result<StreamConfig, AudioError> {
        let native = device
            .supported_output_configs()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?
            .find(|range| {
                range.sample_format() == SampleFormat::F32
                    && range.min_sample_rate().0 <= source_rate
                    && range.max_sample_rate().0 >= source_rate
            });
        if let Some(range) = native {
            return Ok(range.with_sample_rate(SampleRate(source_rate)).config());
        }
        let fallback = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;
        Ok(fallback.config())
    }

    /// Build and start the stream. `render` is called from the audio thread
    /// to fill mono buffers at the source rate and must not block.
    pub fn build_stream<F>(&mut self, mut render: F) -> Result<(), AudioError>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let running = self.running.clone();
        let channels = self.config.channels as usize;
        let mut adapter = RateAdapter::new(self.source_rate, self.config.sample_rate.0, SOURCE_BLOCK);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    adapter.fill(data, channels, &mut render);
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.running.store(true, Ordering::Relaxed);
        self.stream = Some(stream);
        Ok(())
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.stream.is_some() && self.running.load(Ordering::Relaxed)
    }
}
