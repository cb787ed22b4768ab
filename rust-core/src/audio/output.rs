//! Audio output playback using cpal
//!
//! The output callback is the processing thread: it drains captured frames
//! from the ring buffer, runs the spectral gate over them in place and plays
//! the result.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};

use super::buffer::AudioConsumer;
use super::input::{AudioDeviceInfo, AudioError};
use super::processor::SpectralGateProcessor;

/// Audio output stream
pub struct AudioOutput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioOutput {
    /// Create audio output from default device
    ///
    /// # Arguments
    /// * `consumer` - Ring buffer consumer holding captured frames
    /// * `processor` - Processor run on every output block; prepared here
    pub fn from_default_device(
        consumer: AudioConsumer,
        processor: SpectralGateProcessor,
    ) -> Result<Self, AudioError> {
        Self::from_device(default_output_device()?, consumer, processor)
    }

    /// Create audio output from specific device
    pub fn from_device(
        device: Device,
        consumer: AudioConsumer,
        processor: SpectralGateProcessor,
    ) -> Result<Self, AudioError> {
        let device_info = output_device_info(&device)?;
        let channels = device_info.channels;
        if !SpectralGateProcessor::supports_layout(channels as usize, channels as usize) {
            return Err(AudioError::UnsupportedLayout(channels));
        }

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;
        let stream_config: StreamConfig = config.into();

        let mut processor = processor;
        let channels = channels as usize;
        let sample_rate = device_info.sample_rate as usize;
        // Generous upper bound; the processor grows its scratch if a host exceeds it
        processor.prepare(sample_rate as f64, 4096, channels);

        // Queue more than this and the monitor drifts behind the input
        let max_queued = sample_rate / 4 * channels;
        let mut consumer = consumer;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if consumer.len() > max_queued + data.len() {
                        consumer.skip(consumer.len() - data.len());
                    }

                    // Underrun plays silence through the gate
                    let read = consumer.read(data);
                    data[read..].fill(0.0);

                    processor.process_interleaved(data, channels);
                },
                move |err| {
                    log::error!("Audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start playing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio playback
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}

pub fn default_output_device() -> Result<Device, AudioError> {
    cpal::default_host()
        .default_output_device()
        .ok_or(AudioError::NoDevice("output"))
}

/// Name and default configuration of an output device
pub fn output_device_info(device: &Device) -> Result<AudioDeviceInfo, AudioError> {
    let name = device
        .name()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;
    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

    Ok(AudioDeviceInfo {
        name,
        sample_rate: config.sample_rate().0,
        channels: config.channels(),
    })
}

/// List available audio output devices
pub fn list_output_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let device_iter = host
        .output_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    Ok(device_iter
        .filter_map(|device| output_device_info(&device).ok())
        .collect())
}
