//! Audio input capture using cpal
//!
//! Captures from a microphone or line-in and queues interleaved frames,
//! remapped to the processing layout, for the output callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use thiserror::Error;

use super::buffer::AudioProducer;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio {0} device found")]
    NoDevice(&'static str),

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Input runs at {input} Hz but output runs at {output} Hz; set both devices to the same rate")]
    SampleRateMismatch { input: u32, output: u32 },

    #[error("Unsupported channel layout: {0} channel(s) (mono or stereo only)")]
    UnsupportedLayout(u16),

    #[error("Monitor is already running")]
    AlreadyRunning,
}

/// Audio device information
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio input stream
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioInput {
    /// Create audio input from default device
    ///
    /// # Arguments
    /// * `producer` - Ring buffer producer for captured audio
    /// * `output_channels` - Channel count of the queued frames
    pub fn from_default_device(
        producer: AudioProducer,
        output_channels: u16,
    ) -> Result<Self, AudioError> {
        Self::from_device(default_input_device()?, producer, output_channels)
    }

    /// Create audio input from specific device
    pub fn from_device(
        device: Device,
        producer: AudioProducer,
        output_channels: u16,
    ) -> Result<Self, AudioError> {
        if !matches!(output_channels, 1 | 2) {
            return Err(AudioError::UnsupportedLayout(output_channels));
        }

        let device_info = input_device_info(&device)?;
        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;
        let stream_config: StreamConfig = config.into();

        let input_channels = (device_info.channels as usize).max(1);
        let output_channels = output_channels as usize;
        let mut producer = producer;
        let mut frame = [0.0f32; 2];

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if input_channels == output_channels {
                        producer.write(data);
                        return;
                    }
                    for captured in data.chunks_exact(input_channels) {
                        let remapped = &mut frame[..output_channels];
                        remap_frame(captured, remapped);
                        if producer.write(remapped) < output_channels {
                            break;
                        }
                    }
                },
                move |err| {
                    log::error!("Audio input error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio capture
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

/// Map one captured frame onto `output.len()` channels
///
/// A mono output takes the mean of all captured channels. Otherwise each
/// output channel copies the captured channel with the same index, falling
/// back to the last captured channel.
pub(crate) fn remap_frame(input: &[f32], output: &mut [f32]) {
    if input.is_empty() {
        output.fill(0.0);
        return;
    }
    if output.len() == 1 {
        output[0] = input.iter().sum::<f32>() / input.len() as f32;
        return;
    }
    let last = input.len() - 1;
    for (c, sample) in output.iter_mut().enumerate() {
        *sample = input[c.min(last)];
    }
}

pub fn default_input_device() -> Result<Device, AudioError> {
    cpal::default_host()
        .default_input_device()
        .ok_or(AudioError::NoDevice("input"))
}

/// Name and default configuration of an input device
pub fn input_device_info(device: &Device) -> Result<AudioDeviceInfo, AudioError> {
    let name = device
        .name()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;
    let config = device
        .default_input_config()
        .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

    Ok(AudioDeviceInfo {
        name,
        sample_rate: config.sample_rate().0,
        channels: config.channels(),
    })
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let device_iter = host
        .input_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    // Devices that cannot report a default config are skipped
    Ok(device_iter
        .filter_map(|device| input_device_info(&device).ok())
        .collect())
}
