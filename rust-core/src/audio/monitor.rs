//! Live monitor: default input → spectral gate → default output
//!
//! Captured frames travel through a lock-free ring buffer into the output
//! callback, which owns the processor. A control thread adjusts the shared
//! parameters and polls the spectrum store while the streams run.

use std::sync::Arc;

use super::buffer::AudioRingBuffer;
use super::input::{default_input_device, input_device_info, AudioDeviceInfo, AudioError, AudioInput};
use super::output::{default_output_device, output_device_info, AudioOutput};
use super::params::GateParameters;
use super::processor::SpectralGateProcessor;
use crate::config::ProcessorConfig;
use crate::spectrum::SpectrumStore;

/// Half a second of stereo audio at 96 kHz
const RING_CAPACITY: usize = 96000;

/// Devices opened by a running monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorDevices {
    pub input: AudioDeviceInfo,
    pub output: AudioDeviceInfo,
}

/// Real-time monitor around a [`SpectralGateProcessor`]
pub struct LiveMonitor {
    params: Arc<GateParameters>,
    store: SpectrumStore,
    audio_input: Option<AudioInput>,
    audio_output: Option<AudioOutput>,
}

impl LiveMonitor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            params: Arc::new(GateParameters::new(&config)),
            store: SpectrumStore::new(config.fft_size),
            audio_input: None,
            audio_output: None,
        }
    }

    /// Open the default devices and start processing
    ///
    /// # Returns
    /// Name of the input device
    pub fn start(&mut self) -> Result<String, AudioError> {
        Ok(self.start_with_devices()?.input.name)
    }

    /// Open the default devices and start processing
    ///
    /// Both devices must run at the same sample rate, and the output must be
    /// mono or stereo.
    pub fn start_with_devices(&mut self) -> Result<MonitorDevices, AudioError> {
        if self.is_running() {
            return Err(AudioError::AlreadyRunning);
        }

        let input_device = default_input_device()?;
        let output_device = default_output_device()?;
        let input_info = input_device_info(&input_device)?;
        let output_info = output_device_info(&output_device)?;

        if input_info.sample_rate != output_info.sample_rate {
            return Err(AudioError::SampleRateMismatch {
                input: input_info.sample_rate,
                output: output_info.sample_rate,
            });
        }
        let channels = output_info.channels;
        if !SpectralGateProcessor::supports_layout(channels as usize, channels as usize) {
            return Err(AudioError::UnsupportedLayout(channels));
        }

        let (producer, consumer) = AudioRingBuffer::new(RING_CAPACITY).split();
        let processor =
            SpectralGateProcessor::with_shared(Arc::clone(&self.params), self.store.clone());

        let output = AudioOutput::from_device(output_device, consumer, processor)?;
        let input = AudioInput::from_device(input_device, producer, channels)?;

        output.start()?;
        input.start()?;

        let devices = MonitorDevices {
            input: input.device_info().clone(),
            output: output.device_info().clone(),
        };
        log::info!(
            "Monitoring {} -> {} at {} Hz, {} channel(s)",
            devices.input.name,
            devices.output.name,
            devices.output.sample_rate,
            devices.output.channels
        );

        self.audio_input = Some(input);
        self.audio_output = Some(output);
        Ok(devices)
    }

    /// Stop both streams; the parameters and last spectrum remain readable
    pub fn stop(&mut self) {
        if let Some(input) = self.audio_input.take() {
            if let Err(e) = input.pause() {
                log::warn!("Failed to pause input: {}", e);
            }
        }
        if let Some(output) = self.audio_output.take() {
            if let Err(e) = output.pause() {
                log::warn!("Failed to pause output: {}", e);
            }
            log::info!("Monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.audio_output.is_some()
    }

    /// Shared control parameters
    pub fn parameters(&self) -> Arc<GateParameters> {
        Arc::clone(&self.params)
    }

    /// Handle to the published spectrum
    pub fn spectrum_store(&self) -> SpectrumStore {
        self.store.clone()
    }

    /// Latest magnitudes and gate flags
    pub fn spectrum_data(&self) -> (Vec<f32>, Vec<bool>) {
        self.store.spectrum_data()
    }
}

impl Default for LiveMonitor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl Drop for LiveMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
