//! Python bindings for live monitoring

use numpy::PyArray1;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::audio::{list_input_devices, list_output_devices, AudioDeviceInfo, LiveMonitor};
use crate::config::{FftSize, ProcessorConfig};

/// Audio device information exposed to Python
#[pyclass(name = "AudioDeviceInfo")]
#[derive(Clone)]
pub struct PyAudioDeviceInfo {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub sample_rate: u32,
    #[pyo3(get)]
    pub channels: u16,
}

impl From<AudioDeviceInfo> for PyAudioDeviceInfo {
    fn from(info: AudioDeviceInfo) -> Self {
        Self {
            name: info.name,
            sample_rate: info.sample_rate,
            channels: info.channels,
        }
    }
}

/// Live spectral gate between the default input and output devices
///
/// Processing runs entirely in the audio callback; Python only adjusts
/// parameters and polls the spectrum.
#[pyclass(name = "LiveMonitor", unsendable)]
pub struct PyLiveMonitor {
    monitor: LiveMonitor,
}

#[pymethods]
impl PyLiveMonitor {
    #[new]
    #[pyo3(signature = (cutoff_db=-30.0, balance=0.5, dry_wet=1.0, fft_size_index=4))]
    fn new(cutoff_db: f32, balance: f32, dry_wet: f32, fft_size_index: usize) -> Self {
        Self {
            monitor: LiveMonitor::new(ProcessorConfig {
                cutoff_db,
                balance,
                dry_wet,
                fft_size: FftSize::from_index(fft_size_index),
            }),
        }
    }

    /// Start monitoring (use headphones to avoid feedback)
    ///
    /// Returns:
    ///     Input device name
    fn start(&mut self) -> PyResult<String> {
        self.monitor
            .start()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    fn stop(&mut self) {
        self.monitor.stop();
    }

    fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    fn set_cutoff_db(&self, cutoff_db: f32) {
        self.monitor.parameters().set_cutoff_db(cutoff_db);
    }

    fn set_balance(&self, balance: f32) {
        self.monitor.parameters().set_balance(balance);
    }

    fn set_dry_wet(&self, dry_wet: f32) {
        self.monitor.parameters().set_dry_wet(dry_wet);
    }

    fn set_fft_size_index(&self, index: usize) {
        self.monitor.parameters().set_fft_size_index(index);
    }

    /// Latest spectrum as (magnitudes, gated, frame_index)
    fn get_spectrum_data<'py>(
        &self,
        py: Python<'py>,
    ) -> (&'py PyArray1<f32>, &'py PyArray1<bool>, u64) {
        let snapshot = self.monitor.spectrum_store().snapshot();
        (
            PyArray1::from_vec(py, snapshot.magnitudes),
            PyArray1::from_vec(py, snapshot.gated),
            snapshot.frame_index,
        )
    }

    fn get_fft_size(&self) -> usize {
        self.monitor.spectrum_store().fft_size()
    }

    #[staticmethod]
    fn list_input_devices() -> PyResult<Vec<PyAudioDeviceInfo>> {
        list_input_devices()
            .map(|devices| devices.into_iter().map(Into::into).collect())
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to list devices: {}", e)))
    }

    #[staticmethod]
    fn list_output_devices() -> PyResult<Vec<PyAudioDeviceInfo>> {
        list_output_devices()
            .map(|devices| devices.into_iter().map(Into::into).collect())
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to list devices: {}", e)))
    }
}
