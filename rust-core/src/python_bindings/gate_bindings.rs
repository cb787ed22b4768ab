//! Python bindings for the spectral gate processor

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::audio::SpectralGateProcessor;
use crate::config::{FftSize, ProcessorConfig};

/// Offline access to the spectral gate
///
/// Blocks are processed in call order, so consecutive calls behave like
/// consecutive host callbacks.
#[pyclass(name = "SpectralGate")]
pub struct PySpectralGate {
    processor: SpectralGateProcessor,
}

#[pymethods]
impl PySpectralGate {
    /// Create a spectral gate
    ///
    /// Args:
    ///     cutoff_db: Gate threshold in dB against raw bin magnitude (-60 to 0)
    ///     balance: Gain for bins below the threshold (0 to 1)
    ///     dry_wet: Mix of processed signal (0 to 1)
    ///     fft_size: One of 64, 128, 256, 512, 1024, 2048
    #[new]
    #[pyo3(signature = (cutoff_db=-30.0, balance=0.5, dry_wet=1.0, fft_size=1024))]
    fn new(cutoff_db: f32, balance: f32, dry_wet: f32, fft_size: usize) -> PyResult<Self> {
        let fft_size =
            FftSize::try_from(fft_size).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self {
            processor: SpectralGateProcessor::new(ProcessorConfig {
                cutoff_db,
                balance,
                dry_wet,
                fft_size,
            }),
        })
    }

    /// Reset all state for a new stream
    #[pyo3(signature = (sample_rate=48000.0, max_block_size=512, num_channels=1))]
    fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) -> PyResult<()> {
        if !SpectralGateProcessor::supports_layout(num_channels, num_channels) {
            return Err(PyValueError::new_err(format!(
                "Unsupported channel count {} (mono or stereo only)",
                num_channels
            )));
        }
        self.processor.prepare(sample_rate, max_block_size, num_channels);
        Ok(())
    }

    fn release(&mut self) {
        self.processor.release();
    }

    /// Process a mono block
    ///
    /// Args:
    ///     block: float32 numpy array
    ///
    /// Returns:
    ///     Processed block (same length)
    fn process<'py>(
        &mut self,
        py: Python<'py>,
        block: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let mut samples = block
            .as_slice()
            .map_err(|e| PyValueError::new_err(e.to_string()))?
            .to_vec();
        self.processor.process_block(&mut [&mut samples[..]]);
        Ok(PyArray1::from_vec(py, samples))
    }

    /// Process an interleaved stereo block
    fn process_stereo<'py>(
        &mut self,
        py: Python<'py>,
        block: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let mut samples = block
            .as_slice()
            .map_err(|e| PyValueError::new_err(e.to_string()))?
            .to_vec();
        if samples.len() % 2 != 0 {
            return Err(PyValueError::new_err("Interleaved stereo block has odd length"));
        }
        self.processor.process_interleaved(&mut samples, 2);
        Ok(PyArray1::from_vec(py, samples))
    }

    fn set_cutoff_db(&self, cutoff_db: f32) {
        self.processor.parameters().set_cutoff_db(cutoff_db);
    }

    fn set_balance(&self, balance: f32) {
        self.processor.parameters().set_balance(balance);
    }

    fn set_dry_wet(&self, dry_wet: f32) {
        self.processor.parameters().set_dry_wet(dry_wet);
    }

    /// Select FFT size by index (0 = 64 ... 5 = 2048); applied on the next block
    fn set_fft_size_index(&self, index: usize) {
        self.processor.parameters().set_fft_size_index(index);
    }

    /// Latest spectrum
    ///
    /// Returns:
    ///     Tuple of (magnitudes, gated) numpy arrays, fft_size / 2 entries each
    fn get_spectrum_data<'py>(
        &self,
        py: Python<'py>,
    ) -> (&'py PyArray1<f32>, &'py PyArray1<bool>) {
        let (magnitudes, gated) = self.processor.spectrum_data();
        (PyArray1::from_vec(py, magnitudes), PyArray1::from_vec(py, gated))
    }

    fn get_fft_size(&self) -> usize {
        self.processor.fft_size()
    }

    fn latency_samples(&self) -> usize {
        self.processor.latency_samples()
    }
}
