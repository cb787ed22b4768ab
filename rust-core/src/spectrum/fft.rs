//! Windowed FFT engine using realfft for real-valued frames
//!
//! Plans for every supported size are built up front, so switching the
//! frame size on the audio thread only swaps plan handles and refills the
//! window table inside preallocated buffers.

use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use super::windowing::{apply_window_inplace, fill_hann_window, normalize_window, overlap_add_gain};
use crate::config::{FftSize, FrameConfig, MAX_FFT_SIZE};
use crate::error::{Result, SpectralError};

/// Forward/inverse plan pair for one frame size
struct FftPlan {
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    scratch_len: usize,
}

/// Analysis/synthesis engine for a single active frame size
pub struct FftEngine {
    config: FrameConfig,

    /// One plan per entry of `FftSize::ALL`
    plans: Vec<FftPlan>,

    /// Unit-mean Hann window for the active size
    window: Vec<f32>,

    /// `1 / size`, undoing the unnormalized inverse transform
    synthesis_scale: f32,

    /// Window overlap sum at the active hop size
    overlap_gain: f32,

    /// Reusable time-domain buffer (destroyed by the forward transform)
    time_buffer: Vec<f32>,

    /// Reusable frequency-domain buffer, `size / 2 + 1` bins
    spectrum: Vec<Complex32>,

    /// Shared scratch, sized for the largest plan
    scratch: Vec<Complex32>,
}

impl FftEngine {
    /// Create new FFT engine with `fft_size` active
    pub fn new(fft_size: FftSize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let plans: Vec<FftPlan> = FftSize::ALL
            .iter()
            .map(|size| {
                let forward = planner.plan_fft_forward(size.size());
                let inverse = planner.plan_fft_inverse(size.size());
                let scratch_len = forward.get_scratch_len().max(inverse.get_scratch_len());
                FftPlan {
                    forward,
                    inverse,
                    scratch_len,
                }
            })
            .collect();

        let max_scratch = plans.iter().map(|p| p.scratch_len).max().unwrap_or(0);

        let mut engine = Self {
            config: fft_size.into(),
            plans,
            window: Vec::with_capacity(MAX_FFT_SIZE),
            synthesis_scale: 1.0,
            overlap_gain: 1.0,
            time_buffer: Vec::with_capacity(MAX_FFT_SIZE),
            spectrum: Vec::with_capacity(MAX_FFT_SIZE / 2 + 1),
            scratch: vec![Complex32::new(0.0, 0.0); max_scratch],
        };
        engine.configure(fft_size);
        engine
    }

    /// Switch to a new frame size
    ///
    /// Must only be called between frames. Does not allocate.
    pub fn configure(&mut self, fft_size: FftSize) {
        let config = FrameConfig::from(fft_size);

        fill_hann_window(&mut self.window, config.size);
        normalize_window(&mut self.window);
        self.synthesis_scale = 1.0 / config.size as f32;
        self.overlap_gain = overlap_add_gain(&self.window, config.hop_size);

        self.time_buffer.clear();
        self.time_buffer.resize(config.size, 0.0);
        self.spectrum.clear();
        self.spectrum.resize(config.size / 2 + 1, Complex32::new(0.0, 0.0));

        self.config = config;
    }

    /// Window and transform one frame
    ///
    /// # Arguments
    /// * `frame` - Time-domain samples, exactly `size` long (left untouched)
    ///
    /// # Returns
    /// The `size / 2 + 1` unnormalized complex bins; a bin-centred sinusoid
    /// of amplitude A has magnitude A·size/2. The buffer stays owned by the
    /// engine and is consumed by the next [`synthesize`](Self::synthesize).
    pub fn analyze(&mut self, frame: &[f32]) -> Result<&mut [Complex32]> {
        if frame.len() != self.config.size {
            return Err(SpectralError::FrameLength {
                expected: self.config.size,
                actual: frame.len(),
            });
        }

        self.time_buffer.copy_from_slice(frame);
        apply_window_inplace(&mut self.time_buffer, &self.window);

        let plan = &self.plans[self.config.fft_size.index()];
        plan.forward.process_with_scratch(
            &mut self.time_buffer,
            &mut self.spectrum,
            &mut self.scratch[..plan.scratch_len],
        )?;

        Ok(self.spectrum.as_mut_slice())
    }

    /// Inverse-transform the current bins into `output`
    ///
    /// Analyze followed by synthesize with unmodified bins yields the
    /// windowed input frame. Overlap-add normalization is left to the
    /// caller (see [`overlap_gain`](Self::overlap_gain)).
    pub fn synthesize(&mut self, output: &mut [f32]) -> Result<()> {
        if output.len() != self.config.size {
            return Err(SpectralError::FrameLength {
                expected: self.config.size,
                actual: output.len(),
            });
        }

        // DC and Nyquist must be purely real for the inverse real FFT
        let last = self.spectrum.len() - 1;
        self.spectrum[0].im = 0.0;
        self.spectrum[last].im = 0.0;

        let plan = &self.plans[self.config.fft_size.index()];
        plan.inverse.process_with_scratch(
            &mut self.spectrum,
            output,
            &mut self.scratch[..plan.scratch_len],
        )?;

        let scale = self.synthesis_scale;
        for sample in output.iter_mut() {
            *sample *= scale;
        }

        Ok(())
    }

    /// Active frame configuration
    pub fn config(&self) -> FrameConfig {
        self.config
    }

    /// Active window table
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Sum of overlapped windows at the active hop size
    pub fn overlap_gain(&self) -> f32 {
        self.overlap_gain
    }

    /// Number of complex bins produced by `analyze`
    pub fn num_bins(&self) -> usize {
        self.spectrum.len()
    }

}

/// Centre frequency of `bin` in Hz for a frame of `fft_size` samples
pub fn bin_to_hz(bin: usize, fft_size: usize, sample_rate: f64) -> f64 {
    if fft_size == 0 {
        return 0.0;
    }
    bin as f64 * sample_rate / fft_size as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(len: usize, cycles_per_frame: f32, amplitude: f32, frame: usize) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * cycles_per_frame * n as f32 / frame as f32).sin())
            .collect()
    }

    #[test]
    fn test_bin_centred_sine_magnitude() {
        let mut engine = FftEngine::new(FftSize::S1024);
        let signal = sine(1024, 32.0, 0.5, 1024);

        let spectrum = engine.analyze(&signal).unwrap();
        assert_eq!(spectrum.len(), 513);

        // Unnormalized: peak bin reads A·N/2
        let (peak_bin, peak) = spectrum
            .iter()
            .enumerate()
            .map(|(k, c)| (k, c.norm()))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();
        assert_eq!(peak_bin, 32);
        assert!((peak - 256.0).abs() < 0.25, "peak = {}", peak);

        // Hann leaks half amplitude into the neighbours and nothing further
        assert!((spectrum[31].norm() - 128.0).abs() < 0.25);
        assert!(spectrum[40].norm() < 1e-2);
    }

    #[test]
    fn test_analyze_synthesize_returns_windowed_frame() {
        let mut engine = FftEngine::new(FftSize::S256);
        let signal: Vec<f32> = (0..256)
            .map(|n| 0.3 * (n as f32 * 0.07).sin() + 0.1 * (n as f32 * 0.31).cos())
            .collect();

        engine.analyze(&signal).unwrap();
        let mut output = vec![0.0; 256];
        engine.synthesize(&mut output).unwrap();

        let window = engine.window().to_vec();
        for n in 0..256 {
            let expected = signal[n] * window[n];
            assert!((output[n] - expected).abs() < 1e-4, "mismatch at {}", n);
            // Dividing the window back out recovers the input where it is non-negligible
            if window[n] > 0.1 {
                assert!((output[n] / window[n] - signal[n]).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_configure_switches_size() {
        let mut engine = FftEngine::new(FftSize::S1024);
        assert_eq!(engine.num_bins(), 513);

        engine.configure(FftSize::S64);
        assert_eq!(engine.config().size, 64);
        assert_eq!(engine.config().hop_size, 16);
        assert_eq!(engine.num_bins(), 33);
        assert_eq!(engine.window().len(), 64);
        assert!((engine.overlap_gain() - 4.0).abs() < 1e-4);

        let signal = sine(64, 4.0, 1.0, 64);
        let spectrum = engine.analyze(&signal).unwrap();
        assert!((spectrum[4].norm() - 32.0).abs() < 1e-3);
    }

    #[test]
    fn test_frame_length_mismatch() {
        let mut engine = FftEngine::new(FftSize::S128);
        let result = engine.analyze(&[0.0; 100]);
        assert!(matches!(
            result,
            Err(SpectralError::FrameLength { expected: 128, actual: 100 })
        ));

        let mut output = vec![0.0; 64];
        assert!(engine.synthesize(&mut output).is_err());
    }

    #[test]
    fn test_bin_to_hz() {
        assert!((bin_to_hz(32, 1024, 48000.0) - 1500.0).abs() < 1e-9);
        assert_eq!(bin_to_hz(5, 0, 48000.0), 0.0);
    }
}
