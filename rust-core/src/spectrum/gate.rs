//! Per-bin spectral gate
//!
//! Bins whose magnitude falls below a threshold are scaled by the balance
//! factor; bins at or above it pass unchanged. The rule is stateless: no bin
//! depends on its neighbours or on earlier frames.

use num_complex::Complex32;

use super::snapshot::SpectrumFrame;
use crate::config::{BALANCE, CUTOFF_DB};

/// Convert decibels to linear gain
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Spectral gate settings for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralGate {
    /// Linear magnitude threshold
    threshold: f32,

    /// Gain applied below the threshold (0 = strong gate, 1 = weak gate)
    balance: f32,
}

impl SpectralGate {
    /// Create a gate from a cutoff in dB and a balance factor
    ///
    /// Both values are clamped into their control ranges.
    pub fn new(cutoff_db: f32, balance: f32) -> Self {
        Self {
            threshold: db_to_gain(CUTOFF_DB.clamp(cutoff_db)),
            balance: BALANCE.clamp(balance),
        }
    }

    /// Linear threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Attenuation gain for bins below threshold
    pub fn balance(&self) -> f32 {
        self.balance
    }

    /// Gate a single bin in place
    ///
    /// # Returns
    /// `(magnitude, passed)` where `passed` is true when the magnitude is at
    /// or above the threshold
    #[inline]
    pub fn gate_bin(&self, bin: &mut Complex32) -> (f32, bool) {
        let magnitude = (bin.re * bin.re + bin.im * bin.im).sqrt();
        let passed = magnitude >= self.threshold;
        if !passed {
            bin.re *= self.balance;
            bin.im *= self.balance;
        }
        (magnitude, passed)
    }

    /// Gate the first `frame.len()` bins of `spectrum` and record their state
    ///
    /// Bins beyond the frame (the Nyquist bin of a real FFT) pass unchanged.
    pub fn apply(&self, spectrum: &mut [Complex32], frame: &mut SpectrumFrame) {
        let bins = spectrum
            .iter_mut()
            .zip(frame.magnitudes.iter_mut().zip(frame.gated.iter_mut()));
        for (bin, (magnitude, gated)) in bins {
            let (m, passed) = self.gate_bin(bin);
            *magnitude = m;
            *gated = passed;
        }
    }
}

impl Default for SpectralGate {
    fn default() -> Self {
        Self::new(CUTOFF_DB.default, BALANCE.default)
    }
}
