//! Control parameters shared between a control layer and the audio thread
//!
//! Every value is a plain atomic so the audio thread never waits. Values are
//! clamped on the way in and on the way out.

use std::sync::atomic::{AtomicUsize, Ordering};

use atomic_float::AtomicF32;

use crate::config::{FftSize, ProcessorConfig, BALANCE, CUTOFF_DB, DRY_WET};

/// Gate controls: cutoff, balance, dry/wet and FFT-size selector
#[derive(Debug)]
pub struct GateParameters {
    cutoff_db: AtomicF32,
    balance: AtomicF32,
    dry_wet: AtomicF32,
    fft_size_index: AtomicUsize,
}

impl GateParameters {
    /// Create parameters from an initial configuration
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            cutoff_db: AtomicF32::new(CUTOFF_DB.clamp(config.cutoff_db)),
            balance: AtomicF32::new(BALANCE.clamp(config.balance)),
            dry_wet: AtomicF32::new(DRY_WET.clamp(config.dry_wet)),
            fft_size_index: AtomicUsize::new(config.fft_size.index()),
        }
    }

    /// Cutoff threshold in dB against raw bin magnitude, within [-60, 0]
    pub fn cutoff_db(&self) -> f32 {
        CUTOFF_DB.clamp(self.cutoff_db.load(Ordering::Relaxed))
    }

    pub fn set_cutoff_db(&self, cutoff_db: f32) {
        self.cutoff_db.store(CUTOFF_DB.clamp(cutoff_db), Ordering::Relaxed);
    }

    /// Attenuation gain for bins below the cutoff, within [0, 1]
    pub fn balance(&self) -> f32 {
        BALANCE.clamp(self.balance.load(Ordering::Relaxed))
    }

    pub fn set_balance(&self, balance: f32) {
        self.balance.store(BALANCE.clamp(balance), Ordering::Relaxed);
    }

    /// Dry/wet mix, within [0, 1]
    pub fn dry_wet(&self) -> f32 {
        DRY_WET.clamp(self.dry_wet.load(Ordering::Relaxed))
    }

    pub fn set_dry_wet(&self, dry_wet: f32) {
        self.dry_wet.store(DRY_WET.clamp(dry_wet), Ordering::Relaxed);
    }

    /// Selected FFT size (index clamped to the supported set)
    pub fn fft_size(&self) -> FftSize {
        FftSize::from_index(self.fft_size_index.load(Ordering::Relaxed))
    }

    /// Selector index, clamped to 0..=5
    pub fn fft_size_index(&self) -> usize {
        self.fft_size().index()
    }

    pub fn set_fft_size(&self, fft_size: FftSize) {
        self.fft_size_index.store(fft_size.index(), Ordering::Relaxed);
    }

    /// Select an FFT size by index; out-of-range indices clamp to the largest size
    pub fn set_fft_size_index(&self, index: usize) {
        self.set_fft_size(FftSize::from_index(index));
    }

    /// Set cutoff from a normalized `[0, 1]` control value
    pub fn set_cutoff_normalized(&self, normalized: f32) {
        self.set_cutoff_db(CUTOFF_DB.snap(CUTOFF_DB.from_normalized(normalized)));
    }

    /// Set balance from a normalized `[0, 1]` control value
    pub fn set_balance_normalized(&self, normalized: f32) {
        self.set_balance(BALANCE.snap(BALANCE.from_normalized(normalized)));
    }

    /// Set dry/wet from a normalized `[0, 1]` control value
    pub fn set_dry_wet_normalized(&self, normalized: f32) {
        self.set_dry_wet(DRY_WET.snap(DRY_WET.from_normalized(normalized)));
    }

    /// Current values as a configuration
    pub fn to_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            cutoff_db: self.cutoff_db(),
            balance: self.balance(),
            dry_wet: self.dry_wet(),
            fft_size: self.fft_size(),
        }
    }
}

impl Default for GateParameters {
    fn default() -> Self {
        Self::new(&ProcessorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_defaults() {
        let params = GateParameters::default();
        assert_eq!(params.cutoff_db(), -30.0);
        assert_eq!(params.balance(), 0.5);
        assert_eq!(params.dry_wet(), 1.0);
        assert_eq!(params.fft_size(), FftSize::S1024);
        assert_eq!(params.fft_size_index(), 4);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let params = GateParameters::default();

        params.set_cutoff_db(-200.0);
        assert_eq!(params.cutoff_db(), -60.0);
        params.set_cutoff_db(12.0);
        assert_eq!(params.cutoff_db(), 0.0);

        params.set_balance(-1.0);
        assert_eq!(params.balance(), 0.0);
        params.set_dry_wet(1.5);
        assert_eq!(params.dry_wet(), 1.0);
        params.set_dry_wet(f32::NAN);
        assert_eq!(params.dry_wet(), 0.0);

        params.set_fft_size_index(99);
        assert_eq!(params.fft_size(), FftSize::S2048);
    }

    #[test]
    fn test_normalized_setters() {
        let params = GateParameters::default();
        params.set_cutoff_normalized(0.25);
        assert!((params.cutoff_db() - (-45.0)).abs() < 1e-4);
        params.set_balance_normalized(0.333);
        assert!((params.balance() - 0.33).abs() < 1e-6);
        params.set_dry_wet_normalized(0.0);
        assert_eq!(params.dry_wet(), 0.0);
    }

    #[test]
    fn test_shared_across_threads() {
        let params = Arc::new(GateParameters::default());
        let writer = {
            let params = Arc::clone(&params);
            std::thread::spawn(move || {
                params.set_balance(0.2);
                params.set_fft_size(FftSize::S256);
            })
        };
        writer.join().unwrap();

        assert_eq!(params.balance(), 0.2);
        assert_eq!(params.to_config().fft_size, FftSize::S256);
    }

    #[test]
    fn test_float_values_round_trip_exactly() {
        let params = Arc::new(GateParameters::default());
        let writer = {
            let params = Arc::clone(&params);
            std::thread::spawn(move || {
                params.set_cutoff_db(-17.3);
                params.set_dry_wet(0.123_456_7);
            })
        };
        writer.join().unwrap();

        assert_eq!(params.cutoff_db().to_bits(), (-17.3f32).to_bits());
        assert_eq!(params.dry_wet().to_bits(), 0.123_456_7f32.to_bits());
    }
}
