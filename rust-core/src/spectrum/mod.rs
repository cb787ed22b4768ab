//! Windowed FFT analysis/synthesis, spectral gating and spectrum publication

pub mod fft;
pub mod gate;
pub mod snapshot;
pub mod windowing;

pub use fft::{bin_to_hz, FftEngine};
pub use gate::{db_to_gain, SpectralGate};
pub use snapshot::{SpectrumFrame, SpectrumSnapshot, SpectrumStore};
