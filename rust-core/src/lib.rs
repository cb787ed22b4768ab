//! Spectral Gate - Real-time Spectral Noise Gate Core
//!
//! Overlap-add STFT engine that attenuates frequency bins below a magnitude
//! threshold, with a thread-safe spectrum snapshot for visualization, an
//! optional live monitor and Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod config;
pub mod error;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{GateParameters, SpectralGateProcessor};
pub use config::{FftSize, ProcessorConfig};
pub use error::{Result, SpectralError};
pub use spectrum::{SpectralGate, SpectrumSnapshot, SpectrumStore};
