//! Error types for the spectral processing core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectralError {
    #[error("FFT processing failed: {0}")]
    Fft(#[from] realfft::FftError),

    #[error("Frame length mismatch: expected {expected} samples, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    #[error("Unsupported FFT size {0} (expected one of 64, 128, 256, 512, 1024, 2048)")]
    UnsupportedFftSize(usize),
}

pub type Result<T> = std::result::Result<T, SpectralError>;
