//! Frame configuration and control parameter ranges

use crate::error::SpectralError;

/// Largest supported FFT size, used to preallocate every buffer once
pub const MAX_FFT_SIZE: usize = 2048;

/// Number of spectrum bins published for the largest FFT size
pub const MAX_SPECTRUM_BINS: usize = MAX_FFT_SIZE / 2;

/// Sample rate assumed when a host processes without preparing first
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Supported analysis resolutions
///
/// The discrete selector exposed to the control layer maps index 0..=5 onto
/// these variants in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FftSize {
    S64,
    S128,
    S256,
    S512,
    #[default]
    S1024,
    S2048,
}

impl FftSize {
    /// All sizes in selector order
    pub const ALL: [FftSize; 6] = [
        FftSize::S64,
        FftSize::S128,
        FftSize::S256,
        FftSize::S512,
        FftSize::S1024,
        FftSize::S2048,
    ];

    /// Map a selector index onto a size, clamping out-of-range indices
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Selector index of this size
    pub fn index(self) -> usize {
        match self {
            FftSize::S64 => 0,
            FftSize::S128 => 1,
            FftSize::S256 => 2,
            FftSize::S512 => 3,
            FftSize::S1024 => 4,
            FftSize::S2048 => 5,
        }
    }

    /// Number of samples per frame
    pub fn size(self) -> usize {
        1 << self.order()
    }

    /// log2 of the frame size
    pub fn order(self) -> u32 {
        6 + self.index() as u32
    }

    /// Hop between consecutive frames (75% overlap)
    pub fn hop_size(self) -> usize {
        self.size() / 4
    }

    /// Number of bins published to the spectrum snapshot
    pub fn num_bins(self) -> usize {
        self.size() / 2
    }
}

impl TryFrom<usize> for FftSize {
    type Error = SpectralError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.size() == size)
            .ok_or(SpectralError::UnsupportedFftSize(size))
    }
}

impl std::fmt::Display for FftSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.size())
    }
}

/// Active frame geometry derived from an [`FftSize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    pub fft_size: FftSize,
    pub size: usize,
    pub order: u32,
    pub hop_size: usize,
}

impl From<FftSize> for FrameConfig {
    fn from(fft_size: FftSize) -> Self {
        Self {
            fft_size,
            size: fft_size.size(),
            order: fft_size.order(),
            hop_size: fft_size.hop_size(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        FftSize::default().into()
    }
}

/// Range of a continuous control value
///
/// Mirrors the ranges a host exposes for automation: plain values live in
/// `[min, max]`, normalized values in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl ParamRange {
    /// Clamp a plain value into range (NaN maps to `min`)
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Snap a plain value to the nearest step
    pub fn snap(&self, value: f32) -> f32 {
        let value = self.clamp(value);
        if self.step <= 0.0 {
            return value;
        }
        let steps = ((value - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }

    /// Convert a normalized value in `[0, 1]` to a plain value
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let t = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
        self.min + t * (self.max - self.min)
    }

    /// Convert a plain value to `[0, 1]`
    pub fn to_normalized(&self, value: f32) -> f32 {
        (self.clamp(value) - self.min) / (self.max - self.min)
    }
}

/// Cutoff threshold in dB, compared against unnormalized bin magnitudes
pub const CUTOFF_DB: ParamRange = ParamRange {
    min: -60.0,
    max: 0.0,
    step: 0.1,
    default: -30.0,
};

/// Gain applied to bins below the cutoff (0 = strong gate, 1 = weak gate)
pub const BALANCE: ParamRange = ParamRange {
    min: 0.0,
    max: 1.0,
    step: 0.01,
    default: 0.5,
};

/// Dry/wet mix (0 = dry only, 1 = wet only)
pub const DRY_WET: ParamRange = ParamRange {
    min: 0.0,
    max: 1.0,
    step: 0.01,
    default: 1.0,
};

/// Initial processor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Cutoff threshold in dB
    pub cutoff_db: f32,

    /// Attenuation gain for bins below the cutoff
    pub balance: f32,

    /// Dry/wet mix
    pub dry_wet: f32,

    /// Analysis resolution
    pub fft_size: FftSize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cutoff_db: CUTOFF_DB.default,
            balance: BALANCE.default,
            dry_wet: DRY_WET.default,
            fft_size: FftSize::default(),
        }
    }
}
