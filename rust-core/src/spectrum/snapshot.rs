//! Spectrum snapshot shared between the audio thread and a visualizer
//!
//! The audio thread fills its own [`SpectrumFrame`] while gating, then
//! copies it into the shared [`SpectrumStore`] in one short critical
//! section. Readers take a copy under the same lock, so magnitudes, gate
//! flags and their length always come from the same frame.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{FftSize, MAX_SPECTRUM_BINS};

/// Per-bin state produced by one gated frame (owned by the audio thread)
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    pub magnitudes: Vec<f32>,
    pub gated: Vec<bool>,
}

impl SpectrumFrame {
    /// Create a zeroed frame for `fft_size`, preallocated for the largest size
    pub fn new(fft_size: FftSize) -> Self {
        let mut frame = Self {
            magnitudes: Vec::with_capacity(MAX_SPECTRUM_BINS),
            gated: Vec::with_capacity(MAX_SPECTRUM_BINS),
        };
        frame.resize(fft_size);
        frame
    }

    /// Resize to `fft_size / 2` bins and zero every entry
    pub fn resize(&mut self, fft_size: FftSize) {
        let bins = fft_size.num_bins();
        self.magnitudes.clear();
        self.magnitudes.resize(bins, 0.0);
        self.gated.clear();
        self.gated.resize(bins, false);
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// Check if the frame holds no bins
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Published spectrum state as seen by a reader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumSnapshot {
    /// Magnitude per bin (raw transform magnitude, linear)
    pub magnitudes: Vec<f32>,

    /// True where the bin passed the gate (magnitude at or above cutoff)
    pub gated: Vec<bool>,

    /// FFT size the arrays belong to
    pub fft_size: usize,

    /// Number of frames published since the store was created
    pub frame_index: u64,
}

/// Thread-safe handle to the published spectrum
///
/// Cloning yields another handle to the same snapshot.
#[derive(Debug, Clone)]
pub struct SpectrumStore {
    inner: Arc<Mutex<SpectrumSnapshot>>,
}

impl SpectrumStore {
    /// Create a store sized for `fft_size`
    pub fn new(fft_size: FftSize) -> Self {
        let bins = fft_size.num_bins();
        let mut magnitudes = Vec::with_capacity(MAX_SPECTRUM_BINS);
        magnitudes.resize(bins, 0.0);
        let mut gated = Vec::with_capacity(MAX_SPECTRUM_BINS);
        gated.resize(bins, false);

        Self {
            inner: Arc::new(Mutex::new(SpectrumSnapshot {
                magnitudes,
                gated,
                fft_size: fft_size.size(),
                frame_index: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpectrumSnapshot> {
        // A panicking reader must not silence the audio thread's publications
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resize the published arrays and zero them, as one atomic step
    pub fn resize(&self, fft_size: FftSize) {
        let bins = fft_size.num_bins();
        let mut snapshot = self.lock();
        snapshot.magnitudes.clear();
        snapshot.magnitudes.resize(bins, 0.0);
        snapshot.gated.clear();
        snapshot.gated.resize(bins, false);
        snapshot.fft_size = fft_size.size();
    }

    /// Publish a gated frame
    ///
    /// A frame whose length does not match the published size is dropped;
    /// that only happens if a resize was not propagated to the frame.
    pub fn publish(&self, frame: &SpectrumFrame) {
        let mut snapshot = self.lock();
        if snapshot.magnitudes.len() != frame.len() {
            return;
        }
        snapshot.magnitudes.copy_from_slice(&frame.magnitudes);
        snapshot.gated.copy_from_slice(&frame.gated);
        snapshot.frame_index = snapshot.frame_index.wrapping_add(1);
    }

    /// Copy of the latest magnitudes and gate flags (same length)
    pub fn spectrum_data(&self) -> (Vec<f32>, Vec<bool>) {
        let snapshot = self.lock();
        (snapshot.magnitudes.clone(), snapshot.gated.clone())
    }

    /// Copy the latest spectrum into caller-owned buffers
    ///
    /// # Returns
    /// Frame index of the copied snapshot
    pub fn read_into(&self, magnitudes: &mut Vec<f32>, gated: &mut Vec<bool>) -> u64 {
        let snapshot = self.lock();
        magnitudes.clear();
        magnitudes.extend_from_slice(&snapshot.magnitudes);
        gated.clear();
        gated.extend_from_slice(&snapshot.gated);
        snapshot.frame_index
    }

    /// Full copy of the latest snapshot
    pub fn snapshot(&self) -> SpectrumSnapshot {
        self.lock().clone()
    }

    /// FFT size of the published arrays
    pub fn fft_size(&self) -> usize {
        self.lock().fft_size
    }

    /// Number of frames published so far
    pub fn frame_index(&self) -> u64 {
        self.lock().frame_index
    }
}
