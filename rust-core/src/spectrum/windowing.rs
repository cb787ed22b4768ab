//! Analysis window for the STFT
//!
//! Uses the periodic Hann window, w[n] = 0.5 - 0.5*cos(2πn/N), scaled to a
//! mean of one so the forward transform keeps the signal's level: a
//! bin-centred sinusoid of amplitude A reads magnitude A·N/2. Shifted copies
//! spaced N/4 apart sum to a constant, which the overlap-add stage relies on.

use std::f32::consts::PI;

/// Fill `window` with a periodic Hann window of `length` samples
///
/// Reuses the vector's allocation; no reallocation happens as long as
/// `length` does not exceed the current capacity.
pub fn fill_hann_window(window: &mut Vec<f32>, length: usize) {
    window.clear();
    let m = length as f32;
    window.extend((0..length).map(|n| {
        let angle = 2.0 * PI * n as f32 / m;
        0.5 - 0.5 * angle.cos()
    }));
}

/// Generate a periodic Hann window
pub fn hann_window(length: usize) -> Vec<f32> {
    let mut window = Vec::with_capacity(length);
    fill_hann_window(&mut window, length);
    window
}

/// Scale a window in place so its samples sum to its length
pub fn normalize_window(window: &mut [f32]) {
    let sum: f32 = window.iter().sum();
    if sum > 0.0 {
        let factor = window.len() as f32 / sum;
        for w in window.iter_mut() {
            *w *= factor;
        }
    }
}

/// Apply window in-place
pub fn apply_window_inplace(signal: &mut [f32], window: &[f32]) {
    for (s, w) in signal.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}

/// Constant sum of window copies overlapped every `hop_size` samples
pub fn overlap_add_gain(window: &[f32], hop_size: usize) -> f32 {
    let sum: f32 = window.iter().sum();
    sum / hop_size as f32
}
