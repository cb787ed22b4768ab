//! Overlap-add STFT pipeline
//!
//! Accumulates incoming samples into frames of `size` samples advancing by
//! `hop_size`, hands each full frame to a [`FrameProcessor`], sums the
//! returned frames into an output accumulator and streams the finished hop
//! out through a ring buffer, one sample per input sample.

use crate::config::{FftSize, FrameConfig, MAX_FFT_SIZE};

/// Per-frame transform run by the pipeline
///
/// `input` holds the `size` most recent samples, oldest first. The
/// implementation writes `size` synthesized samples into `output`; these are
/// summed with overlapping neighbours unchanged, so any overlap-add
/// normalization belongs to the implementation.
pub trait FrameProcessor {
    fn process_frame(&mut self, input: &[f32], output: &mut [f32]);
}

impl<F> FrameProcessor for F
where
    F: FnMut(&[f32], &mut [f32]),
{
    fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
        self(input, output)
    }
}

/// Single-channel overlap-add pipeline
pub struct OverlapAddPipeline {
    config: FrameConfig,

    /// Most recent untransformed samples
    input_fifo: Vec<f32>,
    input_write_pos: usize,

    /// Running overlap-add sum, indexed from the current hop
    output_accumulator: Vec<f32>,

    /// Finished samples waiting to be popped
    output_fifo: Vec<f32>,
    output_read_pos: usize,
    output_write_pos: usize,

    /// Synthesized frame returned by the frame processor
    frame_buffer: Vec<f32>,
}

impl OverlapAddPipeline {
    /// Create a pipeline for `fft_size`, preallocated for the largest size
    pub fn new(fft_size: FftSize) -> Self {
        let mut pipeline = Self {
            config: fft_size.into(),
            input_fifo: Vec::with_capacity(MAX_FFT_SIZE),
            input_write_pos: 0,
            output_accumulator: Vec::with_capacity(MAX_FFT_SIZE),
            output_fifo: Vec::with_capacity(MAX_FFT_SIZE),
            output_read_pos: 0,
            output_write_pos: 0,
            frame_buffer: Vec::with_capacity(MAX_FFT_SIZE),
        };
        pipeline.reconfigure(fft_size);
        pipeline
    }

    /// Switch frame size; resets cursors and zero-fills every buffer
    ///
    /// Does not allocate.
    pub fn reconfigure(&mut self, fft_size: FftSize) {
        self.config = fft_size.into();
        let size = self.config.size;
        for buffer in [
            &mut self.input_fifo,
            &mut self.output_accumulator,
            &mut self.output_fifo,
            &mut self.frame_buffer,
        ] {
            buffer.clear();
            buffer.resize(size, 0.0);
        }
        self.input_write_pos = 0;
        self.output_read_pos = 0;
        self.output_write_pos = 0;
    }

    /// Clear all state, keeping the current frame size
    pub fn reset(&mut self) {
        self.reconfigure(self.config.fft_size);
    }

    /// Feed one input sample
    ///
    /// # Returns
    /// `true` if this sample completed a frame and `processor` ran
    pub fn push<P>(&mut self, sample: f32, processor: &mut P) -> bool
    where
        P: FrameProcessor + ?Sized,
    {
        self.input_fifo[self.input_write_pos] = sample;
        self.input_write_pos += 1;

        if self.input_write_pos < self.config.size {
            return false;
        }

        self.frame_buffer.fill(0.0);
        processor.process_frame(&self.input_fifo, &mut self.frame_buffer);
        self.advance_hop();
        true
    }

    /// Take the next synthesized sample (zero until the first frame completes)
    pub fn pop(&mut self) -> f32 {
        let sample = self.output_fifo[self.output_read_pos];
        self.output_fifo[self.output_read_pos] = 0.0;
        self.output_read_pos = (self.output_read_pos + 1) % self.config.size;
        sample
    }

    /// Push one sample and pop the corresponding output sample
    #[inline]
    pub fn process_sample<P>(&mut self, sample: f32, processor: &mut P) -> f32
    where
        P: FrameProcessor + ?Sized,
    {
        self.push(sample, processor);
        self.pop()
    }

    /// Overlap-add the synthesized frame and shift both accumulators by a hop
    fn advance_hop(&mut self) {
        let size = self.config.size;
        let hop = self.config.hop_size;

        // Retain the overlap tail of the input
        self.input_fifo.copy_within(hop.., 0);
        self.input_fifo[size - hop..].fill(0.0);
        self.input_write_pos = size - hop;

        for (acc, &sample) in self.output_accumulator.iter_mut().zip(self.frame_buffer.iter()) {
            *acc += sample;
        }

        // The first hop is now final
        for &sample in &self.output_accumulator[..hop] {
            self.output_fifo[self.output_write_pos] = sample;
            self.output_write_pos = (self.output_write_pos + 1) % size;
        }

        self.output_accumulator.copy_within(hop.., 0);
        self.output_accumulator[size - hop..].fill(0.0);
    }

    /// Active frame configuration
    pub fn config(&self) -> FrameConfig {
        self.config
    }

    /// Delay in samples between an input sample and its reconstruction
    ///
    /// A sample pushed at position t is popped back at t + size: the frame
    /// containing it completes at most `size - 1` pushes later and its hop
    /// is written just behind the read cursor.
    pub fn latency(&self) -> usize {
        self.config.size
    }
}
