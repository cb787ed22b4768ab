//! Spectral gate stream processor
//!
//! Drives one overlap-add pipeline per channel through the windowed FFT
//! engine and the spectral gate, mixes the result against the dry input and
//! applies FFT-size changes at block boundaries. Everything on the
//! `process_block` path runs in preallocated buffers.

use std::sync::Arc;

use super::params::GateParameters;
use super::pipeline::{FrameProcessor, OverlapAddPipeline};
use crate::config::{FftSize, ProcessorConfig, DEFAULT_SAMPLE_RATE};
use crate::error::Result;
use crate::spectrum::{FftEngine, SpectralGate, SpectrumFrame, SpectrumStore};

/// Host lifecycle state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessorState {
    Unprepared,
    Prepared { sample_rate: f64, max_block_size: usize },
}

/// Frame stage: analyze, gate, publish, synthesize
struct GateStage<'a> {
    engine: &'a mut FftEngine,
    gate: SpectralGate,
    frame: &'a mut SpectrumFrame,
    store: &'a SpectrumStore,
}

impl GateStage<'_> {
    fn run(&mut self, input: &[f32], output: &mut [f32]) -> Result<()> {
        let spectrum = self.engine.analyze(input)?;
        self.gate.apply(spectrum, self.frame);
        self.store.publish(self.frame);
        self.engine.synthesize(output)?;

        let norm = 1.0 / self.engine.overlap_gain();
        for sample in output.iter_mut() {
            *sample *= norm;
        }
        Ok(())
    }
}

impl FrameProcessor for GateStage<'_> {
    fn process_frame(&mut self, input: &[f32], output: &mut [f32]) {
        if let Err(e) = self.run(input, output) {
            // Unreachable while engine and pipelines share one frame size
            log::error!("Spectral frame dropped: {}", e);
            output.fill(0.0);
        }
    }
}

/// Real-time spectral gate
///
/// Control values are read from a shared [`GateParameters`]; the spectrum of
/// the most recent frame is published to a shared [`SpectrumStore`].
pub struct SpectralGateProcessor {
    params: Arc<GateParameters>,
    store: SpectrumStore,
    engine: FftEngine,

    /// Audio-owned per-bin state, copied into `store` after each frame
    frame: SpectrumFrame,

    /// One pipeline per channel
    pipelines: Vec<OverlapAddPipeline>,

    /// Planar scratch for interleaved callers
    planar: Vec<f32>,

    /// Frame size the engine, pipelines and store are configured for
    active_size: FftSize,

    state: ProcessorState,
}

impl SpectralGateProcessor {
    /// Create processor with its own parameters and spectrum store
    pub fn new(config: ProcessorConfig) -> Self {
        let params = Arc::new(GateParameters::new(&config));
        let store = SpectrumStore::new(config.fft_size);
        Self::with_shared(params, store)
    }

    /// Create processor around parameters and a store owned elsewhere
    pub fn with_shared(params: Arc<GateParameters>, store: SpectrumStore) -> Self {
        let fft_size = params.fft_size();
        store.resize(fft_size);

        Self {
            params,
            store,
            engine: FftEngine::new(fft_size),
            frame: SpectrumFrame::new(fft_size),
            pipelines: Vec::new(),
            planar: Vec::new(),
            active_size: fft_size,
            state: ProcessorState::Unprepared,
        }
    }

    /// Whether the host channel layout can be processed
    ///
    /// Mono or stereo, with as many inputs as outputs.
    pub fn supports_layout(input_channels: usize, output_channels: usize) -> bool {
        matches!(output_channels, 1 | 2) && input_channels == output_channels
    }

    /// Allocate per-channel state and reset every buffer
    ///
    /// Called by the host before processing starts, outside the audio callback.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize, num_channels: usize) {
        self.apply_fft_size(self.params.fft_size());

        self.pipelines.clear();
        self.pipelines
            .extend((0..num_channels).map(|_| OverlapAddPipeline::new(self.active_size)));

        self.planar.clear();
        self.planar.resize(max_block_size * num_channels, 0.0);

        self.state = ProcessorState::Prepared {
            sample_rate,
            max_block_size,
        };

        log::info!(
            "Spectral gate prepared: {} Hz, block {}, {} channel(s), FFT {}",
            sample_rate,
            max_block_size,
            num_channels,
            self.active_size
        );
    }

    /// Drop per-channel state; the next block requires `prepare` again
    pub fn release(&mut self) {
        self.pipelines.clear();
        self.planar = Vec::new();
        self.state = ProcessorState::Unprepared;
        log::info!("Spectral gate released");
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Check if `prepare` has run since construction or the last `release`
    pub fn is_prepared(&self) -> bool {
        matches!(self.state, ProcessorState::Prepared { .. })
    }

    /// Process one block in place
    ///
    /// # Arguments
    /// * `channels` - One mutable slice per channel; all are processed
    ///   independently and may be any length
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) {
        if !self.is_prepared() {
            let block = channels.iter().map(|c| c.len()).max().unwrap_or(0);
            log::warn!("process_block called before prepare; preparing with defaults");
            self.prepare(DEFAULT_SAMPLE_RATE, block, channels.len());
        }

        if channels.len() > self.pipelines.len() {
            log::warn!(
                "Block has {} channels, prepared for {}",
                channels.len(),
                self.pipelines.len()
            );
            let size = self.active_size;
            self.pipelines
                .resize_with(channels.len(), || OverlapAddPipeline::new(size));
        }

        // Reconfigure before touching any sample of this block
        let requested = self.params.fft_size();
        if requested != self.active_size {
            self.apply_fft_size(requested);
        }

        let dry_wet = self.params.dry_wet();
        let mut stage = GateStage {
            engine: &mut self.engine,
            gate: SpectralGate::new(self.params.cutoff_db(), self.params.balance()),
            frame: &mut self.frame,
            store: &self.store,
        };

        for (channel, pipeline) in channels.iter_mut().zip(self.pipelines.iter_mut()) {
            for sample in channel.iter_mut() {
                let dry = *sample;
                let wet = pipeline.process_sample(dry, &mut stage);
                *sample = dry * (1.0 - dry_wet) + wet * dry_wet;
            }
        }
    }

    /// Process an interleaved mono or stereo buffer in place
    ///
    /// Trailing samples that do not fill a whole frame are left untouched,
    /// as is the whole buffer for any other channel count.
    pub fn process_interleaved(&mut self, data: &mut [f32], num_channels: usize) {
        if !matches!(num_channels, 1 | 2) {
            return;
        }
        let frames = data.len() / num_channels;
        if frames == 0 {
            return;
        }

        let needed = frames * num_channels;
        if self.planar.len() < needed {
            log::warn!("Interleaved block of {} frames exceeds prepared size", frames);
            self.planar.resize(needed, 0.0);
        }

        // Detach the scratch so `process_block` can borrow self mutably
        let mut planar = std::mem::take(&mut self.planar);

        for (f, frame) in data.chunks_exact(num_channels).enumerate() {
            for (c, &sample) in frame.iter().enumerate() {
                planar[c * frames + f] = sample;
            }
        }

        if num_channels == 1 {
            self.process_block(&mut [&mut planar[..frames]]);
        } else {
            let (left, right) = planar[..needed].split_at_mut(frames);
            self.process_block(&mut [left, right]);
        }

        for (f, frame) in data.chunks_exact_mut(num_channels).enumerate() {
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = planar[c * frames + f];
            }
        }

        self.planar = planar;
    }

    /// Switch every component to `fft_size`, discarding pipeline state
    fn apply_fft_size(&mut self, fft_size: FftSize) {
        self.engine.configure(fft_size);
        for pipeline in self.pipelines.iter_mut() {
            pipeline.reconfigure(fft_size);
        }
        self.frame.resize(fft_size);
        self.store.resize(fft_size);
        self.active_size = fft_size;
    }

    /// Shared control parameters
    pub fn parameters(&self) -> Arc<GateParameters> {
        Arc::clone(&self.params)
    }

    /// Handle to the published spectrum
    pub fn spectrum_store(&self) -> SpectrumStore {
        self.store.clone()
    }

    /// Latest magnitudes and gate flags, `fft_size / 2` entries each
    pub fn spectrum_data(&self) -> (Vec<f32>, Vec<bool>) {
        self.store.spectrum_data()
    }

    /// Active FFT size in samples
    pub fn fft_size(&self) -> usize {
        self.active_size.size()
    }

    /// Processing delay in samples at the active FFT size
    pub fn latency_samples(&self) -> usize {
        self.active_size.size()
    }

    /// Number of channels with allocated pipelines
    pub fn num_channels(&self) -> usize {
        self.pipelines.len()
    }
}

impl Default for SpectralGateProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Sine whose frequency sits exactly on `bin` of an `fft_size` frame
    fn bin_sine(len: usize, bin: usize, fft_size: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * (bin * n % fft_size) as f32 / fft_size as f32).sin())
            .collect()
    }

    fn sine_hz(len: usize, freq: f32, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * freq * n as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn rms(signal: &[f32]) -> f32 {
        (signal.iter().map(|x| x * x).sum::<f32>() / signal.len() as f32).sqrt()
    }

    fn processor(cutoff_db: f32, balance: f32, dry_wet: f32, fft_size: FftSize) -> SpectralGateProcessor {
        let mut processor = SpectralGateProcessor::new(ProcessorConfig {
            cutoff_db,
            balance,
            dry_wet,
            fft_size,
        });
        processor.prepare(SAMPLE_RATE as f64, 512, 1);
        processor
    }

    /// Run a mono signal through in fixed-size blocks
    fn run_mono(processor: &mut SpectralGateProcessor, input: &[f32], block: usize) -> Vec<f32> {
        let mut output = input.to_vec();
        for chunk in output.chunks_mut(block) {
            processor.process_block(&mut [chunk]);
        }
        output
    }

    #[test]
    fn test_layout_support() {
        assert!(SpectralGateProcessor::supports_layout(1, 1));
        assert!(SpectralGateProcessor::supports_layout(2, 2));
        assert!(!SpectralGateProcessor::supports_layout(1, 2));
        assert!(!SpectralGateProcessor::supports_layout(6, 6));
        assert!(!SpectralGateProcessor::supports_layout(0, 0));
    }

    #[test]
    fn test_lifecycle() {
        let mut processor = SpectralGateProcessor::default();
        assert_eq!(processor.state(), ProcessorState::Unprepared);

        processor.prepare(44100.0, 256, 2);
        assert_eq!(
            processor.state(),
            ProcessorState::Prepared {
                sample_rate: 44100.0,
                max_block_size: 256
            }
        );
        assert_eq!(processor.num_channels(), 2);

        processor.release();
        assert!(!processor.is_prepared());
        assert_eq!(processor.num_channels(), 0);
    }

    #[test]
    fn test_process_before_prepare_is_lazy() {
        let mut processor = SpectralGateProcessor::default();
        let mut left = vec![0.1; 128];
        let mut right = vec![0.1; 128];
        processor.process_block(&mut [&mut left[..], &mut right[..]]);

        assert!(processor.is_prepared());
        assert_eq!(processor.num_channels(), 2);
        assert!(left.iter().chain(right.iter()).all(|x| x.is_finite()));
    }

    #[test]
    fn test_latency_through_processor() {
        for &fft_size in &[FftSize::S1024, FftSize::S256] {
            // Weak gate passes every bin unchanged
            let mut processor = processor(-30.0, 1.0, 1.0, fft_size);
            let latency = processor.latency_samples();
            assert_eq!(latency, fft_size.size());

            let input = sine_hz(fft_size.size() * 8, 440.0, 0.5);
            let output = run_mono(&mut processor, &input, 100);

            for t in (2 * fft_size.size())..output.len() {
                assert!(
                    (output[t] - input[t - latency]).abs() < 1e-4,
                    "FFT {} at {}: {} vs {}",
                    fft_size,
                    t,
                    output[t],
                    input[t - latency]
                );
            }
        }
    }

    #[test]
    fn test_pass_through_preserves_rms() {
        // One tone below the cutoff, one above: neither is attenuated at balance 1
        for &amplitude in &[0.0001f32, 0.5] {
            let mut processor = processor(-20.0, 1.0, 1.0, FftSize::S1024);
            let input = sine_hz(48000, 1000.0, amplitude);
            let output = run_mono(&mut processor, &input, 512);

            let steady_out = &output[4096..];
            let steady_in = &input[4096 - 1024..input.len() - 1024];
            let ratio = rms(steady_out) / rms(steady_in);
            assert!((ratio - 1.0).abs() < 0.01, "amplitude {}: ratio {}", amplitude, ratio);
        }
    }

    #[test]
    fn test_full_suppression() {
        // Peak bin of a 0.001 amplitude sine reads at most 0.512 with 1024 points,
        // under the 0 dB threshold of 1.0
        let input = sine_hz(32768, 1000.0, 0.001);

        let mut wet = processor(0.0, 0.0, 1.0, FftSize::S1024);
        let output = run_mono(&mut wet, &input, 512);
        assert!(rms(&output[4096..]) < 1e-7);

        let mut dry = processor(0.0, 0.0, 0.0, FftSize::S1024);
        let output = run_mono(&mut dry, &input, 512);
        assert_eq!(output, input);
    }

    #[test]
    fn test_gate_classification_two_tones() {
        let fft_size = 1024;
        let loud_bin = 64;
        let quiet_bin = 200;
        let loud = bin_sine(8192, loud_bin, fft_size, 0.5);
        let quiet = bin_sine(8192, quiet_bin, fft_size, 0.0001);
        let input: Vec<f32> = loud.iter().zip(&quiet).map(|(a, b)| a + b).collect();

        // Bin magnitudes read A·N/2: 256 (+48 dB) and 0.0512 (-26 dB) around a -20 dB cutoff
        let mut processor = processor(-20.0, 0.0, 1.0, FftSize::S1024);
        run_mono(&mut processor, &input, 256);

        let (magnitudes, gated) = processor.spectrum_data();
        assert_eq!(magnitudes.len(), 512);
        assert_eq!(gated.len(), 512);

        assert!(gated[loud_bin]);
        assert!((magnitudes[loud_bin] - 256.0).abs() < 0.5);
        assert!(!gated[quiet_bin]);
        assert!((magnitudes[quiet_bin] - 0.0512).abs() < 0.005);

        // Only the loud tone's main lobe passes
        let passed: Vec<usize> = (0..512).filter(|&k| gated[k]).collect();
        assert_eq!(passed, vec![loud_bin - 1, loud_bin, loud_bin + 1]);
    }

    #[test]
    fn test_quiet_tone_passes_raw_threshold() {
        // A -40 dBFS tone reads 5.12 in a 1024-point frame, above the -30 dB threshold of 0.0316
        let fft_size = FftSize::S1024;
        let bin = 64;
        let input = bin_sine(16384, bin, fft_size.size(), 0.01);
        let mut processor = processor(-30.0, 0.0, 1.0, fft_size);
        let output = run_mono(&mut processor, &input, 512);

        let (magnitudes, gated) = processor.spectrum_data();
        assert!(gated[bin]);
        assert!((magnitudes[bin] - 5.12).abs() < 0.05, "magnitude {}", magnitudes[bin]);
        assert!(gated[bin - 1] && gated[bin + 1]);

        let latency = processor.latency_samples();
        let steady_out = &output[4096..];
        let steady_in = &input[4096 - latency..input.len() - latency];
        let ratio = rms(steady_out) / rms(steady_in);
        assert!((ratio - 1.0).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn test_reconfiguration_mid_stream() {
        let mut processor = processor(-40.0, 0.2, 0.7, FftSize::S1024);
        let params = processor.parameters();
        let store = processor.spectrum_store();
        let input = sine_hz(256 * 120, 523.0, 0.8);

        let mut output = input.clone();
        for (i, chunk) in output.chunks_mut(256).enumerate() {
            if i % 10 == 0 {
                params.set_fft_size_index((i / 10) % 7);
            }
            processor.process_block(&mut [chunk]);

            let expected = params.fft_size();
            assert_eq!(processor.fft_size(), expected.size());
            assert_eq!(store.fft_size(), expected.size());
            let (magnitudes, gated) = store.spectrum_data();
            assert_eq!(magnitudes.len(), expected.num_bins());
            assert_eq!(gated.len(), expected.num_bins());
        }

        assert!(output.iter().all(|x| x.is_finite() && x.abs() <= 2.0));
    }

    #[test]
    fn test_identity_amplitude() {
        // Cutoff at the floor and a bin-centred tone: nothing meaningful is gated
        let fft_size = FftSize::S512;
        let input = bin_sine(16384, 24, fft_size.size(), 0.7);
        let mut processor = processor(-60.0, 0.0, 1.0, fft_size);
        let output = run_mono(&mut processor, &input, 333);

        let peak = output[2048..]
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!((peak - 0.7).abs() < 0.007, "peak {}", peak);
    }

    #[test]
    fn test_channels_processed_independently() {
        let mut processor = processor(-30.0, 1.0, 1.0, FftSize::S256);
        processor.prepare(SAMPLE_RATE as f64, 128, 2);

        let left_in = sine_hz(4096, 300.0, 0.5);
        let right_in = vec![0.0; 4096];
        let mut left = left_in.clone();
        let mut right = right_in.clone();
        for (l, r) in left.chunks_mut(128).zip(right.chunks_mut(128)) {
            processor.process_block(&mut [l, r]);
        }

        assert!(right.iter().all(|&x| x == 0.0));
        for t in 512..4096 {
            assert!((left[t] - left_in[t - 256]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let left_in = sine_hz(3000, 440.0, 0.4);
        let right_in = sine_hz(3000, 1250.0, 0.2);

        let mut planar = processor(-25.0, 0.1, 0.8, FftSize::S256);
        planar.prepare(SAMPLE_RATE as f64, 300, 2);
        let mut left = left_in.clone();
        let mut right = right_in.clone();
        for (l, r) in left.chunks_mut(300).zip(right.chunks_mut(300)) {
            planar.process_block(&mut [l, r]);
        }

        let mut interleaved = processor(-25.0, 0.1, 0.8, FftSize::S256);
        interleaved.prepare(SAMPLE_RATE as f64, 300, 2);
        let mut data: Vec<f32> = left_in
            .iter()
            .zip(&right_in)
            .flat_map(|(&l, &r)| [l, r])
            .collect();
        for block in data.chunks_mut(600) {
            interleaved.process_interleaved(block, 2);
        }

        for f in 0..3000 {
            assert_eq!(data[2 * f], left[f]);
            assert_eq!(data[2 * f + 1], right[f]);
        }
    }

    #[test]
    fn test_interleaved_rejects_other_layouts() {
        let mut processor = processor(0.0, 0.0, 1.0, FftSize::S64);
        let mut data = vec![0.5; 600];
        processor.process_interleaved(&mut data, 6);
        assert!(data.iter().all(|&x| x == 0.5));
    }

    #[test]
    fn test_varying_block_sizes() {
        let mut processor = processor(-30.0, 1.0, 1.0, FftSize::S256);
        let input = sine_hz(6000, 700.0, 0.3);
        let mut output = input.clone();

        let mut offset = 0;
        for block in [1usize, 7, 256, 13, 1000, 64, 3].iter().cycle() {
            if offset >= output.len() {
                break;
            }
            let end = (offset + block).min(output.len());
            processor.process_block(&mut [&mut output[offset..end]]);
            offset = end;
        }

        for t in 512..output.len() {
            assert!((output[t] - input[t - 256]).abs() < 1e-4);
        }
    }
}
