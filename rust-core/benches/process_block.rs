use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spectral_gate::config::{FftSize, ProcessorConfig};
use spectral_gate::SpectralGateProcessor;

const BLOCK_SIZE: usize = 512;

fn test_block() -> Vec<f32> {
    (0..BLOCK_SIZE)
        .map(|n| {
            let t = n as f32 / 48000.0;
            0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
                + 0.01 * (2.0 * std::f32::consts::PI * 7000.0 * t).sin()
        })
        .collect()
}

fn bench_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_block");
    group.throughput(Throughput::Elements(BLOCK_SIZE as u64));
    let input = test_block();

    for fft_size in FftSize::ALL {
        let mut processor = SpectralGateProcessor::new(ProcessorConfig {
            fft_size,
            ..ProcessorConfig::default()
        });
        processor.prepare(48000.0, BLOCK_SIZE, 1);
        let mut block = input.clone();

        group.bench_with_input(BenchmarkId::from_parameter(fft_size), &fft_size, |b, _| {
            b.iter(|| {
                block.copy_from_slice(&input);
                processor.process_block(black_box(&mut [&mut block[..]]));
            })
        });
    }

    group.finish();
}

fn bench_reconfigure(c: &mut Criterion) {
    let mut processor = SpectralGateProcessor::default();
    processor.prepare(48000.0, BLOCK_SIZE, 2);
    let params = processor.parameters();
    let mut left = test_block();
    let mut right = test_block();
    let mut index = 0;

    c.bench_function("reconfigure_stereo", |b| {
        b.iter(|| {
            index = (index + 1) % FftSize::ALL.len();
            params.set_fft_size_index(index);
            processor.process_block(&mut [&mut left[..], &mut right[..]]);
        })
    });
}

criterion_group!(benches, bench_process_block, bench_reconfigure);
criterion_main!(benches);
