//! Biquad filter benchmarks

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sp_dsp::biquad::{Biquad, BiquadCoeffs, BiquadParams, FilterType};
use sp_dsp::lowpass::LowPass;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn test_block(size: usize) -> Vec<f32> {
    (0..size).map(|i| (i as f32 * 0.01).sin()).collect()
}

fn bench_biquad_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("lowpass", block_size),
            &block_size,
            |b, &size| {
                let mut filter = Biquad::with_params(
                    BiquadParams::new(FilterType::LowPass, 1000.0, 0.707, 0.0),
                    SAMPLE_RATE,
                );
                let mut buffer = test_block(size);
                b.iter(|| filter.run(black_box(&mut buffer)));
            },
        );
    }
    group.finish();
}

fn bench_biquad_design(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad design");

    for kind in [
        FilterType::Peaking,
        FilterType::HighShelf,
        FilterType::MatchedLowPass,
        FilterType::MatchedPeaking,
    ] {
        group.bench_function(format!("{:?}", kind), |b| {
            b.iter(|| {
                BiquadCoeffs::design(
                    black_box(kind),
                    black_box(3000.0),
                    black_box(0.9),
                    black_box(6.0),
                    SAMPLE_RATE,
                )
            })
        });
    }
    group.finish();
}

fn bench_lowpass(c: &mut Criterion) {
    let mut filter = LowPass::new(SAMPLE_RATE, 1000.0);
    let mut buffer = test_block(1024);

    c.bench_function("lowpass_proc_1024", |b| {
        b.iter(|| filter.proc(black_box(&mut buffer)))
    });

    let mut ramp = vec![0.0f32; 1024];
    c.bench_function("lowpass_ctrl_1024", |b| {
        b.iter(|| filter.ctrl(black_box(&mut ramp), black_box(0.5)))
    });
}

criterion_group!(benches, bench_biquad_run, bench_biquad_design, bench_lowpass);
criterion_main!(benches);
