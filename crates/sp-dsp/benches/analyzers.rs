//! Analyzer and generator benchmarks

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sp_dsp::correlation::StereoCorrelation;
use sp_dsp::generator::{Generator, NoiseType};
use sp_dsp::perceptual::{PerceptualAnalyzer, ProcessMode};
use sp_dsp::spectrum::FftSpectrum;

const SAMPLE_RATE: f64 = 48000.0;

/// Generate test audio (440Hz sine wave)
fn generate_test_audio(samples: usize) -> Vec<f32> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5) as f32
        })
        .collect()
}

fn bench_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("FftSpectrum");

    for &window in &[1024usize, 4096, 16384] {
        group.bench_with_input(BenchmarkId::new("execute", window), &window, |b, &size| {
            let mut spectrum = FftSpectrum::new(size, SAMPLE_RATE).unwrap();
            let audio = generate_test_audio(size);
            b.iter(|| {
                spectrum.set_data_hann(black_box(&audio), 0).unwrap();
                spectrum.execute();
                black_box(spectrum.power_at_bin(10, 1.0, false))
            });
        });
    }
    group.finish();
}

fn bench_perceptual(c: &mut Criterion) {
    let mut analyzer = PerceptualAnalyzer::new(SAMPLE_RATE, 8192).unwrap();
    let audio = generate_test_audio(1024);

    c.bench_function("perceptual_hop", |b| {
        b.iter(|| analyzer.push_samples(black_box(&audio), ProcessMode::Peak))
    });
}

fn bench_correlation(c: &mut Criterion) {
    let mut meter = StereoCorrelation::new(SAMPLE_RATE, 2000.0, 0.3);
    let left = generate_test_audio(1024);
    let right: Vec<f32> = left.iter().map(|s| s * 0.5).collect();

    c.bench_function("correlation_1024", |b| {
        b.iter(|| {
            meter.process(black_box(&left), black_box(&right));
            black_box(meter.read())
        })
    });
}

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Generator");

    for kind in [NoiseType::UniformWhite, NoiseType::GaussianWhite, NoiseType::Pink] {
        let mut generator = Generator::new();
        generator.set_type(kind);
        let mut buffer = vec![0.0f32; 1024];
        group.bench_function(format!("{:?}", kind), |b| {
            b.iter(|| generator.run(black_box(&mut buffer)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_spectrum,
    bench_perceptual,
    bench_correlation,
    bench_generator
);
criterion_main!(benches);
