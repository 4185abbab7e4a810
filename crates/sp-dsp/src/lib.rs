//! sp-dsp: real-time signal-processing primitives
//!
//! Every per-block entry point runs without allocating or locking. The only
//! shared resource is the FFT planning lock in [`fft_engine`], taken while
//! analyzers are (re)configured or dropped.
//!
//! ## Modules
//! - `util` - buffer fill/multiply, meter scaling, peak scan
//! - `lowpass` - one-pole smoothing filter
//! - `biquad` - RBJ cookbook and Vicanek matched second-order sections
//! - `fft_engine` - shared realfft plan cache behind the planning lock
//! - `spectrum` - Hann-windowed linear power spectrum
//! - `perceptual` - frequency-warped analyzer (all-pass cascade + FFT)
//! - `correlation` - stereo phase correlation meter
//! - `generator` - white, Gaussian and pink noise sources

pub mod util;
pub mod lowpass;
pub mod biquad;
pub mod fft_engine;
pub mod spectrum;
pub mod perceptual;
pub mod correlation;
pub mod generator;

pub use biquad::{Biquad, BiquadCoeffs, BiquadParams, FilterType};
pub use correlation::StereoCorrelation;
pub use fft_engine::FftEngine;
pub use generator::{Generator, NoiseType, ParkMiller};
pub use lowpass::LowPass;
pub use perceptual::{PerceptualAnalyzer, ProcessMode, Speed, Warp};
pub use spectrum::FftSpectrum;

use sp_core::Sample;

/// Trait for all stateful filters
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono in-place block processor
pub trait MonoProcessor: Processor {
    /// Process a block of samples in place
    fn process_block(&mut self, buffer: &mut [Sample]);
}

/// Processor configuration for sample rate changes
pub trait ProcessorConfig {
    fn set_sample_rate(&mut self, sample_rate: f64);
}
