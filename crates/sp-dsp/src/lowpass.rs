//! One-pole low-pass smoothing filter
//!
//! `y[n] = y[n-1] + a * (x[n] - y[n-1])` with `a = 1 - exp(-2π·fc/fs)`.
//! Used both as a signal filter ([`LowPass::proc`]) and for ramping a
//! control value toward a target ([`LowPass::ctrl`]).

use sp_core::{FlushDenormal, Sample};
use std::f64::consts::PI;

use crate::{MonoProcessor, Processor, ProcessorConfig};

/// Single-pole exponential smoother
#[derive(Debug, Clone)]
pub struct LowPass {
    rate: f64,
    cutoff: f32,
    a: f32,
    z: f32,
}

impl LowPass {
    pub fn new(sample_rate: f64, freq: f32) -> Self {
        let mut filter = Self {
            rate: sample_rate,
            cutoff: freq,
            a: 1.0,
            z: 0.0,
        };
        filter.set_cutoff(freq);
        filter
    }

    /// Set the corner frequency in Hz
    pub fn set_cutoff(&mut self, freq: f32) {
        self.cutoff = freq;
        self.a = Self::coefficient_for(freq, self.rate);
    }

    fn coefficient_for(freq: f32, rate: f64) -> f32 {
        let a = (1.0 - (-2.0 * PI * freq as f64 / rate).exp()) as f32;
        if a.is_nan() {
            1.0
        } else {
            // keep the pole inside (0, 1]
            a.clamp(f32::EPSILON, 1.0)
        }
    }

    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.a
    }

    #[inline]
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Current filter memory
    #[inline]
    pub fn state(&self) -> f32 {
        self.z
    }

    /// Filter `data` in place
    ///
    /// The register is flushed to zero afterwards if it left the normal range.
    pub fn proc(&mut self, data: &mut [Sample]) {
        let a = self.a;
        let mut z = self.z;
        for sample in data.iter_mut() {
            z += a * (*sample - z);
            *sample = z;
        }
        self.z = z.flush_denormal();
    }

    /// Ramp from the current state toward `target`, writing the trajectory
    /// into `data`
    ///
    /// Unlike [`proc`](Self::proc) the register is left as computed.
    pub fn ctrl(&mut self, data: &mut [Sample], target: Sample) {
        let a = self.a;
        let mut z = self.z;
        for sample in data.iter_mut() {
            z += a * (target - z);
            *sample = z;
        }
        self.z = z;
    }
}

impl Processor for LowPass {
    fn reset(&mut self) {
        self.z = 0.0;
    }
}

impl MonoProcessor for LowPass {
    #[inline]
    fn process_block(&mut self, buffer: &mut [Sample]) {
        self.proc(buffer);
    }
}

impl ProcessorConfig for LowPass {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.rate = sample_rate;
        self.set_cutoff(self.cutoff);
    }
}
