//! Stereo phase correlation meter
//!
//! Both channels are first smoothed by a one-pole low-pass, then the cross
//! term and the two auto-power terms are tracked by leaky integrators.

use sp_core::Sample;

use crate::{Processor, ProcessorConfig};

/// Per-sample offset that keeps the level integrators off zero
const LEVEL_EPSILON: f32 = 1e-20;
/// Floor added to the power integrators after every block
const POWER_EPSILON: f32 = 1e-10;

/// Leaky-integrator correlation between two channels
#[derive(Debug, Clone)]
pub struct StereoCorrelation {
    rate: f64,
    lp_freq: f32,
    tc_corr: f32,
    w1: f32,
    w2: f32,
    zl: f32,
    zr: f32,
    zlr: f32,
    zll: f32,
    zrr: f32,
}

impl StereoCorrelation {
    /// `lp_freq`: level smoothing corner in Hz, `tc_corr`: integration time
    /// in seconds
    pub fn new(sample_rate: f64, lp_freq: f32, tc_corr: f32) -> Self {
        let mut meter = Self {
            rate: sample_rate,
            lp_freq,
            tc_corr,
            w1: 0.0,
            w2: 0.0,
            zl: 0.0,
            zr: 0.0,
            zlr: 0.0,
            zll: 0.0,
            zrr: 0.0,
        };
        meter.update_coefficients();
        meter
    }

    fn update_coefficients(&mut self) {
        let rate = self.rate as f32;
        self.w1 = 6.28 * self.lp_freq / rate;
        self.w2 = 1.0 / (self.tc_corr * rate);
    }

    /// Feed one block of each channel; extra samples on the longer side are
    /// ignored
    pub fn process(&mut self, left: &[Sample], right: &[Sample]) {
        let (w1, w2) = (self.w1, self.w2);
        let mut zl = self.zl;
        let mut zr = self.zr;
        let mut zlr = self.zlr;
        let mut zll = self.zll;
        let mut zrr = self.zrr;

        for (&l, &r) in left.iter().zip(right) {
            zl += w1 * (l - zl) + LEVEL_EPSILON;
            zr += w1 * (r - zr) + LEVEL_EPSILON;
            zlr += w2 * (zl * zr - zlr);
            zll += w2 * (zl * zl - zll);
            zrr += w2 * (zr * zr - zrr);
        }

        let finite_or_zero = |v: f32| if v.is_finite() { v } else { 0.0 };
        self.zl = finite_or_zero(zl);
        self.zr = finite_or_zero(zr);
        self.zlr = finite_or_zero(zlr) + POWER_EPSILON;
        self.zll = finite_or_zero(zll) + POWER_EPSILON;
        self.zrr = finite_or_zero(zrr) + POWER_EPSILON;
    }

    /// Correlation coefficient, nominally -1..=1
    ///
    /// Near-silent input can read slightly outside that range.
    pub fn read(&self) -> f32 {
        self.zlr / (self.zll * self.zrr + POWER_EPSILON).sqrt()
    }
}

impl Processor for StereoCorrelation {
    fn reset(&mut self) {
        self.zl = 0.0;
        self.zr = 0.0;
        self.zlr = 0.0;
        self.zll = 0.0;
        self.zrr = 0.0;
    }
}

impl ProcessorConfig for StereoCorrelation {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.rate = sample_rate;
        self.update_coefficients();
    }
}
