//! Buffer helpers and meter scaling

use sp_core::{Decibels, Sample};

/// Lower bound of the meter scale in dB
const METER_LOWER_DB: f32 = -192.0;
/// Upper bound of the meter scale in dB
const METER_UPPER_DB: f32 = 0.0;
/// Exponent shaping the meter curve
const METER_NON_LINEARITY: f32 = 8.0;

/// Running minimum/maximum of a signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRange {
    pub min: Sample,
    pub max: Sample,
}

impl PeakRange {
    /// Range that any sample will widen
    pub const EMPTY: Self = Self {
        min: Sample::INFINITY,
        max: Sample::NEG_INFINITY,
    };

    /// Largest absolute excursion
    #[inline]
    pub fn abs_peak(&self) -> Sample {
        self.min.abs().max(self.max.abs())
    }
}

impl Default for PeakRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Set every sample to `value`
#[inline]
pub fn fill(data: &mut [Sample], value: Sample) {
    data.fill(value);
}

/// Multiply `data` in place by `mult`, sample by sample
///
/// Only the common prefix of both slices is touched.
#[inline]
pub fn multiply(data: &mut [Sample], mult: &[Sample]) {
    for (d, &m) in data.iter_mut().zip(mult) {
        *d *= m;
    }
}

/// Map a dB value onto a 0..1 meter deflection
pub fn log_meter(db: f32) -> f32 {
    if db < METER_LOWER_DB {
        0.0
    } else {
        ((db - METER_LOWER_DB) / (METER_UPPER_DB - METER_LOWER_DB)).powf(METER_NON_LINEARITY)
    }
}

/// Map a linear gain coefficient onto a 0..1 meter deflection
pub fn log_meter_coeff(coeff: f32) -> f32 {
    if coeff <= 0.0 {
        return 0.0;
    }
    log_meter(Decibels::from_gain(coeff).0)
}

/// Extend `min`/`max` with the samples in `data`
pub fn peaks(data: &[Sample], min: Sample, max: Sample) -> PeakRange {
    data.iter().fold(PeakRange { min, max }, |acc, &s| PeakRange {
        min: acc.min.min(s),
        max: acc.max.max(s),
    })
}
