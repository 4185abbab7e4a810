//! Biquad filter implementation using Transposed Direct Form II
//!
//! Coefficients come from two families:
//! - RBJ "Audio EQ Cookbook" bilinear designs
//! - Vicanek magnitude-matched fits, which track the analog prototype
//!   much closer to Nyquist than the bilinear versions
//!
//! TDF-II keeps quantization noise low for floating-point state.

use serde::{Deserialize, Serialize};
use sp_core::{FlushDenormal, Sample, SpError};
use std::f64::consts::PI;

use crate::{MonoProcessor, Processor, ProcessorConfig};

/// Smallest accepted Q
const MIN_Q: f64 = 0.001;
/// Lowest accepted center/corner frequency in Hz
const MIN_FREQ: f64 = 1.0;
/// Highest accepted frequency as a fraction of the sample rate
const MAX_FREQ_RATIO: f64 = 0.4998;
/// Gain range accepted by shelving/peaking designs
const MAX_GAIN_DB: f64 = 120.0;
/// Range reported by [`Biquad::db_at_freq`]
const RESPONSE_LIMIT_DB: f32 = 120.0;

/// Biquad response families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    LowPass,
    HighPass,
    /// Constant skirt gain, peak gain = Q
    BandPassSkirt,
    /// Constant 0 dB peak gain
    BandPass0dB,
    Notch,
    AllPass,
    Peaking,
    LowShelf,
    HighShelf,
    MatchedLowPass,
    MatchedHighPass,
    /// Constant 0 dB peak gain
    MatchedBandPass0dB,
    MatchedPeaking,
}

impl FilterType {
    pub const ALL: [FilterType; 13] = [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::BandPassSkirt,
        FilterType::BandPass0dB,
        FilterType::Notch,
        FilterType::AllPass,
        FilterType::Peaking,
        FilterType::LowShelf,
        FilterType::HighShelf,
        FilterType::MatchedLowPass,
        FilterType::MatchedHighPass,
        FilterType::MatchedBandPass0dB,
        FilterType::MatchedPeaking,
    ];

    /// Vicanek magnitude-matched design
    pub fn is_matched(self) -> bool {
        matches!(
            self,
            FilterType::MatchedLowPass
                | FilterType::MatchedHighPass
                | FilterType::MatchedBandPass0dB
                | FilterType::MatchedPeaking
        )
    }

    /// Whether the `gain` parameter affects the response
    pub fn uses_gain(self) -> bool {
        matches!(
            self,
            FilterType::Peaking
                | FilterType::LowShelf
                | FilterType::HighShelf
                | FilterType::MatchedPeaking
        )
    }
}

impl TryFrom<u32> for FilterType {
    type Error = SpError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        FilterType::ALL
            .get(value as usize)
            .copied()
            .ok_or(SpError::UnknownFilterType(value))
    }
}

/// Perceptual filter parameters, as stored in presets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadParams {
    pub kind: FilterType,
    /// Center or corner frequency in Hz
    pub freq: f64,
    pub q: f64,
    /// Gain in dB (peaking and shelving types)
    #[serde(default)]
    pub gain: f64,
}

impl BiquadParams {
    pub fn new(kind: FilterType, freq: f64, q: f64, gain: f64) -> Self {
        Self { kind, freq, q, gain }
    }
}

/// Biquad coefficients, normalized so that `a0 == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub a1: f64,
    pub a2: f64,
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::bypass()
    }
}

/// Shared intermediate values of one design
struct Design {
    rate: f64,
    freq: f64,
    q: f64,
    /// Amplitude `10^(gain/40)`
    a: f64,
    w0: f64,
    sin_w0: f64,
    cos_w0: f64,
    alpha: f64,
    beta: f64,
}

impl Design {
    fn new(freq: f64, q: f64, gain_db: f64, rate: f64) -> Self {
        let q = if q.is_nan() { MIN_Q } else { q.max(MIN_Q) };
        // the upper bound is NaN or below 1 Hz for a degenerate rate
        let freq = if freq.is_nan() {
            MIN_FREQ
        } else {
            freq.max(MIN_FREQ).min(MAX_FREQ_RATIO * rate)
        };
        let gain_db = if gain_db.is_nan() {
            0.0
        } else {
            gain_db.clamp(-MAX_GAIN_DB, MAX_GAIN_DB)
        };

        let a = 10.0_f64.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq / rate;
        let sin_w0 = w0.sin();
        let cos_w0 = w0.cos();

        Self {
            rate,
            freq,
            q,
            a,
            w0,
            sin_w0,
            cos_w0,
            alpha: sin_w0 / (2.0 * q),
            beta: a.sqrt() / q,
        }
    }
}

/// Pole-derived terms of a Vicanek fit
struct VicanekTerms {
    big_a0: f64,
    big_a1: f64,
    big_a2: f64,
    phi0: f64,
    phi1: f64,
    phi2: f64,
}

/// Poles of the impulse-invariant analog match (`a1`, `a2`)
///
/// `a = 1` for everything except the peaking fit. The overdamped branch
/// evaluates `exp(-k)·cosh(x)` as a sum of exponents, with `x < k`, so very
/// small Q cannot overflow.
fn vicanek_poles(w0: f64, q: f64, a: f64) -> (f64, f64) {
    let k = 0.5 * w0 / (a * q);
    let p = 1.0 / (4.0 * a * a * q * q);
    let r = (-k).exp();

    let a1 = if p <= 1.0 {
        -2.0 * r * (w0 * (1.0 - p).sqrt()).cos()
    } else {
        let x = w0 * (p - 1.0).sqrt();
        -((x - k).exp() + (-x - k).exp())
    };
    (a1, r * r)
}

fn vicanek_terms(w0: f64, a1: f64, a2: f64) -> VicanekTerms {
    let phi1 = (0.5 * w0).sin().powi(2);
    let phi0 = 1.0 - phi1;
    VicanekTerms {
        big_a0: (1.0 + a1 + a2).powi(2),
        big_a1: (1.0 - a1 + a2).powi(2),
        big_a2: -4.0 * a2,
        phi0,
        phi1,
        phi2: 4.0 * phi0 * phi1,
    }
}

impl BiquadCoeffs {
    /// Unity gain, no filtering
    pub const fn bypass() -> Self {
        Self {
            a1: 0.0,
            a2: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
        }
    }

    /// Build from unnormalized coefficients
    pub fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            a1: a1 / a0,
            a2: a2 / a0,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.a1.is_finite()
            && self.a2.is_finite()
            && self.b0.is_finite()
            && self.b1.is_finite()
            && self.b2.is_finite()
    }

    /// Synthesize coefficients for `kind`
    ///
    /// `q` is clamped to at least 0.001, `freq` into `[1, 0.4998·rate]` and
    /// `gain_db` into ±120 dB. The result is always finite; a degenerate
    /// design, including one for a zero or NaN `sample_rate`, falls back to
    /// bypass.
    pub fn design(kind: FilterType, freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let d = Design::new(freq, q, gain_db, sample_rate);

        let coeffs = match kind {
            FilterType::LowPass => Self::lowpass(&d),
            FilterType::HighPass => Self::highpass(&d),
            FilterType::BandPassSkirt => Self::bandpass_skirt(&d),
            FilterType::BandPass0dB => Self::bandpass(&d),
            FilterType::Notch => Self::notch(&d),
            FilterType::AllPass => Self::allpass(&d),
            FilterType::Peaking => Self::peaking(&d),
            FilterType::LowShelf => Self::low_shelf(&d),
            FilterType::HighShelf => Self::high_shelf(&d),
            FilterType::MatchedLowPass => Self::matched_lowpass(&d),
            FilterType::MatchedHighPass => Self::matched_highpass(&d),
            FilterType::MatchedBandPass0dB => Self::matched_bandpass(&d),
            FilterType::MatchedPeaking => Self::matched_peaking(&d),
        };

        if coeffs.is_finite() {
            coeffs
        } else {
            log::warn!(
                "Biquad: {:?} at {:.2} Hz (q {:.4}) produced non-finite coefficients, bypassing",
                kind,
                d.freq,
                d.q
            );
            Self::bypass()
        }
    }

    fn lowpass(d: &Design) -> Self {
        let c = d.cos_w0;
        Self::from_raw(
            (1.0 - c) / 2.0,
            1.0 - c,
            (1.0 - c) / 2.0,
            1.0 + d.alpha,
            -2.0 * c,
            1.0 - d.alpha,
        )
    }

    fn highpass(d: &Design) -> Self {
        let c = d.cos_w0;
        Self::from_raw(
            (1.0 + c) / 2.0,
            -(1.0 + c),
            (1.0 + c) / 2.0,
            1.0 + d.alpha,
            -2.0 * c,
            1.0 - d.alpha,
        )
    }

    fn bandpass_skirt(d: &Design) -> Self {
        Self::from_raw(
            d.sin_w0 / 2.0,
            0.0,
            -d.sin_w0 / 2.0,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }

    fn bandpass(d: &Design) -> Self {
        Self::from_raw(
            d.alpha,
            0.0,
            -d.alpha,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }

    fn notch(d: &Design) -> Self {
        Self::from_raw(
            1.0,
            -2.0 * d.cos_w0,
            1.0,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }

    fn allpass(d: &Design) -> Self {
        Self::from_raw(
            1.0 - d.alpha,
            -2.0 * d.cos_w0,
            1.0 + d.alpha,
            1.0 + d.alpha,
            -2.0 * d.cos_w0,
            1.0 - d.alpha,
        )
    }

    fn peaking(d: &Design) -> Self {
        Self::from_raw(
            1.0 + d.alpha * d.a,
            -2.0 * d.cos_w0,
            1.0 - d.alpha * d.a,
            1.0 + d.alpha / d.a,
            -2.0 * d.cos_w0,
            1.0 - d.alpha / d.a,
        )
    }

    fn low_shelf(d: &Design) -> Self {
        let a = d.a;
        let c = d.cos_w0;
        let bs = d.beta * d.sin_w0;
        Self::from_raw(
            a * ((a + 1.0) - (a - 1.0) * c + bs),
            2.0 * a * ((a - 1.0) - (a + 1.0) * c),
            a * ((a + 1.0) - (a - 1.0) * c - bs),
            (a + 1.0) + (a - 1.0) * c + bs,
            -2.0 * ((a - 1.0) + (a + 1.0) * c),
            (a + 1.0) + (a - 1.0) * c - bs,
        )
    }

    fn high_shelf(d: &Design) -> Self {
        let a = d.a;
        let c = d.cos_w0;
        let bs = d.beta * d.sin_w0;
        Self::from_raw(
            a * ((a + 1.0) + (a - 1.0) * c + bs),
            -2.0 * a * ((a - 1.0) + (a + 1.0) * c),
            a * ((a + 1.0) + (a - 1.0) * c - bs),
            (a + 1.0) - (a - 1.0) * c + bs,
            2.0 * ((a - 1.0) - (a + 1.0) * c),
            (a + 1.0) - (a - 1.0) * c - bs,
        )
    }

    fn matched_highpass(d: &Design) -> Self {
        let (a1, a2) = vicanek_poles(d.w0, d.q, 1.0);
        let t = vicanek_terms(d.w0, a1, a2);

        let num = t.big_a0 * t.phi0 + t.big_a1 * t.phi1 + t.big_a2 * t.phi2;
        let b0 = num.max(0.0).sqrt() / (4.0 * t.phi1) * d.q;
        Self {
            a1,
            a2,
            b0,
            b1: -2.0 * b0,
            b2: b0,
        }
    }

    fn matched_lowpass(d: &Design) -> Self {
        let (a1, a2) = vicanek_poles(d.w0, d.q, 1.0);
        let t = vicanek_terms(d.w0, a1, a2);

        // square root of B0
        let b0_root = 1.0 + a1 + a2;
        let big_b1 = ((t.big_a0 * t.phi0 + t.big_a1 * t.phi1 + t.big_a2 * t.phi2) * d.q * d.q
            - t.big_a0 * t.phi0)
            / t.phi1;

        let b0 = 0.5 * (b0_root + big_b1.max(0.0).sqrt());
        Self {
            a1,
            a2,
            b0,
            b1: b0_root - b0,
            b2: 0.0,
        }
    }

    fn matched_bandpass(d: &Design) -> Self {
        let (a1, a2) = vicanek_poles(d.w0, d.q, 1.0);

        let fq = 2.0 * d.freq / d.rate;
        let fq2 = fq * fq;

        let b1 = -0.5 * (1.0 - a1 + a2) * fq
            / d.q
            / ((1.0 - fq2) * (1.0 - fq2) + fq2 / (d.q * d.q)).sqrt();
        let b0 = 0.5 * ((1.0 + a1 + a2) / (d.w0 * d.q) - b1);
        Self {
            a1,
            a2,
            b0,
            b1,
            b2: -b0 - b1,
        }
    }

    fn matched_peaking(d: &Design) -> Self {
        let (a1, a2) = vicanek_poles(d.w0, d.q, d.a);
        let t = vicanek_terms(d.w0, a1, a2);

        let aa = d.a * d.a;
        let aaaa = aa * aa;

        let r1 = (t.phi0 * t.big_a0 + t.phi1 * t.big_a1 + t.phi2 * t.big_a2) * aaaa;
        let r2 = (t.big_a1 - t.big_a0 + 4.0 * (t.phi0 - t.phi1) * t.big_a2) * aaaa;

        let big_b0 = t.big_a0;
        let big_b2 = (r1 - t.phi1 * r2 - big_b0) / (4.0 * t.phi1 * t.phi1);
        let big_b1 = r2 + big_b0 + 4.0 * (t.phi1 - t.phi0) * big_b2;

        // square root of B0
        let b0_root = 1.0 + a1 + a2;

        let b1 = 0.5 * (b0_root - big_b1.max(0.0).sqrt());
        let w = b0_root - b1;
        let b0 = 0.5 * (w + (w * w + big_b2).max(0.0).sqrt());
        Self {
            a1,
            a2,
            b0,
            b1,
            b2: -big_b2 / (4.0 * b0),
        }
    }
}

/// Second-order recursive filter section
///
/// Cloning copies the filter shape but starts from silent delay memory.
#[derive(Debug)]
pub struct Biquad {
    rate: f64,
    coeffs: BiquadCoeffs,
    params: Option<BiquadParams>,
    z1: f64,
    z2: f64,
}

impl Clone for Biquad {
    fn clone(&self) -> Self {
        Self {
            rate: self.rate,
            coeffs: self.coeffs,
            params: self.params,
            z1: 0.0,
            z2: 0.0,
        }
    }
}

impl Biquad {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            rate: sample_rate,
            coeffs: BiquadCoeffs::bypass(),
            params: None,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn with_params(params: BiquadParams, sample_rate: f64) -> Self {
        let mut filter = Self::new(sample_rate);
        filter.apply(params);
        filter
    }

    /// Synthesize coefficients from perceptual parameters
    pub fn compute(&mut self, kind: FilterType, freq: f64, q: f64, gain_db: f64) {
        self.apply(BiquadParams::new(kind, freq, q, gain_db));
    }

    pub fn apply(&mut self, params: BiquadParams) {
        self.coeffs =
            BiquadCoeffs::design(params.kind, params.freq, params.q, params.gain, self.rate);
        self.params = Some(params);
    }

    /// Set raw coefficients, bypassing synthesis
    pub fn configure(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
        self.params = None;
    }

    /// Copy another filter's shape, keeping this filter's delay memory
    pub fn configure_from(&mut self, other: &Biquad) {
        self.coeffs = other.coeffs;
        self.params = other.params;
    }

    #[inline]
    pub fn coefficients(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Parameters of the last [`compute`](Self::compute), if any
    #[inline]
    pub fn params(&self) -> Option<BiquadParams> {
        self.params
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.rate
    }

    /// Delay registers `(z1, z2)`
    #[inline]
    pub fn state(&self) -> (f64, f64) {
        (self.z1, self.z2)
    }

    #[inline(always)]
    fn tick(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Filter `data` in place
    ///
    /// Both registers are flushed to zero afterwards if they left the normal
    /// range.
    pub fn run(&mut self, data: &mut [Sample]) {
        for sample in data.iter_mut() {
            *sample = self.tick(*sample as f64) as Sample;
        }
        self.z1 = self.z1.flush_denormal();
        self.z2 = self.z2.flush_denormal();
    }

    /// Magnitude response at `freq` in dB, within ±120 dB
    pub fn db_at_freq(&self, freq: f32) -> f32 {
        let c = &self.coeffs;
        let w0 = 2.0 * PI * freq as f64 / self.rate;
        let c1 = w0.cos();
        let s1 = w0.sin();

        let a = (c.b0 + c.b2) * c1 + c.b1;
        let b = (c.b0 - c.b2) * s1;
        let cc = (1.0 + c.a2) * c1 + c.a1;
        let d = (1.0 - c.a2) * s1;

        let den = cc * cc + d * d;
        let rv = (20.0 * (((a * a + b * b) * den).sqrt() / den).log10()) as f32;
        if !rv.is_finite() {
            return 0.0;
        }
        rv.clamp(-RESPONSE_LIMIT_DB, RESPONSE_LIMIT_DB)
    }
}

impl Processor for Biquad {
    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl MonoProcessor for Biquad {
    #[inline]
    fn process_block(&mut self, buffer: &mut [Sample]) {
        self.run(buffer);
    }
}

impl ProcessorConfig for Biquad {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.rate = sample_rate;
        if let Some(params) = self.params {
            self.apply(params);
        }
    }
}
