//! Frequency-warped spectrum analyzer
//!
//! Input runs through a cascade of `FFT_LEN` first-order all-pass sections
//! before a uniform FFT, which bends the bin spacing toward low
//! frequencies (Bark-like resolution) without a non-uniform DFT. The
//! cascade state persists across hops, so the warped view stays continuous
//! over block boundaries.
//!
//! Output has `FFT_LEN + 1` bins: even bins are FFT bins, odd bins are
//! interpolated halfway between them. Both come from 9-tap kernels over the
//! complex spectrum, which approximate a brick-wall bin separation.

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use sp_core::{Sample, SpResult, check_sample_rate};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::fft_engine::{FftEngine, ForwardPlan};

/// Transform length of the warped analysis
pub const FFT_LEN: usize = 2048;

/// Samples consumed per analysis hop
const HOP: usize = FFT_LEN / 2;
/// Mirrored bins on each side of the spectrum
const GUARD: usize = 4;
/// Saturation point of the running-average count
const AVERAGE_COUNT_LIMIT: u32 = 1_000_000;
/// Alternating input offset that keeps the cascade out of denormals
const DITHER: f32 = 1e-20;
/// Floor added to every bin power
const POWER_EPSILON: f32 = 1e-20;
/// Floor used when converting to dB
const DB_EPSILON: f32 = 1e-30;
/// Largest accepted warp factor magnitude
const MAX_WFACT: f32 = 0.99;

/// Even-bin kernel, taps -4..=4
const CONV0: [f32; 9] = [
    0.000741, -0.019420, 0.195602, -0.677014, 1.0, -0.677014, 0.195602, -0.019420, 0.000741,
];
/// Odd-bin kernel, taps -3..=4
const CONV1: [f32; 8] = [
    -0.004085, 0.071556, -0.409037, 0.908040, -0.908040, 0.409037, -0.071556, 0.004085,
];

/// Warp factor presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warp {
    /// Approximates the Bark scale at the current sample rate
    Bark,
    Medium,
    High,
}

impl Warp {
    pub fn factor(self, sample_rate: f64) -> f32 {
        match self {
            Warp::Bark => {
                let rate = sample_rate as f32;
                0.8517 * (65.83e-6 * rate).atan().sqrt() - 0.1916
            }
            Warp::Medium => 0.90,
            Warp::High => 0.95,
        }
    }
}

/// Integration time presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speed {
    Noise,
    Slow,
    Moderate,
    Fast,
    Rapid,
}

impl Speed {
    /// Time constant in seconds
    pub fn seconds(self) -> f32 {
        match self {
            Speed::Noise => 20.0,
            Speed::Slow => 2.0,
            Speed::Moderate => 0.2,
            Speed::Fast => 0.08,
            Speed::Rapid => 0.03,
        }
    }
}

/// Accumulation applied on top of the running power trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessMode {
    #[default]
    None,
    /// Per-bin maximum, never decays
    Peak,
    /// Unweighted cumulative mean
    Average,
}

/// Per-bin power trace
#[derive(Debug, Clone)]
struct Trace {
    data: Vec<f32>,
    valid: bool,
    count: u32,
}

impl Trace {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size],
            valid: false,
            count: 0,
        }
    }

    fn clear(&mut self) {
        self.data.fill(0.0);
        self.valid = false;
        self.count = 0;
    }

    fn hold_peak(&mut self, src: &[f32]) {
        for (held, &p) in self.data.iter_mut().zip(src) {
            if *held < p {
                *held = p;
            }
        }
        self.valid = true;
    }

    fn accumulate_average(&mut self, src: &[f32]) {
        let n = self.count as f32;
        let n1 = n + 1.0;
        for (mean, &p) in self.data.iter_mut().zip(src) {
            *mean = (n * *mean + p) / n1;
        }
        if self.count < AVERAGE_COUNT_LIMIT {
            self.count += 1;
        }
        self.valid = true;
    }
}

/// Group-delay warping of normalized frequency `f` (cycles/sample)
/// through an all-pass with coefficient `w`
pub fn warp_freq(w: f64, f: f64) -> f64 {
    let f = f * 2.0 * PI;
    ((1.0 - w * w) * f.sin())
        .atan2((1.0 + w * w) * f.cos() - 2.0 * w)
        .abs()
        / (2.0 * PI)
}

#[inline]
fn conv0(v: &[Complex<f32>], center: usize) -> f32 {
    v[center - 4..=center + 4]
        .iter()
        .zip(CONV0)
        .fold(Complex::new(0.0, 0.0), |acc, (&c, k)| acc + c * k)
        .norm_sqr()
}

#[inline]
fn conv1(v: &[Complex<f32>], center: usize) -> f32 {
    v[center - 3..=center + 4]
        .iter()
        .zip(CONV1)
        .fold(Complex::new(0.0, 0.0), |acc, (&c, k)| acc + c * k)
        .norm_sqr()
}

/// Perceptual (warped) spectrum analyzer
pub struct PerceptualAnalyzer {
    engine: Arc<FftEngine>,
    plan: Option<ForwardPlan>,
    rate: f64,
    wfact: f32,
    speed: f32,
    /// Input ring written by the host
    input: Vec<f32>,
    /// Start of the next hop in `input`
    icount: usize,
    /// Samples of the next hop already written through `push_samples`
    pending: usize,
    /// All-pass cascade state, tap 0 is the newest input
    warped: Vec<f32>,
    fft_in: Vec<f32>,
    /// Half spectrum with `GUARD` mirrored bins on both ends
    trdata: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    power: Trace,
    peakp: Trace,
    pmax: f32,
    fscale: Vec<f32>,
    bwcorr: Vec<f32>,
}

impl PerceptualAnalyzer {
    pub const FFT_LEN: usize = FFT_LEN;

    /// Analyzer planned through the process-wide [`FftEngine`]
    ///
    /// `ipsize` is the input ring length, rounded up to a whole number of
    /// hops (`FFT_LEN / 2`).
    pub fn new(sample_rate: f64, ipsize: usize) -> SpResult<Self> {
        Self::with_engine(FftEngine::shared(), sample_rate, ipsize)
    }

    pub fn with_engine(engine: Arc<FftEngine>, sample_rate: f64, ipsize: usize) -> SpResult<Self> {
        let rate = check_sample_rate(sample_rate)?;

        let rounded = ipsize.div_ceil(HOP).max(1) * HOP;
        if rounded != ipsize {
            log::warn!(
                "PerceptualAnalyzer: input size {} rounded up to {} (multiple of {})",
                ipsize,
                rounded,
                HOP
            );
        }

        let mut analyzer = Self {
            engine,
            plan: None,
            rate,
            wfact: 0.9,
            speed: 1.0,
            input: vec![0.0; rounded],
            icount: 0,
            pending: 0,
            warped: vec![0.0; FFT_LEN + 1],
            fft_in: Vec::new(),
            trdata: vec![Complex::new(0.0, 0.0); HOP + 1 + 2 * GUARD],
            scratch: Vec::new(),
            power: Trace::new(FFT_LEN + 1),
            peakp: Trace::new(FFT_LEN + 1),
            pmax: 0.0,
            fscale: vec![0.0; FFT_LEN + 1],
            bwcorr: vec![0.0; FFT_LEN + 1],
        };
        analyzer.init();
        Ok(analyzer)
    }

    /// (Re)plan the transform and rebuild the warp tables
    fn init(&mut self) {
        if let Some(old) = self.plan.take() {
            self.engine.release(old);
        }
        let plan = self.engine.plan_forward(FFT_LEN);
        self.fft_in = plan.make_input_vec();
        self.scratch = plan.make_scratch_vec();
        self.plan = Some(plan);

        self.set_wfact(self.wfact);
        log::debug!(
            "PerceptualAnalyzer: rate={} ipsize={} wfact={}",
            self.rate,
            self.input.len(),
            self.wfact
        );
    }

    pub fn set_warp(&mut self, warp: Warp) {
        self.set_wfact(warp.factor(self.rate));
    }

    /// Set a raw warp factor and rebuild the bin tables
    ///
    /// The factor is clamped to ±0.99, NaN reads as 0 (no warping). At ±1
    /// the all-pass degenerates and the bin tables would collapse. Clears
    /// the traces and the cascade state.
    pub fn set_wfact(&mut self, wfact: f32) {
        let wfact = if wfact.is_nan() {
            0.0
        } else {
            wfact.clamp(-MAX_WFACT, MAX_WFACT)
        };
        self.wfact = wfact;
        self.reset();

        for (i, f) in self.fscale.iter_mut().enumerate() {
            let norm = 0.5 * i as f64 / FFT_LEN as f64;
            *f = warp_freq(-wfact as f64, norm) as f32;
        }
        for i in 1..FFT_LEN {
            self.bwcorr[i] = 30.0 * (self.fscale[i + 1] - self.fscale[i - 1]) / self.fscale[i];
        }
        self.bwcorr[0] = self.bwcorr[1];
        self.bwcorr[FFT_LEN] = self.bwcorr[FFT_LEN - 1];
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed.seconds();
    }

    /// Set the integration time constant in seconds
    pub fn set_speed_secs(&mut self, seconds: f32) {
        self.speed = seconds;
    }

    /// Clear traces and the cascade state
    pub fn reset(&mut self) {
        self.power.clear();
        self.peakp.clear();
        self.warped.fill(0.0);
    }

    /// Input ring for direct host writes before [`process`](Self::process)
    pub fn input_mut(&mut self) -> &mut [Sample] {
        &mut self.input
    }

    pub fn ipsize(&self) -> usize {
        self.input.len()
    }

    /// Append samples to the ring and analyze every completed hop
    ///
    /// A trailing partial hop is kept and completed by the next call. A
    /// direct [`process`](Self::process) call in between takes over the
    /// ring position and discards it.
    pub fn push_samples(&mut self, data: &[Sample], mode: ProcessMode) {
        let mut rest = data;
        while !rest.is_empty() {
            let n = rest.len().min(HOP - self.pending);
            let start = self.icount + self.pending;
            self.input[start..start + n].copy_from_slice(&rest[..n]);
            self.pending += n;
            rest = &rest[n..];

            if self.pending == HOP {
                self.process(HOP, mode);
            }
        }
    }

    /// Analyze `iplen` samples from the ring, one hop at a time
    ///
    /// Drops any partial hop left by [`push_samples`](Self::push_samples);
    /// those samples are read as part of the first hop analyzed here.
    pub fn process(&mut self, iplen: usize, mode: ProcessMode) {
        self.pending = 0;
        let w = -self.wfact;
        let leak = 1.0 - 0.1f32.powf(HOP as f32 / (self.rate as f32 * self.speed));
        let scale = 4.0 / (FFT_LEN as f32 * FFT_LEN as f32);

        for _ in (0..iplen).step_by(HOP) {
            let start = self.icount;
            self.icount += HOP;
            if self.icount == self.input.len() {
                self.icount = 0;
            }

            self.warp_hop(start, w);
            self.transform();
            self.integrate(leak, scale);

            match mode {
                ProcessMode::None => {}
                ProcessMode::Peak => self.peakp.hold_peak(&self.power.data),
                ProcessMode::Average => self.peakp.accumulate_average(&self.power.data),
            }
        }
    }

    /// Push one hop of input through the all-pass cascade
    fn warp_hop(&mut self, start: usize, w: f32) {
        for (j, &sample) in self.input[start..start + HOP].iter().enumerate() {
            let x = if j % 2 == 0 { sample + DITHER } else { sample - DITHER };

            let mut u = x;
            let mut prev_in = self.warped[0];
            self.warped[0] = x;
            for tap in &mut self.warped[1..] {
                let prev_out = *tap;
                let y = prev_in + w * (u - prev_out);
                *tap = y;
                prev_in = prev_out;
                u = y;
            }
        }
    }

    /// Transform the cascade taps and fill the guard bins
    fn transform(&mut self) {
        self.fft_in.copy_from_slice(&self.warped[..FFT_LEN]);

        let ok = match &self.plan {
            Some(plan) => plan
                .process_with_scratch(
                    &mut self.fft_in,
                    &mut self.trdata[GUARD..=GUARD + HOP],
                    &mut self.scratch,
                )
                .is_ok(),
            None => false,
        };
        if !ok {
            self.trdata.fill(Complex::new(0.0, 0.0));
            return;
        }

        for i in 1..=GUARD {
            self.trdata[GUARD - i] = self.trdata[GUARD + i].conj();
            self.trdata[GUARD + HOP + i] = self.trdata[GUARD + HOP - i].conj();
        }
    }

    /// Leaky-integrate the smoothed bin powers into the running trace
    fn integrate(&mut self, leak: f32, scale: f32) {
        let mut m = 0.0f32;
        let power = &mut self.power.data;

        for i in 0..HOP {
            let center = GUARD + i;

            let p = scale * conv0(&self.trdata, center) + POWER_EPSILON;
            m = m.max(p);
            power[2 * i] += leak * (p - power[2 * i]);

            let p = scale * conv1(&self.trdata, center) + POWER_EPSILON;
            m = m.max(p);
            power[2 * i + 1] += leak * (p - power[2 * i + 1]);
        }

        let p = scale * conv0(&self.trdata, GUARD + HOP) + POWER_EPSILON;
        power[FFT_LEN] += leak * (p - power[FFT_LEN]);

        if self.pmax < m {
            self.pmax = m;
        } else {
            self.pmax *= 0.95;
        }
    }

    /// Linear frequency of output bin `b` in Hz
    pub fn freq_at_bin(&self, b: usize) -> f32 {
        self.fscale.get(b).map_or(0.0, |&f| f * self.rate as f32)
    }

    /// Running power of bin `b` in dB
    ///
    /// `pink` divides by the bin bandwidth for an energy-per-Hz view.
    pub fn power_at_bin(&self, b: usize, pink: bool) -> f32 {
        match self.power.data.get(b) {
            Some(&p) => self.to_db(b, p, pink),
            None => f32::NEG_INFINITY,
        }
    }

    /// Peak-hold or average trace in dB, once a Peak/Average hop has run
    pub fn held_power_at_bin(&self, b: usize, pink: bool) -> Option<f32> {
        if !self.peakp.valid {
            return None;
        }
        self.peakp.data.get(b).map(|&p| self.to_db(b, p, pink))
    }

    fn to_db(&self, b: usize, p: f32, pink: bool) -> f32 {
        if pink {
            10.0 * ((p + DB_EPSILON) / self.bwcorr[b]).log10()
        } else {
            10.0 * (p + DB_EPSILON).log10()
        }
    }

    /// Loudest bin power of recent hops, decaying when nothing louder arrives
    pub fn pmax(&self) -> f32 {
        self.pmax
    }

    pub fn fft_len(&self) -> usize {
        FFT_LEN
    }

    pub fn wfact(&self) -> f32 {
        self.wfact
    }

    /// Integration time constant in seconds
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sample_rate(&self) -> f64 {
        self.rate
    }

    /// Bin to normalized-frequency table (fraction of the sample rate)
    pub fn fscale(&self) -> &[f32] {
        &self.fscale
    }

    /// Bandwidth correction per bin
    pub fn bwcorr(&self) -> &[f32] {
        &self.bwcorr
    }
}

impl Drop for PerceptualAnalyzer {
    fn drop(&mut self) {
        if let Some(plan) = self.plan.take() {
            self.engine.release(plan);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    fn sine(freq: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / SR).sin() as f32)
            .collect()
    }

    fn loudest_bin(analyzer: &PerceptualAnalyzer) -> usize {
        (0..=FFT_LEN)
            .max_by(|&a, &b| {
                analyzer
                    .power_at_bin(a, false)
                    .total_cmp(&analyzer.power_at_bin(b, false))
            })
            .unwrap()
    }

    #[test]
    fn test_warp_freq_identity() {
        for f in [0.0, 0.05, 0.1, 0.25, 0.4] {
            assert!((warp_freq(0.0, f) - f).abs() < 1e-12);
        }
    }

    #[test]
    fn test_presets() {
        assert!((Warp::Bark.factor(48000.0) - 0.76606).abs() < 1e-4);
        assert!((Warp::Bark.factor(44100.0) - 0.75646).abs() < 1e-4);
        assert_eq!(Warp::High.factor(48000.0), 0.95);
        assert_eq!(Speed::Rapid.seconds(), 0.03);
        assert_eq!(Speed::Noise.seconds(), 20.0);
    }

    #[test]
    fn test_fscale_monotonic() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        for wfact in [0.1, 0.5, 0.9, 0.95, Warp::Bark.factor(SR)] {
            analyzer.set_wfact(wfact);
            assert!(analyzer.fscale().windows(2).all(|w| w[1] >= w[0]), "wfact {}", wfact);
            assert_eq!(analyzer.freq_at_bin(0), 0.0);
            assert!((analyzer.freq_at_bin(FFT_LEN) - 24000.0).abs() < 1.0);
            assert!(analyzer.bwcorr().iter().all(|c| c.is_finite() && *c > 0.0));
        }
    }

    #[test]
    fn test_wfact_range() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        for (wfact, expected) in [(1.0, MAX_WFACT), (-1.0, -MAX_WFACT), (f32::NAN, 0.0)] {
            analyzer.set_wfact(wfact);
            assert_eq!(analyzer.wfact(), expected);
            assert!(analyzer.bwcorr().iter().all(|c| c.is_finite() && *c > 0.0), "wfact {}", wfact);

            analyzer.push_samples(&sine(1000.0, 4 * HOP), ProcessMode::None);
            assert!(
                (0..=FFT_LEN).all(|b| analyzer.power_at_bin(b, true).is_finite()),
                "wfact {}",
                wfact
            );
        }
    }

    #[test]
    fn test_warping_favors_low_frequencies() {
        let analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        // with the default factor half the bins cover well under a tenth of the band
        assert!(analyzer.freq_at_bin(FFT_LEN / 2) < 2400.0);
    }

    #[test]
    fn test_input_size_rounded() {
        assert_eq!(PerceptualAnalyzer::new(SR, 1500).unwrap().ipsize(), 2048);
        assert_eq!(PerceptualAnalyzer::new(SR, 0).unwrap().ipsize(), HOP);
        assert_eq!(PerceptualAnalyzer::new(SR, 4096).unwrap().ipsize(), 4096);
        assert!(PerceptualAnalyzer::new(f64::NAN, 4096).is_err());
    }

    #[test]
    fn test_sine_peak_location() {
        let mut analyzer = PerceptualAnalyzer::new(SR, 4096).unwrap();
        analyzer.set_speed(Speed::Rapid);
        analyzer.push_samples(&sine(1000.0, 48 * HOP), ProcessMode::None);

        let bin = loudest_bin(&analyzer);
        let freq = analyzer.freq_at_bin(bin);
        assert!((freq - 1000.0).abs() < 10.0, "peak at {} Hz", freq);
        assert!(analyzer.power_at_bin(bin, false).abs() < 1.0);
        assert!(analyzer.pmax() > 0.5);
    }

    #[test]
    fn test_silence_floor() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        analyzer.set_speed(Speed::Rapid);
        analyzer.push_samples(&vec![0.0; 8 * HOP], ProcessMode::None);
        assert!((0..=FFT_LEN).all(|b| analyzer.power_at_bin(b, false) <= -199.0));
        assert!(analyzer.power_at_bin(FFT_LEN + 1, false).is_infinite());
    }

    #[test]
    fn test_ring_and_push_agree() {
        let signal = sine(440.0, 4 * HOP);

        let mut pushed = PerceptualAnalyzer::new(SR, 2 * HOP).unwrap();
        for chunk in signal.chunks(300) {
            pushed.push_samples(chunk, ProcessMode::None);
        }

        let mut direct = PerceptualAnalyzer::new(SR, 2 * HOP).unwrap();
        for block in signal.chunks(2 * HOP) {
            direct.input_mut().copy_from_slice(block);
            direct.process(2 * HOP, ProcessMode::None);
        }

        for b in 0..=FFT_LEN {
            assert_eq!(pushed.power_at_bin(b, false), direct.power_at_bin(b, false));
        }
    }

    #[test]
    fn test_process_discards_partial_push() {
        let signal = sine(440.0, 3 * HOP);

        let mut mixed = PerceptualAnalyzer::new(SR, 2 * HOP).unwrap();
        mixed.push_samples(&signal[..300], ProcessMode::None);
        mixed.process(HOP, ProcessMode::None);
        assert_eq!(mixed.pending, 0);
        mixed.push_samples(&signal[HOP..2 * HOP], ProcessMode::None);

        let mut direct = PerceptualAnalyzer::new(SR, 2 * HOP).unwrap();
        direct.input_mut()[..300].copy_from_slice(&signal[..300]);
        direct.process(HOP, ProcessMode::None);
        direct.push_samples(&signal[HOP..2 * HOP], ProcessMode::None);

        // the second hop completed on its own, from the next ring slot
        assert_eq!(mixed.pending, 0);
        assert_eq!(mixed.icount, 0);
        for b in 0..=FFT_LEN {
            assert_eq!(mixed.power_at_bin(b, false), direct.power_at_bin(b, false));
        }
    }

    #[test]
    fn test_held_trace_empty_until_held() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        analyzer.push_samples(&sine(1000.0, 4 * HOP), ProcessMode::None);
        assert!(analyzer.power_at_bin(loudest_bin(&analyzer), false) > -40.0);
        assert!(analyzer.held_power_at_bin(0, false).is_none());

        analyzer.push_samples(&sine(1000.0, HOP), ProcessMode::Peak);
        assert!(analyzer.held_power_at_bin(0, false).is_some());
    }

    #[test]
    fn test_peak_hold() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        analyzer.set_speed(Speed::Rapid);
        assert!(analyzer.held_power_at_bin(0, false).is_none());

        analyzer.push_samples(&sine(2000.0, 16 * HOP), ProcessMode::Peak);
        let bin = loudest_bin(&analyzer);
        let held = analyzer.held_power_at_bin(bin, false).unwrap();

        analyzer.push_samples(&vec![0.0; 16 * HOP], ProcessMode::Peak);
        assert!(analyzer.power_at_bin(bin, false) < held - 20.0);
        assert_eq!(analyzer.held_power_at_bin(bin, false), Some(held));
        assert!(
            (0..=FFT_LEN).all(|b| analyzer.held_power_at_bin(b, false).unwrap()
                >= analyzer.power_at_bin(b, false))
        );

        analyzer.set_wfact(0.8);
        assert!(analyzer.held_power_at_bin(bin, false).is_none());
    }

    #[test]
    fn test_average_trace() {
        let mut trace = Trace::new(3);
        trace.accumulate_average(&[1.0, 2.0, 3.0]);
        trace.accumulate_average(&[3.0, 2.0, 1.0]);
        assert_eq!(trace.data, vec![2.0, 2.0, 2.0]);
        assert_eq!(trace.count, 2);
        assert!(trace.valid);

        trace.count = AVERAGE_COUNT_LIMIT - 1;
        trace.accumulate_average(&[2.0, 2.0, 2.0]);
        assert_eq!(trace.count, AVERAGE_COUNT_LIMIT);
        trace.accumulate_average(&[2.0, 2.0, 2.0]);
        assert_eq!(trace.count, AVERAGE_COUNT_LIMIT);
    }

    #[test]
    fn test_average_mode_tracks_mean() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        analyzer.push_samples(&sine(3000.0, 4 * HOP), ProcessMode::Average);
        assert!(analyzer.held_power_at_bin(100, false).is_some());
        assert_eq!(analyzer.peakp.count, 4);
    }

    #[test]
    fn test_pink_view() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        analyzer.push_samples(&sine(500.0, 2 * HOP), ProcessMode::None);
        let b = 700;
        let expected = analyzer.power_at_bin(b, false) - 10.0 * analyzer.bwcorr()[b].log10();
        assert!((analyzer.power_at_bin(b, true) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_speed_setters() {
        let mut analyzer = PerceptualAnalyzer::new(SR, HOP).unwrap();
        assert_eq!(analyzer.speed(), 1.0);
        analyzer.set_speed(Speed::Moderate);
        assert_eq!(analyzer.speed(), 0.2);
        analyzer.set_speed_secs(0.5);
        assert_eq!(analyzer.speed(), 0.5);
        analyzer.set_warp(Warp::Medium);
        assert_eq!(analyzer.wfact(), 0.9);
    }

    #[test]
    fn test_drop_releases_plan() {
        let engine = Arc::new(FftEngine::new());
        let a = PerceptualAnalyzer::with_engine(engine.clone(), SR, HOP).unwrap();
        let b = PerceptualAnalyzer::with_engine(engine.clone(), SR, HOP).unwrap();
        assert_eq!(engine.cached_plans(), 1);
        drop(a);
        assert_eq!(engine.cached_plans(), 1);
        drop(b);
        assert_eq!(engine.cached_plans(), 0);
    }
}
