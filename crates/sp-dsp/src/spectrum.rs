//! Hann-windowed linear power spectrum
//!
//! The host fills the analysis window with one or more `set_data_hann`
//! calls, then `execute` transforms it and unpacks per-bin power.

use rustfft::num_complex::Complex;
use sp_core::{Decibels, Sample, SpError, SpResult, check_sample_rate};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::fft_engine::{FftEngine, ForwardPlan};

/// Power below this is reported as silence
const POWER_FLOOR: f32 = 1e-12;

/// FFT analyzer producing power per linear frequency bin
pub struct FftSpectrum {
    engine: Arc<FftEngine>,
    plan: Option<ForwardPlan>,
    window_size: usize,
    rate: f64,
    freq_per_bin: f64,
    /// Windowed samples written by the host
    input: Vec<f32>,
    /// Copy of `input` consumed by the transform
    fft_in: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Power for bins 0..=N/2
    power: Vec<f32>,
    window: Vec<f32>,
}

impl FftSpectrum {
    /// Analyzer planned through the process-wide [`FftEngine`]
    pub fn new(window_size: usize, sample_rate: f64) -> SpResult<Self> {
        Self::with_engine(FftEngine::shared(), window_size, sample_rate)
    }

    pub fn with_engine(
        engine: Arc<FftEngine>,
        window_size: usize,
        sample_rate: f64,
    ) -> SpResult<Self> {
        let mut spectrum = Self {
            engine,
            plan: None,
            window_size: 0,
            rate: 0.0,
            freq_per_bin: 0.0,
            input: Vec::new(),
            fft_in: Vec::new(),
            spectrum: Vec::new(),
            scratch: Vec::new(),
            power: Vec::new(),
            window: Vec::new(),
        };
        spectrum.init(window_size, sample_rate)?;
        Ok(spectrum)
    }

    /// Reallocate buffers and re-plan for a new window size or rate
    ///
    /// Setup-time only. On error the analyzer keeps its previous
    /// configuration.
    pub fn init(&mut self, window_size: usize, sample_rate: f64) -> SpResult<()> {
        let rate = check_sample_rate(sample_rate)?;
        if window_size < 2 || window_size % 2 != 0 {
            return Err(SpError::InvalidParam(format!(
                "FFT window size must be even and at least 2, got {}",
                window_size
            )));
        }

        if let Some(old) = self.plan.take() {
            self.engine.release(old);
        }
        let plan = self.engine.plan_forward(window_size);

        self.window_size = window_size;
        self.rate = rate;
        self.freq_per_bin = rate / window_size as f64;
        self.input = vec![0.0; window_size];
        self.fft_in = plan.make_input_vec();
        self.spectrum = plan.make_output_vec();
        self.scratch = plan.make_scratch_vec();
        self.power = vec![0.0; window_size / 2 + 1];
        self.window = Self::hann_window(window_size);
        self.plan = Some(plan);

        log::debug!(
            "FftSpectrum: window={} rate={} bins={}",
            window_size,
            rate,
            self.power.len()
        );
        Ok(())
    }

    /// Hann window scaled so its sum is 2 (unit gain for a bin-centered sine)
    fn hann_window(size: usize) -> Vec<f32> {
        let raw: Vec<f64> = (0..size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
            .collect();
        let scale = 2.0 / raw.iter().sum::<f64>();
        raw.iter().map(|&w| (w * scale) as f32).collect()
    }

    /// Clear power and input
    pub fn reset(&mut self) {
        self.input.fill(0.0);
        self.power.fill(0.0);
        self.spectrum.fill(Complex::new(0.0, 0.0));
    }

    /// Window `data` into the analysis buffer starting at `offset`
    pub fn set_data_hann(&mut self, data: &[Sample], offset: usize) -> SpResult<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= self.window_size)
            .ok_or(SpError::BufferOverrun {
                offset,
                len: data.len(),
                capacity: self.window_size,
            })?;

        for ((dst, &src), &w) in self.input[offset..end]
            .iter_mut()
            .zip(data)
            .zip(&self.window[offset..end])
        {
            *dst = src * w;
        }
        Ok(())
    }

    /// Transform the analysis buffer and update per-bin power
    pub fn execute(&mut self) {
        let Some(plan) = &self.plan else {
            return;
        };
        self.fft_in.copy_from_slice(&self.input);

        if plan
            .process_with_scratch(&mut self.fft_in, &mut self.spectrum, &mut self.scratch)
            .is_err()
        {
            self.power.fill(0.0);
            return;
        }

        let nyquist = self.power.len() - 1;
        self.power[0] = self.spectrum[0].re * self.spectrum[0].re;
        for (p, c) in self.power[1..nyquist]
            .iter_mut()
            .zip(&self.spectrum[1..nyquist])
        {
            *p = c.re * c.re + c.im * c.im;
        }
        self.power[nyquist] = self.spectrum[nyquist].re * self.spectrum[nyquist].re;
    }

    /// Power of bin `b` in dB
    ///
    /// `pink` weights by the bin index (equal energy per octave display).
    /// Returns negative infinity below 1e-12 or for an out-of-range bin.
    pub fn power_at_bin(&self, b: usize, gain: f32, pink: bool) -> f32 {
        let Some(&power) = self.power.get(b) else {
            return f32::NEG_INFINITY;
        };
        let weight = if pink { b as f32 } else { 1.0 };
        let a = power * gain * weight;
        if a > POWER_FLOOR {
            Decibels::from_power(a).0
        } else {
            f32::NEG_INFINITY
        }
    }

    /// Center frequency of bin `b` in Hz
    #[inline]
    pub fn freq_at_bin(&self, b: usize) -> f32 {
        (b as f64 * self.freq_per_bin) as f32
    }

    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of power bins (DC through Nyquist)
    #[inline]
    pub fn bins(&self) -> usize {
        self.power.len()
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.rate
    }

    /// Linear power per bin from the last `execute`
    #[inline]
    pub fn powers(&self) -> &[f32] {
        &self.power
    }
}

impl Drop for FftSpectrum {
    fn drop(&mut self) {
        if let Some(plan) = self.plan.take() {
            self.engine.release(plan);
        }
    }
}
