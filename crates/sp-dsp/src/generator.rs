//! Noise sources
//!
//! Deterministic for a given seed, so rendered noise can serve as a test
//! fixture.

use serde::{Deserialize, Serialize};
use sp_core::{Sample, SpError};

use crate::Processor;

/// Largest value the PRNG produces, `2^31 - 2`
const SEED_MAX: u32 = 0x7fff_fffe;
/// Gain applied to Gaussian noise
const GAUSSIAN_GAIN: f32 = 0.7079;
/// Pink filter input gain
const PINK_GAIN: f32 = 0.39572;

/// Noise color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseType {
    #[default]
    UniformWhite,
    GaussianWhite,
    /// -3 dB/octave
    Pink,
}

impl TryFrom<u32> for NoiseType {
    type Error = SpError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NoiseType::UniformWhite),
            1 => Ok(NoiseType::GaussianWhite),
            2 => Ok(NoiseType::Pink),
            other => Err(SpError::UnknownNoiseType(other)),
        }
    }
}

/// 31-bit Park–Miller minimal standard generator (Carta's formulation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkMiller {
    seed: u32,
}

impl ParkMiller {
    /// Seeds outside `1..=2^31 - 2` are folded into that range
    pub fn new(seed: u32) -> Self {
        let seed = seed % (SEED_MAX + 1);
        Self {
            seed: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Next value in `1..=2^31 - 2`
    #[inline]
    pub fn next_u31(&mut self) -> u32 {
        let mut lo = 16807u32.wrapping_mul(self.seed & 0xffff);
        let hi = 16807u32.wrapping_mul(self.seed >> 16);
        lo = lo.wrapping_add((hi & 0x7fff) << 16);
        lo = lo.wrapping_add(hi >> 15);
        lo = (lo & 0x7fff_ffff) + (lo >> 31);
        self.seed = lo;
        lo
    }

    /// Next value in `[-1, 1]`
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.next_u31() as f32 / 1_073_741_824.0 - 1.0
    }
}

impl Default for ParkMiller {
    fn default() -> Self {
        Self::new(1)
    }
}

/// White, Gaussian or pink noise generator
#[derive(Debug, Clone)]
pub struct Generator {
    kind: NoiseType,
    rng: ParkMiller,
    /// Pink filter bank
    b: [f32; 7],
    /// Second Box–Muller deviate, returned by the next call
    spare: Option<f32>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Uniform white noise, seed 1
    pub fn new() -> Self {
        Self::with_seed(1)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            kind: NoiseType::UniformWhite,
            rng: ParkMiller::new(seed),
            b: [0.0; 7],
            spare: None,
        }
    }

    /// Switch noise color; clears the filter bank and the Gaussian spare
    pub fn set_type(&mut self, kind: NoiseType) {
        self.kind = kind;
        self.b = [0.0; 7];
        self.spare = None;
    }

    pub fn noise_type(&self) -> NoiseType {
        self.kind
    }

    /// Overwrite `data` with noise
    pub fn run(&mut self, data: &mut [Sample]) {
        match self.kind {
            NoiseType::UniformWhite => {
                for sample in data.iter_mut() {
                    *sample = self.rng.next_f32();
                }
            }
            NoiseType::GaussianWhite => {
                for sample in data.iter_mut() {
                    *sample = GAUSSIAN_GAIN * self.gaussian();
                }
            }
            NoiseType::Pink => {
                for sample in data.iter_mut() {
                    *sample = self.pink();
                }
            }
        }
    }

    /// Polar Box–Muller, unit variance
    fn gaussian(&mut self) -> f32 {
        if let Some(spare) = self.spare.take() {
            return spare;
        }

        let (x1, x2, r) = loop {
            let x1 = self.rng.next_f32();
            let x2 = self.rng.next_f32();
            let r = x1 * x1 + x2 * x2;
            if r < 1.0 && r >= 1e-22 {
                break (x1, x2, r);
            }
        };

        let r = (-2.0 * r.ln() / r).sqrt();
        self.spare = Some(r * x2);
        r * x1
    }

    /// Paul Kellet's refined pink filter
    #[inline]
    fn pink(&mut self) -> f32 {
        let white = PINK_GAIN * self.rng.next_f32();
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let out = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115926;
        out
    }
}

impl Processor for Generator {
    fn reset(&mut self) {
        self.set_type(self.kind);
    }
}
