//! sp-core: Shared types for the signal-primitives crates
//!
//! Sample type, decibel conversions, denormal flushing and the error type
//! used by `sp-dsp`.

mod error;
mod sample;

pub use error::*;
pub use sample::*;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f32);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f32::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f32) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    /// Power ratio (not amplitude) to decibels
    #[inline]
    pub fn from_power(power: f32) -> Self {
        if power <= 0.0 {
            Self::NEG_INF
        } else {
            Self(10.0 * power.log10())
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}
