//! Error types for setup-time validation
//!
//! Per-block processing never fails; these only surface from constructors,
//! re-initialization and host-facing conversions.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Buffer overrun: {len} samples at offset {offset} exceed capacity {capacity}")]
    BufferOverrun {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("Unknown filter type: {0}")]
    UnknownFilterType(u32),

    #[error("Unknown noise type: {0}")]
    UnknownNoiseType(u32),
}

/// Result type alias
pub type SpResult<T> = Result<T, SpError>;

/// Validate a sample rate handed in by the host
pub fn check_sample_rate(rate: f64) -> SpResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(SpError::InvalidSampleRate(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_sample_rate() {
        assert_eq!(check_sample_rate(48000.0), Ok(48000.0));
        assert!(matches!(check_sample_rate(0.0), Err(SpError::InvalidSampleRate(_))));
        assert!(check_sample_rate(f64::NAN).is_err());
        assert!(check_sample_rate(-44100.0).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = SpError::BufferOverrun {
            offset: 1000,
            len: 100,
            capacity: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Buffer overrun: 100 samples at offset 1000 exceed capacity 1024"
        );
        assert_eq!(SpError::UnknownFilterType(42).to_string(), "Unknown filter type: 42");
    }
}
