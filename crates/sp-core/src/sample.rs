//! Sample type and denormal handling

/// Type alias for audio samples exchanged with the host
pub type Sample = f32;

/// Flushes recursive filter state that has left the normal range.
///
/// Zero, subnormals, NaN and infinities all collapse to exactly `0`, so a
/// single bad block can never keep a feedback register poisoned.
pub trait FlushDenormal: Copy {
    fn flush_denormal(self) -> Self;
}

impl FlushDenormal for f32 {
    #[inline(always)]
    fn flush_denormal(self) -> Self {
        if self.is_normal() { self } else { 0.0 }
    }
}

impl FlushDenormal for f64 {
    #[inline(always)]
    fn flush_denormal(self) -> Self {
        if self.is_normal() { self } else { 0.0 }
    }
}
