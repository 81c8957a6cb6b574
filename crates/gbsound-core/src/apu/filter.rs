/// Fixed-point fraction bits of the feedback term.
const FRACTION_SHIFT: u32 = 16;
/// Bits separating the bias accumulator from sample units.
const BIAS_SHIFT: u32 = 32;
/// Decay constant, about 0.879 in 16.16 fixed point.
const DECAY: i64 = 57593;

/// One-pole DC-blocking high-pass filter for a single output channel.
///
/// Matches the reference output bit for bit, so it is integer-only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DcFilter {
    bias: i64,
}

impl DcFilter {
    pub const fn new() -> Self {
        Self { bias: 0 }
    }

    pub const fn bias(&self) -> i64 {
        self.bias
    }

    pub fn reset(&mut self) {
        self.bias = 0;
    }

    #[inline]
    pub fn apply(&mut self, sample: i16) -> i16 {
        let s = sample as i64;
        self.bias += (((s << FRACTION_SHIFT) - (self.bias >> FRACTION_SHIFT)) * DECAY)
            >> FRACTION_SHIFT;
        (s - (self.bias >> BIAS_SHIFT)).clamp(i16::MIN as i64, i16::MAX as i64) as i16
    }
}
