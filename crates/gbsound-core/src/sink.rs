use crate::apu::APU_FREQUENCY;

/// Receives one stereo sample pair per APU cycle.
///
/// Called from inside the APU's cycle loop, so implementations must not
/// block.
pub trait AudioSink {
    fn audio_sample(&mut self, left: i16, right: i16);
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    #[inline]
    fn audio_sample(&mut self, left: i16, right: i16) {
        (**self).audio_sample(left, right);
    }
}

impl AudioSink for Vec<(i16, i16)> {
    #[inline]
    fn audio_sample(&mut self, left: i16, right: i16) {
        self.push((left, right));
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(i16, i16)> AudioSink for FnSink<F> {
    #[inline]
    fn audio_sample(&mut self, left: i16, right: i16) {
        (self.0)(left, right);
    }
}

/// Discards everything; useful when only register-visible state matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    #[inline]
    fn audio_sample(&mut self, _left: i16, _right: i16) {}
}

/// Box-filter decimator from the 2 MHz APU rate down to a host sample rate.
///
/// Every input pair is accumulated; once enough input time has passed for
/// one output frame, the average is forwarded to the inner sink.
pub struct Resampler<S> {
    inner: S,
    sample_rate: u32,
    /// Output-rate ticks accumulated, in units of 1/`APU_FREQUENCY` seconds.
    phase: u64,
    sum_left: i64,
    sum_right: i64,
    count: u32,
    frames: u64,
}

impl<S: AudioSink> Resampler<S> {
    pub fn new(inner: S, sample_rate: u32) -> Self {
        assert!(
            sample_rate > 0 && sample_rate <= APU_FREQUENCY,
            "output rate {sample_rate} Hz must be in 1..={APU_FREQUENCY}"
        );
        Self {
            inner,
            sample_rate,
            phase: 0,
            sum_left: 0,
            sum_right: 0,
            count: 0,
            frames: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames delivered to the inner sink so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AudioSink> AudioSink for Resampler<S> {
    fn audio_sample(&mut self, left: i16, right: i16) {
        self.sum_left += left as i64;
        self.sum_right += right as i64;
        self.count += 1;
        self.phase += self.sample_rate as u64;
        if self.phase >= APU_FREQUENCY as u64 {
            self.phase -= APU_FREQUENCY as u64;
            let n = self.count as i64;
            self.inner
                .audio_sample((self.sum_left / n) as i16, (self.sum_right / n) as i16);
            self.sum_left = 0;
            self.sum_right = 0;
            self.count = 0;
            self.frames += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink = Vec::new();
        sink.audio_sample(1, 2);
        sink.audio_sample(3, 4);
        assert_eq!(sink, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn resampler_emits_output_rate() {
        let mut rs = Resampler::new(Vec::new(), 44_100);
        for _ in 0..APU_FREQUENCY {
            rs.audio_sample(100, -100);
        }
        assert_eq!(rs.frames(), 44_100);
        assert!(rs.inner().iter().all(|&f| f == (100, -100)));
    }

    #[test]
    fn resampler_averages_window() {
        let mut rs = Resampler::new(Vec::new(), APU_FREQUENCY / 2);
        rs.audio_sample(10, 0);
        rs.audio_sample(20, 4);
        assert_eq!(rs.into_inner(), vec![(15, 2)]);
    }

    #[test]
    fn closure_sink_forwards() {
        let mut total = 0i32;
        {
            let mut sink = FnSink(|l: i16, r: i16| total += l as i32 + r as i32);
            sink.audio_sample(5, 6);
        }
        assert_eq!(total, 11);
    }
}
