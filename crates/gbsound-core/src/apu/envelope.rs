/// Volume envelope used by both pulse channels and the noise channel.
#[derive(Default, Clone, Copy, Debug)]
pub(crate) struct Envelope {
    /// Initial volume (NRx2 bits 7-4).
    pub(crate) initial: u8,
    /// True when the volume ramps up (NRx2 bit 3).
    pub(crate) add: bool,
    /// Step period in 64 Hz ticks (NRx2 bits 2-0); zero stops the envelope.
    pub(crate) period: u8,
    pub(crate) timer: u8,
    pub(crate) volume: u8,
}

impl Envelope {
    pub(crate) fn write(&mut self, val: u8) {
        self.initial = val >> 4;
        self.add = val & 0x08 != 0;
        self.period = val & 0x07;
    }

    pub(crate) fn read(&self) -> u8 {
        self.initial << 4 | (self.add as u8) << 3 | self.period
    }

    /// The DAC is powered whenever any of NRx2 bits 7-3 are set.
    pub(crate) fn dac_enabled(&self) -> bool {
        self.initial != 0 || self.add
    }

    fn reload_timer(&mut self) {
        self.timer = if self.period == 0 { 8 } else { self.period };
    }

    pub(crate) fn trigger(&mut self) {
        self.reload_timer();
        self.volume = self.initial;
    }

    /// Advance one 64 Hz tick; callers skip this when the channel is off.
    pub(crate) fn clock(&mut self) {
        if self.period == 0 {
            return;
        }
        self.timer = self.timer.saturating_sub(1);
        if self.timer == 0 {
            self.reload_timer();
            if self.add && self.volume < 15 {
                self.volume += 1;
            } else if !self.add && self.volume > 0 {
                self.volume -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_up_and_saturates() {
        let mut env = Envelope::default();
        env.write(0xD9); // volume 13, up, period 1
        env.trigger();
        for _ in 0..40 {
            env.clock();
            assert!(env.volume <= 15);
        }
        assert_eq!(env.volume, 15);
    }

    #[test]
    fn ramps_down_and_saturates() {
        let mut env = Envelope::default();
        env.write(0x22); // volume 2, down, period 2
        env.trigger();
        env.clock();
        assert_eq!(env.volume, 2);
        env.clock();
        assert_eq!(env.volume, 1);
        for _ in 0..20 {
            env.clock();
        }
        assert_eq!(env.volume, 0);
    }

    #[test]
    fn zero_period_freezes_volume() {
        let mut env = Envelope::default();
        env.write(0xA0);
        env.trigger();
        for _ in 0..16 {
            env.clock();
        }
        assert_eq!(env.volume, 10);
    }

    #[test]
    fn dac_follows_upper_bits() {
        let mut env = Envelope::default();
        env.write(0x08);
        assert!(env.dac_enabled());
        env.write(0x07);
        assert!(!env.dac_enabled());
        assert_eq!(env.read(), 0x07);
    }
}
