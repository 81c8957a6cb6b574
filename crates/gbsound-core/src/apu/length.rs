/// Length counter shared by all four channels.
///
/// `max` is 64 for the pulse and noise channels and 256 for the wave channel.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LengthCounter {
    pub(crate) length: u16,
    /// Length enable (NRx4 bit 6).
    pub(crate) counter: bool,
    max: u16,
}

impl LengthCounter {
    pub(crate) const fn new(max: u16) -> Self {
        Self {
            length: max,
            counter: false,
            max,
        }
    }

    /// NRx1 length load; only the bits the register exposes are used.
    pub(crate) fn load(&mut self, value: u8) {
        let mask = (self.max - 1) as u8;
        self.length = self.max - (value & mask) as u16;
    }

    /// Advance one 256 Hz tick. Returns true when the counter expires and the
    /// channel must be silenced.
    pub(crate) fn clock(&mut self) -> bool {
        if self.counter && self.length > 0 {
            self.length -= 1;
            return self.length == 0;
        }
        false
    }

    /// Apply an NRx4 write. When the length enable goes high while the next
    /// sequencer step will not clock lengths, hardware clocks it right away.
    /// Returns true if that extra clock expired the counter.
    pub(crate) fn write_enable(&mut self, enable: bool, phase: u8) -> bool {
        let extra = phase & 1 != 0 && !self.counter && enable;
        self.counter = enable;
        if extra && self.length > 0 {
            self.length -= 1;
            return self.length == 0;
        }
        false
    }

    /// Reload on trigger if the counter ran out.
    pub(crate) fn trigger(&mut self, phase: u8) {
        if self.length == 0 {
            self.length = self.max;
            if phase & 1 != 0 && self.counter {
                self.length -= 1;
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.max);
    }
}
