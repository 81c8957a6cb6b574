use super::envelope::Envelope;
use super::length::LengthCounter;

/// Base divisor per NR43 bits 2-0, in 2 MHz cycles.
const DIVISORS: [u16; 8] = [4, 8, 16, 24, 32, 40, 48, 56];

/// Noise channel (NR41-NR44).
#[derive(Clone, Debug)]
pub(crate) struct NoiseChannel {
    pub(crate) enabled: bool,
    pub(crate) length: LengthCounter,
    pub(crate) envelope: Envelope,
    /// Clock shift (NR43 bits 7-4).
    pub(crate) clock_shift: u8,
    /// 7-bit LFSR mode (NR43 bit 3).
    pub(crate) narrow: bool,
    pub(crate) divisor: u8,
    pub(crate) lfsr: u16,
    period: u32,
    pub(crate) output: u8,
}

impl NoiseChannel {
    pub(crate) fn new() -> Self {
        Self {
            enabled: false,
            length: LengthCounter::new(64),
            envelope: Envelope::default(),
            clock_shift: 0,
            narrow: false,
            divisor: 0,
            lfsr: 0,
            period: 0,
            output: 0,
        }
    }

    fn reload_period(&mut self) {
        self.period = (DIVISORS[self.divisor as usize] as u32) << self.clock_shift;
    }

    pub(crate) fn run(&mut self) {
        if self.period != 0 {
            self.period -= 1;
            if self.period == 0 {
                self.reload_period();
                // Shifts 14 and 15 receive no clocks at all.
                if self.clock_shift < 14 {
                    let bit = !(self.lfsr ^ (self.lfsr >> 1)) & 1;
                    self.lfsr = (self.lfsr >> 1) | bit << 14;
                    if self.narrow {
                        self.lfsr = (self.lfsr & !0x40) | bit << 6;
                    }
                }
            }
        }

        self.output = if self.enabled && self.lfsr & 1 != 0 {
            self.envelope.volume
        } else {
            0
        };
    }

    pub(crate) fn clock_length(&mut self) {
        if self.length.clock() {
            self.enabled = false;
        }
    }

    pub(crate) fn clock_envelope(&mut self) {
        if self.enabled {
            self.envelope.clock();
        }
    }

    /// Register read for offset 0-4 (0xFF1F, NR41-NR44).
    pub(crate) fn read(&self, reg: u16) -> u8 {
        match reg {
            2 => self.envelope.read(),
            3 => self.clock_shift << 4 | (self.narrow as u8) << 3 | self.divisor,
            4 => 0x80 | (self.length.counter as u8) << 6 | 0x3F,
            _ => 0xFF,
        }
    }

    pub(crate) fn write(&mut self, reg: u16, val: u8, phase: u8) {
        match reg {
            1 => self.length.load(val),
            2 => {
                self.envelope.write(val);
                if !self.envelope.dac_enabled() {
                    self.enabled = false;
                }
            }
            3 => {
                self.clock_shift = val >> 4;
                self.narrow = val & 0x08 != 0;
                self.divisor = val & 0x07;
                self.reload_period();
            }
            4 => {
                if self.length.write_enable(val & 0x40 != 0, phase) {
                    self.enabled = false;
                }
                if val & 0x80 != 0 {
                    self.trigger(phase);
                }
            }
            _ => {}
        }
    }

    fn trigger(&mut self, phase: u8) {
        self.enabled = self.envelope.dac_enabled();
        self.lfsr = 0;
        self.reload_period();
        self.envelope.trigger();
        self.length.trigger(phase);
        apu_trace!(
            "noise trigger enabled={} shift={} divisor={} narrow={}",
            self.enabled,
            self.clock_shift,
            self.divisor,
            self.narrow
        );
    }

    pub(crate) fn power(&mut self, initialize_length: bool) {
        let length = self.length;
        *self = Self::new();
        if !initialize_length {
            self.length.length = length.length;
        }
    }
}
