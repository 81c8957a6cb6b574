use super::length::LengthCounter;
use crate::hardware::Model;

/// Output right-shift per NR32 volume code: mute, 100%, 50%, 25%.
const VOLUME_SHIFT: [u8; 4] = [4, 0, 1, 2];

/// Wave channel (NR30-NR34) plus its 32-nibble pattern RAM.
#[derive(Clone, Debug)]
pub(crate) struct WaveChannel {
    pub(crate) enabled: bool,
    pub(crate) dac_enabled: bool,
    pub(crate) length: LengthCounter,
    /// Volume code (NR32 bits 6-5).
    pub(crate) volume: u8,
    pub(crate) frequency: u16,
    period: u16,
    /// Nibble index into `pattern` (0-31).
    pub(crate) position: u8,
    sample: u8,
    /// Set for the cycle right after a fetch; DMG only exposes wave RAM then.
    hold: bool,
    pub(crate) pattern: [u8; 16],
    pub(crate) output: u8,
}

impl WaveChannel {
    pub(crate) fn new() -> Self {
        Self {
            enabled: false,
            dac_enabled: false,
            length: LengthCounter::new(256),
            volume: 0,
            frequency: 0,
            period: 0,
            position: 0,
            sample: 0,
            hold: false,
            pattern: [0; 16],
            output: 0,
        }
    }

    #[inline]
    fn nibble(&self, position: u8) -> u8 {
        let byte = self.pattern[(position >> 1) as usize];
        if position & 1 == 0 { byte >> 4 } else { byte & 0x0F }
    }

    pub(crate) fn run(&mut self) {
        self.hold = false;

        if self.period != 0 {
            self.period -= 1;
            if self.period == 0 {
                self.period = 2048 - self.frequency;
                self.position = (self.position + 1) & 0x1F;
                self.sample = self.nibble(self.position);
                self.hold = true;
            }
        }

        self.output = if self.enabled {
            self.sample >> VOLUME_SHIFT[self.volume as usize]
        } else {
            0
        };
    }

    pub(crate) fn clock_length(&mut self) {
        if self.length.clock() {
            self.enabled = false;
        }
    }

    /// Register read for offset 0-4 (NR30-NR34).
    pub(crate) fn read(&self, reg: u16) -> u8 {
        match reg {
            0 => (self.dac_enabled as u8) << 7 | 0x7F,
            1 => 0xFF,
            2 => 0x80 | self.volume << 5 | 0x1F,
            3 => 0xFF,
            4 => 0x80 | (self.length.counter as u8) << 6 | 0x3F,
            _ => 0xFF,
        }
    }

    pub(crate) fn write(&mut self, reg: u16, val: u8, phase: u8, model: Model) {
        match reg {
            0 => {
                self.dac_enabled = val & 0x80 != 0;
                if !self.dac_enabled {
                    self.enabled = false;
                }
            }
            1 => self.length.load(val),
            2 => self.volume = (val >> 5) & 0x03,
            3 => self.frequency = (self.frequency & 0x0700) | val as u16,
            4 => {
                if self.length.write_enable(val & 0x40 != 0, phase) {
                    self.enabled = false;
                }
                self.frequency = (self.frequency & 0x00FF) | ((val & 0x07) as u16) << 8;
                if val & 0x80 != 0 {
                    self.trigger(phase, model);
                }
            }
            _ => {}
        }
    }

    fn trigger(&mut self, phase: u8, model: Model) {
        if model.corrupts_wave_ram_on_retrigger() && self.enabled && self.hold {
            let index = (self.position >> 1) as usize;
            if index < 4 {
                self.pattern[0] = self.pattern[index];
            } else {
                let base = index & !0x03;
                self.pattern.copy_within(base..base + 4, 0);
            }
        }

        self.enabled = self.dac_enabled;
        self.period = 2048 - self.frequency;
        self.position = 0;
        self.sample = 0;
        self.hold = false;
        self.length.trigger(phase);
        apu_trace!(
            "wave trigger enabled={} freq={} length={}",
            self.enabled,
            self.frequency,
            self.length.length
        );
    }

    /// Wave RAM read. While playing, the CPU sees the byte being played.
    pub(crate) fn read_ram(&self, index: usize, model: Model) -> u8 {
        if self.enabled {
            if model.locks_wave_ram_between_fetches() && !self.hold {
                return 0xFF;
            }
            return self.pattern[(self.position >> 1) as usize];
        }
        self.pattern[index & 0x0F]
    }

    pub(crate) fn write_ram(&mut self, index: usize, val: u8, model: Model) {
        if self.enabled {
            if model.locks_wave_ram_between_fetches() && !self.hold {
                return;
            }
            self.pattern[(self.position >> 1) as usize] = val;
        } else {
            self.pattern[index & 0x0F] = val;
        }
    }

    /// NR52 power-off. Pattern RAM is not touched.
    pub(crate) fn power(&mut self, initialize_length: bool) {
        let length = self.length;
        let pattern = self.pattern;
        *self = Self::new();
        self.pattern = pattern;
        if !initialize_length {
            self.length.length = length.length;
        }
    }
}
