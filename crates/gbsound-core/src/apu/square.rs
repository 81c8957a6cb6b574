use super::envelope::Envelope;
use super::length::LengthCounter;

/// Highest frequency value the 11-bit period registers can hold.
const MAX_FREQUENCY: u16 = 2047;

/// Whether a duty waveform is high at the given 3-bit phase.
///
/// 0 -> 12.5%, 1 -> 25%, 2 -> 50%, 3 -> 75%
#[inline]
fn duty_high(duty: u8, phase: u8) -> bool {
    match duty {
        0 => phase == 6,
        1 => phase >= 6,
        2 => phase >= 4,
        _ => phase <= 5,
    }
}

#[derive(Default, Clone, Debug)]
/// Channel 1 frequency sweep unit.
pub(crate) struct Sweep {
    /// Sweep pace in 128 Hz ticks (NR10 bits 6-4).
    pub(crate) period: u8,
    /// Subtract instead of add (NR10 bit 3).
    pub(crate) negate: bool,
    pub(crate) shift: u8,
    pub(crate) timer: u8,
    pub(crate) shadow: u16,
    pub(crate) enabled: bool,
    /// True if a subtraction has been calculated since the last trigger.
    neg_used: bool,
}

impl Sweep {
    fn reload_timer(&mut self) {
        self.timer = if self.period == 0 { 8 } else { self.period };
    }

    fn read(&self) -> u8 {
        0x80 | self.period << 4 | (self.negate as u8) << 3 | self.shift
    }
}

/// Pulse channel (NR10-NR14 or NR21-NR24).
#[derive(Clone, Debug)]
pub(crate) struct SquareChannel {
    pub(crate) enabled: bool,
    pub(crate) duty: u8,
    pub(crate) length: LengthCounter,
    pub(crate) envelope: Envelope,
    pub(crate) sweep: Option<Sweep>,
    pub(crate) frequency: u16,
    /// 2 MHz cycles left until the next duty step.
    period: u16,
    /// Position within the 8-step duty waveform.
    phase: u8,
    duty_output: bool,
    pub(crate) output: u8,
}

impl SquareChannel {
    pub(crate) fn new(with_sweep: bool) -> Self {
        Self {
            enabled: false,
            duty: 0,
            length: LengthCounter::new(64),
            envelope: Envelope::default(),
            sweep: with_sweep.then(Sweep::default),
            frequency: 0,
            period: 0,
            phase: 0,
            duty_output: false,
            output: 0,
        }
    }

    fn reload_period(&mut self) {
        self.period = 2 * (2048 - self.frequency);
    }

    /// Advance one subsystem cycle and refresh `output`.
    pub(crate) fn run(&mut self) {
        if self.period != 0 {
            self.period -= 1;
            if self.period == 0 {
                self.reload_period();
                self.phase = (self.phase + 1) & 7;
                self.duty_output = duty_high(self.duty, self.phase);
            }
        }

        self.output = if self.enabled && self.duty_output {
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

    /// One sweep calculation. `update` commits the result to the frequency;
    /// overflow always disables the channel.
    fn sweep_step(&mut self, update: bool) {
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        if !sweep.enabled {
            return;
        }
        let delta = sweep.shadow >> sweep.shift;
        let next = if sweep.negate {
            sweep.neg_used = true;
            sweep.shadow - delta
        } else {
            sweep.shadow + delta
        };

        if next > MAX_FREQUENCY {
            self.enabled = false;
        } else if sweep.shift != 0 && update {
            sweep.shadow = next;
            self.frequency = next;
            self.reload_period();
        }
    }

    pub(crate) fn clock_sweep(&mut self) {
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        if sweep.timer > 0 {
            sweep.timer -= 1;
        }
        if sweep.timer == 0 {
            sweep.reload_timer();
            if sweep.enabled && sweep.period != 0 {
                self.sweep_step(true);
                self.sweep_step(false);
            }
        }
    }

    /// Register read for offset 0-4 within the channel's window.
    pub(crate) fn read(&self, reg: u16) -> u8 {
        match reg {
            0 => self.sweep.as_ref().map_or(0xFF, Sweep::read),
            1 => self.duty << 6 | 0x3F,
            2 => self.envelope.read(),
            3 => 0xFF,
            4 => 0x80 | (self.length.counter as u8) << 6 | 0x3F,
            _ => 0xFF,
        }
    }

    /// Register write for offset 0-4. `phase` is the frame sequencer phase
    /// that will be processed next.
    pub(crate) fn write(&mut self, reg: u16, val: u8, phase: u8) {
        match reg {
            0 => {
                if let Some(sweep) = self.sweep.as_mut() {
                    // Leaving subtraction mode after it was used kills the channel.
                    if sweep.neg_used && sweep.negate && val & 0x08 == 0 {
                        self.enabled = false;
                    }
                    sweep.period = (val >> 4) & 0x07;
                    sweep.negate = val & 0x08 != 0;
                    sweep.shift = val & 0x07;
                }
            }
            1 => {
                self.duty = val >> 6;
                self.length.load(val);
            }
            2 => {
                self.envelope.write(val);
                if !self.envelope.dac_enabled() {
                    self.enabled = false;
                }
            }
            3 => self.frequency = (self.frequency & 0x0700) | val as u16,
            4 => {
                if self.length.write_enable(val & 0x40 != 0, phase) {
                    self.enabled = false;
                }
                self.frequency = (self.frequency & 0x00FF) | ((val & 0x07) as u16) << 8;
                if val & 0x80 != 0 {
                    self.trigger(phase);
                }
            }
            _ => {}
        }
    }

    fn trigger(&mut self, phase: u8) {
        self.enabled = self.envelope.dac_enabled();
        self.reload_period();
        self.envelope.trigger();
        self.length.trigger(phase);

        if let Some(sweep) = self.sweep.as_mut() {
            sweep.shadow = self.frequency;
            sweep.neg_used = false;
            sweep.reload_timer();
            sweep.enabled = sweep.period != 0 || sweep.shift != 0;
            if sweep.shift != 0 {
                self.sweep_step(false);
            }
        }
        apu_trace!(
            "square trigger enabled={} freq={} duty={} length={}",
            self.enabled,
            self.frequency,
            self.duty,
            self.length.length
        );
    }

    /// NR52 power-off. On DMG the length value survives; the NRx4 length
    /// enable does not.
    pub(crate) fn power(&mut self, initialize_length: bool) {
        let length = self.length;
        *self = Self::new(self.sweep.is_some());
        if !initialize_length {
            self.length.length = length.length;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triggered(with_sweep: bool, nr_x2: u8, frequency: u16) -> SquareChannel {
        let mut ch = SquareChannel::new(with_sweep);
        ch.write(2, nr_x2, 0);
        ch.write(3, frequency as u8, 0);
        ch.write(4, 0x80 | (frequency >> 8) as u8, 0);
        ch
    }

    #[test]
    fn duty_table_matches_hardware() {
        let pattern = |duty| (0..8).filter(|&p| duty_high(duty, p)).count();
        assert_eq!(pattern(0), 1);
        assert_eq!(pattern(1), 2);
        assert_eq!(pattern(2), 4);
        assert_eq!(pattern(3), 6);
    }

    #[test]
    fn trigger_requires_dac() {
        let ch = triggered(false, 0x00, 0x700);
        assert!(!ch.enabled);
        let ch = triggered(false, 0xF0, 0x700);
        assert!(ch.enabled);
    }

    #[test]
    fn duty_step_every_period() {
        let mut ch = triggered(false, 0xF0, 2047);
        ch.write(1, 0x80, 0); // 50%
        // Period is 2 cycles at frequency 2047; four steps reach phase 4.
        for _ in 0..8 {
            ch.run();
        }
        assert_eq!(ch.output, 15);
    }

    #[test]
    fn sweep_overflow_disables_on_trigger() {
        let mut ch = SquareChannel::new(true);
        ch.write(0, 0x11, 0); // pace 1, add, shift 1
        ch.write(2, 0xF0, 0);
        ch.write(3, 0x00, 0);
        ch.write(4, 0x87, 0); // 0x700 + 0x380 overflows
        assert!(!ch.enabled);
    }

    #[test]
    fn sweep_updates_then_overflows() {
        let mut ch = SquareChannel::new(true);
        ch.write(0, 0x11, 0);
        ch.write(2, 0xF0, 0);
        ch.write(3, 0x00, 0);
        ch.write(4, 0x85, 0); // 0x500 -> 0x780 is in range
        assert!(ch.enabled);
        ch.clock_sweep();
        assert_eq!(ch.frequency, 0x780);
        // The follow-up check (0x780 + 0x3C0) overflows.
        assert!(!ch.enabled);
    }

    #[test]
    fn sweep_timer_never_underflows() {
        let mut ch = SquareChannel::new(true);
        ch.write(0, 0x70, 0);
        ch.write(2, 0xF0, 0);
        ch.write(4, 0x80, 0);
        for _ in 0..64 {
            ch.clock_sweep();
            let timer = ch.sweep.as_ref().map(|s| s.timer).unwrap_or(0);
            assert!((1..=8).contains(&timer));
        }
    }

    #[test]
    fn clearing_negate_after_use_disables() {
        let mut ch = SquareChannel::new(true);
        ch.write(0, 0x19, 0); // pace 1, subtract, shift 1
        ch.write(2, 0xF0, 0);
        ch.write(4, 0x84, 0);
        assert!(ch.enabled);
        ch.write(0, 0x11, 0);
        assert!(!ch.enabled);
    }

    #[test]
    fn power_keeps_length_when_asked() {
        let mut ch = triggered(false, 0xF0, 0);
        ch.write(1, 0x3E, 0);
        ch.write(4, 0x40, 0);
        ch.power(false);
        assert_eq!(ch.length.length, 2);
        assert!(!ch.length.counter);
        assert_eq!(ch.read(4), 0xBF);
        ch.write(1, 0x3E, 0);
        ch.power(true);
        assert_eq!(ch.length.length, 64);
        assert!(!ch.enabled);
    }
}
