/// Per-sample weight of one 4-bit channel output.
const CHANNEL_SCALE: i32 = 512;
/// Midpoint offset so that four silent channels sit at the negative rail.
const MIX_OFFSET: i32 = 16384;

/// Sound control registers (NR50, NR51, NR52 bit 7) and the stereo mixer.
#[derive(Clone, Debug, Default)]
pub(crate) struct Master {
    /// APU power (NR52 bit 7).
    pub(crate) enable: bool,
    /// VIN routing bits (NR50 bits 7 and 3); stored for read-back only.
    left_in_enable: bool,
    right_in_enable: bool,
    pub(crate) left_volume: u8,
    pub(crate) right_volume: u8,
    /// NR51 panning: bits 7-4 route noise/wave/pulse2/pulse1 left, 3-0 right.
    pub(crate) panning: u8,
}

/// One mixed sample per output channel, before DC filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixedSample {
    pub center: i16,
    pub left: i16,
    pub right: i16,
}

impl Master {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Mix the four channel outputs (pulse 1, pulse 2, wave, noise).
    pub(crate) fn mix(&self, outputs: [u8; 4]) -> MixedSample {
        let mut center = 0i32;
        let mut left = 0i32;
        let mut right = 0i32;
        for (idx, &out) in outputs.iter().enumerate() {
            let out = out as i32;
            center += out;
            if self.panning & (0x10 << idx) != 0 {
                left += out;
            }
            if self.panning & (0x01 << idx) != 0 {
                right += out;
            }
        }

        let center = center * CHANNEL_SCALE - MIX_OFFSET;
        let left = (left * CHANNEL_SCALE - MIX_OFFSET) * (self.left_volume as i32 + 1) / 8;
        let right = (right * CHANNEL_SCALE - MIX_OFFSET) * (self.right_volume as i32 + 1) / 8;

        MixedSample {
            center: center as i16,
            left: left as i16,
            right: right as i16,
        }
    }

    /// Read NR50 (reg 0) or NR51 (reg 1). NR52 is assembled by the APU since
    /// it reports channel state.
    pub(crate) fn read(&self, reg: u16) -> u8 {
        match reg {
            0 => {
                (self.left_in_enable as u8) << 7
                    | self.left_volume << 4
                    | (self.right_in_enable as u8) << 3
                    | self.right_volume
            }
            1 => self.panning,
            _ => 0xFF,
        }
    }

    pub(crate) fn write(&mut self, reg: u16, val: u8) {
        match reg {
            0 => {
                self.left_in_enable = val & 0x80 != 0;
                self.left_volume = (val >> 4) & 0x07;
                self.right_in_enable = val & 0x08 != 0;
                self.right_volume = val & 0x07;
            }
            1 => self.panning = val,
            _ => {}
        }
    }

    /// NR52 power-off: everything but the power bit itself goes back to zero.
    pub(crate) fn power(&mut self) {
        *self = Self {
            enable: self.enable,
            ..Self::default()
        };
    }
}
