/// Events produced by a single 512 Hz frame sequencer step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameEvents {
    /// 256 Hz length counter clock.
    pub length: bool,
    /// 128 Hz channel 1 sweep clock.
    pub sweep: bool,
    /// 64 Hz volume envelope clock.
    pub envelope: bool,
}

impl FrameEvents {
    /// Event table for a sequencer phase.
    ///
    /// | phase | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 |
    /// |-------|---|---|---|---|---|---|---|---|
    /// | len   | x |   | x |   | x |   | x |   |
    /// | sweep |   |   | x |   |   |   | x |   |
    /// | env   |   |   |   |   |   |   |   | x |
    pub const fn for_phase(phase: u8) -> Self {
        let phase = phase & 7;
        Self {
            length: phase & 1 == 0,
            sweep: phase == 2 || phase == 6,
            envelope: phase == 7,
        }
    }

    pub const fn is_empty(self) -> bool {
        !(self.length || self.sweep || self.envelope)
    }
}

/// 3-bit frame sequencer phase counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSequencer {
    phase: u8,
}

impl FrameSequencer {
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// Phase that the next [`step`](Self::step) will process.
    pub const fn phase(&self) -> u8 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0;
    }

    /// Fire the events for the current phase and advance it.
    pub fn step(&mut self) -> FrameEvents {
        let events = FrameEvents::for_phase(self.phase);
        self.phase = (self.phase + 1) & 7;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_wraps_after_eight_steps() {
        let mut seq = FrameSequencer::new();
        for expected in (0..8).chain(0..8) {
            assert_eq!(seq.phase(), expected);
            seq.step();
        }
        assert_eq!(seq.phase(), 0);
    }

    #[test]
    fn odd_phases_without_envelope_are_idle() {
        for phase in [1, 3, 5] {
            assert!(FrameEvents::for_phase(phase).is_empty());
        }
        assert!(!FrameEvents::for_phase(7).is_empty());
    }

    #[test]
    fn length_and_sweep_coincide_only_on_two_and_six() {
        for phase in 0..8 {
            let ev = FrameEvents::for_phase(phase);
            assert_eq!(ev.length && ev.sweep, phase == 2 || phase == 6);
            assert!(!(ev.length && ev.envelope));
        }
    }
}
