use log::debug;

use crate::hardware::Model;
use crate::lfsr::SeedGenerator;
use crate::scheduler::{CPU_FREQUENCY, Scheduler, Suspend, SyncMode, ThreadId};
use crate::sink::AudioSink;

#[cfg(feature = "apu-trace")]
macro_rules! apu_trace {
    ($($arg:tt)*) => {
        log::trace!(target: "gbsound::apu", $($arg)*);
    };
}
#[cfg(not(feature = "apu-trace"))]
macro_rules! apu_trace {
    ($($arg:tt)*) => {};
}

mod envelope;
mod filter;
mod length;
mod master;
mod noise;
mod sequencer;
mod square;
mod wave;

pub use filter::DcFilter;
pub use master::MixedSample;
pub use sequencer::{FrameEvents, FrameSequencer};

use master::Master;
use noise::NoiseChannel;
use square::SquareChannel;
use wave::WaveChannel;

/// APU clock rate: one sample pair is produced per cycle.
pub const APU_FREQUENCY: u32 = 2_097_152;
/// `stage` wraps every 4096 cycles, giving the 512 Hz sequencer step.
const STAGE_MASK: u16 = 0x0FFF;

/// First and last address of the APU's I/O window.
pub const IO_START: u16 = 0xFF10;
pub const IO_END: u16 = 0xFF3F;

const NR52: u16 = 0xFF26;
const PCM12: u16 = 0xFF76;
const PCM34: u16 = 0xFF77;

/// Game Boy audio processing unit.
///
/// Owns the four channels, the frame sequencer, the mixer and the DC filters.
/// Drive it either directly with [`run_cycle`](Self::run_cycle) or through
/// [`enter`](Self::enter) under a [`Scheduler`].
pub struct Apu {
    model: Model,
    ch1: SquareChannel,
    ch2: SquareChannel,
    ch3: WaveChannel,
    ch4: NoiseChannel,
    master: Master,
    sequencer: FrameSequencer,
    /// Cycle counter within the current sequencer step.
    stage: u16,
    /// Events fired during the most recent cycle, if it was a step cycle.
    last_events: Option<FrameEvents>,
    center_filter: DcFilter,
    left_filter: DcFilter,
    right_filter: DcFilter,
    center: i16,
    left: i16,
    right: i16,
    /// Scheduler accumulator: negative while the APU lags the CPU.
    clock: i64,
    host_frequency: u32,
    cycles: u64,
}

impl Apu {
    pub fn new(model: Model) -> Self {
        let mut apu = Self {
            model,
            ch1: SquareChannel::new(true),
            ch2: SquareChannel::new(false),
            ch3: WaveChannel::new(),
            ch4: NoiseChannel::new(),
            master: Master::new(),
            sequencer: FrameSequencer::new(),
            stage: 0,
            last_events: None,
            center_filter: DcFilter::new(),
            left_filter: DcFilter::new(),
            right_filter: DcFilter::new(),
            center: 0,
            left: 0,
            right: 0,
            clock: 0,
            host_frequency: CPU_FREQUENCY,
            cycles: 0,
        };
        apu.power();
        apu
    }

    /// Power-on reset. Wave RAM is filled from a fixed LFSR seed so runs are
    /// reproducible.
    pub fn power(&mut self) {
        self.ch1 = SquareChannel::new(true);
        self.ch2 = SquareChannel::new(false);
        self.ch3 = WaveChannel::new();
        self.ch4 = NoiseChannel::new();
        self.master = Master::new();
        self.sequencer.reset();
        self.stage = 0;
        self.last_events = None;
        self.center_filter.reset();
        self.left_filter.reset();
        self.right_filter.reset();
        self.center = 0;
        self.left = 0;
        self.right = 0;
        self.clock = 0;
        self.cycles = 0;

        SeedGenerator::new().fill(&mut self.ch3.pattern);
        debug!("APU power-on ({})", self.model);
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Clock rate of the host whose cycles are charged via
    /// [`add_host_clocks`](Self::add_host_clocks).
    ///
    /// # Panics
    ///
    /// Panics if `hz` is zero.
    pub fn set_host_frequency(&mut self, hz: u32) {
        assert!(hz > 0, "host frequency must be non-zero");
        self.host_frequency = hz;
    }

    pub fn host_frequency(&self) -> u32 {
        self.host_frequency
    }

    /// Scheduler clock accumulator. The APU owes cycles while this is negative.
    pub fn clock(&self) -> i64 {
        self.clock
    }

    /// Charge the APU for `clocks` host cycles executed elsewhere.
    pub fn add_host_clocks(&mut self, clocks: u32) {
        self.clock -= clocks as i64 * APU_FREQUENCY as i64;
    }

    fn clock_frame_sequencer(&mut self, events: FrameEvents) {
        if events.length {
            self.ch1.clock_length();
            self.ch2.clock_length();
            self.ch3.clock_length();
            self.ch4.clock_length();
        }
        if events.sweep {
            self.ch1.clock_sweep();
        }
        if events.envelope {
            self.ch1.clock_envelope();
            self.ch2.clock_envelope();
            self.ch4.clock_envelope();
        }
    }

    /// Execute one APU cycle: sequencer, channels, mixer and DC filters.
    /// Returns the filtered `(left, right)` pair for this cycle.
    pub fn run_cycle(&mut self) -> (i16, i16) {
        self.last_events = None;
        if self.stage == 0 {
            let events = self.sequencer.step();
            self.clock_frame_sequencer(events);
            self.last_events = Some(events);
        }
        self.stage = (self.stage + 1) & STAGE_MASK;

        self.ch1.run();
        self.ch2.run();
        self.ch3.run();
        self.ch4.run();

        let mix = self.master.mix(self.outputs());
        self.center = self.center_filter.apply(mix.center);
        self.left = self.left_filter.apply(mix.left);
        self.right = self.right_filter.apply(mix.right);

        self.cycles += 1;
        (self.left, self.right)
    }

    /// Run as the APU thread until it either catches up with the CPU or a
    /// full synchronization is requested.
    ///
    /// One call covers the code between two suspension points: the sync
    /// check at the top of each cycle and the yield after it. Every cycle
    /// delivers exactly one sample pair to `sink`.
    ///
    /// # Panics
    ///
    /// Panics if the scheduler's active thread is not [`ThreadId::Apu`].
    pub fn enter<S: AudioSink + ?Sized>(
        &mut self,
        scheduler: &mut Scheduler,
        sink: &mut S,
    ) -> Suspend {
        assert_eq!(
            scheduler.active(),
            ThreadId::Apu,
            "APU entered while {:?} holds execution",
            scheduler.active()
        );
        loop {
            if scheduler.sync == SyncMode::All {
                return Suspend::Synchronize;
            }

            let (left, right) = self.run_cycle();
            sink.audio_sample(left, right);

            self.clock += self.host_frequency as i64;
            if self.clock >= 0 && scheduler.sync != SyncMode::All {
                scheduler.switch_to(ThreadId::Cpu);
                return Suspend::Yield;
            }
        }
    }

    fn read_status(&self) -> u8 {
        (self.master.enable as u8) << 7
            | 0x70
            | (self.ch4.enabled as u8) << 3
            | (self.ch3.enabled as u8) << 2
            | (self.ch2.enabled as u8) << 1
            | self.ch1.enabled as u8
    }

    /// Read a register in the APU window; unmapped addresses read `0xFF`.
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF10..=0xFF14 => self.ch1.read(addr - 0xFF10),
            0xFF15..=0xFF19 => self.ch2.read(addr - 0xFF15),
            0xFF1A..=0xFF1E => self.ch3.read(addr - 0xFF1A),
            0xFF1F..=0xFF23 => self.ch4.read(addr - 0xFF1F),
            0xFF24..=0xFF25 => self.master.read(addr - 0xFF24),
            NR52 => self.read_status(),
            0xFF30..=0xFF3F => self.ch3.read_ram((addr - 0xFF30) as usize, self.model),
            _ => 0xFF,
        }
    }

    /// Write a register in the APU window. While powered off only NR52 is
    /// writable.
    pub fn write(&mut self, addr: u16, val: u8) {
        if !self.master.enable && addr != NR52 {
            return;
        }
        let phase = self.sequencer.phase();
        match addr {
            0xFF10..=0xFF14 => self.ch1.write(addr - 0xFF10, val, phase),
            0xFF15..=0xFF19 => self.ch2.write(addr - 0xFF15, val, phase),
            0xFF1A..=0xFF1E => self.ch3.write(addr - 0xFF1A, val, phase, self.model),
            0xFF1F..=0xFF23 => self.ch4.write(addr - 0xFF1F, val, phase),
            0xFF24..=0xFF25 => self.master.write(addr - 0xFF24, val),
            NR52 => self.write_power(val),
            0xFF30..=0xFF3F => self.ch3.write_ram((addr - 0xFF30) as usize, val, self.model),
            _ => {}
        }
    }

    fn write_power(&mut self, val: u8) {
        let enable = val & 0x80 != 0;
        if !enable && self.master.enable {
            let initialize_length = self.model.clears_length_on_power_off();
            self.ch1.power(initialize_length);
            self.ch2.power(initialize_length);
            self.ch3.power(initialize_length);
            self.ch4.power(initialize_length);
            self.master.power();
            debug!("APU powered off");
        }
        if enable && !self.master.enable {
            self.sequencer.reset();
            debug!("APU powered on");
        }
        self.master.enable = enable;
    }

    /// CGB PCM12/PCM34 read-back of the raw channel outputs.
    pub fn read_pcm(&self, addr: u16) -> u8 {
        if !self.model.has_pcm_registers() || !self.master.enable {
            return 0xFF;
        }
        match addr {
            PCM12 => self.ch2.output << 4 | self.ch1.output,
            PCM34 => self.ch4.output << 4 | self.ch3.output,
            _ => 0xFF,
        }
    }

    /// Raw 4-bit outputs of pulse 1, pulse 2, wave and noise.
    pub fn outputs(&self) -> [u8; 4] {
        [
            self.ch1.output,
            self.ch2.output,
            self.ch3.output,
            self.ch4.output,
        ]
    }

    pub fn is_powered(&self) -> bool {
        self.master.enable
    }

    /// Events fired during the last [`run_cycle`](Self::run_cycle), or
    /// `None` if it was not a sequencer step.
    pub fn frame_events(&self) -> Option<FrameEvents> {
        self.last_events
    }

    /// Sequencer phase that will be processed on the next step.
    pub fn phase(&self) -> u8 {
        self.sequencer.phase()
    }

    pub fn stage(&self) -> u16 {
        self.stage
    }

    /// Total cycles executed since power-on.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Filtered mono mix of the last cycle.
    pub fn center(&self) -> i16 {
        self.center
    }

    pub fn last_sample(&self) -> (i16, i16) {
        (self.left, self.right)
    }

    /// DC-bias accumulators for center, left and right.
    pub fn dc_bias(&self) -> [i64; 3] {
        [
            self.center_filter.bias(),
            self.left_filter.bias(),
            self.right_filter.bias(),
        ]
    }

    pub fn wave_ram(&self) -> [u8; 16] {
        self.ch3.pattern
    }

    pub fn ch1_frequency(&self) -> u16 {
        self.ch1.frequency
    }

    /// Current length counter value for channel 1.
    pub fn ch1_length(&self) -> u16 {
        self.ch1.length.length
    }

    /// Current envelope volume for channel 1.
    pub fn ch1_volume(&self) -> u8 {
        self.ch1.envelope.volume
    }

    /// Current sweep timer value for channel 1.
    pub fn ch1_sweep_timer(&self) -> u8 {
        self.ch1.sweep.as_ref().map(|s| s.timer).unwrap_or(0)
    }

    /// Current sweep shadow register value for channel 1.
    pub fn ch1_sweep_shadow(&self) -> u16 {
        self.ch1.sweep.as_ref().map(|s| s.shadow).unwrap_or(0)
    }

    pub fn ch2_length(&self) -> u16 {
        self.ch2.length.length
    }

    pub fn ch2_volume(&self) -> u8 {
        self.ch2.envelope.volume
    }

    pub fn ch3_length(&self) -> u16 {
        self.ch3.length.length
    }

    /// Current playback position within wave RAM for channel 3.
    pub fn ch3_position(&self) -> u8 {
        self.ch3.position
    }

    pub fn ch4_length(&self) -> u16 {
        self.ch4.length.length
    }

    pub fn ch4_volume(&self) -> u8 {
        self.ch4.envelope.volume
    }

    /// Current LFSR state for channel 4.
    pub fn ch4_lfsr(&self) -> u16 {
        self.ch4.lfsr
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new(Model::default())
    }
}
