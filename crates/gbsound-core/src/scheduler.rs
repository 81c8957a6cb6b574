//! Cooperative handoff between the host CPU and the APU.
//!
//! Exactly one thread runs at a time. Threads are plain step functions: a
//! thread "suspends" by returning to the driver loop in [`crate::system`],
//! and is "resumed" by being called again. All progress lives in the
//! thread's own state, so nothing is lost between calls.

use log::trace;

use crate::apu::Apu;

/// Host CPU clock (4.194304 MHz) used to charge the APU's clock accumulator.
pub const CPU_FREQUENCY: u32 = 4_194_304;

/// Execution contexts known to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThreadId {
    Cpu,
    Apu,
}

/// How hard the host wants every thread to stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Run freely.
    #[default]
    Normal,
    /// The CPU stops at the next instruction boundary.
    Cpu,
    /// Every thread stops at the top of its next cycle.
    All,
}

/// Why a driver loop handed control back to its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The requested number of host clocks has been executed.
    BudgetExhausted,
    /// A thread reached the synchronization point requested by [`SyncMode::All`].
    SynchronizeEvent,
}

/// How an APU step ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suspend {
    /// Caught up with the CPU; control was passed to [`ThreadId::Cpu`].
    Yield,
    /// Stopped at a cycle boundary because of [`SyncMode::All`].
    Synchronize,
}

/// The host CPU as seen by the APU: something that executes one instruction
/// at a time, may access APU registers while doing so, and reports the
/// clocks it consumed.
pub trait HostCpu {
    fn step(&mut self, apu: &mut Apu) -> u32;
}

/// Shared scheduling authority.
#[derive(Debug)]
pub struct Scheduler {
    pub sync: SyncMode,
    active: ThreadId,
    switches: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            sync: SyncMode::Normal,
            active: ThreadId::Cpu,
            switches: 0,
        }
    }

    /// Thread that currently holds execution.
    pub fn active(&self) -> ThreadId {
        self.active
    }

    /// Number of context switches performed so far.
    pub fn switches(&self) -> u64 {
        self.switches
    }

    /// Yield primitive: hand execution to `to`.
    ///
    /// # Panics
    ///
    /// Panics if `to` is already running. Resuming a thread that is not
    /// suspended would desynchronize the machine, so this is always fatal.
    pub fn switch_to(&mut self, to: ThreadId) {
        assert_ne!(
            self.active, to,
            "scheduler asked to resume {to:?}, which is not suspended"
        );
        trace!("scheduler: {:?} -> {:?}", self.active, to);
        self.active = to;
        self.switches += 1;
    }

    /// Resume `thread` from the scheduling authority. Same contract as
    /// [`switch_to`](Self::switch_to).
    pub fn resume(&mut self, thread: ThreadId) {
        self.switch_to(thread);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
