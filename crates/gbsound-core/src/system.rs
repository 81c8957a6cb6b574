use log::debug;

use crate::{
    apu::Apu,
    hardware::Model,
    scheduler::{ExitReason, HostCpu, Scheduler, Suspend, SyncMode, ThreadId},
    sink::AudioSink,
};

/// A host CPU and the APU sharing one [`Scheduler`].
///
/// The CPU thread runs until it has charged the APU for more time than the
/// APU has executed; the APU thread then runs until it catches up and yields
/// back.
pub struct System<C> {
    pub cpu: C,
    pub apu: Apu,
    pub scheduler: Scheduler,
    host_clocks: u64,
}

impl<C: HostCpu> System<C> {
    pub fn new(cpu: C, model: Model) -> Self {
        Self {
            cpu,
            apu: Apu::new(model),
            scheduler: Scheduler::new(),
            host_clocks: 0,
        }
    }

    /// Host clocks executed by the CPU thread since construction or reset.
    pub fn host_clocks(&self) -> u64 {
        self.host_clocks
    }

    /// Power-cycle the APU and hand execution back to the CPU.
    pub fn reset(&mut self) {
        self.apu.power();
        self.scheduler = Scheduler::new();
        self.host_clocks = 0;
    }

    /// Run both threads until at least `budget` host clocks have executed.
    ///
    /// The APU is always caught up with the CPU when this returns
    /// [`ExitReason::BudgetExhausted`]. Any sync request other than
    /// [`SyncMode::Normal`] stops the loop at the next suspension point.
    pub fn run_for<S: AudioSink + ?Sized>(&mut self, budget: u64, sink: &mut S) -> ExitReason {
        let mut executed = 0u64;
        loop {
            match self.scheduler.active() {
                ThreadId::Apu => match self.apu.enter(&mut self.scheduler, sink) {
                    Suspend::Yield => {}
                    Suspend::Synchronize => return ExitReason::SynchronizeEvent,
                },
                ThreadId::Cpu => {
                    if self.scheduler.sync != SyncMode::Normal {
                        return ExitReason::SynchronizeEvent;
                    }
                    if executed >= budget {
                        return ExitReason::BudgetExhausted;
                    }
                    let clocks = self.cpu.step(&mut self.apu);
                    self.apu.add_host_clocks(clocks);
                    executed += clocks as u64;
                    self.host_clocks += clocks as u64;
                    if self.apu.clock() < 0 {
                        self.scheduler.switch_to(ThreadId::Apu);
                    }
                }
            }
        }
    }

    /// Bring every thread to a consistent boundary.
    ///
    /// The CPU is already between instructions whenever the caller holds
    /// `&mut self`, so only the APU needs to be driven to its sync point.
    /// Afterwards the previously active thread holds execution again and the
    /// sync mode is back to [`SyncMode::Normal`].
    pub fn synchronize<S: AudioSink + ?Sized>(&mut self, sink: &mut S) {
        let previous = self.scheduler.active();

        // CPU first, then everything. The CPU half is already satisfied.
        self.scheduler.sync = SyncMode::Cpu;
        debug!("synchronize: CPU stopped at instruction boundary");
        self.scheduler.sync = SyncMode::All;
        if self.scheduler.active() != ThreadId::Apu {
            self.scheduler.switch_to(ThreadId::Apu);
        }
        let suspend = self.apu.enter(&mut self.scheduler, sink);
        debug_assert_eq!(suspend, Suspend::Synchronize);

        if self.scheduler.active() != previous {
            self.scheduler.resume(previous);
        }
        self.scheduler.sync = SyncMode::Normal;
        debug!(
            "synchronized at APU cycle {} (host clock {})",
            self.apu.cycles(),
            self.host_clocks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Executes nothing but NOPs.
    struct IdleCpu;

    impl HostCpu for IdleCpu {
        fn step(&mut self, _apu: &mut Apu) -> u32 {
            4
        }
    }

    /// Powers the APU on with its first instruction.
    struct PowerOnCpu {
        done: bool,
    }

    impl HostCpu for PowerOnCpu {
        fn step(&mut self, apu: &mut Apu) -> u32 {
            if !self.done {
                apu.write(0xFF26, 0x80);
                self.done = true;
            }
            4
        }
    }

    #[test]
    fn apu_runs_at_half_host_rate() {
        let mut system = System::new(IdleCpu, Model::Dmg);
        let mut samples = Vec::new();
        let exit = system.run_for(8192, &mut samples);
        assert_eq!(exit, ExitReason::BudgetExhausted);
        assert_eq!(samples.len(), 4096);
        assert_eq!(system.apu.cycles(), 4096);
        assert_eq!(system.apu.clock(), 0);
        assert_eq!(system.scheduler.active(), ThreadId::Cpu);
    }

    #[test]
    fn budget_resumes_where_it_left_off() {
        let mut system = System::new(IdleCpu, Model::Dmg);
        let mut samples = Vec::new();
        for _ in 0..10 {
            system.run_for(4, &mut samples);
        }
        assert_eq!(samples.len(), 20);
        assert_eq!(system.host_clocks(), 40);
    }

    #[test]
    fn cpu_writes_reach_apu() {
        let mut system = System::new(PowerOnCpu { done: false }, Model::Dmg);
        system.run_for(4, &mut crate::sink::NullSink);
        assert!(system.apu.is_powered());
    }

    #[test]
    fn sync_request_stops_cpu() {
        let mut system = System::new(IdleCpu, Model::Dmg);
        system.scheduler.sync = SyncMode::Cpu;
        let mut samples = Vec::new();
        assert_eq!(
            system.run_for(1000, &mut samples),
            ExitReason::SynchronizeEvent
        );
        assert!(samples.is_empty());
        assert_eq!(system.host_clocks(), 0);
    }

    #[test]
    fn synchronize_restores_previous_thread() {
        let mut system = System::new(IdleCpu, Model::Dmg);
        let mut samples = Vec::new();
        system.run_for(400, &mut samples);
        let produced = samples.len();

        system.synchronize(&mut samples);
        assert_eq!(samples.len(), produced);
        assert_eq!(system.scheduler.active(), ThreadId::Cpu);
        assert_eq!(system.scheduler.sync, SyncMode::Normal);

        assert_eq!(system.run_for(4, &mut samples), ExitReason::BudgetExhausted);
        assert_eq!(samples.len(), produced + 2);
    }

    #[test]
    fn reset_returns_to_power_on() {
        let mut system = System::new(PowerOnCpu { done: false }, Model::Cgb);
        system.run_for(100, &mut crate::sink::NullSink);
        system.reset();
        assert!(!system.apu.is_powered());
        assert_eq!(system.apu.cycles(), 0);
        assert_eq!(system.host_clocks(), 0);
    }
}
