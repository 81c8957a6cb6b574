//! Cycle-accurate Game Boy / Game Boy Color audio core.
//!
//! This crate contains the platform-agnostic sound hardware: the four tone
//! generators, frame sequencer, mixer and DC filters, plus the cooperative
//! scheduler that interleaves the APU with a host CPU. Frontends (the CLI
//! renderer and player) live in separate crates and drive the core via the
//! [`system`] facade.

/// Audio Processing Unit (APU) emulation.
pub mod apu;

/// Hardware models and model-specific quirks.
pub mod hardware;

/// Deterministic generator for power-on RAM contents.
pub mod lfsr;

/// Lock-free sample ring between a render thread and an audio callback.
pub mod queue;

/// Thread identities, sync modes and the context-switch primitive.
pub mod scheduler;

/// Destinations for the APU's per-cycle sample stream.
pub mod sink;

/// Driver loop that wires a host CPU and the APU into a single machine.
pub mod system;

pub use apu::{APU_FREQUENCY, Apu};
pub use hardware::Model;
pub use scheduler::{CPU_FREQUENCY, ExitReason, HostCpu, Scheduler, Suspend, SyncMode, ThreadId};
pub use sink::AudioSink;
pub use system::System;
