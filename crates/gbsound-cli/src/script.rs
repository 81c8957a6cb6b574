//! Timed register-write scripts.
//!
//! ```toml
//! [[write]]
//! at = 0          # host clock
//! addr = 0xFF26
//! value = 0x80
//! ```

use gbsound_core::apu::{Apu, IO_END, IO_START};
use gbsound_core::scheduler::HostCpu;
use log::trace;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Host clocks consumed by each scripted "instruction".
const CLOCKS_PER_STEP: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegisterWrite {
    pub at: u64,
    pub addr: u16,
    pub value: u8,
}

#[derive(Debug, Default, Deserialize)]
struct ScriptFile {
    #[serde(default, rename = "write")]
    writes: Vec<RegisterWrite>,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(
        "write #{index} targets {addr:#06X}, outside the APU window {start:#06X}..={end:#06X}",
        start = IO_START,
        end = IO_END
    )]
    AddressOutOfRange { index: usize, addr: u16 },
}

/// A validated script, ordered by time.
#[derive(Debug, Clone, Default)]
pub struct Script {
    writes: Vec<RegisterWrite>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile = toml::from_str(text)?;
        Self::from_writes(file.writes)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn from_writes(mut writes: Vec<RegisterWrite>) -> Result<Self, ScriptError> {
        if let Some((index, w)) = writes
            .iter()
            .enumerate()
            .find(|(_, w)| !(IO_START..=IO_END).contains(&w.addr))
        {
            return Err(ScriptError::AddressOutOfRange {
                index,
                addr: w.addr,
            });
        }
        // Stable: writes sharing a timestamp keep file order.
        writes.sort_by_key(|w| w.at);
        Ok(Self { writes })
    }

    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Host clock of the last write, or 0 for an empty script.
    pub fn last_write_at(&self) -> u64 {
        self.writes.last().map_or(0, |w| w.at)
    }

    pub fn cpu(&self) -> ScriptCpu {
        ScriptCpu {
            writes: self.writes.clone(),
            next: 0,
            now: 0,
        }
    }
}

/// Replays a [`Script`] as a host CPU: each step applies every write that is
/// due, then idles for [`CLOCKS_PER_STEP`] clocks.
#[derive(Debug, Clone)]
pub struct ScriptCpu {
    writes: Vec<RegisterWrite>,
    next: usize,
    now: u64,
}

impl ScriptCpu {
    /// Writes not yet applied.
    pub fn pending(&self) -> usize {
        self.writes.len() - self.next
    }

    pub fn now(&self) -> u64 {
        self.now
    }
}

impl HostCpu for ScriptCpu {
    fn step(&mut self, apu: &mut Apu) -> u32 {
        while let Some(w) = self.writes.get(self.next) {
            if w.at > self.now {
                break;
            }
            trace!("@{} write {:#06X} <- {:#04X}", self.now, w.addr, w.value);
            apu.write(w.addr, w.value);
            self.next += 1;
        }
        self.now += CLOCKS_PER_STEP as u64;
        CLOCKS_PER_STEP
    }
}
