use gbsound_core::hardware::Model;
use gbsound_core::scheduler::CPU_FREQUENCY;
use gbsound_core::sink::Resampler;
use gbsound_core::system::System;
use log::{info, warn};
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::script::{Script, ScriptCpu};

/// Host clocks run between drains of the resampler, about 1/64 s.
pub(crate) const CHUNK_CLOCKS: u64 = 65_536;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub model: Model,
    pub sample_rate: u32,
    pub seconds: f64,
}

impl RenderSettings {
    /// Host clocks covering the requested duration.
    pub fn host_clocks(&self) -> u64 {
        (self.seconds * CPU_FREQUENCY as f64).ceil() as u64
    }
}

/// Report skipped writes once a render or playback has ended.
pub(crate) fn warn_unplayed(system: &System<ScriptCpu>) {
    let pending = system.cpu.pending();
    if pending > 0 {
        warn!(
            "{pending} script writes fall after the end of the render (host clock {}) and were skipped",
            system.cpu.now()
        );
    }
}

/// Render `script` to a 16-bit stereo WAV file. Returns the number of frames
/// written.
pub fn render_to_wav(
    script: &Script,
    settings: &RenderSettings,
    out_path: &Path,
) -> Result<u64, Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: settings.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    if let Some(parent) = out_path
        .parent()
        .and_then(|p| (!p.as_os_str().is_empty()).then_some(p))
    {
        fs::create_dir_all(parent)?;
    }
    let mut writer = hound::WavWriter::create(out_path, spec)?;

    let mut system = System::new(script.cpu(), settings.model);
    let mut resampler = Resampler::new(Vec::new(), settings.sample_rate);
    let total = settings.host_clocks();

    while system.host_clocks() < total {
        let budget = (total - system.host_clocks()).min(CHUNK_CLOCKS);
        system.run_for(budget, &mut resampler);
        for (left, right) in resampler.inner_mut().drain(..) {
            writer.write_sample(left)?;
            writer.write_sample(right)?;
        }
    }
    writer.finalize()?;

    warn_unplayed(&system);
    let frames = resampler.frames();
    info!(
        "wrote {frames} stereo frames ({:.2}s, {}) to {}",
        settings.seconds,
        settings.model,
        out_path.display()
    );
    Ok(frames)
}
