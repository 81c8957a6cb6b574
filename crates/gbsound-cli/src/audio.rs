use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use gbsound_core::queue::{SampleConsumer, sample_queue};
use gbsound_core::sink::Resampler;
use gbsound_core::system::System;
use log::{error, info};
use std::error::Error;
use std::thread;
use std::time::Duration;

use crate::render::{CHUNK_CLOCKS, RenderSettings, warn_unplayed};
use crate::script::Script;

/// Buffered audio ahead of the device, in seconds.
const QUEUE_SECONDS: f64 = 0.25;

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    consumer: SampleConsumer,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let channels = config.channels as usize;
    let err_fn = |err| error!("cpal stream error: {err}");

    let stream = match sample_format {
        cpal::SampleFormat::I16 => device.build_output_stream(
            config,
            move |data: &mut [i16], _| {
                for frame in data.chunks_mut(channels) {
                    let (left, right) = consumer.pop().unwrap_or((0, 0));
                    frame[0] = left;
                    if channels > 1 {
                        frame[1] = right;
                    }
                }
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::U16 => device.build_output_stream(
            config,
            move |data: &mut [u16], _| {
                for frame in data.chunks_mut(channels) {
                    let (left, right) = consumer.pop().unwrap_or((0, 0));
                    frame[0] = (left as i32 + 32768) as u16;
                    if channels > 1 {
                        frame[1] = (right as i32 + 32768) as u16;
                    }
                }
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::F32 => device.build_output_stream(
            config,
            move |data: &mut [f32], _| {
                for frame in data.chunks_mut(channels) {
                    let (left, right) = consumer.pop().unwrap_or((0, 0));
                    frame[0] = left as f32 / 32768.0;
                    if channels > 1 {
                        frame[1] = right as f32 / 32768.0;
                    }
                }
            },
            err_fn,
            None,
        )?,
        other => return Err(format!("unsupported sample format {other:?}").into()),
    };
    Ok(stream)
}

/// Play `script` on the default output device, blocking until it has been
/// rendered and drained. The device's own rate replaces
/// `settings.sample_rate`.
pub fn play(script: &Script, settings: &RenderSettings) -> Result<(), Box<dyn Error>> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("no default audio output device")?;
    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let rate = config.sample_rate.0;
    info!(
        "playing at {rate} Hz, {} channel(s), {sample_format:?}",
        config.channels
    );

    let (producer, consumer) = sample_queue((rate as f64 * QUEUE_SECONDS) as usize);
    let stream = build_stream(&device, &config, sample_format, consumer)?;
    stream.play()?;

    let mut system = System::new(script.cpu(), settings.model);
    let mut sink = Resampler::new(producer, rate);
    let total = settings.host_clocks();
    while system.host_clocks() < total {
        let queue = sink.inner();
        if queue.len() > queue.capacity() / 2 {
            thread::sleep(Duration::from_millis(5));
            continue;
        }
        let budget = (total - system.host_clocks()).min(CHUNK_CLOCKS);
        system.run_for(budget, &mut sink);
    }
    while !sink.inner().is_empty() {
        thread::sleep(Duration::from_millis(5));
    }

    warn_unplayed(&system);
    if sink.inner().dropped() > 0 {
        info!("{} frames dropped by the output queue", sink.inner().dropped());
    }
    Ok(())
}
