use clap::{Parser, Subcommand};
use gbsound_core::hardware::Model;
use log::{LevelFilter, debug};
use std::error::Error;
use std::path::PathBuf;

#[cfg(feature = "playback")]
mod audio;
mod config;
mod render;
mod script;

use config::Config;
use render::RenderSettings;
use script::Script;

#[derive(Parser)]
#[command(name = "gbsound", version, about = "Game Boy APU register-script renderer")]
struct Args {
    /// Config file (defaults to the per-user gbsound/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Force DMG mode
    #[arg(long, global = true, conflicts_with = "cgb")]
    dmg: bool,

    /// Force CGB mode
    #[arg(long, global = true, conflicts_with = "dmg")]
    cgb: bool,

    /// Output sample rate in Hz
    #[arg(long, global = true)]
    sample_rate: Option<u32>,

    /// Length to render, in seconds
    #[arg(long, global = true)]
    seconds: Option<f64>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a register script to a 16-bit stereo WAV file
    Render { script: PathBuf, out: PathBuf },
    /// Play a register script on the default audio device
    #[cfg(feature = "playback")]
    Play { script: PathBuf },
}

impl Args {
    /// Merge command-line overrides over the config file.
    fn settings(&self, cfg: &Config) -> Result<RenderSettings, Box<dyn Error>> {
        let mut cfg = cfg.clone();
        if let Some(rate) = self.sample_rate {
            cfg.sample_rate = rate;
        }
        if let Some(seconds) = self.seconds {
            cfg.seconds = seconds;
        }
        if self.dmg {
            cfg.model = Model::Dmg.to_string();
        } else if self.cgb {
            cfg.model = Model::Cgb.to_string();
        }
        cfg.validate()?;
        Ok(RenderSettings {
            model: cfg.model()?,
            sample_rate: cfg.sample_rate,
            seconds: cfg.seconds,
        })
    }
}

fn load_script(path: &std::path::Path) -> Result<Script, script::ScriptError> {
    let script = Script::load(path)?;
    debug!(
        "script {}: {} writes, last at host clock {}",
        path.display(),
        script.writes().len(),
        script.last_write_at()
    );
    Ok(script)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_from_file(&config_path);
    debug!("config {}: {cfg:?}", config_path.display());
    let settings = args.settings(&cfg)?;

    match &args.command {
        Command::Render { script, out } => {
            let script = load_script(script)?;
            render::render_to_wav(&script, &settings, out)?;
        }
        #[cfg(feature = "playback")]
        Command::Play { script } => {
            let script = load_script(script)?;
            audio::play(&script, &settings)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "gbsound",
            "render",
            "in.toml",
            "out.wav",
            "--cgb",
            "--seconds",
            "0.5",
        ]);
        let settings = args.settings(&Config::default()).unwrap();
        assert_eq!(settings.model, Model::Cgb);
        assert_eq!(settings.seconds, 0.5);
        assert_eq!(settings.sample_rate, 44_100);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args::parse_from(["gbsound", "--sample-rate", "0", "render", "a", "b"]);
        assert!(args.settings(&Config::default()).is_err());
    }

    #[test]
    fn model_flags_conflict() {
        assert!(Args::try_parse_from(["gbsound", "--dmg", "--cgb", "render", "a", "b"]).is_err());
    }
}
