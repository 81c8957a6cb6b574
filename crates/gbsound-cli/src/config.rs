use gbsound_core::apu::APU_FREQUENCY;
use gbsound_core::hardware::{Model, ParseModelError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output rate for rendered or played audio.
    pub sample_rate: u32,
    /// `dmg` or `cgb`.
    pub model: String,
    /// Length of a render, in seconds.
    pub seconds: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            model: Model::default().to_string(),
            seconds: 2.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Model(#[from] ParseModelError),
    #[error("sample rate {0} Hz is outside 1..={max}", max = APU_FREQUENCY)]
    SampleRate(u32),
    #[error("duration must be a positive number of seconds, got {0}")]
    Seconds(f64),
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model()?;
        if self.sample_rate == 0 || self.sample_rate > APU_FREQUENCY {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        if !(self.seconds.is_finite() && self.seconds > 0.0) {
            return Err(ConfigError::Seconds(self.seconds));
        }
        Ok(())
    }

    pub fn model(&self) -> Result<Model, ConfigError> {
        Ok(self.model.parse()?)
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("gbsound").join("config.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("gbsound").join("config.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("gbsound")
            .join("config.toml");
    }

    PathBuf::from("gbsound.toml")
}

/// Load the config at `path`. A missing file silently yields the defaults;
/// a malformed one is reported and also yields the defaults.
pub fn load_from_file(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            debug!("no config at {}: {e}", path.display());
            return Config::default();
        }
    };

    match Config::parse(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to load config {}: {e}; using defaults",
                path.display()
            );
            Config::default()
        }
    }
}
