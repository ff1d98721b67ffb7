//! Startup configuration.
//!
//! Values come from built-in defaults, then an optional JSON file, then
//! command-line overrides applied by the binary. `validate` runs last.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::control::{
    ControlState, DEFAULT_FREQUENCY, DEFAULT_VOLUME, MAX_FREQUENCY, MIN_FREQUENCY, Waveform,
};
use crate::error::{CoreError, CoreResult};

pub const DEFAULT_SAMPLE_RATE: u32 = 96_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToneConfig {
    /// Requested output sample rate in Hz.
    pub sample_rate: u32,
    /// Fail instead of falling back when `sample_rate` is unsupported.
    pub exact_sample_rate: bool,
    pub frequency: f32,
    pub volume: f32,
    pub waveform: Waveform,
    /// Frames per driver callback. `None` keeps the device default.
    pub buffer_size: Option<u32>,
    /// Output channel count. `None` keeps the device default.
    pub channels: Option<u16>,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            exact_sample_rate: false,
            frequency: DEFAULT_FREQUENCY,
            volume: DEFAULT_VOLUME,
            waveform: Waveform::Sine,
            buffer_size: None,
            channels: None,
        }
    }
}

impl ToneConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.sample_rate == 0 {
            return Err(CoreError::InvalidConfig("sample rate must be positive".into()));
        }
        if !self.frequency.is_finite()
            || !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&self.frequency)
        {
            return Err(CoreError::InvalidConfig(format!(
                "frequency {} Hz outside {MIN_FREQUENCY}..={MAX_FREQUENCY} Hz",
                self.frequency
            )));
        }
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(CoreError::InvalidConfig(format!(
                "volume {} outside 0.0..=1.0",
                self.volume
            )));
        }
        if self.buffer_size == Some(0) {
            return Err(CoreError::InvalidConfig("buffer size must be positive".into()));
        }
        if self.channels == Some(0) {
            return Err(CoreError::InvalidConfig("channel count must be positive".into()));
        }
        Ok(())
    }

    /// Build the shared control state seeded from this config.
    pub fn control_state(&self) -> ControlState {
        ControlState::new(self.frequency, self.volume, self.waveform)
    }
}
