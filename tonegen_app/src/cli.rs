use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tonegen_core::{ToneConfig, Waveform};

/// Real-time tone generator driven by the keyboard.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON config file. Command-line options override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Requested output sample rate in Hz.
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Fail instead of using the closest supported sample rate.
    #[arg(long, default_value_t = false)]
    pub exact_sample_rate: bool,

    /// Initial tone frequency in Hz (20 to 20000).
    #[arg(long, value_name = "HZ")]
    pub frequency: Option<f32>,

    /// Initial volume (0.0 to 1.0).
    #[arg(long)]
    pub volume: Option<f32>,

    /// Initial waveform.
    #[arg(long, value_enum)]
    pub waveform: Option<WaveformArg>,

    /// Frames per audio callback. Defaults to the device's choice.
    #[arg(long, value_name = "FRAMES")]
    pub buffer_size: Option<u32>,

    /// Output channel count. Defaults to the device's choice.
    #[arg(long)]
    pub channels: Option<u16>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformArg {
    Sine,
    Square,
    Sawtooth,
}

impl From<WaveformArg> for Waveform {
    fn from(arg: WaveformArg) -> Self {
        match arg {
            WaveformArg::Sine => Waveform::Sine,
            WaveformArg::Square => Waveform::Square,
            WaveformArg::Sawtooth => Waveform::Sawtooth,
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then command-line overrides.
    pub fn resolve_config(&self) -> Result<ToneConfig> {
        let mut config = match &self.config {
            Some(path) => ToneConfig::from_json_file(path)?,
            None => ToneConfig::default(),
        };

        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if self.exact_sample_rate {
            config.exact_sample_rate = true;
        }
        if let Some(frequency) = self.frequency {
            config.frequency = frequency;
        }
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if let Some(waveform) = self.waveform {
            config.waveform = waveform.into();
        }
        if self.buffer_size.is_some() {
            config.buffer_size = self.buffer_size;
        }
        if self.channels.is_some() {
            config.channels = self.channels;
        }

        config.validate().context("rejected configuration")?;
        Ok(config)
    }
}
