use cpal::traits::{DeviceTrait, HostTrait};
use log::{info, warn};
use std::collections::HashSet;
use std::fmt;

const COMMON_SAMPLE_RATES: [u32; 11] = [
    8000, 11025, 16000, 22050, 32000, 44100, 48000, 88200, 96000, 176400, 192000,
];

/// One supported output configuration range as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigRange {
    pub channels: u16,
    pub sample_format: cpal::SampleFormat,
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
}

impl ConfigRange {
    pub fn contains(&self, sample_rate: u32) -> bool {
        (self.min_sample_rate..=self.max_sample_rate).contains(&sample_rate)
    }

    /// The requested rate pinned into this range.
    pub fn closest_rate(&self, target: u32) -> u32 {
        target.clamp(self.min_sample_rate, self.max_sample_rate)
    }
}

#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub name: String,
    pub host_name: String,

    pub supported_sample_rates: Vec<u32>,
    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    pub default_sample_rate: u32,

    pub supported_channels: Vec<u16>,
    pub max_channels: u16,
    pub default_channels: u16,

    pub supported_sample_formats: Vec<cpal::SampleFormat>,
    pub default_sample_format: cpal::SampleFormat,

    /// Every reported range. Never empty: falls back to the default config.
    pub config_ranges: Vec<ConfigRange>,
}

impl DeviceInfo {
    /// Ranges usable with this exact format and channel count.
    pub fn matching_ranges(
        &self,
        sample_format: cpal::SampleFormat,
        channels: u16,
    ) -> impl Iterator<Item = &ConfigRange> {
        self.config_ranges
            .iter()
            .filter(move |r| r.sample_format == sample_format && r.channels == channels)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}ch @ {}Hz, {}]",
            self.name, self.default_channels, self.default_sample_rate, self.host_name
        )
    }
}

pub type EnumResult<T> = Result<T, EnumError>;

#[derive(Debug)]
pub enum EnumError {
    NoOutputDevice,
    QueryFailed(String),
    Unsupported(&'static str),
}

impl fmt::Display for EnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOutputDevice => write!(f, "No default output device available"),
            Self::QueryFailed(msg) => write!(f, "Device query failed: {}", msg),
            Self::Unsupported(what) => write!(f, "{} is not exposed by the audio host", what),
        }
    }
}

impl std::error::Error for EnumError {}

/// Locate the default host's default output device and describe it.
pub fn default_output_device() -> EnumResult<(cpal::Device, DeviceInfo)> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(EnumError::NoOutputDevice)?;
    let info = query_device_info(&device, host.id().name())?;
    Ok((device, info))
}

/// Collect the output capabilities of `device`.
pub fn query_device_info(device: &cpal::Device, host_name: &str) -> EnumResult<DeviceInfo> {
    let name = device
        .name()
        .map_err(|e| EnumError::QueryFailed(format!("Failed to get device name: {}", e)))?;

    let default_config = device
        .default_output_config()
        .map_err(|e| EnumError::QueryFailed(format!("Failed to get default config: {}", e)))?;

    let mut sample_rates = Vec::new();
    let mut min_sample_rate = u32::MAX;
    let mut max_sample_rate = 0u32;
    let mut channels_set = HashSet::new();
    let mut max_channels = 0u16;
    let mut sample_formats = Vec::new();
    let mut config_ranges = Vec::new();

    let configs = device
        .supported_output_configs()
        .map_err(|e| EnumError::QueryFailed(format!("Failed to get supported configs: {}", e)))?;

    for config_range in configs {
        let min_sr = config_range.min_sample_rate().0;
        let max_sr = config_range.max_sample_rate().0;
        min_sample_rate = min_sample_rate.min(min_sr);
        max_sample_rate = max_sample_rate.max(max_sr);

        sample_rates.extend(
            COMMON_SAMPLE_RATES
                .iter()
                .copied()
                .filter(|rate| (min_sr..=max_sr).contains(rate)),
        );

        let channels = config_range.channels();
        channels_set.insert(channels);
        max_channels = max_channels.max(channels);

        let format = config_range.sample_format();
        if !sample_formats.contains(&format) {
            sample_formats.push(format);
        }

        config_ranges.push(ConfigRange {
            channels,
            sample_format: format,
            min_sample_rate: min_sr,
            max_sample_rate: max_sr,
        });
    }

    // Some backends report no ranges at all; fall back to the default config.
    if config_ranges.is_empty() {
        let rate = default_config.sample_rate().0;
        min_sample_rate = rate;
        max_sample_rate = rate;
        channels_set.insert(default_config.channels());
        sample_formats.push(default_config.sample_format());
        config_ranges.push(ConfigRange {
            channels: default_config.channels(),
            sample_format: default_config.sample_format(),
            min_sample_rate: rate,
            max_sample_rate: rate,
        });
    }

    sample_rates.sort_unstable();
    sample_rates.dedup();

    let mut supported_channels: Vec<u16> = channels_set.into_iter().collect();
    supported_channels.sort_unstable();

    Ok(DeviceInfo {
        name,
        host_name: host_name.to_string(),
        supported_sample_rates: sample_rates,
        min_sample_rate,
        max_sample_rate,
        default_sample_rate: default_config.sample_rate().0,
        supported_channels,
        max_channels: max_channels.max(default_config.channels()),
        default_channels: default_config.channels(),
        supported_sample_formats: sample_formats,
        default_sample_format: default_config.sample_format(),
        config_ranges,
    })
}

/// Informational properties of the output device, each queried on its own.
///
/// A failed query only produces a warning; it never stops startup.
#[derive(Debug)]
pub struct DeviceReport {
    pub name: EnumResult<String>,
    pub sample_rate: EnumResult<u32>,
    pub channels: EnumResult<u16>,
    pub channel_volumes: EnumResult<Vec<f32>>,
}

impl DeviceReport {
    pub fn probe(device: &cpal::Device) -> Self {
        let default_config = device
            .default_output_config()
            .map_err(|e| EnumError::QueryFailed(e.to_string()));
        let (sample_rate, channels) = match default_config {
            Ok(config) => (Ok(config.sample_rate().0), Ok(config.channels())),
            Err(e) => (Err(e), Err(EnumError::QueryFailed("default config unavailable".into()))),
        };

        Self {
            name: device.name().map_err(|e| EnumError::QueryFailed(e.to_string())),
            sample_rate,
            channels,
            channel_volumes: Err(EnumError::Unsupported("Per-channel volume")),
        }
    }

    /// One line per property, `Err` for the ones that could not be read.
    pub fn lines(&self) -> Vec<Result<String, String>> {
        let line = |label: &str, value: Result<String, &EnumError>| match value {
            Ok(v) => Ok(format!("{}: {}", label, v)),
            Err(e) => Err(format!("Could not retrieve {}: {}", label.to_lowercase(), e)),
        };

        vec![
            line("Default Device", self.name.as_ref().map(Clone::clone)),
            line("Sample Rate", self.sample_rate.as_ref().map(|r| format!("{} Hz", r))),
            line("Channels", self.channels.as_ref().map(|c| c.to_string())),
            line(
                "Volume",
                self.channel_volumes.as_ref().map(|volumes| {
                    volumes
                        .iter()
                        .enumerate()
                        .map(|(ch, v)| format!("ch{} = {:.2}", ch + 1, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                }),
            ),
        ]
    }

    pub fn log(&self) {
        for line in self.lines() {
            match line {
                Ok(text) => info!("{}", text),
                Err(text) => warn!("{}", text),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_range_bounds() {
        let range = ConfigRange {
            channels: 2,
            sample_format: cpal::SampleFormat::I16,
            min_sample_rate: 44_100,
            max_sample_rate: 96_000,
        };
        assert!(range.contains(44_100));
        assert!(range.contains(96_000));
        assert!(!range.contains(192_000));
        assert_eq!(range.closest_rate(192_000), 96_000);
        assert_eq!(range.closest_rate(8_000), 44_100);
        assert_eq!(range.closest_rate(48_000), 48_000);
    }

    #[test]
    fn report_lines_degrade_independently() {
        let report = DeviceReport {
            name: Ok("Speakers".to_string()),
            sample_rate: Err(EnumError::QueryFailed("busy".into())),
            channels: Ok(2),
            channel_volumes: Err(EnumError::Unsupported("Per-channel volume")),
        };

        let lines = report.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], Ok("Default Device: Speakers".to_string()));
        assert_eq!(
            lines[1],
            Err("Could not retrieve sample rate: Device query failed: busy".to_string())
        );
        assert_eq!(lines[2], Ok("Channels: 2".to_string()));
        assert!(lines[3].as_ref().unwrap_err().contains("not exposed"));
    }

    #[test]
    fn report_formats_volumes() {
        let report = DeviceReport {
            name: Ok("Out".to_string()),
            sample_rate: Ok(96_000),
            channels: Ok(2),
            channel_volumes: Ok(vec![0.5, 0.75]),
        };
        let lines = report.lines();
        assert_eq!(lines[1], Ok("Sample Rate: 96000 Hz".to_string()));
        assert_eq!(lines[3], Ok("Volume: ch1 = 0.50, ch2 = 0.75".to_string()));
    }

    #[test]
    fn device_info_display() {
        let info = DeviceInfo {
            name: "Speakers".into(),
            host_name: "ALSA".into(),
            supported_sample_rates: vec![44100, 48000],
            min_sample_rate: 44100,
            max_sample_rate: 48000,
            default_sample_rate: 48000,
            supported_channels: vec![2],
            max_channels: 2,
            default_channels: 2,
            supported_sample_formats: vec![cpal::SampleFormat::F32],
            default_sample_format: cpal::SampleFormat::F32,
            config_ranges: vec![ConfigRange {
                channels: 2,
                sample_format: cpal::SampleFormat::F32,
                min_sample_rate: 44100,
                max_sample_rate: 48000,
            }],
        };
        assert_eq!(info.matching_ranges(cpal::SampleFormat::F32, 2).count(), 1);
        assert_eq!(info.matching_ranges(cpal::SampleFormat::I16, 2).count(), 0);
        assert_eq!(info.matching_ranges(cpal::SampleFormat::F32, 1).count(), 0);
        assert_eq!(info.to_string(), "Speakers [2ch @ 48000Hz, ALSA]");
    }
}
