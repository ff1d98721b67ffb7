use crate::audio_device::enumeration::DeviceInfo;
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};
use std::fmt;
use tonegen_core::ToneConfig;

/// Sample formats the stream builder can convert into, in order of preference.
pub const RENDERABLE_FORMATS: [SampleFormat; 3] = [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRatePriority {
    /// Use the requested rate or fail.
    Exact,
    /// Use the requested rate if possible, else the closest supported one.
    Closest,
}

#[derive(Debug, Clone)]
pub struct ConfigurationRequest {
    pub sample_rate: u32,
    pub sample_rate_priority: SampleRatePriority,
    pub channels: Option<u16>,
    pub buffer_size: Option<u32>,
}

impl ConfigurationRequest {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            sample_rate_priority: SampleRatePriority::Closest,
            channels: None,
            buffer_size: None,
        }
    }

    pub fn with_sample_rate_priority(mut self, priority: SampleRatePriority) -> Self {
        self.sample_rate_priority = priority;
        self
    }

    pub fn with_channels(mut self, channels: Option<u16>) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_buffer_size(mut self, size: Option<u32>) -> Self {
        self.buffer_size = size;
        self
    }
}

impl From<&ToneConfig> for ConfigurationRequest {
    fn from(config: &ToneConfig) -> Self {
        let priority = if config.exact_sample_rate {
            SampleRatePriority::Exact
        } else {
            SampleRatePriority::Closest
        };
        Self::new(config.sample_rate)
            .with_sample_rate_priority(priority)
            .with_channels(config.channels)
            .with_buffer_size(config.buffer_size)
    }
}

#[derive(Debug, Clone)]
pub struct NegotiatedConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_size: BufferSize,
    pub sample_format: SampleFormat,
    pub stream_config: StreamConfig,

    pub sample_rate_matched: bool,
    pub channels_matched: bool,
}

impl NegotiatedConfig {
    /// Frames per callback if fixed, else a typical device default.
    pub fn nominal_frames(&self) -> usize {
        match self.buffer_size {
            BufferSize::Fixed(frames) => frames as usize,
            BufferSize::Default => 512,
        }
    }
}

impl fmt::Display for NegotiatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ch @ {}Hz, buffer: {:?}, format: {:?}",
            self.channels, self.sample_rate, self.buffer_size, self.sample_format
        )
    }
}

#[derive(Debug, Clone)]
pub enum NegotiationError {
    SampleRateNotSupported { requested: u32, available: Vec<u32> },
    ChannelsNotSupported { requested: u16, available: Vec<u16> },
    FormatNotSupported { available: Vec<SampleFormat> },
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRateNotSupported { requested, available } => {
                write!(f, "Sample rate {} not supported. Available: {:?}", requested, available)
            }
            Self::ChannelsNotSupported { requested, available } => {
                write!(f, "Channel count {} not supported. Available: {:?}", requested, available)
            }
            Self::FormatNotSupported { available } => {
                write!(f, "No renderable sample format. Available: {:?}", available)
            }
        }
    }
}

impl std::error::Error for NegotiationError {}

pub type NegotiationResult<T> = Result<T, NegotiationError>;

pub struct ConfigNegotiator;

impl ConfigNegotiator {
    /// Rates are checked only against ranges of the chosen channel count and
    /// a renderable format, so the result is a config the host can open.
    pub fn negotiate(
        device_info: &DeviceInfo,
        request: &ConfigurationRequest,
    ) -> NegotiationResult<NegotiatedConfig> {
        let channels = Self::negotiate_channels(device_info, request)?;
        let formats = Self::candidate_formats(device_info, channels);
        let Some(&preferred_format) = formats.first() else {
            return Err(NegotiationError::FormatNotSupported {
                available: device_info.supported_sample_formats.clone(),
            });
        };

        let exact_format = formats.iter().copied().find(|&format| {
            device_info
                .matching_ranges(format, channels)
                .any(|range| range.contains(request.sample_rate))
        });

        let (sample_format, sample_rate) = match (exact_format, request.sample_rate_priority) {
            (Some(format), _) => (format, request.sample_rate),
            (None, SampleRatePriority::Exact) => {
                return Err(NegotiationError::SampleRateNotSupported {
                    requested: request.sample_rate,
                    available: device_info.supported_sample_rates.clone(),
                });
            }
            (None, SampleRatePriority::Closest) => formats
                .iter()
                .filter_map(|&format| {
                    Self::find_closest_sample_rate(device_info, format, channels, request.sample_rate)
                        .map(|rate| (format, rate))
                })
                .min_by_key(|&(_, rate)| rate.abs_diff(request.sample_rate))
                .unwrap_or((preferred_format, request.sample_rate)),
        };

        let buffer_size = match request.buffer_size {
            Some(frames) => BufferSize::Fixed(frames),
            None => BufferSize::Default,
        };

        let stream_config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: buffer_size.clone(),
        };

        Ok(NegotiatedConfig {
            sample_rate,
            channels,
            buffer_size,
            sample_format,
            stream_config,
            sample_rate_matched: sample_rate == request.sample_rate,
            channels_matched: request.channels.is_none_or(|c| c == channels),
        })
    }

    /// Closest rate to `target` within the ranges for this format and channel
    /// count, or `None` if the device has no such range.
    pub fn find_closest_sample_rate(
        device_info: &DeviceInfo,
        sample_format: SampleFormat,
        channels: u16,
        target: u32,
    ) -> Option<u32> {
        device_info
            .matching_ranges(sample_format, channels)
            .map(|range| range.closest_rate(target))
            .min_by_key(|&rate| rate.abs_diff(target))
    }

    fn negotiate_channels(
        device_info: &DeviceInfo,
        request: &ConfigurationRequest,
    ) -> NegotiationResult<u16> {
        match request.channels {
            None => Ok(device_info.default_channels),
            Some(requested) if device_info.supported_channels.contains(&requested) => Ok(requested),
            Some(requested) => Err(NegotiationError::ChannelsNotSupported {
                requested,
                available: device_info.supported_channels.clone(),
            }),
        }
    }

    /// Renderable formats offered for `channels`, the device default first.
    fn candidate_formats(device_info: &DeviceInfo, channels: u16) -> Vec<SampleFormat> {
        let mut formats = Vec::with_capacity(RENDERABLE_FORMATS.len());
        let preference = std::iter::once(device_info.default_sample_format).chain(RENDERABLE_FORMATS);
        for format in preference {
            if RENDERABLE_FORMATS.contains(&format)
                && !formats.contains(&format)
                && device_info.matching_ranges(format, channels).next().is_some()
            {
                formats.push(format);
            }
        }
        formats
    }

    pub fn calculate_latency_ms(sample_rate: u32, buffer_size: u32) -> f32 {
        (buffer_size as f32 / sample_rate as f32) * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_device::enumeration::ConfigRange;

    fn range(sample_format: SampleFormat, channels: u16, min: u32, max: u32) -> ConfigRange {
        ConfigRange {
            channels,
            sample_format,
            min_sample_rate: min,
            max_sample_rate: max,
        }
    }

    fn device(min: u32, max: u32, rates: Vec<u32>) -> DeviceInfo {
        let formats = vec![SampleFormat::F32, SampleFormat::I16];
        let config_ranges = formats
            .iter()
            .flat_map(|&format| [1, 2].map(|channels| range(format, channels, min, max)))
            .collect();
        DeviceInfo {
            name: "Test Output".into(),
            host_name: "Test".into(),
            supported_sample_rates: rates,
            min_sample_rate: min,
            max_sample_rate: max,
            default_sample_rate: 48_000,
            supported_channels: vec![1, 2],
            max_channels: 2,
            default_channels: 2,
            supported_sample_formats: formats,
            default_sample_format: SampleFormat::F32,
            config_ranges,
        }
    }

    #[test]
    fn requested_rate_is_kept_when_supported() {
        let info = device(8_000, 192_000, vec![44_100, 48_000, 96_000]);
        let negotiated =
            ConfigNegotiator::negotiate(&info, &ConfigurationRequest::new(96_000)).unwrap();
        assert_eq!(negotiated.sample_rate, 96_000);
        assert!(negotiated.sample_rate_matched);
        assert_eq!(negotiated.channels, 2);
        assert_eq!(negotiated.sample_format, SampleFormat::F32);
        assert_eq!(negotiated.stream_config.sample_rate, SampleRate(96_000));
    }

    #[test]
    fn closest_rate_when_unsupported() {
        let info = device(44_100, 48_000, vec![44_100, 48_000]);
        let negotiated =
            ConfigNegotiator::negotiate(&info, &ConfigurationRequest::new(96_000)).unwrap();
        assert_eq!(negotiated.sample_rate, 48_000);
        assert!(!negotiated.sample_rate_matched);
    }

    #[test]
    fn exact_rate_fails_when_unsupported() {
        let info = device(44_100, 48_000, vec![44_100, 48_000]);
        let request =
            ConfigurationRequest::new(96_000).with_sample_rate_priority(SampleRatePriority::Exact);
        let err = ConfigNegotiator::negotiate(&info, &request).unwrap_err();
        assert!(matches!(
            err,
            NegotiationError::SampleRateNotSupported { requested: 96_000, .. }
        ));
    }

    #[test]
    fn rate_only_offered_in_another_format_switches_format() {
        let mut info = device(44_100, 48_000, vec![44_100, 48_000, 96_000]);
        info.max_sample_rate = 96_000;
        info.config_ranges = vec![
            range(SampleFormat::F32, 2, 44_100, 48_000),
            range(SampleFormat::I16, 2, 44_100, 96_000),
        ];

        let negotiated =
            ConfigNegotiator::negotiate(&info, &ConfigurationRequest::new(96_000)).unwrap();
        assert_eq!(negotiated.sample_format, SampleFormat::I16);
        assert_eq!(negotiated.sample_rate, 96_000);
        assert!(negotiated.sample_rate_matched);
    }

    #[test]
    fn rate_only_offered_for_other_channels_is_not_matched() {
        let mut info = device(44_100, 48_000, vec![44_100, 48_000, 96_000]);
        info.max_sample_rate = 96_000;
        info.config_ranges = vec![
            range(SampleFormat::F32, 1, 44_100, 96_000),
            range(SampleFormat::F32, 2, 44_100, 48_000),
        ];

        let exact =
            ConfigurationRequest::new(96_000).with_sample_rate_priority(SampleRatePriority::Exact);
        assert!(ConfigNegotiator::negotiate(&info, &exact).is_err());

        let negotiated =
            ConfigNegotiator::negotiate(&info, &ConfigurationRequest::new(96_000)).unwrap();
        assert_eq!(negotiated.channels, 2);
        assert_eq!(negotiated.sample_rate, 48_000);
    }

    #[test]
    fn closest_rate_clamps_into_matching_ranges() {
        let info = device(22_000, 23_000, vec![]);
        let closest = |target| {
            ConfigNegotiator::find_closest_sample_rate(&info, SampleFormat::F32, 2, target)
        };
        assert_eq!(closest(96_000), Some(23_000));
        assert_eq!(closest(8_000), Some(22_000));
        assert_eq!(
            ConfigNegotiator::find_closest_sample_rate(&info, SampleFormat::U16, 2, 48_000),
            None
        );
    }

    #[test]
    fn channel_requests() {
        let info = device(8_000, 192_000, vec![48_000]);
        let mono = ConfigurationRequest::new(48_000).with_channels(Some(1));
        assert_eq!(ConfigNegotiator::negotiate(&info, &mono).unwrap().channels, 1);

        let surround = ConfigurationRequest::new(48_000).with_channels(Some(6));
        assert!(matches!(
            ConfigNegotiator::negotiate(&info, &surround),
            Err(NegotiationError::ChannelsNotSupported { requested: 6, .. })
        ));
    }

    #[test]
    fn format_falls_back_to_renderable() {
        let mut info = device(8_000, 192_000, vec![48_000]);
        info.default_sample_format = SampleFormat::I32;
        info.supported_sample_formats = vec![SampleFormat::I32, SampleFormat::I16];
        info.config_ranges = vec![
            range(SampleFormat::I32, 2, 8_000, 192_000),
            range(SampleFormat::I16, 2, 8_000, 192_000),
        ];
        let negotiated =
            ConfigNegotiator::negotiate(&info, &ConfigurationRequest::new(48_000)).unwrap();
        assert_eq!(negotiated.sample_format, SampleFormat::I16);

        info.supported_sample_formats = vec![SampleFormat::I32];
        info.config_ranges = vec![range(SampleFormat::I32, 2, 8_000, 192_000)];
        assert!(matches!(
            ConfigNegotiator::negotiate(&info, &ConfigurationRequest::new(48_000)),
            Err(NegotiationError::FormatNotSupported { .. })
        ));
    }

    #[test]
    fn request_from_config() {
        let config = ToneConfig {
            exact_sample_rate: true,
            buffer_size: Some(256),
            ..Default::default()
        };
        let request = ConfigurationRequest::from(&config);
        assert_eq!(request.sample_rate, 96_000);
        assert_eq!(request.sample_rate_priority, SampleRatePriority::Exact);

        let info = device(8_000, 192_000, vec![96_000]);
        let negotiated = ConfigNegotiator::negotiate(&info, &request).unwrap();
        assert_eq!(negotiated.buffer_size, BufferSize::Fixed(256));
        assert_eq!(negotiated.nominal_frames(), 256);
    }

    #[test]
    fn latency() {
        assert!((ConfigNegotiator::calculate_latency_ms(96_000, 480) - 5.0).abs() < 1e-4);
    }
}
