//! Real-time rendering and audio device plumbing for tonegen.

pub mod audio_device;
pub mod rt_processing;

pub use audio_device::enumeration::{ConfigRange, DeviceInfo, DeviceReport, EnumError, default_output_device};
pub use audio_device::negotiation::{ConfigNegotiator, ConfigurationRequest, NegotiatedConfig, NegotiationError};
pub use audio_device::stream::{OutputStream, StreamError};
pub use rt_processing::callback::{AudioCallback, CallbackSlot, SourceProcessor};
pub use rt_processing::performance::{PerformanceMonitor, PerformanceSnapshot};
pub use rt_processing::source::AudioSource;
pub use rt_processing::waveform::ToneOscillator;
