//! cpal output stream feeding a `CallbackSlot`.

use std::fmt;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use log::debug;

use crate::audio_device::negotiation::NegotiatedConfig;
use crate::rt_processing::callback::CallbackSlot;

/// Frames rendered per pass when the driver hands over a larger buffer.
pub const SCRATCH_FRAMES: usize = 4096;

#[derive(Debug)]
pub enum StreamError {
    UnsupportedFormat(SampleFormat),
    Build(cpal::BuildStreamError),
    Play(cpal::PlayStreamError),
    Pause(cpal::PauseStreamError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => write!(f, "Sample format {:?} is not supported", format),
            Self::Build(e) => write!(f, "Failed to build output stream: {}", e),
            Self::Play(e) => write!(f, "Failed to start output stream: {}", e),
            Self::Pause(e) => write!(f, "Failed to pause output stream: {}", e),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnsupportedFormat(_) => None,
            Self::Build(e) => Some(e),
            Self::Play(e) => Some(e),
            Self::Pause(e) => Some(e),
        }
    }
}

pub type StreamResult<T> = Result<T, StreamError>;

/// A built output stream. Dropping it closes the device stream.
pub struct OutputStream {
    stream: cpal::Stream,
}

impl OutputStream {
    /// Build a stream for the negotiated config. The stream starts paused
    /// on hosts that honour it; call `play`.
    ///
    /// `on_error` runs on the driver's thread when the stream fails.
    pub fn build<E>(
        device: &cpal::Device,
        negotiated: &NegotiatedConfig,
        slot: Arc<CallbackSlot>,
        on_error: E,
    ) -> StreamResult<Self>
    where
        E: FnMut(cpal::StreamError) + Send + 'static,
    {
        let config = &negotiated.stream_config;
        let stream = match negotiated.sample_format {
            SampleFormat::F32 => build_typed::<f32, E>(device, config, slot, on_error),
            SampleFormat::I16 => build_typed::<i16, E>(device, config, slot, on_error),
            SampleFormat::U16 => build_typed::<u16, E>(device, config, slot, on_error),
            other => return Err(StreamError::UnsupportedFormat(other)),
        }
        .map_err(StreamError::Build)?;

        debug!("output stream built: {}", negotiated);
        Ok(Self { stream })
    }

    pub fn play(&self) -> StreamResult<()> {
        self.stream.play().map_err(StreamError::Play)
    }

    pub fn pause(&self) -> StreamResult<()> {
        self.stream.pause().map_err(StreamError::Pause)
    }
}

fn build_typed<T, E>(
    device: &cpal::Device,
    config: &StreamConfig,
    slot: Arc<CallbackSlot>,
    on_error: E,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
    E: FnMut(cpal::StreamError) + Send + 'static,
{
    // Allocated once here; the audio callback only slices it.
    let mut scratch = vec![0.0f32; SCRATCH_FRAMES * config.channels as usize];

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            render_into(&slot, &mut scratch, data);
        },
        on_error,
        None,
    )
}

/// Render into a device buffer of any sample type via the f32 scratch buffer.
///
/// `scratch.len()` must be a multiple of the channel count so every chunk
/// holds whole frames.
pub fn render_into<T>(slot: &CallbackSlot, scratch: &mut [f32], data: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for chunk in data.chunks_mut(scratch.len()) {
        let rendered = &mut scratch[..chunk.len()];
        slot.process_realtime(rendered);
        for (out, &sample) in chunk.iter_mut().zip(rendered.iter()) {
            *out = T::from_sample(sample);
        }
    }
}
