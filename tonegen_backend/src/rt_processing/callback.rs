//! Realtime audio callback slot.
//!
//! The audio thread only ever `try_lock`s the processor and never allocates.
//! If the processor is unavailable it writes silence instead of waiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use crate::rt_processing::performance::PerformanceMonitor;
use crate::rt_processing::source::AudioSource;

/// Trait every realtime processor must implement.
///
/// NOTE: `process` runs on the audio thread and must not block or allocate.
pub trait AudioCallback: Send + 'static {
    /// Fill the interleaved `output` buffer (length == frames * channels) with audio.
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize);
}

/// Adapts any `AudioSource` to the callback interface.
pub struct SourceProcessor<T: AudioSource> {
    source: T,
}

impl<T: AudioSource> SourceProcessor<T> {
    pub fn new(source: T) -> Self {
        Self { source }
    }
}

impl<T: AudioSource + 'static> AudioCallback for SourceProcessor<T> {
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize) {
        self.source.fill_buffer(output, sample_rate, channels, frames);
    }
}

/// Holds the active processor and provides a realtime-safe `process` entrypoint.
///
/// In the audio thread we attempt a non-blocking `try_lock`. If the lock is
/// held elsewhere we zero the output buffer rather than wait.
pub struct CallbackSlot {
    processor: Mutex<Box<dyn AudioCallback>>,

    /// Frames processed so far. Read from other threads.
    sample_clock: AtomicU64,

    monitor: Arc<PerformanceMonitor>,

    sample_rate: f32,
    channels: usize,
}

impl CallbackSlot {
    pub fn new(
        initial_processor: Box<dyn AudioCallback>,
        sample_rate: f32,
        channels: usize,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            processor: Mutex::new(initial_processor),
            sample_clock: AtomicU64::new(0),
            monitor,
            sample_rate,
            channels,
        }
    }

    /// Realtime-safe process entry called from the audio I/O callback.
    ///
    /// `output` is interleaved, `frames * channels` long. Returns `true` if the
    /// processor ran and `false` if the slot fell back to silence.
    pub fn process_realtime(&self, output: &mut [f32]) -> bool {
        let frames = match output.len() / self.channels {
            0 => return false,
            n => n,
        };

        let _timing = self.monitor.scoped_callback();
        self.sample_clock.fetch_add(frames as u64, Ordering::Relaxed);
        self.monitor.add_frames_processed(frames as u64);

        if let Some(mut guard) = self.processor.try_lock() {
            guard.process(output, self.sample_rate, self.channels, frames);
            true
        } else {
            output.fill(0.0);
            self.monitor.increment_silence_fallbacks();
            false
        }
    }

    /// Playback time in seconds (frames / sample_rate).
    pub fn playback_time(&self) -> f32 {
        let frames = self.sample_clock.load(Ordering::Relaxed);
        (frames as f32) / self.sample_rate
    }

    pub fn frame_count(&self) -> u64 {
        self.sample_clock.load(Ordering::Relaxed)
    }
}
