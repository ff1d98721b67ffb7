use std::sync::Arc;

use tonegen_core::{ControlSnapshot, ControlState};

use super::shapes::{Shape, phase_increment, wrap_phase};
use crate::rt_processing::source::AudioSource;

/// Phase-accumulating tone oscillator driven by shared controls.
///
/// The phase is owned here and never shared. Controls are read once per
/// buffer, so a parameter change lands on the first frame of the next buffer.
pub struct ToneOscillator {
    controls: Arc<ControlState>,
    phase: f32,
}

impl ToneOscillator {
    pub fn new(controls: Arc<ControlState>) -> Self {
        Self { controls, phase: 0.0 }
    }

    /// Current phase in radians, always in `[0, 2π)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Render `frame_count` frames from an explicit snapshot.
    ///
    /// Every channel of a frame gets the same value. Performs no allocation
    /// and no synchronisation.
    pub fn render(
        &mut self,
        snapshot: ControlSnapshot,
        output: &mut [f32],
        sample_rate: f32,
        channels: usize,
        frame_count: usize,
    ) {
        let phase_inc = phase_increment(snapshot.frequency, sample_rate);
        let waveform = snapshot.waveform;
        let volume = snapshot.volume;
        let mut phase = self.phase;

        for frame in output.chunks_exact_mut(channels).take(frame_count) {
            let sample = waveform.sample(phase) * volume;
            frame.fill(sample);
            phase = wrap_phase(phase + phase_inc);
        }

        self.phase = phase;
    }
}

impl AudioSource for ToneOscillator {
    fn fill_buffer(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frame_count: usize) {
        if !self.controls.is_running() {
            output.fill(0.0);
            return;
        }
        let snapshot = self.controls.snapshot();
        self.render(snapshot, output, sample_rate, channels, frame_count);
    }
}
