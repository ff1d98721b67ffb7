//! Shared control parameters.
//!
//! `ControlState` is written by the control surface and read by the render
//! path. Every field is its own lock-free atomic cell, so a reader may see a
//! new frequency together with an old volume for one buffer. That is accepted:
//! the render path must never wait on the writer.

use std::fmt;

use crossbeam::atomic::AtomicCell;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FREQUENCY: f32 = 440.0;
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Lowest frequency reachable from any control path (Hz).
pub const MIN_FREQUENCY: f32 = 20.0;
/// Highest frequency reachable from any control path (Hz).
pub const MAX_FREQUENCY: f32 = 20_000.0;

pub const FREQUENCY_STEP: f32 = 10.0;
pub const VOLUME_STEP: f32 = 0.1;

/// Oscillator waveform.
///
/// `repr(u8)` keeps `AtomicCell<Waveform>` lock-free.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
}

impl Waveform {
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Sawtooth => "Sawtooth",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clamp a frequency into the playable range.
#[inline]
pub fn clamp_frequency(frequency: f32) -> f32 {
    frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
}

/// Clamp a volume into `[0.0, 1.0]`.
#[inline]
pub fn clamp_volume(volume: f32) -> f32 {
    volume.clamp(0.0, 1.0)
}

/// A consistent-enough copy of the controls, taken once per render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    pub frequency: f32,
    pub volume: f32,
    pub waveform: Waveform,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            volume: DEFAULT_VOLUME,
            waveform: Waveform::Sine,
        }
    }
}

impl fmt::Display for ControlSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frequency: {:.2} Hz | Volume: {:.2} | Waveform: {}",
            self.frequency, self.volume, self.waveform
        )
    }
}

/// Parameters shared between the control surface and the render path.
pub struct ControlState {
    frequency: AtomicCell<f32>,
    volume: AtomicCell<f32>,
    waveform: AtomicCell<Waveform>,
    running: AtomicCell<bool>,
}

impl ControlState {
    /// Create a state from initial values. Values are clamped.
    pub fn new(frequency: f32, volume: f32, waveform: Waveform) -> Self {
        Self {
            frequency: AtomicCell::new(clamp_frequency(frequency)),
            volume: AtomicCell::new(clamp_volume(volume)),
            waveform: AtomicCell::new(waveform),
            running: AtomicCell::new(true),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency.load()
    }

    pub fn volume(&self) -> f32 {
        self.volume.load()
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform.load()
    }

    pub fn set_frequency(&self, frequency: f32) {
        self.frequency.store(clamp_frequency(frequency));
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.store(clamp_volume(volume));
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform);
    }

    /// Shift the frequency by `delta` Hz, staying inside the playable range.
    pub fn nudge_frequency(&self, delta: f32) {
        self.set_frequency(self.frequency() + delta);
    }

    /// Shift the volume by `delta`, staying inside `[0.0, 1.0]`.
    pub fn nudge_volume(&self, delta: f32) {
        self.set_volume(self.volume() + delta);
    }

    /// Read every field once. Fields are loaded independently.
    #[inline]
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            frequency: self.frequency.load(),
            volume: self.volume.load(),
            waveform: self.waveform.load(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load()
    }

    /// Request shutdown. The render path goes silent from its next call on.
    pub fn stop(&self) {
        self.running.store(false);
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY, DEFAULT_VOLUME, Waveform::Sine)
    }
}

impl fmt::Debug for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlState")
            .field("snapshot", &self.snapshot())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = ControlState::default();
        assert_eq!(state.frequency(), 440.0);
        assert_eq!(state.volume(), 0.5);
        assert_eq!(state.waveform(), Waveform::Sine);
        assert!(state.is_running());
    }

    #[test]
    fn cells_are_lock_free() {
        assert!(AtomicCell::<f32>::is_lock_free());
        assert!(AtomicCell::<Waveform>::is_lock_free());
        assert!(AtomicCell::<bool>::is_lock_free());
    }

    #[test]
    fn volume_never_leaves_unit_range() {
        let state = ControlState::default();
        for _ in 0..20 {
            state.nudge_volume(VOLUME_STEP);
            assert!(state.volume() <= 1.0);
        }
        assert_eq!(state.volume(), 1.0);

        for _ in 0..20 {
            state.nudge_volume(-VOLUME_STEP);
            assert!(state.volume() >= 0.0);
        }
        assert_eq!(state.volume(), 0.0);
    }

    #[test]
    fn frequency_is_clamped() {
        let state = ControlState::new(30.0, 0.5, Waveform::Sine);
        state.nudge_frequency(-FREQUENCY_STEP);
        assert_eq!(state.frequency(), 20.0);
        state.nudge_frequency(-FREQUENCY_STEP);
        assert_eq!(state.frequency(), MIN_FREQUENCY);

        state.set_frequency(1.0e6);
        assert_eq!(state.frequency(), MAX_FREQUENCY);

        let clamped_at_birth = ControlState::new(-5.0, 3.0, Waveform::Square);
        assert_eq!(clamped_at_birth.frequency(), MIN_FREQUENCY);
        assert_eq!(clamped_at_birth.volume(), 1.0);
    }

    #[test]
    fn stop_clears_running() {
        let state = ControlState::default();
        state.stop();
        assert!(!state.is_running());
    }

    #[test]
    fn snapshot_display_matches_status_format() {
        let snapshot = ControlSnapshot {
            frequency: 450.0,
            volume: 0.4,
            waveform: Waveform::Square,
        };
        assert_eq!(
            snapshot.to_string(),
            "Frequency: 450.00 Hz | Volume: 0.40 | Waveform: Square"
        );
    }

    #[test]
    fn waveform_serde_names() {
        let parsed: Waveform = serde_json::from_str("\"sawtooth\"").unwrap();
        assert_eq!(parsed, Waveform::Sawtooth);
        assert_eq!(serde_json::to_string(&Waveform::Sine).unwrap(), "\"sine\"");
    }
}
