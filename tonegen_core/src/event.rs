use crate::control::{ControlState, FREQUENCY_STEP, VOLUME_STEP, Waveform};

/// A recognised control-surface input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    IncreaseFrequency,
    DecreaseFrequency,
    IncreaseVolume,
    DecreaseVolume,
    Select(Waveform),
    Quit,
}

/// What the control loop should do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

impl ControlEvent {
    /// Map a key press to an event. Unknown keys yield `None`.
    pub fn from_key(key: char) -> Option<Self> {
        let event = match key {
            'w' => Self::IncreaseFrequency,
            's' => Self::DecreaseFrequency,
            '+' => Self::IncreaseVolume,
            '-' => Self::DecreaseVolume,
            '1' => Self::Select(Waveform::Sine),
            '2' => Self::Select(Waveform::Square),
            '3' => Self::Select(Waveform::Sawtooth),
            'q' => Self::Quit,
            _ => return None,
        };
        Some(event)
    }

    /// Apply the event to `state`. Each arm touches exactly one field.
    ///
    /// `Quit` also clears the running flag so the render path falls silent
    /// before the driver gets round to stopping the stream.
    pub fn apply(self, state: &ControlState) -> Outcome {
        match self {
            Self::IncreaseFrequency => state.nudge_frequency(FREQUENCY_STEP),
            Self::DecreaseFrequency => state.nudge_frequency(-FREQUENCY_STEP),
            Self::IncreaseVolume => state.nudge_volume(VOLUME_STEP),
            Self::DecreaseVolume => state.nudge_volume(-VOLUME_STEP),
            Self::Select(waveform) => state.set_waveform(waveform),
            Self::Quit => {
                state.stop();
                return Outcome::Quit;
            }
        }
        Outcome::Continue
    }
}

/// Help block shown before the control loop starts.
pub const CONTROLS_HELP: &str = "\
Controls:
  w: Increase Frequency  |  s: Decrease Frequency
  +: Increase Volume  |  -: Decrease Volume
  1: Sine Wave  |  2: Square Wave  |  3: Sawtooth Wave
  q: Quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping() {
        assert_eq!(ControlEvent::from_key('w'), Some(ControlEvent::IncreaseFrequency));
        assert_eq!(ControlEvent::from_key('s'), Some(ControlEvent::DecreaseFrequency));
        assert_eq!(ControlEvent::from_key('+'), Some(ControlEvent::IncreaseVolume));
        assert_eq!(ControlEvent::from_key('-'), Some(ControlEvent::DecreaseVolume));
        assert_eq!(ControlEvent::from_key('2'), Some(ControlEvent::Select(Waveform::Square)));
        assert_eq!(ControlEvent::from_key('q'), Some(ControlEvent::Quit));
        assert_eq!(ControlEvent::from_key('x'), None);
        assert_eq!(ControlEvent::from_key('W'), None);
    }

    #[test]
    fn apply_updates_single_fields() {
        let state = ControlState::default();

        assert_eq!(ControlEvent::IncreaseFrequency.apply(&state), Outcome::Continue);
        assert_eq!(state.frequency(), 450.0);
        assert_eq!(state.volume(), 0.5);

        ControlEvent::DecreaseVolume.apply(&state);
        assert!((state.volume() - 0.4).abs() < 1e-6);
        assert_eq!(state.frequency(), 450.0);

        ControlEvent::Select(Waveform::Sawtooth).apply(&state);
        assert_eq!(state.waveform(), Waveform::Sawtooth);
    }

    #[test]
    fn quit_stops_state() {
        let state = ControlState::default();
        assert_eq!(ControlEvent::Quit.apply(&state), Outcome::Quit);
        assert!(!state.is_running());
    }
}
