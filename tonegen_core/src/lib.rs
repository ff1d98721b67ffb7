pub mod config;
pub mod control;
pub mod error;
pub mod event;

pub use config::{DEFAULT_SAMPLE_RATE, ToneConfig};
pub use control::{ControlSnapshot, ControlState, Waveform};
pub use error::{CoreError, CoreResult};
pub use event::{CONTROLS_HELP, ControlEvent, Outcome};
