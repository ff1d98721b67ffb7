pub mod callback;
pub mod performance;
pub mod source;
pub mod waveform;
