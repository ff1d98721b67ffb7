use std::f32::consts::{PI, TAU};

use tonegen_core::Waveform;

/// Sine of the phase (radians).
#[inline]
pub fn sine(phase: f32) -> f32 {
    phase.sin()
}

/// Square derived from the sign of the sine: +1 on the first half period.
#[inline]
pub fn square(phase: f32) -> f32 {
    if phase.sin() >= 0.0 { 1.0 } else { -1.0 }
}

/// Naive (non band-limited) sawtooth, `(2/π)(phase - π)`: a linear ramp
/// from -2 at phase 0 to +2 at 2π, before volume scaling.
#[inline]
pub fn sawtooth(phase: f32) -> f32 {
    (2.0 / PI) * (phase - PI)
}

/// Radians advanced per sample.
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f32) -> f32 {
    TAU * frequency / sample_rate
}

/// Bring an advanced phase back into `[0, 2π)`.
///
/// The single subtraction covers every increment below 2π. Larger
/// increments fall through to the Euclidean remainder.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if phase < TAU {
        return phase;
    }
    let wrapped = phase - TAU;
    if wrapped < TAU {
        wrapped
    } else {
        wrapped.rem_euclid(TAU)
    }
}

/// Per-waveform sample evaluation.
pub trait Shape {
    fn sample(self, phase: f32) -> f32;
}

impl Shape for Waveform {
    #[inline]
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => sine(phase),
            Waveform::Square => square(phase),
            Waveform::Sawtooth => sawtooth(phase),
        }
    }
}
