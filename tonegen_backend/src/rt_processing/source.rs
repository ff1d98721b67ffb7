/// Trait for generators that produce interleaved audio samples.
pub trait AudioSource: Send {
    /// Fill the output buffer with audio samples (interleaved if multi-channel).
    ///
    /// `output.len()` must be at least `frame_count * channels`.
    fn fill_buffer(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frame_count: usize);
}
