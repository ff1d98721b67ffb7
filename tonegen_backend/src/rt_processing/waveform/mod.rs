pub mod oscillators;
pub mod shapes;

pub use oscillators::ToneOscillator;
pub use shapes::Shape;
