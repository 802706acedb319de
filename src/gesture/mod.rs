//! Gesture recognition over decoded hook samples

pub mod recognizer;
pub mod types;

pub use recognizer::GestureRecognizer;
pub use types::{GestureEvent, GestureSample, GestureState, SampleKind};
