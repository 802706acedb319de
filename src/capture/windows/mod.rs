//! Windows capture implementations
//!
//! Uses a low-level mouse hook for capture and SendInput for click replay.

pub mod inject;
pub mod input;

pub use inject::SendInputInjector;
pub use input::WindowsMouseMonitor;
