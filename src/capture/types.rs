use serde::{Deserialize, Serialize};

/// A point in virtual-screen coordinates. Negative values are valid on
/// multi-monitor setups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventKind {
    SecondaryDown,
    SecondaryUp,
    Move,
    Other,
}

/// One event as seen by the global hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMouseEvent {
    pub kind: MouseEventKind,
    pub point: ScreenPoint,
    /// System tick in milliseconds
    pub tick_ms: u64,
    /// The event's auxiliary data word
    pub extra_info: usize,
}
