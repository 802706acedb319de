use crate::capture::types::ScreenPoint;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Show(ScreenPoint),
    Move(ScreenPoint),
    Commit,
    Cancel,
}

/// A decoded notification, stamped on arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureSample {
    pub kind: SampleKind,
    pub received_at: Instant,
}

impl GestureSample {
    pub fn new(kind: SampleKind) -> Self {
        Self {
            kind,
            received_at: Instant::now(),
        }
    }
}

/// What the recognizer reports to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GestureEvent {
    Started { origin: ScreenPoint },
    Moved { point: ScreenPoint },
    /// Fires at most once per gesture
    UpwardDrag { point: ScreenPoint },
    Committed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    /// Session active, trigger not yet fired
    Armed,
    /// Trigger fired; suppressed until the session ends
    Fired,
}
