//! Upward-drag recognition
//!
//! Runs on the hook callback thread: no I/O, no locks, no allocation per
//! sample. A session starts on `Show`; the first `Move` that satisfies the
//! trigger predicate fires `UpwardDrag` and latches the session so the dense
//! stream of follow-up moves cannot fire it again. `Commit` or `Cancel` ends
//! the session.

use crate::capture::types::ScreenPoint;
use crate::config::GestureSettings;
use crate::gesture::types::{GestureEvent, GestureSample, GestureState, SampleKind};

#[derive(Debug, Clone, Copy)]
struct GestureSession {
    origin: ScreenPoint,
    fired: bool,
}

#[derive(Debug)]
pub struct GestureRecognizer {
    settings: GestureSettings,
    session: Option<GestureSession>,
}

impl GestureRecognizer {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn state(&self) -> GestureState {
        match self.session {
            None => GestureState::Idle,
            Some(GestureSession { fired: false, .. }) => GestureState::Armed,
            Some(GestureSession { fired: true, .. }) => GestureState::Fired,
        }
    }

    /// Feed one sample, reporting any resulting events through `emit`
    pub fn handle<F>(&mut self, sample: &GestureSample, mut emit: F)
    where
        F: FnMut(GestureEvent),
    {
        match sample.kind {
            SampleKind::Show(origin) => {
                // A second show restarts the session at the new origin.
                self.session = Some(GestureSession {
                    origin,
                    fired: false,
                });
                emit(GestureEvent::Started { origin });
            }
            SampleKind::Move(point) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                emit(GestureEvent::Moved { point });

                if !session.fired && self.settings.is_upward_drag(session.origin, point) {
                    session.fired = true;
                    emit(GestureEvent::UpwardDrag { point });
                }
            }
            SampleKind::Commit => {
                if self.session.take().is_some() {
                    emit(GestureEvent::Committed);
                }
            }
            SampleKind::Cancel => {
                if self.session.take().is_some() {
                    emit(GestureEvent::Cancelled);
                }
            }
        }
    }

    /// Drop any session without reporting it
    pub fn reset(&mut self) {
        self.session = None;
    }
}

impl GestureSettings {
    /// Far enough up, and mostly vertical
    pub fn is_upward_drag(&self, origin: ScreenPoint, point: ScreenPoint) -> bool {
        let dx = i64::from(point.x) - i64::from(origin.x);
        let dy = i64::from(point.y) - i64::from(origin.y);

        dy <= -i64::from(self.upward_threshold_px)
            && dy.abs() >= i64::from(self.vertical_ratio) * dx.abs()
    }
}
