//! Message bridge between the global hook and the recognizer
//!
//! The bridge owns an [`InputMonitor`], installs it with a sink that decodes
//! each notification and feeds the recognizer, and forwards recognized
//! events over an unbounded channel. Everything in the sink runs on the
//! monitor's callback thread and never blocks.

use crate::capture::protocol::{unpack_point, RawSignal, Signal};
use crate::config::GestureSettings;
use crate::gesture::{GestureEvent, GestureRecognizer, GestureSample, SampleKind};
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::mpsc;

/// Callback the monitor invokes for every posted notification
pub type SignalSink = Box<dyn FnMut(RawSignal) + Send + 'static>;

/// Global pointer capture
///
/// Implementations deliver notifications to the sink from their own callback
/// thread. Only one install may be live at a time.
pub trait InputMonitor: Send {
    /// Start delivering notifications to `sink`. Returns false on failure.
    fn install(&mut self, sink: SignalSink) -> bool;

    /// Stop delivering notifications. Safe to call when not installed.
    fn uninstall(&mut self);
}

/// Monitor for platforms without a global hook; never installs
#[derive(Debug, Default)]
pub struct UnsupportedMonitor;

impl InputMonitor for UnsupportedMonitor {
    fn install(&mut self, _sink: SignalSink) -> bool {
        tracing::warn!("Global pointer capture not implemented on this platform");
        false
    }

    fn uninstall(&mut self) {}
}

pub struct MessageBridge {
    monitor: Box<dyn InputMonitor>,
    settings: GestureSettings,
    running: bool,
}

impl MessageBridge {
    pub fn new(monitor: Box<dyn InputMonitor>, settings: GestureSettings) -> Self {
        Self {
            monitor,
            settings,
            running: false,
        }
    }

    /// Install the monitor and route recognized gestures to `target`.
    ///
    /// Returns false if the monitor could not be installed; the bridge then
    /// stays inert. Starting an already running bridge also returns false.
    pub fn start(&mut self, target: mpsc::UnboundedSender<GestureEvent>) -> bool {
        if self.running {
            tracing::warn!("Message bridge already running");
            return false;
        }

        let mut recognizer = GestureRecognizer::new(self.settings.clone());
        let sink: SignalSink = Box::new(move |raw: RawSignal| {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                if let Some(sample) = Self::decode(raw.signal, raw.coords) {
                    recognizer.handle(&sample, |event| {
                        // Receiver gone means nobody is listening; keep going.
                        let _ = target.send(event);
                    });
                }
            }));

            if delivered.is_err() {
                tracing::error!(
                    "Gesture handling panicked on signal {} ({:#010x}); session reset",
                    raw.signal,
                    raw.coords
                );
                recognizer.reset();
            }
        });

        self.running = self.monitor.install(sink);
        if self.running {
            tracing::info!("Message bridge started");
        }
        self.running
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.monitor.uninstall();
        self.running = false;
        tracing::info!("Message bridge stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Decode one notification. `None` for the no-op signal and for unknown
    /// signal words.
    pub fn decode(signal: u32, coords: u32) -> Option<GestureSample> {
        let kind = match Signal::from_word(signal)? {
            Signal::None => return None,
            Signal::Show => SampleKind::Show(unpack_point(coords)),
            Signal::Move => SampleKind::Move(unpack_point(coords)),
            Signal::Commit => SampleKind::Commit,
            Signal::Cancel => SampleKind::Cancel,
        };
        Some(GestureSample::new(kind))
    }
}

impl Drop for MessageBridge {
    fn drop(&mut self) {
        self.stop();
    }
}
