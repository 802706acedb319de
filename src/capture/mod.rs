//! Global pointer capture
//!
//! This module provides the hook filter, the wire protocol between the hook
//! and the host, click replay, and the bridge that feeds recognized gestures
//! to the rest of the application.

pub mod bridge;
pub mod injector;
pub mod monitor;
pub mod protocol;
pub mod types;

#[cfg(target_os = "windows")]
pub mod windows;

pub use bridge::{InputMonitor, MessageBridge, SignalSink, UnsupportedMonitor};
pub use injector::{InputInjector, UnsupportedInjector};
pub use monitor::{Disposition, HookAction, HookFilter};
pub use protocol::{RawSignal, Signal, SENTINEL};
pub use types::{MouseEventKind, RawMouseEvent, ScreenPoint};

use crate::config::MonitorSettings;
use std::sync::Arc;

/// Injector for the current platform
pub fn platform_injector() -> Arc<dyn InputInjector> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::SendInputInjector)
    }

    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(UnsupportedInjector)
    }
}

/// Monitor for the current platform. Elsewhere than Windows the returned
/// monitor refuses to install and the application runs without gestures.
pub fn platform_monitor(settings: MonitorSettings) -> Box<dyn InputMonitor> {
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::WindowsMouseMonitor::new(settings, platform_injector()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = settings;
        Box::new(UnsupportedMonitor)
    }
}
