//! Synthetic input
//!
//! The hook swallows every secondary press. When a press turns out not to be
//! a gesture, the host replays it as a press+release at the current cursor
//! position. Both events carry [`SENTINEL`] so the hook lets them through.

use crate::capture::protocol::SENTINEL;
use crate::error::{WaterflowError, WaterflowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticAction {
    SecondaryDown,
    SecondaryUp,
}

/// One injected pointer event. Carries no coordinates: injection happens
/// wherever the cursor already is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticMouseEvent {
    pub action: SyntheticAction,
    pub extra_info: usize,
}

/// The press/release pair for an in-place secondary click, sentinel-tagged
pub fn in_place_secondary_click() -> [SyntheticMouseEvent; 2] {
    [
        SyntheticMouseEvent {
            action: SyntheticAction::SecondaryDown,
            extra_info: SENTINEL as usize,
        },
        SyntheticMouseEvent {
            action: SyntheticAction::SecondaryUp,
            extra_info: SENTINEL as usize,
        },
    ]
}

pub trait InputInjector: Send + Sync {
    /// Press and release the secondary button at the current cursor position
    fn inject_in_place_secondary_click(&self) -> WaterflowResult<()>;
}

/// Used where no injection backend exists
#[derive(Debug, Default)]
pub struct UnsupportedInjector;

impl InputInjector for UnsupportedInjector {
    fn inject_in_place_secondary_click(&self) -> WaterflowResult<()> {
        Err(WaterflowError::PlatformError(
            "Input injection not implemented on this platform".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::protocol::is_synthetic;

    #[test]
    fn test_click_is_press_then_release() {
        let [press, release] = in_place_secondary_click();
        assert_eq!(press.action, SyntheticAction::SecondaryDown);
        assert_eq!(release.action, SyntheticAction::SecondaryUp);
    }

    #[test]
    fn test_both_events_are_tagged() {
        assert!(in_place_secondary_click()
            .iter()
            .all(|event| is_synthetic(event.extra_info)));
    }

    #[test]
    fn test_unsupported_injector_reports_platform_error() {
        let err = UnsupportedInjector.inject_in_place_secondary_click().unwrap_err();
        assert!(matches!(err, WaterflowError::PlatformError(_)));
    }
}
