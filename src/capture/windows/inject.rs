use crate::capture::injector::{
    in_place_secondary_click, InputInjector, SyntheticAction, SyntheticMouseEvent,
};
use crate::error::{WaterflowError, WaterflowResult};
use std::mem;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT,
};

/// Replays clicks through `SendInput`
#[derive(Debug, Default)]
pub struct SendInputInjector;

impl InputInjector for SendInputInjector {
    fn inject_in_place_secondary_click(&self) -> WaterflowResult<()> {
        let inputs = in_place_secondary_click().map(to_input);
        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };

        if sent as usize != inputs.len() {
            return Err(WaterflowError::PlatformError(format!(
                "SendInput injected {} of {} events: {}",
                sent,
                inputs.len(),
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }
}

fn to_input(event: SyntheticMouseEvent) -> INPUT {
    let flags = match event.action {
        SyntheticAction::SecondaryDown => MOUSEEVENTF_RIGHTDOWN,
        SyntheticAction::SecondaryUp => MOUSEEVENTF_RIGHTUP,
    };

    // No MOUSEEVENTF_MOVE/ABSOLUTE: the click lands wherever the cursor is.
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: event.extra_info,
            },
        },
    }
}
