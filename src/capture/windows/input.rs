use crate::capture::bridge::{InputMonitor, SignalSink};
use crate::capture::injector::InputInjector;
use crate::capture::monitor::{Disposition, HookFilter};
use crate::capture::types::{MouseEventKind, RawMouseEvent, ScreenPoint};
use crate::config::MonitorSettings;
use crate::error::{WaterflowError, WaterflowResult};
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicIsize, Ordering::SeqCst};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, MSG, MSLLHOOKSTRUCT,
    PM_NOREMOVE, WH_MOUSE_LL, WM_APP, WM_MOUSEMOVE, WM_QUIT, WM_RBUTTONDOWN, WM_RBUTTONUP,
};

/// Posted to the hook thread when a swallowed press must be replayed
const WM_REPLAY_CLICK: u32 = WM_APP + 1;

static HOOK_HANDLE: AtomicIsize = AtomicIsize::new(0);
static HOOK_CONTEXT: ParkingMutex<Option<HookContext>> = parking_lot::const_mutex(None);

struct HookContext {
    filter: HookFilter,
    sink: SignalSink,
    thread_id: u32,
}

/// Global secondary-button capture via `WH_MOUSE_LL`
///
/// The hook and its message loop live on a dedicated thread. Click replay is
/// posted back to that thread so injection never happens inside the hook
/// callback. Only one instance can be installed per process.
pub struct WindowsMouseMonitor {
    settings: MonitorSettings,
    injector: Arc<dyn InputInjector>,
    worker: Option<(u32, JoinHandle<()>)>,
}

impl WindowsMouseMonitor {
    pub fn new(settings: MonitorSettings, injector: Arc<dyn InputInjector>) -> Self {
        Self {
            settings,
            injector,
            worker: None,
        }
    }
}

impl InputMonitor for WindowsMouseMonitor {
    fn install(&mut self, sink: SignalSink) -> bool {
        if self.worker.is_some() || HOOK_HANDLE.load(SeqCst) != 0 {
            tracing::warn!("Mouse hook already installed");
            return false;
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let filter = HookFilter::new(self.settings.clone());
        let injector = self.injector.clone();

        let spawned = std::thread::Builder::new()
            .name("waterflow-mouse-hook".to_string())
            .spawn(move || hook_thread(filter, sink, injector, ready_tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Failed to spawn mouse hook thread: {}", e);
                return false;
            }
        };

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.worker = Some((thread_id, handle));
                true
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to install mouse hook: {}", e);
                let _ = handle.join();
                false
            }
            Err(_) => {
                tracing::error!("Mouse hook thread exited before reporting readiness");
                let _ = handle.join();
                false
            }
        }
    }

    fn uninstall(&mut self) {
        let Some((thread_id, handle)) = self.worker.take() else {
            return;
        };

        if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            tracing::warn!("Failed to signal mouse hook thread: {}", e);
        }
        if handle.join().is_err() {
            tracing::error!("Mouse hook thread panicked");
        }
    }
}

impl Drop for WindowsMouseMonitor {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn hook_thread(
    filter: HookFilter,
    sink: SignalSink,
    injector: Arc<dyn InputInjector>,
    ready: mpsc::Sender<WaterflowResult<u32>>,
) {
    let thread_id = unsafe { GetCurrentThreadId() };
    let mut msg = MSG::default();

    // Forces creation of the thread's message queue before anyone posts to it.
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }

    *HOOK_CONTEXT.lock() = Some(HookContext {
        filter,
        sink,
        thread_id,
    });

    let hook = match unsafe { install_hook() } {
        Ok(hook) => hook,
        Err(e) => {
            *HOOK_CONTEXT.lock() = None;
            let _ = ready.send(Err(e));
            return;
        }
    };
    HOOK_HANDLE.store(hook.0 as isize, SeqCst);
    let _ = ready.send(Ok(thread_id));
    tracing::info!("Low-level mouse hook installed (thread {})", thread_id);

    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            if msg.message == WM_REPLAY_CLICK {
                if let Err(e) = injector.inject_in_place_secondary_click() {
                    tracing::warn!("Failed to replay secondary click: {}", e);
                }
                continue;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        HOOK_HANDLE.store(0, SeqCst);
        if let Err(e) = UnhookWindowsHookEx(hook) {
            tracing::warn!("Failed to remove mouse hook: {}", e);
        }
    }

    *HOOK_CONTEXT.lock() = None;
    tracing::info!("Low-level mouse hook removed");
}

unsafe fn install_hook() -> WaterflowResult<HHOOK> {
    let module = GetModuleHandleW(None)
        .map_err(|e| WaterflowError::PlatformError(format!("GetModuleHandleW failed: {}", e)))?;

    SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), HINSTANCE(module.0), 0)
        .map_err(|e| WaterflowError::PlatformError(format!("SetWindowsHookExW failed: {}", e)))
}

unsafe extern "system" fn mouse_hook_proc(code: i32, wp: WPARAM, lp: LPARAM) -> LRESULT {
    let hook = HHOOK(HOOK_HANDLE.load(SeqCst) as *mut _);

    // Negative code = must pass through per contract
    if code < 0 {
        return CallNextHookEx(hook, code, wp, lp);
    }

    let info = &*(lp.0 as *const MSLLHOOKSTRUCT);
    let kind = match wp.0 as u32 {
        WM_RBUTTONDOWN => MouseEventKind::SecondaryDown,
        WM_RBUTTONUP => MouseEventKind::SecondaryUp,
        WM_MOUSEMOVE => MouseEventKind::Move,
        _ => MouseEventKind::Other,
    };
    let event = RawMouseEvent {
        kind,
        point: ScreenPoint::new(info.pt.x, info.pt.y),
        tick_ms: u64::from(info.time),
        extra_info: info.dwExtraInfo,
    };

    let swallow = {
        let mut guard = HOOK_CONTEXT.lock();
        let Some(ctx) = guard.as_mut() else {
            return CallNextHookEx(hook, code, wp, lp);
        };

        let action = ctx.filter.process(&event);
        for signal in action.signals() {
            (ctx.sink)(signal);
        }
        if action.replay_click {
            let _ = PostThreadMessageW(ctx.thread_id, WM_REPLAY_CLICK, WPARAM(0), LPARAM(0));
        }
        action.disposition == Disposition::Swallow
    };

    if swallow {
        LRESULT(1)
    } else {
        CallNextHookEx(hook, code, wp, lp)
    }
}
