//! Process-wide low-level mouse hook.
//!
//! The callback runs on an OS-owned thread; its body is a handful of
//! structure copies plus a non-blocking channel send, so the hook is never
//! slow enough for the OS to silently uninstall it. Any panic inside the
//! body is caught and the event dropped — an unwind into the message pump
//! would destabilize input for the whole process.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, error};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, MSLLHOOKSTRUCT, WH_MOUSE_LL,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEMOVE, WM_RBUTTONDOWN,
    WM_RBUTTONUP,
};

use crate::events::{MouseButton, MouseEvent};
use crate::geometry::ScreenPoint;

/// Global mouse hook handle.
static MOUSE_HOOK: OnceLock<Mutex<Option<HHOOK>>> = OnceLock::new();

/// Channel sender for decoded events.
static MOUSE_SENDER: OnceLock<Mutex<Option<Sender<MouseEvent>>>> = OnceLock::new();

fn hook_slot() -> &'static Mutex<Option<HHOOK>> {
    MOUSE_HOOK.get_or_init(|| Mutex::new(None))
}

fn sender_slot() -> &'static Mutex<Option<Sender<MouseEvent>>> {
    MOUSE_SENDER.get_or_init(|| Mutex::new(None))
}

/// Install the low-level mouse hook. No-op when already installed.
pub fn install_mouse_hook(sender: Sender<MouseEvent>) -> Result<(), String> {
    let mut hook = hook_slot().lock();
    if hook.is_some() {
        debug!("mouse hook already installed");
        return Ok(());
    }

    *sender_slot().lock() = Some(sender);

    let handle = unsafe {
        SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), None, 0)
            .map_err(|e| format!("SetWindowsHookExW failed: {e}"))?
    };

    debug!("mouse hook installed");
    *hook = Some(handle);
    Ok(())
}

/// Uninstall the hook and drop the sender. No-op when not installed.
pub fn uninstall_mouse_hook() {
    let mut hook = hook_slot().lock();
    if let Some(h) = hook.take() {
        unsafe {
            let _ = UnhookWindowsHookEx(h);
        }
        debug!("mouse hook uninstalled");
    }
    *sender_slot().lock() = None;
}

pub fn is_mouse_hook_installed() -> bool {
    hook_slot().lock().is_some()
}

/// Hook callback. Decodes the message, emits at most one event, and always
/// passes the message on.
unsafe extern "system" fn mouse_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if n_code >= 0 {
        let result = catch_unwind(AssertUnwindSafe(|| decode_and_send(w_param, l_param)));
        if result.is_err() {
            error!("panic in mouse hook callback, event dropped");
        }
    }
    CallNextHookEx(None, n_code, w_param, l_param)
}

unsafe fn decode_and_send(w_param: WPARAM, l_param: LPARAM) {
    let ms = &*(l_param.0 as *const MSLLHOOKSTRUCT);
    let pos = ScreenPoint::new(ms.pt.x, ms.pt.y);

    let event = match w_param.0 as u32 {
        WM_MOUSEMOVE => Some(MouseEvent::Move(pos)),
        WM_LBUTTONDOWN => Some(MouseEvent::ButtonDown(MouseButton::Left, pos)),
        WM_LBUTTONUP => Some(MouseEvent::ButtonUp(MouseButton::Left, pos)),
        WM_RBUTTONDOWN => Some(MouseEvent::ButtonDown(MouseButton::Right, pos)),
        WM_RBUTTONUP => Some(MouseEvent::ButtonUp(MouseButton::Right, pos)),
        WM_MBUTTONDOWN => Some(MouseEvent::ButtonDown(MouseButton::Middle, pos)),
        WM_MBUTTONUP => Some(MouseEvent::ButtonUp(MouseButton::Middle, pos)),
        _ => None,
    };

    if let Some(event) = event {
        if let Some(sender) = sender_slot().lock().as_ref() {
            // try_send keeps the callback non-blocking; a full channel
            // means the consumer is behind and the event is dropped.
            if let Err(e) = sender.try_send(event) {
                error!("failed to forward mouse event: {e}");
            }
        }
    }
}
