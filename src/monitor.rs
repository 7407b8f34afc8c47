//! Global Input Monitor.
//!
//! Owns the low-level mouse hook plus the message-pump thread low-level
//! hooks require. `start` and `stop` are idempotent; `stop` posts `WM_QUIT`
//! to the pump thread so teardown never waits on further input.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, error, info};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PostThreadMessageW, TranslateMessage, MSG, WM_QUIT,
};

use crate::error::TrayError;
use crate::events::MouseEvent;
use crate::hook::{install_mouse_hook, is_mouse_hook_installed, uninstall_mouse_hook};

/// Installs the process-wide mouse hook and emits decoded events into the
/// channel handed to [`GlobalInputMonitor::start`].
pub struct GlobalInputMonitor {
    pump: Option<Pump>,
}

struct Pump {
    thread_id: Arc<Mutex<Option<u32>>>,
    handle: JoinHandle<()>,
}

impl GlobalInputMonitor {
    pub fn new() -> Self {
        Self { pump: None }
    }

    /// Install the hook and start the pump thread. Calling `start` while
    /// already started is a no-op.
    pub fn start(&mut self, sender: Sender<MouseEvent>) -> Result<(), TrayError> {
        if self.pump.is_some() {
            debug!("input monitor already started");
            return Ok(());
        }

        install_mouse_hook(sender).map_err(TrayError::HookInstall)?;

        let thread_id = Arc::new(Mutex::new(None));
        let tid_slot = Arc::clone(&thread_id);
        let handle = match thread::Builder::new()
            .name("wintray-input-pump".into())
            .spawn(move || {
                *tid_slot.lock() = Some(unsafe { GetCurrentThreadId() });
                info!("input pump started");
                run_message_loop();
                info!("input pump stopped");
            }) {
            Ok(handle) => handle,
            Err(e) => {
                uninstall_mouse_hook();
                return Err(TrayError::HookInstall(format!(
                    "failed to spawn pump thread: {e}"
                )));
            }
        };

        self.pump = Some(Pump { thread_id, handle });
        Ok(())
    }

    /// Uninstall the hook and stop the pump. Idempotent; after return no
    /// further events are emitted.
    pub fn stop(&mut self) {
        if is_mouse_hook_installed() {
            uninstall_mouse_hook();
        }
        if let Some(pump) = self.pump.take() {
            if let Some(tid) = *pump.thread_id.lock() {
                unsafe {
                    let _ = PostThreadMessageW(tid, WM_QUIT, WPARAM(0), LPARAM(0));
                }
            }
            let _ = pump.handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.pump.is_some()
    }
}

impl Default for GlobalInputMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GlobalInputMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Message loop required for low-level hooks; exits on `WM_QUIT`.
fn run_message_loop() {
    let mut msg = MSG::default();
    loop {
        unsafe {
            let result = GetMessageW(&mut msg, None, 0, 0);
            match result.0 {
                -1 => {
                    error!("GetMessageW error in input pump");
                    break;
                }
                0 => break, // WM_QUIT
                _ => {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }
}
