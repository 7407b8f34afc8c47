//! Shell registration and icon geometry tracking.
//!
//! One worker thread owns the OS-level icon registration (the `tray-icon`
//! handle must stay on its creating thread), pumps that thread's message
//! queue, and re-polls the icon's screen rectangle on a fixed interval —
//! the shell may reposition the icon at any time, and this poll is the only
//! source of ground truth for "where is my icon right now".
//!
//! This loop is the one place in the engine allowed to sleep; the sleep is
//! short, so cancellation latency stays well under one poll period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
};

use crate::engine::Control;
use crate::error::{GeometryError, TrayError};
use crate::geometry::ScreenRect;
use crate::icon::RgbaIcon;

/// Pump granularity; bounds both event latency and cancellation latency.
const PUMP_SLEEP: Duration = Duration::from_millis(10);

/// Handle to the shell worker thread.
pub struct ShellIconWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ShellIconWorker {
    /// Register the icon and start polling. Registration happens on the
    /// worker thread but its outcome is reported synchronously: a failure
    /// surfaces here and no worker is left behind.
    pub fn spawn(
        icon: RgbaIcon,
        tooltip: String,
        poll_interval: Duration,
        rect_cache: Arc<Mutex<ScreenRect>>,
        ctrl_tx: Sender<Control>,
    ) -> Result<Self, TrayError> {
        let running = Arc::new(AtomicBool::new(true));
        let worker_running = Arc::clone(&running);
        let (startup_tx, startup_rx) = crossbeam_channel::bounded::<Result<(), TrayError>>(1);

        let handle = thread::Builder::new()
            .name("wintray-shell".into())
            .spawn(move || {
                let tray = match register(icon, &tooltip) {
                    Ok(tray) => {
                        let _ = startup_tx.send(Ok(()));
                        tray
                    }
                    Err(e) => {
                        let _ = startup_tx.send(Err(e));
                        return;
                    }
                };
                info!("shell icon registered");
                run_worker(&tray, poll_interval, &rect_cache, &ctrl_tx, &worker_running);
                // Dropping the handle deletes the shell registration.
                drop(tray);
                info!("shell icon unregistered");
            })
            .map_err(|e| TrayError::ShellRegistration(format!("failed to spawn worker: {e}")))?;

        match startup_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                running,
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(TrayError::ShellRegistration(
                    "shell worker exited before reporting startup".into(),
                ))
            }
        }
    }

    /// Request shutdown and wait for the registration to be removed.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ShellIconWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn register(icon: RgbaIcon, tooltip: &str) -> Result<TrayIcon, TrayError> {
    let icon = Icon::from_rgba(icon.data, icon.width, icon.height)
        .map_err(|e| TrayError::ShellRegistration(format!("bad icon bitmap: {e}")))?;

    TrayIconBuilder::new()
        .with_tooltip(tooltip)
        .with_icon(icon)
        .build()
        .map_err(|e| TrayError::ShellRegistration(e.to_string()))
}

fn run_worker(
    tray: &TrayIcon,
    poll_interval: Duration,
    rect_cache: &Mutex<ScreenRect>,
    ctrl_tx: &Sender<Control>,
    running: &AtomicBool,
) {
    let mut next_poll = Instant::now();
    let mut was_absent = false;

    while running.load(Ordering::SeqCst) {
        pump_messages();

        if Instant::now() >= next_poll {
            next_poll = Instant::now() + poll_interval;
            let result = poll_rect(tray);
            match result {
                Ok(rect) => {
                    *rect_cache.lock() = rect;
                    if was_absent {
                        debug!("icon geometry recovered");
                        was_absent = false;
                    }
                }
                Err(_) => {
                    // Previous rectangle retained for queries; the engine
                    // stops trusting it for hit-tests.
                    if !was_absent {
                        warn!("icon rectangle unavailable, treating as temporarily absent");
                        was_absent = true;
                    }
                }
            }
            // Engine gone means shutdown is in progress; nothing to do.
            let _ = ctrl_tx.send(Control::Geometry(result));
        }

        thread::sleep(PUMP_SLEEP);
    }
}

fn poll_rect(tray: &TrayIcon) -> Result<ScreenRect, GeometryError> {
    match tray.rect() {
        Some(rect) => Ok(ScreenRect::new(
            rect.position.x as i32,
            rect.position.y as i32,
            rect.position.x as i32 + rect.size.width as i32,
            rect.position.y as i32 + rect.size.height as i32,
        )),
        None => Err(GeometryError::IconAbsent),
    }
}

/// Drain this thread's message queue; required for the tray registration's
/// hidden window.
fn pump_messages() {
    unsafe {
        let mut msg = MSG::default();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
