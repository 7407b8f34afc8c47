//! Tray Icon Façade — the public surface of the engine.
//!
//! Owns the lifetime of the input monitor, the shell/geometry worker and
//! the engine thread. `enable` registers the OS icon and starts everything;
//! `disable` tears it all down and is safe to call repeatedly. All state is
//! in-memory and rebuilt on `enable`.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Sender};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::TrayConfig;
use crate::engine::{self, Control};
use crate::error::TrayError;
use crate::geometry::ScreenRect;
use crate::host::{Dispatch, ObserverId, ObserverRegistry, TrayHost, TrayObserver};
use crate::icon::IconSource;
use crate::monitor::GlobalInputMonitor;
use crate::shell::ShellIconWorker;

/// The tray interaction engine.
///
/// One live icon registration at most; re-enabling creates a fresh
/// registration, and geometry is rediscovered before any hit-test is
/// trusted again.
pub struct TrayEngine {
    host: Arc<dyn TrayHost>,
    dispatcher: Arc<dyn Dispatch>,
    observers: Arc<ObserverRegistry>,
    config: TrayConfig,
    rect_cache: Arc<Mutex<ScreenRect>>,
    active: Option<Active>,
}

struct Active {
    monitor: GlobalInputMonitor,
    shell: ShellIconWorker,
    ctrl_tx: Sender<Control>,
    engine: Option<JoinHandle<()>>,
}

impl TrayEngine {
    pub fn new(
        host: Arc<dyn TrayHost>,
        dispatcher: Arc<dyn Dispatch>,
        config: TrayConfig,
    ) -> Self {
        Self {
            host,
            dispatcher,
            observers: Arc::new(ObserverRegistry::new()),
            config,
            rect_cache: Arc::new(Mutex::new(ScreenRect::default())),
            active: None,
        }
    }

    /// Register the shell icon and start the monitor, tracker and engine.
    ///
    /// Hook installation or shell registration failure is fatal and leaves
    /// nothing running. Calling `enable` while enabled is a no-op.
    pub fn enable(&mut self, icon: IconSource, tooltip: &str) -> Result<(), TrayError> {
        if self.active.is_some() {
            debug!("enable called while already enabled");
            return Ok(());
        }

        // Fresh registration: forget the previous geometry.
        *self.rect_cache.lock() = ScreenRect::default();

        let (mouse_tx, mouse_rx) = bounded(self.config.channel_capacity);
        let (ctrl_tx, ctrl_rx) = unbounded();

        let mut monitor = GlobalInputMonitor::new();
        monitor.start(mouse_tx)?;

        let shell = match ShellIconWorker::spawn(
            icon.decode(),
            tooltip.to_string(),
            self.config.geometry_poll,
            Arc::clone(&self.rect_cache),
            ctrl_tx.clone(),
        ) {
            Ok(shell) => shell,
            Err(e) => {
                monitor.stop();
                return Err(e);
            }
        };

        let engine = engine::spawn(
            mouse_rx,
            ctrl_rx,
            Arc::clone(&self.host),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.observers),
            self.config.clone(),
        );

        info!("tray engine enabled");
        self.active = Some(Active {
            monitor,
            shell,
            ctrl_tx,
            engine: Some(engine),
        });
        Ok(())
    }

    /// Reverse of [`enable`](Self::enable). Safe to call multiple times.
    /// After return no further events reach the host.
    pub fn disable(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        // Stop the engine first so anything the producers emit during
        // their own teardown lands in a drained channel, not the host.
        let _ = active.ctrl_tx.send(Control::Shutdown);
        if let Some(handle) = active.engine.take() {
            let _ = handle.join();
        }
        active.monitor.stop();
        active.shell.stop();
        info!("tray engine disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// Latest known icon rectangle in raw device pixels; the default
    /// rectangle until the first successful poll of this registration.
    pub fn icon_screen_rect(&self) -> ScreenRect {
        *self.rect_cache.lock()
    }

    /// Mark popup construction complete (or torn down). Hover never shows
    /// the popup while this is false.
    pub fn set_popup_allowed(&self, allowed: bool) {
        self.send(Control::PopupAllowed(allowed));
    }

    /// The host opened its context menu; the popup hides and stays hidden.
    pub fn notify_menu_opened(&self) {
        self.send(Control::MenuOpened);
    }

    /// The host closed its context menu; hovering re-arms once the cursor
    /// is confirmed outside the menu area.
    pub fn notify_menu_closed(&self) {
        self.send(Control::MenuClosed);
    }

    pub fn add_observer(&self, observer: Arc<dyn TrayObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) {
        self.observers.remove(id);
    }

    fn send(&self, msg: Control) {
        if let Some(active) = &self.active {
            let _ = active.ctrl_tx.send(msg);
        }
    }
}

impl Drop for TrayEngine {
    fn drop(&mut self) {
        self.disable();
    }
}
