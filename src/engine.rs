//! The engine thread.
//!
//! One long-lived thread selects over the hook's mouse-event channel and
//! the control channel (geometry results, menu notifications, shutdown),
//! drives the interaction state machine and the click disambiguator, and
//! marshals every resulting intent onto the host's UI queue in order.
//!
//! All interaction state is mutated only on this thread, so the state
//! machine itself needs no locking.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver};
use tracing::{debug, info, warn};

use crate::click::{system_double_click_time, ClickArm, ClickOutcome};
use crate::config::TrayConfig;
use crate::error::GeometryError;
use crate::events::{MouseButton, MouseEvent, TrayEvent};
use crate::geometry::ScreenRect;
use crate::host::{Dispatch, ObserverRegistry, TrayHost};
use crate::positioner::popup_anchor;
use crate::state::{Action, Intent, InteractionCore};

/// Control messages into the engine thread.
#[derive(Debug)]
pub enum Control {
    /// Result of one geometry poll cycle.
    Geometry(Result<ScreenRect, GeometryError>),
    /// The host opened its context menu.
    MenuOpened,
    /// The host closed its context menu; hover stays suppressed until the
    /// debounced probe confirms the cursor left the menu area.
    MenuClosed,
    /// Popup construction completed (true) or was torn down (false).
    PopupAllowed(bool),
    /// Stop the engine thread. Events already queued behind this are
    /// dropped.
    Shutdown,
}

/// Spawn the engine thread.
pub fn spawn(
    mouse_rx: Receiver<MouseEvent>,
    ctrl_rx: Receiver<Control>,
    host: Arc<dyn TrayHost>,
    dispatcher: Arc<dyn Dispatch>,
    observers: Arc<ObserverRegistry>,
    config: TrayConfig,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut engine = Engine {
            core: InteractionCore::new(config.hover_idle_threshold),
            click: ClickArm::new(),
            host,
            dispatcher,
            observers,
            config,
            next_probe_at: None,
            hover_check_at: None,
        };
        info!("engine thread started");
        engine.run(mouse_rx, ctrl_rx);
        info!("engine thread stopped");
    })
}

struct Engine {
    core: InteractionCore,
    click: ClickArm,
    host: Arc<dyn TrayHost>,
    dispatcher: Arc<dyn Dispatch>,
    observers: Arc<ObserverRegistry>,
    config: TrayConfig,
    /// Next menu-leave probe, anchored when the wait begins and after each
    /// fired probe. Incoming events must not push it back: a low-level hook
    /// delivers moves every few milliseconds while the cursor is in motion,
    /// and the probe has to fire through that stream.
    next_probe_at: Option<Instant>,
    /// Next stale-hover re-validation, anchored the same way.
    hover_check_at: Option<Instant>,
}

enum Incoming {
    Mouse(MouseEvent),
    Ctrl(Control),
    Tick,
    Disconnected,
}

impl Engine {
    fn run(&mut self, mouse_rx: Receiver<MouseEvent>, ctrl_rx: Receiver<Control>) {
        loop {
            let now = Instant::now();
            let incoming = match self.next_deadline() {
                Some(deadline) => {
                    let timeout = deadline.saturating_duration_since(now);
                    select! {
                        recv(mouse_rx) -> ev => ev.map(Incoming::Mouse).unwrap_or(Incoming::Disconnected),
                        recv(ctrl_rx) -> msg => msg.map(Incoming::Ctrl).unwrap_or(Incoming::Disconnected),
                        default(timeout) => Incoming::Tick,
                    }
                }
                None => {
                    select! {
                        recv(mouse_rx) -> ev => ev.map(Incoming::Mouse).unwrap_or(Incoming::Disconnected),
                        recv(ctrl_rx) -> msg => msg.map(Incoming::Ctrl).unwrap_or(Incoming::Disconnected),
                    }
                }
            };

            let now = Instant::now();
            let actions = match incoming {
                Incoming::Mouse(ev) => self.on_mouse(ev, now),
                Incoming::Ctrl(Control::Geometry(res)) => self.core.on_geometry(res),
                Incoming::Ctrl(Control::MenuOpened) => self.core.set_menu_open(true),
                Incoming::Ctrl(Control::MenuClosed) => self.core.set_menu_open(false),
                Incoming::Ctrl(Control::PopupAllowed(allowed)) => {
                    self.core.set_popup_allowed(allowed)
                }
                Incoming::Ctrl(Control::Shutdown) => break,
                Incoming::Tick => self.on_tick(now),
                Incoming::Disconnected => {
                    warn!("engine input channel disconnected, stopping");
                    break;
                }
            };
            self.perform(actions);
            self.arm_timers(Instant::now());
        }
    }

    /// Earliest pending timer: click deadline, menu-leave probe, or hover
    /// re-validation. All three are absolute instants.
    fn next_deadline(&self) -> Option<Instant> {
        [self.click.deadline(), self.next_probe_at, self.hover_check_at]
            .into_iter()
            .flatten()
            .min()
    }

    /// Arm or clear the probe and hover timers from the current state.
    /// Already-armed timers keep their anchor.
    fn arm_timers(&mut self, now: Instant) {
        if self.core.awaiting_menu_leave() {
            self.next_probe_at
                .get_or_insert(now + self.config.menu_leave_debounce);
        } else {
            self.next_probe_at = None;
        }
        if self.core.hovering() {
            self.hover_check_at
                .get_or_insert(now + self.config.hover_idle_threshold);
        } else {
            self.hover_check_at = None;
        }
    }

    fn double_click_window(&self) -> Duration {
        self.config.double_click.unwrap_or_else(system_double_click_time)
    }

    fn on_mouse(&mut self, ev: MouseEvent, now: Instant) -> Vec<Action> {
        match ev {
            MouseEvent::Move(p) => self.core.on_move(p, now),
            MouseEvent::ButtonDown(button, p) if self.core.inside_icon(p) => match button {
                MouseButton::Left => {
                    // Left clicks go through the disambiguator; the window
                    // is re-read here so a live OS setting change applies.
                    match self.click.on_left_down(now, self.double_click_window()) {
                        Some(ClickOutcome::Double) => self.core.on_double_click(),
                        Some(ClickOutcome::Single) => self.core.on_single_click(),
                        None => Vec::new(),
                    }
                }
                MouseButton::Right => self.core.on_right_down(p),
                MouseButton::Middle => self.core.on_middle_down(p),
            },
            MouseEvent::ButtonDown(_, p) => {
                // Press anywhere else dismisses an open menu, unless the
                // press landed on the menu itself.
                if self.host.is_menu_open() && !self.host.menu_screen_rect().contains(p) {
                    debug!("button press outside menu, dismissing");
                    vec![Action::CloseMenu]
                } else {
                    Vec::new()
                }
            }
            MouseEvent::ButtonUp(..) => Vec::new(),
        }
    }

    fn on_tick(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(outcome) = self.click.poll(now) {
            match outcome {
                ClickOutcome::Single => actions.extend(self.core.on_single_click()),
                ClickOutcome::Double => actions.extend(self.core.on_double_click()),
            }
        }
        if self.next_probe_at.is_some_and(|at| now >= at) {
            actions.extend(
                self.core
                    .on_menu_probe(self.host.is_menu_open(), self.host.menu_screen_rect()),
            );
            self.next_probe_at = Some(now + self.config.menu_leave_debounce);
        }
        if self.hover_check_at.is_some_and(|at| now >= at) {
            actions.extend(self.core.on_tick(now));
            self.hover_check_at = Some(now + self.config.hover_idle_threshold);
        }
        actions
    }

    fn perform(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::CloseMenu => self.host.close_menu(),
                Action::Emit(intent) => {
                    let event = match intent {
                        Intent::ShowPopup => TrayEvent::ShowPopup(popup_anchor(
                            self.core.icon_rect(),
                            self.host.popup_size(),
                            self.host.scale_factor(),
                        )),
                        Intent::HidePopup => TrayEvent::HidePopup,
                        Intent::LeftClick => TrayEvent::LeftClick,
                        Intent::RightClick => TrayEvent::RightClick,
                        Intent::DoubleClick => TrayEvent::DoubleClick,
                    };
                    let observers = Arc::clone(&self.observers);
                    self.dispatcher.dispatch(Box::new(move || observers.emit(event)));
                }
            }
        }
    }
}
