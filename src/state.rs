//! Hover/interaction state machine.
//!
//! Consumes the fused mouse-event and geometry streams and decides when the
//! popup is shown or hidden and how hovering is gated against an open
//! context menu. The scattered booleans of earlier tray implementations
//! (`is_hovering`, `in_context_menu`, `inside`) are consolidated into the
//! single [`InteractionState`] enum; all mutation happens on the engine
//! thread, so no locking lives here.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::GeometryError;
use crate::geometry::{ScreenPoint, ScreenRect};

/// Exclusive interaction states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Popup hidden, no hover.
    Idle,
    /// Cursor inside the icon rectangle and nothing suppressing display.
    Hovering,
    /// A context menu is open, or the cursor has not yet been confirmed
    /// outside a just-closed menu. The popup stays hidden regardless of
    /// hover.
    Suppressed,
}

/// Host-visible intent, minus the popup anchor (the engine computes the
/// anchor from live geometry at emission time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ShowPopup,
    HidePopup,
    LeftClick,
    RightClick,
    DoubleClick,
}

/// Action for the engine to carry out, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Emit(Intent),
    /// Ask the host to dismiss its context menu.
    CloseMenu,
}

/// The state machine proper.
///
/// Pure in the sense that time is always injected; the engine thread owns
/// the only instance and feeds it events in arrival order.
#[derive(Debug)]
pub struct InteractionCore {
    state: InteractionState,
    cursor: ScreenPoint,
    icon_rect: ScreenRect,
    /// False until the first successful poll and after any failed poll; a
    /// retained rectangle is never trusted for a positive hit-test.
    geometry_ok: bool,
    menu_open: bool,
    popup_allowed: bool,
    last_move: Option<Instant>,
    idle_threshold: Duration,
}

impl InteractionCore {
    pub fn new(idle_threshold: Duration) -> Self {
        Self {
            state: InteractionState::Idle,
            cursor: ScreenPoint::default(),
            icon_rect: ScreenRect::default(),
            geometry_ok: false,
            menu_open: false,
            popup_allowed: false,
            last_move: None,
            idle_threshold,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn icon_rect(&self) -> ScreenRect {
        self.icon_rect
    }

    pub fn cursor(&self) -> ScreenPoint {
        self.cursor
    }

    /// True while `Suppressed` with the menu already reported closed; the
    /// engine keeps probing the host until the cursor leaves the menu area.
    pub fn awaiting_menu_leave(&self) -> bool {
        self.state == InteractionState::Suppressed && !self.menu_open
    }

    /// Hit-test against the current rectangle. Always false while geometry
    /// is unknown or stale.
    pub fn inside_icon(&self, p: ScreenPoint) -> bool {
        self.geometry_ok && self.icon_rect.contains(p)
    }

    fn cursor_inside(&self) -> bool {
        self.inside_icon(self.cursor)
    }

    /// Cursor moved. Evaluated on every move; re-delivering the same point
    /// while already `Hovering` emits nothing.
    pub fn on_move(&mut self, p: ScreenPoint, now: Instant) -> Vec<Action> {
        self.cursor = p;
        self.last_move = Some(now);
        self.evaluate()
    }

    /// Result of a geometry poll. Failures retain the previous rectangle
    /// for queries but force hover off until a poll succeeds again.
    pub fn on_geometry(&mut self, result: Result<ScreenRect, GeometryError>) -> Vec<Action> {
        match result {
            Ok(rect) => {
                self.icon_rect = rect;
                self.geometry_ok = true;
            }
            Err(err) => {
                if self.geometry_ok {
                    debug!(%err, "geometry poll failed, hover disabled until recovery");
                }
                self.geometry_ok = false;
            }
        }
        self.evaluate()
    }

    /// Host reported its context menu opening or closing.
    ///
    /// Opening suppresses immediately and hides the popup (popup and menu
    /// are mutually exclusive). Closing keeps the machine `Suppressed`
    /// until a probe confirms the cursor is outside the menu area.
    pub fn set_menu_open(&mut self, open: bool) -> Vec<Action> {
        if open == self.menu_open {
            return Vec::new();
        }
        self.menu_open = open;
        if open {
            debug!("context menu opened, suppressing popup");
            self.state = InteractionState::Suppressed;
            vec![Action::Emit(Intent::HidePopup)]
        } else {
            Vec::new()
        }
    }

    /// Debounced probe while waiting out a closed menu: the host's menu
    /// state and rectangle, polled by the engine. Re-arms hovering only
    /// once the menu is closed and the cursor is outside its bounds.
    pub fn on_menu_probe(&mut self, menu_open: bool, menu_rect: ScreenRect) -> Vec<Action> {
        if !self.awaiting_menu_leave() || menu_open || menu_rect.contains(self.cursor) {
            return Vec::new();
        }
        debug!("cursor left menu area, hover re-armed");
        self.state = InteractionState::Idle;
        self.evaluate()
    }

    /// Popup construction completed (or was torn down).
    pub fn set_popup_allowed(&mut self, allowed: bool) -> Vec<Action> {
        self.popup_allowed = allowed;
        if !allowed && self.state == InteractionState::Hovering {
            self.state = InteractionState::Idle;
            return vec![Action::Emit(Intent::HidePopup)];
        }
        self.evaluate()
    }

    /// Periodic re-validation: safety net for a hover whose cursor stopped
    /// producing move events yet no longer hit-tests inside (mirrors the
    /// original control's idle timer). A quiet cursor that still hit-tests
    /// inside keeps its popup.
    pub fn on_tick(&mut self, now: Instant) -> Vec<Action> {
        if self.state == InteractionState::Hovering {
            let idle = self
                .last_move
                .map_or(true, |t| now.saturating_duration_since(t) >= self.idle_threshold);
            if idle && !self.cursor_inside() {
                debug!("stale hover dropped on idle tick");
                self.state = InteractionState::Idle;
                return vec![Action::Emit(Intent::HidePopup)];
            }
        }
        Vec::new()
    }

    /// Whether the engine should schedule an idle re-validation tick.
    pub fn hovering(&self) -> bool {
        self.state == InteractionState::Hovering
    }

    /// Right button pressed over the icon: close the popup first, then
    /// request the context menu, in that strict order.
    pub fn on_right_down(&mut self, p: ScreenPoint) -> Vec<Action> {
        self.cursor = p;
        let mut actions = Vec::new();
        if self.state == InteractionState::Hovering {
            self.state = InteractionState::Idle;
            actions.push(Action::Emit(Intent::HidePopup));
        }
        actions.push(Action::Emit(Intent::RightClick));
        actions
    }

    /// Middle button over the icon dismisses an open menu, nothing more.
    pub fn on_middle_down(&mut self, p: ScreenPoint) -> Vec<Action> {
        self.cursor = p;
        vec![Action::CloseMenu]
    }

    /// Committed single left click from the disambiguator.
    pub fn on_single_click(&mut self) -> Vec<Action> {
        vec![Action::CloseMenu, Action::Emit(Intent::LeftClick)]
    }

    /// Committed double click; the pending single click was already
    /// suppressed by the disambiguator.
    pub fn on_double_click(&mut self) -> Vec<Action> {
        vec![Action::CloseMenu, Action::Emit(Intent::DoubleClick)]
    }

    fn evaluate(&mut self) -> Vec<Action> {
        match self.state {
            InteractionState::Idle => {
                if self.cursor_inside() && !self.menu_open && self.popup_allowed {
                    debug!("cursor entered icon, showing popup");
                    self.state = InteractionState::Hovering;
                    vec![Action::Emit(Intent::ShowPopup)]
                } else {
                    Vec::new()
                }
            }
            InteractionState::Hovering => {
                if !self.cursor_inside() {
                    debug!("cursor left icon, hiding popup");
                    self.state = InteractionState::Idle;
                    vec![Action::Emit(Intent::HidePopup)]
                } else {
                    Vec::new()
                }
            }
            InteractionState::Suppressed => Vec::new(),
        }
    }
}
