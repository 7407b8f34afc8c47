//! Event types flowing through the engine: raw mouse events produced by the
//! global hook, and the high-level intents delivered to the host.

use crate::geometry::ScreenPoint;

/// Physical mouse button reported by the hook.
///
/// Only the three buttons the shell cares about; X buttons are dropped at
/// the hook layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Decoded low-level mouse event.
///
/// Button down and up are fully independent events; "click" is synthesized
/// later by the click disambiguator, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    Move(ScreenPoint),
    ButtonDown(MouseButton, ScreenPoint),
    ButtonUp(MouseButton, ScreenPoint),
}

/// Anchor point for the host's popup surface, already divided by the
/// display scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupAnchor {
    pub x: f64,
    pub y: f64,
}

/// Host-visible intents raised by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrayEvent {
    /// Show the popup surface anchored at the given point.
    ShowPopup(PopupAnchor),
    /// Hide the popup surface. Hosts must treat this as a no-op when the
    /// popup is not currently shown.
    HidePopup,
    /// Committed single left click (double-click window elapsed).
    LeftClick,
    /// Right button pressed over the icon; context-menu open request.
    RightClick,
    /// Two left downs inside the double-click window.
    DoubleClick,
}
