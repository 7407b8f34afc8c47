//! wintray — notification-area interaction engine.
//!
//! The desktop shell has no native "cursor entered icon" or "icon moved"
//! notifications, so this crate builds them: a process-wide low-level mouse
//! hook produces a typed event stream, a polling worker rediscovers the
//! icon's screen rectangle, and an engine thread fuses the two into a
//! hover/interaction state machine that tells the host when to show or hide
//! its popup, when to open its context menu, and whether a left press was a
//! single or a double click.
//!
//! Architecture:
//! - [`monitor`] installs the global hook and pumps its messages
//! - [`shell`] owns the shell registration and geometry polling loop
//! - [`engine`] runs the state machine on its own thread
//! - [`tray::TrayEngine`] is the host-facing façade tying them together
//!
//! Everything UI-shaped (popup content, menus, theming) stays on the host
//! side of the [`host`] traits; the engine only raises intents and answers
//! rectangle queries.

pub mod click;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod icon;
pub mod positioner;
pub mod state;

#[cfg(windows)]
pub mod hook;
#[cfg(windows)]
pub mod monitor;
#[cfg(windows)]
pub mod shell;
#[cfg(windows)]
pub mod tray;

pub use config::TrayConfig;
pub use error::{GeometryError, TrayError};
pub use events::{MouseButton, MouseEvent, PopupAnchor, TrayEvent};
pub use geometry::{ScreenPoint, ScreenRect};
pub use host::{Dispatch, InlineDispatch, ObserverId, TrayHost, TrayObserver};
pub use icon::IconSource;
pub use positioner::PopupSize;
pub use state::InteractionState;
#[cfg(windows)]
pub use tray::TrayEngine;
