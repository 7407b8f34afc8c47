//! Click disambiguation.
//!
//! Converts a left-button-down followed by silence into a committed single
//! click, and a down-down pair inside the double-click window into a double
//! click that suppresses the single-click side effect. Right and middle
//! buttons bypass this entirely.

use std::time::{Duration, Instant};
use tracing::debug;

/// Fallback double-click window when the OS setting is unavailable.
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(500);

/// The platform's current double-click window.
///
/// Re-queried at every arm so a live settings change applies to the next
/// click rather than requiring a restart.
#[cfg(windows)]
pub fn system_double_click_time() -> Duration {
    use windows::Win32::UI::Input::KeyboardAndMouse::GetDoubleClickTime;
    let ms = unsafe { GetDoubleClickTime() };
    if ms == 0 {
        DEFAULT_DOUBLE_CLICK
    } else {
        Duration::from_millis(u64::from(ms))
    }
}

#[cfg(not(windows))]
pub fn system_double_click_time() -> Duration {
    DEFAULT_DOUBLE_CLICK
}

/// Outcome committed by the disambiguator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Single,
    Double,
}

/// Two-state retriggerable timer: `Idle` or armed with a deadline.
///
/// The owner drives it with left-down events and deadline polls; no timer
/// thread lives here, so the whole thing stays deterministic under test.
#[derive(Debug, Default)]
pub struct ClickArm {
    deadline: Option<Instant>,
}

impl ClickArm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left button pressed. Arms the single-click timer on the first down;
    /// a second down before the deadline commits a double click and resets.
    pub fn on_left_down(&mut self, now: Instant, window: Duration) -> Option<ClickOutcome> {
        match self.deadline {
            Some(deadline) if now < deadline => {
                debug!("second left-down inside double-click window");
                self.deadline = None;
                Some(ClickOutcome::Double)
            }
            _ => {
                // A stale deadline means the owner missed a poll; the
                // pending single click is committed before re-arming.
                let stale = self.deadline.take().is_some();
                self.deadline = Some(now + window);
                stale.then_some(ClickOutcome::Single)
            }
        }
    }

    /// Commit a pending single click once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ClickOutcome> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(ClickOutcome::Single)
            }
            _ => None,
        }
    }

    /// External cancellation; any pending single click is discarded.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Deadline of the pending single click, if armed. Lets the engine loop
    /// bound its wait instead of busy-polling.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}
