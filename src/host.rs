//! Seams between the engine and the host UI framework.
//!
//! The engine never touches UI objects; everything it needs from the host
//! goes through these traits, and everything it tells the host is marshaled
//! through [`Dispatch`] onto the host's serialized UI queue.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::events::{PopupAnchor, TrayEvent};
use crate::geometry::ScreenRect;
use crate::positioner::PopupSize;

/// Host-side queries and commands.
///
/// Implementations are called from the engine thread and must be cheap and
/// non-blocking (e.g. atomics or locks updated from the UI thread).
/// `close_menu` is a request; the host marshals the actual UI work onto its
/// own queue.
pub trait TrayHost: Send + Sync {
    /// Whether the host's context menu is currently open.
    fn is_menu_open(&self) -> bool;

    /// Screen rectangle of the open context menu, in raw device pixels.
    /// The default rectangle when no menu is open.
    fn menu_screen_rect(&self) -> ScreenRect;

    /// Measured size of the popup content, in device-independent pixels.
    fn popup_size(&self) -> PopupSize;

    /// Display scale factor of the surface the popup renders on.
    fn scale_factor(&self) -> f64 {
        1.0
    }

    /// Dismiss the context menu if it is open.
    fn close_menu(&self);
}

/// Marshals a closure onto the host's serialized UI queue.
///
/// The engine emits every [`TrayEvent`] through this seam, one dispatch per
/// event, so a FIFO queue preserves emission order.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, f: Box<dyn FnOnce() + Send>);
}

/// Runs dispatched closures inline on the calling thread. Suitable for
/// tests and for hosts that drain the engine from their own loop.
#[derive(Debug, Default)]
pub struct InlineDispatch;

impl Dispatch for InlineDispatch {
    fn dispatch(&self, f: Box<dyn FnOnce() + Send>) {
        f();
    }
}

/// Receiver for the engine's host-visible events. Default bodies are
/// no-ops, so hosts implement only what they bind.
pub trait TrayObserver: Send + Sync {
    fn on_show_popup(&self, _anchor: PopupAnchor) {}
    fn on_hide_popup(&self) {}
    fn on_left_click(&self) {}
    fn on_right_click(&self) {}
    fn on_double_click(&self) {}
}

/// Handle returned by [`ObserverRegistry::add`]; removing it twice is a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Explicit listener registry with defined add/remove semantics, replacing
/// multicast-delegate style subscription.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn TrayObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. The same observer may be added more than once;
    /// each registration gets its own id and its own delivery.
    pub fn add(&self, observer: Arc<dyn TrayObserver>) -> ObserverId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = ObserverId(inner.next_id);
        inner.observers.push((id, observer));
        id
    }

    /// Remove a registration. Unknown or already-removed ids are ignored.
    pub fn remove(&self, id: ObserverId) {
        self.inner.lock().observers.retain(|(oid, _)| *oid != id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver one event to every registered observer, in registration
    /// order.
    pub fn emit(&self, event: TrayEvent) {
        // Snapshot under the lock so an observer may add/remove during
        // delivery without deadlocking.
        let observers: Vec<Arc<dyn TrayObserver>> = self
            .inner
            .lock()
            .observers
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();

        for observer in observers {
            match event {
                TrayEvent::ShowPopup(anchor) => observer.on_show_popup(anchor),
                TrayEvent::HidePopup => observer.on_hide_popup(),
                TrayEvent::LeftClick => observer.on_left_click(),
                TrayEvent::RightClick => observer.on_right_click(),
                TrayEvent::DoubleClick => observer.on_double_click(),
            }
        }
    }
}
