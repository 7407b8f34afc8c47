//! End-to-end tests for the engine thread: real channels, real time, a fake
//! host, and an inline dispatcher standing in for the UI queue.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;

use wintray::engine::{self, Control};
use wintray::host::ObserverRegistry;
use wintray::{
    GeometryError, InlineDispatch, MouseButton, MouseEvent, PopupSize, ScreenPoint, ScreenRect,
    TrayConfig, TrayEvent, TrayHost, TrayObserver,
};

const ICON: ScreenRect = ScreenRect {
    left: 100,
    top: 900,
    right: 116,
    bottom: 916,
};

/// Double-click window used by the tests; long enough that two sends land
/// inside it, short enough that waiting it out stays fast.
const CLICK_WINDOW: Duration = Duration::from_millis(120);

/// Generous settle time for the engine thread to drain its channels.
const SETTLE: Duration = Duration::from_millis(80);

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<TrayEvent>>,
}

impl Recorder {
    fn take(&self) -> Vec<TrayEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn snapshot(&self) -> Vec<TrayEvent> {
        self.events.lock().clone()
    }
}

impl TrayObserver for Recorder {
    fn on_show_popup(&self, anchor: wintray::PopupAnchor) {
        self.events.lock().push(TrayEvent::ShowPopup(anchor));
    }
    fn on_hide_popup(&self) {
        self.events.lock().push(TrayEvent::HidePopup);
    }
    fn on_left_click(&self) {
        self.events.lock().push(TrayEvent::LeftClick);
    }
    fn on_right_click(&self) {
        self.events.lock().push(TrayEvent::RightClick);
    }
    fn on_double_click(&self) {
        self.events.lock().push(TrayEvent::DoubleClick);
    }
}

#[derive(Default)]
struct FakeHost {
    menu_open: AtomicBool,
    menu_rect: Mutex<ScreenRect>,
    close_calls: AtomicUsize,
}

impl TrayHost for FakeHost {
    fn is_menu_open(&self) -> bool {
        self.menu_open.load(Ordering::SeqCst)
    }

    fn menu_screen_rect(&self) -> ScreenRect {
        *self.menu_rect.lock()
    }

    fn popup_size(&self) -> PopupSize {
        PopupSize {
            width: 200.0,
            height: 60.0,
        }
    }

    fn close_menu(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.menu_open.store(false, Ordering::SeqCst);
    }
}

struct Harness {
    mouse_tx: Sender<MouseEvent>,
    ctrl_tx: Sender<Control>,
    host: Arc<FakeHost>,
    recorder: Arc<Recorder>,
    engine: Option<std::thread::JoinHandle<()>>,
}

impl Harness {
    fn start() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let (mouse_tx, mouse_rx) = unbounded();
        let (ctrl_tx, ctrl_rx) = unbounded();
        let host = Arc::new(FakeHost::default());
        let recorder = Arc::new(Recorder::default());

        let observers = Arc::new(ObserverRegistry::new());
        observers.add(recorder.clone());

        let config = TrayConfig {
            double_click: Some(CLICK_WINDOW),
            menu_leave_debounce: Duration::from_millis(20),
            ..TrayConfig::default()
        };

        let engine = engine::spawn(
            mouse_rx,
            ctrl_rx,
            host.clone(),
            Arc::new(InlineDispatch),
            observers,
            config,
        );

        Self {
            mouse_tx,
            ctrl_tx,
            host,
            recorder,
            engine: Some(engine),
        }
    }

    /// Engine with known geometry and the popup ready to show.
    fn ready() -> Self {
        let h = Self::start();
        h.ctrl(Control::Geometry(Ok(ICON)));
        h.ctrl(Control::PopupAllowed(true));
        sleep(SETTLE);
        h
    }

    // Send errors are ignored: after shutdown the engine has dropped its
    // receivers, and late sends must be a no-op, not a fault.
    fn mouse(&self, ev: MouseEvent) {
        let _ = self.mouse_tx.send(ev);
    }

    fn ctrl(&self, msg: Control) {
        let _ = self.ctrl_tx.send(msg);
    }

    fn move_to(&self, x: i32, y: i32) {
        self.mouse(MouseEvent::Move(ScreenPoint::new(x, y)));
    }

    fn left_down(&self, x: i32, y: i32) {
        self.mouse(MouseEvent::ButtonDown(
            MouseButton::Left,
            ScreenPoint::new(x, y),
        ));
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.ctrl_tx.send(Control::Shutdown);
        if let Some(handle) = self.engine.take() {
            let _ = handle.join();
        }
    }
}

fn count(events: &[TrayEvent], wanted: fn(&TrayEvent) -> bool) -> usize {
    events.iter().filter(|e| wanted(e)).count()
}

#[test]
fn hover_inside_then_leave_emits_show_then_hide() {
    let h = Harness::ready();

    h.move_to(108, 908);
    sleep(SETTLE);

    let events = h.recorder.take();
    assert_eq!(events.len(), 1);
    match events[0] {
        TrayEvent::ShowPopup(anchor) => {
            // Icon center 108, popup 200x60, 12 px margin, scale 1.
            assert_eq!(anchor.x, 8.0);
            assert_eq!(anchor.y, 828.0);
        }
        other => panic!("expected ShowPopup, got {other:?}"),
    }

    h.move_to(500, 500);
    sleep(SETTLE);
    assert_eq!(h.recorder.take(), vec![TrayEvent::HidePopup]);
}

#[test]
fn repeated_moves_inside_show_exactly_once() {
    let h = Harness::ready();

    for _ in 0..10 {
        h.move_to(108, 908);
    }
    sleep(SETTLE);

    let events = h.recorder.take();
    assert_eq!(
        count(&events, |e| matches!(e, TrayEvent::ShowPopup(_))),
        1
    );
    assert_eq!(count(&events, |e| matches!(e, TrayEvent::HidePopup)), 0);
}

#[test]
fn two_left_downs_inside_window_yield_one_double_click() {
    let h = Harness::ready();

    h.left_down(108, 908);
    sleep(Duration::from_millis(30));
    h.left_down(108, 908);

    // Wait out the window plus slack: no stray single click may follow.
    sleep(CLICK_WINDOW + SETTLE);

    let events = h.recorder.take();
    assert_eq!(count(&events, |e| matches!(e, TrayEvent::DoubleClick)), 1);
    assert_eq!(count(&events, |e| matches!(e, TrayEvent::LeftClick)), 0);
}

#[test]
fn lone_left_down_commits_single_click_after_window() {
    let h = Harness::ready();

    h.left_down(108, 908);
    sleep(Duration::from_millis(30));
    assert_eq!(
        count(&h.recorder.snapshot(), |e| matches!(e, TrayEvent::LeftClick)),
        0
    );

    sleep(CLICK_WINDOW + SETTLE);
    let events = h.recorder.take();
    assert_eq!(count(&events, |e| matches!(e, TrayEvent::LeftClick)), 1);
    assert_eq!(count(&events, |e| matches!(e, TrayEvent::DoubleClick)), 0);
}

#[test]
fn no_show_popup_while_menu_open() {
    let h = Harness::ready();

    h.host.menu_open.store(true, Ordering::SeqCst);
    h.ctrl(Control::MenuOpened);
    sleep(SETTLE);
    h.recorder.take();

    for _ in 0..5 {
        h.move_to(108, 908);
    }
    sleep(SETTLE);
    assert_eq!(
        count(&h.recorder.take(), |e| matches!(e, TrayEvent::ShowPopup(_))),
        0
    );
}

#[test]
fn menu_close_rearms_hover_after_debounced_leave() {
    let h = Harness::ready();

    h.move_to(108, 908);
    sleep(SETTLE);
    h.recorder.take();

    h.host.menu_open.store(true, Ordering::SeqCst);
    *h.host.menu_rect.lock() = ScreenRect::new(80, 700, 300, 890);
    h.ctrl(Control::MenuOpened);
    sleep(SETTLE);
    assert_eq!(h.recorder.take(), vec![TrayEvent::HidePopup]);

    // Menu closes while the cursor hovers the icon (outside the menu
    // rectangle); the debounced probe re-arms and re-shows.
    h.host.menu_open.store(false, Ordering::SeqCst);
    h.ctrl(Control::MenuClosed);
    sleep(SETTLE);

    let events = h.recorder.take();
    assert_eq!(
        count(&events, |e| matches!(e, TrayEvent::ShowPopup(_))),
        1
    );
}

#[test]
fn menu_leave_probe_fires_through_continuous_motion() {
    let h = Harness::ready();

    h.move_to(108, 908);
    sleep(SETTLE);
    h.recorder.take();

    h.host.menu_open.store(true, Ordering::SeqCst);
    *h.host.menu_rect.lock() = ScreenRect::new(80, 700, 300, 890);
    h.ctrl(Control::MenuOpened);
    sleep(SETTLE);
    h.recorder.take();

    h.host.menu_open.store(false, Ordering::SeqCst);
    h.ctrl(Control::MenuClosed);

    // Keep move events arriving well inside the 20 ms debounce window for
    // the whole wait. The probe deadline is anchored when the wait begins,
    // so it must fire and re-show despite the stream.
    for _ in 0..40 {
        h.move_to(108, 908);
        sleep(Duration::from_millis(5));
    }

    let events = h.recorder.take();
    assert_eq!(
        count(&events, |e| matches!(e, TrayEvent::ShowPopup(_))),
        1,
        "probe starved by mouse motion: {events:?}"
    );
}

#[test]
fn right_down_while_hovering_hides_popup_before_right_click() {
    let h = Harness::ready();

    h.move_to(108, 908);
    sleep(SETTLE);
    h.recorder.take();

    h.mouse(MouseEvent::ButtonDown(
        MouseButton::Right,
        ScreenPoint::new(108, 908),
    ));
    sleep(SETTLE);

    assert_eq!(
        h.recorder.take(),
        vec![TrayEvent::HidePopup, TrayEvent::RightClick]
    );
}

#[test]
fn repeated_geometry_failures_hide_exactly_once() {
    let h = Harness::ready();

    h.move_to(108, 908);
    sleep(SETTLE);
    h.recorder.take();

    h.ctrl(Control::Geometry(Err(GeometryError::IconAbsent)));
    h.ctrl(Control::Geometry(Err(GeometryError::IconAbsent)));
    sleep(SETTLE);

    assert_eq!(h.recorder.take(), vec![TrayEvent::HidePopup]);
}

#[test]
fn press_outside_open_menu_dismisses_it() {
    let h = Harness::ready();

    h.host.menu_open.store(true, Ordering::SeqCst);
    *h.host.menu_rect.lock() = ScreenRect::new(80, 700, 300, 890);
    h.ctrl(Control::MenuOpened);
    sleep(SETTLE);

    // Press far away from both the menu and the icon.
    h.left_down(600, 200);
    sleep(SETTLE);

    assert_eq!(h.host.close_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn events_after_shutdown_are_dropped() {
    let h = Harness::ready();

    h.ctrl(Control::Shutdown);
    sleep(SETTLE);

    // The engine is gone; these must be silently ignored, not panic.
    h.move_to(108, 908);
    h.ctrl(Control::Geometry(Ok(ICON)));
    sleep(SETTLE);
    assert!(h.recorder.take().is_empty());
}
