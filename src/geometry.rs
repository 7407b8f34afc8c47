//! Screen-space value types shared by the hook, the geometry tracker and the
//! interaction state machine. All coordinates are absolute desktop pixels.

use serde::{Deserialize, Serialize};

/// Absolute desktop pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Absolute desktop pixel rectangle.
///
/// The default (all-zero) rectangle means "geometry not yet known"; every
/// hit-test against it evaluates to false, so no point can register as
/// inside the icon before the first successful geometry poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Zero-area rectangles are "empty" and never contain any point.
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Inclusive point-in-rectangle hit-test.
    pub fn contains(&self, p: ScreenPoint) -> bool {
        !self.is_empty()
            && p.x >= self.left
            && p.x <= self.right
            && p.y >= self.top
            && p.y <= self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rect_contains_nothing() {
        let rect = ScreenRect::default();
        for p in [
            ScreenPoint::new(0, 0),
            ScreenPoint::new(-5, 3),
            ScreenPoint::new(100, 900),
            ScreenPoint::new(i32::MAX, i32::MIN),
        ] {
            assert!(!rect.contains(p));
        }
    }

    #[test]
    fn test_hit_test_inclusive_bounds() {
        let rect = ScreenRect::new(100, 900, 116, 916);
        assert!(rect.contains(ScreenPoint::new(108, 908)));
        assert!(rect.contains(ScreenPoint::new(100, 900)));
        assert!(rect.contains(ScreenPoint::new(116, 916)));
        assert!(!rect.contains(ScreenPoint::new(117, 908)));
        assert!(!rect.contains(ScreenPoint::new(99, 908)));
        assert!(!rect.contains(ScreenPoint::new(500, 500)));
    }

    #[test]
    fn test_inverted_rect_is_empty() {
        let rect = ScreenRect::new(50, 50, 10, 10);
        assert!(rect.is_empty());
        assert!(!rect.contains(ScreenPoint::new(30, 30)));
    }
}
