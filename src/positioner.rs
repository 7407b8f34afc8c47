//! Popup placement.
//!
//! Pure mapping from the icon rectangle (raw device pixels) and the popup's
//! content size to an anchor point in scale-adjusted coordinates, so the
//! host's DPI-aware surface can be handed the offset directly.

use crate::events::PopupAnchor;
use crate::geometry::ScreenRect;

/// Gap between the popup's bottom edge and the icon's top edge, in
/// device-independent pixels.
pub const POPUP_MARGIN: f64 = 12.0;

/// Popup content size in device-independent pixels, as measured by the
/// host's layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopupSize {
    pub width: f64,
    pub height: f64,
}

/// Anchor so that the popup's horizontal center lines up with the icon's
/// center and its bottom edge sits [`POPUP_MARGIN`] above the icon's top
/// edge (tray popups point up from a bottom-anchored shell).
///
/// `scale` is the display scale factor; the icon rectangle arrives in raw
/// device pixels and is divided down before mixing with the popup size.
pub fn popup_anchor(icon_rect: ScreenRect, popup: PopupSize, scale: f64) -> PopupAnchor {
    let scale = if scale > 0.0 { scale } else { 1.0 };

    let icon_center_x = (icon_rect.left as f64 + icon_rect.width() as f64 / 2.0) / scale;
    let icon_top_y = icon_rect.top as f64 / scale;

    PopupAnchor {
        x: icon_center_x - popup.width / 2.0,
        y: icon_top_y - popup.height - POPUP_MARGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_above_icon() {
        let icon = ScreenRect::new(100, 900, 116, 916);
        let anchor = popup_anchor(
            icon,
            PopupSize {
                width: 200.0,
                height: 60.0,
            },
            1.0,
        );
        // Icon center x = 108; popup spans 8..208 centered on it.
        assert_eq!(anchor.x, 8.0);
        assert_eq!(anchor.y, 900.0 - 60.0 - POPUP_MARGIN);
    }

    #[test]
    fn test_device_pixels_divided_by_scale() {
        let icon = ScreenRect::new(200, 1800, 232, 1832);
        let anchor = popup_anchor(
            icon,
            PopupSize {
                width: 100.0,
                height: 40.0,
            },
            2.0,
        );
        // Center (216 px) and top (1800 px) halve under 200% scaling.
        assert_eq!(anchor.x, 108.0 - 50.0);
        assert_eq!(anchor.y, 900.0 - 40.0 - POPUP_MARGIN);
    }

    #[test]
    fn test_degenerate_scale_falls_back_to_unity() {
        let icon = ScreenRect::new(100, 900, 116, 916);
        let a = popup_anchor(icon, PopupSize::default(), 0.0);
        let b = popup_anchor(icon, PopupSize::default(), 1.0);
        assert_eq!(a, b);
    }
}
