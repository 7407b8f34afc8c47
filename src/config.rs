//! Engine tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable intervals and capacities for the interaction engine.
///
/// The defaults mirror the reference behavior: geometry is re-polled every
/// 100 ms, the menu-leave probe runs every 80 ms, and a hover with no mouse
/// movement for 200 ms is re-validated against the icon rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// How often the shell is asked for the icon's current rectangle.
    #[serde(with = "duration_ms", rename = "geometry_poll_ms")]
    pub geometry_poll: Duration,

    /// Probe interval while waiting for the cursor to leave a just-closed
    /// context menu before hovering is re-armed.
    #[serde(with = "duration_ms", rename = "menu_leave_debounce_ms")]
    pub menu_leave_debounce: Duration,

    /// Hover is dropped on a tick when no mouse move arrived for this long
    /// and the cached cursor no longer hit-tests inside the icon.
    #[serde(with = "duration_ms", rename = "hover_idle_threshold_ms")]
    pub hover_idle_threshold: Duration,

    /// Fixed double-click window override. `None` queries the OS setting at
    /// each arm, so a live settings change takes effect on the next click.
    #[serde(with = "opt_duration_ms", rename = "double_click_ms")]
    pub double_click: Option<Duration>,

    /// Capacity of the hook-to-engine event channel.
    pub channel_capacity: usize,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            geometry_poll: Duration::from_millis(100),
            menu_leave_debounce: Duration::from_millis(80),
            hover_idle_threshold: Duration::from_millis(200),
            double_click: None,
            channel_capacity: 256,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrayConfig::default();
        assert_eq!(config.geometry_poll, Duration::from_millis(100));
        assert_eq!(config.menu_leave_debounce, Duration::from_millis(80));
        assert_eq!(config.hover_idle_threshold, Duration::from_millis(200));
        assert_eq!(config.double_click, None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: TrayConfig =
            serde_json::from_str(r#"{"geometry_poll_ms": 250, "double_click_ms": 400}"#).unwrap();
        assert_eq!(config.geometry_poll, Duration::from_millis(250));
        assert_eq!(config.double_click, Some(Duration::from_millis(400)));
        assert_eq!(config.channel_capacity, 256);
    }
}
