//! Session and viewport settings.
//!
//! Every field has a default, so hosts can pass partial JSON such as
//! `{"viewport": {"gridSize": 50}}`.

use serde::{Deserialize, Serialize};

/// Interaction tuning for the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    /// Drag snapping step in world units. `0` disables snapping.
    pub grid_size: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale factor per wheel notch is `exp(zoom_intensity)`.
    pub zoom_intensity: f64,
    /// Edge hit distance in screen pixels.
    pub edge_tolerance_px: f64,
    /// Waypoint hit radius in screen pixels.
    pub waypoint_radius_px: f64,
    /// Pointer travel below this is still a click.
    pub drag_threshold_px: f64,
    /// Marquees smaller than this on both axes select nothing.
    pub marquee_min_px: f64,
    /// Per-tick approach factor for camera animations, in (0, 1].
    pub camera_ease: f64,
    /// Splice double-click waypoints into the nearest segment instead of
    /// appending them.
    pub insert_waypoints_by_segment: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            grid_size: 25.0,
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_intensity: 0.1,
            edge_tolerance_px: 10.0,
            waypoint_radius_px: 8.0,
            drag_threshold_px: 3.0,
            marquee_min_px: 5.0,
            camera_ease: 0.15,
            insert_waypoints_by_segment: false,
        }
    }
}

/// Top-level session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub viewport: ViewportConfig,
    /// Ticks a choice prompt stays open before picking at random.
    pub choice_ticks: u32,
    /// Length of one prompt tick, for hosts that drive the timer.
    pub choice_tick_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            choice_ticks: 5,
            choice_tick_ms: 1000,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = SessionConfig::from_json(r#"{"viewport": {"gridSize": 50}, "choiceTicks": 3}"#)
            .unwrap();
        assert_eq!(cfg.viewport.grid_size, 50.0);
        assert_eq!(cfg.viewport.max_scale, 5.0);
        assert_eq!(cfg.choice_ticks, 3);
        assert_eq!(cfg.choice_tick_ms, 1000);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }
}
