//! Per-frame description handed to painters.
//!
//! A `Frame` borrows the graph immutably; painters can read everything the
//! viewport shows but cannot mutate it.

use avn_core::camera::Camera;
use avn_core::model::{Bounds, Color, Point, StoryGraph};

/// Below this scale painters skip text, covers, and decorations.
pub const LOD_THRESHOLD: f64 = 0.4;

/// Everything needed to paint one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub graph: &'a StoryGraph,
    pub camera: Camera,
    /// Screen size in CSS pixels.
    pub width: f64,
    pub height: f64,
    /// Marquee rectangle in world space while one is being dragged.
    pub marquee: Option<Bounds>,
    /// Rubber-band line from a source anchor to the pointer, in world space.
    pub edge_draft: Option<(Point, Point)>,
    pub editor: bool,
    pub time_ms: f64,
    pub frame_index: u64,
}

impl Frame<'_> {
    /// Whether the zoom level is high enough for fine detail.
    pub fn detailed(&self) -> bool {
        self.camera.scale >= LOD_THRESHOLD
    }
}

/// Receives frames from the render loop.
pub trait FrameSink {
    fn paint(&mut self, frame: &Frame<'_>);
}

/// Colors shared by every painter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub node_body: Color,
    pub node_header: Color,
    pub node_text: Color,
    pub toggle: Color,
    pub edge: Color,
    pub highlight: Color,
    pub selection: Color,
    pub waypoint: Color,
    pub marquee_fill: Color,
    pub marquee_stroke: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::rgba(0.11, 0.11, 0.12, 1.0),
            grid: Color::rgba(1.0, 1.0, 1.0, 0.04),
            node_body: Color::rgba(0.16, 0.16, 0.18, 1.0),
            node_header: Color::rgba(0.2, 0.2, 0.22, 1.0),
            node_text: Color::rgba(0.88, 0.88, 0.88, 1.0),
            toggle: Color::rgba(0.6, 0.6, 0.62, 1.0),
            edge: Color::rgba(0.533, 0.533, 0.533, 1.0),
            highlight: Color::rgba(1.0, 0.843, 0.0, 1.0),
            selection: Color::rgba(1.0, 0.2, 0.2, 1.0),
            waypoint: Color::rgba(0.9, 0.9, 0.9, 1.0),
            marquee_fill: Color::rgba(0.0, 0.48, 1.0, 0.08),
            marquee_stroke: Color::rgba(0.0, 0.48, 1.0, 0.6),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::rgba(0.96, 0.96, 0.97, 1.0),
            grid: Color::rgba(0.0, 0.0, 0.0, 0.05),
            node_body: Color::rgba(1.0, 1.0, 1.0, 1.0),
            node_header: Color::rgba(0.93, 0.93, 0.95, 1.0),
            node_text: Color::rgba(0.11, 0.11, 0.12, 1.0),
            ..Self::dark()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lod_follows_scale() {
        let graph = StoryGraph::new();
        let mut frame = Frame {
            graph: &graph,
            camera: Camera::default(),
            width: 800.0,
            height: 600.0,
            marquee: None,
            edge_draft: None,
            editor: false,
            time_ms: 0.0,
            frame_index: 0,
        };
        assert!(frame.detailed());
        frame.camera.scale = 0.39;
        assert!(!frame.detailed());
    }
}
