//! Frame → Vello drawing commands.
//!
//! Paint order, bottom to top: decorations, edges, waypoints, nodes,
//! edge draft, marquee. The caller presents the scene.

use crate::frame::{Frame, FrameSink, Theme};
use avn_core::geometry::{
    content_bounds, decoration_bounds, edge_path, header_bounds, node_bounds, toggle_bounds,
};
use avn_core::model::{self, Bounds, DecorationKind, StoryEdge, StoryGraph, StoryNode};
use kurbo::{Affine, BezPath, Circle, Line, Rect, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

const NODE_RADIUS: f64 = 6.0;
const WAYPOINT_RADIUS: f64 = 5.0;
const ARROW_LENGTH: f64 = 12.0;
const ARROW_HALF_WIDTH: f64 = 6.0;

/// Paints frames into a Vello scene.
pub struct ScenePainter {
    pub scene: Scene,
    pub theme: Theme,
}

impl Default for ScenePainter {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl ScenePainter {
    pub fn new(theme: Theme) -> Self {
        Self {
            scene: Scene::new(),
            theme,
        }
    }
}

impl FrameSink for ScenePainter {
    fn paint(&mut self, frame: &Frame<'_>) {
        self.scene.reset();
        paint_frame(&mut self.scene, frame, &self.theme);
    }
}

/// Paint one frame into `scene`.
pub fn paint_frame(scene: &mut Scene, frame: &Frame<'_>, theme: &Theme) {
    let screen = Rect::new(0.0, 0.0, frame.width, frame.height);
    scene.fill(Fill::NonZero, Affine::IDENTITY, color(theme.background), None, &screen);

    let cam = frame.camera;
    let world = Affine::translate((cam.offset.x, cam.offset.y)) * Affine::scale(cam.scale);
    let graph = frame.graph;

    if frame.detailed() {
        paint_decorations(scene, world, graph, theme);
    }
    for edge in graph.edges() {
        paint_edge(scene, world, graph, edge, theme);
    }
    if frame.editor {
        paint_waypoints(scene, world, graph, theme);
    }
    for node in graph.nodes() {
        paint_node(scene, world, node, frame.detailed(), theme);
    }

    if let Some((from, to)) = frame.edge_draft {
        let line = Line::new((from.x, from.y), (to.x, to.y));
        let stroke = Stroke::new(2.0).with_dashes(0.0, [6.0, 4.0]);
        scene.stroke(&stroke, world, color(theme.selection), None, &line);
    }
    if let Some(m) = frame.marquee {
        let r = rect(&m);
        scene.fill(Fill::NonZero, world, color(theme.marquee_fill), None, &r);
        scene.stroke(
            &Stroke::new(1.0 / cam.scale),
            world,
            color(theme.marquee_stroke),
            None,
            &r,
        );
    }
}

// ─── Entity painters ─────────────────────────────────────────────────────────

fn paint_decorations(scene: &mut Scene, world: Affine, graph: &StoryGraph, theme: &Theme) {
    for deco in &graph.decorations {
        let b = decoration_bounds(deco);
        match &deco.kind {
            DecorationKind::Rectangle { fill, .. } => {
                scene.fill(Fill::NonZero, world, color(*fill), None, &rect(&b));
            }
            DecorationKind::Text { content, .. } => {
                // Glyph runs need a font context owned by the host.
                log::trace!("TEXT {} {:?} at ({}, {})", deco.id, content, b.x, b.y);
            }
        }
        if deco.selected {
            scene.stroke(&Stroke::new(2.0), world, color(theme.selection), None, &rect(&b));
        }
    }
}

fn paint_edge(scene: &mut Scene, world: Affine, graph: &StoryGraph, edge: &StoryEdge, theme: &Theme) {
    let (Some(src), Some(dst)) = (graph.get_by_id(edge.source), graph.get_by_id(edge.target)) else {
        return;
    };
    let points = edge_path(src, dst, edge);
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };

    let stroke_color = if edge.highlighted {
        theme.highlight
    } else if edge.selected {
        theme.selection
    } else {
        edge.color.unwrap_or(theme.edge)
    };
    let width = if edge.highlighted || edge.selected {
        edge.line_width + 2.0
    } else {
        edge.line_width
    };

    let mut bez = BezPath::new();
    bez.move_to((first.x, first.y));
    for p in &points[1..] {
        bez.line_to((p.x, p.y));
    }
    scene.stroke(&Stroke::new(width), world, color(stroke_color), None, &bez);

    // Arrowhead along the final segment.
    if let Some(prev) = points.iter().rev().nth(1) {
        let (dx, dy) = (last.x - prev.x, last.y - prev.y);
        let len = dx.hypot(dy);
        if len > f64::EPSILON {
            let (ux, uy) = (dx / len, dy / len);
            let base = (last.x - ux * ARROW_LENGTH, last.y - uy * ARROW_LENGTH);
            let mut head = BezPath::new();
            head.move_to((last.x, last.y));
            head.line_to((base.0 - uy * ARROW_HALF_WIDTH, base.1 + ux * ARROW_HALF_WIDTH));
            head.line_to((base.0 + uy * ARROW_HALF_WIDTH, base.1 - ux * ARROW_HALF_WIDTH));
            head.close_path();
            scene.fill(Fill::NonZero, world, color(stroke_color), None, &head);
        }
    }
}

fn paint_waypoints(scene: &mut Scene, world: Affine, graph: &StoryGraph, theme: &Theme) {
    for edge in graph.edges() {
        for w in &edge.waypoints {
            let dot = Circle::new((w.x, w.y), WAYPOINT_RADIUS);
            scene.fill(Fill::NonZero, world, color(theme.waypoint), None, &dot);
        }
    }
}

fn paint_node(scene: &mut Scene, world: Affine, node: &StoryNode, detailed: bool, theme: &Theme) {
    let body = rect(&node_bounds(node)).to_rounded_rect(NODE_RADIUS);
    scene.fill(Fill::NonZero, world, color(theme.node_body), None, &body);

    if let Some(content) = content_bounds(node)
        && detailed
    {
        // Cover art is decoded by the host; show the slot.
        scene.fill(
            Fill::NonZero,
            world,
            color(theme.node_header).multiply_alpha(0.6),
            None,
            &rect(&content),
        );
    }

    scene.fill(Fill::NonZero, world, color(theme.node_header), None, &rect(&header_bounds(node)));
    scene.fill(Fill::NonZero, world, color(theme.toggle), None, &rect(&toggle_bounds(node)));

    if detailed {
        log::trace!("NODE {} {:?}", node.id, node.title);
    }

    let outline = if node.highlighted {
        Some(theme.highlight)
    } else if node.selected {
        Some(theme.selection)
    } else {
        None
    };
    if let Some(c) = outline {
        scene.stroke(&Stroke::new(3.0), world, color(c), None, &body);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn rect(b: &Bounds) -> Rect {
    Rect::new(b.x, b.y, b.x + b.width, b.y + b.height)
}

fn color(c: model::Color) -> Color {
    let [r, g, b, a] = c.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}
