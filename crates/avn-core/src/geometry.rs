//! Shapes derived from node and edge state.
//!
//! Every function here is pure. Painting and hit testing both go through
//! these so what is drawn is exactly what can be clicked.

use crate::model::{Bounds, Decoration, DecorationKind, Point, StoryEdge, StoryNode};
use smallvec::SmallVec;

pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEADER_HEIGHT: f64 = 45.0;
/// Cover art area above the header, 16:9 of the node width.
pub const NODE_CONTENT_HEIGHT: f64 = NODE_WIDTH * 9.0 / 16.0;
pub const TOGGLE_SIZE: f64 = 20.0;
pub const TOGGLE_INSET: f64 = 4.0;
/// Line segments used to approximate a curved edge.
pub const CURVE_SEGMENTS: usize = 16;
/// Perpendicular offset of the curve control point, as a fraction of the
/// anchor-to-anchor vector.
pub const CURVE_BEND: f64 = 0.2;
/// Text line height as a multiple of font size.
pub const TEXT_LINE_HEIGHT: f64 = 1.2;

/// Sampled edge path: endpoints plus waypoints or curve samples.
pub type EdgePath = SmallVec<[Point; 18]>;

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Full visual box. Expanded nodes grow upward to make room for the cover.
pub fn node_bounds(node: &StoryNode) -> Bounds {
    let Point { x, y } = node.position;
    if node.collapsed {
        Bounds::new(x, y, NODE_WIDTH, NODE_HEADER_HEIGHT)
    } else {
        Bounds::new(
            x,
            y - NODE_CONTENT_HEIGHT,
            NODE_WIDTH,
            NODE_HEADER_HEIGHT + NODE_CONTENT_HEIGHT,
        )
    }
}

pub fn header_bounds(node: &StoryNode) -> Bounds {
    Bounds::new(
        node.position.x,
        node.position.y,
        NODE_WIDTH,
        NODE_HEADER_HEIGHT,
    )
}

pub fn content_bounds(node: &StoryNode) -> Option<Bounds> {
    (!node.collapsed).then(|| {
        Bounds::new(
            node.position.x,
            node.position.y - NODE_CONTENT_HEIGHT,
            NODE_WIDTH,
            NODE_CONTENT_HEIGHT,
        )
    })
}

/// The collapse toggle square in the header's top-right corner.
pub fn toggle_bounds(node: &StoryNode) -> Bounds {
    Bounds::new(
        node.position.x + NODE_WIDTH - TOGGLE_INSET - TOGGLE_SIZE,
        node.position.y + TOGGLE_INSET,
        TOGGLE_SIZE,
        TOGGLE_SIZE,
    )
}

/// Where edges attach: the header center.
pub fn anchor(node: &StoryNode) -> Point {
    header_bounds(node).center()
}

/// Point where the ray from `from` toward `toward` leaves `bounds`.
///
/// `from` is expected to lie inside `bounds`. A zero-length ray returns
/// `from` unchanged.
pub fn exit_point(from: Point, toward: Point, bounds: &Bounds) -> Point {
    let dx = toward.x - from.x;
    let dy = toward.y - from.y;
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return from;
    }
    let tx = if dx > 0.0 {
        (bounds.x + bounds.width - from.x) / dx
    } else if dx < 0.0 {
        (bounds.x - from.x) / dx
    } else {
        f64::INFINITY
    };
    let ty = if dy > 0.0 {
        (bounds.y + bounds.height - from.y) / dy
    } else if dy < 0.0 {
        (bounds.y - from.y) / dy
    } else {
        f64::INFINITY
    };
    let t = tx.min(ty).max(0.0);
    Point::new(from.x + dx * t, from.y + dy * t)
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Control point of the default curve between two anchors.
pub fn curve_control(a: Point, b: Point) -> Point {
    let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    Point::new(mid.x - dy * CURVE_BEND, mid.y + dx * CURVE_BEND)
}

fn quadratic(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * p0.x + 2.0 * u * t * c.x + t * t * p1.x,
        u * u * p0.y + 2.0 * u * t * c.y + t * t * p1.y,
    )
}

/// Endpoints and control point of a waypoint-free edge, clipped to the
/// node boxes.
pub fn curve_points(source: &StoryNode, target: &StoryNode) -> (Point, Point, Point) {
    let (a, b) = (anchor(source), anchor(target));
    let control = curve_control(a, b);
    let start = exit_point(a, control, &node_bounds(source));
    let end = exit_point(b, control, &node_bounds(target));
    (start, control, end)
}

/// The polyline used to draw and hit-test an edge.
///
/// With waypoints: `[start, w1 .. wn, end]`. Without: the quadratic curve
/// sampled into [`CURVE_SEGMENTS`] segments.
pub fn edge_path(source: &StoryNode, target: &StoryNode, edge: &StoryEdge) -> EdgePath {
    let mut path = EdgePath::new();
    match (edge.waypoints.first(), edge.waypoints.last()) {
        (Some(&first), Some(&last)) => {
            path.push(exit_point(anchor(source), first, &node_bounds(source)));
            path.extend(edge.waypoints.iter().copied());
            path.push(exit_point(anchor(target), last, &node_bounds(target)));
        }
        _ => {
            let (start, control, end) = curve_points(source, target);
            for i in 0..=CURVE_SEGMENTS {
                let t = i as f64 / CURVE_SEGMENTS as f64;
                path.push(quadratic(start, control, end, t));
            }
        }
    }
    path
}

/// Distance from `p` to the segment `a`-`b`, clamped to the segment.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Index of the closest segment of `path` and its distance to `p`.
pub fn nearest_segment(p: Point, path: &[Point]) -> Option<(usize, f64)> {
    path.windows(2)
        .enumerate()
        .map(|(i, w)| (i, distance_to_segment(p, w[0], w[1])))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

pub fn distance_to_path(p: Point, path: &[Point]) -> f64 {
    nearest_segment(p, path).map_or(f64::INFINITY, |(_, d)| d)
}

/// Point halfway along a polyline by index, used to place labels.
pub fn path_midpoint(path: &[Point]) -> Option<Point> {
    match path.len() {
        0 => None,
        n if n % 2 == 1 => Some(path[n / 2]),
        n => {
            let (a, b) = (path[n / 2 - 1], path[n / 2]);
            Some(Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0))
        }
    }
}

// ─── Decorations ─────────────────────────────────────────────────────────

pub fn decoration_bounds(decoration: &Decoration) -> Bounds {
    let Point { x, y } = decoration.position;
    match &decoration.kind {
        DecorationKind::Rectangle { width, height, .. } => Bounds::new(x, y, *width, *height),
        DecorationKind::Text {
            content,
            font_size,
            width,
            ..
        } => {
            let lines = content.lines().count().max(1) as f64;
            Bounds::new(x, y, *width, lines * font_size * TEXT_LINE_HEIGHT)
        }
    }
}

// ─── Grid & rectangles ───────────────────────────────────────────────────

/// Round to the nearest multiple of `grid`. A non-positive grid disables
/// snapping.
pub fn snap_to_grid(v: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return v;
    }
    (v / grid).round() * grid
}

pub fn snap_point(p: Point, grid: f64) -> Point {
    Point::new(snap_to_grid(p.x, grid), snap_to_grid(p.y, grid))
}

/// Normalize a drag rectangle from two corners.
pub fn normalize_rect(a: Point, b: Point) -> Bounds {
    Bounds::new(
        a.x.min(b.x),
        a.y.min(b.y),
        (b.x - a.x).abs(),
        (b.y - a.y).abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{EdgeId, NodeId};

    fn node_at(id: &str, x: f64, y: f64, collapsed: bool) -> StoryNode {
        let mut n = StoryNode::new(NodeId::intern(id), id, Point::new(x, y));
        n.collapsed = collapsed;
        n
    }

    #[test]
    fn collapsed_box_is_header_only() {
        let n = node_at("g_a", 100.0, 100.0, true);
        assert_eq!(node_bounds(&n), Bounds::new(100.0, 100.0, 200.0, 45.0));
        let n = node_at("g_a", 100.0, 100.0, false);
        assert_eq!(node_bounds(&n), Bounds::new(100.0, -12.5, 200.0, 157.5));
    }

    #[test]
    fn toggle_sits_in_header_corner() {
        let n = node_at("g_t", 0.0, 0.0, true);
        let t = toggle_bounds(&n);
        assert!(header_bounds(&n).contains_bounds(&t));
        assert_eq!(t.x + t.width, NODE_WIDTH - TOGGLE_INSET);
    }

    #[test]
    fn exit_point_on_box_edge() {
        let b = Bounds::new(0.0, 0.0, 200.0, 45.0);
        let p = exit_point(Point::new(100.0, 22.5), Point::new(500.0, 22.5), &b);
        assert_eq!(p, Point::new(200.0, 22.5));
        let p = exit_point(Point::new(100.0, 22.5), Point::new(100.0, -300.0), &b);
        assert_eq!(p, Point::new(100.0, 0.0));
    }

    #[test]
    fn waypoint_path_includes_waypoints_in_order() {
        let a = node_at("g_s", 0.0, 0.0, true);
        let b = node_at("g_e", 600.0, 0.0, true);
        let mut e = StoryEdge::new(EdgeId::intern("g_se"), a.id, b.id);
        e.waypoints.push(Point::new(300.0, 200.0));
        e.waypoints.push(Point::new(400.0, 200.0));
        let path = edge_path(&a, &b, &e);
        assert_eq!(path.len(), 4);
        assert_eq!(path[1], Point::new(300.0, 200.0));
        assert_eq!(path[2], Point::new(400.0, 200.0));
        assert!(node_bounds(&a).contains(path[0]));
        assert!(node_bounds(&b).contains(path[3]));
    }

    #[test]
    fn curve_path_is_sampled() {
        let a = node_at("g_c1", 0.0, 0.0, true);
        let b = node_at("g_c2", 600.0, 0.0, true);
        let e = StoryEdge::new(EdgeId::intern("g_c12"), a.id, b.id);
        let path = edge_path(&a, &b, &e);
        assert_eq!(path.len(), CURVE_SEGMENTS + 1);
        // Bends toward +y for a left-to-right edge.
        let mid = path[CURVE_SEGMENTS / 2];
        assert!(mid.y > 22.5);
    }

    #[test]
    fn segment_distance_is_clamped() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn grid_snap_rounds_to_nearest() {
        assert_eq!(snap_point(Point::new(103.0, 57.0), 25.0), Point::new(100.0, 50.0));
        assert_eq!(snap_to_grid(113.0, 25.0), 125.0);
        assert_eq!(snap_to_grid(-13.0, 25.0), -25.0);
        assert_eq!(snap_to_grid(7.3, 0.0), 7.3);
    }

    #[test]
    fn normalize_any_corner_order() {
        let r = normalize_rect(Point::new(50.0, 10.0), Point::new(20.0, 40.0));
        assert_eq!(r, Bounds::new(20.0, 10.0, 30.0, 30.0));
    }
}
