//! Hit testing: world point → entity lookup.
//!
//! Nodes are tested front-to-back (last painted = topmost). Edges and
//! waypoints are tested in insertion order and the first match wins.
//! Tolerances are in world units; callers divide their screen-pixel
//! tolerance by the camera scale so the feel is zoom-independent.

use avn_core::geometry::{decoration_bounds, distance_to_path, edge_path, node_bounds, toggle_bounds};
use avn_core::id::{DecorationId, EdgeId, NodeId};
use avn_core::model::*;

/// Find the topmost node whose visual box contains `p`.
pub fn hit_test_node(graph: &StoryGraph, p: Point) -> Option<NodeId> {
    graph
        .nodes()
        .rev()
        .find(|n| node_bounds(n).contains(p))
        .map(|n| n.id)
}

/// The topmost node at `p`, if `p` lands on its collapse toggle.
///
/// A toggle covered by another node is not reachable.
pub fn hit_test_toggle(graph: &StoryGraph, p: Point) -> Option<NodeId> {
    let id = hit_test_node(graph, p)?;
    let node = graph.get_by_id(id)?;
    toggle_bounds(node).contains(p).then_some(id)
}

/// First edge (insertion order) whose path passes within `tolerance` of `p`.
///
/// Edges with an unresolvable endpoint are skipped.
pub fn hit_test_edge(graph: &StoryGraph, p: Point, tolerance: f64) -> Option<EdgeId> {
    graph
        .edges()
        .find(|edge| {
            let (Some(src), Some(dst)) = (graph.get_by_id(edge.source), graph.get_by_id(edge.target))
            else {
                return false;
            };
            distance_to_path(p, &edge_path(src, dst, edge)) < tolerance
        })
        .map(|e| e.id)
}

/// First waypoint within `radius` of `p`, as `(edge, index)`.
pub fn hit_test_waypoint(graph: &StoryGraph, p: Point, radius: f64) -> Option<(EdgeId, usize)> {
    graph.edges().find_map(|edge| {
        edge.waypoints
            .iter()
            .position(|w| w.distance(p) < radius)
            .map(|i| (edge.id, i))
    })
}

/// Topmost decoration containing `p`.
pub fn hit_test_decoration(graph: &StoryGraph, p: Point) -> Option<DecorationId> {
    graph
        .decorations
        .iter()
        .rev()
        .find(|d| decoration_bounds(d).contains(p))
        .map(|d| d.id)
}

/// What a plain click selects: nodes, then edges, then decorations.
pub fn hit_test_click(
    graph: &StoryGraph,
    p: Point,
    edge_tolerance: f64,
    include_decorations: bool,
) -> Option<EntityRef> {
    if let Some(id) = hit_test_node(graph, p) {
        return Some(EntityRef::Node(id));
    }
    if let Some(id) = hit_test_edge(graph, p, edge_tolerance) {
        return Some(EntityRef::Edge(id));
    }
    if include_decorations {
        return hit_test_decoration(graph, p).map(EntityRef::Decoration);
    }
    None
}

/// Entities captured by a marquee rectangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectHits {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub decorations: Vec<DecorationId>,
}

impl RectHits {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.decorations.is_empty()
    }

    pub fn entities(&self) -> Vec<EntityRef> {
        self.nodes
            .iter()
            .map(|id| EntityRef::Node(*id))
            .chain(self.edges.iter().map(|id| EntityRef::Edge(*id)))
            .chain(self.decorations.iter().map(|id| EntityRef::Decoration(*id)))
            .collect()
    }
}

/// Marquee query.
///
/// Nodes must lie entirely inside `rect`. Edges qualify when both of their
/// endpoint nodes do. Decorations only need to intersect.
pub fn hit_test_rect(graph: &StoryGraph, rect: &Bounds, include_decorations: bool) -> RectHits {
    let nodes: Vec<NodeId> = graph
        .nodes()
        .filter(|n| rect.contains_bounds(&node_bounds(n)))
        .map(|n| n.id)
        .collect();
    let edges = graph
        .edges()
        .filter(|e| nodes.contains(&e.source) && nodes.contains(&e.target))
        .map(|e| e.id)
        .collect();
    let decorations = if include_decorations {
        graph
            .decorations
            .iter()
            .filter(|d| rect.intersects(&decoration_bounds(d)))
            .map(|d| d.id)
            .collect()
    } else {
        Vec::new()
    };
    RectHits {
        nodes,
        edges,
        decorations,
    }
}
