//! Core data model for story graphs.
//!
//! A story graph is a directed graph (cycles allowed) whose nodes are
//! playable recordings and whose edges are the paths a listener can take
//! between them. Rectangles and text labels decorate the canvas but never
//! take part in traversal.

use crate::id::{DecorationId, EdgeId, NodeId};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn hex_pair(hi: u8, lo: u8) -> Option<f32> {
    Some((hex_val(hi)? << 4 | hex_val(lo)?) as f32 / 255.0)
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let b = hex.as_bytes();

        match b.len() {
            3 => {
                let short = |c: u8| hex_val(c).map(|v| (v * 17) as f32 / 255.0);
                Some(Self::rgba(short(b[0])?, short(b[1])?, short(b[2])?, 1.0))
            }
            6 => Some(Self::rgba(
                hex_pair(b[0], b[1])?,
                hex_pair(b[2], b[3])?,
                hex_pair(b[4], b[5])?,
                1.0,
            )),
            8 => Some(Self::rgba(
                hex_pair(b[0], b[1])?,
                hex_pair(b[2], b[3])?,
                hex_pair(b[4], b[5])?,
                hex_pair(b[6], b[7])?,
            )),
            _ => None,
        }
    }

    /// Emit as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A point in world (or screen) space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// AABB overlap test.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

// ─── Media sources ───────────────────────────────────────────────────────

/// How a source value is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A directly retrievable URL.
    Url,
    /// A content address (CID) resolved through a gateway.
    Ipfs,
}

/// A tagged media reference, e.g. `{ "type": "ipfs", "value": "bafy..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub value: String,
}

impl SourceRef {
    pub fn url(value: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Url,
            value: value.into(),
        }
    }

    pub fn ipfs(value: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Ipfs,
            value: value.into(),
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A playable recording on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryNode {
    pub id: NodeId,
    pub title: String,
    /// Top-left of the header, in world units.
    pub position: Point,
    pub collapsed: bool,
    /// Current traversal position.
    pub highlighted: bool,
    /// Part of the editor selection.
    pub selected: bool,
    pub audio: Vec<SourceRef>,
    pub cover: Vec<SourceRef>,
    pub lyrics: Option<SourceRef>,
    pub custom_links: Vec<String>,
}

impl StoryNode {
    pub fn new(id: NodeId, title: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            title: title.into(),
            position,
            collapsed: true,
            highlighted: false,
            selected: false,
            audio: Vec::new(),
            cover: Vec::new(),
            lyrics: None,
            custom_links: Vec::new(),
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Inline storage for waypoints. Most edges bend at most a few times.
pub type Waypoints = SmallVec<[Point; 4]>;

/// A directed path from one recording to another.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub label: Option<String>,
    pub color: Option<Color>,
    pub line_width: f64,
    /// World-space control points between the endpoints, in order.
    pub waypoints: Waypoints,
    pub highlighted: bool,
    pub selected: bool,
}

impl StoryEdge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            label: None,
            color: None,
            line_width: DEFAULT_LINE_WIDTH,
            waypoints: SmallVec::new(),
            highlighted: false,
            selected: false,
        }
    }

    /// Edge label if non-empty.
    pub fn display_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.trim().is_empty())
    }
}

// ─── Decorations ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DecorationKind {
    Rectangle {
        width: f64,
        height: f64,
        fill: Color,
    },
    Text {
        content: String,
        font_size: f64,
        color: Color,
        /// Wrap width in world units.
        width: f64,
    },
}

/// A free-standing canvas annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub id: DecorationId,
    pub position: Point,
    pub kind: DecorationKind,
    pub selected: bool,
}

impl Decoration {
    pub fn rectangle(id: DecorationId, position: Point, width: f64, height: f64) -> Self {
        Self {
            id,
            position,
            kind: DecorationKind::Rectangle {
                width,
                height,
                fill: Color::rgba(0.2, 0.2, 0.2, 0.5),
            },
            selected: false,
        }
    }

    pub fn text(id: DecorationId, position: Point, content: impl Into<String>) -> Self {
        Self {
            id,
            position,
            kind: DecorationKind::Text {
                content: content.into(),
                font_size: 24.0,
                color: Color::rgba(0.88, 0.88, 0.88, 1.0),
                width: 200.0,
            },
            selected: false,
        }
    }
}

/// Anything on the canvas that can be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Node(NodeId),
    Edge(EdgeId),
    Decoration(DecorationId),
}

// ─── Metadata ────────────────────────────────────────────────────────────

pub const DEFAULT_GATEWAY: &str = "https://cloudflare-ipfs.com/ipfs/";

/// Document-level settings carried alongside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMeta {
    /// Content-address gateways, preferred first.
    #[serde(default = "default_gateways")]
    pub gateways: Vec<String>,
}

fn default_gateways() -> Vec<String> {
    vec![DEFAULT_GATEWAY.to_string()]
}

impl Default for GraphMeta {
    fn default() -> Self {
        Self {
            gateways: default_gateways(),
        }
    }
}

// ─── Story Graph ─────────────────────────────────────────────────────────

/// The authoritative story graph of a session.
///
/// Node and edge insertion order is tracked explicitly because petgraph's
/// stable graph reuses vacated slots; that order is both the paint order
/// (last painted is topmost) and the order hit tests and traversal see.
#[derive(Debug, Clone, Default)]
pub struct StoryGraph {
    pub graph: StableDiGraph<StoryNode, StoryEdge>,
    pub id_index: HashMap<NodeId, NodeIndex>,
    pub edge_index: HashMap<EdgeId, EdgeIndex>,
    z_order: Vec<NodeIndex>,
    edge_order: Vec<EdgeIndex>,
    /// Edges whose endpoints did not resolve at load time. Kept only so the
    /// document can be written back unchanged.
    pub unresolved_edges: Vec<StoryEdge>,
    pub decorations: Vec<Decoration>,
    pub meta: GraphMeta,
}

impl StoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Nodes ──

    /// Insert a node on top of the z-order. Returns `None` if the id is taken.
    pub fn add_node(&mut self, node: StoryNode) -> Option<NodeIndex> {
        if self.id_index.contains_key(&node.id) {
            log::warn!("duplicate node id {:?} ignored", node.id);
            return None;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.z_order.push(idx);
        Some(idx)
    }

    /// Remove a node together with every edge that touches it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(StoryNode, Vec<StoryEdge>)> {
        let idx = self.id_index.remove(&id)?;
        let incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();

        let mut removed_edges = Vec::with_capacity(incident.len());
        for eidx in incident {
            if let Some(edge) = self.graph.remove_edge(eidx) {
                self.edge_index.remove(&edge.id);
                removed_edges.push(edge);
            }
        }
        self.edge_order.retain(|e| self.graph.edge_weight(*e).is_some());
        self.z_order.retain(|n| *n != idx);

        let node = self.graph.remove_node(idx)?;
        Some((node, removed_edges))
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&StoryNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut StoryNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Nodes bottom-to-top in paint order.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &StoryNode> + '_ {
        self.z_order.iter().map(|idx| &self.graph[*idx])
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.z_order.len()
    }

    // ── Edges ──

    /// Insert an edge between existing nodes.
    ///
    /// Hands the edge back when either endpoint is missing or the id is
    /// already in use.
    pub fn add_edge(&mut self, edge: StoryEdge) -> Result<EdgeIndex, StoryEdge> {
        let (Some(&a), Some(&b)) = (self.id_index.get(&edge.source), self.id_index.get(&edge.target))
        else {
            return Err(edge);
        };
        if self.edge_index.contains_key(&edge.id) {
            return Err(edge);
        }
        let id = edge.id;
        let eidx = self.graph.add_edge(a, b, edge);
        self.edge_index.insert(id, eidx);
        self.edge_order.push(eidx);
        Ok(eidx)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<StoryEdge> {
        let eidx = self.edge_index.remove(&id)?;
        self.edge_order.retain(|e| *e != eidx);
        self.graph.remove_edge(eidx)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&StoryEdge> {
        self.edge_index.get(&id).map(|e| &self.graph[*e])
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut StoryEdge> {
        self.edge_index
            .get(&id)
            .copied()
            .map(|e| &mut self.graph[e])
    }

    /// Resolved edges in insertion order.
    pub fn edges(&self) -> impl DoubleEndedIterator<Item = &StoryEdge> + '_ {
        self.edge_order.iter().map(|e| &self.graph[*e])
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    /// Outgoing edges of `id`, in insertion order.
    pub fn edges_from(&self, id: NodeId) -> Vec<&StoryEdge> {
        self.edges().filter(|e| e.source == id).collect()
    }

    /// Incoming edges of `id`, in insertion order.
    pub fn edges_into(&self, id: NodeId) -> Vec<&StoryEdge> {
        self.edges().filter(|e| e.target == id).collect()
    }

    /// First edge (insertion order) from `source` to `target`.
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<&StoryEdge> {
        self.edges()
            .find(|e| e.source == source && e.target == target)
    }

    // ── Decorations ──

    pub fn add_decoration(&mut self, decoration: Decoration) {
        self.decorations.push(decoration);
    }

    pub fn decoration(&self, id: DecorationId) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.id == id)
    }

    pub fn decoration_mut(&mut self, id: DecorationId) -> Option<&mut Decoration> {
        self.decorations.iter_mut().find(|d| d.id == id)
    }

    pub fn remove_decoration(&mut self, id: DecorationId) -> Option<Decoration> {
        let pos = self.decorations.iter().position(|d| d.id == id)?;
        Some(self.decorations.remove(pos))
    }

    // ── Flags ──

    /// Clear every highlight, then mark `current` and `edge`.
    pub fn set_highlight(&mut self, current: Option<NodeId>, edge: Option<EdgeId>) {
        for node in self.graph.node_weights_mut() {
            node.highlighted = false;
        }
        for e in self.graph.edge_weights_mut() {
            e.highlighted = false;
        }
        if let Some(node) = current.and_then(|id| self.get_by_id_mut(id)) {
            node.highlighted = true;
        }
        if let Some(e) = edge.and_then(|id| self.edge_mut(id)) {
            e.highlighted = true;
        }
    }

    /// Drop all highlight and selection flags.
    pub fn clear_flags(&mut self) {
        self.set_highlight(None, None);
        for node in self.graph.node_weights_mut() {
            node.selected = false;
        }
        for e in self.graph.edge_weights_mut() {
            e.selected = false;
        }
        for d in &mut self.decorations {
            d.selected = false;
        }
    }

    pub fn highlighted_node(&self) -> Option<NodeId> {
        self.nodes().find(|n| n.highlighted).map(|n| n.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> StoryNode {
        StoryNode::new(NodeId::intern(id), id, Point::default())
    }

    fn edge(id: &str, a: &str, b: &str) -> StoryEdge {
        StoryEdge::new(EdgeId::intern(id), NodeId::intern(a), NodeId::intern(b))
    }

    fn sample() -> StoryGraph {
        let mut g = StoryGraph::new();
        for id in ["m_a", "m_b", "m_c"] {
            g.add_node(node(id));
        }
        g.add_edge(edge("m_ab", "m_a", "m_b")).unwrap();
        g.add_edge(edge("m_ac", "m_a", "m_c")).unwrap();
        g.add_edge(edge("m_cb", "m_c", "m_b")).unwrap();
        g
    }

    #[test]
    fn story_graph_basics() {
        let g = sample();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);
        let out: Vec<_> = g.edges_from(NodeId::intern("m_a")).iter().map(|e| e.id).collect();
        assert_eq!(out, vec![EdgeId::intern("m_ab"), EdgeId::intern("m_ac")]);
        assert_eq!(g.edges_into(NodeId::intern("m_b")).len(), 2);
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut g = sample();
        assert!(g.add_node(node("m_a")).is_none());
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn dangling_edge_handed_back() {
        let mut g = sample();
        let err = g.add_edge(edge("m_ax", "m_a", "m_missing")).unwrap_err();
        assert_eq!(err.target, NodeId::intern("m_missing"));
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut g = sample();
        let (removed, edges) = g.remove_node(NodeId::intern("m_c")).unwrap();
        assert_eq!(removed.id, NodeId::intern("m_c"));
        assert_eq!(edges.len(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.edge(EdgeId::intern("m_cb")).is_none());
        assert_eq!(g.node_ids(), vec![NodeId::intern("m_a"), NodeId::intern("m_b")]);
    }

    #[test]
    fn insertion_order_survives_slot_reuse() {
        let mut g = sample();
        g.remove_node(NodeId::intern("m_a"));
        g.add_node(node("m_d"));
        assert_eq!(
            g.node_ids(),
            vec![
                NodeId::intern("m_b"),
                NodeId::intern("m_c"),
                NodeId::intern("m_d")
            ]
        );
    }

    #[test]
    fn highlight_is_exclusive() {
        let mut g = sample();
        g.set_highlight(Some(NodeId::intern("m_a")), Some(EdgeId::intern("m_ab")));
        g.set_highlight(Some(NodeId::intern("m_b")), None);
        assert_eq!(g.highlighted_node(), Some(NodeId::intern("m_b")));
        assert!(g.edges().all(|e| !e.highlighted));
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6c5ce7");
        let short = Color::from_hex("fff").unwrap();
        assert_eq!(short.to_hex(), "#ffffff");
        let alpha = Color::from_hex("#00000080").unwrap();
        assert_eq!(alpha.to_hex(), "#00000080");
        assert!(Color::from_hex("#12").is_none());
    }

    #[test]
    fn bounds_containment() {
        let outer = Bounds::new(0.0, 0.0, 100.0, 100.0);
        let inner = Bounds::new(10.0, 10.0, 20.0, 20.0);
        let straddling = Bounds::new(90.0, 90.0, 20.0, 20.0);
        assert!(outer.contains_bounds(&inner));
        assert!(!outer.contains_bounds(&straddling));
        assert!(outer.intersects(&straddling));
    }
}
