//! Graph mutations produced by the viewport and editor commands.
//!
//! Input handling never edits the graph directly: it returns
//! `GraphMutation`s and the session applies them in order. A mutation
//! whose target no longer exists is a logged no-op.

use avn_core::id::{DecorationId, EdgeId, NodeId};
use avn_core::model::*;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    MoveNode {
        id: NodeId,
        position: Point,
    },
    MoveWaypoint {
        edge: EdgeId,
        index: usize,
        position: Point,
    },
    /// Insert at `index`, clamped to the current waypoint count.
    InsertWaypoint {
        edge: EdgeId,
        index: usize,
        position: Point,
    },
    RemoveWaypoint {
        edge: EdgeId,
        index: usize,
    },
    MoveDecoration {
        id: DecorationId,
        position: Point,
    },
    ToggleCollapsed {
        id: NodeId,
    },
    SetCollapsed {
        id: NodeId,
        collapsed: bool,
    },
    AddNode {
        node: Box<StoryNode>,
    },
    /// Removes the node and every edge touching it.
    RemoveNode {
        id: NodeId,
    },
    AddEdge {
        edge: Box<StoryEdge>,
    },
    RemoveEdge {
        id: EdgeId,
    },
    AddDecoration {
        decoration: Box<Decoration>,
    },
    RemoveDecoration {
        id: DecorationId,
    },
    SetNodeTitle {
        id: NodeId,
        title: String,
    },
    SetNodeSources {
        id: NodeId,
        audio: Vec<SourceRef>,
        cover: Vec<SourceRef>,
        lyrics: Option<SourceRef>,
    },
    SetEdgeLabel {
        id: EdgeId,
        label: Option<String>,
    },
    SetEdgeStyle {
        id: EdgeId,
        color: Option<Color>,
        line_width: f64,
    },
}

/// Apply one mutation. Returns whether the graph changed.
pub fn apply_mutation(graph: &mut StoryGraph, mutation: GraphMutation) -> bool {
    let applied = match mutation {
        GraphMutation::MoveNode { id, position } => graph
            .get_by_id_mut(id)
            .map(|n| n.position = position)
            .is_some(),
        GraphMutation::MoveWaypoint {
            edge,
            index,
            position,
        } => graph
            .edge_mut(edge)
            .and_then(|e| e.waypoints.get_mut(index))
            .map(|w| *w = position)
            .is_some(),
        GraphMutation::InsertWaypoint {
            edge,
            index,
            position,
        } => graph
            .edge_mut(edge)
            .map(|e| {
                let at = index.min(e.waypoints.len());
                e.waypoints.insert(at, position);
            })
            .is_some(),
        GraphMutation::RemoveWaypoint { edge, index } => graph
            .edge_mut(edge)
            .filter(|e| index < e.waypoints.len())
            .map(|e| {
                e.waypoints.remove(index);
            })
            .is_some(),
        GraphMutation::MoveDecoration { id, position } => graph
            .decoration_mut(id)
            .map(|d| d.position = position)
            .is_some(),
        GraphMutation::ToggleCollapsed { id } => graph
            .get_by_id_mut(id)
            .map(|n| n.collapsed = !n.collapsed)
            .is_some(),
        GraphMutation::SetCollapsed { id, collapsed } => graph
            .get_by_id_mut(id)
            .map(|n| n.collapsed = collapsed)
            .is_some(),
        GraphMutation::AddNode { node } => graph.add_node(*node).is_some(),
        GraphMutation::RemoveNode { id } => graph.remove_node(id).is_some(),
        GraphMutation::AddEdge { edge } => {
            if edge.source == edge.target {
                log::debug!("refusing self-loop on {}", edge.source);
                false
            } else {
                graph.add_edge(*edge).is_ok()
            }
        }
        GraphMutation::RemoveEdge { id } => graph.remove_edge(id).is_some(),
        GraphMutation::AddDecoration { decoration } => {
            graph.add_decoration(*decoration);
            true
        }
        GraphMutation::RemoveDecoration { id } => graph.remove_decoration(id).is_some(),
        GraphMutation::SetNodeTitle { id, title } => graph
            .get_by_id_mut(id)
            .map(|n| n.title = title)
            .is_some(),
        GraphMutation::SetNodeSources {
            id,
            audio,
            cover,
            lyrics,
        } => graph
            .get_by_id_mut(id)
            .map(|n| {
                n.audio = audio;
                n.cover = cover;
                n.lyrics = lyrics;
            })
            .is_some(),
        GraphMutation::SetEdgeLabel { id, label } => graph
            .edge_mut(id)
            .map(|e| e.label = label.filter(|l| !l.trim().is_empty()))
            .is_some(),
        GraphMutation::SetEdgeStyle {
            id,
            color,
            line_width,
        } => graph
            .edge_mut(id)
            .map(|e| {
                e.color = color;
                e.line_width = line_width.max(0.5);
            })
            .is_some(),
    };
    if !applied {
        log::debug!("mutation had no target");
    }
    applied
}

/// Apply mutations in order, returning how many took effect.
pub fn apply_all(graph: &mut StoryGraph, mutations: Vec<GraphMutation>) -> usize {
    mutations
        .into_iter()
        .map(|m| apply_mutation(graph, m))
        .filter(|changed| *changed)
        .count()
}
