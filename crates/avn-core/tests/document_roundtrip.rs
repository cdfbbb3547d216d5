//! Integration tests: loading and writing story graph documents.

use avn_core::geometry::{edge_path, node_bounds};
use avn_core::*;
use pretty_assertions::assert_eq;

fn load() -> StoryGraph {
    let _ = env_logger::builder().is_test(true).try_init();
    parse_document(include_str!("fixtures/branching_story.jsonld")).unwrap()
}

#[test]
fn loads_recordings_paths_and_decorations() {
    let graph = load();
    assert_eq!(
        graph.node_ids(),
        vec![
            NodeId::intern("intro"),
            NodeId::intern("forest"),
            NodeId::intern("river"),
            NodeId::intern("finale"),
        ]
    );
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.decorations.len(), 2);
    assert_eq!(graph.meta.gateways, vec!["https://gateway.example/ipfs/".to_string()]);

    let intro = graph.get_by_id(NodeId::intern("intro")).unwrap();
    assert!(!intro.collapsed);
    assert_eq!(intro.audio.len(), 2);
    assert_eq!(intro.lyrics, Some(SourceRef::ipfs("bafyintrolyrics")));

    let forest = graph.get_by_id(NodeId::intern("forest")).unwrap();
    assert!(forest.collapsed);
}

#[test]
fn dangling_path_is_kept_aside() {
    let graph = load();
    assert_eq!(graph.unresolved_edges.len(), 1);
    assert_eq!(graph.unresolved_edges[0].target, NodeId::intern("epilogue"));
    assert!(graph.edge(EdgeId::intern("finale_epilogue")).is_none());
    assert!(graph.edges_from(NodeId::intern("finale")).is_empty());
}

#[test]
fn outgoing_edges_keep_document_order() {
    let graph = load();
    let out: Vec<_> = graph
        .edges_from(NodeId::intern("intro"))
        .into_iter()
        .map(|e| e.id.as_str().to_string())
        .collect();
    assert_eq!(out, vec!["intro_forest", "intro_river"]);
}

#[test]
fn waypoint_path_starts_on_source_box() {
    let graph = load();
    let edge = graph.edge(EdgeId::intern("intro_river")).unwrap();
    let source = graph.get_by_id(edge.source).unwrap();
    let target = graph.get_by_id(edge.target).unwrap();
    let path = edge_path(source, target, edge);
    assert_eq!(path.len(), 4);
    assert_eq!(path[1], Point::new(250.0, 100.0));
    assert!(node_bounds(source).contains(path[0]));
}

#[test]
fn emit_then_parse_preserves_content() {
    let graph = load();
    let text = emit_document(&graph).unwrap();
    let again = parse_document(&text).unwrap();

    assert_eq!(again.node_ids(), graph.node_ids());
    for (a, b) in graph.nodes().zip(again.nodes()) {
        assert_eq!(a, b);
    }
    let ids = |g: &StoryGraph| g.edges().map(|e| e.id).collect::<Vec<_>>();
    assert_eq!(ids(&again), ids(&graph));
    assert_eq!(
        again.edge(EdgeId::intern("intro_river")).unwrap().waypoints,
        graph.edge(EdgeId::intern("intro_river")).unwrap().waypoints
    );
    assert_eq!(again.unresolved_edges.len(), 1);
    assert_eq!(again.decorations, graph.decorations);
    assert_eq!(again.meta, graph.meta);
}

#[test]
fn emitted_document_uses_wire_names() {
    let graph = load();
    let text = emit_document(&graph).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["@context"], "https://schema.org/");
    let first = &value["@graph"][0];
    assert_eq!(first["@type"], "MusicRecording");
    assert_eq!(first["@id"], "intro");
    assert_eq!(first["isCollapsed"], false);
    assert_eq!(first["audioSources"][0]["type"], "ipfs");
}
