//! Integration tests: authoring the crossroads story in editor mode.

use avn_core::document::parse_document;
use avn_core::id::{EdgeId, NodeId};
use avn_core::model::{Color, EntityRef, Point};
use avn_editor::*;
use pretty_assertions::assert_eq;

const CTRL: Modifiers = Modifiers {
    shift: false,
    ctrl: true,
    alt: false,
    meta: false,
};

fn editor() -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut s = Session::new(SessionConfig::default(), 3);
    s.resize(1024.0, 768.0);
    s.load_document(include_str!("fixtures/crossroads.jsonld"))
        .unwrap();
    s.set_mode(Mode::Editor);
    s
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn click_with(s: &mut Session, x: f64, y: f64, modifiers: Modifiers) -> Vec<Intent> {
    let mut intents = s.handle_input(&InputEvent::PointerDown {
        x,
        y,
        button: PointerButton::Primary,
        modifiers,
    });
    intents.extend(s.handle_input(&InputEvent::PointerUp { x, y, modifiers }));
    intents
}

#[test]
fn entering_editor_mode_stops_the_walk() {
    let mut s = Session::new(SessionConfig::default(), 3);
    s.load_document(include_str!("fixtures/crossroads.jsonld"))
        .unwrap();
    s.start_from_node(id("gate"));
    let intents = s.set_mode(Mode::Editor);
    assert!(intents.contains(&Intent::Stop));
    assert_eq!(s.traversal().current(), None);
    assert!(s.graph.nodes().all(|n| !n.highlighted));
}

#[test]
fn click_selection_and_inspector() {
    let mut s = editor();
    assert_eq!(
        click_with(&mut s, 50.0, 20.0, Modifiers::NONE),
        vec![
            Intent::SelectionChanged { count: 1 },
            Intent::OpenNodeInspector { id: id("gate") },
        ]
    );
    assert!(s.graph.get_by_id(id("gate")).unwrap().selected);

    assert_eq!(
        click_with(&mut s, 350.0, -130.0, CTRL),
        vec![Intent::SelectionChanged { count: 2 }, Intent::CloseInspector]
    );

    assert_eq!(
        click_with(&mut s, -300.0, -300.0, Modifiers::NONE),
        vec![Intent::SelectionChanged { count: 0 }]
    );
    assert!(s.graph.nodes().all(|n| !n.selected));
}

#[test]
fn marquee_then_delete() {
    let mut s = editor();
    s.handle_input(&InputEvent::pointer_down(-20.0, -200.0));
    s.handle_input(&InputEvent::pointer_move(520.0, 220.0));
    let intents = s.handle_input(&InputEvent::pointer_up(520.0, 220.0));
    assert_eq!(intents, vec![Intent::SelectionChanged { count: 5 }]);
    assert!(s.selection().contains(EntityRef::Edge(EdgeId::intern("gate_left"))));
    assert!(!s.selection().contains(EntityRef::Node(id("end"))));

    let intents = s.handle_input(&InputEvent::Key {
        key: "Delete".into(),
        modifiers: Modifiers::NONE,
    });
    assert_eq!(
        intents,
        vec![Intent::GraphChanged, Intent::SelectionChanged { count: 0 }]
    );
    assert_eq!(s.graph.node_ids(), vec![id("end")]);
    assert_eq!(s.graph.edge_count(), 0);
}

#[test]
fn dragging_a_node_snaps_it() {
    let mut s = editor();
    s.handle_input(&InputEvent::pointer_down(700.0, 20.0));
    let intents = s.handle_input(&InputEvent::pointer_move(760.0, 20.0));
    assert_eq!(intents, vec![Intent::GraphChanged]);
    assert!(s.handle_input(&InputEvent::pointer_up(760.0, 20.0)).is_empty());
    assert_eq!(
        s.graph.get_by_id(id("end")).unwrap().position,
        Point::new(700.0, 0.0)
    );
}

#[test]
fn secondary_drag_authors_an_edge() {
    let mut s = editor();
    s.handle_input(&InputEvent::PointerDown {
        x: 700.0,
        y: 20.0,
        button: PointerButton::Secondary,
        modifiers: Modifiers::NONE,
    });
    s.handle_input(&InputEvent::pointer_move(350.0, 170.0));
    let intents = s.handle_input(&InputEvent::pointer_up(350.0, 170.0));
    assert_eq!(intents[0], Intent::GraphChanged);
    let Some(Intent::OpenEdgeInspector { id: edge }) = intents.last().cloned() else {
        panic!("expected the new path to be inspected, got {intents:?}");
    };
    let created = s.graph.edge(edge).unwrap();
    assert_eq!((created.source, created.target), (id("end"), id("right")));
    assert_eq!(s.graph.edge_count(), 5);
}

#[test]
fn double_click_expands_a_recording() {
    let mut s = editor();
    assert!(s.graph.get_by_id(id("gate")).unwrap().collapsed);
    let intents = s.handle_input(&InputEvent::DoubleClick { x: 50.0, y: 20.0 });
    assert_eq!(intents, vec![Intent::GraphChanged]);
    assert!(!s.graph.get_by_id(id("gate")).unwrap().collapsed);
}

#[test]
fn lock_hides_decorations_from_select_all() {
    let mut s = editor();
    s.select_all();
    assert!(s.selection().contains(EntityRef::Decoration(
        avn_core::id::DecorationId::intern("backdrop")
    )));
    s.toggle_decoration_lock();
    assert_eq!(s.selection().len(), 8);
    s.select_all();
    assert_eq!(s.selection().len(), 8);
}

#[test]
fn inspector_edits_survive_export() {
    let mut s = editor();
    assert_eq!(
        s.update_node_title(id("right"), "Right Bank"),
        vec![Intent::GraphChanged]
    );
    s.update_edge_label(EdgeId::intern("gate_right"), "Cross the river");
    s.update_edge_style(
        EdgeId::intern("gate_right"),
        Color::from_hex("#ff0000"),
        0.1,
    );
    assert!(s.update_node_title(id("missing"), "x").is_empty());

    let json = s.export_document().unwrap();
    let reloaded = parse_document(&json).unwrap();
    assert_eq!(reloaded.get_by_id(id("right")).unwrap().title, "Right Bank");
    let edge = reloaded.edge(EdgeId::intern("gate_right")).unwrap();
    assert_eq!(edge.label.as_deref(), Some("Cross the river"));
    assert_eq!(edge.color, Color::from_hex("#ff0000"));
    assert_eq!(edge.line_width, 0.5);
    assert_eq!(reloaded.decorations.len(), 1);
}
