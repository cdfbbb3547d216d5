//! One interactive session over a story graph.
//!
//! The session owns the graph and every piece of per-session state: the
//! viewport, selection, traversal engine, mode, and decoration lock. Each
//! operation is synchronous and returns the intents the UI shell should
//! act on. Operations that find nothing to do return an empty list and
//! leave all state as it was.

use crate::config::SessionConfig;
use crate::input::{InputEvent, Modifiers};
use crate::intent::Intent;
use crate::mutation::{GraphMutation, apply_all, apply_mutation};
use crate::selection::{SelectionMode, SelectionModel};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::traversal::{Follow, TraversalEngine};
use crate::viewport::{InteractionContext, Viewport, ViewportEvent};
use avn_core::document::{DocumentError, emit_document, parse_document};
use avn_core::geometry::{NODE_CONTENT_HEIGHT, NODE_HEADER_HEIGHT, NODE_WIDTH, anchor, header_bounds};
use avn_core::id::{DecorationId, EdgeId, NodeId};
use avn_core::media::GatewayTable;
use avn_core::model::*;

pub const NEW_NODE_TITLE: &str = "New Node";
pub const NEW_TEXT_CONTENT: &str = "New Text Label";
const NEW_RECT_SIZE: (f64, f64) = (300.0, 200.0);
const NEW_RECT_FILL: Color = Color::rgba(44.0 / 255.0, 62.0 / 255.0, 80.0 / 255.0, 1.0);
const NEW_TEXT_COLOR: Color = Color::rgba(236.0 / 255.0, 240.0 / 255.0, 241.0 / 255.0, 1.0);
const NEW_TEXT_SIZE: f64 = 16.0;
const NEW_TEXT_WIDTH: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Player,
    Editor,
}

pub struct Session {
    pub graph: StoryGraph,
    pub viewport: Viewport,
    selection: SelectionModel,
    traversal: TraversalEngine,
    mode: Mode,
    decorations_locked: bool,
    /// Entity the inspector is currently showing.
    inspected: Option<EntityRef>,
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        Self {
            graph: StoryGraph::new(),
            viewport: Viewport::new(config.viewport.clone()),
            selection: SelectionModel::new(),
            traversal: TraversalEngine::new(seed, config.choice_ticks),
            mode: Mode::Player,
            decorations_locked: false,
            inspected: None,
            config,
        }
    }

    pub fn with_graph(graph: StoryGraph, config: SessionConfig, seed: u64) -> Self {
        let mut session = Self::new(config, seed);
        session.graph = graph;
        session
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_editor(&self) -> bool {
        self.mode == Mode::Editor
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn traversal(&self) -> &TraversalEngine {
        &self.traversal
    }

    pub fn decorations_locked(&self) -> bool {
        self.decorations_locked
    }

    pub fn is_following(&self) -> bool {
        self.traversal.follow().is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Swap in new settings. The graph, walk, selection, mode, lock and
    /// follow state are kept; a live prompt keeps its countdown.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.viewport.cancel_drag();
        self.viewport.config = config.viewport.clone();
        let (min, max) = (config.viewport.min_scale, config.viewport.max_scale);
        self.viewport.camera.scale = self.viewport.camera.scale.clamp(min, max);
        self.traversal.set_choice_ticks(config.choice_ticks);
        self.config = config;
    }

    /// Handle of the open choice prompt.
    pub fn prompt_handle(&self) -> Option<u64> {
        self.traversal.prompt().map(|p| p.handle())
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Replace the graph with a parsed document. On error nothing changes.
    pub fn load_document(&mut self, json: &str) -> Result<Vec<Intent>, DocumentError> {
        let graph = parse_document(json)?;
        log::info!(
            "loaded {} recordings, {} paths, {} decorations",
            graph.node_count(),
            graph.edge_count(),
            graph.decorations.len()
        );
        self.viewport.cancel_drag();
        let mut intents = vec![Intent::Stop];
        intents.extend(self.traversal.reset());
        self.graph = graph;
        self.graph.clear_flags();
        self.selection.clear();
        intents.extend(self.selection_changed());
        Ok(intents)
    }

    pub fn export_document(&self) -> Result<String, DocumentError> {
        emit_document(&self.graph)
    }

    /// Playable URLs for a recording's audio, in preference order.
    pub fn audio_candidates(&self, id: NodeId) -> Vec<String> {
        self.graph
            .get_by_id(id)
            .map(|n| GatewayTable::from_meta(&self.graph.meta).candidates(&n.audio))
            .unwrap_or_default()
    }

    pub fn cover_candidates(&self, id: NodeId) -> Vec<String> {
        self.graph
            .get_by_id(id)
            .map(|n| GatewayTable::from_meta(&self.graph.meta).candidates(&n.cover))
            .unwrap_or_default()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &InputEvent) -> Vec<Intent> {
        if let InputEvent::Key { key, modifiers } = event {
            return self.handle_key(key, *modifiers);
        }
        let ctx = InteractionContext {
            graph: &self.graph,
            editor: self.is_editor(),
            decorations_locked: self.decorations_locked,
            selection: &self.selection,
        };
        let output = self.viewport.handle(&ctx, event);

        let mut intents = self.apply(output.mutations);
        for ev in output.events {
            intents.extend(self.on_viewport_event(ev));
        }
        intents
    }

    pub fn handle_key(&mut self, key: &str, m: Modifiers) -> Vec<Intent> {
        let Some(action) = ShortcutMap::resolve(key, m.ctrl, m.shift, m.alt, m.meta) else {
            return Vec::new();
        };
        log::trace!("shortcut {key:?} -> {action:?}");
        let editor = self.is_editor();
        match action {
            ShortcutAction::TogglePlay if !editor => self.toggle_play(),
            ShortcutAction::Advance if !editor => self.advance(),
            ShortcutAction::GoBack if !editor => self.go_back(),
            ShortcutAction::ToggleFollow => self.set_follow(!self.is_following()),
            ShortcutAction::Choose(index) => match self.prompt_handle() {
                Some(handle) => self.choose(handle, index),
                None => Vec::new(),
            },
            ShortcutAction::ToggleEditor => self.set_mode(if editor {
                Mode::Player
            } else {
                Mode::Editor
            }),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::NewNode => self.create_node(),
            ShortcutAction::ToggleDecorationLock => self.toggle_decoration_lock(),
            ShortcutAction::ZoomIn => {
                self.viewport.zoom_step(true);
                Vec::new()
            }
            ShortcutAction::ZoomOut => {
                self.viewport.zoom_step(false);
                Vec::new()
            }
            ShortcutAction::ResetView => {
                self.viewport.reset_view();
                Vec::new()
            }
            ShortcutAction::Escape => match self.prompt_handle() {
                Some(handle) => self.cancel_choice(handle),
                None if editor => self.clear_selection(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    fn on_viewport_event(&mut self, event: ViewportEvent) -> Vec<Intent> {
        match event {
            ViewportEvent::Clicked {
                target,
                world,
                modifiers,
            } => {
                if self.is_editor() {
                    return self.editor_click(target, modifiers);
                }
                match target {
                    Some(EntityRef::Node(id))
                        if self
                            .graph
                            .get_by_id(id)
                            .is_some_and(|n| header_bounds(n).contains(world)) =>
                    {
                        self.player_click(id)
                    }
                    _ => Vec::new(),
                }
            }
            ViewportEvent::MarqueeSelected { entities, mode } => {
                if !self.is_editor() {
                    return Vec::new();
                }
                self.selection.update(&entities, mode);
                self.selection_changed()
            }
            ViewportEvent::EdgeRequested { source, target } => self.create_edge(source, target),
        }
    }

    fn player_click(&mut self, id: NodeId) -> Vec<Intent> {
        if self.traversal.current() == Some(id) {
            return vec![Intent::TogglePlay];
        }
        self.start_from_node(id)
    }

    fn editor_click(&mut self, target: Option<EntityRef>, m: Modifiers) -> Vec<Intent> {
        match target {
            Some(entity) if m.command() => self.selection.toggle(entity),
            Some(entity) if m.shift => self.selection.update(&[entity], SelectionMode::Remove),
            Some(entity) => self.selection.update(&[entity], SelectionMode::Set),
            None if m.command() || m.shift => return Vec::new(),
            None => self.selection.clear(),
        }
        self.selection_changed()
    }

    // ─── Mode & follow ───────────────────────────────────────────────────

    /// Switch between player and editor. Playback stops, the walk resets,
    /// and every highlight and selection flag is cleared.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Intent> {
        if mode == self.mode {
            return Vec::new();
        }
        self.mode = mode;
        self.viewport.cancel_drag();
        let mut intents = vec![Intent::Stop];
        intents.extend(self.traversal.reset());
        self.graph.clear_flags();
        self.selection.clear();
        intents.extend(self.selection_changed());
        intents.push(Intent::ModeChanged {
            editor: mode == Mode::Editor,
        });
        log::debug!("mode is now {mode:?}");
        intents
    }

    /// Turn camera follow on or off. Enabling captures the current zoom and
    /// the current recording's offset from the viewport center, then
    /// recenters on that recording.
    pub fn set_follow(&mut self, enabled: bool) -> Vec<Intent> {
        if enabled == self.is_following() {
            return Vec::new();
        }
        let follow = enabled.then(|| {
            let offset = self
                .traversal
                .current()
                .and_then(|id| self.graph.get_by_id(id))
                .map(|n| {
                    let on_screen = self.viewport.camera.screen_from_world(anchor(n));
                    let center = self.viewport.screen_center();
                    Point::new(on_screen.x - center.x, on_screen.y - center.y)
                })
                .unwrap_or_default();
            Follow {
                scale: self.viewport.camera.scale,
                offset,
            }
        });
        self.traversal.set_follow(follow);
        let mut intents = vec![Intent::FollowChanged { enabled }];
        if let (Some(follow), Some(id)) = (follow, self.traversal.current()) {
            intents.extend(self.dispatch(vec![Intent::CenterOnNode {
                id,
                scale: follow.scale,
                offset: follow.offset,
            }]));
        }
        intents
    }

    // ─── Traversal ───────────────────────────────────────────────────────

    pub fn start_from_node(&mut self, id: NodeId) -> Vec<Intent> {
        let intents = self.traversal.start_from_node(&self.graph, id);
        self.dispatch(intents)
    }

    pub fn advance(&mut self) -> Vec<Intent> {
        let intents = self.traversal.advance(&self.graph);
        self.dispatch(intents)
    }

    pub fn go_back(&mut self) -> Vec<Intent> {
        let intents = self.traversal.go_back(&self.graph);
        self.dispatch(intents)
    }

    pub fn choose(&mut self, handle: u64, index: usize) -> Vec<Intent> {
        let intents = self.traversal.choose(&self.graph, handle, index);
        self.dispatch(intents)
    }

    pub fn cancel_choice(&mut self, handle: u64) -> Vec<Intent> {
        self.traversal.cancel_choice(handle)
    }

    pub fn prompt_tick(&mut self, handle: u64) -> Vec<Intent> {
        let intents = self.traversal.tick(&self.graph, handle);
        self.dispatch(intents)
    }

    /// The media player finished the current track.
    pub fn track_ended(&mut self) -> Vec<Intent> {
        self.advance()
    }

    fn toggle_play(&self) -> Vec<Intent> {
        match self.traversal.current() {
            Some(_) => vec![Intent::TogglePlay],
            None => Vec::new(),
        }
    }

    /// Apply the side effects the session owns, then pass intents through.
    fn dispatch(&mut self, intents: Vec<Intent>) -> Vec<Intent> {
        for intent in &intents {
            match intent {
                Intent::Highlight { current, edge, .. } => {
                    self.graph.set_highlight(*current, *edge);
                }
                Intent::CenterOnNode { id, scale, offset } => {
                    if let Some(node) = self.graph.get_by_id(*id) {
                        self.viewport.center_on(anchor(node), *scale, *offset);
                    }
                }
                _ => {}
            }
        }
        intents
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn clear_selection(&mut self) -> Vec<Intent> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        self.selection.clear();
        self.selection_changed()
    }

    pub fn select_all(&mut self) -> Vec<Intent> {
        if !self.is_editor() {
            return Vec::new();
        }
        let mut all: Vec<EntityRef> = self.graph.nodes().map(|n| EntityRef::Node(n.id)).collect();
        all.extend(self.graph.edges().map(|e| EntityRef::Edge(e.id)));
        if !self.decorations_locked {
            all.extend(self.graph.decorations.iter().map(|d| EntityRef::Decoration(d.id)));
        }
        self.selection.update(&all, SelectionMode::Set);
        self.selection_changed()
    }

    fn select_only(&mut self, entity: EntityRef) -> Vec<Intent> {
        self.selection.update(&[entity], SelectionMode::Set);
        self.selection_changed()
    }

    /// Sync flags and report the selection plus any inspector change.
    fn selection_changed(&mut self) -> Vec<Intent> {
        self.selection.sync_flags(&mut self.graph);
        let mut intents = vec![Intent::SelectionChanged {
            count: self.selection.len(),
        }];
        let primary = self.selection.primary();
        if primary != self.inspected {
            intents.push(match primary {
                Some(EntityRef::Node(id)) => Intent::OpenNodeInspector { id },
                Some(EntityRef::Edge(id)) => Intent::OpenEdgeInspector { id },
                Some(EntityRef::Decoration(id)) => Intent::OpenDecorationInspector { id },
                None => Intent::CloseInspector,
            });
            self.inspected = primary;
        }
        intents
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    fn apply(&mut self, mutations: Vec<GraphMutation>) -> Vec<Intent> {
        if mutations.is_empty() || apply_all(&mut self.graph, mutations) == 0 {
            return Vec::new();
        }
        vec![Intent::GraphChanged]
    }

    fn edit(&mut self, mutation: GraphMutation) -> bool {
        if !self.is_editor() {
            log::debug!("edit ignored outside editor mode");
            return false;
        }
        apply_mutation(&mut self.graph, mutation)
    }

    /// Add an expanded recording centered in the viewport and select it.
    pub fn create_node(&mut self) -> Vec<Intent> {
        let center = self.viewport.world_center();
        let mut node = StoryNode::new(
            NodeId::with_prefix("node"),
            NEW_NODE_TITLE,
            Point::new(
                center.x - NODE_WIDTH / 2.0,
                center.y - (NODE_HEADER_HEIGHT - NODE_CONTENT_HEIGHT) / 2.0,
            ),
        );
        node.collapsed = false;
        let id = node.id;
        if !self.edit(GraphMutation::AddNode {
            node: Box::new(node),
        }) {
            return Vec::new();
        }
        let mut intents = vec![Intent::GraphChanged];
        intents.extend(self.select_only(EntityRef::Node(id)));
        intents
    }

    pub fn create_rectangle(&mut self) -> Vec<Intent> {
        if self.decorations_locked {
            return Vec::new();
        }
        let center = self.viewport.world_center();
        let (w, h) = NEW_RECT_SIZE;
        let mut deco = Decoration::rectangle(
            DecorationId::with_prefix("rect"),
            Point::new(center.x - w / 2.0, center.y - h / 2.0),
            w,
            h,
        );
        if let DecorationKind::Rectangle { fill, .. } = &mut deco.kind {
            *fill = NEW_RECT_FILL;
        }
        self.add_decoration(deco)
    }

    pub fn create_text(&mut self) -> Vec<Intent> {
        if self.decorations_locked {
            return Vec::new();
        }
        let center = self.viewport.world_center();
        let mut deco = Decoration::text(DecorationId::with_prefix("text"), center, NEW_TEXT_CONTENT);
        if let DecorationKind::Text {
            font_size,
            color,
            width,
            ..
        } = &mut deco.kind
        {
            *font_size = NEW_TEXT_SIZE;
            *color = NEW_TEXT_COLOR;
            *width = NEW_TEXT_WIDTH;
        }
        self.add_decoration(deco)
    }

    fn add_decoration(&mut self, deco: Decoration) -> Vec<Intent> {
        let id = deco.id;
        if !self.edit(GraphMutation::AddDecoration {
            decoration: Box::new(deco),
        }) {
            return Vec::new();
        }
        let mut intents = vec![Intent::GraphChanged];
        intents.extend(self.select_only(EntityRef::Decoration(id)));
        intents
    }

    /// Connect two recordings. Self-loops and missing endpoints are refused.
    pub fn create_edge(&mut self, source: NodeId, target: NodeId) -> Vec<Intent> {
        if source == target || !self.graph.contains_node(source) || !self.graph.contains_node(target)
        {
            log::debug!("refusing path {source} -> {target}");
            return Vec::new();
        }
        let id = EdgeId::with_prefix(&format!("edge-{source}-{target}"));
        let edge = StoryEdge::new(id, source, target);
        if !self.edit(GraphMutation::AddEdge {
            edge: Box::new(edge),
        }) {
            return Vec::new();
        }
        let mut intents = vec![Intent::GraphChanged];
        intents.extend(self.select_only(EntityRef::Edge(id)));
        intents
    }

    /// Delete every selected entity. Removing a recording removes its paths.
    pub fn delete_selection(&mut self) -> Vec<Intent> {
        if !self.is_editor() || self.selection.is_empty() {
            return Vec::new();
        }
        let mutations: Vec<GraphMutation> = self
            .selection
            .iter()
            .map(|e| match *e {
                EntityRef::Node(id) => GraphMutation::RemoveNode { id },
                EntityRef::Edge(id) => GraphMutation::RemoveEdge { id },
                EntityRef::Decoration(id) => GraphMutation::RemoveDecoration { id },
            })
            .collect();
        let mut intents = self.apply(mutations);
        if let Some(current) = self.traversal.current()
            && !self.graph.contains_node(current)
        {
            intents.push(Intent::Stop);
            intents.extend(self.traversal.reset());
        }
        self.selection.retain_existing(&self.graph);
        intents.extend(self.selection_changed());
        intents
    }

    pub fn set_all_collapsed(&mut self, collapsed: bool) -> Vec<Intent> {
        let mutations = self
            .graph
            .node_ids()
            .into_iter()
            .map(|id| GraphMutation::SetCollapsed { id, collapsed })
            .collect();
        self.apply(mutations)
    }

    /// Flip the decoration lock. Locking drops decorations from the
    /// selection.
    pub fn toggle_decoration_lock(&mut self) -> Vec<Intent> {
        self.decorations_locked = !self.decorations_locked;
        log::debug!("decorations locked: {}", self.decorations_locked);
        if !self.decorations_locked {
            return Vec::new();
        }
        let decorations: Vec<EntityRef> = self
            .selection
            .iter()
            .filter(|e| matches!(e, EntityRef::Decoration(_)))
            .copied()
            .collect();
        if decorations.is_empty() {
            return Vec::new();
        }
        self.selection.update(&decorations, SelectionMode::Remove);
        self.selection_changed()
    }

    pub fn update_node_title(&mut self, id: NodeId, title: &str) -> Vec<Intent> {
        self.edit_and_report(GraphMutation::SetNodeTitle {
            id,
            title: title.to_string(),
        })
    }

    pub fn update_node_sources(
        &mut self,
        id: NodeId,
        audio: Vec<SourceRef>,
        cover: Vec<SourceRef>,
        lyrics: Option<SourceRef>,
    ) -> Vec<Intent> {
        self.edit_and_report(GraphMutation::SetNodeSources {
            id,
            audio,
            cover,
            lyrics,
        })
    }

    pub fn update_edge_label(&mut self, id: EdgeId, label: &str) -> Vec<Intent> {
        self.edit_and_report(GraphMutation::SetEdgeLabel {
            id,
            label: Some(label.to_string()),
        })
    }

    pub fn update_edge_style(&mut self, id: EdgeId, color: Option<Color>, line_width: f64) -> Vec<Intent> {
        self.edit_and_report(GraphMutation::SetEdgeStyle {
            id,
            color,
            line_width,
        })
    }

    fn edit_and_report(&mut self, mutation: GraphMutation) -> Vec<Intent> {
        if self.edit(mutation) {
            vec![Intent::GraphChanged]
        } else {
            Vec::new()
        }
    }
}
