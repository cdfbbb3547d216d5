//! Viewport: camera, pointer gestures, and the drag state machine.
//!
//! The viewport never edits the graph. Pointer input produces
//! [`GraphMutation`]s for the session to apply plus [`ViewportEvent`]s
//! describing clicks, marquee releases, and edge requests.
//!
//! ## Pointer-down priority
//!
//! | Press | Player | Editor |
//! |-------|--------|--------|
//! | Middle | Pan | Pan |
//! | Secondary / ⌥ primary on a node | Ignored | Draft an edge |
//! | Primary on a waypoint | Pan | Drag waypoint |
//! | Primary on a collapse toggle | Toggle | Toggle |
//! | Primary on a node | Pan | Drag node (and selected companions) |
//! | Primary on an edge | Pan | Hold (click on release) |
//! | Primary on a decoration | Pan | Drag decoration (if unlocked) |
//! | Primary on empty canvas | Pan | Marquee |

use crate::config::ViewportConfig;
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::mutation::GraphMutation;
use crate::selection::{SelectionMode, SelectionModel};
use avn_core::camera::Camera;
use avn_core::geometry::{anchor, nearest_segment, normalize_rect, snap_point};
use avn_core::id::{DecorationId, EdgeId, NodeId};
use avn_core::model::{Bounds, EntityRef, Point, StoryGraph};
use avn_render::hit::{
    hit_test_click, hit_test_node, hit_test_rect, hit_test_toggle, hit_test_waypoint,
};

/// Animations stop once the camera is this close to its target.
const SETTLE_PX: f64 = 0.5;
const SETTLE_SCALE: f64 = 1e-3;

/// Read-only state the viewport consults while interpreting input.
#[derive(Debug, Clone, Copy)]
pub struct InteractionContext<'a> {
    pub graph: &'a StoryGraph,
    pub editor: bool,
    pub decorations_locked: bool,
    pub selection: &'a SelectionModel,
}

impl InteractionContext<'_> {
    fn decorations_clickable(&self) -> bool {
        self.editor && !self.decorations_locked
    }
}

/// Current pointer gesture. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    PanningCanvas,
    DraggingNode {
        id: NodeId,
        /// Pointer position relative to the node origin, world units.
        grab: Point,
        origin: Point,
        /// Other selected nodes and their positions at press time.
        companions: Vec<(NodeId, Point)>,
    },
    DraggingWaypoint {
        edge: EdgeId,
        index: usize,
    },
    DraggingDecoration {
        id: DecorationId,
        grab: Point,
    },
    /// World-space corners of the rubber band.
    Marquee {
        start: Point,
        current: Point,
    },
    DraftingEdge {
        source: NodeId,
        pointer: Point,
    },
    /// Pointer held on something that does not move.
    Holding,
}

/// Something the session should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    /// Press and release without dragging.
    Clicked {
        target: Option<EntityRef>,
        world: Point,
        modifiers: Modifiers,
    },
    MarqueeSelected {
        entities: Vec<EntityRef>,
        mode: SelectionMode,
    },
    EdgeRequested {
        source: NodeId,
        target: NodeId,
    },
}

/// Result of one input event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportOutput {
    pub events: Vec<ViewportEvent>,
    pub mutations: Vec<GraphMutation>,
}

impl ViewportOutput {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.mutations.is_empty()
    }

    fn mutation(m: GraphMutation) -> Self {
        Self {
            events: Vec::new(),
            mutations: vec![m],
        }
    }

    fn event(e: ViewportEvent) -> Self {
        Self {
            events: vec![e],
            mutations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    screen: Point,
    target: Option<EntityRef>,
    modifiers: Modifiers,
    button: PointerButton,
}

/// Where an eased camera move is heading.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CameraTarget {
    offset: Point,
    scale: f64,
}

pub struct Viewport {
    pub camera: Camera,
    pub config: ViewportConfig,
    width: f64,
    height: f64,
    drag: DragState,
    press: Option<Press>,
    dragged: bool,
    last_screen: Point,
    animation: Option<CameraTarget>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            camera: Camera::default(),
            config,
            width: 0.0,
            height: 0.0,
            drag: DragState::Idle,
            press: None,
            dragged: false,
            last_screen: Point::default(),
            animation: None,
        }
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Whether the last (or current) gesture moved past the click threshold.
    pub fn was_dragged(&self) -> bool {
        self.dragged
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    pub fn screen_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// World point currently at the middle of the screen.
    pub fn world_center(&self) -> Point {
        self.camera.world_from_screen(self.screen_center())
    }

    pub fn world_from_screen(&self, screen: Point) -> Point {
        self.camera.world_from_screen(screen)
    }

    /// Abandon any gesture in progress.
    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
        self.press = None;
    }

    // ─── Frame support ───────────────────────────────────────────────────

    pub fn marquee(&self) -> Option<Bounds> {
        match self.drag {
            DragState::Marquee { start, current } => Some(normalize_rect(start, current)),
            _ => None,
        }
    }

    pub fn edge_draft(&self, graph: &StoryGraph) -> Option<(Point, Point)> {
        match self.drag {
            DragState::DraftingEdge { source, pointer } => {
                graph.get_by_id(source).map(|n| (anchor(n), pointer))
            }
            _ => None,
        }
    }

    // ─── Camera animation ────────────────────────────────────────────────

    /// Ease toward showing `world` at `screen_offset` from the viewport
    /// center with the given scale.
    pub fn center_on(&mut self, world: Point, scale: f64, screen_offset: Point) {
        let scale = scale.clamp(self.config.min_scale, self.config.max_scale);
        let center = self.screen_center();
        let target = Point::new(center.x + screen_offset.x, center.y + screen_offset.y);
        self.animation = Some(CameraTarget {
            offset: Camera::offset_for(world, target, scale),
            scale,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn stop_animation(&mut self) {
        self.animation = None;
    }

    /// Advance the camera animation one step. Returns whether it moved.
    pub fn tick_animation(&mut self) -> bool {
        let Some(target) = self.animation else {
            return false;
        };
        let ease = self.config.camera_ease.clamp(f64::EPSILON, 1.0);
        let cam = &mut self.camera;
        cam.offset.x += (target.offset.x - cam.offset.x) * ease;
        cam.offset.y += (target.offset.y - cam.offset.y) * ease;
        cam.scale += (target.scale - cam.scale) * ease;
        if cam.offset.distance(target.offset) < SETTLE_PX
            && (cam.scale - target.scale).abs() < SETTLE_SCALE
        {
            cam.offset = target.offset;
            cam.scale = target.scale;
            self.animation = None;
        }
        true
    }

    /// Zoom by one notch around the screen center.
    pub fn zoom_step(&mut self, zoom_in: bool) {
        self.animation = None;
        let delta = if zoom_in { -1.0 } else { 1.0 };
        let center = self.screen_center();
        self.wheel(center, delta);
    }

    pub fn reset_view(&mut self) {
        self.animation = None;
        self.camera = Camera::default();
    }

    fn wheel(&mut self, anchor: Point, delta_y: f64) {
        let c = &self.config;
        self.camera
            .zoom_at(anchor, delta_y, c.zoom_intensity, c.min_scale, c.max_scale);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle(&mut self, ctx: &InteractionContext<'_>, event: &InputEvent) -> ViewportOutput {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(ctx, Point::new(*x, *y), *button, *modifiers),
            InputEvent::PointerMove { x, y } => self.pointer_move(ctx, Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, modifiers } => {
                self.pointer_up(ctx, Point::new(*x, *y), *modifiers)
            }
            InputEvent::DoubleClick { x, y } => self.double_click(ctx, Point::new(*x, *y)),
            InputEvent::Wheel { x, y, delta_y } => {
                self.animation = None;
                self.wheel(Point::new(*x, *y), *delta_y);
                ViewportOutput::default()
            }
            InputEvent::Key { .. } => ViewportOutput::default(),
        }
    }

    fn pointer_down(
        &mut self,
        ctx: &InteractionContext<'_>,
        screen: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> ViewportOutput {
        self.animation = None;
        self.dragged = false;
        self.last_screen = screen;
        let world = self.camera.world_from_screen(screen);
        let graph = ctx.graph;
        let tolerance = self.config.edge_tolerance_px / self.camera.scale;
        let target = hit_test_click(graph, world, tolerance, ctx.decorations_clickable());
        self.press = Some(Press {
            screen,
            target,
            modifiers,
            button,
        });

        if button == PointerButton::Middle {
            self.drag = DragState::PanningCanvas;
            return ViewportOutput::default();
        }

        let drafting = button == PointerButton::Secondary || modifiers.alt;
        if ctx.editor && drafting {
            self.drag = match hit_test_node(graph, world) {
                Some(source) => DragState::DraftingEdge {
                    source,
                    pointer: world,
                },
                None => DragState::Idle,
            };
            return ViewportOutput::default();
        }
        if button == PointerButton::Secondary {
            self.drag = DragState::Idle;
            return ViewportOutput::default();
        }

        if ctx.editor {
            let radius = self.config.waypoint_radius_px / self.camera.scale;
            if let Some((edge, index)) = hit_test_waypoint(graph, world, radius) {
                self.press = self.press.map(|p| Press {
                    target: Some(EntityRef::Edge(edge)),
                    ..p
                });
                self.drag = DragState::DraggingWaypoint { edge, index };
                return ViewportOutput::default();
            }
        }

        if let Some(id) = hit_test_toggle(graph, world) {
            log::debug!("collapse toggle on {id}");
            self.drag = DragState::Idle;
            self.press = None;
            return ViewportOutput::mutation(GraphMutation::ToggleCollapsed { id });
        }

        if !ctx.editor {
            self.drag = DragState::PanningCanvas;
            return ViewportOutput::default();
        }

        self.drag = match target {
            Some(EntityRef::Node(id)) => match graph.get_by_id(id) {
                Some(node) => {
                    let origin = node.position;
                    let companions = if ctx.selection.contains(EntityRef::Node(id)) {
                        ctx.selection
                            .iter()
                            .filter_map(|e| match e {
                                EntityRef::Node(other) if *other != id => graph
                                    .get_by_id(*other)
                                    .map(|n| (*other, n.position)),
                                _ => None,
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    DragState::DraggingNode {
                        id,
                        grab: Point::new(world.x - origin.x, world.y - origin.y),
                        origin,
                        companions,
                    }
                }
                None => DragState::Idle,
            },
            Some(EntityRef::Decoration(id)) => match graph.decoration(id) {
                Some(deco) => DragState::DraggingDecoration {
                    id,
                    grab: Point::new(world.x - deco.position.x, world.y - deco.position.y),
                },
                None => DragState::Idle,
            },
            Some(EntityRef::Edge(_)) => DragState::Holding,
            None => DragState::Marquee {
                start: world,
                current: world,
            },
        };
        ViewportOutput::default()
    }

    fn pointer_move(&mut self, ctx: &InteractionContext<'_>, screen: Point) -> ViewportOutput {
        let Some(press) = self.press else {
            self.last_screen = screen;
            return ViewportOutput::default();
        };
        if !self.dragged && screen.distance(press.screen) > self.config.drag_threshold_px {
            self.dragged = true;
        }
        let (dx, dy) = (screen.x - self.last_screen.x, screen.y - self.last_screen.y);
        self.last_screen = screen;
        let world = self.camera.world_from_screen(screen);
        let grid = self.config.grid_size;

        match &mut self.drag {
            DragState::Idle | DragState::Holding => ViewportOutput::default(),
            DragState::PanningCanvas => {
                self.camera.pan_by(dx, dy);
                ViewportOutput::default()
            }
            DragState::Marquee { current, .. } => {
                *current = world;
                ViewportOutput::default()
            }
            DragState::DraftingEdge { pointer, .. } => {
                *pointer = world;
                ViewportOutput::default()
            }
            _ if !self.dragged => ViewportOutput::default(),
            DragState::DraggingNode {
                id,
                grab,
                origin,
                companions,
            } => {
                let snapped = snap_point(Point::new(world.x - grab.x, world.y - grab.y), grid);
                let (ddx, ddy) = (snapped.x - origin.x, snapped.y - origin.y);
                let mut mutations = vec![GraphMutation::MoveNode {
                    id: *id,
                    position: snapped,
                }];
                mutations.extend(companions.iter().map(|(other, start)| {
                    GraphMutation::MoveNode {
                        id: *other,
                        position: Point::new(start.x + ddx, start.y + ddy),
                    }
                }));
                ViewportOutput {
                    events: Vec::new(),
                    mutations,
                }
            }
            DragState::DraggingWaypoint { edge, index } => {
                ViewportOutput::mutation(GraphMutation::MoveWaypoint {
                    edge: *edge,
                    index: *index,
                    position: snap_point(world, grid),
                })
            }
            DragState::DraggingDecoration { id, grab } => {
                if ctx.decorations_locked {
                    return ViewportOutput::default();
                }
                ViewportOutput::mutation(GraphMutation::MoveDecoration {
                    id: *id,
                    position: snap_point(Point::new(world.x - grab.x, world.y - grab.y), grid),
                })
            }
        }
    }

    fn pointer_up(
        &mut self,
        ctx: &InteractionContext<'_>,
        screen: Point,
        modifiers: Modifiers,
    ) -> ViewportOutput {
        let drag = std::mem::replace(&mut self.drag, DragState::Idle);
        let Some(press) = self.press.take() else {
            return ViewportOutput::default();
        };
        let world = self.camera.world_from_screen(screen);
        let click = ViewportEvent::Clicked {
            target: press.target,
            world,
            modifiers,
        };

        match drag {
            DragState::Idle => ViewportOutput::default(),
            DragState::PanningCanvas if press.button == PointerButton::Middle => {
                ViewportOutput::default()
            }
            DragState::Marquee { start, .. } => {
                let scale = self.camera.scale;
                let (w, h) = ((world.x - start.x).abs() * scale, (world.y - start.y).abs() * scale);
                let min = self.config.marquee_min_px;
                if w <= min && h <= min {
                    return ViewportOutput::event(ViewportEvent::Clicked {
                        target: None,
                        world,
                        modifiers,
                    });
                }
                let rect = normalize_rect(start, world);
                let hits = hit_test_rect(ctx.graph, &rect, !ctx.decorations_locked);
                let mode = if modifiers.command() {
                    SelectionMode::Add
                } else if modifiers.shift {
                    SelectionMode::Remove
                } else {
                    SelectionMode::Set
                };
                log::debug!("marquee captured {} entities", hits.entities().len());
                ViewportOutput::event(ViewportEvent::MarqueeSelected {
                    entities: hits.entities(),
                    mode,
                })
            }
            DragState::DraftingEdge { source, .. } => match hit_test_node(ctx.graph, world) {
                Some(target) if target != source => {
                    ViewportOutput::event(ViewportEvent::EdgeRequested { source, target })
                }
                _ => ViewportOutput::default(),
            },
            _ if self.dragged => ViewportOutput::default(),
            _ => ViewportOutput::event(click),
        }
    }

    fn double_click(&mut self, ctx: &InteractionContext<'_>, screen: Point) -> ViewportOutput {
        if self.dragged {
            return ViewportOutput::default();
        }
        let world = self.camera.world_from_screen(screen);
        let tolerance = self.config.edge_tolerance_px / self.camera.scale;
        match hit_test_click(ctx.graph, world, tolerance, ctx.decorations_clickable()) {
            Some(EntityRef::Node(id)) => {
                ViewportOutput::mutation(GraphMutation::ToggleCollapsed { id })
            }
            Some(EntityRef::Edge(edge)) if ctx.editor => {
                let index = if self.config.insert_waypoints_by_segment {
                    waypoint_slot(ctx.graph, edge, world)
                } else {
                    usize::MAX
                };
                ViewportOutput::mutation(GraphMutation::InsertWaypoint {
                    edge,
                    index,
                    position: world,
                })
            }
            _ => ViewportOutput::default(),
        }
    }
}

/// Waypoint index that splices `p` into the closest straight segment of
/// `anchor → waypoints → anchor`.
fn waypoint_slot(graph: &StoryGraph, edge: EdgeId, p: Point) -> usize {
    let Some(e) = graph.edge(edge) else {
        return usize::MAX;
    };
    let (Some(src), Some(dst)) = (graph.get_by_id(e.source), graph.get_by_id(e.target)) else {
        return e.waypoints.len();
    };
    let mut path = vec![anchor(src)];
    path.extend(e.waypoints.iter().copied());
    path.push(anchor(dst));
    nearest_segment(p, &path).map_or(e.waypoints.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avn_core::model::{Decoration, StoryEdge, StoryNode};
    use pretty_assertions::assert_eq;

    const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    fn nid(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    /// Two collapsed nodes side by side with a straight-ish edge between.
    fn scene() -> StoryGraph {
        let mut g = StoryGraph::new();
        g.add_node(StoryNode::new(nid("v_a"), "A", Point::new(0.0, 0.0)));
        g.add_node(StoryNode::new(nid("v_b"), "B", Point::new(400.0, 0.0)));
        let mut e = StoryEdge::new(EdgeId::intern("v_ab"), nid("v_a"), nid("v_b"));
        e.waypoints.push(Point::new(300.0, 200.0));
        g.add_edge(e).unwrap();
        g
    }

    fn ctx<'a>(g: &'a StoryGraph, sel: &'a SelectionModel, editor: bool) -> InteractionContext<'a> {
        InteractionContext {
            graph: g,
            editor,
            decorations_locked: false,
            selection: sel,
        }
    }

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_down(x, y)
    }

    #[test]
    fn player_press_pans_and_click_reports_target() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, false);

        vp.handle(&c, &down(50.0, 20.0));
        assert_eq!(vp.drag_state(), &DragState::PanningCanvas);
        let out = vp.handle(&c, &InputEvent::pointer_up(51.0, 20.0));
        assert_eq!(
            out.events,
            vec![ViewportEvent::Clicked {
                target: Some(EntityRef::Node(nid("v_a"))),
                world: Point::new(51.0, 20.0),
                modifiers: Modifiers::NONE,
            }]
        );
        assert!(out.mutations.is_empty());
    }

    #[test]
    fn panning_moves_camera_not_nodes() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, false);
        vp.handle(&c, &down(50.0, 20.0));
        let out = vp.handle(&c, &InputEvent::pointer_move(80.0, 60.0));
        assert!(out.is_empty());
        assert_eq!(vp.camera.offset, Point::new(30.0, 40.0));
        let up = vp.handle(&c, &InputEvent::pointer_up(80.0, 60.0));
        assert!(up.events.is_empty());
        assert_eq!(vp.drag_state(), &DragState::Idle);
    }

    #[test]
    fn node_drag_snaps_to_grid() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, true);
        vp.handle(&c, &down(10.0, 10.0));
        assert!(matches!(vp.drag_state(), DragState::DraggingNode { .. }));
        let out = vp.handle(&c, &InputEvent::pointer_move(47.0, 23.0));
        assert_eq!(
            out.mutations,
            vec![GraphMutation::MoveNode {
                id: nid("v_a"),
                position: Point::new(25.0, 25.0),
            }]
        );
        let up = vp.handle(&c, &InputEvent::pointer_up(47.0, 23.0));
        assert!(up.is_empty());
        assert!(vp.was_dragged());
    }

    #[test]
    fn selected_companions_follow_the_grabbed_node() {
        let g = scene();
        let mut sel = SelectionModel::new();
        sel.update(
            &[EntityRef::Node(nid("v_a")), EntityRef::Node(nid("v_b"))],
            SelectionMode::Set,
        );
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, true);
        vp.handle(&c, &down(10.0, 10.0));
        let out = vp.handle(&c, &InputEvent::pointer_move(60.0, 10.0));
        assert_eq!(
            out.mutations,
            vec![
                GraphMutation::MoveNode {
                    id: nid("v_a"),
                    position: Point::new(50.0, 0.0),
                },
                GraphMutation::MoveNode {
                    id: nid("v_b"),
                    position: Point::new(450.0, 0.0),
                },
            ]
        );
    }

    #[test]
    fn waypoint_beats_node_drag() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, true);
        vp.handle(&c, &down(302.0, 198.0));
        assert_eq!(
            vp.drag_state(),
            &DragState::DraggingWaypoint {
                edge: EdgeId::intern("v_ab"),
                index: 0,
            }
        );
        let out = vp.handle(&c, &InputEvent::pointer_move(340.0, 190.0));
        assert_eq!(
            out.mutations,
            vec![GraphMutation::MoveWaypoint {
                edge: EdgeId::intern("v_ab"),
                index: 0,
                position: Point::new(350.0, 200.0),
            }]
        );
    }

    #[test]
    fn collapse_toggle_works_in_both_modes_without_drag() {
        let g = scene();
        let sel = SelectionModel::new();
        for editor in [false, true] {
            let mut vp = Viewport::default();
            let c = ctx(&g, &sel, editor);
            let out = vp.handle(&c, &down(186.0, 14.0));
            assert_eq!(
                out.mutations,
                vec![GraphMutation::ToggleCollapsed { id: nid("v_a") }]
            );
            assert_eq!(vp.drag_state(), &DragState::Idle);
            assert!(vp.handle(&c, &InputEvent::pointer_up(186.0, 14.0)).is_empty());
        }
    }

    #[test]
    fn marquee_selects_contained_nodes_with_modifier_mode() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, true);
        vp.handle(&c, &down(-20.0, -20.0));
        vp.handle(&c, &InputEvent::pointer_move(250.0, 100.0));
        assert_eq!(vp.marquee(), Some(Bounds::new(-20.0, -20.0, 270.0, 120.0)));
        let out = vp.handle(
            &c,
            &InputEvent::PointerUp {
                x: 250.0,
                y: 100.0,
                modifiers: CTRL,
            },
        );
        assert_eq!(
            out.events,
            vec![ViewportEvent::MarqueeSelected {
                entities: vec![EntityRef::Node(nid("v_a"))],
                mode: SelectionMode::Add,
            }]
        );
        assert_eq!(vp.marquee(), None);
    }

    #[test]
    fn tiny_marquee_is_a_canvas_click() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, true);
        vp.handle(&c, &down(-50.0, -50.0));
        vp.handle(&c, &InputEvent::pointer_move(-46.0, -47.0));
        let out = vp.handle(&c, &InputEvent::pointer_up(-46.0, -47.0));
        assert!(matches!(
            out.events.as_slice(),
            [ViewportEvent::Clicked { target: None, .. }]
        ));
    }

    #[test]
    fn edge_draft_requests_edge_between_distinct_nodes() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let c = ctx(&g, &sel, true);
        let press = InputEvent::PointerDown {
            x: 50.0,
            y: 20.0,
            button: PointerButton::Secondary,
            modifiers: Modifiers::NONE,
        };
        vp.handle(&c, &press);
        vp.handle(&c, &InputEvent::pointer_move(450.0, 20.0));
        assert_eq!(
            vp.edge_draft(&g),
            Some((Point::new(100.0, 22.5), Point::new(450.0, 20.0)))
        );
        let out = vp.handle(&c, &InputEvent::pointer_up(450.0, 20.0));
        assert_eq!(
            out.events,
            vec![ViewportEvent::EdgeRequested {
                source: nid("v_a"),
                target: nid("v_b"),
            }]
        );

        vp.handle(&c, &press);
        let out = vp.handle(&c, &InputEvent::pointer_up(60.0, 20.0));
        assert!(out.is_empty());
    }

    #[test]
    fn double_click_inserts_waypoint_in_editor_only() {
        let mut g = StoryGraph::new();
        g.add_node(StoryNode::new(nid("v_d1"), "1", Point::new(0.0, 0.0)));
        g.add_node(StoryNode::new(nid("v_d2"), "2", Point::new(400.0, 0.0)));
        let mut e = StoryEdge::new(EdgeId::intern("v_d12"), nid("v_d1"), nid("v_d2"));
        e.waypoints.push(Point::new(300.0, 22.5));
        g.add_edge(e).unwrap();
        let sel = SelectionModel::new();

        let mut vp = Viewport::default();
        let dbl = InputEvent::DoubleClick { x: 250.0, y: 22.5 };
        assert!(vp.handle(&ctx(&g, &sel, false), &dbl).is_empty());
        let out = vp.handle(&ctx(&g, &sel, true), &dbl);
        assert_eq!(
            out.mutations,
            vec![GraphMutation::InsertWaypoint {
                edge: EdgeId::intern("v_d12"),
                index: usize::MAX,
                position: Point::new(250.0, 22.5),
            }]
        );

        vp.config.insert_waypoints_by_segment = true;
        let out = vp.handle(&ctx(&g, &sel, true), &dbl);
        assert!(matches!(
            out.mutations.as_slice(),
            [GraphMutation::InsertWaypoint { index: 0, .. }]
        ));
    }

    #[test]
    fn double_click_on_node_toggles_collapse() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let out = vp.handle(
            &ctx(&g, &sel, false),
            &InputEvent::DoubleClick { x: 40.0, y: 30.0 },
        );
        assert_eq!(
            out.mutations,
            vec![GraphMutation::ToggleCollapsed { id: nid("v_a") }]
        );
    }

    #[test]
    fn locked_decorations_are_not_dragged() {
        let mut g = StoryGraph::new();
        g.add_decoration(Decoration::rectangle(
            DecorationId::intern("v_deco"),
            Point::new(0.0, 0.0),
            100.0,
            100.0,
        ));
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        let mut c = ctx(&g, &sel, true);
        vp.handle(&c, &down(50.0, 50.0));
        assert!(matches!(vp.drag_state(), DragState::DraggingDecoration { .. }));
        vp.handle(&c, &InputEvent::pointer_up(50.0, 50.0));

        c.decorations_locked = true;
        vp.handle(&c, &down(50.0, 50.0));
        assert!(matches!(vp.drag_state(), DragState::Marquee { .. }));
    }

    #[test]
    fn wheel_keeps_cursor_anchor_and_cancels_animation() {
        let g = scene();
        let sel = SelectionModel::new();
        let mut vp = Viewport::default();
        vp.resize(800.0, 600.0);
        vp.center_on(Point::new(1000.0, 1000.0), 1.0, Point::default());
        let before = vp.world_from_screen(Point::new(120.0, 80.0));
        vp.handle(
            &ctx(&g, &sel, false),
            &InputEvent::Wheel {
                x: 120.0,
                y: 80.0,
                delta_y: -100.0,
            },
        );
        assert!(!vp.is_animating());
        let after = vp.world_from_screen(Point::new(120.0, 80.0));
        assert!(before.distance(after) < 1e-9);
        assert!(vp.camera.scale > 1.0);
    }

    #[test]
    fn animation_settles_on_target() {
        let mut vp = Viewport::default();
        vp.resize(800.0, 600.0);
        vp.center_on(Point::new(100.0, 50.0), 2.0, Point::default());
        let mut ticks = 0;
        while vp.tick_animation() {
            ticks += 1;
            assert!(ticks < 500, "animation never settled");
        }
        assert_eq!(vp.camera.scale, 2.0);
        let center = vp.camera.screen_from_world(Point::new(100.0, 50.0));
        assert!(center.distance(Point::new(400.0, 300.0)) < 1e-9);
    }
}
