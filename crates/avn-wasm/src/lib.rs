//! WASM bridge for AVN: exposes the story-graph session to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Every method that can
//! produce intents returns them as a JSON array such as
//! `[{"type":"play","id":"intro"}]`.

mod fetch;
mod render2d;

use avn_core::id::{EdgeId, NodeId};
use avn_core::media::{GatewayTable, find_playable, load_lyrics};
use avn_core::model::{Color, DecorationKind, EntityRef, SourceRef};
use avn_editor::input::{InputEvent, Modifiers, PointerButton};
use avn_editor::intent::{Intent, to_json};
use avn_editor::render_loop::RenderLoop;
use avn_editor::session::{Mode, Session};
use avn_editor::SessionConfig;
use avn_render::frame::Theme;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::CanvasRenderingContext2d;

/// The WASM-facing canvas controller.
///
/// Owns one session and its render loop. All interaction from the page
/// goes through this struct.
#[wasm_bindgen]
pub struct AvnCanvas {
    session: Session,
    render_loop: RenderLoop,
    dark_mode: bool,
}

#[wasm_bindgen]
impl AvnCanvas {
    /// Create a controller for a canvas of the given size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        console_log_setup();
        Self::with_seed(width, height, random_seed())
    }

    /// Create a controller with a fixed seed for the choice timeout.
    pub fn with_seed(width: f64, height: f64, seed: u64) -> Self {
        let mut session = Session::new(SessionConfig::default(), seed);
        session.resize(width, height);
        Self {
            session,
            render_loop: RenderLoop::new(),
            dark_mode: true,
        }
    }

    /// Replace session settings from JSON such as `{"viewport":{"gridSize":50}}`.
    /// The graph, walk, selection and mode are kept.
    pub fn configure(&mut self, json: &str) -> String {
        match SessionConfig::from_json(json) {
            Ok(config) => {
                self.session.set_config(config);
                self.render_loop.request_redraw();
                ok_json()
            }
            Err(e) => error_json(&e.to_string()),
        }
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Load a story document. Returns `{"ok":true,"intents":[...]}` or
    /// `{"ok":false,"error":"..."}`.
    pub fn load_document(&mut self, json: &str) -> String {
        match self.session.load_document(json) {
            Ok(intents) => {
                self.render_loop.request_redraw();
                serde_json::json!({ "ok": true, "intents": intents }).to_string()
            }
            Err(e) => {
                log::error!("document rejected: {e}");
                error_json(&e.to_string())
            }
        }
    }

    /// Returns `{"ok":true,"document":"..."}` or an error object.
    pub fn export_document(&self) -> String {
        match self.session.export_document() {
            Ok(doc) => serde_json::json!({ "ok": true, "document": doc }).to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Paint one frame. Call once per `requestAnimationFrame`.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d, time_ms: f64) {
        let theme = if self.dark_mode {
            Theme::dark()
        } else {
            Theme::light()
        };
        let mut painter = render2d::CanvasPainter::new(ctx, theme);
        self.render_loop.tick(&mut self.session, &mut painter, time_ms);
    }

    pub fn needs_redraw(&self) -> bool {
        self.render_loop.needs_redraw() || self.session.viewport.is_animating()
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
        self.render_loop.request_redraw();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
        self.render_loop.request_redraw();
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// `button` is `MouseEvent.button`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        self.input(InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        })
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> String {
        self.input(InputEvent::PointerMove { x, y })
    }

    pub fn handle_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        self.input(InputEvent::PointerUp {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        })
    }

    pub fn handle_double_click(&mut self, x: f64, y: f64) -> String {
        self.input(InputEvent::DoubleClick { x, y })
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> String {
        self.input(InputEvent::Wheel { x, y, delta_y })
    }

    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        self.input(InputEvent::Key {
            key: key.to_string(),
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        })
    }

    // ─── Mode & playback ─────────────────────────────────────────────────

    pub fn set_editor_mode(&mut self, editor: bool) -> String {
        let mode = if editor { Mode::Editor } else { Mode::Player };
        let intents = self.session.set_mode(mode);
        self.emit(intents)
    }

    pub fn is_editor_mode(&self) -> bool {
        self.session.is_editor()
    }

    pub fn set_follow(&mut self, enabled: bool) -> String {
        let intents = self.session.set_follow(enabled);
        self.emit(intents)
    }

    pub fn start_from_node(&mut self, id: &str) -> String {
        let intents = self.session.start_from_node(NodeId::intern(id));
        self.emit(intents)
    }

    pub fn advance(&mut self) -> String {
        let intents = self.session.advance();
        self.emit(intents)
    }

    pub fn go_back(&mut self) -> String {
        let intents = self.session.go_back();
        self.emit(intents)
    }

    /// The page's audio element reached the end of the track.
    pub fn track_ended(&mut self) -> String {
        let intents = self.session.track_ended();
        self.emit(intents)
    }

    /// One-second timer tick for the prompt opened with `handle`.
    pub fn prompt_tick(&mut self, handle: f64) -> String {
        let intents = self.session.prompt_tick(handle as u64);
        self.emit(intents)
    }

    pub fn choose(&mut self, handle: f64, index: usize) -> String {
        let intents = self.session.choose(handle as u64, index);
        self.emit(intents)
    }

    pub fn cancel_choice(&mut self, handle: f64) -> String {
        let intents = self.session.cancel_choice(handle as u64);
        self.emit(intents)
    }

    /// Milliseconds between prompt ticks.
    pub fn choice_tick_ms(&self) -> u32 {
        self.session.config().choice_tick_ms
    }

    /// Resolved audio URLs for a recording as a JSON array.
    pub fn audio_candidates(&self, id: &str) -> String {
        serde_json::to_string(&self.session.audio_candidates(NodeId::intern(id)))
            .unwrap_or_else(|_| "[]".to_string())
    }

    pub fn cover_candidates(&self, id: &str) -> String {
        serde_json::to_string(&self.session.cover_candidates(NodeId::intern(id)))
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Resolves to the first audio URL of `id` that answers a probe, or
    /// `null` when none does.
    pub fn find_playable_audio(&self, id: &str) -> js_sys::Promise {
        let resolver = self.resolver();
        let sources = self
            .session
            .graph
            .get_by_id(NodeId::intern(id))
            .map(|n| n.audio.clone())
            .unwrap_or_default();
        future_to_promise(async move {
            Ok(match find_playable(&resolver, &sources).await {
                Some(url) => JsValue::from_str(&url),
                None => JsValue::NULL,
            })
        })
    }

    /// Resolves to the lyrics text of `id`, or the placeholder shown when
    /// there are none or they failed to load.
    pub fn load_lyrics(&self, id: &str) -> js_sys::Promise {
        let resolver = self.resolver();
        let source = self
            .session
            .graph
            .get_by_id(NodeId::intern(id))
            .and_then(|n| n.lyrics.clone());
        future_to_promise(async move {
            let state = load_lyrics(&resolver, source.as_ref()).await;
            Ok(JsValue::from_str(state.display_text()))
        })
    }

    // ─── Editor commands ─────────────────────────────────────────────────

    pub fn create_node(&mut self) -> String {
        let intents = self.session.create_node();
        self.emit(intents)
    }

    pub fn create_rectangle(&mut self) -> String {
        let intents = self.session.create_rectangle();
        self.emit(intents)
    }

    pub fn create_text(&mut self) -> String {
        let intents = self.session.create_text();
        self.emit(intents)
    }

    pub fn create_edge(&mut self, source: &str, target: &str) -> String {
        let intents = self
            .session
            .create_edge(NodeId::intern(source), NodeId::intern(target));
        self.emit(intents)
    }

    pub fn delete_selection(&mut self) -> String {
        let intents = self.session.delete_selection();
        self.emit(intents)
    }

    pub fn collapse_all(&mut self) -> String {
        let intents = self.session.set_all_collapsed(true);
        self.emit(intents)
    }

    pub fn expand_all(&mut self) -> String {
        let intents = self.session.set_all_collapsed(false);
        self.emit(intents)
    }

    pub fn toggle_decoration_lock(&mut self) -> String {
        let intents = self.session.toggle_decoration_lock();
        self.emit(intents)
    }

    pub fn decorations_locked(&self) -> bool {
        self.session.decorations_locked()
    }

    pub fn select_all(&mut self) -> String {
        let intents = self.session.select_all();
        self.emit(intents)
    }

    pub fn update_node_title(&mut self, id: &str, title: &str) -> String {
        let intents = self.session.update_node_title(NodeId::intern(id), title);
        self.emit(intents)
    }

    /// `json` is `{"audio":[...],"cover":[...],"lyrics":{...}|null}` with
    /// sources shaped like `{"type":"ipfs","value":"bafy..."}`.
    pub fn update_node_sources(&mut self, id: &str, json: &str) -> String {
        #[derive(Deserialize)]
        struct Sources {
            #[serde(default)]
            audio: Vec<SourceRef>,
            #[serde(default)]
            cover: Vec<SourceRef>,
            #[serde(default)]
            lyrics: Option<SourceRef>,
        }
        match serde_json::from_str::<Sources>(json) {
            Ok(s) => {
                let intents =
                    self.session
                        .update_node_sources(NodeId::intern(id), s.audio, s.cover, s.lyrics);
                self.emit(intents)
            }
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn update_edge_label(&mut self, id: &str, label: &str) -> String {
        let intents = self.session.update_edge_label(EdgeId::intern(id), label);
        self.emit(intents)
    }

    /// An empty or invalid `color` resets the path to the theme color.
    pub fn update_edge_style(&mut self, id: &str, color: &str, line_width: f64) -> String {
        let intents =
            self.session
                .update_edge_style(EdgeId::intern(id), Color::from_hex(color), line_width);
        self.emit(intents)
    }

    /// Properties of the single selected entity for the inspector panel.
    /// Returns `{}` unless exactly one entity is selected.
    pub fn get_selected_props(&self) -> String {
        let graph = &self.session.graph;
        let props = match self.session.selection().primary() {
            Some(EntityRef::Node(id)) => graph.get_by_id(id).map(|n| {
                serde_json::json!({
                    "kind": "recording",
                    "id": n.id,
                    "title": n.title,
                    "collapsed": n.collapsed,
                    "audio": n.audio,
                    "cover": n.cover,
                    "lyrics": n.lyrics,
                    "customLinks": n.custom_links,
                })
            }),
            Some(EntityRef::Edge(id)) => graph.edge(id).map(|e| {
                serde_json::json!({
                    "kind": "path",
                    "id": e.id,
                    "source": e.source,
                    "target": e.target,
                    "label": e.label,
                    "color": e.color.map(|c| c.to_hex()),
                    "lineWidth": e.line_width,
                    "waypoints": e.waypoints.len(),
                })
            }),
            Some(EntityRef::Decoration(id)) => graph.decoration(id).map(|d| match &d.kind {
                DecorationKind::Rectangle {
                    width,
                    height,
                    fill,
                } => serde_json::json!({
                    "kind": "rectangle",
                    "id": d.id,
                    "width": width,
                    "height": height,
                    "backgroundColor": fill.to_hex(),
                }),
                DecorationKind::Text {
                    content,
                    font_size,
                    color,
                    width,
                } => serde_json::json!({
                    "kind": "text",
                    "id": d.id,
                    "textContent": content,
                    "fontSize": font_size,
                    "color": color.to_hex(),
                    "width": width,
                }),
            }),
            None => None,
        };
        props.map_or_else(|| "{}".to_string(), |p| p.to_string())
    }
}

impl AvnCanvas {
    fn resolver(&self) -> fetch::FetchResolver {
        fetch::FetchResolver::new(GatewayTable::from_meta(&self.session.graph.meta))
    }

    fn input(&mut self, event: InputEvent) -> String {
        let intents = self.session.handle_input(&event);
        self.render_loop.request_redraw();
        to_json(&intents)
    }

    fn emit(&mut self, intents: Vec<Intent>) -> String {
        if !intents.is_empty() {
            self.render_loop.request_redraw();
        }
        to_json(&intents)
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────

fn ok_json() -> String {
    r#"{"ok":true}"#.to_string()
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "ok": false, "error": message }).to_string()
}

// ─── Browser glue ────────────────────────────────────────────────────────

fn random_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * u32::MAX as f64) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("AVN WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// `log` backend that writes to the browser console.
#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg: JsValue = format!("[{}] {}", record.target(), record.args()).into();
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_log_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    }
}

/// Lower or raise console verbosity: `"error"`, `"warn"`, `"info"`,
/// `"debug"` or `"trace"`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);
    log::set_max_level(filter);
}

/// `m:ss` label for the player's elapsed and total time.
#[wasm_bindgen]
pub fn format_timestamp(seconds: f64) -> String {
    avn_core::media::format_timestamp(seconds)
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Validate a story document. Returns `{"ok":true}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(source: &str) -> String {
    match avn_core::parse_document(source) {
        Ok(_) => ok_json(),
        Err(e) => error_json(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"{ "@graph": [
        { "@type": "MusicRecording", "@id": "w_a", "name": "A", "position": { "x": 0, "y": 0 } },
        { "@type": "MusicRecording", "@id": "w_b", "name": "B", "position": { "x": 400, "y": 0 } },
        { "@type": "Path", "@id": "w_ab", "source": "w_a", "target": "w_b" }
    ] }"#;

    fn canvas() -> AvnCanvas {
        let mut c = AvnCanvas::with_seed(800.0, 600.0, 1);
        let loaded: serde_json::Value = serde_json::from_str(&c.load_document(DOC)).unwrap();
        assert_eq!(loaded["ok"], true);
        c
    }

    #[test]
    fn click_returns_play_intents() {
        let mut c = canvas();
        c.handle_pointer_down(20.0, 20.0, 0, false, false, false, false);
        let json = c.handle_pointer_up(20.0, 20.0, false, false, false, false);
        let intents: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(intents[0]["type"], "highlight");
        assert_eq!(intents[1]["type"], "play");
        assert_eq!(intents[1]["id"], "w_a");
    }

    #[test]
    fn bad_documents_report_errors() {
        let mut c = canvas();
        let out: serde_json::Value = serde_json::from_str(&c.load_document("{nope")).unwrap();
        assert_eq!(out["ok"], false);
        assert!(out["error"].as_str().is_some());
        assert_eq!(validate(DOC), r#"{"ok":true}"#);
    }

    #[test]
    fn configure_keeps_the_running_walk() {
        let mut c = canvas();
        c.start_from_node("w_a");
        assert_eq!(c.configure(r#"{"choiceTicks":3}"#), r#"{"ok":true}"#);
        assert_eq!(c.session.traversal().current(), Some(NodeId::intern("w_a")));
        assert_eq!(c.session.graph.highlighted_node(), Some(NodeId::intern("w_a")));
        assert_eq!(c.session.config().choice_ticks, 3);

        let out: serde_json::Value = serde_json::from_str(&c.configure("{nope")).unwrap();
        assert_eq!(out["ok"], false);
    }

    #[test]
    fn inspector_props_for_selected_path() {
        let mut c = canvas();
        c.set_editor_mode(true);
        c.select_all();
        assert_eq!(c.get_selected_props(), "{}");

        let intents: serde_json::Value = serde_json::from_str(&c.create_edge("w_b", "w_a")).unwrap();
        assert_eq!(intents[0]["type"], "graphChanged");
        let props: serde_json::Value = serde_json::from_str(&c.get_selected_props()).unwrap();
        assert_eq!(props["kind"], "path");
        assert_eq!(props["source"], "w_b");
        assert_eq!(props["target"], "w_a");

        c.update_edge_style("w_ab", "#00ff00", 4.0);
        assert!(c.export_document().contains("#00ff00"));
    }
}
