//! Canvas2D renderer.
//!
//! Paints a [`Frame`] to an HTML `<canvas>` via `CanvasRenderingContext2d`.
//! World content is drawn under a single camera transform; the grid and
//! background are drawn in screen space.

use avn_core::geometry::{
    NODE_WIDTH, TEXT_LINE_HEIGHT, content_bounds, decoration_bounds, edge_path, header_bounds,
    node_bounds, path_midpoint, toggle_bounds,
};
use avn_core::model::{Bounds, Color, Decoration, DecorationKind, StoryEdge, StoryGraph, StoryNode};
use avn_render::frame::{Frame, FrameSink, Theme};
use web_sys::CanvasRenderingContext2d;

const GRID_SPACING: f64 = 25.0;
const NODE_RADIUS: f64 = 6.0;
const WAYPOINT_RADIUS: f64 = 5.0;
const ARROW_LENGTH: f64 = 12.0;
const ARROW_HALF_WIDTH: f64 = 6.0;
const TITLE_FONT: &str = "600 14px Inter, sans-serif";
const LABEL_FONT: &str = "500 12px Inter, sans-serif";
const TITLE_PADDING: f64 = 10.0;

/// Paints frames into a 2D canvas context.
pub struct CanvasPainter<'c> {
    ctx: &'c CanvasRenderingContext2d,
    theme: Theme,
}

impl<'c> CanvasPainter<'c> {
    pub fn new(ctx: &'c CanvasRenderingContext2d, theme: Theme) -> Self {
        Self { ctx, theme }
    }
}

impl FrameSink for CanvasPainter<'_> {
    fn paint(&mut self, frame: &Frame<'_>) {
        render_frame(self.ctx, frame, &self.theme);
    }
}

pub fn render_frame(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>, theme: &Theme) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(&css(theme.background));
    ctx.fill_rect(0.0, 0.0, frame.width, frame.height);
    if frame.detailed() {
        draw_grid(ctx, frame, theme);
    }

    let cam = frame.camera;
    let _ = ctx.set_transform(cam.scale, 0.0, 0.0, cam.scale, cam.offset.x, cam.offset.y);
    let graph = frame.graph;
    let detailed = frame.detailed();

    if detailed {
        for deco in &graph.decorations {
            draw_decoration(ctx, deco, theme);
        }
    }
    for edge in graph.edges() {
        draw_edge(ctx, graph, edge, detailed, theme);
    }
    if frame.editor {
        draw_waypoints(ctx, graph, theme);
    }
    for node in graph.nodes() {
        draw_node(ctx, node, detailed, theme);
    }

    if let Some((from, to)) = frame.edge_draft {
        ctx.save();
        ctx.set_stroke_style_str(&css(theme.selection));
        ctx.set_line_width(2.0 / cam.scale);
        set_dash(ctx, 6.0 / cam.scale, 4.0 / cam.scale);
        ctx.begin_path();
        ctx.move_to(from.x, from.y);
        ctx.line_to(to.x, to.y);
        ctx.stroke();
        ctx.restore();
    }
    if let Some(m) = frame.marquee {
        draw_marquee(ctx, &m, cam.scale, theme);
    }

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
}

// ─── Entities ────────────────────────────────────────────────────────────

fn draw_decoration(ctx: &CanvasRenderingContext2d, deco: &Decoration, theme: &Theme) {
    let b = decoration_bounds(deco);
    ctx.save();
    match &deco.kind {
        DecorationKind::Rectangle { fill, .. } => {
            ctx.set_fill_style_str(&css(*fill));
            ctx.fill_rect(b.x, b.y, b.width, b.height);
        }
        DecorationKind::Text {
            content,
            font_size,
            color,
            ..
        } => {
            ctx.set_font(&format!("{font_size}px Inter, sans-serif"));
            ctx.set_fill_style_str(&css(*color));
            ctx.set_text_baseline("top");
            for (i, line) in content.lines().enumerate() {
                let y = b.y + i as f64 * font_size * TEXT_LINE_HEIGHT;
                let _ = ctx.fill_text_with_max_width(line, b.x, y, b.width);
            }
        }
    }
    if deco.selected {
        ctx.set_stroke_style_str(&css(theme.selection));
        ctx.set_line_width(2.0);
        ctx.stroke_rect(b.x, b.y, b.width, b.height);
    }
    ctx.restore();
}

fn draw_edge(
    ctx: &CanvasRenderingContext2d,
    graph: &StoryGraph,
    edge: &StoryEdge,
    detailed: bool,
    theme: &Theme,
) {
    let (Some(src), Some(dst)) = (graph.get_by_id(edge.source), graph.get_by_id(edge.target)) else {
        return;
    };
    let points = edge_path(src, dst, edge);
    let [first, .., prev, last] = points.as_slice() else {
        return;
    };

    let color = if edge.highlighted {
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
    let stroke = css(color);

    ctx.save();
    ctx.set_stroke_style_str(&stroke);
    ctx.set_line_width(width);
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in &points[1..] {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();

    let (dx, dy) = (last.x - prev.x, last.y - prev.y);
    let len = dx.hypot(dy);
    if len > f64::EPSILON {
        let (ux, uy) = (dx / len, dy / len);
        let (bx, by) = (last.x - ux * ARROW_LENGTH, last.y - uy * ARROW_LENGTH);
        ctx.set_fill_style_str(&stroke);
        ctx.begin_path();
        ctx.move_to(last.x, last.y);
        ctx.line_to(bx - uy * ARROW_HALF_WIDTH, by + ux * ARROW_HALF_WIDTH);
        ctx.line_to(bx + uy * ARROW_HALF_WIDTH, by - ux * ARROW_HALF_WIDTH);
        ctx.close_path();
        ctx.fill();
    }

    if detailed
        && let Some(label) = edge.display_label()
        && let Some(mid) = path_midpoint(&points)
    {
        ctx.set_font(LABEL_FONT);
        ctx.set_text_align("center");
        ctx.set_text_baseline("bottom");
        ctx.set_fill_style_str(&css(theme.node_text));
        let _ = ctx.fill_text(label, mid.x, mid.y - 4.0);
    }
    ctx.restore();
}

fn draw_waypoints(ctx: &CanvasRenderingContext2d, graph: &StoryGraph, theme: &Theme) {
    ctx.save();
    ctx.set_fill_style_str(&css(theme.waypoint));
    for edge in graph.edges() {
        for w in &edge.waypoints {
            ctx.begin_path();
            let _ = ctx.arc(w.x, w.y, WAYPOINT_RADIUS, 0.0, std::f64::consts::TAU);
            ctx.fill();
        }
    }
    ctx.restore();
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &StoryNode, detailed: bool, theme: &Theme) {
    let body = node_bounds(node);
    ctx.save();

    rounded_rect_path(ctx, &body, NODE_RADIUS);
    ctx.set_fill_style_str(&css(theme.node_body));
    ctx.fill();

    if detailed && let Some(content) = content_bounds(node) {
        // Cover art is decoded by the page; show the slot.
        ctx.set_fill_style_str(&css(theme.node_header));
        ctx.set_global_alpha(0.6);
        ctx.fill_rect(content.x, content.y, content.width, content.height);
        ctx.set_global_alpha(1.0);
    }

    let header = header_bounds(node);
    ctx.set_fill_style_str(&css(theme.node_header));
    ctx.fill_rect(header.x, header.y, header.width, header.height);

    let toggle = toggle_bounds(node);
    ctx.set_fill_style_str(&css(theme.toggle));
    ctx.fill_rect(toggle.x, toggle.y, toggle.width, toggle.height);

    if detailed {
        ctx.set_font(TITLE_FONT);
        ctx.set_fill_style_str(&css(theme.node_text));
        ctx.set_text_align("left");
        ctx.set_text_baseline("middle");
        let room = NODE_WIDTH - TITLE_PADDING * 2.0 - toggle.width;
        let title = fit_text(ctx, &node.title, room);
        let _ = ctx.fill_text(&title, header.x + TITLE_PADDING, header.y + header.height / 2.0);

        ctx.set_text_align("center");
        ctx.set_fill_style_str(&css(theme.node_body));
        let glyph = if node.collapsed { "+" } else { "−" };
        let c = toggle.center();
        let _ = ctx.fill_text(glyph, c.x, c.y);
    }

    let outline = if node.highlighted {
        Some(theme.highlight)
    } else if node.selected {
        Some(theme.selection)
    } else {
        None
    };
    if let Some(c) = outline {
        ctx.set_stroke_style_str(&css(c));
        ctx.set_line_width(3.0);
        rounded_rect_path(ctx, &body, NODE_RADIUS);
        ctx.stroke();
    }
    ctx.restore();
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, m: &Bounds, scale: f64, theme: &Theme) {
    if m.width * scale < 1.0 && m.height * scale < 1.0 {
        return;
    }
    ctx.save();
    ctx.set_fill_style_str(&css(theme.marquee_fill));
    ctx.fill_rect(m.x, m.y, m.width, m.height);
    ctx.set_stroke_style_str(&css(theme.marquee_stroke));
    ctx.set_line_width(1.0 / scale);
    set_dash(ctx, 4.0 / scale, 4.0 / scale);
    ctx.stroke_rect(m.x, m.y, m.width, m.height);
    ctx.restore();
}

// ─── Screen-space ────────────────────────────────────────────────────────

fn draw_grid(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>, theme: &Theme) {
    let cam = frame.camera;
    let spacing = GRID_SPACING * cam.scale;
    if spacing < 8.0 {
        return;
    }
    ctx.set_fill_style_str(&css(theme.grid));
    let mut x = cam.offset.x.rem_euclid(spacing);
    while x < frame.width {
        let mut y = cam.offset.y.rem_euclid(spacing);
        while y < frame.height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, b: &Bounds, r: f64) {
    let (x, y, w, h) = (b.x, b.y, b.width, b.height);
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

fn set_dash(ctx: &CanvasRenderingContext2d, on: f64, off: f64) {
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(on),
        &wasm_bindgen::JsValue::from_f64(off),
    ));
}

/// Truncate `text` with an ellipsis until it fits `max_width`.
fn fit_text(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> String {
    let width = |s: &str| ctx.measure_text(s).map_or(0.0, |m| m.width());
    if width(text) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "…";
        if width(&candidate) <= max_width {
            return candidate;
        }
    }
    "…".to_string()
}

/// CSS `rgba()` string for a model color.
pub fn css(c: Color) -> String {
    let [r, g, b, _] = c.to_rgba8();
    let a = (c.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
    format!("rgba({r}, {g}, {b}, {a})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn css_colors() {
        assert_eq!(css(Color::rgba(1.0, 0.843, 0.0, 1.0)), "rgba(255, 215, 0, 1)");
        assert_eq!(
            css(Color::from_hex("#33333380").unwrap()),
            "rgba(51, 51, 51, 0.502)"
        );
    }
}
