//! JSON-LD graph document: loading and writing.
//!
//! ```json
//! {
//!   "@context": "https://schema.org/",
//!   "meta": { "gateways": ["https://cloudflare-ipfs.com/ipfs/"] },
//!   "@graph": [
//!     { "@type": "MusicRecording", "@id": "intro", "name": "Intro",
//!       "position": { "x": 0, "y": 0 }, "audioSources": [{ "type": "ipfs", "value": "bafy..." }] },
//!     { "@type": "Path", "source": "intro", "target": "verse", "label": "Go on" }
//!   ]
//! }
//! ```
//!
//! Loading is lenient: unknown `@type`s are skipped, malformed items are
//! dropped with a warning, and paths whose endpoints do not resolve are
//! kept aside so writing the document back loses nothing.

use crate::id::{DecorationId, EdgeId, NodeId};
use crate::model::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SCHEMA_CONTEXT: &str = "https://schema.org/";

/// Columns of the fallback grid used for recordings without a position.
const FALLBACK_COLUMNS: usize = 4;
const FALLBACK_SPACING_X: f64 = 250.0;
const FALLBACK_SPACING_Y: f64 = 200.0;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,
    #[error("malformed graph document: {0}")]
    Json(#[from] serde_json::Error),
}

// ─── Wire shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
struct RawDocument {
    #[serde(rename = "@context", default = "default_context")]
    context: Value,
    #[serde(default)]
    meta: GraphMeta,
    #[serde(rename = "@graph", default)]
    graph: Vec<Value>,
}

fn default_context() -> Value {
    Value::String(SCHEMA_CONTEXT.to_string())
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "@type")]
enum RawItem {
    MusicRecording(RawRecording),
    Path(RawPath),
    Rectangle(RawRectangle),
    TextLabel(RawText),
}

const KNOWN_TYPES: [&str; 4] = ["MusicRecording", "Path", "Rectangle", "TextLabel"];

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawRecording {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    audio_sources: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cover_sources: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lyrics_source: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    custom_links: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawPath {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    source: String,
    target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    control_points: Vec<Point>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawRectangle {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    position: Point,
    width: f64,
    height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawText {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    position: Point,
    #[serde(default)]
    text_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
}

// ─── Loading ─────────────────────────────────────────────────────────────

fn parse_source(value: &Value) -> Option<SourceRef> {
    match serde_json::from_value::<SourceRef>(value.clone()) {
        Ok(src) if !src.value.is_empty() => Some(src),
        Ok(_) => None,
        Err(e) => {
            log::warn!("ignoring media source {value}: {e}");
            None
        }
    }
}

fn fallback_position(ordinal: usize) -> Point {
    Point::new(
        (ordinal % FALLBACK_COLUMNS) as f64 * FALLBACK_SPACING_X,
        (ordinal / FALLBACK_COLUMNS) as f64 * FALLBACK_SPACING_Y,
    )
}

fn recording_to_node(raw: RawRecording, ordinal: usize) -> StoryNode {
    let position = raw.position.unwrap_or_else(|| fallback_position(ordinal));
    let mut node = StoryNode::new(
        NodeId::intern(&raw.id),
        raw.name.unwrap_or_else(|| "Untitled".to_string()),
        position,
    );
    node.collapsed = raw.is_collapsed.unwrap_or(true);
    node.audio = raw.audio_sources.iter().filter_map(parse_source).collect();
    node.cover = raw.cover_sources.iter().filter_map(parse_source).collect();
    node.lyrics = raw.lyrics_source.as_ref().and_then(parse_source);
    node.custom_links = raw.custom_links;
    node
}

fn path_to_edge(raw: RawPath) -> StoryEdge {
    let id = match raw.id.as_deref() {
        Some(id) if !id.is_empty() => EdgeId::intern(id),
        _ => EdgeId::with_prefix("edge"),
    };
    let mut edge = StoryEdge::new(id, NodeId::intern(&raw.source), NodeId::intern(&raw.target));
    edge.label = raw.label;
    edge.color = raw.color.as_deref().and_then(Color::from_hex);
    edge.line_width = raw.line_width.unwrap_or(DEFAULT_LINE_WIDTH);
    edge.waypoints = raw.control_points.into_iter().collect();
    edge
}

/// Parse a graph document.
///
/// Recordings are inserted first so paths may reference recordings that
/// appear later in `@graph`.
pub fn parse_document(input: &str) -> Result<StoryGraph, DocumentError> {
    if input.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    let raw: RawDocument = serde_json::from_str(input)?;

    let mut graph = StoryGraph::new();
    graph.meta = raw.meta;
    if graph.meta.gateways.is_empty() {
        graph.meta = GraphMeta::default();
    }

    let mut paths = Vec::new();
    let mut ordinal = 0;
    for (index, value) in raw.graph.into_iter().enumerate() {
        let ty = value.get("@type").and_then(Value::as_str).unwrap_or("");
        if !KNOWN_TYPES.contains(&ty) {
            log::debug!("skipping @graph[{index}] of type {ty:?}");
            continue;
        }
        let item = match serde_json::from_value::<RawItem>(value) {
            Ok(item) => item,
            Err(e) => {
                log::warn!("dropping malformed @graph[{index}]: {e}");
                continue;
            }
        };
        match item {
            RawItem::MusicRecording(rec) => {
                graph.add_node(recording_to_node(rec, ordinal));
                ordinal += 1;
            }
            RawItem::Path(path) => paths.push(path),
            RawItem::Rectangle(rect) => {
                let mut deco = Decoration::rectangle(
                    DecorationId::intern(&rect.id),
                    rect.position,
                    rect.width,
                    rect.height,
                );
                if let (DecorationKind::Rectangle { fill, .. }, Some(c)) = (
                    &mut deco.kind,
                    rect.background_color.as_deref().and_then(Color::from_hex),
                ) {
                    *fill = c;
                }
                graph.add_decoration(deco);
            }
            RawItem::TextLabel(text) => {
                let mut deco =
                    Decoration::text(DecorationId::intern(&text.id), text.position, text.text_content);
                if let DecorationKind::Text {
                    font_size,
                    color,
                    width,
                    ..
                } = &mut deco.kind
                {
                    if let Some(size) = text.font_size {
                        *font_size = size;
                    }
                    if let Some(c) = text.color.as_deref().and_then(Color::from_hex) {
                        *color = c;
                    }
                    if let Some(w) = text.width {
                        *width = w;
                    }
                }
                graph.add_decoration(deco);
            }
        }
    }

    for path in paths {
        if let Err(edge) = graph.add_edge(path_to_edge(path)) {
            log::warn!(
                "path {:?} ({} -> {}) does not resolve; kept unrendered",
                edge.id,
                edge.source,
                edge.target
            );
            graph.unresolved_edges.push(edge);
        }
    }

    log::info!(
        "loaded story graph: {} recordings, {} paths, {} decorations",
        graph.node_count(),
        graph.edge_count(),
        graph.decorations.len()
    );
    Ok(graph)
}

// ─── Writing ─────────────────────────────────────────────────────────────

fn source_value(src: &SourceRef) -> Value {
    serde_json::to_value(src).unwrap_or(Value::Null)
}

fn node_to_recording(node: &StoryNode) -> RawRecording {
    RawRecording {
        id: node.id.as_str().to_string(),
        name: Some(node.title.clone()),
        position: Some(node.position),
        is_collapsed: Some(node.collapsed),
        audio_sources: node.audio.iter().map(source_value).collect(),
        cover_sources: node.cover.iter().map(source_value).collect(),
        lyrics_source: node.lyrics.as_ref().map(source_value),
        custom_links: node.custom_links.clone(),
    }
}

fn edge_to_path(edge: &StoryEdge) -> RawPath {
    RawPath {
        id: Some(edge.id.as_str().to_string()),
        source: edge.source.as_str().to_string(),
        target: edge.target.as_str().to_string(),
        label: edge.label.clone(),
        color: edge.color.map(|c| c.to_hex()),
        line_width: Some(edge.line_width),
        control_points: edge.waypoints.to_vec(),
    }
}

fn decoration_to_item(deco: &Decoration) -> RawItem {
    let id = deco.id.as_str().to_string();
    match &deco.kind {
        DecorationKind::Rectangle {
            width,
            height,
            fill,
        } => RawItem::Rectangle(RawRectangle {
            id,
            position: deco.position,
            width: *width,
            height: *height,
            background_color: Some(fill.to_hex()),
        }),
        DecorationKind::Text {
            content,
            font_size,
            color,
            width,
        } => RawItem::TextLabel(RawText {
            id,
            position: deco.position,
            text_content: content.clone(),
            font_size: Some(*font_size),
            color: Some(color.to_hex()),
            width: Some(*width),
        }),
    }
}

/// Write the graph back out as a pretty-printed document.
pub fn emit_document(graph: &StoryGraph) -> Result<String, DocumentError> {
    let mut items = Vec::with_capacity(
        graph.node_count() + graph.edge_count() + graph.unresolved_edges.len(),
    );
    items.extend(graph.nodes().map(|n| RawItem::MusicRecording(node_to_recording(n))));
    items.extend(
        graph
            .edges()
            .chain(graph.unresolved_edges.iter())
            .map(|e| RawItem::Path(edge_to_path(e))),
    );
    items.extend(graph.decorations.iter().map(decoration_to_item));

    let doc = RawDocument {
        context: default_context(),
        meta: graph.meta.clone(),
        graph: items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
