pub mod camera;
pub mod document;
pub mod geometry;
pub mod id;
pub mod media;
pub mod model;

pub use camera::Camera;
pub use document::{DocumentError, emit_document, parse_document};
pub use id::{DecorationId, EdgeId, NodeId};
pub use media::{GatewayTable, LyricsState, MediaError, MediaResolver};
pub use model::*;

// Re-export petgraph index types so downstream crates don't need a direct dependency
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
