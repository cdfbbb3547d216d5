//! Intents: what the engine asks the UI shell to do.
//!
//! Serialized for the browser bridge as `{"type": "play", "id": "intro"}`.

use avn_core::id::{DecorationId, EdgeId, NodeId};
use avn_core::model::Point;
use serde::Serialize;

/// One selectable branch of a choice prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub index: usize,
    pub edge: EdgeId,
    pub target: NodeId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    /// The traversal position moved. Highlight flags have already been
    /// rewritten when the session emits this.
    #[serde(rename_all = "camelCase")]
    Highlight {
        current: Option<NodeId>,
        previous: Option<NodeId>,
        edge: Option<EdgeId>,
    },
    /// Camera should follow `id`, keeping it `offset` pixels from the
    /// viewport center at `scale`.
    CenterOnNode { id: NodeId, scale: f64, offset: Point },
    Play { id: NodeId },
    Stop,
    TogglePlay,
    #[serde(rename_all = "camelCase")]
    ShowChoices {
        handle: u64,
        options: Vec<ChoiceOption>,
        seconds: u32,
    },
    CountdownTick { handle: u64, remaining: u32 },
    HideChoices { handle: u64 },
    OpenNodeInspector { id: NodeId },
    OpenEdgeInspector { id: EdgeId },
    OpenDecorationInspector { id: DecorationId },
    CloseInspector,
    ModeChanged { editor: bool },
    FollowChanged { enabled: bool },
    SelectionChanged { count: usize },
    /// The graph was edited and should be persisted by the host.
    GraphChanged,
}

pub fn to_json(intents: &[Intent]) -> String {
    serde_json::to_string(intents).unwrap_or_else(|e| {
        log::error!("failed to serialize intents: {e}");
        "[]".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_serialize_with_type_tag() {
        let json = to_json(&[
            Intent::Play {
                id: NodeId::intern("in_a"),
            },
            Intent::Highlight {
                current: None,
                previous: Some(NodeId::intern("in_a")),
                edge: None,
            },
            Intent::Stop,
        ]);
        assert_eq!(
            json,
            r#"[{"type":"play","id":"in_a"},{"type":"highlight","current":null,"previous":"in_a","edge":null},{"type":"stop"}]"#
        );
    }
}
