//! Integration tests: async media resolution against a scripted host.

use avn_core::media::{LyricsState, find_playable, load_lyrics};
use avn_core::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::HashMap;

/// Host double: answers probes and fetches from fixed tables and records
/// every URL it was asked about.
struct ScriptedHost {
    table: GatewayTable,
    reachable: Vec<&'static str>,
    texts: HashMap<&'static str, &'static str>,
    probed: RefCell<Vec<String>>,
}

impl ScriptedHost {
    fn new(reachable: Vec<&'static str>) -> Self {
        Self {
            table: GatewayTable::new(vec!["https://gw.test/ipfs/".into()]),
            reachable,
            texts: HashMap::new(),
            probed: RefCell::new(Vec::new()),
        }
    }
}

impl MediaResolver for ScriptedHost {
    fn resolve_url(&self, source: &SourceRef) -> Result<String, MediaError> {
        self.table.resolve(source)
    }

    async fn probe(&self, url: &str) -> Result<(), MediaError> {
        self.probed.borrow_mut().push(url.to_string());
        if self.reachable.contains(&url) {
            Ok(())
        } else {
            Err(MediaError::Unreachable {
                url: url.to_string(),
                reason: "HEAD failed".into(),
            })
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, MediaError> {
        self.texts
            .get(url)
            .map(|t| t.to_string())
            .ok_or(MediaError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

#[tokio::test]
async fn first_reachable_source_wins() {
    let host = ScriptedHost::new(vec!["https://cdn.test/b.mp3", "https://cdn.test/c.mp3"]);
    let sources = [
        SourceRef::ipfs("bafydead"),
        SourceRef::url(""),
        SourceRef::url("https://cdn.test/b.mp3"),
        SourceRef::url("https://cdn.test/c.mp3"),
    ];
    let url = find_playable(&host, &sources).await;
    assert_eq!(url.as_deref(), Some("https://cdn.test/b.mp3"));
    assert_eq!(
        host.probed.into_inner(),
        vec![
            "https://gw.test/ipfs/bafydead".to_string(),
            "https://cdn.test/b.mp3".to_string(),
        ]
    );
}

#[tokio::test]
async fn no_playable_source() {
    let host = ScriptedHost::new(Vec::new());
    assert_eq!(find_playable(&host, &[SourceRef::ipfs("x")]).await, None);
    assert_eq!(find_playable(&host, &[]).await, None);
}

#[tokio::test]
async fn lyrics_states() {
    let mut host = ScriptedHost::new(Vec::new());
    host.texts.insert("https://gw.test/ipfs/bafylyrics", "la la la");

    let missing = load_lyrics(&host, None).await;
    assert_eq!(missing, LyricsState::NotAvailable);
    assert_eq!(missing.display_text(), "No lyrics available for this track.");

    let loaded = load_lyrics(&host, Some(&SourceRef::ipfs("bafylyrics"))).await;
    assert_eq!(loaded, LyricsState::Loaded("la la la".into()));

    let failed = load_lyrics(&host, Some(&SourceRef::url("https://cdn.test/none.txt"))).await;
    assert_eq!(failed, LyricsState::Failed);
    assert_eq!(failed.display_text(), "Could not load lyrics.");
}
