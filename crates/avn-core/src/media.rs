//! Media source resolution.
//!
//! Sources are tagged values. Content addresses resolve through the
//! document's gateway table; URLs pass through. Network access lives
//! behind [`MediaResolver`] so the host decides how to probe and fetch.

use crate::model::{GraphMeta, SourceKind, SourceRef};
use std::future::Future;
use thiserror::Error;

/// Used when a document lists no gateway at all.
pub const FALLBACK_GATEWAY: &str = "https://ipfs.io/ipfs/";

pub const NO_LYRICS_TEXT: &str = "No lyrics available for this track.";
pub const LYRICS_FAILED_TEXT: &str = "Could not load lyrics.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("source has an empty value")]
    EmptySource,
    #[error("{url} is not reachable: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("fetching {url} failed with status {status}")]
    Status { url: String, status: u16 },
}

/// Maps tagged sources to retrievable URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTable {
    gateways: Vec<String>,
}

impl Default for GatewayTable {
    fn default() -> Self {
        Self::from_meta(&GraphMeta::default())
    }
}

impl GatewayTable {
    pub fn new(gateways: Vec<String>) -> Self {
        Self { gateways }
    }

    pub fn from_meta(meta: &GraphMeta) -> Self {
        Self::new(meta.gateways.clone())
    }

    pub fn primary(&self) -> &str {
        self.gateways
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_GATEWAY)
    }

    pub fn resolve(&self, source: &SourceRef) -> Result<String, MediaError> {
        let value = source.value.trim();
        if value.is_empty() {
            return Err(MediaError::EmptySource);
        }
        Ok(match source.kind {
            SourceKind::Url => value.to_string(),
            SourceKind::Ipfs => format!("{}{value}", self.primary()),
        })
    }

    /// Every resolvable URL in source order, for hosts that probe themselves.
    pub fn candidates(&self, sources: &[SourceRef]) -> Vec<String> {
        sources.iter().filter_map(|s| self.resolve(s).ok()).collect()
    }
}

/// Host-provided access to media.
pub trait MediaResolver {
    fn resolve_url(&self, source: &SourceRef) -> Result<String, MediaError>;

    /// Check that `url` answers without downloading it.
    fn probe(&self, url: &str) -> impl Future<Output = Result<(), MediaError>>;

    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, MediaError>>;
}

/// First source that resolves and answers a probe.
pub async fn find_playable<R: MediaResolver>(resolver: &R, sources: &[SourceRef]) -> Option<String> {
    for source in sources {
        let url = match resolver.resolve_url(source) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("skipping source {source:?}: {e}");
                continue;
            }
        };
        match resolver.probe(&url).await {
            Ok(()) => return Some(url),
            Err(e) => log::warn!("source probe failed: {e}"),
        }
    }
    None
}

/// Lyrics panel state after a load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsState {
    NotAvailable,
    Loaded(String),
    Failed,
}

impl LyricsState {
    pub fn display_text(&self) -> &str {
        match self {
            Self::NotAvailable => NO_LYRICS_TEXT,
            Self::Loaded(text) => text,
            Self::Failed => LYRICS_FAILED_TEXT,
        }
    }
}

pub async fn load_lyrics<R: MediaResolver>(resolver: &R, source: Option<&SourceRef>) -> LyricsState {
    let Some(source) = source else {
        return LyricsState::NotAvailable;
    };
    let result = match resolver.resolve_url(source) {
        Ok(url) => resolver.fetch_text(&url).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(text) => LyricsState::Loaded(text),
        Err(e) => {
            log::warn!("lyrics loading failed: {e}");
            LyricsState::Failed
        }
    }
}

/// `m:ss` playback clock.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
