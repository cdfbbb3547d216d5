//! Timed branch-choice prompt.
//!
//! A prompt lists the outgoing paths of the current recording and counts
//! down in whole ticks. It resolves exactly once: by an explicit choice,
//! by cancellation, or by a random pick when the countdown reaches zero.
//! Each prompt has a handle; ticks and choices carrying any other handle
//! are ignored, so a timer that outlives its prompt can do no harm.

use crate::intent::ChoiceOption;
use avn_core::id::EdgeId;
use avn_core::model::StoryGraph;
use rand::Rng;

pub const UNTITLED_PATH: &str = "Untitled Path";

/// Label shown for one branch: edge label, else target title, else a
/// placeholder.
pub fn option_label(graph: &StoryGraph, edge: EdgeId) -> String {
    let Some(e) = graph.edge(edge) else {
        return UNTITLED_PATH.to_string();
    };
    if let Some(label) = e.display_label() {
        return label.to_string();
    }
    graph
        .get_by_id(e.target)
        .map(|n| n.title.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_PATH)
        .to_string()
}

/// How a prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Chosen(EdgeId),
    TimedOut(EdgeId),
    Cancelled,
}

impl Resolution {
    pub fn edge(&self) -> Option<EdgeId> {
        match self {
            Self::Chosen(e) | Self::TimedOut(e) => Some(*e),
            Self::Cancelled => None,
        }
    }
}

/// Result of feeding a tick to a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Handle did not match or the prompt already resolved.
    Ignored,
    Counting(u32),
    Resolved(Resolution),
}

#[derive(Debug, Clone)]
pub struct ChoicePrompt {
    handle: u64,
    options: Vec<ChoiceOption>,
    remaining: u32,
    resolution: Option<Resolution>,
}

impl ChoicePrompt {
    pub fn new(handle: u64, options: Vec<ChoiceOption>, ticks: u32) -> Self {
        Self {
            handle,
            options,
            remaining: ticks.max(1),
            resolution: None,
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    fn resolve(&mut self, handle: u64, resolution: Resolution) -> Option<Resolution> {
        if handle != self.handle || self.resolution.is_some() {
            return None;
        }
        self.resolution = Some(resolution);
        self.resolution
    }

    /// Pick option `index`. `None` if stale, resolved, or out of range.
    pub fn choose(&mut self, handle: u64, index: usize) -> Option<Resolution> {
        let edge = self.options.get(index)?.edge;
        self.resolve(handle, Resolution::Chosen(edge))
    }

    pub fn cancel(&mut self, handle: u64) -> Option<Resolution> {
        self.resolve(handle, Resolution::Cancelled)
    }

    /// Count down one tick; at zero pick uniformly at random.
    pub fn tick<R: Rng>(&mut self, handle: u64, rng: &mut R) -> TickOutcome {
        if handle != self.handle || self.resolution.is_some() {
            return TickOutcome::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickOutcome::Counting(self.remaining);
        }
        if self.options.is_empty() {
            return self
                .resolve(handle, Resolution::Cancelled)
                .map_or(TickOutcome::Ignored, TickOutcome::Resolved);
        }
        let pick = self.options[rng.random_range(0..self.options.len())].edge;
        log::info!("choice timer expired, auto-selecting {pick}");
        self.resolve(handle, Resolution::TimedOut(pick))
            .map_or(TickOutcome::Ignored, TickOutcome::Resolved)
    }
}
