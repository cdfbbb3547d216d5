//! The listener's walk across the story graph.
//!
//! `Idle` has no current recording and an empty history. `Active` has a
//! current recording and a non-empty history whose last entry is the
//! current one. Every operation is total: unresolvable ids and ambiguous
//! backtracks are logged and leave the state untouched.
//!
//! The engine reads the graph but never writes it. Highlight changes are
//! reported as [`Intent::Highlight`] and applied by the session.

use crate::choice::{ChoicePrompt, Resolution, TickOutcome, option_label};
use crate::intent::{ChoiceOption, Intent};
use avn_core::id::{EdgeId, NodeId};
use avn_core::model::{Point, StoryGraph};
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Active,
}

/// Camera-follow parameters captured when following is switched on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Follow {
    pub scale: f64,
    /// Screen offset of the followed node from the viewport center.
    pub offset: Point,
}

pub struct TraversalEngine {
    current: Option<NodeId>,
    history: Vec<NodeId>,
    prompt: Option<ChoicePrompt>,
    next_handle: u64,
    choice_ticks: u32,
    follow: Option<Follow>,
    rng: SmallRng,
}

impl TraversalEngine {
    pub fn new(seed: u64, choice_ticks: u32) -> Self {
        Self {
            current: None,
            history: Vec::new(),
            prompt: None,
            next_handle: 1,
            choice_ticks,
            follow: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> TraversalState {
        if self.current.is_some() {
            TraversalState::Active
        } else {
            TraversalState::Idle
        }
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn history(&self) -> &[NodeId] {
        &self.history
    }

    /// The live prompt, if one is waiting for an answer.
    pub fn prompt(&self) -> Option<&ChoicePrompt> {
        self.prompt.as_ref()
    }

    pub fn follow(&self) -> Option<Follow> {
        self.follow
    }

    pub fn set_follow(&mut self, follow: Option<Follow>) {
        self.follow = follow;
    }

    /// Length of prompts opened from now on.
    pub fn set_choice_ticks(&mut self, ticks: u32) {
        self.choice_ticks = ticks;
    }

    // ─── Walk control ────────────────────────────────────────────────────

    /// Begin a new walk at `id`.
    pub fn start_from_node(&mut self, graph: &StoryGraph, id: NodeId) -> Vec<Intent> {
        if self.current == Some(id) {
            return Vec::new();
        }
        if !graph.contains_node(id) {
            log::warn!("cannot start from unknown node {id}");
            return Vec::new();
        }
        let mut intents = self.dismiss_prompt();
        let previous = self.current.replace(id);
        self.history = vec![id];
        log::debug!("walk started at {id}");
        self.arrive(&mut intents, id, previous, None);
        intents
    }

    /// Move along an outgoing path. Several paths open a choice prompt.
    pub fn advance(&mut self, graph: &StoryGraph) -> Vec<Intent> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        if self.prompt.is_some() {
            log::debug!("advance ignored while a choice is pending");
            return Vec::new();
        }

        let outgoing = graph.edges_from(current);
        match outgoing.as_slice() {
            [] => {
                log::info!("end of path at {current}");
                self.current = None;
                self.history.clear();
                vec![
                    Intent::Stop,
                    Intent::Highlight {
                        current: None,
                        previous: Some(current),
                        edge: None,
                    },
                ]
            }
            [only] => {
                let edge = only.id;
                self.take_edge(graph, edge)
            }
            many => {
                let options: Vec<ChoiceOption> = many
                    .iter()
                    .enumerate()
                    .map(|(index, e)| ChoiceOption {
                        index,
                        edge: e.id,
                        target: e.target,
                        label: option_label(graph, e.id),
                    })
                    .collect();
                let handle = self.next_handle;
                self.next_handle += 1;
                let prompt = ChoicePrompt::new(handle, options.clone(), self.choice_ticks);
                let seconds = prompt.remaining();
                self.prompt = Some(prompt);
                log::debug!("choice {handle} opened with {} options", options.len());
                vec![Intent::ShowChoices {
                    handle,
                    options,
                    seconds,
                }]
            }
        }
    }

    /// Step back to the previous recording.
    pub fn go_back(&mut self, graph: &StoryGraph) -> Vec<Intent> {
        let Some(current) = self.current else {
            return Vec::new();
        };

        let (previous, edge, rewritten_history) = if self.history.len() > 1 {
            let prev = self.history[self.history.len() - 2];
            let edge = graph.find_edge(prev, current).map(|e| e.id);
            (prev, edge, None)
        } else {
            let incoming = graph.edges_into(current);
            match incoming.as_slice() {
                [only] => (only.source, Some(only.id), Some(vec![only.source])),
                _ => {
                    log::debug!(
                        "cannot go back from {current}: {} incoming paths and no history",
                        incoming.len()
                    );
                    return Vec::new();
                }
            }
        };

        if !graph.contains_node(previous) {
            log::warn!("cannot go back to unknown node {previous}");
            return Vec::new();
        }

        let mut intents = self.dismiss_prompt();
        match rewritten_history {
            Some(h) => self.history = h,
            None => {
                self.history.pop();
            }
        }
        self.current = Some(previous);
        self.arrive(&mut intents, previous, Some(current), edge);
        intents
    }

    // ─── Prompt protocol ─────────────────────────────────────────────────

    pub fn choose(&mut self, graph: &StoryGraph, handle: u64, index: usize) -> Vec<Intent> {
        let resolution = self.prompt.as_mut().and_then(|p| p.choose(handle, index));
        self.finish_prompt(graph, handle, resolution)
    }

    pub fn cancel_choice(&mut self, handle: u64) -> Vec<Intent> {
        let resolution = self.prompt.as_mut().and_then(|p| p.cancel(handle));
        if resolution.is_none() {
            return Vec::new();
        }
        self.prompt = None;
        vec![Intent::HideChoices { handle }]
    }

    /// One prompt timer tick. Stale handles are ignored.
    pub fn tick(&mut self, graph: &StoryGraph, handle: u64) -> Vec<Intent> {
        let Some(prompt) = self.prompt.as_mut() else {
            log::trace!("tick for {handle} with no prompt open");
            return Vec::new();
        };
        match prompt.tick(handle, &mut self.rng) {
            TickOutcome::Ignored => Vec::new(),
            TickOutcome::Counting(remaining) => vec![Intent::CountdownTick { handle, remaining }],
            TickOutcome::Resolved(resolution) => self.finish_prompt(graph, handle, Some(resolution)),
        }
    }

    /// Forget the walk entirely.
    pub fn reset(&mut self) -> Vec<Intent> {
        let mut intents = self.dismiss_prompt();
        let previous = self.current.take();
        self.history.clear();
        intents.push(Intent::Highlight {
            current: None,
            previous,
            edge: None,
        });
        intents
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn finish_prompt(
        &mut self,
        graph: &StoryGraph,
        handle: u64,
        resolution: Option<Resolution>,
    ) -> Vec<Intent> {
        let Some(resolution) = resolution else {
            return Vec::new();
        };
        self.prompt = None;
        let mut intents = vec![Intent::HideChoices { handle }];
        if let Some(edge) = resolution.edge() {
            intents.extend(self.take_edge(graph, edge));
        }
        intents
    }

    fn take_edge(&mut self, graph: &StoryGraph, edge: EdgeId) -> Vec<Intent> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        let Some(e) = graph.edge(edge) else {
            log::warn!("path {edge} vanished before it could be taken");
            return Vec::new();
        };
        let target = e.target;
        if !graph.contains_node(target) {
            log::warn!("path {edge} leads to unknown node {target}");
            return Vec::new();
        }
        self.current = Some(target);
        self.history.push(target);
        let mut intents = Vec::new();
        self.arrive(&mut intents, target, Some(current), Some(edge));
        intents
    }

    fn arrive(
        &self,
        intents: &mut Vec<Intent>,
        id: NodeId,
        previous: Option<NodeId>,
        edge: Option<EdgeId>,
    ) {
        intents.push(Intent::Highlight {
            current: Some(id),
            previous,
            edge,
        });
        intents.push(Intent::Play { id });
        if let Some(follow) = self.follow {
            intents.push(Intent::CenterOnNode {
                id,
                scale: follow.scale,
                offset: follow.offset,
            });
        }
    }

    fn dismiss_prompt(&mut self) -> Vec<Intent> {
        match self.prompt.take() {
            Some(p) => vec![Intent::HideChoices { handle: p.handle() }],
            None => Vec::new(),
        }
    }
}
