//! Element State Tracking
//!
//! A side table from element identity to per-element lazy-loading state,
//! instead of attaching ad hoc properties to host elements. Commits are
//! strictly monotonic in candidate width; the only exception is the reset
//! after a load failure, which goes back to zero so a different candidate
//! may be retried.

use std::collections::HashMap;

use lazyview_select::Candidate;

use crate::element::ElementId;

/// Per-element memoized lazy-loading state.
#[derive(Debug, Default)]
pub struct ElementState {
    /// URL of the best option applied so far ("" before the first commit).
    last_url: String,
    /// Width of the best option applied so far (0 before the first commit).
    last_width: u32,
    /// Markup injection fired; the element is never processed again.
    terminal: bool,
    /// One-time load effects (event dispatch + callback) already fired.
    effects_fired: bool,
    /// Intersection/scroll observation already wired up.
    observers_attached: bool,
}

/// Side table of element state, keyed by identity.
#[derive(Debug, Default)]
pub struct StateTable {
    states: HashMap<ElementId, ElementState>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, element: ElementId) -> &mut ElementState {
        self.states.entry(element).or_default()
    }

    /// Commit `candidate` iff it is a strict width upgrade over the last
    /// applied option. The first candidate always commits (initial width
    /// is 0).
    pub fn try_commit(&mut self, element: ElementId, candidate: &Candidate) -> bool {
        let state = self.entry(element);
        if candidate.width <= state.last_width {
            return false;
        }
        state.last_url = candidate.url.clone();
        state.last_width = candidate.width;
        true
    }

    /// Is `url` still the most recently committed option for the element?
    pub fn is_current(&self, element: ElementId, url: &str) -> bool {
        self.states
            .get(&element)
            .is_some_and(|state| state.last_url == url)
    }

    /// Width of the last committed option (0 when uncommitted).
    pub fn committed_width(&self, element: ElementId) -> u32 {
        self.states.get(&element).map_or(0, |state| state.last_width)
    }

    /// Load failure: reset to the zero-width sentinel so a future pass may
    /// select again. Never resets to an intermediate width.
    pub fn reset(&mut self, element: ElementId) {
        let state = self.entry(element);
        state.last_url.clear();
        state.last_width = 0;
    }

    pub fn is_terminal(&self, element: ElementId) -> bool {
        self.states.get(&element).is_some_and(|state| state.terminal)
    }

    /// Mark the element terminal. Returns `false` when it already was,
    /// making the markup-injection path one-shot.
    pub fn mark_terminal(&mut self, element: ElementId) -> bool {
        let state = self.entry(element);
        if state.terminal {
            return false;
        }
        state.terminal = true;
        true
    }

    /// Claim the one-time load effects. Returns `true` on the first claim
    /// only, regardless of how many upgrades follow.
    pub fn fire_effects_once(&mut self, element: ElementId) -> bool {
        let state = self.entry(element);
        if state.effects_fired {
            return false;
        }
        state.effects_fired = true;
        true
    }

    pub fn observers_attached(&self, element: ElementId) -> bool {
        self.states
            .get(&element)
            .is_some_and(|state| state.observers_attached)
    }

    pub fn mark_observed(&mut self, element: ElementId) {
        self.entry(element).observers_attached = true;
    }

    /// Drop all state for a detached element. A re-attached element starts
    /// over from width 0.
    pub fn detach(&mut self, element: ElementId) {
        self.states.remove(&element);
    }
}
