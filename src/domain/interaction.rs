//! Shared scrub/crosshair state.
//!
//! One writer at a time (the chart under the pointer), any number of readers
//! (pill, tooltip, legend). All access happens on the UI thread, so the store
//! is a plain reactive signal without locking.

use leptos::*;
use serde::Serialize;

/// What the user is currently pointing at.
///
/// `value` and `timestamp` are both `None` whenever `is_scrubbing` is false.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScrubState {
    pub is_scrubbing: bool,
    /// Horizontal pointer location, percent of the owning chart's plot width.
    pub position: f64,
    pub value: Option<f64>,
    pub timestamp: Option<String>,
}

impl ScrubState {
    /// Whether the both-or-neither invariant holds.
    pub fn is_consistent(&self) -> bool {
        if self.is_scrubbing {
            self.value.is_some() == self.timestamp.is_some()
        } else {
            self.value.is_none() && self.timestamp.is_none()
        }
    }
}

fn clamp_position(percent: f64) -> f64 {
    if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) }
}

/// Copyable handle to the shared scrub state.
#[derive(Debug, Clone, Copy)]
pub struct ScrubStore {
    state: RwSignal<ScrubState>,
}

impl Default for ScrubStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrubStore {
    pub fn new() -> Self {
        Self { state: create_rw_signal(ScrubState::default()) }
    }

    /// Begin a gesture. Value and timestamp stay empty until the first sample.
    pub fn start_scrub(&self, position_percent: f64) {
        let position = clamp_position(position_percent);
        self.state.update(|state| {
            state.is_scrubbing = true;
            state.position = position;
            state.value = None;
            state.timestamp = None;
        });
    }

    /// Replace the sample. Each call overwrites the previous one; nothing is queued.
    pub fn update_scrub(&self, position_percent: f64, value: f64, timestamp: String) {
        let position = clamp_position(position_percent);
        self.state.set(ScrubState { is_scrubbing: true, position, value: Some(value), timestamp: Some(timestamp) });
    }

    /// End the gesture: flag and sample are cleared together, position is kept.
    pub fn end_scrub(&self) {
        self.state.update(|state| {
            state.is_scrubbing = false;
            state.value = None;
            state.timestamp = None;
        });
    }

    /// Untracked read, for event handlers and tests.
    pub fn snapshot(&self) -> ScrubState {
        self.state.get_untracked()
    }

    /// Tracked read, for views.
    pub fn state(&self) -> ScrubState {
        self.state.get()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.state.with(|state| state.is_scrubbing)
    }

    pub fn value(&self) -> Option<f64> {
        self.state.with(|state| state.value)
    }

    pub fn position(&self) -> f64 {
        self.state.with(|state| state.position)
    }

    pub fn signal(&self) -> ReadSignal<ScrubState> {
        self.state.read_only()
    }
}

/// Create a store and make it available to every descendant component.
pub fn provide_scrub_store() -> ScrubStore {
    let store = ScrubStore::new();
    provide_context(store);
    store
}

/// Store provided by an ancestor, or a fresh detached one when none was provided.
pub fn use_scrub_store() -> ScrubStore {
    use_context::<ScrubStore>().unwrap_or_else(|| {
        crate::log_warn!(
            crate::domain::logging::LogComponent::Domain("ScrubStore"),
            "no ScrubStore in context; using a detached store"
        );
        ScrubStore::new()
    })
}
