use std::sync::Arc;

use parking_lot::Mutex;
use quill_doc::{DocumentModel, MutationOrigin, Offset, Remap};

/// A fetched completion pinned to the offset it was requested at.
///
/// Immutable once created; any change replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    anchor: Offset,
    text: String,
}

impl Suggestion {
    /// Returns `None` when `text` is empty or whitespace-only, which the
    /// engine treats as "no suggestion".
    pub fn new(anchor: Offset, text: String) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self { anchor, text })
        }
    }

    /// The offset immediately after which [`text`](Self::text) would be
    /// inserted on acceptance.
    pub fn anchor(&self) -> Offset {
        self.anchor
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Presentation-layer boundary: the store decides *what* and *where*, the
/// renderer decides *how*.
///
/// Implementations must not call back into the engine synchronously.
pub trait OverlayRenderer: Send + Sync {
    /// Display `text` as a non-editable overlay after `anchor`, replacing any
    /// previously shown overlay.
    fn show(&self, anchor: Offset, text: &str);

    /// Remove the overlay if one is visible. Must be idempotent.
    fn clear(&self);
}

struct EngineState {
    suggestion: Option<Suggestion>,
    enabled: bool,
    /// Id of the request whose result the store will accept next; 0 when no
    /// result is expected. Lives under the state mutex so that checking it
    /// and installing a result is a single atomic step: an edit that clears
    /// the state in one critical section can never interleave with a fetch
    /// task installing a result computed before that edit.
    live_request: u64,
}

/// Single source of truth for "is there currently a displayable suggestion".
///
/// Owns the overlay lifecycle: exactly one overlay exists while a suggestion
/// is present, and it is removed in the same step that clears the suggestion.
/// Also the final arbiter of result staleness: the scheduler mints request
/// ids, but only the store — under its own lock — decides whether a finished
/// request is still the one whose result should become visible.
pub struct SuggestionStore {
    state: Mutex<EngineState>,
    document: Arc<dyn DocumentModel>,
    renderer: Arc<dyn OverlayRenderer>,
}

impl SuggestionStore {
    pub fn new(
        document: Arc<dyn DocumentModel>,
        renderer: Arc<dyn OverlayRenderer>,
        enabled: bool,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState {
                suggestion: None,
                enabled,
                live_request: 0,
            }),
            document,
            renderer,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Snapshot of the current suggestion, if any.
    pub fn suggestion(&self) -> Option<Suggestion> {
        self.state.lock().suggestion.clone()
    }

    /// Mark `request` as the one whose result the store will accept next,
    /// superseding any previously expected request.
    pub fn begin_request(&self, request: u64) {
        self.state.lock().live_request = request;
    }

    /// Install the result of `request` and (re)create its overlay, provided
    /// that request is still the expected one. Returns `false` — with no
    /// side effect — when it was superseded or suggestions are disabled.
    pub fn intake(&self, request: u64, candidate: Suggestion) -> bool {
        let mut state = self.state.lock();
        if !state.enabled || state.live_request != request {
            return false;
        }
        state.live_request = 0;
        tracing::trace!(request, anchor = candidate.anchor(), "installing suggestion");
        self.renderer.show(candidate.anchor(), candidate.text());
        state.suggestion = Some(candidate);
        true
    }

    /// Resolve `request` with no suggestion (empty text or provider
    /// failure): clears the state, but only if that request is still the
    /// expected one. A stale empty resolution must not clear a result a
    /// newer request installed.
    pub fn resolve_empty(&self, request: u64) -> bool {
        let mut state = self.state.lock();
        if state.live_request != request {
            return false;
        }
        state.live_request = 0;
        if state.suggestion.take().is_some() {
            self.renderer.clear();
        }
        true
    }

    /// Drop the current suggestion, its overlay, and the expectation of any
    /// in-flight result, as one atomic step. Idempotent.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.live_request = 0;
        if state.suggestion.take().is_some() {
            self.renderer.clear();
        }
    }

    /// Dismiss the current suggestion. Returns `false` when nothing was
    /// shown, so a dismiss-key handler can fall through to other features.
    /// Any in-flight result is dropped either way.
    pub fn dismiss(&self) -> bool {
        let mut state = self.state.lock();
        state.live_request = 0;
        match state.suggestion.take() {
            Some(_) => {
                self.renderer.clear();
                true
            }
            None => false,
        }
    }

    /// Accept the current suggestion: insert its text at the anchor and clear
    /// the state as one step. Returns `false` with no observable effect when
    /// no suggestion is present or the document rejects the insert.
    pub fn accept(&self) -> bool {
        let Some(suggestion) = self.suggestion() else {
            return false;
        };
        // The insert fires a change event tagged `SuggestionAccept`, which
        // the engine's listener ignores; the clear below is therefore the
        // only state transition for this mutation.
        if let Err(err) = self.document.insert(
            suggestion.anchor(),
            suggestion.text(),
            MutationOrigin::SuggestionAccept,
        ) {
            tracing::warn!(
                error = %err,
                anchor = suggestion.anchor(),
                "document rejected suggestion insert"
            );
            return false;
        }
        let mut state = self.state.lock();
        state.live_request = 0;
        if state.suggestion.as_ref() == Some(&suggestion) {
            state.suggestion = None;
            self.renderer.clear();
        }
        true
    }

    /// Invalidation hook, called once per committed mutation that was not
    /// the acceptance of the current suggestion. The mapping is deliberately
    /// unused: any unrelated edit discards the suggestion outright, because
    /// the context that produced it no longer matches the document. Remapping
    /// the anchor would keep a suggestion visible that the text no longer
    /// supports.
    pub fn on_mutation_committed(&self, _remap: &Remap) {
        self.clear();
    }

    /// Toggle the master switch. Transitioning to disabled clears any
    /// visible suggestion and drops any expected result; the engine facade
    /// additionally cancels scheduler activity.
    pub fn set_enabled(&self, value: bool) {
        let mut state = self.state.lock();
        state.enabled = value;
        if !value {
            state.live_request = 0;
            if state.suggestion.take().is_some() {
                self.renderer.clear();
            }
        }
    }
}
