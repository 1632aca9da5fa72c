use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use quill_doc::{context_tail, Offset, Selection};
use tokio_util::sync::CancellationToken;

use crate::config::SuggestConfig;
use crate::provider::SuggestionProvider;
use crate::state::{Suggestion, SuggestionStore};

struct InFlight {
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

struct SchedulerInner {
    config: SuggestConfig,
    provider: Arc<dyn SuggestionProvider>,
    store: Arc<SuggestionStore>,
    next_id: AtomicU64,
    current: Mutex<Option<InFlight>>,
}

/// Debounces document changes and owns cancellation of in-flight fetches.
///
/// At most one debounce timer / fetch task is alive at any instant.
/// Scheduling a new one always cancels the previous one *first*, so there is
/// no window with two live requests. Cancellation is cooperative: aborting
/// the task is best effort, and the authoritative staleness check is the
/// store's — each request is announced to the store before it starts, and
/// [`SuggestionStore::intake`] accepts a result only if its request is still
/// the announced one, under the same lock in which edits invalidate it.
#[derive(Clone)]
pub struct FetchScheduler {
    inner: Arc<SchedulerInner>,
}

impl FetchScheduler {
    pub fn new(
        config: SuggestConfig,
        provider: Arc<dyn SuggestionProvider>,
        store: Arc<SuggestionStore>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                provider,
                store,
                next_id: AtomicU64::new(1),
                current: Mutex::new(None),
            }),
        }
    }

    /// Per-change decision point. `before_text` is the plain-text window
    /// ending at `cursor`, reflecting the document *after* the change that
    /// triggered this call. Must be invoked for every committed mutation,
    /// not only text insertions.
    pub fn on_document_changed(&self, before_text: &str, cursor: Offset, selection: Selection) {
        let inner = &self.inner;

        if !inner.store.is_enabled() {
            self.cancel();
            return;
        }
        // A suggestion only ever anchors to a collapsed caret.
        if !selection.is_caret() {
            self.cancel();
            return;
        }
        let context = context_tail(before_text, inner.config.context_window);
        let words = context.split_whitespace().count();
        if words < inner.config.min_words {
            // Fast exit, not merely a skip: a short context must never leave
            // a stale suggestion visible or let an in-flight fetch land.
            self.cancel();
            return;
        }

        // Cancel-then-start: the previous request must be dead before the
        // new one exists.
        self.cancel_in_flight();

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        inner.store.begin_request(id);
        let token = CancellationToken::new();
        let context = context.to_owned();
        let task_inner = Arc::clone(inner);
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep(task_inner.config.debounce) => {}
            }
            tracing::trace!(id, chars = context.len(), "requesting suggestion");
            let result = tokio::select! {
                _ = task_token.cancelled() => return,
                result = task_inner.provider.fetch(&context) => result,
            };
            match result {
                Ok(text) => match Suggestion::new(cursor, text) {
                    Some(suggestion) => {
                        if !task_inner.store.intake(id, suggestion) {
                            // Superseded while the provider was running.
                            // Expected and frequent; drop silently.
                            tracing::trace!(id, "suggestion superseded before install");
                        }
                    }
                    None => {
                        task_inner.store.resolve_empty(id);
                    }
                },
                Err(err) => {
                    tracing::debug!(id, error = %err, "suggestion provider failed");
                    task_inner.store.resolve_empty(id);
                }
            }
        });
        *inner.current.lock() = Some(InFlight { token, handle });
    }

    /// Cancel any pending debounce timer or in-flight fetch and clear the
    /// store, so no previously started request can ever land.
    pub fn cancel(&self) {
        self.cancel_in_flight();
        self.inner.store.clear();
    }

    fn cancel_in_flight(&self) {
        if let Some(previous) = self.inner.current.lock().take() {
            previous.token.cancel();
            previous.handle.abort();
        }
    }
}
