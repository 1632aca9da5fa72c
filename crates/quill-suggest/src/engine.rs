use std::sync::Arc;

use quill_doc::{ChangeEvent, ChangeListener, DocumentModel, MutationOrigin, Subscription};

use crate::config::SuggestConfig;
use crate::provider::SuggestionProvider;
use crate::scheduler::FetchScheduler;
use crate::state::{OverlayRenderer, Suggestion, SuggestionStore};

/// The engine facade: wires the suggestion store and the fetch scheduler to
/// a document's change stream.
///
/// Constructing the engine registers its change listener; dropping it
/// deregisters the listener and cancels outstanding work on every teardown
/// path, so a torn-down engine can never apply a late result.
pub struct SuggestionEngine {
    store: Arc<SuggestionStore>,
    scheduler: FetchScheduler,
    _subscription: Subscription,
}

struct EngineListener {
    store: Arc<SuggestionStore>,
    scheduler: FetchScheduler,
}

impl ChangeListener for EngineListener {
    fn on_change(&self, event: &ChangeEvent<'_>) {
        // The acceptance insert is tagged; it must neither invalidate the
        // state transition that produced it nor start a new fetch cycle.
        if event.origin == MutationOrigin::SuggestionAccept {
            return;
        }
        // Invalidate before any new suggestion logic runs for this change.
        self.store.on_mutation_committed(event.remap);
        self.scheduler
            .on_document_changed(event.before_text, event.cursor, event.selection);
    }
}

impl SuggestionEngine {
    pub fn attach(
        document: Arc<dyn DocumentModel>,
        provider: Arc<dyn SuggestionProvider>,
        renderer: Arc<dyn OverlayRenderer>,
        config: SuggestConfig,
    ) -> Self {
        let store = Arc::new(SuggestionStore::new(
            Arc::clone(&document),
            renderer,
            config.enabled,
        ));
        let scheduler = FetchScheduler::new(config, provider, Arc::clone(&store));
        let listener = Arc::new(EngineListener {
            store: Arc::clone(&store),
            scheduler: scheduler.clone(),
        });
        let subscription = document.subscribe(listener);
        Self {
            store,
            scheduler,
            _subscription: subscription,
        }
    }

    /// Insert the current suggestion at its anchor and clear the state as
    /// one step. Returns `false` when nothing is shown, so an accept-key
    /// binding can fall through.
    pub fn accept(&self) -> bool {
        self.store.accept()
    }

    /// Clear the current suggestion. Returns `false` when nothing was shown.
    pub fn dismiss(&self) -> bool {
        self.store.dismiss()
    }

    pub fn set_enabled(&self, value: bool) {
        self.store.set_enabled(value);
        if !value {
            self.scheduler.cancel();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    /// Snapshot of the currently displayable suggestion, if any.
    pub fn suggestion(&self) -> Option<Suggestion> {
        self.store.suggestion()
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}
