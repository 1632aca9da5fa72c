use std::sync::Arc;

use crate::{EditError, MutationOrigin, Offset, Selection};

/// Position mapping for a single committed mutation.
///
/// Translates an offset valid *before* the mutation into the corresponding
/// offset *after* it; `None` means the position was deleted.
pub type Remap = dyn Fn(Offset) -> Option<Offset> + Send + Sync;

/// One committed document mutation, delivered synchronously to listeners.
pub struct ChangeEvent<'a> {
    pub origin: MutationOrigin,
    /// Bounded plain-text window ending at `cursor`, reflecting the document
    /// *after* the mutation.
    pub before_text: &'a str,
    /// Cursor position after the mutation.
    pub cursor: Offset,
    /// Selection after the mutation.
    pub selection: Selection,
    pub remap: &'a Remap,
}

pub trait ChangeListener: Send + Sync {
    fn on_change(&self, event: &ChangeEvent<'_>);
}

/// The mutable, versioned document the suggestion engine talks to.
///
/// Implementations must dispatch one [`ChangeEvent`] per committed mutation,
/// in commit order, before the mutating call returns.
pub trait DocumentModel: Send + Sync {
    /// Register a change listener. Dropping the returned [`Subscription`]
    /// deregisters it.
    fn subscribe(&self, listener: Arc<dyn ChangeListener>) -> Subscription;

    /// Insert `text` at `at` as a single transactional mutation tagged with
    /// `origin`.
    fn insert(&self, at: Offset, text: &str, origin: MutationOrigin) -> Result<(), EditError>;
}

/// RAII registration guard: the listener stays registered exactly as long as
/// this value is alive, so deregistration happens on every teardown path.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
