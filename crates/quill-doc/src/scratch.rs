use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    context_tail, ChangeEvent, ChangeListener, DocumentModel, EditError, MutationOrigin, Offset,
    Selection, Subscription,
};

const DEFAULT_WINDOW_CHARS: usize = 200;

/// Deterministic in-memory [`DocumentModel`].
///
/// Commits mutations and dispatches change events synchronously on the
/// calling thread, which makes engine behavior fully reproducible in tests:
/// no editor, no event-loop timing, no platform quirks. Also usable as a
/// harness when embedding the engine outside a real editor.
#[derive(Clone)]
pub struct ScratchDocument {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<DocState>,
    listeners: Mutex<Vec<(u64, Arc<dyn ChangeListener>)>>,
    next_listener: AtomicU64,
    window_chars: usize,
}

struct DocState {
    text: String,
    cursor: Offset,
    selection: Selection,
}

fn clamp_to_boundary(text: &str, at: Offset) -> Offset {
    let mut at = at.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

impl ScratchDocument {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW_CHARS)
    }

    /// A document whose change events carry at most `window_chars` characters
    /// of context before the cursor.
    pub fn with_window(window_chars: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(DocState {
                    text: String::new(),
                    cursor: 0,
                    selection: Selection::caret(0),
                }),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
                window_chars,
            }),
        }
    }

    pub fn text(&self) -> String {
        self.inner.state.lock().text.clone()
    }

    pub fn cursor(&self) -> Offset {
        self.inner.state.lock().cursor
    }

    pub fn selection(&self) -> Selection {
        self.inner.state.lock().selection
    }

    /// Move the caret without mutating the document. Clamped to the text
    /// length and rounded down to a character boundary. Fires no event:
    /// selection movement is not a mutation.
    pub fn set_cursor(&self, at: Offset) {
        let mut state = self.inner.state.lock();
        let at = clamp_to_boundary(&state.text, at);
        state.cursor = at;
        state.selection = Selection::caret(at);
    }

    /// Select a range without mutating the document. The caret sits at
    /// `head`. Fires no event, like [`set_cursor`](Self::set_cursor); the
    /// selection is carried on the next mutation's change event.
    pub fn set_selection(&self, anchor: Offset, head: Offset) {
        let mut state = self.inner.state.lock();
        let anchor = clamp_to_boundary(&state.text, anchor);
        let head = clamp_to_boundary(&state.text, head);
        state.selection = Selection::range(anchor, head);
        state.cursor = head;
    }

    /// Insert `text` at the caret, as a user keystroke would. Collapses any
    /// active selection to a caret after the inserted text.
    pub fn type_text(&self, text: &str) {
        let at = self.inner.state.lock().cursor;
        self.insert_at(at, text, MutationOrigin::UserEdit)
            .expect("caret offset is always a valid insertion point");
    }

    /// Delete up to `n` bytes immediately before the caret (rounded out to a
    /// character boundary), as backspacing would.
    pub fn delete_back(&self, n: usize) {
        let (before_text, start, removed);
        {
            let mut state = self.inner.state.lock();
            let end = state.cursor;
            let mut from = end.saturating_sub(n);
            while !state.text.is_char_boundary(from) {
                from -= 1;
            }
            removed = end - from;
            if removed == 0 {
                return;
            }
            state.text.replace_range(from..end, "");
            state.cursor = from;
            state.selection = Selection::caret(from);
            start = from;
            before_text = context_tail(&state.text[..from], self.inner.window_chars).to_owned();
        }

        let end = start + removed;
        let remap = move |offset: Offset| {
            if offset <= start {
                Some(offset)
            } else if offset < end {
                None
            } else {
                Some(offset - removed)
            }
        };
        self.emit(&ChangeEvent {
            origin: MutationOrigin::UserEdit,
            before_text: &before_text,
            cursor: start,
            selection: Selection::caret(start),
            remap: &remap,
        });
    }

    /// Core insertion path; [`DocumentModel::insert`] delegates here.
    pub fn insert_at(
        &self,
        at: Offset,
        text: &str,
        origin: MutationOrigin,
    ) -> Result<(), EditError> {
        let (before_text, cursor);
        {
            let mut state = self.inner.state.lock();
            let len = state.text.len();
            if at > len {
                return Err(EditError::OutOfBounds { offset: at, len });
            }
            if !state.text.is_char_boundary(at) {
                return Err(EditError::NotCharBoundary { offset: at });
            }
            state.text.insert_str(at, text);
            cursor = at + text.len();
            state.cursor = cursor;
            state.selection = Selection::caret(cursor);
            before_text = context_tail(&state.text[..cursor], self.inner.window_chars).to_owned();
        }

        let inserted = text.len();
        let remap = move |offset: Offset| {
            if offset <= at {
                Some(offset)
            } else {
                Some(offset + inserted)
            }
        };
        self.emit(&ChangeEvent {
            origin,
            before_text: &before_text,
            cursor,
            selection: Selection::caret(cursor),
            remap: &remap,
        });
        Ok(())
    }

    /// Commit an insertion without moving the local caret or selection, as a
    /// collaborator's or programmatic edit would. Retained positions are
    /// remapped through the mutation, so an active range selection stays a
    /// range on the resulting change event.
    pub fn insert_remote(&self, at: Offset, text: &str) -> Result<(), EditError> {
        let (before_text, cursor, selection);
        {
            let mut state = self.inner.state.lock();
            let len = state.text.len();
            if at > len {
                return Err(EditError::OutOfBounds { offset: at, len });
            }
            if !state.text.is_char_boundary(at) {
                return Err(EditError::NotCharBoundary { offset: at });
            }
            state.text.insert_str(at, text);
            let inserted = text.len();
            let shift = |offset: Offset| {
                if offset <= at {
                    offset
                } else {
                    offset + inserted
                }
            };
            state.cursor = shift(state.cursor);
            state.selection =
                Selection::range(shift(state.selection.anchor), shift(state.selection.head));
            cursor = state.cursor;
            selection = state.selection;
            before_text = context_tail(&state.text[..cursor], self.inner.window_chars).to_owned();
        }

        let inserted = text.len();
        let remap = move |offset: Offset| {
            if offset <= at {
                Some(offset)
            } else {
                Some(offset + inserted)
            }
        };
        self.emit(&ChangeEvent {
            origin: MutationOrigin::UserEdit,
            before_text: &before_text,
            cursor,
            selection,
            remap: &remap,
        });
        Ok(())
    }

    fn emit(&self, event: &ChangeEvent<'_>) {
        // Snapshot outside the lock so listeners may re-enter the document.
        let listeners: Vec<_> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener.on_change(event);
        }
    }
}

impl Default for ScratchDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentModel for ScratchDocument {
    fn subscribe(&self, listener: Arc<dyn ChangeListener>) -> Subscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, listener));
        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            inner
                .listeners
                .lock()
                .retain(|(listener_id, _)| *listener_id != id);
        })
    }

    fn insert(&self, at: Offset, text: &str, origin: MutationOrigin) -> Result<(), EditError> {
        self.insert_at(at, text, origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorded {
        origin: MutationOrigin,
        before_text: String,
        cursor: Offset,
        selection: Selection,
        mapped: Vec<Option<Offset>>,
    }

    struct Recorder {
        probes: Vec<Offset>,
        events: Mutex<Vec<Recorded>>,
    }

    impl Recorder {
        fn new(probes: Vec<Offset>) -> Arc<Self> {
            Arc::new(Self {
                probes,
                events: Mutex::new(Vec::new()),
            })
        }
    }

    impl ChangeListener for Recorder {
        fn on_change(&self, event: &ChangeEvent<'_>) {
            self.events.lock().push(Recorded {
                origin: event.origin,
                before_text: event.before_text.to_owned(),
                cursor: event.cursor,
                selection: event.selection,
                mapped: self.probes.iter().map(|&p| (event.remap)(p)).collect(),
            });
        }
    }

    #[test]
    fn typing_appends_and_fires_one_event() {
        let doc = ScratchDocument::new();
        let recorder = Recorder::new(vec![]);
        let _sub = doc.subscribe(recorder.clone());

        doc.type_text("hello ");
        doc.type_text("world");

        assert_eq!(doc.text(), "hello world");
        assert_eq!(doc.cursor(), 11);
        let events = recorder.events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].before_text, "hello world");
        assert_eq!(events[1].cursor, 11);
        assert_eq!(events[1].origin, MutationOrigin::UserEdit);
        assert!(events[1].selection.is_caret());
    }

    #[test]
    fn insert_remap_shifts_later_offsets() {
        let doc = ScratchDocument::new();
        doc.type_text("abcdef");
        let recorder = Recorder::new(vec![0, 3, 6]);
        let _sub = doc.subscribe(recorder.clone());

        doc.insert_at(3, "XY", MutationOrigin::UserEdit).unwrap();

        assert_eq!(doc.text(), "abcXYdef");
        let events = recorder.events.lock();
        assert_eq!(events[0].mapped, vec![Some(0), Some(3), Some(8)]);
    }

    #[test]
    fn delete_back_remap_reports_deleted_positions() {
        let doc = ScratchDocument::new();
        doc.type_text("abcdef");
        let recorder = Recorder::new(vec![2, 4, 6]);
        let _sub = doc.subscribe(recorder.clone());

        doc.delete_back(3);

        assert_eq!(doc.text(), "abc");
        assert_eq!(doc.cursor(), 3);
        let events = recorder.events.lock();
        assert_eq!(events[0].mapped, vec![Some(2), None, Some(3)]);
    }

    #[test]
    fn remote_insert_keeps_a_range_selection_and_remaps_it() {
        let doc = ScratchDocument::new();
        doc.type_text("abcdef");
        doc.set_selection(1, 4);
        let recorder = Recorder::new(vec![]);
        let _sub = doc.subscribe(recorder.clone());

        doc.insert_remote(0, "xy").unwrap();

        assert_eq!(doc.text(), "xyabcdef");
        assert_eq!(doc.selection(), Selection::range(3, 6));
        let events = recorder.events.lock();
        assert_eq!(events[0].selection, Selection::range(3, 6));
        assert!(!events[0].selection.is_caret());
        assert_eq!(events[0].cursor, 6);
    }

    #[test]
    fn typing_collapses_an_active_selection() {
        let doc = ScratchDocument::new();
        doc.type_text("abcdef");
        doc.set_selection(1, 4);

        doc.type_text("!");

        assert!(doc.selection().is_caret());
        assert_eq!(doc.text(), "abcd!ef");
    }

    #[test]
    fn before_text_window_is_bounded() {
        let doc = ScratchDocument::with_window(4);
        let recorder = Recorder::new(vec![]);
        let _sub = doc.subscribe(recorder.clone());

        doc.type_text("0123456789");

        let events = recorder.events.lock();
        assert_eq!(events[0].before_text, "6789");
    }

    #[test]
    fn insert_rejects_bad_offsets() {
        let doc = ScratchDocument::new();
        doc.type_text("héllo");

        assert_eq!(
            doc.insert_at(99, "x", MutationOrigin::UserEdit),
            Err(EditError::OutOfBounds { offset: 99, len: 6 })
        );
        // Offset 2 lands inside the two-byte 'é'.
        assert_eq!(
            doc.insert_at(2, "x", MutationOrigin::UserEdit),
            Err(EditError::NotCharBoundary { offset: 2 })
        );
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let doc = ScratchDocument::new();
        let recorder = Recorder::new(vec![]);
        let sub = doc.subscribe(recorder.clone());

        doc.type_text("a");
        drop(sub);
        doc.type_text("b");

        assert_eq!(recorder.events.lock().len(), 1);
    }
}
