//! Document-model boundary for the Quill inline-suggestion engine.
//!
//! `quill-doc` owns the vocabulary the engine and the host editor share:
//! offsets, selections, mutation origins, per-mutation position remapping,
//! and the change-notification contract. The engine (`quill-suggest`)
//! depends only on the [`DocumentModel`] trait and the [`ChangeEvent`]
//! model defined here, never on a concrete editor.
//!
//! # Event delivery
//!
//! A document fires exactly one [`ChangeEvent`] per committed mutation, in
//! commit order, synchronously from the mutating call. Each event carries a
//! [`Remap`] that translates pre-mutation offsets into post-mutation offsets
//! (or reports them deleted), plus a bounded plain-text window ending at the
//! post-mutation cursor.
//!
//! # Testing
//!
//! Avoid tests that drive a real editor and hope events arrive in a useful
//! order. Prefer the deterministic in-memory [`ScratchDocument`], which
//! commits mutations and dispatches events synchronously.

mod change;
mod scratch;

pub use change::{ChangeEvent, ChangeListener, DocumentModel, Remap, Subscription};
pub use scratch::ScratchDocument;

use thiserror::Error;

/// Byte offset into the document text. Mutation offsets must fall on UTF-8
/// character boundaries.
pub type Offset = usize;

/// A cursor or selected range. A suggestion only ever anchors to a collapsed
/// caret, never to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Offset,
    pub head: Offset,
}

impl Selection {
    pub fn caret(at: Offset) -> Self {
        Self { anchor: at, head: at }
    }

    pub fn range(anchor: Offset, head: Offset) -> Self {
        Self { anchor, head }
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }
}

/// Opaque tag carried by every mutation.
///
/// The engine tags its own acceptance insert with [`SuggestionAccept`] so its
/// change listener can tell that mutation apart from ordinary edits.
///
/// [`SuggestionAccept`]: MutationOrigin::SuggestionAccept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOrigin {
    UserEdit,
    SuggestionAccept,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("offset {offset} is out of bounds (document length {len})")]
    OutOfBounds { offset: Offset, len: usize },
    #[error("offset {offset} is not a UTF-8 character boundary")]
    NotCharBoundary { offset: Offset },
}

/// Last `max_chars` characters of `text`.
///
/// Offsets are bytes but context windows are measured in characters, so a
/// multibyte sequence can never be split at the front of the window.
pub fn context_tail(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tail_returns_whole_short_text() {
        assert_eq!(context_tail("abc", 10), "abc");
        assert_eq!(context_tail("", 10), "");
    }

    #[test]
    fn context_tail_takes_last_chars() {
        assert_eq!(context_tail("abcdef", 3), "def");
        assert_eq!(context_tail("abcdef", 0), "");
    }

    #[test]
    fn context_tail_counts_chars_not_bytes() {
        assert_eq!(context_tail("héllo", 4), "éllo");
        assert_eq!(context_tail("日本語テキスト", 3), "キスト");
    }

    #[test]
    fn selection_caret_detection() {
        assert!(Selection::caret(4).is_caret());
        assert!(!Selection::range(2, 6).is_caret());
    }
}
