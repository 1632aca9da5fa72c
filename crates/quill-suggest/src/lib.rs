//! Quill's asynchronous inline-suggestion engine.
//!
//! While the user types, a [`SuggestionEngine`] watches the document's change
//! stream, debounces bursts of keystrokes, fetches a completion from a
//! host-supplied [`SuggestionProvider`], and holds the result as a transient
//! ghost overlay anchored to a document offset until it is accepted,
//! dismissed, or invalidated by a later edit.
//!
//! The engine never blocks editing. Fetches run as background tasks; starting
//! a new request always cancels the previous one first, and a completed fetch
//! is applied only if no newer request superseded it. Provider failures are
//! logged and treated as "no suggestion" — the worst observable symptom of
//! any internal failure is that no suggestion appears.

mod config;
mod engine;
mod provider;
mod scheduler;
mod state;

pub use config::SuggestConfig;
pub use engine::SuggestionEngine;
pub use provider::{FetchError, SuggestionProvider};
pub use scheduler::FetchScheduler;
pub use state::{OverlayRenderer, Suggestion, SuggestionStore};
