use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("suggestion request cancelled")]
    Cancelled,
    #[error("suggestion request timed out")]
    Timeout,
    #[error("suggestion provider error: {0}")]
    Provider(String),
}

/// Host-supplied completion source.
///
/// `context` is the bounded plain-text window ending at the caret. The
/// returned text is inserted verbatim on acceptance; an empty or
/// whitespace-only result means "no suggestion". Implementations may take as
/// long as they like: the engine imposes no timeout of its own and simply
/// drops the future of a superseded request. Errors never reach the user as
/// an error state — they are logged and treated as an empty result.
pub trait SuggestionProvider: Send + Sync {
    fn fetch<'a>(&'a self, context: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}
