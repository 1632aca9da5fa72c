use std::time::Duration;

/// Configuration for the inline-suggestion engine.
///
/// Read-only to the engine; hosts construct one at startup and override what
/// they need. The editor must always work with suggestions disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestConfig {
    /// Master switch. Disabling clears any visible suggestion and cancels
    /// outstanding work.
    pub enabled: bool,
    /// Minimum number of whitespace-delimited words in the context window
    /// before a fetch is scheduled.
    pub min_words: usize,
    /// Quiet period after the last qualifying edit before the provider is
    /// called.
    pub debounce: Duration,
    /// Maximum number of characters of text before the caret handed to the
    /// provider.
    pub context_window: usize,
}

impl SuggestConfig {
    /// A configuration with suggestions switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_words: 3,
            debounce: Duration::from_millis(300),
            context_window: 200,
        }
    }
}
