use thiserror::Error;

/// Result type for tweet-stats operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while computing statistics
#[derive(Error, Debug)]
pub enum StatsError {
    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A sequence number arrived twice, too late, or never arrived at all
    #[error("Sequence violation: {0}")]
    SequenceError(String),

    /// A downstream stage went away while a producer was still sending
    #[error("Stage '{0}' disconnected")]
    Disconnected(&'static str),

    /// A consumer's channel closed before every producer said it was done
    #[error("Stage '{stage}' saw {received} of {expected} producers finish before its input closed")]
    IncompleteShutdown {
        /// The consuming stage
        stage: &'static str,
        /// Terminal messages received
        received: usize,
        /// Terminal messages expected
        expected: usize,
    },

    /// A stage thread panicked
    #[error("Stage '{0}' panicked")]
    StagePanicked(&'static str),
}
