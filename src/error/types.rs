use thiserror::Error;

/// Unified result type for the scopetree crate.
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Errors surfaced by configuration and terminal output.
///
/// Scope events themselves never fail: late or duplicate events are absorbed
/// by the tree. Only configuration and the output sink report errors.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("invalid progress bar style: expected 5 glyphs, found {found}")]
    InvalidBarStyle { found: usize },
    #[error("terminal backend error: {0}")]
    Terminal(String),
    #[error("draw thread panicked")]
    DrawThread,
    #[error("pipeline consumer thread panicked")]
    ConsumerThread,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
