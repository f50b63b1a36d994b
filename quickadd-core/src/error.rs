//! Error types for quickadd.

use thiserror::Error;

/// Errors that can occur in quickadd operations.
#[derive(Error, Debug)]
pub enum QuickAddError {
    #[error("Please enter a redirect origin URL.")]
    EmptyRedirectOrigin,

    #[error("Invalid redirect origin '{0}': {1}")]
    InvalidRedirectOrigin(String, String),

    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, String),

    #[error("Not a Google Calendar quick-add URL: {0}")]
    NotQuickAdd(String),

    #[error("Invalid quick-add date '{0}'")]
    InvalidDate(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Tabs error: {0}")]
    Tabs(String),

    #[error("Context menu error: {0}")]
    ContextMenu(String),
}

/// Result type alias for quickadd operations.
pub type QuickAddResult<T> = Result<T, QuickAddError>;
