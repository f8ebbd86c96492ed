//! Error types for the listing crate.

use outdiff_engine::EvalError;

/// Errors that can occur while listing a directory.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// The location does not exist, is not a directory, or cannot be read.
    #[error("resource unavailable: {location}: {reason}")]
    ResourceUnavailable { location: String, reason: String },

    /// The location names a storage backend this lister cannot reach.
    #[error("unsupported location scheme '{scheme}': {location}")]
    UnsupportedScheme { scheme: String, location: String },
}

impl ListError {
    pub(crate) fn unavailable(location: &str, reason: impl ToString) -> Self {
        Self::ResourceUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<ListError> for EvalError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::ResourceUnavailable { location, reason } => {
                EvalError::ResourceUnavailable { location, reason }
            }
            ListError::UnsupportedScheme { scheme, location } => EvalError::ResourceUnavailable {
                location,
                reason: format!("no lister for scheme '{scheme}'"),
            },
        }
    }
}

/// Convenience alias for listing results.
pub type ListResult<T> = Result<T, ListError>;
