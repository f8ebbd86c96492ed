//! Error types for the SQLite crate.

use outdiff_engine::EvalError;

/// Errors raised while fetching or reading a SQLite database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file does not exist or cannot be opened.
    #[error("resource unavailable: {location}: {reason}")]
    ResourceUnavailable { location: String, reason: String },

    /// The file exists but is not a SQLite database.
    #[error("invalid format: {location}: {reason}")]
    FormatInvalid { location: String, reason: String },

    /// A catalog or count query failed on an otherwise valid database.
    #[error("query failed on {location}: {reason}")]
    Query { location: String, reason: String },

    /// No fetcher is available for the location's storage backend.
    #[error("unsupported location scheme '{scheme}': {location}")]
    UnsupportedScheme { scheme: String, location: String },
}

impl StoreError {
    /// Classify a rusqlite error raised while reading `location`.
    pub(crate) fn from_sqlite(location: &str, err: rusqlite::Error) -> Self {
        let location = location.to_string();
        let reason = err.to_string();
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.code),
            _ => None,
        };
        match code {
            Some(rusqlite::ErrorCode::NotADatabase) => Self::FormatInvalid { location, reason },
            Some(rusqlite::ErrorCode::CannotOpen)
            | Some(rusqlite::ErrorCode::PermissionDenied)
            | Some(rusqlite::ErrorCode::DatabaseBusy)
            | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                Self::ResourceUnavailable { location, reason }
            }
            _ => Self::Query { location, reason },
        }
    }
}

impl From<StoreError> for EvalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::FormatInvalid { location, reason } => {
                EvalError::FormatInvalid { location, reason }
            }
            StoreError::ResourceUnavailable { location, reason }
            | StoreError::Query { location, reason } => {
                EvalError::ResourceUnavailable { location, reason }
            }
            StoreError::UnsupportedScheme { scheme, location } => EvalError::ResourceUnavailable {
                location,
                reason: format!("no fetcher for scheme '{scheme}'"),
            },
        }
    }
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
