//! Error types for the engine crate.

use outdiff_tree::{ErrorKind, TreeError};

/// Errors an evaluator can return from `execute`.
///
/// Everything except [`EvalError::Tree`] is local to the failing task: the
/// engine records it as an error marker and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A location could not be listed, fetched or opened.
    #[error("resource unavailable: {location}: {reason}")]
    ResourceUnavailable { location: String, reason: String },

    /// A recognized item failed to parse as its expected type.
    #[error("invalid format: {location}: {reason}")]
    FormatInvalid { location: String, reason: String },

    /// The task's queue handle was cancelled (e.g. after a timeout).
    #[error("task cancelled")]
    Cancelled,

    /// A tree invariant was violated. Aborts the run.
    #[error("tree invariant violated: {0}")]
    Tree(#[from] TreeError),
}

impl EvalError {
    pub fn resource_unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn format_invalid(location: impl Into<String>, reason: impl ToString) -> Self {
        Self::FormatInvalid {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// The kind recorded on the error marker, `None` for fatal errors.
    pub fn marker_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::ResourceUnavailable { .. } => Some(ErrorKind::ResourceUnavailable),
            Self::FormatInvalid { .. } => Some(ErrorKind::FormatInvalid),
            Self::Cancelled => Some(ErrorKind::Cancelled),
            Self::Tree(_) => None,
        }
    }
}

/// Convenience alias for evaluator results.
pub type EvalResult<T> = Result<T, EvalError>;

/// Conditions that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The root evaluator does not target a fresh, childless root node.
    #[error("root evaluator '{label}' must target a fresh root node")]
    InvalidSeed { label: String },

    /// A task returned a node that is not a child of its designated parent.
    #[error("task '{label}' produced node '{node}' outside its designated parent '{parent}'")]
    DetachedNode {
        label: String,
        node: String,
        parent: String,
    },

    /// An evaluator reported a fatal error.
    #[error("fatal error in task '{label}': {source}")]
    Fatal {
        label: String,
        #[source]
        source: EvalError,
    },

    /// The dispatcher itself failed to join a worker.
    #[error("worker join failed: {0}")]
    Join(String),

    /// The run ended with tasks still queued.
    #[error("run ended with {0} task(s) still queued")]
    Undrained(usize),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
