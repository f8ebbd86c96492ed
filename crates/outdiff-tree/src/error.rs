//! Error types for the tree crate.

/// Errors raised when a tree invariant would be violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A sibling with the same name is already attached to the parent.
    #[error("node '{parent}' already has a child named '{name}'")]
    DuplicateChild { parent: String, name: String },

    /// A node name must not be empty.
    #[error("node under '{parent}' has an empty name")]
    EmptyName { parent: String },

    /// A key-set diff listed the same key in more than one partition.
    #[error("key '{key}' appears in more than one partition")]
    OverlappingKey { key: String },
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
