//! Diff tree for outdiff.
//!
//! Holds the two data structures every evaluator writes into: the
//! [`KeySetDiff`] computed at each level of comparison, and the
//! [`DiffTreeNode`] hierarchy that collects those results.
//!
//! # Key Types
//!
//! - [`KeySetDiff`] -- Left-only / right-only / shared partition of two key sets
//! - [`DiffTreeNode`] / [`DiffNode`] -- Shared, append-only result tree
//! - [`NodeSpec`] -- Description of a node before it is attached
//! - [`Mismatch`] -- Scalar value that differs between the two sides
//! - [`ErrorMarker`] / [`ErrorKind`] -- Record of a comparison that could not be made
//! - [`TreeSnapshot`] -- Owned, serializable copy of a subtree

pub mod error;
pub mod keyset;
pub mod node;
pub mod snapshot;

pub use error::{TreeError, TreeResult};
pub use keyset::KeySetDiff;
pub use node::{DiffNode, DiffTreeNode, ErrorKind, ErrorMarker, Mismatch, NodeId, NodeSpec};
pub use snapshot::TreeSnapshot;
