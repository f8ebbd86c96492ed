//! The diff tree: a hierarchy of comparison results.
//!
//! Nodes are shared behind [`Arc`] so that an evaluator running on one
//! worker can hold a reference to its designated parent while other workers
//! attach siblings. The children vector is append-only and guarded by a
//! `RwLock`; the duplicate-name check and the push happen in the same
//! critical section.

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::keyset::KeySetDiff;
use crate::snapshot::TreeSnapshot;

/// Shared handle to a node in the diff tree.
pub type DiffNode = Arc<DiffTreeNode>;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Unique identifier of a tree node (UUID v7).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(uuid::Uuid);

impl NodeId {
    /// Generate a new time-ordered node ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short_id())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// A scalar property that differs between the two sides
/// (e.g. a column type or a row count).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: String,
    pub left: String,
    pub right: String,
}

impl Mismatch {
    pub fn new(field: impl Into<String>, left: impl ToString, right: impl ToString) -> Self {
        Self {
            field: field.into(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// Why a comparison could not be made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A location could not be listed, fetched or opened.
    ResourceUnavailable,
    /// A recognized file failed to parse as its expected type.
    FormatInvalid,
    /// The task exceeded its time budget.
    TimedOut,
    /// The task was cancelled before it finished.
    Cancelled,
    /// The evaluator panicked.
    Panicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ResourceUnavailable => "resource unavailable",
            Self::FormatInvalid => "format invalid",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
            Self::Panicked => "panicked",
        };
        f.write_str(s)
    }
}

/// Payload of an error-marker node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub kind: ErrorKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// NodeSpec
// ---------------------------------------------------------------------------

/// Everything a node carries except its identity and position.
///
/// Evaluators build one of these and hand it to
/// [`DiffTreeNode::add_child`], which is the only way to create a
/// non-root node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub diff: Option<KeySetDiff>,
    pub mismatches: Vec<Mismatch>,
    pub error: Option<ErrorMarker>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_diff(mut self, diff: KeySetDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_mismatch(mut self, mismatch: Mismatch) -> Self {
        self.mismatches.push(mismatch);
        self
    }

    pub fn with_mismatches(mut self, mismatches: impl IntoIterator<Item = Mismatch>) -> Self {
        self.mismatches.extend(mismatches);
        self
    }

    fn error_marker(name: String, kind: ErrorKind, message: String) -> Self {
        Self {
            name,
            error: Some(ErrorMarker { kind, message }),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// DiffTreeNode
// ---------------------------------------------------------------------------

/// A node of the diff tree.
///
/// A node's `diff` describes the comparison performed at its own level;
/// its children are the deeper comparisons delegated to sub-evaluators.
/// Nodes are never removed and never moved to another parent.
pub struct DiffTreeNode {
    id: NodeId,
    name: String,
    parent: Option<NodeId>,
    diff: Option<KeySetDiff>,
    mismatches: Vec<Mismatch>,
    error: Option<ErrorMarker>,
    children: RwLock<Vec<DiffNode>>,
}

impl fmt::Debug for DiffTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffTreeNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("diff", &self.diff)
            .field("mismatches", &self.mismatches.len())
            .field("error", &self.error)
            .field("children", &self.child_count())
            .finish()
    }
}

impl DiffTreeNode {
    /// Create a fresh root node with no parent and no children.
    pub fn root(name: impl Into<String>) -> DiffNode {
        Arc::new(Self::from_spec(NodeSpec::new(name), None))
    }

    fn from_spec(spec: NodeSpec, parent: Option<NodeId>) -> Self {
        Self {
            id: NodeId::new(),
            name: spec.name,
            parent,
            diff: spec.diff,
            mismatches: spec.mismatches,
            error: spec.error,
            children: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// ID of the parent node, `None` for the root.
    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn diff(&self) -> Option<&KeySetDiff> {
        self.diff.as_ref()
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn error(&self) -> Option<&ErrorMarker> {
        self.error.as_ref()
    }

    pub fn is_error_marker(&self) -> bool {
        self.error.is_some()
    }

    // ---------------------------------------------------------------
    // Attachment
    // ---------------------------------------------------------------

    /// Create a node from `spec` and append it to this node's children.
    ///
    /// Fails if the name is empty or a sibling already uses it.
    pub fn add_child(&self, spec: NodeSpec) -> TreeResult<DiffNode> {
        if spec.name.is_empty() {
            return Err(TreeError::EmptyName {
                parent: self.name.clone(),
            });
        }

        let mut children = self.children.write().expect("children lock poisoned");
        if children.iter().any(|c| c.name == spec.name) {
            return Err(TreeError::DuplicateChild {
                parent: self.name.clone(),
                name: spec.name,
            });
        }

        let child = Arc::new(Self::from_spec(spec, Some(self.id)));
        children.push(Arc::clone(&child));
        Ok(child)
    }

    /// Attach an error-marker child recording why `label` could not be
    /// compared.
    ///
    /// The marker takes `label` as its name, or `label (failed)`,
    /// `label (failed 2)`, ... if that name is taken.
    pub fn add_error_marker(
        &self,
        label: &str,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> DiffNode {
        let mut children = self.children.write().expect("children lock poisoned");
        let taken = |name: &str| children.iter().any(|c| c.name == name);

        let base = if label.is_empty() { "task" } else { label };
        let mut name = base.to_string();
        let mut attempt = 1;
        while taken(&name) {
            name = if attempt == 1 {
                format!("{base} (failed)")
            } else {
                format!("{base} (failed {attempt})")
            };
            attempt += 1;
        }

        let spec = NodeSpec::error_marker(name, kind, message.into());
        let child = Arc::new(Self::from_spec(spec, Some(self.id)));
        children.push(Arc::clone(&child));
        child
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Snapshot of the current children, in attachment order.
    pub fn children(&self) -> Vec<DiffNode> {
        self.children.read().expect("children lock poisoned").clone()
    }

    pub fn child_count(&self) -> usize {
        self.children.read().expect("children lock poisoned").len()
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<DiffNode> {
        self.children
            .read()
            .expect("children lock poisoned")
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Returns `true` if `id` is a direct child of this node.
    pub fn has_child(&self, id: NodeId) -> bool {
        self.children
            .read()
            .expect("children lock poisoned")
            .iter()
            .any(|c| c.id == id)
    }

    /// Length of the longest downward path, in edges. A leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Number of error markers in this subtree.
    pub fn error_count(&self) -> usize {
        let own = usize::from(self.is_error_marker());
        own + self.children().iter().map(|c| c.error_count()).sum::<usize>()
    }

    /// Returns `true` if anything in this subtree differs or failed.
    pub fn has_differences(&self) -> bool {
        let own = self.error.is_some()
            || !self.mismatches.is_empty()
            || self.diff.as_ref().is_some_and(|d| !d.is_identical());
        own || self.children().iter().any(|c| c.has_differences())
    }

    /// Owned copy of this subtree.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            name: self.name.clone(),
            diff: self.diff.clone(),
            mismatches: self.mismatches.clone(),
            error: self.error.clone(),
            children: self.children().iter().map(|c| c.snapshot()).collect(),
        }
    }
}
