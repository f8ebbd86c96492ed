//! Owned, serializable copy of a diff subtree.

use serde::{Deserialize, Serialize};

use crate::keyset::KeySetDiff;
use crate::node::{ErrorMarker, Mismatch};

/// A detached copy of a [`DiffTreeNode`](crate::DiffTreeNode) and its
/// descendants, taken once evaluation has finished.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<KeySetDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<Mismatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMarker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSnapshot>,
}

impl TreeSnapshot {
    /// Depth-first walk yielding each node together with its depth.
    pub fn walk(&self) -> Vec<(usize, &TreeSnapshot)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Find a descendant by its path of names, starting below this node.
    pub fn find(&self, path: &[&str]) -> Option<&TreeSnapshot> {
        let mut current = self;
        for name in path {
            current = current.children.iter().find(|c| c.name == *name)?;
        }
        Some(current)
    }

    /// Order children by name at every level.
    ///
    /// Siblings attach in completion order, which varies between parallel
    /// runs; sorting gives a stable rendering.
    pub fn sorted(mut self) -> Self {
        self.children = self.children.into_iter().map(Self::sorted).collect();
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }
}
