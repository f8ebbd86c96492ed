//! Key-set diff: partition two sets of names into left-only, right-only and
//! shared.
//!
//! Every level of the diff tree starts with one of these. It answers "which
//! items exist where" before any evaluator decides how to compare the items
//! that exist on both sides.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Three-way partition of two key sets.
///
/// The three sets are pairwise disjoint, `shared` is the intersection of the
/// inputs and the union of all three equals the union of the inputs. The
/// value is immutable once built. Deserialized values are checked for
/// disjointness.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Partitions")]
pub struct KeySetDiff {
    only_left: BTreeSet<String>,
    only_right: BTreeSet<String>,
    shared: BTreeSet<String>,
}

/// Unchecked wire form of [`KeySetDiff`].
#[derive(Deserialize)]
struct Partitions {
    #[serde(default)]
    only_left: BTreeSet<String>,
    #[serde(default)]
    only_right: BTreeSet<String>,
    #[serde(default)]
    shared: BTreeSet<String>,
}

impl TryFrom<Partitions> for KeySetDiff {
    type Error = TreeError;

    fn try_from(p: Partitions) -> Result<Self, Self::Error> {
        let overlap = p
            .only_left
            .intersection(&p.only_right)
            .chain(p.only_left.intersection(&p.shared))
            .chain(p.only_right.intersection(&p.shared))
            .next();
        if let Some(key) = overlap {
            return Err(TreeError::OverlappingKey { key: key.clone() });
        }
        Ok(Self {
            only_left: p.only_left,
            only_right: p.only_right,
            shared: p.shared,
        })
    }
}

impl KeySetDiff {
    /// Partition `left` and `right`.
    pub fn from_sets(left: &BTreeSet<String>, right: &BTreeSet<String>) -> Self {
        Self {
            only_left: left.difference(right).cloned().collect(),
            only_right: right.difference(left).cloned().collect(),
            shared: left.intersection(right).cloned().collect(),
        }
    }

    /// Partition two arbitrary collections of keys. Duplicates collapse.
    pub fn from_keys<L, R, S>(left: L, right: R) -> Self
    where
        L: IntoIterator<Item = S>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let left: BTreeSet<String> = left.into_iter().map(Into::into).collect();
        let right: BTreeSet<String> = right.into_iter().map(Into::into).collect();
        Self::from_sets(&left, &right)
    }

    /// Keys present only on the left side.
    pub fn only_left(&self) -> &BTreeSet<String> {
        &self.only_left
    }

    /// Keys present only on the right side.
    pub fn only_right(&self) -> &BTreeSet<String> {
        &self.only_right
    }

    /// Keys present on both sides.
    pub fn shared(&self) -> &BTreeSet<String> {
        &self.shared
    }

    /// Returns `true` if both sides hold exactly the same keys.
    pub fn is_identical(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty()
    }

    /// Returns `true` if neither side had any keys.
    pub fn is_empty(&self) -> bool {
        self.is_identical() && self.shared.is_empty()
    }

    /// Number of keys on the left side.
    pub fn left_len(&self) -> usize {
        self.only_left.len() + self.shared.len()
    }

    /// Number of keys on the right side.
    pub fn right_len(&self) -> usize {
        self.only_right.len() + self.shared.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn partitions_mixed_sets() {
        let left = set(&["a.sqlite", "b.txt", "c.sqlite"]);
        let right = set(&["a.sqlite", "c.sqlite", "d.txt"]);

        let diff = KeySetDiff::from_sets(&left, &right);
        assert_eq!(diff.only_left(), &set(&["b.txt"]));
        assert_eq!(diff.only_right(), &set(&["d.txt"]));
        assert_eq!(diff.shared(), &set(&["a.sqlite", "c.sqlite"]));
        assert!(!diff.is_identical());
        assert_eq!(diff.left_len(), 3);
        assert_eq!(diff.right_len(), 3);
    }

    #[test]
    fn empty_inputs_give_empty_diff() {
        let diff = KeySetDiff::from_sets(&BTreeSet::new(), &BTreeSet::new());
        assert!(diff.is_empty());
        assert!(diff.is_identical());
        assert_eq!(diff, KeySetDiff::default());
    }

    #[test]
    fn one_sided_inputs() {
        let diff = KeySetDiff::from_keys(["x", "y"], Vec::<&str>::new());
        assert_eq!(diff.only_left(), &set(&["x", "y"]));
        assert!(diff.only_right().is_empty());
        assert!(diff.shared().is_empty());
    }

    #[test]
    fn identical_inputs() {
        let diff = KeySetDiff::from_keys(["t1", "t2"], ["t2", "t1"]);
        assert!(diff.is_identical());
        assert_eq!(diff.shared(), &set(&["t1", "t2"]));
    }

    #[test]
    fn serializes_as_three_sets() {
        let diff = KeySetDiff::from_keys(["a", "b"], ["b", "c"]);
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["only_left"], serde_json::json!(["a"]));
        assert_eq!(json["only_right"], serde_json::json!(["c"]));
        assert_eq!(json["shared"], serde_json::json!(["b"]));
    }

    #[test]
    fn deserializes_disjoint_partitions() {
        let diff = KeySetDiff::from_keys(["a", "b"], ["b", "c"]);
        let json = serde_json::to_string(&diff).unwrap();
        let back: KeySetDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diff);
    }

    #[test]
    fn rejects_overlapping_partitions() {
        let json = r#"{"only_left":["a","b"],"only_right":[],"shared":["b"]}"#;
        let err = serde_json::from_str::<KeySetDiff>(json).unwrap_err();
        assert!(err.to_string().contains("'b'"), "got {err}");

        let json = r#"{"only_left":["x"],"only_right":["x"],"shared":[]}"#;
        assert!(serde_json::from_str::<KeySetDiff>(json).is_err());
    }

    fn key_set() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-e]{1,2}", 0..12)
    }

    proptest! {
        #[test]
        fn partition_laws(a in key_set(), b in key_set()) {
            let diff = KeySetDiff::from_sets(&a, &b);

            prop_assert!(diff.only_left().is_disjoint(diff.only_right()));
            prop_assert!(diff.only_left().is_disjoint(diff.shared()));
            prop_assert!(diff.only_right().is_disjoint(diff.shared()));

            let intersection: BTreeSet<String> = a.intersection(&b).cloned().collect();
            prop_assert_eq!(diff.shared(), &intersection);

            let left: BTreeSet<String> = diff.only_left().union(diff.shared()).cloned().collect();
            let right: BTreeSet<String> = diff.only_right().union(diff.shared()).cloned().collect();
            prop_assert_eq!(left, a);
            prop_assert_eq!(right, b);
        }

        #[test]
        fn swapping_sides_mirrors_the_diff(a in key_set(), b in key_set()) {
            let forward = KeySetDiff::from_sets(&a, &b);
            let backward = KeySetDiff::from_sets(&b, &a);

            prop_assert_eq!(forward.only_left(), backward.only_right());
            prop_assert_eq!(forward.only_right(), backward.only_left());
            prop_assert_eq!(forward.shared(), backward.shared());
        }
    }
}
