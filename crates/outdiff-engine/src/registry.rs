//! Dispatch registry: which evaluator handles which shared item.
//!
//! Container-level evaluators (such as the directory evaluator) consult the
//! registry for every item present on both sides. The first rule whose
//! matcher accepts the item's name builds the evaluator that compares it.
//! Items no rule matches are compared for presence only.

use std::fmt;
use std::sync::Arc;

use outdiff_tree::DiffNode;

use crate::queue::Task;

/// An item present on both sides, ready for deeper comparison.
#[derive(Clone, Debug)]
pub struct SharedItem {
    /// Relative name of the item (e.g. `pudl.sqlite`).
    pub name: String,
    /// Fully-qualified location on the left side.
    pub left: String,
    /// Fully-qualified location on the right side.
    pub right: String,
    /// Node the new evaluator must attach its results to.
    pub parent: DiffNode,
}

/// Builds an evaluator for a matched item.
pub type Constructor = Arc<dyn Fn(SharedItem) -> Task + Send + Sync>;

/// Decides whether a rule applies to an item name.
#[derive(Clone)]
pub enum Matcher {
    /// Name ends with the given suffix (case-sensitive).
    Suffix(String),
    /// Name equals the given string.
    Exact(String),
    /// Arbitrary predicate over the name.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Matcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
            Self::Exact(exact) => name == exact,
            Self::Predicate(p) => p(name),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suffix(s) => f.debug_tuple("Suffix").field(s).finish(),
            Self::Exact(s) => f.debug_tuple("Exact").field(s).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Clone)]
struct Rule {
    name: String,
    matcher: Matcher,
    build: Constructor,
}

/// Ordered list of (matcher, constructor) rules.
#[derive(Clone, Default)]
pub struct EvaluatorRegistry {
    rules: Vec<Rule>,
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| (&r.name, &r.matcher)))
            .finish()
    }
}

impl EvaluatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules are tried in registration order.
    pub fn register<F>(&mut self, name: impl Into<String>, matcher: Matcher, build: F)
    where
        F: Fn(SharedItem) -> Task + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name: name.into(),
            matcher,
            build: Arc::new(build),
        });
    }

    /// Append a rule matching names that end with `suffix`.
    pub fn register_suffix<F>(&mut self, suffix: &str, build: F)
    where
        F: Fn(SharedItem) -> Task + Send + Sync + 'static,
    {
        self.register(suffix, Matcher::Suffix(suffix.to_string()), build);
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Name of the first rule matching `item_name`, if any.
    pub fn rule_for(&self, item_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.matcher.matches(item_name))
            .map(|r| r.name.as_str())
    }

    /// Build the evaluator for `item` using the first matching rule.
    pub fn build(&self, item: SharedItem) -> Option<Task> {
        let rule = self.rules.iter().find(|r| r.matcher.matches(&item.name))?;
        Some((rule.build)(item))
    }
}
