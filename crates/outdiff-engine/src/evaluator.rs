use outdiff_tree::DiffNode;

use crate::error::EvalResult;
use crate::queue::TaskQueue;

// ---------------------------------------------------------------------------
// Produced
// ---------------------------------------------------------------------------

/// The nodes an evaluator created at its own level.
///
/// A lazy, finite, one-shot sequence; the engine drains it exactly once.
/// Descendants are not included, they arrive later through queued
/// sub-evaluators.
pub type Produced = Box<dyn Iterator<Item = DiffNode> + Send>;

/// Wrap a single node as a [`Produced`] sequence.
pub fn produce_one(node: DiffNode) -> Produced {
    Box::new(std::iter::once(node))
}

/// Wrap a list of nodes as a [`Produced`] sequence.
pub fn produce(nodes: Vec<DiffNode>) -> Produced {
    Box::new(nodes.into_iter())
}

// ---------------------------------------------------------------------------
// Evaluator trait
// ---------------------------------------------------------------------------

/// A unit of comparison work.
///
/// An evaluator compares exactly one level: it reads what it needs from its
/// external collaborators, attaches its result node(s) to its designated
/// [`parent`](Evaluator::parent), and may push further evaluators onto the
/// queue targeting the nodes it just created.
///
/// Read failures are returned as non-fatal [`EvalError`](crate::EvalError)s;
/// the engine turns them into error markers under the designated parent.
///
/// `execute` consumes the evaluator, so a task can only ever run once.
/// Implementations run on a blocking worker thread and may do blocking I/O.
pub trait Evaluator: Send {
    /// Human-readable name of this task (e.g. the file being compared).
    fn label(&self) -> String;

    /// The node this evaluator attaches its results to.
    fn parent(&self) -> &DiffNode;

    /// Perform the comparison.
    fn execute(self: Box<Self>, queue: &TaskQueue) -> EvalResult<Produced>;
}
