//! The shared FIFO of pending evaluator tasks.
//!
//! Every task receives its own [`TaskQueue`] handle. All handles share the
//! same underlying queue, but each carries its own cancellation flag so the
//! engine can stop a timed-out task from feeding more work into the run.
//!
//! Cancellation, pushes and [`TaskQueue::attach`] all happen under the queue
//! lock, so a task either attaches its results before it is cancelled or
//! not at all.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use outdiff_tree::{DiffNode, NodeSpec};
use tracing::warn;

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;

/// A pending unit of comparison work.
pub type Task = Box<dyn Evaluator>;

struct Shared {
    pending: Mutex<VecDeque<Task>>,
    enqueued: AtomicUsize,
}

#[derive(Default)]
struct HandleState {
    cancelled: AtomicBool,
    attached: AtomicBool,
}

/// Handle to the shared task queue.
///
/// Cloning a handle shares both the queue and the cancellation flag.
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
    state: Arc<HandleState>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .field("enqueued", &self.total_enqueued())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(VecDeque::new()),
                enqueued: AtomicUsize::new(0),
            }),
            state: Arc::default(),
        }
    }

    /// Append a task to the tail of the queue.
    ///
    /// Returns `false` and drops the task if this handle was cancelled.
    pub fn push(&self, task: Task) -> bool {
        let mut pending = self.shared.pending.lock().expect("queue lock poisoned");
        // Checked under the queue lock so a push can never slip in after
        // `cancel` has returned.
        if self.is_cancelled() {
            drop(pending);
            warn!(task = %task.label(), "dropping task pushed through a cancelled queue handle");
            return false;
        }
        pending.push_back(task);
        self.shared.enqueued.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Remove the task at the head of the queue.
    pub fn pop(&self) -> Option<Task> {
        self.shared
            .pending
            .lock()
            .expect("queue lock poisoned")
            .pop_front()
    }

    /// Number of tasks currently waiting.
    pub fn len(&self) -> usize {
        self.shared.pending.lock().expect("queue lock poisoned").len()
    }

    /// Returns `true` if no task is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tasks ever accepted by this queue.
    pub fn total_enqueued(&self) -> usize {
        self.shared.enqueued.load(Ordering::Relaxed)
    }

    /// Returns `true` if this handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`EvalError::Cancelled`] if this handle has been cancelled.
    ///
    /// Lets an evaluator stop early between slow reads. Attaching goes
    /// through [`Self::attach`], which repeats the check atomically.
    pub fn ensure_active(&self) -> EvalResult<()> {
        if self.is_cancelled() {
            Err(EvalError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Attach `spec` under `parent` unless this handle has been cancelled.
    ///
    /// Once a task has attached through its handle, the engine no longer
    /// cancels it and waits for it to finish instead.
    pub fn attach(&self, parent: &DiffNode, spec: NodeSpec) -> EvalResult<DiffNode> {
        let _pending = self.shared.pending.lock().expect("queue lock poisoned");
        if self.is_cancelled() {
            return Err(EvalError::Cancelled);
        }
        let node = parent.add_child(spec)?;
        self.state.attached.store(true, Ordering::Release);
        Ok(node)
    }

    /// A new handle on the same queue with its own cancellation flag.
    pub(crate) fn task_handle(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            state: Arc::default(),
        }
    }

    /// Cancel this handle unless its task has already attached results.
    ///
    /// Returns `true` if the handle is now cancelled: later pushes and
    /// attaches through it are discarded.
    pub(crate) fn try_cancel(&self) -> bool {
        let _pending = self.shared.pending.lock().expect("queue lock poisoned");
        if self.state.attached.load(Ordering::Acquire) {
            return false;
        }
        self.state.cancelled.store(true, Ordering::Release);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalResult;
    use crate::evaluator::{produce_one, Produced};
    use outdiff_tree::{DiffNode, DiffTreeNode, NodeSpec};

    struct Named {
        name: &'static str,
        parent: DiffNode,
    }

    impl Evaluator for Named {
        fn label(&self) -> String {
            self.name.to_string()
        }

        fn parent(&self) -> &DiffNode {
            &self.parent
        }

        fn execute(self: Box<Self>, _queue: &TaskQueue) -> EvalResult<Produced> {
            Ok(produce_one(self.parent.add_child(NodeSpec::new(self.name))?))
        }
    }

    fn named(name: &'static str) -> Task {
        Box::new(Named {
            name,
            parent: DiffTreeNode::root("r"),
        })
    }

    #[test]
    fn fifo_order() {
        let queue = TaskQueue::new();
        assert!(queue.push(named("a")));
        assert!(queue.push(named("b")));
        assert!(queue.push(named("c")));

        assert_eq!(queue.len(), 3);
        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|t| t.label()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
        assert_eq!(queue.total_enqueued(), 3);
    }

    #[test]
    fn cancelled_handle_drops_pushes() {
        let queue = TaskQueue::new();
        let handle = queue.task_handle();
        assert!(handle.try_cancel());

        assert!(handle.is_cancelled());
        assert!(matches!(handle.ensure_active(), Err(EvalError::Cancelled)));
        assert!(!handle.push(named("late")));

        // Other handles on the same queue are unaffected.
        assert!(!queue.is_cancelled());
        assert!(queue.push(named("on-time")));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn cancelled_handle_cannot_attach() {
        let queue = TaskQueue::new();
        let parent = DiffTreeNode::root("pudl.sqlite");
        let handle = queue.task_handle();

        assert!(handle.try_cancel());
        let err = handle.attach(&parent, NodeSpec::new("plants")).unwrap_err();
        assert!(matches!(err, EvalError::Cancelled));
        assert_eq!(parent.child_count(), 0);
    }

    #[test]
    fn attached_handle_is_not_cancelled() {
        let queue = TaskQueue::new();
        let parent = DiffTreeNode::root("pudl.sqlite");
        let handle = queue.task_handle();

        let node = handle.attach(&parent, NodeSpec::new("plants")).unwrap();
        assert_eq!(node.parent_id(), Some(parent.id()));
        assert!(!handle.try_cancel());
        assert!(!handle.is_cancelled());
        assert!(handle.push(named("follow-up")));
    }

    #[test]
    fn attach_propagates_tree_errors() {
        let parent = DiffTreeNode::root("pudl.sqlite");
        let queue = TaskQueue::new();
        queue.attach(&parent, NodeSpec::new("plants")).unwrap();
        let err = queue.attach(&parent, NodeSpec::new("plants")).unwrap_err();
        assert!(matches!(err, EvalError::Tree(_)));
    }
}
