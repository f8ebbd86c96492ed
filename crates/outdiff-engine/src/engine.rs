use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use outdiff_tree::{DiffNode, ErrorKind};
use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, EvalError};
use crate::queue::{Task, TaskQueue};

// ---------------------------------------------------------------------------
// RunStats / RunReport
// ---------------------------------------------------------------------------

/// Counters collected over one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Tasks taken off the queue and started.
    pub dispatched: usize,
    /// Tasks that returned their nodes.
    pub completed: usize,
    /// Tasks recorded as error markers.
    pub failed: usize,
    /// Nodes returned by completed tasks.
    pub nodes_produced: usize,
    /// Highest number of tasks executing at once.
    pub peak_in_flight: usize,
}

/// The outcome of a drained run.
#[derive(Debug)]
pub struct RunReport {
    /// Root of the finished diff tree.
    pub root: DiffNode,
    pub stats: RunStats,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Task execution
// ---------------------------------------------------------------------------

enum TaskOutcome {
    Completed(Vec<DiffNode>),
    Failed(EvalError),
    Aborted { kind: ErrorKind, message: String },
}

struct Finished {
    label: String,
    parent: DiffNode,
    outcome: TaskOutcome,
}

/// Run one task on the blocking pool and classify how it ended.
async fn execute_task(task: Task, queue: TaskQueue, timeout: Option<Duration>) -> Finished {
    let label = task.label();
    let parent = Arc::clone(task.parent());

    let worker_queue = queue.clone();
    let mut handle = tokio::task::spawn_blocking(move || {
        task.execute(&worker_queue)
            .map(|produced| produced.collect::<Vec<_>>())
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) if queue.try_cancel() => {
                return Finished {
                    label,
                    parent,
                    outcome: TaskOutcome::Aborted {
                        kind: ErrorKind::TimedOut,
                        message: format!("no result after {limit:?}"),
                    },
                };
            }
            Err(_) => {
                // Results are already in the tree; let the task finish.
                debug!(task = %label, "deadline passed after results were attached");
                handle.await
            }
        },
        None => handle.await,
    };

    let outcome = match joined {
        Ok(Ok(nodes)) => TaskOutcome::Completed(nodes),
        Ok(Err(err)) => TaskOutcome::Failed(err),
        Err(join_err) => abort_outcome(join_err),
    };
    Finished {
        label,
        parent,
        outcome,
    }
}

fn abort_outcome(err: JoinError) -> TaskOutcome {
    if err.is_cancelled() {
        return TaskOutcome::Aborted {
            kind: ErrorKind::Cancelled,
            message: "worker cancelled".into(),
        };
    }
    let payload = err.into_panic();
    TaskOutcome::Aborted {
        kind: ErrorKind::Panicked,
        message: panic_message(payload.as_ref()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("evaluator panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("evaluator panicked: {s}")
    } else {
        "evaluator panicked".into()
    }
}

// ---------------------------------------------------------------------------
// DiffEngine
// ---------------------------------------------------------------------------

/// Work-queue driven diff tree builder.
///
/// The engine seeds a FIFO queue with one root evaluator and keeps
/// dispatching tasks (up to [`EngineConfig::workers`] at a time) until the
/// queue is empty **and** no task is still executing. Tasks enqueue their
/// follow-up work before they finish, so once both conditions hold no more
/// work can appear.
///
/// Failures of individual tasks become error-marker children of the task's
/// designated parent and never stop other tasks. Only tree invariant
/// violations abort the run.
#[derive(Clone, Debug, Default)]
pub struct DiffEngine {
    config: EngineConfig,
}

impl DiffEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Evaluate `seed` and everything it discovers; return the root node.
    pub async fn run(&self, seed: Task) -> EngineResult<DiffNode> {
        self.run_report(seed).await.map(|report| report.root)
    }

    /// Like [`Self::run`], also returning run statistics.
    ///
    /// The seed's designated parent must be a fresh root: no parent of its
    /// own and no children yet.
    pub async fn run_report(&self, seed: Task) -> EngineResult<RunReport> {
        let started = Instant::now();
        let root = Arc::clone(seed.parent());
        if !root.is_root() || root.child_count() > 0 {
            return Err(EngineError::InvalidSeed {
                label: seed.label(),
            });
        }

        let workers = self.config.effective_workers();
        let timeout = self.config.task_timeout();
        info!(root = %root.name(), seed = %seed.label(), workers, "diff run started");

        let queue = TaskQueue::new();
        queue.push(seed);

        let mut stats = RunStats::default();
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.len() < workers {
                let Some(task) = queue.pop() else { break };
                stats.dispatched += 1;
                debug!(task = %task.label(), queued = queue.len(), "dispatching task");
                in_flight.spawn(execute_task(task, queue.task_handle(), timeout));
                stats.peak_in_flight = stats.peak_in_flight.max(in_flight.len());
            }

            // Nothing running and nothing left to start: drained.
            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let finished = joined.map_err(|e| EngineError::Join(e.to_string()))?;
            settle(finished, &mut stats)?;
        }

        if !queue.is_empty() {
            return Err(EngineError::Undrained(queue.len()));
        }

        let elapsed = started.elapsed();
        info!(
            dispatched = stats.dispatched,
            completed = stats.completed,
            failed = stats.failed,
            nodes = stats.nodes_produced,
            ?elapsed,
            "diff run drained"
        );
        Ok(RunReport {
            root,
            stats,
            elapsed,
        })
    }
}

/// Fold one finished task into the tree and the stats.
fn settle(finished: Finished, stats: &mut RunStats) -> EngineResult<()> {
    let Finished {
        label,
        parent,
        outcome,
    } = finished;

    match outcome {
        TaskOutcome::Completed(nodes) => {
            for node in &nodes {
                if node.parent_id() != Some(parent.id()) || !parent.has_child(node.id()) {
                    error!(task = %label, node = %node.name(), parent = %parent.name(), "detached node");
                    return Err(EngineError::DetachedNode {
                        label,
                        node: node.name().to_string(),
                        parent: parent.name().to_string(),
                    });
                }
            }
            stats.completed += 1;
            stats.nodes_produced += nodes.len();
            debug!(task = %label, nodes = nodes.len(), "task completed");
        }
        TaskOutcome::Failed(err) => match err.marker_kind() {
            Some(kind) => record_failure(&parent, &label, kind, err.to_string(), stats),
            None => {
                error!(task = %label, error = %err, "fatal evaluator error");
                return Err(EngineError::Fatal { label, source: err });
            }
        },
        TaskOutcome::Aborted { kind, message } => {
            record_failure(&parent, &label, kind, message, stats)
        }
    }
    Ok(())
}

fn record_failure(parent: &DiffNode, label: &str, kind: ErrorKind, message: String, stats: &mut RunStats) {
    warn!(task = %label, parent = %parent.name(), %kind, %message, "task failed");
    parent.add_error_marker(label, kind, message);
    stats.failed += 1;
}
