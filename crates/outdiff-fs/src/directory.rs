//! Directory-level evaluator: the usual root of a diff run.
//!
//! Lists both output directories, records which files exist on which side,
//! and hands every file present on both sides to the evaluator the registry
//! picks for it.

use std::path::Path;
use std::sync::Arc;

use outdiff_engine::{
    produce_one, EvalResult, Evaluator, EvaluatorRegistry, Produced, SharedItem, TaskQueue,
};
use outdiff_tree::{DiffNode, KeySetDiff, NodeSpec};
use tracing::{debug, info};

use crate::lister::Lister;

/// Name of the node a directory comparison attaches.
pub const FILES_NODE: &str = "Files";

/// Compares two output directories for file presence and schedules deeper
/// comparisons for recognized shared files.
pub struct DirectoryEvaluator {
    left_root: String,
    right_root: String,
    parent: DiffNode,
    lister: Arc<dyn Lister>,
    registry: Arc<EvaluatorRegistry>,
    node_name: String,
}

impl DirectoryEvaluator {
    pub fn new(
        left_root: impl Into<String>,
        right_root: impl Into<String>,
        parent: DiffNode,
        lister: Arc<dyn Lister>,
        registry: Arc<EvaluatorRegistry>,
    ) -> Self {
        Self {
            left_root: left_root.into(),
            right_root: right_root.into(),
            parent,
            lister,
            registry,
            node_name: FILES_NODE.to_string(),
        }
    }

    /// Attach results under `name` instead of [`FILES_NODE`].
    pub fn with_node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }
}

impl Evaluator for DirectoryEvaluator {
    fn label(&self) -> String {
        self.node_name.clone()
    }

    fn parent(&self) -> &DiffNode {
        &self.parent
    }

    fn execute(self: Box<Self>, queue: &TaskQueue) -> EvalResult<Produced> {
        let left = self.lister.list(&self.left_root)?;
        queue.ensure_active()?;
        let right = self.lister.list(&self.right_root)?;

        let diff = KeySetDiff::from_keys(left.keys().cloned(), right.keys().cloned());
        let files = queue.attach(&self.parent, NodeSpec::new(&self.node_name).with_diff(diff))?;

        let mut scheduled = 0usize;
        if let Some(diff) = files.diff() {
            for name in diff.shared() {
                let (Some(l), Some(r)) = (left.get(name), right.get(name)) else {
                    continue;
                };
                if Path::new(l).is_dir() || Path::new(r).is_dir() {
                    debug!(file = %name, "directory on at least one side, presence only");
                    continue;
                }
                let item = SharedItem {
                    name: name.clone(),
                    left: l.clone(),
                    right: r.clone(),
                    parent: Arc::clone(&files),
                };
                match self.registry.build(item) {
                    Some(task) => {
                        debug!(file = %name, task = %task.label(), "scheduling deep comparison");
                        if queue.push(task) {
                            scheduled += 1;
                        }
                    }
                    None => debug!(file = %name, "no evaluator registered, presence only"),
                }
            }

            info!(
                left = %self.left_root,
                right = %self.right_root,
                only_left = diff.only_left().len(),
                only_right = diff.only_right().len(),
                shared = diff.shared().len(),
                scheduled,
                "directories compared"
            );
        }

        Ok(produce_one(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use std::sync::Mutex;

    use outdiff_engine::{produce, DiffEngine, EngineConfig, EvalError, Task};
    use outdiff_tree::{DiffTreeNode, ErrorKind};

    use crate::lister::LocalLister;

    /// Attaches one empty node named after the item it was built for.
    struct RecordingEvaluator {
        item: SharedItem,
    }

    impl Evaluator for RecordingEvaluator {
        fn label(&self) -> String {
            self.item.name.clone()
        }

        fn parent(&self) -> &DiffNode {
            &self.item.parent
        }

        fn execute(self: Box<Self>, _queue: &TaskQueue) -> EvalResult<Produced> {
            if self.item.name.starts_with("broken") {
                return Err(EvalError::format_invalid(&self.item.left, "not a database"));
            }
            let node = self.item.parent.add_child(NodeSpec::new(&self.item.name))?;
            Ok(produce(vec![node]))
        }
    }

    fn recording_registry() -> (Arc<EvaluatorRegistry>, Arc<Mutex<Vec<SharedItem>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut registry = EvaluatorRegistry::new();
        registry.register_suffix(".sqlite", move |item: SharedItem| -> Task {
            sink.lock().unwrap().push(item.clone());
            Box::new(RecordingEvaluator { item })
        });
        (Arc::new(registry), seen)
    }

    fn populate(dir: &Path, files: &[&str]) {
        for f in files {
            fs::write(dir.join(f), b"").unwrap();
        }
    }

    fn evaluator(
        left: &Path,
        right: &Path,
        parent: &DiffNode,
        registry: Arc<EvaluatorRegistry>,
    ) -> Box<DirectoryEvaluator> {
        Box::new(DirectoryEvaluator::new(
            left.to_str().unwrap(),
            right.to_str().unwrap(),
            Arc::clone(parent),
            Arc::new(LocalLister::default()),
            registry,
        ))
    }

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn schedules_one_task_per_shared_sqlite_file() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        populate(left.path(), &["a.sqlite", "b.txt", "c.sqlite"]);
        populate(right.path(), &["a.sqlite", "c.sqlite", "d.txt"]);

        let (registry, seen) = recording_registry();
        let root = DiffTreeNode::root("root");
        let queue = TaskQueue::new();

        let produced: Vec<_> = evaluator(left.path(), right.path(), &root, registry)
            .execute(&queue)
            .unwrap()
            .collect();

        assert_eq!(produced.len(), 1);
        let files = &produced[0];
        assert_eq!(files.name(), FILES_NODE);
        assert_eq!(files.parent_id(), Some(root.id()));

        let diff = files.diff().unwrap();
        assert_eq!(diff.only_left(), &set(&["b.txt"]));
        assert_eq!(diff.only_right(), &set(&["d.txt"]));
        assert_eq!(diff.shared(), &set(&["a.sqlite", "c.sqlite"]));

        assert_eq!(queue.len(), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for item in seen.iter() {
            assert_eq!(item.left, left.path().join(&item.name).to_string_lossy());
            assert_eq!(item.right, right.path().join(&item.name).to_string_lossy());
            assert_eq!(item.parent.id(), files.id());
        }
    }

    #[test]
    fn one_sided_sqlite_files_are_not_scheduled() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        populate(left.path(), &["only_left.sqlite"]);
        populate(right.path(), &["only_right.sqlite"]);

        let (registry, seen) = recording_registry();
        let root = DiffTreeNode::root("root");
        let queue = TaskQueue::new();
        evaluator(left.path(), right.path(), &root, registry)
            .execute(&queue)
            .unwrap()
            .for_each(drop);

        assert!(queue.is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn directories_with_a_registered_suffix_are_not_scheduled() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        fs::create_dir(left.path().join("archive.sqlite")).unwrap();
        fs::create_dir(right.path().join("archive.sqlite")).unwrap();
        populate(left.path(), &["pudl.sqlite"]);
        populate(right.path(), &["pudl.sqlite"]);

        let (registry, seen) = recording_registry();
        let root = DiffTreeNode::root("root");
        let queue = TaskQueue::new();
        evaluator(left.path(), right.path(), &root, registry)
            .execute(&queue)
            .unwrap()
            .for_each(drop);

        let files = root.child(FILES_NODE).unwrap();
        assert!(files.diff().unwrap().shared().contains("archive.sqlite"));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "pudl.sqlite");
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn empty_directories_give_one_node() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        let (registry, _) = recording_registry();
        let root = DiffTreeNode::root("root");

        let report = DiffEngine::new(EngineConfig::sequential())
            .run_report(evaluator(left.path(), right.path(), &root, registry))
            .await
            .unwrap();

        assert_eq!(root.node_count(), 2);
        let files = root.child(FILES_NODE).unwrap();
        assert!(files.diff().unwrap().is_empty());
        assert_eq!(report.stats.dispatched, 1);
        assert!(!root.has_differences());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn full_run_attaches_specialized_results_under_files() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        populate(left.path(), &["a.sqlite", "broken.sqlite", "c.sqlite", "b.txt"]);
        populate(right.path(), &["a.sqlite", "broken.sqlite", "c.sqlite", "d.txt"]);
        let (registry, _) = recording_registry();
        let root = DiffTreeNode::root("root");

        DiffEngine::new(EngineConfig::parallel(4))
            .run(evaluator(left.path(), right.path(), &root, registry))
            .await
            .unwrap();

        let files = root.child(FILES_NODE).unwrap();
        let mut names: Vec<_> = files.children().iter().map(|c| c.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["a.sqlite", "broken.sqlite", "c.sqlite"]);
        let broken = files.child("broken.sqlite").unwrap();
        assert_eq!(broken.error().unwrap().kind, ErrorKind::FormatInvalid);
        assert_eq!(root.depth(), 2);
    }

    #[tokio::test]
    async fn missing_root_is_recorded_not_fatal() {
        let left = tempfile::tempdir().unwrap();
        let missing = left.path().join("does-not-exist");
        let (registry, _) = recording_registry();
        let root = DiffTreeNode::root("root");

        DiffEngine::new(EngineConfig::sequential())
            .run(evaluator(left.path(), &missing, &root, registry))
            .await
            .unwrap();

        let marker = root.child(FILES_NODE).unwrap();
        assert_eq!(marker.error().unwrap().kind, ErrorKind::ResourceUnavailable);
        assert!(marker.error().unwrap().message.contains("does-not-exist"));
    }

    #[test]
    fn custom_node_name() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = recording_registry();
        let root = DiffTreeNode::root("root");
        let eval = (*evaluator(dir.path(), dir.path(), &root, registry)).with_node_name("Outputs");
        assert_eq!(eval.label(), "Outputs");

        Box::new(eval).execute(&TaskQueue::new()).unwrap().for_each(drop);
        assert!(root.child("Outputs").is_some());
    }
}
