//! Database-level evaluator: which tables exist in each SQLite file.

use std::sync::Arc;

use outdiff_engine::{produce_one, EvalResult, Evaluator, Produced, SharedItem, TaskQueue};
use outdiff_tree::{DiffNode, KeySetDiff, NodeSpec};
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::store::{Fetcher, SqliteDatabase};
use crate::table::{node_name, TableEvaluator};

/// Collaborators shared by every SQLite evaluator of a run.
pub struct SqliteContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub config: SqliteConfig,
}

impl SqliteContext {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: SqliteConfig) -> Self {
        Self { fetcher, config }
    }
}

impl std::fmt::Debug for SqliteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Compares the table lists of two SQLite databases.
pub struct SqliteDbEvaluator {
    item: SharedItem,
    ctx: Arc<SqliteContext>,
}

impl SqliteDbEvaluator {
    pub fn new(item: SharedItem, ctx: Arc<SqliteContext>) -> Self {
        Self { item, ctx }
    }
}

impl Evaluator for SqliteDbEvaluator {
    fn label(&self) -> String {
        self.item.name.clone()
    }

    fn parent(&self) -> &DiffNode {
        &self.item.parent
    }

    fn execute(self: Box<Self>, queue: &TaskQueue) -> EvalResult<Produced> {
        let left_path = self.ctx.fetcher.fetch(&self.item.left)?;
        let right_path = self.ctx.fetcher.fetch(&self.item.right)?;
        let left_tables = SqliteDatabase::open(&left_path)?.tables()?;
        queue.ensure_active()?;
        let right_tables = SqliteDatabase::open(&right_path)?.tables()?;

        let diff = KeySetDiff::from_sets(&left_tables, &right_tables);
        let db = queue.attach(
            &self.item.parent,
            NodeSpec::new(&self.item.name).with_diff(diff),
        )?;

        let mut scheduled = 0usize;
        if let Some(diff) = db.diff() {
            if self.ctx.config.compare_tables {
                for table in diff.shared() {
                    let task = TableEvaluator::new(
                        table.clone(),
                        left_path.clone(),
                        right_path.clone(),
                        Arc::clone(&db),
                        Arc::clone(&self.ctx),
                    );
                    debug!(db = %self.item.name, table = %node_name(table), "scheduling table comparison");
                    if queue.push(Box::new(task)) {
                        scheduled += 1;
                    }
                }
            }

            info!(
                db = %self.item.name,
                only_left = diff.only_left().len(),
                only_right = diff.only_right().len(),
                shared = diff.shared().len(),
                scheduled,
                "databases compared"
            );
        }

        Ok(produce_one(db))
    }
}
