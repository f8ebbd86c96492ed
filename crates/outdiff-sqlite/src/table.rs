//! Table-level evaluator: columns, declared types and row counts.

use std::path::PathBuf;
use std::sync::Arc;

use outdiff_engine::{produce_one, EvalError, EvalResult, Evaluator, Produced, TaskQueue};
use outdiff_tree::{DiffNode, KeySetDiff, Mismatch, NodeSpec, TreeError};
use tracing::debug;

use crate::database::SqliteContext;
use crate::store::{quote_ident, SqliteDatabase};

/// Field name of the row count mismatch.
pub const ROW_COUNT_FIELD: &str = "row_count";

/// Tree node name for `table`.
///
/// SQLite accepts `CREATE TABLE "" (..)`; such a table is shown by its
/// quoted identifier since tree nodes need a non-empty name.
pub fn node_name(table: &str) -> String {
    if table.is_empty() {
        quote_ident(table)
    } else {
        table.to_string()
    }
}

/// Compares one table present in both databases. Terminal: enqueues nothing.
pub struct TableEvaluator {
    table: String,
    left: PathBuf,
    right: PathBuf,
    parent: DiffNode,
    ctx: Arc<SqliteContext>,
}

impl TableEvaluator {
    pub fn new(
        table: impl Into<String>,
        left: PathBuf,
        right: PathBuf,
        parent: DiffNode,
        ctx: Arc<SqliteContext>,
    ) -> Self {
        Self {
            table: table.into(),
            left,
            right,
            parent,
            ctx,
        }
    }
}

impl Evaluator for TableEvaluator {
    fn label(&self) -> String {
        node_name(&self.table)
    }

    fn parent(&self) -> &DiffNode {
        &self.parent
    }

    fn execute(self: Box<Self>, queue: &TaskQueue) -> EvalResult<Produced> {
        let left_db = SqliteDatabase::open(&self.left)?;
        let right_db = SqliteDatabase::open(&self.right)?;
        let left_cols = left_db.columns(&self.table)?;
        let right_cols = right_db.columns(&self.table)?;

        let diff = KeySetDiff::from_keys(left_cols.keys().cloned(), right_cols.keys().cloned());
        let mut mismatches: Vec<_> = diff
            .shared()
            .iter()
            .filter_map(|col| {
                let (l, r) = (&left_cols[col], &right_cols[col]);
                (l != r).then(|| Mismatch::new(format!("column {col} type"), l, r))
            })
            .collect();

        if self.ctx.config.row_counts {
            let left_rows = left_db.row_count(&self.table)?;
            let right_rows = right_db.row_count(&self.table)?;
            if left_rows != right_rows {
                mismatches.push(Mismatch::new(ROW_COUNT_FIELD, left_rows, right_rows));
            }
        }

        debug!(
            table = %self.table,
            columns_only_left = diff.only_left().len(),
            columns_only_right = diff.only_right().len(),
            mismatches = mismatches.len(),
            "tables compared"
        );

        let name = node_name(&self.table);
        let spec = NodeSpec::new(&name).with_diff(diff).with_mismatches(mismatches);
        let node = queue.attach(&self.parent, spec).map_err(|err| match err {
            // Table names come from the file, so a clash is bad input.
            EvalError::Tree(TreeError::DuplicateChild { .. }) => EvalError::format_invalid(
                self.left.display().to_string(),
                format!("table {} collides with another table's node name", quote_ident(&self.table)),
            ),
            other => other,
        })?;
        Ok(produce_one(node))
    }
}
