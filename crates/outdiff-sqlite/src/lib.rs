//! SQLite-aware comparison for outdiff.
//!
//! Two evaluators take a shared `*.sqlite` file from the directory level down
//! to individual tables:
//!
//! - [`SqliteDbEvaluator`] -- Which tables exist on each side; schedules one
//!   [`TableEvaluator`] per shared table
//! - [`TableEvaluator`] -- Column presence, declared column types and row counts
//!
//! Databases are reached through a [`Fetcher`] and opened read-only, one
//! connection per task.

pub mod config;
pub mod database;
pub mod error;
pub mod store;
pub mod table;

use std::sync::Arc;

use outdiff_engine::{EvaluatorRegistry, SharedItem, Task};

pub use config::SqliteConfig;
pub use database::{SqliteContext, SqliteDbEvaluator};
pub use error::{StoreError, StoreResult};
pub use store::{Fetcher, LocalFetcher, SqliteDatabase};
pub use table::{TableEvaluator, ROW_COUNT_FIELD};

/// File suffix routed to [`SqliteDbEvaluator`].
pub const SQLITE_SUFFIX: &str = ".sqlite";

/// Route shared `*.sqlite` files to [`SqliteDbEvaluator`].
pub fn register(registry: &mut EvaluatorRegistry, fetcher: Arc<dyn Fetcher>, config: SqliteConfig) {
    let ctx = Arc::new(SqliteContext::new(fetcher, config));
    registry.register_suffix(SQLITE_SUFFIX, move |item: SharedItem| -> Task {
        Box::new(SqliteDbEvaluator::new(item, Arc::clone(&ctx)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_routes_sqlite_suffix() {
        let mut registry = EvaluatorRegistry::new();
        register(&mut registry, Arc::new(LocalFetcher), SqliteConfig::default());

        assert_eq!(registry.len(), 1);
        assert!(registry.rule_for("pudl.sqlite").is_some());
        assert!(registry.rule_for("ferc1.sqlite").is_some());
        assert!(registry.rule_for("pudl.sqlite-journal").is_none());
        assert!(registry.rule_for("notes.txt").is_none());
    }
}
