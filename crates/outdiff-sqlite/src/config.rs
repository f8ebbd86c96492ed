use serde::{Deserialize, Serialize};

/// What the SQLite evaluators compare beyond the table list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Schedule a table comparison for every table present on both sides.
    pub compare_tables: bool,
    /// Compare row counts of shared tables.
    pub row_counts: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            compare_tables: true,
            row_counts: true,
        }
    }
}

impl SqliteConfig {
    /// Compare table names only.
    pub fn tables_only() -> Self {
        Self {
            compare_tables: false,
            row_counts: false,
        }
    }
}
