use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use outdiff_engine::EngineConfig;
use outdiff_fs::ListingConfig;
use outdiff_sqlite::SqliteConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Everything a run can be configured with, as read from `--config`.
///
/// ```toml
/// [engine]
/// workers = 8
/// task_timeout_ms = 60000
///
/// [listing]
/// recursive = false
///
/// [sqlite]
/// compare_tables = true
/// row_counts = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutdiffConfig {
    pub engine: EngineConfig,
    pub listing: ListingConfig,
    pub sqlite: SqliteConfig,
}

impl OutdiffConfig {
    /// Read the file at `path`, or start from defaults when there is none.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Command-line flags win over file values.
    pub fn apply_flags(&mut self, cli: &Cli) {
        if let Some(workers) = cli.workers {
            self.engine.workers = workers;
        }
        if let Some(secs) = cli.timeout {
            self.engine = self.engine.clone().with_task_timeout(Duration::from_secs(secs));
        }
        if cli.recursive {
            self.listing.recursive = true;
        }
        if cli.no_tables {
            self.sqlite.compare_tables = false;
        }
        if cli.no_row_counts {
            self.sqlite.row_counts = false;
        }
    }
}
