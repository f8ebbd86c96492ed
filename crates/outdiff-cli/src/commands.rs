use std::sync::Arc;

use outdiff_engine::{DiffEngine, EvaluatorRegistry, RunReport};
use outdiff_fs::{DirectoryEvaluator, LocalLister};
use outdiff_sqlite::LocalFetcher;
use outdiff_tree::DiffTreeNode;
use tracing::info;

use crate::cli::{Cli, OutputFormat};
use crate::render::{render_summary, render_text, JsonReport};
use crate::settings::OutdiffConfig;

/// Name of the root node of every run.
pub const ROOT_NODE: &str = "outputs";

/// How a finished comparison ended, mapped to the process exit status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Identical,
    Different,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Identical => 0,
            Self::Different => 1,
        }
    }
}

/// Build the registry with every specialized evaluator outdiff ships.
pub fn build_registry(config: &OutdiffConfig) -> EvaluatorRegistry {
    let mut registry = EvaluatorRegistry::new();
    outdiff_sqlite::register(&mut registry, Arc::new(LocalFetcher), config.sqlite.clone());
    registry
}

/// Compare `left` against `right` with `config`.
pub async fn compare(left: &str, right: &str, config: &OutdiffConfig) -> anyhow::Result<RunReport> {
    let registry = Arc::new(build_registry(config));
    let lister = Arc::new(LocalLister::new(config.listing.clone()));
    let root = DiffTreeNode::root(ROOT_NODE);
    let seed = DirectoryEvaluator::new(left, right, root, lister, registry);

    let report = DiffEngine::new(config.engine.clone())
        .run_report(Box::new(seed))
        .await?;
    Ok(report)
}

pub async fn run_command(cli: Cli) -> anyhow::Result<Outcome> {
    let mut config = OutdiffConfig::load(cli.config.as_deref())?;
    config.apply_flags(&cli);
    info!(left = %cli.left, right = %cli.right, ?config, "comparing outputs");

    let report = compare(&cli.left, &cli.right, &config).await?;
    let differences = report.root.has_differences();
    let tree = report.root.snapshot().sorted();

    match cli.format {
        OutputFormat::Text => {
            print!("{}", render_text(&tree));
            println!();
            println!(
                "{}",
                render_summary(&report.stats, report.root.error_count(), differences)
            );
        }
        OutputFormat::Json => {
            let doc = JsonReport {
                left: &cli.left,
                right: &cli.right,
                differences,
                stats: &report.stats,
                tree: &tree,
            };
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(if differences {
        Outcome::Different
    } else {
        Outcome::Identical
    })
}
