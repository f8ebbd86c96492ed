use std::fmt::Write;

use colored::Colorize;
use outdiff_engine::RunStats;
use outdiff_tree::TreeSnapshot;
use serde::Serialize;

/// JSON document printed with `--format json`.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub left: &'a str,
    pub right: &'a str,
    pub differences: bool,
    pub stats: &'a RunStats,
    pub tree: &'a TreeSnapshot,
}

/// Indented tree: `-` left only, `+` right only, `~` changed value, `!` failed comparison.
pub fn render_text(tree: &TreeSnapshot) -> String {
    let mut out = String::new();
    for (depth, node) in tree.walk() {
        let pad = "  ".repeat(depth);
        let _ = write!(out, "{pad}{}", node.name.bold());
        if let Some(diff) = &node.diff {
            let _ = write!(
                out,
                "  {} {} {}",
                format!("-{}", diff.only_left().len()).red(),
                format!("+{}", diff.only_right().len()).green(),
                format!("={}", diff.shared().len()).dimmed(),
            );
        }
        out.push('\n');

        if let Some(err) = &node.error {
            let _ = writeln!(out, "{pad}  {} {}: {}", "!".red().bold(), err.kind, err.message);
        }
        if let Some(diff) = &node.diff {
            for name in diff.only_left() {
                let _ = writeln!(out, "{pad}  {} {}", "-".red(), name);
            }
            for name in diff.only_right() {
                let _ = writeln!(out, "{pad}  {} {}", "+".green(), name);
            }
        }
        for m in &node.mismatches {
            let _ = writeln!(
                out,
                "{pad}  {} {}: {} -> {}",
                "~".yellow(),
                m.field,
                m.left,
                m.right
            );
        }
    }
    out
}

pub fn render_summary(stats: &RunStats, errors: usize, differences: bool) -> String {
    let verdict = if differences {
        "Differences found".yellow().bold()
    } else {
        "No differences".green().bold()
    };
    format!(
        "{verdict} ({} comparisons, {} failed, {} error markers)",
        stats.completed + stats.failed,
        stats.failed,
        errors
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use outdiff_tree::{DiffTreeNode, ErrorKind, KeySetDiff, Mismatch, NodeSpec};

    fn sample() -> TreeSnapshot {
        let root = DiffTreeNode::root("outputs");
        let files = root
            .add_child(NodeSpec::new("Files").with_diff(KeySetDiff::from_keys(
                ["a.sqlite", "b.txt"],
                ["a.sqlite", "d.txt"],
            )))
            .unwrap();
        let db = files
            .add_child(NodeSpec::new("a.sqlite").with_diff(KeySetDiff::from_keys(["plants"], ["plants"])))
            .unwrap();
        db.add_child(NodeSpec::new("plants").with_mismatch(Mismatch::new("row_count", 3, 1)))
            .unwrap();
        files.add_error_marker("c.sqlite", ErrorKind::FormatInvalid, "not a database");
        root.snapshot().sorted()
    }

    #[test]
    fn text_shows_every_kind_of_difference() {
        colored::control::set_override(false);
        let text = render_text(&sample());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "outputs");
        assert_eq!(lines[1], "  Files  -1 +1 =1");
        assert!(lines.contains(&"    - b.txt"));
        assert!(lines.contains(&"    + d.txt"));
        assert!(lines.contains(&"        ~ row_count: 3 -> 1"));
        assert!(lines.contains(&"      ! format invalid: not a database"));
    }

    #[test]
    fn summary_reports_verdict() {
        colored::control::set_override(false);
        let stats = RunStats {
            completed: 3,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(
            render_summary(&stats, 1, true),
            "Differences found (4 comparisons, 1 failed, 1 error markers)"
        );
        assert!(render_summary(&RunStats::default(), 0, false).starts_with("No differences"));
    }

    #[test]
    fn json_report_carries_tree_and_stats() {
        let tree = sample();
        let stats = RunStats::default();
        let report = JsonReport {
            left: "a",
            right: "b",
            differences: true,
            stats: &stats,
            tree: &tree,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["tree"]["name"], "outputs");
        assert_eq!(value["tree"]["children"][0]["name"], "Files");
        assert_eq!(value["differences"], true);
    }
}
