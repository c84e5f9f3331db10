//! CLI output formatting.
//!
//! One line per asset that is exported or copied, tagged with its kind:
//!
//! ```text
//! [TMX] assets/tiled/maps/world/a.lua => root/res/maps/world/a.lua
//! [IMG] assets/tiled/tilesets/x/tile.png => root/res/tilesets/x/tile.png
//! [ASE] assets/ase/chars/hero.ase => root/res/sprites/chars/hero.json
//! ```
//!
//! followed by a per-category summary:
//!
//! ```text
//! maps       1 exported, 0 copied, 12 up to date
//! tilesets   0 exported, 1 copied, 30 up to date
//! sprites    1 exported, 0 copied, 8 up to date
//! ```
//!
//! Format functions are pure and return lines; `print_*` wrappers write
//! them to stdout.

use crate::pipeline::RunReport;
use crate::walk::AssetEvent;

/// Format a walk event. Fresh assets produce no output.
pub fn format_event(event: &AssetEvent) -> Vec<String> {
    match event {
        AssetEvent::Updating {
            kind,
            source,
            destination,
        } => vec![format!(
            "[{}] {} => {}",
            kind.label(),
            source.display(),
            destination.display()
        )],
        AssetEvent::Stale {
            kind,
            source,
            destination,
        } => vec![format!(
            "[{}] stale: {} => {}",
            kind.label(),
            source.display(),
            destination.display()
        )],
        AssetEvent::Fresh { .. } => Vec::new(),
    }
}

/// Format the end-of-run summary.
pub fn format_report(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .categories
        .iter()
        .map(|c| format!("{:<10} {}", c.category.to_string(), c.stats))
        .collect();

    let totals = report.totals();
    if report.dry_run {
        if totals.stale == 0 {
            lines.push("Everything is up to date".to_string());
        } else {
            lines.push(format!("{} asset(s) need exporting", totals.stale));
        }
    } else if totals.exported + totals.copied == 0 {
        lines.push("Nothing to do".to_string());
    }
    lines
}

/// Print the run summary to stdout.
pub fn print_report(report: &RunReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}
