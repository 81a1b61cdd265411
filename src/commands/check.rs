//! snapdiff check - Validate a snapshot history

use anyhow::{Result, bail};
use console::style;
use snapdiff::snapshot::history::check_history;
use std::path::PathBuf;

use super::load_snapshot;

pub fn cmd_check(files: &[PathBuf]) -> Result<()> {
    let snapshots = files
        .iter()
        .map(|path| load_snapshot(path))
        .collect::<Result<Vec<_>>>()?;

    let issues = check_history(&snapshots);
    if issues.is_empty() {
        println!("{} {} snapshots, history is consistent", style("✓").green(), snapshots.len());
        return Ok(());
    }

    for issue in &issues {
        println!("{} {issue}", style("✗").red());
    }
    bail!("Snapshot history has {} issues", issues.len())
}
