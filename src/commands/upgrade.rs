//! snapdiff upgrade - Rewrite a snapshot in the current format

use anyhow::{Context, Result};
use std::path::Path;

use super::{load_snapshot, write_file};

pub fn cmd_upgrade(file: &Path, in_place: bool) -> Result<()> {
    let snapshot = load_snapshot(file)?;
    let json = snapshot
        .to_json_pretty()
        .context("Failed to serialize snapshot")?;

    if in_place {
        write_file(file, &json)?;
        eprintln!(
            "Upgraded {} to {} version {}",
            file.display(),
            snapshot.dialect,
            snapshot.version
        );
    } else {
        println!("{json}");
    }
    Ok(())
}
