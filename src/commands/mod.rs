pub mod check;
pub mod generate;
pub mod push;
pub mod upgrade;

// Re-export all command functions
pub use check::cmd_check;
pub use generate::{GenerateOptions, cmd_generate};
pub use push::{PushMode, cmd_push};
pub use upgrade::cmd_upgrade;

use anyhow::{Context, Result};
use snapdiff::snapshot::Snapshot;
use std::path::Path;

/// Read, upgrade and validate a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    Snapshot::from_json(&text).with_context(|| format!("Invalid snapshot {}", path.display()))
}

/// Write `contents`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
