use tracing::info;

use crate::constants::STATEMENT_BREAKPOINT;
use crate::diff::{DiffEntry, diff_snapshots};
use crate::error::Result;
use crate::migrate::compile::{CompiledMigration, compile};
use crate::render::dialect_for;
use crate::resolver::Resolver;
use crate::snapshot::Snapshot;
use crate::squash::{Mode, Squash};

/// Result of migration generation - all pure data
#[derive(Debug, Clone)]
pub struct GeneratedMigration {
    pub migration: CompiledMigration,
    pub entries: Vec<DiffEntry>,
    /// The current snapshot with this migration's renames recorded in `_meta`.
    pub snapshot: Snapshot,
}

impl GeneratedMigration {
    pub fn has_changes(&self) -> bool {
        !self.migration.is_empty()
    }
}

/// Diff `prev` against `cur` and compile the statements that turn one into the other.
pub async fn generate_migration<R: Resolver>(
    prev: &Snapshot,
    cur: &Snapshot,
    resolver: &mut R,
) -> Result<GeneratedMigration> {
    info!("Generating {} migration...", cur.dialect);
    let prev_squashed = prev.squash(Mode::Default)?;
    let cur_squashed = cur.squash(Mode::Default)?;

    let diff = diff_snapshots(&prev_squashed, &cur_squashed, resolver).await?;
    let migration = compile(&diff, dialect_for(cur.dialect).as_ref(), Mode::Default)?;

    let mut snapshot = cur.clone();
    snapshot.meta = diff.renames.clone();

    info!(
        "{} changes, {} statements",
        diff.entries.len(),
        migration.sql_statements.len()
    );
    Ok(GeneratedMigration {
        migration,
        entries: diff.entries,
        snapshot,
    })
}

/// Text of a migration file. Statements are separated by breakpoint markers when the
/// migration runner splits on them.
pub fn render_migration_file(migration: &CompiledMigration, breakpoints: bool) -> String {
    if migration.is_empty() {
        return "-- No changes detected\n".to_string();
    }
    let separator = if breakpoints {
        format!("\n{STATEMENT_BREAKPOINT}\n")
    } else {
        "\n".to_string()
    };
    let mut text = migration.sql_statements.join(&separator);
    text.push('\n');
    text
}
