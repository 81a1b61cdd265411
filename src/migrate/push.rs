//! Push: diff a live database snapshot against the declared schema and apply the result.

use tracing::{debug, info};

use crate::classify::classify;
use crate::config::ObjectFilter;
use crate::db::Executor;
use crate::diff::diff_snapshots;
use crate::error::{DiffError, Result};
use crate::migrate::compile::{CompiledMigration, compile};
use crate::render::dialect_for;
use crate::resolver::Resolver;
use crate::snapshot::{EntityKey, Snapshot};
use crate::squash::{Mode, Squash};

#[derive(Debug, Clone)]
pub struct PushPlan {
    pub has_data_loss: bool,
    /// One line per destructive or risky statement.
    pub warnings: Vec<String>,
    pub statements_to_execute: Vec<String>,
    pub tables_to_truncate: Vec<EntityKey>,
    pub migration: CompiledMigration,
}

impl PushPlan {
    pub fn is_empty(&self) -> bool {
        self.statements_to_execute.is_empty()
    }

    /// Run every statement in order. The first failure stops the push; statements already
    /// run stay applied.
    pub async fn apply<E: Executor>(&self, executor: &E) -> Result<usize> {
        info!("Applying {} statements...", self.statements_to_execute.len());
        for (i, statement) in self.statements_to_execute.iter().enumerate() {
            debug!("[{}/{}] {statement}", i + 1, self.statements_to_execute.len());
            executor
                .run(statement)
                .await
                .map_err(|source| DiffError::Execution {
                    statement: statement.clone(),
                    source,
                })?;
        }
        Ok(self.statements_to_execute.len())
    }
}

/// Plan a push of `schema` onto the database described by `live`.
///
/// Both snapshots are filtered first so objects outside the managed set are never dropped.
/// Row counts for the destructive-change checks come from `executor` when given.
pub async fn plan_push<R: Resolver, E: Executor>(
    live: &Snapshot,
    schema: &Snapshot,
    filter: &ObjectFilter,
    resolver: &mut R,
    executor: Option<&E>,
) -> Result<PushPlan> {
    info!("Planning push...");
    let live = filter.filter_snapshot(live).squash(Mode::Push)?;
    let declared = filter.filter_snapshot(schema).squash(Mode::Push)?;

    let diff = diff_snapshots(&live, &declared, resolver).await?;
    let migration = compile(&diff, dialect_for(declared.dialect).as_ref(), Mode::Push)?;
    let classification = classify(&migration, &diff.prev, executor).await?;

    Ok(PushPlan {
        has_data_loss: classification.should_ask_for_approve,
        warnings: classification.info_to_print,
        statements_to_execute: classification.statements_to_execute,
        tables_to_truncate: classification.tables_to_truncate,
        migration,
    })
}
