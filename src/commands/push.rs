//! snapdiff push - Bring a database in line with the declared schema

use anyhow::{Context, Result, bail};
use console::style;
use snapdiff::config::{Config, ObjectFilter};
use snapdiff::db::{PgExecutor, connect};
use snapdiff::migrate::{PushPlan, plan_push};
use snapdiff::prompts::{confirm_push, is_interactive, print_push_warnings, print_statements};
use snapdiff::resolver::{InteractiveResolver, Resolver, ScriptedResolver};
use snapdiff::snapshot::Snapshot;
use std::path::Path;

use super::load_snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Apply when safe, ask otherwise
    Interactive,
    /// Apply without asking
    Force,
    /// Print what would run
    DryRun,
}

pub async fn cmd_push(config: &Config, live: &Path, schema: &Path, mode: PushMode) -> Result<()> {
    let live = load_snapshot(live)?;
    let schema = load_snapshot(schema)?;
    let filter = ObjectFilter::new(&config.filters);

    let executor = match (&config.database.url, mode) {
        (Some(url), _) => Some(connect(url).await.context("Failed to connect to database")?),
        (None, PushMode::DryRun) => None,
        (None, _) => bail!("No database URL: pass --database-url or set DATABASE_URL"),
    };

    let plan = if is_interactive() && mode != PushMode::Force {
        plan(&live, &schema, &filter, InteractiveResolver::new(), executor.as_ref()).await?
    } else {
        plan(&live, &schema, &filter, ScriptedResolver::new(), executor.as_ref()).await?
    };

    for warning in &plan.migration.meta.warnings {
        eprintln!("{} {warning}", style("Skipped:").yellow());
    }

    if plan.is_empty() {
        eprintln!("No changes detected");
        return Ok(());
    }

    print_push_warnings(&plan);

    if mode == PushMode::DryRun {
        print_statements(&plan.statements_to_execute);
        return Ok(());
    }

    let needs_approval = plan.has_data_loss || config.strict;
    if needs_approval && mode != PushMode::Force {
        if !is_interactive() {
            bail!("Push needs approval; rerun with --force to apply anyway");
        }
        if !confirm_push(&plan)? {
            eprintln!("Push aborted, nothing was applied");
            return Ok(());
        }
    }

    let Some(executor) = executor else {
        bail!("No database connection");
    };
    let applied = plan
        .apply(&executor)
        .await
        .context("Push stopped; statements before the failing one stay applied")?;
    eprintln!("{} {applied} statements applied", style("✓").green());
    Ok(())
}

async fn plan(
    live: &Snapshot,
    schema: &Snapshot,
    filter: &ObjectFilter,
    mut resolver: impl Resolver,
    executor: Option<&PgExecutor>,
) -> Result<PushPlan> {
    plan_push(live, schema, filter, &mut resolver, executor)
        .await
        .context("Failed to plan push")
}
