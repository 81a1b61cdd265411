//! snapdiff generate - Diff two snapshot files and write the migration

use anyhow::{Context, Result, anyhow, bail};
use console::style;
use snapdiff::config::Config;
use snapdiff::migrate::{GeneratedMigration, generate_migration, render_migration_file};
use snapdiff::prompts::is_interactive;
use snapdiff::resolver::{InteractiveResolver, Resolver, ScriptedResolver};
use snapdiff::snapshot::Snapshot;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{load_snapshot, write_file};

#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub prev: PathBuf,
    pub cur: PathBuf,
    pub snapshot_out: Option<PathBuf>,
    /// `category:from=to` declarations
    pub renames: Vec<String>,
    pub interactive: bool,
}

pub async fn cmd_generate(config: &Config, options: GenerateOptions) -> Result<()> {
    let prev = load_snapshot(&options.prev)?;
    let cur = load_snapshot(&options.cur)?;

    if let Some(expected) = config.dialect
        && cur.dialect != expected
    {
        bail!(
            "{} is a {} snapshot but the project is configured for {}",
            options.cur.display(),
            cur.dialect,
            expected
        );
    }

    let scripted = scripted_resolver(&options.renames)?;
    let generated = if options.interactive && scripted.is_empty() && is_interactive() {
        generate(&prev, &cur, InteractiveResolver::new()).await?
    } else {
        generate(&prev, &cur, scripted).await?
    };

    for warning in &generated.migration.meta.warnings {
        warn!("{warning}");
        eprintln!("{} {warning}", style("Skipped:").yellow());
    }

    let text = render_migration_file(&generated.migration, config.breakpoints);
    write_file(Path::new(&config.out), &text)?;

    if generated.has_changes() {
        eprintln!(
            "{} {} statements written to {}",
            style("✓").green(),
            generated.migration.sql_statements.len(),
            config.out
        );
    } else {
        eprintln!("No changes detected");
    }

    if let Some(path) = &options.snapshot_out {
        let snapshot = generated.snapshot.chained_after(&prev);
        let json = snapshot
            .to_json_pretty()
            .context("Failed to serialize snapshot")?;
        write_file(path, &json)?;
    }

    Ok(())
}

async fn generate<R: Resolver>(
    prev: &Snapshot,
    cur: &Snapshot,
    mut resolver: R,
) -> Result<GeneratedMigration> {
    generate_migration(prev, cur, &mut resolver)
        .await
        .context("Failed to generate migration")
}

fn scripted_resolver(renames: &[String]) -> Result<ScriptedResolver> {
    renames.iter().try_fold(ScriptedResolver::new(), |resolver, spec| {
        let (category, from, to) =
            ScriptedResolver::parse_rename(spec).map_err(|e| anyhow!("Invalid --rename: {e}"))?;
        Ok(resolver.rename(category, from, to))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_resolver_from_flags() {
        let resolver = scripted_resolver(&["column:users.name=users.full_name".to_string()]).unwrap();
        assert!(!resolver.is_empty());
        assert!(scripted_resolver(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_rename_flag() {
        let err = scripted_resolver(&["users.name".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid --rename"));
    }
}
