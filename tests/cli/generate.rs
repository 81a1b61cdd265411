use crate::helpers::cli::CliTestHelper;
use crate::helpers::snapshots::{snapshot_with, users_table, with_column_renamed};
use anyhow::Result;
use predicates::prelude::*;
use snapdiff::snapshot::{Dialect, Snapshot};

#[test]
fn test_generate_writes_migration_with_breakpoints() -> Result<()> {
    let helper = CliTestHelper::new();
    let prev = helper.write_snapshot("prev.json", &Snapshot::empty(Dialect::Sqlite))?;
    let cur = helper.write_snapshot(
        "cur.json",
        &snapshot_with(Dialect::Sqlite, vec![users_table()]),
    )?;

    helper
        .command()
        .args(["generate", "--no-interactive", "--out", "migrations/0000_init.sql"])
        .arg("--prev")
        .arg(&prev)
        .arg("--cur")
        .arg(&cur)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 statements written"));

    assert_eq!(
        helper.read("migrations/0000_init.sql")?,
        "CREATE TABLE `users` (\n\t`id` integer PRIMARY KEY NOT NULL,\n\t`name` text\n);\n"
    );
    Ok(())
}

#[test]
fn test_generate_with_declared_rename_records_snapshot_meta() -> Result<()> {
    let helper = CliTestHelper::new();
    let prev_snapshot = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let prev = helper.write_snapshot("prev.json", &prev_snapshot)?;
    let cur = helper.write_snapshot(
        "cur.json",
        &snapshot_with(
            Dialect::Postgresql,
            vec![with_column_renamed(users_table(), "name", "full_name")],
        ),
    )?;

    helper
        .command()
        .args(["generate", "--no-interactive"])
        .args(["--rename", "column:users.name=users.full_name"])
        .args(["--snapshot-out", "next.json"])
        .arg("--prev")
        .arg(&prev)
        .arg("--cur")
        .arg(&cur)
        .assert()
        .success();

    assert_eq!(
        helper.read("migration.sql")?,
        "ALTER TABLE \"users\" RENAME COLUMN \"name\" TO \"full_name\";\n"
    );

    let next = Snapshot::from_json(&helper.read("next.json")?)?;
    assert_eq!(next.prev_id, prev_snapshot.id);
    assert_eq!(
        next.meta.columns.get("users.name").map(String::as_str),
        Some("users.full_name")
    );
    Ok(())
}

#[test]
fn test_generate_without_changes() -> Result<()> {
    let helper = CliTestHelper::new();
    let snapshot = snapshot_with(Dialect::Mysql, vec![users_table()]);
    let prev = helper.write_snapshot("prev.json", &snapshot)?;
    let cur = helper.write_snapshot("cur.json", &snapshot)?;

    helper
        .command()
        .args(["generate", "--no-interactive"])
        .arg("--prev")
        .arg(&prev)
        .arg("--cur")
        .arg(&cur)
        .assert()
        .success()
        .stderr(predicate::str::contains("No changes detected"));

    assert_eq!(helper.read("migration.sql")?, "-- No changes detected\n");
    Ok(())
}

#[test]
fn test_generate_respects_configured_dialect() -> Result<()> {
    let helper = CliTestHelper::new();
    helper.write_file("snapdiff.yaml", "dialect: mysql\n")?;
    let prev = helper.write_snapshot("prev.json", &Snapshot::empty(Dialect::Sqlite))?;
    let cur = helper.write_snapshot("cur.json", &Snapshot::empty(Dialect::Sqlite))?;

    helper
        .command()
        .args(["generate", "--no-interactive"])
        .arg("--prev")
        .arg(&prev)
        .arg("--cur")
        .arg(&cur)
        .assert()
        .failure()
        .stderr(predicate::str::contains("configured for mysql"));
    Ok(())
}
