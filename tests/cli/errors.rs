//! CLI error handling tests

use crate::helpers::cli::CliTestHelper;
use anyhow::Result;
use predicates::prelude::*;
use snapdiff::snapshot::{Dialect, Snapshot};

#[test]
fn test_missing_snapshot_file() {
    let helper = CliTestHelper::new();
    helper
        .command()
        .args(["generate", "--prev", "nope.json", "--cur", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read snapshot"));
}

#[test]
fn test_invalid_config_yaml() -> Result<()> {
    let helper = CliTestHelper::new();
    helper.write_file("snapdiff.yaml", "filters: [unbalanced")?;

    helper
        .command()
        .args(["check", "a.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_malformed_snapshot() -> Result<()> {
    let helper = CliTestHelper::new();
    helper.write_file("bad.json", r#"{ "version": "7" }"#)?;

    helper
        .command()
        .args(["upgrade", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid snapshot"));
    Ok(())
}

#[test]
fn test_invalid_rename_flag() -> Result<()> {
    let helper = CliTestHelper::new();
    helper.write_snapshot("s.json", &Snapshot::empty(Dialect::Sqlite))?;

    helper
        .command()
        .args(["generate", "--prev", "s.json", "--cur", "s.json", "--rename", "oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --rename"));
    Ok(())
}
