use crate::helpers::cli::CliTestHelper;
use anyhow::Result;
use predicates::prelude::*;
use snapdiff::snapshot::{Dialect, Snapshot};

#[test]
fn test_check_accepts_linear_history() -> Result<()> {
    let helper = CliTestHelper::new();
    let first = Snapshot::empty(Dialect::Postgresql).chained_after(&Snapshot::empty(Dialect::Postgresql));
    let second = Snapshot::empty(Dialect::Postgresql).chained_after(&first);
    let a = helper.write_snapshot("0000.json", &first)?;
    let b = helper.write_snapshot("0001.json", &second)?;

    helper
        .command()
        .arg("check")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("history is consistent"));
    Ok(())
}

#[test]
fn test_check_reports_collision() -> Result<()> {
    let helper = CliTestHelper::new();
    let first = Snapshot::empty(Dialect::Postgresql).chained_after(&Snapshot::empty(Dialect::Postgresql));
    let left = Snapshot::empty(Dialect::Postgresql).chained_after(&first);
    let right = Snapshot::empty(Dialect::Postgresql).chained_after(&first);
    let paths = [
        helper.write_snapshot("0000.json", &first)?,
        helper.write_snapshot("0001_left.json", &left)?,
        helper.write_snapshot("0001_right.json", &right)?,
    ];

    helper
        .command()
        .arg("check")
        .args(&paths)
        .assert()
        .failure()
        .stdout(predicate::str::contains(format!("point to parent {}", first.id)))
        .stderr(predicate::str::contains("1 issues"));
    Ok(())
}

#[test]
fn test_upgrade_in_place_rewrites_old_format() -> Result<()> {
    let helper = CliTestHelper::new();
    let path = helper.write_file(
        "old.json",
        r#"{
  "id": "7f1c4c52-7c07-4a3b-9d36-8f87a8d1b7a2",
  "prevId": "00000000-0000-0000-0000-000000000000",
  "version": "5",
  "dialect": "sqlite",
  "tables": {}
}"#,
    )?;

    helper
        .command()
        .args(["upgrade", "--in-place"])
        .arg(&path)
        .assert()
        .success();

    let upgraded = Snapshot::from_json(&helper.read("old.json")?)?;
    assert_eq!(upgraded.version, "6");
    assert!(helper.read("old.json")?.contains("\"views\""));
    Ok(())
}
