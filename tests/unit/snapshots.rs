use serde_json::json;
use snapdiff::constants::ORIGIN_ID;
use snapdiff::error::DiffError;
use snapdiff::snapshot::history::{HistoryIssue, check_history};
use snapdiff::snapshot::{Dialect, Snapshot};
use snapdiff::squash::{Mode, Squash};

fn chain() -> (Snapshot, Snapshot, Snapshot) {
    let first = Snapshot::empty(Dialect::Sqlite).chained_after(&Snapshot::empty(Dialect::Sqlite));
    let second = Snapshot::empty(Dialect::Sqlite).chained_after(&first);
    let third = Snapshot::empty(Dialect::Sqlite).chained_after(&second);
    (first, second, third)
}

#[test]
fn test_linear_history_is_consistent() {
    let (first, second, third) = chain();
    assert_eq!(first.prev_id, ORIGIN_ID);
    assert!(check_history(&[first, second, third]).is_empty());
}

#[test]
fn test_branch_collision_is_reported() {
    let (first, second, _) = chain();
    let sibling = Snapshot::empty(Dialect::Sqlite).chained_after(&first);

    let issues = check_history(&[first.clone(), second, sibling]);
    assert_eq!(issues.len(), 1);
    assert!(matches!(&issues[0], HistoryIssue::Collision { prev_id, ids } if *prev_id == first.id && ids.len() == 2));
}

#[test]
fn test_dangling_parent_is_reported() {
    let (_, second, third) = chain();
    let issues = check_history(&[second.clone(), third]);
    assert_eq!(
        issues,
        vec![HistoryIssue::DanglingPrevId {
            id: second.id,
            prev_id: second.prev_id
        }]
    );
}

#[test]
fn test_old_postgres_snapshot_parses_after_upgrade() {
    let v5 = json!({
        "id": "7f1c4c52-7c07-4a3b-9d36-8f87a8d1b7a2",
        "prevId": "00000000-0000-0000-0000-000000000000",
        "version": "5",
        "dialect": "pg",
        "tables": {
            "users": {
                "name": "users",
                "schema": "",
                "columns": {
                    "id": { "name": "id", "type": "serial", "primaryKey": true, "notNull": true }
                }
            }
        },
        "enums": {}
    });

    let snapshot = Snapshot::from_value(v5).unwrap();
    assert_eq!(snapshot.dialect, Dialect::Postgresql);
    assert_eq!(snapshot.version, "7");

    let squashed = snapshot.squash(Mode::Default).unwrap();
    assert!(squashed.table("", "users").is_some());
}

#[test]
fn test_invalid_json_is_reported() {
    let err = Snapshot::from_json("{ not json").unwrap_err();
    assert!(matches!(err, DiffError::Json(_)));
}
