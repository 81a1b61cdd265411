use crate::helpers::migration::{MigrationTestHelper, position_of};
use crate::helpers::snapshots::{orders_table, snapshot_with, users_table};
use rstest::rstest;
use snapdiff::snapshot::{Dialect, Snapshot};

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[tokio::test]
async fn test_foreign_key_added_after_both_tables(#[case] dialect: Dialect) {
    // orders is declared before users on purpose
    let helper = MigrationTestHelper::new(
        Snapshot::empty(dialect),
        snapshot_with(dialect, vec![orders_table(), users_table()]),
    );

    let statements = helper.statements().await;
    let last_create = statements
        .iter()
        .rposition(|s| s.starts_with("CREATE TABLE"))
        .unwrap();
    let fk = position_of(&statements, "FOREIGN KEY");
    assert_eq!(statements.len(), 3);
    assert!(last_create < fk);
    assert!(statements[fk].starts_with("ALTER TABLE"));
    assert!(statements[fk].contains("orders_user_id_users_id_fk"));
}

#[tokio::test]
async fn test_sqlite_creates_referenced_table_first() {
    let dialect = Dialect::Sqlite;
    let helper = MigrationTestHelper::new(
        Snapshot::empty(dialect),
        snapshot_with(dialect, vec![orders_table(), users_table()]),
    );

    let statements = helper.statements().await;
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("CREATE TABLE `users`"));
    assert!(statements[1].starts_with("CREATE TABLE `orders`"));
    assert!(statements[1].contains("REFERENCES `users`(`id`)"));
}

#[tokio::test]
async fn test_referencing_constraint_dropped_before_table() {
    let dialect = Dialect::Postgresql;
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table(), orders_table()]),
        Snapshot::empty(dialect),
    );

    let statements = helper.statements().await;
    let users = position_of(&statements, "DROP TABLE \"users\"");
    position_of(&statements, "DROP TABLE \"orders\"");
    for (i, statement) in statements.iter().enumerate() {
        if statement.contains("DROP CONSTRAINT") {
            assert!(i < users);
        }
    }
}

#[tokio::test]
async fn test_dropped_table_never_follows_statement_referencing_it() {
    let dialect = Dialect::Postgresql;
    let mut orders = orders_table();
    orders.foreign_keys.clear();
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table(), orders_table()]),
        snapshot_with(dialect, vec![orders]),
    );

    let statements = helper.statements().await;
    let drop_fk = position_of(&statements, "DROP CONSTRAINT \"orders_user_id_users_id_fk\"");
    let drop_users = position_of(&statements, "DROP TABLE \"users\"");
    assert!(drop_fk < drop_users);
}
