use crate::helpers::migration::{MigrationTestHelper, position_of};
use crate::helpers::snapshots::{snapshot_with, users_table, with_column, with_column_renamed};
use insta::assert_snapshot;
use rstest::rstest;
use snapdiff::resolver::ScriptedResolver;
use snapdiff::snapshot::{Category, Column, Dialect};

fn rename_name_to_full_name() -> ScriptedResolver {
    ScriptedResolver::new().rename(Category::Columns, "users.name", "users.full_name")
}

#[rstest]
#[case(Dialect::Postgresql, "ALTER TABLE \"users\" RENAME COLUMN \"name\" TO \"full_name\";")]
#[case(Dialect::Mysql, "ALTER TABLE `users` RENAME COLUMN `name` TO `full_name`;")]
#[case(Dialect::Sqlite, "ALTER TABLE `users` RENAME COLUMN `name` TO `full_name`;")]
#[tokio::test]
async fn test_column_rename_is_one_statement(#[case] dialect: Dialect, #[case] expected: &str) {
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(dialect, vec![with_column_renamed(users_table(), "name", "full_name")]),
    );

    helper
        .run_migration_test(rename_name_to_full_name(), |statements, generated| {
            assert_eq!(statements, [expected.to_string()]);
            assert_eq!(
                generated.snapshot.meta.columns.get("users.name").map(String::as_str),
                Some("users.full_name")
            );
        })
        .await;
}

#[tokio::test]
async fn test_singlestore_column_rename_copies_data() {
    let dialect = Dialect::Singlestore;
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(dialect, vec![with_column_renamed(users_table(), "name", "full_name")]),
    );

    helper
        .run_migration_test(rename_name_to_full_name(), |statements, _| {
            assert_eq!(statements.len(), 3);
            let add = position_of(statements, "ADD `full_name`");
            let copy = position_of(statements, "UPDATE `users` SET `full_name` = `name`");
            let drop = position_of(statements, "DROP COLUMN `name`");
            assert!(add < copy && copy < drop);
        })
        .await;
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[tokio::test]
async fn test_nullable_column_add_is_in_place(#[case] dialect: Dialect) {
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(dialect, vec![with_column(users_table(), Column::new("bio", "text"))]),
    );

    let statements = helper.statements().await;
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("ALTER TABLE"));
    assert!(statements[0].contains("bio"));
}

#[tokio::test]
async fn test_sqlite_not_null_add_rebuilds_table() {
    let dialect = Dialect::Sqlite;
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(
            dialect,
            vec![with_column(users_table(), Column::new("email", "text").not_null())],
        ),
    );

    let statements = helper.statements().await;
    assert_eq!(statements.first().map(String::as_str), Some("PRAGMA foreign_keys=OFF;"));
    assert_eq!(statements.last().map(String::as_str), Some("PRAGMA foreign_keys=ON;"));

    let create = position_of(&statements, "CREATE TABLE `__new_users`");
    let copy = position_of(&statements, "INSERT INTO `__new_users`");
    let drop = position_of(&statements, "DROP TABLE `users`");
    let rename = position_of(&statements, "RENAME TO `users`");
    assert!(create < copy && copy < drop && drop < rename);
    assert!(statements[copy].contains("`id`,`name`"));
    assert!(!statements[copy].contains("email"));
}

#[tokio::test]
async fn test_mysql_type_change_modifies_column() {
    let dialect = Dialect::Mysql;
    let mut widened = users_table();
    widened.columns["name"].data_type = "varchar(512)".to_string();
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(dialect, vec![widened]),
    );

    let statements = helper.statements().await;
    assert_snapshot!(statements.join("\n"), @"ALTER TABLE `users` MODIFY COLUMN `name` varchar(512);");
}

#[tokio::test]
async fn test_postgres_not_null_and_default_changes() {
    let dialect = Dialect::Postgresql;
    let mut changed = users_table();
    changed.columns["name"] = Column::new("name", "text")
        .not_null()
        .with_default("'anonymous'");
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(dialect, vec![changed]),
    );

    let statements = helper.statements().await;
    assert!(statements.contains(
        &"ALTER TABLE \"users\" ALTER COLUMN \"name\" SET DEFAULT 'anonymous';".to_string()
    ));
    assert!(
        statements.contains(&"ALTER TABLE \"users\" ALTER COLUMN \"name\" SET NOT NULL;".to_string())
    );
}
