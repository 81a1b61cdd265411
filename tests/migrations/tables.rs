use crate::helpers::executor::FakeExecutor;
use crate::helpers::migration::MigrationTestHelper;
use crate::helpers::snapshots::{full_postgres_snapshot, orders_table, snapshot_with, users_table};
use rstest::rstest;
use snapdiff::config::ObjectFilter;
use snapdiff::diff::EntryKind;
use snapdiff::diff::operations::OperationKind;
use snapdiff::migrate::plan_push;
use snapdiff::render::Safety;
use snapdiff::resolver::ScriptedResolver;
use snapdiff::snapshot::{Category, Dialect, EntityId, Snapshot};

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_identical_snapshots_produce_nothing(#[case] dialect: Dialect) {
    let snapshot = snapshot_with(dialect, vec![users_table(), orders_table()]);
    let helper = MigrationTestHelper::new(snapshot.clone(), snapshot);

    let generated = helper.generate().await;
    assert!(!generated.has_changes());
    assert!(generated.entries.is_empty());
}

#[tokio::test]
async fn test_identical_postgres_snapshot_with_every_entity_produces_nothing() {
    let snapshot = full_postgres_snapshot();
    let helper = MigrationTestHelper::new(snapshot.clone(), snapshot.clone());

    let generated = helper.generate().await;
    assert!(generated.entries.is_empty(), "{:#?}", generated.entries);
    assert!(generated.migration.sql_statements.is_empty());

    let executor = FakeExecutor::new();
    let plan = plan_push(
        &snapshot,
        &snapshot,
        &ObjectFilter::default(),
        &mut ScriptedResolver::new(),
        Some(&executor),
    )
    .await
    .unwrap();
    assert!(plan.is_empty(), "{:#?}", plan.statements_to_execute);
    assert!(plan.warnings.is_empty());
    assert_eq!(executor.query_count(), 0);
}

#[rstest]
#[case(
    Dialect::Postgresql,
    "CREATE TABLE \"users\" (\n\t\"id\" integer PRIMARY KEY NOT NULL,\n\t\"name\" text\n);"
)]
#[case(
    Dialect::Mysql,
    "CREATE TABLE `users` (\n\t`id` integer PRIMARY KEY NOT NULL,\n\t`name` text\n);"
)]
#[case(
    Dialect::Sqlite,
    "CREATE TABLE `users` (\n\t`id` integer PRIMARY KEY NOT NULL,\n\t`name` text\n);"
)]
#[tokio::test]
async fn test_create_table(#[case] dialect: Dialect, #[case] expected: &str) {
    let helper = MigrationTestHelper::new(
        Snapshot::empty(dialect),
        snapshot_with(dialect, vec![users_table()]),
    );

    assert_eq!(helper.statements().await, vec![expected.to_string()]);
}

#[tokio::test]
async fn test_drop_table_is_marked_destructive() {
    let helper = MigrationTestHelper::new(
        snapshot_with(Dialect::Postgresql, vec![users_table()]),
        Snapshot::empty(Dialect::Postgresql),
    );

    let generated = helper.generate().await;
    assert_eq!(
        generated.migration.sql_statements,
        vec!["DROP TABLE \"users\" CASCADE;"]
    );
    assert_eq!(generated.migration.statements[0].sql[0].safety, Safety::Destructive);

    let descriptor = generated.migration.statements[0].step.descriptor();
    assert_eq!(descriptor.category, Category::Tables);
    assert_eq!(descriptor.entity, EntityId::table("", "users"));
    assert_eq!(descriptor.kind, OperationKind::Drop);
    assert!(descriptor.destructive);
}

#[rstest]
#[case(Dialect::Postgresql, "ALTER TABLE \"users\" RENAME TO \"accounts\";")]
#[case(Dialect::Mysql, "RENAME TABLE `users` TO `accounts`;")]
#[case(Dialect::Sqlite, "ALTER TABLE `users` RENAME TO `accounts`;")]
#[tokio::test]
async fn test_declared_table_rename(#[case] dialect: Dialect, #[case] expected: &str) {
    let mut accounts = users_table();
    accounts.name = "accounts".to_string();
    let helper = MigrationTestHelper::new(
        snapshot_with(dialect, vec![users_table()]),
        snapshot_with(dialect, vec![accounts]),
    );

    helper
        .run_migration_test(
            ScriptedResolver::new().rename(Category::Tables, "users", "accounts"),
            |statements, generated| {
                assert_eq!(statements, [expected.to_string()]);
                assert!(
                    generated
                        .entries
                        .iter()
                        .any(|e| e.category == Category::Tables && e.kind == EntryKind::Renamed)
                );
                assert_eq!(
                    generated.snapshot.meta.tables.get("users").map(String::as_str),
                    Some("accounts")
                );
            },
        )
        .await;
}

#[tokio::test]
async fn test_undeclared_rename_is_drop_and_create() {
    let mut accounts = users_table();
    accounts.name = "accounts".to_string();
    let helper = MigrationTestHelper::new(
        snapshot_with(Dialect::Postgresql, vec![users_table()]),
        snapshot_with(Dialect::Postgresql, vec![accounts]),
    );

    let statements = helper.statements().await;
    assert_eq!(statements.len(), 2);
    assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE \"accounts\"")));
    assert!(statements.iter().any(|s| s == "DROP TABLE \"users\" CASCADE;"));
}
