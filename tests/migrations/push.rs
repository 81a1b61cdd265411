use crate::helpers::executor::FakeExecutor;
use crate::helpers::snapshots::{orders_table, snapshot_with, users_table, with_column};
use snapdiff::config::{Filters, ObjectFilter};
use snapdiff::error::DiffError;
use snapdiff::migrate::{PushPlan, plan_push};
use rstest::rstest;
use snapdiff::resolver::ScriptedResolver;
use snapdiff::snapshot::{
    Category, Column, Dialect, EntityKey, Index, Policy, Snapshot, Table, UniqueConstraint,
};

/// How `users` appears at the end of a row-count query.
fn quoted_users(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgresql => "\"users\"",
        _ => "`users`",
    }
}

async fn plan(
    live: &Snapshot,
    schema: &Snapshot,
    filter: &ObjectFilter,
    executor: &FakeExecutor,
) -> PushPlan {
    plan_push(live, schema, filter, &mut ScriptedResolver::new(), Some(executor))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_nullable_column_add_needs_no_approval() {
    let live = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let schema = snapshot_with(
        Dialect::Postgresql,
        vec![with_column(users_table(), Column::new("bio", "text"))],
    );
    let executor = FakeExecutor::new().with_rows("\"users\"", 10);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(!plan.has_data_loss);
    assert!(plan.warnings.is_empty());
    assert_eq!(
        plan.statements_to_execute,
        vec!["ALTER TABLE \"users\" ADD COLUMN \"bio\" text;"]
    );
}

#[tokio::test]
async fn test_dropping_non_empty_table_needs_approval() {
    let live = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let schema = Snapshot::empty(Dialect::Postgresql);
    let executor = FakeExecutor::new().with_rows("\"users\"", 42);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("users"));
    assert!(plan.warnings[0].contains("42 items"));
    assert_eq!(plan.statements_to_execute.len(), 1);
}

#[tokio::test]
async fn test_dropping_empty_table_is_silent() {
    let live = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let schema = Snapshot::empty(Dialect::Postgresql);
    let executor = FakeExecutor::new();

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(!plan.has_data_loss);
    assert_eq!(plan.statements_to_execute, vec!["DROP TABLE \"users\" CASCADE;"]);
}

#[tokio::test]
async fn test_not_null_add_on_populated_table_lists_table() {
    let live = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let schema = snapshot_with(
        Dialect::Postgresql,
        vec![with_column(users_table(), Column::new("email", "text").not_null())],
    );
    let executor = FakeExecutor::new().with_rows("\"users\"", 3);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.tables_to_truncate, vec![EntityKey::new("", "users")]);
}

#[tokio::test]
async fn test_row_counts_are_probed_once_per_table() {
    let live = snapshot_with(
        Dialect::Postgresql,
        vec![with_column(users_table(), Column::new("bio", "text"))],
    );
    let schema = snapshot_with(
        Dialect::Postgresql,
        vec![Table::new("", "users", vec![Column::new("id", "integer").primary_key()])],
    );
    let executor = FakeExecutor::new().with_rows("\"users\"", 5);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert_eq!(plan.warnings.len(), 2);
    assert_eq!(executor.query_count(), 1);
}

#[tokio::test]
async fn test_filtered_tables_are_never_dropped() {
    let live = snapshot_with(
        Dialect::Postgresql,
        vec![users_table(), Table::new("", "temp_import", vec![Column::new("id", "integer")])],
    );
    let schema = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let filter = ObjectFilter::new(&Filters {
        tables: vec!["!temp_*".to_string()],
        schemas: vec![],
    });

    let plan = plan(&live, &schema, &filter, &FakeExecutor::new()).await;
    assert!(plan.is_empty());
}

#[tokio::test]
async fn test_apply_runs_statements_in_order() {
    let live = Snapshot::empty(Dialect::Postgresql);
    let schema = snapshot_with(Dialect::Postgresql, vec![orders_table(), users_table()]);
    let executor = FakeExecutor::new();

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    let applied = plan.apply(&executor).await.unwrap();

    assert_eq!(applied, 3);
    assert_eq!(executor.executed(), plan.statements_to_execute);
}

#[tokio::test]
async fn test_apply_stops_at_first_failure() {
    let live = Snapshot::empty(Dialect::Postgresql);
    let schema = snapshot_with(Dialect::Postgresql, vec![orders_table(), users_table()]);
    let executor = FakeExecutor::new().failing_on("FOREIGN KEY");

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    let err = plan.apply(&executor).await.unwrap_err();

    assert!(matches!(err, DiffError::Execution { ref statement, .. } if statement.contains("FOREIGN KEY")));
    assert_eq!(executor.executed().len(), 2);
}

#[tokio::test]
async fn test_dialect_mismatch_is_rejected() {
    let live = Snapshot::empty(Dialect::Mysql);
    let schema = Snapshot::empty(Dialect::Postgresql);

    let err = plan_push(
        &live,
        &schema,
        &ObjectFilter::default(),
        &mut ScriptedResolver::new(),
        None::<&FakeExecutor>,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DiffError::DialectMismatch { .. }));
}

#[tokio::test]
async fn test_renamed_table_is_counted_under_its_live_name() {
    let live = snapshot_with(Dialect::Postgresql, vec![users_table()]);
    let schema = snapshot_with(
        Dialect::Postgresql,
        vec![Table::new("", "accounts", vec![Column::new("id", "integer").primary_key()])],
    );
    let executor = FakeExecutor::new().with_rows("\"users\"", 7);
    let mut resolver = ScriptedResolver::new().rename(Category::Tables, "users", "accounts");

    let plan = plan_push(&live, &schema, &ObjectFilter::default(), &mut resolver, Some(&executor))
        .await
        .unwrap();

    assert_eq!(executor.queries(), vec!["select count(*) as count from \"users\""]);
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("name column in accounts table with 7 items"));
    assert!(
        plan.statements_to_execute
            .contains(&"ALTER TABLE \"accounts\" DROP COLUMN \"name\";".to_string())
    );
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_dropping_indexed_column_with_data_needs_approval(#[case] dialect: Dialect) {
    let live = snapshot_with(
        dialect,
        vec![
            with_column(users_table(), Column::new("email", "text"))
                .with_index(Index::on_columns("users_email_idx", &["email"])),
        ],
    );
    let schema = snapshot_with(dialect, vec![users_table()]);
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 4);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("email column in users table with 4 items"));
    assert!(plan.tables_to_truncate.is_empty());
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_narrowing_type_change_with_data_needs_approval(#[case] dialect: Dialect) {
    let live = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("email", "varchar(255)"))],
    );
    let schema = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("email", "varchar(16)"))],
    );
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 3);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(
        plan.warnings[0]
            .contains("email column type in users table from varchar(255) to varchar(16) with 3 items")
    );
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_widening_type_change_is_silent(#[case] dialect: Dialect) {
    let live = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("email", "varchar(16)"))],
    );
    let schema = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("email", "varchar(255)"))],
    );
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 3);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(!plan.has_data_loss);
    assert!(plan.warnings.is_empty());
    assert!(!plan.is_empty());
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_required_column_add_truncates_populated_table(#[case] dialect: Dialect) {
    let live = snapshot_with(dialect, vec![users_table()]);
    let schema = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("email", "text").not_null())],
    );
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 3);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("add not-null email column without default value to users table"));
    assert_eq!(plan.tables_to_truncate, vec![EntityKey::new("", "users")]);
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_set_not_null_truncates_populated_table(#[case] dialect: Dialect) {
    let live = snapshot_with(dialect, vec![with_column(users_table(), Column::new("bio", "text"))]);
    let schema = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("bio", "text").not_null())],
    );
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 2);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("set not-null constraint to bio column without default"));
    assert_eq!(plan.tables_to_truncate, vec![EntityKey::new("", "users")]);
}

#[rstest]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_rebuild_changes_on_empty_table_are_silent(#[case] dialect: Dialect) {
    let live = snapshot_with(dialect, vec![with_column(users_table(), Column::new("bio", "text"))]);
    let schema = snapshot_with(
        dialect,
        vec![with_column(users_table(), Column::new("bio", "varchar(8)").not_null())],
    );

    let plan = plan(&live, &schema, &ObjectFilter::default(), &FakeExecutor::new()).await;
    assert!(!plan.has_data_loss);
    assert!(plan.tables_to_truncate.is_empty());
    assert!(!plan.is_empty());
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[case(Dialect::Singlestore)]
#[tokio::test]
async fn test_dropping_unique_index_with_data_needs_approval(#[case] dialect: Dialect) {
    let email = || with_column(users_table(), Column::new("email", "varchar(255)"));
    let live = snapshot_with(
        dialect,
        vec![email().with_index(Index::on_columns("users_email_idx", &["email"]).unique())],
    );
    let schema = snapshot_with(dialect, vec![email()]);
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 6);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("drop users_email_idx unique index on users table with 6 items"));
}

#[rstest]
#[case(Dialect::Postgresql)]
#[case(Dialect::Mysql)]
#[case(Dialect::Sqlite)]
#[tokio::test]
async fn test_dropping_unique_constraint_with_data_needs_approval(#[case] dialect: Dialect) {
    let email = || with_column(users_table(), Column::new("email", "varchar(255)"));
    let live = snapshot_with(
        dialect,
        vec![email().with_unique(UniqueConstraint::new("users_email_unique", &["email"]))],
    );
    let schema = snapshot_with(dialect, vec![email()]);
    let executor = FakeExecutor::new().with_rows(quoted_users(dialect), 6);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &executor).await;
    assert!(plan.has_data_loss);
    assert_eq!(plan.warnings.len(), 1);
    assert!(
        plan.warnings[0].contains("drop users_email_unique unique constraint on users table with 6 items")
    );
}

#[tokio::test]
async fn test_dropping_policy_on_rls_table_needs_approval() {
    let mut protected = users_table();
    protected.rls_enabled = true;
    let live = snapshot_with(
        Dialect::Postgresql,
        vec![protected.clone().with_policy(Policy::new("owner_only"))],
    );
    let schema = snapshot_with(Dialect::Postgresql, vec![protected]);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &FakeExecutor::new()).await;
    assert!(plan.has_data_loss);
    assert_eq!(
        plan.warnings,
        vec!["· You're about to drop owner_only policy on users table, which has row level security enabled"]
    );
}

#[tokio::test]
async fn test_dropping_policy_without_rls_is_silent() {
    let live = snapshot_with(
        Dialect::Postgresql,
        vec![users_table().with_policy(Policy::new("owner_only"))],
    );
    let schema = snapshot_with(Dialect::Postgresql, vec![users_table()]);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &FakeExecutor::new()).await;
    assert!(!plan.has_data_loss);
    assert_eq!(plan.statements_to_execute.len(), 1);
}

#[tokio::test]
async fn test_dropping_schema_with_tables_needs_approval() {
    let mut live = snapshot_with(
        Dialect::Postgresql,
        vec![
            users_table(),
            Table::new("auth", "sessions", vec![Column::new("id", "integer").primary_key()]),
        ],
    );
    live.schemas.insert("auth".to_string(), "auth".to_string());
    let schema = snapshot_with(Dialect::Postgresql, vec![users_table()]);

    let plan = plan(&live, &schema, &ObjectFilter::default(), &FakeExecutor::new()).await;
    assert!(plan.has_data_loss);
    assert_eq!(
        plan.warnings,
        vec!["· You're about to delete auth schema with 1 tables"]
    );
}
