//! Snapshot fixtures shared by the integration tests.

use snapdiff::snapshot::{
    CheckConstraint, Column, Dialect, Enum, ForeignKey, Index, Policy, PolicyCommand, Role,
    Sequence, Snapshot, Table, UniqueConstraint, View,
};

/// `users(id, name)` in the default namespace.
pub fn users_table() -> Table {
    Table::new(
        "",
        "users",
        vec![
            Column::new("id", "integer").primary_key(),
            Column::new("name", "text"),
        ],
    )
}

/// `orders(id, user_id)` referencing `users(id)`.
pub fn orders_table() -> Table {
    Table::new(
        "",
        "orders",
        vec![
            Column::new("id", "integer").primary_key(),
            Column::new("user_id", "integer").not_null(),
        ],
    )
    .with_foreign_key(ForeignKey::new(
        "orders_user_id_users_id_fk",
        "orders",
        vec!["user_id"],
        "users",
        vec!["id"],
    ))
}

pub fn snapshot_with(dialect: Dialect, tables: Vec<Table>) -> Snapshot {
    tables
        .into_iter()
        .fold(Snapshot::empty(dialect), |snapshot, table| snapshot.with_table(table))
}

/// Replace one column of `table`, keeping its position.
pub fn with_column_renamed(mut table: Table, from: &str, to: &str) -> Table {
    table.columns = table
        .columns
        .into_iter()
        .map(|(name, mut column)| {
            if name == from {
                column.name = to.to_string();
                (to.to_string(), column)
            } else {
                (name, column)
            }
        })
        .collect();
    table
}

pub fn with_column(mut table: Table, column: Column) -> Table {
    table.columns.insert(column.name.clone(), column);
    table
}

/// PostgreSQL snapshot with at least one entity of every kind: schemas, enums, sequences,
/// roles, standalone and table policies on an RLS table, views, indexes and constraints.
pub fn full_postgres_snapshot() -> Snapshot {
    let mut owner_only = Policy::new("owner_only");
    owner_only.to = vec!["authenticated".to_string()];
    owner_only.using = Some("(user_id = current_user_id())".to_string());

    let mut accounts = Table::new(
        "auth",
        "accounts",
        vec![
            Column::new("id", "integer").primary_key(),
            Column::new("user_id", "integer").not_null(),
            Column::new("email", "varchar(255)").not_null(),
            Column::new("status", "account_status")
                .of_enum("auth")
                .not_null()
                .with_default("'active'"),
            Column::new("balance", "integer").with_default("0"),
        ],
    )
    .with_index(Index::on_columns("accounts_email_idx", &["email"]).unique())
    .with_index(Index::on_columns("accounts_status_idx", &["status"]))
    .with_unique(UniqueConstraint::new("accounts_user_id_unique", &["user_id"]))
    .with_check(CheckConstraint::new("accounts_balance_check", "\"balance\" >= 0"))
    .with_foreign_key(ForeignKey::new(
        "accounts_user_id_users_id_fk",
        "accounts",
        vec!["user_id"],
        "users",
        vec!["id"],
    ))
    .with_policy(owner_only);
    accounts.rls_enabled = true;

    let mut balances = View::new(
        "auth",
        "account_balances",
        "select \"id\", \"balance\" from \"auth\".\"accounts\"",
    );
    balances.materialized = true;

    let mut snapshot = Snapshot::empty(Dialect::Postgresql)
        .with_enum(Enum::new("auth", "account_status", &["active", "suspended"]))
        .with_table(users_table())
        .with_table(accounts)
        .with_view(View::new(
            "auth",
            "active_accounts",
            "select \"id\" from \"auth\".\"accounts\" where \"status\" = 'active'",
        ))
        .with_view(balances);
    snapshot.schemas.insert("auth".to_string(), "auth".to_string());

    let mut invoices = Sequence::new("auth", "invoice_number_seq");
    invoices.start_with = Some("1000".to_string());
    snapshot.sequences.insert("auth.invoice_number_seq".to_string(), invoices);

    snapshot.roles.insert("authenticated".to_string(), Role::new("authenticated"));

    let mut auditors = Policy::new("auditors_read");
    auditors.command = PolicyCommand::Select;
    auditors.to = vec!["authenticated".to_string()];
    auditors.on = Some("auth.accounts".to_string());
    snapshot.policies.insert("auditors_read".to_string(), auditors);

    snapshot
}
