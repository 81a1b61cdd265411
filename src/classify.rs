//! Destructive-change classification for push.
//!
//! Each compiled statement is checked against the previous state and, when an executor is
//! available, against live row counts. Anything that can lose data or fail on existing rows
//! produces a line for the user and sets the approval flag. Approval gates the whole batch:
//! every statement is returned for execution, in order.

use std::collections::BTreeMap;

use tracing::debug;

use crate::db::{Executor, scalar_u64};
use crate::diff::operations::{
    ColumnAction, ConstraintAction, IndexOperation, MigrationStep, PolicyOperation,
    SchemaOperation, TableOperation,
};
use crate::error::{DiffError, Result};
use crate::migrate::compile::CompiledMigration;
use crate::render::{SqlDialect, dialect_for};
use crate::snapshot::{EntityId, EntityKey, SnapshotMeta, Table};
use crate::squash::SquashedSchema;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub should_ask_for_approve: bool,
    pub statements_to_execute: Vec<String>,
    pub info_to_print: Vec<String>,
    /// Tables whose existing rows would make a statement fail. Reported, never truncated.
    pub tables_to_truncate: Vec<EntityKey>,
}

/// Rows in a table: `None` when nothing could be asked, which counts as holding data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowCount(Option<u64>);

impl RowCount {
    fn has_rows(self) -> bool {
        self.0.is_none_or(|count| count > 0)
    }

    fn describe(self) -> String {
        match self.0 {
            Some(count) => format!("{count} items"),
            None => "existing data".to_string(),
        }
    }
}

struct Classifier<'a, E> {
    prev: &'a SquashedSchema,
    executor: Option<&'a E>,
    dialect: Box<dyn SqlDialect>,
    origins: LiveNames,
    counts: BTreeMap<EntityKey, RowCount>,
    result: Classification,
}

/// Maps names after this migration's renames back to the names the live database still
/// uses. Statements carry new names; probes run before anything is applied.
#[derive(Debug, Default)]
struct LiveNames {
    tables: BTreeMap<String, String>,
    schemas: BTreeMap<String, String>,
}

impl LiveNames {
    fn new(renames: &SnapshotMeta) -> Self {
        let invert = |map: &BTreeMap<String, String>| {
            map.iter()
                .map(|(from, to)| (to.clone(), from.clone()))
                .collect()
        };
        Self {
            tables: invert(&renames.tables),
            schemas: invert(&renames.schemas),
        }
    }

    fn table(&self, schema: &str, table: &str) -> EntityKey {
        // table renames were recorded after schema renames were patched in
        let (schema, table) = match self.tables.get(&EntityId::table(schema, table).path()) {
            Some(old) => match old.split_once('.') {
                Some((schema, table)) => (schema.to_string(), table.to_string()),
                None => (String::new(), old.clone()),
            },
            None => (schema.to_string(), table.to_string()),
        };
        let schema = self.schemas.get(&schema).cloned().unwrap_or(schema);
        EntityKey::new(schema, table)
    }
}

pub async fn classify<E: Executor>(
    compiled: &CompiledMigration,
    prev: &SquashedSchema,
    executor: Option<&E>,
) -> Result<Classification> {
    let mut classifier = Classifier {
        prev,
        executor,
        dialect: dialect_for(prev.dialect),
        origins: LiveNames::new(&compiled.meta.renames),
        counts: BTreeMap::new(),
        result: Classification {
            statements_to_execute: compiled.sql_statements.clone(),
            ..Classification::default()
        },
    };

    for statement in &compiled.statements {
        classifier.check(&statement.step).await?;
    }

    debug!(
        "Classified {} statements, approval needed: {}",
        compiled.statements.len(),
        classifier.result.should_ask_for_approve
    );
    Ok(classifier.result)
}

impl<E: Executor> Classifier<'_, E> {
    async fn row_count(&mut self, schema: &str, table: &str) -> Result<RowCount> {
        let key = self.origins.table(schema, table);
        if let Some(count) = self.counts.get(&key) {
            return Ok(*count);
        }
        let count = match self.executor {
            None => RowCount(None),
            Some(executor) => {
                let sql = format!(
                    "select count(*) as count from {}",
                    self.dialect.qualify(&key.namespace, &key.name)
                );
                let rows = executor
                    .query(&sql, &[])
                    .await
                    .map_err(|source| DiffError::Execution {
                        statement: sql.clone(),
                        source,
                    })?;
                RowCount(scalar_u64(&rows, "count"))
            }
        };
        self.counts.insert(key, count);
        Ok(count)
    }

    fn warn(&mut self, message: String) {
        self.result.should_ask_for_approve = true;
        self.result.info_to_print.push(message);
    }

    fn would_fail(&mut self, schema: &str, table: &str, message: String) {
        let key = self.origins.table(schema, table);
        if !self.result.tables_to_truncate.contains(&key) {
            self.result.tables_to_truncate.push(key);
        }
        self.warn(message);
    }

    async fn check(&mut self, step: &MigrationStep) -> Result<()> {
        match step {
            MigrationStep::Table(TableOperation::Drop { schema, name }) => {
                let count = self.row_count(schema, name).await?;
                if count.has_rows() {
                    self.warn(format!(
                        "· You're about to delete {} table with {}",
                        display(schema, name),
                        count.describe()
                    ));
                }
            }
            MigrationStep::Table(TableOperation::Recreate {
                table,
                dropped_columns,
                ..
            }) => self.check_rebuild(table, dropped_columns).await?,
            MigrationStep::Schema(SchemaOperation::Drop { name }) => {
                let tables = self
                    .prev
                    .tables
                    .values()
                    .filter(|table| &table.schema == name)
                    .count();
                if tables > 0 {
                    self.warn(format!(
                        "· You're about to delete {name} schema with {tables} tables"
                    ));
                }
            }
            MigrationStep::Column(op) => self.check_column(&op.schema, &op.table, &op.action).await?,
            MigrationStep::Constraint(op) => match &op.action {
                ConstraintAction::DropUnique { unique } => {
                    self.check_unique_dropped(&op.schema, &op.table, &unique.name, "constraint")
                        .await?
                }
                ConstraintAction::AddUnique { unique } => {
                    self.check_unique_added(&op.schema, &op.table, &unique.name).await?
                }
                _ => {}
            },
            MigrationStep::Index(IndexOperation::Drop {
                schema,
                table,
                index,
            }) if index.is_unique => {
                self.check_unique_dropped(schema, table, &index.name, "index").await?
            }
            MigrationStep::Policy(PolicyOperation::Drop { target, name }) => {
                let protected = self
                    .prev
                    .table(&target.schema, &target.table)
                    .is_some_and(|table| table.rls_enabled);
                if protected {
                    self.warn(format!(
                        "· You're about to drop {name} policy on {} table, which has row level security enabled",
                        display(&target.schema, &target.table)
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// A rebuild replaces column and constraint statements, so every change it carries is
    /// checked against the table it replaces.
    async fn check_rebuild(&mut self, after: &Table, dropped_columns: &[String]) -> Result<()> {
        let (schema, name) = (after.schema.as_str(), after.name.as_str());
        let prev = self.prev;
        let Some(before) = prev.table(schema, name) else {
            return Ok(());
        };

        for column in dropped_columns {
            self.check_column(schema, name, &ColumnAction::Drop { name: column.clone() })
                .await?;
        }
        for column in after.columns.values() {
            let Some(old) = before.columns.get(&column.name) else {
                self.check_column(schema, name, &ColumnAction::Add { column: column.clone() })
                    .await?;
                continue;
            };
            if old.data_type != column.data_type {
                let action = ColumnAction::AlterType {
                    column: column.clone(),
                    from_type: old.data_type.clone(),
                };
                self.check_column(schema, name, &action).await?;
            }
            if column.not_null && !old.not_null {
                let action = ColumnAction::SetNotNull { column: column.clone() };
                self.check_column(schema, name, &action).await?;
            }
        }

        for unique in before.unique_constraints.keys() {
            if !after.unique_constraints.contains_key(unique) {
                self.check_unique_dropped(schema, name, unique, "constraint").await?;
            }
        }
        for (unique, constraint) in &after.unique_constraints {
            if before.unique_constraints.get(unique) != Some(constraint) {
                self.check_unique_added(schema, name, unique).await?;
            }
        }
        for index in before.indexes.values().filter(|index| index.is_unique) {
            if !after.indexes.values().any(|kept| kept.name == index.name && kept.is_unique) {
                self.check_unique_dropped(schema, name, &index.name, "index").await?;
            }
        }
        Ok(())
    }

    async fn check_unique_dropped(
        &mut self,
        schema: &str,
        table: &str,
        unique: &str,
        kind: &str,
    ) -> Result<()> {
        let count = self.row_count(schema, table).await?;
        if count.has_rows() {
            self.warn(format!(
                "· You're about to drop {unique} unique {kind} on {} table with {}",
                display(schema, table),
                count.describe()
            ));
        }
        Ok(())
    }

    async fn check_unique_added(&mut self, schema: &str, table: &str, unique: &str) -> Result<()> {
        let count = self.row_count(schema, table).await?;
        if count.has_rows() {
            self.would_fail(
                schema,
                table,
                format!(
                    "· You're about to add {unique} unique constraint to {} table, which contains {}. If duplicates exist the statement will fail",
                    display(schema, table),
                    count.describe()
                ),
            );
        }
        Ok(())
    }

    async fn check_column(&mut self, schema: &str, table: &str, action: &ColumnAction) -> Result<()> {
        let name = display(schema, table);
        match action {
            ColumnAction::Drop { name: column } => {
                let count = self.row_count(schema, table).await?;
                if count.has_rows() {
                    self.warn(format!(
                        "· You're about to delete {column} column in {name} table with {}",
                        count.describe()
                    ));
                }
            }
            ColumnAction::AlterType { column, from_type } => {
                if is_narrowing(from_type, &column.data_type) {
                    let count = self.row_count(schema, table).await?;
                    if count.has_rows() {
                        self.warn(format!(
                            "· You're about to change {} column type in {name} table from {from_type} to {} with {}",
                            column.name,
                            column.data_type,
                            count.describe()
                        ));
                    }
                }
            }
            ColumnAction::SetNotNull { column } if column.default.is_none() => {
                let count = self.row_count(schema, table).await?;
                if count.has_rows() {
                    self.would_fail(
                        schema,
                        table,
                        format!(
                            "· You're about to set not-null constraint to {} column without default, which contains {}",
                            column.name,
                            count.describe()
                        ),
                    );
                }
            }
            ColumnAction::Add { column }
                if column.not_null && column.default.is_none() && column.generated.is_none() =>
            {
                let count = self.row_count(schema, table).await?;
                if count.has_rows() {
                    self.would_fail(
                        schema,
                        table,
                        format!(
                            "· You're about to add not-null {} column without default value to {name} table, which contains {}",
                            column.name,
                            count.describe()
                        ),
                    );
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn display(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        table.to_string()
    } else {
        format!("{schema}.{table}")
    }
}

/// Whether converting `from` to `to` can truncate or reject existing values.
pub fn is_narrowing(from: &str, to: &str) -> bool {
    let from = from.trim().to_lowercase();
    let to = to.trim().to_lowercase();
    if from == to {
        return false;
    }
    if let (Some(a), Some(b)) = (integer_rank(&from), integer_rank(&to)) {
        return b < a;
    }

    let (from_base, from_len) = split_length(&from);
    let (to_base, to_len) = split_length(&to);
    if (is_textual(from_base) && is_textual(to_base)) || from_base == to_base {
        return match (from_len, to_len) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(a), Some(b)) => b < a,
        };
    }
    // a different type family may reject values outright
    true
}

fn integer_rank(data_type: &str) -> Option<u8> {
    match data_type {
        "tinyint" => Some(0),
        "smallint" | "int2" | "smallserial" => Some(1),
        "mediumint" => Some(2),
        "integer" | "int" | "int4" | "serial" => Some(3),
        "bigint" | "int8" | "bigserial" => Some(4),
        _ => None,
    }
}

fn is_textual(base: &str) -> bool {
    matches!(
        base,
        "text" | "varchar" | "character varying" | "char" | "character" | "longtext" | "mediumtext"
    )
}

/// `varchar(255)` → (`varchar`, 255); `numeric(10,2)` → (`numeric`, 10).
fn split_length(data_type: &str) -> (&str, Option<u64>) {
    let Some((base, rest)) = data_type.split_once('(') else {
        return (data_type, None);
    };
    let length = rest
        .trim_end_matches(')')
        .split(',')
        .next()
        .and_then(|n| n.trim().parse().ok());
    (base.trim(), length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("integer", "bigint", false)]
    #[case("bigint", "integer", true)]
    #[case("varchar(255)", "varchar(64)", true)]
    #[case("varchar(64)", "text", false)]
    #[case("text", "varchar(64)", true)]
    #[case("numeric(10,2)", "numeric(12,2)", false)]
    #[case("text", "integer", true)]
    #[case("TEXT", "text", false)]
    fn test_is_narrowing(#[case] from: &str, #[case] to: &str, #[case] expected: bool) {
        assert_eq!(is_narrowing(from, to), expected);
    }

    #[test]
    fn test_live_names_undo_renames() {
        let mut renames = SnapshotMeta::default();
        renames.schemas.insert("auth".into(), "identity".into());
        renames
            .tables
            .insert("identity.users".into(), "identity.accounts".into());
        renames.tables.insert("orders".into(), "purchases".into());

        let names = LiveNames::new(&renames);
        assert_eq!(names.table("identity", "accounts"), EntityKey::new("auth", "users"));
        assert_eq!(names.table("identity", "sessions"), EntityKey::new("auth", "sessions"));
        assert_eq!(names.table("", "purchases"), EntityKey::new("", "orders"));
        assert_eq!(names.table("", "items"), EntityKey::new("", "items"));
    }

    #[test]
    fn test_unknown_row_count_counts_as_data() {
        assert!(RowCount(None).has_rows());
        assert!(!RowCount(Some(0)).has_rows());
        assert_eq!(RowCount(Some(3)).describe(), "3 items");
    }
}
