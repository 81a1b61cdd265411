//! Statement compiler: resolved diff → ordered, rendered statements.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::diff::operations::{ColumnAction, ColumnOperation, MigrationStep, Operation};
use crate::diff::order::order_steps;
use crate::diff::{ResolvedDiff, build_steps};
use crate::error::{Result, UnsupportedOperation};
use crate::render::{RenderedSql, SqlDialect};
use crate::snapshot::SnapshotMeta;
use crate::snapshot::id::EntityId;
use crate::squash::{Mode, SquashedSchema};

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub step: MigrationStep,
    pub sql: Vec<RenderedSql>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationMeta {
    /// Renames applied by this migration, recorded in the new snapshot's `_meta`.
    pub renames: SnapshotMeta,
    /// Steps the dialect could not express; they are not part of the output.
    pub warnings: Vec<UnsupportedOperation>,
    /// Push mode only: for each statement index, what it needs to exist first.
    pub dependencies: BTreeMap<usize, Vec<EntityId>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledMigration {
    pub sql_statements: Vec<String>,
    pub statements: Vec<CompiledStatement>,
    pub meta: MigrationMeta,
}

impl CompiledMigration {
    pub fn is_empty(&self) -> bool {
        self.sql_statements.is_empty()
    }
}

pub fn compile(
    diff: &ResolvedDiff,
    dialect: &dyn SqlDialect,
    mode: Mode,
) -> Result<CompiledMigration> {
    info!("Compiling migration for {}...", dialect.kind());

    let mut steps = build_steps(diff);
    if !dialect.supports_column_rename() {
        steps = expand_column_renames(steps, &diff.cur);
    }
    let steps = dialect.combine(steps, &diff.prev, &diff.cur);
    let steps = order_steps(steps, dialect.inline_foreign_keys());

    let mut compiled = CompiledMigration {
        meta: MigrationMeta {
            renames: diff.renames.clone(),
            ..MigrationMeta::default()
        },
        ..CompiledMigration::default()
    };

    for step in steps {
        match dialect.render(&step) {
            Ok(sql) => {
                if mode == Mode::Push {
                    let dependencies = step.dependencies();
                    if !dependencies.is_empty() {
                        compiled
                            .meta
                            .dependencies
                            .insert(compiled.statements.len(), dependencies);
                    }
                }
                compiled
                    .sql_statements
                    .extend(sql.iter().map(|rendered| rendered.sql.clone()));
                compiled.statements.push(CompiledStatement { step, sql });
            }
            Err(unsupported) => {
                warn!("Skipping statement: {unsupported}");
                compiled.meta.warnings.push(unsupported);
            }
        }
    }

    debug!(
        "Compiled {} steps into {} statements",
        compiled.statements.len(),
        compiled.sql_statements.len()
    );
    Ok(compiled)
}

/// Replace column renames with add, copy and drop, for dialects without `RENAME COLUMN`.
fn expand_column_renames(steps: Vec<MigrationStep>, cur: &SquashedSchema) -> Vec<MigrationStep> {
    let mut expanded = Vec::with_capacity(steps.len());
    for step in steps {
        let MigrationStep::Column(ColumnOperation {
            schema,
            table,
            action: ColumnAction::Rename { from, to },
        }) = &step
        else {
            expanded.push(step);
            continue;
        };
        let Some(column) = cur.table(schema, table).and_then(|t| t.columns.get(to)) else {
            expanded.push(step);
            continue;
        };

        debug!("Expanding rename of {table}.{from} into add, copy and drop");
        expanded.push(column_step(
            schema,
            table,
            ColumnAction::Add {
                column: column.clone(),
            },
        ));
        expanded.push(column_step(
            schema,
            table,
            ColumnAction::CopyData {
                from: from.clone(),
                to: to.clone(),
            },
        ));
        expanded.push(column_step(
            schema,
            table,
            ColumnAction::Drop { name: from.clone() },
        ));
    }
    expanded
}

fn column_step(schema: &str, table: &str, action: ColumnAction) -> MigrationStep {
    MigrationStep::Column(ColumnOperation::new(schema, table, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_snapshots;
    use crate::render::dialect_for;
    use crate::resolver::{Heuristic, HeuristicResolver, ScriptedResolver};
    use crate::snapshot::id::Category;
    use crate::snapshot::{Column, Dialect, ForeignKey, Snapshot, Table};
    use crate::squash::Squash;

    fn users(dialect: Dialect, name_column: &str) -> Snapshot {
        Snapshot::empty(dialect).with_table(Table::new(
            "",
            "users",
            vec![
                Column::new("id", "int").primary_key(),
                Column::new(name_column, "text"),
            ],
        ))
    }

    async fn compile_pair(
        prev: &Snapshot,
        cur: &Snapshot,
        resolver: &mut ScriptedResolver,
        mode: Mode,
    ) -> CompiledMigration {
        let prev = prev.squash(mode).unwrap();
        let cur = cur.squash(mode).unwrap();
        let diff = diff_snapshots(&prev, &cur, resolver).await.unwrap();
        compile(&diff, dialect_for(cur.dialect).as_ref(), mode).unwrap()
    }

    #[tokio::test]
    async fn test_rename_column_is_one_statement() {
        let mut resolver =
            ScriptedResolver::new().rename(Category::Columns, "users.name", "users.full_name");
        let compiled = compile_pair(
            &users(Dialect::Postgresql, "name"),
            &users(Dialect::Postgresql, "full_name"),
            &mut resolver,
            Mode::Default,
        )
        .await;
        assert_eq!(
            compiled.sql_statements,
            vec![r#"ALTER TABLE "users" RENAME COLUMN "name" TO "full_name";"#]
        );
        assert_eq!(
            compiled.meta.renames.columns.get("users.name").map(String::as_str),
            Some("users.full_name")
        );
    }

    #[tokio::test]
    async fn test_singlestore_rename_copies_into_new_column() {
        let mut resolver =
            ScriptedResolver::new().rename(Category::Columns, "users.name", "users.full_name");
        let compiled = compile_pair(
            &users(Dialect::Singlestore, "name"),
            &users(Dialect::Singlestore, "full_name"),
            &mut resolver,
            Mode::Default,
        )
        .await;
        assert_eq!(
            compiled.sql_statements,
            vec![
                "ALTER TABLE `users` ADD `full_name` text;",
                "UPDATE `users` SET `full_name` = `name`;",
                "ALTER TABLE `users` DROP COLUMN `name`;",
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_steps_become_warnings() {
        let prev = users(Dialect::Singlestore, "name");
        let cur = Snapshot::empty(Dialect::Singlestore)
            .with_table(prev.tables["users"].clone())
            .with_table(
                Table::new(
                    "",
                    "orders",
                    vec![Column::new("id", "int"), Column::new("user_id", "int")],
                )
                .with_foreign_key(ForeignKey::new(
                    "orders_user_id_users_id_fk",
                    "orders",
                    vec!["user_id"],
                    "users",
                    vec!["id"],
                )),
            );
        let compiled =
            compile_pair(&prev, &cur, &mut ScriptedResolver::new(), Mode::Default).await;
        assert_eq!(compiled.statements.len(), 1);
        assert_eq!(compiled.meta.warnings.len(), 1);
        assert_eq!(compiled.meta.warnings[0].dialect, Dialect::Singlestore);
    }

    #[tokio::test]
    async fn test_push_mode_records_dependencies() {
        let prev = Snapshot::empty(Dialect::Postgresql);
        let cur = users(Dialect::Postgresql, "name").with_table(
            Table::new(
                "",
                "orders",
                vec![Column::new("id", "int"), Column::new("user_id", "int")],
            )
            .with_foreign_key(ForeignKey::new(
                "orders_user_id_users_id_fk",
                "orders",
                vec!["user_id"],
                "users",
                vec!["id"],
            )),
        );
        let compiled = compile_pair(&prev, &cur, &mut ScriptedResolver::new(), Mode::Push).await;

        let fk_position = compiled
            .statements
            .iter()
            .position(|s| s.sql[0].sql.contains("FOREIGN KEY"))
            .unwrap();
        let users_position = compiled
            .statements
            .iter()
            .position(|s| s.sql[0].sql.starts_with(r#"CREATE TABLE "users""#))
            .unwrap();
        assert!(users_position < fk_position);
        assert!(compiled.meta.dependencies[&fk_position].contains(&EntityId::table("", "users")));
    }

    #[tokio::test]
    async fn test_same_shape_heuristic_renames_table() {
        let prev = users(Dialect::Sqlite, "name");
        let mut renamed = prev.tables["users"].clone();
        renamed.name = "accounts".into();
        let cur = Snapshot::empty(Dialect::Sqlite).with_table(renamed);

        let prev = prev.squash(Mode::Default).unwrap();
        let cur = cur.squash(Mode::Default).unwrap();
        let mut resolver = HeuristicResolver::new(Heuristic::SameShape);
        let diff = diff_snapshots(&prev, &cur, &mut resolver).await.unwrap();
        let compiled = compile(&diff, dialect_for(Dialect::Sqlite).as_ref(), Mode::Default).unwrap();
        assert_eq!(
            compiled.sql_statements,
            vec!["ALTER TABLE `users` RENAME TO `accounts`;"]
        );
    }
}
