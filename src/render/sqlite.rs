//! SQLite rendering.
//!
//! `ALTER TABLE` here can only add, drop and rename columns, so every other change to an
//! existing table is folded into a rebuild. Foreign keys live inside `CREATE TABLE`.

use crate::diff::operations::{
    ColumnAction, ConstraintAction, ConstraintOperation, IndexOperation, MigrationStep,
    TableOperation, ViewOperation,
};
use crate::render::recreate::{fold_rebuilds, rebuild_sql};
use crate::render::{
    RenderResult, SqlDialect, create_table_sql, default_clause, quote_with, referential_actions,
};
use crate::snapshot::{Column, Dialect, GeneratedKind, Index, Table, View};
use crate::squash::SquashedSchema;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn kind(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn inline_foreign_keys(&self) -> bool {
        true
    }

    fn combine(
        &self,
        steps: Vec<MigrationStep>,
        prev: &SquashedSchema,
        cur: &SquashedSchema,
    ) -> Vec<MigrationStep> {
        let created: Vec<(String, String)> = steps
            .iter()
            .filter_map(|step| match step {
                MigrationStep::Table(TableOperation::Create { table }) => {
                    Some((table.schema.clone(), table.name.clone()))
                }
                _ => None,
            })
            .collect();

        let mut split = Vec::with_capacity(steps.len());
        for step in steps {
            match step {
                // declared inline by CREATE TABLE
                MigrationStep::Constraint(ConstraintOperation {
                    ref schema,
                    ref table,
                    action: ConstraintAction::AddForeignKey { .. },
                }) if created.contains(&(schema.clone(), table.clone())) => {}
                MigrationStep::Index(IndexOperation::Rename {
                    schema,
                    table,
                    from,
                    index,
                }) => {
                    split.push(MigrationStep::Index(IndexOperation::Drop {
                        schema: schema.clone(),
                        table: table.clone(),
                        index: Index {
                            name: from,
                            ..index.clone()
                        },
                    }));
                    split.push(MigrationStep::Index(IndexOperation::Create {
                        schema,
                        table,
                        index,
                    }));
                }
                MigrationStep::View(ViewOperation::Rename { from, view }) => {
                    split.push(MigrationStep::View(ViewOperation::Drop {
                        view: View {
                            name: from,
                            ..view.clone()
                        },
                    }));
                    split.push(MigrationStep::View(ViewOperation::Create { view }));
                }
                step => split.push(step),
            }
        }

        fold_rebuilds(split, prev, cur, needs_rebuild)
    }

    fn render_sql(&self, step: &MigrationStep) -> RenderResult {
        match step {
            MigrationStep::Table(op) => self.table(step, op),
            MigrationStep::Column(op) => {
                let table = self.qualify(&op.schema, &op.table);
                let sql = match &op.action {
                    ColumnAction::Add { column } => {
                        format!("ALTER TABLE {table} ADD {};", self.column_definition(column))
                    }
                    ColumnAction::Drop { name } => {
                        format!("ALTER TABLE {table} DROP COLUMN {};", self.quote_ident(name))
                    }
                    ColumnAction::Rename { from, to } => format!(
                        "ALTER TABLE {table} RENAME COLUMN {} TO {};",
                        self.quote_ident(from),
                        self.quote_ident(to)
                    ),
                    ColumnAction::CopyData { from, to } => format!(
                        "UPDATE {table} SET {} = {};",
                        self.quote_ident(to),
                        self.quote_ident(from)
                    ),
                    _ => {
                        return Err(self.unsupported(
                            step,
                            "alter column",
                            "column changes require a table rebuild",
                        ));
                    }
                };
                Ok(vec![sql])
            }
            MigrationStep::Constraint(_) => Err(self.unsupported(
                step,
                "alter constraint",
                "constraints require a table rebuild",
            )),
            MigrationStep::Index(IndexOperation::Create { table, index, .. }) => {
                let mut sql = format!(
                    "CREATE {}INDEX {} ON {} ({})",
                    if index.is_unique { "UNIQUE " } else { "" },
                    self.quote_ident(&index.name),
                    self.quote_ident(table),
                    index_columns(self, index)
                );
                if let Some(where_clause) = &index.where_clause {
                    sql.push_str(&format!(" WHERE {where_clause}"));
                }
                sql.push(';');
                Ok(vec![sql])
            }
            MigrationStep::Index(IndexOperation::Drop { index, .. }) => {
                Ok(vec![format!("DROP INDEX {};", self.quote_ident(&index.name))])
            }
            MigrationStep::View(ViewOperation::Create { view }) => Ok(vec![format!(
                "CREATE VIEW {} AS {};",
                self.quote_ident(&view.name),
                view.definition.as_deref().unwrap_or_default()
            )]),
            MigrationStep::View(ViewOperation::Drop { view }) => {
                Ok(vec![format!("DROP VIEW {};", self.quote_ident(&view.name))])
            }
            MigrationStep::Index(IndexOperation::Rename { .. })
            | MigrationStep::View(ViewOperation::Rename { .. }) => Err(self.unsupported(
                step,
                "rename",
                "renames are rewritten as drop and create",
            )),
            MigrationStep::View(ViewOperation::Move { .. }) => {
                Err(self.unsupported(step, "move view", "there are no schemas"))
            }
            MigrationStep::Schema(_)
            | MigrationStep::Enum(_)
            | MigrationStep::Sequence(_)
            | MigrationStep::Role(_)
            | MigrationStep::Policy(_) => Err(self.unsupported(
                step,
                "create or change",
                "this kind of entity does not exist in SQLite",
            )),
        }
    }
}

/// Changes ALTER TABLE cannot make on `before`.
fn needs_rebuild(step: &MigrationStep, before: &Table) -> bool {
    match step {
        MigrationStep::Column(op) => match &op.action {
            ColumnAction::Add { column } => {
                column.primary_key
                    || (column.not_null && column.default.is_none() && column.generated.is_none())
                    || column
                        .generated
                        .as_ref()
                        .is_some_and(|generated| generated.kind == GeneratedKind::Stored)
            }
            ColumnAction::Drop { name } => {
                before.is_key_column(name)
                    || before
                        .indexes
                        .values()
                        .any(|index| index.column_names().any(|column| column == name))
            }
            ColumnAction::Rename { .. } | ColumnAction::CopyData { .. } => false,
            _ => true,
        },
        MigrationStep::Constraint(_) => true,
        _ => false,
    }
}

fn index_columns(dialect: &dyn SqlDialect, index: &Index) -> String {
    index
        .columns
        .iter()
        .map(|column| {
            let mut sql = if column.is_expression {
                column.expression.clone()
            } else {
                dialect.quote_ident(&column.expression)
            };
            if !column.asc {
                sql.push_str(" DESC");
            }
            sql
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl Sqlite {
    pub fn column_definition(&self, column: &Column) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), column.data_type);
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
            if column.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        sql.push_str(&default_clause(column));
        if let Some(generated) = &column.generated {
            sql.push_str(&format!(
                " GENERATED ALWAYS AS ({}) {}",
                generated.expression,
                generated.kind.keyword()
            ));
        }
        if column.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    fn create_table(&self, table: &Table) -> String {
        let mut lines: Vec<String> = table
            .columns
            .values()
            .map(|column| self.column_definition(column))
            .collect();
        for pk in table.composite_primary_keys.values() {
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY({})",
                self.quote_ident(&pk.name),
                self.column_list(&pk.columns)
            ));
        }
        for unique in table.unique_constraints.values() {
            lines.push(format!(
                "CONSTRAINT {} UNIQUE({})",
                self.quote_ident(&unique.name),
                self.column_list(&unique.columns)
            ));
        }
        for fk in table.foreign_keys.values() {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({}){}",
                self.column_list(&fk.columns_from),
                self.quote_ident(&fk.table_to),
                self.column_list(&fk.columns_to),
                referential_actions(fk)
            ));
        }
        for check in table.check_constraints.values() {
            lines.push(format!(
                "CONSTRAINT {} CHECK({})",
                self.quote_ident(&check.name),
                check.value
            ));
        }
        create_table_sql(&self.quote_ident(&table.name), lines)
    }

    fn table(&self, step: &MigrationStep, op: &TableOperation) -> RenderResult {
        match op {
            TableOperation::Create { table } => Ok(vec![self.create_table(table)]),
            TableOperation::Drop { name, .. } => {
                Ok(vec![format!("DROP TABLE {};", self.quote_ident(name))])
            }
            TableOperation::Rename { from, to, .. } => Ok(vec![format!(
                "ALTER TABLE {} RENAME TO {};",
                self.quote_ident(from),
                self.quote_ident(to)
            )]),
            TableOperation::Recreate {
                table,
                copied_columns,
                ..
            } => {
                let mut sql = vec!["PRAGMA foreign_keys=OFF;".to_string()];
                sql.extend(rebuild_sql(self, table, copied_columns, |t| {
                    self.create_table(t)
                }));
                sql.push("PRAGMA foreign_keys=ON;".to_string());
                Ok(sql)
            }
            TableOperation::Move { .. } => {
                Err(self.unsupported(step, "move table", "there are no schemas"))
            }
            TableOperation::EnableRowLevelSecurity { .. }
            | TableOperation::DisableRowLevelSecurity { .. } => Err(self.unsupported(
                step,
                "toggle row level security",
                "row level security does not exist in SQLite",
            )),
        }
    }
}
