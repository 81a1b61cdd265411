//! MySQL rendering: backtick quoting, `MODIFY COLUMN` restating the whole column for type and
//! nullability changes, inline `AUTO_INCREMENT`.

use crate::diff::operations::{
    ColumnAction, ColumnOperation, ConstraintAction, ConstraintOperation, IndexOperation,
    MigrationStep, TableOperation, ViewOperation,
};
use crate::render::{
    RenderResult, SqlDialect, create_table_sql, default_clause, quote_with, referential_actions,
};
use crate::snapshot::{Column, Dialect, ForeignKey, Index, Table, View};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl SqlDialect for MySql {
    fn kind(&self) -> Dialect {
        Dialect::Mysql
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn render_sql(&self, step: &MigrationStep) -> RenderResult {
        match step {
            MigrationStep::Table(op) => self.table(step, op),
            MigrationStep::Column(op) => self.column(step, op),
            MigrationStep::Constraint(op) => Ok(vec![self.constraint(op)]),
            MigrationStep::Index(op) => Ok(vec![self.index(op)]),
            MigrationStep::View(op) => self.view(step, op),
            MigrationStep::Schema(_)
            | MigrationStep::Enum(_)
            | MigrationStep::Sequence(_)
            | MigrationStep::Role(_)
            | MigrationStep::Policy(_) => Err(self.unsupported(
                step,
                "create or change",
                "this kind of entity does not exist in MySQL",
            )),
        }
    }
}

impl MySql {
    pub fn column_definition(&self, column: &Column) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), column.data_type);
        if let Some(generated) = &column.generated {
            sql.push_str(&format!(
                " GENERATED ALWAYS AS ({}) {}",
                generated.expression,
                generated.kind.keyword()
            ));
        }
        if column.autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if column.not_null {
            sql.push_str(" NOT NULL");
        }
        sql.push_str(&default_clause(column));
        sql
    }

    pub(crate) fn create_table(&self, table: &Table, foreign_keys: bool) -> String {
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
        for check in table.check_constraints.values() {
            lines.push(format!(
                "CONSTRAINT {} CHECK({})",
                self.quote_ident(&check.name),
                check.value
            ));
        }
        if foreign_keys {
            for fk in table.foreign_keys.values() {
                lines.push(format!(
                    "CONSTRAINT {} {}",
                    self.quote_ident(&fk.name),
                    self.references(fk)
                ));
            }
        }
        create_table_sql(&self.quote_ident(&table.name), lines)
    }

    pub(crate) fn table(&self, step: &MigrationStep, op: &TableOperation) -> RenderResult {
        match op {
            // foreign keys follow as separate statements
            TableOperation::Create { table } => Ok(vec![self.create_table(table, false)]),
            TableOperation::Drop { name, .. } => {
                Ok(vec![format!("DROP TABLE {};", self.quote_ident(name))])
            }
            TableOperation::Rename { from, to, .. } => Ok(vec![format!(
                "RENAME TABLE {} TO {};",
                self.quote_ident(from),
                self.quote_ident(to)
            )]),
            TableOperation::Recreate { .. } => Err(self.unsupported(
                step,
                "recreate table",
                "tables are altered in place",
            )),
            TableOperation::Move { .. } => {
                Err(self.unsupported(step, "move table", "schemas are databases in MySQL"))
            }
            TableOperation::EnableRowLevelSecurity { .. }
            | TableOperation::DisableRowLevelSecurity { .. } => Err(self.unsupported(
                step,
                "toggle row level security",
                "row level security does not exist in MySQL",
            )),
        }
    }

    pub(crate) fn column(&self, step: &MigrationStep, op: &ColumnOperation) -> RenderResult {
        let table = self.quote_ident(&op.table);
        let modify = |column: &Column| {
            format!(
                "ALTER TABLE {table} MODIFY COLUMN {};",
                self.column_definition(column)
            )
        };

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
            ColumnAction::AlterType { column, .. }
            | ColumnAction::SetNotNull { column }
            | ColumnAction::DropNotNull { column }
            | ColumnAction::DropGenerated { column }
            | ColumnAction::AlterAutoincrement { column } => modify(column),
            ColumnAction::SetDefault { column } => format!(
                "ALTER TABLE {table} ALTER COLUMN {} SET DEFAULT {};",
                self.quote_ident(&column.name),
                column.default.as_deref().unwrap_or("NULL")
            ),
            ColumnAction::DropDefault { column } => format!(
                "ALTER TABLE {table} ALTER COLUMN {} DROP DEFAULT;",
                self.quote_ident(&column.name)
            ),
            ColumnAction::Regenerate { column } => {
                return Ok(vec![
                    format!(
                        "ALTER TABLE {table} DROP COLUMN {};",
                        self.quote_ident(&column.name)
                    ),
                    format!("ALTER TABLE {table} ADD {};", self.column_definition(column)),
                ]);
            }
            ColumnAction::SetIdentity { .. } | ColumnAction::DropIdentity { .. } => {
                return Err(self.unsupported(
                    step,
                    "change identity",
                    "use AUTO_INCREMENT instead",
                ));
            }
        };
        Ok(vec![sql])
    }

    fn references(&self, fk: &ForeignKey) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({}){}",
            self.column_list(&fk.columns_from),
            self.quote_ident(&fk.table_to),
            self.column_list(&fk.columns_to),
            referential_actions(fk)
        )
    }

    pub(crate) fn constraint(&self, op: &ConstraintOperation) -> String {
        let table = self.quote_ident(&op.table);
        let name = self.quote_ident(op.action.name());
        match &op.action {
            ConstraintAction::AddPrimaryKey { primary_key } => format!(
                "ALTER TABLE {table} ADD PRIMARY KEY({});",
                self.column_list(&primary_key.columns)
            ),
            ConstraintAction::DropPrimaryKey { .. } => {
                format!("ALTER TABLE {table} DROP PRIMARY KEY;")
            }
            ConstraintAction::AddUnique { unique } => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} UNIQUE({});",
                self.column_list(&unique.columns)
            ),
            // unique constraints are indexes in MySQL
            ConstraintAction::DropUnique { .. } => format!("DROP INDEX {name} ON {table};"),
            ConstraintAction::AddCheck { check } => {
                format!("ALTER TABLE {table} ADD CONSTRAINT {name} CHECK ({});", check.value)
            }
            ConstraintAction::DropCheck { .. } => {
                format!("ALTER TABLE {table} DROP CONSTRAINT {name};")
            }
            ConstraintAction::AddForeignKey { foreign_key } => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} {};",
                self.references(foreign_key)
            ),
            ConstraintAction::DropForeignKey { .. } => {
                format!("ALTER TABLE {table} DROP FOREIGN KEY {name};")
            }
        }
    }

    fn index_columns(&self, index: &Index) -> String {
        index
            .columns
            .iter()
            .map(|column| {
                let mut sql = if column.is_expression {
                    format!("({})", column.expression)
                } else {
                    self.quote_ident(&column.expression)
                };
                if !column.asc {
                    sql.push_str(" DESC");
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn index(&self, op: &IndexOperation) -> String {
        match op {
            IndexOperation::Create { table, index, .. } => format!(
                "CREATE {}INDEX {} ON {} ({});",
                if index.is_unique { "UNIQUE " } else { "" },
                self.quote_ident(&index.name),
                self.quote_ident(table),
                self.index_columns(index)
            ),
            IndexOperation::Drop { table, index, .. } => format!(
                "DROP INDEX {} ON {};",
                self.quote_ident(&index.name),
                self.quote_ident(table)
            ),
            IndexOperation::Rename {
                table, from, index, ..
            } => format!(
                "ALTER TABLE {} RENAME INDEX {} TO {};",
                self.quote_ident(table),
                self.quote_ident(from),
                self.quote_ident(&index.name)
            ),
        }
    }

    fn create_view(&self, view: &View) -> String {
        let mut sql = String::from("CREATE ");
        if let Some(algorithm) = &view.algorithm {
            sql.push_str(&format!("ALGORITHM = {algorithm} "));
        }
        if let Some(security) = &view.sql_security {
            sql.push_str(&format!("SQL SECURITY {security} "));
        }
        sql.push_str(&format!(
            "VIEW {} AS ({})",
            self.quote_ident(&view.name),
            view.definition.as_deref().unwrap_or_default()
        ));
        if let Some(option) = &view.with_check_option {
            sql.push_str(&format!(" WITH {option} CHECK OPTION"));
        }
        sql.push(';');
        sql
    }

    fn view(&self, step: &MigrationStep, op: &ViewOperation) -> RenderResult {
        match op {
            ViewOperation::Create { view } => Ok(vec![self.create_view(view)]),
            ViewOperation::Drop { view } => {
                Ok(vec![format!("DROP VIEW {};", self.quote_ident(&view.name))])
            }
            ViewOperation::Rename { from, view } => Ok(vec![format!(
                "RENAME TABLE {} TO {};",
                self.quote_ident(from),
                self.quote_ident(&view.name)
            )]),
            ViewOperation::Move { .. } => {
                Err(self.unsupported(step, "move view", "schemas are databases in MySQL"))
            }
        }
    }
}
