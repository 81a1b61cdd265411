//! PostgreSQL rendering. Everything is expressed natively: renames, schema moves, enum value
//! additions and row-level security.

use crate::diff::operations::{
    ColumnAction, ColumnOperation, ConstraintAction, ConstraintOperation, EnumOperation,
    IndexOperation, MigrationStep, PolicyOperation, PolicyTarget, RoleOperation, SchemaOperation,
    SequenceOperation, TableOperation, ViewOperation, is_builtin_role,
};
use crate::render::{
    RenderResult, SqlDialect, create_table_sql, default_clause, quote_with, referential_actions,
};
use crate::snapshot::{
    Column, Dialect, Enum, ForeignKey, Index, NullsOrder, Policy, Role, Sequence, Table, View,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

/// `SET SCHEMA` needs a real name for the default namespace.
fn schema_or_public(schema: &str) -> &str {
    if schema.is_empty() { "public" } else { schema }
}

impl SqlDialect for Postgres {
    fn kind(&self) -> Dialect {
        Dialect::Postgresql
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn render_sql(&self, step: &MigrationStep) -> RenderResult {
        match step {
            MigrationStep::Schema(op) => Ok(vec![self.schema(op)]),
            MigrationStep::Enum(op) => Ok(self.enum_type(op)),
            MigrationStep::Sequence(op) => Ok(vec![self.sequence(op)]),
            MigrationStep::Role(op) => Ok(vec![self.role(op)]),
            MigrationStep::Policy(op) => Ok(self.policy(op)),
            MigrationStep::Table(TableOperation::Recreate { .. }) => Err(self.unsupported(
                step,
                "recreate table",
                "tables are altered in place",
            )),
            MigrationStep::Table(op) => Ok(vec![self.table(op)]),
            MigrationStep::Column(op) => self.column(step, op),
            MigrationStep::Constraint(op) => Ok(vec![self.constraint(op)]),
            MigrationStep::Index(op) => Ok(vec![self.index(op)]),
            MigrationStep::View(op) => Ok(vec![self.view(op)]),
        }
    }
}

impl Postgres {
    fn schema(&self, op: &SchemaOperation) -> String {
        match op {
            SchemaOperation::Create { name } => format!("CREATE SCHEMA {};", self.quote_ident(name)),
            SchemaOperation::Drop { name } => format!("DROP SCHEMA {};", self.quote_ident(name)),
            SchemaOperation::Rename { from, to } => format!(
                "ALTER SCHEMA {} RENAME TO {};",
                self.quote_ident(from),
                self.quote_ident(to)
            ),
        }
    }

    fn create_enum(&self, enum_type: &Enum) -> String {
        let values: Vec<String> = enum_type
            .values
            .iter()
            .map(|v| self.escape_string(v))
            .collect();
        format!(
            "CREATE TYPE {} AS ENUM({});",
            self.qualify(&enum_type.schema, &enum_type.name),
            values.join(", ")
        )
    }

    fn enum_type(&self, op: &EnumOperation) -> Vec<String> {
        match op {
            EnumOperation::Create { enum_type } => vec![self.create_enum(enum_type)],
            EnumOperation::Drop { schema, name } => {
                vec![format!("DROP TYPE {};", self.qualify(schema, name))]
            }
            EnumOperation::Rename { schema, from, to } => vec![format!(
                "ALTER TYPE {} RENAME TO {};",
                self.qualify(schema, from),
                self.quote_ident(to)
            )],
            EnumOperation::Move {
                name,
                from_schema,
                to_schema,
            } => vec![format!(
                "ALTER TYPE {} SET SCHEMA {};",
                self.qualify(from_schema, name),
                self.quote_ident(schema_or_public(to_schema))
            )],
            EnumOperation::AddValue {
                schema,
                name,
                value,
                before,
            } => {
                let position = before
                    .as_ref()
                    .map(|b| format!(" BEFORE {}", self.escape_string(b)))
                    .unwrap_or_default();
                vec![format!(
                    "ALTER TYPE {} ADD VALUE {}{};",
                    self.qualify(schema, name),
                    self.escape_string(value),
                    position
                )]
            }
            EnumOperation::Recreate {
                enum_type,
                columns,
                ..
            } => {
                let type_name = self.qualify(&enum_type.schema, &enum_type.name);
                let mut sql = Vec::new();
                // park dependent columns on text while the type is swapped
                for column in columns {
                    let table = self.qualify(&column.schema, &column.table);
                    let name = self.quote_ident(&column.column);
                    if column.default.is_some() {
                        sql.push(format!("ALTER TABLE {table} ALTER COLUMN {name} DROP DEFAULT;"));
                    }
                    sql.push(format!(
                        "ALTER TABLE {table} ALTER COLUMN {name} SET DATA TYPE text;"
                    ));
                }
                sql.push(format!("DROP TYPE {type_name};"));
                sql.push(self.create_enum(enum_type));
                for column in columns {
                    let table = self.qualify(&column.schema, &column.table);
                    let name = self.quote_ident(&column.column);
                    sql.push(format!(
                        "ALTER TABLE {table} ALTER COLUMN {name} SET DATA TYPE {type_name} USING {name}::{type_name};"
                    ));
                    if let Some(default) = &column.default {
                        sql.push(format!(
                            "ALTER TABLE {table} ALTER COLUMN {name} SET DEFAULT {default};"
                        ));
                    }
                }
                sql
            }
        }
    }

    fn sequence_options(&self, sequence: &Sequence) -> String {
        let mut options = String::new();
        let mut option = |keyword: &str, value: &Option<String>| {
            if let Some(value) = value {
                options.push_str(&format!(" {keyword} {value}"));
            }
        };
        option("INCREMENT BY", &sequence.increment);
        option("MINVALUE", &sequence.min_value);
        option("MAXVALUE", &sequence.max_value);
        option("START WITH", &sequence.start_with);
        option("CACHE", &sequence.cache);
        options
    }

    fn sequence(&self, op: &SequenceOperation) -> String {
        match op {
            SequenceOperation::Create { sequence } => format!(
                "CREATE SEQUENCE {}{}{};",
                self.qualify(&sequence.schema, &sequence.name),
                self.sequence_options(sequence),
                if sequence.cycle { " CYCLE" } else { "" }
            ),
            SequenceOperation::Alter { sequence } => format!(
                "ALTER SEQUENCE {}{}{};",
                self.qualify(&sequence.schema, &sequence.name),
                self.sequence_options(sequence),
                if sequence.cycle { " CYCLE" } else { " NO CYCLE" }
            ),
            SequenceOperation::Drop { schema, name } => {
                format!("DROP SEQUENCE {};", self.qualify(schema, name))
            }
            SequenceOperation::Rename { schema, from, to } => format!(
                "ALTER SEQUENCE {} RENAME TO {};",
                self.qualify(schema, from),
                self.quote_ident(to)
            ),
            SequenceOperation::Move {
                name,
                from_schema,
                to_schema,
            } => format!(
                "ALTER SEQUENCE {} SET SCHEMA {};",
                self.qualify(from_schema, name),
                self.quote_ident(schema_or_public(to_schema))
            ),
        }
    }

    fn role_options(role: &Role, explicit: bool) -> Vec<&'static str> {
        let mut options = Vec::new();
        match (role.create_db, explicit) {
            (true, _) => options.push("CREATEDB"),
            (false, true) => options.push("NOCREATEDB"),
            _ => {}
        }
        match (role.create_role, explicit) {
            (true, _) => options.push("CREATEROLE"),
            (false, true) => options.push("NOCREATEROLE"),
            _ => {}
        }
        match (role.inherit, explicit) {
            (false, _) => options.push("NOINHERIT"),
            (true, true) => options.push("INHERIT"),
            _ => {}
        }
        options
    }

    fn role(&self, op: &RoleOperation) -> String {
        match op {
            RoleOperation::Create { role } => {
                let options = Self::role_options(role, false);
                if options.is_empty() {
                    format!("CREATE ROLE {};", self.quote_ident(&role.name))
                } else {
                    format!(
                        "CREATE ROLE {} WITH {};",
                        self.quote_ident(&role.name),
                        options.join(" ")
                    )
                }
            }
            RoleOperation::Alter { role } => format!(
                "ALTER ROLE {} WITH {};",
                self.quote_ident(&role.name),
                Self::role_options(role, true).join(" ")
            ),
            RoleOperation::Drop { name } => format!("DROP ROLE {};", self.quote_ident(name)),
            RoleOperation::Rename { from, to } => format!(
                "ALTER ROLE {} RENAME TO {};",
                self.quote_ident(from),
                self.quote_ident(to)
            ),
        }
    }

    fn policy_roles(&self, roles: &[String]) -> String {
        roles
            .iter()
            .map(|role| {
                if is_builtin_role(role) {
                    role.clone()
                } else {
                    self.quote_ident(role)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn create_policy(&self, target: &PolicyTarget, policy: &Policy) -> String {
        let mut sql = format!(
            "CREATE POLICY {} ON {} AS {} FOR {} TO {}",
            self.quote_ident(&policy.name),
            self.qualify(&target.schema, &target.table),
            policy.kind,
            policy.command,
            self.policy_roles(&policy.to)
        );
        if let Some(using) = &policy.using {
            sql.push_str(&format!(" USING ({using})"));
        }
        if let Some(with_check) = &policy.with_check {
            sql.push_str(&format!(" WITH CHECK ({with_check})"));
        }
        sql.push(';');
        sql
    }

    fn drop_policy(&self, target: &PolicyTarget, name: &str) -> String {
        format!(
            "DROP POLICY {} ON {} CASCADE;",
            self.quote_ident(name),
            self.qualify(&target.schema, &target.table)
        )
    }

    fn policy(&self, op: &PolicyOperation) -> Vec<String> {
        match op {
            PolicyOperation::Create { target, policy } => vec![self.create_policy(target, policy)],
            PolicyOperation::Drop { target, name } => vec![self.drop_policy(target, name)],
            PolicyOperation::Rename { target, from, to } => vec![format!(
                "ALTER POLICY {} ON {} RENAME TO {};",
                self.quote_ident(from),
                self.qualify(&target.schema, &target.table),
                self.quote_ident(to)
            )],
            PolicyOperation::Alter {
                target,
                name,
                roles,
                using,
                with_check,
            } => {
                let mut sql = format!(
                    "ALTER POLICY {} ON {}",
                    self.quote_ident(name),
                    self.qualify(&target.schema, &target.table)
                );
                if let Some(roles) = roles {
                    sql.push_str(&format!(" TO {}", self.policy_roles(roles)));
                }
                if let Some(using) = using {
                    sql.push_str(&format!(" USING ({using})"));
                }
                if let Some(with_check) = with_check {
                    sql.push_str(&format!(" WITH CHECK ({with_check})"));
                }
                sql.push(';');
                vec![sql]
            }
            PolicyOperation::Replace {
                target,
                old_policy,
                new_policy,
            } => vec![
                self.drop_policy(target, &old_policy.name),
                self.create_policy(target, new_policy),
            ],
        }
    }

    fn column_type(&self, column: &Column) -> String {
        match &column.type_schema {
            Some(schema) => self.qualify(schema, &column.data_type),
            None => column.data_type.clone(),
        }
    }

    pub fn column_definition(&self, column: &Column) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&column.name), self.column_type(column));
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        sql.push_str(&default_clause(column));
        if column.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(generated) = &column.generated {
            sql.push_str(&format!(" GENERATED ALWAYS AS ({}) STORED", generated.expression));
        }
        if let Some(identity) = column.identity {
            sql.push_str(&format!(" GENERATED {} AS IDENTITY", identity.keyword()));
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
                "CONSTRAINT {} UNIQUE{}({})",
                self.quote_ident(&unique.name),
                if unique.nulls_not_distinct { " NULLS NOT DISTINCT" } else { "" },
                self.column_list(&unique.columns)
            ));
        }
        for check in table.check_constraints.values() {
            lines.push(format!(
                "CONSTRAINT {} CHECK ({})",
                self.quote_ident(&check.name),
                check.value
            ));
        }
        create_table_sql(&self.qualify(&table.schema, &table.name), lines)
    }

    fn table(&self, op: &TableOperation) -> String {
        match op {
            TableOperation::Create { table } | TableOperation::Recreate { table, .. } => {
                self.create_table(table)
            }
            TableOperation::Drop { schema, name } => {
                format!("DROP TABLE {} CASCADE;", self.qualify(schema, name))
            }
            TableOperation::Rename { schema, from, to } => format!(
                "ALTER TABLE {} RENAME TO {};",
                self.qualify(schema, from),
                self.quote_ident(to)
            ),
            TableOperation::Move {
                name,
                from_schema,
                to_schema,
            } => format!(
                "ALTER TABLE {} SET SCHEMA {};",
                self.qualify(from_schema, name),
                self.quote_ident(schema_or_public(to_schema))
            ),
            TableOperation::EnableRowLevelSecurity { schema, name } => format!(
                "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;",
                self.qualify(schema, name)
            ),
            TableOperation::DisableRowLevelSecurity { schema, name } => format!(
                "ALTER TABLE {} DISABLE ROW LEVEL SECURITY;",
                self.qualify(schema, name)
            ),
        }
    }

    fn column(&self, step: &MigrationStep, op: &ColumnOperation) -> RenderResult {
        let table = self.qualify(&op.schema, &op.table);
        let alter = |column: &Column, clause: String| {
            format!(
                "ALTER TABLE {table} ALTER COLUMN {} {clause};",
                self.quote_ident(&column.name)
            )
        };

        let sql = match &op.action {
            ColumnAction::Add { column } => {
                format!("ALTER TABLE {table} ADD COLUMN {};", self.column_definition(column))
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
            ColumnAction::AlterType { column, .. } => {
                let data_type = self.column_type(column);
                let using = if column.type_schema.is_some() {
                    format!(" USING {}::{data_type}", self.quote_ident(&column.name))
                } else {
                    String::new()
                };
                alter(column, format!("SET DATA TYPE {data_type}{using}"))
            }
            ColumnAction::SetDefault { column } => alter(
                column,
                format!("SET DEFAULT {}", column.default.as_deref().unwrap_or("NULL")),
            ),
            ColumnAction::DropDefault { column } => alter(column, "DROP DEFAULT".to_string()),
            ColumnAction::SetNotNull { column } => alter(column, "SET NOT NULL".to_string()),
            ColumnAction::DropNotNull { column } => alter(column, "DROP NOT NULL".to_string()),
            ColumnAction::DropGenerated { column } => alter(column, "DROP EXPRESSION".to_string()),
            ColumnAction::Regenerate { column } => {
                return Ok(vec![
                    format!(
                        "ALTER TABLE {table} DROP COLUMN {};",
                        self.quote_ident(&column.name)
                    ),
                    format!("ALTER TABLE {table} ADD COLUMN {};", self.column_definition(column)),
                ]);
            }
            ColumnAction::SetIdentity { column } => {
                let kind = column.identity.map(|i| i.keyword()).unwrap_or("BY DEFAULT");
                alter(column, format!("ADD GENERATED {kind} AS IDENTITY"))
            }
            ColumnAction::DropIdentity { column } => alter(column, "DROP IDENTITY".to_string()),
            ColumnAction::AlterAutoincrement { .. } => {
                return Err(self.unsupported(
                    step,
                    "change autoincrement",
                    "use a sequence or an identity column instead",
                ));
            }
        };
        Ok(vec![sql])
    }

    fn references(&self, fk: &ForeignKey) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({}){}",
            self.column_list(&fk.columns_from),
            self.qualify(&fk.schema_to, &fk.table_to),
            self.column_list(&fk.columns_to),
            referential_actions(fk)
        )
    }

    fn constraint(&self, op: &ConstraintOperation) -> String {
        let table = self.qualify(&op.schema, &op.table);
        let name = self.quote_ident(op.action.name());
        match &op.action {
            ConstraintAction::AddPrimaryKey { primary_key } => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} PRIMARY KEY({});",
                self.column_list(&primary_key.columns)
            ),
            ConstraintAction::AddUnique { unique } => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} UNIQUE{}({});",
                if unique.nulls_not_distinct { " NULLS NOT DISTINCT" } else { "" },
                self.column_list(&unique.columns)
            ),
            ConstraintAction::AddCheck { check } => {
                format!("ALTER TABLE {table} ADD CONSTRAINT {name} CHECK ({});", check.value)
            }
            ConstraintAction::AddForeignKey { foreign_key } => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} {};",
                self.references(foreign_key)
            ),
            ConstraintAction::DropPrimaryKey { .. }
            | ConstraintAction::DropUnique { .. }
            | ConstraintAction::DropCheck { .. }
            | ConstraintAction::DropForeignKey { .. } => {
                format!("ALTER TABLE {table} DROP CONSTRAINT {name};")
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
                if let Some(opclass) = &column.opclass {
                    sql.push_str(&format!(" {opclass}"));
                }
                match (column.asc, column.nulls) {
                    (true, NullsOrder::First) => sql.push_str(" NULLS FIRST"),
                    (false, NullsOrder::Last) => sql.push_str(" DESC NULLS LAST"),
                    (false, NullsOrder::First) => sql.push_str(" DESC"),
                    (true, NullsOrder::Last) => {}
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn index(&self, op: &IndexOperation) -> String {
        match op {
            IndexOperation::Create {
                schema,
                table,
                index,
            } => {
                let mut sql = format!(
                    "CREATE {}INDEX {}{} ON {} USING {} ({})",
                    if index.is_unique { "UNIQUE " } else { "" },
                    if index.concurrently { "CONCURRENTLY " } else { "" },
                    self.quote_ident(&index.name),
                    self.qualify(schema, table),
                    index.method,
                    self.index_columns(index)
                );
                if !index.with.is_empty() {
                    let with: Vec<String> =
                        index.with.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    sql.push_str(&format!(" WITH ({})", with.join(",")));
                }
                if let Some(where_clause) = &index.where_clause {
                    sql.push_str(&format!(" WHERE {where_clause}"));
                }
                sql.push(';');
                sql
            }
            IndexOperation::Drop { schema, index, .. } => {
                format!("DROP INDEX {};", self.qualify(schema, &index.name))
            }
            IndexOperation::Rename {
                schema,
                from,
                index,
                ..
            } => format!(
                "ALTER INDEX {} RENAME TO {};",
                self.qualify(schema, from),
                self.quote_ident(&index.name)
            ),
        }
    }

    fn view(&self, op: &ViewOperation) -> String {
        match op {
            ViewOperation::Create { view } => self.create_view(view),
            ViewOperation::Drop { view } => format!(
                "DROP {} {};",
                view.keyword(),
                self.qualify(&view.schema, &view.name)
            ),
            ViewOperation::Rename { from, view } => format!(
                "ALTER {} {} RENAME TO {};",
                view.keyword(),
                self.qualify(&view.schema, from),
                self.quote_ident(&view.name)
            ),
            ViewOperation::Move { from_schema, view } => format!(
                "ALTER {} {} SET SCHEMA {};",
                view.keyword(),
                self.qualify(from_schema, &view.name),
                self.quote_ident(schema_or_public(&view.schema))
            ),
        }
    }

    fn create_view(&self, view: &View) -> String {
        let with = if view.with.is_empty() {
            String::new()
        } else {
            let options: Vec<String> =
                view.with.iter().map(|(k, v)| format!("{k} = {v}")).collect();
            format!(" WITH ({})", options.join(", "))
        };
        format!(
            "CREATE {} {}{} AS ({});",
            view.keyword(),
            self.qualify(&view.schema, &view.name),
            with,
            view.definition.as_deref().unwrap_or_default()
        )
    }
}
