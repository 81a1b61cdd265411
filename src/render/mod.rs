//! Dialect-specific SQL rendering.
//!
//! A [`SqlDialect`] is picked once per compilation with [`dialect_for`]. Besides turning
//! steps into SQL it may first `combine` steps it cannot express one by one, e.g. SQLite
//! folds column alterations into a table rebuild.

pub mod mysql;
pub mod postgres;
pub mod recreate;
pub mod singlestore;
pub mod sqlite;

use crate::diff::operations::{MigrationStep, Operation};
use crate::error::UnsupportedOperation;
use crate::snapshot::{Column, Dialect, ForeignKey};
use crate::squash::SquashedSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Safety {
    Safe,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSql {
    pub safety: Safety,
    pub sql: String,
}

impl RenderedSql {
    pub fn new(sql: String) -> Self {
        Self {
            sql,
            safety: Safety::Safe,
        }
    }

    pub fn destructive(sql: String) -> Self {
        Self {
            sql,
            safety: Safety::Destructive,
        }
    }
}

pub type RenderResult = Result<Vec<String>, UnsupportedOperation>;

pub trait SqlDialect: Send + Sync {
    fn kind(&self) -> Dialect;

    fn quote_ident(&self, ident: &str) -> String;

    /// `schema.name`, or just the name in the default namespace.
    fn qualify(&self, schema: &str, name: &str) -> String {
        if schema.is_empty() {
            self.quote_ident(name)
        } else {
            format!("{}.{}", self.quote_ident(schema), self.quote_ident(name))
        }
    }

    fn escape_string(&self, s: &str) -> String {
        escape_string(s)
    }

    fn supports_column_rename(&self) -> bool {
        true
    }

    /// Foreign keys are declared inside `CREATE TABLE`, so new tables must be created in
    /// reference order.
    fn inline_foreign_keys(&self) -> bool {
        false
    }

    /// Rewrite steps the dialect cannot run individually. `prev` is the previous state with
    /// renames applied.
    fn combine(
        &self,
        steps: Vec<MigrationStep>,
        _prev: &SquashedSchema,
        _cur: &SquashedSchema,
    ) -> Vec<MigrationStep> {
        steps
    }

    /// SQL for one step, without safety annotations.
    fn render_sql(&self, step: &MigrationStep) -> RenderResult;

    fn render(&self, step: &MigrationStep) -> Result<Vec<RenderedSql>, UnsupportedOperation> {
        let destructive = step.is_destructive();
        Ok(self
            .render_sql(step)?
            .into_iter()
            .map(|sql| {
                if destructive {
                    RenderedSql::destructive(sql)
                } else {
                    RenderedSql::new(sql)
                }
            })
            .collect())
    }

    fn unsupported(
        &self,
        step: &MigrationStep,
        operation: &str,
        reason: &str,
    ) -> UnsupportedOperation {
        UnsupportedOperation::new(self.kind(), operation, step.db_object_id(), reason)
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn dialect_for(kind: Dialect) -> Box<dyn SqlDialect> {
    match kind {
        Dialect::Postgresql => Box::new(postgres::Postgres),
        Dialect::Mysql => Box::new(mysql::MySql),
        Dialect::Sqlite => Box::new(sqlite::Sqlite),
        Dialect::Singlestore => Box::new(singlestore::SingleStore),
    }
}

pub fn quote_with(ident: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    format!("{quote}{}{quote}", ident.replace(quote, &doubled))
}

pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// ` ON DELETE x ON UPDATE y`, skipping actions left unset.
pub(crate) fn referential_actions(fk: &ForeignKey) -> String {
    let mut clause = String::new();
    if let Some(action) = &fk.on_delete {
        clause.push_str(&format!(" ON DELETE {action}"));
    }
    if let Some(action) = &fk.on_update {
        clause.push_str(&format!(" ON UPDATE {action}"));
    }
    clause
}

pub(crate) fn default_clause(column: &Column) -> String {
    column
        .default
        .as_ref()
        .map(|default| format!(" DEFAULT {default}"))
        .unwrap_or_default()
}

/// Body lines of a CREATE TABLE, one per entry, tab-indented.
pub(crate) fn create_table_sql(table: &str, lines: Vec<String>) -> String {
    format!("CREATE TABLE {table} (\n\t{}\n);", lines.join(",\n\t"))
}
