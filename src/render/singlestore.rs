//! SingleStore rendering. Statements read like MySQL, but columns cannot be renamed or have
//! their type, nullability or key membership changed in place, and foreign keys do not exist.

use crate::diff::operations::{ColumnAction, ConstraintAction, MigrationStep, TableOperation};
use crate::render::mysql::MySql;
use crate::render::recreate::{fold_rebuilds, rebuild_sql};
use crate::render::{RenderResult, SqlDialect, quote_with};
use crate::snapshot::{Dialect, Table};
use crate::squash::SquashedSchema;

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleStore;

impl SqlDialect for SingleStore {
    fn kind(&self) -> Dialect {
        Dialect::Singlestore
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn supports_column_rename(&self) -> bool {
        false
    }

    fn combine(
        &self,
        steps: Vec<MigrationStep>,
        prev: &SquashedSchema,
        cur: &SquashedSchema,
    ) -> Vec<MigrationStep> {
        fold_rebuilds(steps, prev, cur, needs_rebuild)
    }

    fn render_sql(&self, step: &MigrationStep) -> RenderResult {
        match step {
            MigrationStep::Constraint(op)
                if matches!(
                    op.action,
                    ConstraintAction::AddForeignKey { .. } | ConstraintAction::DropForeignKey { .. }
                ) =>
            {
                Err(self.unsupported(
                    step,
                    "change foreign key",
                    "foreign keys are not supported",
                ))
            }
            MigrationStep::Column(op) if matches!(op.action, ColumnAction::Rename { .. }) => {
                Err(self.unsupported(
                    step,
                    "rename column",
                    "columns are copied into a new column instead",
                ))
            }
            MigrationStep::Table(TableOperation::Recreate {
                table,
                copied_columns,
                ..
            }) => Ok(rebuild_sql(self, table, copied_columns, |t| {
                MySql.create_table(t, false)
            })),
            MigrationStep::View(_) => Err(self.unsupported(
                step,
                "create or change view",
                "views are not tracked for SingleStore",
            )),
            _ => MySql.render_sql(step).map_err(|mut err| {
                err.dialect = Dialect::Singlestore;
                err
            }),
        }
    }
}

fn needs_rebuild(step: &MigrationStep, _before: &Table) -> bool {
    match step {
        MigrationStep::Column(op) => match &op.action {
            ColumnAction::Add { column } => column.primary_key,
            ColumnAction::AlterType { .. }
            | ColumnAction::SetNotNull { .. }
            | ColumnAction::DropNotNull { .. }
            | ColumnAction::AlterAutoincrement { .. } => true,
            _ => false,
        },
        MigrationStep::Constraint(op) => matches!(
            op.action,
            ConstraintAction::AddPrimaryKey { .. } | ConstraintAction::DropPrimaryKey { .. }
        ),
        _ => false,
    }
}
