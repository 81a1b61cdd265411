use crate::diff::operations::{
    ColumnAction, ColumnOperation, ConstraintAction, ConstraintOperation, MigrationStep,
};
use crate::diff::{ResolvedCategory, TableDiff};
use crate::snapshot::{Column, PrimaryKey};

/// Name given to a primary key declared on a single column.
pub fn column_primary_key_name(table: &str) -> String {
    format!("{table}_pkey")
}

/// Diff a single column
pub fn diff(old: Option<&Column>, new: Option<&Column>) -> Vec<ColumnAction> {
    match (old, new) {
        // 1) brand-new column
        (None, Some(n)) => vec![ColumnAction::Add { column: n.clone() }],
        // 2) dropped column
        (Some(o), None) => vec![ColumnAction::Drop {
            name: o.name.clone(),
        }],
        // 3) existed in both
        (Some(o), Some(n)) => {
            let mut changes = Vec::new();

            match (&o.generated, &n.generated) {
                (Some(_), None) => changes.push(ColumnAction::DropGenerated { column: n.clone() }),
                (None, Some(_)) => return vec![ColumnAction::Regenerate { column: n.clone() }],
                (Some(old_expr), Some(new_expr)) if old_expr != new_expr => {
                    // the column is rebuilt from its new definition, nothing else to alter
                    return vec![ColumnAction::Regenerate { column: n.clone() }];
                }
                _ => {}
            }

            if o.data_type != n.data_type || o.type_schema != n.type_schema {
                changes.push(ColumnAction::AlterType {
                    column: n.clone(),
                    from_type: o.data_type.clone(),
                });
            }

            match (&o.default, &n.default) {
                (Some(_), None) => changes.push(ColumnAction::DropDefault { column: n.clone() }),
                (old_default, Some(_)) if old_default != &n.default => {
                    changes.push(ColumnAction::SetDefault { column: n.clone() })
                }
                _ => {}
            }

            match (o.not_null, n.not_null) {
                (false, true) => changes.push(ColumnAction::SetNotNull { column: n.clone() }),
                (true, false) => changes.push(ColumnAction::DropNotNull { column: n.clone() }),
                _ => {}
            }

            match (o.identity, n.identity) {
                (None, Some(_)) => changes.push(ColumnAction::SetIdentity { column: n.clone() }),
                (Some(_), None) => changes.push(ColumnAction::DropIdentity { column: o.clone() }),
                (Some(a), Some(b)) if a != b => {
                    changes.push(ColumnAction::DropIdentity { column: o.clone() });
                    changes.push(ColumnAction::SetIdentity { column: n.clone() });
                }
                _ => {}
            }

            if o.autoincrement != n.autoincrement {
                changes.push(ColumnAction::AlterAutoincrement { column: n.clone() });
            }

            changes
        }
        // (None, None) impossible
        _ => Vec::new(),
    }
}

/// Primary key declared on the column itself, added or dropped.
fn primary_key_change(table: &str, old: &Column, new: &Column) -> Option<ConstraintAction> {
    let primary_key = PrimaryKey::new(column_primary_key_name(table), &[new.name.as_str()]);
    match (old.primary_key, new.primary_key) {
        (false, true) => Some(ConstraintAction::AddPrimaryKey { primary_key }),
        (true, false) => Some(ConstraintAction::DropPrimaryKey { primary_key }),
        _ => None,
    }
}

pub fn steps(table: &TableDiff) -> Vec<MigrationStep> {
    let (schema, name) = (&table.after.schema, &table.after.name);
    let columns: &ResolvedCategory<Column> = &table.columns;

    columns.steps(
        |old, new| {
            let mut steps: Vec<MigrationStep> = diff(old, new)
                .into_iter()
                .map(|action| MigrationStep::Column(ColumnOperation::new(schema, name, action)))
                .collect();
            if let (Some(o), Some(n)) = (old, new)
                && let Some(action) = primary_key_change(name, o, n)
            {
                steps.push(MigrationStep::Constraint(ConstraintOperation::new(
                    schema, name, action,
                )));
            }
            steps
        },
        |from, to| {
            vec![MigrationStep::Column(ColumnOperation::new(
                schema,
                name,
                ColumnAction::Rename {
                    from: from.name.clone(),
                    to: to.name.clone(),
                },
            ))]
        },
    )
}
