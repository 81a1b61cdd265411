//! Diff enum types.
//!
//! Values appended anywhere become `ADD VALUE` statements; removing or reordering values
//! cannot be done in place, so the type is recreated and dependent columns converted.

use crate::diff::ResolvedCategory;
use crate::diff::operations::{ColumnRef, EnumOperation, MigrationStep};
use crate::snapshot::Enum;
use crate::squash::SquashedSchema;

/// Diff a single enum. `cur` supplies the columns to convert on recreation.
pub fn diff(old: Option<&Enum>, new: Option<&Enum>, cur: &SquashedSchema) -> Vec<MigrationStep> {
    match (old, new) {
        (None, Some(n)) => vec![MigrationStep::Enum(EnumOperation::Create {
            enum_type: n.clone(),
        })],
        (Some(o), None) => vec![MigrationStep::Enum(EnumOperation::Drop {
            schema: o.schema.clone(),
            name: o.name.clone(),
        })],
        (Some(o), Some(n)) if o.values != n.values => {
            if o.is_append_only(n) {
                added_values(o, n)
            } else {
                vec![recreate(o, n, cur)]
            }
        }
        _ => Vec::new(),
    }
}

/// Each new value is placed in front of the next value that already exists.
fn added_values(old: &Enum, new: &Enum) -> Vec<MigrationStep> {
    new.values
        .iter()
        .enumerate()
        .filter(|(_, value)| !old.values.contains(value))
        .map(|(position, value)| {
            let before = new.values[position + 1..]
                .iter()
                .find(|next| old.values.contains(next))
                .cloned();
            MigrationStep::Enum(EnumOperation::AddValue {
                schema: new.schema.clone(),
                name: new.name.clone(),
                value: value.clone(),
                before,
            })
        })
        .collect()
}

fn recreate(old: &Enum, new: &Enum, cur: &SquashedSchema) -> MigrationStep {
    let removed = old
        .values
        .iter()
        .filter(|value| !new.values.contains(value))
        .cloned()
        .collect();
    let columns = cur
        .enum_columns(&new.schema, &new.name)
        .into_iter()
        .map(|(table, column)| ColumnRef {
            schema: table.schema.clone(),
            table: table.name.clone(),
            column: column.name.clone(),
            default: column.default.clone(),
        })
        .collect();
    MigrationStep::Enum(EnumOperation::Recreate {
        enum_type: new.clone(),
        removed,
        columns,
    })
}

pub fn steps(enums: &ResolvedCategory<Enum>, cur: &SquashedSchema) -> Vec<MigrationStep> {
    enums.steps(
        |old, new| diff(old, new, cur),
        |from, to| {
            let mut steps = Vec::new();
            if from.schema != to.schema {
                steps.push(MigrationStep::Enum(EnumOperation::Move {
                    name: from.name.clone(),
                    from_schema: from.schema.clone(),
                    to_schema: to.schema.clone(),
                }));
            }
            if from.name != to.name {
                steps.push(MigrationStep::Enum(EnumOperation::Rename {
                    schema: to.schema.clone(),
                    from: from.name.clone(),
                    to: to.name.clone(),
                }));
            }
            steps
        },
    )
}
