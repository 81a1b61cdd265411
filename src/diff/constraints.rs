//! Table-level constraints: composite primary keys, unique, check and foreign keys.
//!
//! None of them can be altered in place, so a changed constraint is dropped and re-added.

use crate::diff::operations::{ConstraintAction, ConstraintOperation, MigrationStep};
use crate::diff::{CategoryDiff, TableDiff};

fn category_steps<T>(
    diff: &CategoryDiff<T>,
    add: impl Fn(&T) -> ConstraintAction,
    drop: impl Fn(&T) -> ConstraintAction,
) -> Vec<ConstraintAction> {
    let mut actions = Vec::new();
    actions.extend(diff.deleted.iter().map(&drop));
    actions.extend(diff.created.iter().map(&add));
    for altered in &diff.altered {
        actions.push(drop(&altered.before));
        actions.push(add(&altered.after));
    }
    actions
}

pub fn steps(table: &TableDiff) -> Vec<MigrationStep> {
    let mut actions = Vec::new();
    actions.extend(category_steps(
        &table.primary_keys,
        |pk| ConstraintAction::AddPrimaryKey {
            primary_key: pk.clone(),
        },
        |pk| ConstraintAction::DropPrimaryKey {
            primary_key: pk.clone(),
        },
    ));
    actions.extend(category_steps(
        &table.unique_constraints,
        |unique| ConstraintAction::AddUnique {
            unique: unique.clone(),
        },
        |unique| ConstraintAction::DropUnique {
            unique: unique.clone(),
        },
    ));
    actions.extend(category_steps(
        &table.check_constraints,
        |check| ConstraintAction::AddCheck {
            check: check.clone(),
        },
        |check| ConstraintAction::DropCheck {
            check: check.clone(),
        },
    ));
    actions.extend(category_steps(
        &table.foreign_keys,
        |fk| ConstraintAction::AddForeignKey {
            foreign_key: fk.clone(),
        },
        |fk| ConstraintAction::DropForeignKey {
            foreign_key: fk.clone(),
        },
    ));

    actions
        .into_iter()
        .map(|action| {
            MigrationStep::Constraint(ConstraintOperation::new(
                &table.after.schema,
                &table.after.name,
                action,
            ))
        })
        .collect()
}
