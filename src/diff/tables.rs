use crate::diff::operations::{
    ConstraintAction, ConstraintOperation, IndexOperation, MigrationStep, PolicyOperation,
    PolicyTarget, TableOperation,
};
use crate::diff::{ResolvedCategory, TableDiff, columns, constraints, indexes, policies};
use crate::snapshot::Table;

/// Create or drop a whole table. Tables on both sides are handled through [`TableDiff`].
pub fn diff(old: Option<&Table>, new: Option<&Table>) -> Vec<MigrationStep> {
    match (old, new) {
        (None, Some(n)) => {
            let mut steps = vec![MigrationStep::Table(TableOperation::Create { table: n.clone() })];

            if n.rls_enabled {
                steps.push(MigrationStep::Table(TableOperation::EnableRowLevelSecurity {
                    schema: n.schema.clone(),
                    name: n.name.clone(),
                }));
            }

            for index in n.indexes.values() {
                steps.push(MigrationStep::Index(IndexOperation::Create {
                    schema: n.schema.clone(),
                    table: n.name.clone(),
                    index: index.clone(),
                }));
            }

            // dialects that inline foreign keys drop these again
            for fk in n.foreign_keys.values() {
                steps.push(MigrationStep::Constraint(ConstraintOperation::new(
                    &n.schema,
                    &n.name,
                    ConstraintAction::AddForeignKey {
                        foreign_key: fk.clone(),
                    },
                )));
            }

            let target = PolicyTarget::new(&n.schema, &n.name);
            for policy in n.policies.values() {
                steps.push(MigrationStep::Policy(PolicyOperation::Create {
                    target: target.clone(),
                    policy: policy.clone(),
                }));
            }

            steps
        }
        (Some(o), None) => vec![MigrationStep::Table(TableOperation::Drop {
            schema: o.schema.clone(),
            name: o.name.clone(),
        })],
        _ => Vec::new(),
    }
}

pub fn relocate(from: &Table, to: &Table) -> Vec<MigrationStep> {
    let mut steps = Vec::new();
    if from.schema != to.schema {
        steps.push(MigrationStep::Table(TableOperation::Move {
            name: from.name.clone(),
            from_schema: from.schema.clone(),
            to_schema: to.schema.clone(),
        }));
    }
    if from.name != to.name {
        steps.push(MigrationStep::Table(TableOperation::Rename {
            schema: to.schema.clone(),
            from: from.name.clone(),
            to: to.name.clone(),
        }));
    }
    steps
}

/// Steps for one table present on both sides.
pub fn table_diff_steps(table: &TableDiff) -> Vec<MigrationStep> {
    let (schema, name) = (&table.after.schema, &table.after.name);
    let mut steps = Vec::new();

    match (table.before.rls_enabled, table.after.rls_enabled) {
        (false, true) => steps.push(MigrationStep::Table(TableOperation::EnableRowLevelSecurity {
            schema: schema.clone(),
            name: name.clone(),
        })),
        (true, false) => steps.push(MigrationStep::Table(TableOperation::DisableRowLevelSecurity {
            schema: schema.clone(),
            name: name.clone(),
        })),
        _ => {}
    }

    steps.extend(columns::steps(table));
    steps.extend(indexes::steps(table));
    steps.extend(constraints::steps(table));
    steps.extend(policies::table_steps(
        &PolicyTarget::new(schema, name),
        &table.policies,
    ));
    steps
}

pub fn steps(tables: &ResolvedCategory<Table>, diffs: &[TableDiff]) -> Vec<MigrationStep> {
    let mut steps = tables.steps(diff, relocate);
    for table in diffs {
        steps.extend(table_diff_steps(table));
    }
    steps
}
