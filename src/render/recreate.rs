//! Table rebuilds for dialects with limited `ALTER TABLE`.
//!
//! Steps a dialect cannot run in place are folded into a single
//! [`TableOperation::Recreate`]: the new definition is created under a temporary name, the
//! surviving columns copied over, the old table dropped and the new one renamed.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::constants::RECREATE_TABLE_PREFIX;
use crate::diff::operations::{ColumnAction, IndexOperation, MigrationStep, TableOperation};
use crate::render::SqlDialect;
use crate::snapshot::{EntityKey, Table};
use crate::squash::SquashedSchema;

/// Fold steps on tables for which `needs_rebuild` holds into table rebuilds.
///
/// Column and constraint steps on a rebuilt table are dropped, its indexes are recreated
/// from the new definition, and column renames are kept so the copy sees new names.
pub fn fold_rebuilds(
    steps: Vec<MigrationStep>,
    prev: &SquashedSchema,
    cur: &SquashedSchema,
    needs_rebuild: impl Fn(&MigrationStep, &Table) -> bool,
) -> Vec<MigrationStep> {
    let created: BTreeSet<EntityKey> = steps
        .iter()
        .filter_map(|step| match step {
            MigrationStep::Table(TableOperation::Create { table }) => Some(table.key()),
            _ => None,
        })
        .collect();

    let mut rebuilt: BTreeMap<EntityKey, usize> = BTreeMap::new();
    for (position, step) in steps.iter().enumerate() {
        let Some((schema, name)) = step.table_target() else {
            continue;
        };
        let key = EntityKey::new(schema, name);
        if created.contains(&key) || rebuilt.contains_key(&key) {
            continue;
        }
        if let Some(before) = prev.tables.get(&key)
            && needs_rebuild(step, before)
        {
            debug!("Table {} needs a rebuild", before.id());
            rebuilt.insert(key, position);
        }
    }
    if rebuilt.is_empty() {
        return steps;
    }

    let mut folded = Vec::with_capacity(steps.len());
    for (position, step) in steps.into_iter().enumerate() {
        let target = step
            .table_target()
            .map(|(schema, name)| EntityKey::new(schema, name));
        let Some(key) = target.filter(|key| rebuilt.contains_key(key)) else {
            folded.push(step);
            continue;
        };

        let keep = matches!(
            &step,
            MigrationStep::Column(op)
                if matches!(op.action, ColumnAction::Rename { .. })
        );
        if keep {
            folded.push(step);
        }
        if rebuilt.get(&key) == Some(&position) {
            folded.extend(rebuild_steps(&key, prev, cur));
        }
    }
    folded
}

fn rebuild_steps(key: &EntityKey, prev: &SquashedSchema, cur: &SquashedSchema) -> Vec<MigrationStep> {
    let (Some(before), Some(after)) = (prev.tables.get(key), cur.tables.get(key)) else {
        return Vec::new();
    };

    let copied_columns = after
        .columns
        .values()
        .filter(|column| column.generated.is_none())
        .filter(|column| {
            before
                .columns
                .get(&column.name)
                .is_some_and(|old| old.generated.is_none())
        })
        .map(|column| column.name.clone())
        .collect();
    let dropped_columns = before
        .columns
        .keys()
        .filter(|name| !after.columns.contains_key(*name))
        .cloned()
        .collect();

    let mut steps = vec![MigrationStep::Table(TableOperation::Recreate {
        table: after.clone(),
        copied_columns,
        dropped_columns,
    })];
    steps.extend(after.indexes.values().map(|index| {
        MigrationStep::Index(IndexOperation::Create {
            schema: after.schema.clone(),
            table: after.name.clone(),
            index: index.clone(),
        })
    }));
    steps
}

/// SQL for a rebuild; `create` renders the table under the temporary name.
pub fn rebuild_sql(
    dialect: &dyn SqlDialect,
    table: &Table,
    copied_columns: &[String],
    create: impl Fn(&Table) -> String,
) -> Vec<String> {
    let temporary = Table {
        name: format!("{RECREATE_TABLE_PREFIX}{}", table.name),
        ..table.clone()
    };
    let original = dialect.qualify(&table.schema, &table.name);
    let staged = dialect.qualify(&temporary.schema, &temporary.name);

    let mut sql = vec![create(&temporary)];
    if !copied_columns.is_empty() {
        let columns = dialect.column_list(copied_columns);
        sql.push(format!(
            "INSERT INTO {staged}({columns}) SELECT {columns} FROM {original};"
        ));
    }
    sql.push(format!("DROP TABLE {original};"));
    sql.push(format!(
        "ALTER TABLE {staged} RENAME TO {};",
        dialect.quote_ident(&table.name)
    ));
    sql
}
