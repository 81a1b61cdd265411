use crate::diff::TableDiff;
use crate::diff::operations::{IndexOperation, MigrationStep};
use crate::snapshot::Index;

/// Compare two index states and generate migration steps
pub fn diff(schema: &str, table: &str, old: Option<&Index>, new: Option<&Index>) -> Vec<MigrationStep> {
    let create = |index: &Index| {
        MigrationStep::Index(IndexOperation::Create {
            schema: schema.to_string(),
            table: table.to_string(),
            index: index.clone(),
        })
    };
    let drop = |index: &Index| {
        MigrationStep::Index(IndexOperation::Drop {
            schema: schema.to_string(),
            table: table.to_string(),
            index: index.clone(),
        })
    };

    match (old, new) {
        (None, Some(n)) => vec![create(n)],
        (Some(o), None) => vec![drop(o)],
        // indexes cannot be altered in place
        (Some(o), Some(n)) if o != n => vec![drop(o), create(n)],
        _ => Vec::new(),
    }
}

pub fn steps(table: &TableDiff) -> Vec<MigrationStep> {
    let (schema, name) = (table.after.schema.as_str(), table.after.name.as_str());
    table.indexes.steps(
        |old, new| diff(schema, name, old, new),
        |from, to| {
            vec![MigrationStep::Index(IndexOperation::Rename {
                schema: schema.to_string(),
                table: name.to_string(),
                from: from.name.clone(),
                index: to.clone(),
            })]
        },
    )
}
