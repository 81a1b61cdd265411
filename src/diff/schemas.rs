//! Diff schemas: CREATE any new, DROP any missing

use crate::diff::ResolvedCategory;
use crate::diff::operations::{MigrationStep, SchemaOperation};

pub fn diff(old: Option<&String>, new: Option<&String>) -> Vec<MigrationStep> {
    match (old, new) {
        (None, Some(n)) => vec![MigrationStep::Schema(SchemaOperation::Create { name: n.clone() })],
        (Some(o), None) => vec![MigrationStep::Schema(SchemaOperation::Drop { name: o.clone() })],
        // schemas carry nothing but their name
        _ => Vec::new(),
    }
}

pub fn steps(schemas: &ResolvedCategory<String>) -> Vec<MigrationStep> {
    schemas.steps(diff, |from, to| {
        vec![MigrationStep::Schema(SchemaOperation::Rename {
            from: from.clone(),
            to: to.clone(),
        })]
    })
}
