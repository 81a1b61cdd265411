use crate::diff::ResolvedCategory;
use crate::diff::operations::{MigrationStep, SequenceOperation};
use crate::snapshot::Sequence;

/// Generate migration steps for sequence differences
pub fn diff(old: Option<&Sequence>, new: Option<&Sequence>) -> Vec<MigrationStep> {
    match (old, new) {
        (None, Some(n)) => vec![MigrationStep::Sequence(SequenceOperation::Create {
            sequence: n.clone(),
        })],
        (Some(o), None) => vec![MigrationStep::Sequence(SequenceOperation::Drop {
            schema: o.schema.clone(),
            name: o.name.clone(),
        })],
        (Some(o), Some(n)) if o != n => vec![MigrationStep::Sequence(SequenceOperation::Alter {
            sequence: n.clone(),
        })],
        _ => Vec::new(),
    }
}

pub fn steps(sequences: &ResolvedCategory<Sequence>) -> Vec<MigrationStep> {
    sequences.steps(diff, |from, to| {
        let mut steps = Vec::new();
        if from.schema != to.schema {
            steps.push(MigrationStep::Sequence(SequenceOperation::Move {
                name: from.name.clone(),
                from_schema: from.schema.clone(),
                to_schema: to.schema.clone(),
            }));
        }
        if from.name != to.name {
            steps.push(MigrationStep::Sequence(SequenceOperation::Rename {
                schema: to.schema.clone(),
                from: from.name.clone(),
                to: to.name.clone(),
            }));
        }
        steps
    })
}
