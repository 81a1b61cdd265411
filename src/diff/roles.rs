use crate::diff::ResolvedCategory;
use crate::diff::operations::{MigrationStep, RoleOperation};
use crate::snapshot::Role;

pub fn diff(old: Option<&Role>, new: Option<&Role>) -> Vec<MigrationStep> {
    match (old, new) {
        (None, Some(n)) => vec![MigrationStep::Role(RoleOperation::Create { role: n.clone() })],
        (Some(o), None) => vec![MigrationStep::Role(RoleOperation::Drop {
            name: o.name.clone(),
        })],
        (Some(o), Some(n)) if o != n => {
            vec![MigrationStep::Role(RoleOperation::Alter { role: n.clone() })]
        }
        _ => Vec::new(),
    }
}

pub fn steps(roles: &ResolvedCategory<Role>) -> Vec<MigrationStep> {
    roles.steps(diff, |from, to| {
        vec![MigrationStep::Role(RoleOperation::Rename {
            from: from.name.clone(),
            to: to.name.clone(),
        })]
    })
}
