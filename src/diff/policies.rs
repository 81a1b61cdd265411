use crate::diff::ResolvedCategory;
use crate::diff::operations::{MigrationStep, PolicyOperation, PolicyTarget};
use crate::snapshot::Policy;

/// Diff a single policy on `target`
pub fn diff(target: &PolicyTarget, old: Option<&Policy>, new: Option<&Policy>) -> Vec<MigrationStep> {
    match (old, new) {
        // CREATE new policy
        (None, Some(new_policy)) => vec![MigrationStep::Policy(PolicyOperation::Create {
            target: target.clone(),
            policy: new_policy.clone(),
        })],

        // DROP old policy
        (Some(old_policy), None) => vec![MigrationStep::Policy(PolicyOperation::Drop {
            target: target.clone(),
            name: old_policy.name.clone(),
        })],

        (Some(old_policy), Some(new_policy)) if old_policy != new_policy => {
            if needs_replace(old_policy, new_policy) {
                // ALTER POLICY cannot change these
                vec![MigrationStep::Policy(PolicyOperation::Replace {
                    target: target.clone(),
                    old_policy: Box::new(old_policy.clone()),
                    new_policy: Box::new(new_policy.clone()),
                })]
            } else {
                let changed = |old: &Option<String>, new: &Option<String>| {
                    if old != new { new.clone() } else { None }
                };
                vec![MigrationStep::Policy(PolicyOperation::Alter {
                    target: target.clone(),
                    name: new_policy.name.clone(),
                    roles: (old_policy.to != new_policy.to).then(|| new_policy.to.clone()),
                    using: changed(&old_policy.using, &new_policy.using),
                    with_check: changed(&old_policy.with_check, &new_policy.with_check),
                })]
            }
        }

        _ => Vec::new(),
    }
}

/// Command and kind are fixed at creation, and an expression can be changed but not removed.
fn needs_replace(old: &Policy, new: &Policy) -> bool {
    old.command != new.command
        || old.kind != new.kind
        || (old.using.is_some() && new.using.is_none())
        || (old.with_check.is_some() && new.with_check.is_none())
}

/// Policies declared inside a table.
pub fn table_steps(target: &PolicyTarget, policies: &ResolvedCategory<Policy>) -> Vec<MigrationStep> {
    policies.steps(
        |old, new| diff(target, old, new),
        |from, to| {
            vec![MigrationStep::Policy(PolicyOperation::Rename {
                target: target.clone(),
                from: from.name.clone(),
                to: to.name.clone(),
            })]
        },
    )
}

/// Policies declared at the top level, each naming its own table.
pub fn standalone_steps(policies: &ResolvedCategory<Policy>) -> Vec<MigrationStep> {
    let target_of = |policy: &Policy| {
        let (schema, table) = policy.target().unwrap_or_default();
        PolicyTarget::new(schema, table)
    };
    policies.steps(
        |old, new| match new.or(old) {
            Some(policy) => diff(&target_of(policy), old, new),
            None => Vec::new(),
        },
        |from, to| {
            vec![MigrationStep::Policy(PolicyOperation::Rename {
                target: target_of(to),
                from: from.name.clone(),
                to: to.name.clone(),
            })]
        },
    )
}
