use crate::diff::ResolvedCategory;
use crate::diff::operations::{MigrationStep, ViewOperation};
use crate::snapshot::View;

/// Diff a single view. Views declared as existing are never created or dropped.
pub fn diff(old: Option<&View>, new: Option<&View>) -> Vec<MigrationStep> {
    match (old, new) {
        (None, Some(n)) if !n.is_existing => {
            vec![MigrationStep::View(ViewOperation::Create { view: n.clone() })]
        }
        (Some(o), None) if !o.is_existing => {
            vec![MigrationStep::View(ViewOperation::Drop { view: o.clone() })]
        }
        // definition or options changed: drop and recreate
        (Some(o), Some(n)) if o != n && !n.is_existing => vec![
            MigrationStep::View(ViewOperation::Drop { view: o.clone() }),
            MigrationStep::View(ViewOperation::Create { view: n.clone() }),
        ],
        _ => Vec::new(),
    }
}

pub fn relocate(from: &View, to: &View) -> Vec<MigrationStep> {
    let mut steps = Vec::new();
    if from.schema != to.schema {
        steps.push(MigrationStep::View(ViewOperation::Move {
            from_schema: from.schema.clone(),
            view: View {
                schema: to.schema.clone(),
                name: from.name.clone(),
                ..from.clone()
            },
        }));
    }
    if from.name != to.name {
        steps.push(MigrationStep::View(ViewOperation::Rename {
            from: from.name.clone(),
            view: View {
                schema: to.schema.clone(),
                name: to.name.clone(),
                ..from.clone()
            },
        }));
    }
    steps
}

pub fn steps(views: &ResolvedCategory<View>) -> Vec<MigrationStep> {
    views.steps(diff, relocate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_change_recreates() {
        let old = View::new("", "active_users", "select * from users where active");
        let new = View::new("", "active_users", "select id from users where active");
        let steps = diff(Some(&old), Some(&new));
        assert_eq!(
            steps,
            vec![
                MigrationStep::View(ViewOperation::Drop { view: old }),
                MigrationStep::View(ViewOperation::Create { view: new }),
            ]
        );
    }

    #[test]
    fn test_existing_views_are_left_alone() {
        let view = View {
            is_existing: true,
            ..View::new("", "legacy_report", "")
        };
        assert!(diff(None, Some(&view)).is_empty());
        assert!(diff(Some(&view), None).is_empty());
    }

    #[test]
    fn test_rename_and_move() {
        let from = View::new("", "report", "select 1");
        let to = View::new("analytics", "daily_report", "select 1");
        let steps = relocate(&from, &to);
        match &steps[..] {
            [
                MigrationStep::View(ViewOperation::Move { from_schema, view: moved }),
                MigrationStep::View(ViewOperation::Rename { from, view: renamed }),
            ] => {
                assert_eq!(from_schema, "");
                assert_eq!(moved.schema, "analytics");
                assert_eq!(moved.name, "report");
                assert_eq!(from, "report");
                assert_eq!(renamed.name, "daily_report");
            }
            other => panic!("Expected move then rename, got {other:?}"),
        }
    }
}
