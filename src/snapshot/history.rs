//! Consistency checks over a sequence of stored snapshots.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use uuid::Uuid;

use super::Snapshot;
use crate::constants::ORIGIN_ID;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryIssue {
    /// The same id appears in more than one snapshot.
    DuplicateId(Uuid),
    /// Several snapshots were generated on top of the same predecessor (branches merged
    /// without regenerating).
    Collision { prev_id: Uuid, ids: Vec<Uuid> },
    /// `prevId` points at a snapshot that is not in the set.
    DanglingPrevId { id: Uuid, prev_id: Uuid },
}

impl fmt::Display for HistoryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryIssue::DuplicateId(id) => write!(f, "snapshot id {id} is used more than once"),
            HistoryIssue::Collision { prev_id, ids } => {
                let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
                write!(
                    f,
                    "snapshots {} all point to parent {prev_id}",
                    ids.join(", ")
                )
            }
            HistoryIssue::DanglingPrevId { id, prev_id } => {
                write!(f, "snapshot {id} points to unknown parent {prev_id}")
            }
        }
    }
}

pub fn check_history(snapshots: &[Snapshot]) -> Vec<HistoryIssue> {
    let mut issues = Vec::new();

    let mut known = BTreeSet::new();
    for snapshot in snapshots {
        if !known.insert(snapshot.id) {
            issues.push(HistoryIssue::DuplicateId(snapshot.id));
        }
    }

    let mut children: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
    for snapshot in snapshots {
        children.entry(snapshot.prev_id).or_default().push(snapshot.id);

        if snapshot.prev_id != ORIGIN_ID && !known.contains(&snapshot.prev_id) {
            issues.push(HistoryIssue::DanglingPrevId {
                id: snapshot.id,
                prev_id: snapshot.prev_id,
            });
        }
    }

    for (prev_id, ids) in children {
        if ids.len() > 1 {
            issues.push(HistoryIssue::Collision { prev_id, ids });
        }
    }

    issues
}
