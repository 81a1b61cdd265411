//! Statement ordering.
//!
//! Steps are bucketed into phases that run in a fixed order; within a phase the order in
//! which the differ produced them is kept. Dialects that declare foreign keys inside
//! `CREATE TABLE` additionally get their new tables topo-sorted by reference.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::{info, warn};

use super::operations::{ConstraintAction, MigrationStep, Operation, TableOperation};
use crate::snapshot::EntityKey;
use crate::snapshot::id::EntityId;

/// Execution phases, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    CreateSchema,
    RenameSchema,
    CreateEnum,
    MoveEnum,
    RenameEnum,
    AddEnumValue,
    CreateSequence,
    MoveSequence,
    RenameSequence,
    AlterSequence,
    RenameRole,
    CreateRole,
    AlterRole,
    CreateTable,
    ToggleRls,
    DropView,
    RenameView,
    /// Foreign keys pointing at a table dropped in the same batch.
    DropReferencingForeignKey,
    DropTable,
    MoveTable,
    RenameTable,
    RenameColumn,
    RenameIndex,
    RecreateTable,
    DropConstraint,
    AlterColumn,
    AddColumn,
    CopyColumnData,
    AddPrimaryKey,
    CreateForeignKey,
    CreateIndex,
    DropColumn,
    AddConstraint,
    RecreateEnum,
    CreateView,
    RenamePolicy,
    DropPolicy,
    CreatePolicy,
    AlterPolicy,
    DropRole,
    DropEnum,
    DropSequence,
    DropSchema,
}

pub fn order_steps(steps: Vec<MigrationStep>, inline_foreign_keys: bool) -> Vec<MigrationStep> {
    info!("Ordering migration steps...");
    let dropped = dropped_tables(&steps);
    let relocated = relocated_tables(&steps);
    let mut phased: Vec<(Phase, usize, MigrationStep)> = steps
        .into_iter()
        .enumerate()
        .map(|(position, step)| {
            let phase = if drops_key_into(&step, &dropped, &relocated) {
                Phase::DropReferencingForeignKey
            } else {
                step.phase()
            };
            (phase, position, step)
        })
        .collect();
    phased.sort_by_key(|(phase, position, _)| (*phase, *position));

    let ordered: Vec<MigrationStep> = phased.into_iter().map(|(_, _, step)| step).collect();
    if inline_foreign_keys {
        sort_created_tables(ordered)
    } else {
        ordered
    }
}

fn dropped_tables(steps: &[MigrationStep]) -> BTreeSet<EntityKey> {
    steps
        .iter()
        .filter_map(|step| match step {
            MigrationStep::Table(TableOperation::Drop { schema, name }) => {
                Some(EntityKey::new(schema, name))
            }
            _ => None,
        })
        .collect()
}

/// Tables that only get their final name later in the batch.
fn relocated_tables(steps: &[MigrationStep]) -> BTreeSet<EntityKey> {
    steps
        .iter()
        .filter_map(|step| match step {
            MigrationStep::Table(TableOperation::Rename { schema, to, .. }) => {
                Some(EntityKey::new(schema, to))
            }
            MigrationStep::Table(TableOperation::Move {
                name, to_schema, ..
            }) => Some(EntityKey::new(to_schema, name)),
            _ => None,
        })
        .collect()
}

/// A foreign-key drop that must run before the table it references is dropped. Constraints on
/// tables renamed in the same batch keep their phase, since they are addressed by the new name.
fn drops_key_into(
    step: &MigrationStep,
    dropped: &BTreeSet<EntityKey>,
    relocated: &BTreeSet<EntityKey>,
) -> bool {
    let MigrationStep::Constraint(op) = step else {
        return false;
    };
    let ConstraintAction::DropForeignKey { foreign_key } = &op.action else {
        return false;
    };
    dropped.contains(&EntityKey::new(&foreign_key.schema_to, &foreign_key.table_to))
        && !relocated.contains(&EntityKey::new(&op.schema, &op.table))
}

/// Reorder the contiguous CREATE TABLE block so referenced tables come first.
fn sort_created_tables(steps: Vec<MigrationStep>) -> Vec<MigrationStep> {
    let is_create = |step: &MigrationStep| {
        matches!(step, MigrationStep::Table(TableOperation::Create { .. }))
    };
    let Some(start) = steps.iter().position(is_create) else {
        return steps;
    };
    let end = steps[start..]
        .iter()
        .position(|step| !is_create(step))
        .map_or(steps.len(), |offset| start + offset);

    let mut steps = steps;
    let tail = steps.split_off(end);
    let creates = steps.split_off(start);

    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<_> = (0..creates.len()).map(|i| graph.add_node(i)).collect();
    let by_id: BTreeMap<EntityId, usize> = creates
        .iter()
        .enumerate()
        .map(|(i, step)| (step.id(), i))
        .collect();

    for (i, step) in creates.iter().enumerate() {
        for dep in step.dependencies() {
            if let Some(&dep_i) = by_id.get(&dep)
                && dep_i != i
            {
                graph.add_edge(nodes[dep_i], nodes[i], ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(sorted) => {
            let mut slots: Vec<Option<MigrationStep>> = creates.into_iter().map(Some).collect();
            steps.extend(sorted.into_iter().filter_map(|node| slots[graph[node]].take()));
        }
        Err(cycle) => {
            let step = &creates[graph[cycle.node_id()]];
            warn!(
                "Foreign keys between new tables form a cycle through {}, keeping declaration order",
                step.id()
            );
            steps.extend(creates);
        }
    }
    steps.extend(tail);
    steps
}
