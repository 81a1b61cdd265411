//! Sequence operations

use super::{Operation, OperationKind, schema_dependency};
use crate::diff::order::Phase;
use crate::snapshot::Sequence;
use crate::snapshot::id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOperation {
    Create {
        sequence: Sequence,
    },
    Drop {
        schema: String,
        name: String,
    },
    Rename {
        schema: String,
        from: String,
        to: String,
    },
    Move {
        name: String,
        from_schema: String,
        to_schema: String,
    },
    Alter {
        sequence: Sequence,
    },
}

impl Operation for SequenceOperation {
    fn db_object_id(&self) -> EntityId {
        let (schema, name) = match self {
            Self::Create { sequence } | Self::Alter { sequence } => {
                (&sequence.schema, &sequence.name)
            }
            Self::Drop { schema, name } => (schema, name),
            Self::Rename { schema, to, .. } => (schema, to),
            Self::Move {
                name, to_schema, ..
            } => (to_schema, name),
        };
        EntityId::Sequence {
            schema: schema.clone(),
            name: name.clone(),
        }
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Drop { .. } => OperationKind::Drop,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Move { .. } => OperationKind::Move,
            Self::Alter { .. } => OperationKind::Alter,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreateSequence,
            Self::Drop { .. } => Phase::DropSequence,
            Self::Rename { .. } => Phase::RenameSequence,
            Self::Move { .. } => Phase::MoveSequence,
            Self::Alter { .. } => Phase::AlterSequence,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        match self {
            Self::Create { sequence } => schema_dependency(&sequence.schema).into_iter().collect(),
            Self::Move { to_schema, .. } => schema_dependency(to_schema).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}
