//! Schema operations

use super::{Operation, OperationKind};
use crate::diff::order::Phase;
use crate::snapshot::id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOperation {
    Create { name: String },
    Drop { name: String },
    Rename { from: String, to: String },
}

impl Operation for SchemaOperation {
    fn db_object_id(&self) -> EntityId {
        let name = match self {
            Self::Create { name } | Self::Drop { name } => name,
            Self::Rename { to, .. } => to,
        };
        EntityId::Schema { name: name.clone() }
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Drop { .. } => OperationKind::Drop,
            Self::Rename { .. } => OperationKind::Rename,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreateSchema,
            Self::Drop { .. } => Phase::DropSchema,
            Self::Rename { .. } => Phase::RenameSchema,
        }
    }
}
