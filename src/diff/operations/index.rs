//! Index operations

use super::{Operation, OperationKind};
use crate::diff::order::Phase;
use crate::snapshot::Index;
use crate::snapshot::id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOperation {
    Create {
        schema: String,
        table: String,
        index: Index,
    },
    Drop {
        schema: String,
        table: String,
        index: Index,
    },
    Rename {
        schema: String,
        table: String,
        from: String,
        /// The index as it exists after the rename.
        index: Index,
    },
}

impl Operation for IndexOperation {
    fn db_object_id(&self) -> EntityId {
        match self {
            Self::Create {
                schema,
                table,
                index,
            }
            | Self::Drop {
                schema,
                table,
                index,
            }
            | Self::Rename {
                schema,
                table,
                index,
                ..
            } => EntityId::Index {
                schema: schema.clone(),
                table: table.clone(),
                name: index.name.clone(),
            },
        }
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
            Self::Create { .. } => Phase::CreateIndex,
            Self::Drop { .. } => Phase::DropConstraint,
            Self::Rename { .. } => Phase::RenameIndex,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        match self {
            Self::Create { schema, table, .. } | Self::Rename { schema, table, .. } => {
                vec![EntityId::table(schema, table)]
            }
            Self::Drop { .. } => Vec::new(),
        }
    }
}
