//! Role operations

use super::{Operation, OperationKind};
use crate::diff::order::Phase;
use crate::snapshot::Role;
use crate::snapshot::id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOperation {
    Create { role: Role },
    Drop { name: String },
    Rename { from: String, to: String },
    Alter { role: Role },
}

impl Operation for RoleOperation {
    fn db_object_id(&self) -> EntityId {
        let name = match self {
            Self::Create { role } | Self::Alter { role } => &role.name,
            Self::Drop { name } => name,
            Self::Rename { to, .. } => to,
        };
        EntityId::Role { name: name.clone() }
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Drop { .. } => OperationKind::Drop,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Alter { .. } => OperationKind::Alter,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreateRole,
            Self::Drop { .. } => Phase::DropRole,
            Self::Rename { .. } => Phase::RenameRole,
            Self::Alter { .. } => Phase::AlterRole,
        }
    }
}
