//! Table constraint operations

use super::{Operation, OperationKind};
use crate::diff::order::Phase;
use crate::snapshot::id::EntityId;
use crate::snapshot::{CheckConstraint, ForeignKey, PrimaryKey, UniqueConstraint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintOperation {
    pub schema: String,
    pub table: String,
    pub action: ConstraintAction,
}

impl ConstraintOperation {
    pub fn new(schema: &str, table: &str, action: ConstraintAction) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintAction {
    AddPrimaryKey { primary_key: PrimaryKey },
    DropPrimaryKey { primary_key: PrimaryKey },
    AddUnique { unique: UniqueConstraint },
    DropUnique { unique: UniqueConstraint },
    AddCheck { check: CheckConstraint },
    DropCheck { check: CheckConstraint },
    AddForeignKey { foreign_key: ForeignKey },
    DropForeignKey { foreign_key: ForeignKey },
}

impl ConstraintAction {
    pub fn name(&self) -> &str {
        match self {
            Self::AddPrimaryKey { primary_key } | Self::DropPrimaryKey { primary_key } => {
                &primary_key.name
            }
            Self::AddUnique { unique } | Self::DropUnique { unique } => &unique.name,
            Self::AddCheck { check } | Self::DropCheck { check } => &check.name,
            Self::AddForeignKey { foreign_key } | Self::DropForeignKey { foreign_key } => {
                &foreign_key.name
            }
        }
    }
}

impl Operation for ConstraintOperation {
    fn db_object_id(&self) -> EntityId {
        EntityId::Constraint {
            schema: self.schema.clone(),
            table: self.table.clone(),
            name: self.action.name().to_string(),
        }
    }

    fn operation_kind(&self) -> OperationKind {
        match self.action {
            ConstraintAction::AddPrimaryKey { .. }
            | ConstraintAction::AddUnique { .. }
            | ConstraintAction::AddCheck { .. }
            | ConstraintAction::AddForeignKey { .. } => OperationKind::Create,
            _ => OperationKind::Drop,
        }
    }

    fn phase(&self) -> Phase {
        match self.action {
            ConstraintAction::AddPrimaryKey { .. } => Phase::AddPrimaryKey,
            ConstraintAction::AddForeignKey { .. } => Phase::CreateForeignKey,
            ConstraintAction::AddUnique { .. } | ConstraintAction::AddCheck { .. } => {
                Phase::AddConstraint
            }
            _ => Phase::DropConstraint,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        let mut deps = vec![EntityId::table(&self.schema, &self.table)];
        if let ConstraintAction::AddForeignKey { foreign_key } = &self.action {
            let target = EntityId::table(&foreign_key.schema_to, &foreign_key.table_to);
            if !deps.contains(&target) {
                deps.push(target);
            }
        }
        deps
    }
}
