//! Enum type operations

use super::{Operation, OperationKind, schema_dependency};
use crate::diff::order::Phase;
use crate::snapshot::Enum;
use crate::snapshot::id::EntityId;

/// A column typed with an enum that has to be re-pointed while the enum is recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumOperation {
    Create {
        enum_type: Enum,
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
    AddValue {
        schema: String,
        name: String,
        value: String,
        /// Existing value the new one is inserted in front of; `None` appends.
        before: Option<String>,
    },
    /// Values were removed or reordered: recreate the type and convert dependent columns.
    Recreate {
        enum_type: Enum,
        removed: Vec<String>,
        columns: Vec<ColumnRef>,
    },
}

impl Operation for EnumOperation {
    fn db_object_id(&self) -> EntityId {
        let (schema, name) = match self {
            Self::Create { enum_type } | Self::Recreate { enum_type, .. } => {
                (&enum_type.schema, &enum_type.name)
            }
            Self::Drop { schema, name } | Self::AddValue { schema, name, .. } => (schema, name),
            Self::Rename { schema, to, .. } => (schema, to),
            Self::Move {
                name, to_schema, ..
            } => (to_schema, name),
        };
        EntityId::Enum {
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
            Self::AddValue { .. } | Self::Recreate { .. } => OperationKind::Alter,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreateEnum,
            Self::Drop { .. } => Phase::DropEnum,
            Self::Rename { .. } => Phase::RenameEnum,
            Self::Move { .. } => Phase::MoveEnum,
            Self::AddValue { .. } => Phase::AddEnumValue,
            Self::Recreate { .. } => Phase::RecreateEnum,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        match self {
            Self::Create { enum_type } => schema_dependency(&enum_type.schema).into_iter().collect(),
            Self::Move { to_schema, .. } => schema_dependency(to_schema).into_iter().collect(),
            Self::Recreate { columns, .. } => columns
                .iter()
                .map(|c| EntityId::table(&c.schema, &c.table))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(self, Self::Drop { .. } | Self::Recreate { .. })
    }
}
