//! Column operations within an existing table

use super::{Operation, OperationKind};
use crate::diff::order::Phase;
use crate::snapshot::Column;
use crate::snapshot::id::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOperation {
    pub schema: String,
    pub table: String,
    pub action: ColumnAction,
}

impl ColumnOperation {
    pub fn new(schema: &str, table: &str, action: ColumnAction) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            action,
        }
    }
}

/// Column-level actions within ALTER TABLE. Alterations carry the column's new definition,
/// which dialects that restate the whole column (`MODIFY`) need.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnAction {
    Add { column: Column },
    Drop { name: String },
    Rename { from: String, to: String },
    /// Copy values between columns; used when a dialect cannot rename in place.
    CopyData { from: String, to: String },
    AlterType { column: Column, from_type: String },
    SetDefault { column: Column },
    DropDefault { column: Column },
    SetNotNull { column: Column },
    DropNotNull { column: Column },
    DropGenerated { column: Column },
    /// Generated expression added or changed: the column is dropped and re-added.
    Regenerate { column: Column },
    SetIdentity { column: Column },
    DropIdentity { column: Column },
    AlterAutoincrement { column: Column },
}

impl ColumnAction {
    pub fn column_name(&self) -> &str {
        match self {
            Self::Drop { name } => name,
            Self::Rename { to, .. } | Self::CopyData { to, .. } => to,
            Self::Add { column }
            | Self::AlterType { column, .. }
            | Self::SetDefault { column }
            | Self::DropDefault { column }
            | Self::SetNotNull { column }
            | Self::DropNotNull { column }
            | Self::DropGenerated { column }
            | Self::Regenerate { column }
            | Self::SetIdentity { column }
            | Self::DropIdentity { column }
            | Self::AlterAutoincrement { column } => &column.name,
        }
    }
}

impl Operation for ColumnOperation {
    fn db_object_id(&self) -> EntityId {
        EntityId::column(&self.schema, &self.table, self.action.column_name())
    }

    fn operation_kind(&self) -> OperationKind {
        match self.action {
            ColumnAction::Add { .. } => OperationKind::Create,
            ColumnAction::Drop { .. } => OperationKind::Drop,
            ColumnAction::Rename { .. } => OperationKind::Rename,
            _ => OperationKind::Alter,
        }
    }

    fn phase(&self) -> Phase {
        match self.action {
            ColumnAction::Add { .. } => Phase::AddColumn,
            ColumnAction::Drop { .. } => Phase::DropColumn,
            ColumnAction::Rename { .. } => Phase::RenameColumn,
            ColumnAction::CopyData { .. } => Phase::CopyColumnData,
            _ => Phase::AlterColumn,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        let mut deps = vec![EntityId::table(&self.schema, &self.table)];
        if let ColumnAction::Add { column } | ColumnAction::AlterType { column, .. } = &self.action
            && let Some(type_schema) = &column.type_schema
        {
            deps.push(EntityId::Enum {
                schema: type_schema.clone(),
                name: column.data_type.clone(),
            });
        }
        deps
    }
}
