//! Table operations

use super::{Operation, OperationKind, schema_dependency};
use crate::diff::order::Phase;
use crate::snapshot::Table;
use crate::snapshot::id::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub enum TableOperation {
    Create {
        table: Table,
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
    /// Rebuild the table from its new definition, copying surviving columns.
    Recreate {
        table: Table,
        copied_columns: Vec<String>,
        dropped_columns: Vec<String>,
    },
    EnableRowLevelSecurity {
        schema: String,
        name: String,
    },
    DisableRowLevelSecurity {
        schema: String,
        name: String,
    },
}

impl Operation for TableOperation {
    fn db_object_id(&self) -> EntityId {
        let (schema, name) = match self {
            Self::Create { table } | Self::Recreate { table, .. } => (&table.schema, &table.name),
            Self::Drop { schema, name }
            | Self::EnableRowLevelSecurity { schema, name }
            | Self::DisableRowLevelSecurity { schema, name } => (schema, name),
            Self::Rename { schema, to, .. } => (schema, to),
            Self::Move {
                name, to_schema, ..
            } => (to_schema, name),
        };
        EntityId::table(schema, name)
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Drop { .. } => OperationKind::Drop,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Move { .. } => OperationKind::Move,
            Self::Recreate { .. }
            | Self::EnableRowLevelSecurity { .. }
            | Self::DisableRowLevelSecurity { .. } => OperationKind::Alter,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreateTable,
            Self::Drop { .. } => Phase::DropTable,
            Self::Rename { .. } => Phase::RenameTable,
            Self::Move { .. } => Phase::MoveTable,
            Self::Recreate { .. } => Phase::RecreateTable,
            Self::EnableRowLevelSecurity { .. } | Self::DisableRowLevelSecurity { .. } => {
                Phase::ToggleRls
            }
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        match self {
            Self::Create { table } | Self::Recreate { table, .. } => {
                let mut deps: Vec<EntityId> = schema_dependency(&table.schema).into_iter().collect();
                for column in table.columns.values() {
                    if let Some(type_schema) = &column.type_schema {
                        deps.push(EntityId::Enum {
                            schema: type_schema.clone(),
                            name: column.data_type.clone(),
                        });
                    }
                }
                for fk in table.foreign_keys.values() {
                    let target = EntityId::table(&fk.schema_to, &fk.table_to);
                    if target != table.id() && !deps.contains(&target) {
                        deps.push(target);
                    }
                }
                deps
            }
            Self::Move { to_schema, .. } => schema_dependency(to_schema).into_iter().collect(),
            Self::EnableRowLevelSecurity { schema, name }
            | Self::DisableRowLevelSecurity { schema, name } => {
                vec![EntityId::table(schema, name)]
            }
            _ => Vec::new(),
        }
    }

    fn is_destructive(&self) -> bool {
        match self {
            Self::Drop { .. } => true,
            Self::Recreate {
                dropped_columns, ..
            } => !dropped_columns.is_empty(),
            _ => false,
        }
    }
}
