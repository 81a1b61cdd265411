//! Hierarchical migration operations
//!
//! Each step is dialect-neutral; rendering to SQL happens in [`crate::render`]. Steps know
//! their target entity, the phase they run in and what they depend on.

use crate::diff::order::Phase;
use crate::snapshot::id::{Category, EntityId};

pub use column::*;
pub use constraint::*;
pub use enums::*;
pub use index::*;
pub use policy::*;
pub use role::*;
pub use schema::*;
pub use sequence::*;
pub use table::*;
pub use view::*;

pub mod column;
pub mod constraint;
pub mod enums;
pub mod index;
pub mod policy;
pub mod role;
pub mod schema;
pub mod sequence;
pub mod table;
pub mod view;

/// Main migration step - hierarchical structure for scalability
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStep {
    Schema(SchemaOperation),
    Enum(EnumOperation),
    Sequence(SequenceOperation),
    Role(RoleOperation),
    Policy(PolicyOperation),
    Table(TableOperation),
    Column(ColumnOperation),
    Constraint(ConstraintOperation),
    Index(IndexOperation),
    View(ViewOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Drop,
    Rename,
    Move,
    Alter,
}

/// Metadata every operation exposes to the ordering and classification passes.
pub trait Operation {
    fn db_object_id(&self) -> EntityId;
    fn operation_kind(&self) -> OperationKind;
    fn phase(&self) -> Phase;

    /// Entities that must exist before this step runs.
    fn dependencies(&self) -> Vec<EntityId> {
        Vec::new()
    }

    fn is_destructive(&self) -> bool {
        self.operation_kind() == OperationKind::Drop
    }
}

impl Operation for MigrationStep {
    fn db_object_id(&self) -> EntityId {
        match self {
            MigrationStep::Schema(op) => op.db_object_id(),
            MigrationStep::Enum(op) => op.db_object_id(),
            MigrationStep::Sequence(op) => op.db_object_id(),
            MigrationStep::Role(op) => op.db_object_id(),
            MigrationStep::Policy(op) => op.db_object_id(),
            MigrationStep::Table(op) => op.db_object_id(),
            MigrationStep::Column(op) => op.db_object_id(),
            MigrationStep::Constraint(op) => op.db_object_id(),
            MigrationStep::Index(op) => op.db_object_id(),
            MigrationStep::View(op) => op.db_object_id(),
        }
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            MigrationStep::Schema(op) => op.operation_kind(),
            MigrationStep::Enum(op) => op.operation_kind(),
            MigrationStep::Sequence(op) => op.operation_kind(),
            MigrationStep::Role(op) => op.operation_kind(),
            MigrationStep::Policy(op) => op.operation_kind(),
            MigrationStep::Table(op) => op.operation_kind(),
            MigrationStep::Column(op) => op.operation_kind(),
            MigrationStep::Constraint(op) => op.operation_kind(),
            MigrationStep::Index(op) => op.operation_kind(),
            MigrationStep::View(op) => op.operation_kind(),
        }
    }

    fn phase(&self) -> Phase {
        match self {
            MigrationStep::Schema(op) => op.phase(),
            MigrationStep::Enum(op) => op.phase(),
            MigrationStep::Sequence(op) => op.phase(),
            MigrationStep::Role(op) => op.phase(),
            MigrationStep::Policy(op) => op.phase(),
            MigrationStep::Table(op) => op.phase(),
            MigrationStep::Column(op) => op.phase(),
            MigrationStep::Constraint(op) => op.phase(),
            MigrationStep::Index(op) => op.phase(),
            MigrationStep::View(op) => op.phase(),
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        match self {
            MigrationStep::Schema(op) => op.dependencies(),
            MigrationStep::Enum(op) => op.dependencies(),
            MigrationStep::Sequence(op) => op.dependencies(),
            MigrationStep::Role(op) => op.dependencies(),
            MigrationStep::Policy(op) => op.dependencies(),
            MigrationStep::Table(op) => op.dependencies(),
            MigrationStep::Column(op) => op.dependencies(),
            MigrationStep::Constraint(op) => op.dependencies(),
            MigrationStep::Index(op) => op.dependencies(),
            MigrationStep::View(op) => op.dependencies(),
        }
    }

    fn is_destructive(&self) -> bool {
        match self {
            MigrationStep::Schema(op) => op.is_destructive(),
            MigrationStep::Enum(op) => op.is_destructive(),
            MigrationStep::Sequence(op) => op.is_destructive(),
            MigrationStep::Role(op) => op.is_destructive(),
            MigrationStep::Policy(op) => op.is_destructive(),
            MigrationStep::Table(op) => op.is_destructive(),
            MigrationStep::Column(op) => op.is_destructive(),
            MigrationStep::Constraint(op) => op.is_destructive(),
            MigrationStep::Index(op) => op.is_destructive(),
            MigrationStep::View(op) => op.is_destructive(),
        }
    }
}

/// What a statement does, independent of its SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementDescriptor {
    pub category: Category,
    pub entity: EntityId,
    pub kind: OperationKind,
    pub destructive: bool,
}

impl MigrationStep {
    pub fn id(&self) -> EntityId {
        self.db_object_id()
    }

    pub fn descriptor(&self) -> StatementDescriptor {
        let entity = self.db_object_id();
        StatementDescriptor {
            category: entity.category(),
            entity,
            kind: self.operation_kind(),
            destructive: self.is_destructive(),
        }
    }

    /// `(schema, table)` of the table this step changes, if it targets one.
    pub fn table_target(&self) -> Option<(&str, &str)> {
        match self {
            MigrationStep::Column(op) => Some((&op.schema, &op.table)),
            MigrationStep::Constraint(op) => Some((&op.schema, &op.table)),
            MigrationStep::Index(
                IndexOperation::Create { schema, table, .. }
                | IndexOperation::Drop { schema, table, .. }
                | IndexOperation::Rename { schema, table, .. },
            ) => Some((schema, table)),
            _ => None,
        }
    }
}

pub(crate) fn schema_dependency(schema: &str) -> Option<EntityId> {
    (!schema.is_empty()).then(|| EntityId::Schema {
        name: schema.to_string(),
    })
}
