//! View operations

use super::{Operation, OperationKind, schema_dependency};
use crate::diff::order::Phase;
use crate::snapshot::View;
use crate::snapshot::id::EntityId;

/// Definition changes are expressed as a drop followed by a create, so a view never
/// references a column before it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOperation {
    Create {
        view: View,
    },
    Drop {
        view: View,
    },
    Rename {
        from: String,
        /// The view as it exists after the rename.
        view: View,
    },
    Move {
        from_schema: String,
        view: View,
    },
}

impl ViewOperation {
    pub fn view(&self) -> &View {
        match self {
            Self::Create { view }
            | Self::Drop { view }
            | Self::Rename { view, .. }
            | Self::Move { view, .. } => view,
        }
    }
}

impl Operation for ViewOperation {
    fn db_object_id(&self) -> EntityId {
        self.view().id()
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Drop { .. } => OperationKind::Drop,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Move { .. } => OperationKind::Move,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreateView,
            Self::Drop { .. } => Phase::DropView,
            Self::Rename { .. } | Self::Move { .. } => Phase::RenameView,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        match self {
            Self::Create { view } | Self::Move { view, .. } => {
                schema_dependency(&view.schema).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}
