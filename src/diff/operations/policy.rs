//! Row-level security policy operations

use super::{Operation, OperationKind};
use crate::diff::order::Phase;
use crate::snapshot::Policy;
use crate::snapshot::id::EntityId;

/// Table a policy is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTarget {
    pub schema: String,
    pub table: String,
}

impl PolicyTarget {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn policy_id(&self, name: &str) -> EntityId {
        EntityId::Policy {
            schema: self.schema.clone(),
            table: self.table.clone(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOperation {
    Create {
        target: PolicyTarget,
        policy: Policy,
    },
    Drop {
        target: PolicyTarget,
        name: String,
    },
    Rename {
        target: PolicyTarget,
        from: String,
        to: String,
    },
    /// Fields set to `Some` are changed; `ALTER POLICY` cannot remove an expression.
    Alter {
        target: PolicyTarget,
        name: String,
        roles: Option<Vec<String>>,
        using: Option<String>,
        with_check: Option<String>,
    },
    /// Policy needs full replacement (command or permissive changed, or an expression was removed)
    Replace {
        target: PolicyTarget,
        old_policy: Box<Policy>,
        new_policy: Box<Policy>,
    },
}

impl PolicyOperation {
    pub fn target(&self) -> &PolicyTarget {
        match self {
            Self::Create { target, .. }
            | Self::Drop { target, .. }
            | Self::Rename { target, .. }
            | Self::Alter { target, .. }
            | Self::Replace { target, .. } => target,
        }
    }
}

impl Operation for PolicyOperation {
    fn db_object_id(&self) -> EntityId {
        let name = match self {
            Self::Create { policy, .. } => &policy.name,
            Self::Drop { name, .. } | Self::Alter { name, .. } => name,
            Self::Rename { to, .. } => to,
            Self::Replace { new_policy, .. } => &new_policy.name,
        };
        self.target().policy_id(name)
    }

    fn operation_kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Drop { .. } => OperationKind::Drop,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Alter { .. } | Self::Replace { .. } => OperationKind::Alter,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Create { .. } => Phase::CreatePolicy,
            Self::Drop { .. } => Phase::DropPolicy,
            Self::Rename { .. } => Phase::RenamePolicy,
            Self::Alter { .. } | Self::Replace { .. } => Phase::AlterPolicy,
        }
    }

    fn dependencies(&self) -> Vec<EntityId> {
        let target = self.target();
        let mut deps = vec![EntityId::table(&target.schema, &target.table)];
        let roles = match self {
            Self::Create { policy, .. } => Some(&policy.to),
            Self::Replace { new_policy, .. } => Some(&new_policy.to),
            Self::Alter { roles, .. } => roles.as_ref(),
            _ => None,
        };
        if let Some(roles) = roles {
            deps.extend(
                roles
                    .iter()
                    .filter(|role| !is_builtin_role(role))
                    .map(|role| EntityId::Role { name: role.clone() }),
            );
        }
        deps
    }
}

/// Role keywords PostgreSQL accepts in `TO` lists without a `CREATE ROLE`.
pub fn is_builtin_role(role: &str) -> bool {
    matches!(
        role,
        "public" | "current_role" | "current_user" | "session_user"
    )
}
