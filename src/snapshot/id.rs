use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A globally unique identifier for any entity a snapshot can describe.
///
/// An empty `schema` means the dialect's default namespace (`public` on PostgreSQL, the
/// connected database elsewhere).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Schema {
        name: String,
    },
    Enum {
        schema: String,
        name: String,
    },
    Sequence {
        schema: String,
        name: String,
    },
    Role {
        name: String,
    },
    Policy {
        schema: String,
        table: String,
        name: String,
    },
    Table {
        schema: String,
        name: String,
    },
    Column {
        schema: String,
        table: String,
        name: String,
    },
    Index {
        schema: String,
        table: String,
        name: String,
    },
    Constraint {
        schema: String,
        table: String,
        name: String,
    },
    View {
        schema: String,
        name: String,
    },
}

impl EntityId {
    pub fn table(schema: &str, name: &str) -> Self {
        EntityId::Table {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    pub fn column(schema: &str, table: &str, name: &str) -> Self {
        EntityId::Column {
            schema: schema.to_string(),
            table: table.to_string(),
            name: name.to_string(),
        }
    }

    /// Get the schema name for this entity, if applicable.
    /// Roles are cluster-wide and have none.
    pub fn schema(&self) -> Option<&str> {
        match self {
            EntityId::Schema { name } => Some(name.as_str()),
            EntityId::Enum { schema, .. }
            | EntityId::Sequence { schema, .. }
            | EntityId::Policy { schema, .. }
            | EntityId::Table { schema, .. }
            | EntityId::Column { schema, .. }
            | EntityId::Index { schema, .. }
            | EntityId::Constraint { schema, .. }
            | EntityId::View { schema, .. } => Some(schema.as_str()),
            EntityId::Role { .. } => None,
        }
    }

    /// The entity's own (unqualified) name.
    pub fn name(&self) -> &str {
        match self {
            EntityId::Schema { name }
            | EntityId::Role { name }
            | EntityId::Enum { name, .. }
            | EntityId::Sequence { name, .. }
            | EntityId::Policy { name, .. }
            | EntityId::Table { name, .. }
            | EntityId::Column { name, .. }
            | EntityId::Index { name, .. }
            | EntityId::Constraint { name, .. }
            | EntityId::View { name, .. } => name,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            EntityId::Schema { .. } => Category::Schemas,
            EntityId::Enum { .. } => Category::Enums,
            EntityId::Sequence { .. } => Category::Sequences,
            EntityId::Role { .. } => Category::Roles,
            EntityId::Policy { .. } => Category::Policies,
            EntityId::Table { .. } => Category::Tables,
            EntityId::Column { .. } => Category::Columns,
            EntityId::Index { .. } => Category::Indexes,
            EntityId::Constraint { .. } => Category::Constraints,
            EntityId::View { .. } => Category::Views,
        }
    }

    /// Dotted path with empty segments left out, e.g. `public.users.email` or `users.email`.
    pub fn path(&self) -> String {
        let segments: Vec<&str> = match self {
            EntityId::Schema { name } | EntityId::Role { name } => vec![name],
            EntityId::Enum { schema, name }
            | EntityId::Sequence { schema, name }
            | EntityId::Table { schema, name }
            | EntityId::View { schema, name } => vec![schema, name],
            EntityId::Policy {
                schema,
                table,
                name,
            }
            | EntityId::Column {
                schema,
                table,
                name,
            }
            | EntityId::Index {
                schema,
                table,
                name,
            }
            | EntityId::Constraint {
                schema,
                table,
                name,
            } => vec![schema, table, name],
        };
        segments
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Two ids differ only by namespace (a move rather than a rename).
    pub fn same_name_other_schema(&self, other: &EntityId) -> bool {
        self.category() == other.category()
            && self.name() == other.name()
            && self.schema() != other.schema()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category().singular(), self.path())
    }
}

/// Lookup key inside a squashed schema: namespace plus name.
///
/// For tables, enums, sequences and views the namespace is the schema; for standalone
/// policies it is the `on` target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityKey {
    pub namespace: String,
    pub name: String,
}

impl EntityKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

/// Entity categories, listed in the order the differ visits them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Schemas,
    Enums,
    Sequences,
    Roles,
    Policies,
    Tables,
    Columns,
    Indexes,
    Constraints,
    Views,
}

impl Category {
    pub const DIFF_ORDER: [Category; 10] = [
        Category::Schemas,
        Category::Enums,
        Category::Sequences,
        Category::Roles,
        Category::Policies,
        Category::Tables,
        Category::Columns,
        Category::Indexes,
        Category::Constraints,
        Category::Views,
    ];

    pub fn singular(&self) -> &'static str {
        match self {
            Category::Schemas => "schema",
            Category::Enums => "enum",
            Category::Sequences => "sequence",
            Category::Roles => "role",
            Category::Policies => "policy",
            Category::Tables => "table",
            Category::Columns => "column",
            Category::Indexes => "index",
            Category::Constraints => "constraint",
            Category::Views => "view",
        }
    }

    /// Categories whose members live inside a schema and can therefore be moved.
    pub fn is_namespaced(&self) -> bool {
        matches!(
            self,
            Category::Enums | Category::Sequences | Category::Tables | Category::Views
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = match self {
            Category::Schemas => "schemas",
            Category::Enums => "enums",
            Category::Sequences => "sequences",
            Category::Roles => "roles",
            Category::Policies => "policies",
            Category::Tables => "tables",
            Category::Columns => "columns",
            Category::Indexes => "indexes",
            Category::Constraints => "constraints",
            Category::Views => "views",
        };
        f.write_str(plural)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Category::DIFF_ORDER
            .into_iter()
            .find(|category| category.singular() == lowered || category.to_string() == lowered)
            .ok_or_else(|| format!("unknown entity category '{s}'"))
    }
}
