//! Snapshot documents: the versioned, dialect-specific description of a schema state.
pub mod constraint;
pub mod enums;
pub mod history;
pub mod id;
pub mod index;
pub mod policy;
pub mod role;
pub mod sequence;
pub mod table;
pub mod version;
pub mod view;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use constraint::{CheckConstraint, ForeignKey, PrimaryKey, UniqueConstraint};
pub use enums::Enum;
pub use id::{Category, EntityId, EntityKey};
pub use index::{Index, IndexColumn, NullsOrder};
pub use policy::{Policy, PolicyCommand, PolicyKind};
pub use role::Role;
pub use sequence::Sequence;
pub use table::{Column, Generated, GeneratedKind, IdentityKind, Table};
pub use view::View;

use crate::constants::ORIGIN_ID;
use crate::error::{DiffError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgresql,
    Mysql,
    Sqlite,
    Singlestore,
}

impl Dialect {
    /// Latest snapshot format version written for this dialect.
    pub fn current_version(&self) -> u32 {
        match self {
            Dialect::Postgresql => 7,
            Dialect::Mysql => 5,
            Dialect::Sqlite => 6,
            Dialect::Singlestore => 1,
        }
    }

    pub fn supports(&self, category: Category) -> bool {
        match category {
            Category::Tables
            | Category::Columns
            | Category::Indexes
            | Category::Constraints => true,
            Category::Views => !matches!(self, Dialect::Singlestore),
            Category::Schemas
            | Category::Enums
            | Category::Sequences
            | Category::Roles
            | Category::Policies => matches!(self, Dialect::Postgresql),
        }
    }

    /// Name of the namespace that an empty schema stands for.
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Dialect::Postgresql => Some("public"),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Postgresql => "postgresql",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Singlestore => "singlestore",
        })
    }
}

/// Renames that produced a snapshot, as old → new dotted paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    #[serde(default)]
    pub schemas: BTreeMap<String, String>,
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

impl SnapshotMeta {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.tables.is_empty() && self.columns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Uuid,
    pub prev_id: Uuid,
    pub version: String,
    pub dialect: Dialect,
    #[serde(default)]
    pub schemas: BTreeMap<String, String>,
    #[serde(default)]
    pub enums: BTreeMap<String, Enum>,
    #[serde(default)]
    pub sequences: BTreeMap<String, Sequence>,
    #[serde(default)]
    pub roles: BTreeMap<String, Role>,
    #[serde(default)]
    pub policies: BTreeMap<String, Policy>,
    #[serde(default)]
    pub tables: BTreeMap<String, Table>,
    #[serde(default)]
    pub views: BTreeMap<String, View>,
    #[serde(default, rename = "_meta")]
    pub meta: SnapshotMeta,
}

impl Snapshot {
    /// The state before any migration: origin ids, no entities.
    pub fn empty(dialect: Dialect) -> Self {
        Self {
            id: ORIGIN_ID,
            prev_id: ORIGIN_ID,
            version: dialect.current_version().to_string(),
            dialect,
            schemas: BTreeMap::new(),
            enums: BTreeMap::new(),
            sequences: BTreeMap::new(),
            roles: BTreeMap::new(),
            policies: BTreeMap::new(),
            tables: BTreeMap::new(),
            views: BTreeMap::new(),
            meta: SnapshotMeta::default(),
        }
    }

    /// Parse a snapshot document, upgrading older formats first.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let upgraded = version::upgrade(value)?;
        let snapshot: Snapshot = serde_json::from_value(upgraded)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Chain `self` after `prev` with a fresh id.
    pub fn chained_after(mut self, prev: &Snapshot) -> Self {
        self.prev_id = prev.id;
        self.id = Uuid::new_v4();
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.insert(table_key(self.dialect, &table), table);
        self
    }

    pub fn with_enum(mut self, enum_type: Enum) -> Self {
        self.enums
            .insert(format!("{}.{}", schema_or_default(self.dialect, &enum_type.schema), enum_type.name), enum_type);
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.views.insert(view.key().to_string(), view);
        self
    }

    /// Structural validation; run before any diffing.
    pub fn validate(&self) -> Result<()> {
        let dialect = self.dialect;
        let unsupported = [
            (Category::Schemas, self.schemas.len()),
            (Category::Enums, self.enums.len()),
            (Category::Sequences, self.sequences.len()),
            (Category::Roles, self.roles.len()),
            (Category::Policies, self.policies.len()),
            (Category::Views, self.views.len()),
        ];
        for (category, count) in unsupported {
            if count > 0 && !dialect.supports(category) {
                return Err(DiffError::malformed(
                    format!("{dialect} snapshot"),
                    format!("{category} are not supported by this dialect"),
                ));
            }
        }

        for table in self.tables.values() {
            validate_table(dialect, table)?;
        }

        for enum_type in self.enums.values() {
            if enum_type.name.is_empty() {
                return Err(DiffError::malformed("enum", "name is empty"));
            }
            let mut seen = BTreeSet::new();
            for value in &enum_type.values {
                if !seen.insert(value) {
                    return Err(DiffError::malformed(
                        enum_type.id(),
                        format!("duplicate value '{value}'"),
                    ));
                }
            }
        }

        for sequence in self.sequences.values() {
            if sequence.name.is_empty() {
                return Err(DiffError::malformed("sequence", "name is empty"));
            }
        }

        for policy in self.policies.values() {
            if policy.name.is_empty() {
                return Err(DiffError::malformed("policy", "name is empty"));
            }
            if policy.target().is_none() {
                return Err(DiffError::malformed(
                    format!("policy {}", policy.name),
                    "standalone policies need an `on` table",
                ));
            }
        }

        for view in self.views.values() {
            if view.name.is_empty() {
                return Err(DiffError::malformed("view", "name is empty"));
            }
            if view.materialized && dialect != Dialect::Postgresql {
                return Err(DiffError::malformed(
                    view.id(),
                    "materialized views are PostgreSQL-only",
                ));
            }
        }

        Ok(())
    }
}

fn validate_table(dialect: Dialect, table: &Table) -> Result<()> {
    let id = table.id();
    if table.name.is_empty() {
        return Err(DiffError::malformed("table", "name is empty"));
    }
    if !table.schema.is_empty() && dialect != Dialect::Postgresql {
        return Err(DiffError::malformed(
            &id,
            format!("{dialect} tables cannot declare a schema"),
        ));
    }
    if table.rls_enabled && dialect != Dialect::Postgresql {
        return Err(DiffError::malformed(&id, "row level security is PostgreSQL-only"));
    }
    if !table.policies.is_empty() && dialect != Dialect::Postgresql {
        return Err(DiffError::malformed(&id, "policies are PostgreSQL-only"));
    }

    for (key, column) in &table.columns {
        if column.name.is_empty() {
            return Err(DiffError::malformed(&id, "column with empty name"));
        }
        if key != &column.name {
            return Err(DiffError::malformed(
                table.column_id(&column.name),
                format!("keyed as '{key}'"),
            ));
        }
        if column.data_type.trim().is_empty() {
            return Err(DiffError::malformed(table.column_id(&column.name), "type is empty"));
        }
        if column.identity.is_some() && dialect != Dialect::Postgresql {
            return Err(DiffError::malformed(
                table.column_id(&column.name),
                "identity columns are PostgreSQL-only",
            ));
        }
    }

    for index in table.indexes.values() {
        if index.columns.is_empty() {
            return Err(DiffError::malformed(&id, format!("index '{}' has no columns", index.name)));
        }
        check_columns(table, "index", &index.name, index.column_names())?;
    }
    for pk in table.composite_primary_keys.values() {
        check_columns(table, "primary key", &pk.name, pk.columns.iter().map(String::as_str))?;
    }
    for unique in table.unique_constraints.values() {
        check_columns(
            table,
            "unique constraint",
            &unique.name,
            unique.columns.iter().map(String::as_str),
        )?;
    }
    for fk in table.foreign_keys.values() {
        check_columns(table, "foreign key", &fk.name, fk.columns_from.iter().map(String::as_str))?;
        if fk.columns_from.len() != fk.columns_to.len() || fk.columns_from.is_empty() {
            return Err(DiffError::malformed(
                &id,
                format!("foreign key '{}' has mismatched column lists", fk.name),
            ));
        }
    }

    Ok(())
}

fn check_columns<'a>(
    table: &Table,
    what: &str,
    name: &str,
    mut columns: impl Iterator<Item = &'a str>,
) -> Result<()> {
    match columns.find(|column| !table.columns.contains_key(*column)) {
        Some(column) => Err(DiffError::malformed(
            table.id(),
            format!("{what} '{name}' references unknown column '{column}'"),
        )),
        None => Ok(()),
    }
}

fn schema_or_default(dialect: Dialect, schema: &str) -> String {
    match (schema.is_empty(), dialect.default_schema()) {
        (true, Some(default)) => default.to_string(),
        _ => schema.to_string(),
    }
}

/// JSON key a table is stored under: `schema.name` on PostgreSQL, bare name elsewhere.
pub fn table_key(dialect: Dialect, table: &Table) -> String {
    match dialect {
        Dialect::Postgresql => format!("{}.{}", schema_or_default(dialect, &table.schema), table.name),
        _ => table.name.clone(),
    }
}
