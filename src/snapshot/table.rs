//! Tables and their columns as they appear in a snapshot document.
use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::constraint::{CheckConstraint, ForeignKey, PrimaryKey, UniqueConstraint};
use super::id::{EntityId, EntityKey};
use super::index::Index;
use super::policy::Policy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    /// Set when the type is a user-defined enum; holds that enum's schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_schema: Option<String>,

    #[serde(default)]
    pub primary_key: bool,

    #[serde(default)]
    pub not_null: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<Generated>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityKind>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub autoincrement: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            type_schema: None,
            primary_key: false,
            not_null: false,
            default: None,
            generated: None,
            identity: None,
            autoincrement: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Primary key columns are implicitly not null.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn of_enum(mut self, schema: impl Into<String>) -> Self {
        self.type_schema = Some(schema.into());
        self
    }

    pub fn is_enum_typed(&self, schema: &str, name: &str) -> bool {
        self.type_schema.as_deref() == Some(schema) && self.data_type == name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generated {
    #[serde(rename = "as")]
    pub expression: String,
    #[serde(rename = "type", default)]
    pub kind: GeneratedKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedKind {
    #[default]
    Stored,
    Virtual,
}

impl GeneratedKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            GeneratedKind::Stored => "STORED",
            GeneratedKind::Virtual => "VIRTUAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityKind {
    Always,
    ByDefault,
}

impl IdentityKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            IdentityKind::Always => "ALWAYS",
            IdentityKind::ByDefault => "BY DEFAULT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,

    #[serde(default)]
    pub schema: String,

    /// Declaration order is preserved; it drives column order in CREATE TABLE.
    #[serde(default)]
    pub columns: IndexMap<String, Column>,

    #[serde(default)]
    pub indexes: BTreeMap<String, Index>,

    #[serde(default)]
    pub foreign_keys: BTreeMap<String, ForeignKey>,

    #[serde(default)]
    pub composite_primary_keys: BTreeMap<String, PrimaryKey>,

    #[serde(default)]
    pub unique_constraints: BTreeMap<String, UniqueConstraint>,

    #[serde(default)]
    pub check_constraints: BTreeMap<String, CheckConstraint>,

    #[serde(default)]
    pub policies: BTreeMap<String, Policy>,

    #[serde(default, rename = "isRLSEnabled")]
    pub rls_enabled: bool,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: columns
                .into_iter()
                .map(|column| (column.name.clone(), column))
                .collect(),
            indexes: BTreeMap::new(),
            foreign_keys: BTreeMap::new(),
            composite_primary_keys: BTreeMap::new(),
            unique_constraints: BTreeMap::new(),
            check_constraints: BTreeMap::new(),
            policies: BTreeMap::new(),
            rls_enabled: false,
        }
    }

    pub fn id(&self) -> EntityId {
        EntityId::table(&self.schema, &self.name)
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.schema, &self.name)
    }

    pub fn column_id(&self, column: &str) -> EntityId {
        EntityId::column(&self.schema, &self.name, column)
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.insert(index.name.clone(), index);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.insert(fk.name.clone(), fk);
        self
    }

    pub fn with_primary_key(mut self, pk: PrimaryKey) -> Self {
        self.composite_primary_keys.insert(pk.name.clone(), pk);
        self
    }

    pub fn with_unique(mut self, unique: UniqueConstraint) -> Self {
        self.unique_constraints.insert(unique.name.clone(), unique);
        self
    }

    pub fn with_check(mut self, check: CheckConstraint) -> Self {
        self.check_constraints.insert(check.name.clone(), check);
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.insert(policy.name.clone(), policy);
        self.rls_enabled = true;
        self
    }

    /// Columns that participate in a key another statement could trip over when the column
    /// disappears: primary keys, unique constraints and outgoing foreign keys.
    pub fn is_key_column(&self, column: &str) -> bool {
        let named = |columns: &Vec<String>| columns.iter().any(|c| c == column);
        self.columns.get(column).is_some_and(|c| c.primary_key)
            || self
                .composite_primary_keys
                .values()
                .any(|pk| named(&pk.columns))
            || self
                .unique_constraints
                .values()
                .any(|unique| named(&unique.columns))
            || self
                .foreign_keys
                .values()
                .any(|fk| named(&fk.columns_from))
    }
}
