use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,

    pub columns: Vec<IndexColumn>,

    #[serde(default)]
    pub is_unique: bool,

    #[serde(default)]
    pub concurrently: bool,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub with: BTreeMap<String, String>,

    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

fn default_method() -> String {
    "btree".to_string()
}

impl Index {
    pub fn on_columns(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| IndexColumn::column(*c)).collect(),
            is_unique: false,
            concurrently: false,
            method: default_method(),
            with: BTreeMap::new(),
            where_clause: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Plain column names referenced by this index (expressions excluded).
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| !c.is_expression)
            .map(|c| c.expression.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    /// A column name, or an SQL expression when `is_expression` is set.
    pub expression: String,

    #[serde(default)]
    pub is_expression: bool,

    #[serde(default = "ascending")]
    pub asc: bool,

    #[serde(default)]
    pub nulls: NullsOrder,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opclass: Option<String>,
}

fn ascending() -> bool {
    true
}

impl IndexColumn {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            expression: name.into(),
            is_expression: false,
            asc: true,
            nulls: NullsOrder::Last,
            opclass: None,
        }
    }

    pub fn expression(sql: impl Into<String>) -> Self {
        Self {
            is_expression: true,
            ..Self::column(sql)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    #[default]
    Last,
}
