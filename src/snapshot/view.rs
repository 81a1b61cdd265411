use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::{EntityId, EntityKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    /// The SELECT body. Absent for views that are managed outside the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub materialized: bool,
    #[serde(default)]
    pub with: BTreeMap<String, String>,
    /// Declared but not owned: never created, dropped or altered.
    #[serde(default)]
    pub is_existing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_check_option: Option<String>,
}

impl View {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            definition: Some(definition.into()),
            materialized: false,
            with: BTreeMap::new(),
            is_existing: false,
            algorithm: None,
            sql_security: None,
            with_check_option: None,
        }
    }

    pub fn id(&self) -> EntityId {
        EntityId::View {
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.schema, &self.name)
    }

    pub fn keyword(&self) -> &'static str {
        if self.materialized {
            "MATERIALIZED VIEW"
        } else {
            "VIEW"
        }
    }
}
