use serde::{Deserialize, Serialize};

use super::id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub create_db: bool,
    #[serde(default)]
    pub create_role: bool,
    #[serde(default = "inherits")]
    pub inherit: bool,
}

fn inherits() -> bool {
    true
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            create_db: false,
            create_role: false,
            inherit: true,
        }
    }

    pub fn id(&self) -> EntityId {
        EntityId::Role {
            name: self.name.clone(),
        }
    }
}
