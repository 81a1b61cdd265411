use serde::{Deserialize, Serialize};

use super::id::{EntityId, EntityKey};

/// A user-defined enumerated type. Value order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    pub values: Vec<String>,
}

impl Enum {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn id(&self) -> EntityId {
        EntityId::Enum {
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.schema, &self.name)
    }

    /// True when `next` keeps every existing value in the same relative order, so the change
    /// can be expressed with `ADD VALUE` alone.
    pub fn is_append_only(&self, next: &Enum) -> bool {
        let mut remaining = next.values.iter();
        self.values
            .iter()
            .all(|value| remaining.by_ref().any(|candidate| candidate == value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_only() {
        let before = Enum::new("", "status", &["active", "inactive"]);
        assert!(before.is_append_only(&Enum::new("", "status", &["active", "pending", "inactive"])));
        assert!(before.is_append_only(&Enum::new("", "status", &["active", "inactive", "banned"])));
        assert!(!before.is_append_only(&Enum::new("", "status", &["inactive", "active"])));
        assert!(!before.is_append_only(&Enum::new("", "status", &["active"])));
    }
}
