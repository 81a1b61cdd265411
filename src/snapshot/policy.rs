use std::fmt;

use serde::{Deserialize, Serialize};

/// Command type a row-level security policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyCommand {
    #[default]
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for PolicyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyCommand::All => "ALL",
            PolicyCommand::Select => "SELECT",
            PolicyCommand::Insert => "INSERT",
            PolicyCommand::Update => "UPDATE",
            PolicyCommand::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyKind {
    #[default]
    Permissive,
    Restrictive,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyKind::Permissive => "PERMISSIVE",
            PolicyKind::Restrictive => "RESTRICTIVE",
        })
    }
}

/// A PostgreSQL row-level security policy, either nested in a table or standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub name: String,

    #[serde(rename = "as", default)]
    pub kind: PolicyKind,

    #[serde(rename = "for", default)]
    pub command: PolicyCommand,

    /// Roles the policy applies to; empty means `public`.
    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_check: Option<String>,

    /// Target table for standalone policies, e.g. `auth.users`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
}

impl Policy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PolicyKind::Permissive,
            command: PolicyCommand::All,
            to: Vec::new(),
            using: None,
            with_check: None,
            on: None,
        }
    }

    /// Split a standalone policy's `on` target into schema and table, unquoting if needed.
    pub fn target(&self) -> Option<(String, String)> {
        let on = self.on.as_deref()?;
        let parts: Vec<String> = on
            .split('.')
            .map(|part| part.trim().trim_matches('"').to_string())
            .collect();
        match parts.as_slice() {
            [table] => Some((String::new(), table.clone())),
            [schema, table] => Some((schema.clone(), table.clone())),
            _ => None,
        }
    }
}
