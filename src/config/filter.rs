use crate::config::types::Filters;
use crate::snapshot::Snapshot;
use glob::Pattern;

/// Decides which tables and schemas a push is allowed to touch.
///
/// Tables outside the filter are removed from both sides of the diff, so they are never
/// created, altered or dropped.
#[derive(Debug, Clone, Default)]
pub struct ObjectFilter {
    include_tables: Vec<Pattern>,
    exclude_tables: Vec<Pattern>,
    schemas: Vec<String>,
}

impl ObjectFilter {
    /// Create a new object filter from configuration. Invalid glob patterns are skipped.
    pub fn new(filters: &Filters) -> Self {
        let mut include_tables = Vec::new();
        let mut exclude_tables = Vec::new();
        for raw in &filters.tables {
            let (negated, pattern) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            let Ok(pattern) = Pattern::new(pattern) else {
                tracing::warn!("Ignoring invalid table pattern `{raw}`");
                continue;
            };
            if negated {
                exclude_tables.push(pattern);
            } else {
                include_tables.push(pattern);
            }
        }

        Self {
            include_tables,
            exclude_tables,
            schemas: filters.schemas.clone(),
        }
    }

    /// Check if a schema should be included
    pub fn should_include_schema(&self, schema_name: &str) -> bool {
        self.schemas.is_empty() || self.schemas.iter().any(|s| s == schema_name)
    }

    /// Check if a table should be included
    pub fn should_include_table(&self, schema_name: &str, table_name: &str) -> bool {
        if !self.should_include_schema(schema_name) {
            return false;
        }

        self.table_matches(table_name)
    }

    fn table_matches(&self, table_name: &str) -> bool {
        if self.exclude_tables.iter().any(|p| p.matches(table_name)) {
            return false;
        }

        // If include patterns are specified, table must match one of them
        self.include_tables.is_empty() || self.include_tables.iter().any(|p| p.matches(table_name))
    }

    /// Copy of `snapshot` holding only the managed objects.
    pub fn filter_snapshot(&self, snapshot: &Snapshot) -> Snapshot {
        let default_schema = snapshot.dialect.default_schema();
        // schema filters only mean something where schemas exist
        let schema_of = |schema: &str| -> Option<String> {
            default_schema.map(|fallback| {
                if schema.is_empty() {
                    fallback.to_string()
                } else {
                    schema.to_string()
                }
            })
        };
        let schema_ok = |schema: &str| {
            schema_of(schema).is_none_or(|schema| self.should_include_schema(&schema))
        };
        let table_ok = |schema: &str, table: &str| schema_ok(schema) && self.table_matches(table);

        let mut filtered = snapshot.clone();
        filtered.schemas.retain(|_, name| schema_ok(name));
        filtered.enums.retain(|_, e| schema_ok(&e.schema));
        filtered.sequences.retain(|_, s| schema_ok(&s.schema));
        filtered.tables.retain(|_, t| table_ok(&t.schema, &t.name));
        filtered.views.retain(|_, v| schema_ok(&v.schema));
        filtered.policies.retain(|_, policy| match &policy.on {
            Some(on) => {
                let (schema, table) = on.split_once('.').unwrap_or(("", on.as_str()));
                table_ok(schema, table)
            }
            None => true,
        });
        filtered
    }
}
