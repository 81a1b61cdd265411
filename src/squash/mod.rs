//! Squashed comparison form of a snapshot.
//!
//! Squashing re-keys every entity by its own identity and normalizes cosmetic differences
//! (whitespace, role list order, server spellings of types) so the differ only sees changes
//! that matter. It is a projection: squashing a squashed schema changes nothing.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::error::Result;
use crate::snapshot::{
    Column, Dialect, Enum, EntityKey, ForeignKey, Index, Policy, PrimaryKey, Role, Sequence,
    Snapshot, Table, UniqueConstraint, View,
};

/// `Push` compares against an introspected database, so details introspection cannot
/// reproduce faithfully are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Default,
    Push,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SquashedSchema {
    pub dialect: Dialect,
    pub schemas: BTreeMap<String, String>,
    pub enums: BTreeMap<EntityKey, Enum>,
    pub sequences: BTreeMap<EntityKey, Sequence>,
    pub roles: BTreeMap<String, Role>,
    /// Standalone policies, keyed by their `on` target.
    pub policies: BTreeMap<EntityKey, Policy>,
    pub tables: BTreeMap<EntityKey, Table>,
    pub views: BTreeMap<EntityKey, View>,
}

impl SquashedSchema {
    pub fn empty(dialect: Dialect) -> Self {
        Self {
            dialect,
            schemas: BTreeMap::new(),
            enums: BTreeMap::new(),
            sequences: BTreeMap::new(),
            roles: BTreeMap::new(),
            policies: BTreeMap::new(),
            tables: BTreeMap::new(),
            views: BTreeMap::new(),
        }
    }

    pub fn table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.tables.get(&EntityKey::new(schema, name))
    }

    /// Columns across all tables typed with the given enum.
    pub fn enum_columns(&self, schema: &str, name: &str) -> Vec<(&Table, &Column)> {
        self.tables
            .values()
            .flat_map(|table| {
                table
                    .columns
                    .values()
                    .filter(|column| column.is_enum_typed(schema, name))
                    .map(move |column| (table, column))
            })
            .collect()
    }
}

pub trait Squash {
    fn squash(&self, mode: Mode) -> Result<SquashedSchema>;
}

impl Squash for Snapshot {
    fn squash(&self, mode: Mode) -> Result<SquashedSchema> {
        self.validate()?;
        let normalizer = Normalizer {
            dialect: self.dialect,
            mode,
        };
        Ok(normalizer.squash_all(
            self.schemas.values(),
            self.enums.values(),
            self.sequences.values(),
            self.roles.values(),
            self.policies.values(),
            self.tables.values(),
            self.views.values(),
        ))
    }
}

impl Squash for SquashedSchema {
    fn squash(&self, mode: Mode) -> Result<SquashedSchema> {
        let normalizer = Normalizer {
            dialect: self.dialect,
            mode,
        };
        Ok(normalizer.squash_all(
            self.schemas.values(),
            self.enums.values(),
            self.sequences.values(),
            self.roles.values(),
            self.policies.values(),
            self.tables.values(),
            self.views.values(),
        ))
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Server spellings of PostgreSQL types mapped to the form definitions use.
const POSTGRES_TYPE_ALIASES: &[(&str, &str)] = &[
    ("character varying", "varchar"),
    ("character", "char"),
    ("int", "integer"),
    ("int4", "integer"),
    ("int8", "bigint"),
    ("int2", "smallint"),
    ("float8", "double precision"),
    ("float4", "real"),
    ("bool", "boolean"),
    ("decimal", "numeric"),
    ("timestamp without time zone", "timestamp"),
    ("timestamptz", "timestamp with time zone"),
    ("time without time zone", "time"),
    ("timetz", "time with time zone"),
];

struct Normalizer {
    dialect: Dialect,
    mode: Mode,
}

impl Normalizer {
    #[allow(clippy::too_many_arguments)]
    fn squash_all<'a>(
        &self,
        schemas: impl Iterator<Item = &'a String>,
        enums: impl Iterator<Item = &'a Enum>,
        sequences: impl Iterator<Item = &'a Sequence>,
        roles: impl Iterator<Item = &'a Role>,
        policies: impl Iterator<Item = &'a Policy>,
        tables: impl Iterator<Item = &'a Table>,
        views: impl Iterator<Item = &'a View>,
    ) -> SquashedSchema {
        SquashedSchema {
            dialect: self.dialect,
            schemas: schemas
                .map(|name| self.schema_name(name))
                .filter(|name| !name.is_empty())
                .map(|name| (name.clone(), name))
                .collect(),
            enums: enums
                .map(|e| self.enum_type(e))
                .map(|e| (e.key(), e))
                .collect(),
            sequences: sequences
                .map(|s| self.sequence(s))
                .map(|s| (s.key(), s))
                .collect(),
            roles: roles.map(|r| (r.name.clone(), r.clone())).collect(),
            policies: policies
                .map(|p| self.policy(p))
                .map(|p| {
                    let key = EntityKey::new(p.on.clone().unwrap_or_default(), &p.name);
                    (key, p)
                })
                .collect(),
            tables: tables
                .map(|t| self.table(t))
                .map(|t| (t.key(), t))
                .collect(),
            views: views
                .map(|v| self.view(v))
                .map(|v| (v.key(), v))
                .collect(),
        }
    }

    /// Empty stands for the default namespace; non-PostgreSQL dialects only have that one.
    fn schema_name(&self, schema: &str) -> String {
        let schema = schema.trim();
        match self.dialect.default_schema() {
            Some(default) if schema != default => schema.to_string(),
            _ => String::new(),
        }
    }

    fn enum_type(&self, enum_type: &Enum) -> Enum {
        Enum {
            name: enum_type.name.clone(),
            schema: self.schema_name(&enum_type.schema),
            values: enum_type.values.clone(),
        }
    }

    fn sequence(&self, sequence: &Sequence) -> Sequence {
        let trimmed = |value: &Option<String>| value.as_deref().map(|v| v.trim().to_string());
        Sequence {
            name: sequence.name.clone(),
            schema: self.schema_name(&sequence.schema),
            increment: trimmed(&sequence.increment).or_else(|| Some("1".to_string())),
            min_value: trimmed(&sequence.min_value),
            max_value: trimmed(&sequence.max_value),
            start_with: trimmed(&sequence.start_with),
            cache: trimmed(&sequence.cache).or_else(|| Some("1".to_string())),
            cycle: sequence.cycle,
        }
    }

    fn policy(&self, policy: &Policy) -> Policy {
        let mut to: Vec<String> = policy
            .to
            .iter()
            .map(|role| role.trim().to_string())
            .filter(|role| !role.is_empty())
            .collect();
        to.sort();
        to.dedup();
        if to.is_empty() {
            to.push("public".to_string());
        }

        let expression = |value: &Option<String>| match self.mode {
            Mode::Push => None,
            Mode::Default => value.as_deref().map(collapse_whitespace),
        };

        let on = policy.target().map(|(schema, table)| {
            let schema = self.schema_name(&schema);
            if schema.is_empty() {
                table
            } else {
                format!("{schema}.{table}")
            }
        });

        Policy {
            name: policy.name.clone(),
            kind: policy.kind,
            command: policy.command,
            to,
            using: expression(&policy.using),
            with_check: expression(&policy.with_check),
            on,
        }
    }

    fn table(&self, table: &Table) -> Table {
        let schema = self.schema_name(&table.schema);
        Table {
            name: table.name.clone(),
            schema,
            columns: table
                .columns
                .values()
                .map(|column| (column.name.clone(), self.column(column)))
                .collect(),
            indexes: table
                .indexes
                .values()
                .map(|index| (index.name.clone(), self.index(index)))
                .collect(),
            foreign_keys: table
                .foreign_keys
                .values()
                .map(|fk| (fk.name.clone(), self.foreign_key(&table.name, fk)))
                .collect(),
            composite_primary_keys: table
                .composite_primary_keys
                .values()
                .map(|pk| self.primary_key(&table.name, pk))
                .map(|pk| (pk.name.clone(), pk))
                .collect(),
            unique_constraints: table
                .unique_constraints
                .values()
                .map(|unique| self.unique(&table.name, unique))
                .map(|unique| (unique.name.clone(), unique))
                .collect(),
            check_constraints: table
                .check_constraints
                .values()
                .map(|check| {
                    let mut check = check.clone();
                    check.value = collapse_whitespace(&check.value);
                    (check.name.clone(), check)
                })
                .collect(),
            policies: table
                .policies
                .values()
                .map(|policy| {
                    let mut policy = self.policy(policy);
                    policy.on = None;
                    (policy.name.clone(), policy)
                })
                .collect(),
            rls_enabled: table.rls_enabled,
        }
    }

    fn column(&self, column: &Column) -> Column {
        let data_type = match column.type_schema {
            Some(_) => column.data_type.trim().to_string(),
            None => self.data_type(&column.data_type),
        };
        Column {
            name: column.name.clone(),
            data_type,
            type_schema: column.type_schema.as_deref().map(|s| self.schema_name(s)),
            primary_key: column.primary_key,
            not_null: column.not_null || column.primary_key,
            default: column.default.as_deref().map(|d| self.default_value(d)),
            generated: column.generated.clone().map(|mut generated| {
                generated.expression = collapse_whitespace(&generated.expression);
                generated
            }),
            identity: column.identity,
            autoincrement: column.autoincrement,
        }
    }

    /// Lowercases the type name (never its arguments) and, in push mode on PostgreSQL,
    /// maps server aliases to their canonical spelling.
    fn data_type(&self, data_type: &str) -> String {
        let data_type = collapse_whitespace(data_type);
        let split = data_type.find(['(', '[']).unwrap_or(data_type.len());
        let (base, rest) = data_type.split_at(split);
        let mut base = base.trim().to_lowercase();

        if self.mode == Mode::Push && self.dialect == Dialect::Postgresql {
            if let Some((_, canonical)) = POSTGRES_TYPE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == base)
            {
                base = canonical.to_string();
            }
        }
        format!("{base}{rest}")
    }

    fn default_value(&self, default: &str) -> String {
        let default = collapse_whitespace(default);
        if self.mode == Mode::Push && default.starts_with('\'') {
            // introspection reports `'active'::status`; definitions say `'active'`
            if let Some(cast) = default.rfind("'::") {
                return default[..=cast].to_string();
            }
        }
        default
    }

    fn index(&self, index: &Index) -> Index {
        let mut index = index.clone();
        index.method = index.method.trim().to_lowercase();
        index.where_clause = index.where_clause.as_deref().map(collapse_whitespace);
        for column in &mut index.columns {
            if column.is_expression {
                column.expression = collapse_whitespace(&column.expression);
            }
        }
        if self.mode == Mode::Push {
            index.concurrently = false;
            index.with.clear();
            for column in &mut index.columns {
                column.opclass = None;
                if column.is_expression {
                    column.expression.clear();
                }
            }
        }
        index
    }

    fn foreign_key(&self, table: &str, fk: &ForeignKey) -> ForeignKey {
        let action = |value: &Option<String>| {
            let normalized = value.as_deref().map(|v| v.trim().to_lowercase());
            match self.mode {
                Mode::Push => normalized.or_else(|| Some("no action".to_string())),
                Mode::Default => normalized,
            }
        };
        ForeignKey {
            name: fk.name.clone(),
            table_from: table.to_string(),
            columns_from: fk.columns_from.clone(),
            schema_to: self.schema_name(&fk.schema_to),
            table_to: fk.table_to.clone(),
            columns_to: fk.columns_to.clone(),
            on_delete: action(&fk.on_delete),
            on_update: action(&fk.on_update),
        }
    }

    fn primary_key(&self, table: &str, pk: &PrimaryKey) -> PrimaryKey {
        match self.mode {
            Mode::Push => PrimaryKey {
                name: format!("{}_{}_pk", table, pk.columns.join("_")),
                columns: pk.columns.clone(),
            },
            Mode::Default => pk.clone(),
        }
    }

    fn unique(&self, table: &str, unique: &UniqueConstraint) -> UniqueConstraint {
        let mut unique = unique.clone();
        if self.mode == Mode::Push {
            let prefix = format!("{}_{}", table, unique.columns.join("_"));
            if unique.name == format!("{prefix}_key") {
                unique.name = format!("{prefix}_unique");
            }
        }
        unique
    }

    fn view(&self, view: &View) -> View {
        let mut view = view.clone();
        view.schema = self.schema_name(&view.schema);
        view.definition = view.definition.as_deref().map(|definition| {
            collapse_whitespace(definition)
                .trim_end_matches(';')
                .trim_end()
                .to_string()
        });
        view
    }
}
