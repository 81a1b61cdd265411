//! Apply resolved renames and moves to the previous state so the second diff pass compares
//! like with like.

use crate::snapshot::{EntityKey, Enum, Policy, Sequence, Table, View};
use crate::squash::SquashedSchema;

/// Rewrite every reference to schema `from`.
pub fn rename_schema(prev: &mut SquashedSchema, from: &str, to: &str) {
    if prev.schemas.remove(from).is_some() {
        prev.schemas.insert(to.to_string(), to.to_string());
    }

    let rekey = |namespace: &str| if namespace == from { to } else { namespace }.to_string();

    prev.enums = std::mem::take(&mut prev.enums)
        .into_values()
        .map(|mut e| {
            e.schema = rekey(&e.schema);
            (e.key(), e)
        })
        .collect();
    prev.sequences = std::mem::take(&mut prev.sequences)
        .into_values()
        .map(|mut s| {
            s.schema = rekey(&s.schema);
            (s.key(), s)
        })
        .collect();
    prev.views = std::mem::take(&mut prev.views)
        .into_values()
        .map(|mut v| {
            v.schema = rekey(&v.schema);
            (v.key(), v)
        })
        .collect();
    prev.tables = std::mem::take(&mut prev.tables)
        .into_values()
        .map(|mut table| {
            table.schema = rekey(&table.schema);
            for column in table.columns.values_mut() {
                if let Some(type_schema) = column.type_schema.as_mut() {
                    *type_schema = rekey(type_schema.as_str());
                }
            }
            for fk in table.foreign_keys.values_mut() {
                fk.schema_to = rekey(&fk.schema_to);
            }
            (table.key(), table)
        })
        .collect();
    prev.policies = std::mem::take(&mut prev.policies)
        .into_values()
        .map(|mut policy| {
            if let Some((schema, table)) = policy.target() {
                policy.on = Some(qualified(&rekey(&schema), &table));
            }
            (policy_key(&policy), policy)
        })
        .collect();
}

/// Give an enum `to`'s identity and retarget columns typed with it.
pub fn relocate_enum(prev: &mut SquashedSchema, from: &Enum, to: &Enum) {
    let Some(mut patched) = prev.enums.remove(&from.key()) else {
        return;
    };
    patched.schema = to.schema.clone();
    patched.name = to.name.clone();
    prev.enums.insert(patched.key(), patched);

    for table in prev.tables.values_mut() {
        for column in table.columns.values_mut() {
            if column.is_enum_typed(&from.schema, &from.name) {
                column.data_type = to.name.clone();
                column.type_schema = Some(to.schema.clone());
            }
        }
    }
}

pub fn relocate_sequence(prev: &mut SquashedSchema, from: &Sequence, to: &Sequence) {
    if let Some(mut patched) = prev.sequences.remove(&from.key()) {
        patched.schema = to.schema.clone();
        patched.name = to.name.clone();
        prev.sequences.insert(patched.key(), patched);
    }
}

/// Rename a role and every policy grant naming it.
pub fn rename_role(prev: &mut SquashedSchema, from: &str, to: &str) {
    if let Some(mut role) = prev.roles.remove(from) {
        role.name = to.to_string();
        prev.roles.insert(to.to_string(), role);
    }

    let retarget = |policy: &mut Policy| {
        for role in policy.to.iter_mut().filter(|role| role.as_str() == from) {
            *role = to.to_string();
        }
        policy.to.sort();
    };
    prev.policies.values_mut().for_each(retarget);
    for table in prev.tables.values_mut() {
        table.policies.values_mut().for_each(retarget);
    }
}

pub fn rename_standalone_policy(prev: &mut SquashedSchema, from: &Policy, to: &Policy) {
    if let Some(mut patched) = prev.policies.remove(&policy_key(from)) {
        patched.name = to.name.clone();
        patched.on = to.on.clone();
        prev.policies.insert(policy_key(&patched), patched);
    }
}

/// Give a table `to`'s identity; foreign keys and standalone policies targeting it follow.
pub fn relocate_table(prev: &mut SquashedSchema, from: &Table, to: &Table) {
    let Some(mut patched) = prev.tables.remove(&from.key()) else {
        return;
    };
    patched.schema = to.schema.clone();
    patched.name = to.name.clone();
    for fk in patched.foreign_keys.values_mut() {
        fk.table_from = to.name.clone();
    }
    prev.tables.insert(patched.key(), patched);

    for table in prev.tables.values_mut() {
        for fk in table.foreign_keys.values_mut() {
            if fk.references(&from.schema, &from.name) {
                fk.schema_to = to.schema.clone();
                fk.table_to = to.name.clone();
            }
        }
    }

    prev.policies = std::mem::take(&mut prev.policies)
        .into_values()
        .map(|mut policy| {
            if policy.target() == Some((from.schema.clone(), from.name.clone())) {
                policy.on = Some(qualified(&to.schema, &to.name));
            }
            (policy_key(&policy), policy)
        })
        .collect();
}

/// Rename a column in place, keeping its position, and rewrite every key that lists it,
/// including foreign keys in other tables that point at it.
pub fn rename_column(prev: &mut SquashedSchema, table_key: &EntityKey, from: &str, to: &str) {
    let Some(table) = prev.tables.get_mut(table_key) else {
        return;
    };
    table.columns = std::mem::take(&mut table.columns)
        .into_iter()
        .map(|(name, mut column)| {
            if name == from {
                column.name = to.to_string();
                (to.to_string(), column)
            } else {
                (name, column)
            }
        })
        .collect();

    let rename = |columns: &mut Vec<String>| {
        for column in columns.iter_mut().filter(|c| c.as_str() == from) {
            *column = to.to_string();
        }
    };
    for index in table.indexes.values_mut() {
        for column in index.columns.iter_mut() {
            if !column.is_expression && column.expression == from {
                column.expression = to.to_string();
            }
        }
    }
    for pk in table.composite_primary_keys.values_mut() {
        rename(&mut pk.columns);
    }
    for unique in table.unique_constraints.values_mut() {
        rename(&mut unique.columns);
    }
    for fk in table.foreign_keys.values_mut() {
        rename(&mut fk.columns_from);
    }

    let (schema, name) = (table_key.namespace.clone(), table_key.name.clone());
    for table in prev.tables.values_mut() {
        for fk in table.foreign_keys.values_mut() {
            if fk.references(&schema, &name) {
                rename(&mut fk.columns_to);
            }
        }
    }
}

pub fn rename_index(table: &mut Table, from: &str, to: &str) {
    if let Some(mut index) = table.indexes.remove(from) {
        index.name = to.to_string();
        table.indexes.insert(to.to_string(), index);
    }
}

pub fn rename_table_policy(table: &mut Table, from: &str, to: &str) {
    if let Some(mut policy) = table.policies.remove(from) {
        policy.name = to.to_string();
        table.policies.insert(to.to_string(), policy);
    }
}

pub fn relocate_view(prev: &mut SquashedSchema, from: &View, to: &View) {
    if let Some(mut patched) = prev.views.remove(&from.key()) {
        patched.schema = to.schema.clone();
        patched.name = to.name.clone();
        prev.views.insert(patched.key(), patched);
    }
}

fn qualified(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        table.to_string()
    } else {
        format!("{schema}.{table}")
    }
}

fn policy_key(policy: &Policy) -> EntityKey {
    EntityKey::new(policy.on.clone().unwrap_or_default(), &policy.name)
}
