//! Snapshot format upgrades.
//!
//! Older documents are rewritten at the JSON level, one version step at a time, until they
//! reach the dialect's current format. Versions with no registered step (including ones newer
//! than this build knows) pass through unchanged.

use serde_json::{Map, Value, json};
use tracing::debug;

use super::Dialect;
use crate::error::{DiffError, Result};

type UpgradeFn = fn(Map<String, Value>) -> Map<String, Value>;

struct Upgrade {
    from: u32,
    apply: UpgradeFn,
}

const POSTGRES_CHAIN: &[Upgrade] = &[
    Upgrade {
        from: 5,
        apply: postgres_v5_to_v6,
    },
    Upgrade {
        from: 6,
        apply: postgres_v6_to_v7,
    },
];

const SQLITE_CHAIN: &[Upgrade] = &[Upgrade {
    from: 5,
    apply: sqlite_v5_to_v6,
}];

const MYSQL_CHAIN: &[Upgrade] = &[Upgrade {
    from: 4,
    apply: mysql_v4_to_v5,
}];

fn chain_for(dialect: Dialect) -> &'static [Upgrade] {
    match dialect {
        Dialect::Postgresql => POSTGRES_CHAIN,
        Dialect::Sqlite => SQLITE_CHAIN,
        Dialect::Mysql => MYSQL_CHAIN,
        Dialect::Singlestore => &[],
    }
}

/// Upgrade a raw snapshot document to the current format of its dialect.
pub fn upgrade(value: Value) -> Result<Value> {
    let Value::Object(mut document) = value else {
        return Err(DiffError::malformed("snapshot", "document is not a JSON object"));
    };

    let dialect = detect_dialect(&document)?;
    document.insert("dialect".to_string(), json!(dialect.to_string()));

    while let Some(version) = version_of(&document)? {
        let Some(step) = chain_for(dialect).iter().find(|step| step.from == version) else {
            break;
        };
        debug!("Upgrading {} snapshot from version {}", dialect, version);
        document = (step.apply)(document);
    }

    Ok(Value::Object(document))
}

fn detect_dialect(document: &Map<String, Value>) -> Result<Dialect> {
    match document.get("dialect").and_then(Value::as_str) {
        Some("pg" | "postgresql") => Ok(Dialect::Postgresql),
        Some("mysql") => Ok(Dialect::Mysql),
        Some("sqlite") => Ok(Dialect::Sqlite),
        Some("singlestore") => Ok(Dialect::Singlestore),
        Some(other) => Err(DiffError::malformed(
            "snapshot",
            format!("unknown dialect '{other}'"),
        )),
        None => Err(DiffError::malformed("snapshot", "missing dialect")),
    }
}

/// Numeric version, or `None` for non-numeric versions (left untouched).
fn version_of(document: &Map<String, Value>) -> Result<Option<u32>> {
    match document.get("version") {
        Some(Value::String(text)) => Ok(text.parse().ok()),
        Some(Value::Number(number)) => Ok(number.as_u64().and_then(|n| u32::try_from(n).ok())),
        _ => Err(DiffError::malformed("snapshot", "missing version")),
    }
}

fn set_version(document: &mut Map<String, Value>, version: u32) {
    document.insert("version".to_string(), json!(version.to_string()));
}

fn ensure_object(document: &mut Map<String, Value>, key: &str) {
    if !document.get(key).is_some_and(Value::is_object) {
        document.insert(key.to_string(), json!({}));
    }
}

fn take_object(document: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match document.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn schema_field(entity: &Value) -> String {
    match entity.get("schema").and_then(Value::as_str) {
        Some(schema) if !schema.is_empty() => schema.to_string(),
        _ => "public".to_string(),
    }
}

/// v6 keys tables and enums by `schema.name` and stores enum values as an array.
fn postgres_v5_to_v6(mut document: Map<String, Value>) -> Map<String, Value> {
    let tables: Map<String, Value> = take_object(&mut document, "tables")
        .into_iter()
        .map(|(key, table)| {
            let name = table
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(key);
            (format!("{}.{}", schema_field(&table), name), table)
        })
        .collect();
    document.insert("tables".to_string(), Value::Object(tables));

    let enums: Map<String, Value> = take_object(&mut document, "enums")
        .into_iter()
        .map(|(key, mut enum_type)| {
            let listed = match enum_type.get("values") {
                Some(Value::Object(values)) => Some(values.values().cloned().collect::<Vec<_>>()),
                _ => None,
            };
            if let Some(list) = listed {
                enum_type["values"] = Value::Array(list);
            }
            let schema = schema_field(&enum_type);
            if let Value::Object(fields) = &mut enum_type {
                fields.insert("schema".to_string(), json!(schema));
            }
            let name = enum_type
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(key);
            (format!("{schema}.{name}"), enum_type)
        })
        .collect();
    document.insert("enums".to_string(), Value::Object(enums));

    set_version(&mut document, 6);
    document
}

/// v7 turns index column names into column objects and adds the role/policy/sequence/view
/// categories.
fn postgres_v6_to_v7(mut document: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(tables)) = document.get_mut("tables") {
        for table in tables.values_mut() {
            let Some(Value::Object(indexes)) = table.get_mut("indexes") else {
                continue;
            };
            for index in indexes.values_mut() {
                let Value::Object(fields) = index else {
                    continue;
                };
                if let Some(Value::Array(columns)) = fields.get_mut("columns") {
                    for column in columns.iter_mut() {
                        if let Value::String(name) = column {
                            *column = json!({
                                "expression": name.clone(),
                                "isExpression": false,
                                "asc": true,
                                "nulls": "last",
                            });
                        }
                    }
                }
                fields.entry("concurrently").or_insert(json!(false));
                fields.entry("method").or_insert(json!("btree"));
                fields.entry("with").or_insert(json!({}));
            }
        }
    }

    for key in ["sequences", "roles", "policies", "views"] {
        ensure_object(&mut document, key);
    }
    set_version(&mut document, 7);
    document
}

fn sqlite_v5_to_v6(mut document: Map<String, Value>) -> Map<String, Value> {
    ensure_object(&mut document, "views");
    set_version(&mut document, 6);
    document
}

fn mysql_v4_to_v5(mut document: Map<String, Value>) -> Map<String, Value> {
    ensure_object(&mut document, "views");
    set_version(&mut document, 5);
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_v5_reaches_current() {
        let v5 = json!({
            "id": "7f1c4c52-7c07-4a3b-9d36-8f87a8d1b7a2",
            "prevId": "00000000-0000-0000-0000-000000000000",
            "version": "5",
            "dialect": "pg",
            "tables": {
                "users": {
                    "name": "users",
                    "schema": "",
                    "columns": {
                        "id": { "name": "id", "type": "serial", "primaryKey": true, "notNull": true },
                        "email": { "name": "email", "type": "text", "notNull": true }
                    },
                    "indexes": {
                        "users_email_idx": { "name": "users_email_idx", "columns": ["email"], "isUnique": true }
                    }
                }
            },
            "enums": {
                "status": { "name": "status", "values": { "active": "active", "banned": "banned" } }
            }
        });

        let upgraded = upgrade(v5).unwrap();

        assert_eq!(upgraded["version"], "7");
        assert_eq!(upgraded["dialect"], "postgresql");
        assert!(upgraded["tables"]["public.users"].is_object());
        assert_eq!(
            upgraded["tables"]["public.users"]["indexes"]["users_email_idx"]["columns"][0]["expression"],
            "email"
        );
        assert_eq!(
            upgraded["enums"]["public.status"]["values"],
            json!(["active", "banned"])
        );
        assert_eq!(upgraded["roles"], json!({}));
        assert_eq!(upgraded["views"], json!({}));
    }

    #[test]
    fn test_future_version_passes_through() {
        let doc = json!({ "version": "99", "dialect": "sqlite", "tables": {} });
        let upgraded = upgrade(doc.clone()).unwrap();
        assert_eq!(upgraded, doc);
    }

    #[test]
    fn test_sqlite_v5_gets_views() {
        let doc = json!({ "version": "5", "dialect": "sqlite", "tables": {} });
        let upgraded = upgrade(doc).unwrap();
        assert_eq!(upgraded["version"], "6");
        assert_eq!(upgraded["views"], json!({}));
    }

    #[test]
    fn test_missing_dialect_is_malformed() {
        let err = upgrade(json!({ "version": "7" })).unwrap_err();
        assert!(matches!(err, DiffError::MalformedSnapshot { .. }));
    }
}
