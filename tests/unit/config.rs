use snapdiff::config::{ConfigBuilder, ConfigInput, DatabaseInput, FiltersInput, load_config};
use snapdiff::snapshot::Dialect;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_overrides_file_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapdiff.yaml");
    fs::write(
        &path,
        r#"
dialect: postgresql
out: migrations/0000_init.sql
breakpoints: false
filters:
  tables: ["!audit_*"]
  schemas: [public, auth]
database:
  url: postgres://file@localhost/app
"#,
    )
    .unwrap();

    let cli = ConfigInput {
        out: Some("migration.sql".to_string()),
        filters: Some(FiltersInput {
            tables: None,
            schemas: Some(vec!["public".to_string()]),
        }),
        database: Some(DatabaseInput {
            url: Some("postgres://cli@localhost/app".to_string()),
        }),
        ..ConfigInput::default()
    };

    let config = ConfigBuilder::new()
        .with_file(load_config(&path).unwrap())
        .with_cli_args(cli)
        .resolve()
        .unwrap();

    assert_eq!(config.dialect, Some(Dialect::Postgresql));
    assert_eq!(config.out, "migration.sql");
    assert!(!config.breakpoints);
    assert_eq!(config.filters.tables, vec!["!audit_*".to_string()]);
    assert_eq!(config.filters.schemas, vec!["public".to_string()]);
    assert_eq!(
        config.database.url.as_deref(),
        Some("postgres://cli@localhost/app")
    );
}

#[test]
fn test_unknown_dialect_in_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapdiff.yaml");
    fs::write(&path, "dialect: oracle\n").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("snapdiff.yaml"));
}
