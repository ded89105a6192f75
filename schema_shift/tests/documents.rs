//! Loading entities from schema documents and running the engine on them

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use schema_shift::{load_config, load_entities, MigrationEngine, MigrationOutcome, SchemaSnapshot};

const CONFIG: &str = r#"
[models]
paths = ["{root}/schema"]

[migrations]
directory = "{root}/migrations"
description = "initial"

[naming]
max_identifier_length = 63

[schema]
index_foreign_keys = true
"#;

const ACCOUNTS: &str = r#"
[[entities]]
name = "Account"

[[entities.fields]]
name = "id"
type = "bigint"
primary = true
identity = "always"

[[entities.fields]]
name = "email"
type = "citext"
unique = true

[[entities.fields]]
name = "status"
type = "enum"
enum = { name = "account_status", values = ["active", "closed"] }
default = "'active'"
"#;

const READINGS: &str = r#"
entities:
  - name: Reading
    hypertable: takenAt
    fields:
      - name: id
        type: bigint
        primary: true
      - name: takenAt
        type: timestamptz
      - name: accountId
        type: bigint
      - name: embedding
        type: vector(3)
        nullable: true
    edges:
      - name: account
        target: Account
        kind: to_one
        on_delete: cascade
    indexes:
      - columns: [takenAt]
        method: brin
"#;

#[test]
fn test_documents_to_snapshot() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_string_lossy().replace('\\', "/");
    fs::create_dir(dir.path().join("schema")).unwrap();
    fs::write(dir.path().join("schema/accounts.toml"), ACCOUNTS).unwrap();
    fs::write(dir.path().join("schema/readings.yaml"), READINGS).unwrap();
    let config_path = dir.path().join("schema_shift.toml");
    fs::write(&config_path, CONFIG.replace("{root}", &root)).unwrap();

    let config = load_config(&config_path).unwrap();
    let mut entities = load_entities(&config).unwrap();
    assert_eq!(entities.len(), 2);

    let snapshot_path = config.migrations.snapshot_path();
    let mut engine = MigrationEngine::new(config);
    let outcome = engine.run(&mut entities, true).unwrap();
    let MigrationOutcome::Generated { path, operations } = outcome else {
        panic!("expected a generated migration");
    };
    assert!(path.file_name().unwrap().to_string_lossy().ends_with("_initial.sql"));

    let sql: Vec<&str> = operations.iter().map(|op| op.sql.as_str()).collect();
    assert_eq!(
        &sql[..2],
        &[
            "CREATE EXTENSION IF NOT EXISTS citext;",
            "CREATE EXTENSION IF NOT EXISTS timescaledb;",
        ]
    );
    assert!(sql.contains(
        &"CREATE TABLE IF NOT EXISTS accounts (\n  id bigint GENERATED ALWAYS AS IDENTITY,\n  email citext NOT NULL CONSTRAINT accounts_email_key UNIQUE,\n  status text NOT NULL DEFAULT 'active',\n  PRIMARY KEY (id)\n);"
    ));
    assert!(sql.contains(&"CREATE INDEX IF NOT EXISTS ix_readings_taken_at ON readings USING brin (taken_at);"));
    assert!(sql.contains(&"CREATE INDEX IF NOT EXISTS ix_readings_account_id ON readings (account_id);"));
    assert!(sql.contains(
        &"SELECT create_hypertable('readings', 'taken_at', if_not_exists => TRUE, migrate_data => TRUE);"
    ));
    assert_eq!(
        sql.last().copied(),
        Some("ALTER TABLE readings ADD CONSTRAINT fk_readings_account_id FOREIGN KEY (account_id) REFERENCES accounts (id) ON DELETE CASCADE;")
    );

    let persisted: SchemaSnapshot = serde_json::from_str(&fs::read_to_string(snapshot_path).unwrap()).unwrap();
    assert_eq!(persisted.extensions, vec!["citext", "timescaledb", "vector"]);
    assert_eq!(persisted.table("readings").unwrap().hypertable_column.as_deref(), Some("taken_at"));
}
